//! Create questionnaire, section, and question tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Questionnaire::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questionnaire::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Questionnaire::Title)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Questionnaire::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Section::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Section::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Section::QuestionnaireId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Section::Title).string_len(512).not_null())
                    .col(
                        ColumnDef::new(Section::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Section::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_section_questionnaire")
                            .from(Section::Table, Section::QuestionnaireId)
                            .to(Questionnaire::Table, Questionnaire::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_section_questionnaire_id")
                    .table(Section::Table)
                    .col(Section::QuestionnaireId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Question::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Question::SectionId).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Title).text().not_null())
                    .col(
                        ColumnDef::new(Question::IsRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Question::Options).json_binary().null())
                    .col(
                        ColumnDef::new(Question::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Question::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_section")
                            .from(Question::Table, Question::SectionId)
                            .to(Section::Table, Section::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_question_section_id")
                    .table(Question::Table)
                    .col(Question::SectionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Section::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Questionnaire::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Questionnaire {
    Table,
    Id,
    Title,
    CreatedAt,
}

#[derive(Iden)]
enum Section {
    Table,
    Id,
    QuestionnaireId,
    Title,
    Position,
    CreatedAt,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    SectionId,
    Kind,
    Title,
    IsRequired,
    Options,
    Position,
    CreatedAt,
}
