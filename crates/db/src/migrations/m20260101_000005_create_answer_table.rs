//! Create answer table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Answer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Answer::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Answer::ResponseId).string_len(32).not_null())
                    .col(ColumnDef::new(Answer::QuestionId).string_len(32).not_null())
                    .col(ColumnDef::new(Answer::Value).text().null())
                    .col(ColumnDef::new(Answer::ValueArray).json_binary().null())
                    .col(
                        ColumnDef::new(Answer::ValueTranslations)
                            .json_binary()
                            .null(),
                    )
                    .col(ColumnDef::new(Answer::TimeSpent).integer().null())
                    .col(
                        ColumnDef::new(Answer::RevisionCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Answer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Answer::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_response")
                            .from(Answer::Table, Answer::ResponseId)
                            .to(Response::Table, Response::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_question")
                            .from(Answer::Table, Answer::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (response_id, question_id) - one answer per question
        // per response. The upsert still finds-before-inserts; this is the
        // backstop for concurrent saves racing on the same question.
        manager
            .create_index(
                Index::create()
                    .name("idx_answer_response_question")
                    .table(Answer::Table)
                    .col(Answer::ResponseId)
                    .col(Answer::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: question_id (for per-question reporting)
        manager
            .create_index(
                Index::create()
                    .name("idx_answer_question_id")
                    .table(Answer::Table)
                    .col(Answer::QuestionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Answer::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Answer {
    Table,
    Id,
    ResponseId,
    QuestionId,
    Value,
    ValueArray,
    ValueTranslations,
    TimeSpent,
    RevisionCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Response {
    Table,
    Id,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
}
