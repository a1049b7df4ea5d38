//! Create response table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Response::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Response::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Response::ActivityId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Response::ParticipantId)
                            .string_len(32)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Response::GuestIdentifier)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Response::Status)
                            .string_len(32)
                            .not_null()
                            .default("in_progress"),
                    )
                    .col(
                        ColumnDef::new(Response::Language)
                            .string_len(10)
                            .not_null()
                            .default("en"),
                    )
                    .col(
                        ColumnDef::new(Response::TotalQuestions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Response::AnsweredQuestions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Response::CompletionPercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Response::IsPreview)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Response::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Response::LastSavedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Response::SubmittedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Response::Metadata).json_binary().null())
                    .col(ColumnDef::new(Response::Answers).json_binary().null())
                    .col(
                        ColumnDef::new(Response::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Response::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_response_activity")
                            .from(Response::Table, Response::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_response_participant")
                            .from(Response::Table, Response::ParticipantId)
                            .to(Participant::Table, Participant::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (activity_id, participant_id) - duplicate-start lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_response_activity_participant")
                    .table(Response::Table)
                    .col(Response::ActivityId)
                    .col(Response::ParticipantId)
                    .to_owned(),
            )
            .await?;

        // Index: (activity_id, guest_identifier) - guest duplicate-start lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_response_activity_guest")
                    .table(Response::Table)
                    .col(Response::ActivityId)
                    .col(Response::GuestIdentifier)
                    .to_owned(),
            )
            .await?;

        // Index: (activity_id, status) - listing and statistics filters
        manager
            .create_index(
                Index::create()
                    .name("idx_response_activity_status")
                    .table(Response::Table)
                    .col(Response::ActivityId)
                    .col(Response::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Response::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Response {
    Table,
    Id,
    ActivityId,
    ParticipantId,
    GuestIdentifier,
    Status,
    Language,
    TotalQuestions,
    AnsweredQuestions,
    CompletionPercentage,
    IsPreview,
    StartedAt,
    LastSavedAt,
    SubmittedAt,
    Metadata,
    Answers,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
}

#[derive(Iden)]
enum Participant {
    Table,
    Id,
}
