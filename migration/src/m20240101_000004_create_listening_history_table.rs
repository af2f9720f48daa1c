use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ListeningHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ListeningHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ListeningHistory::UserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ListeningHistory::TrackId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ListeningHistory::TrackName)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ListeningHistory::ArtistName)
                            .string_len(1000)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ListeningHistory::AlbumImage).text())
                    .col(
                        ColumnDef::new(ListeningHistory::PlayedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_listening_history_user_id")
                            .from(ListeningHistory::Table, ListeningHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // played_at is the natural dedup key per user
        manager
            .create_index(
                Index::create()
                    .name("idx_listening_history_user_played_at")
                    .table(ListeningHistory::Table)
                    .col(ListeningHistory::UserId)
                    .col(ListeningHistory::PlayedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listening_history_user_track_id")
                    .table(ListeningHistory::Table)
                    .col(ListeningHistory::UserId)
                    .col(ListeningHistory::TrackId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ListeningHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ListeningHistory {
    Table,
    Id,
    UserId,
    TrackId,
    TrackName,
    ArtistName,
    AlbumImage,
    PlayedAt,
}
