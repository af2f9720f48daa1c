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
                    .table(TopTracks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TopTracks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TopTracks::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(TopTracks::SpotifyId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TopTracks::Name)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TopTracks::ArtistName)
                            .string_len(1000)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TopTracks::AlbumName)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TopTracks::AlbumImage).text())
                    .col(ColumnDef::new(TopTracks::PreviewUrl).text())
                    .col(
                        ColumnDef::new(TopTracks::DurationMs)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TopTracks::TimeRange)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TopTracks::Rank).integer().not_null())
                    .col(
                        ColumnDef::new(TopTracks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_top_tracks_user_id")
                            .from(TopTracks::Table, TopTracks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_top_tracks_user_range_rank")
                    .table(TopTracks::Table)
                    .col(TopTracks::UserId)
                    .col(TopTracks::TimeRange)
                    .col(TopTracks::Rank)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TopTracks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TopTracks {
    Table,
    Id,
    UserId,
    SpotifyId,
    Name,
    ArtistName,
    AlbumName,
    AlbumImage,
    PreviewUrl,
    DurationMs,
    TimeRange,
    Rank,
    CreatedAt,
}
