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
                    .table(TopArtists::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TopArtists::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TopArtists::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(TopArtists::SpotifyId)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TopArtists::Name)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TopArtists::ImageUrl).text())
                    .col(ColumnDef::new(TopArtists::Genres).json().not_null())
                    .col(
                        ColumnDef::new(TopArtists::Popularity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TopArtists::TimeRange)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TopArtists::Rank).integer().not_null())
                    .col(
                        ColumnDef::new(TopArtists::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_top_artists_user_id")
                            .from(TopArtists::Table, TopArtists::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_top_artists_user_range_rank")
                    .table(TopArtists::Table)
                    .col(TopArtists::UserId)
                    .col(TopArtists::TimeRange)
                    .col(TopArtists::Rank)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TopArtists::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TopArtists {
    Table,
    Id,
    UserId,
    SpotifyId,
    Name,
    ImageUrl,
    Genres,
    Popularity,
    TimeRange,
    Rank,
    CreatedAt,
}
