//! Initial migration: collections plus the three synced asset tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Collections::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Collections::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Collections::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Collections::CreatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Images::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Images::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Images::BynderId).string().unique_key())
                    .col(ColumnDef::new(Images::BynderLastModified).timestamp_with_time_zone())
                    .col(ColumnDef::new(Images::Title).string().not_null())
                    .col(ColumnDef::new(Images::Description).string().not_null().default(""))
                    .col(ColumnDef::new(Images::Copyright).string().not_null().default(""))
                    .col(ColumnDef::new(Images::IsArchived).boolean().not_null().default(false))
                    .col(ColumnDef::new(Images::IsLimitedUse).boolean().not_null().default(false))
                    .col(ColumnDef::new(Images::IsPublic).boolean().not_null().default(false))
                    .col(ColumnDef::new(Images::CollectionId).integer())
                    .col(ColumnDef::new(Images::SourceFilename).string())
                    .col(ColumnDef::new(Images::OriginalFilesize).big_integer())
                    .col(ColumnDef::new(Images::OriginalWidth).integer())
                    .col(ColumnDef::new(Images::OriginalHeight).integer())
                    .col(ColumnDef::new(Images::FilePath).string().not_null())
                    .col(ColumnDef::new(Images::Width).integer().not_null())
                    .col(ColumnDef::new(Images::Height).integer().not_null())
                    .col(ColumnDef::new(Images::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(Images::MimeType).string().not_null())
                    .col(ColumnDef::new(Images::FocalPointX).integer())
                    .col(ColumnDef::new(Images::FocalPointY).integer())
                    .col(ColumnDef::new(Images::FocalPointWidth).integer())
                    .col(ColumnDef::new(Images::FocalPointHeight).integer())
                    .col(ColumnDef::new(Images::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Images::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Images::Table, Images::CollectionId)
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Documents::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Documents::BynderId).string().unique_key())
                    .col(ColumnDef::new(Documents::BynderLastModified).timestamp_with_time_zone())
                    .col(ColumnDef::new(Documents::Title).string().not_null())
                    .col(ColumnDef::new(Documents::Description).string().not_null().default(""))
                    .col(ColumnDef::new(Documents::Copyright).string().not_null().default(""))
                    .col(ColumnDef::new(Documents::IsArchived).boolean().not_null().default(false))
                    .col(ColumnDef::new(Documents::IsLimitedUse).boolean().not_null().default(false))
                    .col(ColumnDef::new(Documents::IsPublic).boolean().not_null().default(false))
                    .col(ColumnDef::new(Documents::CollectionId).integer())
                    .col(ColumnDef::new(Documents::SourceFilename).string())
                    .col(ColumnDef::new(Documents::OriginalFilesize).big_integer())
                    .col(ColumnDef::new(Documents::FilePath).string().not_null())
                    .col(ColumnDef::new(Documents::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(Documents::MimeType).string().not_null())
                    .col(ColumnDef::new(Documents::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Documents::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Documents::Table, Documents::CollectionId)
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Videos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Videos::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Videos::BynderId).string().unique_key())
                    .col(ColumnDef::new(Videos::BynderLastModified).timestamp_with_time_zone())
                    .col(ColumnDef::new(Videos::Title).string().not_null())
                    .col(ColumnDef::new(Videos::Description).string().not_null().default(""))
                    .col(ColumnDef::new(Videos::Copyright).string().not_null().default(""))
                    .col(ColumnDef::new(Videos::IsArchived).boolean().not_null().default(false))
                    .col(ColumnDef::new(Videos::IsLimitedUse).boolean().not_null().default(false))
                    .col(ColumnDef::new(Videos::IsPublic).boolean().not_null().default(false))
                    .col(ColumnDef::new(Videos::CollectionId).integer())
                    .col(ColumnDef::new(Videos::SourceFilename).string())
                    .col(ColumnDef::new(Videos::OriginalFilesize).big_integer())
                    .col(ColumnDef::new(Videos::OriginalWidth).integer())
                    .col(ColumnDef::new(Videos::OriginalHeight).integer())
                    .col(ColumnDef::new(Videos::PrimaryUrl).string().not_null())
                    .col(ColumnDef::new(Videos::FallbackUrl).string())
                    .col(ColumnDef::new(Videos::PosterUrl).string().not_null())
                    .col(ColumnDef::new(Videos::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Videos::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Videos::Table, Videos::CollectionId)
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Stale-row scans filter on bynder_last_modified per bynder_id
        for (table, name) in [
            (Images::Table.into_table_ref(), "idx_images_last_modified"),
            (Documents::Table.into_table_ref(), "idx_documents_last_modified"),
            (Videos::Table.into_table_ref(), "idx_videos_last_modified"),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(table)
                        .col(Alias::new("bynder_last_modified"))
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Videos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Images::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Collections::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Collections {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Images {
    Table,
    Id,
    BynderId,
    BynderLastModified,
    Title,
    Description,
    Copyright,
    IsArchived,
    IsLimitedUse,
    IsPublic,
    CollectionId,
    SourceFilename,
    OriginalFilesize,
    OriginalWidth,
    OriginalHeight,
    FilePath,
    Width,
    Height,
    FileSize,
    MimeType,
    FocalPointX,
    FocalPointY,
    FocalPointWidth,
    FocalPointHeight,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Documents {
    Table,
    Id,
    BynderId,
    BynderLastModified,
    Title,
    Description,
    Copyright,
    IsArchived,
    IsLimitedUse,
    IsPublic,
    CollectionId,
    SourceFilename,
    OriginalFilesize,
    FilePath,
    FileSize,
    MimeType,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Videos {
    Table,
    Id,
    BynderId,
    BynderLastModified,
    Title,
    Description,
    Copyright,
    IsArchived,
    IsLimitedUse,
    IsPublic,
    CollectionId,
    SourceFilename,
    OriginalFilesize,
    OriginalWidth,
    OriginalHeight,
    PrimaryUrl,
    FallbackUrl,
    PosterUrl,
    CreatedAt,
    UpdatedAt,
}
