//! Document sync target.
//!
//! Documents are stored as-is: the original upload is downloaded and written
//! to the media store without processing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::api::Asset;
use crate::db::entities::document;
use crate::download::download_document;
use crate::error::{Result, SyncError};
use crate::sync::{file_fingerprint_changed, map_insert_err, ApplyOptions, SyncContext, SyncTarget};
use crate::AssetKind;

pub struct DocumentSync;

/// Documents sync from the original upload. The URL is absent when the asset
/// is marked private in Bynder, in which case there is nothing to download.
fn extract_file_source<'a>(asset: &'a Asset) -> Result<&'a str> {
    asset.original.as_deref().ok_or_else(|| {
        SyncError::AssetData(format!(
            "asset '{}' has no original URL; the asset is likely marked 'private' in Bynder, \
             which hides the original from the API",
            asset.id
        ))
    })
}

#[async_trait]
impl SyncTarget for DocumentSync {
    type Model = document::Model;

    const KIND: AssetKind = AssetKind::Document;
    // The listing already carries everything documents need
    const NEEDS_FULL_RECORD: bool = false;

    fn numeric_id(model: &Self::Model) -> i32 {
        model.id
    }

    fn bynder_id(model: &Self::Model) -> Option<&str> {
        model.bynder_id.as_deref()
    }

    fn last_modified(model: &Self::Model) -> Option<DateTime<Utc>> {
        model.bynder_last_modified
    }

    fn stored_file(model: &Self::Model) -> Option<PathBuf> {
        Some(PathBuf::from(&model.file_path))
    }

    async fn find_by_bynder_id(
        ctx: &SyncContext,
        bynder_id: &str,
    ) -> Result<Option<Self::Model>> {
        Ok(document::Entity::find()
            .filter(document::Column::BynderId.eq(bynder_id))
            .one(ctx.db.conn())
            .await?)
    }

    async fn find_synced(ctx: &SyncContext, min_id: Option<i32>) -> Result<Vec<Self::Model>> {
        let mut query = document::Entity::find().filter(document::Column::BynderId.is_not_null());
        if let Some(min_id) = min_id {
            query = query.filter(document::Column::Id.gte(min_id));
        }
        Ok(query
            .order_by_asc(document::Column::Id)
            .all(ctx.db.conn())
            .await?)
    }

    async fn find_stale(
        ctx: &SyncContext,
        batch: &HashMap<String, Asset>,
    ) -> Result<Vec<Self::Model>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let mut condition = Condition::any();
        for (id, asset) in batch {
            condition = condition.add(
                Condition::all()
                    .add(document::Column::BynderId.eq(id.as_str()))
                    .add(
                        Condition::any()
                            .add(document::Column::BynderLastModified.lt(asset.date_modified))
                            .add(document::Column::BynderLastModified.is_null()),
                    ),
            );
        }
        Ok(document::Entity::find()
            .filter(condition)
            .all(ctx.db.conn())
            .await?)
    }

    async fn apply_and_save(
        ctx: &SyncContext,
        existing: Option<Self::Model>,
        asset: &Asset,
        opts: &ApplyOptions,
    ) -> Result<Self::Model> {
        let source_url = extract_file_source(asset)?;
        let needs_file = opts.force_download
            || existing.as_ref().map_or(true, |model| {
                file_fingerprint_changed(
                    model.source_filename.as_deref(),
                    model.original_filesize,
                    source_url,
                    asset,
                )
            });

        let now = Utc::now();
        let mut active: document::ActiveModel = match &existing {
            Some(model) => model.clone().into(),
            None => document::ActiveModel {
                collection_id: Set(Some(ctx.collection_id)),
                created_at: Set(now),
                ..Default::default()
            },
        };
        active.bynder_id = Set(Some(asset.id.clone()));
        active.bynder_last_modified = Set(Some(asset.date_modified));
        active.title = Set(asset.name.clone());
        active.description = Set(asset.description.clone());
        active.copyright = Set(asset.copyright.clone());
        active.is_archived = Set(asset.archive);
        active.is_limited_use = Set(asset.limited);
        active.is_public = Set(asset.is_public);
        active.updated_at = Set(now);

        let mut stored_path: Option<PathBuf> = None;
        if needs_file {
            let download = download_document(&ctx.http, source_url, &ctx.config).await?;
            let path = ctx.store.store(
                AssetKind::Document.subdir(),
                &download.filename,
                &download.bytes,
            )?;
            debug!(asset = %asset.id, path = %path.display(), "stored document");

            active.source_filename = Set(Some(download.filename.clone()));
            active.original_filesize = Set(asset.file_size);
            active.file_path = Set(path.to_string_lossy().into_owned());
            active.file_size = Set(download.bytes.len() as i64);
            active.mime_type = Set(download.mime_type().unwrap_or_else(|| "application/octet-stream".to_owned()));
            stored_path = Some(path);
        }

        let saved = if existing.is_some() {
            active.update(ctx.db.conn()).await?
        } else {
            active
                .insert(ctx.db.conn())
                .await
                .map_err(|err| map_insert_err(err, stored_path.clone()))?
        };

        if let (Some(old), Some(new)) = (existing.as_ref().map(|m| &m.file_path), &stored_path) {
            if std::path::Path::new(old) != new.as_path() {
                ctx.store.discard(std::path::Path::new(old))?;
            }
        }

        Ok(saved)
    }

    async fn delete(ctx: &SyncContext, model: Self::Model) -> Result<()> {
        let file = PathBuf::from(&model.file_path);
        document::Entity::delete_by_id(model.id)
            .exec(ctx.db.conn())
            .await?;
        ctx.store.discard(&file)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_original_is_reported_as_a_privacy_problem() {
        let asset: Asset = serde_json::from_value(json!({
            "id": "abc",
            "dateModified": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let err = extract_file_source(&asset).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("private"), "{message}");
        assert!(message.contains("'abc'"), "{message}");
    }
}
