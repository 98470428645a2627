//! Video sync target.
//!
//! Videos never touch the media store. The row captures streamable
//! derivative URLs (primary, optional fallback) and a poster image URL,
//! all served straight from Bynder.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::api::Asset;
use crate::config::BynderConfig;
use crate::db::entities::video;
use crate::download::filename_from_url;
use crate::error::{Result, SyncError};
use crate::sync::{map_insert_err, ApplyOptions, SyncContext, SyncTarget};
use crate::AssetKind;

pub struct VideoSync;

#[derive(Debug)]
struct VideoSources {
    primary_url: String,
    fallback_url: Option<String>,
    poster_url: String,
}

fn missing_derivative(asset: &Asset, derivative: &str, setting: &str, available: Vec<&str>) -> SyncError {
    let mut available = available;
    available.sort_unstable();
    SyncError::AssetData(format!(
        "asset '{}' has no '{derivative}' video derivative (set by the `{setting}` setting); \
         available derivatives: [{}]",
        asset.id,
        available.join(", ")
    ))
}

/// Pull the three URLs a video row needs out of the asset record. The
/// primary derivative and the poster are required, the fallback is not.
fn extract_sources(config: &BynderConfig, asset: &Asset) -> Result<VideoSources> {
    let derivatives = asset.video_derivatives();

    let primary_url = derivatives
        .get(&config.video_primary_derivative)
        .cloned()
        .ok_or_else(|| {
            missing_derivative(
                asset,
                &config.video_primary_derivative,
                "video_primary_derivative",
                derivatives.keys().map(String::as_str).collect(),
            )
        })?;
    let fallback_url = derivatives.get(&config.video_fallback_derivative).cloned();

    let poster_url = asset
        .thumbnails
        .get(&config.video_poster_derivative)
        .cloned()
        .ok_or_else(|| {
            missing_derivative(
                asset,
                &config.video_poster_derivative,
                "video_poster_derivative",
                asset.thumbnails.keys().map(String::as_str).collect(),
            )
        })?;

    Ok(VideoSources {
        primary_url,
        fallback_url,
        poster_url,
    })
}

#[async_trait]
impl SyncTarget for VideoSync {
    type Model = video::Model;

    const KIND: AssetKind = AssetKind::Video;
    // Listing records omit videoPreviewURLs
    const NEEDS_FULL_RECORD: bool = true;

    fn numeric_id(model: &Self::Model) -> i32 {
        model.id
    }

    fn bynder_id(model: &Self::Model) -> Option<&str> {
        model.bynder_id.as_deref()
    }

    fn last_modified(model: &Self::Model) -> Option<DateTime<Utc>> {
        model.bynder_last_modified
    }

    fn stored_file(_model: &Self::Model) -> Option<PathBuf> {
        None
    }

    async fn find_by_bynder_id(
        ctx: &SyncContext,
        bynder_id: &str,
    ) -> Result<Option<Self::Model>> {
        Ok(video::Entity::find()
            .filter(video::Column::BynderId.eq(bynder_id))
            .one(ctx.db.conn())
            .await?)
    }

    async fn find_synced(ctx: &SyncContext, min_id: Option<i32>) -> Result<Vec<Self::Model>> {
        let mut query = video::Entity::find().filter(video::Column::BynderId.is_not_null());
        if let Some(min_id) = min_id {
            query = query.filter(video::Column::Id.gte(min_id));
        }
        Ok(query.order_by_asc(video::Column::Id).all(ctx.db.conn()).await?)
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
                Condition::all().add(video::Column::BynderId.eq(id.as_str())).add(
                    Condition::any()
                        .add(video::Column::BynderLastModified.lt(asset.date_modified))
                        .add(video::Column::BynderLastModified.is_null()),
                ),
            );
        }
        Ok(video::Entity::find().filter(condition).all(ctx.db.conn()).await?)
    }

    async fn apply_and_save(
        ctx: &SyncContext,
        existing: Option<Self::Model>,
        asset: &Asset,
        _opts: &ApplyOptions,
    ) -> Result<Self::Model> {
        let sources = extract_sources(&ctx.config, asset)?;

        let now = Utc::now();
        let mut active: video::ActiveModel = match &existing {
            Some(model) => model.clone().into(),
            None => video::ActiveModel {
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
        active.source_filename = Set(Some(filename_from_url(&sources.primary_url)));
        active.original_filesize = Set(asset.file_size);
        active.original_width = Set(asset.width.map(|v| v as i32));
        active.original_height = Set(asset.height.map(|v| v as i32));
        active.primary_url = Set(sources.primary_url);
        active.fallback_url = Set(sources.fallback_url);
        active.poster_url = Set(sources.poster_url);
        active.updated_at = Set(now);

        if existing.is_some() {
            Ok(active.update(ctx.db.conn()).await?)
        } else {
            active
                .insert(ctx.db.conn())
                .await
                .map_err(|err| map_insert_err(err, None))
        }
    }

    async fn delete(ctx: &SyncContext, model: Self::Model) -> Result<()> {
        video::Entity::delete_by_id(model.id).exec(ctx.db.conn()).await?;
        Ok(())
    }
}
