//! Image sync target.
//!
//! Images are the only kind with real processing: the source derivative is
//! downloaded, converted to a library-friendly format within the configured
//! bounding box, and the asset's focus point is turned into a square focal
//! rectangle against the converted dimensions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use bynder_sync_images::{convert, focal_rect_from_point, ConvertOptions, Dimensions, FocusPoint};

use crate::api::Asset;
use crate::config::BynderConfig;
use crate::db::entities::image;
use crate::download::download_image;
use crate::error::{Result, SyncError};
use crate::sync::{file_fingerprint_changed, map_insert_err, ApplyOptions, SyncContext, SyncTarget};
use crate::AssetKind;

pub struct ImageSync;

/// URL of the derivative the library file is built from. Missing means the
/// Bynder instance doesn't expose the configured derivative for this asset,
/// which is a setup problem the error message should pin down precisely.
pub(crate) fn extract_file_source(config: &BynderConfig, asset: &Asset) -> Result<String> {
    asset
        .thumbnails
        .get(&config.image_source_derivative)
        .cloned()
        .ok_or_else(|| {
            let mut available: Vec<&str> = asset.thumbnails.keys().map(String::as_str).collect();
            available.sort_unstable();
            SyncError::AssetData(format!(
                "asset '{}' has no '{}' thumbnail derivative (set by the \
                 `image_source_derivative` setting); available derivatives: [{}]",
                asset.id,
                config.image_source_derivative,
                available.join(", ")
            ))
        })
}

/// Images also re-download when the original's dimensions change, since the
/// focal rectangle and conversion output depend on them. Absent values
/// compare as zero on both sides.
fn asset_file_has_changed(model: &image::Model, source_url: &str, asset: &Asset) -> bool {
    if file_fingerprint_changed(
        model.source_filename.as_deref(),
        model.original_filesize,
        source_url,
        asset,
    ) {
        return true;
    }
    let upstream_width = asset.width.unwrap_or(0) as i32;
    let upstream_height = asset.height.unwrap_or(0) as i32;
    model.original_width.unwrap_or(0) != upstream_width
        || model.original_height.unwrap_or(0) != upstream_height
}

/// Map the asset's focus point onto focal columns. A usable point sets the
/// rectangle, an absent point clears it, and an unusable point (negative or
/// outside the original) leaves whatever is stored untouched; a bad focus
/// point must not lose the file update.
fn update_focal(active: &mut image::ActiveModel, asset: &Asset, stored: Option<Dimensions>) {
    let Some(point) = asset.active_original_focus_point else {
        active.focal_point_x = Set(None);
        active.focal_point_y = Set(None);
        active.focal_point_width = Set(None);
        active.focal_point_height = Set(None);
        return;
    };

    if point.x < 0.0 || point.y < 0.0 {
        warn!(asset = %asset.id, x = point.x, y = point.y, "negative focus point, keeping stored focal rectangle");
        return;
    }
    let (Some(source_width), Some(source_height)) = (asset.width, asset.height) else {
        warn!(asset = %asset.id, "focus point without original dimensions, keeping stored focal rectangle");
        return;
    };
    let Some(stored) = stored else {
        return;
    };

    let point = FocusPoint {
        x: point.x.round() as u32,
        y: point.y.round() as u32,
    };
    let source = Dimensions {
        width: source_width,
        height: source_height,
    };
    match focal_rect_from_point(point, source, stored) {
        Ok(rect) => {
            active.focal_point_x = Set(Some(rect.x as i32));
            active.focal_point_y = Set(Some(rect.y as i32));
            active.focal_point_width = Set(Some(rect.width as i32));
            active.focal_point_height = Set(Some(rect.height as i32));
        }
        Err(err) => {
            warn!(asset = %asset.id, %err, "unusable focus point, keeping stored focal rectangle");
        }
    }
}

#[async_trait]
impl SyncTarget for ImageSync {
    type Model = image::Model;

    const KIND: AssetKind = AssetKind::Image;
    // Listing records omit thumbnails and the focus point
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

    fn stored_file(model: &Self::Model) -> Option<PathBuf> {
        Some(PathBuf::from(&model.file_path))
    }

    async fn find_by_bynder_id(
        ctx: &SyncContext,
        bynder_id: &str,
    ) -> Result<Option<Self::Model>> {
        Ok(image::Entity::find()
            .filter(image::Column::BynderId.eq(bynder_id))
            .one(ctx.db.conn())
            .await?)
    }

    async fn find_synced(ctx: &SyncContext, min_id: Option<i32>) -> Result<Vec<Self::Model>> {
        let mut query = image::Entity::find().filter(image::Column::BynderId.is_not_null());
        if let Some(min_id) = min_id {
            query = query.filter(image::Column::Id.gte(min_id));
        }
        Ok(query.order_by_asc(image::Column::Id).all(ctx.db.conn()).await?)
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
                Condition::all().add(image::Column::BynderId.eq(id.as_str())).add(
                    Condition::any()
                        .add(image::Column::BynderLastModified.lt(asset.date_modified))
                        .add(image::Column::BynderLastModified.is_null()),
                ),
            );
        }
        Ok(image::Entity::find().filter(condition).all(ctx.db.conn()).await?)
    }

    async fn apply_and_save(
        ctx: &SyncContext,
        existing: Option<Self::Model>,
        asset: &Asset,
        opts: &ApplyOptions,
    ) -> Result<Self::Model> {
        let source_url = extract_file_source(&ctx.config, asset)?;
        let needs_file = opts.force_download
            || existing
                .as_ref()
                .map_or(true, |model| asset_file_has_changed(model, &source_url, asset));

        let now = Utc::now();
        let mut active: image::ActiveModel = match &existing {
            Some(model) => model.clone().into(),
            None => image::ActiveModel {
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
        let mut stored_dims = existing.as_ref().map(|model| Dimensions {
            width: model.width as u32,
            height: model.height as u32,
        });
        if needs_file {
            let download = download_image(&ctx.http, &source_url, &ctx.config).await?;
            let options = ConvertOptions {
                max_width: ctx.config.max_source_image_width,
                max_height: ctx.config.max_source_image_height,
                format_overrides: ctx.config.format_conversions.clone(),
            };
            let converted = convert(&download.bytes, &options)?;

            let stem = Path::new(&download.filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&download.filename);
            let filename = format!("{stem}.{}", converted.extension());
            let path = ctx
                .store
                .store(AssetKind::Image.subdir(), &filename, &converted.data)?;
            debug!(asset = %asset.id, path = %path.display(), "converted and stored image");

            active.source_filename = Set(Some(download.filename.clone()));
            active.original_filesize = Set(asset.file_size);
            active.original_width = Set(asset.width.map(|v| v as i32));
            active.original_height = Set(asset.height.map(|v| v as i32));
            active.file_path = Set(path.to_string_lossy().into_owned());
            active.width = Set(converted.width as i32);
            active.height = Set(converted.height as i32);
            active.file_size = Set(converted.byte_size() as i64);
            active.mime_type = Set(converted.mime_type.clone());
            stored_dims = Some(Dimensions {
                width: converted.width,
                height: converted.height,
            });
            stored_path = Some(path);
        }

        update_focal(&mut active, asset, stored_dims);

        let saved = if existing.is_some() {
            active.update(ctx.db.conn()).await?
        } else {
            active
                .insert(ctx.db.conn())
                .await
                .map_err(|err| map_insert_err(err, stored_path.clone()))?
        };

        // The converted file may have a new name; drop the superseded one
        if let (Some(old), Some(new)) = (existing.as_ref().map(|m| &m.file_path), &stored_path) {
            if Path::new(old) != new.as_path() {
                ctx.store.discard(Path::new(old))?;
            }
        }

        Ok(saved)
    }

    async fn delete(ctx: &SyncContext, model: Self::Model) -> Result<()> {
        let file = PathBuf::from(&model.file_path);
        image::Entity::delete_by_id(model.id).exec(ctx.db.conn()).await?;
        ctx.store.discard(&file)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn asset_with_thumbnails(thumbnails: serde_json::Value) -> Asset {
        serde_json::from_value(json!({
            "id": "abc",
            "dateModified": "2024-01-01T00:00:00Z",
            "thumbnails": thumbnails
        }))
        .unwrap()
    }

    #[test]
    fn extract_file_source_picks_the_configured_derivative() {
        let config = BynderConfig::default();
        let asset = asset_with_thumbnails(json!({
            "WebSource": "https://org.bynder.com/m/abc/WebSource-photo.png",
            "mini": "https://org.bynder.com/m/abc/mini-photo.png"
        }));
        assert_eq!(
            extract_file_source(&config, &asset).unwrap(),
            "https://org.bynder.com/m/abc/WebSource-photo.png"
        );
    }

    #[test]
    fn extract_file_source_names_the_setting_and_lists_derivatives() {
        let config = BynderConfig::default();
        let asset = asset_with_thumbnails(json!({
            "webimage": "https://x/webimage.png",
            "mini": "https://x/mini.png"
        }));
        let err = extract_file_source(&config, &asset).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("image_source_derivative"), "{message}");
        assert!(message.contains("'WebSource'"), "{message}");
        assert!(message.contains("[mini, webimage]"), "{message}");
    }

    #[test]
    fn dimension_changes_trigger_a_file_refresh() {
        let model = image::Model {
            id: 1,
            bynder_id: Some("abc".to_owned()),
            bynder_last_modified: None,
            title: String::new(),
            description: String::new(),
            copyright: String::new(),
            is_archived: false,
            is_limited_use: false,
            is_public: false,
            collection_id: None,
            source_filename: Some("WebSource-photo.png".to_owned()),
            original_filesize: Some(100),
            original_width: Some(3000),
            original_height: Some(2008),
            file_path: "x".to_owned(),
            width: 50,
            height: 33,
            file_size: 10,
            mime_type: "image/png".to_owned(),
            focal_point_x: None,
            focal_point_y: None,
            focal_point_width: None,
            focal_point_height: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let url = "https://org.bynder.com/m/abc/WebSource-photo.png";

        let unchanged: Asset = serde_json::from_value(json!({
            "id": "abc",
            "dateModified": "2024-01-01T00:00:00Z",
            "fileSize": 100,
            "width": 3000,
            "height": 2008
        }))
        .unwrap();
        assert!(!asset_file_has_changed(&model, url, &unchanged));

        let recropped: Asset = serde_json::from_value(json!({
            "id": "abc",
            "dateModified": "2024-01-01T00:00:00Z",
            "fileSize": 100,
            "width": 2400,
            "height": 2008
        }))
        .unwrap();
        assert!(asset_file_has_changed(&model, url, &recropped));
    }

    #[test]
    fn negative_focus_point_keeps_stored_rectangle() {
        let asset: Asset = serde_json::from_value(json!({
            "id": "abc",
            "dateModified": "2024-01-01T00:00:00Z",
            "width": 3000,
            "height": 2008,
            "activeOriginalFocusPoint": {"x": -10.0, "y": 550.0}
        }))
        .unwrap();
        let mut active = <image::ActiveModel as Default>::default();
        update_focal(
            &mut active,
            &asset,
            Some(Dimensions {
                width: 50,
                height: 33,
            }),
        );
        // Untouched: still NotSet, so an update would not write the columns
        assert!(matches!(active.focal_point_x, sea_orm::ActiveValue::NotSet));
    }

    #[test]
    fn focus_point_maps_to_a_square_rectangle() {
        let asset: Asset = serde_json::from_value(json!({
            "id": "abc",
            "dateModified": "2024-01-01T00:00:00Z",
            "width": 3000,
            "height": 2008,
            "activeOriginalFocusPoint": {"x": 541.0, "y": 550.0}
        }))
        .unwrap();
        let mut active = <image::ActiveModel as Default>::default();
        update_focal(
            &mut active,
            &asset,
            Some(Dimensions {
                width: 50,
                height: 33,
            }),
        );
        assert_eq!(active.focal_point_x, Set(Some(8)));
        assert_eq!(active.focal_point_y, Set(Some(9)));
        assert_eq!(active.focal_point_width, Set(Some(13)));
        assert_eq!(active.focal_point_height, Set(Some(13)));
    }
}
