//! Sync engine: mirrors Bynder assets into the local library.
//!
//! The engine is generic over the three asset kinds via [`SyncTarget`].
//! Each target knows how to query its own table and how to turn an API
//! record into a saved row; the orchestration here (staleness, batching,
//! refresh, resolution) is written once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::SqlErr;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{Asset, AssetBank};
use crate::config::BynderConfig;
use crate::db::Database;
use crate::download::{filename_from_url, DownloadError};
use crate::error::{Result, SyncError};
use crate::storage::AssetStore;
use crate::AssetKind;

pub mod document;
pub mod image;
pub mod refresh;
pub mod resolve;
pub mod stale;
pub mod video;

pub use refresh::{sync_all, RefreshOptions, RefreshSummary};
pub use resolve::resolve;
pub use stale::{sync_stale, StaleOptions, StaleSummary};

/// Everything a sync operation needs, resolved up front. In particular the
/// default collection is looked up (or created) once per context, not once
/// per asset.
pub struct SyncContext {
    pub db: Database,
    pub bank: Arc<dyn AssetBank>,
    pub http: reqwest::Client,
    pub store: AssetStore,
    pub config: BynderConfig,
    pub collection_id: i32,
}

impl SyncContext {
    pub async fn new(db: Database, bank: Arc<dyn AssetBank>, config: BynderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()
            .map_err(DownloadError::from)?;
        let store = AssetStore::new(config.media_dir());
        let collection_id =
            resolve::resolve_default_collection(&db, &config.default_collection_name).await?;
        Ok(Self {
            db,
            bank,
            http,
            store,
            config,
            collection_id,
        })
    }
}

/// Knobs for a single apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Re-download and re-process the file even when the stored fingerprint
    /// matches upstream
    pub force_download: bool,
}

/// One asset kind's side of the sync engine.
#[async_trait]
pub trait SyncTarget: Send + Sync {
    type Model: Clone + Send + Sync;

    const KIND: AssetKind;
    /// Listing records omit fields this target needs (derivative URLs,
    /// focus point), so the full record must be fetched before applying.
    const NEEDS_FULL_RECORD: bool;

    fn numeric_id(model: &Self::Model) -> i32;
    fn bynder_id(model: &Self::Model) -> Option<&str>;
    fn last_modified(model: &Self::Model) -> Option<DateTime<Utc>>;
    /// Path of the file this row owns in the media store, if any.
    fn stored_file(model: &Self::Model) -> Option<PathBuf>;

    async fn find_by_bynder_id(ctx: &SyncContext, bynder_id: &str)
        -> Result<Option<Self::Model>>;

    /// All rows tracking a Bynder asset, ordered by id, optionally starting
    /// from `min_id`.
    async fn find_synced(ctx: &SyncContext, min_id: Option<i32>) -> Result<Vec<Self::Model>>;

    /// The subset of `batch` that exists locally with an older
    /// `bynder_last_modified` than the batch says upstream has.
    async fn find_stale(
        ctx: &SyncContext,
        batch: &HashMap<String, Asset>,
    ) -> Result<Vec<Self::Model>>;

    /// Map `asset` onto `existing` (or a new row), download and store files
    /// as needed, and save. Returns the saved model.
    async fn apply_and_save(
        ctx: &SyncContext,
        existing: Option<Self::Model>,
        asset: &Asset,
        opts: &ApplyOptions,
    ) -> Result<Self::Model>;

    async fn delete(ctx: &SyncContext, model: Self::Model) -> Result<()>;
}

/// A row is up to date when it has seen an upstream modification time at or
/// after the one the API reports. Equality counts: the listing filter is
/// inclusive, so assets resurface with an unchanged timestamp.
#[must_use]
pub fn is_up_to_date(last_modified: Option<DateTime<Utc>>, asset: &Asset) -> bool {
    last_modified.is_some_and(|seen| seen >= asset.date_modified)
}

/// Whether the upstream file differs from the one a row was built from,
/// judged by source filename and original file size. Metadata-only edits
/// leave both untouched and skip the download entirely. A row that never
/// recorded its stored size counts as changed unconditionally: there is
/// nothing to compare against, so the file must be fetched again.
#[must_use]
pub fn file_fingerprint_changed(
    source_filename: Option<&str>,
    original_filesize: Option<i64>,
    source_url: &str,
    asset: &Asset,
) -> bool {
    let upstream_name = filename_from_url(source_url);
    source_filename != Some(upstream_name.as_str())
        || original_filesize.is_none()
        || original_filesize != asset.file_size
}

/// Classify an insert failure: unique-constraint violations become
/// [`SyncError::UniqueViolation`] carrying the file stored for the failed
/// row, anything else stays a database error.
#[must_use]
pub fn map_insert_err(err: sea_orm::DbErr, stored_file: Option<PathBuf>) -> SyncError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(constraint)) => SyncError::UniqueViolation {
            constraint,
            stored_file,
        },
        _ => SyncError::Db(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asset_modified(at: &str) -> Asset {
        serde_json::from_value(json!({
            "id": "abc",
            "dateModified": at,
            "fileSize": 18_096_064
        }))
        .unwrap()
    }

    #[test]
    fn equal_timestamps_count_as_up_to_date() {
        let asset = asset_modified("2023-10-10T09:52:05Z");
        assert!(is_up_to_date(Some(asset.date_modified), &asset));
        assert!(is_up_to_date(
            Some(asset.date_modified + chrono::Duration::seconds(1)),
            &asset
        ));
        assert!(!is_up_to_date(
            Some(asset.date_modified - chrono::Duration::seconds(1)),
            &asset
        ));
        assert!(!is_up_to_date(None, &asset));
    }

    #[test]
    fn fingerprint_tracks_filename_and_size() {
        let asset = asset_modified("2023-10-10T09:52:05Z");
        let url = "https://org.bynder.com/m/abc/WebSource-photo.png?v=1";

        assert!(!file_fingerprint_changed(
            Some("WebSource-photo.png"),
            Some(18_096_064),
            url,
            &asset
        ));
        // Renamed upstream
        assert!(file_fingerprint_changed(
            Some("old-name.png"),
            Some(18_096_064),
            url,
            &asset
        ));
        // Never recorded a size: must re-download
        assert!(file_fingerprint_changed(
            Some("WebSource-photo.png"),
            None,
            url,
            &asset
        ));
    }

    #[test]
    fn unknown_stored_size_counts_as_changed_even_without_upstream_size() {
        // The record itself may omit fileSize; a row with no recorded size
        // still has to re-download rather than trusting a None == None match.
        let asset: Asset = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "dateModified": "2023-10-10T09:52:05Z"
        }))
        .unwrap();
        let url = "https://org.bynder.com/m/abc/WebSource-photo.png";
        assert!(file_fingerprint_changed(
            Some("WebSource-photo.png"),
            None,
            url,
            &asset
        ));
    }
}
