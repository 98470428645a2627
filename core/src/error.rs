//! Error taxonomy for the sync engine.
//!
//! The distinctions matter operationally: transport and content errors are
//! worth retrying later, size-limit errors are permanent for the attempt,
//! and asset data errors point at configuration rather than at Bynder.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;
use crate::download::DownloadError;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Metadata fetch failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// File fetch failed (transport, status, size ceiling, sniffed content)
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The API representation is missing something the sync needs. A
    /// configuration or permission mismatch, not a transient failure;
    /// retrying cannot fix it.
    #[error("{0}")]
    AssetData(String),

    /// Image decode/convert failure
    #[error("image processing failed: {0}")]
    Image(#[from] bynder_sync_images::Error),

    /// Database error
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// Filesystem error from the media store
    #[error("media store error: {0}")]
    Io(#[from] std::io::Error),

    /// An insert hit a unique constraint. Carries the file stored for the
    /// failed row, if any, so the caller can clean up after losing a
    /// concurrent-creation race.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation {
        constraint: String,
        stored_file: Option<PathBuf>,
    },
}

impl SyncError {
    /// True when this is a `bynder_id` uniqueness conflict, meaning another
    /// writer materialised the same asset first. Conflicts on any other column are
    /// real errors and must propagate.
    #[must_use]
    pub fn is_bynder_id_conflict(&self) -> bool {
        matches!(self, Self::UniqueViolation { constraint, .. } if constraint.contains("bynder_id"))
    }
}
