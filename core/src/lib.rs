//! Bynder asset synchronization engine.
//!
//! Keeps a local CMS-style asset library (SQLite + on-disk media store) in
//! step with a Bynder Digital Asset Management instance: editors pick an
//! asset once, scheduled syncs keep the local copy fresh.

pub mod api;
pub mod config;
pub mod db;
pub mod download;
pub mod error;
pub mod storage;
pub mod sync;

pub use config::BynderConfig;
pub use error::{Result, SyncError};

/// The three kinds of asset the library materialises locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Document,
    Video,
}

impl AssetKind {
    /// Value of the `type` filter on the Bynder media listing endpoint.
    #[must_use]
    pub const fn api_type(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Video => "video",
        }
    }

    /// Subdirectory of the media store this kind's files land in.
    #[must_use]
    pub const fn subdir(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Document => "documents",
            Self::Video => "videos",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_type())
    }
}
