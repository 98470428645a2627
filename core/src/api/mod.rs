//! Bynder REST API client.
//!
//! The sync engine only needs two calls from the v4 API: a filtered media
//! listing and a single-asset lookup. Both sit behind the [`AssetBank`]
//! trait so the engine can be driven against an in-process fake in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::AssetKind;

pub mod model;

pub use model::{Asset, FocusPoint};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("api request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api request to '{url}' returned status {status}")]
    Status { url: String, status: StatusCode },

    /// The asset no longer exists upstream. Distinct from other failures
    /// because full refreshes treat it as "unrecognized", not as an error.
    #[error("asset '{0}' was not found in Bynder")]
    NotFound(String),
}

/// Filters applied to a media listing.
#[derive(Debug, Clone, Default)]
pub struct MediaQuery {
    /// Only assets modified at or after this instant
    pub modified_since: Option<DateTime<Utc>>,
    /// Page size; also the listing's short-page termination threshold
    pub page_size: u64,
    pub asset_type: Option<AssetKind>,
}

/// The slice of Bynder the sync engine talks to.
#[async_trait]
pub trait AssetBank: Send + Sync {
    /// One page of the media listing, newest-modified first. Pages are
    /// 1-based, matching the upstream API.
    async fn media_list(&self, query: &MediaQuery, page: u64) -> Result<Vec<Asset>, ApiError>;

    /// The full record for a single asset.
    async fn media_info(&self, id: &str) -> Result<Asset, ApiError>;
}

/// HTTP client for the Bynder v4 API.
#[derive(Debug, Clone)]
pub struct BynderClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl BynderClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: String, api_token: String) -> Self {
        Self {
            http,
            base_url,
            api_token,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_owned(),
                status,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AssetBank for BynderClient {
    async fn media_list(&self, query: &MediaQuery, page: u64) -> Result<Vec<Asset>, ApiError> {
        let url = format!("{}/media/", self.base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("orderBy", "dateModified desc".to_owned()),
            ("page", page.to_string()),
            ("limit", query.page_size.to_string()),
        ];
        if let Some(since) = query.modified_since {
            params.push(("dateModified", since.format("%Y-%m-%dT%H:%M:%SZ").to_string()));
        }
        if let Some(kind) = query.asset_type {
            params.push(("type", kind.api_type().to_owned()));
        }

        let assets: Vec<Asset> = self.get_json(&url, &params).await?;
        debug!(page, count = assets.len(), "fetched media listing page");
        Ok(assets)
    }

    async fn media_info(&self, id: &str) -> Result<Asset, ApiError> {
        let url = format!("{}/media/{id}/", self.base_url);
        match self.get_json(&url, &[]).await {
            Err(ApiError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(ApiError::NotFound(id.to_owned()))
            }
            other => other,
        }
    }
}

/// Lazy traversal of a media listing, one page per `next_page` call.
///
/// Pages are only fetched as consumed, so a sync that stops early never
/// pulls the whole listing. The listing is exhausted once a page comes back
/// empty or shorter than the page size.
pub struct MediaPages<'a> {
    bank: &'a dyn AssetBank,
    query: MediaQuery,
    page: u64,
    done: bool,
}

impl<'a> MediaPages<'a> {
    #[must_use]
    pub fn new(bank: &'a dyn AssetBank, query: MediaQuery) -> Self {
        Self {
            bank,
            query,
            page: 1,
            done: false,
        }
    }

    /// The next page of assets, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Asset>>, ApiError> {
        if self.done {
            return Ok(None);
        }
        let assets = self.bank.media_list(&self.query, self.page).await?;
        self.page += 1;
        if (assets.len() as u64) < self.query.page_size {
            self.done = true;
        }
        if assets.is_empty() {
            return Ok(None);
        }
        Ok(Some(assets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    struct PagedBank {
        pages: Vec<Vec<Asset>>,
        calls: Mutex<Vec<u64>>,
    }

    fn asset(id: &str) -> Asset {
        serde_json::from_value(json!({
            "id": id,
            "dateModified": "2024-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[async_trait]
    impl AssetBank for PagedBank {
        async fn media_list(&self, _query: &MediaQuery, page: u64) -> Result<Vec<Asset>, ApiError> {
            self.calls.lock().unwrap().push(page);
            Ok(self
                .pages
                .get(page as usize - 1)
                .cloned()
                .unwrap_or_default())
        }

        async fn media_info(&self, id: &str) -> Result<Asset, ApiError> {
            Err(ApiError::NotFound(id.to_owned()))
        }
    }

    #[tokio::test]
    async fn short_page_terminates_the_listing() {
        let bank = PagedBank {
            pages: vec![
                vec![asset("a"), asset("b")],
                vec![asset("c")], // short: last page
            ],
            calls: Mutex::new(Vec::new()),
        };
        let query = MediaQuery {
            page_size: 2,
            ..MediaQuery::default()
        };
        let mut pages = MediaPages::new(&bank, query);

        assert_eq!(pages.next_page().await.unwrap().unwrap().len(), 2);
        assert_eq!(pages.next_page().await.unwrap().unwrap().len(), 1);
        assert!(pages.next_page().await.unwrap().is_none());
        // The short page ended the listing; no third request was made
        assert_eq!(*bank.calls.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let bank = PagedBank {
            pages: vec![],
            calls: Mutex::new(Vec::new()),
        };
        let query = MediaQuery {
            page_size: 10,
            ..MediaQuery::default()
        };
        let mut pages = MediaPages::new(&bank, query);
        assert!(pages.next_page().await.unwrap().is_none());
        assert!(pages.next_page().await.unwrap().is_none());
        assert_eq!(*bank.calls.lock().unwrap(), vec![1]);
    }
}
