//! Download transport: fetch a remote asset binary into memory under a size
//! ceiling.
//!
//! The body is consumed chunk by chunk so an oversized download is aborted
//! as soon as the ceiling is crossed, long before the whole payload lands in
//! memory. A partial buffer is never returned to a caller. The operation has
//! no side effects and is safe to retry.

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::BynderConfig;

/// How many leading bytes to inspect when sniffing for an HTML error page.
const SNIFF_WINDOW: usize = 1024;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("download failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("download of '{url}' returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("download of '{url}' returned an empty body")]
    EmptyBody { url: String },

    /// The accumulated body crossed the configured ceiling. Permanent for
    /// this attempt; reported separately from transport failures so
    /// operators can tell "too big" from "broken".
    #[error(
        "file '{filename}' exceeded the size limit enforced by the `{limit_setting}` \
         setting, which is currently {max_bytes} bytes"
    )]
    TooLarge {
        filename: String,
        limit_setting: &'static str,
        max_bytes: u64,
    },

    /// A 200 response carrying HTML where an image was expected, the
    /// signature of an upstream gateway hiccup. Retry later rather than
    /// reconfiguring.
    #[error("'{url}' returned HTML where an image was expected; retry once the upstream recovers")]
    InvalidContent { url: String },
}

/// A fetched asset binary plus what the caller needs to name and type it.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    /// Declared content type, stripped of parameters, if the response had one
    pub content_type: Option<String>,
    /// Basename of the requested URL
    pub filename: String,
}

impl Download {
    /// Declared content type, falling back to extension-based guessing.
    #[must_use]
    pub fn mime_type(&self) -> Option<String> {
        self.content_type.clone().or_else(|| {
            mime_guess::from_path(&self.filename)
                .first()
                .map(|m| m.essence_str().to_owned())
        })
    }
}

/// Download an image derivative, sniffing for HTML masquerading as image
/// bytes, under the configured image size ceiling.
pub async fn download_image(
    client: &reqwest::Client,
    url: &str,
    config: &BynderConfig,
) -> Result<Download, DownloadError> {
    fetch(client, url, config.max_image_file_size, "max_image_file_size", true).await
}

/// Download a document original under the configured document size ceiling.
pub async fn download_document(
    client: &reqwest::Client,
    url: &str,
    config: &BynderConfig,
) -> Result<Download, DownloadError> {
    fetch(
        client,
        url,
        config.max_document_file_size,
        "max_document_file_size",
        false,
    )
    .await
}

/// Stream `url` into memory, failing once more than `max_bytes` have
/// accumulated. `limit_setting` names the config field enforcing the
/// ceiling, so the error message tells an operator exactly what to raise.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    max_bytes: u64,
    limit_setting: &'static str,
    sniff_html: bool,
) -> Result<Download, DownloadError> {
    let filename = filename_from_url(url);

    let mut response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_owned(),
            status,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or_default().trim().to_owned())
        .filter(|value| !value.is_empty());

    let mut bytes: Vec<u8> = Vec::new();
    let mut sniffed = false;
    while let Some(chunk) = response.chunk().await? {
        bytes.extend_from_slice(&chunk);
        if bytes.len() as u64 > max_bytes {
            // The partial buffer is dropped right here; an oversized
            // download must never be observable by callers.
            return Err(DownloadError::TooLarge {
                filename,
                limit_setting,
                max_bytes,
            });
        }
        if sniff_html && !sniffed && bytes.len() >= SNIFF_WINDOW {
            sniffed = true;
            if looks_like_html(&bytes[..SNIFF_WINDOW]) {
                return Err(DownloadError::InvalidContent { url: url.to_owned() });
            }
        }
    }

    if bytes.is_empty() {
        return Err(DownloadError::EmptyBody { url: url.to_owned() });
    }
    if sniff_html && !sniffed && looks_like_html(&bytes) {
        return Err(DownloadError::InvalidContent { url: url.to_owned() });
    }

    debug!(url, size = bytes.len(), ?content_type, "downloaded asset file");
    Ok(Download {
        bytes,
        content_type,
        filename,
    })
}

/// Basename of a URL path, with any query string or fragment stripped.
#[must_use]
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path).to_owned()
}

fn looks_like_html(head: &[u8]) -> bool {
    let lowered = head[..head.len().min(SNIFF_WINDOW)].to_ascii_lowercase();
    lowered.windows(5).any(|w| w == b"<html") || lowered.windows(9).any(|w| w == b"<!doctype")
}
