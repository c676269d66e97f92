use futures::StreamExt;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::storage::MenuItem;

const MAX_MENU_SIZE: usize = 1024 * 1024; // 1MB

/// Errors that can occur while downloading and decoding the remote menu.
///
/// None of these are retried: a failed fetch leaves the store empty and is
/// reported to the user.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Body was not a valid menu document
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 1MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Where the menu comes from when the local cache is empty.
pub trait MenuSource {
    /// Fetch the full menu, with ids assigned sequentially from 1 in list order.
    fn fetch_menu(&self) -> impl Future<Output = Result<Vec<MenuItem>, FetchError>> + Send;
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct MenuDocument {
    menu: Vec<RemoteMenuEntry>,
}

#[derive(Debug, Deserialize)]
struct RemoteMenuEntry {
    name: String,
    price: RemotePrice,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
    category: String,
}

/// The endpoint has published prices both as numbers and as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemotePrice {
    Number(f64),
    Text(String),
}

impl RemotePrice {
    fn to_decimal(&self) -> Option<f64> {
        let value = match self {
            RemotePrice::Number(n) => *n,
            RemotePrice::Text(s) => s.trim().trim_start_matches('$').parse().ok()?,
        };
        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

/// Decode a menu document into items numbered `index + 1`.
///
/// The whole document is rejected if any entry has an empty name or a price
/// that is not a non-negative number, so a partial menu is never stored.
pub fn parse_menu(bytes: &[u8]) -> Result<Vec<MenuItem>, FetchError> {
    let document: MenuDocument =
        serde_json::from_slice(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    document
        .menu
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let id = index as i64 + 1;
            if entry.name.trim().is_empty() {
                return Err(FetchError::Parse(format!("entry {id} has an empty name")));
            }
            let price = entry.price.to_decimal().ok_or_else(|| {
                FetchError::Parse(format!("entry {id} ({}) has an invalid price", entry.name))
            })?;
            Ok(MenuItem {
                id,
                name: entry.name,
                price,
                description: entry.description,
                image: entry.image,
                category: entry.category,
            })
        })
        .collect()
}

// ============================================================================
// HTTP source
// ============================================================================

/// Fetches the menu document from a fixed URL with a single GET.
#[derive(Debug, Clone)]
pub struct HttpMenuSource {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpMenuSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl MenuSource for HttpMenuSource {
    async fn fetch_menu(&self) -> Result<Vec<MenuItem>, FetchError> {
        tracing::info!(url = %self.url, "Fetching remote menu");

        let response = tokio::time::timeout(self.timeout, self.client.get(&self.url).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            tracing::warn!(url = %self.url, status = %response.status(), "Menu fetch failed");
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = tokio::time::timeout(self.timeout, read_limited_bytes(response, MAX_MENU_SIZE))
            .await
            .map_err(|_| FetchError::Timeout)??;

        let items = parse_menu(&bytes)?;
        tracing::info!(count = items.len(), "Remote menu decoded");
        Ok(items)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
