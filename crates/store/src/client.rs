//! Transport core: presign, send, normalize.

use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::config::BucketConfig;
use crate::error::{Result, StoreError};
use crate::list::{parse_listing, parse_storage_error, ListQuery};
use crate::payload::{Normalized, Payload};
use crate::signer::{self, StorageOp};

/// Caller-supplied transport options for one exchange.
#[derive(Debug, Default)]
pub struct FetchOptions {
    pub body: Option<Bytes>,
    pub headers: Vec<(String, String)>,
}

/// Shared, read-only handle to one bucket. Every operation presigns
/// its own URL and performs exactly one network round trip; concurrent
/// calls need no coordination.
#[derive(Debug)]
pub struct BucketClient {
    config: BucketConfig,
    http: reqwest::Client,
}

impl BucketClient {
    pub fn new(config: BucketConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Signed exchange returning the untouched response, for callers
    /// that need streaming or binary semantics.
    pub async fn fetch_raw(&self, op: &StorageOp, options: FetchOptions) -> Result<reqwest::Response> {
        let url = signer::presign(
            &self.config,
            op,
            signer::DEFAULT_VALIDITY,
            OffsetDateTime::now_utc(),
        )?;
        debug!(method = %op.method(), path = url.path(), "storage request");
        let mut request = self.http.request(op.method(), url);
        for (name, value) in &options.headers {
            request = request.header(name, value);
        }
        if let Some(body) = options.body {
            request = request.body(body);
        }
        Ok(request.send().await?)
    }

    /// Signed exchange with the body read and classified (JSON, XML or text).
    pub async fn fetch(&self, op: &StorageOp, options: FetchOptions) -> Result<Normalized> {
        let response = self.fetch_raw(op, options).await?;
        let ok = response.status().is_success();
        let body = response.text().await?;
        let payload = Payload::classify(&body)?;
        Ok(Normalized { ok, payload })
    }

    /// List objects under the query's prefix, apply its filter and map
    /// in service order, and return the mapped sequence.
    ///
    /// Only the first page is fetched; a truncated response is logged
    /// and otherwise ignored.
    pub async fn list<T>(&self, query: ListQuery<T>) -> Result<Vec<T>> {
        let (prefix, filter, map) = query.into_parts();
        let map = map.ok_or_else(|| {
            StoreError::InvalidArgument("list query requires a map function".to_string())
        })?;

        let op = StorageOp::List { prefix };
        let normalized = self.fetch(&op, FetchOptions::default()).await?;
        if !normalized.ok {
            return Err(match parse_storage_error(&normalized.payload) {
                Some((code, message)) => StoreError::Storage { code, message },
                None => StoreError::Storage {
                    code: "ListFailed".to_string(),
                    message: "listing request was not successful".to_string(),
                },
            });
        }

        let listing = parse_listing(&normalized.payload)?;
        if listing.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(listing.entries.len());
        for entry in &listing.entries {
            if let Some(filter) = &filter {
                if !filter(entry) {
                    continue;
                }
            }
            results.push(map(entry));
        }

        if listing.truncated {
            warn!(
                marker = ?listing.next_marker,
                "listing truncated: pagination beyond the first page is unimplemented"
            );
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::list::StorageEntry;

    fn unroutable_client() -> BucketClient {
        BucketClient::new(BucketConfig {
            // Reserved port, nothing listens here; a request would fail,
            // but the invalid-argument path must never get that far.
            endpoint: Some(Url::parse("http://127.0.0.1:1").unwrap()),
            region: Some("us-east-1".to_string()),
            signing_region: None,
            bucket: "studies".to_string(),
            access_key_id: "test".to_string(),
            secret_key: "test".to_string(),
            force_path_style: true,
        })
    }

    #[tokio::test]
    async fn test_list_without_map_fails_before_any_network_io() {
        let client = unroutable_client();
        let query: ListQuery<String> = ListQuery::new().prefix("anything");
        let err = client.list(query).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_list_with_map_reaches_the_network() {
        let client = unroutable_client();
        let query = ListQuery::new().map(|entry: &StorageEntry| entry.key.clone());
        let err = client.list(query).await.unwrap_err();
        // Past validation, so the dead endpoint is what fails
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
