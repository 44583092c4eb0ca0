//! Listing engine: prefix/filter/map over one page of list results.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::{Result, StoreError};
use crate::payload::Payload;

/// One record from a listing response. Exists only for the duration of
/// one call's filter/map pass.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<OffsetDateTime>,
}

type EntryFilter = Box<dyn Fn(&StorageEntry) -> bool + Send + Sync>;
type EntryMap<T> = Box<dyn Fn(&StorageEntry) -> T + Send + Sync>;

/// Transient description of one listing call. `map` is mandatory: a
/// query executed without one fails before any network I/O. Built
/// fresh per call, never persisted.
pub struct ListQuery<T> {
    prefix: Option<String>,
    filter: Option<EntryFilter>,
    map: Option<EntryMap<T>>,
}

impl<T> Default for ListQuery<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListQuery<T> {
    pub fn new() -> Self {
        Self {
            prefix: None,
            filter: None,
            map: None,
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn filter(mut self, filter: impl Fn(&StorageEntry) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn map(mut self, map: impl Fn(&StorageEntry) -> T + Send + Sync + 'static) -> Self {
        self.map = Some(Box::new(map));
        self
    }

    /// Rebind the query under an outer namespace: the effective prefix
    /// becomes `{outer}{inner}`, so a scoped caller can only observe
    /// keys under its own name.
    pub(crate) fn scoped(mut self, outer: &str) -> Self {
        let inner = self.prefix.take().unwrap_or_default();
        self.prefix = Some(format!("{}{}", outer, inner));
        self
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Option<EntryFilter>, Option<EntryMap<T>>) {
        (self.prefix, self.filter, self.map)
    }
}

/// One normalized page of list results.
#[derive(Debug, Default)]
pub(crate) struct Listing {
    pub entries: Vec<StorageEntry>,
    pub truncated: bool,
    pub next_marker: Option<String>,
}

fn as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

/// `Size` arrives as a JSON number or an XML string.
fn parse_size(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn parse_entry(value: &Value) -> Option<StorageEntry> {
    let key = value.get("Key").and_then(as_str)?.to_string();
    let size = parse_size(value.get("Size"));
    let last_modified = value
        .get("LastModified")
        .and_then(as_str)
        .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok());
    Some(StorageEntry {
        key,
        size,
        last_modified,
    })
}

fn is_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

/// Extract the entries collection from a normalized response body,
/// smoothing the wire irregularities: a single-entry result may arrive
/// as a bare object and an empty listing has no `Contents` at all.
pub(crate) fn parse_listing(payload: &Payload) -> Result<Listing> {
    let value = payload.value().ok_or_else(|| StoreError::Storage {
        code: "MalformedListing".to_string(),
        message: "listing response was not structured".to_string(),
    })?;
    // XML bodies nest everything under the document element
    let result = value.get("ListBucketResult").unwrap_or(value);

    let entries = match result.get("Contents") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(parse_entry).collect(),
        Some(single) => parse_entry(single).into_iter().collect(),
    };

    let truncated = is_true(result.get("IsTruncated"));
    let next_marker = result
        .get("NextMarker")
        .or_else(|| result.get("NextContinuationToken"))
        .and_then(as_str)
        .map(str::to_string);

    Ok(Listing {
        entries,
        truncated,
        next_marker,
    })
}

/// Pull a `(Code, Message)` pair out of a failed response body, when
/// the service sent a recognizable one.
pub(crate) fn parse_storage_error(payload: &Payload) -> Option<(String, String)> {
    let value = payload.value()?;
    let error = value.get("Error").unwrap_or(value);
    let code = error.get("Code").and_then(as_str)?.to_string();
    let message = error
        .get("Message")
        .and_then(as_str)
        .unwrap_or_default()
        .to_string();
    Some((code, message))
}
