//! Error types for the study folder store.

/// Errors that can occur when talking to the storage service.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Caller supplied a malformed argument; detected before any I/O
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A parsed object carried a disallowed key name
    #[error("unsafe object: disallowed key {0:?}")]
    UnsafeObject(String),

    /// The storage service reported a coded error
    #[error("storage error {code}: {message}")]
    Storage { code: String, message: String },

    /// The HTTP exchange itself failed
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Key does not exist in the bucket
    #[error("no such key: {0}")]
    NotFound(String),

    /// Non-success response on a file download
    #[error("download failed for {0}")]
    DownloadFailed(String),

    /// Requested operation has no implementation
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Rejection from the pre-upload policy hook, propagated verbatim
    #[error("Policy Violation: {0}")]
    PolicyViolation(String),

    /// Downloaded text file was not valid UTF-8
    #[error("{0} is not valid UTF-8")]
    Utf8(String),

    /// JSON parse error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parse error
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// URL construction error
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Timestamp formatting error while signing
    #[error("time format error: {0}")]
    TimeFormat(#[from] time::error::Format),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
