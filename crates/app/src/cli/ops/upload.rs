use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use store::{FileContent, StoreError, UploadRequest};

/// Upload one file into a study folder.
#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Target folder (created on first marker upload)
    #[arg(long)]
    pub folder: String,

    /// File name inside the folder
    #[arg(long)]
    pub name: String,

    /// Local file to read
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("{name} must contain valid JSON: {source}")]
    InvalidJson {
        name: String,
        source: serde_json::Error,
    },
}

fn content_for(name: &str, bytes: Vec<u8>) -> Result<FileContent, UploadError> {
    if name.ends_with(".json") {
        let value = serde_json::from_slice(&bytes).map_err(|source| UploadError::InvalidJson {
            name: name.to_string(),
            source,
        })?;
        Ok(FileContent::Json(value))
    } else if name.ends_with(".txt") || name.ends_with(".md") {
        match String::from_utf8(bytes) {
            Ok(text) => Ok(FileContent::Text(text)),
            Err(raw) => Ok(FileContent::Binary(Bytes::from(raw.into_bytes()))),
        }
    } else {
        Ok(FileContent::Binary(Bytes::from(bytes)))
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Upload {
    type Error = UploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bytes = tokio::fs::read(&self.input)
            .await
            .map_err(|source| UploadError::Read {
                path: self.input.display().to_string(),
                source,
            })?;
        let len = bytes.len();
        let content = content_for(&self.name, bytes)?;

        // The marker upload is what creates a folder, so no discovery
        // round trip is needed here.
        let folder = ctx.db.new_folder(&self.folder);
        folder
            .upload(UploadRequest {
                name: self.name.clone(),
                content,
            })
            .await?;
        Ok(format!(
            "uploaded {}/{} ({} bytes)",
            self.folder, self.name, len
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_for_json() {
        let content = content_for("config.json", b"{\"periods\": 10}".to_vec()).unwrap();
        assert!(matches!(content, FileContent::Json(_)));
    }

    #[test]
    fn test_content_for_invalid_json_is_rejected() {
        let err = content_for("config.json", b"not json".to_vec()).unwrap_err();
        assert!(matches!(err, UploadError::InvalidJson { .. }));
    }

    #[test]
    fn test_content_for_text_and_binary() {
        assert!(matches!(
            content_for("notes.txt", b"hello".to_vec()).unwrap(),
            FileContent::Text(_)
        ));
        assert!(matches!(
            content_for("run.zip", b"PK\x03\x04".to_vec()).unwrap(),
            FileContent::Binary(_)
        ));
    }
}
