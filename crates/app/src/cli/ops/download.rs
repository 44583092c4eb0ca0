use std::path::PathBuf;

use clap::Args;
use store::{FileContent, StoreError};

/// Download one file from a study folder.
#[derive(Args, Debug, Clone)]
pub struct Download {
    /// Folder to download from
    #[arg(long)]
    pub folder: String,

    /// File name inside the folder (.json, .txt, .md or .zip)
    #[arg(long)]
    pub name: String,

    /// Write to this path instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("{0} is binary; use --output to save it")]
    BinaryToStdout(String),
    #[error("cannot render {0}: {1}")]
    Render(String, serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Download {
    type Error = DownloadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let folder = ctx.resolve_folder(&self.folder).await?;
        let content = folder.download(&self.name).await?;

        match &self.output {
            Some(path) => {
                let bytes = content.into_bytes()?;
                let len = bytes.len();
                tokio::fs::write(path, &bytes)
                    .await
                    .map_err(|source| DownloadError::Write {
                        path: path.display().to_string(),
                        source,
                    })?;
                Ok(format!("wrote {} ({} bytes)", path.display(), len))
            }
            None => match content {
                FileContent::Json(value) => serde_json::to_string_pretty(&value)
                    .map_err(|e| DownloadError::Render(self.name.clone(), e)),
                FileContent::Text(text) => Ok(text),
                FileContent::Binary(_) => Err(DownloadError::BinaryToStdout(self.name.clone())),
            },
        }
    }
}
