use clap::Args;
use store::StoreError;

/// List files inside one study folder.
#[derive(Args, Debug, Clone)]
pub struct Search {
    /// Folder to search
    #[arg(long)]
    pub folder: String,

    /// Only show files whose name starts with this prefix
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Search {
    type Error = SearchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let folder = ctx.resolve_folder(&self.folder).await?;
        let files = folder.search(self.prefix.as_deref()).await?;

        if files.is_empty() {
            Ok("No files found".to_string())
        } else {
            let output = files
                .iter()
                .map(|file| format!("{} ({} bytes)", file.name, file.size))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(output)
        }
    }
}
