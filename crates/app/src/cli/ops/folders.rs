use clap::Args;
use store::StoreError;

/// List study folders in the bucket.
#[derive(Args, Debug, Clone)]
pub struct Folders {
    /// Only show the folder with this name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FoldersError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Folders {
    type Error = FoldersError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let folders = ctx.db.list_study_folders(self.name.as_deref()).await?;

        if folders.is_empty() {
            Ok("No study folders found".to_string())
        } else {
            let output = folders
                .iter()
                .map(|folder| {
                    let dated = folder
                        .dated
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    format!(
                        "{} (config: {} bytes, {})",
                        folder.name,
                        folder.size.unwrap_or(0),
                        dated
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            Ok(output)
        }
    }
}
