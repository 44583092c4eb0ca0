use std::error::Error;
use std::path::Path;

use store::{BucketConfig, BucketDb, StoreError, StudyFolder};

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("cannot read bucket config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid bucket config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Clone)]
pub struct OpContext {
    /// Bucket handle shared by every operation
    pub db: BucketDb,
}

impl std::fmt::Debug for OpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpContext")
            .field("bucket", &self.db.client().bucket())
            .finish()
    }
}

impl OpContext {
    /// Load the bucket configuration from a JSON file and build the
    /// database handle.
    pub fn new(config_path: &Path) -> Result<Self, ContextError> {
        let text = std::fs::read_to_string(config_path).map_err(|source| ContextError::Read {
            path: config_path.display().to_string(),
            source,
        })?;
        let config: BucketConfig =
            serde_json::from_str(&text).map_err(|source| ContextError::Parse {
                path: config_path.display().to_string(),
                source,
            })?;
        tracing::debug!(bucket = %config.bucket, "loaded bucket config");
        Ok(Self {
            db: BucketDb::new(config),
        })
    }

    /// Look a folder up by exact name.
    pub async fn resolve_folder(&self, name: &str) -> Result<StudyFolder, StoreError> {
        let folders = self.db.list_study_folders(Some(name)).await?;
        folders
            .into_iter()
            .find(|f| f.name == name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
