pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "studydb")]
#[command(about = "Browse and transfer study folders in an S3-compatible bucket")]
pub struct Args {
    /// Path to the bucket configuration file
    #[arg(long, global = true, default_value = "./s3.json")]
    pub config: PathBuf,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: crate::Command,
}
