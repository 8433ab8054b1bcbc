pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "hashdrop")]
#[command(about = "Content-deduplicating file drop: run the daemon, upload and fetch files")]
pub struct Args {
    /// API address (defaults to localhost on the configured api_port)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the hashdrop config directory (defaults to ~/.hashdrop)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
