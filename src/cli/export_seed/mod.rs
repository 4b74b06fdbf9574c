//! Export-seed command - writes the built-in knowledge base as JSON

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::infrastructure::knowledge_base::seed_json;

/// Arguments for the export-seed command
#[derive(Args, Clone, Debug)]
pub struct ExportSeedArgs {
    /// Output file; stdout when omitted
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Run the export-seed command
pub async fn run(args: ExportSeedArgs) -> anyhow::Result<()> {
    super::bootstrap()?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, seed_json()).await?;
            info!(path = %path.display(), "Seed knowledge base written");
        }
        None => print!("{}", seed_json()),
    }

    Ok(())
}
