use clap::Parser;
use gluten_rag::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Query(args) => cli::query::run(args).await,
        Command::Validate(args) => cli::validate::run(args).await,
        Command::ExportSeed(args) => cli::export_seed::run(args).await,
    }
}
