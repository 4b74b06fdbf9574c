//! CLI module for gluten-rag
//!
//! Provides subcommands:
//! - `query`: answer a question (or one question per stdin line)
//! - `validate`: check a knowledge base file
//! - `export-seed`: write the built-in knowledge base as JSON

pub mod export_seed;
pub mod query;
pub mod validate;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Gluten RAG - multilingual gluten lookup with gluten-free substitutes
#[derive(Parser)]
#[command(name = "gluten-rag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a gluten question
    Query(query::QueryArgs),

    /// Validate a knowledge base file (the built-in seed when no file is given)
    Validate(validate::ValidateArgs),

    /// Write the built-in knowledge base as JSON
    ExportSeed(export_seed::ExportSeedArgs),
}

/// Load `.env` and the layered configuration, then install logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
