//! Query pipeline domain
//!
//! Wires the stages together per query and records each session's
//! intermediate artifacts.

mod config;
mod query;
mod response;
mod session;

pub use config::PipelineConfig;
pub use query::GlutenPipeline;
pub use response::{MentionReport, QueryRequest, QueryResponse, SuggestionReport};
pub use session::{PipelineStage, QuerySession, StageFailure, StageTiming};
