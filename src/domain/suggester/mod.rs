//! Alternative suggester domain

mod config;
mod suggest;
mod suggestion;

pub use config::SuggesterConfig;
pub use suggest::AlternativeSuggester;
pub use suggestion::{RationaleTag, SubstitutionSuggestion};
