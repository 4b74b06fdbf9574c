//! Knowledge base sources: JSON files on disk and the embedded seed

mod loader;
mod seed;

pub use loader::{knowledge_base_to_json, load_knowledge_base, load_or_seed, parse_knowledge_base};
pub use seed::{seed_json, seed_knowledge_base};
