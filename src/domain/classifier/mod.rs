//! Gluten classifier domain

mod classify;
mod result;

pub use classify::GlutenClassifier;
pub use result::{AggregateStatus, ClassificationResult, EvidenceCitation, MentionVerdict};
