//! Knowledge index domain
//!
//! Immutable snapshots over ingredient and recipe records supporting exact
//! lookup by identifier and nearest-neighbour search by embedding, behind a
//! handle that swaps whole snapshots on reload.

mod builder;
mod handle;
mod lexicon;
mod snapshot;

pub use builder::build_snapshot;
pub use handle::KnowledgeIndex;
pub use lexicon::Lexicon;
pub use snapshot::{
    script_of, KnowledgeSnapshot, NameEntry, NameHit, NameOwner, Neighbor, NeighborQuery,
};
