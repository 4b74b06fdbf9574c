//! Text generation domain

mod provider;

pub use provider::GenerationProvider;

#[cfg(test)]
pub use provider::MockGenerationProvider;
