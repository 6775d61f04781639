#![deny(missing_docs)]

//! Contractible weighted hypergraph with k-way block bookkeeping, plus the
//! cut, connectivity and balance metrics computed on it.

mod builder;
mod extract;
pub mod generators;
mod hypergraph;
pub mod memento;
pub mod metrics;

pub use builder::HypergraphBuilder;
pub use extract::Extracted;
pub use generators::{gen_planted, gen_random};
pub use hypergraph::Hypergraph;
pub use memento::{ContractionHistory, Memento};
