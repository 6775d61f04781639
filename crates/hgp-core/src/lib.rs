#![deny(missing_docs)]

//! Core identifiers, structured errors and deterministic helpers shared by
//! the `hgp` hypergraph partitioner crates.

use serde::{Deserialize, Serialize};

pub mod budget;
pub mod errors;
pub mod rng;

pub use budget::TimeBudget;
pub use errors::{ErrorClass, ErrorInfo, HgpError};
pub use rng::{derive_substream_seed, RngHandle};

/// Identifier for a hypernode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new identifier from its raw integer representation.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub const fn as_raw(&self) -> u32 {
        self.0
    }

    /// Returns the identifier as an index into dense per-node arrays.
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Identifier for a hyperedge (net).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(u32);

impl EdgeId {
    /// Creates a new identifier from its raw integer representation.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub const fn as_raw(&self) -> u32 {
        self.0
    }

    /// Returns the identifier as an index into dense per-edge arrays.
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a block of a k-way partition, always in `[0, k)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(u32);

impl BlockId {
    /// Creates a new identifier from its raw integer representation.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub const fn as_raw(&self) -> u32 {
        self.0
    }

    /// Returns the identifier as an index into per-block arrays.
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Weight of a hypernode or a block.
pub type NodeWeight = i64;

/// Weight of a hyperedge; also the unit of every objective value.
pub type EdgeWeight = i64;

/// Signed change of the objective caused by a move (positive is better).
pub type Gain = i64;
