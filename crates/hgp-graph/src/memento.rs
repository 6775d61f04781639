//! Reversible records of contractions.

use hgp_core::{EdgeId, NodeId, NodeWeight};
use serde::{Deserialize, Serialize};

/// Everything needed to invert one [`crate::Hypergraph::contract`] call.
///
/// Mementos are consumed strictly in reverse creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memento {
    /// Representative that absorbed `v`.
    pub u: NodeId,
    /// Node that was deactivated.
    pub v: NodeId,
    /// Weight of `v` at contraction time.
    pub v_weight: NodeWeight,
    pub(crate) seq: u64,
    pub(crate) u_degree_before: usize,
    /// `(edge, position)` of pins of `v` dropped because `u` was already a pin.
    pub(crate) removed: Vec<(EdgeId, usize)>,
    /// `(edge, position)` of pins of `v` that now point at `u`.
    pub(crate) retargeted: Vec<(EdgeId, usize)>,
}

impl Memento {
    /// Sequence number assigned by the hypergraph.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Hyperedges in which `v` was a parallel pin of `u`.
    pub fn removed_pins(&self) -> &[(EdgeId, usize)] {
        &self.removed
    }

    /// Hyperedges in which the pin of `v` was re-targeted to `u`.
    pub fn retargeted_pins(&self) -> &[(EdgeId, usize)] {
        &self.retargeted
    }
}

/// Stack of mementos in contraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractionHistory {
    mementos: Vec<Memento>,
}

impl ContractionHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a contraction.
    pub fn push(&mut self, memento: Memento) {
        self.mementos.push(memento);
    }

    /// Removes the most recent contraction.
    pub fn pop(&mut self) -> Option<Memento> {
        self.mementos.pop()
    }

    /// Most recent contraction.
    pub fn last(&self) -> Option<&Memento> {
        self.mementos.last()
    }

    /// Number of recorded contractions.
    pub fn len(&self) -> usize {
        self.mementos.len()
    }

    /// Whether no contraction is recorded.
    pub fn is_empty(&self) -> bool {
        self.mementos.is_empty()
    }

    /// Contractions in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Memento> {
        self.mementos.iter()
    }
}
