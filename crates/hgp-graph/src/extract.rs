use std::collections::BTreeMap;

use hgp_config::Objective;
use hgp_core::{BlockId, ErrorInfo, HgpError, NodeId};

use crate::hypergraph::Hypergraph;

/// Sub-hypergraph together with the ids its nodes had in the parent.
#[derive(Debug, Clone)]
pub struct Extracted {
    /// Unpartitioned sub-hypergraph.
    pub hypergraph: Hypergraph,
    /// `mapping[sub_node] = parent_node`.
    pub mapping: Vec<NodeId>,
}

impl Hypergraph {
    /// Extracts the nodes of `block` as a hypergraph for a `k`-way split.
    ///
    /// Under the cut objective hyperedges leaving the block are dropped,
    /// since they are already cut and cannot get worse. Under km1 they are
    /// kept with their pins inside the block. Hyperedges with fewer than two
    /// remaining pins are dropped in both cases.
    pub fn extract_block(
        &self,
        block: BlockId,
        objective: Objective,
        k: u32,
    ) -> Result<Extracted, HgpError> {
        if block.as_raw() >= self.k {
            return Err(HgpError::OutOfRange(
                ErrorInfo::new("block-out-of-range", "block id must lie in [0, k)")
                    .with_context("block", block.as_raw())
                    .with_context("k", self.k),
            ));
        }
        let nodes: Vec<NodeId> = self
            .nodes()
            .filter(|node| self.block(*node) == Some(block))
            .collect();
        self.extract_nodes(&nodes, objective, k)
    }

    /// Extracts an arbitrary set of active nodes; see [`Hypergraph::extract_block`].
    pub fn extract_nodes(
        &self,
        nodes: &[NodeId],
        objective: Objective,
        k: u32,
    ) -> Result<Extracted, HgpError> {
        let mut index = BTreeMap::new();
        for (sub, node) in nodes.iter().enumerate() {
            if !self.is_active(*node) {
                return Err(HgpError::InvalidOperation(
                    ErrorInfo::new("inactive-node", "only active nodes can be extracted")
                        .with_context("node", node.as_raw()),
                ));
            }
            index.insert(*node, NodeId::from_raw(sub as u32));
        }

        let node_weights = nodes.iter().map(|node| self.node_weight(*node)).collect();
        let mut edges = Vec::new();
        for edge in self.edges() {
            let pins = self.pins(edge);
            let inside: Vec<NodeId> = pins.iter().filter_map(|pin| index.get(pin).copied()).collect();
            let leaves = inside.len() < pins.len();
            if inside.len() < 2 || (leaves && objective == Objective::Cut) {
                continue;
            }
            edges.push((inside, self.edge_weight(edge)));
        }

        let hypergraph = Hypergraph::from_parts(node_weights, edges, k.max(2));
        Ok(Extracted {
            hypergraph,
            mapping: nodes.to_vec(),
        })
    }
}
