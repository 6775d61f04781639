use hgp_core::{BlockId, EdgeId, EdgeWeight, ErrorInfo, HgpError, NodeId, NodeWeight};
use serde::{Deserialize, Serialize};

use crate::memento::Memento;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NodeRecord {
    pub(crate) weight: NodeWeight,
    pub(crate) active: bool,
    pub(crate) block: Option<BlockId>,
    pub(crate) incident: Vec<EdgeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct EdgeRecord {
    pub(crate) weight: EdgeWeight,
    pub(crate) pins: Vec<NodeId>,
    pub(crate) connectivity: u32,
    pub(crate) pin_counts: Vec<u32>,
}

impl EdgeRecord {
    fn add_pin_to_block(&mut self, block: BlockId) {
        let count = &mut self.pin_counts[block.index()];
        if *count == 0 {
            self.connectivity += 1;
        }
        *count += 1;
    }

    fn remove_pin_from_block(&mut self, block: BlockId) {
        let count = &mut self.pin_counts[block.index()];
        *count -= 1;
        if *count == 0 {
            self.connectivity -= 1;
        }
    }
}

/// Weighted hypergraph supporting reversible contraction and a k-way
/// block assignment.
///
/// Pins of contracted nodes are re-targeted to their representative, so
/// pin lists only ever hold active nodes. Connectivity and per-block pin
/// counts are maintained incrementally by [`Hypergraph::set_block`],
/// [`Hypergraph::contract`] and [`Hypergraph::uncontract`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hypergraph {
    pub(crate) nodes: Vec<NodeRecord>,
    pub(crate) edges: Vec<EdgeRecord>,
    pub(crate) k: u32,
    pub(crate) block_weights: Vec<NodeWeight>,
    pub(crate) block_sizes: Vec<usize>,
    pub(crate) current_num_nodes: usize,
    pub(crate) total_weight: NodeWeight,
    next_seq: u64,
    history: Vec<u64>,
}

impl PartialEq for Hypergraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.edges == other.edges
            && self.k == other.k
            && self.block_weights == other.block_weights
            && self.block_sizes == other.block_sizes
            && self.current_num_nodes == other.current_num_nodes
            && self.total_weight == other.total_weight
            && self.history == other.history
    }
}

impl Hypergraph {
    pub(crate) fn from_parts(
        node_weights: Vec<NodeWeight>,
        edges: Vec<(Vec<NodeId>, EdgeWeight)>,
        k: u32,
    ) -> Self {
        let mut nodes: Vec<NodeRecord> = node_weights
            .iter()
            .map(|weight| NodeRecord {
                weight: *weight,
                active: true,
                block: None,
                incident: Vec::new(),
            })
            .collect();
        let edges: Vec<EdgeRecord> = edges
            .into_iter()
            .enumerate()
            .map(|(idx, (pins, weight))| {
                let edge = EdgeId::from_raw(idx as u32);
                for pin in &pins {
                    nodes[pin.index()].incident.push(edge);
                }
                EdgeRecord {
                    weight,
                    pins,
                    connectivity: 0,
                    pin_counts: vec![0; k as usize],
                }
            })
            .collect();
        let total_weight = node_weights.iter().sum();
        Self {
            current_num_nodes: nodes.len(),
            nodes,
            edges,
            k,
            block_weights: vec![0; k as usize],
            block_sizes: vec![0; k as usize],
            total_weight,
            next_seq: 0,
            history: Vec::new(),
        }
    }

    /// Number of blocks.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Number of nodes the hypergraph was built with.
    pub fn initial_num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of currently active nodes.
    pub fn current_num_nodes(&self) -> usize {
        self.current_num_nodes
    }

    /// Number of hyperedges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of unconsumed contractions.
    pub fn num_contractions(&self) -> usize {
        self.history.len()
    }

    /// Total node weight; invariant under contraction.
    pub fn total_weight(&self) -> NodeWeight {
        self.total_weight
    }

    /// Active nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.active)
            .map(|(idx, _)| NodeId::from_raw(idx as u32))
    }

    /// All hyperedges in ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len() as u32).map(EdgeId::from_raw)
    }

    /// Whether `node` has not been contracted away.
    pub fn is_active(&self, node: NodeId) -> bool {
        self.nodes.get(node.index()).map_or(false, |n| n.active)
    }

    /// Current weight of `node`.
    pub fn node_weight(&self, node: NodeId) -> NodeWeight {
        self.nodes[node.index()].weight
    }

    /// Weight of `edge`.
    pub fn edge_weight(&self, edge: EdgeId) -> EdgeWeight {
        self.edges[edge.index()].weight
    }

    /// Number of hyperedges incident to `node`.
    pub fn node_degree(&self, node: NodeId) -> usize {
        self.nodes[node.index()].incident.len()
    }

    /// Number of pins of `edge`.
    pub fn edge_size(&self, edge: EdgeId) -> usize {
        self.edges[edge.index()].pins.len()
    }

    /// Pins of `edge` in their current order.
    pub fn pins(&self, edge: EdgeId) -> &[NodeId] {
        &self.edges[edge.index()].pins
    }

    /// Hyperedges incident to `node`.
    pub fn incident_edges(&self, node: NodeId) -> &[EdgeId] {
        &self.nodes[node.index()].incident
    }

    /// Block of `node`, `None` before partitioning.
    pub fn block(&self, node: NodeId) -> Option<BlockId> {
        self.nodes[node.index()].block
    }

    /// Weight currently assigned to `block`.
    pub fn block_weight(&self, block: BlockId) -> NodeWeight {
        self.block_weights[block.index()]
    }

    /// Weights of all blocks.
    pub fn block_weights(&self) -> &[NodeWeight] {
        &self.block_weights
    }

    /// Number of active nodes assigned to `block`.
    pub fn block_size(&self, block: BlockId) -> usize {
        self.block_sizes[block.index()]
    }

    /// Whether every block holds an active node.
    ///
    /// Trivially true when there are fewer active nodes than blocks.
    pub fn all_blocks_used(&self) -> bool {
        self.current_num_nodes < self.k as usize || self.block_sizes.iter().all(|size| *size > 0)
    }

    /// Whether moving `node` out of its block would leave that block empty
    /// while enough active nodes exist to fill every block.
    pub fn move_empties_block(&self, node: NodeId) -> bool {
        match self.block(node) {
            Some(block) => {
                self.block_sizes[block.index()] == 1 && self.current_num_nodes >= self.k as usize
            }
            None => false,
        }
    }

    /// Number of pins of `edge` assigned to `block`.
    pub fn pin_count_in_block(&self, edge: EdgeId, block: BlockId) -> u32 {
        self.edges[edge.index()].pin_counts[block.index()]
    }

    /// Number of distinct blocks among the pins of `edge`.
    pub fn connectivity(&self, edge: EdgeId) -> u32 {
        self.edges[edge.index()].connectivity
    }

    /// Blocks present among the pins of `edge`.
    pub fn connectivity_set(&self, edge: EdgeId) -> impl Iterator<Item = BlockId> + '_ {
        self.edges[edge.index()]
            .pin_counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(idx, _)| BlockId::from_raw(idx as u32))
    }

    /// Whether `node` is a pin of at least one cut hyperedge.
    pub fn is_border_node(&self, node: NodeId) -> bool {
        self.incident_edges(node)
            .iter()
            .any(|edge| self.connectivity(*edge) > 1)
    }

    /// Whether every active node has a block.
    pub fn is_partitioned(&self) -> bool {
        self.nodes
            .iter()
            .filter(|node| node.active)
            .all(|node| node.block.is_some())
    }

    /// Heaviest active node weight.
    pub fn max_node_weight(&self) -> NodeWeight {
        self.nodes
            .iter()
            .filter(|node| node.active)
            .map(|node| node.weight)
            .max()
            .unwrap_or(0)
    }

    /// Merges `v` into `u` and returns the record that undoes it.
    ///
    /// `u` absorbs the weight of `v`. Every pin of `v` is re-targeted to `u`;
    /// in hyperedges that already contain `u` the pin of `v` is dropped
    /// instead. Block weights and pin counts follow the move of `v`'s weight
    /// into `u`'s block.
    pub fn contract(&mut self, u: NodeId, v: NodeId) -> Result<Memento, HgpError> {
        self.ensure_active(u)?;
        self.ensure_active(v)?;
        if u == v {
            return Err(HgpError::InvalidOperation(
                ErrorInfo::new("self-contraction", "cannot contract a node with itself")
                    .with_context("node", u.as_raw()),
            ));
        }

        let u_block = self.nodes[u.index()].block;
        let v_block = self.nodes[v.index()].block;
        let v_weight = self.nodes[v.index()].weight;
        let u_degree_before = self.nodes[u.index()].incident.len();
        let mut removed = Vec::new();
        let mut retargeted = Vec::new();

        let v_edges = self.nodes[v.index()].incident.clone();
        for edge_id in v_edges {
            let edge = &mut self.edges[edge_id.index()];
            let Some(pos) = edge.pins.iter().position(|pin| *pin == v) else {
                continue;
            };
            if let Some(block) = v_block {
                edge.remove_pin_from_block(block);
            }
            if edge.pins.contains(&u) {
                edge.pins.swap_remove(pos);
                removed.push((edge_id, pos));
            } else {
                edge.pins[pos] = u;
                if let Some(block) = u_block {
                    edge.add_pin_to_block(block);
                }
                retargeted.push((edge_id, pos));
                self.nodes[u.index()].incident.push(edge_id);
            }
        }

        if let Some(block) = v_block {
            self.block_weights[block.index()] -= v_weight;
            self.block_sizes[block.index()] -= 1;
        }
        if let Some(block) = u_block {
            self.block_weights[block.index()] += v_weight;
        }
        self.nodes[u.index()].weight += v_weight;
        self.nodes[v.index()].active = false;
        self.current_num_nodes -= 1;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.history.push(seq);

        Ok(Memento {
            u,
            v,
            v_weight,
            seq,
            u_degree_before,
            removed,
            retargeted,
        })
    }

    /// Reverts the most recent contraction.
    ///
    /// `v` becomes active again with its original weight and pins and is
    /// placed in the block `u` currently holds.
    pub fn uncontract(&mut self, memento: &Memento) -> Result<(), HgpError> {
        match self.history.last() {
            Some(seq) if *seq == memento.seq => {}
            top => {
                let mut info = ErrorInfo::new(
                    "out-of-order-uncontraction",
                    "only the most recent contraction can be reverted",
                )
                .with_context("seq", memento.seq)
                .with_context("u", memento.u.as_raw())
                .with_context("v", memento.v.as_raw());
                if let Some(top) = top {
                    info = info.with_context("expected_seq", top);
                }
                return Err(HgpError::HistoryViolation(info));
            }
        }

        let u = memento.u;
        let v = memento.v;
        let block = self.nodes[u.index()].block;

        self.nodes[u.index()].incident.truncate(memento.u_degree_before);
        for (edge_id, pos) in memento.retargeted.iter().rev() {
            self.edges[edge_id.index()].pins[*pos] = v;
        }
        for (edge_id, pos) in memento.removed.iter().rev() {
            let edge = &mut self.edges[edge_id.index()];
            edge.pins.push(v);
            let last = edge.pins.len() - 1;
            edge.pins.swap(*pos, last);
            if let Some(block) = block {
                edge.add_pin_to_block(block);
            }
        }

        self.nodes[u.index()].weight -= memento.v_weight;
        let v_record = &mut self.nodes[v.index()];
        v_record.weight = memento.v_weight;
        v_record.active = true;
        v_record.block = block;
        if let Some(block) = block {
            self.block_sizes[block.index()] += 1;
        }
        self.current_num_nodes += 1;
        self.history.pop();
        Ok(())
    }

    /// Assigns `node` to `block`, updating connectivity of its hyperedges.
    pub fn set_block(&mut self, node: NodeId, block: BlockId) -> Result<(), HgpError> {
        if block.as_raw() >= self.k {
            return Err(HgpError::OutOfRange(
                ErrorInfo::new("block-out-of-range", "block id must lie in [0, k)")
                    .with_context("block", block.as_raw())
                    .with_context("k", self.k),
            ));
        }
        self.ensure_active(node)?;
        let record = &mut self.nodes[node.index()];
        let previous = record.block;
        if previous == Some(block) {
            return Ok(());
        }
        record.block = Some(block);
        let weight = record.weight;
        for edge_id in &self.nodes[node.index()].incident {
            let edge = &mut self.edges[edge_id.index()];
            if let Some(previous) = previous {
                edge.remove_pin_from_block(previous);
            }
            edge.add_pin_to_block(block);
        }
        if let Some(previous) = previous {
            self.block_weights[previous.index()] -= weight;
            self.block_sizes[previous.index()] -= 1;
        }
        self.block_weights[block.index()] += weight;
        self.block_sizes[block.index()] += 1;
        Ok(())
    }

    /// Clears every block assignment.
    pub fn reset_blocks(&mut self) {
        for node in &mut self.nodes {
            node.block = None;
        }
        for edge in &mut self.edges {
            edge.connectivity = 0;
            edge.pin_counts.iter_mut().for_each(|count| *count = 0);
        }
        self.block_weights.iter_mut().for_each(|weight| *weight = 0);
        self.block_sizes.iter_mut().for_each(|size| *size = 0);
    }

    /// Replaces the assignment of all active nodes.
    ///
    /// `blocks` is indexed by node id; entries of inactive nodes are ignored.
    pub fn assign_all(&mut self, blocks: &[BlockId]) -> Result<(), HgpError> {
        if blocks.len() != self.nodes.len() {
            return Err(HgpError::Precondition(
                ErrorInfo::new("partition-length", "one block id per node is required")
                    .with_context("expected", self.nodes.len())
                    .with_context("actual", blocks.len()),
            ));
        }
        if let Some((node, block)) = blocks
            .iter()
            .enumerate()
            .find(|(_, block)| block.as_raw() >= self.k)
        {
            return Err(HgpError::OutOfRange(
                ErrorInfo::new("block-out-of-range", "block id must lie in [0, k)")
                    .with_context("node", node)
                    .with_context("block", block.as_raw())
                    .with_context("k", self.k),
            ));
        }
        self.reset_blocks();
        for node in 0..self.nodes.len() {
            if self.nodes[node].active {
                self.set_block(NodeId::from_raw(node as u32), blocks[node])?;
            }
        }
        Ok(())
    }

    /// Block of every node, indexed by node id.
    ///
    /// Fails unless every node is active and assigned, i.e. the hypergraph
    /// is fully uncoarsened and partitioned.
    pub fn blocks(&self) -> Result<Vec<BlockId>, HgpError> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| match (node.active, node.block) {
                (true, Some(block)) => Ok(block),
                _ => Err(HgpError::Precondition(
                    ErrorInfo::new(
                        "incomplete-partition",
                        "every node must be active and assigned",
                    )
                    .with_context("node", idx),
                )),
            })
            .collect()
    }

    fn ensure_active(&self, node: NodeId) -> Result<(), HgpError> {
        if self.is_active(node) {
            Ok(())
        } else {
            Err(HgpError::InvalidOperation(
                ErrorInfo::new("inactive-node", "node is contracted or unknown")
                    .with_context("node", node.as_raw()),
            ))
        }
    }
}
