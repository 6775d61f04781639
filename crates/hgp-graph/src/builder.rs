use hgp_core::{EdgeId, EdgeWeight, ErrorInfo, HgpError, NodeId, NodeWeight};

use crate::hypergraph::Hypergraph;

fn malformed(code: &str, message: &str) -> HgpError {
    HgpError::Precondition(ErrorInfo::new(code, message))
}

/// Incremental constructor for [`Hypergraph`].
#[derive(Debug, Clone, Default)]
pub struct HypergraphBuilder {
    node_weights: Vec<NodeWeight>,
    edges: Vec<(Vec<NodeId>, EdgeWeight)>,
}

impl HypergraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with `count` nodes of weight one.
    pub fn with_unit_nodes(count: usize) -> Self {
        Self {
            node_weights: vec![1; count],
            edges: Vec::new(),
        }
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, weight: NodeWeight) -> Result<NodeId, HgpError> {
        if weight < 0 {
            return Err(malformed("negative-node-weight", "node weights must be non-negative")
                .with_context("weight", weight));
        }
        self.node_weights.push(weight);
        Ok(NodeId::from_raw((self.node_weights.len() - 1) as u32))
    }

    /// Adds a hyperedge over distinct existing nodes.
    pub fn add_hyperedge(
        &mut self,
        pins: &[NodeId],
        weight: EdgeWeight,
    ) -> Result<EdgeId, HgpError> {
        let edge = EdgeId::from_raw(self.edges.len() as u32);
        if weight < 0 {
            return Err(malformed("negative-edge-weight", "edge weights must be non-negative")
                .with_context("edge", edge.as_raw())
                .with_context("weight", weight));
        }
        let mut seen = pins.to_vec();
        seen.sort_unstable();
        if let Some(pin) = pins.iter().find(|pin| pin.index() >= self.node_weights.len()) {
            return Err(malformed("pin-out-of-range", "pin refers to an unknown node")
                .with_context("edge", edge.as_raw())
                .with_context("pin", pin.as_raw())
                .with_context("num_nodes", self.node_weights.len()));
        }
        if let Some(pair) = seen.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(malformed("duplicate-pin", "a node appears twice in one hyperedge")
                .with_context("edge", edge.as_raw())
                .with_context("pin", pair[0].as_raw()));
        }
        self.edges.push((pins.to_vec(), weight));
        Ok(edge)
    }

    /// Number of nodes added so far.
    pub fn num_nodes(&self) -> usize {
        self.node_weights.len()
    }

    /// Finalises the hypergraph for a `k`-way partition.
    pub fn build(self, k: u32) -> Result<Hypergraph, HgpError> {
        if k < 2 {
            return Err(malformed("k-too-small", "a partition needs at least two blocks")
                .with_context("k", k));
        }
        Ok(Hypergraph::from_parts(self.node_weights, self.edges, k))
    }
}

impl Hypergraph {
    /// Builds a hypergraph from CSR arrays.
    ///
    /// Pins of edge `e` are `pins[offsets[e]..offsets[e + 1]]`. Missing
    /// weight arrays mean unit weights.
    pub fn from_csr(
        num_nodes: usize,
        num_edges: usize,
        offsets: &[usize],
        pins: &[u32],
        node_weights: Option<&[NodeWeight]>,
        edge_weights: Option<&[EdgeWeight]>,
        k: u32,
    ) -> Result<Self, HgpError> {
        if offsets.len() != num_edges + 1 {
            return Err(malformed("malformed-offsets", "offsets must have num_edges + 1 entries")
                .with_context("expected", num_edges + 1)
                .with_context("actual", offsets.len()));
        }
        if offsets[0] != 0 {
            return Err(malformed("malformed-offsets", "offsets must start at zero")
                .with_context("first", offsets[0]));
        }
        if let Some(edge) = offsets.windows(2).position(|pair| pair[0] > pair[1]) {
            return Err(malformed("malformed-offsets", "offsets must be non-decreasing")
                .with_context("edge", edge));
        }
        if offsets[num_edges] != pins.len() {
            return Err(malformed("malformed-offsets", "last offset must equal the pin count")
                .with_context("last", offsets[num_edges])
                .with_context("pins", pins.len()));
        }
        if let Some(weights) = node_weights {
            if weights.len() != num_nodes {
                return Err(malformed("weight-length", "one weight per node is required")
                    .with_context("expected", num_nodes)
                    .with_context("actual", weights.len()));
            }
        }
        if let Some(weights) = edge_weights {
            if weights.len() != num_edges {
                return Err(malformed("weight-length", "one weight per hyperedge is required")
                    .with_context("expected", num_edges)
                    .with_context("actual", weights.len()));
            }
        }

        let mut builder = HypergraphBuilder::new();
        for node in 0..num_nodes {
            builder.add_node(node_weights.map_or(1, |weights| weights[node]))?;
        }
        for edge in 0..num_edges {
            let edge_pins: Vec<NodeId> = pins[offsets[edge]..offsets[edge + 1]]
                .iter()
                .map(|pin| NodeId::from_raw(*pin))
                .collect();
            builder.add_hyperedge(&edge_pins, edge_weights.map_or(1, |weights| weights[edge]))?;
        }
        builder.build(k)
    }
}
