use std::collections::{BTreeMap, VecDeque};

use hgp_config::{FlowNetworkKind, FlowParams, Objective};
use hgp_core::{BlockId, EdgeId, NodeId, NodeWeight};
use hgp_graph::Hypergraph;

/// Arc capacity and flow value.
pub type Capacity = i64;

/// Capacity of arcs that must never be cut.
pub const INFINITE: Capacity = i64::MAX / 4;

/// Directed arc; arcs `2i` and `2i + 1` are reverses of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    /// Head vertex.
    pub to: usize,
    /// Capacity.
    pub capacity: Capacity,
    /// Current flow; the reverse arc carries the negated value.
    pub flow: Capacity,
}

/// Residual flow network.
#[derive(Debug, Clone, Default)]
pub struct FlowNetwork {
    arcs: Vec<Arc>,
    adjacency: Vec<Vec<usize>>,
}

impl FlowNetwork {
    /// Network with `vertices` isolated vertices.
    pub fn new(vertices: usize) -> Self {
        Self {
            arcs: Vec::new(),
            adjacency: vec![Vec::new(); vertices],
        }
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self) -> usize {
        self.adjacency.push(Vec::new());
        self.adjacency.len() - 1
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// Adds `from -> to` with a zero-capacity reverse arc; returns the forward arc.
    pub fn add_arc(&mut self, from: usize, to: usize, capacity: Capacity) -> usize {
        self.add_pair(from, to, capacity, 0)
    }

    /// Adds an undirected connection of the given capacity.
    pub fn add_undirected(&mut self, a: usize, b: usize, capacity: Capacity) -> usize {
        self.add_pair(a, b, capacity, capacity)
    }

    fn add_pair(&mut self, from: usize, to: usize, forward: Capacity, backward: Capacity) -> usize {
        let index = self.arcs.len();
        self.arcs.push(Arc {
            to,
            capacity: forward,
            flow: 0,
        });
        self.arcs.push(Arc {
            to: from,
            capacity: backward,
            flow: 0,
        });
        self.adjacency[from].push(index);
        self.adjacency[to].push(index + 1);
        index
    }

    /// Arc by index.
    pub fn arc(&self, index: usize) -> &Arc {
        &self.arcs[index]
    }

    /// Arcs leaving `vertex`.
    pub fn out_arcs(&self, vertex: usize) -> &[usize] {
        &self.adjacency[vertex]
    }

    /// Remaining capacity of arc `index`.
    pub fn residual(&self, index: usize) -> Capacity {
        let arc = &self.arcs[index];
        arc.capacity - arc.flow
    }

    /// Pushes `amount` units along arc `index`.
    pub fn push(&mut self, index: usize, amount: Capacity) {
        self.arcs[index].flow += amount;
        self.arcs[index ^ 1].flow -= amount;
    }

    /// Vertices reachable from `source` through arcs with residual capacity.
    pub fn residual_reachable(&self, source: usize) -> Vec<bool> {
        let mut seen = vec![false; self.num_vertices()];
        let mut queue = VecDeque::from([source]);
        seen[source] = true;
        while let Some(vertex) = queue.pop_front() {
            for arc in self.out_arcs(vertex) {
                let head = self.arcs[*arc].to;
                if !seen[head] && self.residual(*arc) > 0 {
                    seen[head] = true;
                    queue.push_back(head);
                }
            }
        }
        seen
    }
}

/// Flow network of a two-block region.
///
/// Vertices `0..nodes.len()` are the region nodes, followed by the source
/// (rest of block 0), the sink (rest of block 1) and hyperedge vertices.
#[derive(Debug, Clone)]
pub struct RegionNetwork {
    /// Network to solve.
    pub network: FlowNetwork,
    /// Source vertex.
    pub source: usize,
    /// Sink vertex.
    pub sink: usize,
    /// Node behind each region vertex.
    pub nodes: Vec<NodeId>,
    /// Node weight per vertex, zero for terminals and hyperedge vertices.
    pub weights: Vec<NodeWeight>,
    /// Hyperedges touching the region.
    pub edges: Vec<EdgeId>,
}

impl RegionNetwork {
    /// Models the region `region` between blocks `b0` and `b1`.
    ///
    /// Hyperedges that are cut independently of the region (pins in a third
    /// block under the cut objective, or pins in both terminals) do not
    /// enter the network.
    pub fn build(
        hg: &Hypergraph,
        region: &[NodeId],
        blocks: (BlockId, BlockId),
        objective: Objective,
        params: &FlowParams,
    ) -> Self {
        let (b0, b1) = blocks;
        let vertex_of: BTreeMap<NodeId, usize> = region
            .iter()
            .enumerate()
            .map(|(vertex, node)| (*node, vertex))
            .collect();
        let mut network = FlowNetwork::new(region.len() + 2);
        let source = region.len();
        let sink = region.len() + 1;

        let mut edges: Vec<EdgeId> = region
            .iter()
            .flat_map(|node| hg.incident_edges(*node).iter().copied())
            .collect();
        edges.sort_unstable();
        edges.dedup();

        for edge in &edges {
            let size = hg.edge_size(*edge);
            if size < 2 || (params.ignore_small_hyperedge_cut && size < params.small_hyperedge_threshold)
            {
                continue;
            }
            if objective == Objective::Cut
                && hg.connectivity_set(*edge).any(|block| block != b0 && block != b1)
            {
                continue;
            }
            let mut endpoints: Vec<usize> = hg
                .pins(*edge)
                .iter()
                .filter_map(|pin| match vertex_of.get(pin) {
                    Some(vertex) => Some(*vertex),
                    None if hg.block(*pin) == Some(b0) => Some(source),
                    None if hg.block(*pin) == Some(b1) => Some(sink),
                    None => None,
                })
                .collect();
            endpoints.sort_unstable();
            endpoints.dedup();
            if endpoints.len() < 2 || (endpoints.contains(&source) && endpoints.contains(&sink)) {
                continue;
            }
            let weight = hg.edge_weight(*edge);
            if params.network == FlowNetworkKind::Hybrid && endpoints.len() == 2 {
                network.add_undirected(endpoints[0], endpoints[1], weight);
                continue;
            }
            let entry = network.add_vertex();
            let exit = network.add_vertex();
            network.add_arc(entry, exit, weight);
            for endpoint in endpoints {
                network.add_arc(endpoint, entry, INFINITE);
                network.add_arc(exit, endpoint, INFINITE);
            }
        }

        let mut weights = vec![0; network.num_vertices()];
        for (vertex, node) in region.iter().enumerate() {
            weights[vertex] = hg.node_weight(*node);
        }
        Self {
            network,
            source,
            sink,
            nodes: region.to_vec(),
            weights,
            edges,
        }
    }
}
