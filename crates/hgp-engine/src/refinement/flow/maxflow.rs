use std::collections::VecDeque;

use hgp_config::FlowAlgorithm;

use super::network::{Capacity, FlowNetwork, INFINITE};

/// Maximum flow solver operating on a residual network.
pub trait MaxFlowSolver {
    /// Saturates `network` from `source` to `sink` and returns the flow value.
    fn max_flow(&mut self, network: &mut FlowNetwork, source: usize, sink: usize) -> Capacity;

    /// Configuration name of the solver.
    fn name(&self) -> &'static str;
}

/// Solver selected by the configuration.
pub fn solver_for(algorithm: FlowAlgorithm) -> Box<dyn MaxFlowSolver> {
    match algorithm {
        FlowAlgorithm::EdmondKarp => Box::new(EdmondsKarp),
        FlowAlgorithm::Dinic => Box::new(Dinic::default()),
    }
}

/// Shortest augmenting paths found by BFS.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdmondsKarp;

impl MaxFlowSolver for EdmondsKarp {
    fn max_flow(&mut self, network: &mut FlowNetwork, source: usize, sink: usize) -> Capacity {
        let mut total = 0;
        loop {
            let mut parent: Vec<Option<usize>> = vec![None; network.num_vertices()];
            let mut queue = VecDeque::from([source]);
            let mut reached = false;
            while let Some(vertex) = queue.pop_front() {
                if vertex == sink {
                    reached = true;
                    break;
                }
                for arc in network.out_arcs(vertex) {
                    let head = network.arc(*arc).to;
                    if head != source && parent[head].is_none() && network.residual(*arc) > 0 {
                        parent[head] = Some(*arc);
                        queue.push_back(head);
                    }
                }
            }
            if !reached {
                return total;
            }

            let mut bottleneck = INFINITE;
            let mut vertex = sink;
            while let Some(arc) = parent[vertex] {
                bottleneck = bottleneck.min(network.residual(arc));
                vertex = network.arc(arc ^ 1).to;
            }
            let mut vertex = sink;
            while let Some(arc) = parent[vertex] {
                network.push(arc, bottleneck);
                vertex = network.arc(arc ^ 1).to;
            }
            total += bottleneck;
        }
    }

    fn name(&self) -> &'static str {
        "edmond_karp"
    }
}

/// Blocking flows on BFS level graphs.
#[derive(Debug, Clone, Default)]
pub struct Dinic {
    level: Vec<i64>,
    cursor: Vec<usize>,
}

impl Dinic {
    fn build_levels(&mut self, network: &FlowNetwork, source: usize, sink: usize) -> bool {
        self.level.clear();
        self.level.resize(network.num_vertices(), -1);
        self.level[source] = 0;
        let mut queue = VecDeque::from([source]);
        while let Some(vertex) = queue.pop_front() {
            for arc in network.out_arcs(vertex) {
                let head = network.arc(*arc).to;
                if self.level[head] < 0 && network.residual(*arc) > 0 {
                    self.level[head] = self.level[vertex] + 1;
                    queue.push_back(head);
                }
            }
        }
        self.level[sink] >= 0
    }

    fn augment(
        &mut self,
        network: &mut FlowNetwork,
        vertex: usize,
        sink: usize,
        limit: Capacity,
    ) -> Capacity {
        if vertex == sink {
            return limit;
        }
        while self.cursor[vertex] < network.out_arcs(vertex).len() {
            let arc = network.out_arcs(vertex)[self.cursor[vertex]];
            let head = network.arc(arc).to;
            let residual = network.residual(arc);
            if residual > 0 && self.level[head] == self.level[vertex] + 1 {
                let pushed = self.augment(network, head, sink, limit.min(residual));
                if pushed > 0 {
                    network.push(arc, pushed);
                    return pushed;
                }
            }
            self.cursor[vertex] += 1;
        }
        0
    }
}

impl MaxFlowSolver for Dinic {
    fn max_flow(&mut self, network: &mut FlowNetwork, source: usize, sink: usize) -> Capacity {
        let mut total = 0;
        while self.build_levels(network, source, sink) {
            self.cursor.clear();
            self.cursor.resize(network.num_vertices(), 0);
            loop {
                let pushed = self.augment(network, source, sink, INFINITE);
                if pushed == 0 {
                    break;
                }
                total += pushed;
            }
        }
        total
    }

    fn name(&self) -> &'static str {
        "dinic"
    }
}
