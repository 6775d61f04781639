//! Label propagation clustering that biases coarsening towards communities.

use std::collections::{BTreeMap, BTreeSet};

use hgp_config::{CommunityDetectionParams, EdgeWeightKind};
use hgp_core::{BlockId, EdgeId, NodeId, RngHandle};
use hgp_graph::Hypergraph;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Community label of a node.
pub type Label = u32;

/// Label of a pin together with the block it sits in.
pub type LabelEntry = (Label, Option<BlockId>);

/// Labels a hyperedge offers as candidates to its pins.
///
/// Small hyperedges expose their full incident label list; large ones keep
/// a fixed-capacity sample so that per-edge cost does not grow with the
/// edge size. Cloning an owned sample allocates a fresh buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSample {
    /// View over the incident label list of the owning edge.
    Inline,
    /// Reservoir sample owned by the edge.
    Owned(Box<[LabelEntry]>),
}

impl LabelSample {
    /// Draws a reservoir sample of at most `capacity` entries.
    pub fn reservoir(entries: &[LabelEntry], capacity: usize, rng: &mut RngHandle) -> Self {
        let mut sample: Vec<LabelEntry> = Vec::with_capacity(capacity.min(entries.len()));
        for (seen, entry) in entries.iter().enumerate() {
            if sample.len() < capacity {
                sample.push(*entry);
            } else {
                let slot = rng.gen_range(0..=seen);
                if slot < capacity {
                    sample[slot] = *entry;
                }
            }
        }
        LabelSample::Owned(sample.into_boxed_slice())
    }

    /// Entries of the sample; `incident` backs the inline view.
    pub fn entries<'a>(&'a self, incident: &'a [LabelEntry]) -> &'a [LabelEntry] {
        match self {
            LabelSample::Inline => incident,
            LabelSample::Owned(buffer) => buffer,
        }
    }

    /// Whether the sample owns its buffer.
    pub fn is_owned(&self) -> bool {
        matches!(self, LabelSample::Owned(_))
    }
}

/// Per-hyperedge clustering state.
#[derive(Debug, Clone)]
pub struct EdgeLabelData {
    /// Label and block of every pin, in pin order.
    pub incident_labels: Vec<LabelEntry>,
    /// Candidate labels offered to the pins.
    pub sample: LabelSample,
    /// Occurrences of each label among the pins.
    pub label_counts: BTreeMap<Label, u32>,
    /// Local modularity weight of the edge.
    pub omega: f64,
}

impl EdgeLabelData {
    /// Number of distinct labels among the pins.
    pub fn distinct_labels(&self) -> usize {
        self.label_counts.len()
    }

    fn relabel(&mut self, position: usize, from: Label, to: Label) {
        self.incident_labels[position].0 = to;
        if let Some(count) = self.label_counts.get_mut(&from) {
            *count -= 1;
            if *count == 0 {
                self.label_counts.remove(&from);
            }
        }
        *self.label_counts.entry(to).or_insert(0) += 1;
    }
}

/// Compacted community labels, indexed by node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communities {
    labels: Vec<Label>,
    count: usize,
}

impl Communities {
    /// Every node in its own community.
    pub fn singletons(num_nodes: usize) -> Self {
        Self {
            labels: (0..num_nodes as Label).collect(),
            count: num_nodes,
        }
    }

    /// Label of `node`.
    pub fn label(&self, node: NodeId) -> Label {
        self.labels[node.index()]
    }

    /// Labels indexed by node id.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Number of distinct communities.
    pub fn count(&self) -> usize {
        self.count
    }

    fn compact(raw: Vec<Label>) -> Self {
        let mut remap = BTreeMap::new();
        let labels = raw
            .into_iter()
            .map(|label| {
                let next = remap.len() as Label;
                *remap.entry(label).or_insert(next)
            })
            .collect();
        Self {
            labels,
            count: remap.len(),
        }
    }
}

/// Label propagation over the hypergraph.
///
/// Nodes are visited in ascending id order. A node adopts the candidate
/// label with the best local modularity gain, the smallest label winning
/// ties. When the hypergraph is partitioned only labels seen on pins of the
/// node's own block are candidates, so communities never straddle blocks.
#[derive(Debug, Clone)]
pub struct CommunityDetector<'a> {
    params: &'a CommunityDetectionParams,
    size_threshold: Option<usize>,
}

impl<'a> CommunityDetector<'a> {
    /// Creates a detector; hyperedges above `size_threshold` pins are ignored.
    pub fn new(params: &'a CommunityDetectionParams, size_threshold: Option<usize>) -> Self {
        Self {
            params,
            size_threshold,
        }
    }

    /// Runs label propagation and returns compacted labels.
    pub fn detect(&self, hg: &Hypergraph, rng: &mut RngHandle) -> Communities {
        let num_nodes = hg.initial_num_nodes();
        let mut labels: Vec<Label> = (0..num_nodes as Label).collect();
        let mut locations: Vec<Vec<(EdgeId, usize)>> = vec![Vec::new(); num_nodes];
        let mut edge_data: Vec<Option<EdgeLabelData>> = Vec::with_capacity(hg.num_edges());

        for edge in hg.edges() {
            let size = hg.edge_size(edge);
            let ignored = size < 2 || self.size_threshold.map_or(false, |limit| size > limit);
            if ignored {
                edge_data.push(None);
                continue;
            }
            let mut incident_labels = Vec::with_capacity(size);
            let mut label_counts = BTreeMap::new();
            for (position, pin) in hg.pins(edge).iter().enumerate() {
                incident_labels.push((labels[pin.index()], hg.block(*pin)));
                *label_counts.entry(labels[pin.index()]).or_insert(0) += 1;
                locations[pin.index()].push((edge, position));
            }
            let sample = if size >= self.params.sample_threshold {
                LabelSample::reservoir(&incident_labels, self.params.sample_size, rng)
            } else {
                LabelSample::Inline
            };
            edge_data.push(Some(EdgeLabelData {
                incident_labels,
                sample,
                label_counts,
                omega: self.omega(hg, edge),
            }));
        }

        let node_volume: Vec<f64> = (0..num_nodes)
            .map(|node| {
                locations[node]
                    .iter()
                    .filter_map(|(edge, _)| edge_data[edge.index()].as_ref())
                    .map(|data| data.omega)
                    .sum()
            })
            .collect();
        let total_volume: f64 = node_volume.iter().sum();
        if total_volume <= 0.0 {
            return Communities::compact(labels);
        }
        let mut label_volume: BTreeMap<Label, f64> = BTreeMap::new();
        for node in hg.nodes() {
            *label_volume.entry(labels[node.index()]).or_insert(0.0) += node_volume[node.index()];
        }

        let mut previous_gain: Option<f64> = None;
        for pass in 0..self.params.max_pass_iterations {
            if pass > 0 {
                for data in edge_data.iter_mut().flatten() {
                    if data.sample.is_owned() {
                        data.sample = LabelSample::reservoir(
                            &data.incident_labels,
                            self.params.sample_size,
                            rng,
                        );
                    }
                }
            }

            let mut pass_gain = 0.0;
            let mut changed = 0usize;
            for node in hg.nodes() {
                let current = labels[node.index()];
                let block = hg.block(node);
                let volume = node_volume[node.index()];
                let mut candidates = BTreeSet::new();
                candidates.insert(current);
                for (edge, _) in &locations[node.index()] {
                    let Some(data) = edge_data[edge.index()].as_ref() else { continue };
                    for (label, label_block) in data.sample.entries(&data.incident_labels) {
                        if block.is_some() && *label_block != block {
                            continue;
                        }
                        candidates.insert(*label);
                    }
                }

                let mut best_label = current;
                let mut best_score = f64::NEG_INFINITY;
                let mut current_score = 0.0;
                for label in &candidates {
                    let mut connection = 0.0;
                    for (edge, _) in &locations[node.index()] {
                        let Some(data) = edge_data[edge.index()].as_ref() else { continue };
                        let mut count = data.label_counts.get(label).copied().unwrap_or(0);
                        if *label == current {
                            count -= 1;
                        }
                        let others = data.incident_labels.len() - 1;
                        connection += data.omega * count as f64 / others as f64;
                    }
                    let mut community_volume = label_volume.get(label).copied().unwrap_or(0.0);
                    if *label == current {
                        community_volume -= volume;
                    }
                    let score = connection - volume * community_volume / total_volume;
                    if *label == current {
                        current_score = score;
                    }
                    if score > best_score {
                        best_score = score;
                        best_label = *label;
                    }
                }

                if best_label != current && best_score > current_score {
                    pass_gain += best_score - current_score;
                    changed += 1;
                    labels[node.index()] = best_label;
                    *label_volume.entry(current).or_insert(0.0) -= volume;
                    *label_volume.entry(best_label).or_insert(0.0) += volume;
                    for (edge, position) in &locations[node.index()] {
                        if let Some(data) = edge_data[edge.index()].as_mut() {
                            data.relabel(*position, current, best_label);
                        }
                    }
                }
            }

            debug!(pass, changed, pass_gain, "label propagation pass");
            if changed == 0 {
                break;
            }
            if let Some(previous) = previous_gain {
                if pass_gain < self.params.min_eps_improvement * previous {
                    break;
                }
            }
            previous_gain = Some(pass_gain);
        }

        let communities = Communities::compact(labels);
        info!(
            communities = communities.count(),
            nodes = hg.current_num_nodes(),
            "community detection finished"
        );
        communities
    }

    fn omega(&self, hg: &Hypergraph, edge: EdgeId) -> f64 {
        let weight = hg.edge_weight(edge) as f64;
        match self.params.edge_weight {
            EdgeWeightKind::Uniform => 1.0,
            EdgeWeightKind::NonUniform => weight,
            EdgeWeightKind::Degree => weight / hg.edge_size(edge) as f64,
        }
    }
}
