use hgp_core::{BlockId, Gain, NodeId};

#[derive(Debug, Clone, Copy)]
struct Slot {
    bucket: usize,
    index: usize,
    gain: Gain,
    target: BlockId,
}

/// Bucket priority queue of move candidates keyed by gain.
///
/// Gains outside `[-bound, bound]` share the extreme buckets; their exact
/// values are kept so extraction from an extreme bucket still returns the
/// true maximum. Within a bucket the most recently inserted node wins.
#[derive(Debug, Clone)]
pub struct GainBuckets {
    bound: Gain,
    buckets: Vec<Vec<NodeId>>,
    slots: Vec<Option<Slot>>,
    top: usize,
    len: usize,
}

impl GainBuckets {
    /// Creates buckets for `num_nodes` nodes and gains in `[-bound, bound]`.
    pub fn new(num_nodes: usize, bound: Gain) -> Self {
        let bound = bound.max(1);
        Self {
            bound,
            buckets: vec![Vec::new(); (2 * bound + 1) as usize],
            slots: vec![None; num_nodes],
            top: 0,
            len: 0,
        }
    }

    /// Number of queued nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no node is queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `node` is queued.
    pub fn contains(&self, node: NodeId) -> bool {
        self.slots[node.index()].is_some()
    }

    /// Queued gain and target of `node`.
    pub fn get(&self, node: NodeId) -> Option<(Gain, BlockId)> {
        self.slots[node.index()].map(|slot| (slot.gain, slot.target))
    }

    fn bucket_of(&self, gain: Gain) -> usize {
        (gain.clamp(-self.bound, self.bound) + self.bound) as usize
    }

    /// Queues `node` or updates its entry.
    pub fn upsert(&mut self, node: NodeId, gain: Gain, target: BlockId) {
        self.remove(node);
        let bucket = self.bucket_of(gain);
        self.buckets[bucket].push(node);
        self.slots[node.index()] = Some(Slot {
            bucket,
            index: self.buckets[bucket].len() - 1,
            gain,
            target,
        });
        self.top = self.top.max(bucket);
        self.len += 1;
    }

    /// Removes `node` if it is queued.
    pub fn remove(&mut self, node: NodeId) {
        let Some(slot) = self.slots[node.index()].take() else {
            return;
        };
        let bucket = &mut self.buckets[slot.bucket];
        bucket.swap_remove(slot.index);
        if let Some(moved) = bucket.get(slot.index).copied() {
            if let Some(moved_slot) = self.slots[moved.index()].as_mut() {
                moved_slot.index = slot.index;
            }
        }
        self.len -= 1;
    }

    /// Removes and returns the node with the highest gain.
    pub fn pop_max(&mut self) -> Option<(NodeId, Gain, BlockId)> {
        if self.len == 0 {
            return None;
        }
        while self.buckets[self.top].is_empty() {
            self.top -= 1;
        }
        let bucket = &self.buckets[self.top];
        let node = if self.top == 0 || self.top == self.buckets.len() - 1 {
            bucket
                .iter()
                .copied()
                .rev()
                .max_by_key(|node| self.slots[node.index()].map_or(Gain::MIN, |slot| slot.gain))?
        } else {
            *bucket.last()?
        };
        let (gain, target) = self.get(node)?;
        self.remove(node);
        Some((node, gain, target))
    }
}
