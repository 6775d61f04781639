use hgp_core::{NodeWeight, RngHandle};
use rand::Rng;

use super::network::RegionNetwork;

const BALANCE_SWEEPS: usize = 8;

/// Weights of the two blocks outside the region and their caps.
#[derive(Debug, Clone, Copy)]
pub struct SideWeights {
    /// Weight of each block that is not part of the region.
    pub rest: [NodeWeight; 2],
    /// Cap of each block.
    pub caps: [NodeWeight; 2],
}

impl SideWeights {
    fn load(&self, source_weight: NodeWeight, region_weight: NodeWeight) -> f64 {
        let side0 = self.rest[0] + source_weight;
        let side1 = self.rest[1] + region_weight - source_weight;
        let relative = |weight: NodeWeight, cap: NodeWeight| weight as f64 / cap.max(1) as f64;
        relative(side0, self.caps[0]).max(relative(side1, self.caps[1]))
    }
}

/// Source side of a minimum cut in a saturated network.
///
/// Without balancing this is the set of vertices reachable from the
/// source. With balancing every closed set of the residual graph between
/// the minimal source side and the complement of the minimal sink side is
/// a minimum cut; random topological sweeps over the strongly connected
/// components pick the one with the lowest maximum relative block load.
pub fn source_side(
    region: &RegionNetwork,
    sides: SideWeights,
    most_balanced: bool,
    rng: &mut RngHandle,
) -> Vec<bool> {
    let network = &region.network;
    let mut side = network.residual_reachable(region.source);
    if !most_balanced {
        return side;
    }

    let reaches_sink = reverse_reachable(region);
    let undecided: Vec<bool> = (0..network.num_vertices())
        .map(|vertex| !side[vertex] && !reaches_sink[vertex])
        .collect();
    let (component, count) = strongly_connected(region, &undecided);
    if count == 0 {
        return side;
    }

    let mut comp_weight = vec![0; count];
    for (vertex, comp) in component.iter().enumerate() {
        if let Some(comp) = comp {
            comp_weight[*comp] += region.weights[vertex];
        }
    }
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    for vertex in 0..network.num_vertices() {
        let Some(from) = component[vertex] else { continue };
        for arc in network.out_arcs(vertex) {
            if network.residual(*arc) <= 0 {
                continue;
            }
            if let Some(to) = component[network.arc(*arc).to] {
                if to != from {
                    successors[from].push(to);
                }
            }
        }
    }
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (from, list) in successors.iter_mut().enumerate() {
        list.sort_unstable();
        list.dedup();
        for to in list.iter() {
            predecessors[*to].push(from);
        }
    }

    let region_weight: NodeWeight = region.weights.iter().sum();
    let base_weight: NodeWeight = side
        .iter()
        .zip(&region.weights)
        .filter(|(inside, _)| **inside)
        .map(|(_, weight)| *weight)
        .sum();

    let mut best_load = sides.load(base_weight, region_weight);
    let mut best_order: Vec<usize> = Vec::new();
    for _ in 0..BALANCE_SWEEPS {
        let mut pending: Vec<usize> = successors.iter().map(Vec::len).collect();
        let mut ready: Vec<usize> = (0..count).filter(|comp| pending[*comp] == 0).collect();
        let mut order = Vec::with_capacity(count);
        let mut weight = base_weight;
        while !ready.is_empty() {
            let pick = rng.inner_mut().gen_range(0..ready.len());
            let comp = ready.swap_remove(pick);
            order.push(comp);
            weight += comp_weight[comp];
            for pred in &predecessors[comp] {
                pending[*pred] -= 1;
                if pending[*pred] == 0 {
                    ready.push(*pred);
                }
            }
            let load = sides.load(weight, region_weight);
            if load < best_load {
                best_load = load;
                best_order = order.clone();
            }
        }
    }

    let mut chosen = vec![false; count];
    for comp in best_order {
        chosen[comp] = true;
    }
    for (vertex, comp) in component.iter().enumerate() {
        if let Some(comp) = comp {
            side[vertex] = chosen[*comp];
        }
    }
    side
}

/// Vertices that reach the sink through residual arcs.
fn reverse_reachable(region: &RegionNetwork) -> Vec<bool> {
    let network = &region.network;
    let mut seen = vec![false; network.num_vertices()];
    let mut stack = vec![region.sink];
    seen[region.sink] = true;
    while let Some(vertex) = stack.pop() {
        for arc in network.out_arcs(vertex) {
            // Residual arc tail -> vertex is the reverse of `arc`.
            let tail = network.arc(*arc).to;
            if !seen[tail] && network.residual(*arc ^ 1) > 0 {
                seen[tail] = true;
                stack.push(tail);
            }
        }
    }
    seen
}

/// Tarjan's algorithm over the residual graph restricted to `mask`.
fn strongly_connected(region: &RegionNetwork, mask: &[bool]) -> (Vec<Option<usize>>, usize) {
    let network = &region.network;
    let n = network.num_vertices();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut component: Vec<Option<usize>> = vec![None; n];
    let mut next_index = 0;
    let mut count = 0;

    for start in 0..n {
        if !mask[start] || index[start].is_some() {
            continue;
        }
        index[start] = Some(next_index);
        lowlink[start] = next_index;
        next_index += 1;
        stack.push(start);
        on_stack[start] = true;
        let mut frames: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(frame) = frames.last_mut() {
            let (vertex, position) = *frame;
            let arcs = network.out_arcs(vertex);
            if position < arcs.len() {
                frame.1 += 1;
                let arc = arcs[position];
                let head = network.arc(arc).to;
                if network.residual(arc) <= 0 || !mask[head] {
                    continue;
                }
                match index[head] {
                    None => {
                        index[head] = Some(next_index);
                        lowlink[head] = next_index;
                        next_index += 1;
                        stack.push(head);
                        on_stack[head] = true;
                        frames.push((head, 0));
                    }
                    Some(head_index) if on_stack[head] => {
                        lowlink[vertex] = lowlink[vertex].min(head_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some((parent, _)) = frames.last() {
                lowlink[*parent] = lowlink[*parent].min(lowlink[vertex]);
            }
            if Some(lowlink[vertex]) == index[vertex] {
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component[member] = Some(count);
                    if member == vertex {
                        break;
                    }
                }
                count += 1;
            }
        }
    }
    (component, count)
}
