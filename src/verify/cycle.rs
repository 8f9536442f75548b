use std::fmt::{self, Write};

use indexmap::IndexSet;
use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::dice::{DicePath, DiceSet};
use crate::verify::dominance::BeatCount;

/// Direction in which every step of an intransitive path must go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Each die beats the next one: P > 1/2.
    Beats,
    /// Each die loses to the next one: P < 1/2.
    Loses,
}

impl Orientation {
    pub fn holds(&self, count: BeatCount) -> bool {
        match self {
            Orientation::Beats => 2 * count.wins > count.total,
            Orientation::Loses => 2 * count.wins < count.total,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Orientation::Beats => Orientation::Loses,
            Orientation::Loses => Orientation::Beats,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Beats => write!(f, "beats"),
            Orientation::Loses => write!(f, "loses"),
        }
    }
}

pub struct CycleVerification {
    pub is_intransitive: bool,
    pub probabilities: Vec<f64>,
    pub explanation: String,
}

/// Checks that every step of a dice path goes in the same direction.
pub struct CycleVerifier;

impl CycleVerifier {
    pub fn verify(set: &DiceSet, path: &DicePath, orientation: Orientation) -> CycleVerification {
        let mut explanation = String::new();

        if path.len() < 2 {
            return CycleVerification {
                is_intransitive: false,
                probabilities: Vec::new(),
                explanation: format!("Path '{}' needs at least two dice", path),
            };
        }
        if let Some(max) = path.max_index() {
            if max >= set.len() {
                return CycleVerification {
                    is_intransitive: false,
                    probabilities: Vec::new(),
                    explanation: format!(
                        "Path index {} out of bounds for dice set of size {}",
                        max,
                        set.len()
                    ),
                };
            }
        }

        let matrix = set.dominance_matrix();
        let mut is_intransitive = true;
        let mut probabilities = Vec::with_capacity(path.len() - 1);
        for (from, to) in path.steps() {
            let Some(count) = matrix.count(from, to) else {
                is_intransitive = false;
                break;
            };
            let satisfied = orientation.holds(count);
            if !satisfied {
                is_intransitive = false;
            }
            probabilities.push(count.probability());
            let _ = writeln!(
                explanation,
                "D{:02} -> D{:02}: P={:.3} {}: {}",
                from,
                to,
                count.probability(),
                orientation,
                satisfied
            );
        }

        CycleVerification {
            is_intransitive,
            probabilities,
            explanation,
        }
    }

    /// The orientation in which `path` is intransitive, if any.
    pub fn detect(set: &DiceSet, path: &DicePath) -> Option<Orientation> {
        [Orientation::Beats, Orientation::Loses]
            .into_iter()
            .find(|orientation| Self::verify(set, path, *orientation).is_intransitive)
    }
}

/// Directed graph over the dice of a set with an edge `i -> j` whenever the
/// pair satisfies the orientation.
pub struct DominanceGraph {
    pub graph: DiGraph<usize, f64>,
    pub orientation: Orientation,
}

impl DominanceGraph {
    pub fn build(set: &DiceSet, orientation: Orientation) -> Self {
        let matrix = set.dominance_matrix();
        let mut graph = DiGraph::with_capacity(set.len(), set.len() * set.len() / 2);
        let nodes: Vec<NodeIndex> = (0..set.len()).map(|idx| graph.add_node(idx)).collect();
        for from in 0..set.len() {
            for to in 0..set.len() {
                if from == to {
                    continue;
                }
                if let Some(count) = matrix.count(from, to) {
                    if orientation.holds(count) {
                        graph.add_edge(nodes[from], nodes[to], count.probability());
                    }
                }
            }
        }
        Self { graph, orientation }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Dice ordered by index that no other die reaches.
    pub fn without_predecessor(&self) -> Vec<usize> {
        self.graph
            .node_indices()
            .filter(|&node| {
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|node| self.graph[node])
            .collect()
    }

    fn successors(&self, node: usize) -> Vec<usize> {
        let mut next: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(node), Direction::Outgoing)
            .map(|idx| self.graph[idx])
            .collect();
        next.sort_unstable();
        next
    }

    /// Hamiltonian cycles from die 0 back to die 0, found depth first with
    /// successors in ascending index order. `limit` caps the number returned.
    pub fn hamiltonian_cycles(&self, limit: Option<usize>) -> Vec<DicePath> {
        let mut cycles = Vec::new();
        if self.node_count() < 2 || limit == Some(0) {
            return cycles;
        }
        let orphans = self.without_predecessor();
        if !orphans.is_empty() {
            debug!(
                "No {} cycle possible: dice {:?} have no predecessor",
                self.orientation, orphans
            );
            return cycles;
        }

        let mut visited = IndexSet::with_capacity(self.node_count());
        visited.insert(0);
        self.extend_cycle(&mut visited, limit, &mut cycles);
        cycles
    }

    fn extend_cycle(
        &self,
        visited: &mut IndexSet<usize>,
        limit: Option<usize>,
        cycles: &mut Vec<DicePath>,
    ) -> bool {
        let Some(&current) = visited.last() else {
            return false;
        };
        let successors = self.successors(current);

        if visited.len() == self.node_count() {
            if successors.contains(&0) {
                let mut indices: Vec<usize> = visited.iter().copied().collect();
                indices.push(0);
                cycles.push(DicePath::new(indices));
            }
            return limit.map_or(false, |limit| cycles.len() >= limit);
        }

        for next in successors {
            if visited.contains(&next) {
                continue;
            }
            visited.insert(next);
            let done = self.extend_cycle(visited, limit, cycles);
            visited.pop();
            if done {
                return true;
            }
        }
        false
    }
}

/// All Hamiltonian cycles of `set` in the given orientation, up to `limit`.
pub fn search_cycles(set: &DiceSet, orientation: Orientation, limit: Option<usize>) -> Vec<DicePath> {
    DominanceGraph::build(set, orientation).hamiltonian_cycles(limit)
}
