//! Shortest and longest paths through the layered search graph of a task.
//!
//! Each task point contributes one layer of candidate search points and
//! every edge joins consecutive layers. All complete paths therefore have the
//! same number of edges, which lets the longest path be found with the same
//! search on biased weights.

use crate::geo::GeoPoint;
use crate::search_point::SearchPoint;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    cost: FloatOrd,
    layer: usize,
    index: usize,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.layer.cmp(&other.layer))
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Reusable layered-graph search.
#[derive(Debug, Clone, Default)]
pub struct TaskDijkstra {
    cost: Vec<Vec<f64>>,
    came_from: Vec<Vec<Option<usize>>>,
    open: BinaryHeap<Reverse<OpenNode>>,
}

impl TaskDijkstra {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortest path through every layer, optionally leaving from `origin`.
    /// Returns the chosen index in each layer.
    pub fn solve_min(
        &mut self,
        layers: &[&[SearchPoint]],
        origin: Option<&SearchPoint>,
    ) -> Option<Vec<usize>> {
        self.solve(layers, origin, |a, b| a.flat_distance(b))
    }

    /// Longest path through every layer.
    pub fn solve_max(&mut self, layers: &[&[SearchPoint]]) -> Option<Vec<usize>> {
        let longest_edge = layers
            .windows(2)
            .flat_map(|pair| {
                pair[0]
                    .iter()
                    .flat_map(move |a| pair[1].iter().map(move |b| a.flat_distance(b)))
            })
            .fold(0.0_f64, f64::max);
        let bias = longest_edge + 1.0;
        self.solve(layers, None, |a, b| bias - a.flat_distance(b))
    }

    fn solve<F>(
        &mut self,
        layers: &[&[SearchPoint]],
        origin: Option<&SearchPoint>,
        weight: F,
    ) -> Option<Vec<usize>>
    where
        F: Fn(&SearchPoint, &SearchPoint) -> f64,
    {
        if layers.is_empty() || layers.iter().any(|l| l.is_empty()) {
            return None;
        }
        self.reset(layers);

        for (index, point) in layers[0].iter().enumerate() {
            let cost = origin.map(|o| weight(o, point)).unwrap_or(0.0);
            self.cost[0][index] = cost;
            self.open.push(Reverse(OpenNode {
                cost: FloatOrd(cost),
                layer: 0,
                index,
            }));
        }

        let last = layers.len() - 1;
        while let Some(Reverse(current)) = self.open.pop() {
            if current.cost.0 > self.cost[current.layer][current.index] {
                continue;
            }
            if current.layer == last {
                return Some(self.backtrack(current.index));
            }
            let from = &layers[current.layer][current.index];
            let next_layer = current.layer + 1;
            for (index, to) in layers[next_layer].iter().enumerate() {
                let tentative = current.cost.0 + weight(from, to);
                if tentative < self.cost[next_layer][index] {
                    self.cost[next_layer][index] = tentative;
                    self.came_from[next_layer][index] = Some(current.index);
                    self.open.push(Reverse(OpenNode {
                        cost: FloatOrd(tentative),
                        layer: next_layer,
                        index,
                    }));
                }
            }
        }
        None
    }

    fn reset(&mut self, layers: &[&[SearchPoint]]) {
        self.open.clear();
        self.cost.resize_with(layers.len(), Vec::new);
        self.came_from.resize_with(layers.len(), Vec::new);
        for (i, layer) in layers.iter().enumerate() {
            self.cost[i].clear();
            self.cost[i].resize(layer.len(), f64::INFINITY);
            self.came_from[i].clear();
            self.came_from[i].resize(layer.len(), None);
        }
        self.cost.truncate(layers.len());
        self.came_from.truncate(layers.len());
    }

    fn backtrack(&self, last_index: usize) -> Vec<usize> {
        let mut path = vec![0; self.cost.len()];
        let mut index = last_index;
        for layer in (0..self.cost.len()).rev() {
            path[layer] = index;
            if let Some(previous) = self.came_from[layer][index] {
                index = previous;
            }
        }
        path
    }
}

/// Search state owned by a task, dropped whenever its structure changes.
#[derive(Debug, Clone, Default)]
pub struct SearchScratch {
    pub(crate) dijkstra: Option<TaskDijkstra>,
    pub(crate) location_min_last: Option<GeoPoint>,
}

impl SearchScratch {
    pub fn invalidate(&mut self) {
        self.dijkstra = None;
        self.location_min_last = None;
    }

    pub(crate) fn dijkstra(&mut self) -> &mut TaskDijkstra {
        self.dijkstra.get_or_insert_with(TaskDijkstra::new)
    }
}
