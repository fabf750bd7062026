// navi_core/src/planning/dijkstra.rs

use num_traits::Zero;
use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
    hash::Hash,
};

type Cost = f64;

// Heap entry; ordering is reversed on cost so `BinaryHeap` pops the cheapest first.
#[derive(Debug, Copy, Clone)]
struct DijkstraItem<N> {
    node: N,
    cost: Cost,
}

impl<N> Eq for DijkstraItem<N> {}
impl<N> PartialEq for DijkstraItem<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}
impl<N> Ord for DijkstraItem<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}
impl<N> PartialOrd for DijkstraItem<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Outcome of a successful search.
#[derive(Debug, Clone)]
pub struct SearchResult<N> {
    /// Start to goal, both included.
    pub path: Vec<N>,
    pub cost: Cost,
    /// Number of nodes popped from the open set.
    pub expanded: usize,
}

/// Generic Dijkstra search from `start` until `is_goal` accepts a node.
///
/// `get_neighbors` yields `(neighbor, move_cost)` pairs; costs must be non-negative.
pub fn plan<N, FN, IT>(
    start: &N,
    mut is_goal: impl FnMut(&N) -> bool,
    get_neighbors: &mut FN,
) -> Option<SearchResult<N>>
where
    N: Copy + Eq + Hash,
    FN: FnMut(&N) -> IT,
    IT: IntoIterator<Item = (N, Cost)>,
{
    let mut open_set = BinaryHeap::new();
    let mut best_cost: HashMap<N, Cost> = HashMap::new();
    let mut parents: HashMap<N, N> = HashMap::new();
    let mut expanded = 0;

    best_cost.insert(*start, Cost::zero());
    open_set.push(DijkstraItem {
        node: *start,
        cost: Cost::zero(),
    });

    while let Some(DijkstraItem { node, cost }) = open_set.pop() {
        // Stale entry, a cheaper route to `node` was already expanded.
        if best_cost.get(&node).is_some_and(|&best| cost > best) {
            continue;
        }
        expanded += 1;

        if is_goal(&node) {
            return Some(SearchResult {
                path: calculate_final_path(node, &parents),
                cost,
                expanded,
            });
        }

        for (neighbor, move_cost) in get_neighbors(&node) {
            let new_cost = cost + move_cost;
            let improves = best_cost
                .get(&neighbor)
                .map_or(true, |&existing| new_cost < existing);
            if improves {
                best_cost.insert(neighbor, new_cost);
                parents.insert(neighbor, node);
                open_set.push(DijkstraItem {
                    node: neighbor,
                    cost: new_cost,
                });
            }
        }
    }

    None // No path found
}

fn calculate_final_path<N: Copy + Eq + Hash>(goal: N, parents: &HashMap<N, N>) -> Vec<N> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&parent) = parents.get(&current) {
        path.push(parent);
        current = parent;
    }
    path.reverse(); // Reverse to get start -> goal order
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // A line graph 0 - 1 - 2 - ... - 9 with unit costs plus a pricey shortcut 0 -> 9.
    fn line_neighbors(node: &i32) -> Vec<(i32, f64)> {
        let mut out = Vec::new();
        if *node > 0 {
            out.push((node - 1, 1.0));
        }
        if *node < 9 {
            out.push((node + 1, 1.0));
        }
        if *node == 0 {
            out.push((9, 20.0));
        }
        out
    }

    #[test]
    fn test_finds_cheapest_path() {
        let result = plan(&0, |n| *n == 9, &mut line_neighbors).expect("path exists");
        assert_eq!(result.path, (0..=9).collect::<Vec<_>>());
        assert_abs_diff_eq!(result.cost, 9.0);
    }

    #[test]
    fn test_start_is_goal() {
        let result = plan(&4, |n| *n == 4, &mut line_neighbors).expect("trivial path");
        assert_eq!(result.path, vec![4]);
        assert_abs_diff_eq!(result.cost, 0.0);
        assert_eq!(result.expanded, 1);
    }

    #[test]
    fn test_unreachable_goal() {
        assert!(plan(&0, |n| *n == 42, &mut line_neighbors).is_none());
    }
}
