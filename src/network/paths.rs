//! Breadth-first traversal over the strictly-positive edge graph.

use std::collections::VecDeque;

use crate::error::{Result, SimError};
use crate::model::ConnectionMatrix;

/// Hop distance from `source` to every node; `None` where unreachable.
pub fn bfs_distances(connections: &ConnectionMatrix, source: usize) -> Vec<Option<usize>> {
    let n = connections.len();
    let mut dist = vec![None; n];
    if source >= n {
        return dist;
    }

    dist[source] = Some(0);
    let mut queue = VecDeque::from([source]);
    while let Some(v) = queue.pop_front() {
        let next = dist[v].map_or(0, |d| d + 1);
        for w in connections.neighbors(v) {
            if dist[w].is_none() {
                dist[w] = Some(next);
                queue.push_back(w);
            }
        }
    }
    dist
}

/// Unweighted shortest-path hop count between `start` and `end`.
///
/// `Ok(None)` means the two agents are disconnected.
pub fn shortest_path_distance(
    connections: &ConnectionMatrix,
    start: usize,
    end: usize,
) -> Result<Option<usize>> {
    let n = connections.len();
    for node in [start, end] {
        if node >= n {
            return Err(SimError::NodeOutOfRange { node, len: n });
        }
    }
    if start == end {
        return Ok(Some(0));
    }
    Ok(bfs_distances(connections, start)[end])
}

/// Partition of agent ids into connected components.
///
/// Components are listed in order of their smallest member; members are
/// sorted ascending.
pub fn connected_components(connections: &ConnectionMatrix) -> Vec<Vec<usize>> {
    let n = connections.len();
    let mut visited = vec![false; n];
    let mut components = Vec::new();

    for root in 0..n {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        let mut component = vec![root];
        let mut queue = VecDeque::from([root]);
        while let Some(v) = queue.pop_front() {
            for w in connections.neighbors(v) {
                if !visited[w] {
                    visited[w] = true;
                    component.push(w);
                    queue.push_back(w);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }

    components
}
