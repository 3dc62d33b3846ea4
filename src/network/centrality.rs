//! Centrality measures: degree, betweenness (Brandes), closeness.

use std::collections::VecDeque;

use crate::model::ConnectionMatrix;

use super::paths::bfs_distances;

/// Number of strictly positive incident entries per agent.
pub fn degree_centrality(connections: &ConnectionMatrix) -> Vec<f64> {
    (0..connections.len())
        .map(|i| connections.neighbors(i).count() as f64)
        .collect()
}

/// Betweenness centrality via Brandes' algorithm.
///
/// Unweighted BFS from every source over the strictly-positive edge graph.
/// Raw scores accumulate both directions of every pair and are scaled by
/// `2 / ((n - 1)(n - 2))` when `n > 2`.
pub fn betweenness_centrality(connections: &ConnectionMatrix) -> Vec<f64> {
    let n = connections.len();
    let mut bc = vec![0.0_f64; n];

    for s in 0..n {
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0_f64; n];
        let mut dist = vec![-1_i64; n];
        let mut delta = vec![0.0_f64; n];

        sigma[s] = 1.0;
        dist[s] = 0;
        let mut queue = VecDeque::from([s]);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for w in connections.neighbors(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        // Back-propagate dependencies in reverse BFS order
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                bc[w] += delta[w];
            }
        }
    }

    let scale = if n > 2 {
        2.0 / ((n - 1) * (n - 2)) as f64
    } else {
        1.0
    };
    for b in &mut bc {
        *b *= scale;
    }
    bc
}

/// Closeness centrality: `reachable / sum(distances)` over reachable agents.
///
/// Unreachable agents are left out of both terms; an agent reaching nobody
/// scores `0`.
pub fn closeness_centrality(connections: &ConnectionMatrix) -> Vec<f64> {
    (0..connections.len())
        .map(|s| {
            let mut reachable = 0usize;
            let mut total = 0usize;
            for (node, d) in bfs_distances(connections, s).into_iter().enumerate() {
                if let Some(d) = d {
                    if node != s {
                        reachable += 1;
                        total += d;
                    }
                }
            }
            if reachable == 0 || total == 0 {
                0.0
            } else {
                reachable as f64 / total as f64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path4() -> ConnectionMatrix {
        let mut m = ConnectionMatrix::new(4);
        m.set(0, 1, 1.0);
        m.set(1, 2, 1.0);
        m.set(2, 3, 1.0);
        m
    }

    fn star(leaves: usize) -> ConnectionMatrix {
        let mut m = ConnectionMatrix::new(leaves + 1);
        for leaf in 1..=leaves {
            m.set(0, leaf, 0.5);
        }
        m
    }

    #[test]
    fn test_degree_counts_positive_entries() {
        assert_eq!(degree_centrality(&path4()), vec![1.0, 2.0, 2.0, 1.0]);
        assert_eq!(degree_centrality(&star(3)), vec![3.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_betweenness_path_graph() {
        let bc = betweenness_centrality(&path4());
        assert_eq!(bc[0], 0.0);
        assert_eq!(bc[3], 0.0);
        assert!(bc[1] > 0.0);
        assert!((bc[1] - bc[2]).abs() < 1e-12);
        // Raw Brandes score 4 for each inner node, scaled by 2 / (3 * 2)
        assert!((bc[1] - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_betweenness_star_center() {
        let bc = betweenness_centrality(&star(4));
        assert!(bc[1..].iter().all(|&b| b == 0.0));
        // 6 leaf pairs, both directions, scaled by 2 / (4 * 3)
        assert!((bc[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_betweenness_complete_graph_is_zero() {
        let mut m = ConnectionMatrix::new(4);
        for i in 0..4 {
            for j in (i + 1)..4 {
                m.set(i, j, 0.2);
            }
        }
        assert!(betweenness_centrality(&m).iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_betweenness_small_graphs() {
        assert!(betweenness_centrality(&ConnectionMatrix::new(0)).is_empty());
        assert_eq!(betweenness_centrality(&ConnectionMatrix::new(2)), vec![0.0, 0.0]);
    }

    #[test]
    fn test_closeness_path_graph() {
        let cc = closeness_centrality(&path4());
        // Node 0: distances 1, 2, 3
        assert!((cc[0] - 3.0 / 6.0).abs() < 1e-12);
        // Node 1: distances 1, 1, 2
        assert!((cc[1] - 3.0 / 4.0).abs() < 1e-12);
        assert!((cc[0] - cc[3]).abs() < 1e-12);
    }

    #[test]
    fn test_closeness_excludes_unreachable() {
        let mut m = ConnectionMatrix::new(3);
        m.set(0, 1, 0.3);
        let cc = closeness_centrality(&m);
        assert_eq!(cc, vec![1.0, 1.0, 0.0]);
    }
}
