//! Clustering coefficient and modularity.

use crate::error::{Result, SimError};
use crate::model::{Agent, ConnectionMatrix};

/// Local clustering coefficient per agent.
///
/// `closed triangles among neighbors / possible triangles`; agents with fewer
/// than two neighbors score 0.
pub fn local_clustering(connections: &ConnectionMatrix) -> Vec<f64> {
    (0..connections.len())
        .map(|i| {
            let neighbors: Vec<usize> = connections.neighbors(i).collect();
            let k = neighbors.len();
            if k < 2 {
                return 0.0;
            }
            let mut closed = 0usize;
            for (a_pos, &a) in neighbors.iter().enumerate() {
                for &b in &neighbors[a_pos + 1..] {
                    if connections.has_edge(a, b) {
                        closed += 1;
                    }
                }
            }
            closed as f64 / (k * (k - 1) / 2) as f64
        })
        .collect()
}

/// Global clustering coefficient: mean local coefficient over all N agents,
/// agents with fewer than two neighbors included as 0.
pub fn clustering_coefficient(connections: &ConnectionMatrix) -> f64 {
    let n = connections.len();
    if n == 0 {
        return 0.0;
    }
    local_clustering(connections).iter().sum::<f64>() / n as f64
}

/// Newman modularity of the agents' cluster labels.
///
/// Uses the unweighted adjacency of strictly positive entries:
/// `Q = Σ_ij [A_ij - k_i k_j / 2m] δ(c_i, c_j) / 2m`. Returns 0 for a graph
/// without edges.
pub fn modularity(connections: &ConnectionMatrix, agents: &[Agent]) -> Result<f64> {
    let n = connections.len();
    if agents.len() != n {
        return Err(SimError::InvalidInput(format!(
            "modularity needs one agent per matrix row: {} agents, {n} rows",
            agents.len()
        )));
    }

    let degrees: Vec<f64> = (0..n)
        .map(|i| connections.neighbors(i).count() as f64)
        .collect();
    let two_m: f64 = degrees.iter().sum();
    if two_m == 0.0 {
        return Ok(0.0);
    }

    let mut q = 0.0;
    for i in 0..n {
        for j in 0..n {
            if agents[i].cluster != agents[j].cluster {
                continue;
            }
            let a_ij = if connections.has_edge(i, j) { 1.0 } else { 0.0 };
            q += a_ij - degrees[i] * degrees[j] / two_m;
        }
    }
    Ok(q / two_m)
}
