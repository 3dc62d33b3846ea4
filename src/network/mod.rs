//! Network analysis over a finished connection matrix.
//!
//! Two edge predicates exist and are kept apart:
//!
//! | Predicate            | Used by                                              |
//! |----------------------|------------------------------------------------------|
//! | `strength > 0`       | centrality, clustering, modularity, components, paths |
//! | `strength >= display` | [`prepare_visualization_data`], [`to_dot`]           |

mod centrality;
mod paths;
mod structure;
mod visualization;

pub use centrality::{betweenness_centrality, closeness_centrality, degree_centrality};
pub use paths::{bfs_distances, connected_components, shortest_path_distance};
pub use structure::{clustering_coefficient, local_clustering, modularity};
pub use visualization::{prepare_visualization_data, to_dot, VisualLink, VisualNode, VisualizationData};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::model::{Agent, ConnectionMatrix};

/// Agents listed per centrality ranking in [`NetworkMetrics`]
const TOP_RANKED: usize = 5;

/// An agent paired with a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedAgent {
    /// Agent id
    pub agent: usize,
    /// Score under the ranking's metric
    pub score: f64,
}

/// Headline metrics of the strictly-positive edge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    /// Number of agents
    pub node_count: usize,
    /// Pairs with strictly positive strength
    pub edge_count: usize,
    /// `edge_count / (n (n - 1) / 2)`
    pub density: f64,
    /// Mean number of neighbors
    pub average_degree: f64,
    /// Mean pair strength
    pub mean_strength: f64,
    /// Global clustering coefficient
    pub clustering_coefficient: f64,
    /// Newman modularity of the cluster labels
    pub modularity: f64,
    /// Number of connected components
    pub component_count: usize,
    /// Size of the largest component
    pub largest_component: usize,
    /// Highest degree centrality
    pub top_degree: Vec<RankedAgent>,
    /// Highest betweenness centrality
    pub top_betweenness: Vec<RankedAgent>,
    /// Highest closeness centrality
    pub top_closeness: Vec<RankedAgent>,
}

/// Analyzer bound to one matrix and its agents.
#[derive(Debug, Clone, Copy)]
pub struct NetworkAnalyzer<'a> {
    connections: &'a ConnectionMatrix,
    agents: &'a [Agent],
}

impl<'a> NetworkAnalyzer<'a> {
    /// Bind `connections` to `agents`; both must cover the same agents.
    pub fn new(connections: &'a ConnectionMatrix, agents: &'a [Agent]) -> Result<Self> {
        if connections.len() != agents.len() {
            return Err(SimError::InvalidInput(format!(
                "{} agents for a {}-agent connection matrix",
                agents.len(),
                connections.len()
            )));
        }
        Ok(Self {
            connections,
            agents,
        })
    }

    /// See [`degree_centrality`].
    pub fn degree_centrality(&self) -> Vec<f64> {
        degree_centrality(self.connections)
    }

    /// See [`betweenness_centrality`].
    pub fn betweenness_centrality(&self) -> Vec<f64> {
        betweenness_centrality(self.connections)
    }

    /// See [`closeness_centrality`].
    pub fn closeness_centrality(&self) -> Vec<f64> {
        closeness_centrality(self.connections)
    }

    /// See [`clustering_coefficient`].
    pub fn clustering_coefficient(&self) -> f64 {
        clustering_coefficient(self.connections)
    }

    /// See [`local_clustering`].
    pub fn local_clustering(&self) -> Vec<f64> {
        local_clustering(self.connections)
    }

    /// Modularity of the bound agents' cluster labels.
    pub fn modularity(&self) -> f64 {
        // Lengths were checked in `new`
        modularity(self.connections, self.agents).unwrap_or(0.0)
    }

    /// See [`connected_components`].
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        connected_components(self.connections)
    }

    /// See [`shortest_path_distance`].
    pub fn shortest_path_distance(&self, start: usize, end: usize) -> Result<Option<usize>> {
        shortest_path_distance(self.connections, start, end)
    }

    /// Display graph at `threshold`.
    pub fn visualization(&self, threshold: f64) -> VisualizationData {
        // Lengths were checked in `new`
        prepare_visualization_data(self.connections, self.agents, threshold).unwrap_or(
            VisualizationData {
                nodes: Vec::new(),
                links: Vec::new(),
            },
        )
    }

    /// Compute every headline metric.
    pub fn summary(&self) -> NetworkMetrics {
        let n = self.connections.len();
        let degrees = self.degree_centrality();
        let degree_sum: f64 = degrees.iter().sum();
        let edge_count = (degree_sum / 2.0).round() as usize;
        let pairs = n * n.saturating_sub(1) / 2;
        let components = self.connected_components();

        NetworkMetrics {
            node_count: n,
            edge_count,
            density: if pairs == 0 {
                0.0
            } else {
                edge_count as f64 / pairs as f64
            },
            average_degree: if n == 0 { 0.0 } else { degree_sum / n as f64 },
            mean_strength: self.connections.mean_strength(),
            clustering_coefficient: self.clustering_coefficient(),
            modularity: self.modularity(),
            component_count: components.len(),
            largest_component: components.iter().map(Vec::len).max().unwrap_or(0),
            top_degree: top_ranked(&degrees),
            top_betweenness: top_ranked(&self.betweenness_centrality()),
            top_closeness: top_ranked(&self.closeness_centrality()),
        }
    }
}

/// Highest-scoring agents, ties broken by lower id.
fn top_ranked(scores: &[f64]) -> Vec<RankedAgent> {
    let mut ranked: Vec<RankedAgent> = scores
        .iter()
        .enumerate()
        .map(|(agent, &score)| RankedAgent { agent, score })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.agent.cmp(&b.agent))
    });
    ranked.truncate(TOP_RANKED);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_agents(n: usize) -> Vec<Agent> {
        (0..n).map(|id| Agent::new(id, vec![1.0], id / 3)).collect()
    }

    #[test]
    fn test_analyzer_rejects_mismatched_agents() {
        let m = ConnectionMatrix::new(4);
        assert!(NetworkAnalyzer::new(&m, &line_agents(3)).is_err());
    }

    #[test]
    fn test_summary_path_graph() {
        let mut m = ConnectionMatrix::new(4);
        m.set(0, 1, 1.0);
        m.set(1, 2, 1.0);
        m.set(2, 3, 1.0);
        let agents = line_agents(4);
        let summary = NetworkAnalyzer::new(&m, &agents).unwrap().summary();

        assert_eq!(summary.node_count, 4);
        assert_eq!(summary.edge_count, 3);
        assert!((summary.density - 0.5).abs() < 1e-12);
        assert!((summary.average_degree - 1.5).abs() < 1e-12);
        assert_eq!(summary.component_count, 1);
        assert_eq!(summary.largest_component, 4);
        assert_eq!(summary.clustering_coefficient, 0.0);
        assert_eq!(summary.top_betweenness[0].agent, 1);
        assert_eq!(summary.top_betweenness[1].agent, 2);
        assert_eq!(summary.top_degree.len(), 4);
    }

    #[test]
    fn test_summary_empty_matrix() {
        let m = ConnectionMatrix::new(0);
        let summary = NetworkAnalyzer::new(&m, &[]).unwrap().summary();
        assert_eq!(summary.node_count, 0);
        assert_eq!(summary.density, 0.0);
        assert_eq!(summary.component_count, 0);
        assert!(summary.top_closeness.is_empty());
    }

    #[test]
    fn test_top_ranked_truncates_and_orders() {
        let ranked = top_ranked(&[0.1, 0.9, 0.5, 0.9, 0.0, 0.3, 0.2]);
        assert_eq!(ranked.len(), TOP_RANKED);
        assert_eq!(ranked[0].agent, 1);
        assert_eq!(ranked[1].agent, 3);
        assert_eq!(ranked[2].agent, 2);
    }
}
