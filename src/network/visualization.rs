//! Rendering-ready graph data.
//!
//! Unlike the analysis algorithms, everything here uses the caller's display
//! threshold (`strength >= threshold`) as the edge predicate.

use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::model::{Agent, ConnectionMatrix};

/// A node of the display graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualNode {
    /// Agent id
    pub id: usize,
    /// Cluster label
    pub cluster: usize,
    /// Number of links at or above the display threshold
    pub degree: usize,
    /// Agent value vector
    pub values: Vec<f64>,
}

/// An edge of the display graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualLink {
    /// Lower agent id
    pub source: usize,
    /// Higher agent id
    pub target: usize,
    /// Connection strength
    pub strength: f64,
}

/// `{nodes, links}` graph consumed by rendering layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationData {
    /// One node per agent, in id order
    pub nodes: Vec<VisualNode>,
    /// Links with `strength >= threshold`
    pub links: Vec<VisualLink>,
}

/// Build the display graph keeping links whose strength is at least `threshold`.
pub fn prepare_visualization_data(
    connections: &ConnectionMatrix,
    agents: &[Agent],
    threshold: f64,
) -> Result<VisualizationData> {
    if agents.len() != connections.len() {
        return Err(SimError::InvalidInput(format!(
            "{} agents for a {}-agent connection matrix",
            agents.len(),
            connections.len()
        )));
    }

    let graph = connections.to_graph(threshold);

    let nodes = graph
        .node_indices()
        .map(|idx| {
            let agent = &agents[graph[idx]];
            VisualNode {
                id: agent.id,
                cluster: agent.cluster,
                degree: graph.edges(idx).count(),
                values: agent.values.clone(),
            }
        })
        .collect();

    let links = graph
        .edge_references()
        .map(|e| VisualLink {
            source: graph[e.source()],
            target: graph[e.target()],
            strength: *e.weight(),
        })
        .collect();

    Ok(VisualizationData { nodes, links })
}

/// Graphviz DOT rendering of the display graph, grouped by cluster.
pub fn to_dot(data: &VisualizationData) -> String {
    let mut dot = String::from("graph opinet {\n  node [shape=circle style=filled];\n");

    for node in &data.nodes {
        dot.push_str(&format!(
            "  {} [label=\"{}\" group={} colorscheme=set19 fillcolor={}];\n",
            node.id,
            node.id,
            node.cluster,
            node.cluster % 9 + 1
        ));
    }

    dot.push('\n');
    for link in &data.links {
        dot.push_str(&format!(
            "  {} -- {} [penwidth={:.2}];\n",
            link.source,
            link.target,
            0.5 + link.strength * 2.5
        ));
    }

    dot.push_str("}\n");
    dot
}
