//! Core data model: agents, topics, cluster centers and the connection matrix.

mod matrix;

pub use matrix::ConnectionMatrix;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A cluster center: unit-normalized vector of the simulation dimension.
pub type ClusterCenter = Vec<f64>;

/// A simulated actor with a fixed value vector and cluster label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable index in `0..N`
    pub id: usize,
    /// Unit-normalized value vector
    pub values: Vec<f64>,
    /// Cluster label in `0..num_clusters`
    pub cluster: usize,
    /// Opinion per topic id, each in `[-1, 1]`
    #[serde(default)]
    pub opinions: BTreeMap<usize, f64>,
}

impl Agent {
    /// Create an agent with no opinions yet.
    pub fn new(id: usize, values: Vec<f64>, cluster: usize) -> Self {
        Self {
            id,
            values,
            cluster,
            opinions: BTreeMap::new(),
        }
    }

    /// Opinion on `topic_id`, if one has been assigned.
    pub fn opinion(&self, topic_id: usize) -> Option<f64> {
        self.opinions.get(&topic_id).copied()
    }
}

/// A discussion subject represented as a unit vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Index of the topic within its generation batch
    pub id: usize,
    /// Unit-normalized topic vector
    pub vector: Vec<f64>,
    /// Display name, when the topic came from labelled input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Set on topics deliberately aligned with one cluster's center
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_target_topic: bool,
    /// Cluster the topic was aligned with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cluster: Option<usize>,
}

impl Topic {
    /// Wrap a raw vector, normalizing it.
    pub fn new(id: usize, vector: &[f64]) -> Self {
        Self {
            id,
            vector: crate::vector::normalize(vector),
            name: None,
            is_target_topic: false,
            target_cluster: None,
        }
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Label used in reports: the name when present, otherwise `Topic <id>`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Topic {}", self.id),
        }
    }
}
