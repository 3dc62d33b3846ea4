//! Pluggable topic generation.

use rand::RngCore;

use crate::error::Result;
use crate::model::{Agent, ClusterCenter};

/// Everything a topic strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct TopicContext<'a> {
    /// Generated population
    pub agents: &'a [Agent],
    /// One center per cluster
    pub cluster_centers: &'a [ClusterCenter],
    /// Required length of every topic vector
    pub dimension: usize,
    /// Number of clusters the population was built with
    pub num_clusters: usize,
    /// Re-clustering period passed through from the configuration (unused by
    /// the built-in paths)
    pub recalculate_clusters_after: Option<usize>,
}

impl<'a> TopicContext<'a> {
    /// Context with `num_clusters` taken from the number of centers.
    pub fn new(agents: &'a [Agent], cluster_centers: &'a [ClusterCenter], dimension: usize) -> Self {
        Self {
            agents,
            cluster_centers,
            dimension,
            num_clusters: cluster_centers.len(),
            recalculate_clusters_after: None,
        }
    }

    /// Override the cluster count.
    pub fn with_num_clusters(mut self, num_clusters: usize) -> Self {
        self.num_clusters = num_clusters;
        self
    }

    /// Pass a re-clustering period through to strategies.
    pub fn with_recalculate_after(mut self, cycles: Option<usize>) -> Self {
        self.recalculate_clusters_after = cycles;
        self
    }
}

/// A caller-provided routine that produces raw topic vectors.
///
/// Returned vectors are normalized and numbered in order. An `Err`, an empty
/// list, or any vector of the wrong dimension makes the generator fall back to
/// its standard path.
///
/// Plain functions and closures with the matching signature implement this
/// trait:
///
/// ```rust
/// use opinet::topics::{TopicContext, TopicGenerationStrategy};
/// use rand::RngCore;
///
/// fn mirror_centers(ctx: &TopicContext<'_>, _rng: &mut dyn RngCore) -> opinet::Result<Vec<Vec<f64>>> {
///     Ok(ctx.cluster_centers.iter().map(|c| c.iter().map(|x| -x).collect()).collect())
/// }
///
/// let strategy: &dyn TopicGenerationStrategy = &mirror_centers;
/// assert_eq!(strategy.name(), "custom");
/// ```
pub trait TopicGenerationStrategy: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        "custom"
    }

    /// Produce raw topic vectors.
    fn generate(&self, ctx: &TopicContext<'_>, rng: &mut dyn RngCore) -> Result<Vec<Vec<f64>>>;
}

impl<F> TopicGenerationStrategy for F
where
    F: Fn(&TopicContext<'_>, &mut dyn RngCore) -> Result<Vec<Vec<f64>>> + Send + Sync,
{
    fn generate(&self, ctx: &TopicContext<'_>, rng: &mut dyn RngCore) -> Result<Vec<Vec<f64>>> {
        self(ctx, rng)
    }
}
