//! Topic generation.
//!
//! Sources are tried in priority order:
//!
//! 1. A user-supplied [`TopicGenerationStrategy`] ([`TopicScenario::UserSupplied`]).
//!    Any failure, including a malformed result, falls back to the standard path.
//! 2. Uploaded topic vectors, wrapped in order with their index as id.
//! 3. Ten synthetic topics built from a sine/cosine pattern plus uniform noise.
//!
//! [`TopicScenario::ClusterBiased`] then overwrites topics 0 and 1 with
//! near-copies of one randomly chosen cluster center.

mod strategy;

pub use strategy::{TopicContext, TopicGenerationStrategy};

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SimError};
use crate::model::Topic;
use crate::vector::{ensure_dimension, jitter, normalize};

/// Number of topics produced by the synthetic path
pub const DEFAULT_TOPIC_COUNT: usize = 10;

/// Per-component noise on the primary cluster-biased topic
const PRIMARY_TARGET_NOISE: f64 = 0.025;

/// Per-component noise on the secondary cluster-biased topic
const SECONDARY_TARGET_NOISE: f64 = 0.04;

/// A raw topic vector with an optional display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicInput {
    /// Name taken from a leading label column, if any
    #[serde(default)]
    pub name: Option<String>,
    /// Raw (not necessarily normalized) vector
    pub vector: Vec<f64>,
}

impl From<Vec<f64>> for TopicInput {
    fn from(vector: Vec<f64>) -> Self {
        Self { name: None, vector }
    }
}

/// How topics are produced for a run.
#[derive(Clone, Default)]
pub enum TopicScenario {
    /// Scenario "A": standard generation only
    #[default]
    Default,
    /// Scenario "B": standard generation, then bias topics 0 and 1 toward one cluster
    ClusterBiased,
    /// Caller-provided strategy, with the standard path as fallback
    UserSupplied(Arc<dyn TopicGenerationStrategy>),
}

impl fmt::Debug for TopicScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::ClusterBiased => write!(f, "ClusterBiased"),
            Self::UserSupplied(strategy) => write!(f, "UserSupplied({})", strategy.name()),
        }
    }
}

/// Builds the topic set for one simulation run.
#[derive(Debug, Clone, Default)]
pub struct TopicGenerator {
    scenario: TopicScenario,
    initial_topics: Option<Vec<TopicInput>>,
}

impl TopicGenerator {
    /// Create a generator for `scenario`.
    pub fn new(scenario: TopicScenario) -> Self {
        Self {
            scenario,
            initial_topics: None,
        }
    }

    /// Use uploaded topic vectors instead of synthetic ones.
    pub fn with_initial_topics(mut self, topics: Vec<TopicInput>) -> Self {
        self.initial_topics = Some(topics);
        self
    }

    /// Scenario this generator runs.
    pub fn scenario(&self) -> &TopicScenario {
        &self.scenario
    }

    /// Produce the topics for `ctx`.
    pub fn generate(&self, ctx: &TopicContext<'_>, rng: &mut impl Rng) -> Result<Vec<Topic>> {
        if ctx.dimension == 0 {
            return Err(SimError::InvalidInput(
                "topic dimension must be at least 1".to_string(),
            ));
        }

        if let TopicScenario::UserSupplied(strategy) = &self.scenario {
            match run_strategy(strategy.as_ref(), ctx, rng) {
                Ok(topics) => {
                    info!(
                        strategy = strategy.name(),
                        topics = topics.len(),
                        "Generated topics from custom strategy"
                    );
                    return Ok(topics);
                },
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        "Custom topic strategy failed, using standard generation: {e}"
                    );
                },
            }
        }

        let mut topics = match &self.initial_topics {
            Some(inputs) => wrap_inputs(inputs, ctx.dimension)?,
            None => synthetic_topics(ctx.dimension, rng),
        };

        if matches!(self.scenario, TopicScenario::ClusterBiased) {
            bias_toward_cluster(&mut topics, ctx, rng)?;
        }

        info!(topics = topics.len(), scenario = ?self.scenario, "Generated topics");
        Ok(topics)
    }
}

/// Convenience wrapper: build a [`TopicGenerator`] and run it.
pub fn generate_topics(
    scenario: TopicScenario,
    initial_topics: Option<Vec<TopicInput>>,
    ctx: &TopicContext<'_>,
    rng: &mut impl Rng,
) -> Result<Vec<Topic>> {
    let mut generator = TopicGenerator::new(scenario);
    if let Some(inputs) = initial_topics {
        generator = generator.with_initial_topics(inputs);
    }
    generator.generate(ctx, rng)
}

fn run_strategy<R: Rng>(
    strategy: &dyn TopicGenerationStrategy,
    ctx: &TopicContext<'_>,
    rng: &mut R,
) -> Result<Vec<Topic>> {
    let vectors = strategy.generate(ctx, rng as &mut dyn RngCore)?;
    if vectors.is_empty() {
        return Err(SimError::Strategy("strategy returned no topics".to_string()));
    }
    vectors
        .iter()
        .enumerate()
        .map(|(id, v)| {
            ensure_dimension(v, ctx.dimension)
                .map_err(|e| SimError::Strategy(format!("topic {id}: {e}")))?;
            Ok(Topic::new(id, v))
        })
        .collect()
}

fn wrap_inputs(inputs: &[TopicInput], dimension: usize) -> Result<Vec<Topic>> {
    if inputs.is_empty() {
        return Err(SimError::InvalidInput(
            "uploaded topic vectors are empty".to_string(),
        ));
    }
    inputs
        .iter()
        .enumerate()
        .map(|(id, input)| {
            ensure_dimension(&input.vector, dimension)?;
            let topic = Topic::new(id, &input.vector);
            Ok(match &input.name {
                Some(name) => topic.with_name(name.clone()),
                None => topic,
            })
        })
        .collect()
}

fn synthetic_topics(dimension: usize, rng: &mut impl Rng) -> Vec<Topic> {
    (0..DEFAULT_TOPIC_COUNT)
        .map(|i| {
            let phase = (i as f64 * PI / 5.0).sin();
            let raw: Vec<f64> = (0..dimension)
                .map(|j| phase * (j as f64 * PI / dimension as f64).cos() + rng.gen_range(-1.0..=1.0))
                .collect();
            Topic::new(i, &raw)
        })
        .collect()
}

fn bias_toward_cluster(
    topics: &mut [Topic],
    ctx: &TopicContext<'_>,
    rng: &mut impl Rng,
) -> Result<()> {
    if ctx.cluster_centers.is_empty() {
        warn!("Cluster-biased scenario requested without cluster centers; topics left unbiased");
        return Ok(());
    }

    let target = rng.gen_range(0..ctx.cluster_centers.len());
    let center = &ctx.cluster_centers[target];
    ensure_dimension(center, ctx.dimension)?;

    for (topic, noise) in topics
        .iter_mut()
        .zip([PRIMARY_TARGET_NOISE, SECONDARY_TARGET_NOISE])
    {
        topic.vector = normalize(&jitter(center, noise, rng));
        topic.is_target_topic = true;
        topic.target_cluster = Some(target);
    }

    info!(target_cluster = target, "Biased topics toward cluster center");
    Ok(())
}
