//! End-to-end pipeline: population, topics, interactions, opinions.
//!
//! ```text
//!   PopulationGenerator ──> agents + centers
//!          │
//!          v
//!   TopicGenerator ───────> topics
//!          │
//!          v
//!   InteractionEngine ────> connections + history
//!          │
//!          v
//!   derive_opinions ──────> SimulationState
//! ```
//!
//! Every result of a run lives in the returned [`SimulationState`]; nothing is
//! cached between runs.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::{CycleStats, InteractionEngine};
use crate::error::{Result, SimError};
use crate::model::{Agent, ClusterCenter, ConnectionMatrix, Topic};
use crate::network::NetworkAnalyzer;
use crate::population::PopulationGenerator;
use crate::stats::StatisticalAnalyzer;
use crate::topics::{TopicContext, TopicGenerationStrategy, TopicGenerator, TopicInput, TopicScenario};
use crate::vector::cosine_similarity;

/// Externally supplied data for a run. Everything is optional.
#[derive(Clone, Default)]
pub struct SimulationInputs {
    /// Uploaded agent value vectors; overrides the configured agent count and dimension
    pub agent_vectors: Option<Vec<Vec<f64>>>,
    /// Uploaded topic vectors
    pub topics: Option<Vec<TopicInput>>,
    /// Opinion matrix, rows = agents, columns = topics
    pub opinion_override: Option<Vec<Vec<f64>>>,
    /// Custom topic strategy; takes precedence over the configured scenario
    pub strategy: Option<Arc<dyn TopicGenerationStrategy>>,
}

impl std::fmt::Debug for SimulationInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationInputs")
            .field("agent_vectors", &self.agent_vectors.as_ref().map(Vec::len))
            .field("topics", &self.topics.as_ref().map(Vec::len))
            .field("opinion_override", &self.opinion_override.is_some())
            .field("strategy", &self.strategy.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    /// Run identifier
    pub run_id: Uuid,
    /// Agents with opinions filled in
    pub agents: Vec<Agent>,
    /// One center per cluster
    pub cluster_centers: Vec<ClusterCenter>,
    /// Topics of the run
    pub topics: Vec<Topic>,
    /// Final connection matrix
    pub connections: ConnectionMatrix,
    /// Per-cycle counters
    pub history: Vec<CycleStats>,
}

impl SimulationState {
    /// Network analyzer over the final matrix.
    pub fn network(&self) -> Result<NetworkAnalyzer<'_>> {
        NetworkAnalyzer::new(&self.connections, &self.agents)
    }

    /// Opinion statistics for the run.
    pub fn statistics(&self) -> StatisticalAnalyzer<'_> {
        StatisticalAnalyzer::new(&self.agents, &self.topics)
    }

    /// Number of clusters the population was built with.
    pub fn num_clusters(&self) -> usize {
        self.cluster_centers.len()
    }
}

/// Run the full pipeline under `config`.
pub fn run_simulation(
    config: &Config,
    inputs: SimulationInputs,
    rng: &mut impl Rng,
) -> Result<SimulationState> {
    config.validate()?;
    let recalc = config.interaction.recalculate_clusters_after;

    let population = PopulationGenerator::new(
        config.population.agents,
        config.population.dimension,
        config.population.clusters,
    )
    .generate(inputs.agent_vectors.as_deref(), rng)?;

    let scenario = match inputs.strategy {
        Some(strategy) => TopicScenario::UserSupplied(strategy),
        None => config.topics.scenario.to_scenario(),
    };
    let mut generator = TopicGenerator::new(scenario);
    if let Some(topics) = inputs.topics {
        generator = generator.with_initial_topics(topics);
    }
    let ctx = TopicContext::new(
        &population.agents,
        &population.cluster_centers,
        population.dimension(),
    )
    .with_num_clusters(config.population.clusters)
    .with_recalculate_after(recalc);
    let topics = generator.generate(&ctx, rng)?;

    let engine = InteractionEngine::new(config.interaction.cycles, config.interaction.threshold)?
        .with_recalculate_after(recalc);
    let outcome = engine.run(&population.agents, &topics, rng)?;

    let mut agents = outcome.agents;
    derive_opinions(&mut agents, &topics)?;
    if let Some(opinions) = &inputs.opinion_override {
        apply_opinion_override(&mut agents, &topics, opinions)?;
    }

    let state = SimulationState {
        run_id: Uuid::new_v4(),
        agents,
        cluster_centers: population.cluster_centers,
        topics,
        connections: outcome.connections,
        history: outcome.history,
    };
    info!(
        run_id = %state.run_id,
        agents = state.agents.len(),
        topics = state.topics.len(),
        mean_strength = state.connections.mean_strength(),
        "Simulation complete"
    );
    Ok(state)
}

/// Fill every agent's opinion on every topic with the cosine similarity of
/// its values to the topic vector, clamped to `[-1, 1]`.
pub fn derive_opinions(agents: &mut [Agent], topics: &[Topic]) -> Result<()> {
    for agent in agents.iter_mut() {
        for topic in topics {
            if agent.values.len() != topic.vector.len() {
                return Err(SimError::dimension(agent.values.len(), topic.vector.len()));
            }
            let opinion = cosine_similarity(&agent.values, &topic.vector).clamp(-1.0, 1.0);
            agent.opinions.insert(topic.id, opinion);
        }
    }
    Ok(())
}

/// Replace opinions from an external matrix: one row per agent, one column
/// per topic in topic order. Values are clamped to `[-1, 1]`.
pub fn apply_opinion_override(
    agents: &mut [Agent],
    topics: &[Topic],
    opinions: &[Vec<f64>],
) -> Result<()> {
    if opinions.len() != agents.len() {
        return Err(SimError::InvalidInput(format!(
            "opinion override has {} rows for {} agents",
            opinions.len(),
            agents.len()
        )));
    }
    for (agent, row) in agents.iter().zip(opinions) {
        if row.len() != topics.len() {
            return Err(SimError::InvalidInput(format!(
                "opinion override row for agent {} has {} values for {} topics",
                agent.id,
                row.len(),
                topics.len()
            )));
        }
        if let Some(bad) = row.iter().find(|v| !v.is_finite()) {
            return Err(SimError::InvalidInput(format!(
                "opinion override for agent {} contains {bad}",
                agent.id
            )));
        }
    }

    for (agent, row) in agents.iter_mut().zip(opinions) {
        for (topic, &value) in topics.iter().zip(row) {
            agent.opinions.insert(topic.id, value.clamp(-1.0, 1.0));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioKind;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.population.agents = 12;
        config.population.dimension = 4;
        config.population.clusters = 3;
        config.interaction.cycles = 4;
        config
    }

    #[test]
    fn test_run_simulation_shapes() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let state = run_simulation(&small_config(), SimulationInputs::default(), &mut rng).unwrap();

        assert_eq!(state.agents.len(), 12);
        assert_eq!(state.connections.len(), 12);
        assert_eq!(state.cluster_centers.len(), 3);
        assert_eq!(state.topics.len(), crate::topics::DEFAULT_TOPIC_COUNT);
        assert_eq!(state.history.len(), 4);
        assert!(state
            .agents
            .iter()
            .all(|a| a.opinions.len() == state.topics.len()));
    }

    #[test]
    fn test_run_simulation_is_seed_deterministic() {
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            run_simulation(&small_config(), SimulationInputs::default(), &mut rng).unwrap()
        };
        let a = run(5);
        let b = run(5);
        assert_eq!(a.connections, b.connections);
        assert_eq!(a.agents, b.agents);
        assert_eq!(a.topics, b.topics);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn test_uploaded_vectors_set_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let inputs = SimulationInputs {
            agent_vectors: Some(vec![
                vec![1.0, 0.0, 0.0],
                vec![0.9, 0.1, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.1, 0.9, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.1, 0.9],
            ]),
            topics: Some(vec![vec![1.0, 1.0, 0.0].into(), vec![0.0, 0.0, 1.0].into()]),
            ..SimulationInputs::default()
        };
        let mut config = small_config();
        config.population.clusters = 2;
        let state = run_simulation(&config, inputs, &mut rng).unwrap();

        assert_eq!(state.agents.len(), 6);
        assert_eq!(state.topics.len(), 2);
        assert!(state.agents.iter().all(|a| a.values.len() == 3));
    }

    #[test]
    fn test_scenario_b_marks_target_topics() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut config = small_config();
        config.topics.scenario = ScenarioKind::ClusterBiased;
        let state = run_simulation(&config, SimulationInputs::default(), &mut rng).unwrap();
        assert!(state.topics[0].is_target_topic);
        assert!(state.topics[1].is_target_topic);
    }

    #[test]
    fn test_custom_strategy_is_used() {
        fn axis_topics(
            ctx: &TopicContext<'_>,
            _rng: &mut dyn RngCore,
        ) -> Result<Vec<Vec<f64>>> {
            Ok((0..ctx.dimension)
                .map(|d| (0..ctx.dimension).map(|k| if k == d { 1.0 } else { 0.0 }).collect())
                .collect())
        }

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let inputs = SimulationInputs {
            strategy: Some(Arc::new(axis_topics)),
            ..SimulationInputs::default()
        };
        let state = run_simulation(&small_config(), inputs, &mut rng).unwrap();
        assert_eq!(state.topics.len(), 4);
        assert_eq!(state.topics[2].vector, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config();
        config.interaction.threshold = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(run_simulation(&config, SimulationInputs::default(), &mut rng).is_err());
    }

    #[test]
    fn test_derive_opinions_uses_cosine() {
        let mut agents = vec![Agent::new(0, vec![1.0, 0.0], 0)];
        let topics = vec![Topic::new(0, &[1.0, 0.0]), Topic::new(1, &[-1.0, 1.0])];
        derive_opinions(&mut agents, &topics).unwrap();
        assert!((agents[0].opinion(0).unwrap() - 1.0).abs() < 1e-12);
        assert!((agents[0].opinion(1).unwrap() + 0.5_f64.sqrt()).abs() < 1e-12);

        let wrong = vec![Topic::new(0, &[1.0, 0.0, 0.0])];
        assert!(derive_opinions(&mut agents, &wrong).is_err());
    }

    #[test]
    fn test_opinion_override_validates_and_clamps() {
        let mut agents = vec![Agent::new(0, vec![1.0], 0), Agent::new(1, vec![1.0], 0)];
        let topics = vec![Topic::new(0, &[1.0]), Topic::new(1, &[1.0])];

        apply_opinion_override(&mut agents, &topics, &[vec![0.3, 2.0], vec![-5.0, 0.0]]).unwrap();
        assert_eq!(agents[0].opinion(1), Some(1.0));
        assert_eq!(agents[1].opinion(0), Some(-1.0));

        assert!(apply_opinion_override(&mut agents, &topics, &[vec![0.1, 0.2]]).is_err());
        assert!(apply_opinion_override(&mut agents, &topics, &[vec![0.1], vec![0.2]]).is_err());
        assert!(
            apply_opinion_override(&mut agents, &topics, &[vec![f64::NAN, 0.0], vec![0.0, 0.0]])
                .is_err()
        );
    }
}
