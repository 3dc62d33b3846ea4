//! Stochastic pairwise-interaction engine.
//!
//! Each cycle draws `2 * N` random agent pairs. A pair interacts with a
//! probability that grows with its value/topic alignment and with its
//! current connection strength, so strong ties attract further interaction.
//! An interaction picks a topic weighted by the pair's affinity, forms noisy
//! opinions for both agents, and then:
//!
//! ```text
//!   |opinion_i - opinion_j| <  threshold  ──>  strength += U(0.15, 0.25)
//!   |opinion_i - opinion_j| >= threshold  ──>  strength -= U(0.08, 0.13)
//! ```
//!
//! Strengths stay clamped to `[0, 1]` and the matrix stays symmetric after
//! every single update. Cycles run strictly in order; cycle `k + 1` sees every
//! write made during cycle `k`.

mod affinity;

pub use affinity::connection_strength;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SimError};
use crate::model::{Agent, ConnectionMatrix, Topic};

use affinity::AffinityTable;

/// Interaction attempts per agent per cycle
pub const INTERACTIONS_PER_AGENT: usize = 2;

/// Initial strength range for every pair
const INITIAL_STRENGTH: (f64, f64) = (0.1, 0.3);

/// Weight of the base probability in the final interaction probability
const FEEDBACK_BASE_WEIGHT: f64 = 0.3;

/// Weight of the current connection strength in the final probability
const FEEDBACK_STRENGTH_WEIGHT: f64 = 0.5;

/// Constant term of the final probability
const FEEDBACK_OFFSET: f64 = 0.2;

/// Upper bound on the final interaction probability
const MAX_INTERACTION_PROBABILITY: f64 = 0.8;

/// Uniform noise added to each agent's opinion during an interaction
const OPINION_NOISE: f64 = 0.1;

/// Strengthening step range for compatible opinions
const STRENGTHEN_STEP: (f64, f64) = (0.15, 0.25);

/// Weakening step range for diverging opinions
const WEAKEN_STEP: (f64, f64) = (0.08, 0.13);

/// Counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    /// Zero-based cycle index
    pub cycle: usize,
    /// Pair draws this cycle
    pub attempted: usize,
    /// Draws discarded because both indices matched
    pub self_pairs: usize,
    /// Draws that passed the probability check
    pub interactions: usize,
    /// Interactions that strengthened the tie
    pub strengthened: usize,
    /// Interactions that weakened the tie
    pub weakened: usize,
    /// Interactions whose topic weights were all zero, discussed on topic 0
    pub fallback_topics: usize,
    /// Mean pair strength after the cycle
    pub mean_strength: f64,
}

/// Result of a full interaction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionOutcome {
    /// Final connection matrix
    pub connections: ConnectionMatrix,
    /// Agents, echoed back unchanged
    pub agents: Vec<Agent>,
    /// Per-cycle counters, in cycle order
    pub history: Vec<CycleStats>,
}

/// Runs the interaction dynamics.
#[derive(Debug, Clone, Copy)]
pub struct InteractionEngine {
    cycles: usize,
    threshold: f64,
    recalculate_clusters_after: Option<usize>,
}

impl InteractionEngine {
    /// Engine running `cycles` cycles with opinion-difference `threshold`.
    ///
    /// `cycles` must be at least 1 and `threshold` strictly inside `(0, 1)`.
    pub fn new(cycles: usize, threshold: f64) -> Result<Self> {
        if cycles == 0 {
            return Err(SimError::InvalidInput(
                "cycles must be at least 1".to_string(),
            ));
        }
        if threshold.is_nan() || threshold <= 0.0 || threshold >= 1.0 {
            return Err(SimError::InvalidInput(format!(
                "threshold {threshold} not in (0, 1)"
            )));
        }
        Ok(Self {
            cycles,
            threshold,
            recalculate_clusters_after: None,
        })
    }

    /// Record a re-clustering period. Accepted for compatibility; the dynamics
    /// never re-cluster agents.
    pub fn with_recalculate_after(mut self, cycles: Option<usize>) -> Self {
        self.recalculate_clusters_after = cycles;
        self
    }

    /// Number of cycles per run.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Opinion-difference threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Run every cycle from a fresh random matrix.
    pub fn run(
        &self,
        agents: &[Agent],
        topics: &[Topic],
        rng: &mut impl Rng,
    ) -> Result<InteractionOutcome> {
        validate(agents, topics)?;

        if let Some(period) = self.recalculate_clusters_after {
            warn!(period, "recalculate_clusters_after is accepted but has no effect");
        }

        let table = AffinityTable::new(agents, topics);
        let mut connections = initialize_connections(agents.len(), rng);
        let mut history = Vec::with_capacity(self.cycles);

        for cycle in 0..self.cycles {
            let stats = self.cycle_with(&table, &mut connections, cycle, rng);
            debug!(
                cycle,
                attempted = stats.attempted,
                interactions = stats.interactions,
                strengthened = stats.strengthened,
                weakened = stats.weakened,
                mean_strength = stats.mean_strength,
                "Cycle complete"
            );
            history.push(stats);
        }

        let fallbacks: usize = history.iter().map(|s| s.fallback_topics).sum();
        if fallbacks > 0 {
            warn!(
                fallbacks,
                "Interactions with all-zero topic weights were discussed on topic 0"
            );
        }

        info!(
            agents = agents.len(),
            topics = topics.len(),
            cycles = self.cycles,
            mean_strength = connections.mean_strength(),
            "Interaction run finished"
        );

        Ok(InteractionOutcome {
            connections,
            agents: agents.to_vec(),
            history,
        })
    }

    /// Run a single cycle against an existing matrix.
    ///
    /// Useful for observing the matrix between cycles. `connections` must
    /// cover exactly `agents.len()` agents.
    pub fn run_cycle(
        &self,
        connections: &mut ConnectionMatrix,
        agents: &[Agent],
        topics: &[Topic],
        cycle: usize,
        rng: &mut impl Rng,
    ) -> Result<CycleStats> {
        validate(agents, topics)?;
        if connections.len() != agents.len() {
            return Err(SimError::InvalidInput(format!(
                "connection matrix covers {} agents, population has {}",
                connections.len(),
                agents.len()
            )));
        }
        let table = AffinityTable::new(agents, topics);
        Ok(self.cycle_with(&table, connections, cycle, rng))
    }

    fn cycle_with(
        &self,
        table: &AffinityTable,
        connections: &mut ConnectionMatrix,
        cycle: usize,
        rng: &mut impl Rng,
    ) -> CycleStats {
        let n = connections.len();
        let mut stats = CycleStats {
            cycle,
            attempted: n * INTERACTIONS_PER_AGENT,
            ..CycleStats::default()
        };

        for _ in 0..stats.attempted {
            let i = rng.gen_range(0..n);
            let j = rng.gen_range(0..n);
            if i == j {
                stats.self_pairs += 1;
                continue;
            }

            let probability =
                interaction_probability(table.base_probability(i, j), connections[(i, j)]);
            if rng.gen::<f64>() >= probability {
                continue;
            }
            stats.interactions += 1;

            let topic = table.select_topic(i, j, rng).unwrap_or_else(|| {
                stats.fallback_topics += 1;
                0
            });
            let opinion_i = noisy_opinion(table.opinion_basis(i, topic), rng);
            let opinion_j = noisy_opinion(table.opinion_basis(j, topic), rng);

            if apply_opinions(connections, (i, j), opinion_i - opinion_j, self.threshold, rng) {
                stats.strengthened += 1;
            } else {
                stats.weakened += 1;
            }
        }

        stats.mean_strength = connections.mean_strength();
        stats
    }
}

/// Fresh matrix with every pair drawn from `U(0.1, 0.3)`; the diagonal stays 0.
pub fn initialize_connections(n: usize, rng: &mut impl Rng) -> ConnectionMatrix {
    let mut connections = ConnectionMatrix::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            connections.set(i, j, rng.gen_range(INITIAL_STRENGTH.0..INITIAL_STRENGTH.1));
        }
    }
    connections
}

/// Convenience wrapper: build an engine and run it.
pub fn run_interactions(
    agents: &[Agent],
    topics: &[Topic],
    cycles: usize,
    threshold: f64,
    rng: &mut impl Rng,
) -> Result<InteractionOutcome> {
    InteractionEngine::new(cycles, threshold)?.run(agents, topics, rng)
}

/// Final interaction probability from the pair's base probability and its
/// current strength, capped at [`MAX_INTERACTION_PROBABILITY`].
fn interaction_probability(base: f64, current: f64) -> f64 {
    (base * FEEDBACK_BASE_WEIGHT + current * FEEDBACK_STRENGTH_WEIGHT + FEEDBACK_OFFSET)
        .min(MAX_INTERACTION_PROBABILITY)
}

/// Strengthen or weaken the pair depending on its opinion gap.
/// Returns `true` when the tie was strengthened.
fn apply_opinions(
    connections: &mut ConnectionMatrix,
    (i, j): (usize, usize),
    gap: f64,
    threshold: f64,
    rng: &mut impl Rng,
) -> bool {
    if gap.abs() < threshold {
        connections.adjust(i, j, rng.gen_range(STRENGTHEN_STEP.0..STRENGTHEN_STEP.1));
        true
    } else {
        connections.adjust(i, j, -rng.gen_range(WEAKEN_STEP.0..WEAKEN_STEP.1));
        false
    }
}

fn noisy_opinion(basis: f64, rng: &mut impl Rng) -> f64 {
    (basis + rng.gen_range(-OPINION_NOISE..=OPINION_NOISE)).clamp(-1.0, 1.0)
}

fn validate(agents: &[Agent], topics: &[Topic]) -> Result<()> {
    let first = agents.first().ok_or(SimError::EmptyPopulation)?;
    if topics.is_empty() {
        return Err(SimError::NoTopics);
    }

    let dimension = first.values.len();
    if dimension == 0 {
        return Err(SimError::InvalidInput("agent value vectors are empty".to_string()));
    }
    for (index, agent) in agents.iter().enumerate() {
        if agent.id != index {
            return Err(SimError::InvalidInput(format!(
                "agent at position {index} has id {}",
                agent.id
            )));
        }
        if agent.values.len() != dimension {
            return Err(SimError::dimension(dimension, agent.values.len()));
        }
    }
    for topic in topics {
        if topic.vector.len() != dimension {
            return Err(SimError::dimension(dimension, topic.vector.len()));
        }
    }
    Ok(())
}
