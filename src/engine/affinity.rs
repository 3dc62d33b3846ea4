//! Pairwise interaction probability and topic affinity.

use ndarray::Array2;
use rand::Rng;

use crate::error::{Result, SimError};
use crate::model::{Agent, Topic};
use crate::vector::cosine_similarity;

/// Weight of value similarity in the base probability
const VALUE_WEIGHT: f64 = 0.4;

/// Weight of shared topical alignment in the base probability
const TOPIC_WEIGHT: f64 = 0.3;

/// Floor added to every base probability
const BASE_OFFSET: f64 = 0.1;

/// Base probability that agents `a` and `b` connect given `topics`.
///
/// `0.4 * max(0, cos(a, b)) + 0.3 * alignment + 0.1`, clamped to `[0, 1]`,
/// where `alignment` is the mean over topics of the weaker of the two agents'
/// non-negative affinities to that topic.
pub fn connection_strength(a: &Agent, b: &Agent, topics: &[Topic]) -> Result<f64> {
    if topics.is_empty() {
        return Err(SimError::NoTopics);
    }
    if a.values.len() != b.values.len() {
        return Err(SimError::dimension(a.values.len(), b.values.len()));
    }

    let value_similarity = cosine_similarity(&a.values, &b.values).max(0.0);
    let mut alignment = 0.0;
    for topic in topics {
        if topic.vector.len() != a.values.len() {
            return Err(SimError::dimension(a.values.len(), topic.vector.len()));
        }
        let aff_a = cosine_similarity(&a.values, &topic.vector).max(0.0);
        let aff_b = cosine_similarity(&b.values, &topic.vector).max(0.0);
        alignment += aff_a.min(aff_b);
    }
    alignment /= topics.len() as f64;

    Ok(combine(value_similarity, alignment))
}

fn combine(value_similarity: f64, alignment: f64) -> f64 {
    (VALUE_WEIGHT * value_similarity + TOPIC_WEIGHT * alignment + BASE_OFFSET).clamp(0.0, 1.0)
}

/// Cached cosine similarities used inside the interaction loop.
///
/// Agent values and topic vectors never change during a run, so every
/// agent/agent and agent/topic cosine is computed once up front.
#[derive(Debug, Clone)]
pub(crate) struct AffinityTable {
    /// `cos(values_i, values_j)`
    values: Array2<f64>,
    /// `cos(values_i, topic_t)`
    topics: Array2<f64>,
}

impl AffinityTable {
    /// Callers validate that `agents` and `topics` are non-empty and share a dimension.
    pub(crate) fn new(agents: &[Agent], topics: &[Topic]) -> Self {
        let n = agents.len();
        let mut values = Array2::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let sim = cosine_similarity(&agents[i].values, &agents[j].values);
                values[[i, j]] = sim;
                values[[j, i]] = sim;
            }
        }

        let topics = Array2::from_shape_fn((n, topics.len()), |(i, t)| {
            cosine_similarity(&agents[i].values, &topics[t].vector)
        });

        Self { values, topics }
    }

    pub(crate) fn topic_count(&self) -> usize {
        self.topics.ncols()
    }

    /// Raw cosine between agent `i` and topic `t`.
    pub(crate) fn opinion_basis(&self, i: usize, t: usize) -> f64 {
        self.topics[[i, t]]
    }

    fn affinity(&self, i: usize, t: usize) -> f64 {
        self.topics[[i, t]].max(0.0)
    }

    /// Same value as [`connection_strength`] for agents `i` and `j`.
    pub(crate) fn base_probability(&self, i: usize, j: usize) -> f64 {
        let value_similarity = self.values[[i, j]].max(0.0);
        let topic_count = self.topic_count();
        let alignment = (0..topic_count)
            .map(|t| self.affinity(i, t).min(self.affinity(j, t)))
            .sum::<f64>()
            / topic_count as f64;
        combine(value_similarity, alignment)
    }

    /// Pick a topic weighted by the pair's mean affinity.
    ///
    /// `None` when every weight is zero; no randomness is consumed then.
    pub(crate) fn select_topic(&self, i: usize, j: usize, rng: &mut impl Rng) -> Option<usize> {
        let weights: Vec<f64> = (0..self.topic_count())
            .map(|t| (self.affinity(i, t) + self.affinity(j, t)) / 2.0)
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return None;
        }

        let mut remaining = rng.gen::<f64>() * total;
        for (t, w) in weights.iter().enumerate() {
            if remaining < *w {
                return Some(t);
            }
            remaining -= w;
        }
        // Rounding left a sliver past the last bucket
        weights.iter().rposition(|w| *w > 0.0)
    }
}
