//! Distribution statistics over agent opinions.
//!
//! Canonical metric definitions:
//!
//! - `consensus = 1 / (1 + variance)` with the sample (n - 1) variance
//! - `polarization` = fraction of opinions with `|opinion| > 0.5`

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::model::{Agent, Topic};

/// Jarque-Bera critical value: chi-square, 2 degrees of freedom, alpha = 0.05
pub const JB_CRITICAL_5PCT: f64 = 5.991;

/// Opinions beyond this magnitude count as polarized
const POLARIZATION_CUTOFF: f64 = 0.5;

/// Count, moments and range of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Sample size
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample variance, 0 for a single value
    pub variance: f64,
    /// Square root of `variance`
    pub std_dev: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
}

/// Jarque-Bera normality test result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityTest {
    /// Sample size
    pub n: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample variance
    pub variance: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// Mean of standardized cubes
    pub skewness: f64,
    /// Excess kurtosis
    pub kurtosis: f64,
    /// `(n / 6) * (skewness^2 + kurtosis^2 / 4)`
    pub jarque_bera: f64,
    /// `jarque_bera < JB_CRITICAL_5PCT`
    pub is_normal: bool,
}

/// Opinion distribution on one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicOpinionSummary {
    /// Topic id
    pub topic_id: usize,
    /// Display label
    pub label: String,
    /// Distribution of the agents' opinions
    pub summary: DistributionSummary,
    /// `1 / (1 + variance)`
    pub consensus: f64,
    /// Fraction of opinions with magnitude above 0.5
    pub polarization: f64,
}

/// Mean opinion per topic within one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOpinionMeans {
    /// Cluster label
    pub cluster: usize,
    /// Agents in the cluster
    pub size: usize,
    /// Indexed by topic position; `None` when no member holds an opinion
    pub means: Vec<Option<f64>>,
}

/// Pearson correlation between two topics' opinion series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopicCorrelation {
    /// Lower topic id
    pub topic_a: usize,
    /// Higher topic id
    pub topic_b: usize,
    /// Correlation coefficient in `[-1, 1]`
    pub r: f64,
    /// Agents holding opinions on both topics
    pub samples: usize,
}

/// Pearson correlation coefficient.
///
/// Returns 0 when either series is constant, up to rounding noise.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        return Err(SimError::dimension(x.len(), y.len()));
    }
    let n = x.len();
    if n == 0 {
        return Ok(0.0);
    }

    let mean_x = mean(x);
    let mean_y = mean(y);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if is_flat(var_x, mean_x) || is_flat(var_y, mean_y) || denom == 0.0 {
        return Ok(0.0);
    }
    Ok((cov / denom).clamp(-1.0, 1.0))
}

/// Jarque-Bera normality test against [`JB_CRITICAL_5PCT`].
///
/// Needs at least two values. A constant sample has zero spread; its shape
/// statistics are reported as 0 and it is classified as not normal.
pub fn normality_test(sample: &[f64]) -> Result<NormalityTest> {
    let n = sample.len();
    if n < 2 {
        return Err(SimError::InvalidInput(format!(
            "normality test needs at least 2 values, got {n}"
        )));
    }

    let mean = mean(sample);
    let variance = sample_variance(sample, mean);
    let std_dev = variance.sqrt();

    if is_flat(variance, mean) {
        return Ok(NormalityTest {
            n,
            mean,
            variance: 0.0,
            std_dev: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
            jarque_bera: 0.0,
            is_normal: false,
        });
    }

    let (cubes, fourths) = sample.iter().fold((0.0, 0.0), |(c, f), &x| {
        let z = (x - mean) / std_dev;
        (c + z.powi(3), f + z.powi(4))
    });
    let skewness = cubes / n as f64;
    let kurtosis = fourths / n as f64 - 3.0;
    let jarque_bera = (n as f64 / 6.0) * (skewness.powi(2) + kurtosis.powi(2) / 4.0);

    Ok(NormalityTest {
        n,
        mean,
        variance,
        std_dev,
        skewness,
        kurtosis,
        jarque_bera,
        is_normal: jarque_bera < JB_CRITICAL_5PCT,
    })
}

/// Count, mean, sample variance, standard deviation, min and max.
pub fn describe(sample: &[f64]) -> Result<DistributionSummary> {
    if sample.is_empty() {
        return Err(SimError::InvalidInput("cannot describe an empty sample".to_string()));
    }
    let mean = mean(sample);
    let variance = sample_variance(sample, mean);
    let (min, max) = sample
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    Ok(DistributionSummary {
        count: sample.len(),
        mean,
        variance,
        std_dev: variance.sqrt(),
        min,
        max,
    })
}

/// `1 / (1 + variance)`.
pub fn consensus(summary: &DistributionSummary) -> f64 {
    1.0 / (1.0 + summary.variance)
}

/// Fraction of values with magnitude above 0.5.
pub fn polarization(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let polarized = sample
        .iter()
        .filter(|x| x.abs() > POLARIZATION_CUTOFF)
        .count();
    polarized as f64 / sample.len() as f64
}

/// Opinions held on `topic_id`, in agent order. Agents without one are skipped.
pub fn topic_opinion_series(agents: &[Agent], topic_id: usize) -> Vec<f64> {
    agents.iter().filter_map(|a| a.opinion(topic_id)).collect()
}

/// Per-topic opinion summaries, in topic order.
pub fn summarize_topics(agents: &[Agent], topics: &[Topic]) -> Result<Vec<TopicOpinionSummary>> {
    topics
        .iter()
        .map(|topic| {
            let series = topic_opinion_series(agents, topic.id);
            let summary = describe(&series).map_err(|_| {
                SimError::InvalidInput(format!("no opinions recorded for {}", topic.label()))
            })?;
            Ok(TopicOpinionSummary {
                topic_id: topic.id,
                label: topic.label(),
                consensus: consensus(&summary),
                polarization: polarization(&series),
                summary,
            })
        })
        .collect()
}

/// Mean opinion of each cluster on each topic.
pub fn cluster_opinion_means(
    agents: &[Agent],
    topics: &[Topic],
    num_clusters: usize,
) -> Vec<ClusterOpinionMeans> {
    (0..num_clusters)
        .map(|cluster| {
            let members: Vec<&Agent> = agents.iter().filter(|a| a.cluster == cluster).collect();
            let means = topics
                .iter()
                .map(|topic| {
                    let series: Vec<f64> =
                        members.iter().filter_map(|a| a.opinion(topic.id)).collect();
                    if series.is_empty() {
                        None
                    } else {
                        Some(mean(&series))
                    }
                })
                .collect();
            ClusterOpinionMeans {
                cluster,
                size: members.len(),
                means,
            }
        })
        .collect()
}

/// Pearson correlation for every topic pair, over agents holding both opinions.
pub fn topic_correlations(agents: &[Agent], topics: &[Topic]) -> Result<Vec<TopicCorrelation>> {
    let mut out = Vec::with_capacity(topics.len() * topics.len().saturating_sub(1) / 2);
    for (pos, a) in topics.iter().enumerate() {
        for b in &topics[pos + 1..] {
            let (xs, ys): (Vec<f64>, Vec<f64>) = agents
                .iter()
                .filter_map(|agent| Some((agent.opinion(a.id)?, agent.opinion(b.id)?)))
                .unzip();
            out.push(TopicCorrelation {
                topic_a: a.id.min(b.id),
                topic_b: a.id.max(b.id),
                r: pearson_correlation(&xs, &ys)?,
                samples: xs.len(),
            });
        }
    }
    Ok(out)
}

/// Statistics bound to one run's agents and topics.
#[derive(Debug, Clone, Copy)]
pub struct StatisticalAnalyzer<'a> {
    agents: &'a [Agent],
    topics: &'a [Topic],
}

impl<'a> StatisticalAnalyzer<'a> {
    /// Bind to a run's agents and topics.
    pub fn new(agents: &'a [Agent], topics: &'a [Topic]) -> Self {
        Self { agents, topics }
    }

    /// See [`summarize_topics`].
    pub fn topic_summaries(&self) -> Result<Vec<TopicOpinionSummary>> {
        summarize_topics(self.agents, self.topics)
    }

    /// Normality test of the opinions on `topic_id`.
    pub fn topic_normality(&self, topic_id: usize) -> Result<NormalityTest> {
        normality_test(&topic_opinion_series(self.agents, topic_id))
    }

    /// Normality test of every opinion held, across all topics.
    pub fn overall_normality(&self) -> Result<NormalityTest> {
        let all: Vec<f64> = self
            .agents
            .iter()
            .flat_map(|a| a.opinions.values().copied())
            .collect();
        normality_test(&all)
    }

    /// See [`cluster_opinion_means`]; the cluster count is taken from the agents.
    pub fn cluster_means(&self) -> Vec<ClusterOpinionMeans> {
        let clusters = self.agents.iter().map(|a| a.cluster + 1).max().unwrap_or(0);
        cluster_opinion_means(self.agents, self.topics, clusters)
    }

    /// See [`topic_correlations`].
    pub fn correlations(&self) -> Result<Vec<TopicCorrelation>> {
        topic_correlations(self.agents, self.topics)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Whether a spread is rounding noise around `mean` rather than real variation.
///
/// `spread` is a variance or a sum of squared deviations.
fn is_flat(spread: f64, mean: f64) -> bool {
    spread <= f64::EPSILON * mean.abs().max(1.0)
}

fn sample_variance(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
}
