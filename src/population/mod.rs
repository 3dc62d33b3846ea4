//! Agent population generation.
//!
//! Two paths produce a [`Population`]:
//!
//! - **Generated**: one center per cluster spread along the diagonal of the
//!   value space, agents placed round-robin around those centers with noise
//!   that grows with the cluster index, then re-labelled by nearest center.
//! - **Uploaded**: agent vectors supplied by the caller are clustered with a
//!   short k-means style refinement seeded from evenly spaced agents.
//!
//! ```text
//!  uploaded vectors ──> seed centers ──> 5 × (assign, re-center) ──> label
//!                                                                      │
//!  similarity < 0.7 ──> fall back to index % k  <──────────────────────┘
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SimError};
use crate::model::{Agent, ClusterCenter};
use crate::vector::{cosine_similarity, ensure_dimension, jitter, normalize, normalize_in_place};

/// Random spread applied to each center component before normalization
const CENTER_VARIATION: f64 = 0.75;

/// Agent noise amplitude for cluster 0
const BASE_AGENT_NOISE: f64 = 0.4;

/// Extra agent noise reached by the last cluster
const AGENT_NOISE_SLOPE: f64 = 0.3;

/// Number of k-means refinement rounds for uploaded vectors
const REFINEMENT_ITERATIONS: usize = 5;

/// Below this similarity an uploaded agent keeps its round-robin label
const MIN_ASSIGNMENT_SIMILARITY: f64 = 0.7;

/// Agents plus the cluster centers they were labelled against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    /// Generated agents, ids `0..N`
    pub agents: Vec<Agent>,
    /// One unit-normalized center per cluster
    pub cluster_centers: Vec<ClusterCenter>,
}

impl Population {
    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True when the population has no agents.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Dimension of the value vectors (0 for an empty population).
    pub fn dimension(&self) -> usize {
        self.agents.first().map_or(0, |a| a.values.len())
    }

    /// Agent count per cluster label.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.cluster_centers.len()];
        for agent in &self.agents {
            if let Some(size) = sizes.get_mut(agent.cluster) {
                *size += 1;
            }
        }
        sizes
    }
}

/// Builds agent populations.
#[derive(Debug, Clone, Copy)]
pub struct PopulationGenerator {
    num_agents: usize,
    dimension: usize,
    num_clusters: usize,
}

impl PopulationGenerator {
    /// Create a generator for `num_agents` agents in `dimension` dimensions.
    ///
    /// Both counts are ignored when uploaded vectors are supplied.
    pub fn new(num_agents: usize, dimension: usize, num_clusters: usize) -> Self {
        Self {
            num_agents,
            dimension,
            num_clusters,
        }
    }

    /// Generate a population, from `initial_vectors` when supplied.
    pub fn generate(
        &self,
        initial_vectors: Option<&[Vec<f64>]>,
        rng: &mut impl Rng,
    ) -> Result<Population> {
        match initial_vectors {
            Some(vectors) => self.from_vectors(vectors),
            None => self.generate_random(rng),
        }
    }

    /// Generated case: synthetic centers and noisy agents around them.
    pub fn generate_random(&self, rng: &mut impl Rng) -> Result<Population> {
        if self.num_agents == 0 {
            return Err(SimError::EmptyPopulation);
        }
        if self.dimension == 0 {
            return Err(SimError::InvalidInput(
                "vector dimension must be at least 1".to_string(),
            ));
        }
        self.check_clusters(self.num_agents)?;

        let k = self.num_clusters;
        let cluster_centers: Vec<ClusterCenter> = (0..k)
            .map(|i| {
                let base = if k > 1 {
                    (i as f64 / (k - 1) as f64) * 2.0 - 1.0
                } else {
                    0.0
                };
                let raw: Vec<f64> = (0..self.dimension)
                    .map(|_| base + rng.gen_range(-CENTER_VARIATION..=CENTER_VARIATION))
                    .collect();
                normalize(&raw)
            })
            .collect();

        let agents: Vec<Agent> = (0..self.num_agents)
            .map(|id| {
                let seeded_cluster = id % k;
                let amplitude = BASE_AGENT_NOISE + (seeded_cluster as f64 / k as f64) * AGENT_NOISE_SLOPE;
                let values = normalize(&jitter(&cluster_centers[seeded_cluster], amplitude, rng));
                let (cluster, _) = nearest_center(&values, &cluster_centers);
                Agent::new(id, values, cluster)
            })
            .collect();

        info!(
            agents = agents.len(),
            clusters = k,
            dimension = self.dimension,
            "Generated agent population"
        );

        Ok(Population {
            agents,
            cluster_centers,
        })
    }

    /// Uploaded case: cluster caller-supplied vectors.
    ///
    /// Agent count and dimension come from `vectors`; the configured values
    /// are ignored.
    pub fn from_vectors(&self, vectors: &[Vec<f64>]) -> Result<Population> {
        let first = vectors.first().ok_or_else(|| {
            SimError::InvalidInput("uploaded agent vectors are empty".to_string())
        })?;
        let dimension = first.len();
        for v in vectors {
            ensure_dimension(v, dimension)?;
        }

        let n = vectors.len();
        self.check_clusters(n)?;
        let k = self.num_clusters;

        let normalized: Vec<Vec<f64>> = vectors.iter().map(|v| normalize(v)).collect();

        // Seed from evenly spaced agents
        let mut centers: Vec<ClusterCenter> = (0..k)
            .map(|i| normalized[(i * n / k).min(n - 1)].clone())
            .collect();

        for _ in 0..REFINEMENT_ITERATIONS {
            let assignments: Vec<usize> = normalized
                .iter()
                .map(|v| nearest_center(v, &centers).0)
                .collect();

            for (c, center) in centers.iter_mut().enumerate() {
                let mut sum = vec![0.0; dimension];
                let mut count = 0usize;
                for (v, _) in normalized
                    .iter()
                    .zip(&assignments)
                    .filter(|&(_, &assigned)| assigned == c)
                {
                    for (s, x) in sum.iter_mut().zip(v) {
                        *s += x;
                    }
                    count += 1;
                }
                // Empty clusters keep their previous center
                if count == 0 {
                    continue;
                }
                for s in &mut sum {
                    *s /= count as f64;
                }
                normalize_in_place(&mut sum);
                *center = sum;
            }
        }

        let agents: Vec<Agent> = normalized
            .into_iter()
            .enumerate()
            .map(|(id, values)| {
                let (best, similarity) = nearest_center(&values, &centers);
                let cluster = if similarity < MIN_ASSIGNMENT_SIMILARITY {
                    id % k
                } else {
                    best
                };
                Agent::new(id, values, cluster)
            })
            .collect();

        info!(
            agents = n,
            clusters = k,
            dimension,
            "Clustered uploaded agent vectors"
        );

        Ok(Population {
            agents,
            cluster_centers: centers,
        })
    }

    fn check_clusters(&self, n: usize) -> Result<()> {
        if self.num_clusters == 0 {
            return Err(SimError::InvalidInput(
                "number of clusters must be at least 1".to_string(),
            ));
        }
        if self.num_clusters > n {
            warn!(
                clusters = self.num_clusters,
                agents = n,
                "More clusters than agents; some clusters will stay empty"
            );
        }
        Ok(())
    }
}

/// Convenience wrapper over [`PopulationGenerator::generate`].
pub fn generate_agent_population(
    num_agents: usize,
    dimension: usize,
    num_clusters: usize,
    initial_vectors: Option<&[Vec<f64>]>,
    rng: &mut impl Rng,
) -> Result<Population> {
    PopulationGenerator::new(num_agents, dimension, num_clusters).generate(initial_vectors, rng)
}

/// Index and similarity of the center most similar to `v`.
///
/// Ties resolve to the lowest index. With no centers, returns `(0, -inf)`.
pub fn nearest_center(v: &[f64], centers: &[ClusterCenter]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, center) in centers.iter().enumerate() {
        let similarity = cosine_similarity(v, center);
        if similarity > best.1 {
            best = (i, similarity);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::magnitude;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn uploaded() -> Vec<Vec<f64>> {
        vec![
            vec![1.0, 0.1, 0.0],
            vec![0.9, 0.2, 0.1],
            vec![1.0, 0.0, 0.2],
            vec![-1.0, 0.1, 0.0],
            vec![-0.9, -0.1, 0.1],
            vec![-1.0, 0.0, -0.2],
        ]
    }

    #[test]
    fn test_generated_population_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pop = PopulationGenerator::new(30, 4, 3)
            .generate(None, &mut rng)
            .unwrap();

        assert_eq!(pop.len(), 30);
        assert_eq!(pop.cluster_centers.len(), 3);
        assert_eq!(pop.dimension(), 4);
        for (i, agent) in pop.agents.iter().enumerate() {
            assert_eq!(agent.id, i);
            assert!(agent.cluster < 3);
            assert!((magnitude(&agent.values) - 1.0).abs() < 1e-9);
        }
        for center in &pop.cluster_centers {
            assert!((magnitude(center) - 1.0).abs() < 1e-9);
        }
        assert_eq!(pop.cluster_sizes().iter().sum::<usize>(), 30);
    }

    #[test]
    fn test_generated_labels_are_nearest_center() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let pop = PopulationGenerator::new(40, 5, 4)
            .generate_random(&mut rng)
            .unwrap();
        for agent in &pop.agents {
            assert_eq!(agent.cluster, nearest_center(&agent.values, &pop.cluster_centers).0);
        }
    }

    #[test]
    fn test_single_cluster_has_finite_center() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pop = PopulationGenerator::new(5, 3, 1).generate(None, &mut rng).unwrap();
        assert!(pop.cluster_centers[0].iter().all(|x| x.is_finite()));
        assert!(pop.agents.iter().all(|a| a.cluster == 0));
    }

    #[test]
    fn test_uploaded_vectors_six_by_three() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let vectors = uploaded();
        let pop = generate_agent_population(100, 9, 2, Some(vectors.as_slice()), &mut rng).unwrap();

        assert_eq!(pop.len(), 6);
        assert_eq!(pop.dimension(), 3);
        assert_eq!(pop.cluster_centers.len(), 2);
        assert!(pop.agents.iter().all(|a| a.cluster < 2));
        // Two well separated groups end up with different labels
        assert_ne!(pop.agents[0].cluster, pop.agents[3].cluster);
        assert_eq!(pop.agents[0].cluster, pop.agents[1].cluster);
    }

    #[test]
    fn test_uploaded_low_similarity_falls_back_to_round_robin() {
        // Orthogonal vectors can never reach 0.7 similarity with a shared center
        let vectors = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ];
        let pop = PopulationGenerator::new(0, 0, 1).from_vectors(&vectors).unwrap();
        assert!(pop.agents.iter().all(|a| a.cluster == 0));

        let pop = PopulationGenerator::new(0, 0, 2).from_vectors(&vectors).unwrap();
        for agent in &pop.agents {
            let (_, sim) = nearest_center(&agent.values, &pop.cluster_centers);
            if sim < 0.7 {
                assert_eq!(agent.cluster, agent.id % 2);
            }
        }
    }

    #[test]
    fn test_uploaded_errors() {
        let gen = PopulationGenerator::new(10, 3, 2);
        assert!(matches!(gen.from_vectors(&[]), Err(SimError::InvalidInput(_))));
        assert!(matches!(
            gen.from_vectors(&[vec![1.0, 0.0], vec![1.0]]),
            Err(SimError::DimensionMismatch { expected: 2, actual: 1 })
        ));
        let zero_clusters = PopulationGenerator::new(10, 3, 0);
        assert!(zero_clusters.from_vectors(&uploaded()).is_err());
    }

    #[test]
    fn test_generated_errors() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(matches!(
            PopulationGenerator::new(0, 3, 2).generate(None, &mut rng),
            Err(SimError::EmptyPopulation)
        ));
        assert!(PopulationGenerator::new(5, 0, 2).generate(None, &mut rng).is_err());
    }

    #[test]
    fn test_more_clusters_than_agents_is_not_fatal() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let pop = PopulationGenerator::new(3, 3, 5).generate(None, &mut rng).unwrap();
        assert_eq!(pop.cluster_centers.len(), 5);
        assert_eq!(pop.len(), 3);
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let gen = PopulationGenerator::new(12, 4, 3);
        let a = gen.generate(None, &mut ChaCha8Rng::seed_from_u64(99)).unwrap();
        let b = gen.generate(None, &mut ChaCha8Rng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }
}
