//! # Opinet - Opinion Dynamics on Social Networks
//!
//! Stochastic simulation of agents who hold value vectors, form opinions on
//! topics, and evolve pairwise connection strengths through repeated
//! interactions.
//!
//! ## Features
//!
//! - **Population generation**: clustered synthetic agents, or k-means style clustering of uploaded vectors
//! - **Topic generation**: synthetic, uploaded, cluster-biased, or produced by a custom strategy
//! - **Interaction engine**: homophily-reinforcing pairwise dynamics on a symmetric strength matrix
//! - **Network analysis**: degree/betweenness/closeness centrality, clustering, modularity, components
//! - **Opinion statistics**: distribution summaries, Jarque-Bera normality, Pearson correlations
//! - **Reports**: Markdown and JSON summaries, CSV/JSON matrix exports, Graphviz DOT
//!
//! ## Pipeline
//!
//! ```text
//! PopulationGenerator ──> agents + cluster centers
//!         │
//!         v
//! TopicGenerator ───────> topics
//!         │
//!         v
//! InteractionEngine ────> connection matrix (N x N, symmetric, [0, 1])
//!         │
//!         ├──> NetworkAnalyzer      (strength > 0 graph)
//!         └──> StatisticalAnalyzer  (agent opinions)
//! ```
//!
//! ### Interaction rule
//!
//! | Opinion difference | Effect on the pair's strength |
//! |--------------------|-------------------------------|
//! | `< threshold`      | `+ U(0.15, 0.25)`             |
//! | `>= threshold`     | `- U(0.08, 0.13)`             |
//!
//! ## Quick Start
//!
//! ```rust
//! use opinet::{run_simulation, Config, SimulationInputs};
//! use rand::SeedableRng;
//!
//! let mut config = Config::default();
//! config.population.agents = 12;
//! config.interaction.cycles = 3;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let state = run_simulation(&config, SimulationInputs::default(), &mut rng).unwrap();
//!
//! let metrics = state.network().unwrap().summary();
//! assert_eq!(metrics.node_count, 12);
//! assert!(state.connections.is_symmetric());
//! ```
//!
//! ### Step by step
//!
//! ```rust
//! use opinet::{generate_agent_population, InteractionEngine, TopicContext, TopicGenerator};
//! use opinet::network::betweenness_centrality;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let population = generate_agent_population(20, 5, 2, None, &mut rng).unwrap();
//!
//! let ctx = TopicContext::new(&population.agents, &population.cluster_centers, 5);
//! let topics = TopicGenerator::default().generate(&ctx, &mut rng).unwrap();
//!
//! let engine = InteractionEngine::new(10, 0.3).unwrap();
//! let outcome = engine.run(&population.agents, &topics, &mut rng).unwrap();
//!
//! let bc = betweenness_centrality(&outcome.connections);
//! assert_eq!(bc.len(), 20);
//! ```
//!
//! ## Modules
//!
//! - [`vector`]: Vector primitives (normalize, cosine similarity, random vectors)
//! - [`model`]: Agents, topics and the connection matrix
//! - [`population`]: Population generation and clustering
//! - [`topics`]: Topic generation and pluggable strategies
//! - [`engine`]: Interaction dynamics
//! - [`network`]: Graph metrics and visualization data
//! - [`stats`]: Opinion statistics
//! - [`simulation`]: End-to-end pipeline and run state
//! - [`report`]: Report rendering and exports
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod network;
pub mod population;
pub mod report;
pub mod simulation;
pub mod stats;
pub mod topics;
pub mod vector;

// Re-exports for convenience
pub use config::{Config, ScenarioKind};
pub use engine::{run_interactions, CycleStats, InteractionEngine, InteractionOutcome};
pub use error::{Result, SimError};
pub use model::{Agent, ClusterCenter, ConnectionMatrix, Topic};
pub use network::{NetworkAnalyzer, NetworkMetrics, VisualizationData};
pub use population::{generate_agent_population, Population, PopulationGenerator};
pub use report::{JsonReport, MarkdownReport, ReportGenerator, SimulationReport};
pub use simulation::{run_simulation, SimulationInputs, SimulationState};
pub use stats::{NormalityTest, StatisticalAnalyzer};
pub use topics::{
    generate_topics, TopicContext, TopicGenerationStrategy, TopicGenerator, TopicInput,
    TopicScenario,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
