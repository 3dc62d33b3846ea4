//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`OPINET_*`)
//! - CLI arguments (applied by the binary on top of the above)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::topics::TopicScenario;

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Seed for every random draw of a run; unseeded runs use the thread RNG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Population generation
    #[serde(default)]
    pub population: PopulationConfig,

    /// Topic generation
    #[serde(default)]
    pub topics: TopicsConfig,

    /// Interaction engine
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Network analysis and export
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| SimError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| SimError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Population settings
        if let Some(agents) = env_parse("OPINET_AGENTS") {
            config.population.agents = agents;
        }
        if let Some(dimension) = env_parse("OPINET_DIMENSION") {
            config.population.dimension = dimension;
        }
        if let Some(clusters) = env_parse("OPINET_CLUSTERS") {
            config.population.clusters = clusters;
        }

        // Interaction settings
        if let Some(cycles) = env_parse("OPINET_CYCLES") {
            config.interaction.cycles = cycles;
        }
        if let Some(threshold) = env_parse("OPINET_THRESHOLD") {
            config.interaction.threshold = threshold;
        }

        if let Some(scenario) = env_parse("OPINET_SCENARIO") {
            config.topics.scenario = scenario;
        }
        if let Some(seed) = env_parse("OPINET_SEED") {
            config.seed = Some(seed);
        }

        config
    }

    /// Merge with another config (other takes precedence where it differs from defaults)
    pub fn merge(self, other: Self) -> Self {
        let population = PopulationConfig::default();
        let interaction = InteractionConfig::default();
        let analysis = AnalysisConfig::default();

        Self {
            seed: other.seed.or(self.seed),
            population: PopulationConfig {
                agents: pick(self.population.agents, other.population.agents, population.agents),
                dimension: pick(
                    self.population.dimension,
                    other.population.dimension,
                    population.dimension,
                ),
                clusters: pick(
                    self.population.clusters,
                    other.population.clusters,
                    population.clusters,
                ),
            },
            topics: TopicsConfig {
                scenario: pick(
                    self.topics.scenario,
                    other.topics.scenario,
                    ScenarioKind::default(),
                ),
            },
            interaction: InteractionConfig {
                cycles: pick(self.interaction.cycles, other.interaction.cycles, interaction.cycles),
                threshold: pick(
                    self.interaction.threshold,
                    other.interaction.threshold,
                    interaction.threshold,
                ),
                recalculate_clusters_after: other
                    .interaction
                    .recalculate_clusters_after
                    .or(self.interaction.recalculate_clusters_after),
            },
            analysis: AnalysisConfig {
                display_threshold: pick(
                    self.analysis.display_threshold,
                    other.analysis.display_threshold,
                    analysis.display_threshold,
                ),
            },
        }
    }

    /// Check every value is usable by the engine.
    pub fn validate(&self) -> Result<()> {
        let p = &self.population;
        if p.agents == 0 {
            return Err(SimError::Config("population.agents must be at least 1".to_string()));
        }
        if p.dimension == 0 {
            return Err(SimError::Config("population.dimension must be at least 1".to_string()));
        }
        if p.clusters == 0 {
            return Err(SimError::Config("population.clusters must be at least 1".to_string()));
        }

        let i = &self.interaction;
        if i.cycles == 0 {
            return Err(SimError::Config("interaction.cycles must be at least 1".to_string()));
        }
        if i.threshold.is_nan() || i.threshold <= 0.0 || i.threshold >= 1.0 {
            return Err(SimError::Config(format!(
                "interaction.threshold must lie in (0, 1), got {}",
                i.threshold
            )));
        }

        let d = self.analysis.display_threshold;
        if !(0.0..=1.0).contains(&d) {
            return Err(SimError::Config(format!(
                "analysis.display_threshold must lie in [0, 1], got {d}"
            )));
        }
        Ok(())
    }

    /// `<config dir>/opinet/config.toml`, when the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("opinet").join("config.toml"))
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SimError::Config(format!("Failed to render config: {e}")))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn pick<T: PartialEq>(base: T, other: T, default: T) -> T {
    if other != default {
        other
    } else {
        base
    }
}

/// Population generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Number of agents (ignored when agent vectors are uploaded)
    pub agents: usize,

    /// Value-vector dimension (ignored when agent vectors are uploaded)
    pub dimension: usize,

    /// Number of clusters
    pub clusters: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            agents: 20,
            dimension: 5,
            clusters: 2,
        }
    }
}

/// Topic scenario selector as written in config files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    /// Standard generation
    #[default]
    #[serde(rename = "A", alias = "a")]
    Standard,

    /// Bias topics 0 and 1 toward one cluster
    #[serde(rename = "B", alias = "b")]
    ClusterBiased,
}

impl ScenarioKind {
    /// Topic scenario this selector stands for
    pub fn to_scenario(self) -> TopicScenario {
        match self {
            Self::Standard => TopicScenario::Default,
            Self::ClusterBiased => TopicScenario::ClusterBiased,
        }
    }
}

impl std::str::FromStr for ScenarioKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" | "a" => Ok(Self::Standard),
            "B" | "b" => Ok(Self::ClusterBiased),
            other => Err(SimError::Config(format!(
                "unknown scenario '{other}', expected A or B"
            ))),
        }
    }
}

/// Topic generation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicsConfig {
    /// Scenario "A" or "B"
    pub scenario: ScenarioKind,
}

/// Interaction engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Number of cycles
    pub cycles: usize,

    /// Opinion-difference threshold gating strengthen vs weaken
    pub threshold: f64,

    /// Accepted for compatibility; the engine does not re-cluster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recalculate_clusters_after: Option<usize>,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            cycles: 10,
            threshold: 0.3,
            recalculate_clusters_after: None,
        }
    }
}

/// Network analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum strength for an edge to appear in visual exports
    pub display_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            display_threshold: 0.5,
        }
    }
}
