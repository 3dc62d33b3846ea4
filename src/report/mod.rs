//! Run reports and data exports.
//!
//! [`SimulationReport`] collects the network and opinion metrics of one run
//! into a single serializable record. A [`ReportGenerator`] turns that record
//! into text; [`MarkdownReport`] and [`JsonReport`] ship with the crate.

mod export;

pub use export::{
    edge_list, edge_list_json, matrix_to_csv, matrix_to_json, visualization_json, EdgeRecord,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::CycleStats;
use crate::error::Result;
use crate::network::NetworkMetrics;
use crate::simulation::SimulationState;
use crate::stats::{ClusterOpinionMeans, NormalityTest, TopicCorrelation, TopicOpinionSummary};

/// Correlations listed in the Markdown report
const TOP_CORRELATIONS: usize = 5;

/// Metrics of one run, ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Run identifier
    pub run_id: Uuid,
    /// When the report was assembled
    pub generated_at: DateTime<Utc>,
    /// Number of agents
    pub agents: usize,
    /// Value-vector dimension
    pub dimension: usize,
    /// Agents per cluster
    pub cluster_sizes: Vec<usize>,
    /// Number of topics
    pub topics: usize,
    /// Display threshold used for the edge count below
    pub display_threshold: f64,
    /// Pairs at or above the display threshold
    pub display_edges: usize,
    /// Network metrics of the strictly-positive graph
    pub network: NetworkMetrics,
    /// Opinion distribution per topic
    pub topic_summaries: Vec<TopicOpinionSummary>,
    /// Jarque-Bera test over every opinion; `None` with fewer than two opinions
    pub overall_normality: Option<NormalityTest>,
    /// Mean opinion per cluster and topic
    pub cluster_means: Vec<ClusterOpinionMeans>,
    /// Pairwise topic correlations
    pub correlations: Vec<TopicCorrelation>,
    /// Per-cycle counters
    pub history: Vec<CycleStats>,
}

impl SimulationReport {
    /// Assemble the report for a finished run.
    pub fn from_state(state: &SimulationState, display_threshold: f64) -> Result<Self> {
        let network = state.network()?;
        let stats = state.statistics();

        let mut cluster_sizes = vec![0; state.num_clusters()];
        for agent in &state.agents {
            if let Some(size) = cluster_sizes.get_mut(agent.cluster) {
                *size += 1;
            }
        }

        Ok(Self {
            run_id: state.run_id,
            generated_at: Utc::now(),
            agents: state.agents.len(),
            dimension: state.agents.first().map_or(0, |a| a.values.len()),
            cluster_sizes,
            topics: state.topics.len(),
            display_threshold,
            display_edges: state.connections.edges_above(display_threshold).len(),
            network: network.summary(),
            topic_summaries: stats.topic_summaries()?,
            overall_normality: stats.overall_normality().ok(),
            cluster_means: stats.cluster_means(),
            correlations: stats.correlations()?,
            history: state.history.clone(),
        })
    }

    /// Label of `topic_id` as recorded in the topic summaries.
    pub fn topic_label(&self, topic_id: usize) -> String {
        self.topic_summaries
            .iter()
            .find(|t| t.topic_id == topic_id)
            .map_or_else(|| format!("Topic {topic_id}"), |t| t.label.clone())
    }
}

/// Renders a [`SimulationReport`] as text.
pub trait ReportGenerator {
    /// File extension of the rendered output, without the dot.
    fn extension(&self) -> &'static str;

    /// Render the report.
    fn render(&self, report: &SimulationReport) -> Result<String>;
}

/// Pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReport;

impl ReportGenerator for JsonReport {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, report: &SimulationReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}

/// Human-readable Markdown summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReport {
    /// Include the per-cycle table
    pub include_history: bool,
}

impl ReportGenerator for MarkdownReport {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, report: &SimulationReport) -> Result<String> {
        let mut md = String::new();
        let net = &report.network;

        md.push_str("# Opinion Network Simulation Report\n\n");
        md.push_str(&format!("- Run: `{}`\n", report.run_id));
        md.push_str(&format!(
            "- Generated: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        md.push_str(&format!(
            "- Agents: {} (dimension {}), clusters: {:?}\n",
            report.agents, report.dimension, report.cluster_sizes
        ));
        md.push_str(&format!(
            "- Topics: {}, cycles: {}\n\n",
            report.topics,
            report.history.len()
        ));

        md.push_str("## Network\n\n");
        md.push_str("| Metric | Value |\n|---|---|\n");
        md.push_str(&format!("| Edges (strength > 0) | {} |\n", net.edge_count));
        md.push_str(&format!(
            "| Edges (strength >= {:.2}) | {} |\n",
            report.display_threshold, report.display_edges
        ));
        md.push_str(&format!("| Density | {:.3} |\n", net.density));
        md.push_str(&format!("| Average degree | {:.2} |\n", net.average_degree));
        md.push_str(&format!("| Mean strength | {:.3} |\n", net.mean_strength));
        md.push_str(&format!(
            "| Clustering coefficient | {:.3} |\n",
            net.clustering_coefficient
        ));
        md.push_str(&format!("| Modularity | {:.3} |\n", net.modularity));
        md.push_str(&format!(
            "| Components | {} (largest {}) |\n\n",
            net.component_count, net.largest_component
        ));

        md.push_str("### Most central agents\n\n");
        md.push_str("| Rank | Degree | Betweenness | Closeness |\n|---|---|---|---|\n");
        for rank in 0..net.top_degree.len() {
            let cell = |list: &[crate::network::RankedAgent]| {
                list.get(rank)
                    .map(|r| format!("#{} ({:.3})", r.agent, r.score))
                    .unwrap_or_default()
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                rank + 1,
                cell(net.top_degree.as_slice()),
                cell(net.top_betweenness.as_slice()),
                cell(net.top_closeness.as_slice())
            ));
        }
        md.push('\n');

        md.push_str("## Opinions\n\n");
        md.push_str("| Topic | Mean | Std | Min | Max | Consensus | Polarization |\n");
        md.push_str("|---|---|---|---|---|---|---|\n");
        for t in &report.topic_summaries {
            md.push_str(&format!(
                "| {} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} | {:.2} |\n",
                t.label,
                t.summary.mean,
                t.summary.std_dev,
                t.summary.min,
                t.summary.max,
                t.consensus,
                t.polarization
            ));
        }
        md.push('\n');

        if let Some(jb) = &report.overall_normality {
            md.push_str(&format!(
                "Jarque-Bera over all opinions: {:.2} (skewness {:.3}, kurtosis {:.3}), {}.\n\n",
                jb.jarque_bera,
                jb.skewness,
                jb.kurtosis,
                if jb.is_normal {
                    "consistent with normal"
                } else {
                    "not normal"
                }
            ));
        }

        let mut strongest: Vec<&TopicCorrelation> = report.correlations.iter().collect();
        strongest.sort_by(|a, b| {
            b.r.abs()
                .partial_cmp(&a.r.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if !strongest.is_empty() {
            md.push_str("### Strongest topic correlations\n\n");
            for c in strongest.into_iter().take(TOP_CORRELATIONS) {
                md.push_str(&format!(
                    "- {} / {}: r = {:.3}\n",
                    report.topic_label(c.topic_a),
                    report.topic_label(c.topic_b),
                    c.r
                ));
            }
            md.push('\n');
        }

        md.push_str("## Clusters\n\n");
        for c in &report.cluster_means {
            let means: Vec<String> = c
                .means
                .iter()
                .map(|m| m.map_or_else(|| "-".to_string(), |v| format!("{v:.2}")))
                .collect();
            md.push_str(&format!(
                "- Cluster {} ({} agents): [{}]\n",
                c.cluster,
                c.size,
                means.join(", ")
            ));
        }

        if self.include_history {
            md.push_str("\n## Dynamics\n\n");
            md.push_str("| Cycle | Interactions | Strengthened | Weakened | Mean strength |\n");
            md.push_str("|---|---|---|---|---|\n");
            for s in &report.history {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {:.3} |\n",
                    s.cycle + 1,
                    s.interactions,
                    s.strengthened,
                    s.weakened,
                    s.mean_strength
                ));
            }
        }

        Ok(md)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::simulation::{run_simulation, SimulationInputs};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn report() -> SimulationReport {
        let mut config = Config::default();
        config.population.agents = 10;
        config.interaction.cycles = 3;
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let state = run_simulation(&config, SimulationInputs::default(), &mut rng).unwrap();
        SimulationReport::from_state(&state, 0.5).unwrap()
    }

    #[test]
    fn test_report_contents() {
        let r = report();
        assert_eq!(r.agents, 10);
        assert_eq!(r.dimension, 5);
        assert_eq!(r.cluster_sizes.iter().sum::<usize>(), 10);
        assert_eq!(r.topic_summaries.len(), r.topics);
        assert_eq!(r.correlations.len(), r.topics * (r.topics - 1) / 2);
        assert_eq!(r.history.len(), 3);
        assert!(r.overall_normality.is_some());
    }

    #[test]
    fn test_markdown_sections() {
        let r = report();
        let md = MarkdownReport {
            include_history: true,
        }
        .render(&r)
        .unwrap();
        assert!(md.starts_with("# Opinion Network Simulation Report"));
        assert!(md.contains("## Network"));
        assert!(md.contains("| Modularity |"));
        assert!(md.contains("## Dynamics"));
        assert!(md.contains(&r.run_id.to_string()));

        let short = MarkdownReport::default().render(&r).unwrap();
        assert!(!short.contains("## Dynamics"));
    }

    #[test]
    fn test_markdown_uses_topic_names() {
        let mut config = Config::default();
        config.population.agents = 10;
        config.interaction.cycles = 2;
        let named = |name: &str, vector: Vec<f64>| crate::topics::TopicInput {
            name: Some(name.to_string()),
            vector,
        };
        let inputs = SimulationInputs {
            topics: Some(vec![
                named("economy", vec![1.0, 0.5, 0.0, 0.0, 0.2]),
                named("climate", vec![0.0, 0.3, 1.0, 0.4, 0.0]),
            ]),
            ..SimulationInputs::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(22);
        let state = run_simulation(&config, inputs, &mut rng).unwrap();
        let r = SimulationReport::from_state(&state, 0.5).unwrap();

        assert_eq!(r.topic_label(0), "economy");
        assert_eq!(r.topic_label(7), "Topic 7");
        let md = MarkdownReport::default().render(&r).unwrap();
        assert!(md.contains("- economy / climate: r = "));
        assert!(!md.contains("Topic 0 /"));
    }

    #[test]
    fn test_json_report_parses_back() {
        let r = report();
        let generator = JsonReport;
        assert_eq!(generator.extension(), "json");
        let parsed: SimulationReport = serde_json::from_str(&generator.render(&r).unwrap()).unwrap();
        assert_eq!(parsed.run_id, r.run_id);
        assert_eq!(parsed.network.edge_count, r.network.edge_count);
        assert_eq!(parsed.topic_summaries.len(), r.topic_summaries.len());
    }
}
