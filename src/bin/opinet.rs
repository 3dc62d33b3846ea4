//! Opinet CLI binary.
//!
//! Opinion-dynamics simulation on social networks.
//!
//! # Commands
//!
//! - `run` - Run one simulation and write its report and exports
//! - `config` - Print the effective configuration as TOML

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use opinet::{
    config::ScenarioKind,
    network::{prepare_visualization_data, to_dot},
    report::{matrix_to_csv, visualization_json},
    run_simulation, Config, JsonReport, MarkdownReport, ReportGenerator, SimulationInputs,
    SimulationReport, TopicInput, VERSION,
};
use rand::{rngs::StdRng, thread_rng, RngCore, SeedableRng};
use serde::Deserialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "opinet")]
#[command(version = VERSION)]
#[command(about = "Opinion dynamics simulation on social networks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run {
        /// Config file (default: user config dir, if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of agents
        #[arg(short = 'n', long)]
        agents: Option<usize>,

        /// Value-vector dimension
        #[arg(short, long)]
        dimension: Option<usize>,

        /// Number of clusters
        #[arg(short = 'k', long)]
        clusters: Option<usize>,

        /// Number of interaction cycles
        #[arg(long)]
        cycles: Option<usize>,

        /// Opinion-difference threshold in (0, 1)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Topic scenario (A or B)
        #[arg(short, long)]
        scenario: Option<ScenarioKind>,

        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// JSON file with agent value vectors (array of arrays)
        #[arg(long)]
        agent_vectors: Option<PathBuf>,

        /// JSON file with topic vectors (arrays, or objects with name and vector)
        #[arg(long)]
        topics: Option<PathBuf>,

        /// JSON file with an opinion matrix (rows = agents, columns = topics)
        #[arg(long)]
        opinions: Option<PathBuf>,

        /// Minimum strength for exported graph edges
        #[arg(long)]
        display_threshold: Option<f64>,

        /// Directory for report.json, report.md, connections.csv, graph.json and graph.dot
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include the per-cycle table in the Markdown report
        #[arg(long)]
        history: bool,

        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the effective configuration
    Config {
        /// Config file to load
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// A topic file entry: a bare vector or a named one.
#[derive(Deserialize)]
#[serde(untagged)]
enum TopicFileEntry {
    Plain(Vec<f64>),
    Named(TopicInput),
}

impl From<TopicFileEntry> for TopicInput {
    fn from(entry: TopicFileEntry) -> Self {
        match entry {
            TopicFileEntry::Plain(vector) => vector.into(),
            TopicFileEntry::Named(input) => input,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            agents,
            dimension,
            clusters,
            cycles,
            threshold,
            scenario,
            seed,
            agent_vectors,
            topics,
            opinions,
            display_threshold,
            output,
            history,
            verbose,
        } => {
            // Initialize logging
            let log_level = if verbose { "debug" } else { "info" };
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
                )
                .with_writer(std::io::stderr)
                .init();

            let mut cfg = load_config(config.as_deref())?;
            if let Some(v) = agents {
                cfg.population.agents = v;
            }
            if let Some(v) = dimension {
                cfg.population.dimension = v;
            }
            if let Some(v) = clusters {
                cfg.population.clusters = v;
            }
            if let Some(v) = cycles {
                cfg.interaction.cycles = v;
            }
            if let Some(v) = threshold {
                cfg.interaction.threshold = v;
            }
            if let Some(v) = scenario {
                cfg.topics.scenario = v;
            }
            if let Some(v) = display_threshold {
                cfg.analysis.display_threshold = v;
            }
            if seed.is_some() {
                cfg.seed = seed;
            }

            let inputs = SimulationInputs {
                agent_vectors: agent_vectors.as_deref().map(read_json).transpose()?,
                topics: topics
                    .as_deref()
                    .map(read_json::<Vec<TopicFileEntry>>)
                    .transpose()?
                    .map(|entries| entries.into_iter().map(TopicInput::from).collect()),
                opinion_override: opinions.as_deref().map(read_json).transpose()?,
                strategy: None,
            };

            cmd_run(&cfg, inputs, output.as_deref(), history)
        },

        Commands::Config { config } => {
            let cfg = load_config(config.as_deref())?;
            print!("{}", cfg.to_toml()?);
            Ok(())
        },
    }
}

fn cmd_run(
    config: &Config,
    inputs: SimulationInputs,
    output: Option<&Path>,
    include_history: bool,
) -> anyhow::Result<()> {
    let mut rng: Box<dyn RngCore> = match config.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(thread_rng()),
    };

    let state = run_simulation(config, inputs, &mut rng)?;
    let report = SimulationReport::from_state(&state, config.analysis.display_threshold)?;
    let markdown = MarkdownReport { include_history }.render(&report)?;

    let Some(dir) = output else {
        println!("{markdown}");
        return Ok(());
    };

    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let graph =
        prepare_visualization_data(&state.connections, &state.agents, config.analysis.display_threshold)?;

    let files = [
        ("report.json", JsonReport.render(&report)?),
        ("report.md", markdown),
        ("connections.csv", matrix_to_csv(&state.connections)),
        ("graph.json", visualization_json(&graph)?),
        ("graph.dot", to_dot(&graph)),
    ];
    for (name, content) in files {
        let path = dir.join(name);
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    }

    info!(run_id = %state.run_id, output = %dir.display(), "Wrote simulation outputs");
    println!("Run {} written to {}", state.run_id, dir.display());
    Ok(())
}

/// Explicit file, else the default path when it exists, else defaults; then env overrides.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let base = match path {
        Some(path) => Config::from_file(path)?,
        None => match Config::default_path().filter(|p| p.exists()) {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        },
    };
    Ok(base.merge(Config::from_env()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
