use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trophic_core::config::EcosystemConfig;
use trophic_core::organism::TrophicTag;
use trophic_core::world::{RunPlan, World};

#[derive(Parser)]
#[command(name = "trophic")]
#[command(about = "Four-tier food chain simulation on a toroidal grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print the run summary as JSON
    Run {
        /// Path to config file (JSON); defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Maximum number of ticks to simulate
        #[arg(long, default_value_t = 10_000)]
        ticks: u64,

        /// Record population metrics every N ticks
        #[arg(long, default_value_t = 100)]
        sample_every: u64,

        /// Override the seed from the config file
        #[arg(long)]
        seed: Option<u64>,

        /// Keep ticking after the food chain has collapsed
        #[arg(long)]
        keep_going: bool,
    },
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn load_config(path: Option<&PathBuf>) -> Result<EcosystemConfig> {
    let Some(path) = path else {
        return Ok(EcosystemConfig::default());
    };
    let file = File::open(path)
        .with_context(|| format!("failed to open config file {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).context("failed to parse config")
}

/// `RUST_LOG` directives when present and valid, `info` otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = EcosystemConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Run {
            config,
            ticks,
            sample_every,
            seed,
            keep_going,
        } => {
            let mut eco_config = load_config(config.as_ref())?;
            if let Some(seed) = seed {
                eco_config.seed = seed;
            }
            let mut world = World::new(eco_config).context("failed to initialize world")?;
            let counts = world.counts();
            tracing::info!(
                seed = world.config().seed,
                width = world.config().width,
                height = world.config().height,
                producers = counts.producers,
                herbivores = counts.herbivores,
                predators = counts.predators,
                apex = counts.apex,
                ticks,
                "starting run"
            );

            let plan = RunPlan {
                ticks,
                sample_every,
                stop_on_collapse: !keep_going,
            };
            let summary = world.try_run(&plan).context("invalid run plan")?;

            for tag in TrophicTag::ALL {
                let stats = world.population_stats(tag);
                tracing::info!(
                    tier = %tag,
                    count = stats.count,
                    mean_energy = stats.mean_energy,
                    max_generation = stats.max_generation,
                    "final population"
                );
            }
            tracing::info!(
                ticks_run = summary.ticks_run,
                outcome = ?summary.outcome,
                "run complete"
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn log_filter_honours_debug_directive() {
        let filter = log_filter(Some("debug".to_string()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "trophic",
            "run",
            "--ticks",
            "50",
            "--seed",
            "9",
            "--keep-going",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                config,
                ticks,
                sample_every,
                seed,
                keep_going,
            } => {
                assert!(config.is_none());
                assert_eq!(ticks, 50);
                assert_eq!(sample_every, 100);
                assert_eq!(seed, Some(9));
                assert!(keep_going);
            }
            Commands::DumpDefaultConfig => panic!("expected run"),
        }
    }
}
