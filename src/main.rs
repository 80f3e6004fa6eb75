use anyhow::{Context, Result};
use autoevo_core::config::AutoEvoConfig;
use autoevo_core::phylogeny::SpeciesTree;
use autoevo_io::{GenerationEvent, GenerationLogger};
use autoevo_lib::report;
use autoevo_lib::Scenario;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario for a number of generations
    Run {
        /// Scenario file describing patches and species
        #[arg(short, long)]
        scenario: PathBuf,

        /// Custom config file path
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// Generations to advance
        #[arg(short, long, default_value_t = 10)]
        generations: u32,

        /// Overrides the configured seed
        #[arg(long)]
        seed: Option<u64>,

        /// Write the resulting history to this save file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Append generation events to this JSONL log
        #[arg(long)]
        log: Option<PathBuf>,

        /// Write the species phylogeny as Graphviz DOT
        #[arg(long)]
        dot: Option<PathBuf>,
    },
    /// Print the contents of a save file
    Inspect {
        #[arg(short, long)]
        save: PathBuf,

        /// Show the full record of one species
        #[arg(long)]
        species: Option<u32>,

        /// Generation to inspect, defaults to the latest
        #[arg(long)]
        generation: Option<u32>,
    },
}

#[allow(clippy::too_many_arguments)]
fn run(
    scenario: PathBuf,
    config: PathBuf,
    generations: u32,
    seed: Option<u64>,
    save: Option<PathBuf>,
    log: Option<PathBuf>,
    dot: Option<PathBuf>,
) -> Result<()> {
    let mut config = AutoEvoConfig::load_or_default(&config)?;
    if seed.is_some() {
        config.world.seed = seed;
    }
    config.validate()?;

    let scenario = Scenario::load(&scenario)?;
    let mut sim = scenario.build_simulation(config)?;
    let mut logger = match log {
        Some(path) => GenerationLogger::new_at(path)?,
        None => GenerationLogger::new_dummy(),
    };

    println!("Running '{}' for {generations} generations", scenario.name);
    for _ in 0..generations {
        let generation = sim.history().next_generation();
        match sim.advance_generation() {
            Ok(outcome) => {
                if let Some(record) = sim.history().latest() {
                    for event in GenerationEvent::from_outcome(generation, record, &outcome) {
                        logger.log_event(&event)?;
                    }
                }
                print!("{}", report::outcome_table(generation, &outcome));
                if sim.species_ids().next().is_none() {
                    tracing::warn!(generation = generation, "Every species is extinct, stopping");
                    break;
                }
            }
            Err(e) => {
                logger.log_event(&GenerationEvent::failed(generation, e.to_string()))?;
                return Err(e).context("auto-evo failed");
            }
        }
    }

    if let Some(path) = save {
        autoevo_io::save_history(sim.history(), sim.config(), &path)?;
        println!("Saved history to {}", path.display());
    }
    if let Some(path) = dot {
        std::fs::write(&path, SpeciesTree::from_history(sim.history()).to_dot())
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote phylogeny to {}", path.display());
    }
    Ok(())
}

fn inspect(save: PathBuf, species: Option<u32>, generation: Option<u32>) -> Result<()> {
    let loaded = autoevo_io::load_history(&save)?;
    let meta = &loaded.metadata;
    println!(
        "Save v{} written {} ({} generations, config {})",
        meta.version,
        meta.created_at,
        meta.generations,
        &meta.config_fingerprint[..meta.config_fingerprint.len().min(12)]
    );

    let history = &loaded.history;
    let generation = generation
        .or_else(|| history.latest_generation())
        .context("save contains no generations")?;
    match species {
        Some(id) => print!("{}", report::species_summary(history, id, generation)?),
        None => print!("{}", report::generation_summary(history, generation)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    autoevo_core::init_logging();
    let args = Args::parse();

    match args.command {
        Command::Run {
            scenario,
            config,
            generations,
            seed,
            save,
            log,
            dot,
        } => run(scenario, config, generations, seed, save, log, dot),
        Command::Inspect {
            save,
            species,
            generation,
        } => inspect(save, species, generation),
    }
}
