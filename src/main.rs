use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use civsim::{
    scenario::ScenarioLoader,
    web::{self, WebServerConfig},
    Controller,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Territorial expansion of competing civilisations")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/classic.yaml")]
    scenario: PathBuf,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the round limit of a headless run
    #[arg(long)]
    rounds: Option<u64>,

    /// Serve the interactive browser UI instead of running headless
    #[arg(long)]
    serve: bool,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new()?;
        return runtime.block_on(web::run(WebServerConfig {
            scenario,
            host: cli.host,
            port: cli.port,
        }));
    }

    let rounds = scenario.rounds(cli.rounds);
    let mut controller = Controller::new(scenario.controller_settings());
    let summary = controller.run_with_hook(rounds, |_| {});

    match summary.survivor {
        Some(survivor) => info!(
            scenario = %scenario.name,
            rounds = summary.rounds,
            %survivor,
            "grid converged"
        ),
        None => info!(
            scenario = %scenario.name,
            rounds = summary.rounds,
            "round limit reached before convergence"
        ),
    }
    for entry in controller.ranked_population() {
        let power = controller.registry().power(entry.id);
        println!(
            "{:>10} {:>6} cells  {:>3} %",
            entry.id.to_string(),
            entry.cells,
            (power * 100.0).round()
        );
    }
    Ok(())
}
