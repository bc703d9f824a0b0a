use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use grid_auction::config::{MarketConfig, Settings};
use grid_auction::scenario::{self, Scenario};
use grid_auction::telemetry;

#[derive(Parser, Debug)]
#[command(name = "grid-auction", version, about = "Double-auction electricity market clearing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded scenario and print each cleared frame as JSON
    Replay {
        #[arg(long)]
        scenario: PathBuf,
        /// Market configuration file (TOML, JSON or YAML)
        #[arg(long, env = "AUCTION_CONFIG_PATH")]
        config: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        error!("Fatal: {:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let settings = Settings::from_env()?;
    telemetry::init_tracing(settings.log_format);
    info!("Starting grid-auction ({})", settings.environment);

    let cli = Cli::parse();
    match cli.command {
        Command::Replay { scenario, config } => {
            let mut scenario = Scenario::from_file(&scenario)?;
            let config = match config.or(settings.config_path) {
                Some(path) => MarketConfig::from_file(&path)?,
                None => scenario.market.take().unwrap_or_default(),
            };

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            scenario::replay(scenario, config, &mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}
