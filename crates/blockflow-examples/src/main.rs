//! Command-line demo for the blockflow engine.

mod demo;

use std::path::PathBuf;
use std::time::Duration;

use blockflow_blocks::{BASIC_BUNDLE_PATH, new_engine};
use blockflow_core::{BlockException, EngineConfig, TimestampedValue, init_observability};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run and inspect blockflow graphs", long_about = None)]
struct Cli {
    /// Bundle to load
    #[arg(long, default_value = BASIC_BUNDLE_PATH)]
    bundle: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the bundle's metadata as JSON
    Info,
    /// Run Counter -> Doubler -> Printer on the background scheduler
    Run {
        /// Counter rate in Hz
        #[arg(long, default_value_t = 2.0)]
        rate: f64,
        /// How long to run
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
    /// Build the demo graph and write it to a JSON file
    Export {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Load a graph from a JSON file and run it
    Import {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        #[arg(long, default_value_t = 5)]
        seconds: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_observability();
    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;

    match cli.command {
        Command::Info => {
            let engine = new_engine(config.manual())?;
            let bundle = engine.load_bundle(&cli.bundle)?;
            println!("{}", serde_json::to_string_pretty(&bundle.info()?)?);
        }
        Command::Run { rate, seconds } => {
            let engine = new_engine(config)?;
            engine.register_exception_callback(|e: &BlockException| eprintln!("{}", e));
            let graph = demo::build(&engine, &cli.bundle, rate)?;
            graph
                .doubler
                .outlet("result")?
                .register_to_new_data(|v: &TimestampedValue| {
                    tracing::debug!(value = %v.value, timestamp = v.timestamp, "doubled");
                })?;
            demo::start(&graph)?;
            std::thread::sleep(Duration::from_secs(seconds));
            for block in graph.blocks() {
                block.stop()?;
            }
            let last = graph.printer.outlet("line")?.last_value()?;
            println!("last line: {}", last.value);
        }
        Command::Export { path } => {
            let engine = new_engine(config.manual())?;
            demo::build(&engine, &cli.bundle, 2.0)?;
            engine.save_config(&path)?;
            println!("wrote {}", path.display());
        }
        Command::Import { path, seconds } => {
            let engine = new_engine(config)?;
            engine.register_exception_callback(|e: &BlockException| eprintln!("{}", e));
            engine.load_config(&path)?;
            for link in engine.links() {
                println!("{}", link);
            }
            let blocks = engine.block_instances();
            for block in &blocks {
                if block.state()?.can_start() {
                    block.start()?;
                }
            }
            std::thread::sleep(Duration::from_secs(seconds));
            for block in &blocks {
                println!("{}: {}", block.name()?, block.state()?);
            }
        }
    }
    Ok(())
}
