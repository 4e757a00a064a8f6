mod commands;
mod export;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "astrocam", about = "Simulated astronomical camera and reduction pipeline")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full imaging session and save the stacked result
    Simulate(commands::simulate::SimulateArgs),
    /// Render one noiseless photon field
    Render(commands::render::RenderArgs),
    /// Print or save the default session config
    Config(commands::config::ConfigArgs),
    /// Print theoretical SNR improvement per stacking method
    Snr(commands::snr::SnrArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Snr(args) => commands::snr::run(args),
    }
}
