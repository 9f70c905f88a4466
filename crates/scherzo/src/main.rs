use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

fn main() -> Result<()> {
    // Logs go to stderr so sampled output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Sample(args) => args.run(),
    }
}

#[derive(Parser)]
#[command(name = "scherzo", about = "Extruder kinematics tooling for Scherzo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample nominal and pressure advanced extruder positions for a move list.
    Sample(cli::sample::SampleArgs),
}
