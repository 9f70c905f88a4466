use anyhow::Result;
use clap::Args;
use scherzo::{config::Config, sample};
use std::path::PathBuf;

#[derive(Args)]
pub struct SampleArgs {
    /// Path to the configuration file (TOML or JSON).
    pub config: PathBuf,

    /// Print samples as JSON instead of CSV.
    #[arg(long)]
    pub json: bool,
}

impl SampleArgs {
    pub fn run(&self) -> Result<()> {
        let config = Config::from_file(&self.config)?;
        config.validate()?;

        tracing::info!("Sampling extruder with config: {}", self.config.display());
        tracing::debug!(
            pressure_advance = config.extruder.pressure_advance,
            smooth_time = config.extruder.smooth_time,
            moves = config.moves.len(),
            "Loaded extruder config"
        );

        let samples = sample::run(&config)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&samples)?);
        } else {
            println!("print_time,nominal,position,advance");
            for s in &samples {
                println!(
                    "{:.6},{:.6},{:.6},{:.6}",
                    s.print_time,
                    s.nominal,
                    s.position,
                    s.advance()
                );
            }
        }

        Ok(())
    }
}
