//! Status and config commands

use crate::app::App;
use clap::Args;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn execute(&self, app: &App) -> anyhow::Result<()> {
        let status = app.status()?;

        if self.json {
            let map = status
                .iter()
                .map(|(q, state)| Ok((q.name().to_string(), serde_json::to_value(state)?)))
                .collect::<Result<serde_json::Map<String, serde_json::Value>, serde_json::Error>>()?;
            println!("{}", serde_json::to_string_pretty(&map)?);
            return Ok(());
        }

        println!("supdog-stats status");
        println!("  Stats dir: {}", app.config().store.stats_dir.display());
        for (quantity, state) in &status {
            match state {
                Some(state) => println!(
                    "  {:<13} {} (at {})",
                    quantity.name(),
                    state.value,
                    state.timestamp.to_rfc3339()
                ),
                None => println!("  {:<13} -", quantity.name()),
            }
        }
        Ok(())
    }
}

pub fn print_config(app: &App) -> anyhow::Result<()> {
    println!("Current configuration:");
    print!("{}", toml::to_string_pretty(app.config())?);
    Ok(())
}
