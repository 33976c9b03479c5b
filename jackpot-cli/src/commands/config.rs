use crate::config::CliConfig;
use anyhow::Context;
use clap::Subcommand;
use jackpot_engine::EngineConfig;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration to the data directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the configuration in effect
    Show,
}

pub fn handle_config_command(cmd: ConfigCommands, settings: &CliConfig) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            let path = settings.config_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists, pass --force to overwrite",
                    path.display()
                );
            }

            EngineConfig::default()
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }

        ConfigCommands::Show => {
            let config = settings.engine_config()?;
            println!("# {}", settings.config_path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
