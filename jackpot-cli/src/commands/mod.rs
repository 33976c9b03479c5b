pub mod config;
pub mod run;

pub use config::{handle_config_command, ConfigCommands};
pub use run::{handle_run_command, RunArgs};
