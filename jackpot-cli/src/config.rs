use jackpot_engine::EngineConfig;
use std::path::PathBuf;

const CONFIG_FILE: &str = "jackpot.json";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("jackpot"),
        }
    }
}

impl CliConfig {
    pub fn new(data_dir: Option<PathBuf>) -> Self {
        match data_dir {
            Some(data_dir) => Self { data_dir },
            None => Self::default(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Engine settings from the data directory, or the defaults if no file
    /// has been written yet.
    pub fn engine_config(&self) -> jackpot_engine::Result<EngineConfig> {
        let path = self.config_path();
        if path.exists() {
            EngineConfig::load(&path)
        } else {
            Ok(EngineConfig::default())
        }
    }
}
