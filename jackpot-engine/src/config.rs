use crate::error::{JackpotError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distinct players needed before a round starts on its own.
    pub quorum: usize,
    /// Stored on every round; the countdown does not depend on it.
    pub round_duration_secs: u64,
    pub countdown: Duration,
    pub countdown_tick: Duration,
    pub restart_delay: Duration,
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quorum: 2,
            round_duration_secs: 60,
            countdown: Duration::from_secs(30),
            countdown_tick: Duration::from_secs(1),
            restart_delay: Duration::from_secs(5),
            event_capacity: 1024,
        }
    }
}

impl EngineConfig {
    pub fn with_timings(
        countdown: Duration,
        countdown_tick: Duration,
        restart_delay: Duration,
    ) -> Self {
        Self {
            countdown,
            countdown_tick,
            restart_delay,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quorum < 2 {
            return Err(JackpotError::config("Quorum must be at least 2 players"));
        }

        if self.countdown.is_zero() {
            return Err(JackpotError::config("Countdown must be greater than 0"));
        }

        if self.countdown_tick.is_zero() {
            return Err(JackpotError::config("Countdown tick must be greater than 0"));
        }

        if self.countdown_tick > self.countdown {
            return Err(JackpotError::config(
                "Countdown tick cannot be longer than the countdown",
            ));
        }

        if self.restart_delay.is_zero() {
            return Err(JackpotError::config("Restart delay must be greater than 0"));
        }

        if self.event_capacity == 0 {
            return Err(JackpotError::config("Event capacity must be greater than 0"));
        }

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
