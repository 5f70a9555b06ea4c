//! Application-level configuration loading, including the scoring tables.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::scoring::ScoringRules;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_ARENA_CONFIG_PATH";

#[derive(Debug, Clone, Default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Scoring constants; baked-in defaults unless overridden on disk.
    pub scoring: ScoringRules,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in scoring tables.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(path = %path.display(), "loaded scoring tables from config");
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    scoring: Option<ScoringRules>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            scoring: value.scoring.unwrap_or_default(),
        }
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_scoring_section_falls_back_to_defaults() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.scoring, ScoringRules::default());
    }

    #[test]
    fn scoring_section_overrides_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "scoring": {
                    "room_base": 12,
                    "room_seconds_per_bonus": 6,
                    "room_bonus_cap": 5,
                    "base_easy": 10,
                    "base_medium": 15,
                    "base_hard": 20,
                    "speed_bonus_max": 10,
                    "streak_step": 5,
                    "timeout_penalty": 0.5,
                    "multiplier_easy": 1.0,
                    "multiplier_medium": 1.2,
                    "multiplier_hard": 1.5
                }
            }"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.scoring.room_base, 12);
    }
}
