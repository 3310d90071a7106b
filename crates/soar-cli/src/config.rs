//! CLI configuration from environment and settings files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use soar_core::{GlideSettings, TaskBehaviour};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    /// MacCready override in m/s
    pub mc: Option<f64>,
    /// Arrival safety height override in meters
    pub safety_height: Option<f64>,
    pub log_filter: String,
    pub settings_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mc: env::var("SOAR_MC").ok().and_then(|s| s.parse().ok()),
            safety_height: env::var("SOAR_SAFETY_HEIGHT")
                .ok()
                .and_then(|s| s.parse().ok()),
            log_filter: env::var("SOAR_LOG").unwrap_or_else(|_| "soar_core=info,fly_task=info".to_string()),
            settings_path: env::var("SOAR_SETTINGS").ok().map(PathBuf::from),
        }
    }

    /// Apply the environment overrides on top of file settings.
    pub fn apply(&self, settings: &mut EngineSettings) {
        if let Some(mc) = self.mc {
            settings.glide.mc = mc.max(0.0);
        }
        if let Some(height) = self.safety_height {
            settings.behaviour.safety_height_arrival = height.max(0.0);
        }
    }
}

/// Task behaviour and aircraft performance, as stored in a settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub behaviour: TaskBehaviour,
    pub glide: GlideSettings,
}

impl EngineSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid settings")
    }

    /// Read settings from `path`, or the defaults without one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soar_core::AdvanceMode;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = EngineSettings::from_json(
            r#"{ "behaviour": { "advance_mode": "auto" }, "glide": { "mc": 2.5 } }"#,
        )
        .unwrap();
        assert_eq!(settings.behaviour.advance_mode, AdvanceMode::Auto);
        assert_eq!(settings.glide.mc, 2.5);
        assert_eq!(settings.glide.bugs, GlideSettings::default().bugs);
        assert_eq!(
            settings.behaviour.safety_height_arrival,
            TaskBehaviour::default().safety_height_arrival
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config {
            mc: Some(-1.0),
            safety_height: Some(150.0),
            log_filter: String::new(),
            settings_path: None,
        };
        let mut settings = EngineSettings::default();
        config.apply(&mut settings);
        assert_eq!(settings.glide.mc, 0.0);
        assert_eq!(settings.behaviour.safety_height_arrival, 150.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(EngineSettings::load(Some(Path::new("/nonexistent/settings.json"))).is_err());
        assert!(EngineSettings::load(None).is_ok());
    }
}
