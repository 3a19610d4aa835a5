//! Configuration: toml file plus environment, with built-in defaults.
//!
//! Load order: `$WHOSDOWN_CONFIG`, then `~/.whosdown/config.toml`, then
//! defaults. Every field is optional in the file; missing sections fall
//! back to the reference behavior (20% arrival chance per 10s tick,
//! 2h simulated-invite lifetime, prune sweep every 60s).

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub caption: CaptionConfig,
    pub sim: SimConfig,
    pub prune: PruneConfig,
}

/// Settings for the caption suggestion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key. The key
    /// itself never lives in the config file. Absence of the key is not
    /// an error; generation degrades to the fallback caption.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Settings for the incoming-invite simulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub interval_secs: u64,
    /// Flat per-tick probability, not an arrival rate.
    pub arrival_chance: f64,
    pub invite_ttl_secs: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            arrival_chance: 0.2,
            invite_ttl_secs: 7_200,
        }
    }
}

/// Settings for the expiry sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PruneConfig {
    pub interval_secs: u64,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl Config {
    /// Load configuration from the usual locations, falling back to
    /// defaults when no file exists.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("WHOSDOWN_CONFIG") {
            return Self::load_from(Path::new(&path));
        }
        let path = default_config_path();
        if path.exists() {
            return Self::load_from(&path);
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("cannot read config {}: {}", path.display(), e))?;
        let cfg = toml::from_str(&raw)
            .map_err(|e| anyhow!("cannot parse config {}: {}", path.display(), e))?;
        Ok(cfg)
    }

    /// Validate settings, collecting every problem rather than stopping
    /// at the first.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&self.sim.arrival_chance) {
            errors.push(format!(
                "sim.arrival_chance must be within [0, 1], got {}",
                self.sim.arrival_chance
            ));
        }
        if self.sim.interval_secs == 0 {
            errors.push("sim.interval_secs must be nonzero".to_string());
        }
        if self.sim.invite_ttl_secs == 0 {
            errors.push("sim.invite_ttl_secs must be nonzero".to_string());
        }
        if self.prune.interval_secs == 0 {
            errors.push("prune.interval_secs must be nonzero".to_string());
        }
        if self.caption.timeout_secs == 0 {
            errors.push("caption.timeout_secs must be nonzero".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".whosdown")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.sim.interval_secs, 10);
        assert!((cfg.sim.arrival_chance - 0.2).abs() < f64::EPSILON);
        assert_eq!(cfg.sim.invite_ttl_secs, 7_200);
        assert_eq!(cfg.prune.interval_secs, 60);
        assert_eq!(cfg.caption.model, "gemini-2.5-flash");
        assert_eq!(cfg.caption.api_key_env, "GEMINI_API_KEY");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[sim]\narrival_chance = 0.5\n\n[caption]\nmodel = \"gemini-2.0-flash\"\n"
        )
        .unwrap();

        let cfg = Config::load_from(file.path()).unwrap();
        assert!((cfg.sim.arrival_chance - 0.5).abs() < f64::EPSILON);
        // untouched fields keep their defaults
        assert_eq!(cfg.sim.interval_secs, 10);
        assert_eq!(cfg.caption.model, "gemini-2.0-flash");
        assert_eq!(cfg.prune.interval_secs, 60);
    }

    #[test]
    fn test_load_from_missing_file() {
        assert!(Config::load_from(Path::new("/nonexistent/whosdown.toml")).is_err());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut cfg = Config::default();
        cfg.sim.arrival_chance = 1.5;
        cfg.sim.interval_secs = 0;
        cfg.prune.interval_secs = 0;

        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("arrival_chance"));
    }
}
