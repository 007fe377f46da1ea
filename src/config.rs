//! Configuration System
//!
//! Hierarchical configuration loading from:
//! - `engine.toml` (default configuration)
//! - `engine.local.toml` (git-ignored local overrides)
//! - Environment variables (`ENGINE_` prefix)
//!
//! ## Example
//!
//! ```toml
//! # engine.toml
//! [evaluation]
//! strategy = "formulas-btg"
//! strict_consistency = true
//! default_topk = 10
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! ENGINE_EVALUATION__STRATEGY=maxpref
//! ENGINE_EVALUATION__STRICT_CONSISTENCY=false
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Which of the five derivation strategies (spec §4.5) an evaluator call
/// should use when the caller doesn't pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Classical,
    Partition,
    ExtendedPartition,
    FormulasBtg,
    MaxPref,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::FormulasBtg
    }
}

/// Evaluation-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub strategy: Strategy,

    /// If true, evaluators refuse to run against an inconsistent theory
    /// (spec §4.3) and return `CpError::InconsistentTheory` instead of
    /// producing a best-effort ranking.
    #[serde(default = "default_strict_consistency")]
    pub strict_consistency: bool,

    /// Default `k` for `topk` calls made without an explicit count.
    #[serde(default = "default_topk")]
    pub default_topk: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            strategy: Strategy::default(),
            strict_consistency: default_strict_consistency(),
            default_topk: default_topk(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

fn default_strict_consistency() -> bool {
    true
}
fn default_topk() -> usize {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from default locations.
    ///
    /// Merges in order:
    /// 1. `engine.toml` (base configuration)
    /// 2. `engine.local.toml` (local overrides, git-ignored)
    /// 3. Environment variables (`ENGINE_` prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("engine.toml"))
            .merge(Toml::file("engine.local.toml"))
            .merge(Env::prefixed("ENGINE_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("ENGINE_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_prefers_formulas_btg_and_strict_consistency() {
        let config = EngineConfig::default();
        assert_eq!(config.evaluation.strategy, Strategy::FormulasBtg);
        assert!(config.evaluation.strict_consistency);
        assert_eq!(config.evaluation.default_topk, 10);
    }

    #[test]
    fn serializes_to_expected_toml_sections() {
        let config = EngineConfig::default();
        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains("[evaluation]"));
        assert!(rendered.contains("[logging]"));
    }

    #[test]
    fn loads_overrides_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ENGINE_EVALUATION__STRATEGY", "maxpref");
            jail.set_env("ENGINE_EVALUATION__STRICT_CONSISTENCY", "false");
            let config: EngineConfig = Figment::new()
                .merge(Env::prefixed("ENGINE_").split("__"))
                .extract()
                .unwrap();
            assert_eq!(config.evaluation.strategy, Strategy::MaxPref);
            assert!(!config.evaluation.strict_consistency);
            Ok(())
        });
    }
}
