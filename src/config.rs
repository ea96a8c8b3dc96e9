use crate::error::EngineError;
use crate::models::Metric;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub corpus: CorpusSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorpusSettings {
    /// JSON snapshot produced by the ingestion pipeline
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }
fn default_timeout_ms() -> u64 { 2_000 }

/// Tunables for the matching engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_true", alias = "collaborativeBoostEnabled")]
    pub collaborative_boost_enabled: bool,
    #[serde(default = "default_min_similar_profiles", alias = "minSimilarProfiles")]
    pub min_similar_profiles: usize,
    #[serde(default = "default_similarity_threshold", alias = "similarityThreshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_max_boost_fraction", alias = "maxBoostFraction")]
    pub max_boost_fraction: f64,
    #[serde(default = "default_strong_threshold", alias = "strongThreshold")]
    pub strong_threshold: f64,
    #[serde(default = "default_weak_threshold", alias = "weakThreshold")]
    pub weak_threshold: f64,
    #[serde(default = "default_highlight_limit", alias = "highlightLimit")]
    pub highlight_limit: usize,
    #[serde(default = "default_uncertain_confidence", alias = "uncertainConfidence")]
    pub uncertain_confidence: f64,
    /// Metric name -> half-life in days, overriding the per-metric defaults
    #[serde(default, alias = "metricHalfLives")]
    pub metric_half_lives: BTreeMap<String, f64>,
    /// Scoring threads; None uses one per CPU
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collaborative_boost_enabled: default_true(),
            min_similar_profiles: default_min_similar_profiles(),
            similarity_threshold: default_similarity_threshold(),
            max_boost_fraction: default_max_boost_fraction(),
            strong_threshold: default_strong_threshold(),
            weak_threshold: default_weak_threshold(),
            highlight_limit: default_highlight_limit(),
            uncertain_confidence: default_uncertain_confidence(),
            metric_half_lives: BTreeMap::new(),
            workers: None,
        }
    }
}

fn default_true() -> bool { true }
fn default_min_similar_profiles() -> usize { 3 }
fn default_similarity_threshold() -> f64 { 0.8 }
fn default_max_boost_fraction() -> f64 { 0.10 }
fn default_strong_threshold() -> f64 { 70.0 }
fn default_weak_threshold() -> f64 { 40.0 }
fn default_highlight_limit() -> usize { 3 }
fn default_uncertain_confidence() -> f64 { 0.5 }

impl EngineConfig {
    /// Check every option is in range. Failures are fatal at startup.
    pub fn validate(&self) -> Result<(), EngineError> {
        check_range("strong_threshold", self.strong_threshold, 0.0, 100.0)?;
        check_range("weak_threshold", self.weak_threshold, 0.0, 100.0)?;
        if self.weak_threshold >= self.strong_threshold {
            return Err(EngineError::Configuration(format!(
                "weak_threshold ({}) must be below strong_threshold ({})",
                self.weak_threshold, self.strong_threshold
            )));
        }
        check_range("similarity_threshold", self.similarity_threshold, -1.0, 1.0)?;
        check_range("max_boost_fraction", self.max_boost_fraction, 0.0, 1.0)?;
        check_range("uncertain_confidence", self.uncertain_confidence, 0.0, 1.0)?;
        if self.min_similar_profiles == 0 {
            return Err(EngineError::Configuration(
                "min_similar_profiles must be at least 1".to_string(),
            ));
        }
        if self.workers == Some(0) {
            return Err(EngineError::Configuration("workers must be at least 1".to_string()));
        }
        self.half_life_overrides().map(|_| ())
    }

    /// Parsed half-life overrides in days
    pub fn half_life_overrides(&self) -> Result<BTreeMap<Metric, f64>, EngineError> {
        self.metric_half_lives
            .iter()
            .map(|(name, days)| {
                let metric = Metric::from_name(name).ok_or_else(|| {
                    EngineError::Configuration(format!("unknown metric in metric_half_lives: {}", name))
                })?;
                if !days.is_finite() || *days <= 0.0 {
                    return Err(EngineError::Configuration(format!(
                        "half-life for {} must be a positive number of days, got {}",
                        name, days
                    )));
                }
                Ok((metric, *days))
            })
            .collect()
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value < min || value > max {
        return Err(EngineError::Configuration(format!(
            "{} must be within [{}, {}], got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with NEIGHBORFIT_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., NEIGHBORFIT__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("NEIGHBORFIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_corpus_override(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("NEIGHBORFIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// CORPUS_PATH wins over the configured snapshot location
fn apply_corpus_override(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("CORPUS_PATH") {
        Ok(path) => Config::builder()
            .add_source(settings)
            .set_override("corpus.path", path)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config() {
        let config = EngineConfig::default();
        assert!(config.collaborative_boost_enabled);
        assert_eq!(config.strong_threshold, 70.0);
        assert_eq!(config.weak_threshold, 40.0);
        assert_eq!(config.min_similar_profiles, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_thresholds_out_of_range() {
        let config = EngineConfig { strong_threshold: 120.0, ..EngineConfig::default() };
        assert!(matches!(config.validate(), Err(EngineError::Configuration(_))));

        let inverted = EngineConfig {
            strong_threshold: 30.0,
            weak_threshold: 60.0,
            ..EngineConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_half_life_overrides() {
        let mut config = EngineConfig::default();
        config.metric_half_lives.insert("crime_rate".to_string(), 14.0);
        let overrides = config.half_life_overrides().unwrap();
        assert_eq!(overrides.get(&Metric::CrimeRate), Some(&14.0));

        config.metric_half_lives.insert("rainfall".to_string(), 10.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_section_from_toml() {
        let raw = r#"
            collaborative_boost_enabled = false
            strong_threshold = 75.0
            workers = 4

            [metric_half_lives]
            crime_rate = 21.0
        "#;
        let config: EngineConfig = toml::from_str(raw).unwrap();
        assert!(!config.collaborative_boost_enabled);
        assert_eq!(config.strong_threshold, 75.0);
        assert_eq!(config.weak_threshold, 40.0);
        assert_eq!(config.workers, Some(4));
        assert!(config.validate().is_ok());
    }
}
