//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `genesis-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure, with defaults matching the design values, and a
//! loader that reads the file and applies environment overrides for
//! infrastructure URLs.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenesisConfig {
    /// World identity and seeding.
    #[serde(default)]
    pub world: WorldConfig,

    /// Perception geometry.
    #[serde(default)]
    pub perception: PerceptionConfig,

    /// Tick loop and agent runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Sandbox subprocess settings.
    #[serde(default)]
    pub sandbox: SandboxSection,

    /// LLM backend settings.
    #[serde(default)]
    pub llm: genesis_llm::LlmConfig,

    /// Infrastructure connection strings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GenesisConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `NATS_URL` overrides `infrastructure.nats_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// World identity and seeding.
#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    /// Display name of the world.
    #[serde(default = "default_world_name")]
    pub name: String,
    /// Seed for deterministic planning; per-entity RNGs derive from it.
    #[serde(default)]
    pub seed: u64,
    /// Entities spawned at world start.
    #[serde(default = "default_seed_entities")]
    pub seed_entities: u32,
}

fn default_world_name() -> String {
    String::from("genesis")
}

const fn default_seed_entities() -> u32 {
    5
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: 0,
            seed_entities: default_seed_entities(),
        }
    }
}

/// Perception geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct PerceptionConfig {
    /// Maximum visual range in world units.
    #[serde(default = "default_vision_range")]
    pub vision_range: f64,
    /// Total horizontal field of view in degrees.
    #[serde(default = "default_view_angle")]
    pub view_angle: f64,
    /// Maximum audible range in world units.
    #[serde(default = "default_hearing_range")]
    pub hearing_range: f64,
    /// Close-range gate for conversations and challenges.
    #[serde(default = "default_interaction_range")]
    pub interaction_range: f64,
    /// Distance under which visual detail is high.
    #[serde(default = "default_high_detail_distance")]
    pub high_detail_distance: f64,
}

const fn default_vision_range() -> f64 {
    200.0
}

const fn default_view_angle() -> f64 {
    120.0
}

const fn default_hearing_range() -> f64 {
    150.0
}

const fn default_interaction_range() -> f64 {
    5.0
}

const fn default_high_detail_distance() -> f64 {
    50.0
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            vision_range: default_vision_range(),
            view_angle: default_view_angle(),
            hearing_range: default_hearing_range(),
            interaction_range: default_interaction_range(),
            high_detail_distance: default_high_detail_distance(),
        }
    }
}

/// Tick loop and agent runtime settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// World loop frequency in Hz.
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: f64,
    /// Entities processed concurrently in the planning phase.
    #[serde(default = "default_entity_concurrency")]
    pub max_entity_concurrency: usize,
    /// Minimum ticks between conversations with the same partner.
    #[serde(default = "default_conversation_cooldown")]
    pub conversation_cooldown: u64,
    /// Social need value that gates conversation triggering.
    #[serde(default = "default_social_need_threshold")]
    pub social_need_threshold: f64,
}

const fn default_tick_rate_hz() -> f64 {
    1.0
}

fn default_entity_concurrency() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZero::get)
}

const fn default_conversation_cooldown() -> u64 {
    20
}

const fn default_social_need_threshold() -> f64 {
    60.0
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
            max_entity_concurrency: default_entity_concurrency(),
            conversation_cooldown: default_conversation_cooldown(),
            social_need_threshold: default_social_need_threshold(),
        }
    }
}

impl RuntimeConfig {
    /// The tick interval derived from the configured rate.
    pub fn tick_interval(&self) -> Duration {
        let hz = if self.tick_rate_hz > 0.0 {
            self.tick_rate_hz
        } else {
            1.0
        };
        Duration::from_secs_f64(1.0 / hz)
    }
}

/// Sandbox subprocess settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxSection {
    /// Hard wall-clock limit per code block, in seconds.
    #[serde(default = "default_sandbox_timeout")]
    pub timeout_secs: u64,
    /// Python interpreter binary.
    #[serde(default = "default_python_bin")]
    pub python_bin: String,
    /// Node interpreter binary.
    #[serde(default = "default_node_bin")]
    pub node_bin: String,
}

const fn default_sandbox_timeout() -> u64 {
    5
}

fn default_python_bin() -> String {
    String::from("python3")
}

fn default_node_bin() -> String {
    String::from("node")
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_sandbox_timeout(),
            python_bin: default_python_bin(),
            node_bin: default_node_bin(),
        }
    }
}

impl SandboxSection {
    /// Convert to the sandbox crate's runtime configuration.
    pub fn to_sandbox_config(&self) -> genesis_sandbox::SandboxConfig {
        genesis_sandbox::SandboxConfig {
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            python_bin: self.python_bin.clone(),
            node_bin: self.node_bin.clone(),
        }
    }
}

/// Infrastructure connection strings.
#[derive(Debug, Clone, Deserialize)]
pub struct InfrastructureConfig {
    /// NATS server URL for real-time fanout; empty means log-only.
    #[serde(default)]
    pub nats_url: String,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            nats_url: String::new(),
        }
    }
}

impl InfrastructureConfig {
    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NATS_URL")
            && !url.is_empty()
        {
            self.nats_url = url;
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (overridable via `RUST_LOG`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    String::from("info")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = GenesisConfig::parse("{}").unwrap();
        assert!((config.perception.vision_range - 200.0).abs() < f64::EPSILON);
        assert!((config.perception.view_angle - 120.0).abs() < f64::EPSILON);
        assert!((config.perception.hearing_range - 150.0).abs() < f64::EPSILON);
        assert!((config.perception.interaction_range - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.runtime.conversation_cooldown, 20);
        assert!((config.runtime.social_need_threshold - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.sandbox.timeout_secs, 5);
    }

    #[test]
    fn partial_yaml_overrides_only_named_keys() {
        let yaml = "
perception:
  vision_range: 80.0
runtime:
  tick_rate_hz: 2.0
";
        let config = GenesisConfig::parse(yaml).unwrap();
        assert!((config.perception.vision_range - 80.0).abs() < f64::EPSILON);
        assert!((config.perception.view_angle - 120.0).abs() < f64::EPSILON);
        assert_eq!(config.runtime.tick_interval(), Duration::from_millis(500));
    }

    #[test]
    fn zero_tick_rate_falls_back_to_one_hz() {
        let runtime = RuntimeConfig {
            tick_rate_hz: 0.0,
            ..RuntimeConfig::default()
        };
        assert_eq!(runtime.tick_interval(), Duration::from_secs(1));
    }
}
