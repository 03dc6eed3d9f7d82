//! Changegate configuration with 3-layer resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// File the project config is read from, relative to the repo root.
pub const CONFIG_FILE: &str = "gate.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`GATE_*`)
/// 2. Project config (`gate.toml` in repo root)
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub files: FilesConfig,
    pub enforcement: EnforcementConfig,
    pub hotspots: HotspotConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            files: FilesConfig::default(),
            enforcement: EnforcementConfig::default(),
            hotspots: HotspotConfig::default(),
        }
    }
}

/// Which files are eligible for content inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Extensions (without dot) whose content is read into facts.
    pub content_extensions: Vec<String>,
    /// Per-file content cap in bytes; larger files contribute a
    /// change fact but no content fact.
    pub max_content_bytes: u64,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            content_extensions: [
                "swift", "kt", "kts", "ts", "tsx", "js", "jsx", "dart", "rs", "py", "rb", "go",
                "java", "cs", "php",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_content_bytes: 1_048_576,
        }
    }
}

/// Test-first enforcement thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcementConfig {
    /// Source files above which a change stops counting as a small
    /// slice and requires test evidence.
    pub max_slice_files: u32,
    /// Added source lines above which test evidence is required.
    pub max_slice_lines: u32,
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            max_slice_files: 5,
            max_slice_lines: 120,
        }
    }
}

/// Churn and hotspot ranking knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotConfig {
    /// History window for churn aggregation, in days.
    pub window_days: u32,
    /// Number of ranked entries reported.
    pub top_n: u32,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            top_n: 10,
        }
    }
}

impl GateConfig {
    /// Load configuration with 3-layer resolution.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_path = root.join(CONFIG_FILE);
        if project_path.exists() {
            let raw = std::fs::read_to_string(&project_path).map_err(|source| {
                ConfigError::Read {
                    path: project_path.clone(),
                    source,
                }
            })?;
            config = toml::from_str(&raw).map_err(|error| ConfigError::InvalidToml {
                path: project_path.clone(),
                message: error.to_string(),
            })?;
        }

        Self::apply_env_overrides(&mut config)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|error| ConfigError::InvalidToml {
            path: "<string>".into(),
            message: error.to_string(),
        })
    }

    fn apply_env_overrides(config: &mut Self) -> Result<(), ConfigError> {
        if let Some(value) = env_u32("GATE_MAX_SLICE_FILES")? {
            config.enforcement.max_slice_files = value;
        }
        if let Some(value) = env_u32("GATE_MAX_SLICE_LINES")? {
            config.enforcement.max_slice_lines = value;
        }
        if let Some(value) = env_u32("GATE_HOTSPOT_WINDOW_DAYS")? {
            config.hotspots.window_days = value;
        }
        if let Some(value) = env_u32("GATE_HOTSPOT_TOP_N")? {
            config.hotspots.top_n = value;
        }
        Ok(())
    }

    /// Validate the configuration values.
    pub fn validate(config: &Self) -> Result<(), ConfigError> {
        if config.hotspots.window_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "hotspots.window_days".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if config.hotspots.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                key: "hotspots.top_n".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn env_u32(key: &str) -> Result<Option<u32>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected an unsigned integer, got {raw:?}"),
            }),
        Err(_) => Ok(None),
    }
}
