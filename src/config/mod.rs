//! Configuration types for the survey pipeline.
//!
//! The configuration is constructed once per invocation and passed by
//! reference to every operation; nothing in the pipeline mutates it.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Filename conventions for capture files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Marker preceding the extension on RGB frames
    #[serde(default = "default_rgb_marker")]
    pub rgb_marker: String,

    /// Extension of RGB frames
    #[serde(default = "default_rgb_extension")]
    pub rgb_extension: String,

    /// Marker preceding the band token on multispectral files
    #[serde(default = "default_ms_marker")]
    pub ms_marker: String,

    /// Extension of multispectral band files
    #[serde(default = "default_ms_extension")]
    pub ms_extension: String,
}

fn default_rgb_marker() -> String {
    "_D".to_string()
}

fn default_rgb_extension() -> String {
    "JPG".to_string()
}

fn default_ms_marker() -> String {
    "_MS_".to_string()
}

fn default_ms_extension() -> String {
    "TIF".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            rgb_marker: default_rgb_marker(),
            rgb_extension: default_rgb_extension(),
            ms_marker: default_ms_marker(),
            ms_extension: default_ms_extension(),
        }
    }
}

/// Configuration for route scanning and capture grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Window in seconds within which sibling band files count as one
    /// capture. Zero requires exact timestamp equality.
    #[serde(default)]
    pub timestamp_tolerance_secs: i64,

    /// Include incomplete multi-band captures in prepared manifests.
    /// Incomplete captures are always reported either way.
    #[serde(default = "default_include_incomplete")]
    pub include_incomplete: bool,
}

fn default_include_incomplete() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timestamp_tolerance_secs: 0,
            include_incomplete: default_include_incomplete(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub scan: ScanConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_naming_config() {
        let config = NamingConfig::default();
        assert_eq!(config.rgb_marker, "_D");
        assert_eq!(config.ms_marker, "_MS_");
    }

    #[test]
    fn test_default_scan_config_is_exact_match() {
        let config = PipelineConfig::default();
        assert_eq!(config.scan.timestamp_tolerance_secs, 0);
        assert!(config.scan.include_incomplete);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PipelineConfig =
            serde_yaml::from_str("scan:\n  timestamp_tolerance_secs: 2\n").unwrap();
        assert_eq!(config.scan.timestamp_tolerance_secs, 2);
        assert_eq!(config.naming.rgb_extension, "JPG");
    }

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = PipelineConfig::default();
        config.scan.timestamp_tolerance_secs = 1;
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.scan.timestamp_tolerance_secs, 1);
    }
}
