//! Application settings and paths.
//!
//! Manages XDG-compliant paths for the settings file and the result artifact.

use crate::cli::OutputFormat;
use crate::config::ProbeTiming;
use crate::error::{ConfigError, ConfigResult};
use crate::scanner::DEFAULT_CONCURRENCY;
use crate::types::local::DEFAULT_QUICK_MASK;
use crate::types::PortList;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the flat result artifact.
pub const RESULT_FILENAME: &str = "scan.results";

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/qdps)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/qdps)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Locate the XDG directories and make sure they exist.
    pub fn discover() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "qdps", "qdps").ok_or(ConfigError::DirectoryNotFound)?;

        let paths = Self {
            config_dir: project.config_dir().to_path_buf(),
            data_dir: project.data_dir().to_path_buf(),
        };

        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the default path of the result artifact.
    pub fn results_file(&self) -> PathBuf {
        self.data_dir.join(RESULT_FILENAME)
    }
}

/// Application-wide settings.
///
/// Every field has a default, so a partial settings file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Ports probed when none are given on the command line.
    pub default_ports: Vec<u16>,
    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
    /// Poll interval in milliseconds.
    pub tick_ms: u64,
    /// Maximum number of probes in flight.
    pub concurrency: usize,
    /// Prefix length used by quick subnet scans.
    pub quick_mask: u8,
    /// Default output format.
    pub output_format: OutputFormat,
    /// Override for the result artifact location.
    pub results_file: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_ports: vec![PortList::DEFAULT_PORT],
            timeout_ms: ProbeTiming::DEFAULT_TIMEOUT_MS,
            tick_ms: ProbeTiming::DEFAULT_TICK_MS,
            concurrency: DEFAULT_CONCURRENCY,
            quick_mask: DEFAULT_QUICK_MASK,
            output_format: OutputFormat::Plain,
            results_file: None,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, or defaults if absent.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let file = paths.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to a file.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.default_ports, vec![1688]);
        assert_eq!(settings.timeout_ms, 1000);
        assert_eq!(settings.tick_ms, 100);
        assert_eq!(settings.quick_mask, 24);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "timeout_ms": 250, "output_format": "json" }"#).unwrap();

        let settings = AppSettings::load_from(&path).unwrap();
        assert_eq!(settings.timeout_ms, 250);
        assert_eq!(settings.tick_ms, 100);
        assert_eq!(settings.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = AppSettings {
            default_ports: vec![1688, 8080],
            ..AppSettings::default()
        };
        settings.save_to(&path).unwrap();

        let loaded = AppSettings::load_from(&path).unwrap();
        assert_eq!(loaded.default_ports, vec![1688, 8080]);
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            AppSettings::load_from(&path),
            Err(ConfigError::InvalidFormat(_))
        ));
    }
}
