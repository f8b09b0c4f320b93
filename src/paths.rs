//! XDG-compliant path resolution for wsc-asp.
//!
//! [`WscPaths`] locates the default config file and the directory that
//! receives failing solver programs and debug artifacts.

use std::path::PathBuf;

use crate::config::{ConfigError, ConfigResult};

const APP_DIR: &str = "wsc-asp";

/// Global XDG directories.
#[derive(Debug, Clone)]
pub struct WscPaths {
    /// `$XDG_CONFIG_HOME/wsc-asp/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/wsc-asp/`
    pub data_dir: PathBuf,
    /// `$XDG_STATE_HOME/wsc-asp/`
    pub state_dir: PathBuf,
}

impl WscPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> ConfigResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join(APP_DIR);

        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/share"))
            .join(APP_DIR);

        let state_dir = std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/state"))
            .join(APP_DIR);

        Ok(Self {
            config_dir,
            data_dir,
            state_dir,
        })
    }

    /// Path to the default config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Directory for failing programs and debug artifacts.
    pub fn debug_dir(&self) -> PathBuf {
        self.state_dir.join("debug")
    }

    /// Default location of the knowledge-graph record store.
    pub fn graph_records(&self) -> PathBuf {
        self.data_dir.join("graph").join("records.jsonl")
    }

    /// Default location of the knowledge-graph node index.
    pub fn graph_index(&self) -> PathBuf {
        self.data_dir.join("graph").join("node_locations.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_paths_use_app_dir() {
        // Reads the environment without mutating it (unsafe in edition 2024).
        let Ok(paths) = WscPaths::resolve() else {
            return;
        };
        assert!(paths.config_dir.ends_with(APP_DIR));
        assert!(paths.state_dir.ends_with(APP_DIR));
        assert!(paths.config_file().starts_with(&paths.config_dir));
    }

    #[test]
    fn derived_paths() {
        let paths = WscPaths {
            config_dir: PathBuf::from("/cfg/wsc-asp"),
            data_dir: PathBuf::from("/data/wsc-asp"),
            state_dir: PathBuf::from("/state/wsc-asp"),
        };
        assert_eq!(paths.config_file(), PathBuf::from("/cfg/wsc-asp/config.toml"));
        assert_eq!(paths.debug_dir(), PathBuf::from("/state/wsc-asp/debug"));
        assert_eq!(
            paths.graph_index(),
            PathBuf::from("/data/wsc-asp/graph/node_locations.json")
        );
    }
}
