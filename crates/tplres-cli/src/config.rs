//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `TPLRES_SOURCES__PATHS=a,b`,
//!    `TPLRES_SOURCES__STICKY=false`, `TPLRES_OUTPUT__FORMAT=json`, ...
//! 3. Config file (`--config`, `TPLRES_CONFIG`, or [`AppConfig::config_path`])
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::global::OutputFormat;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Template directories and resolution mode.
    pub sources: SourcesConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Template directories, asked in order.
    pub paths: Vec<PathBuf>,
    /// Remember which directory answered each name.
    pub sticky: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: OutputFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig {
                paths: Vec::new(),
                sticky: true,
            },
            output: OutputConfig {
                no_color: false,
                format: OutputFormat::Auto,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the config file, then `TPLRES_*`
    /// environment variables.
    ///
    /// `config_file` is the path the user passed via `--config` (or
    /// `TPLRES_CONFIG`).  An explicit file must exist; the default location
    /// is optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };
        Self::load_from(&path, required, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("TPLRES")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("sources.paths")
    }

    fn load_from(path: &Path, required: bool, env: Environment) -> anyhow::Result<Self> {
        debug!(path = %path.display(), required, "loading configuration");

        let defaults =
            Config::try_from(&Self::default()).context("Failed to encode default configuration")?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Toml).required(required))
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to read configuration from '{}'", path.display()))?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.tplres.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "tplres", "tplres")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".tplres.toml"))
    }

    /// Path of the file this run reads, honouring `--config`.
    pub fn active_path(config_file: Option<&PathBuf>) -> PathBuf {
        config_file.cloned().unwrap_or_else(Self::config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Environment source fed from a fixed map instead of the process env.
    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::environment().source(Some(source))
    }

    #[test]
    fn defaults_are_sticky_with_no_paths() {
        let cfg = AppConfig::default();
        assert!(cfg.sources.sticky);
        assert!(cfg.sources.paths.is_empty());
        assert!(!cfg.output.no_color);
    }

    #[test]
    fn missing_optional_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("absent.toml"), false, env(&[])).unwrap();
        assert!(cfg.sources.sticky);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(AppConfig::load_from(&dir.path().join("absent.toml"), true, env(&[])).is_err());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[sources]\npaths = [\"site\", \"defaults\"]\nsticky = false\n\n[output]\nformat = \"json\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path, true, env(&[])).unwrap();
        assert_eq!(
            cfg.sources.paths,
            [PathBuf::from("site"), PathBuf::from("defaults")]
        );
        assert!(!cfg.sources.sticky);
        assert_eq!(cfg.output.format, OutputFormat::Json);
        assert!(!cfg.output.no_color, "unset keys keep their default");
    }

    #[test]
    fn environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sources]\nsticky = true\n").unwrap();

        let cfg = AppConfig::load_from(
            &path,
            true,
            env(&[
                ("TPLRES_SOURCES__STICKY", "false"),
                ("TPLRES_SOURCES__PATHS", "a,b"),
            ]),
        )
        .unwrap();
        assert!(!cfg.sources.sticky);
        assert_eq!(cfg.sources.paths, [PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn active_path_prefers_explicit_file() {
        let explicit = PathBuf::from("/tmp/tplres.toml");
        assert_eq!(AppConfig::active_path(Some(&explicit)), explicit);
        assert!(!AppConfig::active_path(None).as_os_str().is_empty());
    }
}
