//! Framework configuration defaults and installer settings.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::layout::BaseLayout;
use crate::domain::source::SourceSpec;

// ── Framework config schema ──────────────────────────────────────────────────

/// Default `config/config.yaml` written by the base-layout stage.
///
/// The installer only seeds this file; the framework owns its contents
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    pub version: String,
    pub runtime: RuntimeConfig,
    pub api: ApiConfig,
    pub agents: AgentsConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub max_agents: u32,
    pub task_concurrency: u32,
    pub log_level: String,
}

/// API credentials, empty until the user fills them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub brave_api_key: String,
    pub github_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentsConfig {
    pub default_capabilities: Vec<String>,
    pub max_memory_mb: u32,
    pub startup_timeout_sec: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub port: u16,
    pub theme: String,
    pub auto_launch: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            runtime: RuntimeConfig {
                max_agents: 10,
                task_concurrency: 5,
                log_level: "INFO".to_string(),
            },
            api: ApiConfig::default(),
            agents: AgentsConfig {
                default_capabilities: vec![
                    "basic_reasoning".to_string(),
                    "task_planning".to_string(),
                ],
                max_memory_mb: 1024,
                startup_timeout_sec: 30,
            },
            dashboard: DashboardConfig {
                port: 8501,
                theme: "dark".to_string(),
                auto_launch: true,
            },
        }
    }
}

// ── Installer settings ───────────────────────────────────────────────────────

/// Resolved installer settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSettings {
    /// Base path, `~/.seed` unless `SEED_HOME` is set.
    pub layout: BaseLayout,
    /// Package source for the framework.
    pub source: SourceSpec,
    /// Directory the launcher shim is written to.
    pub bin_dir: PathBuf,
    /// The user's home directory; shell profiles live here.
    pub user_home: PathBuf,
}

impl InstallerSettings {
    /// Resolve settings from raw (possibly unset) values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHome`] when the user home is unknown (shell
    /// profiles are resolved against it), and [`ConfigError::InvalidSource`]
    /// when the package source cannot be parsed.
    pub fn resolve(
        user_home: Option<PathBuf>,
        base: Option<PathBuf>,
        source: Option<&str>,
        bin_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let user_home = user_home.ok_or(ConfigError::NoHome)?;
        let base = base
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| user_home.join(".seed"));
        let layout = BaseLayout::new(base);
        let source = match source.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse()?,
            None => SourceSpec::default(),
        };
        let bin_dir = bin_dir
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| layout.default_bin_dir());
        Ok(Self {
            layout,
            source,
            bin_dir,
            user_home,
        })
    }
}
