//! Package source selection for the framework install.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::error::ConfigError;

/// Distribution name of the framework on the package index.
pub const DEFAULT_REQUIREMENT: &str = "seed-ai-framework";

/// Where the framework package is installed from.
///
/// Always an explicit configuration choice; the installer never guesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    /// A requirement resolved against the package index, e.g. `seed-ai-framework==0.1.0`.
    Registry { requirement: String },
    /// A version-control repository pinned to a ref.
    Vcs { repository: String, reference: String },
    /// A local source tree.
    Local { path: PathBuf },
}

impl Default for SourceSpec {
    fn default() -> Self {
        Self::Registry {
            requirement: DEFAULT_REQUIREMENT.to_string(),
        }
    }
}

impl SourceSpec {
    /// The single argument handed to `pip install`.
    #[must_use]
    pub fn pip_argument(&self) -> String {
        match self {
            Self::Registry { requirement } => requirement.clone(),
            Self::Vcs {
                repository,
                reference,
            } => format!("git+{repository}@{reference}"),
            Self::Local { path } => path.display().to_string(),
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry { requirement } => write!(f, "registry:{requirement}"),
            Self::Vcs { .. } => f.write_str(&self.pip_argument()),
            Self::Local { path } => write!(f, "path:{}", path.display()),
        }
    }
}

impl FromStr for SourceSpec {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        let invalid = || ConfigError::InvalidSource(raw.to_string());

        if let Some(rest) = value.strip_prefix("git+") {
            let (repository, reference) = rest.rsplit_once('@').ok_or_else(invalid)?;
            // `ssh://git@host/repo` without a ref would otherwise split on the user part.
            let has_path = repository
                .split_once("://")
                .is_some_and(|(_, tail)| tail.contains('/'));
            if !has_path || reference.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Vcs {
                repository: repository.to_string(),
                reference: reference.to_string(),
            });
        }

        if let Some(path) = value.strip_prefix("path:") {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::Local {
                path: PathBuf::from(path),
            });
        }
        if value.starts_with('/') || value.starts_with("./") || value.starts_with("../") {
            return Ok(Self::Local {
                path: PathBuf::from(value),
            });
        }

        let requirement = value.strip_prefix("registry:").unwrap_or(value);
        if requirement.is_empty() || requirement.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self::Registry {
            requirement: requirement.to_string(),
        })
    }
}
