//! Plugin configuration

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Name of the per-folder destination list when nothing else is set.
pub const DEFAULT_FILE_NAME: &str = "extra-copies";

/// When the commit interceptor fans newly saved messages out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitPolicy {
    /// Copy right after every successful commit.
    #[default]
    PerCommit,
    /// Collect saved UIDs for the whole folder session and copy them
    /// once, when the folder is closed.
    Deferred,
}

impl CommitPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerCommit => "per-commit",
            Self::Deferred => "deferred",
        }
    }
}

impl fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-commit" | "commit" => Ok(Self::PerCommit),
            "deferred" | "close" => Ok(Self::Deferred),
            other => Err(Error::Config(format!("Invalid commit policy: {other}"))),
        }
    }
}

/// Extra-copies plugin configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtraCopiesConfig {
    /// File looked up in each folder's control or mailbox directory.
    pub file_name: String,
    pub policy: CommitPolicy,
}

impl Default for ExtraCopiesConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            policy: CommitPolicy::default(),
        }
    }
}

impl ExtraCopiesConfig {
    /// Load the plugin configuration from environment variables
    ///
    /// Reads from `.env` file if present. Optional (with defaults):
    /// - `EXTRA_COPIES_FILE` (default: `extra-copies`)
    /// - `EXTRA_COPIES_POLICY` (`per-commit` or `deferred`, default:
    ///   `per-commit`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let file_name =
            env::var("EXTRA_COPIES_FILE").unwrap_or_else(|_| DEFAULT_FILE_NAME.to_string());
        if file_name.is_empty() || file_name.contains('/') {
            return Err(Error::Config(format!(
                "Invalid EXTRA_COPIES_FILE: {file_name:?}"
            )));
        }

        let policy = match env::var("EXTRA_COPIES_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => CommitPolicy::default(),
        };

        Ok(Self { file_name, policy })
    }
}
