//! Build mode and command descriptors passed in by the host build.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mode string the host build runs under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnvironmentMode {
  /// Local development (`"development"`).
  Development,
  /// Any other mode, e.g. `"production"` or `"staging"`.
  Other(String),
}

impl EnvironmentMode {
  /// Returns `true` for the development mode.
  pub fn is_development(&self) -> bool {
    matches!(self, Self::Development)
  }

  /// Mode name as used in env file suffixes.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Development => "development",
      Self::Other(name) => name,
    }
  }
}

impl From<&str> for EnvironmentMode {
  fn from(value: &str) -> Self {
    match value {
      "development" => Self::Development,
      other => Self::Other(other.to_string()),
    }
  }
}

impl fmt::Display for EnvironmentMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Whether the host is serving (dev server) or producing a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildCommand {
  /// Dev server.
  Serve,
  /// Production build.
  Build,
}
