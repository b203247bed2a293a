//! Error type shared by the transform, pipeline and configuration helpers.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, InlineError>;

/// Failures surfaced by the library.
#[derive(Debug, Error)]
pub enum InlineError {
  /// Metadata query or content read failed for a candidate asset.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },

  /// An existing `.env` file could not be parsed.
  #[error("failed to load env file {}: {source}", path.display())]
  EnvFile {
    /// Path of the offending env file.
    path: PathBuf,
    /// Source parse error.
    source: dotenvy::Error,
  },

  /// An environment value was present but not of the expected type.
  #[error("invalid value {value:?} for {key}: {reason}")]
  EnvValue {
    /// Variable name.
    key: String,
    /// Raw value as loaded.
    value: String,
    /// Description of the expected type.
    reason: String,
  },

  /// A transform hook failed while running in the pipeline.
  #[error("transform hook `{hook}` failed: {source}")]
  Hook {
    /// Name of the failing hook.
    hook: String,
    /// Underlying error.
    source: Box<InlineError>,
  },

  /// Ordering hints between hooks form a cycle.
  #[error("transform hook ordering contains a cycle involving `{0}`")]
  HookCycle(String),

  /// A proxy rule pattern failed to compile.
  #[error("invalid proxy pattern {prefix:?}: {source}")]
  InvalidProxy {
    /// Pattern as configured.
    prefix: String,
    /// Source regex error.
    source: regex::Error,
  },

  /// Project configuration could not be read or parsed.
  #[error("invalid project configuration {}: {reason}", path.display())]
  Config {
    /// Path of the configuration file.
    path: PathBuf,
    /// Description of the problem.
    reason: String,
  },
}

impl InlineError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}
