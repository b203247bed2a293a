//! Per-file transform that replaces small image assets with an inlined data URL module.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{InlineError, Result};
use crate::mode::EnvironmentMode;
use crate::transform::data_url::{encode_data_url, render_default_export};

/// Default byte threshold at or below which assets are inlined.
pub const DEFAULT_THRESHOLD: u64 = 9096;

/// What to do when the metadata query or content read fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IoErrorPolicy {
  /// Return the I/O error to the caller, failing the build step.
  Propagate,
  /// Log a warning and leave the file to the default asset handling.
  #[default]
  Fallback,
}

/// Construction-time options for [`AssetInlineTransform`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InlineOptions {
  /// Path suffix a file must end with to be considered.
  pub extension: String,
  /// Largest file size, in bytes, that is still inlined.
  pub threshold: u64,
  /// MIME type written into the data URL.
  pub mime_type: String,
  /// Handling of filesystem failures.
  pub io_error_policy: IoErrorPolicy,
}

impl Default for InlineOptions {
  fn default() -> Self {
    Self {
      extension: ".svg".into(),
      threshold: DEFAULT_THRESHOLD,
      mime_type: "image/png".into(),
      io_error_policy: IoErrorPolicy::default(),
    }
  }
}

/// A single invocation offered by the host pipeline.
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
  /// Absolute path of the candidate file.
  pub path: &'a Path,
  /// Current module source as seen by the pipeline. The inline decision reads the file itself.
  pub code: &'a str,
  /// Mode the build is running in.
  pub mode: &'a EnvironmentMode,
}

/// Replacement module body produced by a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
  /// Generated module source.
  pub code: String,
}

/// Inlines small assets as `export default "data:..."` modules during development.
///
/// The transform is stateless between calls and never writes to disk; it is safe to share across
/// concurrently running pipeline tasks.
#[derive(Debug, Clone, Default)]
pub struct AssetInlineTransform {
  options: InlineOptions,
}

impl AssetInlineTransform {
  /// Create a transform with the provided options.
  pub fn new(options: InlineOptions) -> Self {
    Self { options }
  }

  /// Options this transform was constructed with.
  pub fn options(&self) -> &InlineOptions {
    &self.options
  }

  /// Decide and, when applicable, build the inlined module using async filesystem calls.
  ///
  /// Returns `Ok(None)` when the file should be left to default handling.
  pub async fn transform(&self, request: &TransformRequest<'_>) -> Result<Option<TransformOutput>> {
    if !self.is_candidate(request) {
      return Ok(None);
    }

    let outcome = self.inline_file(request.path).await;
    self.apply_io_policy(request.path, outcome)
  }

  /// Blocking variant of [`Self::transform`] for build scripts.
  pub fn transform_blocking(&self, request: &TransformRequest<'_>) -> Result<Option<TransformOutput>> {
    if !self.is_candidate(request) {
      return Ok(None);
    }

    let outcome = self.inline_file_blocking(request.path);
    self.apply_io_policy(request.path, outcome)
  }

  fn is_candidate(&self, request: &TransformRequest<'_>) -> bool {
    if !request.mode.is_development() {
      return false;
    }

    request
      .path
      .to_string_lossy()
      .ends_with(self.options.extension.as_str())
  }

  async fn inline_file(&self, path: &Path) -> Result<Option<TransformOutput>> {
    let size = tokio::fs::metadata(path)
      .await
      .map_err(|err| InlineError::io(path, err))?
      .len();
    if !self.within_threshold(path, size) {
      return Ok(None);
    }

    let bytes = tokio::fs::read(path)
      .await
      .map_err(|err| InlineError::io(path, err))?;
    Ok(Some(self.render(path, &bytes)))
  }

  fn inline_file_blocking(&self, path: &Path) -> Result<Option<TransformOutput>> {
    let size = fs::metadata(path)
      .map_err(|err| InlineError::io(path, err))?
      .len();
    if !self.within_threshold(path, size) {
      return Ok(None);
    }

    let bytes = fs::read(path).map_err(|err| InlineError::io(path, err))?;
    Ok(Some(self.render(path, &bytes)))
  }

  fn within_threshold(&self, path: &Path, size: u64) -> bool {
    if size > self.options.threshold {
      debug!(
        path = %path.display(),
        size,
        threshold = self.options.threshold,
        "asset above inline threshold"
      );
      return false;
    }
    true
  }

  fn render(&self, path: &Path, bytes: &[u8]) -> TransformOutput {
    info!(path = %path.display(), size = bytes.len(), "inlined asset");
    TransformOutput {
      code: render_default_export(&encode_data_url(&self.options.mime_type, bytes)),
    }
  }

  fn apply_io_policy(
    &self,
    path: &Path,
    outcome: Result<Option<TransformOutput>>,
  ) -> Result<Option<TransformOutput>> {
    match outcome {
      Err(err) if self.options.io_error_policy == IoErrorPolicy::Fallback => {
        warn!(path = %path.display(), error = %err, "asset inlining skipped");
        Ok(None)
      }
      other => other,
    }
  }
}
