//! Project configuration loader describing inline, dev-server and output settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::env::DEFAULT_ENV_PREFIX;
use crate::error::{InlineError, Result};
use crate::paths::resolve_alias_target;
use crate::pipeline::DEFAULT_RUN_BEFORE;
use crate::proxy::{ProxyRule, default_proxy_rules};
use crate::transform::InlineOptions;

/// File name looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "asset-inliner.json";

/// Discoverable project configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
  /// Settings for the inline transform.
  pub inline: InlineSettings,
  /// Prefix env variables must carry to be loaded.
  pub env_prefix: EnvPrefix,
  /// Import specifier aliases; `./` targets are project-relative.
  pub aliases: Aliases,
  /// Dev-server settings.
  pub server: ServerSettings,
  /// Production output settings.
  pub build: OutputSettings,
  /// Dependencies excluded from pre-bundling.
  pub optimize_deps_exclude: OptimizeDepsExclude,
  /// Compile-time constants, emitted as JSON.
  pub define: Defines,
  /// CSS preprocessing options.
  pub css: CssSettings,
}

/// Options passed to the plain CSS preprocessor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CssSettings {
  /// Emit a leading `@charset` rule.
  pub charset: bool,
}

/// Inline transform options plus the hooks it must run before.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InlineSettings {
  /// Options handed to the transform.
  #[serde(flatten)]
  pub options: InlineOptions,
  /// Hooks the inline transform is ordered ahead of.
  pub run_before: Vec<String>,
}

impl Default for InlineSettings {
  fn default() -> Self {
    Self {
      options: InlineOptions::default(),
      run_before: vec![DEFAULT_RUN_BEFORE.to_string()],
    }
  }
}

/// Env prefix wrapper so a missing key falls back to [`DEFAULT_ENV_PREFIX`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EnvPrefix(pub String);

impl Default for EnvPrefix {
  fn default() -> Self {
    Self(DEFAULT_ENV_PREFIX.to_string())
  }
}

/// Alias table with the project's default entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Aliases(pub BTreeMap<String, String>);

impl Default for Aliases {
  fn default() -> Self {
    Self(BTreeMap::from([
      ("/@".to_string(), "./src/".to_string()),
      (
        "vue-i18n".to_string(),
        "vue-i18n/dist/vue-i18n.cjs.js".to_string(),
      ),
    ]))
  }
}

impl Aliases {
  /// Alias table with project-relative targets resolved against `root`.
  pub fn resolved(&self, root: &Path) -> BTreeMap<String, String> {
    self
      .0
      .iter()
      .map(|(key, target)| (key.clone(), resolve_alias_target(root, target)))
      .collect()
  }
}

/// Pre-bundling exclusions with the project's default entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct OptimizeDepsExclude(pub Vec<String>);

impl Default for OptimizeDepsExclude {
  fn default() -> Self {
    Self(vec!["vue-demi".to_string()])
  }
}

/// Compile-time constants with the project's default flags.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Defines(pub BTreeMap<String, Value>);

impl Default for Defines {
  fn default() -> Self {
    Self(BTreeMap::from([
      ("__VUE_I18N_LEGACY_API__".to_string(), Value::Bool(false)),
      ("__VUE_I18N_FULL_INSTALL__".to_string(), Value::Bool(false)),
      ("__INTLIFY_PROD_DEVTOOLS__".to_string(), Value::Bool(false)),
    ]))
  }
}

/// Dev-server settings not driven by env variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
  /// Address the dev server listens on.
  pub host: String,
  /// Enable hot module replacement.
  pub hmr: bool,
  /// Proxy rules, evaluated in order.
  pub proxy: Vec<ProxyRule>,
}

impl Default for ServerSettings {
  fn default() -> Self {
    Self {
      host: "0.0.0.0".into(),
      hmr: true,
      proxy: default_proxy_rules(),
    }
  }
}

/// Production output layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputSettings {
  /// Output directory relative to the project root.
  pub out_dir: String,
  /// Chunk size, in kB, above which the bundler warns.
  pub chunk_size_warning_limit: u32,
  /// Template for shared chunk file names.
  pub chunk_file_names: String,
  /// Template for entry chunk file names.
  pub entry_file_names: String,
  /// Template for emitted asset file names.
  pub asset_file_names: String,
  /// Chunk for `node_modules` files without a recognisable package directory.
  pub vendor_chunk: String,
  /// Packages loaded from a CDN when CDN mode is enabled.
  pub cdn_externals: Vec<String>,
}

impl Default for OutputSettings {
  fn default() -> Self {
    Self {
      out_dir: "dist".into(),
      chunk_size_warning_limit: 1500,
      chunk_file_names: "assets/js/[name]-[hash].js".into(),
      entry_file_names: "assets/js/[name]-[hash].js".into(),
      asset_file_names: "assets/[ext]/[name]-[hash].[ext]".into(),
      vendor_chunk: "vender".into(),
      cdn_externals: Vec::new(),
    }
  }
}

impl ProjectConfig {
  /// Attempt to load configuration from the provided project root.
  ///
  /// When the configuration file does not exist or fails to parse we fall back to default
  /// values so callers can keep operating with the project's conventional layout.
  pub fn discover(root: &Path) -> Self {
    let candidate = root.join(DEFAULT_CONFIG_FILE);
    Self::from_path(&candidate).unwrap_or_default()
  }

  /// Read configuration from a specific JSON file, ignoring failures.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// Read configuration from an explicitly requested file, reporting failures.
  pub fn load(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path).map_err(|err| InlineError::Config {
      path: path.to_path_buf(),
      reason: err.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|err| InlineError::Config {
      path: path.to_path_buf(),
      reason: err.to_string(),
    })
  }

  /// Output directory resolved against the project root.
  pub fn out_dir_path(&self, root: &Path) -> PathBuf {
    root.join(&self.build.out_dir)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::transform::IoErrorPolicy;
  use tempfile::tempdir;

  #[test]
  fn discover_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    assert!(!ProjectConfig::default().css.charset);
    assert_eq!(ProjectConfig::discover(dir.path()), ProjectConfig::default());

    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{ not json").unwrap();
    assert_eq!(ProjectConfig::discover(dir.path()), ProjectConfig::default());
  }

  #[test]
  fn partial_files_keep_remaining_defaults() {
    let dir = tempdir().unwrap();
    fs::write(
      dir.path().join(DEFAULT_CONFIG_FILE),
      r#"{
        "inline": { "threshold": 4096, "extension": ".png", "ioErrorPolicy": "propagate" },
        "server": { "hmr": false },
        "css": { "charset": true },
        "build": { "outDir": "public/build", "cdnExternals": ["vue"] }
      }"#,
    )
    .unwrap();

    let config = ProjectConfig::discover(dir.path());
    assert_eq!(config.inline.options.threshold, 4096);
    assert_eq!(config.inline.options.extension, ".png");
    assert_eq!(config.inline.options.mime_type, "image/png");
    assert_eq!(config.inline.options.io_error_policy, IoErrorPolicy::Propagate);
    assert_eq!(config.inline.run_before, vec![DEFAULT_RUN_BEFORE.to_string()]);
    assert!(!config.server.hmr);
    assert!(config.css.charset);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.proxy, default_proxy_rules());
    assert_eq!(config.build.cdn_externals, vec!["vue".to_string()]);
    assert_eq!(config.build.chunk_size_warning_limit, 1500);
    assert_eq!(config.env_prefix, EnvPrefix::default());
    assert_eq!(
      config.out_dir_path(dir.path()),
      dir.path().join("public/build")
    );
  }

  #[test]
  fn load_reports_parse_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.json");
    fs::write(&path, r#"{ "build": { "chunkSizeWarningLimit": "big" } }"#).unwrap();

    let err = ProjectConfig::load(&path).unwrap_err();
    assert!(matches!(err, InlineError::Config { path: failed, .. } if failed == path));
  }

  #[test]
  fn load_reports_missing_file() {
    let dir = tempdir().unwrap();
    assert!(ProjectConfig::load(&dir.path().join("absent.json")).is_err());
  }
}
