//! Mode-specific `.env` loading and typed build options derived from it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{InlineError, Result};
use crate::mode::EnvironmentMode;

/// Prefix a variable must carry to be exposed to the build.
pub const DEFAULT_ENV_PREFIX: &str = "VITE_";

const CDN_KEY: &str = "VITE_OPEN_CDN";
const PORT_KEY: &str = "VITE_PORT";
const OPEN_KEY: &str = "VITE_OPEN";
const PUBLIC_PATH_KEY: &str = "VITE_PUBLIC_PATH";

/// Env files consulted for `mode`, lowest priority first.
pub fn env_files(mode: &EnvironmentMode) -> [String; 4] {
  [
    ".env".to_string(),
    ".env.local".to_string(),
    format!(".env.{mode}"),
    format!(".env.{mode}.local"),
  ]
}

/// Load prefixed variables from the env files in `root`, overlaid with the process environment.
pub fn load_env(root: &Path, mode: &EnvironmentMode, prefix: &str) -> Result<BTreeMap<String, String>> {
  load_env_with(root, mode, prefix, std::env::vars())
}

/// Same as [`load_env`] with an explicit set of process variables.
pub fn load_env_with<I>(
  root: &Path,
  mode: &EnvironmentMode,
  prefix: &str,
  process_vars: I,
) -> Result<BTreeMap<String, String>>
where
  I: IntoIterator<Item = (String, String)>,
{
  let mut vars = BTreeMap::new();

  for name in env_files(mode) {
    let path = root.join(&name);
    let entries = match dotenvy::from_path_iter(&path) {
      Ok(entries) => entries,
      Err(err) if err.not_found() => continue,
      Err(err) => return Err(InlineError::EnvFile { path, source: err }),
    };

    debug!(path = %path.display(), "loading env file");
    for entry in entries {
      let (key, value) = entry.map_err(|err| InlineError::EnvFile {
        path: path.clone(),
        source: err,
      })?;
      if key.starts_with(prefix) {
        vars.insert(key, value);
      }
    }
  }

  for (key, value) in process_vars {
    if key.starts_with(prefix) {
      vars.insert(key, value);
    }
  }

  Ok(vars)
}

/// Recognised build options, resolved once at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildEnv {
  /// Externalise dependencies and load them from a CDN.
  pub cdn_enabled: bool,
  /// Dev server port.
  pub port: u16,
  /// Open a browser when the dev server starts.
  pub auto_open: bool,
  /// Public base path for production builds.
  pub public_base_path: String,
}

impl Default for BuildEnv {
  fn default() -> Self {
    Self {
      cdn_enabled: false,
      port: 8888,
      auto_open: false,
      public_base_path: "/".into(),
    }
  }
}

impl BuildEnv {
  /// Parse the recognised keys out of a loaded variable map.
  ///
  /// Missing keys keep their defaults; present keys must parse as the expected type.
  pub fn from_vars(vars: &BTreeMap<String, String>) -> Result<Self> {
    let defaults = Self::default();

    Ok(Self {
      cdn_enabled: parse_json_bool(vars, CDN_KEY)?.unwrap_or(defaults.cdn_enabled),
      port: parse_port(vars)?.unwrap_or(defaults.port),
      auto_open: parse_json_bool(vars, OPEN_KEY)?.unwrap_or(defaults.auto_open),
      public_base_path: vars
        .get(PUBLIC_PATH_KEY)
        .cloned()
        .unwrap_or(defaults.public_base_path),
    })
  }
}

fn parse_json_bool(vars: &BTreeMap<String, String>, key: &str) -> Result<Option<bool>> {
  let Some(value) = vars.get(key) else {
    return Ok(None);
  };

  serde_json::from_str::<bool>(value.trim())
    .map(Some)
    .map_err(|_| invalid(key, value, "expected `true` or `false`"))
}

fn parse_port(vars: &BTreeMap<String, String>) -> Result<Option<u16>> {
  let Some(value) = vars.get(PORT_KEY) else {
    return Ok(None);
  };

  value
    .trim()
    .parse::<u16>()
    .map(Some)
    .map_err(|_| invalid(PORT_KEY, value, "expected a port number between 0 and 65535"))
}

fn invalid(key: &str, value: &str, reason: &str) -> InlineError {
  InlineError::EnvValue {
    key: key.to_string(),
    value: value.to_string(),
    reason: reason.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
      .iter()
      .map(|(key, value)| (key.to_string(), value.to_string()))
      .collect()
  }

  #[test]
  fn later_files_and_process_vars_take_priority() {
    let dir = tempdir().unwrap();
    fs::write(
      dir.path().join(".env"),
      "VITE_PORT=3000\nVITE_OPEN=false\nVITE_PUBLIC_PATH=/base/\nSECRET=hidden\n",
    )
    .unwrap();
    fs::write(dir.path().join(".env.development"), "VITE_PORT=4000\n").unwrap();
    fs::write(dir.path().join(".env.development.local"), "VITE_OPEN=true\n").unwrap();
    fs::write(dir.path().join(".env.production"), "VITE_PORT=9999\n").unwrap();

    let loaded = load_env_with(
      dir.path(),
      &EnvironmentMode::Development,
      DEFAULT_ENV_PREFIX,
      vec![
        ("VITE_PUBLIC_PATH".to_string(), "/override/".to_string()),
        ("PATH".to_string(), "/usr/bin".to_string()),
      ],
    )
    .unwrap();

    assert_eq!(
      loaded,
      vars(&[
        ("VITE_OPEN", "true"),
        ("VITE_PORT", "4000"),
        ("VITE_PUBLIC_PATH", "/override/"),
      ])
    );
  }

  #[test]
  fn missing_files_yield_empty_map() {
    let dir = tempdir().unwrap();
    let loaded = load_env_with(
      dir.path(),
      &EnvironmentMode::from("production"),
      DEFAULT_ENV_PREFIX,
      Vec::new(),
    )
    .unwrap();
    assert!(loaded.is_empty());
  }

  #[test]
  fn parses_recognised_options() {
    let env = BuildEnv::from_vars(&vars(&[
      ("VITE_OPEN_CDN", "true"),
      ("VITE_PORT", " 8080 "),
      ("VITE_OPEN", "false"),
      ("VITE_PUBLIC_PATH", "/admin/"),
    ]))
    .unwrap();

    assert_eq!(env, BuildEnv {
      cdn_enabled: true,
      port: 8080,
      auto_open: false,
      public_base_path: "/admin/".into(),
    });
  }

  #[test]
  fn missing_options_use_defaults() {
    assert_eq!(BuildEnv::from_vars(&BTreeMap::new()).unwrap(), BuildEnv::default());
  }

  #[test]
  fn rejects_non_boolean_flags() {
    let err = BuildEnv::from_vars(&vars(&[("VITE_OPEN", "yes")])).unwrap_err();
    match err {
      InlineError::EnvValue { key, value, .. } => {
        assert_eq!(key, "VITE_OPEN");
        assert_eq!(value, "yes");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn rejects_out_of_range_port() {
    let err = BuildEnv::from_vars(&vars(&[("VITE_PORT", "70000")])).unwrap_err();
    assert!(matches!(err, InlineError::EnvValue { key, .. } if key == "VITE_PORT"));
  }
}
