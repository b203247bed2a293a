//! Assembly of the declarative bundler configuration handed to the host build tool.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::config::ProjectConfig;
use crate::env::BuildEnv;
use crate::mode::BuildCommand;
use crate::pipeline::INLINE_HOOK_NAME;
use crate::proxy::ProxyRule;

/// Plugins always registered, in order, ahead of the inline transform.
const BASE_PLUGINS: [&str; 3] = ["vue", "vue-setup-extend", "compression"];

/// Compile-time constants filled from package metadata variables.
const PACKAGE_CONSTANTS: [(&str, &str); 2] = [
  ("__NEXT_VERSION__", "npm_package_version"),
  ("__NEXT_NAME__", "npm_package_name"),
];

/// Plugin appended when CDN mode is enabled.
pub const CDN_PLUGIN: &str = "cdn-import";

/// Fully resolved configuration, serialised for the host build tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedBuildConfig {
  /// Plugin names in registration order.
  pub plugins: Vec<String>,
  /// Project root (directory holding `index.html`).
  pub root: String,
  /// Alias table with project-relative targets made absolute.
  pub alias: BTreeMap<String, String>,
  /// Public base path.
  pub base: String,
  /// Dependencies excluded from pre-bundling.
  pub optimize_deps_exclude: Vec<String>,
  /// Dev-server settings.
  pub server: ResolvedServer,
  /// Output settings.
  pub build: ResolvedOutput,
  /// Compile-time constants.
  pub define: BTreeMap<String, Value>,
  /// CSS options.
  pub css: ResolvedCss,
}

/// CSS section of [`ResolvedBuildConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCss {
  /// Options keyed by preprocessor language.
  pub preprocessor_options: PreprocessorOptions,
}

/// Per-language preprocessor options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreprocessorOptions {
  /// Plain CSS.
  pub css: CssPreprocessor,
}

/// Options for the plain CSS preprocessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssPreprocessor {
  /// Emit a leading `@charset` rule.
  pub charset: bool,
}

/// Dev-server section of [`ResolvedBuildConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedServer {
  /// Listen address.
  pub host: String,
  /// Listen port.
  pub port: u16,
  /// Open a browser on start.
  pub open: bool,
  /// Hot module replacement.
  pub hmr: bool,
  /// Proxy rules.
  pub proxy: Vec<ProxyRule>,
}

/// Output section of [`ResolvedBuildConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOutput {
  /// Output directory.
  pub out_dir: String,
  /// Chunk size warning limit in kB.
  pub chunk_size_warning_limit: u32,
  /// Shared chunk name template.
  pub chunk_file_names: String,
  /// Entry chunk name template.
  pub entry_file_names: String,
  /// Asset name template.
  pub asset_file_names: String,
  /// Fallback chunk for unrecognised `node_modules` files.
  pub vendor_chunk: String,
  /// Externalised packages; empty unless CDN mode is enabled.
  pub external: Vec<String>,
}

/// Resolve the build configuration from its explicit inputs.
///
/// `process_vars` supplies `npm_package_name` and `npm_package_version` for the version
/// constants; nothing is read from the ambient environment here.
pub fn resolve_build_config(
  project: &ProjectConfig,
  env: &BuildEnv,
  command: BuildCommand,
  root: &Path,
  process_vars: &BTreeMap<String, String>,
) -> ResolvedBuildConfig {
  let mut plugins: Vec<String> = BASE_PLUGINS.iter().map(|name| name.to_string()).collect();
  plugins.push(INLINE_HOOK_NAME.to_string());
  if env.cdn_enabled {
    plugins.push(CDN_PLUGIN.to_string());
  }

  let alias = project.aliases.resolved(root);

  let base = match command {
    BuildCommand::Serve => "./".to_string(),
    BuildCommand::Build => env.public_base_path.clone(),
  };

  let mut define = project.define.0.clone();
  for (constant, var) in PACKAGE_CONSTANTS {
    // An absent variable leaves the constant undefined rather than defining it as `null`.
    if let Some(value) = process_vars.get(var) {
      define.insert(constant.to_string(), json_string_constant(value));
    }
  }

  let output = &project.build;

  ResolvedBuildConfig {
    plugins,
    root: root.to_string_lossy().replace('\\', "/"),
    alias,
    base,
    optimize_deps_exclude: project.optimize_deps_exclude.0.clone(),
    server: ResolvedServer {
      host: project.server.host.clone(),
      port: env.port,
      open: env.auto_open,
      hmr: project.server.hmr,
      proxy: project.server.proxy.clone(),
    },
    build: ResolvedOutput {
      out_dir: output.out_dir.clone(),
      chunk_size_warning_limit: output.chunk_size_warning_limit,
      chunk_file_names: output.chunk_file_names.clone(),
      entry_file_names: output.entry_file_names.clone(),
      asset_file_names: output.asset_file_names.clone(),
      vendor_chunk: output.vendor_chunk.clone(),
      external: if env.cdn_enabled {
        output.cdn_externals.clone()
      } else {
        Vec::new()
      },
    },
    define,
    css: ResolvedCss {
      preprocessor_options: PreprocessorOptions {
        css: CssPreprocessor {
          charset: project.css.charset,
        },
      },
    },
  }
}

// Constants are substituted as source text, so strings are JSON-encoded twice.
fn json_string_constant(value: &str) -> Value {
  Value::String(Value::String(value.to_string()).to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn env() -> BuildEnv {
    BuildEnv {
      cdn_enabled: false,
      port: 8888,
      auto_open: true,
      public_base_path: "/admin/".into(),
    }
  }

  fn package_vars() -> BTreeMap<String, String> {
    BTreeMap::from([
      ("npm_package_name".to_string(), "vue-next-admin".to_string()),
      ("npm_package_version".to_string(), "2.4.33".to_string()),
    ])
  }

  #[test]
  fn serve_uses_relative_base() {
    let config = resolve_build_config(
      &ProjectConfig::default(),
      &env(),
      BuildCommand::Serve,
      Path::new("/srv/app"),
      &package_vars(),
    );

    assert_eq!(config.base, "./");
    assert_eq!(config.server.port, 8888);
    assert!(config.server.open);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.alias["/@"], "/srv/app/src");
    assert_eq!(
      "/@/utils/request".replacen("/@", &config.alias["/@"], 1),
      "/srv/app/src/utils/request"
    );
    assert_eq!(config.alias["vue-i18n"], "vue-i18n/dist/vue-i18n.cjs.js");
  }

  #[test]
  fn build_uses_public_path_and_lists_plugins() {
    let config = resolve_build_config(
      &ProjectConfig::default(),
      &env(),
      BuildCommand::Build,
      Path::new("/srv/app"),
      &package_vars(),
    );

    assert_eq!(config.base, "/admin/");
    assert_eq!(config.plugins, [
      "vue",
      "vue-setup-extend",
      "compression",
      INLINE_HOOK_NAME
    ]);
    assert!(config.build.external.is_empty());
  }

  #[test]
  fn cdn_mode_adds_plugin_and_externals() {
    let mut project = ProjectConfig::default();
    project.build.cdn_externals = vec!["vue".into(), "axios".into()];
    let env = BuildEnv {
      cdn_enabled: true,
      ..env()
    };

    let config = resolve_build_config(
      &project,
      &env,
      BuildCommand::Build,
      Path::new("/srv/app"),
      &BTreeMap::new(),
    );

    assert_eq!(config.plugins.last().map(String::as_str), Some(CDN_PLUGIN));
    assert_eq!(config.build.external, ["vue", "axios"]);
  }

  #[test]
  fn define_encodes_package_metadata() {
    let config = resolve_build_config(
      &ProjectConfig::default(),
      &env(),
      BuildCommand::Build,
      Path::new("/srv/app"),
      &package_vars(),
    );

    assert_eq!(config.define["__NEXT_VERSION__"], Value::String("\"2.4.33\"".into()));
    assert_eq!(config.define["__NEXT_NAME__"], Value::String("\"vue-next-admin\"".into()));
    assert_eq!(config.define["__VUE_I18N_LEGACY_API__"], Value::Bool(false));

    let without_package = resolve_build_config(
      &ProjectConfig::default(),
      &env(),
      BuildCommand::Build,
      Path::new("/srv/app"),
      &BTreeMap::new(),
    );
    assert!(!without_package.define.contains_key("__NEXT_VERSION__"));
    assert!(!without_package.define.contains_key("__NEXT_NAME__"));
    assert_eq!(without_package.define["__INTLIFY_PROD_DEVTOOLS__"], Value::Bool(false));
  }

  #[test]
  fn serialises_camel_case_sections() {
    let config = resolve_build_config(
      &ProjectConfig::default(),
      &env(),
      BuildCommand::Build,
      Path::new("/srv/app"),
      &BTreeMap::new(),
    );
    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(json["build"]["chunkSizeWarningLimit"], 1500);
    assert_eq!(json["build"]["assetFileNames"], "assets/[ext]/[name]-[hash].[ext]");
    assert_eq!(json["server"]["proxy"][0]["changeOrigin"], true);
    assert_eq!(json["optimizeDepsExclude"][0], "vue-demi");
    assert_eq!(json["css"]["preprocessorOptions"]["css"]["charset"], false);
  }
}
