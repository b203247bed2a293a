//! Dev-server proxy rules and their path rewriting.

use std::borrow::Cow;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{InlineError, Result};

/// A single proxy declaration forwarded to the dev server.
///
/// A `prefix` starting with `^` is treated as a regular expression; anything else matches as a
/// literal path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRule {
  /// Request path prefix or `^`-anchored pattern.
  pub prefix: String,
  /// Upstream origin requests are forwarded to.
  pub target: String,
  /// Proxy websocket upgrades.
  #[serde(default)]
  pub ws: bool,
  /// Rewrite the `Host` header to the target origin.
  #[serde(default)]
  pub change_origin: bool,
  /// Remove the matched prefix before forwarding.
  #[serde(default)]
  pub strip_prefix: bool,
}

impl ProxyRule {
  /// Compile the rule's pattern.
  pub fn compile(&self) -> Result<CompiledProxyRule<'_>> {
    let pattern = if self.prefix.starts_with('^') {
      self.prefix.clone()
    } else {
      format!("^{}", regex::escape(&self.prefix))
    };

    let pattern = Regex::new(&pattern).map_err(|err| InlineError::InvalidProxy {
      prefix: self.prefix.clone(),
      source: err,
    })?;

    Ok(CompiledProxyRule {
      rule: self,
      pattern,
    })
  }
}

/// A [`ProxyRule`] with its pattern compiled.
#[derive(Debug)]
pub struct CompiledProxyRule<'a> {
  rule: &'a ProxyRule,
  pattern: Regex,
}

impl CompiledProxyRule<'_> {
  /// Returns `true` when the request path is handled by this rule.
  pub fn matches(&self, path: &str) -> bool {
    self.pattern.is_match(path)
  }

  /// Path forwarded upstream for a matching request.
  pub fn rewrite<'p>(&self, path: &'p str) -> Cow<'p, str> {
    if self.rule.strip_prefix {
      self.pattern.replace(path, "")
    } else {
      Cow::Borrowed(path)
    }
  }

  /// Full upstream URL for a matching request.
  pub fn upstream_url(&self, path: &str) -> String {
    let rewritten = self.rewrite(path);
    let target = self.rule.target.trim_end_matches('/');
    if rewritten.is_empty() || rewritten.starts_with('/') {
      format!("{target}{rewritten}")
    } else {
      format!("{target}/{rewritten}")
    }
  }
}

/// Proxy rule used when a project does not declare its own.
pub fn default_proxy_rules() -> Vec<ProxyRule> {
  vec![ProxyRule {
    prefix: "/gitee".into(),
    target: "https://gitee.com".into(),
    ws: true,
    change_origin: true,
    strip_prefix: true,
  }]
}
