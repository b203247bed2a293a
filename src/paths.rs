//! Alias table resolution for import specifiers.

use std::collections::BTreeMap;
use std::path::Path;

/// Resolve an alias target against the project root.
///
/// Targets starting with `./` are project-relative and become absolute paths; everything else
/// (bare package specifiers) is returned unchanged. Resolved paths use forward slashes and carry no
/// trailing slash.
pub fn resolve_alias_target(root: &Path, target: &str) -> String {
  match target.strip_prefix("./") {
    Some(relative) => {
      let resolved = root.join(relative).to_string_lossy().replace('\\', "/");
      match resolved.trim_end_matches('/') {
        "" => "/".to_string(),
        trimmed => trimmed.to_string(),
      }
    }
    None => target.to_string(),
  }
}

/// Rewrite an import specifier through the alias table. The longest matching key wins.
pub fn resolve_alias(aliases: &BTreeMap<String, String>, specifier: &str) -> Option<String> {
  aliases
    .iter()
    .filter(|(key, _)| specifier_matches(specifier, key))
    .max_by_key(|(key, _)| key.len())
    .map(|(key, target)| join_alias(target, &specifier[key.len()..]))
}

fn join_alias(target: &str, rest: &str) -> String {
  if target.ends_with('/') && rest.starts_with('/') {
    format!("{target}{}", &rest[1..])
  } else {
    format!("{target}{rest}")
  }
}

fn specifier_matches(specifier: &str, key: &str) -> bool {
  match specifier.strip_prefix(key) {
    Some(rest) => rest.is_empty() || key.ends_with('/') || rest.starts_with('/'),
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn aliases() -> BTreeMap<String, String> {
    BTreeMap::from([
      ("/@".to_string(), "/app/src".to_string()),
      ("vue-i18n".to_string(), "vue-i18n/dist/vue-i18n.cjs.js".to_string()),
      ("/@/components".to_string(), "/shared/components".to_string()),
    ])
  }

  #[test]
  fn resolves_relative_targets_with_forward_slashes() {
    assert_eq!(resolve_alias_target(Path::new("/app"), "./src/"), "/app/src");
    assert_eq!(resolve_alias_target(Path::new("/app"), "./src"), "/app/src");
    assert_eq!(resolve_alias_target(Path::new("/"), "./"), "/");
    assert_eq!(
      resolve_alias_target(Path::new("/app"), "vue-i18n/dist/vue-i18n.cjs.js"),
      "vue-i18n/dist/vue-i18n.cjs.js"
    );
  }

  #[test]
  fn rewrites_exact_and_prefixed_specifiers() {
    let aliases = aliases();
    assert_eq!(
      resolve_alias(&aliases, "vue-i18n").as_deref(),
      Some("vue-i18n/dist/vue-i18n.cjs.js")
    );
    assert_eq!(
      resolve_alias(&aliases, "/@/utils/request").as_deref(),
      Some("/app/src/utils/request")
    );
  }

  #[test]
  fn prefers_longest_alias() {
    assert_eq!(
      resolve_alias(&aliases(), "/@/components/Button.vue").as_deref(),
      Some("/shared/components/Button.vue")
    );
  }

  #[test]
  fn does_not_match_partial_package_names() {
    assert_eq!(resolve_alias(&aliases(), "vue-i18n-extra"), None);
    assert_eq!(resolve_alias(&aliases(), "./local"), None);
  }
}
