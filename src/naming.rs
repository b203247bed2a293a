//! Output file naming: template substitution and vendor chunk assignment.

const NODE_MODULES_SEGMENT: &str = "/node_modules/";

/// Substitute `[name]`, `[hash]` and `[ext]` placeholders in an output file name template.
pub fn render_file_name(template: &str, name: &str, hash: &str, ext: &str) -> String {
  template
    .replace("[name]", name)
    .replace("[hash]", hash)
    .replace("[ext]", ext)
}

/// Chunk a module id should be grouped into.
///
/// Modules under `node_modules` are grouped per package: the first directory following a
/// `/node_modules/` segment that is not a `.pnpm` store entry. When no package directory can be
/// found the module goes to `vendor_chunk`. Modules outside `node_modules` are left to the
/// bundler (`None`).
pub fn manual_chunk(id: &str, vendor_chunk: &str) -> Option<String> {
  if !id.contains("node_modules") {
    return None;
  }

  let package = id
    .match_indices(NODE_MODULES_SEGMENT)
    .filter_map(|(index, _)| package_after(&id[index + NODE_MODULES_SEGMENT.len()..]))
    .next();

  Some(package.unwrap_or(vendor_chunk).to_string())
}

fn package_after(rest: &str) -> Option<&str> {
  // Any single character followed by `pnpm`, so `.pnpm` store directories are skipped.
  if rest.chars().skip(1).take(4).eq("pnpm".chars()) {
    return None;
  }

  let (package, _) = rest.split_once('/')?;
  (!package.is_empty()).then_some(package)
}
