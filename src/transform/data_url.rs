//! Data URL encoding and the generated default-export module body.

use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;

const EXPORT_PREFIX: &str = "export default ";
const BASE64_MARKER: &str = ";base64,";

/// Encode raw bytes as a `data:<mime>;base64,<payload>` URL.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
  format!(
    "data:{mime_type}{BASE64_MARKER}{}",
    general_purpose::STANDARD.encode(bytes)
  )
}

/// Render a module whose only export is the given string as its default export.
///
/// The value is emitted as a JSON string literal so that it is also a valid JavaScript string.
pub fn render_default_export(value: &str) -> String {
  format!("{EXPORT_PREFIX}{}", Value::String(value.to_string()))
}

/// Recover the MIME type and bytes from a module produced by [`render_default_export`] over a
/// base64 data URL. Returns `None` for anything else.
pub fn decode_default_export(module: &str) -> Option<(String, Vec<u8>)> {
  let literal = module
    .trim()
    .strip_prefix(EXPORT_PREFIX)?
    .trim_end_matches(';')
    .trim();
  let url: String = serde_json::from_str(literal).ok()?;
  let (mime_type, payload) = url.strip_prefix("data:")?.split_once(BASE64_MARKER)?;
  let bytes = general_purpose::STANDARD.decode(payload).ok()?;
  Some((mime_type.to_string(), bytes))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encodes_svg_markup() {
    let url = encode_data_url("image/png", b"<svg>...</svg>");
    assert_eq!(url, "data:image/png;base64,PHN2Zz4uLi48L3N2Zz4=");
  }

  #[test]
  fn renders_single_default_export_without_trailing_newline() {
    let module = render_default_export("data:image/png;base64,AAAA");
    assert_eq!(module, r#"export default "data:image/png;base64,AAAA""#);
  }

  #[test]
  fn decodes_generated_module() {
    let bytes = [0u8, 159, 146, 150, 255, 10];
    let module = render_default_export(&encode_data_url("image/svg+xml", &bytes));

    let (mime_type, decoded) = decode_default_export(&module).unwrap();
    assert_eq!(mime_type, "image/svg+xml");
    assert_eq!(decoded, bytes);
  }

  #[test]
  fn rejects_modules_that_are_not_data_urls() {
    assert!(decode_default_export("export default \"/assets/icon.svg\"").is_none());
    assert!(decode_default_export("const x = 1;").is_none());
    assert!(decode_default_export("export default \"data:image/png;base64,@@\"").is_none());
  }
}
