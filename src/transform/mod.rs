//! Asset transforms applied to individual files offered by the host pipeline.
//!
//! `inline` holds the size and mode checks, `data_url` the encoding of the generated module so
//! it can be verified independently of the filesystem.

mod data_url;
mod inline;

pub use data_url::{decode_default_export, encode_data_url, render_default_export};
pub use inline::{
  AssetInlineTransform, DEFAULT_THRESHOLD, InlineOptions, IoErrorPolicy, TransformOutput,
  TransformRequest,
};
