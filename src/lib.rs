#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod env;
pub mod error;
pub mod mode;
pub mod naming;
pub mod paths;
pub mod pipeline;
pub mod proxy;
pub mod resolved;
pub mod transform;

pub use config::ProjectConfig;
pub use env::{BuildEnv, load_env};
pub use error::{InlineError, Result};
pub use mode::{BuildCommand, EnvironmentMode};
pub use pipeline::{InlineAssetHook, PipelineBuilder, TransformHook, TransformPipeline};
pub use resolved::{ResolvedBuildConfig, resolve_build_config};
pub use transform::{
  AssetInlineTransform, InlineOptions, IoErrorPolicy, TransformOutput, TransformRequest,
  decode_default_export,
};
