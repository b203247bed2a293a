//! Command line entry point: inline a single asset or print the resolved build configuration.

mod logger;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use asset_inliner::{
  AssetInlineTransform, BuildCommand, BuildEnv, EnvironmentMode, InlineAssetHook, IoErrorPolicy,
  PipelineBuilder, ProjectConfig, decode_default_export, load_env, resolve_build_config,
};
use asset_inliner::naming::manual_chunk;
use asset_inliner::paths::resolve_alias;

#[derive(Debug, Parser)]
#[command(name = "asset-inliner", version, about)]
struct Cli {
  /// Enable debug logging.
  #[arg(short, long, global = true)]
  verbose: bool,
  /// Only log errors.
  #[arg(short, long, global = true)]
  quiet: bool,
  /// Disable coloured log output.
  #[arg(long, global = true)]
  no_color: bool,
  /// Project root containing `.env` files and `asset-inliner.json`.
  #[arg(long, global = true, default_value = ".")]
  root: PathBuf,
  /// Explicit configuration file; failures to read it are errors.
  #[arg(long, global = true)]
  config: Option<PathBuf>,
  /// Build mode.
  #[arg(long, global = true, default_value = "development")]
  mode: String,
  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Run the inline transform on one file and print the generated module.
  Inline {
    /// Asset to transform.
    file: PathBuf,
    /// Override the configured size threshold in bytes.
    #[arg(long)]
    threshold: Option<u64>,
    /// Fail on I/O errors instead of leaving the file unchanged.
    #[arg(long)]
    propagate_io_errors: bool,
    /// Decode the generated module and check it against the file contents.
    #[arg(long)]
    verify: bool,
  },
  /// Print the resolved bundler configuration as JSON.
  Config {
    /// Whether the host is serving or building.
    #[arg(long, value_enum, default_value_t = CommandArg::Serve)]
    command: CommandArg,
  },
  /// Show where an import specifier resolves and which output chunk it lands in.
  Resolve {
    /// Import specifier or module id.
    specifier: String,
  },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CommandArg {
  Serve,
  Build,
}

impl From<CommandArg> for BuildCommand {
  fn from(value: CommandArg) -> Self {
    match value {
      CommandArg::Serve => BuildCommand::Serve,
      CommandArg::Build => BuildCommand::Build,
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  logger::init_logger(cli.verbose, cli.quiet, cli.no_color);

  let root = fs::canonicalize(&cli.root)
    .with_context(|| format!("failed to resolve project root {}", cli.root.display()))?;
  let project = match &cli.config {
    Some(path) => ProjectConfig::load(path)?,
    None => ProjectConfig::discover(&root),
  };
  let mode = EnvironmentMode::from(cli.mode.as_str());

  match cli.command {
    Command::Inline {
      file,
      threshold,
      propagate_io_errors,
      verify,
    } => {
      let mut options = project.inline.options.clone();
      if let Some(threshold) = threshold {
        options.threshold = threshold;
      }
      if propagate_io_errors {
        options.io_error_policy = IoErrorPolicy::Propagate;
      }

      let path = std::path::absolute(&file)
        .with_context(|| format!("failed to resolve {}", file.display()))?;
      run_inline(
        AssetInlineTransform::new(options),
        mode,
        project.inline.run_before.clone(),
        &path,
        verify,
      )
      .await
    }
    Command::Config { command } => print_config(&project, &root, &mode, command.into()),
    Command::Resolve { specifier } => {
      print_resolution(&project, &root, &specifier);
      Ok(())
    }
  }
}

async fn run_inline(
  transform: AssetInlineTransform,
  mode: EnvironmentMode,
  run_before: Vec<String>,
  path: &Path,
  verify: bool,
) -> Result<()> {
  let pipeline = PipelineBuilder::new()
    .register(InlineAssetHook::new(transform, mode).with_run_before(run_before))
    .build()?;

  let id = path.to_string_lossy();
  let Some(module) = pipeline.run("", &id).await? else {
    info!(path = %path.display(), "left unchanged");
    return Ok(());
  };

  if verify {
    let original =
      fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    match decode_default_export(&module) {
      Some((_, decoded)) if decoded == original => {}
      _ => bail!("generated module for {} does not round-trip", path.display()),
    }
  }

  println!("{module}");
  Ok(())
}

fn print_config(
  project: &ProjectConfig,
  root: &Path,
  mode: &EnvironmentMode,
  command: BuildCommand,
) -> Result<()> {
  for rule in &project.server.proxy {
    rule.compile()?;
  }

  let vars = load_env(root, mode, &project.env_prefix.0)?;
  let env = BuildEnv::from_vars(&vars)?;
  let process_vars: BTreeMap<String, String> = std::env::vars()
    .filter(|(key, _)| key.starts_with("npm_package_"))
    .collect();

  let resolved = resolve_build_config(project, &env, command, root, &process_vars);
  println!(
    "{}",
    serde_json::to_string_pretty(&resolved).context("failed to serialise configuration")?
  );
  Ok(())
}

fn print_resolution(project: &ProjectConfig, root: &Path, specifier: &str) {
  let aliases = project.aliases.resolved(root);
  let resolved = resolve_alias(&aliases, specifier).unwrap_or_else(|| specifier.to_string());
  let chunk = manual_chunk(&resolved, &project.build.vendor_chunk);

  println!("{resolved}");
  match chunk {
    Some(chunk) => println!("chunk: {chunk}"),
    None => println!("chunk: (bundler default)"),
  }
}
