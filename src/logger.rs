//! Logging setup for the command line tool.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// `--verbose` wins over `--quiet`; without either, `RUST_LOG` is honoured and the default is
/// `info` for this crate. Logs go to stderr so generated modules on stdout stay clean.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
  let filter = if verbose {
    EnvFilter::new("asset_inliner=debug")
  } else if quiet {
    EnvFilter::new("asset_inliner=error")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("asset_inliner=info"))
  };

  let fmt_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_level(true)
    .with_ansi(!no_color)
    .compact();

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt_layer)
    .init();
}
