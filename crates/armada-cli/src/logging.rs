//! Logging setup for the CLI.

use anyhow::Context as _;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` raises the default from
/// warnings-only to debug for the armada crates.
pub(crate) fn init(verbose: bool, color: bool) -> anyhow::Result<()> {
    let default_directives = if verbose {
        "warn,armada_core=debug,armada_session=debug,armada_dispatch=debug,armada_report=debug,armada_cli=debug"
    } else {
        "warn"
    };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives).context("invalid log filter")?,
    };

    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(verbose);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(())
}
