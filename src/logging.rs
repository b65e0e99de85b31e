//! Diagnostic logging for `nvd-check`.
//!
//! Diagnostics (settings applied, lifecycle transitions, feed downloads) go to
//! stderr. Stdout is reserved for the status line, the findings and the summary,
//! so `nvd-check check cfg.json > findings.txt` captures only the check result.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber from the `--log-level` and `--log-format` flags.
///
/// `RUST_LOG`, when set, replaces `level` so single modules can be traced
/// (`RUST_LOG=nvd_check::engine=debug`). `format` is `"pretty"` for a terminal
/// or `"json"` for CI log collectors. Called once from `main`.
pub fn init_tracing(level: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let output = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        "json" => registry
            .with(output.json().with_current_span(false))
            .try_init(),
        "pretty" => registry.with(output.pretty().with_target(false)).try_init(),
        other => anyhow::bail!("unknown log format '{other}', expected 'json' or 'pretty'"),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to initialize {format} log output: {e}"))
}
