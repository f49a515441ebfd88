//! Logging setup on the `tracing` ecosystem.
//!
//! `--verbose` raises philtographer crates to debug, `--quiet` drops to
//! errors only, and `RUST_LOG` overrides everything when neither flag is
//! set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("philt_cli=debug,philt_analysis=debug,philt_graph=debug")
    } else if quiet {
        EnvFilter::new("philt_cli=error,philt_analysis=error")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("philt_cli=info,philt_analysis=info"))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_parse() {
        // The subscriber itself is global and can only be installed once per
        // process, so just exercise filter construction.
        let _ = EnvFilter::new("philt_cli=debug,philt_analysis=debug,philt_graph=debug");
        let _ = EnvFilter::new("philt_cli=error,philt_analysis=error");
    }
}
