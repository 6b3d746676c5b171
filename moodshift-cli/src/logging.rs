//! Logging setup for the `moodshift` binary.
//!
//! Events go to stderr so stdout stays clean for `--json` output. Noisy HTTP
//! modules are held at `warn` unless `RUST_LOG` says otherwise.

use clap::ValueEnum;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Modules whose debug output is connection plumbing, not business context.
pub const NOISY_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "html5ever",
    "selectors",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

fn directives(log_level: &str) -> String {
    let mut directives = String::from(log_level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    directives
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(log_level)))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(log_level: &str, format: LogFormat) {
    let subscriber = tracing_subscriber::registry().with(build_filter(log_level));

    match format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_writer(std::io::stderr);
            let _ = subscriber.with(fmt_layer).try_init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = subscriber.with(fmt_layer).try_init();
        }
    }

    tracing::debug!(log_level, ?format, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_quiet_noisy_modules() {
        let d = directives("debug");
        assert!(d.starts_with("debug,"));
        assert!(d.contains("reqwest=warn"));
        assert!(d.contains("hyper=warn"));
        assert_eq!(d.matches("=warn").count(), NOISY_MODULES.len());
    }
}
