//! Tracing subscriber setup shared by both binaries.

use tracing_subscriber::EnvFilter;

/// Driver internals stay quiet unless asked for explicitly.
pub const QUIET_TARGETS: &str = "mongodb=warn,hyper=warn,reqwest=warn";

/// Filter directive: `--verbose` wins, then `FITBIT_LOG_LEVEL`/`RUST_LOG`, then `info`.
pub fn filter_directive(configured: Option<String>, verbose: bool) -> String {
    let level = if verbose {
        "debug".to_string()
    } else {
        configured.unwrap_or_else(|| "info".to_string())
    };
    format!("{level},{QUIET_TARGETS}")
}

/// The directive actually installed: `directive` if it parses, the default otherwise.
pub fn effective_directive(directive: &str) -> String {
    match EnvFilter::try_new(directive) {
        Ok(_) => directive.to_string(),
        Err(_) => format!("info,{QUIET_TARGETS}"),
    }
}

pub fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::new(effective_directive(directive))
}

pub fn init_logging(verbose: bool) {
    let log_env = std::env::var("FITBIT_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok();
    let directive = filter_directive(log_env, verbose);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(build_filter(&directive))
        .init();
    let effective = effective_directive(&directive);
    if effective != directive {
        tracing::warn!(%directive, "invalid log filter, using {effective}");
    }
}
