//! Tracing subscriber setup
//!
//! Filter precedence: `RUST_LOG`, then `--debug`, then the logger file
//! `filter`, then [`DEFAULT_FILTER`].

use crate::config::{LogFormat, LoggerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "pdf_swap=info,pdf_swap_api=info,tower_http=info";
pub const DEBUG_FILTER: &str = "pdf_swap=debug,pdf_swap_api=debug,tower_http=debug";

/// The directive used when `RUST_LOG` is not set.
pub fn filter_directive(debug: bool, logger: Option<&LoggerConfig>) -> String {
    if debug {
        return DEBUG_FILTER.to_string();
    }
    logger
        .and_then(|config| config.filter.clone())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber, writing to standard error.
pub fn init(debug: bool, logger: Option<&LoggerConfig>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(debug, logger)))?;

    let defaults = LoggerConfig::default();
    let logger = logger.unwrap_or(&defaults);
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(logger.ansi.unwrap_or(true))
        .with_target(logger.target.unwrap_or(true));

    let registry = tracing_subscriber::registry().with(filter);
    match logger.format {
        LogFormat::Full => registry.with(fmt).try_init()?,
        LogFormat::Compact => registry.with(fmt.compact()).try_init()?,
        LogFormat::Pretty => registry.with(fmt.pretty()).try_init()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_precedence() {
        assert_eq!(filter_directive(false, None), DEFAULT_FILTER);
        assert_eq!(filter_directive(true, None), DEBUG_FILTER);

        let logger = LoggerConfig {
            filter: Some("pdf_swap=trace".into()),
            ..Default::default()
        };
        assert_eq!(filter_directive(false, Some(&logger)), "pdf_swap=trace");
        assert_eq!(filter_directive(true, Some(&logger)), DEBUG_FILTER);
        assert_eq!(
            filter_directive(false, Some(&LoggerConfig::default())),
            DEFAULT_FILTER
        );
    }

    #[test]
    fn test_directives_parse() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        assert!(EnvFilter::try_new(DEBUG_FILTER).is_ok());
    }
}
