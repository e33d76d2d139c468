//! Tracing subscriber setup shared by the binaries

use crate::config::LoggingConfig;
use crate::error::{FetcherError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn initialize_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let fmt_layer = match config.format.as_str() {
        "json" => fmt::layer().json().with_target(true).with_current_span(false).boxed(),
        "pretty" => fmt::layer()
            .pretty()
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        _ => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| FetcherError::config(format!("logging already initialised: {e}")))
}

/// Filter for the configured level
fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).map_err(|e| FetcherError::config(format!("invalid log level: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::subscriber::with_default;
    use tracing::{debug, info};

    #[test]
    fn test_level_filter() {
        assert!(level_filter("debug").is_ok());
        assert!(level_filter("playfab_fetcher=trace,sqlx=warn").is_ok());

        let err = level_filter("playfab_fetcher=loud").unwrap_err();
        assert!(matches!(err, FetcherError::Config(_)));
    }

    #[test]
    fn test_scoped_subscriber_with_configured_level() {
        let subscriber = tracing_subscriber::registry()
            .with(level_filter("info").unwrap())
            .with(fmt::layer().with_test_writer());

        with_default(subscriber, || {
            assert!(tracing::enabled!(tracing::Level::INFO));
            assert!(!tracing::enabled!(tracing::Level::DEBUG));
            info!("Player fetched");
            debug!("not emitted");
        });
    }
}
