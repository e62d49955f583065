//! Logging and metrics setup.
//!
//! - [`metrics`]: Prometheus registry and recording helpers

pub mod metrics;

use tracing_subscriber::EnvFilter;

use crate::config::{normalize_level, LogFormat, LoggingConfig};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(config: &LoggingConfig, verbose: bool) -> String {
    let level = if verbose {
        "debug"
    } else {
        normalize_level(&config.level).unwrap_or("info")
    };
    format!("item_cache_service={level},tower_http={level}")
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the config.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(config, verbose).into());

    match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_target(true)
            .init(),
        LogFormat::Console => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let config = LoggingConfig::default();
        assert_eq!(
            default_filter(&config, false),
            "item_cache_service=info,tower_http=info"
        );
        assert_eq!(
            default_filter(&config, true),
            "item_cache_service=debug,tower_http=debug"
        );
    }

    #[test]
    fn test_default_filter_directives_parse() {
        use tracing_subscriber::filter::Directive;

        for level in ["WARNING", "critical", "warn", "trace"] {
            let config = LoggingConfig {
                level: level.to_string(),
                ..LoggingConfig::default()
            };
            for directive in default_filter(&config, false).split(',') {
                assert!(directive.parse::<Directive>().is_ok(), "{directive}");
            }
        }

        let config = LoggingConfig {
            level: "CRITICAL".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(
            default_filter(&config, false),
            "item_cache_service=error,tower_http=error"
        );
    }
}
