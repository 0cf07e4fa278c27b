use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::app_config::LogFormat;

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_DIRECTIVE: &str = "keyleash=info";

/// Pick the filter directive from the CLI flags and the config file.
pub fn directive(verbose: bool, quiet: bool, configured: Option<&str>) -> String {
    if quiet {
        "error".to_string()
    } else if verbose {
        "keyleash=debug".to_string()
    } else {
        configured.unwrap_or(DEFAULT_DIRECTIVE).to_string()
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `directive`. A second call is a no-op.
pub fn init(directive: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        assert_eq!(directive(false, true, Some("trace")), "error");
        assert_eq!(directive(true, false, Some("trace")), "keyleash=debug");
        assert_eq!(directive(false, false, Some("trace")), "trace");
        assert_eq!(directive(false, false, None), DEFAULT_DIRECTIVE);
    }
}
