//! Quality metrics providers for the graph engine.
//!
//! [`sonar::SonarClient`] reads per-file and per-project measures from a
//! SonarQube server. [`source_from_config`] picks the provider named in
//! `.kachow.toml`.

pub mod sonar;

use kachow_core::{KachowError, MetricsConfig, MetricsProvider, MetricsSource, NoMetrics};
use tracing::debug;

/// Build the metrics source selected by `config.provider`.
///
/// # Errors
///
/// Returns [`KachowError::Metrics`] if the HTTP client cannot be built.
///
/// # Examples
///
/// ```
/// use kachow_core::{MetricsConfig, MetricsProvider};
/// use kachow_metrics::source_from_config;
///
/// let config = MetricsConfig {
///     provider: MetricsProvider::None,
///     ..MetricsConfig::default()
/// };
/// assert_eq!(source_from_config(&config).unwrap().name(), "none");
/// ```
pub fn source_from_config(config: &MetricsConfig) -> Result<Box<dyn MetricsSource>, KachowError> {
    let source: Box<dyn MetricsSource> = match config.provider {
        MetricsProvider::Sonar => Box::new(sonar::SonarClient::new(config)?),
        MetricsProvider::None => Box::new(NoMetrics),
    };
    debug!(provider = source.name(), "metrics source ready");
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sonar_is_the_default_provider() {
        let source = source_from_config(&MetricsConfig::default()).unwrap();
        assert_eq!(source.name(), "sonar");
    }
}
