//! Shared application state.

use std::sync::Arc;

use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::simulation::{SimulationSettings, Simulator};
use crate::traits::Generator;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Simulation pipelines.
    pub simulator: Simulator<dyn Generator>,
    /// Server configuration.
    pub config: Arc<Config>,
    /// In-process simulation metrics.
    pub metrics: Arc<MetricsCollector>,
}

impl AppState {
    /// Creates a new application state.
    ///
    /// # Arguments
    ///
    /// * `generator` - The generation backend shared by all requests
    /// * `config` - Server configuration
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, config: Config) -> Self {
        let settings = SimulationSettings::from_config(&config);
        Self {
            simulator: Simulator::new(generator, settings),
            config: Arc::new(config),
            metrics: Arc::new(MetricsCollector::new()),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("settings", self.simulator.settings())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::SecretString;
    use crate::generation::UnconfiguredGenerator;

    #[test]
    fn test_app_state_is_clone_send_sync() {
        static_assertions::assert_impl_all!(AppState: Clone, Send, Sync);
    }

    #[test]
    fn test_app_state_debug_redacts_key() {
        let config = Config {
            api_key: Some(SecretString::new("sk-proj-secret")),
            ..Config::default()
        };
        let state = AppState::new(Arc::new(UnconfiguredGenerator::new("ASSISTANT_ID")), config);
        let debug = format!("{state:?}");
        assert!(debug.contains("AppState"));
        assert!(!debug.contains("sk-proj-secret"));
    }

    #[test]
    fn test_settings_follow_config() {
        let config = Config {
            rationales_enabled: false,
            basic_timeout_ms: 1_234,
            ..Config::default()
        };
        let state = AppState::new(Arc::new(UnconfiguredGenerator::new("OPENAI_API_KEY")), config);
        let settings = state.simulator.settings();
        assert!(!settings.rationales_enabled);
        assert_eq!(settings.basic_timeout.as_millis(), 1_234);
    }
}
