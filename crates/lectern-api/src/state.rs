//! Application state shared across handlers.

use std::sync::Arc;

use lectern_models::ClassConfig;
use lectern_persistence::ConfigResolver;
use lectern_presenter::PresenterController;
use lectern_transport::ChannelTransport;

use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Class document resolver.
    pub resolver: Arc<ConfigResolver>,
    /// Transport commands are published on.
    pub transport: Arc<dyn ChannelTransport>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        resolver: ConfigResolver,
        transport: Arc<dyn ChannelTransport>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            transport,
        }
    }

    /// Resolves a class, re-reading the document on every call.
    pub fn class(&self, class_id: &str) -> ClassConfig {
        self.resolver.resolve(class_id)
    }

    /// A presenter for `class_id` publishing on the shared transport.
    pub fn presenter(&self, class_id: &str) -> PresenterController {
        PresenterController::new(self.class(class_id), Arc::clone(&self.transport))
    }
}
