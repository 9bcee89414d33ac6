//! Query dispatch
//!
//! [`Dispatcher`] is the single entry point every surface uses. It holds the
//! backend chosen at startup and forwards each query to it unchanged.

mod fixture;
mod live;

pub use fixture::FixtureResolver;
pub use live::LiveClient;

use std::time::Instant;

use dspbridge_protocol::{DispatchResult, MethodName, QueryParams};
use tracing::debug;

use crate::config::{BackendConfig, Mode};

/// Backend selected for the process lifetime
#[derive(Debug, Clone)]
pub enum Backend {
    /// Recorded responses on disk
    Fixture(FixtureResolver),
    /// Round trips to the game plugin
    Live(LiveClient),
}

/// Routes queries to the configured backend
///
/// Stateless apart from the backend choice; share it behind an `Arc` and
/// call it from any number of tasks.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    backend: Backend,
}

impl Dispatcher {
    /// Create a dispatcher over an explicit backend
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Build the backend named by the configuration
    pub fn from_config(config: &BackendConfig) -> Self {
        let backend = match config.mode {
            Mode::Fixture => Backend::Fixture(FixtureResolver::new(&config.fixture_dir)),
            Mode::Live => Backend::Live(LiveClient::new(
                config.ws_uri.clone(),
                config.request_timeout(),
            )),
        };
        Self::new(backend)
    }

    /// Active mode
    pub fn mode(&self) -> Mode {
        match self.backend {
            Backend::Fixture(_) => Mode::Fixture,
            Backend::Live(_) => Mode::Live,
        }
    }

    /// Answer one query
    ///
    /// Backend failures come back as `Err` values exactly as the backend
    /// reported them.
    pub async fn dispatch(&self, method: &MethodName, params: &QueryParams) -> DispatchResult {
        let started = Instant::now();
        let result = match &self.backend {
            Backend::Fixture(resolver) => resolver.resolve(method, params).await,
            Backend::Live(client) => client.call(method, params).await,
        };

        debug!(
            method = %method,
            params = %params.to_value(),
            mode = %self.mode(),
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dispatched query"
        );
        result
    }
}
