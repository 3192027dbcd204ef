pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use metrics_exporter_prometheus::PrometheusHandle;
use services::{IdentityLookup, ProductCatalog, SessionCookie};
use std::sync::Arc;

/// Shared application state: the mock backends plus session cookie settings.
#[derive(Clone)]
pub struct AppState {
    pub identities: Arc<dyn IdentityLookup>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub session_cookie: SessionCookie,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        identities: Arc<dyn IdentityLookup>,
        catalog: Arc<dyn ProductCatalog>,
        session_cookie: SessionCookie,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            identities,
            catalog,
            session_cookie,
            metrics,
        }
    }
}
