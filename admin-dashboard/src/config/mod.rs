use crate::services::SessionCookie;
use serde::Deserialize;
use service_core::config::{configuration_directory, load, ServerSettings, TelemetrySettings};
use service_core::error::AppError;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub mock_backend: MockBackendSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct SessionSettings {
    /// Lifetime of the `adminUser` cookie.
    #[serde(default = "default_cookie_max_age_seconds")]
    pub cookie_max_age_seconds: i64,
    /// Mark cookies `Secure`. Enable when served over HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_cookie_max_age_seconds() -> i64 {
    86_400
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_max_age_seconds: default_cookie_max_age_seconds(),
            secure_cookies: false,
        }
    }
}

impl SessionSettings {
    pub fn cookie(&self) -> SessionCookie {
        SessionCookie {
            max_age: time::Duration::seconds(self.cookie_max_age_seconds),
            secure: self.secure_cookies,
        }
    }
}

/// Simulated network latency of the stand-in backends.
#[derive(Deserialize, Clone)]
pub struct MockBackendSettings {
    #[serde(default = "default_login_latency_ms")]
    pub login_latency_ms: u64,
    #[serde(default)]
    pub catalog_latency_ms: u64,
}

fn default_login_latency_ms() -> u64 {
    500
}

impl Default for MockBackendSettings {
    fn default() -> Self {
        Self {
            login_latency_ms: default_login_latency_ms(),
            catalog_latency_ms: 0,
        }
    }
}

impl MockBackendSettings {
    pub fn login_latency(&self) -> Duration {
        Duration::from_millis(self.login_latency_ms)
    }

    pub fn catalog_latency(&self) -> Duration {
        Duration::from_millis(self.catalog_latency_ms)
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let directory = configuration_directory("admin-dashboard")?;
    load(&directory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults_match_cookie_lifetime() {
        let cookie = SessionSettings::default().cookie();
        assert_eq!(cookie.max_age, time::Duration::hours(24));
        assert!(!cookie.secure);
    }

    #[test]
    fn test_bundled_base_yaml_loads() {
        let directory = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        let settings: Settings = load(&directory).expect("base.yaml should load");

        assert_eq!(settings.session.cookie_max_age_seconds, 86_400);
        assert_eq!(settings.mock_backend.login_latency(), Duration::from_millis(500));
    }
}
