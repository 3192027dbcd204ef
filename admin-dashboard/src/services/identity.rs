use crate::models::{Identity, Role};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;
use subtle::ConstantTimeEq;

/// Resolves credentials to an [`Identity`]. Unknown email and wrong password
/// are both reported as `Ok(None)`.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Option<Identity>>;
}

struct CredentialRecord {
    identity: Identity,
    password: Secret<String>,
}

impl CredentialRecord {
    fn new(id: &str, name: &str, email: &str, password: &str, role: Role) -> Self {
        Self {
            identity: Identity {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                role,
                avatar: None,
            },
            password: Secret::new(password.to_string()),
        }
    }

    fn matches(&self, email: &str, password: &str) -> bool {
        let password_ok: bool = self
            .password
            .expose_secret()
            .as_bytes()
            .ct_eq(password.as_bytes())
            .into();
        self.identity.email == email && password_ok
    }
}

/// Fixed in-memory credential table standing in for an auth backend.
pub struct MockCredentialTable {
    records: Vec<CredentialRecord>,
    latency: Duration,
}

impl MockCredentialTable {
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(500);

    pub fn new(latency: Duration) -> Self {
        Self {
            records: vec![
                CredentialRecord::new("1", "John Doe", "admin@example.com", "password", Role::Admin),
                CredentialRecord::new("2", "Jane Smith", "user@example.com", "password", Role::User),
            ],
            latency,
        }
    }
}

impl Default for MockCredentialTable {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

#[async_trait]
impl IdentityLookup for MockCredentialTable {
    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Option<Identity>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let identity = self
            .records
            .iter()
            .find(|record| record.matches(email, password))
            .map(|record| record.identity.clone());

        tracing::debug!(email = %email, matched = identity.is_some(), "Credential lookup");

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MockCredentialTable {
        MockCredentialTable::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_admin_credentials_match() {
        let identity = table()
            .find_by_credentials("admin@example.com", "password")
            .await
            .unwrap()
            .expect("admin should match");

        assert_eq!(identity.id, "1");
        assert_eq!(identity.name, "John Doe");
        assert_eq!(identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_user_credentials_match() {
        let identity = table()
            .find_by_credentials("user@example.com", "password")
            .await
            .unwrap()
            .expect("user should match");

        assert_eq!(identity.id, "2");
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let table = table();
        let wrong_password = table
            .find_by_credentials("admin@example.com", "wrong")
            .await
            .unwrap();
        let unknown_email = table
            .find_by_credentials("nobody@example.com", "password")
            .await
            .unwrap();

        assert!(wrong_password.is_none());
        assert!(unknown_email.is_none());
    }

    #[tokio::test]
    async fn test_email_match_is_exact() {
        let result = table()
            .find_by_credentials("Admin@Example.com", "password")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_returned_identity_has_no_password() {
        let identity = table()
            .find_by_credentials("admin@example.com", "password")
            .await
            .unwrap()
            .unwrap();

        let json = serde_json::to_value(&identity).unwrap();
        assert!(json.get("password").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_waits_for_simulated_latency() {
        let table = MockCredentialTable::default();
        let start = tokio::time::Instant::now();

        table
            .find_by_credentials("admin@example.com", "password")
            .await
            .unwrap();

        assert!(start.elapsed() >= MockCredentialTable::DEFAULT_LATENCY);
    }
}
