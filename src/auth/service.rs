//! Credential service
//!
//! Registers identities, verifies credentials and issues tokens on success.
//! Every operation acquires its own store connection through the store's pool.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::database::CredentialStore;
use crate::error::{CredentialError, TokenError};
use crate::models::{IdentitySummary, LoginResponse, RegisterResponse};

use super::jwt::{Claims, TokenIssuer};
use super::password::{hash_password, verify_password};

/// Maximum accepted username length
pub const MAX_USERNAME_LENGTH: usize = 255;

/// Hash used to equalize work for unknown usernames
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Credential service
pub struct CredentialService<S: CredentialStore> {
    store: Arc<S>,
    issuer: Arc<TokenIssuer>,
}

impl<S: CredentialStore> CredentialService<S> {
    /// Create a new credential service
    ///
    /// Computes the unknown-user hash here, before any request is served.
    pub fn new(store: Arc<S>, issuer: Arc<TokenIssuer>) -> Self {
        dummy_hash();
        Self { store, issuer }
    }

    /// Register a new identity
    ///
    /// Fails with `InvalidInput` on an empty or overlong username or an empty
    /// password, and with `DuplicateIdentity` when the username is taken.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse, CredentialError> {
        validate_input(username, password)?;

        let hash = hash_blocking(password.to_string()).await?;

        match self.store.insert_identity(username, &hash).await {
            Ok(id) => {
                info!(username, id, "Identity registered");
                Ok(RegisterResponse::registered())
            }
            Err(e) => {
                let err = CredentialError::from(e);
                match &err {
                    CredentialError::DuplicateIdentity => {
                        debug!(username, "Registration rejected: username taken")
                    }
                    other => warn!(username, error = %other, "Registration failed"),
                }
                Err(err)
            }
        }
    }

    /// Verify credentials and issue a token
    ///
    /// Unknown usernames and wrong passwords both yield `Unauthorized`. An
    /// unknown username still pays for one hash verification.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, CredentialError> {
        validate_input(username, password)?;

        let identity = self.store.fetch_by_name(username).await.map_err(|e| {
            let err = CredentialError::from(e);
            warn!(username, error = %err, "Login lookup failed");
            err
        })?;

        let stored_hash = match &identity {
            Some(identity) => identity.password_hash.clone(),
            None => dummy_hash().to_string(),
        };
        let matches = verify_blocking(password.to_string(), stored_hash).await?;

        if identity.is_none() || !matches {
            debug!(username, "Login rejected");
            return Err(CredentialError::Unauthorized);
        }

        let token = self.issuer.issue(username)?;
        info!(username, "Token issued");

        Ok(LoginResponse { token })
    }

    /// List all identities, without secret hashes
    pub async fn list_identities(&self) -> Result<Vec<IdentitySummary>, CredentialError> {
        self.store.list_identities().await.map_err(|e| {
            let err = CredentialError::from(e);
            warn!(error = %err, "Listing identities failed");
            err
        })
    }

    /// Verify a token issued by this service
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.issuer.verify(token)
    }
}

fn validate_input(username: &str, password: &str) -> Result<(), CredentialError> {
    if username.trim().is_empty() {
        return Err(CredentialError::InvalidInput(
            "username is required".to_string(),
        ));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(CredentialError::InvalidInput(format!(
            "username exceeds {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if password.is_empty() {
        return Err(CredentialError::InvalidInput(
            "password is required".to_string(),
        ));
    }
    Ok(())
}

fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| hash_password("authgate-dummy-password").unwrap_or_default())
}

async fn hash_blocking(password: String) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| CredentialError::Hash(e.to_string()))?
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, CredentialError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MockCredentialStore;
    use crate::error::DbError;
    use crate::models::Identity;

    fn issuer() -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(b"unit-test-secret", 300))
    }

    fn service(mock: MockCredentialStore) -> CredentialService<MockCredentialStore> {
        CredentialService::new(Arc::new(mock), issuer())
    }

    #[test]
    fn test_new_prepares_unknown_user_hash() {
        let _service = service(MockCredentialStore::new());

        let hash = DUMMY_HASH.get().unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let mut mock = MockCredentialStore::new();
        mock.expect_insert_identity()
            .withf(|name, hash| name == "alice" && hash.starts_with("$argon2id$"))
            .times(1)
            .returning(|_, _| Ok(1));

        let response = service(mock).register("alice", "pw").await.unwrap();
        assert_eq!(response, RegisterResponse::registered());
    }

    #[tokio::test]
    async fn test_register_rejects_empty_fields() {
        let mut mock = MockCredentialStore::new();
        mock.expect_insert_identity().never();
        let service = service(mock);

        assert!(matches!(
            service.register("", "pw").await,
            Err(CredentialError::InvalidInput(_))
        ));
        assert!(matches!(
            service.register("   ", "pw").await,
            Err(CredentialError::InvalidInput(_))
        ));
        assert!(matches!(
            service.register("alice", "").await,
            Err(CredentialError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_overlong_username() {
        let mut mock = MockCredentialStore::new();
        mock.expect_insert_identity().never();

        let name = "a".repeat(MAX_USERNAME_LENGTH + 1);
        let result = service(mock).register(&name, "pw").await;
        assert!(matches!(result, Err(CredentialError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let mut mock = MockCredentialStore::new();
        mock.expect_insert_identity()
            .returning(|_, _| Err(DbError::ConstraintViolation("users.username".into())));

        let result = service(mock).register("alice", "pw").await;
        assert!(matches!(result, Err(CredentialError::DuplicateIdentity)));
    }

    #[tokio::test]
    async fn test_register_store_failure() {
        let mut mock = MockCredentialStore::new();
        mock.expect_insert_identity()
            .returning(|_, _| Err(DbError::Migration("boom".into())));

        let result = service(mock).register("alice", "pw").await;
        assert!(matches!(result, Err(CredentialError::Store(_))));
    }

    #[tokio::test]
    async fn test_login_issues_token_for_subject() {
        let hash = hash_password("pw").unwrap();
        let mut mock = MockCredentialStore::new();
        mock.expect_fetch_by_name()
            .withf(|name| name == "alice")
            .returning(move |_| Ok(Some(Identity::new(1, "alice", hash.clone()))));

        let service = service(mock);
        let response = service.login("alice", "pw").await.unwrap();

        let claims = service.verify_token(&response.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[tokio::test]
    async fn test_login_wrong_password_unauthorized() {
        let hash = hash_password("pw").unwrap();
        let mut mock = MockCredentialStore::new();
        mock.expect_fetch_by_name()
            .returning(move |_| Ok(Some(Identity::new(1, "alice", hash.clone()))));

        let result = service(mock).login("alice", "not-pw").await;
        assert!(matches!(result, Err(CredentialError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_unknown_user_unauthorized() {
        let mut mock = MockCredentialStore::new();
        mock.expect_fetch_by_name().returning(|_| Ok(None));

        let result = service(mock).login("ghost", "pw").await;
        assert!(matches!(result, Err(CredentialError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_unknown_and_wrong_password_render_identically() {
        let hash = hash_password("pw").unwrap();
        let mut known = MockCredentialStore::new();
        known
            .expect_fetch_by_name()
            .returning(move |_| Ok(Some(Identity::new(1, "alice", hash.clone()))));
        let mut unknown = MockCredentialStore::new();
        unknown.expect_fetch_by_name().returning(|_| Ok(None));

        let wrong = service(known).login("alice", "bad").await.unwrap_err();
        let missing = service(unknown).login("ghost", "bad").await.unwrap_err();

        assert_eq!(wrong.to_string(), missing.to_string());
    }

    #[tokio::test]
    async fn test_login_store_failure_is_not_unauthorized() {
        let mut mock = MockCredentialStore::new();
        mock.expect_fetch_by_name()
            .returning(|_| Err(DbError::PoolTimeout("5s".into())));

        let result = service(mock).login("alice", "pw").await;
        assert!(matches!(result, Err(CredentialError::Connection(_))));
    }

    #[tokio::test]
    async fn test_list_identities_passthrough() {
        let mut mock = MockCredentialStore::new();
        mock.expect_list_identities().returning(|| {
            Ok(vec![
                IdentitySummary::new(1, "alice"),
                IdentitySummary::new(2, "bob"),
            ])
        });

        let identities = service(mock).list_identities().await.unwrap();
        assert_eq!(identities.len(), 2);
        assert_eq!(identities[0].username, "alice");
    }
}
