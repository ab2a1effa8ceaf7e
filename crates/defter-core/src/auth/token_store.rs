//! Persistent storage for the bearer token.
//!
//! The backend issues a single opaque token at login. It lives in the OS
//! keychain under a fixed service/key pair so it survives restarts. Access
//! goes through the `TokenStore` trait so the HTTP layer and the session
//! manager can run against an in-memory store in tests and headless
//! environments.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Keychain service name for defter entries.
const SERVICE_NAME: &str = "defter";

/// Key under which the bearer token is stored.
pub const TOKEN_KEY: &str = "auth_token";

/// Errors from the token store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot access secure storage: {0}")]
    Access(String),

    #[error("Secure storage operation failed: {0}")]
    Backend(String),
}

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoStorageAccess(e) => StoreError::Access(e.to_string()),
            keyring::Error::PlatformFailure(e) => StoreError::Access(e.to_string()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Storage for the single bearer token.
///
/// `get` returns `Ok(None)` when no token has been stored, and `delete` on
/// a missing token is a no-op. There is no locking around the token:
/// concurrent readers may observe a value a racing delete is about to
/// remove, and callers must tolerate a stale or absent token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self) -> Result<Option<String>, StoreError>;
    async fn set(&self, token: &str) -> Result<(), StoreError>;
    async fn delete(&self) -> Result<(), StoreError>;
}

/// Token store backed by the OS keychain (Credential Manager on Windows,
/// Keychain on macOS, Secret Service on Linux).
///
/// The keyring API is blocking, so every operation hops to the blocking
/// thread pool.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Use a custom keychain service name, for side-by-side installs.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(service: &str) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(service, TOKEN_KEY).map_err(StoreError::from)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for KeyringTokenStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || {
            let entry = Self::entry(&service)?;
            match entry.get_password() {
                Ok(token) => Ok(Some(token)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(StoreError::from(e)),
            }
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?
    }

    async fn set(&self, token: &str) -> Result<(), StoreError> {
        let service = self.service.clone();
        let token = token.to_string();
        tokio::task::spawn_blocking(move || {
            Self::entry(&service)?
                .set_password(&token)
                .map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))??;
        debug!("Stored bearer token");
        Ok(())
    }

    async fn delete(&self) -> Result<(), StoreError> {
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || {
            let entry = Self::entry(&service)?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(StoreError::from(e)),
            }
        })
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))??;
        debug!("Deleted bearer token");
        Ok(())
    }
}

/// In-memory token store for tests and environments without a keychain.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token already present.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn set(&self, token: &str) -> Result<(), StoreError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    async fn delete(&self) -> Result<(), StoreError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
