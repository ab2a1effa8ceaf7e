//! Client library for the defter notes and to-do backend.
//!
//! The crate wires four pieces together:
//! - [`auth::TokenStore`]: custody of the single bearer token in OS
//!   secure storage
//! - [`api::ApiClient`]: the request funnel that attaches the token and
//!   classifies every response
//! - [`auth::AuthEvents`]: the channel a rejected token travels to reach
//!   the session layer
//! - [`auth::SessionManager`]: login, logout and startup restore
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use defter_core::api::ApiClient;
//! use defter_core::auth::{AuthEvents, KeyringTokenStore, SessionManager};
//! use defter_core::config::ClientConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = Arc::new(KeyringTokenStore::new());
//! let client = ApiClient::new(&ClientConfig::from_env(), store, AuthEvents::new())?;
//! let manager = SessionManager::new(client);
//!
//! manager.restore().await;
//! if manager.is_authenticated() {
//!     let notes = manager.client().fetch_notes().await?;
//!     println!("{} notes", notes.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthState, LoginOutcome, SessionManager};
pub use config::ClientConfig;
