//! Authentication module for token custody and session lifecycle.
//!
//! This module provides:
//! - `TokenStore`: secure OS-level bearer token storage via keyring
//! - `AuthEvents`: invalidation notifications from the HTTP layer
//! - `SessionManager`: login, logout, startup restore and forced sign-out
//!
//! One bearer token is held at a time; deleting it ends the session.

pub mod events;
pub mod session;
pub mod token_store;

pub use events::{AuthEvent, AuthEvents, Subscription};
pub use session::{AuthState, LoginOutcome, LoginResponse, Session, SessionManager};
pub use token_store::{KeyringTokenStore, MemoryTokenStore, StoreError, TokenStore, TOKEN_KEY};
