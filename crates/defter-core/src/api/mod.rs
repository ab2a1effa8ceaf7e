//! REST API client module for the defter backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! notes, to-do, notification and profile endpoints.
//!
//! The API uses bearer token authentication. Every request is routed
//! through one dispatch funnel that attaches the stored token and
//! classifies the response before callers see it.

pub mod client;
pub mod error;

mod categories;
mod notes;
mod notifications;
mod profile;
mod todos;

pub use client::{Ack, ApiClient, ApiRequest};
pub use error::{
    ApiError, CONNECTION_ERROR_MESSAGE, RATE_LIMIT_MESSAGE, SERVER_ERROR_MESSAGE,
    SESSION_EXPIRED_MESSAGE,
};
pub use notes::{NewNote, UpdateNote};
pub use notifications::NotificationFilter;
pub use profile::{PasswordChange, ProfileUpdate};
