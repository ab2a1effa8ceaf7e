//! Profile and account endpoints.

// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use crate::models::UserDetail;

use super::client::{Ack, ApiClient};
use super::ApiError;

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    status: bool,
    data: UserDetail,
}

/// Payload for updating the editable profile fields.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub phone_number: String,
}

/// Payload for changing the account password. The confirmation is
/// validated server-side as well as in the UI.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ApiClient {
    /// Fetch the signed-in user's profile.
    pub async fn fetch_profile(&self) -> Result<UserDetail, ApiError> {
        let response: ProfileResponse = self.get("/profile").send().await?;
        Ok(response.data)
    }

    /// Update profile fields.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Ack, ApiError> {
        self.put("/profile").json(update).send().await
    }

    /// Change the account password.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<Ack, ApiError> {
        self.put("/profile/password").json(change).send().await
    }
}
