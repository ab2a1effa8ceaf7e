//! Category endpoints.

// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::Deserialize;

use crate::models::{Category, Note};

use super::client::{Ack, ApiClient};
use super::ApiError;

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    status: bool,
    #[serde(default)]
    data: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct CategoryNotesResponse {
    status: bool,
    #[serde(default)]
    data: Vec<Note>,
}

#[derive(Debug, Deserialize)]
struct CategoryDetailResponse {
    status: bool,
    data: CategoryDetail,
}

#[derive(Debug, Deserialize)]
struct CategoryDetail {
    name: String,
}

impl ApiClient {
    /// Fetch the user's categories.
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ApiError> {
        let response: CategoriesResponse = self.get("/categories").send().await?;
        Ok(response.data)
    }

    /// Create a category.
    pub async fn add_category(&self, name: &str) -> Result<Ack, ApiError> {
        self.post("/categories")
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
    }

    /// Fetch the notes filed under one category.
    pub async fn fetch_category_notes(&self, category_id: i64) -> Result<Vec<Note>, ApiError> {
        let response: CategoryNotesResponse = self
            .get(&format!("/categories/{}/notes", category_id))
            .send()
            .await?;
        Ok(response.data)
    }

    /// Fetch a category's display name.
    pub async fn fetch_category_name(&self, category_id: i64) -> Result<String, ApiError> {
        let response: CategoryDetailResponse = self
            .get(&format!("/categories/{}", category_id))
            .send()
            .await?;
        Ok(response.data.name)
    }

    /// Delete a category. Notes keep existing but lose the assignment.
    pub async fn delete_category(&self, category_id: i64) -> Result<Ack, ApiError> {
        self.delete("/categories")
            .json(&serde_json::json!({ "category_id": category_id }))
            .send()
            .await
    }
}
