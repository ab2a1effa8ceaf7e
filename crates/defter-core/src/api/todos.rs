//! To-do endpoints.

// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::Deserialize;

use crate::models::{Todo, TodoStatus};

use super::client::{Ack, ApiClient};
use super::ApiError;

#[derive(Debug, Deserialize)]
struct TodosResponse {
    status: bool,
    #[serde(default)]
    data: Vec<Todo>,
}

impl ApiClient {
    /// Fetch the user's to-dos, newest first as the backend returns them.
    pub async fn fetch_todos(&self) -> Result<Vec<Todo>, ApiError> {
        let response: TodosResponse = self.get("/getAllTodo").send().await?;
        Ok(response.data)
    }

    /// Create a to-do. The owner is derived from the bearer token server-side.
    pub async fn add_todo(&self, task: &str) -> Result<Ack, ApiError> {
        self.post("/addTodo")
            .json(&serde_json::json!({ "task": task }))
            .send()
            .await
    }

    /// Set a to-do's completion status.
    pub async fn set_todo_status(&self, todo_id: i64, status: TodoStatus) -> Result<Ack, ApiError> {
        self.put("/todos")
            .json(&serde_json::json!({ "todo_id": todo_id, "status": status }))
            .send()
            .await
    }

    /// Delete a to-do.
    pub async fn delete_todo(&self, todo_id: i64) -> Result<Ack, ApiError> {
        self.delete("/todos")
            .json(&serde_json::json!({ "todo_id": todo_id }))
            .send()
            .await
    }
}
