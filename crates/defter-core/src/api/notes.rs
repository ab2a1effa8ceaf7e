//! Note endpoints.

// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use crate::models::Note;

use super::client::{Ack, ApiClient};
use super::ApiError;

#[derive(Debug, Deserialize)]
struct NotesResponse {
    status: bool,
    #[serde(default)]
    data: Vec<Note>,
}

#[derive(Debug, Deserialize)]
struct NoteDetailResponse {
    status: bool,
    data: Note,
}

/// Payload for creating a note.
#[derive(Debug, Clone, Serialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    pub is_public: i32,
}

/// Payload for replacing a note's contents.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateNote {
    pub note_id: i64,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    pub is_public: i32,
}

impl ApiClient {
    /// Fetch all notes for the signed-in user.
    pub async fn fetch_notes(&self) -> Result<Vec<Note>, ApiError> {
        let response: NotesResponse = self.get("/getNotes").send().await?;
        Ok(response.data)
    }

    /// Fetch a single note with its category name.
    pub async fn fetch_note(&self, note_id: i64) -> Result<Note, ApiError> {
        let response: NoteDetailResponse =
            self.get(&format!("/getNotes/{}", note_id)).send().await?;
        Ok(response.data)
    }

    /// Create a note.
    pub async fn add_note(&self, note: &NewNote) -> Result<Ack, ApiError> {
        self.post("/addNote").json(note).send().await
    }

    /// Update a note in place.
    pub async fn update_note(&self, note: &UpdateNote) -> Result<Ack, ApiError> {
        self.put("/notes").json(note).send().await
    }

    /// Delete a note.
    pub async fn delete_note(&self, note_id: i64) -> Result<Ack, ApiError> {
        self.delete("/notes")
            .json(&serde_json::json!({ "note_id": note_id }))
            .send()
            .await
    }
}
