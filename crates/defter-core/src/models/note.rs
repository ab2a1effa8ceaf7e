use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub note_id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub is_public: i32,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Joined in by the backend when the note has a category.
    #[serde(default)]
    pub category_name: Option<String>,
}

impl Note {
    /// First line of the content, for list views.
    pub fn preview(&self) -> &str {
        self.content.lines().next().unwrap_or("")
    }

    pub fn is_shared(&self) -> bool {
        self.is_public != 0
    }
}
