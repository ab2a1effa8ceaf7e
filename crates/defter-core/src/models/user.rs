use serde::{Deserialize, Serialize};

/// Profile of the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetail {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role_description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_active: i32,
}

impl UserDetail {
    pub fn active(&self) -> bool {
        self.is_active != 0
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|granted| granted == permission)
    }
}
