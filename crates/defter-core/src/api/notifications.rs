//! Notification endpoints.

// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::Deserialize;

use crate::models::{Notification, NotificationPriority};

use super::client::{Ack, ApiClient};
use super::ApiError;

#[derive(Debug, Deserialize)]
struct NotificationsResponse {
    status: bool,
    #[serde(default)]
    data: Vec<Notification>,
}

#[derive(Debug, Deserialize)]
struct UnreadCountResponse {
    status: bool,
    count: u64,
}

/// Server-side filter for the notification list. Unset fields do not
/// constrain the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationFilter {
    pub priority: Option<NotificationPriority>,
    pub is_read: Option<bool>,
}

impl ApiClient {
    /// Fetch all notifications, read and unread.
    pub async fn fetch_notifications(&self) -> Result<Vec<Notification>, ApiError> {
        let response: NotificationsResponse = self.get("/notifications").send().await?;
        Ok(response.data)
    }

    /// Fetch notifications matching a filter.
    pub async fn fetch_filtered_notifications(
        &self,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, ApiError> {
        let mut request = self.get("/notifications/filtered");
        if let Some(priority) = filter.priority {
            request = request.query("priority", priority.as_str());
        }
        if let Some(is_read) = filter.is_read {
            request = request.query("is_read", i32::from(is_read));
        }
        let response: NotificationsResponse = request.send().await?;
        Ok(response.data)
    }

    /// Mark a single notification as read.
    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<Ack, ApiError> {
        self.post("/notifications/mark-read")
            .json(&serde_json::json!({ "notification_id": notification_id }))
            .send()
            .await
    }

    /// Delete a notification.
    pub async fn delete_notification(&self, notification_id: i64) -> Result<Ack, ApiError> {
        self.delete("/notifications")
            .json(&serde_json::json!({ "notification_id": notification_id }))
            .send()
            .await
    }

    /// Fetch the unread-badge count without pulling the whole list.
    pub async fn fetch_unread_count(&self) -> Result<u64, ApiError> {
        let response: UnreadCountResponse =
            self.get("/notifications/unread-count").send().await?;
        Ok(response.count)
    }
}
