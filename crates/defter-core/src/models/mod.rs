//! Data models for defter entities.
//!
//! - `Note`: user notes, optionally filed under a category
//! - `Category`: note folders
//! - `Todo`, `TodoStatus`, `GroupedTodos`: tasks and their age grouping
//! - `Notification`, `NotificationPriority`: in-app notifications
//! - `UserDetail`: the signed-in profile

pub mod category;
pub mod note;
pub mod notification;
pub mod todo;
pub mod user;

pub use category::Category;
pub use note::Note;
pub use notification::{Notification, NotificationPriority};
pub use todo::{GroupedTodos, Todo, TodoAge, TodoStatus};
pub use user::UserDetail;
