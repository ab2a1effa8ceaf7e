use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Completed,
    NotCompleted,
}

impl TodoStatus {
    /// The status after a completion toggle.
    pub fn toggled(self) -> Self {
        match self {
            TodoStatus::Completed => TodoStatus::NotCompleted,
            TodoStatus::NotCompleted => TodoStatus::Completed,
        }
    }

    pub fn is_completed(self) -> bool {
        matches!(self, TodoStatus::Completed)
    }

    /// Wire value, for request bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Completed => "completed",
            TodoStatus::NotCompleted => "not_completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub task: String,
    pub status: TodoStatus,
    pub created_at: String,
    #[serde(default)]
    pub owner_id: Option<i64>,
}

/// Age buckets for the to-do list, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoAge {
    Today,
    LastWeek,
    LastMonth,
    Older,
}

impl TodoAge {
    /// Section heading shown above each bucket.
    pub fn heading(self) -> &'static str {
        match self {
            TodoAge::Today => "Bugün",
            TodoAge::LastWeek => "Son 7 Gün",
            TodoAge::LastMonth => "Son 30 Gün",
            TodoAge::Older => "Daha Eski",
        }
    }
}

impl Todo {
    /// Parse the creation timestamp. The backend sends MySQL datetime
    /// format; ISO timestamps also appear in older rows.
    pub fn created_date(&self) -> Option<NaiveDate> {
        let raw = self.created_at.as_str();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.date_naive());
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
            return Some(parsed.date());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    /// Age bucket relative to `today`. Unparseable timestamps land in
    /// `Older`, matching how the list screen treated them.
    pub fn age(&self, today: NaiveDate) -> TodoAge {
        let Some(date) = self.created_date() else {
            return TodoAge::Older;
        };
        if date >= today {
            TodoAge::Today
        } else if date >= today - Duration::days(7) {
            TodoAge::LastWeek
        } else if date >= today - Duration::days(30) {
            TodoAge::LastMonth
        } else {
            TodoAge::Older
        }
    }
}

/// To-dos bucketed by creation age. Input order is preserved within each
/// bucket.
#[derive(Debug, Default)]
pub struct GroupedTodos {
    pub today: Vec<Todo>,
    pub last_week: Vec<Todo>,
    pub last_month: Vec<Todo>,
    pub older: Vec<Todo>,
}

impl GroupedTodos {
    pub fn build(todos: Vec<Todo>, today: NaiveDate) -> Self {
        let mut grouped = Self::default();
        for todo in todos {
            match todo.age(today) {
                TodoAge::Today => grouped.today.push(todo),
                TodoAge::LastWeek => grouped.last_week.push(todo),
                TodoAge::LastMonth => grouped.last_month.push(todo),
                TodoAge::Older => grouped.older.push(todo),
            }
        }
        grouped
    }

    /// Buckets in display order, with their headings.
    pub fn sections(&self) -> [(&'static str, &[Todo]); 4] {
        [
            (TodoAge::Today.heading(), self.today.as_slice()),
            (TodoAge::LastWeek.heading(), self.last_week.as_slice()),
            (TodoAge::LastMonth.heading(), self.last_month.as_slice()),
            (TodoAge::Older.heading(), self.older.as_slice()),
        ]
    }
}
