use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned when the user picks none.
pub const DEFAULT_CATEGORY: &str = "None";

/// Filter label that shows every task.
pub const ALL_LABEL: &str = "All";

/// Opaque task identifier. Assigned once, never reused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Task entity. Field names serialize in camelCase to keep stored data stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_category")]
    pub category: String,
    pub date_created: DateTime<Utc>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Task {
    pub fn new(
        id: TaskId,
        text: impl Into<String>,
        category: impl Into<String>,
        date_created: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            category: category.into(),
            date_created,
        }
    }
}

/// Category filter applied by the view projection. Categories are open
/// strings, so any label other than `All` is a category match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Category(String),
}

impl Filter {
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label == ALL_LABEL {
            Filter::All
        } else {
            Filter::Category(label.to_string())
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Category(category) => &task.category == category,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Filter::All => ALL_LABEL,
            Filter::Category(category) => category,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Storage adapter contract used by the task store.
///
/// Loads never fail: absent or corrupt data degrades to an empty collection
/// or a missing marker. Saves are best effort and report failures to the
/// caller, which logs them without rolling back memory.
pub trait TaskPersistence {
    fn load_tasks(&self) -> Vec<Task>;
    fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()>;
    fn load_reset_marker(&self) -> Option<String>;
    fn save_reset_marker(&self, marker: &str) -> anyhow::Result<()>;
}
