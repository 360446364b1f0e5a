use std::time::{Duration, Instant};

use crate::tasks::TaskId;

/// Delay between an edit field losing focus and its commit, leaving room for
/// a cancel to land first.
pub const BLUR_COMMIT_DELAY: Duration = Duration::from_millis(100);

/// Commit scheduled by a blur. Runs only if the same task is still being
/// edited when it comes due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredCommit {
    pub id: TaskId,
    pub text: String,
    pub due: Instant,
}

impl DeferredCommit {
    pub fn new(id: TaskId, text: impl Into<String>, now: Instant) -> Self {
        Self {
            id,
            text: text.into(),
            due: now + BLUR_COMMIT_DELAY,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.due
    }
}
