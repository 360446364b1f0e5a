//! Pure projection of task state into what the presentation layer draws.

use crate::tasks::{Filter, Task, TaskId};

/// Aggregate counters, always over the unfiltered collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl Counts {
    pub fn of(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        Self {
            total,
            completed,
            pending: total - completed,
        }
    }
}

/// Whether the presentation layer shows rows or the empty placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    List,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<'a> {
    pub task: &'a Task,
    pub editing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View<'a> {
    pub rows: Vec<Row<'a>>,
    pub counts: Counts,
    pub mode: DisplayMode,
}

/// Filters `tasks` by category, keeping collection order, and marks the row
/// being edited. Counts ignore the filter.
pub fn project<'a>(tasks: &'a [Task], filter: &Filter, editing: Option<&TaskId>) -> View<'a> {
    let rows: Vec<Row<'a>> = tasks
        .iter()
        .filter(|task| filter.matches(task))
        .map(|task| Row {
            task,
            editing: editing == Some(&task.id),
        })
        .collect();

    let mode = if rows.is_empty() {
        DisplayMode::Empty
    } else {
        DisplayMode::List
    };

    View {
        rows,
        counts: Counts::of(tasks),
        mode,
    }
}
