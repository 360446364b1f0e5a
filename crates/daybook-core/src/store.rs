//! Task store: owns the in-memory task list and edit/filter state, persists
//! after every data mutation, and notifies subscribers after every change.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::{
    clock::{Clock, SystemClock},
    edit::DeferredCommit,
    reset::{self, ResetState},
    tasks::{Filter, Task, TaskId, TaskPersistence, DEFAULT_CATEGORY},
    view::{self, View},
};

/// Everything the presentation layer needs to redraw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    /// Newest first.
    pub tasks: Vec<Task>,
    pub editing: Option<TaskId>,
    pub filter: Filter,
}

impl AppState {
    pub fn view(&self) -> View<'_> {
        view::project(&self.tasks, &self.filter, self.editing.as_ref())
    }
}

type Listener = Box<dyn FnMut(&AppState)>;

pub struct TaskStore<P: TaskPersistence, C: Clock = SystemClock> {
    state: AppState,
    persistence: P,
    clock: C,
    last_reset: Option<String>,
    deferred: Option<DeferredCommit>,
    listeners: Vec<Listener>,
}

impl<P: TaskPersistence> TaskStore<P, SystemClock> {
    pub fn new(persistence: P) -> Self {
        Self::with_clock(persistence, SystemClock)
    }
}

impl<P: TaskPersistence, C: Clock> TaskStore<P, C> {
    /// Loads the task collection and the reset marker. Does not run the
    /// daily reset; callers do that once wiring is complete.
    pub fn with_clock(persistence: P, clock: C) -> Self {
        let tasks = persistence.load_tasks();
        let last_reset = persistence.load_reset_marker();
        info!(count = tasks.len(), last_reset = ?last_reset, "loaded tasks");
        Self {
            state: AppState {
                tasks,
                ..AppState::default()
            },
            persistence,
            clock,
            last_reset,
            deferred: None,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener fired with the full state after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&AppState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn editing(&self) -> Option<&TaskId> {
        self.state.editing.as_ref()
    }

    pub fn filter(&self) -> &Filter {
        &self.state.filter
    }

    pub fn view(&self) -> View<'_> {
        self.state.view()
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.state.tasks.iter().find(|t| &t.id == id)
    }

    /// Calendar day the daily reset is measured against.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Prepends a new task. Blank text is ignored and returns `None`.
    #[instrument(skip(self, text))]
    pub fn create(&mut self, text: &str, category: &str) -> Option<TaskId> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank task");
            return None;
        }
        let category = match category.trim() {
            "" => DEFAULT_CATEGORY,
            category => category,
        };

        let id = self.next_id();
        let task = Task::new(id.clone(), text, category, self.clock.now());
        self.state.tasks.insert(0, task);
        self.persist();
        self.notify();
        Some(id)
    }

    #[instrument(skip(self))]
    pub fn toggle(&mut self, id: &TaskId) -> bool {
        let Some(task) = self.find_mut(id) else {
            debug!("toggle on unknown task");
            return false;
        };
        task.completed = !task.completed;
        self.persist();
        self.notify();
        true
    }

    /// Removes a task. Confirmation is up to the caller.
    #[instrument(skip(self))]
    pub fn delete(&mut self, id: &TaskId) -> bool {
        let Some(index) = self.state.tasks.iter().position(|t| &t.id == id) else {
            debug!("delete on unknown task");
            return false;
        };
        self.state.tasks.remove(index);
        if self.state.editing.as_ref() == Some(id) {
            self.state.editing = None;
        }
        self.persist();
        self.notify();
        true
    }

    #[instrument(skip(self))]
    pub fn begin_edit(&mut self, id: &TaskId) -> bool {
        if self.get(id).is_none() {
            debug!("edit on unknown task");
            return false;
        }
        self.state.editing = Some(id.clone());
        self.notify();
        true
    }

    /// Replaces the task text with the trimmed input when it is non-blank.
    /// The edit session on `id` ends either way; a session on another task
    /// is left alone. Unknown ids change nothing. Returns whether the text
    /// was saved.
    #[instrument(skip(self, text))]
    pub fn commit_edit(&mut self, id: &TaskId, text: &str) -> bool {
        let text = text.trim();
        let Some(task) = self.find_mut(id) else {
            debug!("commit on unknown task");
            return false;
        };
        let saved = !text.is_empty();
        if saved {
            task.text = text.to_string();
        }
        if self.state.editing.as_ref() == Some(id) {
            self.state.editing = None;
        }
        if saved {
            self.persist();
        } else {
            debug!("edit abandoned");
        }
        self.notify();
        saved
    }

    pub fn cancel_edit(&mut self) {
        self.state.editing = None;
        self.notify();
    }

    /// Schedules a commit for an edit field that lost focus.
    pub fn defer_commit(&mut self, id: &TaskId, text: &str, now: Instant) {
        self.deferred = Some(DeferredCommit::new(id.clone(), text, now));
    }

    /// Runs the scheduled commit once due. It is discarded when the edit
    /// session it belonged to has ended or moved to another task.
    pub fn run_deferred_commit(&mut self, now: Instant) -> bool {
        match self.deferred.take() {
            Some(commit) if !commit.is_due(now) => {
                self.deferred = Some(commit);
                false
            }
            Some(commit) => {
                if self.state.editing.as_ref() == Some(&commit.id) {
                    self.commit_edit(&commit.id, &commit.text)
                } else {
                    debug!(id = %commit.id, "discarding stale deferred commit");
                    false
                }
            }
            None => false,
        }
    }

    pub fn has_deferred_commit(&self) -> bool {
        self.deferred.is_some()
    }

    /// Removes completed tasks; returns how many were removed.
    #[instrument(skip(self))]
    pub fn clear_completed(&mut self) -> usize {
        let before = self.state.tasks.len();
        self.state.tasks.retain(|t| !t.completed);
        let editing_removed = self
            .state
            .editing
            .as_ref()
            .is_some_and(|id| !self.state.tasks.iter().any(|t| &t.id == id));
        if editing_removed {
            self.state.editing = None;
        }
        let removed = before - self.state.tasks.len();
        info!(removed, "cleared completed tasks");
        self.persist();
        self.notify();
        removed
    }

    #[instrument(skip(self))]
    pub fn clear_all(&mut self) -> usize {
        let removed = self.state.tasks.len();
        self.state.tasks.clear();
        self.state.editing = None;
        info!(removed, "cleared all tasks");
        self.persist();
        self.notify();
        removed
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.state.filter = filter;
        self.notify();
    }

    /// Clears every completion flag when the calendar day changed since the
    /// last reset. Returns whether a reset happened.
    #[instrument(skip(self))]
    pub fn check_daily_reset(&mut self) -> bool {
        let today = reset::reset_marker(self.clock.today());
        if reset::evaluate(self.last_reset.as_deref(), &today) == ResetState::Fresh {
            return false;
        }

        let cleared = reset::clear_completion(&mut self.state.tasks);
        info!(cleared, day = %today, "daily reset");
        self.persist();
        if let Err(err) = self.persistence.save_reset_marker(&today) {
            warn!("failed to save reset marker: {err:#}");
        }
        self.last_reset = Some(today);
        self.notify();
        true
    }

    fn find_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.state.tasks.iter_mut().find(|t| &t.id == id)
    }

    fn next_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn persist(&self) {
        if let Err(err) = self.persistence.save_tasks(&self.state.tasks) {
            warn!("failed to save tasks: {err:#}");
        }
    }

    fn notify(&mut self) {
        let state = &self.state;
        for listener in self.listeners.iter_mut() {
            listener(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use chrono::NaiveDate;

    use super::*;
    use crate::{clock::FixedClock, edit::BLUR_COMMIT_DELAY, view::Counts};

    /// Persistence double recording what the store wrote.
    #[derive(Clone, Default)]
    struct Recorder {
        tasks: Rc<RefCell<Vec<Task>>>,
        marker: Rc<RefCell<Option<String>>>,
        saves: Rc<Cell<usize>>,
        fail: Rc<Cell<bool>>,
    }

    impl TaskPersistence for Recorder {
        fn load_tasks(&self) -> Vec<Task> {
            self.tasks.borrow().clone()
        }

        fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
            if self.fail.get() {
                anyhow::bail!("quota exceeded");
            }
            self.saves.set(self.saves.get() + 1);
            *self.tasks.borrow_mut() = tasks.to_vec();
            Ok(())
        }

        fn load_reset_marker(&self) -> Option<String> {
            self.marker.borrow().clone()
        }

        fn save_reset_marker(&self, marker: &str) -> anyhow::Result<()> {
            if self.fail.get() {
                anyhow::bail!("quota exceeded");
            }
            *self.marker.borrow_mut() = Some(marker.to_string());
            Ok(())
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn store() -> (TaskStore<Recorder, FixedClock>, Recorder, FixedClock) {
        let recorder = Recorder::default();
        let clock = FixedClock::at_date(day(2024, 1, 1));
        let store = TaskStore::with_clock(recorder.clone(), clock.clone());
        (store, recorder, clock)
    }

    #[test]
    fn create_prepends_and_persists() {
        let (mut store, recorder, _) = store();
        let first = store.create("first", "Work").expect("created");
        let second = store.create("  second  ", "Home").expect("created");

        let ids: Vec<&TaskId> = store.tasks().iter().map(|t| &t.id).collect();
        assert_eq!(ids, [&second, &first]);
        assert_eq!(store.tasks()[0].text, "second");
        assert!(!store.tasks()[0].completed);
        assert_eq!(recorder.tasks.borrow().len(), 2);
    }

    #[test]
    fn blank_create_is_ignored() {
        let (mut store, recorder, _) = store();
        assert!(store.create("   ", "Work").is_none());
        assert!(store.create("", "Work").is_none());
        assert!(store.tasks().is_empty());
        assert_eq!(recorder.saves.get(), 0);
    }

    #[test]
    fn blank_category_defaults_to_none() {
        let (mut store, _, _) = store();
        store.create("task", " ").expect("created");
        assert_eq!(store.tasks()[0].category, DEFAULT_CATEGORY);
    }

    #[test]
    fn ids_are_unique_across_many_creates() {
        let (mut store, _, _) = store();
        for n in 0..200 {
            store.create(&format!("task {n}"), "Work");
        }
        let mut ids: Vec<&TaskId> = store.tasks().iter().map(|t| &t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn toggle_twice_restores() {
        let (mut store, recorder, _) = store();
        let id = store.create("task", "Work").expect("created");

        assert!(store.toggle(&id));
        assert!(store.tasks()[0].completed);
        assert!(recorder.tasks.borrow()[0].completed);
        assert!(store.toggle(&id));
        assert!(!store.tasks()[0].completed);
    }

    #[test]
    fn toggle_unknown_is_noop() {
        let (mut store, recorder, _) = store();
        store.create("task", "Work");
        let saves = recorder.saves.get();
        assert!(!store.toggle(&TaskId::from("missing")));
        assert_eq!(recorder.saves.get(), saves);
    }

    #[test]
    fn delete_is_idempotent() {
        let (mut store, _, _) = store();
        let keep = store.create("keep", "Work").expect("created");
        let gone = store.create("gone", "Work").expect("created");

        assert!(store.delete(&gone));
        assert!(!store.delete(&gone));
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, keep);
    }

    #[test]
    fn deleting_edited_task_ends_edit_session() {
        let (mut store, _, _) = store();
        let id = store.create("task", "Work").expect("created");
        store.begin_edit(&id);
        store.delete(&id);
        assert!(store.editing().is_none());
    }

    #[test]
    fn commit_edit_trims_and_clears_session() {
        let (mut store, recorder, _) = store();
        let id = store.create("old", "Work").expect("created");
        assert!(store.begin_edit(&id));
        assert_eq!(store.editing(), Some(&id));

        assert!(store.commit_edit(&id, "  new  "));
        assert_eq!(store.tasks()[0].text, "new");
        assert_eq!(recorder.tasks.borrow()[0].text, "new");
        assert!(store.editing().is_none());
    }

    #[test]
    fn blank_commit_keeps_text_and_clears_session() {
        let (mut store, _, _) = store();
        let id = store.create("original", "Work").expect("created");
        store.begin_edit(&id);

        assert!(!store.commit_edit(&id, ""));
        assert!(store.editing().is_none());
        assert_eq!(store.tasks()[0].text, "original");
    }

    #[test]
    fn commit_on_unknown_task_keeps_edit_session() {
        let (mut store, recorder, _) = store();
        let id = store.create("text", "Work").expect("created");
        store.begin_edit(&id);
        let saves = recorder.saves.get();
        let notified = Rc::new(Cell::new(0));
        let seen = Rc::clone(&notified);
        store.subscribe(move |_| seen.set(seen.get() + 1));

        assert!(!store.commit_edit(&TaskId::from("gone"), "x"));
        assert_eq!(store.editing(), Some(&id));
        assert_eq!(recorder.saves.get(), saves);
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn commit_on_other_task_leaves_live_session() {
        let (mut store, _, _) = store();
        let first = store.create("first", "Work").expect("created");
        let second = store.create("second", "Work").expect("created");
        store.begin_edit(&second);

        assert!(store.commit_edit(&first, "renamed"));
        assert_eq!(store.get(&first).expect("first").text, "renamed");
        assert_eq!(store.editing(), Some(&second));
    }

    #[test]
    fn begin_edit_on_unknown_task_is_noop() {
        let (mut store, _, _) = store();
        assert!(!store.begin_edit(&TaskId::from("missing")));
        assert!(store.editing().is_none());
    }

    #[test]
    fn cancel_edit_leaves_text() {
        let (mut store, recorder, _) = store();
        let id = store.create("text", "Work").expect("created");
        store.begin_edit(&id);
        let saves = recorder.saves.get();

        store.cancel_edit();
        assert!(store.editing().is_none());
        assert_eq!(store.tasks()[0].text, "text");
        assert_eq!(recorder.saves.get(), saves);
    }

    #[test]
    fn deferred_commit_runs_when_due() {
        let (mut store, _, _) = store();
        let id = store.create("old", "Work").expect("created");
        store.begin_edit(&id);
        let blurred = Instant::now();
        store.defer_commit(&id, "new", blurred);

        assert!(!store.run_deferred_commit(blurred));
        assert!(store.has_deferred_commit());
        assert!(store.run_deferred_commit(blurred + BLUR_COMMIT_DELAY));
        assert_eq!(store.tasks()[0].text, "new");
        assert!(!store.has_deferred_commit());
    }

    #[test]
    fn cancel_preempts_deferred_commit() {
        let (mut store, _, _) = store();
        let id = store.create("old", "Work").expect("created");
        store.begin_edit(&id);
        let blurred = Instant::now();
        store.defer_commit(&id, "new", blurred);
        store.cancel_edit();

        assert!(!store.run_deferred_commit(blurred + BLUR_COMMIT_DELAY));
        assert_eq!(store.tasks()[0].text, "old");
        assert!(!store.has_deferred_commit());
    }

    #[test]
    fn deferred_commit_discarded_when_editing_moved() {
        let (mut store, _, _) = store();
        let first = store.create("first", "Work").expect("created");
        let second = store.create("second", "Work").expect("created");
        store.begin_edit(&first);
        let blurred = Instant::now();
        store.defer_commit(&first, "changed", blurred);
        store.begin_edit(&second);

        assert!(!store.run_deferred_commit(blurred + BLUR_COMMIT_DELAY));
        assert_eq!(store.get(&first).expect("first").text, "first");
        assert_eq!(store.editing(), Some(&second));
    }

    #[test]
    fn clear_completed_keeps_pending() {
        let (mut store, _, _) = store();
        let a = store.create("a", "Work").expect("created");
        store.create("b", "Work");
        let c = store.create("c", "Home").expect("created");
        store.toggle(&a);
        store.toggle(&c);
        let pending_before = store.view().counts.pending;

        assert_eq!(store.clear_completed(), 2);
        let counts = store.view().counts;
        assert_eq!(counts.pending, pending_before);
        assert_eq!(counts.completed, 0);
    }

    #[test]
    fn clear_all_empties_collection() {
        let (mut store, recorder, _) = store();
        store.create("a", "Work");
        store.create("b", "Work");

        assert_eq!(store.clear_all(), 2);
        assert_eq!(store.view().counts, Counts::default());
        assert!(recorder.tasks.borrow().is_empty());
    }

    #[test]
    fn filter_narrows_rows_but_not_counts() {
        let (mut store, _, _) = store();
        store.create("w1", "Work");
        store.create("h", "Home");
        store.create("w2", "Work");
        store.set_filter(Filter::parse("Work"));

        let view = store.view();
        let texts: Vec<&str> = view.rows.iter().map(|r| r.task.text.as_str()).collect();
        assert_eq!(texts, ["w2", "w1"]);
        assert_eq!(view.counts.total, 3);
    }

    #[test]
    fn daily_reset_clears_flags_once_per_day() {
        let recorder = Recorder::default();
        *recorder.marker.borrow_mut() = Some("2024-01-01".into());
        let clock = FixedClock::at_date(day(2024, 1, 1));
        let mut store = TaskStore::with_clock(recorder.clone(), clock.clone());
        let id = store.create("task", "Work").expect("created");
        store.toggle(&id);

        assert!(!store.check_daily_reset());
        assert!(store.tasks()[0].completed);

        clock.set_date(day(2024, 1, 2));
        assert!(store.check_daily_reset());
        assert!(store.tasks().iter().all(|t| !t.completed));
        assert!(!recorder.tasks.borrow()[0].completed);
        assert_eq!(recorder.marker.borrow().as_deref(), Some("2024-01-02"));

        store.toggle(&id);
        assert!(!store.check_daily_reset());
        assert!(store.tasks()[0].completed);
    }

    #[test]
    fn missing_marker_triggers_reset() {
        let (mut store, recorder, _) = store();
        assert!(store.check_daily_reset());
        assert_eq!(recorder.marker.borrow().as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn failed_marker_write_does_not_reset_twice() {
        let (mut store, recorder, _) = store();
        let id = store.create("task", "Work").expect("created");
        recorder.fail.set(true);

        assert!(store.check_daily_reset());
        store.toggle(&id);
        assert!(!store.check_daily_reset());
        assert!(store.tasks()[0].completed);
    }

    #[test]
    fn save_failure_keeps_memory_state() {
        let (mut store, recorder, _) = store();
        recorder.fail.set(true);
        let id = store.create("kept", "Work").expect("created");
        assert!(store.toggle(&id));
        assert_eq!(store.tasks().len(), 1);
        assert!(store.tasks()[0].completed);
        assert!(recorder.tasks.borrow().is_empty());
    }

    #[test]
    fn listeners_see_every_change() {
        let (mut store, _, _) = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |state: &AppState| sink.borrow_mut().push(state.tasks.len()));

        let id = store.create("a", "Work").expect("created");
        store.begin_edit(&id);
        store.cancel_edit();
        store.set_filter(Filter::All);
        store.create(" ", "Work");

        assert_eq!(*seen.borrow(), [1, 1, 1, 1]);
    }

    #[test]
    fn loads_existing_tasks_on_open() {
        let recorder = Recorder::default();
        let clock = FixedClock::at_date(day(2024, 1, 1));
        {
            let mut first = TaskStore::with_clock(recorder.clone(), clock.clone());
            first.create("persisted", "Work");
        }
        let reopened = TaskStore::with_clock(recorder, clock);
        assert_eq!(reopened.tasks().len(), 1);
        assert_eq!(reopened.tasks()[0].text, "persisted");
    }
}
