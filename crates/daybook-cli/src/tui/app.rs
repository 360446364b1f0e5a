use std::{cell::Cell, rc::Rc, time::Instant};

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use daybook_core::{
    clock::Clock,
    storage::KeyValueStore,
    tasks::{Filter, TaskId, ALL_LABEL},
};

use crate::{config::Config, storage::Tasks, theme, theme::Theme};

/// Which widget receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    List,
}

/// Destructive action awaiting a yes/no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    Delete(TaskId),
    ClearCompleted,
    ClearAll,
}

impl Confirm {
    pub fn prompt(&self) -> &'static str {
        match self {
            Confirm::Delete(_) => "Delete this task?",
            Confirm::ClearCompleted => "Clear all completed tasks?",
            Confirm::ClearAll => "Clear ALL tasks? This cannot be undone.",
        }
    }
}

/// Presentation state around a task store. Holds the store explicitly and
/// redraws when the store reports a change.
pub struct App<S: KeyValueStore, C: Clock> {
    pub tasks: Tasks<S, C>,
    pub input: String,
    pub categories: Vec<String>,
    pub category_index: usize,
    pub filters: Vec<String>,
    pub filter_index: usize,
    pub selected: usize,
    pub edit_buffer: String,
    /// False once the edit field lost focus and its commit is pending.
    pub edit_focused: bool,
    pub focus: Focus,
    pub confirm: Option<Confirm>,
    pub theme: Theme,
    pub should_quit: bool,
    /// Day of the last reset check.
    day: NaiveDate,
    dirty: Rc<Cell<bool>>,
}

impl<S: KeyValueStore, C: Clock> App<S, C> {
    pub fn new(mut tasks: Tasks<S, C>, config: &Config) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        tasks.subscribe(move |_| flag.set(true));

        let categories = config.category_choices();
        let mut filters = vec![ALL_LABEL.to_string()];
        filters.extend(categories.iter().cloned());
        let theme = theme::resolve(tasks.persistence(), config);
        let day = tasks.today();

        Self {
            tasks,
            input: String::new(),
            categories,
            category_index: 0,
            filters,
            filter_index: 0,
            selected: 0,
            edit_buffer: String::new(),
            edit_focused: false,
            focus: Focus::Input,
            confirm: None,
            theme,
            should_quit: false,
            day,
            dirty,
        }
    }

    /// Returns whether a redraw is due and resets the flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub fn category(&self) -> &str {
        self.categories
            .get(self.category_index)
            .map(String::as_str)
            .unwrap_or(daybook_core::tasks::DEFAULT_CATEGORY)
    }

    pub fn filter_label(&self) -> &str {
        self.filters
            .get(self.filter_index)
            .map(String::as_str)
            .unwrap_or(ALL_LABEL)
    }

    pub fn selected_id(&self) -> Option<TaskId> {
        self.tasks
            .view()
            .rows
            .get(self.selected)
            .map(|row| row.task.id.clone())
    }

    fn is_editing(&self) -> bool {
        self.tasks.editing().is_some()
    }

    /// Runs a due blur commit.
    pub fn tick(&mut self, now: Instant) {
        if self.tasks.run_deferred_commit(now) || !self.is_editing() {
            self.edit_focused = false;
        }
    }

    /// Terminal regained focus: the day may have rolled over meanwhile.
    pub fn focus_gained(&mut self) {
        self.day = self.tasks.today();
        self.tasks.check_daily_reset();
    }

    /// Runs the daily reset at midnight even when the terminal never
    /// reports focus changes.
    pub fn watch_day(&mut self) {
        if self.tasks.today() != self.day {
            self.focus_gained();
        }
    }

    pub fn focus_lost(&mut self, now: Instant) {
        if self.is_editing() && self.edit_focused {
            self.blur_edit(now);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        self.mark_dirty();
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.confirm.is_some() {
            self.handle_confirm_key(key);
            return;
        }
        if key.code == KeyCode::Esc && self.is_editing() {
            self.tasks.cancel_edit();
            self.edit_focused = false;
            return;
        }
        if self.is_editing() && self.edit_focused {
            self.handle_edit_key(key, now);
            return;
        }
        match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::List => self.handle_list_key(key),
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(action) = self.confirm.take() {
                    match action {
                        Confirm::Delete(id) => {
                            self.tasks.delete(&id);
                        }
                        Confirm::ClearCompleted => {
                            self.tasks.clear_completed();
                        }
                        Confirm::ClearAll => {
                            self.tasks.clear_all();
                        }
                    }
                    self.clamp_selection();
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.confirm = None,
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Enter => {
                if let Some(id) = self.tasks.editing().cloned() {
                    self.tasks.commit_edit(&id, &self.edit_buffer);
                }
                self.edit_focused = false;
            }
            KeyCode::Backspace => {
                self.edit_buffer.pop();
            }
            KeyCode::Char(c) => self.edit_buffer.push(c),
            KeyCode::Up => {
                self.blur_edit(now);
                self.move_selection(-1);
            }
            KeyCode::Down => {
                self.blur_edit(now);
                self.move_selection(1);
            }
            KeyCode::Tab => {
                self.blur_edit(now);
                self.focus = Focus::Input;
            }
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let category = self.category().to_string();
                if self.tasks.create(&self.input, &category).is_some() {
                    self.input.clear();
                    self.category_index = 0;
                    self.selected = 0;
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Up => self.cycle_category(-1),
            KeyCode::Down => self.cycle_category(1),
            KeyCode::Tab | KeyCode::Esc => self.focus = Focus::List,
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Char('i') | KeyCode::Char('a') => self.focus = Focus::Input,
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    self.tasks.toggle(&id);
                }
            }
            KeyCode::Enter | KeyCode::Char('e') => self.begin_edit(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.confirm = Some(Confirm::Delete(id));
                }
            }
            KeyCode::Char('c') => self.confirm = Some(Confirm::ClearCompleted),
            KeyCode::Char('C') => self.confirm = Some(Confirm::ClearAll),
            KeyCode::Char('f') => self.cycle_filter(1),
            KeyCode::Char('F') => self.cycle_filter(-1),
            KeyCode::Char('t') => {
                self.theme = self.theme.toggled();
                theme::save(self.tasks.persistence(), self.theme);
            }
            _ => {}
        }
    }

    fn begin_edit(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let text = self
            .tasks
            .get(&id)
            .map(|t| t.text.clone())
            .unwrap_or_default();
        if self.tasks.begin_edit(&id) {
            self.edit_buffer = text;
            self.edit_focused = true;
        }
    }

    fn blur_edit(&mut self, now: Instant) {
        if let Some(id) = self.tasks.editing().cloned() {
            self.tasks.defer_commit(&id, &self.edit_buffer, now);
        }
        self.edit_focused = false;
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.tasks.view().rows.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, len as isize - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        self.move_selection(0);
    }

    fn cycle_category(&mut self, delta: isize) {
        self.category_index = cycle(self.category_index, self.categories.len(), delta);
    }

    fn cycle_filter(&mut self, delta: isize) {
        self.filter_index = cycle(self.filter_index, self.filters.len(), delta);
        let filter = Filter::parse(self.filter_label());
        self.tasks.set_filter(filter);
        self.selected = 0;
    }
}

fn cycle(index: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (index as isize + delta).rem_euclid(len as isize) as usize
}
