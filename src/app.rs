use std::time::Duration;

use crate::config::Config;
use crate::domain::filter::Filter;
use crate::error::TodoError;
use crate::repo::KeyValueStore;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::usecase::projector::{self, ViewModel};
use crate::usecase::store::StateStore;

pub const DUPLICATE_HINT: &str = "Todo already exists.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Refilter,
    DismissHint,
}

pub struct App<K: KeyValueStore> {
    store: StateStore<K>,
    scheduler: Scheduler<Deferred>,
    refilter_delay: Duration,
    hint_duration: Duration,
    pending_refilter: Option<TaskHandle>,
    pending_hint: Option<TaskHandle>,
    pub view: ViewModel,
    pub selected: usize,
    pub mode: InputMode,
    pub input: String,
    pub status: Option<String>,
    pub hint: Option<&'static str>,
}

impl<K: KeyValueStore> App<K> {
    pub fn new(store: StateStore<K>, config: &Config) -> Self {
        let mut app = Self {
            store,
            scheduler: Scheduler::default(),
            refilter_delay: config.refilter_delay,
            hint_duration: config.hint_duration,
            pending_refilter: None,
            pending_hint: None,
            view: ViewModel::default(),
            selected: 0,
            mode: InputMode::Normal,
            input: String::new(),
            status: None,
            hint: None,
        };
        app.render();
        app
    }

    /// Rebuild the view from canonical state.
    pub fn render(&mut self) {
        self.view = projector::project(self.store.state());
        if self.selected >= self.view.rows.len() {
            self.selected = self.view.rows.len().saturating_sub(1);
        }
    }

    /// Open and total todo counts over the whole collection.
    pub fn counts(&self) -> (usize, usize) {
        let state = self.store.state();
        (state.open_count(), state.todos().len())
    }

    pub fn select_next(&mut self) {
        if !self.view.rows.is_empty() {
            self.selected = (self.selected + 1).min(self.view.rows.len() - 1);
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn start_editing(&mut self) {
        self.mode = InputMode::Editing;
        self.input.clear();
        self.set_status("Type new task and press Enter");
    }

    pub fn cancel_editing(&mut self) {
        self.mode = InputMode::Normal;
        self.input.clear();
        self.set_status("Canceled");
    }

    pub fn add_todo(&mut self) {
        match self.store.add_todo(&self.input) {
            Ok(todo) => {
                self.input.clear();
                self.mode = InputMode::Normal;
                self.render();
                if let Some(pos) = self.view.rows.iter().position(|r| r.id == todo.id) {
                    self.selected = pos;
                }
                self.report_saved("Added");
            }
            Err(TodoError::EmptyInput) => self.input.clear(),
            Err(TodoError::DuplicateDescription(_)) => {
                self.input.clear();
                self.show_hint(DUPLICATE_HINT);
            }
            Err(err) => self.set_status(&format!("Could not add todo: {err}")),
        }
    }

    /// Flip the selected todo. The row shows its new state at once; the
    /// visible list is re-filtered after the refilter delay.
    pub fn toggle_selected(&mut self) {
        let Some(row) = self.view.rows.get(self.selected) else {
            return;
        };
        let (id, done) = (row.id, !row.done);
        match self.store.set_done(id, done) {
            Ok(_) => {
                if let Some(row) = self.view.rows.get_mut(self.selected) {
                    row.done = done;
                }
                if let Some(handle) = self.pending_refilter.take() {
                    self.scheduler.cancel(handle);
                }
                self.pending_refilter =
                    Some(self.scheduler.schedule(self.refilter_delay, Deferred::Refilter));
                self.report_saved(if done { "Marked done" } else { "Marked open" });
            }
            Err(err) => self.set_status(&err.to_string()),
        }
    }

    pub fn select_filter(&mut self, filter: Filter) {
        self.select_filter_key(filter.key());
    }

    pub fn cycle_filter(&mut self) {
        self.select_filter(self.view.filter.next());
    }

    fn select_filter_key(&mut self, key: &str) {
        match self.store.select_filter(key) {
            Ok(filter) => {
                self.refilter_now();
                self.report_saved(&format!("Showing {filter}"));
            }
            Err(err) => self.set_status(&err.to_string()),
        }
    }

    pub fn remove_completed(&mut self) {
        let removed = self.store.remove_completed();
        self.refilter_now();
        if removed > 0 {
            self.report_saved(&format!("Removed {removed} completed"));
        } else {
            self.report_saved("No completed items");
        }
    }

    pub fn reload(&mut self) {
        self.store.initialize();
        self.refilter_now();
        self.set_status("Reloaded");
    }

    /// Advance deferred tasks by `elapsed` and run the ones that fell due.
    pub fn tick(&mut self, elapsed: Duration) {
        for task in self.scheduler.advance(elapsed) {
            match task {
                Deferred::Refilter => {
                    self.pending_refilter = None;
                    self.render();
                }
                Deferred::DismissHint => {
                    self.pending_hint = None;
                    self.hint = None;
                }
            }
        }
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status = Some(msg.to_string());
    }

    fn refilter_now(&mut self) {
        if let Some(handle) = self.pending_refilter.take() {
            self.scheduler.cancel(handle);
        }
        self.render();
    }

    fn show_hint(&mut self, hint: &'static str) {
        if let Some(handle) = self.pending_hint.take() {
            self.scheduler.cancel(handle);
        }
        self.hint = Some(hint);
        self.pending_hint = Some(self.scheduler.schedule(self.hint_duration, Deferred::DismissHint));
    }

    fn report_saved(&mut self, msg: &str) {
        match self.store.last_persist_error() {
            Some(err) => {
                let msg = format!("{msg} (not saved: {err})");
                self.set_status(&msg);
            }
            None => self.set_status(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::memory::MemoryKv;
    use crate::usecase::store::StorageLayout;

    fn app() -> App<MemoryKv> {
        let mut store = StateStore::new(MemoryKv::default(), StorageLayout::SingleBlob);
        store.initialize();
        App::new(store, &Config::default())
    }

    fn add(app: &mut App<MemoryKv>, text: &str) {
        app.start_editing();
        app.input.push_str(text);
        app.add_todo();
    }

    fn descriptions(app: &App<MemoryKv>) -> Vec<&str> {
        app.view.rows.iter().map(|r| r.description.as_str()).collect()
    }

    #[test]
    fn add_renders_and_selects_new_row() {
        let mut app = app();
        add(&mut app, "Buy milk");
        add(&mut app, "Walk dog");

        assert_eq!(descriptions(&app), ["Buy milk", "Walk dog"]);
        assert_eq!(app.selected, 1);
        assert_eq!(app.mode, InputMode::Normal);
        assert!(app.input.is_empty());
    }

    #[test]
    fn blank_add_clears_input_silently() {
        let mut app = app();
        add(&mut app, "   ");
        assert!(app.view.rows.is_empty());
        assert!(app.input.is_empty());
        assert_eq!(app.mode, InputMode::Editing);
        assert!(app.hint.is_none());
    }

    #[test]
    fn duplicate_shows_hint_until_dismissed() {
        let mut app = app();
        add(&mut app, "Buy milk");
        add(&mut app, "buy milk");

        assert_eq!(app.hint, Some(DUPLICATE_HINT));
        assert!(app.input.is_empty());
        assert_eq!(app.mode, InputMode::Editing);
        assert_eq!(app.counts(), (1, 1));

        app.tick(Duration::from_millis(2399));
        assert!(app.hint.is_some());
        app.tick(Duration::from_millis(1));
        assert!(app.hint.is_none());
    }

    #[test]
    fn repeated_duplicate_restarts_hint_timer() {
        let mut app = app();
        add(&mut app, "Buy milk");
        add(&mut app, "Buy milk");
        app.tick(Duration::from_millis(2000));
        app.input.push_str("BUY MILK");
        app.add_todo();

        app.tick(Duration::from_millis(2000));
        assert!(app.hint.is_some());
        app.tick(Duration::from_millis(400));
        assert!(app.hint.is_none());
    }

    #[test]
    fn toggle_refilters_after_delay() {
        let mut app = app();
        add(&mut app, "Buy milk");
        app.select_filter(Filter::Open);
        app.selected = 0;

        app.toggle_selected();
        assert_eq!(app.view.rows.len(), 1);
        assert!(app.view.rows[0].done);
        assert_eq!(app.counts(), (0, 1));

        app.tick(Duration::from_millis(799));
        assert_eq!(app.view.rows.len(), 1);
        app.tick(Duration::from_millis(1));
        assert!(app.view.rows.is_empty());
    }

    #[test]
    fn filter_change_renders_immediately() {
        let mut app = app();
        add(&mut app, "Buy milk");
        app.toggle_selected();

        app.select_filter(Filter::Done);
        assert_eq!(app.view.filter, Filter::Done);
        assert_eq!(descriptions(&app), ["Buy milk"]);

        app.cycle_filter();
        assert_eq!(app.view.filter, Filter::All);
    }

    #[test]
    fn remove_completed_clamps_selection() {
        let mut app = app();
        add(&mut app, "a");
        add(&mut app, "b");
        app.toggle_selected();

        app.remove_completed();
        assert_eq!(descriptions(&app), ["a"]);
        assert_eq!(app.selected, 0);
        assert_eq!(app.status.as_deref(), Some("Removed 1 completed"));
    }

    #[test]
    fn failed_save_is_reported_on_status() {
        let mut store = StateStore::new(MemoryKv::default(), StorageLayout::SingleBlob);
        store.kv_mut().set_fail_writes(true);
        let mut app = App::new(store, &Config::default());

        add(&mut app, "Buy milk");
        assert_eq!(descriptions(&app), ["Buy milk"]);
        assert!(app.status.as_deref().unwrap().contains("not saved"));
    }

    #[test]
    fn exhausted_ids_are_reported_and_input_kept() {
        let kv = MemoryKv::with_seed([(
            crate::usecase::store::STATE_KEY.to_string(),
            serde_json::json!({"nextId": u64::MAX}),
        )]);
        let mut store = StateStore::new(kv, StorageLayout::SingleBlob);
        store.initialize();
        let mut app = App::new(store, &Config::default());

        add(&mut app, "Buy milk");
        assert!(app.view.rows.is_empty());
        assert_eq!(app.input, "Buy milk");
        assert_eq!(
            app.status.as_deref(),
            Some("Could not add todo: no todo ids left")
        );
    }
}
