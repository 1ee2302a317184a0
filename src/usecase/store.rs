//! State Store: the single owner and mutator of [`AppState`].
//!
//! Every mutation is applied in memory first and then written back through
//! the [`KeyValueStore`]. A failed write is logged and remembered but never
//! rolls the in-memory state back; the running session stays the source of
//! truth.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::filter::{Filter, FilterSelection};
use crate::domain::state::{AppState, StoredTodos};
use crate::domain::todo::{Todo, TodoId};
use crate::error::TodoError;
use crate::repo::{KeyValueStore, TodoBackend};

pub const STATE_KEY: &str = "appState";
pub const TODOS_KEY: &str = "appStateTodos";
pub const FILTERS_KEY: &str = "appStateFilters";

/// How [`AppState`] is spread over keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageLayout {
    /// Everything under [`STATE_KEY`].
    #[default]
    SingleBlob,
    /// Todos and counter under [`TODOS_KEY`], filters under [`FILTERS_KEY`].
    Split,
}

pub struct StateStore<K: KeyValueStore> {
    kv: K,
    layout: StorageLayout,
    backend: Option<Box<dyn TodoBackend>>,
    state: AppState,
    last_persist_error: Option<String>,
}

impl<K: KeyValueStore> StateStore<K> {
    pub fn new(kv: K, layout: StorageLayout) -> Self {
        Self {
            kv,
            layout,
            backend: None,
            state: AppState::default(),
            last_persist_error: None,
        }
    }

    /// Let a remote backend own the todo collection. Only the filter
    /// selection is then kept in the key-value store.
    pub fn with_backend(mut self, backend: Box<dyn TodoBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[cfg(test)]
    pub fn kv(&self) -> &K {
        &self.kv
    }

    #[cfg(test)]
    pub fn kv_mut(&mut self) -> &mut K {
        &mut self.kv
    }

    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Load persisted state, falling back to defaults for anything absent
    /// or unreadable.
    pub fn initialize(&mut self) {
        self.state = if let Some(backend) = &self.backend {
            let filters = self.load_as::<FilterSelection>(FILTERS_KEY).unwrap_or_default();
            let todos = backend.fetch_todos().unwrap_or_else(|err| {
                warn!(error = %err, "starting with an empty list");
                Vec::new()
            });
            AppState::restore(todos, filters, 0).unwrap_or_else(|err| {
                warn!(error = %err, "discarding fetched todos");
                AppState::restore(Vec::new(), filters, 0).unwrap_or_default()
            })
        } else {
            match self.layout {
                StorageLayout::SingleBlob => self.load_as::<AppState>(STATE_KEY).unwrap_or_default(),
                StorageLayout::Split => {
                    let stored = self.load_as::<StoredTodos>(TODOS_KEY).unwrap_or_default();
                    let filters = self.load_as::<FilterSelection>(FILTERS_KEY).unwrap_or_default();
                    AppState::restore(stored.todos, filters, stored.next_id).unwrap_or_else(
                        |err| {
                            warn!(key = TODOS_KEY, error = %err, "discarding persisted todos");
                            AppState::restore(Vec::new(), filters, 0).unwrap_or_default()
                        },
                    )
                }
            }
        };
        info!(
            todos = self.state.todos.len(),
            filter = %self.state.filters.selected(),
            next_id = self.state.next_id,
            "state initialized"
        );
    }

    pub fn add_todo(&mut self, description: &str) -> Result<Todo, TodoError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TodoError::EmptyInput);
        }
        if self.state.todos.iter().any(|t| t.describes(description)) {
            return Err(TodoError::DuplicateDescription(description.to_string()));
        }

        let todo = match &self.backend {
            Some(backend) => backend.create_todo(description)?,
            None => Todo::new(self.state.allocate_id()?, description),
        };
        self.state.push(todo.clone())?;
        debug!(id = todo.id, "todo added");
        self.persist_logged();
        Ok(todo)
    }

    pub fn set_done(&mut self, id: TodoId, done: bool) -> Result<Todo, TodoError> {
        let todo = self
            .state
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TodoError::NotFound(id))?;
        todo.done = done;
        let todo = todo.clone();
        debug!(id, done, "todo updated");
        self.persist_logged();
        Ok(todo)
    }

    /// Drop every done todo; returns how many were removed.
    pub fn remove_completed(&mut self) -> usize {
        let before = self.state.todos.len();
        self.state.todos.retain(|t| !t.done);
        let removed = before - self.state.todos.len();
        debug!(removed, "completed todos removed");
        self.persist_logged();
        removed
    }

    pub fn select_filter(&mut self, key: &str) -> Result<Filter, TodoError> {
        let filter: Filter = key.parse()?;
        self.state.filters.select(filter);
        debug!(%filter, "filter selected");
        self.persist_logged();
        Ok(filter)
    }

    /// Write the current state through the key-value store.
    pub fn persist(&mut self) -> Result<(), TodoError> {
        for (key, value) in self.encode()? {
            self.kv.save(key, &value)?;
        }
        Ok(())
    }

    fn persist_logged(&mut self) {
        match self.persist() {
            Ok(()) => self.last_persist_error = None,
            Err(err) => {
                warn!(error = %err, "state kept in memory only");
                self.last_persist_error = Some(err.to_string());
            }
        }
    }

    fn encode(&self) -> Result<Vec<(&'static str, Value)>, TodoError> {
        if self.backend.is_some() {
            return Ok(vec![(FILTERS_KEY, to_value(&self.state.filters)?)]);
        }
        encode_state(self.layout, &self.state)
    }

    fn load_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.kv.load(key) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warn!(key, error = %err, "discarding unparsable persisted value");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(key, error = %err, "failed to read persisted value");
                None
            }
        }
    }
}

/// Key/value pairs that represent `state` under `layout`.
pub fn encode_state(
    layout: StorageLayout,
    state: &AppState,
) -> Result<Vec<(&'static str, Value)>, TodoError> {
    Ok(match layout {
        StorageLayout::SingleBlob => vec![(STATE_KEY, to_value(state)?)],
        StorageLayout::Split => vec![
            (TODOS_KEY, to_value(&StoredTodos::from(state))?),
            (FILTERS_KEY, to_value(state.filters())?),
        ],
    })
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, TodoError> {
    serde_json::to_value(value).map_err(|e| TodoError::StorageUnavailable(e.into()))
}
