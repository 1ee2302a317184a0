use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use super::filter::FilterSelection;
use super::todo::{Todo, TodoId};
use crate::error::TodoError;

/// Canonical session state: todos in insertion order, the filter selection
/// and the id counter.
///
/// The counter never falls below `max(id) + 1`; every constructor and the
/// deserializer go through [`AppState::restore`] to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredState", into = "StoredState")]
pub struct AppState {
    pub(crate) todos: Vec<Todo>,
    pub(crate) filters: FilterSelection,
    pub(crate) next_id: TodoId,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            filters: FilterSelection::default(),
            next_id: 1,
        }
    }
}

impl AppState {
    /// Fails with [`TodoError::IdsExhausted`] when no counter above the
    /// largest id fits in a [`TodoId`].
    pub fn restore(
        todos: Vec<Todo>,
        filters: FilterSelection,
        next_id: TodoId,
    ) -> Result<Self, TodoError> {
        let floor = match todos.iter().map(|t| t.id).max() {
            Some(max) => max.checked_add(1).ok_or(TodoError::IdsExhausted)?,
            None => 1,
        };
        Ok(Self {
            todos,
            filters,
            next_id: next_id.max(floor),
        })
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    #[cfg(test)]
    pub fn next_id(&self) -> TodoId {
        self.next_id
    }

    pub fn open_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.done).count()
    }

    /// Hand out the next id and advance the counter.
    pub(crate) fn allocate_id(&mut self) -> Result<TodoId, TodoError> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(TodoError::IdsExhausted)?;
        Ok(id)
    }

    /// Append a todo whose id was assigned elsewhere, keeping the counter
    /// ahead of it. Leaves the state untouched when the id is too large.
    pub(crate) fn push(&mut self, todo: Todo) -> Result<(), TodoError> {
        let after = todo.id.checked_add(1).ok_or(TodoError::IdsExhausted)?;
        self.next_id = self.next_id.max(after);
        self.todos.push(todo);
        Ok(())
    }
}

/// JSON layout of the single-blob key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    #[serde(default)]
    todos: Vec<Todo>,
    #[serde(default, deserialize_with = "filters_or_default")]
    filters: FilterSelection,
    #[serde(default)]
    next_id: TodoId,
}

/// A bad filter map costs only the selection, never the todos.
fn filters_or_default<'de, D>(deserializer: D) -> Result<FilterSelection, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_else(|err| {
        warn!(error = %err, "discarding unparsable filter selection");
        FilterSelection::default()
    }))
}

impl TryFrom<StoredState> for AppState {
    type Error = TodoError;

    fn try_from(stored: StoredState) -> Result<Self, Self::Error> {
        AppState::restore(stored.todos, stored.filters, stored.next_id)
    }
}

impl From<AppState> for StoredState {
    fn from(state: AppState) -> Self {
        Self {
            todos: state.todos,
            filters: state.filters,
            next_id: state.next_id,
        }
    }
}

/// JSON layout of the todo key in the split layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTodos {
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub next_id: TodoId,
}

impl From<&AppState> for StoredTodos {
    fn from(state: &AppState) -> Self {
        Self {
            todos: state.todos.clone(),
            next_id: state.next_id,
        }
    }
}
