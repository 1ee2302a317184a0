//! Filter/View projection: the only data handed to the rendering side.

use crate::domain::filter::{Filter, FilterSelection};
use crate::domain::state::AppState;
use crate::domain::todo::{Todo, TodoId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    pub id: TodoId,
    pub description: String,
    pub done: bool,
}

impl From<&Todo> for TodoRow {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            description: todo.description.clone(),
            done: todo.done,
        }
    }
}

/// Render-agnostic projection of the visible todos and the selected filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewModel {
    pub rows: Vec<TodoRow>,
    pub filter: Filter,
}

/// Todos kept by the selected filter, in insertion order.
pub fn compute_visible(state: &AppState) -> Vec<&Todo> {
    let filter = state.filters().selected();
    state.todos().iter().filter(|t| filter.keeps(t)).collect()
}

pub fn build_view_model<'a>(
    visible: impl IntoIterator<Item = &'a Todo>,
    filters: &FilterSelection,
) -> ViewModel {
    ViewModel {
        rows: visible.into_iter().map(TodoRow::from).collect(),
        filter: filters.selected(),
    }
}

pub fn project(state: &AppState) -> ViewModel {
    build_view_model(compute_visible(state), state.filters())
}
