use serde_json::Value;

use crate::domain::todo::Todo;
use crate::error::{StorageError, TodoError};

pub mod http;
pub mod memory;
pub mod sqlite;

/// Local persistence: JSON values addressed by string keys.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn save(&mut self, key: &str, value: &Value) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), StorageError> {
        (**self).save(key, value)
    }
}

/// Remote owner of the todo collection; ids are assigned by the server.
pub trait TodoBackend {
    fn fetch_todos(&self) -> Result<Vec<Todo>, TodoError>;
    fn create_todo(&self, description: &str) -> Result<Todo, TodoError>;
}
