use serde::{Deserialize, Serialize};

/// Positive identifier, assigned once and never reused.
pub type TodoId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub description: String,
    #[serde(alias = "doneState")]
    pub done: bool,
}

impl Todo {
    pub fn new(id: TodoId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            done: false,
        }
    }

    /// Case-insensitive description comparison used for duplicate detection.
    pub fn describes(&self, description: &str) -> bool {
        self.description.to_lowercase() == description.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_ignores_case() {
        let todo = Todo::new(1, "Buy milk");
        assert!(todo.describes("buy MILK"));
        assert!(!todo.describes("buy milk!"));
    }

    #[test]
    fn accepts_done_state_alias() {
        let todo: Todo =
            serde_json::from_str(r#"{"id":4,"description":"Walk dog","doneState":true}"#)
                .unwrap();
        assert_eq!(todo.id, 4);
        assert!(todo.done);

        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["done"], true);
        assert!(json.get("doneState").is_none());
    }
}
