use serde::Serialize;

/// Request body of `POST <todos-endpoint>`.
#[derive(Debug, Serialize)]
pub struct NewTodo<'a> {
    pub description: &'a str,
    pub done: bool,
}

impl<'a> NewTodo<'a> {
    pub fn open(description: &'a str) -> Self {
        Self {
            description,
            done: false,
        }
    }
}
