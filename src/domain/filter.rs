use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::todo::Todo;
use crate::error::TodoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Open,
    Done,
}

impl Filter {
    /// Display order of the filter control.
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Open, Filter::Done];

    pub fn key(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Open => "open",
            Filter::Done => "done",
        }
    }

    pub fn keeps(self, todo: &Todo) -> bool {
        match self {
            Filter::All => true,
            Filter::Open => !todo.done,
            Filter::Done => todo.done,
        }
    }

    pub fn next(self) -> Filter {
        match self {
            Filter::All => Filter::Open,
            Filter::Open => Filter::Done,
            Filter::Done => Filter::All,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Filter {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Filter::All),
            "open" => Ok(Filter::Open),
            "done" => Ok(Filter::Done),
            other => Err(TodoError::UnknownFilter(other.to_string())),
        }
    }
}

/// Persisted shape of the filter selection: one boolean per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFlags {
    pub all: bool,
    pub open: bool,
    pub done: bool,
}

/// Mutually exclusive filter selection.
///
/// Stored as a single [`Filter`], so exactly one key is selected by
/// construction. Serializes to and from [`FilterFlags`]; a map that does not
/// have exactly one `true` key is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "FilterFlags", into = "FilterFlags")]
pub struct FilterSelection {
    selected: Filter,
}

impl FilterSelection {
    pub fn new(selected: Filter) -> Self {
        Self { selected }
    }

    pub fn selected(&self) -> Filter {
        self.selected
    }

    pub fn select(&mut self, filter: Filter) {
        self.selected = filter;
    }

    pub fn is_selected(&self, filter: Filter) -> bool {
        self.selected == filter
    }
}

impl From<FilterSelection> for FilterFlags {
    fn from(selection: FilterSelection) -> Self {
        Self {
            all: selection.is_selected(Filter::All),
            open: selection.is_selected(Filter::Open),
            done: selection.is_selected(Filter::Done),
        }
    }
}

impl TryFrom<FilterFlags> for FilterSelection {
    type Error = String;

    fn try_from(flags: FilterFlags) -> Result<Self, Self::Error> {
        match (flags.all, flags.open, flags.done) {
            (true, false, false) => Ok(Self::new(Filter::All)),
            (false, true, false) => Ok(Self::new(Filter::Open)),
            (false, false, true) => Ok(Self::new(Filter::Done)),
            _ => Err(format!(
                "filter selection must have exactly one key set, got {flags:?}"
            )),
        }
    }
}
