use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

use crate::time_utils::{add_days, DEFAULT_PROJECT_DAYS};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Schema version written by this crate. Older versions are only read.
pub const CURRENT_VERSION: u32 = 4;

/// Name of the implicit project created for legacy single-project students.
pub const DEFAULT_PROJECT_NAME: &str = "Standardprojekt";

/// Fallback used when a committed project name is blank.
pub const BLANK_PROJECT_NAME: &str = "Projekt";

/// The whole weekly-report file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub version: u32,
    pub students: BTreeMap<String, Student>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            students: BTreeMap::new(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Student names sorted case-insensitively for display.
    pub fn sorted_student_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.students.keys().map(String::as_str).collect();
        names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then(a.cmp(b)));
        names
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    #[serde(rename = "project_todos")]
    pub todos: Vec<Todo>,
    pub weeklies: Vec<Weekly>,
}

impl Project {
    /// An empty project running from `start` for the default project length.
    pub fn new(name: impl Into<String>, start: Date) -> Self {
        Self {
            name: name.into(),
            start_date: start,
            end_date: add_days(start, DEFAULT_PROJECT_DAYS),
            todos: Vec::new(),
            weeklies: Vec::new(),
        }
    }

    /// Name as shown in lists; never blank.
    pub fn display_name(&self) -> &str {
        match self.name.trim() {
            "" => BLANK_PROJECT_NAME,
            name => name,
        }
    }

    pub fn open_todos(&self) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(|todo| !todo.checked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub text: String,
    pub checked: bool,
}

impl Todo {
    pub fn open(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            checked: false,
        }
    }

    /// Key used for duplicate detection: trimmed and lowercased.
    pub fn dedup_key(&self) -> String {
        self.text.trim().to_lowercase()
    }
}

/// Drop blank todos and later case-insensitive duplicates, keeping the first
/// occurrence with its checked state.
pub fn dedup_todos(todos: impl IntoIterator<Item = Todo>) -> Vec<Todo> {
    let mut seen = std::collections::HashSet::new();
    todos
        .into_iter()
        .filter_map(|todo| {
            let text = todo.text.trim();
            if text.is_empty() {
                return None;
            }
            let todo = Todo {
                text: text.to_string(),
                checked: todo.checked,
            };
            seen.insert(todo.dedup_key()).then_some(todo)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weekly {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub title: String,
    pub planned: String,
    pub done: String,
    pub next_planned: String,
}

impl Weekly {
    pub fn new(date: Date, planned: impl Into<String>) -> Self {
        Self {
            date,
            title: String::new(),
            planned: planned.into(),
            done: String::new(),
            next_planned: String::new(),
        }
    }
}
