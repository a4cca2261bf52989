use serde::Deserialize;
use std::path::PathBuf;

use super::edit::WeeklyField;
use super::{Session, SessionError};
use crate::time_utils::parse_iso_date;

/// Every user action the presentation layer can issue, one per operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    AddStudent {
        name: String,
    },
    /// Remove the named student, or the selected one when `name` is absent.
    RemoveStudent {
        #[serde(default)]
        name: Option<String>,
    },
    SelectStudent {
        #[serde(default)]
        name: Option<String>,
    },
    AddProject {
        #[serde(default)]
        name: String,
    },
    RemoveProject,
    SelectProject {
        #[serde(default)]
        index: Option<usize>,
    },
    AddWeekly,
    DeleteWeekly,
    SelectWeekly {
        #[serde(default)]
        index: Option<usize>,
    },
    ShowProjectOverview,
    SetProjectName {
        name: String,
    },
    SetProjectDates {
        #[serde(default)]
        start: Option<String>,
        #[serde(default)]
        end: Option<String>,
    },
    AddTodo {
        text: String,
    },
    SetTodoChecked {
        index: usize,
        checked: bool,
    },
    SetTodoText {
        index: usize,
        text: String,
    },
    RemoveCheckedTodos,
    SetWeeklyField {
        field: WeeklyField,
        value: String,
    },
    SetWeeklyDate {
        date: String,
    },
    CommitPending,
    Save,
    Load {
        path: PathBuf,
    },
}

impl Session {
    /// Run one command against the session.
    pub fn dispatch(&mut self, command: Command) -> Result<(), SessionError> {
        tracing::debug!(?command, "dispatch");
        match command {
            Command::AddStudent { name } => self.add_student(&name).map(drop),
            Command::RemoveStudent { name: Some(name) } => self.remove_student(&name),
            Command::RemoveStudent { name: None } => self.remove_selected_student(),
            Command::SelectStudent { name } => self.select_student(name.as_deref()),
            Command::AddProject { name } => self.add_project(&name).map(drop),
            Command::RemoveProject => self.remove_project(),
            Command::SelectProject { index } => self.select_project(index),
            Command::AddWeekly => self.add_weekly().map(drop),
            Command::DeleteWeekly => self.delete_weekly(),
            Command::SelectWeekly { index } => self.select_weekly(index),
            Command::ShowProjectOverview => self.select_weekly(None),
            Command::SetProjectName { name } => self.edit_project(|form| form.name = name),
            Command::SetProjectDates { start, end } => {
                let start = start.as_deref().map(parse_date).transpose()?;
                let end = end.as_deref().map(parse_date).transpose()?;
                self.edit_project(|form| {
                    if let Some(start) = start {
                        form.start_date = start;
                    }
                    if let Some(end) = end {
                        form.end_date = end;
                    }
                })
            }
            Command::AddTodo { text } => self.edit_project(|form| {
                form.add_todo(&text);
            }),
            Command::SetTodoChecked { index, checked } => {
                self.try_edit_project(|form| form.set_todo_checked(index, checked))
            }
            Command::SetTodoText { index, text } => {
                self.try_edit_project(|form| form.set_todo_text(index, &text))
            }
            Command::RemoveCheckedTodos => self.edit_project(|form| {
                form.remove_checked_todos();
            }),
            Command::SetWeeklyField { field, value } => {
                self.edit_weekly(|form| *form.field_mut(field) = value)
            }
            Command::SetWeeklyDate { date } => {
                let date = parse_date(&date)?;
                self.edit_weekly(|form| form.date = date)
            }
            Command::CommitPending => self.commit_pending().map(drop),
            Command::Save => self.save(),
            Command::Load { path } => self.load(path),
        }
    }
}

fn parse_date(value: &str) -> Result<time::Date, SessionError> {
    parse_iso_date(value).ok_or_else(|| SessionError::InvalidDate(value.to_string()))
}
