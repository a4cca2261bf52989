//! Open-todo listing scoped by the selection.

use serde::Serialize;

use crate::app::Selection;
use crate::types::{Document, Project};

/// Which part of the document to collect todos from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoScope<'a> {
    Document,
    Student(&'a str),
    Project { student: &'a str, index: usize },
}

impl<'a> TodoScope<'a> {
    /// The narrowest scope the selection describes: no student selects the
    /// whole document, a student without project that student.
    pub fn from_selection(selection: &'a Selection) -> Self {
        match (selection.student.as_deref(), selection.project) {
            (None, _) => Self::Document,
            (Some(student), None) => Self::Student(student),
            (Some(student), Some(index)) => Self::Project { student, index },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenTodo {
    pub student: String,
    pub project: String,
    pub text: String,
}

/// Unchecked todos in document order: students, then projects, then todos,
/// each in stored order.
pub fn open_todos(document: &Document, scope: TodoScope<'_>) -> Vec<OpenTodo> {
    let mut rows = Vec::new();
    match scope {
        TodoScope::Document => {
            for (student, entry) in &document.students {
                for project in &entry.projects {
                    push_project_rows(&mut rows, student, project);
                }
            }
        }
        TodoScope::Student(student) => {
            if let Some(entry) = document.students.get(student) {
                for project in &entry.projects {
                    push_project_rows(&mut rows, student, project);
                }
            }
        }
        TodoScope::Project { student, index } => {
            if let Some(project) = document
                .students
                .get(student)
                .and_then(|entry| entry.projects.get(index))
            {
                push_project_rows(&mut rows, student, project);
            }
        }
    }
    rows
}

fn push_project_rows(rows: &mut Vec<OpenTodo>, student: &str, project: &Project) {
    rows.extend(project.open_todos().map(|todo| OpenTodo {
        student: student.to_string(),
        project: project.display_name().to_string(),
        text: todo.text.clone(),
    }));
}
