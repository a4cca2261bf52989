//! Read-only text views over a session.

use std::path::Path;

use serde::Serialize;

use crate::app::{Enablement, Selection, SelectionController, Session};
use crate::progress::{InvalidRange, Progress};
use crate::time_utils::{format_display_date, weekday_short};
use crate::todos::OpenTodo;
use crate::types::{Project, Weekly};

pub const APP_TITLE: &str = "Studierenden-Weeklies Manager";
const UNTITLED_WEEKLY: &str = "Ohne Titel";
const UNNAMED_FILE: &str = "Unbenannt";

/// `dd.mm.yyyy - Mo - Title`.
pub fn weekly_label(weekly: &Weekly) -> String {
    let title = match weekly.title.trim() {
        "" => UNTITLED_WEEKLY,
        title => title,
    };
    format!(
        "{} - {} - {}",
        format_display_date(weekly.date),
        weekday_short(weekly.date),
        title
    )
}

/// Describes the scope the open-todo list is showing.
pub fn todo_context_label(controller: &SelectionController) -> String {
    let selection = controller.selection();
    let Some(student) = selection.student.as_deref() else {
        return "Gesamt".to_string();
    };
    if selection.project.is_none() {
        return format!("Student: {student}");
    }

    let project = controller
        .current_project()
        .map_or("Projekt", Project::display_name);
    match selection.weekly {
        None => format!("Student: {student} | Projekt: {project}"),
        Some(_) => format!("Student: {student} | Projekt: {project} | Weekly aktiv"),
    }
}

pub fn progress_label(project: Option<&Project>, progress: Option<Progress>) -> String {
    let detail = match (project, progress) {
        (Some(project), Some(Progress::Percent(pct))) => format!(
            "{pct}% ({} - {})",
            format_display_date(project.start_date),
            format_display_date(project.end_date)
        ),
        (_, Some(Progress::Invalid(InvalidRange::EndBeforeStart))) => {
            "Enddatum liegt vor Startdatum".to_string()
        }
        (_, Some(Progress::Invalid(_))) => "Ungueltige Datumswerte".to_string(),
        _ => "-".to_string(),
    };
    format!("Projektfortschritt: {detail}")
}

/// `Alice - 2 Projekt(e) - 5 Weekly(s)`.
pub fn project_summary(student: &str, projects: &[Project]) -> String {
    let weeklies: usize = projects.iter().map(|p| p.weeklies.len()).sum();
    format!(
        "{student} - {} Projekt(e) - {weeklies} Weekly(s)",
        projects.len()
    )
}

/// `Thesis - 3 Weekly(s)`.
pub fn weekly_summary(project: &Project) -> String {
    format!(
        "{} - {} Weekly(s)",
        project.display_name(),
        project.weeklies.len()
    )
}

pub fn window_title(path: &Path, dirty: bool) -> String {
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or(UNNAMED_FILE.into());
    let marker = if dirty { " *" } else { "" };
    format!("{APP_TITLE} - {file}{marker}")
}

/// `[Alice | Thesis] Read ch1`.
pub fn open_todo_line(todo: &OpenTodo) -> String {
    format!("[{} | {}] {}", todo.student, todo.project, todo.text)
}

pub fn status_message(dirty: bool) -> &'static str {
    if dirty {
        "Ungespeicherte Aenderungen"
    } else {
        "Alle Aenderungen gespeichert"
    }
}

/// Everything a front end needs to redraw after an operation.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub title: String,
    pub status: &'static str,
    pub dirty: bool,
    pub students: Vec<String>,
    pub selection: Selection,
    pub enablement: Enablement,
    pub projects: Vec<String>,
    pub weeklies: Vec<String>,
    pub weekly_summary: Option<String>,
    pub context: String,
    pub open_todos: Vec<OpenTodo>,
    pub progress: String,
}

impl Snapshot {
    pub fn capture(session: &Session) -> Self {
        let controller = session.controller();
        let projects = controller.current_student_projects().unwrap_or_default();
        let weeklies = controller.current_weeklies().unwrap_or_default();

        Self {
            title: window_title(session.path(), session.is_dirty()),
            status: status_message(session.is_dirty()),
            dirty: session.is_dirty(),
            students: session
                .document()
                .sorted_student_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            selection: session.selection().clone(),
            enablement: session.enablement(),
            projects: projects
                .iter()
                .map(|p| p.display_name().to_string())
                .collect(),
            weeklies: weeklies.iter().map(weekly_label).collect(),
            weekly_summary: controller.current_project().map(weekly_summary),
            context: todo_context_label(controller),
            open_todos: session.open_todos(),
            progress: progress_label(controller.current_project(), session.current_progress()),
        }
    }
}
