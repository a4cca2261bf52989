//! The editing surface and the gate between it and the document.
//!
//! Loading the model into the surface happens inside a [`LoadGuard`]; while a
//! guard is alive every change notification is ignored. Edits reach the
//! document only through [`EditCommitGate::commit_pending`], which callers run
//! before any operation that moves the selection. Forms that were written are
//! reloaded from the document, so the surface always shows what was stored.

use std::ops::{Deref, DerefMut};

use serde::Deserialize;
use time::Date;

use super::selection::SelectionController;
use crate::error::{CrudError, SaveError};
use crate::storage::DocumentFile;
use crate::types::{dedup_todos, Document, Project, Todo, Weekly, BLANK_PROJECT_NAME};

/// Editable copy of a project's header fields and todo list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectForm {
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub todos: Vec<Todo>,
}

impl ProjectForm {
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            start_date: project.start_date,
            end_date: project.end_date,
            todos: project.todos.clone(),
        }
    }

    /// Append an unchecked todo. Blank text is ignored.
    pub fn add_todo(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.todos.push(Todo::open(text));
        true
    }

    pub fn set_todo_checked(&mut self, index: usize, checked: bool) -> Result<(), CrudError> {
        self.todo_mut(index)?.checked = checked;
        Ok(())
    }

    pub fn set_todo_text(&mut self, index: usize, text: &str) -> Result<(), CrudError> {
        self.todo_mut(index)?.text = text.to_string();
        Ok(())
    }

    fn todo_mut(&mut self, index: usize) -> Result<&mut Todo, CrudError> {
        let len = self.todos.len();
        self.todos
            .get_mut(index)
            .ok_or(CrudError::TodoOutOfRange { index, len })
    }

    /// Drop every checked todo, returning how many were removed.
    pub fn remove_checked_todos(&mut self) -> usize {
        let before = self.todos.len();
        self.todos.retain(|todo| !todo.checked);
        before - self.todos.len()
    }

    /// Write into `project`, returning whether anything changed.
    fn apply_to(&self, project: &mut Project) -> bool {
        let name = match self.name.trim() {
            "" => BLANK_PROJECT_NAME.to_string(),
            name => name.to_string(),
        };
        let todos = dedup_todos(self.todos.iter().cloned());

        let changed = project.name != name
            || project.start_date != self.start_date
            || project.end_date != self.end_date
            || project.todos != todos;
        if changed {
            project.name = name;
            project.start_date = self.start_date;
            project.end_date = self.end_date;
            project.todos = todos;
        }
        changed
    }
}

/// Free-text fields of a weekly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeeklyField {
    Title,
    Planned,
    Done,
    NextPlanned,
}

/// Editable copy of a weekly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyForm {
    pub date: Date,
    pub title: String,
    pub planned: String,
    pub done: String,
    pub next_planned: String,
}

impl WeeklyForm {
    pub fn from_weekly(weekly: &Weekly) -> Self {
        Self {
            date: weekly.date,
            title: weekly.title.clone(),
            planned: weekly.planned.clone(),
            done: weekly.done.clone(),
            next_planned: weekly.next_planned.clone(),
        }
    }

    pub fn field_mut(&mut self, field: WeeklyField) -> &mut String {
        match field {
            WeeklyField::Title => &mut self.title,
            WeeklyField::Planned => &mut self.planned,
            WeeklyField::Done => &mut self.done,
            WeeklyField::NextPlanned => &mut self.next_planned,
        }
    }

    fn apply_to(&self, weekly: &mut Weekly) -> bool {
        let committed = Weekly {
            date: self.date,
            title: self.title.trim().to_string(),
            planned: self.planned.trim_end().to_string(),
            done: self.done.trim_end().to_string(),
            next_planned: self.next_planned.trim_end().to_string(),
        };
        if *weekly == committed {
            return false;
        }
        *weekly = committed;
        true
    }
}

/// What the editor currently holds. `None` means that part of the editor is
/// cleared and disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSurface {
    pub project: Option<ProjectForm>,
    pub weekly: Option<WeeklyForm>,
}

impl EditSurface {
    /// Fill both forms from whatever the selection points at.
    pub fn load_from(&mut self, controller: &SelectionController) {
        self.project = controller.current_project().map(ProjectForm::from_project);
        self.weekly = controller.current_weekly().map(WeeklyForm::from_weekly);
    }

    pub fn clear(&mut self) {
        self.project = None;
        self.weekly = None;
    }
}

/// Result of [`EditCommitGate::commit_pending`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commit {
    pub project: bool,
    pub weekly: bool,
}

impl Commit {
    pub fn wrote(&self) -> bool {
        self.project || self.weekly
    }
}

/// Result of a surface change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Raised while the surface was being loaded from the model.
    Suppressed,
    /// The surface matches the model or nothing is selected.
    NothingToCommit,
    /// Written into the document and marked dirty; `saved` tells whether
    /// autosave ran.
    Committed { saved: bool },
}

/// Dirty tracking, autosave and the load bracket around the surface.
#[derive(Debug, Default)]
pub struct EditCommitGate {
    surface: EditSurface,
    load_depth: usize,
    dirty: bool,
    autosave: bool,
}

impl EditCommitGate {
    pub fn new(autosave: bool) -> Self {
        Self {
            autosave,
            ..Self::default()
        }
    }

    pub fn surface(&self) -> &EditSurface {
        &self.surface
    }

    /// Direct access for typing into the surface without notifying a change.
    /// The edit still reaches the document on the next commit.
    pub fn surface_mut(&mut self) -> &mut EditSurface {
        &mut self.surface
    }

    pub fn is_loading(&self) -> bool {
        self.load_depth > 0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    pub fn set_autosave(&mut self, enabled: bool) {
        self.autosave = enabled;
    }

    /// Open a load bracket. Notifications are suppressed until the guard is
    /// dropped, on every exit path.
    pub fn begin_load(&mut self) -> LoadGuard<'_> {
        self.load_depth += 1;
        LoadGuard { gate: self }
    }

    /// Run a fallible population of the surface inside a load bracket.
    pub fn populate<T, E>(
        &mut self,
        fill: impl FnOnce(&mut EditSurface) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut guard = self.begin_load();
        fill(&mut guard.surface)
    }

    /// Reload both forms from the current selection.
    pub fn load_from(&mut self, controller: &SelectionController) {
        let mut guard = self.begin_load();
        guard.surface.load_from(controller);
    }

    /// Write the surface into the selected project and weekly.
    ///
    /// Does nothing while loading or when the selection has no matching
    /// entity. Fields that already match are not counted as a write.
    pub fn commit_pending(&self, controller: &mut SelectionController) -> Commit {
        if self.is_loading() {
            return Commit::default();
        }

        let mut commit = Commit::default();
        if let (Some(form), Some(project)) = (&self.surface.project, controller.current_project_mut()) {
            commit.project = form.apply_to(project);
        }
        if let (Some(form), Some(weekly)) = (&self.surface.weekly, controller.current_weekly_mut()) {
            commit.weekly = form.apply_to(weekly);
        }
        if commit.wrote() {
            tracing::debug!(?commit, "committed pending edits");
        }
        commit
    }

    /// Commit the surface and reload every form that was written, so trimming
    /// and todo dedup show up in the surface too.
    pub fn commit(&mut self, controller: &mut SelectionController) -> Commit {
        let commit = self.commit_pending(controller);
        if commit.wrote() {
            let mut guard = self.begin_load();
            if commit.project {
                guard.surface.project = controller.current_project().map(ProjectForm::from_project);
            }
            if commit.weekly {
                guard.surface.weekly = controller.current_weekly().map(WeeklyForm::from_weekly);
            }
        }
        commit
    }

    /// Handle a change notification from the surface.
    ///
    /// An `Err` means the edit was committed but autosave failed; the
    /// document stays dirty.
    pub fn surface_changed(
        &mut self,
        controller: &mut SelectionController,
        file: &mut DocumentFile,
    ) -> Result<Change, SaveError> {
        if self.is_loading() {
            return Ok(Change::Suppressed);
        }
        if !self.commit(controller).wrote() {
            return Ok(Change::NothingToCommit);
        }
        let saved = self.record_change(controller.document(), file)?;
        Ok(Change::Committed { saved })
    }

    /// Mark the document dirty and autosave if enabled. Returns whether a
    /// save happened.
    pub fn record_change(
        &mut self,
        document: &Document,
        file: &mut DocumentFile,
    ) -> Result<bool, SaveError> {
        self.dirty = true;
        if !self.autosave {
            return Ok(false);
        }
        self.save(document, file)?;
        Ok(true)
    }

    /// Persist the document. The dirty flag is cleared only on success.
    pub fn save(&mut self, document: &Document, file: &mut DocumentFile) -> Result<(), SaveError> {
        match file.save(document) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                tracing::error!(path = %file.path().display(), "failed to save document: {e}");
                Err(e)
            }
        }
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// Scoped load bracket returned by [`EditCommitGate::begin_load`].
pub struct LoadGuard<'a> {
    gate: &'a mut EditCommitGate,
}

impl Deref for LoadGuard<'_> {
    type Target = EditCommitGate;

    fn deref(&self) -> &Self::Target {
        self.gate
    }
}

impl DerefMut for LoadGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.gate
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.gate.load_depth -= 1;
    }
}
