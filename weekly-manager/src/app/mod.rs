use std::path::{Path, PathBuf};
use time::Date;

use crate::error::{CrudError, LoadError, SaveError, SessionError, StoreError};
use crate::migration::migrate_bytes;
use crate::progress::{project_progress, Progress};
use crate::storage::DocumentFile;
use crate::time_utils;
use crate::todos::{open_todos, OpenTodo, TodoScope};
use crate::types::Document;

mod command;
mod edit;
mod selection;

pub use command::Command;
pub use edit::{
    Change, Commit, EditCommitGate, EditSurface, LoadGuard, ProjectForm, WeeklyField, WeeklyForm,
};
pub use selection::{Enablement, Selection, SelectionController};

/// How [`Session::start`] found the document file.
#[derive(Debug)]
pub enum Startup {
    Loaded,
    /// No file existed and an empty document was created. Holds the error of
    /// the initial save if it failed.
    Created { save_error: Option<SaveError> },
}

/// One open document: the model, the selection into it, the editing surface
/// and the file it is persisted to.
///
/// Every operation that moves the selection commits the surface first and
/// reloads it afterwards.
pub struct Session {
    controller: SelectionController,
    gate: EditCommitGate,
    file: DocumentFile,
    fixed_today: Option<Date>,
}

impl Session {
    /// An empty, clean session. Call [`Session::start`] to read the file.
    pub fn new(file: DocumentFile, autosave: bool) -> Self {
        Self {
            controller: SelectionController::default(),
            gate: EditCommitGate::new(autosave),
            file,
            fixed_today: None,
        }
    }

    /// Pin "today" instead of reading the clock.
    pub fn with_today(mut self, today: Date) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn today(&self) -> Date {
        self.fixed_today.unwrap_or_else(time_utils::today)
    }

    pub fn document(&self) -> &Document {
        self.controller.document()
    }

    pub fn selection(&self) -> &Selection {
        self.controller.selection()
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn enablement(&self) -> Enablement {
        self.controller.enablement()
    }

    pub fn surface(&self) -> &EditSurface {
        self.gate.surface()
    }

    /// Type into the surface without raising a change notification.
    pub fn surface_mut(&mut self) -> &mut EditSurface {
        self.gate.surface_mut()
    }

    pub fn is_dirty(&self) -> bool {
        self.gate.is_dirty()
    }

    pub fn autosave(&self) -> bool {
        self.gate.autosave()
    }

    pub fn set_autosave(&mut self, enabled: bool) {
        self.gate.set_autosave(enabled);
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    // ---------------------------------------------------------------------
    // File operations
    // ---------------------------------------------------------------------

    /// Read and migrate the session's file. A missing file starts an empty
    /// document and saves it right away.
    pub fn start(&mut self) -> Result<Startup, LoadError> {
        match self.file.read(self.file.path()) {
            Ok(bytes) => {
                let document = migrate_bytes(&bytes, self.today())?;
                tracing::info!(
                    path = %self.file.path().display(),
                    students = document.students.len(),
                    "document loaded"
                );
                self.install(document);
                Ok(Startup::Loaded)
            }
            Err(StoreError::NotFound(path)) => {
                tracing::info!(path = %path.display(), "no document yet, creating an empty one");
                self.install(Document::new());
                self.gate.mark_dirty();
                let save_error = self.gate.save(self.controller.document(), &mut self.file).err();
                Ok(Startup::Created { save_error })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Switch to another file. On failure the current document, selection
    /// and path stay active.
    pub fn load(&mut self, path: impl Into<PathBuf>) -> Result<(), SessionError> {
        let path = path.into();
        self.commit_pending()?;

        let bytes = self.file.read(&path).map_err(LoadError::from)?;
        let document = migrate_bytes(&bytes, self.today())?;
        tracing::info!(path = %path.display(), students = document.students.len(), "document loaded");

        self.file.set_path(path);
        self.install(document);
        Ok(())
    }

    /// Commit pending edits and write the document.
    pub fn save(&mut self) -> Result<(), SessionError> {
        if self.gate.commit(&mut self.controller).wrote() {
            self.gate.mark_dirty();
        }
        self.gate.save(self.controller.document(), &mut self.file)?;
        Ok(())
    }

    /// Final save when the editor shuts down.
    pub fn close(mut self) -> Result<(), SessionError> {
        self.save()
    }

    fn install(&mut self, document: Document) {
        self.controller.replace_document(document);
        self.gate.load_from(&self.controller);
        self.gate.mark_clean();
    }

    // ---------------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------------

    /// Commit the surface into the document, persisting if autosave is on.
    pub fn commit_pending(&mut self) -> Result<Commit, SessionError> {
        let commit = self.gate.commit(&mut self.controller);
        if commit.wrote() {
            self.gate
                .record_change(self.controller.document(), &mut self.file)?;
        }
        Ok(commit)
    }

    /// The surface reported a user edit.
    pub fn notify_surface_changed(&mut self) -> Result<Change, SessionError> {
        Ok(self.gate.surface_changed(&mut self.controller, &mut self.file)?)
    }

    /// Apply `edit` to the project form and notify the change.
    pub fn edit_project(&mut self, edit: impl FnOnce(&mut ProjectForm)) -> Result<(), SessionError> {
        self.try_edit_project(|form| {
            edit(form);
            Ok(())
        })
    }

    /// Like [`Session::edit_project`] for edits that can be rejected. A
    /// rejected edit is not notified.
    pub fn try_edit_project(
        &mut self,
        edit: impl FnOnce(&mut ProjectForm) -> Result<(), CrudError>,
    ) -> Result<(), SessionError> {
        let form = self
            .gate
            .surface_mut()
            .project
            .as_mut()
            .ok_or(CrudError::NoProjectSelected)?;
        edit(form)?;
        self.notify_surface_changed().map(drop)
    }

    /// Apply `edit` to the weekly form and notify the change.
    pub fn edit_weekly(&mut self, edit: impl FnOnce(&mut WeeklyForm)) -> Result<(), SessionError> {
        let form = self
            .gate
            .surface_mut()
            .weekly
            .as_mut()
            .ok_or(CrudError::NoWeeklySelected)?;
        edit(form);
        self.notify_surface_changed().map(drop)
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    pub fn select_student(&mut self, name: Option<&str>) -> Result<(), SessionError> {
        self.navigate(|c| c.select_student(name))
    }

    pub fn select_project(&mut self, index: Option<usize>) -> Result<(), SessionError> {
        self.navigate(|c| c.select_project(index))
    }

    pub fn select_weekly(&mut self, index: Option<usize>) -> Result<(), SessionError> {
        self.navigate(|c| c.select_weekly(index))
    }

    fn navigate(
        &mut self,
        step: impl FnOnce(&mut SelectionController) -> Result<(), CrudError>,
    ) -> Result<(), SessionError> {
        let pending = self.commit_pending();
        step(&mut self.controller)?;
        self.gate.load_from(&self.controller);
        pending.map(drop)
    }

    // ---------------------------------------------------------------------
    // CRUD
    // ---------------------------------------------------------------------

    pub fn add_student(&mut self, name: &str) -> Result<String, SessionError> {
        self.mutate(|c, _| c.add_student(name))
    }

    pub fn remove_student(&mut self, name: &str) -> Result<(), SessionError> {
        self.mutate(|c, _| c.remove_student(name).map(drop))
    }

    pub fn remove_selected_student(&mut self) -> Result<(), SessionError> {
        self.mutate(|c, _| c.remove_selected_student().map(drop))
    }

    pub fn add_project(&mut self, name: &str) -> Result<usize, SessionError> {
        self.mutate(|c, today| c.add_project(name, today))
    }

    pub fn remove_project(&mut self) -> Result<(), SessionError> {
        self.mutate(|c, _| c.remove_project().map(drop))
    }

    pub fn add_weekly(&mut self) -> Result<usize, SessionError> {
        self.mutate(|c, today| c.add_weekly(today))
    }

    pub fn delete_weekly(&mut self) -> Result<(), SessionError> {
        self.mutate(|c, _| c.delete_weekly().map(drop))
    }

    /// Commit, run a structural change, reload the surface and record the
    /// change.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut SelectionController, Date) -> Result<T, CrudError>,
    ) -> Result<T, SessionError> {
        let today = self.today();
        let commit = self.gate.commit_pending(&mut self.controller);
        let result = op(&mut self.controller, today);
        self.gate.load_from(&self.controller);

        match result {
            Ok(value) => {
                self.gate
                    .record_change(self.controller.document(), &mut self.file)?;
                Ok(value)
            }
            Err(e) => {
                // The rejection wins; a failed autosave is logged by the gate
                // and leaves the document dirty.
                if commit.wrote() {
                    let _ = self
                        .gate
                        .record_change(self.controller.document(), &mut self.file);
                }
                Err(e.into())
            }
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Open todos for the scope the selection describes.
    pub fn open_todos(&self) -> Vec<OpenTodo> {
        open_todos(self.document(), TodoScope::from_selection(self.selection()))
    }

    pub fn current_progress(&self) -> Option<Progress> {
        self.controller
            .current_project()
            .map(|project| project_progress(project, self.today()))
    }
}
