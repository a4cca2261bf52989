use std::path::PathBuf;
use thiserror::Error;

/// The loaded JSON cannot be migrated at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("JSON root must be an object, found {0}")]
    RootNotObject(&'static str),
}

/// Errors raised by a [`crate::storage::DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

/// A load attempt failed; the previously active document stays in place.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// A save attempt failed; the document stays dirty.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A create/remove/select operation was rejected. The document and the
/// selection are left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CrudError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("student '{0}' already exists")]
    StudentExists(String),
    #[error("unknown student '{0}'")]
    UnknownStudent(String),
    #[error("no student selected")]
    NoStudentSelected,
    #[error("no project selected")]
    NoProjectSelected,
    #[error("no weekly selected")]
    NoWeeklySelected,
    #[error("project index {index} out of range ({len} projects)")]
    ProjectOutOfRange { index: usize, len: usize },
    #[error("weekly index {index} out of range ({len} weeklies)")]
    WeeklyOutOfRange { index: usize, len: usize },
    #[error("todo index {index} out of range ({len} todos)")]
    TodoOutOfRange { index: usize, len: usize },
}

/// Any failure of a session operation.
///
/// `Save` is special: the operation itself completed and the change is in
/// the document, but persisting it failed and the document stays dirty.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Crud(#[from] CrudError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}
