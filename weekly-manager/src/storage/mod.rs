//! Persistence of the document file.

mod fs;
#[cfg(test)]
mod memory;

use std::path::{Path, PathBuf};

use crate::error::{SaveError, StoreError};
use crate::types::Document;

pub use fs::FsStore;
#[cfg(test)]
pub use memory::MemoryStore;

/// Synchronous byte-level access to the place a document lives.
pub trait DocumentStore {
    /// Read the whole file. A missing file is [`StoreError::NotFound`].
    fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError>;

    /// Replace the whole file.
    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Serialize a document the way it is written to disk: indented JSON,
/// non-ASCII text kept as-is, trailing newline.
pub fn encode_document(document: &Document) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// The document file of a session: where it lives and how it is reached.
pub struct DocumentFile {
    store: Box<dyn DocumentStore>,
    path: PathBuf,
}

impl DocumentFile {
    pub fn new(store: impl DocumentStore + 'static, path: impl Into<PathBuf>) -> Self {
        Self {
            store: Box::new(store),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        self.store.read(path)
    }

    /// Encode `document` and replace the file with it.
    pub fn save(&mut self, document: &Document) -> Result<(), SaveError> {
        let bytes = encode_document(document)?;
        self.store.write(&self.path, &bytes)?;
        tracing::info!(path = %self.path.display(), bytes = bytes.len(), "document saved");
        Ok(())
    }
}
