//! Document sources for amalgam-core.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{AmalgamError, Result};

/// Trait for loading document text from some backing store (filesystem, memory, etc.).
///
/// `Ok(None)` means the document does not exist; `Err` is reserved for
/// failures reading a document that does.
pub trait DocumentSource {
    fn load(&self, id: &str) -> Result<Option<String>>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for &S {
    fn load(&self, id: &str) -> Result<Option<String>> {
        (**self).load(id)
    }
}

/// Documents stored as files under an include root.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Every file under the root whose identifier starts with `prefix`, sorted.
    pub fn documents(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(AmalgamError::io(
                &self.root,
                io::Error::new(io::ErrorKind::NotFound, "include root is not a directory"),
            ));
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                AmalgamError::io(path, io::Error::other(err))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(id) = identifier_for(&self.root, entry.path()) {
                if id.starts_with(prefix) {
                    found.push(id);
                }
            }
        }
        found.sort();
        Ok(found)
    }
}

impl DocumentSource for FsSource {
    fn load(&self, id: &str) -> Result<Option<String>> {
        let path = self.path_of(id);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AmalgamError::io(path, err)),
        }
    }
}

/// Identifier of `path` relative to `root`, with `/` separators.
fn identifier_for(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

/// In-memory documents keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    docs: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(id, text);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.docs.insert(id.into(), text.into());
    }
}

impl DocumentSource for MemorySource {
    fn load(&self, id: &str) -> Result<Option<String>> {
        Ok(self.docs.get(id).cloned())
    }
}

/// Documents present in `all` that were never reached.
pub fn unreached<'a, I>(all: &[String], visited: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let seen: BTreeSet<&str> = visited.into_iter().collect();
    all.iter()
        .filter(|id| !seen.contains(id.as_str()))
        .cloned()
        .collect()
}
