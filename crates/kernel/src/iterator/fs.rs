//! A [`NamedReadCloserIterator`] that walks a directory tree, yielding one
//! entry per file with an ID derived from its path relative to the root.
//!
//! `spec.md` §9 design note: "the ID must be derived from a stable source
//! identifier (absolute path relative to a declared root)... renaming
//! files must change IDs predictably." This implementation makes that the
//! literal rule: the ID is the file's path relative to `root`, with
//! platform separators normalized to `/`, collected in a single
//! deterministic (lexicographic) walk order.

use super::{NamedReadCloserIterator, ReadClose};
use crate::error::PolicyError;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct DirectoryIterator {
    root: PathBuf,
    entries: std::vec::IntoIter<PathBuf>,
    error: Option<PolicyError>,
}

impl DirectoryIterator {
    /// Walks `root` eagerly and collects every regular file, sorted
    /// lexicographically by path for determinism. Only files whose name
    /// ends in `.json` are included — a directory of policy documents
    /// commonly sits alongside READMEs or other non-policy files.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let root = root.as_ref().to_path_buf();
        let mut files = Vec::new();
        collect_json_files(&root, &mut files)?;
        files.sort();
        Ok(Self {
            root,
            entries: files.into_iter(),
            error: None,
        })
    }

    fn id_for(&self, path: &Path) -> Result<String, PolicyError> {
        let relative = path.strip_prefix(&self.root).map_err(|_| {
            PolicyError::internal(
                "kernel",
                format!("path '{}' escaped its iteration root", path.display()),
            )
        })?;
        Ok(relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), PolicyError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| {
        PolicyError::invalid_input("kernel", format!("cannot read directory '{}': {e}", dir.display()))
    })?;
    for entry in read_dir {
        let entry = entry.map_err(|e| {
            PolicyError::invalid_input("kernel", format!("cannot read directory entry: {e}"))
        })?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| {
            PolicyError::invalid_input("kernel", format!("cannot stat '{}': {e}", path.display()))
        })?;
        if file_type.is_dir() {
            collect_json_files(&path, out)?;
        } else if file_type.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

impl NamedReadCloserIterator for DirectoryIterator {
    fn has_next(&self) -> bool {
        self.error.is_none() && self.entries.len() > 0
    }

    fn next(&mut self) -> (String, Box<dyn ReadClose>) {
        let path = self
            .entries
            .next()
            .expect("next() called with has_next() == false");
        match self.id_for(&path) {
            Ok(id) => match File::open(&path) {
                Ok(file) => (id, Box::new(file)),
                Err(e) => {
                    self.error = Some(PolicyError::invalid_input(
                        "kernel",
                        format!("cannot open '{}': {e}", path.display()),
                    ));
                    (id, Box::new(std::io::empty()))
                }
            },
            Err(e) => {
                self.error = Some(e);
                (
                    path.to_string_lossy().into_owned(),
                    Box::new(std::io::empty()),
                )
            }
        }
    }

    fn error(&self) -> Option<&PolicyError> {
        self.error.as_ref()
    }
}
