//! File storage used to read content and write localized output.
//!
//! The [`Storage`] trait is the capability set the pipeline needs; paths are
//! `/`-separated and relative to the storage root, with any leading `/`
//! ignored (`/pages/home.json` and `pages/home.json` are the same file).
//! [`LocalStorage`] is the filesystem-backed implementation. Remote backends
//! report `is_remote() == true` so callers can avoid assumptions such as
//! cheap repeated reads.
//!
//! Errors keep "not found", "permission denied" and "already exists" apart
//! so callers can decide between retrying and failing fast.

use indexmap::IndexMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn from_io(path: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(path.to_string()),
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_string()),
            _ => StorageError::Io {
                path: path.to_string(),
                source,
            },
        }
    }

    /// Keeps the underlying IO error kind; only symlink loops have none.
    fn from_walk(path: &str, error: walkdir::Error) -> Self {
        let source = match error.into_io_error() {
            Some(source) => source,
            None => io::Error::other("symlink loop"),
        };
        Self::from_io(path, source)
    }
}

/// One directory visited by [`Storage::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Directory path relative to the storage root (`""` for the root).
    pub path: String,
    /// Names of immediate subdirectories.
    pub dirs: Vec<String>,
    /// Names of immediate files.
    pub files: Vec<String>,
}

pub trait Storage {
    /// Whether reads and writes go over the network.
    fn is_remote(&self) -> bool {
        false
    }

    fn read_file(&self, path: &str) -> Result<String, StorageError>;

    /// Read several files, keyed by `/`-prefixed path.
    fn read_files(&self, paths: &[&str]) -> Result<IndexMap<String, String>, StorageError> {
        paths
            .iter()
            .map(|path| Ok((format!("/{}", clean(path)), self.read_file(path)?)))
            .collect()
    }

    /// Write a file, creating parent directories as needed.
    fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError>;

    /// File paths below `path`, relative to it. A missing directory lists as
    /// empty.
    fn list_dir(&self, path: &str, recursive: bool) -> Result<Vec<String>, StorageError>;

    fn walk(&self, path: &str) -> Result<Vec<WalkEntry>, StorageError>;

    fn copy_file(&self, from: &str, to: &str) -> Result<(), StorageError>;

    fn copy_files(&self, pairs: &IndexMap<String, String>) -> Result<(), StorageError> {
        for (from, to) in pairs {
            self.copy_file(from, to)?;
        }
        Ok(())
    }

    fn move_file(&self, from: &str, to: &str) -> Result<(), StorageError>;

    fn move_files(&self, pairs: &IndexMap<String, String>) -> Result<(), StorageError> {
        for (from, to) in pairs {
            self.move_file(from, to)?;
        }
        Ok(())
    }

    /// Remove a directory tree. Removing a missing directory succeeds.
    fn delete_dir(&self, path: &str) -> Result<(), StorageError>;

    fn delete_file(&self, path: &str) -> Result<(), StorageError>;

    fn file_exists(&self, path: &str) -> Result<bool, StorageError>;

    fn file_size(&self, path: &str) -> Result<u64, StorageError>;
}

/// Strip leading and trailing separators.
fn clean(path: &str) -> &str {
    path.trim_matches('/')
}

/// Render a relative filesystem path with `/` separators.
fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a storage-relative one.
    pub fn full_path(&self, path: &str) -> PathBuf {
        let path = clean(path);
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    fn ensure_parent(&self, path: &str) -> Result<(), StorageError> {
        let full = self.full_path(path);
        let Some(parent) = full.parent() else {
            return Ok(());
        };
        match fs::create_dir_all(parent) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && parent.is_dir() => Ok(()),
            Err(e) => Err(StorageError::from_io(path, e)),
        }
    }
}

impl Storage for LocalStorage {
    fn read_file(&self, path: &str) -> Result<String, StorageError> {
        fs::read_to_string(self.full_path(path)).map_err(|e| StorageError::from_io(path, e))
    }

    fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError> {
        self.ensure_parent(path)?;
        fs::write(self.full_path(path), content).map_err(|e| StorageError::from_io(path, e))
    }

    fn list_dir(&self, path: &str, recursive: bool) -> Result<Vec<String>, StorageError> {
        let base = self.full_path(path);
        if !base.is_dir() {
            return Ok(Vec::new());
        }
        let max_depth = if recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&base)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| StorageError::from_walk(path, e))?;
            if entry.file_type().is_file() {
                let relative = entry.path().strip_prefix(&base).unwrap_or(entry.path());
                files.push(to_slash(relative));
            }
        }
        Ok(files)
    }

    fn walk(&self, path: &str) -> Result<Vec<WalkEntry>, StorageError> {
        let base = self.full_path(path);
        if !base.is_dir() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let mut entries = Vec::new();
        for dir in WalkDir::new(&base).sort_by_file_name() {
            let dir = dir.map_err(|e| StorageError::from_walk(path, e))?;
            if !dir.file_type().is_dir() {
                continue;
            }
            let mut record = WalkEntry {
                path: to_slash(dir.path().strip_prefix(&self.root).unwrap_or(dir.path())),
                dirs: Vec::new(),
                files: Vec::new(),
            };
            let mut children = fs::read_dir(dir.path())
                .and_then(|entries| entries.collect::<io::Result<Vec<_>>>())
                .map_err(|e| StorageError::from_io(path, e))?;
            children.sort_by_key(|c| c.file_name());
            for child in children {
                let name = child.file_name().to_string_lossy().into_owned();
                if child.path().is_dir() {
                    record.dirs.push(name);
                } else {
                    record.files.push(name);
                }
            }
            entries.push(record);
        }
        Ok(entries)
    }

    fn copy_file(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.ensure_parent(to)?;
        fs::copy(self.full_path(from), self.full_path(to))
            .map(|_| ())
            .map_err(|e| StorageError::from_io(from, e))
    }

    fn move_file(&self, from: &str, to: &str) -> Result<(), StorageError> {
        self.ensure_parent(to)?;
        fs::rename(self.full_path(from), self.full_path(to))
            .map_err(|e| StorageError::from_io(from, e))
    }

    fn delete_dir(&self, path: &str) -> Result<(), StorageError> {
        match fs::remove_dir_all(self.full_path(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_io(path, e)),
        }
    }

    fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        fs::remove_file(self.full_path(path)).map_err(|e| StorageError::from_io(path, e))
    }

    fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.full_path(path).is_file())
    }

    fn file_size(&self, path: &str) -> Result<u64, StorageError> {
        fs::metadata(self.full_path(path))
            .map(|m| m.len())
            .map_err(|e| StorageError::from_io(path, e))
    }
}
