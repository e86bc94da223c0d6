//! Single-writer access to the scope file.
//!
//! Every write goes through a temp file in the same directory followed by a
//! rename, so readers see either the old or the new scope, never a torn one.
//! Read-modify-write cycles hold the store lock, so concurrent widen
//! requests from HTTP worker threads cannot lose each other's updates.

use super::{IsolationScope, ScopeError};
use crate::log;
use parking_lot::Mutex;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Outcome of [`ScopeStore::widen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widen {
    /// No (readable) scope file, the build is unrestricted.
    NoScope,
    /// Pattern was added and persisted.
    Added,
    /// Pattern was already included.
    AlreadyIncluded,
}

#[derive(Debug)]
pub struct ScopeStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ScopeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Current scope, or `None` when absent or unparseable.
    ///
    /// A corrupt file only disables isolation, it never stops a build.
    pub fn load(&self) -> Option<IsolationScope> {
        match self.read() {
            Ok(scope) => scope,
            Err(err) => {
                log!("scope"; "ignoring unreadable {}: {:#}", self.path.display(), anyhow::Error::from(err));
                None
            }
        }
    }

    fn read(&self) -> Result<Option<IsolationScope>, ScopeError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ScopeError::Io(self.path.clone(), err)),
        };
        match toml::from_str(&content) {
            Ok(scope) => Ok(Some(scope)),
            Err(err) => Err(ScopeError::Io(
                self.path.clone(),
                io::Error::new(io::ErrorKind::InvalidData, err),
            )),
        }
    }

    /// Replace the scope file atomically.
    pub fn save(&self, scope: &IsolationScope) -> Result<(), ScopeError> {
        let _guard = self.lock.lock();
        self.write(scope)
    }

    /// Add `pattern` to the persisted include set.
    pub fn widen(&self, pattern: &str) -> Result<Widen, ScopeError> {
        let _guard = self.lock.lock();

        let Some(mut scope) = self.load() else {
            return Ok(Widen::NoScope);
        };
        if !scope.widen(pattern) {
            return Ok(Widen::AlreadyIncluded);
        }
        self.write(&scope)?;
        Ok(Widen::Added)
    }

    /// Delete the scope file. Returns whether one existed.
    pub fn remove(&self) -> Result<bool, ScopeError> {
        let _guard = self.lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(ScopeError::Io(self.path.clone(), err)),
        }
    }

    fn write(&self, scope: &IsolationScope) -> Result<(), ScopeError> {
        let content = toml::to_string(scope)?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let io_err = |err| ScopeError::Io(self.path.clone(), err);

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        temp.write_all(content.as_bytes()).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(&self.path).map_err(|err| io_err(err.error))?;
        Ok(())
    }
}
