//! Filesystem abstraction for the persistence engine.
//!
//! The engine only ever reads and writes whole files plus one atomic rename,
//! so the surface is deliberately small. Tests substitute their own
//! implementation to force I/O failures at specific stages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Minimal filesystem surface consumed by `persist`.
pub trait StateFs {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove(&self, path: &Path) -> io::Result<()>;
    fn stat(&self, path: &Path) -> io::Result<fs::Metadata>;
}

/// Real filesystem implementation over `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct OsFs;

impl StateFs for OsFs {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(path, bytes)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn stat(&self, path: &Path) -> io::Result<fs::Metadata> {
        fs::metadata(path)
    }
}

/// Ambient configuration for one logical operation: the working root under
/// which the state file lives. Carries no cancellation; none of the engine's
/// operations are long-running.
#[derive(Debug, Clone)]
pub struct WorkContext {
    root: PathBuf,
}

impl WorkContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        WorkContext { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
