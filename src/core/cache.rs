//! Purpose: Materialize missing artifacts from a bundled content cache.
//! Exports: `ContentCache`, `DirCache`, `NoCache`, `install`.
//! Role: Install is best-effort; failures are logged and reported as `false`,
//! never escalated, so resolution can continue without the candidate.
//! Invariants: Destination is created exclusively, never overwritten.
//! Invariants: A short write deletes the destination (all-or-nothing).
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use libc::{EACCES, EPERM};
use tracing::{debug, warn};

/// Collaborator seam: "does this logical name exist in a bundle, and if so
/// give me its bytes".
pub trait ContentCache {
    fn try_fetch(&self, name: &str) -> Option<Vec<u8>>;
}

/// Content cache backed by a plain directory tree; cache keys are relative
/// paths under the root.
#[derive(Clone, Debug)]
pub struct DirCache {
    root: PathBuf,
}

impl DirCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentCache for DirCache {
    fn try_fetch(&self, name: &str) -> Option<Vec<u8>> {
        fs::read(self.root.join(name)).ok()
    }
}

/// Cache that holds nothing; every install attempt is a clean miss.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl ContentCache for NoCache {
    fn try_fetch(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }
}

/// Install the artifact named `key` from the cache to `destination`.
///
/// Callers probe existence first (probe-then-install); the exclusive create
/// here is a guard against clobbering, not inter-process coordination.
pub fn install(cache: &dyn ContentCache, key: &str, destination: &Path) -> bool {
    let Some(bytes) = cache.try_fetch(key) else {
        debug!(key, "install: not found in cache");
        return false;
    };

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
    {
        Ok(file) => file,
        Err(err) => {
            debug!(
                key,
                destination = %destination.display(),
                kind = ?classify_io(&err),
                %err,
                "install: failed to create destination",
            );
            return false;
        }
    };

    let written = file.write(&bytes).and_then(|n| file.flush().map(|_| n));
    drop(file);
    commit(destination, written, bytes.len())
}

/// Verify the write outcome; on error or short write, remove the partial
/// destination so installation is all-or-nothing.
fn commit(destination: &Path, written: io::Result<usize>, expected: usize) -> bool {
    match written {
        Ok(n) if n == expected => {
            debug!(destination = %destination.display(), bytes = expected, "installed artifact from cache");
            true
        }
        Ok(n) => {
            warn!(
                destination = %destination.display(),
                expected,
                written = n,
                "install: short write, removing partial artifact",
            );
            let _ = fs::remove_file(destination);
            false
        }
        Err(err) => {
            warn!(
                destination = %destination.display(),
                kind = ?classify_io(&err),
                %err,
                "install: write failed, removing partial artifact",
            );
            let _ = fs::remove_file(destination);
            false
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum IoClass {
    Permission,
    Exists,
    Other,
}

fn classify_io(err: &io::Error) -> IoClass {
    let errno = err.raw_os_error().unwrap_or_default();
    if errno == EACCES || errno == EPERM {
        return IoClass::Permission;
    }
    match err.kind() {
        io::ErrorKind::PermissionDenied => IoClass::Permission,
        io::ErrorKind::AlreadyExists => IoClass::Exists,
        _ => IoClass::Other,
    }
}
