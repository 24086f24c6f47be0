use crate::scanner::{FoundDir, ScanEvent, Scanner};
use anyhow::Result;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The root handed to [`clean`] is missing or not a directory.
#[derive(Debug)]
pub struct InaccessibleRoot {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for InaccessibleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot scan {}: {}", self.path.display(), self.reason)
    }
}

impl std::error::Error for InaccessibleRoot {}

#[derive(Default)]
pub struct CleanResult {
    pub deleted: Vec<FoundDir>,
    pub failed: Vec<(FoundDir, io::Error)>,
    /// Matches gone before deletion, and pending directories gone before
    /// they could be listed.
    pub vanished: Vec<PathBuf>,
    /// Directories below the root that could not be listed.
    pub unreadable: Vec<(PathBuf, io::Error)>,
}

impl CleanResult {
    pub fn total_cleaned(&self) -> u64 {
        self.deleted.iter().map(|d| d.size_bytes).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Progress callbacks for [`clean`].
pub trait Observer {
    /// Called right before a match is deleted.
    fn removing(&mut self, dir: &FoundDir);

    fn failed(&mut self, _dir: &FoundDir, _err: &io::Error) {}

    fn visiting(&mut self, _path: &Path) {}

    fn skipped(&mut self, _path: &Path, _reason: &str) {}
}

impl<F: FnMut(&FoundDir)> Observer for F {
    fn removing(&mut self, dir: &FoundDir) {
        self(dir)
    }
}

fn check_root(root: &Path) -> Result<(), InaccessibleRoot> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(InaccessibleRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(err) => Err(InaccessibleRoot {
            path: root.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

/// Walks `root` and deletes every directory whose name is in the target set.
///
/// Each match is reported to `observer` and then removed together with
/// everything below it. Deletion failures are collected per match and do not
/// stop the walk; only an inaccessible root is an error.
pub fn clean<O: Observer>(root: &Path, mut observer: O) -> Result<CleanResult> {
    check_root(root)?;

    let mut result = CleanResult::default();

    for event in Scanner::new(root) {
        match event {
            ScanEvent::Visiting(path) => observer.visiting(&path),
            ScanEvent::Found(dir) => {
                observer.removing(&dir);
                match fs::remove_dir_all(&dir.path) {
                    Ok(()) => result.deleted.push(dir),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        observer.skipped(&dir.path, "vanished before removal");
                        result.vanished.push(dir.path);
                    }
                    Err(e) => {
                        observer.failed(&dir, &e);
                        result.failed.push((dir, e));
                    }
                }
            }
            ScanEvent::Vanished(path) => {
                observer.skipped(&path, "vanished during scan");
                result.vanished.push(path);
            }
            ScanEvent::Unreadable(path, err) => {
                observer.skipped(&path, &err.to_string());
                result.unreadable.push((path, err));
            }
        }
    }

    Ok(result)
}
