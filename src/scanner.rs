use crate::targets::{find_target, TargetDir};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FoundDir {
    pub path: PathBuf,
    pub target: &'static TargetDir,
    pub size_bytes: u64,
}

impl FoundDir {
    pub fn size_human(&self) -> String {
        format_size(self.size_bytes)
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

/// What the traversal ran into.
#[derive(Debug)]
pub enum ScanEvent {
    /// Entered a non-matching directory.
    Visiting(PathBuf),
    Found(FoundDir),
    /// A pending directory disappeared before it could be listed.
    Vanished(PathBuf),
    /// A directory that could not be listed. Its subtree is skipped.
    Unreadable(PathBuf, io::Error),
}

/// Depth-first walk over the directories below a root, yielding matches
/// without ever descending into them.
///
/// Children of a directory are listed in full (sorted by name) before any of
/// them is yielded, so a consumer may delete a `Found` directory as soon as it
/// receives it. Matches are never pushed onto the pending stack.
pub struct Scanner {
    pending: Vec<PathBuf>,
    ready: VecDeque<ScanEvent>,
}

impl Scanner {
    pub fn new(root: &Path) -> Self {
        Scanner {
            pending: vec![root.to_path_buf()],
            ready: VecDeque::new(),
        }
    }

    fn expand(&mut self, dir: PathBuf) {
        let mut subdirs: Vec<PathBuf> = Vec::new();

        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                    let err = io::Error::from(err);
                    if err.kind() == io::ErrorKind::NotFound {
                        self.ready.push_back(ScanEvent::Vanished(path));
                    } else {
                        self.ready.push_back(ScanEvent::Unreadable(path, err));
                    }
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let target = entry.file_name().to_str().and_then(find_target);
            match target {
                Some(target) => {
                    let path = entry.into_path();
                    let size_bytes = dir_size(&path);
                    self.ready.push_back(ScanEvent::Found(FoundDir {
                        path,
                        target,
                        size_bytes,
                    }));
                }
                None => subdirs.push(entry.into_path()),
            }
        }

        // Reversed so the stack pops in name order.
        self.pending.extend(subdirs.into_iter().rev());
    }
}

impl Iterator for Scanner {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<ScanEvent> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(event);
            }
            let dir = self.pending.pop()?;
            self.ready.push_back(ScanEvent::Visiting(dir.clone()));
            self.expand(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn found_paths(root: &Path) -> Vec<PathBuf> {
        Scanner::new(root)
            .filter_map(|event| match event {
                ScanEvent::Found(found) => Some(found.path),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn finds_targets_at_any_depth() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".vs")).unwrap();
        fs::create_dir_all(dir.path().join("a/b/c/out")).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();

        let found = found_paths(dir.path());
        assert_eq!(
            found,
            vec![dir.path().join(".vs"), dir.path().join("a/b/c/out")]
        );
    }

    #[test]
    fn does_not_descend_into_matches() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/out/out")).unwrap();
        fs::create_dir_all(dir.path().join("a/out/x/.vs")).unwrap();

        let found = found_paths(dir.path());
        assert_eq!(found, vec![dir.path().join("a/out")]);
    }

    #[test]
    fn ignores_files_with_target_names() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("out"), "not a dir").unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/.vs"), "").unwrap();

        assert!(found_paths(dir.path()).is_empty());
    }

    #[test]
    fn root_itself_is_never_a_match() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("out");
        fs::create_dir_all(root.join("src")).unwrap();

        assert!(found_paths(&root).is_empty());
    }

    #[test]
    fn measures_match_size() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("out/obj")).unwrap();
        fs::write(dir.path().join("out/a.bin"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("out/obj/b.bin"), vec![0u8; 28]).unwrap();

        let found: Vec<FoundDir> = Scanner::new(dir.path())
            .filter_map(|event| match event {
                ScanEvent::Found(found) => Some(found),
                _ => None,
            })
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].size_bytes, 128);
        assert_eq!(found[0].target.dir_name, "out");
    }

    #[test]
    fn visits_each_directory_once() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::create_dir_all(dir.path().join("c")).unwrap();

        let visited: Vec<PathBuf> = Scanner::new(dir.path())
            .filter_map(|event| match event {
                ScanEvent::Visiting(path) => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(
            visited,
            vec![
                dir.path().to_path_buf(),
                dir.path().join("a"),
                dir.path().join("a/b"),
                dir.path().join("c"),
            ]
        );
    }

    #[test]
    fn pending_dir_removed_between_steps_is_vanished() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/out")).unwrap();
        fs::create_dir_all(dir.path().join("b/out")).unwrap();

        let mut scanner = Scanner::new(dir.path());
        // The root is listed by the first step; `a` and `b` are now pending.
        assert!(matches!(scanner.next(), Some(ScanEvent::Visiting(_))));
        fs::remove_dir_all(dir.path().join("a")).unwrap();

        let events: Vec<ScanEvent> = scanner.collect();
        let vanished: Vec<&PathBuf> = events
            .iter()
            .filter_map(|event| match event {
                ScanEvent::Vanished(path) => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(vanished, vec![&dir.path().join("a")]);
        assert!(events.iter().any(
            |event| matches!(event, ScanEvent::Found(found) if found.path == dir.path().join("b/out"))
        ));
        assert!(!events.iter().any(|event| matches!(event, ScanEvent::Unreadable(..))));
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2.0 GB");
    }
}
