//! Directory traversal feeding the work queue.

use std::path::{Path, PathBuf};
use std::time::Duration;

use jwalk::{Parallelism, WalkDir};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wordfreq_core::{CountConfig, CountError, ScanWarning, WarningKind};

/// Outcome of a walk.
#[derive(Debug, Clone, Default)]
pub struct WalkSummary {
    /// Matching files handed to the work queue.
    pub files_found: u64,
    /// Entries below the root that could not be read.
    pub warnings: Vec<ScanWarning>,
    /// False when the walk stopped early (cancelled or no workers left).
    pub completed: bool,
}

/// Canonicalize the root and check that it is a readable directory.
pub fn resolve_root(root: &Path) -> Result<PathBuf, CountError> {
    let root_path = root.canonicalize().map_err(|e| CountError::io(root, e))?;

    let metadata = std::fs::metadata(&root_path).map_err(|e| CountError::io(&root_path, e))?;
    if !metadata.is_dir() {
        return Err(CountError::NotADirectory { path: root_path });
    }

    // Listing can still be denied on an existing directory.
    std::fs::read_dir(&root_path).map_err(|e| CountError::io(&root_path, e))?;

    Ok(root_path)
}

/// Walk `root` and send every matching non-directory path to `queue`.
///
/// Blocks on a full queue. The queue sender is owned by this call and dropped
/// on return, which closes the queue exactly once whatever the outcome.
/// Unreadable subdirectories become warnings; an unreadable root is fatal.
pub fn walk_files(
    root: &Path,
    config: &CountConfig,
    queue: async_channel::Sender<PathBuf>,
    cancel: &CancellationToken,
) -> Result<WalkSummary, CountError> {
    let parallelism = match config.walk_threads {
        0 => Parallelism::RayonDefaultPool {
            busy_timeout: Duration::from_millis(100),
        },
        n => Parallelism::RayonNewPool(n),
    };

    let walker = WalkDir::new(root)
        .parallelism(parallelism)
        .skip_hidden(!config.include_hidden)
        .follow_links(config.follow_symlinks)
        .sort(true);

    let mut summary = WalkSummary::default();

    for entry_result in walker {
        if cancel.is_cancelled() {
            debug!(files = summary.files_found, "walk cancelled");
            return Ok(summary);
        }

        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                if err.depth() == 0 {
                    let source = match err.io_error() {
                        Some(io) => std::io::Error::new(io.kind(), io.to_string()),
                        None => std::io::Error::other(err.to_string()),
                    };
                    return Err(CountError::io(path, source));
                }
                warn!(path = %path.display(), error = %err, "cannot read entry");
                let kind = err
                    .io_error()
                    .map_or(WarningKind::ReadError, |io| WarningKind::from_io_kind(io.kind()));
                summary
                    .warnings
                    .push(ScanWarning::new(path, err.to_string(), kind));
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if !config.matches_extension(&path) {
            continue;
        }

        if queue.send_blocking(path).is_err() {
            debug!(files = summary.files_found, "work queue closed, stopping walk");
            return Ok(summary);
        }
        summary.files_found += 1;
    }

    summary.completed = true;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("nested")).unwrap();
        fs::create_dir(root.join("nested/deeper")).unwrap();
        fs::create_dir(root.join("dir.txt")).unwrap();

        fs::write(root.join("a.txt"), "alpha").unwrap();
        fs::write(root.join("b.txt"), "beta").unwrap();
        fs::write(root.join("c.md"), "gamma").unwrap();
        fs::write(root.join("nested/d.txt"), "delta").unwrap();
        fs::write(root.join("nested/deeper/e.txt"), "epsilon").unwrap();
        fs::write(root.join("nested/deeper/f.log"), "zeta").unwrap();
        fs::write(root.join(".hidden.txt"), "eta").unwrap();

        temp
    }

    fn drain(rx: &async_channel::Receiver<PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        while let Ok(path) = rx.try_recv() {
            paths.push(path);
        }
        paths
    }

    #[test]
    fn test_flat_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        fs::write(temp.path().join("c.md"), "c").unwrap();

        let config = CountConfig::new(temp.path());
        let (tx, rx) = async_channel::bounded(16);
        let summary = walk_files(temp.path(), &config, tx, &CancellationToken::new()).unwrap();

        assert_eq!(summary.files_found, 2);
        assert!(summary.completed);
        assert!(rx.is_closed());

        let paths = drain(&rx);
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.extension().unwrap() == "txt"));
    }

    #[test]
    fn test_recursive_walk_skips_directories() {
        let temp = create_test_tree();
        let config = CountConfig::new(temp.path());
        let (tx, rx) = async_channel::bounded(16);
        let summary = walk_files(temp.path(), &config, tx, &CancellationToken::new()).unwrap();

        // a, b, nested/d, nested/deeper/e, .hidden; never the dir.txt directory
        assert_eq!(summary.files_found, 5);
        let paths = drain(&rx);
        assert!(paths.iter().all(|p| p.is_file()));
    }

    #[test]
    fn test_hidden_files_excluded() {
        let temp = create_test_tree();
        let config = CountConfig::builder()
            .root(temp.path())
            .include_hidden(false)
            .build()
            .unwrap();
        let (tx, _rx) = async_channel::bounded(16);
        let summary = walk_files(temp.path(), &config, tx, &CancellationToken::new()).unwrap();
        assert_eq!(summary.files_found, 4);
    }

    #[test]
    fn test_extension_filter() {
        let temp = create_test_tree();
        let config = CountConfig::builder()
            .root(temp.path())
            .extensions(vec!["log".to_string(), "md".to_string()])
            .build()
            .unwrap();
        let (tx, rx) = async_channel::bounded(16);
        let summary = walk_files(temp.path(), &config, tx, &CancellationToken::new()).unwrap();

        assert_eq!(summary.files_found, 2);
        let mut names: Vec<_> = drain(&rx)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["c.md", "f.log"]);
    }

    #[test]
    fn test_stops_when_queue_closed() {
        let temp = create_test_tree();
        let config = CountConfig::new(temp.path());
        let (tx, rx) = async_channel::bounded(16);
        drop(rx);

        let summary = walk_files(temp.path(), &config, tx, &CancellationToken::new()).unwrap();
        assert_eq!(summary.files_found, 0);
        assert!(!summary.completed);
    }

    #[test]
    fn test_cancelled_walk() {
        let temp = create_test_tree();
        let config = CountConfig::new(temp.path());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (tx, rx) = async_channel::bounded(16);
        let summary = walk_files(temp.path(), &config, tx, &cancel).unwrap();
        assert!(!summary.completed);
        assert!(rx.is_closed());
    }

    #[test]
    fn test_resolve_root_errors() {
        let temp = create_test_tree();

        let missing = resolve_root(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(missing, CountError::NotFound { .. }));

        let file = resolve_root(&temp.path().join("a.txt")).unwrap_err();
        assert!(matches!(file, CountError::NotADirectory { .. }));

        let ok = resolve_root(temp.path()).unwrap();
        assert!(ok.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entries_become_warnings() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), "alpha").unwrap();
        fs::write(root.join("sub/b.txt"), "beta").unwrap();
        symlink(root.join("sub"), root.join("sub/loop")).unwrap();
        symlink(root.join("missing"), root.join("broken.txt")).unwrap();

        let config = CountConfig::builder()
            .root(root)
            .follow_symlinks(true)
            .build()
            .unwrap();
        let (tx, rx) = async_channel::bounded(16);
        let summary = walk_files(root, &config, tx, &CancellationToken::new()).unwrap();

        assert!(summary.completed);
        assert!(!summary.warnings.is_empty());
        assert_eq!(summary.files_found, 2);

        let mut names: Vec<_> = drain(&rx)
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        names.sort();
        assert_eq!(names, vec![PathBuf::from("a.txt"), PathBuf::from("sub/b.txt")]);
    }
}
