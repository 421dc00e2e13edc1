//! Directory operations over world folders.
//!
//! Recursive copy, delete and move of world directory trees, plus discovery of
//! world directories inside the world container. File copies and deletions fan
//! out over a bounded worker pool; directory structure is handled in a single
//! top-down (copy) or bottom-up (delete) pass around them.
//!
//! Long copies and deletes are not cancellable: dropping the returned future
//! stops scheduling new files, but files already handed to a worker finish.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use worldkeeper_domain::WorldName;

/// The host's canonical marker: a directory is a world iff it contains this file.
pub const WORLD_MARKER_FILE: &str = "level.dat";

/// The host's per-world unique identity file.
pub const UID_MARKER_FILE: &str = "uid.dat";

/// Lock file the host holds while a world is live.
pub const SESSION_LOCK_FILE: &str = "session.lock";

/// Host-internal files that are never copied: a copy carrying them would be
/// mistaken by the host for the original world.
pub const VOLATILE_FILES: &[&str] = &[UID_MARKER_FILE, SESSION_LOCK_FILE];

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File worker failed: {0}")]
    Worker(String),
}

impl FsError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a copy did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub directories: usize,
    pub files: usize,
    pub bytes: u64,
    /// Symbolic links recreated as links.
    pub links: usize,
    pub skipped: usize,
}

/// How a move was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// A single atomic rename.
    Renamed,
    /// Rename was not possible (e.g. across filesystems): copied, then deleted.
    CopiedAndDeleted,
}

/// Filesystem operations with a bounded pool of file workers.
pub struct DirectoryOps {
    workers: Arc<Semaphore>,
    worker_count: usize,
}

impl DirectoryOps {
    /// Minimum number of concurrent file workers.
    pub const MIN_WORKERS: usize = 2;

    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(Self::MIN_WORKERS);
        Self {
            workers: Arc::new(Semaphore::new(worker_count)),
            worker_count,
        }
    }

    /// Worker count matching the machine's parallelism (at least two).
    pub fn default_worker_count() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(Self::MIN_WORKERS)
            .max(Self::MIN_WORKERS)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn exists(path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Whether `dir` is a directory containing the world marker file.
    pub async fn is_world_dir(dir: &Path) -> bool {
        tokio::fs::metadata(dir.join(WORLD_MARKER_FILE))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Names of every subdirectory of `container` that holds a world marker.
    ///
    /// Directories whose names are not valid world names are ignored. A missing
    /// container yields an empty list. The result is sorted.
    pub async fn list_world_dirs(container: &Path) -> Result<Vec<WorldName>, FsError> {
        let mut entries = match tokio::fs::read_dir(container).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FsError::io(container, e)),
        };

        let mut worlds = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FsError::io(container, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir || !Self::is_world_dir(&entry.path()).await {
                continue;
            }
            let Some(Ok(name)) = entry.file_name().to_str().map(WorldName::new) else {
                tracing::debug!(path = %entry.path().display(), "Skipping world dir with unusable name");
                continue;
            };
            worlds.push(name);
        }
        worlds.sort();
        Ok(worlds)
    }

    // =========================================================================
    // Copy
    // =========================================================================

    /// Recursively copy `source` to `dest`, skipping [`VOLATILE_FILES`].
    ///
    /// Symbolic links are recreated as links, never followed. Fails with
    /// `NotFound` if `source` is missing and `AlreadyExists` if `dest` is
    /// present. Every directory is created before any file inside it is
    /// copied; all file copies are joined before this returns.
    pub async fn copy_tree(&self, source: &Path, dest: &Path) -> Result<CopyStats, FsError> {
        if !Self::exists(source).await {
            return Err(FsError::NotFound(source.to_path_buf()));
        }
        if Self::exists(dest).await {
            return Err(FsError::AlreadyExists(dest.to_path_buf()));
        }

        let mut stats = CopyStats::default();
        let mut copies: JoinSet<Result<u64, FsError>> = JoinSet::new();

        // Every scheduled copy is joined, even after a failure, so nothing
        // is still writing into `dest` once this returns.
        let scheduled = self
            .schedule_copies(source, dest, &mut stats, &mut copies)
            .await;
        let mut first_error = scheduled.err();
        while let Some(joined) = copies.join_next().await {
            match joined.map_err(|e| FsError::Worker(e.to_string())) {
                Ok(Ok(bytes)) => stats.bytes += bytes,
                Ok(Err(e)) | Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        tracing::debug!(
            source = %source.display(),
            dest = %dest.display(),
            files = stats.files,
            directories = stats.directories,
            links = stats.links,
            skipped = stats.skipped,
            bytes = stats.bytes,
            "Copied directory tree"
        );
        Ok(stats)
    }

    /// Top-down walk: creates each directory, then hands its files to the
    /// worker pool.
    async fn schedule_copies(
        &self,
        source: &Path,
        dest: &Path,
        stats: &mut CopyStats,
        copies: &mut JoinSet<Result<u64, FsError>>,
    ) -> Result<(), FsError> {
        let mut pending = vec![(source.to_path_buf(), dest.to_path_buf())];

        while let Some((from_dir, to_dir)) = pending.pop() {
            tokio::fs::create_dir_all(&to_dir)
                .await
                .map_err(|e| FsError::io(&to_dir, e))?;
            stats.directories += 1;

            let mut entries = tokio::fs::read_dir(&from_dir)
                .await
                .map_err(|e| FsError::io(&from_dir, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| FsError::io(&from_dir, e))?
            {
                let file_name = entry.file_name();
                let from = entry.path();
                let to = to_dir.join(&file_name);
                // Not followed: a link is never a directory here.
                let file_type = entry.file_type().await.map_err(|e| FsError::io(&from, e))?;
                if file_type.is_dir() {
                    pending.push((from, to));
                    continue;
                }
                if is_volatile(&file_name) {
                    stats.skipped += 1;
                    continue;
                }
                if file_type.is_symlink() {
                    if copy_symlink(&from, &to).await? {
                        stats.links += 1;
                    } else {
                        stats.skipped += 1;
                    }
                    continue;
                }

                let permit = self
                    .workers
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| FsError::Worker(e.to_string()))?;
                copies.spawn(async move {
                    let _permit = permit;
                    tokio::fs::copy(&from, &to)
                        .await
                        .map_err(|e| FsError::io(&from, e))
                });
                stats.files += 1;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Recursively delete `path`. Already-missing entries are not an error.
    ///
    /// Files are removed in parallel; directories are removed afterwards,
    /// children before parents. Symbolic links are removed, never followed.
    pub async fn delete_tree(&self, path: &Path) -> Result<(), FsError> {
        let root = match tokio::fs::symlink_metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(FsError::io(path, e)),
        };
        if !root.is_dir() {
            return remove_file_if_exists(path).await;
        }

        // Pre-order list of directories; reversed it is a valid post-order.
        let mut directories = Vec::new();
        let mut pending = vec![path.to_path_buf()];
        let mut deletions: JoinSet<Result<(), FsError>> = JoinSet::new();

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(FsError::io(&dir, e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| FsError::io(&dir, e))?
            {
                let entry_path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| FsError::io(&entry_path, e))?;
                if file_type.is_dir() {
                    pending.push(entry_path);
                    continue;
                }

                let permit = self
                    .workers
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| FsError::Worker(e.to_string()))?;
                deletions.spawn(async move {
                    let _permit = permit;
                    remove_file_if_exists(&entry_path).await
                });
            }
            directories.push(dir);
        }

        while let Some(joined) = deletions.join_next().await {
            joined.map_err(|e| FsError::Worker(e.to_string()))??;
        }

        for dir in directories.iter().rev() {
            match tokio::fs::remove_dir(dir).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => {
                    return Err(FsError::io(dir, e));
                }
                _ => {}
            }
        }

        tracing::debug!(path = %path.display(), directories = directories.len(), "Deleted directory tree");
        Ok(())
    }

    // =========================================================================
    // Move
    // =========================================================================

    /// Move `source` to `dest`: an atomic rename where the OS allows it,
    /// otherwise copy followed by deleting the original. The fallback copy
    /// skips [`VOLATILE_FILES`] like any other copy.
    pub async fn move_tree(&self, source: &Path, dest: &Path) -> Result<MoveKind, FsError> {
        if !Self::exists(source).await {
            return Err(FsError::NotFound(source.to_path_buf()));
        }
        if Self::exists(dest).await {
            return Err(FsError::AlreadyExists(dest.to_path_buf()));
        }

        match tokio::fs::rename(source, dest).await {
            Ok(()) => Ok(MoveKind::Renamed),
            Err(e) => {
                tracing::warn!(
                    source = %source.display(),
                    dest = %dest.display(),
                    error = %e,
                    "Atomic rename failed, falling back to copy and delete"
                );
                self.move_by_copy(source, dest).await
            }
        }
    }

    /// Copy `source` to `dest`, then delete `source`.
    ///
    /// A failed copy removes whatever it wrote to `dest`, unless `dest` was
    /// already there, so only the original is left behind.
    async fn move_by_copy(&self, source: &Path, dest: &Path) -> Result<MoveKind, FsError> {
        if let Err(copy_error) = self.copy_tree(source, dest).await {
            if !matches!(copy_error, FsError::AlreadyExists(_)) {
                if let Err(e) = self.delete_tree(dest).await {
                    tracing::warn!(dest = %dest.display(), error = %e, "Failed to remove partial copy");
                }
            }
            return Err(copy_error);
        }
        self.delete_tree(source).await?;
        Ok(MoveKind::CopiedAndDeleted)
    }
}

impl Default for DirectoryOps {
    fn default() -> Self {
        Self::new(Self::default_worker_count())
    }
}

fn is_volatile(file_name: &std::ffi::OsStr) -> bool {
    file_name
        .to_str()
        .is_some_and(|name| VOLATILE_FILES.contains(&name))
}

/// Recreate the link at `from` as `to`. Returns `false` where links are
/// unsupported and the entry was skipped.
#[cfg(unix)]
async fn copy_symlink(from: &Path, to: &Path) -> Result<bool, FsError> {
    let target = tokio::fs::read_link(from)
        .await
        .map_err(|e| FsError::io(from, e))?;
    tokio::fs::symlink(&target, to)
        .await
        .map_err(|e| FsError::io(to, e))?;
    Ok(true)
}

#[cfg(not(unix))]
async fn copy_symlink(from: &Path, _to: &Path) -> Result<bool, FsError> {
    tracing::debug!(path = %from.display(), "Skipping symbolic link");
    Ok(false)
}

/// Remove a single file, treating "already gone" as success.
pub async fn remove_file_if_exists(path: &Path) -> Result<(), FsError> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(FsError::io(path, e)),
        _ => Ok(()),
    }
}
