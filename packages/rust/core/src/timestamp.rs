//! Recency of note sources, taken from version control.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Maps a note's source path to a unix timestamp. Never fails.
pub trait TimestampSource {
    fn resolve(&self, content_path: &Path) -> i64;
}

/// Last commit time touching a path, from `git log`.
///
/// Falls back to the current time when git is missing, the path is untracked,
/// or the output cannot be parsed.
#[derive(Debug, Clone)]
pub struct GitTimestamps {
    repo_root: PathBuf,
}

impl GitTimestamps {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    fn last_commit_time(&self, content_path: &Path) -> Option<i64> {
        let pathspec = content_path
            .strip_prefix(&self.repo_root)
            .unwrap_or(content_path);

        let output = Command::new("git")
            .args(["log", "-1", "--pretty=format:%ct", "--"])
            .arg(pathspec)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|e| debug!(error = %e, "git not available"))
            .ok()?;

        if !output.status.success() {
            debug!(status = ?output.status.code(), "git log failed");
            return None;
        }

        parse_timestamp(&String::from_utf8_lossy(&output.stdout))
    }
}

impl TimestampSource for GitTimestamps {
    fn resolve(&self, content_path: &Path) -> i64 {
        match self.last_commit_time(content_path) {
            Some(ts) => ts,
            None => {
                debug!(path = %content_path.display(), "no commit time, using current time");
                now()
            }
        }
    }
}

/// Current wall-clock time as unix seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn parse_timestamp(stdout: &str) -> Option<i64> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}
