pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use crate::core::error::{AuditError, AuditResult};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// `git log --pretty` format for one commit line: short hash | date | author | subject
pub const COMMIT_LINE_FORMAT: &str = "%h | %ad | %an | %s";

/// Revision range `start..end`: excludes `start`, includes `end`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
  pub start: String,
  pub end: String,
}

impl CommitRange {
  pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
    Self {
      start: start.into(),
      end: end.into(),
    }
  }
}

impl fmt::Display for CommitRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}", self.start, self.end)
  }
}

/// A cloned working copy that is deleted when released
///
/// Call [`Workspace::release`] as soon as the log has been read. If the guard
/// is dropped first (checkout or log failed), the directory is removed then.
#[derive(Debug)]
pub struct Workspace {
  path: PathBuf,
  released: bool,
}

impl Workspace {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      released: false,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Delete the working copy
  pub fn release(mut self) -> AuditResult<()> {
    self.released = true;
    remove_working_copy(&self.path).map_err(|e| {
      AuditError::message(format!("Failed to remove working copy {}: {}", self.path.display(), e))
    })
  }
}

impl Drop for Workspace {
  fn drop(&mut self) {
    if self.released {
      return;
    }
    if let Err(e) = remove_working_copy(&self.path) {
      tracing::warn!(path = %self.path.display(), error = %e, "failed to remove working copy");
    }
  }
}

fn remove_working_copy(path: &Path) -> io::Result<()> {
  match std::fs::remove_dir_all(path) {
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    other => other,
  }
}

/// Source-control collaborator used by the project reconciler
pub trait VersionControl {
  /// Clone `url` into `dest`
  fn acquire(&self, url: &str, dest: &Path) -> AuditResult<Workspace>;

  /// Check out `branch` in the working copy
  fn checkout(&self, workspace: &Workspace, branch: &str) -> AuditResult<()>;

  /// Non-merge commits in `range`, one formatted line per commit
  fn log(&self, workspace: &Workspace, range: &CommitRange) -> AuditResult<String>;
}
