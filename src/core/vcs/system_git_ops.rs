//! Clone, checkout and log operations for SystemGit

use super::system_git::SystemGit;
use super::{COMMIT_LINE_FORMAT, CommitRange, VersionControl, Workspace};
use crate::core::error::{AuditError, AuditResult, GitError, ResultExt};
use std::path::Path;

impl VersionControl for SystemGit {
  fn acquire(&self, url: &str, dest: &Path) -> AuditResult<Workspace> {
    if dest.exists() {
      return Err(
        GitError::DestinationExists {
          path: dest.to_path_buf(),
        }
        .into(),
      );
    }
    if let Some(parent) = dest.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create clone directory {}", parent.display()))?;
    }

    let mut cmd = self.git_cmd(None);
    cmd.args(["clone", "--quiet", url]).arg(dest);

    let output = cmd.output().context("Failed to execute git clone")?;
    // Register the guard before checking status so a partial clone is removed too.
    let workspace = Workspace::new(dest);

    if !output.status.success() {
      return Err(
        GitError::CloneFailed {
          url: self.scrub(url),
          reason: self.scrub(&String::from_utf8_lossy(&output.stderr)),
        }
        .into(),
      );
    }

    Ok(workspace)
  }

  fn checkout(&self, workspace: &Workspace, branch: &str) -> AuditResult<()> {
    let mut cmd = self.git_cmd(Some(workspace.path()));
    cmd.args(["checkout", "--quiet", branch]);

    match self.run(cmd, "git checkout") {
      Ok(_) => Ok(()),
      Err(AuditError::Git(GitError::CommandFailed { stderr, .. })) => Err(
        GitError::CheckoutFailed {
          branch: branch.to_string(),
          reason: stderr,
        }
        .into(),
      ),
      Err(e) => Err(e),
    }
  }

  fn log(&self, workspace: &Workspace, range: &CommitRange) -> AuditResult<String> {
    let mut cmd = self.git_cmd(Some(workspace.path()));
    cmd
      .args(["log", "--no-merges", "--no-color"])
      .arg(format!("--pretty=format:{}", COMMIT_LINE_FORMAT))
      .arg(range.to_string())
      .arg("--");

    let output = self.run(cmd, &format!("git log {}", range))?;
    Ok(String::from_utf8(output.stdout)?)
  }
}
