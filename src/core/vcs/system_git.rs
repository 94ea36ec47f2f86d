//! System git backend
//!
//! Shells out to the `git` binary for clone, checkout and log. Every command
//! runs in an isolated environment so user-level config and credential
//! helpers cannot change the output format or prompt for input.

use crate::core::error::{AuditResult, GitError, ResultExt};
use std::path::Path;
use std::process::{Command, Output};

/// Git backend using system git
#[derive(Debug, Clone, Default)]
pub struct SystemGit {
  /// Secrets to scrub from error output (passwords embedded in clone URLs)
  pub(crate) secrets: Vec<String>,
}

impl SystemGit {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a value that must never appear in error messages
  pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
    let secret = secret.into();
    if !secret.is_empty() {
      self.secrets.push(secret);
    }
    self
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Runs in `dir` when given
  /// - Clears environment variables, whitelisting PATH and HOME
  /// - Disables terminal credential prompts
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self, dir: Option<&Path>) -> Command {
    let mut cmd = Command::new("git");

    if let Some(dir) = dir {
      cmd.arg("-C").arg(dir);
    }

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");
    cmd.arg("-c").arg("log.showSignature=false");

    cmd
  }

  /// Run a command and turn a non-zero exit into `GitError::CommandFailed`
  pub(crate) fn run(&self, mut cmd: Command, label: &str) -> AuditResult<Output> {
    let output = cmd.output().with_context(|| format!("Failed to execute {}", label))?;

    if !output.status.success() {
      return Err(
        GitError::CommandFailed {
          command: label.to_string(),
          stderr: self.scrub(&String::from_utf8_lossy(&output.stderr)),
        }
        .into(),
      );
    }

    Ok(output)
  }

  /// Replace registered secrets with `***`
  pub(crate) fn scrub(&self, text: &str) -> String {
    let mut scrubbed = crate::utils::redact_url_credentials(text.trim());
    for secret in &self.secrets {
      scrubbed = scrubbed.replace(secret.as_str(), "***");
      let encoded = urlencoding::encode(secret);
      if encoded != secret.as_str() {
        scrubbed = scrubbed.replace(encoded.as_ref(), "***");
      }
    }
    scrubbed
  }
}
