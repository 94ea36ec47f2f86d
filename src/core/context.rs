//! Run context - build once, pass everywhere
//!
//! `AuditContext` bundles the validated configuration and the credentials for
//! both collaborators. It is built in `main.rs` before any network call and
//! passed by reference into the audit command.

use crate::core::config::AuditConfig;
use crate::core::error::{AuditResult, ConfigError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Username and app password used to clone project repositories
#[derive(Clone)]
pub struct GitCredentials {
  pub user: String,
  pub password: String,
}

/// Username and API token used for the Jira REST API
#[derive(Clone)]
pub struct JiraCredentials {
  pub user: String,
  pub token: String,
}

// Secrets never reach logs through Debug.
impl fmt::Debug for GitCredentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GitCredentials")
      .field("user", &self.user)
      .field("password", &"***")
      .finish()
  }
}

impl fmt::Debug for JiraCredentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JiraCredentials")
      .field("user", &self.user)
      .field("token", &"***")
      .finish()
  }
}

/// All credentials required for a run
#[derive(Debug, Clone)]
pub struct Credentials {
  pub git: GitCredentials,
  pub jira: JiraCredentials,
}

impl Credentials {
  /// Collect credentials, failing if any is absent or blank
  pub fn from_parts(
    git_user: Option<String>,
    git_pass: Option<String>,
    jira_user: Option<String>,
    jira_pass: Option<String>,
  ) -> AuditResult<Self> {
    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

    let mut missing = Vec::new();
    if !present(&git_user) {
      missing.push("--git-user");
    }
    if !present(&git_pass) {
      missing.push("--git-pass");
    }
    if !present(&jira_user) {
      missing.push("--jira-user");
    }
    if !present(&jira_pass) {
      missing.push("--jira-pass");
    }
    if !missing.is_empty() {
      return Err(ConfigError::MissingCredentials { missing }.into());
    }

    Ok(Self {
      git: GitCredentials {
        user: git_user.unwrap_or_default(),
        password: git_pass.unwrap_or_default(),
      },
      jira: JiraCredentials {
        user: jira_user.unwrap_or_default(),
        token: jira_pass.unwrap_or_default(),
      },
    })
  }
}

/// Everything a run needs before it touches the network
#[derive(Debug, Clone)]
pub struct AuditContext {
  /// Directory the tool was started from; relative paths resolve against it
  pub root: PathBuf,

  /// Validated configuration
  pub config: AuditConfig,

  /// Git and Jira credentials
  pub credentials: Credentials,
}

impl AuditContext {
  /// Load config (explicit path or search order) and attach credentials
  pub fn build(root: &Path, config_path: Option<&Path>, credentials: Credentials) -> AuditResult<Self> {
    let config = AuditConfig::load(config_path, root)?;
    Ok(Self {
      root: root.to_path_buf(),
      config,
      credentials,
    })
  }

  /// Resolve a user-supplied path against the run root
  pub fn resolve(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.root.join(path)
    }
  }
}
