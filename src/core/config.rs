use crate::core::context::GitCredentials;
use crate::core::error::{AuditError, AuditResult, ConfigError, ResultExt};
use crate::reconcile::IssuePattern;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Issue key prefix used when the config does not name one
pub const DEFAULT_ISSUE_PREFIX: &str = "ENLA-";
/// Number of digits following the prefix
pub const DEFAULT_ISSUE_DIGITS: usize = 5;
/// Branch audited when the project row leaves it blank
pub const DEFAULT_BRANCH: &str = "master";
/// Upper bound on issues pulled by the release query
pub const DEFAULT_MAX_RESULTS: u32 = 100_000;

/// Configuration for release-audit
///
/// Searched in order: config.json, audit.toml, .config/audit.toml.
/// Keys are upper case, as below; TOML files may
/// use the snake_case aliases instead.
///
/// ```json
/// {
///   "FIX_VERSION": "2.4",
///   "FOLDER_LOC": "/tmp/audit/",
///   "JIRA_URL": "https://jira.example.org",
///   "GIT_WORKSPACE_URL": "bitbucket.org/acme/",
///   "JQL_QUERY": "project = ENLA AND fixVersion ="
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
  /// Release (fix version) being audited
  #[serde(rename = "FIX_VERSION", alias = "fix_version", default)]
  pub fix_version: String,

  /// Directory prefix that project names are appended to for clones
  #[serde(rename = "FOLDER_LOC", alias = "folder_loc", default)]
  pub folder_loc: String,

  /// Jira base URL; browse links are derived from it
  #[serde(rename = "JIRA_URL", alias = "jira_url", default)]
  pub jira_url: String,

  /// Host and organization path that project names are appended to for clone URLs
  #[serde(rename = "GIT_WORKSPACE_URL", alias = "git_workspace_url", default)]
  pub git_workspace_url: String,

  /// JQL template; `{version}` is replaced by the fix version, otherwise it is appended
  #[serde(rename = "JQL_QUERY", alias = "jql_query", default)]
  pub jql_query: String,

  #[serde(rename = "ISSUE_PREFIX", alias = "issue_prefix", default)]
  pub issue_prefix: Option<String>,

  #[serde(rename = "ISSUE_DIGITS", alias = "issue_digits", default)]
  pub issue_digits: Option<usize>,

  #[serde(rename = "DEFAULT_BRANCH", alias = "default_branch", default)]
  pub default_branch: Option<String>,

  #[serde(rename = "MAX_RESULTS", alias = "max_results", default)]
  pub max_results: Option<u32>,
}

impl AuditConfig {
  /// Candidate config locations under `dir`, in search order
  pub fn candidate_paths(dir: &Path) -> Vec<PathBuf> {
    vec![
      dir.join("config.json"),
      dir.join("audit.toml"),
      dir.join(".config").join("audit.toml"),
    ]
  }

  /// Find config file in search order
  pub fn find_config_path(dir: &Path) -> Option<PathBuf> {
    Self::candidate_paths(dir).into_iter().find(|p| p.exists())
  }

  /// Load and validate the config
  ///
  /// An explicit path must exist; otherwise the search order above is used.
  pub fn load(explicit: Option<&Path>, dir: &Path) -> AuditResult<Self> {
    let config_path = match explicit {
      Some(path) if path.exists() => path.to_path_buf(),
      Some(path) => {
        return Err(
          ConfigError::NotFound {
            searched: vec![path.to_path_buf()],
          }
          .into(),
        );
      }
      None => Self::find_config_path(dir).ok_or_else(|| ConfigError::NotFound {
        searched: Self::candidate_paths(dir),
      })?,
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content, &config_path)?;
    config.validate()?;

    Ok(config)
  }

  /// Parse config content; `.toml` files use TOML, everything else JSON
  pub fn parse(content: &str, path: &Path) -> AuditResult<Self> {
    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    let parsed = if is_toml {
      toml_edit::de::from_str(content).map_err(|e| e.to_string())
    } else {
      serde_json::from_str(content).map_err(|e| e.to_string())
    };

    parsed.map_err(|reason| {
      AuditError::with_help(
        format!("Failed to parse config from {}: {}", path.display(), reason),
        "Files ending in .toml are read as TOML, anything else as JSON.",
      )
    })
  }

  /// Check that every required field is present and non-empty
  pub fn validate(&self) -> AuditResult<()> {
    let required = [
      ("FIX_VERSION", &self.fix_version),
      ("FOLDER_LOC", &self.folder_loc),
      ("JIRA_URL", &self.jira_url),
      ("GIT_WORKSPACE_URL", &self.git_workspace_url),
      ("JQL_QUERY", &self.jql_query),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(
          ConfigError::MissingField {
            field: field.to_string(),
          }
          .into(),
        );
      }
    }

    if let Some(prefix) = &self.issue_prefix
      && prefix.trim().is_empty()
    {
      return Err(
        ConfigError::InvalidField {
          field: "ISSUE_PREFIX".to_string(),
          reason: "must not be empty".to_string(),
        }
        .into(),
      );
    }
    if self.issue_digits == Some(0) {
      return Err(
        ConfigError::InvalidField {
          field: "ISSUE_DIGITS".to_string(),
          reason: "must be greater than zero".to_string(),
        }
        .into(),
      );
    }
    if self.max_results == Some(0) {
      return Err(
        ConfigError::InvalidField {
          field: "MAX_RESULTS".to_string(),
          reason: "must be greater than zero".to_string(),
        }
        .into(),
      );
    }

    Ok(())
  }

  /// Prefix of browse links, e.g. `https://jira.example.org/browse/`
  pub fn browse_prefix(&self) -> String {
    format!("{}/browse/", self.jira_url.trim_end_matches('/'))
  }

  /// JQL for every issue declared against the fix version
  pub fn jql(&self) -> String {
    let query = if self.jql_query.contains("{version}") {
      self.jql_query.replace("{version}", &self.fix_version)
    } else {
      format!("{} {}", self.jql_query.trim_end(), self.fix_version)
    };
    format!("{} ORDER BY issuekey", query)
  }

  /// Identifier pattern built from the configured prefix and digit count
  pub fn issue_pattern(&self) -> AuditResult<IssuePattern> {
    IssuePattern::new(self.issue_prefix(), self.issue_digits())
  }

  pub fn issue_prefix(&self) -> &str {
    self.issue_prefix.as_deref().unwrap_or(DEFAULT_ISSUE_PREFIX)
  }

  pub fn issue_digits(&self) -> usize {
    self.issue_digits.unwrap_or(DEFAULT_ISSUE_DIGITS)
  }

  pub fn default_branch(&self) -> &str {
    self
      .default_branch
      .as_deref()
      .filter(|b| !b.trim().is_empty())
      .unwrap_or(DEFAULT_BRANCH)
  }

  pub fn max_results(&self) -> u32 {
    self.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
  }

  /// Clone destination for a project
  pub fn repo_dir(&self, project: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", self.folder_loc, project))
  }

  /// Clone URL for a project
  ///
  /// Remote workspaces get `https://user:pass@` with percent-encoded
  /// credentials. Local workspace paths are used as-is.
  pub fn clone_url(&self, project: &str, creds: &GitCredentials) -> String {
    if utils::is_local_path(&self.git_workspace_url) {
      return format!("{}{}.git", self.git_workspace_url, project);
    }

    let workspace = self
      .git_workspace_url
      .trim_start_matches("https://")
      .trim_start_matches("http://");
    format!(
      "https://{}:{}@{}{}.git",
      urlencoding::encode(&creds.user),
      urlencoding::encode(&creds.password),
      workspace,
      project
    )
  }
}
