//! Error types for release-audit with contextual messages and exit codes
//!
//! Every failure the tool can hit is funneled into [`AuditError`]. Each variant
//! knows its exit code and, where one exists, a help line that points the user
//! at the fix.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for release-audit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, credentials, input table)
  User = 1,
  /// System error (git, issue tracker, I/O)
  System = 2,
  /// Audit failure (project failures, or discrepancies under --strict)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for release-audit
#[derive(Debug)]
pub enum AuditError {
  /// Configuration and credential errors
  Config(ConfigError),

  /// Project table errors
  Input(InputError),

  /// Git operation errors
  Git(GitError),

  /// Issue tracker errors
  Tracker(TrackerError),

  /// The run completed but the audit did not pass
  AuditFailed { reason: String },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl AuditError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    AuditError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    AuditError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// Structured variants keep their shape (exit code and help depend on it);
  /// only `Message` errors accumulate context lines.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      AuditError::Message { message, context, help } => AuditError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      AuditError::Io(e) => AuditError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      AuditError::Config(_) => ExitCode::User,
      AuditError::Input(_) => ExitCode::User,
      AuditError::Git(_) => ExitCode::System,
      AuditError::Tracker(_) => ExitCode::System,
      AuditError::AuditFailed { .. } => ExitCode::Validation,
      AuditError::Io(_) => ExitCode::System,
      AuditError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      AuditError::Config(e) => e.help_message(),
      AuditError::Input(e) => e.help_message(),
      AuditError::Git(e) => e.help_message(),
      AuditError::Tracker(e) => e.help_message(),
      AuditError::AuditFailed { .. } => Some("Inspect the results file for the rows marked as failed.".to_string()),
      AuditError::Message { help, .. } => help.clone(),
      AuditError::Io(_) => None,
    }
  }
}

impl fmt::Display for AuditError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AuditError::Config(e) => write!(f, "{}", e),
      AuditError::Input(e) => write!(f, "{}", e),
      AuditError::Git(e) => write!(f, "{}", e),
      AuditError::Tracker(e) => write!(f, "{}", e),
      AuditError::AuditFailed { reason } => write!(f, "Audit failed: {}", reason),
      AuditError::Io(e) => write!(f, "I/O error: {}", e),
      AuditError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for AuditError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      AuditError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for AuditError {
  fn from(err: io::Error) -> Self {
    AuditError::Io(err)
  }
}

impl From<String> for AuditError {
  fn from(msg: String) -> Self {
    AuditError::message(msg)
  }
}

impl From<&str> for AuditError {
  fn from(msg: &str) -> Self {
    AuditError::message(msg)
  }
}

impl From<serde_json::Error> for AuditError {
  fn from(err: serde_json::Error) -> Self {
    AuditError::message(format!("JSON error: {}", err))
  }
}

impl From<csv::Error> for AuditError {
  fn from(err: csv::Error) -> Self {
    AuditError::message(format!("CSV error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for AuditError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    AuditError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<regex::Error> for AuditError {
  fn from(err: regex::Error) -> Self {
    AuditError::message(format!("Invalid issue pattern: {}", err))
  }
}

impl From<ConfigError> for AuditError {
  fn from(err: ConfigError) -> Self {
    AuditError::Config(err)
  }
}

impl From<InputError> for AuditError {
  fn from(err: InputError) -> Self {
    AuditError::Input(err)
  }
}

impl From<GitError> for AuditError {
  fn from(err: GitError) -> Self {
    AuditError::Git(err)
  }
}

impl From<TrackerError> for AuditError {
  fn from(err: TrackerError) -> Self {
    AuditError::Tracker(err)
  }
}

/// Configuration and credential errors
#[derive(Debug)]
pub enum ConfigError {
  /// No configuration file found
  NotFound { searched: Vec<PathBuf> },

  /// Required field missing or empty
  MissingField { field: String },

  /// Field present but unusable
  InvalidField { field: String, reason: String },

  /// One or more credentials not supplied
  MissingCredentials { missing: Vec<&'static str> },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create config.json next to repo_data.csv, or point at one with --config.".to_string())
      }
      ConfigError::MissingField { field } => Some(format!("Set a non-empty value for '{}' in the config file.", field)),
      ConfigError::MissingCredentials { .. } => Some(
        "Pass --git-user, --git-pass, --jira-user and --jira-pass (or set GIT_USER, GIT_PASS, JIRA_USER, JIRA_PASS)."
          .to_string(),
      ),
      ConfigError::InvalidField { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { searched } => {
        write!(f, "No release-audit configuration found.")?;
        for path in searched {
          write!(f, "\n  looked for: {}", path.display())?;
        }
        Ok(())
      }
      ConfigError::MissingField { field } => {
        write!(f, "Required field missing from config file: {}", field)
      }
      ConfigError::InvalidField { field, reason } => {
        write!(f, "Invalid value for config field '{}': {}", field, reason)
      }
      ConfigError::MissingCredentials { missing } => {
        write!(f, "Required credentials missing: {}", missing.join(", "))
      }
    }
  }
}

/// Project table errors
#[derive(Debug)]
pub enum InputError {
  /// Table file does not exist
  NotFound { path: PathBuf },

  /// Table has no rows at all
  Empty { path: PathBuf },

  /// Table has a header row and nothing else
  HeaderOnly { path: PathBuf },

  /// A data row is missing required columns
  MalformedRow { line: u64, reason: String },
}

impl InputError {
  fn help_message(&self) -> Option<String> {
    match self {
      InputError::NotFound { .. } | InputError::Empty { .. } | InputError::HeaderOnly { .. } => Some(
        "Expected a header row followed by one row per project: name, branch (optional), start revision, end revision."
          .to_string(),
      ),
      InputError::MalformedRow { .. } => None,
    }
  }
}

impl fmt::Display for InputError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InputError::NotFound { path } => write!(f, "File not found: {}", path.display()),
      InputError::Empty { path } => write!(f, "No data in csv file: {}", path.display()),
      InputError::HeaderOnly { path } => write!(f, "Only header present in csv file: {}", path.display()),
      InputError::MalformedRow { line, reason } => write!(f, "Malformed project row at line {}: {}", line, reason),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Clone of a project repository failed
  CloneFailed { url: String, reason: String },

  /// Clone destination is already occupied
  DestinationExists { path: PathBuf },

  /// Branch checkout failed
  CheckoutFailed { branch: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::CloneFailed { reason, .. } => {
        if reason.contains("Authentication failed") || reason.contains("403") {
          Some("Check the git user and app password passed with --git-user/--git-pass.".to_string())
        } else if reason.contains("not found") || reason.contains("does not exist") {
          Some("Check GIT_WORKSPACE_URL in the config and the project name in the input table.".to_string())
        } else {
          None
        }
      }
      GitError::DestinationExists { path } => Some(format!(
        "Remove {} or change FOLDER_LOC in the config file.",
        path.display()
      )),
      GitError::CheckoutFailed { branch, .. } => {
        Some(format!("Make sure branch '{}' exists in the repository.", branch))
      }
      GitError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::CloneFailed { url, reason } => {
        write!(f, "Failed to clone {}: {}", url, reason)
      }
      GitError::DestinationExists { path } => {
        write!(f, "Clone destination already exists: {}", path.display())
      }
      GitError::CheckoutFailed { branch, reason } => {
        write!(f, "Failed to checkout branch '{}': {}", branch, reason)
      }
    }
  }
}

/// Issue tracker errors
#[derive(Debug)]
pub enum TrackerError {
  /// Transport-level failure (connection, TLS, timeout)
  Http { url: String, reason: String },

  /// Tracker answered with a non-success status
  Api { status: u16, url: String, body: String },

  /// Response body did not have the expected shape
  Parse { url: String, reason: String },
}

impl TrackerError {
  fn help_message(&self) -> Option<String> {
    match self {
      TrackerError::Api { status: 401 | 403, .. } => {
        Some("Check the Jira user and API token passed with --jira-user/--jira-pass.".to_string())
      }
      TrackerError::Api { status: 404, .. } => {
        Some("The issue does not exist or is not visible to the Jira user.".to_string())
      }
      TrackerError::Api { status: 400, .. } => Some("Check JQL_QUERY in the config file.".to_string()),
      TrackerError::Http { .. } => Some("Check JIRA_URL in the config file and network access.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for TrackerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrackerError::Http { url, reason } => write!(f, "Issue tracker request to {} failed: {}", url, reason),
      TrackerError::Api { status, url, body } => {
        write!(f, "Issue tracker returned {} for {}", status, url)?;
        if !body.is_empty() {
          write!(f, "\n{}", body)?;
        }
        Ok(())
      }
      TrackerError::Parse { url, reason } => {
        write!(f, "Unexpected issue tracker response from {}: {}", url, reason)
      }
    }
  }
}

/// Result type alias for release-audit
pub type AuditResult<T> = Result<T, AuditError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> AuditResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> AuditResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<AuditError>,
{
  fn context(self, ctx: impl Into<String>) -> AuditResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> AuditResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &AuditError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
