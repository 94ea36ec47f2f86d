//! Issue tracker collaborator
//!
//! The reconciliation engine only needs two questions answered: which issues
//! are declared for the release, and which fix versions a given issue carries.
//! [`IssueTracker`] is that seam; [`JiraClient`] answers it over the Jira REST
//! API and [`CachingTracker`] memoizes per-issue lookups for the length of a
//! run.

pub mod cache;
pub mod jira;

pub use cache::CachingTracker;
pub use jira::JiraClient;

use crate::core::error::AuditResult;
use crate::reconcile::IssueId;

/// Issue identifier plus its declared fix versions, in tracker order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueMetadata {
  pub id: IssueId,
  pub fix_versions: Vec<String>,
}

impl IssueMetadata {
  pub fn new(id: IssueId, fix_versions: Vec<String>) -> Self {
    Self { id, fix_versions }
  }

  /// The first declared fix version, the only one the audit checks
  pub fn first_fix_version(&self) -> Option<&str> {
    self.fix_versions.first().map(String::as_str)
  }
}

pub trait IssueTracker {
  /// Identifiers of every issue matching `jql`, at most `max_results`
  fn search_issues(&self, jql: &str, max_results: u32) -> AuditResult<Vec<IssueId>>;

  /// Metadata for a single issue
  fn get_issue(&mut self, id: &IssueId) -> AuditResult<IssueMetadata>;
}
