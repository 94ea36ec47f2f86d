use super::{ExpectedIssueSet, IssueId, IssuePattern};
use crate::core::error::AuditResult;
use crate::tracker::IssueTracker;

/// Target release for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseContext {
  pub version: String,
}

impl ReleaseContext {
  pub fn new(version: impl Into<String>) -> Self {
    Self { version: version.into() }
  }
}

/// Outcome of validating a single commit line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
  /// No identifier in the commit text
  MissingIdentifier,
  /// Identifier found, but the issue is not tagged for the release
  InvalidReference(IssueId),
  /// Identifier found and the issue's first fix version is the release
  Valid(IssueId),
}

/// Classifies commits against the release
pub struct CommitValidator<'a> {
  pattern: &'a IssuePattern,
  release: &'a ReleaseContext,
}

impl<'a> CommitValidator<'a> {
  pub fn new(pattern: &'a IssuePattern, release: &'a ReleaseContext) -> Self {
    Self { pattern, release }
  }

  /// Classify one commit line
  ///
  /// A referenced identifier is marked found in `expected` before its fix
  /// version is checked, so invalid references still count as referenced.
  /// Only the issue's first fix version is compared against the release.
  pub fn classify(
    &self,
    commit: &str,
    tracker: &mut dyn IssueTracker,
    expected: &mut ExpectedIssueSet,
  ) -> AuditResult<Classification> {
    let Some(id) = self.pattern.extract(commit) else {
      return Ok(Classification::MissingIdentifier);
    };

    let issue = tracker.get_issue(&id)?;
    tracing::debug!(issue = %issue.id, fix_versions = ?issue.fix_versions, "issue looked up");
    expected.mark_found(&id);

    if issue.first_fix_version() == Some(self.release.version.as_str()) {
      Ok(Classification::Valid(id))
    } else {
      Ok(Classification::InvalidReference(id))
    }
  }
}
