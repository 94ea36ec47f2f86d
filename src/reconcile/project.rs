use super::{Classification, CommitValidator, ExpectedIssueSet, IssueId};
use crate::core::config::AuditConfig;
use crate::core::context::GitCredentials;
use crate::core::error::AuditResult;
use crate::core::vcs::{CommitRange, VersionControl};
use crate::tracker::IssueTracker;
use std::collections::BTreeSet;

/// One row of the project table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
  pub name: String,
  /// Branch to audit; `None` falls back to the configured default
  pub branch: Option<String>,
  pub range: CommitRange,
}

/// Discrepancies found in one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscrepancyRecord {
  pub project: String,
  /// Commit lines without an identifier, in log order, duplicates kept
  pub invalid_commits: Vec<String>,
  /// Identifiers whose issue is not tagged for the release
  pub invalid_issues: BTreeSet<IssueId>,
  pub commits_checked: usize,
}

impl DiscrepancyRecord {
  pub fn new(project: impl Into<String>) -> Self {
    Self {
      project: project.into(),
      ..Default::default()
    }
  }

  pub fn is_clean(&self) -> bool {
    self.invalid_commits.is_empty() && self.invalid_issues.is_empty()
  }
}

/// Runs one project's commit range through the validator
///
/// Per project: clone -> checkout -> log -> delete clone -> classify. The
/// clone is deleted as soon as the log is captured; classification only
/// needs the log text.
pub struct ProjectReconciler<'a> {
  config: &'a AuditConfig,
  credentials: &'a GitCredentials,
  validator: CommitValidator<'a>,
}

impl<'a> ProjectReconciler<'a> {
  pub fn new(config: &'a AuditConfig, credentials: &'a GitCredentials, validator: CommitValidator<'a>) -> Self {
    Self {
      config,
      credentials,
      validator,
    }
  }

  pub fn reconcile(
    &self,
    project: &ProjectDescriptor,
    expected: &mut ExpectedIssueSet,
    tracker: &mut dyn IssueTracker,
    vcs: &dyn VersionControl,
  ) -> AuditResult<DiscrepancyRecord> {
    let branch = project
      .branch
      .as_deref()
      .filter(|b| !b.trim().is_empty())
      .unwrap_or(self.config.default_branch());
    let url = self.config.clone_url(&project.name, self.credentials);
    let dest = self.config.repo_dir(&project.name);

    tracing::debug!(
      project = %project.name,
      branch,
      range = %project.range,
      dest = %dest.display(),
      "cloning project"
    );

    let workspace = vcs.acquire(&url, &dest)?;
    vcs.checkout(&workspace, branch)?;
    let log = vcs.log(&workspace, &project.range)?;
    workspace.release()?;

    let mut record = DiscrepancyRecord::new(&project.name);
    let mut found = Vec::new();

    for line in log.lines().map(str::trim_end).filter(|l| !l.trim().is_empty()) {
      record.commits_checked += 1;
      match self.validator.classify(line, tracker, expected)? {
        Classification::MissingIdentifier => record.invalid_commits.push(line.to_string()),
        Classification::InvalidReference(id) => {
          found.push(id.clone());
          record.invalid_issues.insert(id);
        }
        Classification::Valid(id) => found.push(id),
      }
    }

    tracing::debug!(project = %project.name, commits = ?record.invalid_commits, "invalid commits found");
    tracing::debug!(project = %project.name, ids = ?found, "issue ids found in commits");
    tracing::debug!(project = %project.name, ids = ?record.invalid_issues, "invalid issue ids found");

    Ok(record)
  }
}
