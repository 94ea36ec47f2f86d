//! Issue identifier extraction
//!
//! An identifier is a fixed prefix (e.g. `ENLA-`) followed by a fixed number
//! of ASCII digits. Matching is case-insensitive; the extracted identifier is
//! normalized to upper case so set membership works on one spelling.

use crate::core::error::AuditResult;
use regex::{Regex, RegexBuilder};
use std::fmt;

/// Normalized (upper-case) issue identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssueId(String);

impl IssueId {
  pub fn new(raw: &str) -> Self {
    Self(raw.trim().to_uppercase())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Browse link for this issue, e.g. `https://jira.example.org/browse/ENLA-00001`
  pub fn browse_link(&self, browse_prefix: &str) -> String {
    format!("{}{}", browse_prefix, self.0)
  }
}

impl fmt::Display for IssueId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Compiled identifier pattern
#[derive(Debug, Clone)]
pub struct IssuePattern {
  regex: Regex,
}

impl IssuePattern {
  /// Build the pattern for `prefix` followed by exactly `digits` digits
  pub fn new(prefix: &str, digits: usize) -> AuditResult<Self> {
    let source = format!("{}[0-9]{{{}}}", regex::escape(prefix), digits);
    let regex = RegexBuilder::new(&source).case_insensitive(true).build()?;
    Ok(Self { regex })
  }

  /// The first identifier in `text`, if any
  ///
  /// Only the first match is returned even when a message names several
  /// issues. Nothing is required after the digits, so `ENLA-123456` yields
  /// `ENLA-12345`.
  pub fn extract(&self, text: &str) -> Option<IssueId> {
    self.regex.find(text).map(|m| IssueId::new(m.as_str()))
  }
}
