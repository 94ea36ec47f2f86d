use super::{DiscrepancyRecord, ExpectedIssueSet};
use crate::core::error::{AuditError, AuditResult};
use std::io::Write;

pub const HEADER: [&str; 3] = ["Project name", "Invalid commits", "Invalid Jira Ids"];
pub const UNREFERENCED_LABEL: &str = "NO COMMITS FOUND FOR BELOW JIRA";
pub const FAILURE_PREFIX: &str = "RECONCILIATION FAILED: ";

/// Writes the results table
///
/// One row per project in input order, each flushed as soon as it is written
/// so an aborted run still leaves the rows of the projects before it. The
/// unreferenced-issue summary is written by [`ReportAggregator::finalize`],
/// which consumes the aggregator.
pub struct ReportAggregator<W: Write> {
  writer: csv::Writer<W>,
  browse_prefix: String,
  rows: usize,
}

impl<W: Write> ReportAggregator<W> {
  /// Wrap `sink` and write the header row
  pub fn new(sink: W, browse_prefix: impl Into<String>) -> AuditResult<Self> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(sink);
    writer.write_record(HEADER)?;
    writer.flush()?;

    Ok(Self {
      writer,
      browse_prefix: browse_prefix.into(),
      rows: 0,
    })
  }

  /// Project rows written so far
  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn append_project(&mut self, record: &DiscrepancyRecord) -> AuditResult<()> {
    let commits = record.invalid_commits.join("\n");
    let links = record
      .invalid_issues
      .iter()
      .map(|id| id.browse_link(&self.browse_prefix))
      .collect::<Vec<_>>()
      .join("\n");

    self.writer.write_record([record.project.as_str(), commits.as_str(), links.as_str()])?;
    self.writer.flush()?;
    self.rows += 1;
    Ok(())
  }

  /// Row for a project whose reconciliation failed
  pub fn append_failure(&mut self, project: &str, error: &str) -> AuditResult<()> {
    let status = format!("{}{}", FAILURE_PREFIX, error);
    self.writer.write_record([project, status.as_str(), ""])?;
    self.writer.flush()?;
    self.rows += 1;
    Ok(())
  }

  /// Write the separator, the label and the links of every issue still expected
  pub fn finalize(mut self, expected: &ExpectedIssueSet) -> AuditResult<W> {
    let links = expected
      .remaining()
      .map(|id| id.browse_link(&self.browse_prefix))
      .collect::<Vec<_>>()
      .join("\n");

    self.writer.write_record(["", "", ""])?;
    self.writer.write_record([UNREFERENCED_LABEL])?;
    self.writer.write_record([links.as_str()])?;
    self.writer.flush()?;

    self
      .writer
      .into_inner()
      .map_err(|e| AuditError::message(format!("Failed to flush results: {}", e.error())))
  }
}
