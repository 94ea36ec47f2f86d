//! Project table reader
//!
//! The table is a CSV file with a header row followed by one row per project:
//! `name, branch, start revision, end revision`. The branch may be blank.

use crate::core::error::{AuditResult, InputError, ResultExt};
use crate::core::vcs::CommitRange;
use crate::reconcile::ProjectDescriptor;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read every project row from `path`
///
/// A missing file, an empty file, or a file holding only the header row is
/// an error: there is nothing to audit.
pub fn read_projects(path: &Path) -> AuditResult<Vec<ProjectDescriptor>> {
  let file = match File::open(path) {
    Ok(file) => file,
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      return Err(InputError::NotFound { path: path.to_path_buf() }.into());
    }
    Err(e) => return Err(e).with_context(|| format!("Failed to open {}", path.display())),
  };

  parse_projects(file, path)
}

/// Parse a project table from any reader; `path` is only used in messages
pub fn parse_projects<R: Read>(reader: R, path: &Path) -> AuditResult<Vec<ProjectDescriptor>> {
  let mut csv_reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(reader);

  let mut records = Vec::new();
  for record in csv_reader.records() {
    let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    records.push((line, record));
  }

  match records.len() {
    0 => return Err(InputError::Empty { path: path.to_path_buf() }.into()),
    1 => return Err(InputError::HeaderOnly { path: path.to_path_buf() }.into()),
    _ => {}
  }

  records
    .into_iter()
    .skip(1)
    .map(|(line, record)| parse_row(line, &record))
    .collect()
}

fn parse_row(line: u64, record: &csv::StringRecord) -> AuditResult<ProjectDescriptor> {
  if record.len() < 4 {
    return Err(
      InputError::MalformedRow {
        line,
        reason: format!("expected 4 columns, found {}", record.len()),
      }
      .into(),
    );
  }

  let required = |index: usize, column: &str| -> AuditResult<String> {
    let value = record.get(index).unwrap_or_default();
    if value.is_empty() {
      return Err(
        InputError::MalformedRow {
          line,
          reason: format!("{} is empty", column),
        }
        .into(),
      );
    }
    Ok(value.to_string())
  };

  let name = required(0, "project name")?;
  let start = required(2, "start revision")?;
  let end = required(3, "end revision")?;
  let branch = record.get(1).filter(|b| !b.is_empty()).map(str::to_string);

  Ok(ProjectDescriptor {
    name,
    branch,
    range: CommitRange::new(start, end),
  })
}
