//! Progress indicator for the project loop
//!
//! Uses `linya` bars drawn to stderr. Opt-in with `--progress`, since the
//! bar shares stderr with the log output.

use linya::{Bar, Progress};

/// Progress bar over the projects of a run
pub struct ProjectProgress {
  progress: Progress,
  bar: Bar,
}

impl ProjectProgress {
  /// Create a bar for `total` projects
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Mark one more project as done
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
