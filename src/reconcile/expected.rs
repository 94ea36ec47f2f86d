use super::IssueId;
use std::collections::BTreeSet;

/// Issues the release is expected to close
///
/// Built once from the tracker query and only ever shrinks: an identifier is
/// removed the first time any commit references it, whether or not that
/// reference turns out to be valid. What is left at the end of the run is the
/// set of declared issues no commit mentioned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedIssueSet {
  ids: BTreeSet<IssueId>,
}

impl ExpectedIssueSet {
  pub fn new(ids: impl IntoIterator<Item = IssueId>) -> Self {
    Self {
      ids: ids.into_iter().collect(),
    }
  }

  /// Remove `id`; returns whether it was still expected
  ///
  /// Removing an absent identifier is a no-op.
  pub fn mark_found(&mut self, id: &IssueId) -> bool {
    self.ids.remove(id)
  }

  #[cfg(test)]
  pub fn contains(&self, id: &IssueId) -> bool {
    self.ids.contains(id)
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }

  /// Identifiers not yet referenced, in key order
  pub fn remaining(&self) -> impl Iterator<Item = &IssueId> {
    self.ids.iter()
  }
}
