use super::{IssueMetadata, IssueTracker};
use crate::core::error::AuditResult;
use crate::reconcile::IssueId;
use std::collections::HashMap;

/// Memoizes `get_issue` for the length of a run
///
/// The same identifier often shows up in several commits and in several
/// projects. With caching enabled each identifier costs one round-trip; with
/// it disabled every call is forwarded, but lookups are still counted.
pub struct CachingTracker<T> {
  inner: T,
  enabled: bool,
  cache: HashMap<IssueId, IssueMetadata>,
  requests: usize,
  hits: usize,
}

impl<T: IssueTracker> CachingTracker<T> {
  pub fn new(inner: T, enabled: bool) -> Self {
    Self {
      inner,
      enabled,
      cache: HashMap::new(),
      requests: 0,
      hits: 0,
    }
  }

  /// Lookups that went to the underlying tracker
  pub fn requests(&self) -> usize {
    self.requests
  }

  /// Lookups answered from the cache
  pub fn hits(&self) -> usize {
    self.hits
  }

  #[cfg(test)]
  pub fn inner(&self) -> &T {
    &self.inner
  }
}

impl<T: IssueTracker> IssueTracker for CachingTracker<T> {
  fn search_issues(&self, jql: &str, max_results: u32) -> AuditResult<Vec<IssueId>> {
    self.inner.search_issues(jql, max_results)
  }

  fn get_issue(&mut self, id: &IssueId) -> AuditResult<IssueMetadata> {
    if self.enabled
      && let Some(found) = self.cache.get(id)
    {
      self.hits += 1;
      return Ok(found.clone());
    }

    self.requests += 1;
    let metadata = self.inner.get_issue(id)?;
    if self.enabled {
      self.cache.insert(id.clone(), metadata.clone());
    }
    Ok(metadata)
  }
}
