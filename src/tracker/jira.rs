//! Jira REST (v2) client
//!
//! Uses blocking `reqwest` with basic auth. Two endpoints are used:
//! `/rest/api/2/search` (paged) for the release's issue keys and
//! `/rest/api/2/issue/{key}` for an issue's fix versions.

use super::{IssueMetadata, IssueTracker};
use crate::core::context::JiraCredentials;
use crate::core::error::{AuditResult, TrackerError};
use crate::reconcile::IssueId;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::time::Duration;

/// Largest page requested from the search endpoint
const SEARCH_PAGE_SIZE: u32 = 1000;

/// Error bodies longer than this are cut before they reach the user
const MAX_ERROR_BODY: usize = 500;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
  #[serde(default)]
  total: Option<u32>,
  #[serde(default)]
  issues: Vec<IssueKey>,
}

#[derive(Deserialize)]
struct IssueKey {
  key: String,
}

#[derive(Deserialize)]
struct IssueResponse {
  key: String,
  #[serde(default)]
  fields: IssueFields,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueFields {
  #[serde(default)]
  fix_versions: Option<Vec<FixVersion>>,
}

#[derive(Deserialize)]
struct FixVersion {
  name: String,
}

/// Blocking Jira client
pub struct JiraClient {
  http: Client,
  base_url: String,
  credentials: JiraCredentials,
}

impl JiraClient {
  /// Create a client for `base_url` (e.g. `https://jira.example.org`)
  pub fn new(base_url: &str, credentials: JiraCredentials, timeout: Duration) -> AuditResult<Self> {
    let http = Client::builder()
      .timeout(timeout)
      .user_agent(concat!("release-audit/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| TrackerError::Http {
        url: base_url.to_string(),
        reason: format!("failed to build HTTP client: {}", e),
      })?;

    Ok(Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      credentials,
    })
  }

  fn search_url(&self, jql: &str, start_at: u32, page_size: u32) -> String {
    format!(
      "{}/rest/api/2/search?jql={}&startAt={}&maxResults={}&fields=key",
      self.base_url,
      urlencoding::encode(jql),
      start_at,
      page_size
    )
  }

  fn issue_url(&self, id: &IssueId) -> String {
    format!(
      "{}/rest/api/2/issue/{}?fields=fixVersions",
      self.base_url,
      urlencoding::encode(id.as_str())
    )
  }

  fn get_json<T: DeserializeOwned>(&self, url: &str) -> AuditResult<T> {
    tracing::debug!(url, "jira request");

    let response = self
      .http
      .get(url)
      .basic_auth(&self.credentials.user, Some(&self.credentials.token))
      .header(reqwest::header::ACCEPT, "application/json")
      .send()
      .map_err(|e| TrackerError::Http {
        url: url.to_string(),
        reason: e.to_string(),
      })?;

    let status = response.status();
    if !status.is_success() {
      let mut body = response.text().unwrap_or_default();
      if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        body.truncate(cut);
        body.push('…');
      }
      return Err(
        TrackerError::Api {
          status: status.as_u16(),
          url: url.to_string(),
          body,
        }
        .into(),
      );
    }

    let parsed = response.json::<T>().map_err(|e| TrackerError::Parse {
      url: url.to_string(),
      reason: e.to_string(),
    })?;
    Ok(parsed)
  }
}

impl IssueTracker for JiraClient {
  fn search_issues(&self, jql: &str, max_results: u32) -> AuditResult<Vec<IssueId>> {
    let mut keys = BTreeSet::new();
    let mut start_at = 0u32;

    while start_at < max_results {
      let page_size = SEARCH_PAGE_SIZE.min(max_results - start_at);
      let page: SearchResponse = self.get_json(&self.search_url(jql, start_at, page_size))?;
      let received = page.issues.len() as u32;

      keys.extend(page.issues.into_iter().map(|issue| IssueId::new(&issue.key)));
      start_at += received;

      let exhausted = page.total.is_some_and(|total| start_at >= total);
      if received == 0 || exhausted {
        break;
      }
    }

    Ok(keys.into_iter().collect())
  }

  fn get_issue(&mut self, id: &IssueId) -> AuditResult<IssueMetadata> {
    let issue: IssueResponse = self.get_json(&self.issue_url(id))?;
    let fix_versions = issue
      .fields
      .fix_versions
      .unwrap_or_default()
      .into_iter()
      .map(|v| v.name)
      .collect();

    Ok(IssueMetadata::new(IssueId::new(&issue.key), fix_versions))
  }
}
