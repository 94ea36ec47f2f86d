//! End-to-end runs against local repositories and a fake Jira

use crate::helpers::*;
use anyhow::Result;

/// Two projects: svc-a has a commit without identifier and a commit naming an
/// issue from another release; svc-b is clean. REL-00002 is never referenced.
fn two_project_workspace(jira: &FakeJira) -> Result<(TestWorkspace, String)> {
  let workspace = TestWorkspace::new()?;

  let svc_a = workspace.add_project("svc-a", "v2.3")?;
  commit(&svc_a, "REL-00001 add export endpoint")?;
  let untracked = commit(&svc_a, "cleanup without ticket")?;
  commit(&svc_a, "rel-00003 partial fix")?;
  git(&svc_a, &["tag", "v2.4"])?;

  let svc_b = workspace.add_project("svc-b", "v2.3")?;
  commit(&svc_b, "Follow-up for REL-00001")?;
  git(&svc_b, &["tag", "v2.4"])?;

  workspace.write_config(&jira.url, "2.4")?;
  workspace.write_projects(&[["svc-a", "", "v2.3", "v2.4"], ["svc-b", "master", "v2.3", "v2.4"]])?;

  Ok((workspace, untracked))
}

fn release_jira() -> Result<FakeJira> {
  FakeJira::start(
    &["REL-00001", "REL-00002", "REL-00003"],
    &[("REL-00001", &["2.4"]), ("REL-00003", &["2.3", "2.4"])],
  )
}

#[test]
fn test_audit_reports_discrepancies() -> Result<()> {
  let jira = release_jira()?;
  let (workspace, untracked) = two_project_workspace(&jira)?;

  let output = run_release_audit(&workspace.path, &["--output", "results.csv"])?;
  assert!(
    output.status.success(),
    "stderr: {}",
    String::from_utf8_lossy(&output.stderr)
  );

  let rows = read_results(&workspace.path.join("results.csv"))?;
  let browse = format!("{}/browse/", jira.url);

  assert_eq!(rows[0], vec!["Project name", "Invalid commits", "Invalid Jira Ids"]);

  assert_eq!(rows[1][0], "svc-a");
  assert!(rows[1][1].starts_with(&format!("{} | ", untracked)));
  assert!(rows[1][1].ends_with("| Test User | cleanup without ticket"));
  assert!(!rows[1][1].contains('\n'));
  assert_eq!(rows[1][2], format!("{}REL-00003", browse));

  assert_eq!(rows[2], vec!["svc-b", "", ""]);
  assert_eq!(rows[3], vec!["", "", ""]);
  assert_eq!(rows[4], vec!["NO COMMITS FOUND FOR BELOW JIRA"]);
  assert_eq!(rows[5], vec![format!("{}REL-00002", browse)]);
  assert_eq!(rows.len(), 6);

  // Clones are removed once their log has been read
  assert_eq!(workspace.clones_left()?, 0);

  // REL-00001 appears in both projects but is only looked up once
  assert_eq!(jira.issue_requests(), 2);

  Ok(())
}

#[test]
fn test_audit_json_summary_and_default_output_name() -> Result<()> {
  let jira = release_jira()?;
  let (workspace, _) = two_project_workspace(&jira)?;

  let output = run_release_audit(&workspace.path, &["--json"])?;
  assert!(output.status.success());

  let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(summary["projects"], 2);
  assert_eq!(summary["commits_checked"], 4);
  assert_eq!(summary["invalid_commits"], 1);
  assert_eq!(summary["invalid_issues"], 1);
  assert_eq!(summary["unreferenced_issues"], 1);
  assert_eq!(summary["issue_lookups"], 2);
  assert_eq!(summary["cache_hits"], 1);
  assert!(summary["failures"].as_array().is_some_and(|f| f.is_empty()));

  let files = workspace.result_files()?;
  assert_eq!(files.len(), 1);
  assert_eq!(summary["output"].as_str().map(std::path::PathBuf::from), Some(files[0].clone()));

  Ok(())
}

#[test]
fn test_audit_without_cache_looks_up_every_commit() -> Result<()> {
  let jira = release_jira()?;
  let (workspace, _) = two_project_workspace(&jira)?;

  let output = run_release_audit(&workspace.path, &["--no-issue-cache", "--output", "results.csv"])?;
  assert!(output.status.success());
  assert_eq!(jira.issue_requests(), 3);

  Ok(())
}

#[test]
fn test_strict_mode_fails_on_discrepancies() -> Result<()> {
  let jira = release_jira()?;
  let (workspace, _) = two_project_workspace(&jira)?;

  let output = run_release_audit(&workspace.path, &["--strict", "--output", "results.csv"])?;
  assert_eq!(output.status.code(), Some(3));
  // the report is still complete
  assert_eq!(read_results(&workspace.path.join("results.csv"))?.len(), 6);

  Ok(())
}

#[test]
fn test_jql_carries_fix_version() -> Result<()> {
  let jira = release_jira()?;
  let (workspace, _) = two_project_workspace(&jira)?;

  run_release_audit(&workspace.path, &["--output", "results.csv"])?;

  let search = jira
    .seen()
    .into_iter()
    .find(|url| url.starts_with("/rest/api/2/search"))
    .expect("search request");
  assert!(search.contains("jql=project%20%3D%20REL%20AND%20fixVersion%20%3D%202.4%20ORDER%20BY%20issuekey"));

  Ok(())
}

#[test]
fn test_failed_project_is_reported_and_run_continues() -> Result<()> {
  let jira = release_jira()?;
  let (workspace, _) = two_project_workspace(&jira)?;
  workspace.write_projects(&[
    ["svc-missing", "", "v2.3", "v2.4"],
    ["svc-a", "", "v2.3", "v2.4"],
    ["svc-b", "master", "v2.3", "v2.4"],
  ])?;

  let output = run_release_audit(&workspace.path, &["--output", "results.csv"])?;
  assert_eq!(output.status.code(), Some(3));

  let rows = read_results(&workspace.path.join("results.csv"))?;
  assert_eq!(rows[1][0], "svc-missing");
  assert!(rows[1][1].starts_with("RECONCILIATION FAILED: "));
  assert!(!rows[1][1].contains("git-secret"));
  assert_eq!(rows[2][0], "svc-a");
  assert_eq!(rows[3][0], "svc-b");
  assert_eq!(rows[5], vec!["NO COMMITS FOUND FOR BELOW JIRA"]);
  assert_eq!(workspace.clones_left()?, 0);

  Ok(())
}

#[test]
fn test_fail_fast_stops_at_first_failure() -> Result<()> {
  let jira = release_jira()?;
  let (workspace, _) = two_project_workspace(&jira)?;
  workspace.write_projects(&[["svc-a", "", "v2.3", "v2.4"], ["svc-b", "no-such-branch", "v2.3", "v2.4"]])?;

  let output = run_release_audit(&workspace.path, &["--fail-fast", "--output", "results.csv"])?;
  assert_eq!(output.status.code(), Some(2));

  let rows = read_results(&workspace.path.join("results.csv"))?;
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[1][0], "svc-a");
  assert_eq!(workspace.clones_left()?, 0);

  Ok(())
}

#[test]
fn test_merge_commits_are_not_checked() -> Result<()> {
  let jira = FakeJira::start(&["REL-00001"], &[("REL-00001", &["2.4"])])?;
  let workspace = TestWorkspace::new()?;

  let repo = workspace.add_project("svc-m", "v2.3")?;
  git(&repo, &["checkout", "-b", "feature"])?;
  commit(&repo, "REL-00001 feature work")?;
  git(&repo, &["checkout", "master"])?;
  std::fs::write(repo.join("NOTES.md"), "master side\n")?;
  git(&repo, &["add", "."])?;
  git(&repo, &["commit", "-m", "REL-00001 master work"])?;
  git(&repo, &["merge", "--no-ff", "-m", "Merge branch feature", "feature"])?;
  git(&repo, &["tag", "v2.4"])?;

  workspace.write_config(&jira.url, "2.4")?;
  workspace.write_projects(&[["svc-m", "", "v2.3", "v2.4"]])?;

  let output = run_release_audit(&workspace.path, &["--json", "--output", "results.csv"])?;
  assert!(
    output.status.success(),
    "stderr: {}",
    String::from_utf8_lossy(&output.stderr)
  );

  // the merge commit has no identifier; it would be an invalid commit if it were logged
  let rows = read_results(&workspace.path.join("results.csv"))?;
  assert_eq!(rows[1], vec!["svc-m", "", ""]);
  assert!(!rows[1][1].contains("Merge branch feature"));

  let summary: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(summary["commits_checked"], 2);
  assert_eq!(summary["invalid_commits"], 0);

  Ok(())
}
