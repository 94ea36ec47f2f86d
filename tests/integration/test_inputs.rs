//! Runs that must stop before any project is processed

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_header_only_table_writes_nothing() -> Result<()> {
  let jira = FakeJira::start(&["REL-00001"], &[])?;
  let workspace = TestWorkspace::new()?;
  workspace.write_config(&jira.url, "2.4")?;
  workspace.write_projects(&[])?;

  let output = run_release_audit(&workspace.path, &[])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Only header present in csv file"));
  assert!(workspace.result_files()?.is_empty());
  // the table is checked before the tracker is contacted
  assert!(jira.seen().is_empty());

  Ok(())
}

#[test]
fn test_missing_table() -> Result<()> {
  let jira = FakeJira::start(&[], &[])?;
  let workspace = TestWorkspace::new()?;
  workspace.write_config(&jira.url, "2.4")?;

  let output = run_release_audit(&workspace.path, &["--input", "projects.csv"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("File not found"));
  assert!(workspace.result_files()?.is_empty());

  Ok(())
}

#[test]
fn test_blank_credential_is_rejected() -> Result<()> {
  let jira = FakeJira::start(&[], &[])?;
  let workspace = TestWorkspace::new()?;
  workspace.write_config(&jira.url, "2.4")?;
  workspace.write_projects(&[["svc-a", "", "v1", "v2"]])?;

  let output = run_release_audit(&workspace.path, &["--jira-pass="])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Required credentials missing: --jira-pass"));
  assert!(jira.seen().is_empty());

  Ok(())
}

#[test]
fn test_missing_config_field() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  std::fs::write(
    workspace.path.join("config.json"),
    r#"{ "FIX_VERSION": "2.4", "FOLDER_LOC": "/tmp/clones/", "JIRA_URL": "http://127.0.0.1:9", "GIT_WORKSPACE_URL": "/srv/git/" }"#,
  )?;
  workspace.write_projects(&[["svc-a", "", "v1", "v2"]])?;

  let output = run_release_audit(&workspace.path, &[])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Required field missing from config file: JQL_QUERY"));

  Ok(())
}

#[test]
fn test_toml_config_is_accepted() -> Result<()> {
  let jira = FakeJira::start(&["REL-00001"], &[("REL-00001", &["2.4"])])?;
  let workspace = TestWorkspace::new()?;
  let repo = workspace.add_project("svc-a", "v1")?;
  commit(&repo, "REL-00001 planned work")?;
  git(&repo, &["tag", "v2"])?;
  std::fs::write(
    workspace.path.join("audit.toml"),
    format!(
      "fix_version = \"2.4\"\nfolder_loc = \"{}/\"\njira_url = \"{}\"\ngit_workspace_url = \"{}/\"\njql_query = \"fixVersion = {{version}}\"\nissue_prefix = \"REL-\"\n",
      workspace.clones.display(),
      jira.url,
      workspace.remotes.display()
    ),
  )?;
  workspace.write_projects(&[["svc-a", "", "v1", "v2"]])?;

  let output = run_release_audit(&workspace.path, &["--output", "out/results.csv"])?;
  assert!(
    output.status.success(),
    "stderr: {}",
    String::from_utf8_lossy(&output.stderr)
  );

  let rows = read_results(&workspace.path.join("out/results.csv"))?;
  assert_eq!(rows[1], vec!["svc-a", "", ""]);
  assert_eq!(rows[3], vec!["NO COMMITS FOUND FOR BELOW JIRA"]);
  assert_eq!(rows[4], vec![""]);
  assert!(jira.seen()[0].contains("jql=fixVersion%20%3D%202.4%20ORDER%20BY%20issuekey"));

  Ok(())
}
