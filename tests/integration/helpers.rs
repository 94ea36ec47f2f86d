//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tempfile::TempDir;

/// A scratch area with a run directory, local "remote" repositories and a clone folder
pub struct TestWorkspace {
  _root: TempDir,
  /// Working directory of the binary (config, project table, results)
  pub path: PathBuf,
  /// Repositories the tool clones from, one `<name>.git` per project
  pub remotes: PathBuf,
  /// FOLDER_LOC: clones land here and must be gone after the run
  pub clones: PathBuf,
}

impl TestWorkspace {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("run");
    let remotes = root.path().join("remotes");
    let clones = root.path().join("clones");
    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(&remotes)?;
    std::fs::create_dir_all(&clones)?;

    Ok(Self {
      _root: root,
      path,
      remotes,
      clones,
    })
  }

  /// Create a repository for `project` on `master` with one tagged initial commit
  pub fn add_project(&self, project: &str, initial_tag: &str) -> Result<PathBuf> {
    let repo = self.remotes.join(format!("{}.git", project));
    std::fs::create_dir_all(&repo)?;

    git(&repo, &["init", "--initial-branch=master"])?;
    git(&repo, &["config", "user.name", "Test User"])?;
    git(&repo, &["config", "user.email", "test@example.com"])?;
    git(&repo, &["config", "commit.gpgsign", "false"])?;

    std::fs::write(repo.join("README.md"), format!("# {}\n", project))?;
    git(&repo, &["add", "."])?;
    git(&repo, &["commit", "-m", "Initial import"])?;
    git(&repo, &["tag", initial_tag])?;

    Ok(repo)
  }

  /// Write `config.json` pointing at the local remotes and `jira_url`
  pub fn write_config(&self, jira_url: &str, fix_version: &str) -> Result<()> {
    let config = serde_json::json!({
      "FIX_VERSION": fix_version,
      "FOLDER_LOC": format!("{}/", self.clones.display()),
      "JIRA_URL": jira_url,
      "GIT_WORKSPACE_URL": format!("{}/", self.remotes.display()),
      "JQL_QUERY": "project = REL AND fixVersion =",
      "ISSUE_PREFIX": "REL-",
    });
    std::fs::write(self.path.join("config.json"), serde_json::to_string_pretty(&config)?)?;
    Ok(())
  }

  /// Write `repo_data.csv` with a header row and the given project rows
  pub fn write_projects(&self, rows: &[[&str; 4]]) -> Result<()> {
    let mut content = String::from("Project,Branch,From,To\n");
    for row in rows {
      content.push_str(&row.join(","));
      content.push('\n');
    }
    std::fs::write(self.path.join("repo_data.csv"), content)?;
    Ok(())
  }

  /// Timestamped results files in the run directory
  pub fn result_files(&self) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&self.path)? {
      let path = entry?.path();
      let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
      if name.starts_with("execution_results_") && name.ends_with(".csv") {
        files.push(path);
      }
    }
    Ok(files)
  }

  /// Whether anything is left in the clone folder
  pub fn clones_left(&self) -> Result<usize> {
    Ok(std::fs::read_dir(&self.clones)?.count())
  }
}

/// Commit a change with `message` and return the short SHA
pub fn commit(repo: &Path, message: &str) -> Result<String> {
  let file = repo.join("CHANGES.md");
  let mut content = std::fs::read_to_string(&file).unwrap_or_default();
  content.push_str(message);
  content.push('\n');
  std::fs::write(&file, content)?;

  git(repo, &["add", "."])?;
  git(repo, &["commit", "-m", message])?;
  let output = git(repo, &["rev-parse", "--short", "HEAD"])?;
  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run release-audit with test credentials; a non-zero exit is not an error here
pub fn run_release_audit(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_release-audit");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env("GIT_USER", "ci-bot")
    .env("GIT_PASS", "git-secret")
    .env("JIRA_USER", "auditor")
    .env("JIRA_PASS", "jira-secret")
    .env_remove("RELEASE_AUDIT_LOG")
    .output()
    .context("Failed to run release-audit")
}

/// Read a results table into rows of fields
pub fn read_results(path: &Path) -> Result<Vec<Vec<String>>> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .from_path(path)?;

  let mut rows = Vec::new();
  for record in reader.records() {
    rows.push(record?.iter().map(str::to_string).collect());
  }
  Ok(rows)
}

/// Minimal Jira serving the search and issue endpoints from memory
pub struct FakeJira {
  pub url: String,
  issue_requests: Arc<AtomicUsize>,
  seen: Arc<Mutex<Vec<String>>>,
  server: Arc<tiny_http::Server>,
  handle: Option<JoinHandle<()>>,
}

impl FakeJira {
  /// `declared` are the release's issue keys; `issues` maps keys to fix versions
  pub fn start(declared: &[&str], issues: &[(&str, &[&str])]) -> Result<Self> {
    let server = Arc::new(tiny_http::Server::http("127.0.0.1:0").map_err(|e| anyhow::anyhow!("{}", e))?);
    let port = server
      .server_addr()
      .to_ip()
      .context("fake Jira is not bound to an IP address")?
      .port();

    let declared: Vec<String> = declared.iter().map(|k| k.to_string()).collect();
    let issues: HashMap<String, Vec<String>> = issues
      .iter()
      .map(|(key, versions)| (key.to_string(), versions.iter().map(|v| v.to_string()).collect()))
      .collect();
    let issue_requests = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let handle = {
      let server = Arc::clone(&server);
      let issue_requests = Arc::clone(&issue_requests);
      let seen = Arc::clone(&seen);
      std::thread::spawn(move || {
        for request in server.incoming_requests() {
          let url = request.url().to_string();
          seen.lock().unwrap().push(url.clone());

          let (status, body) = if url.starts_with("/rest/api/2/search") {
            let keys: Vec<_> = declared.iter().map(|k| serde_json::json!({ "key": k })).collect();
            (
              200,
              serde_json::json!({ "startAt": 0, "total": declared.len(), "issues": keys }).to_string(),
            )
          } else if let Some(rest) = url.strip_prefix("/rest/api/2/issue/") {
            issue_requests.fetch_add(1, Ordering::SeqCst);
            let key = rest.split('?').next().unwrap_or_default();
            match issues.get(key) {
              Some(versions) => {
                let versions: Vec<_> = versions.iter().map(|v| serde_json::json!({ "name": v })).collect();
                (
                  200,
                  serde_json::json!({ "key": key, "fields": { "fixVersions": versions } }).to_string(),
                )
              }
              None => (404, r#"{"errorMessages":["Issue Does Not Exist"]}"#.to_string()),
            }
          } else {
            (404, String::new())
          };

          let _ = request.respond(tiny_http::Response::from_string(body).with_status_code(status));
        }
      })
    };

    Ok(Self {
      url: format!("http://127.0.0.1:{}", port),
      issue_requests,
      seen,
      server,
      handle: Some(handle),
    })
  }

  /// Requests made to the single-issue endpoint
  pub fn issue_requests(&self) -> usize {
    self.issue_requests.load(Ordering::SeqCst)
  }

  /// Every request path seen so far
  pub fn seen(&self) -> Vec<String> {
    self.seen.lock().unwrap().clone()
  }
}

impl Drop for FakeJira {
  fn drop(&mut self) {
    self.server.unblock();
    if let Some(handle) = self.handle.take() {
      let _ = handle.join();
    }
  }
}
