//! `release-audit` run driver
//!
//! Reads the project table, asks the tracker for the release's issues,
//! reconciles every project in input order and writes the results table.
//!
//! By default a project that fails (clone, checkout, log or issue lookup) gets
//! a failure row and the run moves on; the unreferenced-issue summary is still
//! written and the run reports failure at the end. With `fail_fast` the first
//! failure aborts the run and no summary is written.

use crate::core::context::AuditContext;
use crate::core::error::{AuditError, AuditResult, ResultExt};
use crate::core::vcs::{SystemGit, VersionControl};
use crate::input;
use crate::reconcile::{
  CommitValidator, ExpectedIssueSet, ProjectDescriptor, ProjectReconciler, ReleaseContext, ReportAggregator,
};
use crate::tracker::{CachingTracker, IssueTracker, JiraClient};
use crate::ui::ProjectProgress;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Options for one run, straight from the command line
#[derive(Debug, Clone)]
pub struct AuditOptions {
  pub input: PathBuf,
  pub output_dir: PathBuf,
  /// Full output path; overrides `output_dir`
  pub output: Option<PathBuf>,
  pub fail_fast: bool,
  pub strict: bool,
  pub issue_cache: bool,
  pub timeout: Duration,
  pub progress: bool,
}

impl Default for AuditOptions {
  fn default() -> Self {
    Self {
      input: PathBuf::from("repo_data.csv"),
      output_dir: PathBuf::from("."),
      output: None,
      fail_fast: false,
      strict: false,
      issue_cache: true,
      timeout: Duration::from_secs(60),
      progress: false,
    }
  }
}

/// A project whose reconciliation failed
#[derive(Debug, Clone, Serialize)]
pub struct ProjectFailure {
  pub project: String,
  pub error: String,
}

/// Totals for a finished run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
  pub output: PathBuf,
  pub projects: usize,
  pub commits_checked: usize,
  pub invalid_commits: usize,
  pub invalid_issues: usize,
  pub unreferenced_issues: usize,
  pub failures: Vec<ProjectFailure>,
  pub issue_lookups: usize,
  pub cache_hits: usize,
  pub elapsed_secs: f64,
}

impl RunSummary {
  pub fn has_discrepancies(&self) -> bool {
    self.invalid_commits > 0 || self.invalid_issues > 0 || self.unreferenced_issues > 0
  }

  /// Turn the summary into the run's final result
  ///
  /// Failed projects always fail the run; discrepancies only under `strict`.
  pub fn verdict(&self, strict: bool) -> AuditResult<()> {
    if !self.failures.is_empty() {
      let names: Vec<_> = self.failures.iter().map(|f| f.project.as_str()).collect();
      return Err(AuditError::AuditFailed {
        reason: format!("{} project(s) could not be reconciled: {}", names.len(), names.join(", ")),
      });
    }
    if strict && self.has_discrepancies() {
      return Err(AuditError::AuditFailed {
        reason: format!(
          "{} invalid commit(s), {} invalid issue reference(s), {} unreferenced issue(s)",
          self.invalid_commits, self.invalid_issues, self.unreferenced_issues
        ),
      });
    }
    Ok(())
  }
}

/// Run the audit command
pub fn run_audit(ctx: &AuditContext, options: &AuditOptions) -> AuditResult<RunSummary> {
  let started = Instant::now();
  let config = &ctx.config;

  let input_path = ctx.resolve(&options.input);
  tracing::info!(path = %input_path.display(), "Reading project table");
  let projects = input::read_projects(&input_path)?;
  tracing::debug!(count = projects.len(), "projects to audit");

  // a bad identifier pattern fails the run before the tracker is contacted
  config.issue_pattern()?;

  tracing::info!(url = %config.jira_url, "Connecting to JIRA server");
  let jira = JiraClient::new(&config.jira_url, ctx.credentials.jira.clone(), options.timeout)?;
  let mut tracker = CachingTracker::new(jira, options.issue_cache);

  tracing::info!(version = %config.fix_version, "Getting all issues for fix version");
  let expected = load_expected(ctx, &tracker)?;

  let output_path = output_path(ctx, options);
  tracing::debug!(path = %output_path.display(), "Creating file for output results");
  if let Some(parent) = output_path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  let file = File::create(&output_path).with_context(|| format!("Failed to create {}", output_path.display()))?;
  let report = ReportAggregator::new(file, config.browse_prefix())?;

  let vcs = SystemGit::new().with_secret(ctx.credentials.git.password.clone());
  let mut progress = options
    .progress
    .then(|| ProjectProgress::new(projects.len(), "Reconciling projects"));

  let mut summary = reconcile_all(
    ctx,
    &projects,
    expected,
    &mut tracker,
    &vcs,
    report,
    options.fail_fast,
    progress.as_mut(),
  )?;

  summary.output = output_path;
  summary.issue_lookups = tracker.requests();
  summary.cache_hits = tracker.hits();
  summary.elapsed_secs = started.elapsed().as_secs_f64();

  tracing::info!(
    projects = summary.projects,
    failed = summary.failures.len(),
    invalid_commits = summary.invalid_commits,
    invalid_issues = summary.invalid_issues,
    unreferenced = summary.unreferenced_issues,
    lookups = summary.issue_lookups,
    cache_hits = summary.cache_hits,
    "Execution time --- {:.2} seconds.",
    summary.elapsed_secs
  );

  Ok(summary)
}

/// Print the run summary to stdout, as text or JSON
pub fn print_summary(summary: &RunSummary, json: bool) -> AuditResult<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(summary)?);
    return Ok(());
  }

  println!("\n📋 Release audit\n");
  println!("  Projects:              {}", summary.projects);
  println!("  Commits checked:       {}", summary.commits_checked);
  println!("  Invalid commits:       {}", summary.invalid_commits);
  println!("  Invalid issue refs:    {}", summary.invalid_issues);
  println!("  Unreferenced issues:   {}", summary.unreferenced_issues);
  println!(
    "  Issue lookups:         {} ({} from cache)",
    summary.issue_lookups, summary.cache_hits
  );
  for failure in &summary.failures {
    println!("  ⚠️  {}: {}", failure.project, failure.error);
  }

  let marker = if summary.failures.is_empty() && !summary.has_discrepancies() {
    "✅"
  } else {
    "📄"
  };
  println!(
    "\n{} Results written to {} ({:.2}s)",
    marker,
    summary.output.display(),
    summary.elapsed_secs
  );
  Ok(())
}

/// Query the tracker once for every issue declared against the release
pub(crate) fn load_expected(ctx: &AuditContext, tracker: &dyn IssueTracker) -> AuditResult<ExpectedIssueSet> {
  let jql = ctx.config.jql();
  tracing::debug!(jql = %jql, "Running JQL query");

  let ids = tracker
    .search_issues(&jql, ctx.config.max_results())
    .context("Failed to load the release's issues")?;
  let expected = ExpectedIssueSet::new(ids);

  tracing::debug!(ids = ?expected.remaining().collect::<Vec<_>>(), "Jira IDs retrieved from server");
  tracing::info!(count = expected.len(), "Issues declared for release");
  Ok(expected)
}

fn output_path(ctx: &AuditContext, options: &AuditOptions) -> PathBuf {
  match &options.output {
    Some(path) => ctx.resolve(path),
    None => {
      let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
      ctx
        .resolve(&options.output_dir)
        .join(format!("execution_results_{}.csv", stamp))
    }
  }
}

/// Reconcile every project in order, then write the summary rows
#[allow(clippy::too_many_arguments)]
pub(crate) fn reconcile_all<W: Write>(
  ctx: &AuditContext,
  projects: &[ProjectDescriptor],
  mut expected: ExpectedIssueSet,
  tracker: &mut dyn IssueTracker,
  vcs: &dyn VersionControl,
  mut report: ReportAggregator<W>,
  fail_fast: bool,
  mut progress: Option<&mut ProjectProgress>,
) -> AuditResult<RunSummary> {
  let config = &ctx.config;
  let pattern = config.issue_pattern()?;
  let release = ReleaseContext::new(&config.fix_version);
  let reconciler = ProjectReconciler::new(
    config,
    &ctx.credentials.git,
    CommitValidator::new(&pattern, &release),
  );

  let mut summary = RunSummary {
    projects: projects.len(),
    ..Default::default()
  };

  for project in projects {
    tracing::info!(project = %project.name, "Processing");

    match reconciler.reconcile(project, &mut expected, tracker, vcs) {
      Ok(record) => {
        if record.is_clean() {
          tracing::debug!(project = %project.name, commits = record.commits_checked, "no discrepancies");
        }
        summary.commits_checked += record.commits_checked;
        summary.invalid_commits += record.invalid_commits.len();
        summary.invalid_issues += record.invalid_issues.len();

        tracing::info!(project = %project.name, "Writing results to file");
        report.append_project(&record)?;
      }
      Err(e) if fail_fast => {
        tracing::error!(project = %project.name, error = %e, "Reconciliation failed, aborting run");
        return Err(e.context(format!("While reconciling project '{}'", project.name)));
      }
      Err(e) => {
        let message = e.to_string().lines().next().unwrap_or_default().to_string();
        tracing::error!(project = %project.name, error = %e, "Reconciliation failed, continuing");
        report.append_failure(&project.name, &message)?;
        summary.failures.push(ProjectFailure {
          project: project.name.clone(),
          error: message,
        });
      }
    }

    if let Some(progress) = progress.as_deref_mut() {
      progress.inc();
    }
  }

  tracing::info!(rows = report.rows(), "Writing final result");
  if expected.is_empty() {
    tracing::info!("Every declared issue is referenced by a commit");
  }
  summary.unreferenced_issues = expected.len();
  report.finalize(&expected)?;

  Ok(summary)
}
