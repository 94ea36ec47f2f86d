mod commands;
mod core;
mod input;
mod reconcile;
mod tracker;
mod ui;
mod utils;

use clap::Parser;
use commands::AuditOptions;
use core::context::{AuditContext, Credentials};
use core::error::{AuditError, print_error};
use std::path::PathBuf;
use std::time::Duration;

/// Reconcile release commits with the Jira issues declared for a fix version
#[derive(Parser)]
#[command(name = "release-audit")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Configuration file (default: config.json, audit.toml or .config/audit.toml)
  #[arg(long)]
  config: Option<PathBuf>,

  /// Project table: name, branch, start revision, end revision
  #[arg(long, default_value = "repo_data.csv")]
  input: PathBuf,

  /// Directory for the timestamped results file
  #[arg(long, default_value = ".")]
  output_dir: PathBuf,

  /// Exact results file path (overrides --output-dir)
  #[arg(long)]
  output: Option<PathBuf>,

  /// Git username
  #[arg(long, env = "GIT_USER")]
  git_user: Option<String>,

  /// Git password or access token
  #[arg(long, env = "GIT_PASS", hide_env_values = true)]
  git_pass: Option<String>,

  /// Jira username
  #[arg(long, env = "JIRA_USER")]
  jira_user: Option<String>,

  /// Jira password or API token
  #[arg(long, env = "JIRA_PASS", hide_env_values = true)]
  jira_pass: Option<String>,

  /// Abort on the first project that cannot be reconciled (no summary rows)
  #[arg(long)]
  fail_fast: bool,

  /// Exit with code 3 when any discrepancy is found
  #[arg(long)]
  strict: bool,

  /// Look up every referenced issue, even when already seen in this run
  #[arg(long)]
  no_issue_cache: bool,

  /// Timeout for each Jira request, in seconds
  #[arg(long, default_value_t = 60)]
  timeout_secs: u64,

  /// Show a progress bar over the projects
  #[arg(long)]
  progress: bool,

  /// Print the run summary as JSON
  #[arg(long)]
  json: bool,

  /// Debug logging
  #[arg(short, long, conflicts_with = "quiet")]
  verbose: bool,

  /// Only log errors
  #[arg(short, long)]
  quiet: bool,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Cyan))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Cyan))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_tracing(verbose: bool, quiet: bool) {
  let level = if verbose {
    "debug"
  } else if quiet {
    "error"
  } else {
    "info"
  };

  let filter =
    tracing_subscriber::EnvFilter::try_from_env("RELEASE_AUDIT_LOG").unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

  // a second init (only possible in tests) keeps the first subscriber
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose, cli.quiet);

  tracing::info!("Starting execution");

  let root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  let credentials = match Credentials::from_parts(cli.git_user, cli.git_pass, cli.jira_user, cli.jira_pass) {
    Ok(credentials) => credentials,
    Err(e) => handle_error(e),
  };

  tracing::info!("Reading config file");
  let ctx = match AuditContext::build(&root, cli.config.as_deref(), credentials) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };
  tracing::debug!(config = ?ctx.config, credentials = ?ctx.credentials, "parameters");

  let options = AuditOptions {
    input: cli.input,
    output_dir: cli.output_dir,
    output: cli.output,
    fail_fast: cli.fail_fast,
    strict: cli.strict,
    issue_cache: !cli.no_issue_cache,
    timeout: Duration::from_secs(cli.timeout_secs),
    progress: cli.progress,
  };

  let result = commands::run_audit(&ctx, &options).and_then(|summary| {
    commands::print_summary(&summary, cli.json)?;
    summary.verdict(options.strict)
  });

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: AuditError) -> ! {
  tracing::error!(exit_code = err.exit_code().as_i32(), "{}", err);
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
