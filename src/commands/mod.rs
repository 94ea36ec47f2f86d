//! CLI commands for release-audit
//!
//! - **audit**: reconcile every project's commits with the release's issues and
//!   write the results table

pub mod audit;

pub use audit::{AuditOptions, print_summary, run_audit};
