//! Release reconciliation engine
//!
//! Cross-references the commits of every project against the issues declared
//! for a release:
//!
//! - **identifier**: pull the first issue identifier out of a commit line
//! - **expected**: issues declared for the release, shrinking as commits reference them
//! - **validator**: classify a commit as missing an identifier, invalid, or valid
//! - **project**: clone one project, read its commit range and classify every commit
//! - **report**: write one row per project and the final unreferenced-issue summary
//!
//! # Known simplifications
//!
//! Only the first identifier in a commit message is looked at, and only the
//! first fix version of a referenced issue is compared with the release. A
//! commit naming two issues, or an issue targeted at several releases, can
//! therefore be reported as invalid even though another reading would accept
//! it.

pub mod expected;
pub mod identifier;
pub mod project;
pub mod report;
pub mod validator;

pub use expected::ExpectedIssueSet;
pub use identifier::{IssueId, IssuePattern};
pub use project::{DiscrepancyRecord, ProjectDescriptor, ProjectReconciler};
pub use report::ReportAggregator;
pub use validator::{Classification, CommitValidator, ReleaseContext};
