//! Core building blocks for release-audit
//!
//! - **config**: audit configuration (JSON or TOML) loading and validation
//! - **context**: credentials and the per-run context shared by every step
//! - **error**: error types with contextual help messages and exit codes
//! - **vcs**: git operations abstraction (SystemGit) and scoped clone workspaces

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
