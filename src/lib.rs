//! Operational hygiene for AWS IAM.
//!
//! Two independent passes over the account, each a bounded read-then-act
//! sequence with no state kept between runs:
//!
//! - `rotate-keys`: retire access keys past a staleness threshold and
//!   provision replacements, at most one rotation per user per run.
//! - `unused-roles`: report (and optionally tag) roles with no recent
//!   activity.
//!
//! Both run in dry-run mode unless `--apply` is passed.

pub mod cli;
pub mod commands;
pub mod constants;
pub mod directory;
pub mod rotation;
pub mod scanner;
