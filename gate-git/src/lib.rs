//! Git collaborator — the only crate that spawns processes.
//!
//! Everything here shells out to `git` via [`command::run_git`] and
//! parses the porcelain text into typed facts. Parsing functions are
//! pure over the command output so they stay unit-testable without a
//! repository.

pub mod command;
pub mod diff;
pub mod refs;
pub mod repo;

pub use diff::{filter_by_extension, parse_name_status, NameStatusEntry};
pub use refs::{resolve_ci_range, resolve_pre_push_range, ComparisonRange};
pub use repo::GitRepo;
