//! Git history for a scanned repository: recent commits and branches.
//!
//! Reads the local repository with git2. Nothing here touches the network;
//! a directory that is not a git repository simply has no history.

pub mod branches;
pub mod mining;

pub use branches::{current_branch, local_branches, DEFAULT_BRANCH};
pub use mining::{recent_commits, CommitSummary};
