//! Recent commit extraction via git2.

use std::path::Path;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{ErrorCode, Repository, Sort};
use kachow_core::KachowError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Length of the abbreviated commit hash.
const SHORT_HASH_LEN: usize = 7;

/// Display format for commit dates, e.g. `Nov 14, 22:13`.
const DATE_FORMAT: &str = "%b %d, %H:%M";

/// One commit as shown in the history panel.
///
/// # Examples
///
/// ```
/// use kachow_history::CommitSummary;
///
/// let commit = CommitSummary {
///     hash: "3f2a9c1".into(),
///     message: "fix: resolve package imports".into(),
///     author: "ada".into(),
///     date: "Nov 14, 22:13".into(),
/// };
/// assert_eq!(commit.hash.len(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Abbreviated commit hash.
    pub hash: String,
    /// First line of the commit message.
    pub message: String,
    /// Author name.
    pub author: String,
    /// Commit time in the committer's own timezone.
    pub date: String,
}

/// The newest `limit` commits reachable from HEAD, newest first.
///
/// A repository without commits yet has an empty history.
///
/// # Errors
///
/// Returns [`KachowError::Git`] if `repo_path` is not a git repository or
/// the history cannot be walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use kachow_history::recent_commits;
///
/// for c in recent_commits(Path::new("."), 10).unwrap() {
///     println!("{} {} ({}, {})", c.hash, c.message, c.author, c.date);
/// }
/// ```
pub fn recent_commits(repo_path: &Path, limit: usize) -> Result<Vec<CommitSummary>, KachowError> {
    let repo = Repository::open(repo_path)
        .map_err(|e| KachowError::Git(format!("failed to open repository: {e}")))?;

    if let Err(e) = repo.head() {
        if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) {
            debug!(path = %repo_path.display(), "repository has no commits");
            return Ok(Vec::new());
        }
        return Err(KachowError::Git(format!("failed to read HEAD: {e}")));
    }

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| KachowError::Git(format!("failed to create revwalk: {e}")))?;
    revwalk.set_sorting(Sort::TIME).ok();
    revwalk
        .push_head()
        .map_err(|e| KachowError::Git(format!("failed to push HEAD: {e}")))?;

    let mut commits = Vec::new();
    for oid_result in revwalk.take(limit) {
        let oid = oid_result.map_err(|e| KachowError::Git(format!("revwalk error: {e}")))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| KachowError::Git(format!("failed to find commit: {e}")))?;

        let hash = oid.to_string();
        commits.push(CommitSummary {
            hash: hash[..hash.len().min(SHORT_HASH_LEN)].to_string(),
            message: commit
                .message()
                .unwrap_or("")
                .lines()
                .next()
                .unwrap_or("")
                .to_string(),
            author: commit.author().name().unwrap_or("unknown").to_string(),
            date: format_commit_time(commit.time()),
        });
    }

    debug!(commits = commits.len(), "history loaded");
    Ok(commits)
}

fn format_commit_time(time: git2::Time) -> String {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .map(|dt| dt.with_timezone(&offset).format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use git2::{Commit, Oid, Signature, Time};

    /// Commit a new file to HEAD with the given author time.
    pub(crate) fn commit_at(repo: &Repository, message: &str, seconds: i64, offset: i32) -> Oid {
        let workdir = repo.workdir().unwrap();
        let name = format!("file-{seconds}.txt");
        std::fs::write(workdir.join(&name), message).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(&name)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let sig = Signature::new("Ada Lovelace", "ada@example.com", &Time::new(seconds, offset))
            .unwrap();
        let parents: Vec<Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn newest_commits_come_first_and_are_limited() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        for i in 0..5 {
            commit_at(&repo, &format!("change {i}\n\nbody text"), 1_700_000_000 + i * 60, 0);
        }

        let commits = recent_commits(dir.path(), 3).unwrap();
        let messages: Vec<&str> = commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["change 4", "change 3", "change 2"]);
        assert!(commits.iter().all(|c| c.hash.len() == SHORT_HASH_LEN));
        assert_eq!(commits[0].author, "Ada Lovelace");
    }

    #[test]
    fn dates_use_committer_timezone() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_at(&repo, "utc", 1_700_000_000, 0);
        commit_at(&repo, "cest", 1_700_000_060, 120);

        let commits = recent_commits(dir.path(), 10).unwrap();
        assert_eq!(commits[0].date, "Nov 15, 00:14");
        assert_eq!(commits[1].date, "Nov 14, 22:13");
    }

    #[test]
    fn empty_repository_has_no_history() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        assert!(recent_commits(dir.path(), 10).unwrap().is_empty());
    }

    #[test]
    fn unborn_branch_after_checkout_has_no_history() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_at(&repo, "init", 1_700_000_000, 0);
        repo.set_head("refs/heads/orphan").unwrap();

        assert!(recent_commits(dir.path(), 10).unwrap().is_empty());
    }

    #[test]
    fn plain_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = recent_commits(dir.path(), 10).unwrap_err();
        assert!(matches!(err, KachowError::Git(_)));
    }

    #[test]
    fn summary_serializes_flat() {
        let commit = CommitSummary {
            hash: "abc1234".into(),
            message: "init".into(),
            author: "ada".into(),
            date: "Jan 01, 00:00".into(),
        };
        let json = serde_json::to_value(&commit).unwrap();
        assert_eq!(json["hash"], "abc1234");
        assert_eq!(json["date"], "Jan 01, 00:00");
    }
}
