use std::path::Path;

use git2::{BranchType, Repository};
use tracing::debug;

/// Branch reported when a repository has no readable branches.
pub const DEFAULT_BRANCH: &str = "main";

/// Name of the branch HEAD points to, including an unborn branch in a fresh
/// repository. `None` for detached HEAD or a directory that is not a
/// repository.
pub fn current_branch(repo_path: &Path) -> Option<String> {
    let repo = Repository::open(repo_path).ok()?;
    let head = repo.find_reference("HEAD").ok()?;
    let target = head.symbolic_target()?;
    target.strip_prefix("refs/heads/").map(str::to_string)
}

/// Local branch names, sorted.
///
/// Falls back to `["main"]` when the path is not a repository or has no
/// branches yet, so callers always have something to select.
///
/// # Examples
///
/// ```
/// use kachow_history::local_branches;
///
/// let dir = std::env::temp_dir();
/// assert!(!local_branches(&dir).is_empty());
/// ```
pub fn local_branches(repo_path: &Path) -> Vec<String> {
    match read_branches(repo_path) {
        Ok(names) if !names.is_empty() => names,
        Ok(_) => vec![DEFAULT_BRANCH.to_string()],
        Err(e) => {
            debug!(path = %repo_path.display(), error = %e, "no branches readable");
            vec![DEFAULT_BRANCH.to_string()]
        }
    }
}

fn read_branches(repo_path: &Path) -> Result<Vec<String>, git2::Error> {
    let repo = Repository::open(repo_path)?;
    let mut names = Vec::new();
    for branch in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = branch?;
        if let Some(name) = branch.name()? {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
