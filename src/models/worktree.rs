// ABOUTME: Worktree listings and safety checks returned by the backend before removal or merge

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worktree {
    pub path: String,
    pub head: String,
    pub branch: String,
    #[serde(default)]
    pub is_bare: bool,
}

impl Worktree {
    /// Branch without the `refs/heads/` prefix `git worktree list --porcelain` reports.
    pub fn branch_name(&self) -> &str {
        self.branch.strip_prefix("refs/heads/").unwrap_or(&self.branch)
    }

    pub fn is_detached(&self) -> bool {
        self.branch.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorktreeStatus {
    pub has_dirty_files: bool,
    pub has_unmerged_branch: bool,
    pub has_unpushed_commits: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl WorktreeStatus {
    /// True when removing the worktree could lose work.
    pub fn is_risky(&self) -> bool {
        self.has_dirty_files || self.has_unmerged_branch || self.has_unpushed_commits
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub success: bool,
    pub main_worktree_path: String,
    pub conflict_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_name_strips_ref_prefix() {
        let mut worktree = Worktree {
            path: "/src/app-worktrees/spike".to_string(),
            head: "abc123".to_string(),
            branch: "refs/heads/spike".to_string(),
            is_bare: false,
        };
        assert_eq!(worktree.branch_name(), "spike");
        worktree.branch = "main".to_string();
        assert_eq!(worktree.branch_name(), "main");
        worktree.branch.clear();
        assert!(worktree.is_detached());
    }
}
