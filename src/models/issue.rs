// ABOUTME: GitHub issue shapes shown in the issues panel

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubIssue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<GitHubLabel>,
    pub assignee: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub html_url: String,
}

impl GitHubIssue {
    /// Suggested worktree branch for starting a session from this issue.
    pub fn branch_name(&self) -> String {
        let slug: String = self
            .title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let slug = slug
            .split('-')
            .filter(|part| !part.is_empty())
            .take(6)
            .collect::<Vec<_>>()
            .join("-");
        if slug.is_empty() {
            format!("issue-{}", self.number)
        } else {
            format!("issue-{}-{}", self.number, slug)
        }
    }
}
