// ABOUTME: Group data model binding a project folder to a display name and per-group settings

use serde::{Deserialize, Serialize};

/// How finished work in a group's worktrees gets back into the default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergeWorkflow {
    /// Rebase, then merge locally into the default branch.
    Direct,
    /// Rebase, push, and open a pull request on GitHub.
    #[default]
    PullRequest,
}

impl MergeWorkflow {
    pub fn label(&self) -> &'static str {
        match self {
            MergeWorkflow::Direct => "Direct merge",
            MergeWorkflow::PullRequest => "Pull request",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            MergeWorkflow::Direct => MergeWorkflow::PullRequest,
            MergeWorkflow::PullRequest => MergeWorkflow::Direct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    #[serde(default)]
    pub merge_workflow: MergeWorkflow,
    #[serde(default = "default_true")]
    pub github_issues_enabled: bool,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            merge_workflow: MergeWorkflow::default(),
            github_issues_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub default_path: String,
    #[serde(default)]
    pub settings: GroupSettings,
}

impl Group {
    pub fn new(path: impl Into<String>, name: impl Into<String>, default_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            expanded: true,
            sort_order: 0,
            default_path: default_path.into(),
            settings: GroupSettings::default(),
        }
    }

    pub fn issues_enabled(&self) -> bool {
        self.settings.github_issues_enabled && !self.default_path.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_settings_use_defaults() {
        let json = r#"{"path":"work","name":"Work","expanded":true,"sort_order":1,"default_path":"/src/work"}"#;
        let group: Group = serde_json::from_str(json).unwrap();
        assert_eq!(group.settings.merge_workflow, MergeWorkflow::PullRequest);
        assert!(group.settings.github_issues_enabled);
    }

    #[test]
    fn test_merge_workflow_wire_format() {
        let settings = GroupSettings {
            merge_workflow: MergeWorkflow::Direct,
            github_issues_enabled: false,
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"direct\""));
    }

    #[test]
    fn test_issues_require_a_default_path() {
        let group = Group::new("scratch", "Scratch", "");
        assert!(!group.issues_enabled());
    }
}
