// ABOUTME: Editable state behind the modal dialogs: new session, new group, rename, move, settings, issues, worktrees, removal

use super::state::AsyncAction;
use crate::backend::CreateSessionRequest;
use crate::models::{GitHubIssue, Group, GroupSettings, MergeWorkflow, Session, Worktree, WorktreeStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewSessionField {
    Title,
    ProjectPath,
    Branch,
    NewBranch,
    Prompt,
    Start,
}

impl NewSessionField {
    const ORDER: [NewSessionField; 6] = [
        NewSessionField::Title,
        NewSessionField::ProjectPath,
        NewSessionField::Branch,
        NewSessionField::NewBranch,
        NewSessionField::Prompt,
        NewSessionField::Start,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn is_toggle(self) -> bool {
        matches!(self, NewSessionField::NewBranch | NewSessionField::Start)
    }
}

#[derive(Debug, Clone)]
pub struct NewSessionForm {
    pub group_path: String,
    pub title: String,
    pub project_path: String,
    /// Empty means work directly in the project checkout.
    pub branch: String,
    pub new_branch: bool,
    pub prompt: String,
    pub start: bool,
    pub field: NewSessionField,
    pub error: Option<String>,
    /// Set when the form was opened from an issue.
    pub issue_number: Option<u64>,
    /// Repository the issue lives in, for assigning it once the session starts.
    pub issue_repo: Option<String>,
}

impl NewSessionForm {
    pub fn new(group_path: impl Into<String>, project_path: impl Into<String>) -> Self {
        Self {
            group_path: group_path.into(),
            title: String::new(),
            project_path: project_path.into(),
            branch: String::new(),
            new_branch: true,
            prompt: String::new(),
            start: true,
            field: NewSessionField::Title,
            error: None,
            issue_number: None,
            issue_repo: None,
        }
    }

    pub fn for_group(group: &Group) -> Self {
        Self::new(group.path.clone(), group.default_path.clone())
    }

    /// Prefilled from an issue: worktree branch named after it and the issue text as prompt.
    pub fn from_issue(group: &Group, issue: &GitHubIssue) -> Self {
        let mut form = Self::for_group(group);
        form.title = format!("#{} {}", issue.number, issue.title);
        form.branch = issue.branch_name();
        form.prompt = if issue.body.trim().is_empty() {
            format!("Resolve GitHub issue #{}: {}", issue.number, issue.title)
        } else {
            format!(
                "Resolve GitHub issue #{}: {}\n\n{}",
                issue.number, issue.title, issue.body
            )
        };
        form.issue_number = Some(issue.number);
        form.issue_repo = Some(group.default_path.clone());
        form
    }

    /// Session on an existing worktree's branch; the backend reuses the checkout.
    pub fn for_worktree(group: &Group, repo_path: &str, worktree: &Worktree) -> Self {
        let mut form = Self::new(group.path.clone(), repo_path);
        form.branch = worktree.branch_name().to_string();
        form.new_branch = false;
        form
    }

    pub fn next_field(&mut self) {
        let idx = (self.field.index() + 1) % NewSessionField::ORDER.len();
        self.field = NewSessionField::ORDER[idx];
    }

    pub fn prev_field(&mut self) {
        let len = NewSessionField::ORDER.len();
        let idx = (self.field.index() + len - 1) % len;
        self.field = NewSessionField::ORDER[idx];
    }

    pub fn input_char(&mut self, ch: char) {
        match self.field {
            NewSessionField::Title => self.title.push(ch),
            NewSessionField::ProjectPath => self.project_path.push(ch),
            NewSessionField::Branch => self.branch.push(ch),
            NewSessionField::Prompt => self.prompt.push(ch),
            NewSessionField::NewBranch | NewSessionField::Start => {
                if ch == ' ' {
                    self.toggle();
                }
                return;
            }
        }
        self.error = None;
    }

    pub fn backspace(&mut self) {
        match self.field {
            NewSessionField::Title => self.title.pop(),
            NewSessionField::ProjectPath => self.project_path.pop(),
            NewSessionField::Branch => self.branch.pop(),
            NewSessionField::Prompt => self.prompt.pop(),
            NewSessionField::NewBranch | NewSessionField::Start => None,
        };
    }

    pub fn toggle(&mut self) {
        match self.field {
            NewSessionField::NewBranch => self.new_branch = !self.new_branch,
            NewSessionField::Start => self.start = !self.start,
            _ => {}
        }
    }

    /// Title shown on the card: the typed title, else the branch, else the folder name.
    pub fn effective_title(&self) -> String {
        let title = self.title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
        let branch = self.branch.trim();
        if !branch.is_empty() {
            return branch.to_string();
        }
        self.project_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("session")
            .to_string()
    }

    pub fn to_request(&self, placeholder_id: &str) -> Result<CreateSessionRequest, String> {
        let project_path = self.project_path.trim();
        if project_path.is_empty() {
            return Err("Project path is required".to_string());
        }
        let branch = self.branch.trim();
        if branch.contains(char::is_whitespace) {
            return Err("Branch name cannot contain spaces".to_string());
        }
        let prompt = self.prompt.trim();

        Ok(CreateSessionRequest {
            placeholder_id: placeholder_id.to_string(),
            project_path: project_path.to_string(),
            group_path: self.group_path.clone(),
            title: self.effective_title(),
            tool: Some("claude".to_string()),
            worktree_branch: (!branch.is_empty()).then(|| branch.to_string()),
            new_branch: !branch.is_empty() && self.new_branch,
            start: self.start,
            prompt: (!prompt.is_empty()).then(|| prompt.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Name,
    DefaultPath,
}

#[derive(Debug, Clone)]
pub struct GroupForm {
    pub name: String,
    pub default_path: String,
    pub field: GroupField,
    pub error: Option<String>,
}

impl Default for GroupForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            default_path: String::new(),
            field: GroupField::Name,
            error: None,
        }
    }
}

impl GroupForm {
    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            GroupField::Name => GroupField::DefaultPath,
            GroupField::DefaultPath => GroupField::Name,
        };
    }

    pub fn input_char(&mut self, ch: char) {
        match self.field {
            GroupField::Name => self.name.push(ch),
            GroupField::DefaultPath => self.default_path.push(ch),
        }
        self.error = None;
    }

    pub fn backspace(&mut self) {
        match self.field {
            GroupField::Name => self.name.pop(),
            GroupField::DefaultPath => self.default_path.pop(),
        };
    }

    pub fn validate(&self) -> Result<(String, String), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Group name is required".to_string());
        }
        if name.contains('/') {
            return Err("Group name cannot contain '/'".to_string());
        }
        Ok((name.to_string(), self.default_path.trim().to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct RenameForm {
    pub session_id: String,
    pub title: String,
    pub error: Option<String>,
}

impl RenameForm {
    pub fn for_session(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            title: session.title.clone(),
            error: None,
        }
    }

    pub fn validate(&self) -> Result<String, String> {
        let title = self.title.trim();
        if title.is_empty() {
            Err("Title cannot be empty".to_string())
        } else {
            Ok(title.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoveForm {
    pub session_id: String,
    pub session_title: String,
    /// `(path, name)` of every group.
    pub groups: Vec<(String, String)>,
    pub selected: usize,
    pub error: Option<String>,
}

impl MoveForm {
    pub fn new(session: &Session, groups: &[Group]) -> Self {
        let groups: Vec<(String, String)> = groups.iter().map(|g| (g.path.clone(), g.name.clone())).collect();
        let selected = groups.iter().position(|(path, _)| *path == session.group_path).unwrap_or(0);
        Self {
            session_id: session.id.clone(),
            session_title: session.title.clone(),
            groups,
            selected,
            error: None,
        }
    }

    pub fn next(&mut self) {
        if !self.groups.is_empty() {
            self.selected = (self.selected + 1) % self.groups.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.groups.is_empty() {
            self.selected = (self.selected + self.groups.len() - 1) % self.groups.len();
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.groups.get(self.selected).map(|(path, _)| path.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct GroupSettingsForm {
    pub group_path: String,
    pub group_name: String,
    pub settings: GroupSettings,
    /// 0 = merge workflow, 1 = GitHub issues.
    pub selected: usize,
    pub error: Option<String>,
}

impl GroupSettingsForm {
    pub fn for_group(group: &Group) -> Self {
        Self {
            group_path: group.path.clone(),
            group_name: group.name.clone(),
            settings: group.settings.clone(),
            selected: 0,
            error: None,
        }
    }

    pub fn toggle_selected(&mut self) {
        if self.selected == 0 {
            self.settings.merge_workflow = self.settings.merge_workflow.toggled();
        } else {
            self.settings.github_issues_enabled = !self.settings.github_issues_enabled;
        }
    }

    pub fn move_selection(&mut self) {
        self.selected = (self.selected + 1) % 2;
    }

    pub fn workflow(&self) -> MergeWorkflow {
        self.settings.merge_workflow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueField {
    Title,
    Body,
}

/// Create form, or edit form when `number` is set.
#[derive(Debug, Clone)]
pub struct IssueForm {
    pub repo_path: String,
    pub number: Option<u64>,
    pub title: String,
    pub body: String,
    /// Carried through edits so saving does not drop them.
    pub labels: Vec<String>,
    pub field: IssueField,
    pub error: Option<String>,
}

impl IssueForm {
    pub fn new(repo_path: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            number: None,
            title: String::new(),
            body: String::new(),
            labels: Vec::new(),
            field: IssueField::Title,
            error: None,
        }
    }

    pub fn for_issue(repo_path: impl Into<String>, issue: &GitHubIssue) -> Self {
        Self {
            number: Some(issue.number),
            title: issue.title.clone(),
            body: issue.body.clone(),
            labels: issue.labels.iter().map(|l| l.name.clone()).collect(),
            ..Self::new(repo_path)
        }
    }

    pub fn is_edit(&self) -> bool {
        self.number.is_some()
    }

    /// The action saving this form queues.
    pub fn submit_action(&self) -> Result<AsyncAction, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Issue title is required".to_string());
        }
        let repo_path = self.repo_path.clone();
        let title = title.to_string();
        let body = self.body.clone();
        Ok(match self.number {
            Some(number) => AsyncAction::UpdateIssue {
                repo_path,
                number,
                title,
                body,
                labels: self.labels.clone(),
            },
            None => AsyncAction::CreateIssue { repo_path, title, body },
        })
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            IssueField::Title => IssueField::Body,
            IssueField::Body => IssueField::Title,
        };
    }

    pub fn input_char(&mut self, ch: char) {
        match self.field {
            IssueField::Title => self.title.push(ch),
            IssueField::Body => self.body.push(ch),
        }
        self.error = None;
    }

    pub fn backspace(&mut self) {
        match self.field {
            IssueField::Title => self.title.pop(),
            IssueField::Body => self.body.pop(),
        };
    }
}

#[derive(Debug, Clone)]
pub struct WorktreeForm {
    pub repo_path: String,
    pub branch: String,
    pub error: Option<String>,
}

impl WorktreeForm {
    pub fn new(repo_path: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            branch: String::new(),
            error: None,
        }
    }

    pub fn validate(&self) -> Result<String, String> {
        let branch = self.branch.trim();
        if branch.is_empty() {
            return Err("Branch name is required".to_string());
        }
        if branch.contains(char::is_whitespace) {
            return Err("Branch name cannot contain spaces".to_string());
        }
        Ok(branch.to_string())
    }
}

/// Yes/no prompt that queues `action` when confirmed.
#[derive(Debug, Clone)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub action: AsyncAction,
}

impl ConfirmPrompt {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        confirm_label: impl Into<String>,
        action: AsyncAction,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: confirm_label.into(),
            action,
        }
    }
}

/// Remove dialog. Worktree safety status arrives asynchronously after it opens.
#[derive(Debug, Clone)]
pub struct RemoveConfirmation {
    pub session_id: String,
    pub title: String,
    pub has_worktree: bool,
    pub remove_worktree: bool,
    pub worktree_status: Option<WorktreeStatus>,
    pub checking: bool,
    pub dont_show_again: bool,
    /// true = "Remove" is highlighted.
    pub confirm_selected: bool,
    pub error: Option<String>,
}

impl RemoveConfirmation {
    pub fn for_session(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            title: session.title.clone(),
            has_worktree: session.has_worktree(),
            remove_worktree: session.has_worktree(),
            worktree_status: None,
            checking: session.has_worktree(),
            dont_show_again: false,
            confirm_selected: false,
            error: None,
        }
    }

    pub fn is_risky(&self) -> bool {
        self.remove_worktree && self.worktree_status.as_ref().map(|s| s.is_risky()).unwrap_or(false)
    }

    /// Warning lines for the dialog body.
    pub fn warnings(&self) -> Vec<String> {
        let Some(status) = &self.worktree_status else {
            return Vec::new();
        };
        if !self.remove_worktree {
            return Vec::new();
        }
        let mut warnings = Vec::new();
        if status.has_dirty_files {
            warnings.push("Worktree has uncommitted changes".to_string());
        }
        if status.has_unpushed_commits {
            warnings.push("Branch has commits that were never pushed".to_string());
        }
        if status.has_unmerged_branch {
            warnings.push("Branch is not merged into the default branch".to_string());
        }
        for warning in &status.warnings {
            if !warnings.contains(warning) {
                warnings.push(warning.clone());
            }
        }
        warnings
    }
}
