// ABOUTME: Client-side mirror of the merge workflow for one worktree session
// Each stage names the backend call that moves it forward; results advance or fail the flow

use crate::models::{MergeResult, MergeWorkflow, PrInfo, PrState, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrStage {
    Confirming,
    Rebasing,
    Pushing,
    EditingPr,
    CreatingPr,
    PrOpen(PrInfo),
    PrMerged(PrInfo),
    Merging,
    Merged,
    Conflict { message: String, main_worktree_path: String },
    Failed { during: Box<PrStage>, error: String },
}

impl PrStage {
    pub fn label(&self) -> &'static str {
        match self {
            PrStage::Confirming => "confirm",
            PrStage::Rebasing => "rebasing",
            PrStage::Pushing => "pushing",
            PrStage::EditingPr => "edit pull request",
            PrStage::CreatingPr => "creating pull request",
            PrStage::PrOpen(_) => "pull request open",
            PrStage::PrMerged(_) => "pull request merged",
            PrStage::Merging => "merging",
            PrStage::Merged => "merged",
            PrStage::Conflict { .. } => "merge conflict",
            PrStage::Failed { .. } => "failed",
        }
    }

    /// Stages waiting on a backend call.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            PrStage::Rebasing | PrStage::Pushing | PrStage::CreatingPr | PrStage::Merging
        )
    }
}

/// Backend call that advances the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrStep {
    Rebase,
    Push,
    CreatePr,
    Merge,
}

/// Result of a successful step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    PrCreated(PrInfo),
    Merge(MergeResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrField {
    Title,
    Body,
}

#[derive(Debug, Clone)]
pub struct PrFlow {
    pub session_id: String,
    pub session_title: String,
    pub repo_path: String,
    pub worktree_path: String,
    pub branch: String,
    /// Resolved from the backend on the first step.
    pub base_branch: Option<String>,
    pub workflow: MergeWorkflow,
    pub stage: PrStage,
    pub title: String,
    pub body: String,
    pub field: PrField,
    /// "Don't ask again" checkbox on the confirm step.
    pub skip_confirmation: bool,
}

impl PrFlow {
    /// Start the flow for a worktree session. Sessions that already have a PR
    /// resume at its current state.
    pub fn for_session(session: &Session, workflow: MergeWorkflow) -> Option<Self> {
        if !session.has_worktree() {
            return None;
        }
        let branch = session.branch_label()?.to_string();

        let stage = match &session.pr {
            Some(pr) if pr.state == PrState::Merged => PrStage::PrMerged(pr.clone()),
            Some(pr) if pr.state == PrState::Open => PrStage::PrOpen(pr.clone()),
            _ => PrStage::Confirming,
        };

        Some(Self {
            session_id: session.id.clone(),
            session_title: session.title.clone(),
            repo_path: session.repo_path().to_string(),
            worktree_path: session.worktree_path.clone(),
            branch,
            base_branch: None,
            workflow,
            stage,
            title: session.title.clone(),
            body: session.prompt.clone().unwrap_or_default(),
            field: PrField::Title,
            skip_confirmation: false,
        })
    }

    pub fn next_step(&self) -> Option<PrStep> {
        match self.stage {
            PrStage::Rebasing => Some(PrStep::Rebase),
            PrStage::Pushing => Some(PrStep::Push),
            PrStage::CreatingPr => Some(PrStep::CreatePr),
            PrStage::Merging => Some(PrStep::Merge),
            _ => None,
        }
    }

    /// Confirming → Rebasing.
    pub fn confirm(&mut self) -> bool {
        if self.stage == PrStage::Confirming {
            self.stage = PrStage::Rebasing;
            true
        } else {
            false
        }
    }

    /// EditingPr → CreatingPr, once the title is non-empty.
    pub fn submit_pr(&mut self) -> bool {
        if self.stage == PrStage::EditingPr && !self.title.trim().is_empty() {
            self.stage = PrStage::CreatingPr;
            true
        } else {
            false
        }
    }

    pub fn on_success(&mut self, outcome: StepOutcome) {
        let next = match (&self.stage, outcome) {
            (PrStage::Rebasing, _) => match self.workflow {
                MergeWorkflow::Direct => PrStage::Merging,
                MergeWorkflow::PullRequest => PrStage::Pushing,
            },
            (PrStage::Pushing, _) => PrStage::EditingPr,
            (PrStage::CreatingPr, StepOutcome::PrCreated(pr)) => match pr.state {
                PrState::Merged => PrStage::PrMerged(pr),
                _ => PrStage::PrOpen(pr),
            },
            (PrStage::Merging, StepOutcome::Merge(result)) => {
                if result.success {
                    PrStage::Merged
                } else {
                    PrStage::Conflict {
                        message: result
                            .conflict_message
                            .unwrap_or_else(|| "Merge conflict".to_string()),
                        main_worktree_path: result.main_worktree_path,
                    }
                }
            }
            _ => return,
        };
        self.stage = next;
    }

    pub fn on_failure(&mut self, error: impl Into<String>) {
        if self.stage.is_busy() {
            let during = std::mem::replace(&mut self.stage, PrStage::Confirming);
            self.stage = PrStage::Failed {
                during: Box::new(during),
                error: error.into(),
            };
        }
    }

    /// Apply a polled PR status. Only an open PR can move to merged.
    pub fn on_pr_status(&mut self, pr: PrInfo) {
        if let PrStage::PrOpen(_) = self.stage {
            self.stage = if pr.state == PrState::Merged {
                PrStage::PrMerged(pr)
            } else {
                PrStage::PrOpen(pr)
            };
        }
    }

    /// Failed → the stage that failed, so its step runs again.
    pub fn retry(&mut self) -> bool {
        if let PrStage::Failed { during, .. } = &self.stage {
            self.stage = (**during).clone();
            true
        } else {
            false
        }
    }

    pub fn pr(&self) -> Option<&PrInfo> {
        match &self.stage {
            PrStage::PrOpen(pr) | PrStage::PrMerged(pr) => Some(pr),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, PrStage::Merged | PrStage::PrMerged(_))
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            PrField::Title => PrField::Body,
            PrField::Body => PrField::Title,
        };
    }

    pub fn input_char(&mut self, ch: char) {
        if self.stage != PrStage::EditingPr {
            return;
        }
        match self.field {
            PrField::Title => self.title.push(ch),
            PrField::Body => self.body.push(ch),
        }
    }

    pub fn backspace(&mut self) {
        if self.stage != PrStage::EditingPr {
            return;
        }
        match self.field {
            PrField::Title => self.title.pop(),
            PrField::Body => self.body.pop(),
        };
    }

    /// Ordered stage names for the progress header of this workflow.
    pub fn stage_track(&self) -> &'static [&'static str] {
        match self.workflow {
            MergeWorkflow::Direct => &["confirm", "rebase", "merge", "done"],
            MergeWorkflow::PullRequest => &["confirm", "rebase", "push", "edit", "create", "open", "merged"],
        }
    }

    /// Index into `stage_track` for the current stage.
    pub fn track_position(&self) -> usize {
        let stage = match &self.stage {
            PrStage::Failed { during, .. } => during.as_ref(),
            other => other,
        };
        match (self.workflow, stage) {
            (_, PrStage::Confirming) => 0,
            (_, PrStage::Rebasing) => 1,
            (MergeWorkflow::Direct, PrStage::Merging | PrStage::Conflict { .. }) => 2,
            (MergeWorkflow::Direct, _) => 3,
            (MergeWorkflow::PullRequest, PrStage::Pushing) => 2,
            (MergeWorkflow::PullRequest, PrStage::EditingPr) => 3,
            (MergeWorkflow::PullRequest, PrStage::CreatingPr) => 4,
            (MergeWorkflow::PullRequest, PrStage::PrOpen(_)) => 5,
            (MergeWorkflow::PullRequest, _) => 6,
        }
    }
}
