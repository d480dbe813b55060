// ABOUTME: Integration tests running queued async actions and push events through App against a mocked backend

mod common;

use mockall::predicate::{always, eq};
use std::time::{Duration, Instant};

use orca::app::state::LoadTarget;
use orca::app::{AsyncAction, Focus, Modal, PrStage};
use orca::backend::{BackendError, BackendEvent};
use orca::models::{AttentionCounts, MergeResult, MergeWorkflow, PrInfo, PrState, WorktreeStatus};
use orca::terminal::AttachState;

use common::{
    app_with, expect_startup_checks, group, issue, plain_session, worktree, worktree_session, MockOrcaBackend,
};

const SAMPLE_DIFF: &str = "diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,2 +1,3 @@
 fn main() {
+    println!(\"hi\");
 }
";

fn open_pr(number: u64) -> PrInfo {
    PrInfo {
        number,
        url: format!("https://github.com/acme/app/pull/{}", number),
        state: PrState::Open,
    }
}

#[tokio::test]
async fn test_init_loads_groups_and_sessions() {
    let mut backend = MockOrcaBackend::new();
    expect_startup_checks(&mut backend, "Agent Deck v0.11.2");
    backend
        .expect_get_groups()
        .times(1)
        .returning(|| Ok(vec![group("work", "Work", "/src/app")]));
    backend
        .expect_get_sessions()
        .with(eq(None::<String>))
        .times(1)
        .returning(|_| Ok(vec![plain_session("a", "work"), plain_session("b", "work")]));

    let (mut app, _events) = app_with(backend);
    app.init().await;

    assert!(app.state.sessions_loaded);
    assert_eq!(app.state.groups.len(), 1);
    assert_eq!(app.state.sessions.len(), 2);
    assert_eq!(app.state.focused_session.as_deref(), Some("a"));
    assert!(app.state.pending_async_actions.is_empty());
    assert!(app.state.backend_version.as_ref().unwrap().is_supported());
    assert!(app.state.notifications.visible().is_empty());
}

#[tokio::test]
async fn test_load_failure_is_retryable() {
    let mut backend = MockOrcaBackend::new();
    expect_startup_checks(&mut backend, "0.12.0");
    backend.expect_get_groups().returning(|| Ok(Vec::new()));
    let mut calls = 0;
    backend.expect_get_sessions().times(2).returning(move |_| {
        calls += 1;
        if calls == 1 {
            Err(BackendError::Timeout {
                command: "get_sessions".to_string(),
                secs: 30,
            })
        } else {
            Ok(vec![plain_session("a", "work")])
        }
    });

    let (mut app, _events) = app_with(backend);
    app.init().await;

    let error = app.state.load_error.clone().expect("load error recorded");
    assert_eq!(error.target, LoadTarget::Sessions);
    assert!(error.message.contains("timed out"));
    assert!(app.state.backend_connected);

    assert!(app.state.retry_load());
    app.process_async_actions().await;
    assert!(app.state.load_error.is_none());
    assert_eq!(app.state.sessions.len(), 1);
}

#[tokio::test]
async fn test_closed_backend_stops_polling() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_get_sessions()
        .times(1)
        .returning(|_| Err(BackendError::Closed));

    let (mut app, _events) = app_with(backend);
    app.state.queue(AsyncAction::LoadSessions);
    app.process_async_actions().await;
    assert!(!app.state.backend_connected);

    // No further expectations: any poll would panic the mock.
    app.tick().await.unwrap();
    assert!(app.state.pending_async_actions.is_empty());
}

#[tokio::test]
async fn test_disconnect_event_is_reported_once() {
    let (mut app, events) = app_with(MockOrcaBackend::new());
    app.state.backend_connected = true;

    for _ in 0..2 {
        events
            .send(BackendEvent::BackendDisconnected {
                reason: "backend exited".to_string(),
            })
            .unwrap();
    }
    app.tick().await.unwrap();

    assert!(!app.state.backend_connected);
    assert_eq!(app.state.notifications.visible().len(), 1);
}

#[tokio::test]
async fn test_create_session_then_created_event() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_create_session()
        .withf(|request| request.title == "fix login" && request.placeholder_id == "pending-1")
        .times(1)
        .returning(|_| Ok(()));

    let (mut app, events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    let request = orca::backend::CreateSessionRequest {
        placeholder_id: "pending-1".to_string(),
        project_path: "/src/app".to_string(),
        group_path: "work".to_string(),
        title: "fix login".to_string(),
        tool: Some("claude".to_string()),
        worktree_branch: None,
        new_branch: false,
        start: true,
        prompt: None,
    };
    app.state.add_placeholder(&request);
    app.state.queue(AsyncAction::CreateSession(request));
    app.process_async_actions().await;

    // Placeholder stays until the backend reports the outcome
    assert_eq!(app.state.pending_creations.len(), 1);

    events
        .send(BackendEvent::SessionCreated {
            placeholder_id: "pending-1".to_string(),
            session_id: "s-new".to_string(),
        })
        .unwrap();
    app.drain_backend_events();

    assert!(app.state.pending_creations.is_empty());
    assert_eq!(app.state.focused_session.as_deref(), Some("s-new"));
    assert!(app.state.pending_async_actions.contains(&AsyncAction::LoadSessions));
    assert!(app.state.pending_async_actions.contains(&AsyncAction::LoadAttention));
}

#[tokio::test]
async fn test_create_session_rejected_removes_placeholder() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_create_session()
        .returning(|_| Err(BackendError::Remote("project path does not exist".to_string())));

    let (mut app, _events) = app_with(backend);
    let request = orca::backend::CreateSessionRequest {
        placeholder_id: "pending-2".to_string(),
        project_path: "/missing".to_string(),
        group_path: "work".to_string(),
        title: "missing".to_string(),
        tool: None,
        worktree_branch: None,
        new_branch: false,
        start: true,
        prompt: None,
    };
    app.state.add_placeholder(&request);
    app.state.queue(AsyncAction::CreateSession(request));
    app.process_async_actions().await;

    assert!(app.state.pending_creations.is_empty());
    let messages: Vec<&str> = app
        .state
        .notifications
        .visible()
        .iter()
        .map(|n| n.message.as_str())
        .collect();
    assert_eq!(messages, vec!["Failed to create missing: project path does not exist"]);
}

#[tokio::test]
async fn test_rename_failure_shows_inline_error() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_rename_session()
        .with(eq("a"), eq("taken"))
        .returning(|_, _| Err(BackendError::Remote("title already used".to_string())));

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    app.state.open_rename();
    app.state.queue(AsyncAction::RenameSession {
        session_id: "a".to_string(),
        title: "taken".to_string(),
    });
    app.process_async_actions().await;

    match &app.state.modal {
        Some(Modal::Rename(form)) => assert_eq!(form.error.as_deref(), Some("title already used")),
        _ => panic!("rename dialog should stay open"),
    }
    assert_eq!(app.state.sessions[0].title, "session a");
}

#[tokio::test]
async fn test_rename_success_closes_dialog() {
    let mut backend = MockOrcaBackend::new();
    backend.expect_rename_session().returning(|_, _| Ok(()));

    let (mut app, _events) = app_with(backend);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    app.state.open_rename();
    app.state.queue(AsyncAction::RenameSession {
        session_id: "a".to_string(),
        title: "auth work".to_string(),
    });
    app.process_async_actions().await;

    assert!(app.state.modal.is_none());
    assert_eq!(app.state.sessions[0].title, "auth work");
    assert!(app.state.pending_async_actions.contains(&AsyncAction::LoadSessions));
}

#[tokio::test]
async fn test_worktree_status_fills_remove_dialog() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_check_worktree_status()
        .with(eq("/src/app"), eq("/src/app-worktrees/feature-a"), eq("feature-a"))
        .returning(|_, _, _| {
            Ok(WorktreeStatus {
                has_dirty_files: true,
                has_unmerged_branch: false,
                has_unpushed_commits: true,
                warnings: Vec::new(),
            })
        });

    let (mut app, _events) = app_with(backend);
    app.state.apply_sessions(vec![worktree_session("a", "work", "feature-a")]);
    app.state.request_remove();
    app.process_async_actions().await;

    match &app.state.modal {
        Some(Modal::ConfirmRemove(dialog)) => {
            assert!(!dialog.checking);
            assert!(dialog.is_risky());
            assert_eq!(dialog.warnings().len(), 2);
        }
        _ => panic!("remove dialog should be open"),
    }
}

#[tokio::test]
async fn test_remove_then_removed_event() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_remove_session()
        .with(eq("b"), eq(false))
        .times(1)
        .returning(|_, _| Ok(()));

    let (mut app, events) = app_with(backend);
    app.state.apply_sessions(vec![plain_session("a", "work"), plain_session("b", "work")]);
    app.state.begin_remove("b".to_string(), false);
    app.process_async_actions().await;
    assert!(app.state.removing.contains("b"));

    events
        .send(BackendEvent::SessionRemoved {
            session_id: "b".to_string(),
        })
        .unwrap();
    app.drain_backend_events();

    assert!(app.state.removing.is_empty());
    assert!(app.state.session("b").is_none());
}

#[tokio::test]
async fn test_attach_retries_with_backoff_then_succeeds() {
    let mut backend = MockOrcaBackend::new();
    let mut attempts = 0;
    backend
        .expect_attach_terminal()
        .with(eq("a"), eq("orca_a"), always(), always())
        .times(2)
        .returning(move |_, _, _, _| {
            attempts += 1;
            if attempts == 1 {
                Err(BackendError::Remote("no server running".to_string()))
            } else {
                Ok(())
            }
        });

    let (mut app, events) = app_with(backend);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    app.state.focus = Focus::Terminal;
    app.state.queue(AsyncAction::AttachTerminal {
        session_id: "a".to_string(),
    });
    app.process_async_actions().await;

    let started = Instant::now();
    {
        let terminal = app.state.terminal.as_mut().expect("terminal created");
        assert_eq!(terminal.attempt(), Some(2));
        let retry_at = terminal.retry_at.expect("retry scheduled");
        assert!(retry_at <= started + Duration::from_millis(500));
        assert!(terminal.take_due_retry(retry_at));
    }

    app.state.queue(AsyncAction::AttachTerminal {
        session_id: "a".to_string(),
    });
    app.process_async_actions().await;
    let terminal = app.state.terminal.as_ref().unwrap();
    assert_eq!(terminal.attach, AttachState::Attached);

    // "hello\r\nworld"
    events
        .send(BackendEvent::TerminalOutput {
            session_id: "a".to_string(),
            data: "aGVsbG8NCndvcmxk".to_string(),
        })
        .unwrap();
    app.drain_backend_events();
    let contents = app.state.terminal.as_ref().unwrap().stream.contents();
    assert!(contents.starts_with("hello\nworld"));
}

#[tokio::test]
async fn test_attach_gives_up_after_max_attempts() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_attach_terminal()
        .times(3)
        .returning(|_, _, _, _| Err(BackendError::Remote("can't find session".to_string())));

    let (mut app, _events) = app_with(backend);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    for _ in 0..3 {
        app.state.queue(AsyncAction::AttachTerminal {
            session_id: "a".to_string(),
        });
        app.process_async_actions().await;
    }

    let terminal = app.state.terminal.as_ref().unwrap();
    assert!(matches!(terminal.attach, AttachState::Failed { attempts: 3, .. }));
    assert!(terminal.retry_at.is_none());
}

#[tokio::test]
async fn test_diff_is_parsed_into_files() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_get_branch_diff()
        .with(eq("/src/app-worktrees/feature-a"), eq("feature-a"))
        .returning(|_, _| Ok(SAMPLE_DIFF.to_string()));

    let (mut app, _events) = app_with(backend);
    app.state.apply_sessions(vec![worktree_session("a", "work", "feature-a")]);
    app.state.show_diff();
    app.process_async_actions().await;

    let diff = app.state.diff.as_ref().unwrap();
    assert!(!diff.loading);
    assert_eq!(diff.files.len(), 1);
    assert_eq!(diff.stats.additions, 1);
    assert_eq!(diff.stats.deletions, 0);
}

#[tokio::test]
async fn test_direct_merge_stops_at_conflict() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_get_default_branch()
        .times(1)
        .returning(|_| Ok("main".to_string()));
    backend
        .expect_rebase_worktree()
        .with(eq("/src/app-worktrees/feature-a"), eq("main"))
        .times(1)
        .returning(|_, _| Ok(()));
    backend
        .expect_try_merge_branch()
        .with(eq("/src/app"), eq("feature-a"), eq("main"))
        .times(1)
        .returning(|_, _, _| {
            Ok(MergeResult {
                success: false,
                main_worktree_path: "/src/app".to_string(),
                conflict_message: Some("CONFLICT in src/lib.rs".to_string()),
            })
        });
    backend
        .expect_abort_merge()
        .with(eq("/src/app"))
        .times(1)
        .returning(|_| Ok(()));

    let (mut app, _events) = app_with(backend);
    let mut work = group("work", "Work", "/src/app");
    work.settings.merge_workflow = MergeWorkflow::Direct;
    app.state.apply_groups(vec![work]);
    app.state.apply_sessions(vec![worktree_session("a", "work", "feature-a")]);
    app.state.open_pr_flow();
    assert!(app.state.pr_flow_mut().unwrap().confirm());
    app.state.queue(AsyncAction::RunPrStep);

    // One step per pass
    app.process_async_actions().await;
    assert_eq!(app.state.pr_flow_mut().unwrap().stage, PrStage::Merging);
    app.process_async_actions().await;

    let flow = app.state.pr_flow_mut().unwrap();
    match &flow.stage {
        PrStage::Conflict {
            message,
            main_worktree_path,
        } => {
            assert_eq!(message, "CONFLICT in src/lib.rs");
            assert_eq!(main_worktree_path, "/src/app");
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    app.state.queue(AsyncAction::AbortMerge {
        worktree_path: "/src/app".to_string(),
    });
    app.process_async_actions().await;
    assert!(app.state.modal.is_none());
}

#[tokio::test]
async fn test_pull_request_flow_opens_pr() {
    let mut backend = MockOrcaBackend::new();
    backend.expect_get_default_branch().returning(|_| Ok("main".to_string()));
    backend.expect_rebase_worktree().times(1).returning(|_, _| Ok(()));
    backend
        .expect_push_branch()
        .with(eq("/src/app-worktrees/feature-a"), eq("feature-a"))
        .times(1)
        .returning(|_, _| Ok(()));
    backend
        .expect_create_pr()
        .withf(|request| request.base_branch == "main" && request.title == "Fix login" && request.branch == "feature-a")
        .times(1)
        .returning(|_| Ok(open_pr(42)));

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    app.state.apply_sessions(vec![worktree_session("a", "work", "feature-a")]);
    app.state.open_pr_flow();
    app.state.pr_flow_mut().unwrap().confirm();
    app.state.queue(AsyncAction::RunPrStep);

    app.process_async_actions().await;
    assert_eq!(app.state.pr_flow_mut().unwrap().stage, PrStage::Pushing);
    app.process_async_actions().await;
    assert_eq!(app.state.pr_flow_mut().unwrap().stage, PrStage::EditingPr);
    assert!(app.state.pending_async_actions.is_empty());

    {
        let flow = app.state.pr_flow_mut().unwrap();
        flow.title = "Fix login".to_string();
        assert!(flow.submit_pr());
    }
    app.state.queue(AsyncAction::RunPrStep);
    app.process_async_actions().await;

    assert_eq!(app.state.pr_flow_mut().unwrap().stage, PrStage::PrOpen(open_pr(42)));
    assert_eq!(app.state.sessions[0].pr, Some(open_pr(42)));
    assert!(app.state.pending_async_actions.contains(&AsyncAction::LoadSessions));
}

#[tokio::test]
async fn test_failed_step_can_be_retried() {
    let mut backend = MockOrcaBackend::new();
    backend.expect_get_default_branch().returning(|_| Ok("main".to_string()));
    let mut calls = 0;
    backend.expect_rebase_worktree().times(2).returning(move |_, _| {
        calls += 1;
        if calls == 1 {
            Err(BackendError::Remote("rebase conflict".to_string()))
        } else {
            Ok(())
        }
    });

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    app.state.apply_sessions(vec![worktree_session("a", "work", "feature-a")]);
    app.state.open_pr_flow();
    app.state.pr_flow_mut().unwrap().confirm();
    app.state.queue(AsyncAction::RunPrStep);
    app.process_async_actions().await;

    match &app.state.pr_flow_mut().unwrap().stage {
        PrStage::Failed { during, error } => {
            assert_eq!(**during, PrStage::Rebasing);
            assert_eq!(error, "rebase conflict");
        }
        other => panic!("expected failure, got {:?}", other),
    }

    assert!(app.state.pr_flow_mut().unwrap().retry());
    app.state.queue(AsyncAction::RunPrStep);
    app.process_async_actions().await;
    assert_eq!(app.state.pr_flow_mut().unwrap().stage, PrStage::Pushing);
}

#[tokio::test]
async fn test_pr_status_poll_reports_merge() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_check_pr_status()
        .with(eq("/src/app"), eq("feature-a"))
        .times(1)
        .returning(|_, _| {
            Ok(PrInfo {
                state: PrState::Merged,
                ..open_pr(42)
            })
        });

    let (mut app, _events) = app_with(backend);
    let mut with_pr = worktree_session("a", "work", "feature-a");
    with_pr.pr = Some(open_pr(42));
    // Sessions without an open PR are not polled
    let mut merged = worktree_session("b", "work", "feature-b");
    merged.pr = Some(PrInfo {
        state: PrState::Merged,
        ..open_pr(7)
    });
    app.state.apply_sessions(vec![with_pr, merged, plain_session("c", "work")]);

    app.state.queue(AsyncAction::RefreshPrStatuses);
    app.process_async_actions().await;

    assert_eq!(app.state.sessions[0].pr.as_ref().unwrap().state, PrState::Merged);
    let messages: Vec<&str> = app
        .state
        .notifications
        .visible()
        .iter()
        .map(|n| n.message.as_str())
        .collect();
    assert_eq!(messages, vec!["PR #42 for session a was merged"]);
}

#[tokio::test]
async fn test_issues_disabled_group_skips_backend() {
    let (mut app, _events) = app_with(MockOrcaBackend::new());
    let mut work = group("work", "Work", "/src/app");
    work.settings.github_issues_enabled = false;
    app.state.apply_groups(vec![work]);
    app.state.toggle_issues();
    app.process_async_actions().await;

    assert!(app.state.issues.error.as_deref().unwrap().contains("not enabled"));
    assert!(app.state.issues.issues.is_empty());
}

#[tokio::test]
async fn test_issues_load_and_close() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_list_issues()
        .with(eq("/src/app"))
        .times(1)
        .returning(|_| Ok(vec![issue(1, "First"), issue(2, "Second")]));
    backend
        .expect_close_issue()
        .with(eq("/src/app"), eq(1u64))
        .times(1)
        .returning(|_, _| Ok(()));

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    app.state.toggle_issues();
    app.process_async_actions().await;
    assert_eq!(app.state.issues.issues.len(), 2);

    app.state.queue(AsyncAction::CloseIssue {
        repo_path: "/src/app".to_string(),
        number: 1,
    });
    app.process_async_actions().await;
    assert_eq!(app.state.issues.issues.len(), 1);
    assert_eq!(app.state.issues.issues[0].number, 2);
}

#[tokio::test]
async fn test_attention_loads_counts_and_summaries() {
    let mut backend = MockOrcaBackend::new();
    backend.expect_get_attention_counts().returning(|| {
        Ok(AttentionCounts {
            total: 1,
            groups: [("work".to_string(), 1)].into_iter().collect(),
        })
    });
    backend
        .expect_get_session_summary()
        .with(eq("a"))
        .returning(|_| {
            Ok(orca::models::SessionSummary {
                summary: Some("Waiting on approval".to_string()),
                attention: orca::models::AttentionStatus::NeedsInput,
                last_tool: None,
                last_text: None,
            })
        });

    let (mut app, _events) = app_with(backend);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    app.state.queue(AsyncAction::LoadAttention);
    app.process_async_actions().await;

    assert_eq!(app.state.attention_counts.for_group("work"), 1);
    let session = app.state.sessions[0].clone();
    assert_eq!(
        app.state.attention_for(&session),
        orca::models::AttentionStatus::NeedsInput
    );
}

fn messages(app: &orca::app::App) -> Vec<String> {
    app.state
        .notifications
        .visible()
        .iter()
        .map(|n| n.message.clone())
        .collect()
}

#[tokio::test]
async fn test_move_session_updates_group() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_move_session()
        .with(eq("a"), eq("home"))
        .times(1)
        .returning(|_, _| Ok(()));

    let (mut app, _events) = app_with(backend);
    app.state
        .apply_groups(vec![group("work", "Work", "/src/app"), group("home", "Home", "/src/home")]);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    app.state.open_move();
    assert!(matches!(app.state.modal, Some(Modal::Move(_))));

    app.state.queue(AsyncAction::MoveSession {
        session_id: "a".to_string(),
        group_path: "home".to_string(),
    });
    app.process_async_actions().await;

    assert!(app.state.modal.is_none());
    assert_eq!(app.state.sessions[0].group_path, "home");
    assert_eq!(messages(&app), vec!["Moved to Home"]);
    assert!(app.state.pending_async_actions.contains(&AsyncAction::LoadSessions));
}

#[tokio::test]
async fn test_create_group_closes_modal_and_reloads() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_create_group()
        .with(eq("Work"), eq("/src/app"))
        .times(1)
        .returning(|_, _| Ok(()));

    let (mut app, _events) = app_with(backend);
    app.state.open_new_group();
    app.state.queue(AsyncAction::CreateGroup {
        name: "Work".to_string(),
        default_path: "/src/app".to_string(),
    });
    app.process_async_actions().await;

    assert!(app.state.modal.is_none());
    assert_eq!(messages(&app), vec!["Created group Work"]);
    assert_eq!(app.state.pending_async_actions.pop_front(), Some(AsyncAction::LoadGroups));
}

#[tokio::test]
async fn test_create_group_failure_stays_in_form() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_create_group()
        .returning(|_, _| Err(BackendError::Remote("group already exists".to_string())));

    let (mut app, _events) = app_with(backend);
    app.state.open_new_group();
    app.state.queue(AsyncAction::CreateGroup {
        name: "Work".to_string(),
        default_path: "/src/app".to_string(),
    });
    app.process_async_actions().await;

    match &app.state.modal {
        Some(Modal::NewGroup(form)) => assert_eq!(form.error.as_deref(), Some("group already exists")),
        _ => panic!("group form should stay open"),
    }
    assert!(app.state.pending_async_actions.is_empty());
}

#[tokio::test]
async fn test_save_group_settings_applies_locally() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_set_group_settings()
        .with(eq("work"), always())
        .times(1)
        .returning(|_, _| Ok(()));

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    app.state.open_group_settings();
    let mut settings = app.state.groups[0].settings.clone();
    settings.github_issues_enabled = false;
    app.state.queue(AsyncAction::SaveGroupSettings {
        group_path: "work".to_string(),
        settings,
    });
    app.process_async_actions().await;

    assert!(app.state.modal.is_none());
    assert!(!app.state.groups[0].issues_enabled());
    assert_eq!(messages(&app), vec!["Group settings saved"]);
}

#[tokio::test]
async fn test_create_issue_lists_it_first() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_create_issue()
        .with(eq("/src/app"), eq("Login broken"), eq("Steps to reproduce"))
        .times(1)
        .returning(|_, _, _| Ok(issue(12, "Login broken")));

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    app.state.issues.issues = vec![issue(3, "Older")];
    app.state.issues.selected = 0;
    app.state.open_new_issue();
    app.state.queue(AsyncAction::CreateIssue {
        repo_path: "/src/app".to_string(),
        title: "Login broken".to_string(),
        body: "Steps to reproduce".to_string(),
    });
    app.process_async_actions().await;

    assert!(app.state.modal.is_none());
    let numbers: Vec<u64> = app.state.issues.issues.iter().map(|i| i.number).collect();
    assert_eq!(numbers, vec![12, 3]);
    assert_eq!(messages(&app), vec!["Created issue #12"]);
}

#[tokio::test]
async fn test_edit_issue_keeps_labels() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_update_issue()
        .with(
            eq("/src/app"),
            eq(3u64),
            eq("Login fails on Safari"),
            eq(""),
            eq(vec!["bug".to_string()]),
        )
        .times(1)
        .returning(|_, _, _, _, _| Ok(issue(3, "Login fails on Safari")));

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    let mut existing = issue(3, "Login fails");
    existing.labels = vec![orca::models::GitHubLabel {
        name: "bug".to_string(),
        color: "d73a4a".to_string(),
    }];
    app.state.issues.issues = vec![existing];
    app.state.open_edit_issue();

    let action = match app.state.modal.as_mut() {
        Some(Modal::Issue(form)) => {
            assert!(form.is_edit());
            form.title = "Login fails on Safari".to_string();
            form.submit_action().unwrap()
        }
        _ => panic!("issue form should be open"),
    };
    app.state.queue(action);
    app.process_async_actions().await;

    assert!(app.state.modal.is_none());
    assert_eq!(app.state.issues.issues[0].title, "Login fails on Safari");
    assert_eq!(messages(&app), vec!["Updated issue #3"]);
}

#[tokio::test]
async fn test_assign_issue_refreshes_it() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_assign_issue()
        .with(eq("/src/app"), eq(3u64))
        .times(1)
        .returning(|_, _| Ok(()));
    backend
        .expect_get_issue()
        .with(eq("/src/app"), eq(3u64))
        .times(1)
        .returning(|_, number| {
            let mut assigned = issue(number, "Login fails");
            assigned.assignee = Some("octocat".to_string());
            Ok(assigned)
        });

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    app.state.issues.issues = vec![issue(3, "Login fails")];
    app.state.assign_selected_issue();
    app.process_async_actions().await;

    assert_eq!(app.state.issues.issues[0].assignee.as_deref(), Some("octocat"));
    assert_eq!(messages(&app), vec!["Assigned #3 to you"]);
}

#[tokio::test]
async fn test_restart_session_reports_and_reloads() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_restart_session()
        .with(eq("a"))
        .times(1)
        .returning(|_| Ok(()));

    let (mut app, _events) = app_with(backend);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    app.state.queue(AsyncAction::RestartSession {
        session_id: "a".to_string(),
    });
    app.process_async_actions().await;

    assert_eq!(messages(&app), vec!["Restarted session a"]);
    assert!(app.state.pending_async_actions.contains(&AsyncAction::LoadSessions));
}

#[tokio::test]
async fn test_abort_merge_failure_keeps_flow_open() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_abort_merge()
        .with(eq("/src/app"))
        .times(1)
        .returning(|_| Err(BackendError::Remote("no merge in progress".to_string())));

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    app.state.apply_sessions(vec![worktree_session("a", "work", "feature-a")]);
    app.state.open_pr_flow();
    app.state.queue(AsyncAction::AbortMerge {
        worktree_path: "/src/app".to_string(),
    });
    app.process_async_actions().await;

    assert!(matches!(app.state.modal, Some(Modal::PrFlow(_))));
    assert_eq!(messages(&app), vec!["Failed to abort merge: no merge in progress"]);
}

#[tokio::test]
async fn test_resize_forwards_only_when_attached_and_changed() {
    let mut backend = MockOrcaBackend::new();
    backend.expect_attach_terminal().times(1).returning(|_, _, _, _| Ok(()));
    backend
        .expect_resize_terminal()
        .with(eq("a"), always(), always())
        .times(1)
        .returning(|_, _, _| Ok(()));

    let (mut app, _events) = app_with(backend);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    // Nothing attached yet
    app.resize(200, 60).await;

    app.state.queue(AsyncAction::AttachTerminal {
        session_id: "a".to_string(),
    });
    app.process_async_actions().await;
    assert_eq!(app.state.terminal.as_ref().unwrap().attach, AttachState::Attached);

    // Same size: nothing to forward
    app.resize(200, 60).await;
    app.resize(160, 50).await;
}

#[tokio::test]
async fn test_resize_skips_unattached_terminal() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_attach_terminal()
        .times(1)
        .returning(|_, _, _, _| Err(BackendError::Remote("no server running".to_string())));

    let (mut app, _events) = app_with(backend);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    app.state.queue(AsyncAction::AttachTerminal {
        session_id: "a".to_string(),
    });
    app.process_async_actions().await;
    assert!(!app.state.terminal.as_ref().unwrap().attach.is_attached());

    // No resize_terminal expectation: a call would panic the mock.
    app.resize(200, 60).await;
}

#[tokio::test]
async fn test_actions_after_disconnect_skip_backend() {
    // No expectations: any backend call would panic the mock.
    let (mut app, _events) = app_with(MockOrcaBackend::new());
    app.state.backend_connected = false;
    app.state.apply_sessions(vec![plain_session("a", "work")]);

    let request = orca::backend::CreateSessionRequest {
        placeholder_id: "pending-9".to_string(),
        project_path: "/src/app".to_string(),
        group_path: "work".to_string(),
        title: "offline".to_string(),
        tool: None,
        worktree_branch: None,
        new_branch: false,
        start: true,
        prompt: None,
    };
    app.state.add_placeholder(&request);
    app.state.queue(AsyncAction::CreateSession(request));
    app.state.begin_remove("a".to_string(), false);
    app.state.queue(AsyncAction::LoadSessions);
    app.process_async_actions().await;

    assert!(app.state.pending_creations.is_empty());
    assert!(app.state.removing.is_empty());
    assert_eq!(messages(&app), vec!["Backend disconnected; restart orca to reconnect"]);
}

#[tokio::test]
async fn test_old_agent_deck_is_reported_once() {
    let mut backend = MockOrcaBackend::new();
    backend.expect_check_agent_deck_version().times(2).returning(|| {
        Ok(orca::models::VersionCheck {
            supported: orca::models::SUPPORTED_AGENT_DECK_VERSION.to_string(),
            installed: "Agent Deck v0.9.0".to_string(),
        })
    });

    let (mut app, _events) = app_with(backend);
    app.state.queue(AsyncAction::CheckVersion);
    app.process_async_actions().await;
    app.state.queue(AsyncAction::CheckVersion);
    app.process_async_actions().await;

    let messages = messages(&app);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("0.9.0 is not supported"));
    assert!(!app.state.backend_version.as_ref().unwrap().is_supported());
}

#[tokio::test]
async fn test_missing_required_tool_is_an_error() {
    let mut backend = MockOrcaBackend::new();
    backend.expect_check_prerequisites().returning(|| {
        Ok(vec![
            orca::models::Prerequisite {
                name: "tmux".to_string(),
                found: false,
                required: true,
            },
            orca::models::Prerequisite {
                name: "gh".to_string(),
                found: true,
                required: false,
            },
        ])
    });

    let (mut app, _events) = app_with(backend);
    app.state.queue(AsyncAction::CheckPrerequisites);
    app.process_async_actions().await;

    assert_eq!(messages(&app), vec!["tmux is required but was not found on PATH"]);
    assert_eq!(app.state.prerequisites.len(), 2);
}

#[tokio::test]
async fn test_attention_filter_loads_matching_sessions() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_get_attention_sessions()
        .times(1)
        .returning(|| Ok(vec![plain_session("b", "work")]));

    let (mut app, _events) = app_with(backend);
    app.state
        .apply_sessions(vec![plain_session("a", "work"), plain_session("b", "work")]);
    app.state.toggle_attention_filter();
    app.process_async_actions().await;

    let ids: Vec<&str> = app.state.visible_sessions().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
    assert_eq!(app.state.focused_session.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_paste_goes_to_tmux_pane() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_paste_to_tmux_pane()
        .with(eq("orca_a"), eq("line one\nline two"))
        .times(1)
        .returning(|_, _| Ok(()));

    let (mut app, _events) = app_with(backend);
    app.state.apply_sessions(vec![plain_session("a", "work")]);
    app.state.queue(AsyncAction::PasteTerminal {
        session_id: "a".to_string(),
        text: "line one\nline two".to_string(),
    });
    app.process_async_actions().await;
    assert!(app.state.notifications.is_empty());
}

#[tokio::test]
async fn test_worktree_panel_lists_adds_and_removes() {
    let mut backend = MockOrcaBackend::new();
    backend
        .expect_list_worktrees()
        .with(eq("/src/app"))
        .times(1)
        .returning(|_| {
            Ok(vec![
                worktree("/src/app", "main"),
                worktree("/src/app-worktrees/spike", "spike"),
            ])
        });
    backend
        .expect_add_worktree()
        .with(eq("/src/app"), eq("feature-b"))
        .times(1)
        .returning(|_, _| Ok("/src/app-worktrees/feature-b".to_string()));
    backend
        .expect_remove_worktree()
        .with(eq("/src/app"), eq("/src/app-worktrees/spike"))
        .times(1)
        .returning(|_, _| Ok(()));

    let (mut app, _events) = app_with(backend);
    app.state.apply_groups(vec![group("work", "Work", "/src/app")]);
    app.state.toggle_worktrees();
    app.process_async_actions().await;
    assert_eq!(app.state.worktrees.worktrees.len(), 2);
    assert_eq!(app.state.worktrees.repo_path.as_deref(), Some("/src/app"));

    app.state.open_new_worktree();
    app.state.queue(AsyncAction::AddWorktree {
        repo_path: "/src/app".to_string(),
        branch: "feature-b".to_string(),
    });
    app.process_async_actions().await;
    assert!(app.state.modal.is_none());
    assert_eq!(app.state.pending_async_actions.pop_front(), Some(AsyncAction::LoadWorktrees));

    app.state.worktrees.next();
    app.state.request_remove_worktree();
    app.state.confirm_prompt();
    app.process_async_actions().await;
    let paths: Vec<&str> = app.state.worktrees.worktrees.iter().map(|w| w.path.as_str()).collect();
    assert_eq!(paths, vec!["/src/app"]);
    assert!(app.state.pending_async_actions.contains(&AsyncAction::LoadWorktrees));
}

#[tokio::test]
async fn test_log_panel_reads_run_log_even_offline() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "2024-05-01 INFO orca: starting").unwrap();
    writeln!(file, "2024-05-01 WARN orca: slow backend").unwrap();

    let (app, _events) = app_with(MockOrcaBackend::new());
    let mut app = app.with_log_file(file.path().to_path_buf());
    app.state.backend_connected = false;
    app.state.toggle_log();
    app.process_async_actions().await;

    assert_eq!(app.state.log.lines.len(), 2);
    assert!(app.state.log.lines[1].contains("slow backend"));
    assert!(app.state.log.error.is_none());
    assert!(app.state.notifications.is_empty());
}

#[tokio::test]
async fn test_log_panel_without_file_shows_error() {
    let (mut app, _events) = app_with(MockOrcaBackend::new());
    app.state.toggle_log();
    app.process_async_actions().await;
    assert!(app.state.log.error.is_some());
}
