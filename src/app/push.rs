// ABOUTME: Applies events pushed by the backend (creation results, removals, terminal output) to app state

use tracing::{info, warn};

use super::state::{AppState, AsyncAction, Focus};
use crate::backend::BackendEvent;
use crate::terminal::Routed;

impl AppState {
    pub fn apply_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::SessionCreated {
                placeholder_id,
                session_id,
            } => {
                info!("Session {} created for placeholder {}", session_id, placeholder_id);
                self.remove_placeholder(&placeholder_id);
                self.focused_session = Some(session_id);
                self.queue(AsyncAction::LoadSessions);
                self.queue(AsyncAction::LoadAttention);
            }
            BackendEvent::SessionCreateFailed { placeholder_id, error } => {
                warn!("Session creation {} failed: {}", placeholder_id, error);
                let title = self
                    .remove_placeholder(&placeholder_id)
                    .map(|p| p.title)
                    .unwrap_or_else(|| "session".to_string());
                self.notifications.error_once(
                    format!("create-failed:{}", placeholder_id),
                    format!("Failed to create {}: {}", title, error),
                );
            }
            BackendEvent::SessionRemoved { session_id } => {
                info!("Session {} removed", session_id);
                self.removing.remove(&session_id);
                self.summaries.remove(&session_id);
                if self.terminal.as_ref().map(|t| t.session_id == session_id).unwrap_or(false) {
                    self.terminal = None;
                    self.focus = Focus::Sessions;
                }
                let remaining: Vec<_> = self.sessions.iter().filter(|s| s.id != session_id).cloned().collect();
                self.apply_sessions(remaining);
                self.queue(AsyncAction::LoadAttention);
            }
            BackendEvent::SessionRemoveFailed { session_id, error } => {
                warn!("Removing session {} failed: {}", session_id, error);
                self.removing.remove(&session_id);
                let title = self
                    .session(&session_id)
                    .map(|s| s.title.clone())
                    .unwrap_or(session_id);
                self.notifications.error(format!("Failed to remove {}: {}", title, error));
            }
            BackendEvent::TerminalOutput { .. } | BackendEvent::TerminalExited { .. } => {
                let Some(terminal) = self.terminal.as_mut() else {
                    return;
                };
                if terminal.route_event(&event) == Routed::Exited {
                    let title = terminal.title.clone();
                    self.notifications.info(format!("Terminal for {} exited", title));
                    self.queue(AsyncAction::CheckLiveness);
                }
            }
            BackendEvent::BackendDisconnected { reason } => {
                warn!("Backend disconnected: {}", reason);
                self.backend_connected = false;
                self.notifications
                    .error_once("backend-disconnected", format!("Backend disconnected: {}", reason));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CreateSessionRequest;
    use crate::models::Session;

    fn request(placeholder: &str) -> CreateSessionRequest {
        CreateSessionRequest {
            placeholder_id: placeholder.to_string(),
            project_path: "/src/app".to_string(),
            group_path: "work".to_string(),
            title: "fix auth".to_string(),
            tool: Some("claude".to_string()),
            worktree_branch: None,
            new_branch: false,
            start: true,
            prompt: None,
        }
    }

    #[test]
    fn test_created_replaces_placeholder_and_focuses() {
        let mut state = AppState::default();
        state.add_placeholder(&request("p1"));
        state.apply_backend_event(BackendEvent::SessionCreated {
            placeholder_id: "p1".to_string(),
            session_id: "s9".to_string(),
        });
        assert!(state.pending_creations.is_empty());
        assert_eq!(state.focused_session.as_deref(), Some("s9"));
        assert_eq!(state.pending_async_actions.front(), Some(&AsyncAction::LoadSessions));
    }

    #[test]
    fn test_create_failure_notifies_once() {
        let mut state = AppState::default();
        state.add_placeholder(&request("p1"));
        let failed = BackendEvent::SessionCreateFailed {
            placeholder_id: "p1".to_string(),
            error: "no such path".to_string(),
        };
        state.apply_backend_event(failed.clone());
        state.apply_backend_event(failed);
        assert!(state.pending_creations.is_empty());
        assert_eq!(state.notifications.visible().len(), 1);
        assert!(state.notifications.visible()[0].message.contains("fix auth"));
    }

    #[test]
    fn test_removed_drops_session() {
        let mut state = AppState::default();
        state.apply_sessions(vec![
            Session::new("a", "one", "/src", "work"),
            Session::new("b", "two", "/src", "work"),
        ]);
        state.removing.insert("a".to_string());
        state.apply_backend_event(BackendEvent::SessionRemoved {
            session_id: "a".to_string(),
        });
        assert!(state.session("a").is_none());
        assert!(state.removing.is_empty());
        assert_eq!(state.focused_session.as_deref(), Some("b"));
    }

    #[test]
    fn test_disconnect_marks_backend_down() {
        let mut state = AppState::default();
        state.apply_backend_event(BackendEvent::BackendDisconnected {
            reason: "stdout closed".to_string(),
        });
        assert!(!state.backend_connected);
        assert_eq!(state.notifications.visible().len(), 1);
    }
}
