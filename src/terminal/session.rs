// ABOUTME: The terminal pane's live connection: which session is attached, its screen and attach progress
// Routes terminal push events from the backend to the stream of the attached session

use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{AttachState, RetryPolicy, TerminalStream};
use crate::backend::BackendEvent;
use crate::models::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Not addressed to this terminal.
    Ignored,
    Output,
    Exited,
}

#[derive(Debug)]
pub struct TerminalSession {
    pub session_id: String,
    pub tmux_session: String,
    pub title: String,
    pub stream: TerminalStream,
    pub attach: AttachState,
    pub policy: RetryPolicy,
    /// When the next automatic attach attempt is due.
    pub retry_at: Option<Instant>,
    pub exited: bool,
}

impl TerminalSession {
    pub fn new(session: &Session, cols: u16, rows: u16, scrollback_lines: usize, policy: RetryPolicy) -> Self {
        Self {
            session_id: session.id.clone(),
            tmux_session: session.tmux_session.clone(),
            title: session.title.clone(),
            stream: TerminalStream::new(cols, rows, scrollback_lines),
            attach: AttachState::begin(),
            policy,
            retry_at: None,
            exited: false,
        }
    }

    pub fn route_event(&mut self, event: &BackendEvent) -> Routed {
        match event {
            BackendEvent::TerminalOutput { session_id, data } if *session_id == self.session_id => {
                self.stream.feed_base64(data);
                Routed::Output
            }
            BackendEvent::TerminalExited { session_id } if *session_id == self.session_id => {
                info!("Terminal for session {} exited", session_id);
                self.exited = true;
                self.attach = AttachState::Detached;
                self.retry_at = None;
                Routed::Exited
            }
            _ => Routed::Ignored,
        }
    }

    pub fn attach_succeeded(&mut self) {
        self.attach.on_success();
        self.retry_at = None;
        self.exited = false;
    }

    /// Records a failed attach. Schedules the next automatic attempt relative
    /// to `now` and returns its delay, if any remain.
    pub fn attach_failed(&mut self, error: &str, now: Instant) -> Option<Duration> {
        let delay = self.attach.on_failure(error, &self.policy);
        self.retry_at = delay.map(|d| now + d);
        debug!(
            "Attach to {} failed ({}), next: {:?}",
            self.tmux_session, error, delay
        );
        delay
    }

    /// True once when a scheduled retry has come due; clears the schedule.
    pub fn take_due_retry(&mut self, now: Instant) -> bool {
        match self.retry_at {
            Some(at) if now >= at => {
                self.retry_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn manual_retry(&mut self) -> bool {
        let restarted = self.attach.retry();
        if restarted {
            self.retry_at = None;
            self.exited = false;
        }
        restarted
    }

    /// Attempt number currently in flight, if attaching.
    pub fn attempt(&self) -> Option<u32> {
        match self.attach {
            AttachState::Attaching { attempt } => Some(attempt),
            _ => None,
        }
    }
}
