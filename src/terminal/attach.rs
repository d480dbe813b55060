// ABOUTME: Attach lifecycle for the terminal pane with bounded automatic retry and a manual retry afterwards

use std::time::Duration;

use crate::config::TerminalConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachState {
    Detached,
    /// `attempt` starts at 1.
    Attaching { attempt: u32 },
    Attached,
    /// Automatic retries are exhausted; the user may retry by hand.
    Failed { error: String, attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl From<&TerminalConfig> for RetryPolicy {
    fn from(config: &TerminalConfig) -> Self {
        Self {
            max_attempts: config.max_attach_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `next_attempt` (2, 3, ...): base, 2×base, 4×base.
    pub fn delay_before(&self, next_attempt: u32) -> Duration {
        let exponent = next_attempt.saturating_sub(2).min(16);
        self.base_delay * 2u32.pow(exponent)
    }
}

impl AttachState {
    pub fn begin() -> Self {
        AttachState::Attaching { attempt: 1 }
    }

    /// Transition after a failed attach. Returns the delay to wait before the
    /// next attempt, or `None` once the state is `Failed`.
    pub fn on_failure(&mut self, error: impl Into<String>, policy: &RetryPolicy) -> Option<Duration> {
        let attempt = match self {
            AttachState::Attaching { attempt } => *attempt,
            _ => return None,
        };

        if attempt < policy.max_attempts {
            let next = attempt + 1;
            *self = AttachState::Attaching { attempt: next };
            Some(policy.delay_before(next))
        } else {
            *self = AttachState::Failed {
                error: error.into(),
                attempts: attempt,
            };
            None
        }
    }

    pub fn on_success(&mut self) {
        if matches!(self, AttachState::Attaching { .. }) {
            *self = AttachState::Attached;
        }
    }

    /// Manual retry from the failed state starts a fresh round of attempts.
    pub fn retry(&mut self) -> bool {
        if matches!(self, AttachState::Failed { .. }) {
            *self = AttachState::begin();
            true
        } else {
            false
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, AttachState::Attached)
    }

    pub fn status_line(&self) -> String {
        match self {
            AttachState::Detached => "detached".to_string(),
            AttachState::Attaching { attempt: 1 } => "attaching…".to_string(),
            AttachState::Attaching { attempt } => format!("attaching… (attempt {})", attempt),
            AttachState::Attached => "attached".to_string(),
            AttachState::Failed { error, attempts } => {
                format!("failed after {} attempts: {}", attempts, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_with_backoff_then_fails() {
        let policy = RetryPolicy::default();
        let mut state = AttachState::begin();

        assert_eq!(state.on_failure("no such session", &policy), Some(Duration::from_millis(500)));
        assert_eq!(state, AttachState::Attaching { attempt: 2 });
        assert_eq!(state.on_failure("no such session", &policy), Some(Duration::from_millis(1000)));
        assert_eq!(state, AttachState::Attaching { attempt: 3 });
        assert_eq!(state.on_failure("no such session", &policy), None);
        assert_eq!(
            state,
            AttachState::Failed {
                error: "no such session".to_string(),
                attempts: 3
            }
        );
    }

    #[test]
    fn test_manual_retry_only_from_failed() {
        let policy = RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(10),
        };
        let mut state = AttachState::begin();
        assert!(!state.retry());
        assert_eq!(state.on_failure("boom", &policy), None);
        assert!(state.retry());
        assert_eq!(state, AttachState::Attaching { attempt: 1 });
        state.on_success();
        assert!(state.is_attached());
    }

    #[test]
    fn test_failure_outside_attaching_is_ignored() {
        let mut state = AttachState::Attached;
        assert_eq!(state.on_failure("late error", &RetryPolicy::default()), None);
        assert!(state.is_attached());
    }

    #[test]
    fn test_policy_from_config() {
        let config = TerminalConfig {
            max_attach_attempts: 0,
            retry_base_delay_ms: 250,
            scrollback_lines: 10,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay_before(3), Duration::from_millis(500));
    }
}
