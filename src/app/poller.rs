// ABOUTME: Fixed-interval refresh schedule for backend-owned data
// Sessions, multiplexer liveness, groups with attention status, and issues with PR status each poll on their own cadence

use std::time::{Duration, Instant};

use crate::config::PollConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollTask {
    Sessions,
    Liveness,
    GroupsAndAttention,
    IssuesAndPrStatus,
}

impl PollTask {
    pub const ALL: [PollTask; 4] = [
        PollTask::Sessions,
        PollTask::Liveness,
        PollTask::GroupsAndAttention,
        PollTask::IssuesAndPrStatus,
    ];
}

#[derive(Debug)]
struct Schedule {
    task: PollTask,
    interval: Duration,
    last_run: Option<Instant>,
}

#[derive(Debug)]
pub struct Poller {
    schedules: Vec<Schedule>,
}

impl Poller {
    pub fn new(config: &PollConfig) -> Self {
        let interval = |secs: u64| Duration::from_secs(secs.max(1));
        let schedules = vec![
            (PollTask::Sessions, interval(config.sessions_secs)),
            (PollTask::Liveness, interval(config.liveness_secs)),
            (PollTask::GroupsAndAttention, interval(config.groups_secs)),
            (PollTask::IssuesAndPrStatus, interval(config.issues_secs)),
        ]
        .into_iter()
        .map(|(task, interval)| Schedule {
            task,
            interval,
            last_run: None,
        })
        .collect();
        Self { schedules }
    }

    /// Tasks due at `now`, marking them as run. Every task is due on the first call.
    pub fn due(&mut self, now: Instant) -> Vec<PollTask> {
        let mut due = Vec::new();
        for schedule in &mut self.schedules {
            let is_due = match schedule.last_run {
                None => true,
                Some(last) => now.saturating_duration_since(last) >= schedule.interval,
            };
            if is_due {
                schedule.last_run = Some(now);
                due.push(schedule.task);
            }
        }
        due
    }

    /// Make every task due on the next call to `due`.
    pub fn force_all(&mut self) {
        for schedule in &mut self.schedules {
            schedule.last_run = None;
        }
    }

    pub fn interval(&self, task: PollTask) -> Option<Duration> {
        self.schedules.iter().find(|s| s.task == task).map(|s| s.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_everything_due_on_first_tick() {
        let mut poller = Poller::new(&PollConfig::default());
        let now = Instant::now();
        assert_eq!(poller.due(now), PollTask::ALL.to_vec());
        assert!(poller.due(now).is_empty());
    }

    #[test]
    fn test_intervals_are_independent() {
        let mut poller = Poller::new(&PollConfig::default());
        let start = Instant::now();
        poller.due(start);

        assert!(poller.due(start + Duration::from_secs(2)).is_empty());
        assert_eq!(poller.due(start + Duration::from_secs(3)), vec![PollTask::Sessions]);
        assert_eq!(poller.due(start + Duration::from_secs(5)), vec![PollTask::Liveness]);
        assert_eq!(
            poller.due(start + Duration::from_secs(10)),
            vec![PollTask::Sessions, PollTask::Liveness, PollTask::GroupsAndAttention]
        );
        assert_eq!(
            poller.due(start + Duration::from_secs(30)),
            PollTask::ALL.to_vec()
        );
    }

    #[test]
    fn test_force_all() {
        let mut poller = Poller::new(&PollConfig::default());
        let now = Instant::now();
        poller.due(now);
        poller.force_all();
        assert_eq!(poller.due(now).len(), 4);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = PollConfig {
            sessions_secs: 0,
            ..PollConfig::default()
        };
        let poller = Poller::new(&config);
        assert_eq!(poller.interval(PollTask::Sessions), Some(Duration::from_secs(1)));
    }
}
