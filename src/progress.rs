//! One-way progress events from the submitter and poller to a display.
//!
//! A [`ProgressSink`] is a passive observer: its methods return nothing, so a
//! broken display can never steer or abort the pipeline.

use std::time::{Duration, Instant};

use crate::state_machine::JobState;

pub trait ProgressSink {
    /// An upload of `total` bytes is about to start.
    fn on_upload_start(&self, _label: &str, _total: u64) {}

    /// Cumulative bytes uploaded out of `total`.
    fn on_bytes(&self, transferred: u64, total: u64);

    /// A poll saw no state change.
    fn on_heartbeat(&self, job_name: &str, elapsed: Duration);

    /// A poll moved the job forward.
    fn on_state_change(&self, job_name: &str, from: JobState, to: JobState);
}

impl<S: ProgressSink + ?Sized> ProgressSink for &S {
    fn on_upload_start(&self, label: &str, total: u64) {
        (**self).on_upload_start(label, total)
    }

    fn on_bytes(&self, transferred: u64, total: u64) {
        (**self).on_bytes(transferred, total)
    }

    fn on_heartbeat(&self, job_name: &str, elapsed: Duration) {
        (**self).on_heartbeat(job_name, elapsed)
    }

    fn on_state_change(&self, job_name: &str, from: JobState, to: JobState) {
        (**self).on_state_change(job_name, from, to)
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_bytes(&self, _transferred: u64, _total: u64) {}
    fn on_heartbeat(&self, _job_name: &str, _elapsed: Duration) {}
    fn on_state_change(&self, _job_name: &str, _from: JobState, _to: JobState) {}
}

/// Rate limiter for byte progress: at most one update per `min_interval`,
/// plus the final one at `total`.
#[derive(Debug)]
pub struct ProgressThrottle {
    min_interval: Duration,
    last_emit: Option<Instant>,
    finished: bool,
}

impl ProgressThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_emit: None,
            finished: false,
        }
    }

    pub fn should_emit(&mut self, transferred: u64, total: u64) -> bool {
        if self.finished {
            return false;
        }
        let now = Instant::now();
        let due = transferred >= total
            || self
                .last_emit
                .is_none_or(|last| now.duration_since(last) >= self.min_interval);
        if due {
            self.last_emit = Some(now);
            self.finished = transferred >= total;
        }
        due
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::ProgressSink;
    use crate::state_machine::JobState;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ProgressEvent {
        Bytes { transferred: u64, total: u64 },
        Heartbeat { job_name: String },
        StateChange { job_name: String, from: JobState, to: JobState },
    }

    /// Sink that keeps every event for later assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn state_changes(&self) -> Vec<(JobState, JobState)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    ProgressEvent::StateChange { from, to, .. } => Some((from, to)),
                    _ => None,
                })
                .collect()
        }

        pub fn heartbeats(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| matches!(e, ProgressEvent::Heartbeat { .. }))
                .count()
        }

        fn push(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ProgressSink for RecordingSink {
        fn on_bytes(&self, transferred: u64, total: u64) {
            self.push(ProgressEvent::Bytes { transferred, total });
        }

        fn on_heartbeat(&self, job_name: &str, _elapsed: Duration) {
            self.push(ProgressEvent::Heartbeat {
                job_name: job_name.to_string(),
            });
        }

        fn on_state_change(&self, job_name: &str, from: JobState, to: JobState) {
            self.push(ProgressEvent::StateChange {
                job_name: job_name.to_string(),
                from,
                to,
            });
        }
    }
}
