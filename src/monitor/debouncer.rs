use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

use super::{Changeset, EventKind};

pub(super) const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);
pub(super) const DEFAULT_LIVENESS: Duration = Duration::from_secs(600);

/// Deadline used when `now + delay` is not representable (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    /// No pending changes; only the liveness timer is armed
    Idle { liveness_at: Instant },
    /// Changes pending; flushed once `flush_at` passes with no new event
    Collecting { flush_at: Instant },
}

/// Pure debouncer: timing and deduplication, no I/O.
pub(super) struct Debouncer {
    pub(super) state: State,
    pub(super) changes: Changeset,
    debounce: Duration,
    liveness: Duration,
}

impl Debouncer {
    pub(super) fn new(debounce: Duration, liveness: Duration, now: Instant) -> Self {
        Self {
            state: State::Idle {
                liveness_at: deadline_after(now, liveness),
            },
            changes: Changeset::new(),
            debounce,
            liveness,
        }
    }

    /// Record an accepted event: opens a window or pushes its deadline back.
    pub(super) fn record(&mut self, kind: EventKind, path: PathBuf, now: Instant) {
        self.changes.insert(kind, path);
        self.state = State::Collecting {
            flush_at: deadline_after(now, self.debounce),
        };
    }

    /// When the loop should next wake up.
    pub(super) fn deadline(&self) -> Instant {
        match self.state {
            State::Idle { liveness_at } => liveness_at,
            State::Collecting { flush_at } => flush_at,
        }
    }

    /// Handle a timer expiry.
    ///
    /// Returns the finished changeset when a quiet window has closed. A
    /// liveness expiry only re-arms itself.
    pub(super) fn on_timer(&mut self, now: Instant) -> Option<Changeset> {
        match self.state {
            State::Collecting { flush_at } if now >= flush_at => {
                self.state = State::Idle {
                    liveness_at: deadline_after(now, self.liveness),
                };
                Some(std::mem::take(&mut self.changes))
            }
            State::Idle { liveness_at } if now >= liveness_at => {
                crate::debug!("watch"; "idle");
                self.state = State::Idle {
                    liveness_at: deadline_after(now, self.liveness),
                };
                None
            }
            _ => None,
        }
    }

    pub(super) fn is_collecting(&self) -> bool {
        matches!(self.state, State::Collecting { .. })
    }
}
