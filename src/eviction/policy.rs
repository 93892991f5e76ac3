//! The three eviction procedures.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::session::{SessionHandle, SessionStore, SweepOutcome};

/// Which eviction procedure ran.
///
/// Only [`EvictionPolicy::Inactivity`] looks at session activity. The two
/// flushes evict everything and differ only in schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionPolicy {
    /// Evict sessions idle for longer than their inactive interval.
    Inactivity,
    /// Evict every session on a short fixed period.
    FullFlush,
    /// Evict every session once a day at a fixed wall-clock time.
    DailyFlush,
}

impl EvictionPolicy {
    /// All policies, in scheduling order.
    pub const ALL: [EvictionPolicy; 3] = [
        EvictionPolicy::Inactivity,
        EvictionPolicy::FullFlush,
        EvictionPolicy::DailyFlush,
    ];

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Inactivity => "inactivity_sweep",
            Self::FullFlush => "full_flush",
            Self::DailyFlush => "daily_flush",
        }
    }

    /// Whether the policy checks each session before evicting it.
    pub fn is_conditional(&self) -> bool {
        matches!(self, Self::Inactivity)
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Summary of one eviction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionReport {
    pub policy: EvictionPolicy,
    pub scanned: usize,
    pub evicted: usize,
    pub failed: usize,
}

impl EvictionReport {
    fn new(policy: EvictionPolicy, outcome: SweepOutcome) -> Self {
        Self {
            policy,
            scanned: outcome.scanned,
            evicted: outcome.evicted,
            failed: outcome.failed,
        }
    }

    fn log(self) -> Self {
        info!(
            policy = %self.policy,
            scanned = self.scanned,
            evicted = self.evicted,
            failed = self.failed,
            "Eviction sweep finished"
        );
        self
    }
}

/// Run one policy against the store right now.
pub fn run_policy<S: SessionHandle>(store: &SessionStore<S>, policy: EvictionPolicy) -> EvictionReport {
    match policy {
        EvictionPolicy::Inactivity => evict_inactive(store),
        EvictionPolicy::FullFlush => full_flush(store),
        EvictionPolicy::DailyFlush => daily_flush(store),
    }
}

/// Evict sessions that have been idle past their inactive interval.
pub fn evict_inactive<S: SessionHandle>(store: &SessionStore<S>) -> EvictionReport {
    evict_inactive_at(store, Utc::now())
}

/// Evict sessions that are idle past their inactive interval at `now`.
pub fn evict_inactive_at<S: SessionHandle>(
    store: &SessionStore<S>,
    now: DateTime<Utc>,
) -> EvictionReport {
    let outcome = store.evict_matching(|session| session.is_inactive_at(now));
    EvictionReport::new(EvictionPolicy::Inactivity, outcome).log()
}

/// Evict every session, regardless of activity.
pub fn full_flush<S: SessionHandle>(store: &SessionStore<S>) -> EvictionReport {
    EvictionReport::new(EvictionPolicy::FullFlush, store.evict_matching(|_| true)).log()
}

/// The once-a-day flush. Same effect as [`full_flush`], reported separately.
pub fn daily_flush<S: SessionHandle>(store: &SessionStore<S>) -> EvictionReport {
    EvictionReport::new(EvictionPolicy::DailyFlush, store.evict_matching(|_| true)).log()
}
