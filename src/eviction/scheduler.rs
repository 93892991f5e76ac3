//! Background scheduling of the eviction policies.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::policy::{run_policy, EvictionPolicy, EvictionReport};
use crate::error::RegistryError;
use crate::session::{SessionHandle, SessionStore};
use crate::Result;

/// Default period of the inactivity sweep.
pub const DEFAULT_INACTIVITY_SWEEP: Duration = Duration::from_secs(60 * 60);
/// Default period of the full flush.
pub const DEFAULT_FULL_FLUSH: Duration = Duration::from_secs(60);
/// Default hour of the daily flush (local time).
pub const DEFAULT_DAILY_FLUSH_HOUR: u32 = 5;

/// Which policies run, and when. `None` disables a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionConfig {
    /// Period of the inactivity sweep.
    pub inactivity_sweep: Option<Duration>,
    /// Period of the unconditional full flush.
    pub full_flush: Option<Duration>,
    /// Local wall-clock time of the daily flush.
    pub daily_flush: Option<NaiveTime>,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            inactivity_sweep: Some(DEFAULT_INACTIVITY_SWEEP),
            full_flush: Some(DEFAULT_FULL_FLUSH),
            daily_flush: NaiveTime::from_hms_opt(DEFAULT_DAILY_FLUSH_HOUR, 0, 0),
        }
    }
}

impl EvictionConfig {
    /// A configuration with every policy disabled.
    pub fn disabled() -> Self {
        Self {
            inactivity_sweep: None,
            full_flush: None,
            daily_flush: None,
        }
    }

    /// Set the inactivity sweep period.
    pub fn with_inactivity_sweep(mut self, period: Duration) -> Self {
        self.inactivity_sweep = Some(period);
        self
    }

    /// Set the full flush period.
    pub fn with_full_flush(mut self, period: Duration) -> Self {
        self.full_flush = Some(period);
        self
    }

    /// Set the daily flush time.
    pub fn with_daily_flush(mut self, at: NaiveTime) -> Self {
        self.daily_flush = Some(at);
        self
    }

    /// Disable the inactivity sweep.
    pub fn without_inactivity_sweep(mut self) -> Self {
        self.inactivity_sweep = None;
        self
    }

    /// Disable the full flush.
    pub fn without_full_flush(mut self) -> Self {
        self.full_flush = None;
        self
    }

    /// Disable the daily flush.
    pub fn without_daily_flush(mut self) -> Self {
        self.daily_flush = None;
        self
    }

    /// Reject zero periods.
    pub fn validate(&self) -> Result<()> {
        for (policy, period) in [
            (EvictionPolicy::Inactivity, self.inactivity_sweep),
            (EvictionPolicy::FullFlush, self.full_flush),
        ] {
            if period.is_some_and(|p| p.is_zero()) {
                return Err(RegistryError::InvalidSchedule(format!(
                    "{policy} period must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    /// Enabled policies, in scheduling order.
    pub fn enabled_policies(&self) -> Vec<EvictionPolicy> {
        EvictionPolicy::ALL
            .into_iter()
            .filter(|policy| match policy {
                EvictionPolicy::Inactivity => self.inactivity_sweep.is_some(),
                EvictionPolicy::FullFlush => self.full_flush.is_some(),
                EvictionPolicy::DailyFlush => self.daily_flush.is_some(),
            })
            .collect()
    }
}

/// Runs the eviction policies against a shared store.
///
/// Each enabled policy gets its own task, so a slow sweep never delays
/// another policy, and a policy never overlaps with itself.
pub struct EvictionScheduler<S> {
    store: Arc<SessionStore<S>>,
    config: EvictionConfig,
}

impl<S: SessionHandle + 'static> EvictionScheduler<S> {
    /// Create a scheduler for the given store.
    pub fn new(store: Arc<SessionStore<S>>, config: EvictionConfig) -> Self {
        Self { store, config }
    }

    /// Run a policy synchronously, outside any schedule.
    pub fn run_now(&self, policy: EvictionPolicy) -> EvictionReport {
        run_policy(&self.store, policy)
    }

    /// Spawn one task per enabled policy on the current tokio runtime.
    pub fn start(self) -> Result<SchedulerHandle> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|e| RegistryError::Runtime(e.to_string()))?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        if let Some(period) = self.config.inactivity_sweep {
            let task = run_periodic(
                Arc::clone(&self.store),
                EvictionPolicy::Inactivity,
                period,
                shutdown_rx.clone(),
            );
            tasks.push((EvictionPolicy::Inactivity, runtime.spawn(task)));
        }

        if let Some(period) = self.config.full_flush {
            let task = run_periodic(
                Arc::clone(&self.store),
                EvictionPolicy::FullFlush,
                period,
                shutdown_rx.clone(),
            );
            tasks.push((EvictionPolicy::FullFlush, runtime.spawn(task)));
        }

        if let Some(at) = self.config.daily_flush {
            let task = run_daily(Arc::clone(&self.store), at, shutdown_rx.clone());
            tasks.push((EvictionPolicy::DailyFlush, runtime.spawn(task)));
        }

        info!(
            policies = ?tasks.iter().map(|(p, _)| p.name()).collect::<Vec<_>>(),
            "Eviction scheduler started"
        );

        Ok(SchedulerHandle {
            shutdown: shutdown_tx,
            tasks,
        })
    }
}

/// Handle to the running eviction tasks.
///
/// Dropping the handle also stops the tasks.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(EvictionPolicy, JoinHandle<()>)>,
}

impl SchedulerHandle {
    /// Policies that have a running task.
    pub fn policies(&self) -> Vec<EvictionPolicy> {
        self.tasks.iter().map(|(policy, _)| *policy).collect()
    }

    /// Stop every task and wait for it to finish.
    ///
    /// A sweep already in progress runs to completion first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for (policy, task) in self.tasks {
            if let Err(e) = task.await {
                warn!(policy = %policy, error = %e, "Eviction task ended abnormally");
            }
        }
        info!("Eviction scheduler stopped");
    }
}

async fn run_periodic<S: SessionHandle>(
    store: Arc<SessionStore<S>>,
    policy: EvictionPolicy,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    // First run after one full period, then at a fixed rate.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!(policy = %policy, period_secs = period.as_secs(), "Periodic eviction scheduled");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_policy(&store, policy);
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn run_daily<S: SessionHandle>(
    store: Arc<SessionStore<S>>,
    at: NaiveTime,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut last_run: Option<DateTime<Local>> = None;

    loop {
        let now = Local::now();
        let Some(next) = next_daily_run_after(&now, last_run.as_ref(), at) else {
            warn!(at = %at, "No next daily flush time; daily flush stopped");
            break;
        };
        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(next_run = %next, "Daily flush scheduled");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                run_policy(&store, EvictionPolicy::DailyFlush);
                last_run = Some(next);
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// Like [`next_daily_run`], but never returns the run at `previous` again.
///
/// The timer can fire slightly before the wall clock reaches `previous`,
/// so the next run is counted from whichever of the two is later.
fn next_daily_run_after<Tz: TimeZone>(
    now: &DateTime<Tz>,
    previous: Option<&DateTime<Tz>>,
    at: NaiveTime,
) -> Option<DateTime<Tz>> {
    match previous {
        Some(previous) if previous > now => next_daily_run(previous, at),
        _ => next_daily_run(now, at),
    }
}

/// Next instant strictly after `now` whose local time is `at`.
///
/// On a daylight-saving gap the run moves forward by one hour; on an
/// overlap the earlier of the two instants is used.
pub fn next_daily_run<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let mut date = now.date_naive();

    // Today, tomorrow, and one spare day for a gap at the boundary.
    for _ in 0..3 {
        let local = date.and_time(at);
        let candidate = tz
            .from_local_datetime(&local)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(local + TimeDelta::hours(1))).earliest());

        if let Some(candidate) = candidate {
            if candidate > *now {
                return Some(candidate);
            }
        }
        date = date.succ_opt()?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionConfig};
    use chrono::{FixedOffset, Utc};

    fn populated_store(count: usize) -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::new());
        for _ in 0..count {
            store.add_session(Arc::new(Session::create(SessionConfig::default())));
        }
        store
    }

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = EvictionConfig::default();
        assert_eq!(config.inactivity_sweep, Some(Duration::from_secs(3600)));
        assert_eq!(config.full_flush, Some(Duration::from_secs(60)));
        assert_eq!(config.daily_flush, Some(at(5, 0)));
        assert_eq!(config.enabled_policies(), EvictionPolicy::ALL.to_vec());
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let config = EvictionConfig::default().with_full_flush(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(RegistryError::InvalidSchedule(_))
        ));
        assert!(EvictionConfig::disabled().validate().is_ok());
    }

    #[test]
    fn test_next_daily_run_later_today() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 3, 30, 0).unwrap();
        let next = next_daily_run(&now, at(5, 0)).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 10, 18, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_next_daily_run_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 5, 0, 0).unwrap();
        let next = next_daily_run(&now, at(5, 0)).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 10, 19, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_next_daily_run_keeps_offset() {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = kst.with_ymd_and_hms(2026, 12, 31, 23, 0, 0).unwrap();
        let next = next_daily_run(&now, at(5, 0)).unwrap();
        assert_eq!(next, kst.with_ymd_and_hms(2027, 1, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_early_wakeup_does_not_repeat_daily_run() {
        let previous = Utc.with_ymd_and_hms(2026, 10, 18, 5, 0, 0).unwrap();
        let woke = previous - TimeDelta::milliseconds(20);

        let next = next_daily_run_after(&woke, Some(&previous), at(5, 0)).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 10, 19, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_daily_run_after_previous_in_the_past() {
        let previous = Utc.with_ymd_and_hms(2026, 10, 18, 5, 0, 0).unwrap();
        let now = previous + TimeDelta::seconds(1);
        assert_eq!(
            next_daily_run_after(&now, Some(&previous), at(5, 0)),
            next_daily_run(&now, at(5, 0))
        );
        assert_eq!(
            next_daily_run_after(&now, None, at(5, 0)),
            Utc.with_ymd_and_hms(2026, 10, 19, 5, 0, 0).single()
        );
    }

    #[test]
    fn test_run_now() {
        let store = populated_store(3);
        let scheduler = EvictionScheduler::new(Arc::clone(&store), EvictionConfig::disabled());

        let report = scheduler.run_now(EvictionPolicy::Inactivity);
        assert_eq!(report.evicted, 0);

        let report = scheduler.run_now(EvictionPolicy::FullFlush);
        assert_eq!(report.evicted, 3);
        assert!(store.is_empty());
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let scheduler = EvictionScheduler::new(populated_store(0), EvictionConfig::default());
        assert!(matches!(scheduler.start(), Err(RegistryError::Runtime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_flush_runs_on_period() {
        let store = populated_store(5);
        let config = EvictionConfig::disabled().with_full_flush(Duration::from_secs(60));
        let handle = EvictionScheduler::new(Arc::clone(&store), config)
            .start()
            .unwrap();
        assert_eq!(handle.policies(), vec![EvictionPolicy::FullFlush]);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.count(), 5);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(store.count(), 0);

        // Sessions added later go on the next tick.
        store.add_session(Arc::new(Session::create(SessionConfig::default())));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.count(), 0);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_flush_fires_within_a_day() {
        let store = populated_store(2);
        let config = EvictionConfig::disabled().with_daily_flush(at(5, 0));
        let handle = EvictionScheduler::new(Arc::clone(&store), config)
            .start()
            .unwrap();

        tokio::time::sleep(Duration::from_secs(25 * 60 * 60)).await;
        assert!(store.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_sweeps() {
        let store = populated_store(0);
        let config = EvictionConfig::disabled().with_full_flush(Duration::from_secs(60));
        let handle = EvictionScheduler::new(Arc::clone(&store), config)
            .start()
            .unwrap();
        handle.shutdown().await;

        store.add_session(Arc::new(Session::create(SessionConfig::default())));
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(store.count(), 1);
    }
}
