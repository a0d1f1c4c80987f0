//! Jittered daily scheduler.
//!
//! Each nominal publish time is shifted by a random whole number of minutes
//! when the scheduler is armed. The shifted times then repeat daily until
//! the scheduler is armed again, normally at the next process start.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use shorts_models::{ScheduleSlot, TimeOfDay};

use crate::pipeline::PublishPipeline;

/// Upper bound on a single idle sleep, so wall-clock changes are noticed.
const MAX_IDLE_SLEEP: Duration = Duration::from_secs(60);

/// Work fired by the scheduler.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    async fn run(&self, trigger: &str);
}

#[async_trait]
impl ScheduledTask for PublishPipeline {
    async fn run(&self, trigger: &str) {
        self.run_once(trigger).await;
    }
}

/// One jittered offset per nominal time, uniform in `[-window, window]`.
pub fn jitter_slots<R: Rng + ?Sized>(
    nominal: &[TimeOfDay],
    window_minutes: u32,
    rng: &mut R,
) -> Vec<ScheduleSlot> {
    let window = i64::from(window_minutes);
    nominal
        .iter()
        .map(|&time| ScheduleSlot::new(time, rng.random_range(-window..=window)))
        .collect()
}

/// First instant strictly after `after` whose local time is `time`.
///
/// A time that falls in a DST gap fires an hour later that day.
pub fn next_occurrence<Tz: TimeZone>(time: TimeOfDay, after: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = after.timezone();
    let mut date = after.date_naive();

    for _ in 0..3 {
        let naive = date.and_time(time.to_naive_time());
        let candidate = tz
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                tz.from_local_datetime(&(naive + chrono::Duration::hours(1)))
                    .earliest()
            });

        if let Some(candidate) = candidate {
            if candidate > *after {
                return candidate;
            }
        }

        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    after.clone() + chrono::Duration::days(1)
}

struct ScheduleEntry {
    slot: ScheduleSlot,
    next_run: DateTime<Local>,
    task: Arc<dyn ScheduledTask>,
}

/// Owns the armed trigger list and runs due tasks one at a time.
pub struct JitteredScheduler {
    nominal: Vec<TimeOfDay>,
    window_minutes: u32,
    entries: Vec<ScheduleEntry>,
}

impl JitteredScheduler {
    pub fn new(nominal: Vec<TimeOfDay>, window_minutes: u32) -> Self {
        Self {
            nominal,
            window_minutes,
            entries: Vec::new(),
        }
    }

    /// Re-jitter and rebuild the trigger list, replacing any previous one.
    ///
    /// Returns the effective trigger times.
    pub fn arm<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        task: Arc<dyn ScheduledTask>,
        now: DateTime<Local>,
    ) -> Vec<TimeOfDay> {
        let slots = jitter_slots(&self.nominal, self.window_minutes, rng);

        self.entries.clear();
        for slot in slots {
            if self.entries.iter().any(|e| e.slot.effective() == slot.effective()) {
                debug!("Dropping duplicate trigger at {}", slot.effective());
                continue;
            }
            self.entries.push(ScheduleEntry {
                slot,
                next_run: next_occurrence(slot.effective(), &now),
                task: Arc::clone(&task),
            });
        }
        self.entries.sort_by_key(|e| e.slot.effective());

        for entry in &self.entries {
            info!(
                nominal = %entry.slot.nominal,
                offset_minutes = entry.slot.offset_minutes,
                "Armed daily trigger at {}",
                entry.slot.effective()
            );
        }
        self.trigger_times()
    }

    pub fn trigger_times(&self) -> Vec<TimeOfDay> {
        self.entries.iter().map(|e| e.slot.effective()).collect()
    }

    /// Earliest pending trigger.
    pub fn next_due(&self) -> Option<(usize, DateTime<Local>)> {
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.next_run)
            .map(|(idx, e)| (idx, e.next_run))
    }

    /// Fire triggers until `shutdown` becomes true.
    ///
    /// Shutdown interrupts idle waits only; a task that has started runs to
    /// completion first.
    pub async fn run_until_shutdown(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut announced: Option<DateTime<Local>> = None;

        loop {
            if *shutdown.borrow() {
                info!("Scheduler stopping");
                return;
            }

            let Some((idx, due)) = self.next_due() else {
                warn!("No triggers armed, scheduler exiting");
                return;
            };
            if announced != Some(due) {
                info!("Next publish run at {}", due.format("%Y-%m-%d %H:%M"));
                announced = Some(due);
            }

            let now = Local::now();
            if due > now {
                let wait = (due - now).to_std().unwrap_or(Duration::ZERO);
                tokio::select! {
                    _ = tokio::time::sleep(wait.min(MAX_IDLE_SLEEP)) => {}
                    _ = wait_for_shutdown(&mut shutdown) => {}
                }
                continue;
            }

            let entry = &self.entries[idx];
            let task = Arc::clone(&entry.task);
            let trigger = format!("schedule@{}", entry.slot.effective());
            task.run(&trigger).await;

            let entry = &mut self.entries[idx];
            entry.next_run = next_occurrence(entry.slot.effective(), &Local::now());
        }
    }
}

/// Resolve once the flag is true. Never resolves if the sender is gone.
pub async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn t(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::new(h, m).unwrap()
    }

    struct NoopTask;

    #[async_trait]
    impl ScheduledTask for NoopTask {
        async fn run(&self, _trigger: &str) {}
    }

    #[test]
    fn test_jitter_stays_within_window() {
        let mut rng = StdRng::seed_from_u64(2024);
        let lower = t(7, 45).minute_of_day();
        let upper = t(8, 15).minute_of_day();
        let mut distinct = std::collections::HashSet::new();

        for _ in 0..1000 {
            let slots = jitter_slots(&[t(8, 0)], 15, &mut rng);
            let effective = slots[0].effective().minute_of_day();
            assert!((lower..=upper).contains(&effective), "{} out of range", effective);
            distinct.insert(effective);
        }
        assert_eq!(distinct.len(), 31);
    }

    #[test]
    fn test_jitter_wraps_across_midnight() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let slots = jitter_slots(&[t(0, 5)], 15, &mut rng);
            let m = slots[0].effective().minute_of_day();
            assert!(m <= 20 || m >= 1430, "{} not near midnight", m);
        }
    }

    #[test]
    fn test_zero_window_keeps_nominal_times_sorted() {
        let mut scheduler = JitteredScheduler::new(vec![t(15, 0), t(8, 0)], 0);
        let mut rng = StdRng::seed_from_u64(1);
        let times = scheduler.arm(&mut rng, Arc::new(NoopTask), Local::now());
        assert_eq!(times, vec![t(8, 0), t(15, 0)]);
    }

    #[test]
    fn test_arm_drops_triggers_that_jitter_onto_each_other() {
        let mut scheduler = JitteredScheduler::new(vec![t(7, 0), t(7, 1)], 1);
        let mut rng = StdRng::seed_from_u64(5);
        let mut saw_collision = false;

        for _ in 0..200 {
            let times = scheduler.arm(&mut rng, Arc::new(NoopTask), Local::now());
            let mut deduped = times.clone();
            deduped.dedup();
            assert_eq!(times, deduped);
            assert!(times.windows(2).all(|w| w[0] < w[1]));
            saw_collision |= times.len() == 1;
        }
        assert!(saw_collision);
    }

    #[test]
    fn test_rearm_draws_fresh_offsets_within_window() {
        let nominal = vec![t(8, 0), t(15, 0)];
        let mut scheduler = JitteredScheduler::new(nominal.clone(), 15);
        let mut rng = StdRng::seed_from_u64(77);
        let mut armings = std::collections::HashSet::new();

        for _ in 0..20 {
            let times = scheduler.arm(&mut rng, Arc::new(NoopTask), Local::now());
            assert_eq!(times.len(), 2);
            for (time, base) in times.iter().zip(&nominal) {
                let delta = time.minute_of_day() as i64 - base.minute_of_day() as i64;
                assert!((-15..=15).contains(&delta), "{} drifted {} minutes", time, delta);
            }
            armings.insert(times);
        }
        assert!(armings.len() > 1, "re-arming reused the same trigger times");
    }

    #[test]
    fn test_arm_drops_coinciding_triggers() {
        let mut scheduler = JitteredScheduler::new(vec![t(8, 0), t(8, 0), t(15, 0)], 0);
        let mut rng = StdRng::seed_from_u64(3);

        let times = scheduler.arm(&mut rng, Arc::new(NoopTask), Local::now());
        assert_eq!(times, vec![t(8, 0), t(15, 0)]);

        let rearmed = scheduler.arm(&mut rng, Arc::new(NoopTask), Local::now());
        assert_eq!(rearmed.len(), 2);
    }

    #[test]
    fn test_next_occurrence_today_or_tomorrow() {
        let morning = Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2026, 3, 10)
                .unwrap()
                .and_hms_opt(7, 30, 0)
                .unwrap(),
        );

        let today = next_occurrence(t(8, 0), &morning);
        assert_eq!(today - morning, chrono::Duration::minutes(30));

        let tomorrow = next_occurrence(t(7, 30), &morning);
        assert_eq!(tomorrow - morning, chrono::Duration::days(1));
    }

    struct StopAfterRun {
        runs: AtomicU32,
        stop: watch::Sender<bool>,
    }

    #[async_trait]
    impl ScheduledTask for StopAfterRun {
        async fn run(&self, _trigger: &str) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let _ = self.stop.send(true);
        }
    }

    #[tokio::test]
    async fn test_due_trigger_runs_to_completion_before_shutdown() {
        let (tx, rx) = watch::channel(false);
        let task = Arc::new(StopAfterRun {
            runs: AtomicU32::new(0),
            stop: tx,
        });

        let mut scheduler = JitteredScheduler::new(vec![t(8, 0)], 0);
        let mut rng = StdRng::seed_from_u64(0);
        scheduler.arm(&mut rng, task.clone(), Local::now());
        scheduler.entries[0].next_run = Local::now() - chrono::Duration::seconds(1);

        tokio::time::timeout(Duration::from_secs(5), scheduler.run_until_shutdown(rx))
            .await
            .unwrap();

        assert_eq!(task.runs.load(Ordering::SeqCst), 1);
        assert!(scheduler.entries[0].next_run > Local::now());
    }

    #[tokio::test]
    async fn test_shutdown_while_idle_returns() {
        let (tx, rx) = watch::channel(false);
        let mut scheduler = JitteredScheduler::new(vec![t(8, 0)], 15);
        let mut rng = StdRng::seed_from_u64(0);
        scheduler.arm(&mut rng, Arc::new(NoopTask), Local::now());

        let handle = tokio::spawn(async move {
            scheduler.run_until_shutdown(rx).await;
        });
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
