//! Polling scheduler.
//!
//! [`Scheduler`] owns two periodic tasks: the fetch timer, which emits
//! [`SchedulerEvent::FetchDue`] immediately and then once per
//! [`PollInterval`], and a one-second countdown ticker for the display.
//! Both are aborted whenever the scheduler is stopped, reconfigured or
//! dropped. [`FetchGate`] keeps fetches from overlapping.
//!
//! Aborting a task does not recall a trigger it already queued, so every
//! trigger carries the generation it was scheduled under. Receivers drop
//! triggers for which [`Scheduler::is_current`] is false.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Period of the countdown ticker.
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Supported polling intervals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PollInterval {
    M1,
    M2,
    M3,
    #[default]
    M5,
    M10,
    M15,
    M30,
}

impl PollInterval {
    /// Every interval in ascending order.
    pub const ALL: [PollInterval; 7] = [
        PollInterval::M1,
        PollInterval::M2,
        PollInterval::M3,
        PollInterval::M5,
        PollInterval::M10,
        PollInterval::M15,
        PollInterval::M30,
    ];

    pub fn minutes(&self) -> u64 {
        match self {
            PollInterval::M1 => 1,
            PollInterval::M2 => 2,
            PollInterval::M3 => 3,
            PollInterval::M5 => 5,
            PollInterval::M10 => 10,
            PollInterval::M15 => 15,
            PollInterval::M30 => 30,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.minutes() * 60)
    }

    /// Looks up the interval for a minute count, if supported.
    pub fn from_minutes(minutes: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.minutes() == minutes)
    }

    /// Display label, e.g. `"5 minutes"`.
    pub fn label(&self) -> String {
        match self.minutes() {
            1 => "1 minute".to_string(),
            n => format!("{n} minutes"),
        }
    }

    /// Next longer interval, wrapping to the shortest.
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|i| i == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Next shorter interval, wrapping to the longest.
    pub fn previous(&self) -> Self {
        let idx = Self::ALL.iter().position(|i| i == self).unwrap_or(0);
        Self::ALL[idx.checked_sub(1).unwrap_or(Self::ALL.len() - 1)]
    }
}

/// Events emitted by the scheduler's tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// A scheduled fetch should start. Carries the scheduler generation.
    FetchDue(u64),
    /// One second passed; refresh the countdown display.
    CountdownTick,
}

/// Periodic fetch trigger with pause, resume and reconfiguration.
pub struct Scheduler<M> {
    tx: mpsc::UnboundedSender<M>,
    interval: PollInterval,
    enabled: bool,
    fetch_task: Option<JoinHandle<()>>,
    countdown_task: Option<JoinHandle<()>>,
    last_run: Option<Instant>,
    generation: u64,
}

impl<M> Scheduler<M>
where
    M: From<SchedulerEvent> + Send + 'static,
{
    /// Creates a stopped scheduler that will send its events to `tx`.
    pub fn new(tx: mpsc::UnboundedSender<M>, interval: PollInterval) -> Self {
        Self {
            tx,
            interval,
            enabled: false,
            fetch_task: None,
            countdown_task: None,
            last_run: None,
            generation: 0,
        }
    }

    pub fn interval(&self) -> PollInterval {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Bumped on every start, stop and reconfiguration.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a trigger scheduled under `generation` should still run.
    pub fn is_current(&self, generation: u64) -> bool {
        self.enabled && generation == self.generation
    }

    /// Enables polling with an immediate first trigger.
    pub fn start(&mut self) {
        self.reconfigure(self.interval, true);
    }

    /// Stops future triggers. A fetch already running is not affected.
    pub fn stop(&mut self) {
        self.reconfigure(self.interval, false);
    }

    /// Cancels any pending trigger and, if `enabled`, restarts the timers
    /// under the new interval with an immediate trigger. Triggers already
    /// queued stop being current.
    pub fn reconfigure(&mut self, interval: PollInterval, enabled: bool) {
        self.abort_tasks();
        self.interval = interval;
        self.enabled = enabled;
        self.generation = self.generation.wrapping_add(1);

        if enabled {
            self.fetch_task = Some(spawn_periodic(
                self.tx.clone(),
                interval.duration(),
                SchedulerEvent::FetchDue(self.generation),
            ));
            self.countdown_task = Some(spawn_periodic(
                self.tx.clone(),
                COUNTDOWN_TICK,
                SchedulerEvent::CountdownTick,
            ));
            info!(minutes = interval.minutes(), generation = self.generation, "Polling started");
        } else {
            info!("Polling stopped");
        }
    }

    /// Records that a fetch finished (successfully or not) at `at`.
    pub fn mark_run(&mut self, at: Instant) {
        self.last_run = Some(at);
    }

    /// Time left until the next scheduled fetch, measured from the last
    /// recorded run and clamped to zero.
    ///
    /// `None` while polling is stopped or before any run was recorded.
    pub fn countdown(&self, now: Instant) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let due = self.last_run? + self.interval.duration();
        Some(due.saturating_duration_since(now))
    }
}

impl<M> Scheduler<M> {
    fn abort_tasks(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        if let Some(task) = self.countdown_task.take() {
            task.abort();
        }
    }
}

impl<M> Drop for Scheduler<M> {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Spawns a task sending `event` immediately and then every `period`.
fn spawn_periodic<M>(tx: mpsc::UnboundedSender<M>, period: Duration, event: SchedulerEvent) -> JoinHandle<()>
where
    M: From<SchedulerEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let SchedulerEvent::FetchDue(generation) = event {
                debug!(generation, "Scheduled fetch due");
            }
            if tx.send(M::from(event)).is_err() {
                break;
            }
        }
    })
}

/// Single-slot queue in front of the pipeline.
///
/// At most one fetch runs at a time; triggers arriving meanwhile collapse
/// into one queued run that starts when the current one completes.
#[derive(Debug, Default)]
pub struct FetchGate {
    in_flight: bool,
    queued: bool,
}

impl FetchGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks to run a fetch. Returns `true` if the caller should start one
    /// now, `false` if it was queued behind the running fetch.
    pub fn request(&mut self) -> bool {
        if self.in_flight {
            self.queued = true;
            false
        } else {
            self.in_flight = true;
            true
        }
    }

    /// Marks the running fetch as finished. Returns `true` if a queued
    /// fetch should start now.
    pub fn complete(&mut self) -> bool {
        if self.queued {
            self.queued = false;
            true
        } else {
            self.in_flight = false;
            false
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_lookup_and_cycle() {
        assert_eq!(PollInterval::from_minutes(15), Some(PollInterval::M15));
        assert_eq!(PollInterval::from_minutes(4), None);
        assert_eq!(PollInterval::M30.next(), PollInterval::M1);
        assert_eq!(PollInterval::M1.previous(), PollInterval::M30);
        assert_eq!(PollInterval::M3.next(), PollInterval::M5);
        assert_eq!(PollInterval::M1.label(), "1 minute");
        assert_eq!(PollInterval::M10.label(), "10 minutes");
        assert_eq!(PollInterval::M2.duration(), Duration::from_secs(120));
    }

    #[test]
    fn gate_serializes_and_collapses_requests() {
        let mut gate = FetchGate::new();
        assert!(gate.request());
        assert!(!gate.request());
        assert!(!gate.request());
        assert!(gate.is_busy());

        // queued run starts, gate stays busy
        assert!(gate.complete());
        assert!(gate.is_busy());

        assert!(!gate.complete());
        assert!(!gate.is_busy());
        assert!(gate.request());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_counts_down_from_last_run() {
        let (tx, _rx) = mpsc::unbounded_channel::<SchedulerEvent>();
        let mut scheduler = Scheduler::new(tx, PollInterval::M5);
        scheduler.start();

        let t0 = Instant::now();
        assert_eq!(scheduler.countdown(t0), None);

        scheduler.mark_run(t0);
        assert_eq!(scheduler.countdown(t0), Some(Duration::from_secs(300)));
        assert_eq!(
            scheduler.countdown(t0 + Duration::from_secs(120)),
            Some(Duration::from_secs(180))
        );
        assert_eq!(
            scheduler.countdown(t0 + Duration::from_secs(900)),
            Some(Duration::ZERO)
        );

        scheduler.stop();
        assert_eq!(scheduler.countdown(t0), None);
    }

    #[tokio::test(start_paused = true)]
    async fn reconfiguring_retires_queued_triggers() {
        let (tx, _rx) = mpsc::unbounded_channel::<SchedulerEvent>();
        let mut scheduler = Scheduler::new(tx, PollInterval::M5);
        assert!(!scheduler.is_current(scheduler.generation()));

        scheduler.start();
        let first = scheduler.generation();
        assert!(scheduler.is_current(first));

        scheduler.reconfigure(PollInterval::M1, true);
        assert!(!scheduler.is_current(first));
        assert!(scheduler.is_current(scheduler.generation()));

        scheduler.stop();
        assert!(!scheduler.is_current(scheduler.generation()));
    }
}
