//! Live monitor loop.
//!
//! Data flow per tick:
//! LiveFeed → SpreadPoint → evaluate(AlertEngineState) → AlertSink
//!
//! Ticks are serialized: a slow fetch delays the next tick instead of
//! overlapping it. `stop` cancels an in-flight fetch and its result is
//! never applied.

use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, annotate_span, child_span, root_span, warn_if_slow};
use parking_lot::Mutex;
use spread::SpreadPoint;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::engine::{AlertEngineState, AlertEvent, evaluate};
use crate::errors::MonitorError;
use crate::feed::LiveFeed;
use crate::sink::{AlertSink, deliver};
use crate::zone::AlertZone;

const SLOW_FETCH: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Active,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between ticks.
    pub interval: Duration,
    pub cooldown: Duration,
    pub zones: Vec<AlertZone>,
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let engine = AlertEngineState::default();
        Self {
            interval: Duration::from_secs(5),
            cooldown: engine.cooldown,
            zones: engine.zones,
            sound_enabled: engine.sound_enabled,
            notifications_enabled: engine.notifications_enabled,
        }
    }
}

/// State shared by the loop and configuration edits, behind one lock.
#[derive(Debug, Default)]
struct Shared {
    engine: AlertEngineState,
    latest: Option<SpreadPoint>,
}

struct RunningTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the alert engine for one monitoring session.
pub struct AlertMonitor {
    feed: Arc<dyn LiveFeed>,
    sink: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    shared: Arc<Mutex<Shared>>,
    task: Mutex<Option<RunningTask>>,
}

impl AlertMonitor {
    pub fn new(feed: Arc<dyn LiveFeed>, sink: Arc<dyn AlertSink>, cfg: MonitorConfig) -> Self {
        let mut engine = AlertEngineState::new(cfg.zones, cfg.cooldown);
        engine.sound_enabled = cfg.sound_enabled;
        engine.notifications_enabled = cfg.notifications_enabled;

        Self {
            feed,
            sink,
            clock: Arc::new(SystemClock),
            interval: cfg.interval,
            shared: Arc::new(Mutex::new(Shared {
                engine,
                latest: None,
            })),
            task: Mutex::new(None),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> MonitorState {
        match self.task.lock().as_ref() {
            Some(t) if !t.handle.is_finished() => MonitorState::Active,
            _ => MonitorState::Idle,
        }
    }

    /// IDLE → ACTIVE. The first tick runs immediately.
    pub fn start(&self) -> Result<(), MonitorError> {
        if self.interval.is_zero() {
            return Err(MonitorError::ZeroInterval);
        }

        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return Err(MonitorError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.feed),
            Arc::clone(&self.sink),
            Arc::clone(&self.clock),
            Arc::clone(&self.shared),
            self.interval,
            stop_rx,
        )
        .in_current_span());

        info!(
            pair = %self.feed.label(),
            every_ms = self.interval.as_millis() as u64,
            "alert monitor started"
        );

        *task = Some(RunningTask { stop_tx, handle });
        Ok(())
    }

    /// ACTIVE → IDLE. Returns once the loop has exited.
    pub async fn stop(&self) {
        let Some(RunningTask { stop_tx, handle }) = self.task.lock().take() else {
            return;
        };

        let _ = stop_tx.send(true);
        if let Err(e) = handle.await {
            warn!(error = ?e, "alert monitor task ended abnormally");
        }

        info!(pair = %self.feed.label(), "alert monitor stopped");
    }

    /// Copy of the full engine state.
    pub fn snapshot(&self) -> AlertEngineState {
        self.shared.lock().engine.clone()
    }

    /// Alert history, most recent first.
    pub fn history(&self) -> Vec<AlertEvent> {
        self.shared.lock().engine.history.iter().copied().collect()
    }

    /// Last sample seen by the loop.
    pub fn latest(&self) -> Option<SpreadPoint> {
        self.shared.lock().latest
    }

    pub fn zones(&self) -> Vec<AlertZone> {
        self.shared.lock().engine.zones.clone()
    }

    pub fn add_zone(&self, zone: AlertZone) {
        self.shared.lock().engine.zones.push(zone);
    }

    pub fn remove_zone(&self, index: usize) -> Result<AlertZone, MonitorError> {
        let mut shared = self.shared.lock();
        if index >= shared.engine.zones.len() {
            return Err(MonitorError::NoSuchZone(index));
        }
        Ok(shared.engine.zones.remove(index))
    }

    pub fn set_zone_enabled(&self, index: usize, enabled: bool) -> Result<(), MonitorError> {
        let mut shared = self.shared.lock();
        let zone = shared
            .engine
            .zones
            .get_mut(index)
            .ok_or(MonitorError::NoSuchZone(index))?;
        zone.enabled = enabled;
        Ok(())
    }

    pub fn replace_zones(&self, zones: Vec<AlertZone>) {
        self.shared.lock().engine.zones = zones;
    }

    pub fn set_cooldown(&self, cooldown: Duration) {
        self.shared.lock().engine.cooldown = cooldown;
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.shared.lock().engine.sound_enabled = enabled;
    }

    pub fn set_notifications_enabled(&self, enabled: bool) {
        self.shared.lock().engine.notifications_enabled = enabled;
    }

    pub fn clear_history(&self) {
        self.shared.lock().engine.history.clear();
    }
}

impl Drop for AlertMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.handle.abort();
        }
    }
}

enum TickResult {
    Continue,
    Stopped,
}

async fn run_loop(
    feed: Arc<dyn LiveFeed>,
    sink: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
    shared: Arc<Mutex<Shared>>,
    every: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        let trace_id = TraceId::default();
        let span = root_span("monitor_tick", &trace_id);
        let result = tick(&*feed, &*sink, &*clock, &shared, &mut stop_rx)
            .instrument(span)
            .await;

        if let TickResult::Stopped = result {
            break;
        }
    }

    debug!("monitor loop exited");
}

async fn tick(
    feed: &dyn LiveFeed,
    sink: &dyn AlertSink,
    clock: &dyn Clock,
    shared: &Mutex<Shared>,
    stop_rx: &mut watch::Receiver<bool>,
) -> TickResult {
    annotate_span(&feed.label());

    let fetched = tokio::select! {
        biased;
        _ = stop_rx.changed() => return TickResult::Stopped,
        res = warn_if_slow("live_fetch", SLOW_FETCH, feed.latest())
            .instrument(child_span("live_fetch")) => res,
    };

    if *stop_rx.borrow() {
        debug!("discarding sample fetched after stop");
        return TickResult::Stopped;
    }

    let sample = match fetched {
        Ok(Some(sample)) => sample,
        Ok(None) => {
            debug!("no aligned live sample this tick");
            return TickResult::Continue;
        }
        Err(e) => {
            warn!(error = %e, "live fetch failed; skipping tick");
            return TickResult::Continue;
        }
    };

    let fired = {
        let mut guard = shared.lock();
        guard.latest = Some(sample);
        let engine = std::mem::take(&mut guard.engine);
        let outcome = evaluate(engine, &sample, clock.now_ms());
        guard.engine = outcome.state;
        outcome.fired
    };

    debug!(
        spread_pct = sample.spread_percent,
        fired = fired.len(),
        "live sample evaluated"
    );

    for alert in &fired {
        info!(
            zone = alert.zone_index,
            spread_pct = alert.event.spread_percent,
            price_a = alert.event.price_a,
            price_b = alert.event.price_b,
            "spread alert"
        );
        deliver(sink, alert);
    }

    TickResult::Continue
}
