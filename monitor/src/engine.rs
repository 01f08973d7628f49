//! Alert state machine.
//!
//! One [`AlertEngineState`] per monitoring session. Each live sample is run
//! through [`evaluate`], which returns the updated state together with the
//! alerts that fired. Side effects (sound, notification) are left to the
//! caller.
//!
//! The cooldown gate is shared by every zone: a fire from one zone closes
//! the gate for all of them, including zones evaluated later in the same
//! tick.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use spread::SpreadPoint;
use tracing::debug;

use crate::sink::normalize_sound_ref;
use crate::zone::AlertZone;

/// Maximum number of retained alert events.
pub const HISTORY_LIMIT: usize = 20;

/// Audit record of one fired alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub timestamp_ms: u64,
    pub spread_percent: f64,
    pub price_a: f64,
    pub price_b: f64,
}

/// Everything the alert engine remembers between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEngineState {
    /// Evaluated in insertion order.
    pub zones: Vec<AlertZone>,
    pub cooldown: Duration,
    /// Time of the last fired alert, shared across zones.
    pub last_alert_ms: Option<u64>,
    /// Most recent first, at most [`HISTORY_LIMIT`].
    pub history: VecDeque<AlertEvent>,
    pub sound_enabled: bool,
    pub notifications_enabled: bool,
}

impl Default for AlertEngineState {
    fn default() -> Self {
        Self::new(vec![AlertZone::above(1.0)], Duration::from_secs(10))
    }
}

impl AlertEngineState {
    pub fn new(zones: Vec<AlertZone>, cooldown: Duration) -> Self {
        Self {
            zones,
            cooldown,
            last_alert_ms: None,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            sound_enabled: true,
            notifications_enabled: false,
        }
    }

    fn gate_open(&self, now_ms: u64) -> bool {
        match self.last_alert_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.cooldown.as_millis() as u64,
        }
    }

    fn record(&mut self, event: AlertEvent) {
        self.history.push_front(event);
        self.history.truncate(HISTORY_LIMIT);
    }
}

/// One alert to deliver.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredAlert {
    pub zone_index: usize,
    pub event: AlertEvent,
    /// Normalised sound reference, `None` when sound is muted.
    pub sound: Option<String>,
    /// Notification body, `None` when notifications are off.
    pub notification: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub state: AlertEngineState,
    pub fired: Vec<FiredAlert>,
}

pub fn notification_text(spread_percent: f64) -> String {
    format!("Spread: {spread_percent:.3}%")
}

/// Evaluates every zone against `sample` at `now_ms`.
///
/// Zones are visited in order and each matching zone tries the shared
/// gate. The gate closes as soon as one zone fires, so with a non-zero
/// cooldown later matches in the same tick are suppressed.
pub fn evaluate(mut state: AlertEngineState, sample: &SpreadPoint, now_ms: u64) -> TickOutcome {
    let mut fired = Vec::new();
    let spread = sample.spread_percent;

    for idx in 0..state.zones.len() {
        if !state.zones[idx].matches(spread) {
            continue;
        }

        if !state.gate_open(now_ms) {
            debug!(zone = idx, spread_pct = spread, "zone matched but cooldown not met");
            continue;
        }

        let event = AlertEvent {
            timestamp_ms: now_ms,
            spread_percent: spread,
            price_a: sample.price_a,
            price_b: sample.price_b,
        };

        state.last_alert_ms = Some(now_ms);
        state.record(event);

        let zone = &state.zones[idx];
        debug!(zone = %zone, spread_pct = spread, "alert fired");

        fired.push(FiredAlert {
            zone_index: idx,
            event,
            sound: state
                .sound_enabled
                .then(|| normalize_sound_ref(zone.sound.as_deref())),
            notification: state.notifications_enabled.then(|| notification_text(spread)),
        });
    }

    TickOutcome { state, fired }
}
