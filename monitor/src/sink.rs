//! Alert delivery.
//!
//! Sinks are fire-and-forget: a failing sink is logged and never stops the
//! monitor loop.

use tracing::{info, warn};

use crate::engine::FiredAlert;
use crate::errors::SinkError;

pub const DEFAULT_SOUND: &str =
    "https://tiengdong.com/wp-content/uploads/am-thanh-wow-www_tiengdong_com.mp3";

pub const NOTIFICATION_TITLE: &str = "Spread Alert! 🚨";

/// External sound/notification output.
pub trait AlertSink: Send + Sync {
    fn play_sound(&self, sound: &str) -> Result<(), SinkError>;

    fn notify(&self, title: &str, body: &str) -> Result<(), SinkError>;
}

/// Trims, falls back to [`DEFAULT_SOUND`] when empty and adds `https://`
/// to scheme-less references.
pub fn normalize_sound_ref(raw: Option<&str>) -> String {
    let sound = raw.map(str::trim).unwrap_or_default();
    if sound.is_empty() {
        return DEFAULT_SOUND.to_string();
    }
    if sound.starts_with("http://") || sound.starts_with("https://") {
        return sound.to_string();
    }
    format!("https://{}", sound.trim_start_matches('/'))
}

/// Hands one fired alert to `sink`.
///
/// A failed sound is retried once with [`DEFAULT_SOUND`] (unless that was
/// the sound that failed), then dropped.
pub fn deliver(sink: &dyn AlertSink, alert: &FiredAlert) {
    if let Some(sound) = &alert.sound {
        if let Err(e) = sink.play_sound(sound) {
            warn!(error = %e, sound = %sound, "alert sound failed");
            if sound != DEFAULT_SOUND {
                if let Err(e) = sink.play_sound(DEFAULT_SOUND) {
                    warn!(error = %e, "default alert sound failed; giving up");
                }
            }
        }
    }

    if let Some(body) = &alert.notification {
        if let Err(e) = sink.notify(NOTIFICATION_TITLE, body) {
            warn!(error = %e, "alert notification failed");
        }
    }
}

/// Sink that only writes structured log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn play_sound(&self, sound: &str) -> Result<(), SinkError> {
        info!(target: "alerts", sound = %sound, "🔔 play alert sound");
        Ok(())
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), SinkError> {
        info!(target: "alerts", title = %title, body = %body, "notification");
        Ok(())
    }
}
