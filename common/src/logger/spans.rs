use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};

use super::TraceId;

/// Create a root span for an analysis run or a monitor tick.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id.as_str(),
        pair = field::Empty
    )
}

/// Create a child span (inherits trace_id from the enclosing root).
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name, pair = field::Empty)
}

/// Records the monitored pair on the current span.
pub fn annotate_span(pair: &str) {
    Span::current().record("pair", field::display(pair));
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
