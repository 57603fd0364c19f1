use std::time::{Duration, Instant};

/// Format a `Duration` with automatic unit scaling (`1.94ms`, `2.34s`).
pub fn fmt_duration(d: Duration) -> String {
    format!("{d:.2?}")
}

/// Warn when the request that started at `start` took longer than `threshold`.
pub fn log_if_slow(start: Instant, threshold: Duration, target: &str) {
    let elapsed = start.elapsed();
    if elapsed > threshold {
        tracing::warn!(
            target_url = target,
            duration = fmt_duration(elapsed),
            "Slow catalog request"
        );
    }
}
