use std::time::Instant;

/// Wall-clock timer for one table's alteration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds with sub-millisecond precision.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Format a duration in milliseconds for display.
pub fn format_ms(ms: f64) -> String {
    format!("{:.3} ms", ms)
}
