//! Local display text.
//!
//! Renders the latest snapshot and verdict into the two 16-column lines the
//! [`StatusSink`](super::ports::StatusSink) shows.  Unavailable readings
//! render as dashes.

use core::fmt::Write as _;

use crate::safety::DangerVerdict;

use super::snapshot::SensorSnapshot;

/// Display width in characters.
pub const LINE_WIDTH: usize = 16;

pub type StatusLine = heapless::String<LINE_WIDTH>;

/// Two-line rendering of one cycle.
pub fn render_lines(snapshot: &SensorSnapshot, verdict: &DangerVerdict) -> (StatusLine, StatusLine) {
    let mut line1 = StatusLine::new();
    let mut line2 = StatusLine::new();

    if verdict.is_danger() {
        let _ = line1.push_str("DANGER! EVACUATE");
        for (i, cause) in verdict.causes().iter().enumerate() {
            if i > 0 {
                let _ = line2.push(' ');
            }
            let _ = line2.push_str(cause.label());
        }
        return (line1, line2);
    }

    let _ = line1.push_str("T:");
    let _ = match snapshot.temperature_c {
        Some(t) => write!(line1, "{:.1}", t),
        None => line1.write_str("--.-"),
    };
    let _ = line1.push_str("C H:");
    let _ = match snapshot.humidity_pct {
        Some(h) => write!(line1, "{:.0}", h),
        None => line1.write_str("--"),
    };
    let _ = line1.push('%');

    let _ = match snapshot.gas_level {
        Some(g) => write!(line2, "G:{}", g),
        None => line2.write_str("G:--"),
    };
    let _ = line2.write_str(if snapshot.flame.is_some() { " F:Safe" } else { " F:--" });
    (line1, line2)
}
