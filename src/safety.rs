//! Danger evaluator.
//!
//! Maps one [`SensorSnapshot`] to a [`DangerVerdict`]: a binary safety
//! decision plus the set of conditions that triggered it.  The evaluator
//! holds only its thresholds, so the same snapshot always yields the same
//! verdict regardless of call order.
//!
//! ## Policy
//!
//! ```text
//! danger = (gas valid && gas > gas_threshold)
//!        | (flame valid && flame (analog: raw < danger_below, digital: HIGH))
//!        | (temperature valid && temperature > temperature_threshold)
//! ```
//!
//! An unavailable reading contributes nothing: it is neither danger nor
//! evidence of safety, and telemetry reports it as `null`.  Humidity is
//! reported but never evaluated.
//! There is no hysteresis; a single reading decides.

use core::fmt;

use log::warn;

use crate::app::snapshot::{FlameReading, SensorSnapshot};
use crate::config::DangerThresholds;

// ───────────────────────────────────────────────────────────────
// Causes
// ───────────────────────────────────────────────────────────────

/// A condition that contributes to a danger verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DangerCause {
    /// Combustible gas concentration above threshold.
    Gas = 0b001,
    /// Open flame detected.
    Flame = 0b010,
    /// Air temperature above threshold.
    Heat = 0b100,
}

impl DangerCause {
    pub const ALL: [DangerCause; 3] = [Self::Gas, Self::Flame, Self::Heat];

    /// Return the bitmask for this cause.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Short display name.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gas => "Gas",
            Self::Flame => "Flame",
            Self::Heat => "Heat",
        }
    }
}

impl fmt::Display for DangerCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Set of [`DangerCause`]s, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CauseSet(u8);

impl CauseSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, cause: DangerCause) {
        self.0 |= cause.mask();
    }

    pub fn contains(self, cause: DangerCause) -> bool {
        self.0 & cause.mask() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Causes in fixed order: Gas, Flame, Heat.
    pub fn iter(self) -> impl Iterator<Item = DangerCause> {
        DangerCause::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    /// Causes joined by `+`, e.g. `Gas+Heat`. Empty string when empty.
    pub fn summary(self) -> heapless::String<16> {
        let mut out = heapless::String::new();
        for (i, cause) in self.iter().enumerate() {
            if i > 0 {
                let _ = out.push('+');
            }
            let _ = out.push_str(cause.label());
        }
        out
    }
}

impl FromIterator<DangerCause> for CauseSet {
    fn from_iter<I: IntoIterator<Item = DangerCause>>(iter: I) -> Self {
        let mut set = Self::empty();
        for cause in iter {
            set.insert(cause);
        }
        set
    }
}

// ───────────────────────────────────────────────────────────────
// Verdict
// ───────────────────────────────────────────────────────────────

/// Status text reported when no cause is active.
pub const STATUS_ALL_SAFE: &str = "All Safe";

/// The safety decision for one snapshot.
///
/// `is_danger` is derived from `causes`, so "danger with no cause" and
/// "safe with a cause" cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DangerVerdict {
    causes: CauseSet,
}

impl DangerVerdict {
    pub const fn safe() -> Self {
        Self { causes: CauseSet::empty() }
    }

    pub fn from_causes(causes: CauseSet) -> Self {
        Self { causes }
    }

    pub fn is_danger(&self) -> bool {
        !self.causes.is_empty()
    }

    pub fn causes(&self) -> CauseSet {
        self.causes
    }

    /// Telemetry status: `All Safe` or `DANGER - <causes> - Door Open`.
    pub fn status_text(&self) -> heapless::String<40> {
        let mut out = heapless::String::new();
        if self.is_danger() {
            let _ = out.push_str("DANGER - ");
            let _ = out.push_str(&self.causes.summary());
            let _ = out.push_str(" - Door Open");
        } else {
            let _ = out.push_str(STATUS_ALL_SAFE);
        }
        out
    }
}

// ───────────────────────────────────────────────────────────────
// Evaluator
// ───────────────────────────────────────────────────────────────

/// Stateless threshold evaluator.
#[derive(Debug, Clone, Copy)]
pub struct DangerEvaluator {
    thresholds: DangerThresholds,
}

impl DangerEvaluator {
    pub fn new(thresholds: DangerThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &DangerThresholds {
        &self.thresholds
    }

    /// Evaluate one snapshot. Total: every input yields a verdict.
    pub fn evaluate(&self, snap: &SensorSnapshot) -> DangerVerdict {
        let mut causes = CauseSet::empty();

        if snap.gas_level.is_some_and(|gas| gas > self.thresholds.gas_threshold) {
            causes.insert(DangerCause::Gas);
        }

        if snap.flame.is_some_and(|reading| self.flame_danger(reading)) {
            causes.insert(DangerCause::Flame);
        }

        if let Some(t) = snap.temperature_c {
            if t > self.thresholds.temperature_threshold_c {
                causes.insert(DangerCause::Heat);
            }
        }

        DangerVerdict::from_causes(causes)
    }

    /// The configured mode alone decides how a reading is judged.  A
    /// reading taken in the other mode is not trusted either way.
    fn flame_danger(&self, reading: FlameReading) -> bool {
        use crate::config::FlameSensorKind;
        match (reading, self.thresholds.flame_sensor) {
            (FlameReading::Analog(raw), FlameSensorKind::Analog { danger_below }) => {
                raw < danger_below
            }
            (FlameReading::Digital(high), FlameSensorKind::Digital) => high,
            (reading, kind) => {
                warn!("Flame reading {:?} does not match configured {:?}; ignored", reading, kind);
                false
            }
        }
    }
}
