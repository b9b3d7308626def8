//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces one [`SensorSnapshot`]
//! per control cycle.

pub mod climate;
pub mod flame;
pub mod gas;

use log::warn;

use crate::app::snapshot::SensorSnapshot;
use climate::{ClimateReading, Dht11};
use flame::FlameSensor;
use gas::GasSensor;

/// Aggregates all sensor drivers and produces a unified snapshot.
pub struct SensorHub {
    pub gas: GasSensor,
    pub flame: FlameSensor,
    pub climate: Dht11,
}

impl SensorHub {
    /// Construct a new hub.  Pass in pre-built drivers (built in main
    /// where peripheral ownership is established).
    pub fn new(gas: GasSensor, flame: FlameSensor, climate: Dht11) -> Self {
        Self { gas, flame, climate }
    }

    /// Read every sensor and return a unified snapshot.
    ///
    /// Any reading that fails this cycle is unavailable in the snapshot.
    pub fn read_all(&mut self, timestamp_ms: u64) -> SensorSnapshot {
        let gas_level = self
            .gas
            .read()
            .inspect_err(|e| warn!("Gas sensor: {}", e))
            .ok();

        let flame = self
            .flame
            .read()
            .inspect_err(|e| warn!("Flame sensor: {}", e))
            .ok();

        let climate = self.climate.read().unwrap_or_else(|e| {
            warn!("DHT11: {}", e);
            ClimateReading::UNAVAILABLE
        });

        SensorSnapshot {
            gas_level,
            flame,
            temperature_c: climate.temperature_c,
            humidity_pct: climate.humidity_pct,
            timestamp_ms,
        }
    }
}
