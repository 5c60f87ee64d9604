//! Read-only sensor metadata lookup
//!
//! Stages never see the raw site configuration. They ask a catalog, and
//! every question about an unknown sensor has a harmless answer: no range,
//! unit volume factor, no paired temperature.

use rust_decimal::Decimal;

use crate::config::{SensorConfig, ValidRange};

/// Per-sensor configuration as seen by the pipeline
pub trait SensorCatalog: Send + Sync {
    /// Believability range of a sensor, if one is configured
    fn valid_range(&self, sensor_id: &str) -> Option<ValidRange>;

    /// Volume factor of the location holding the sensor.
    ///
    /// Returns 1 for unknown sensors and for locations without a factor.
    fn volume_factor(&self, sensor_id: &str) -> Decimal;

    /// Temperature sensor whose reading accompanies a humidity sensor
    fn paired_temperature(&self, humidity_id: &str) -> Option<&str>;

    /// All configured sensors, in site order
    fn sensors(&self) -> Vec<SensorConfig>;
}
