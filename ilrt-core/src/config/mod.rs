//! Site and calibration configuration
//!
//! Plain serde data types describing the containment being tested: its
//! locations (each with a volume factor) and the sensors installed in them.
//! Reading and writing the JSON files is left to the caller; the pipeline
//! only consumes these types through the [`SensorCatalog`] view built by
//! [`SiteCatalog`].
//!
//! ```rust
//! use ilrt_core::config::SiteConfig;
//!
//! let json = r#"{
//!     "id": "BLOCK_2",
//!     "locations": [{
//!         "id": "A301",
//!         "volumeFactor": "0.25",
//!         "sensors": [
//!             { "id": "T1", "type": "temperature", "validRange": { "min": "0", "max": "80" } },
//!             { "id": "H1", "type": "humidity" }
//!         ]
//!     }]
//! }"#;
//! let site: SiteConfig = serde_json::from_str(json).unwrap();
//! assert_eq!(site.sensors().count(), 2);
//! ```
//!
//! [`SensorCatalog`]: crate::traits::SensorCatalog

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod calibration;
pub mod catalog;

pub use calibration::{CalibrationConfig, LinearCalibration};
pub use catalog::SiteCatalog;

/// Inclusive believability range of a sensor, in its canonical unit
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidRange {
    #[serde(default)]
    pub min: Option<Decimal>,
    #[serde(default)]
    pub max: Option<Decimal>,
}

impl ValidRange {
    pub fn new(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self { min, max }
    }

    /// Both ends, or `None` when either is unset
    pub fn bounds(&self) -> Option<(Decimal, Decimal)> {
        Some((self.min?, self.max?))
    }

    /// `min ≤ value ≤ max`. A range missing either end accepts everything.
    pub fn contains(&self, value: Decimal) -> bool {
        self.bounds().map_or(true, |(lo, hi)| lo <= value && value <= hi)
    }
}

/// Physical quantity a configured sensor reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Pressure,
    Temperature,
    Humidity,
}

/// One installed sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub sensor_type: SensorType,
    /// Filled in from the enclosing location when the site is indexed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_range: Option<ValidRange>,
}

impl SensorConfig {
    pub fn new(id: impl Into<String>, sensor_type: SensorType) -> Self {
        Self {
            id: id.into(),
            sensor_type,
            location_id: None,
            units: None,
            sigma: None,
            description: None,
            valid_range: None,
        }
    }

    pub fn with_valid_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.valid_range = Some(ValidRange::new(min, max));
        self
    }
}

/// A region of the containment and the sensors placed in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationConfig {
    pub id: String,
    /// Share of the free volume represented by this location; 1 when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_factor: Option<Decimal>,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

impl LocationConfig {
    pub fn new(id: impl Into<String>, volume_factor: Option<Decimal>) -> Self {
        Self {
            id: id.into(),
            volume_factor,
            sensors: Vec::new(),
        }
    }

    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensors.push(sensor);
        self
    }
}

/// Net free volume of the containment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Containment {
    #[serde(rename = "netVolume_m3")]
    pub net_volume_m3: Decimal,
}

/// Whole-site description
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containment: Option<Containment>,
    #[serde(default)]
    pub locations: Vec<LocationConfig>,
}

impl SiteConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: LocationConfig) -> Self {
        self.locations.push(location);
        self
    }

    /// Every sensor of every location, in site order
    pub fn sensors(&self) -> impl Iterator<Item = &SensorConfig> {
        self.locations.iter().flat_map(|loc| loc.sensors.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn valid_range_needs_both_ends() {
        let full = ValidRange::new(Some(d("10")), Some(d("20")));
        assert_eq!(full.bounds(), Some((d("10"), d("20"))));
        assert!(full.contains(d("10")));
        assert!(full.contains(d("20")));
        assert!(!full.contains(d("9.999")));
        assert!(!full.contains(d("20.001")));

        let lower_only = ValidRange::new(Some(d("10")), None);
        assert_eq!(lower_only.bounds(), None);
        assert!(lower_only.contains(d("-5")));
        assert!(ValidRange::new(None, Some(d("10"))).contains(d("1000000")));
        assert!(ValidRange::default().contains(d("-1000")));
    }

    #[test]
    fn sensors_flatten_in_site_order() {
        let site = SiteConfig::new("S")
            .with_location(
                LocationConfig::new("L1", None)
                    .with_sensor(SensorConfig::new("P1", SensorType::Pressure))
                    .with_sensor(SensorConfig::new("T1", SensorType::Temperature)),
            )
            .with_location(
                LocationConfig::new("L2", Some(d("2")))
                    .with_sensor(SensorConfig::new("H2", SensorType::Humidity)),
            );
        let ids: Vec<&str> = site.sensors().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "T1", "H2"]);
    }

    #[test]
    fn sensor_config_reads_camel_case_json() {
        let json = r#"{
            "id": "T24",
            "locationId": "A301",
            "type": "temperature",
            "units": "C",
            "sigma": 0.1,
            "validRange": { "min": 5, "max": 80 }
        }"#;
        let sensor: SensorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(sensor.sensor_type, SensorType::Temperature);
        assert_eq!(sensor.location_id.as_deref(), Some("A301"));
        assert_eq!(sensor.valid_range.and_then(|r| r.max), Some(d("80")));
        assert_eq!(sensor.sigma, Some(d("0.1")));
    }
}
