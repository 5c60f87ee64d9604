//! Shared fixtures for the integration tests
//!
//! - A small two-location site loaded from JSON the way an external loader
//!   would hand it over
//! - Tick builders producing realistic ILRT readings
//! - A collecting subscriber

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use ilrt_core::config::{CalibrationConfig, SiteConfig};
use ilrt_core::stream::VectorStream;
use ilrt_core::{Measurement, MeasurementVector};
use rust_decimal::Decimal;

pub mod harness;

/// One hour in milliseconds
pub const HOUR_MS: i64 = 3_600_000;

/// 2024-05-01T08:00:00Z
pub const TEST_START: i64 = 1_714_550_400_000;

/// Two locations, volume factors 0.6 and 0.4. `T_B1` has no humidity
/// partner; `H_A1` pairs with `T_A1`.
pub const SITE_JSON: &str = r#"{
    "id": "UNIT_1",
    "description": "Reactor containment",
    "containment": { "netVolume_m3": "51000" },
    "locations": [
        {
            "id": "DOME",
            "volumeFactor": "0.6",
            "sensors": [
                { "id": "P_A1", "type": "pressure", "units": "Pa", "validRange": { "min": "80000", "max": "600000" } },
                { "id": "T_A1", "type": "temperature", "units": "C", "validRange": { "min": "0", "max": "80" } },
                { "id": "T_A2", "type": "temperature", "units": "C", "validRange": { "min": "0", "max": "80" } },
                { "id": "H_A1", "type": "humidity", "units": "%", "validRange": { "min": "0", "max": "100" } }
            ]
        },
        {
            "id": "ANNULUS",
            "volumeFactor": "0.4",
            "sensors": [
                { "id": "P_B1", "type": "pressure", "units": "Pa" },
                { "id": "T_B1", "type": "temperature", "units": "C" }
            ]
        }
    ]
}"#;

pub const CALIBRATION_JSON: &str = r#"{
    "sensorCalibrations": {
        "T_A1": { "A": "1.0", "B": "0.5" },
        "P_B1": { "B": "-25" }
    }
}"#;

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn site() -> SiteConfig {
    serde_json::from_str(SITE_JSON).unwrap()
}

pub fn calibration() -> CalibrationConfig {
    serde_json::from_str(CALIBRATION_JSON).unwrap()
}

/// A full set of readings for the fixture site
pub fn site_tick(t: i64, pressure: &str) -> MeasurementVector {
    MeasurementVector::new(
        t,
        vec![
            Measurement::pressure(t, "P_A1", Some(d(pressure))),
            Measurement::pressure(t, "P_B1", Some(d(pressure))),
            Measurement::temperature(t, "T_A1", Some(d("20.0"))),
            Measurement::temperature(t, "T_A2", Some(d("21.0"))),
            Measurement::temperature(t, "T_B1", Some(d("19.5"))),
            Measurement::humidity(t, "H_A1", Some(d("50"))),
        ],
    )
}

/// Single-location readings: one sensor of each type, volume factor 1
pub fn minimal_tick(t: i64, pressure: &str) -> MeasurementVector {
    MeasurementVector::new(
        t,
        vec![
            Measurement::pressure(t, "P1", Some(d(pressure))),
            Measurement::temperature(t, "T1", Some(d("20"))),
            Measurement::humidity(t, "H1", Some(d("50"))),
        ],
    )
}

pub fn minimal_site() -> SiteConfig {
    serde_json::from_str(
        r#"{
            "id": "MINI",
            "locations": [{
                "id": "ROOM",
                "volumeFactor": "1.0",
                "sensors": [
                    { "id": "P1", "type": "pressure" },
                    { "id": "T1", "type": "temperature" },
                    { "id": "H1", "type": "humidity" }
                ]
            }]
        }"#,
    )
    .unwrap()
}

/// Subscribes a collector to `stream`
pub fn collect(stream: &VectorStream) -> Arc<Mutex<Vec<MeasurementVector>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    stream.subscribe(move |v: &MeasurementVector| {
        sink.lock().unwrap().push(v.clone());
        Ok(())
    });
    seen
}

pub fn value_of(vector: &MeasurementVector, source_id: &str) -> Option<Decimal> {
    vector.get(source_id).and_then(Measurement::value)
}
