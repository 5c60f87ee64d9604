//! Per-sensor linear calibration

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `calibrated = A · measured + B`
///
/// A missing `A` acts as 1 and a missing `B` as 0, so an empty calibration
/// is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearCalibration {
    #[serde(rename = "A", default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Decimal>,
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    pub b: Option<Decimal>,
}

impl LinearCalibration {
    pub fn new(a: Option<Decimal>, b: Option<Decimal>) -> Self {
        Self { a, b }
    }

    /// Applies the calibration; a missing measured value stays missing.
    pub fn calibrated_value(&self, measured: Option<Decimal>) -> Option<Decimal> {
        let measured = measured?;
        let a = self.a.unwrap_or(Decimal::ONE);
        let b = self.b.unwrap_or(Decimal::ZERO);
        a.checked_mul(measured)?.checked_add(b)
    }
}

/// Calibrations keyed by sensor id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationConfig {
    #[serde(default)]
    pub sensor_calibrations: BTreeMap<String, LinearCalibration>,
}

impl CalibrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calibration(mut self, sensor_id: impl Into<String>, calibration: LinearCalibration) -> Self {
        self.sensor_calibrations.insert(sensor_id.into(), calibration);
        self
    }

    pub fn calibration_for(&self, sensor_id: &str) -> Option<&LinearCalibration> {
        self.sensor_calibrations.get(sensor_id)
    }
}
