//! Built-in per-measurement stages
//!
//! Both stages here are one-in, one-out: every input vector produces exactly
//! one output vector with the same timestamp and error list.
//!
//! - [`BelievabilityFilter`]: drops readings outside their sensor's range
//! - [`Calibrator`]: applies per-sensor linear calibration

use std::sync::Arc;

use crate::config::CalibrationConfig;
use crate::measurement::{Measurement, MeasurementVector};
use crate::traits::{SensorCatalog, VectorStage};

/// Drops measurements outside their sensor's configured valid range
///
/// Sensors that are unknown to the catalog, or whose range lacks a min or a
/// max, pass through. When a full range applies the check is closed on both
/// ends and a measurement without a value is dropped.
pub struct BelievabilityFilter {
    catalog: Arc<dyn SensorCatalog>,
}

impl BelievabilityFilter {
    pub fn new(catalog: Arc<dyn SensorCatalog>) -> Self {
        Self { catalog }
    }

    fn is_believable(&self, m: &Measurement) -> bool {
        match self.catalog.valid_range(m.source_id()).and_then(|r| r.bounds()) {
            None => true,
            Some((lo, hi)) => m.value().map_or(false, |v| lo <= v && v <= hi),
        }
    }
}

impl VectorStage for BelievabilityFilter {
    fn process(&mut self, vector: &MeasurementVector) -> Option<MeasurementVector> {
        let kept: Vec<Measurement> = vector
            .measurements()
            .iter()
            .filter(|m| {
                let keep = self.is_believable(m);
                if !keep {
                    log::debug!(
                        "Dropping unbelievable {} from {} at {}",
                        m,
                        m.source_id(),
                        vector.time_utc()
                    );
                }
                keep
            })
            .cloned()
            .collect();
        Some(vector.with_measurements(kept))
    }

    fn name(&self) -> &'static str {
        "BelievabilityFilter"
    }
}

/// Applies per-sensor linear calibration
///
/// Sensors without a calibration, and measurements whose calibrated value
/// cannot be computed, pass through unchanged.
pub struct Calibrator {
    config: CalibrationConfig,
}

impl Calibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    fn calibrate(&self, m: &Measurement) -> Measurement {
        let calibrated = self
            .config
            .calibration_for(m.source_id())
            .and_then(|cal| cal.calibrated_value(m.value()));
        match calibrated {
            Some(value) => m.with_new_value(Some(value)),
            None => m.clone(),
        }
    }
}

impl VectorStage for Calibrator {
    fn process(&mut self, vector: &MeasurementVector) -> Option<MeasurementVector> {
        let calibrated: Vec<Measurement> =
            vector.measurements().iter().map(|m| self.calibrate(m)).collect();
        Some(vector.with_measurements(calibrated))
    }

    fn name(&self) -> &'static str {
        "Calibrator"
    }
}
