//! Measurement vectors
//!
//! A vector is the unit of work of every pipeline stage: all readings that
//! belong to one logical sampling instant, plus any domain errors raised
//! while they were collected. Vectors are immutable. A stage that "changes"
//! a vector builds a new one.

use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Measurement, MeasurementKind};

/// How bad a [`MeasurementError`] is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Informational; stages keep computing
    Warning,
    /// The vector is unusable; stages pass it through untouched
    Severe,
}

/// Domain error carried alongside the measurements of a vector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasurementError {
    sensor_id: String,
    severity: ErrorSeverity,
    message: String,
}

impl MeasurementError {
    pub fn new(sensor_id: impl Into<String>, severity: ErrorSeverity, message: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            severity,
            message: message.into(),
        }
    }

    pub fn warning(sensor_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(sensor_id, ErrorSeverity::Warning, message)
    }

    pub fn severe(sensor_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(sensor_id, ErrorSeverity::Severe, message)
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MeasurementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.sensor_id, self.message)
    }
}

/// Timestamped, immutable bundle of measurements keyed by source id
///
/// Duplicate source ids collapse: the last measurement supplied for an id
/// wins and keeps the slot of the first occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementVector {
    time_utc: i64,
    measurements: Vec<Measurement>,
    index: HashMap<String, usize>,
    errors: Vec<MeasurementError>,
}

impl MeasurementVector {
    /// Vector without errors
    pub fn new(time_utc: i64, measurements: impl IntoIterator<Item = Measurement>) -> Self {
        Self::with_errors(time_utc, measurements, Vec::new())
    }

    /// Vector carrying domain errors
    pub fn with_errors(
        time_utc: i64,
        measurements: impl IntoIterator<Item = Measurement>,
        errors: Vec<MeasurementError>,
    ) -> Self {
        let mut list: Vec<Measurement> = Vec::new();
        let mut index = HashMap::new();
        for m in measurements {
            let existing = index.get(m.source_id()).copied();
            match existing {
                Some(slot) => list[slot] = m,
                None => {
                    index.insert(m.source_id().to_string(), list.len());
                    list.push(m);
                }
            }
        }

        Self {
            time_utc,
            measurements: list,
            index,
            errors,
        }
    }

    /// Logical sampling instant of the whole vector
    pub fn time_utc(&self) -> i64 {
        self.time_utc
    }

    /// Measurements in first-insertion order
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn errors(&self) -> &[MeasurementError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Measurement reported by `source_id`, if any
    pub fn get(&self, source_id: &str) -> Option<&Measurement> {
        self.index.get(source_id).map(|&slot| &self.measurements[slot])
    }

    /// Measurement reported by `source_id`, only if it is of `kind`
    pub fn get_kind(&self, source_id: &str, kind: MeasurementKind) -> Option<&Measurement> {
        self.get(source_id).filter(|m| m.kind() == kind)
    }

    /// All measurements of one kind
    pub fn of_kind(&self, kind: MeasurementKind) -> impl Iterator<Item = &Measurement> {
        self.measurements.iter().filter(move |m| m.kind() == kind)
    }

    pub fn has_severe_error(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.severity() == ErrorSeverity::Severe)
    }

    /// Copy of this vector with one more measurement appended.
    pub fn with_measurement(&self, measurement: Measurement) -> Self {
        let measurements = self.measurements.iter().cloned().chain(Some(measurement));
        Self::with_errors(self.time_utc, measurements, self.errors.clone())
    }

    /// Copy of this vector with its measurements replaced; time and errors kept.
    pub fn with_measurements(&self, measurements: impl IntoIterator<Item = Measurement>) -> Self {
        Self::with_errors(self.time_utc, measurements, self.errors.clone())
    }

    /// Copy of this vector moved by `delta_ms`, measurements included.
    pub fn shifted_by(&self, delta_ms: i64) -> Self {
        let measurements = self
            .measurements
            .iter()
            .map(|m| m.with_new_timestamp(m.time_utc().saturating_add(delta_ms)));
        Self::with_errors(
            self.time_utc.saturating_add(delta_ms),
            measurements,
            self.errors.clone(),
        )
    }
}
