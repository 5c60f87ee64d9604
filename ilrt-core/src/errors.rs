//! Error Types for Measurement Construction and Playback Control
//!
//! ## Error Categories
//!
//! The pipeline distinguishes between failures that belong to the caller and
//! situations that are simply "not computable yet":
//!
//! ### Construction Errors
//! - `InvalidUnit`: a measurement was built with a unit its kind does not accept
//! - `ConversionOverflow`: the value does not fit once converted to the canonical unit
//! - `InvalidSpeed`: a playback speed factor was zero, negative, NaN or infinite
//!
//! ### Playback Errors
//! - `PlaybackActive`: a second session was started while one is running
//! - `EmptyPlayback`: nothing to replay
//! - `RuntimeUnavailable` / `Runtime`: the worker is gone or never came up
//!
//! Computation infeasibility (missing averages, zero denominators, densities
//! below the reference state) is *not* an error. Stages omit their output for
//! that tick instead. Per-vector domain problems travel as data in
//! [`MeasurementError`](crate::measurement::MeasurementError).
//!
//! ```rust
//! use ilrt_core::{IlrtError, Measurement};
//!
//! let err = Measurement::pressure_in(0, "P1", Some(1.into()), "psi").unwrap_err();
//! assert!(matches!(err, IlrtError::InvalidUnit { .. }));
//! ```

use thiserror::Error;

use crate::measurement::MeasurementKind;

/// Result type for fallible ILRT operations
pub type IlrtResult<T> = Result<T, IlrtError>;

/// Errors raised to the caller. Never produced from inside a stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IlrtError {
    /// Unit string not accepted for the measurement kind
    #[error("Unit '{unit}' is not valid for {kind} measurements")]
    InvalidUnit {
        /// The measurement kind being constructed
        kind: MeasurementKind,
        /// The rejected unit string
        unit: String,
    },

    /// Value overflows when converted to the canonical unit
    #[error("Value in '{unit}' overflows when converted for {kind} measurements")]
    ConversionOverflow {
        /// The measurement kind being constructed
        kind: MeasurementKind,
        /// The unit the value was given in
        unit: String,
    },

    /// Playback speed factor must be positive and finite
    #[error("Speed factor must be positive and finite, got {0}")]
    InvalidSpeed(f64),

    /// A playback session is already running
    #[error("Playback already active")]
    PlaybackActive,

    /// Playback was started with no items
    #[error("Playback sequence must not be empty")]
    EmptyPlayback,

    /// The playback worker has been shut down
    #[error("Playback runtime has been shut down")]
    RuntimeUnavailable,

    /// The playback worker could not be created
    #[error("Playback runtime error: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = IlrtError::InvalidUnit {
            kind: MeasurementKind::Temperature,
            unit: "F".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unit 'F' is not valid for Temperature measurements"
        );
        assert_eq!(
            IlrtError::InvalidSpeed(-1.0).to_string(),
            "Speed factor must be positive and finite, got -1"
        );
    }
}
