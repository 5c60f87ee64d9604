//! Vector Processing Stage Trait
//!
//! ## Pipeline Architecture
//!
//! ```text
//! source ─▶ [Believability] ─▶ [Calibration] ─▶ [AvgPressure] ─▶ ... ─▶ [Leakage] ─▶ sink
//! ```
//!
//! Each stage maps one input vector to at most one output vector:
//! - Transform (1:1): calibration, believability filtering
//! - Enrich (1:1 or 1:0): the averages append one synthetic measurement, or
//!   publish nothing when the tick does not allow a result
//!
//! Stages are plain synchronous state machines. Wiring them to streams,
//! bypassing vectors flagged with a severe error, and teardown live in
//! [`StageStream`](crate::pipeline::StageStream), so none of that is repeated
//! per stage.

use crate::measurement::MeasurementVector;

/// One step of the measurement pipeline
///
/// ## Implementation Guidelines
///
/// 1. Never mutate the input; build a new vector
/// 2. Return `None` when the tick does not allow a result, never panic
/// 3. Keep cross-tick state minimal and clear it in [`reset`](Self::reset)
///
/// ## Example: Dropping Humidity Readings
///
/// ```rust
/// use ilrt_core::traits::VectorStage;
/// use ilrt_core::{MeasurementKind, MeasurementVector};
///
/// struct NoHumidity;
///
/// impl VectorStage for NoHumidity {
///     fn process(&mut self, vector: &MeasurementVector) -> Option<MeasurementVector> {
///         let kept = vector
///             .measurements()
///             .iter()
///             .filter(|m| m.kind() != MeasurementKind::Humidity)
///             .cloned();
///         Some(vector.with_measurements(kept))
///     }
///
///     fn name(&self) -> &'static str {
///         "NoHumidity"
///     }
/// }
/// ```
pub trait VectorStage: Send {
    /// Processes one tick.
    ///
    /// Never called with a vector that carries a severe error; those are
    /// forwarded unchanged by the enclosing stream.
    fn process(&mut self, vector: &MeasurementVector) -> Option<MeasurementVector>;

    /// Stage name for logs
    fn name(&self) -> &'static str;

    /// Forget any state carried between ticks
    fn reset(&mut self) {}
}
