//! Measurement Processing Pipeline
//!
//! ## Overview
//!
//! Raw ILRT readings flow through a chain of synchronous stages. Every stage
//! subscribes to its predecessor's stream and publishes on its own, so a
//! single `publish` at the head runs the whole chain on the caller's stack.
//!
//! ```text
//! source ─▶ Believability ─▶ Calibration ─▶ AVG_PRESSURE ─▶ AVG_TEMPERATURE ─▶ AVG_R ─▶ LEAKAGE
//!                            (optional)
//! ```
//!
//! ## Module Organization
//!
//! - `stages` - believability filter and calibration
//! - `averages` - volume-weighted averages and the humid-air gas constant
//! - `leakage` - two-point leakage rate
//! - `stream` - wiring a [`VectorStage`](crate::traits::VectorStage) to streams
//! - `builder` - chain construction, [`FullChain`] and [`StackedChain`]

pub mod averages;
pub mod builder;
pub mod leakage;
pub mod stages;
pub mod stream;

pub use averages::{
    humid_air_gas_constant, saturation_pressure, AverageGasConstant, AveragePressure,
    AverageTemperature,
};
pub use builder::{Chain, ChainBuilder, FullChain, StackedChain};
pub use leakage::Leakage;
pub use stages::{BelievabilityFilter, Calibrator};
pub use stream::StageStream;
