//! Core traits for the ILRT pipeline
//!
//! - [`VectorStage`]: one processing step, wrapped into a stream by the
//!   pipeline module
//! - [`SensorCatalog`]: read-only configuration lookup shared by the stages

pub mod catalog;
pub mod stage;

pub use catalog::SensorCatalog;
pub use stage::VectorStage;
