//! Time-accurate replay of recorded ILRT measurements
//!
//! ## Overview
//!
//! Recorded test data is replayed onto an [`ilrt_core::stream::Stream`] at
//! the pace it was recorded, scaled by an adjustable speed factor, so the
//! processing chain can be exercised exactly as it would be by live
//! transmitters. Playback can be paused, resumed and sped up or slowed down
//! while running without losing items.
//!
//! ```no_run
//! use ilrt_core::config::SiteConfig;
//! use ilrt_core::pipeline::FullChain;
//! use ilrt_core::MeasurementVector;
//! use ilrt_playback::PlaybackScheduler;
//!
//! # fn recorded() -> Vec<MeasurementVector> { Vec::new() }
//! let scheduler = PlaybackScheduler::<MeasurementVector>::new()?;
//! let chain = FullChain::new(SiteConfig::new("site"), None, scheduler.stream());
//!
//! scheduler.set_speed(60.0)?;
//! scheduler.start_playback(recorded(), 1_714_550_400_000)?;
//! // ...
//! chain.stop();
//! scheduler.shutdown();
//! # Ok::<(), ilrt_core::IlrtError>(())
//! ```
//!
//! ## Threading
//!
//! Each scheduler owns a tokio runtime with a single worker thread.
//! Subscribers run on that worker, one item at a time, in recording order.

#![deny(unsafe_code)]

pub mod scheduler;

pub use scheduler::{PlaybackConfig, PlaybackItem, PlaybackScheduler, TimestampMode};

/// Scheduler replaying whole measurement vectors
pub type VectorPlayback = PlaybackScheduler<ilrt_core::MeasurementVector>;

/// Scheduler replaying single measurements
pub type MeasurementPlayback = PlaybackScheduler<ilrt_core::Measurement>;
