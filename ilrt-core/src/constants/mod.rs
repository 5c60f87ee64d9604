//! Constants for the ILRT Pipeline
//!
//! ## Organization
//!
//! - **Physics**: unit conversions, Antoine coefficients, gas constants and
//!   the leakage reference state
//! - **Precision**: decimal context shared by the averaging stages
//! - **Source ids**: reserved ids of the synthetic measurements the stages
//!   append to each vector

use rust_decimal::{Decimal, RoundingStrategy};

/// Physical constants used by the averaging and leakage stages.
pub mod physics;

/// Significant digits kept by intermediate decimal results.
pub const SIGNIFICANT_DIGITS: u32 = 16;

/// Decimal places of the published average pressure.
pub const AVERAGE_PRESSURE_SCALE: u32 = 10;

/// Decimal places of the published leakage rate.
pub const LEAKAGE_SCALE: u32 = 6;

/// Half-up rounding, applied everywhere a decimal result is rounded.
pub const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Source id of the synthetic average pressure measurement.
pub const AVG_PRESSURE_SOURCE_ID: &str = "AVG_PRESSURE";

/// Source id of the synthetic average temperature measurement.
pub const AVG_TEMPERATURE_SOURCE_ID: &str = "AVG_TEMPERATURE";

/// Source id of the synthetic average gas constant measurement.
pub const AVG_GAS_CONSTANT_SOURCE_ID: &str = "AVG_R";

/// Source id of the synthetic leakage measurement.
pub const LEAKAGE_SOURCE_ID: &str = "LEAKAGE";

/// Rounds to the shared significant-digit context.
///
/// Values whose rounded form would overflow are returned unchanged.
pub fn round_significant(value: Decimal) -> Decimal {
    value
        .round_sf_with_strategy(SIGNIFICANT_DIGITS, ROUNDING)
        .unwrap_or(value)
}
