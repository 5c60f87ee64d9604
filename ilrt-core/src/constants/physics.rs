//! Physical Constants for Leak Rate Evaluation
//!
//! Every constant used by the averaging and leakage stages is defined here as
//! an exact decimal so that the arithmetic downstream never round-trips
//! through binary floating point (the Antoine power-of-ten step excepted).

use rust_decimal::Decimal;

// ===== UNIT CONVERSION =====

/// Offset between the Celsius and Kelvin scales (K).
///
/// T[K] = T[°C] + 273.15
///
/// Source: SI Brochure, 9th edition
pub const CELSIUS_TO_KELVIN: Decimal = Decimal::from_parts(27315, 0, 0, false, 2);

/// Pascals in one bar (Pa/bar).
pub const PASCALS_PER_BAR: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Pascals in one kilopascal (Pa/kPa).
pub const PASCALS_PER_KILOPASCAL: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

// ===== SATURATION VAPOUR PRESSURE =====

/// Antoine coefficient A for water, T in °C, P in Pa.
///
/// log10(P_sat) = A − B / (T + C)
///
/// The coefficient set matches the one used by the containment test
/// evaluation procedure and is valid between 0 °C and 100 °C.
pub const ANTOINE_A: Decimal = Decimal::from_parts(620_963, 0, 0, false, 5);

/// Antoine coefficient B for water (°C).
pub const ANTOINE_B: Decimal = Decimal::from_parts(2_354_731, 0, 0, false, 3);

/// Antoine coefficient C for water (°C).
///
/// The equation is singular at T = −C.
pub const ANTOINE_C: Decimal = Decimal::from_parts(7_559, 0, 0, false, 3);

// ===== SPECIFIC GAS CONSTANTS =====

/// Specific gas constant of dry air, R_L (Nm/(kg·K)).
pub const GAS_CONSTANT_DRY_AIR: Decimal = Decimal::from_parts(2_869, 0, 0, false, 1);

/// Specific gas constant of water vapour, R_G (Nm/(kg·K)).
pub const GAS_CONSTANT_WATER_VAPOUR: Decimal = Decimal::from_parts(4_607, 0, 0, false, 1);

// ===== LEAKAGE REGRESSION =====

/// Reference density ρ∞ (kg/m³) near 0.1 MPa and 300 K.
///
/// Densities at or below this value cannot be told apart from the reference
/// state and produce no leakage estimate.
pub const REFERENCE_DENSITY: Decimal = Decimal::from_parts(116_144, 0, 0, false, 5);

/// Conversion of a per-second regression slope to v/v%/d.
///
/// 86400 s/day × 100 %
pub const LEAKAGE_RATE_FACTOR: Decimal = Decimal::from_parts(8_640_000, 0, 0, false, 0);

/// Leakage value published on the first usable tick, before any slope exists.
pub const LEAKAGE_SENTINEL: Decimal = Decimal::NEGATIVE_ONE;

// ===== CREDIBLE RANGES =====

/// Lowest air temperature entering the averages (°C).
pub const CREDIBLE_TEMPERATURE_MIN_C: Decimal = Decimal::ZERO;

/// Highest air temperature entering the averages (°C).
pub const CREDIBLE_TEMPERATURE_MAX_C: Decimal = Decimal::ONE_HUNDRED;

/// Lowest relative humidity entering the gas constant (%).
pub const CREDIBLE_HUMIDITY_MIN_PERCENT: Decimal = Decimal::ZERO;

/// Highest relative humidity entering the gas constant (%).
pub const CREDIBLE_HUMIDITY_MAX_PERCENT: Decimal = Decimal::ONE_HUNDRED;
