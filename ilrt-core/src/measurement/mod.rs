//! Measurement Model
//!
//! ## Overview
//!
//! A [`Measurement`] is one immutable reading from one source at one instant.
//! The set of physical quantities is closed, so the kind is an enum rather
//! than a trait object and every stage matches on it exhaustively:
//!
//! | Kind          | Canonical unit | Also accepted   |
//! |---------------|----------------|-----------------|
//! | `Pressure`    | `Pa`           | `bar`, `kPa`    |
//! | `Temperature` | `C`            | `K`             |
//! | `Humidity`    | `%`            |                 |
//! | `GasConstant` | `Nm/(kg*K)`    |                 |
//! | `Leakage`     | `v/v%/d`       |                 |
//!
//! The value is always stored in the canonical unit. Conversion happens once,
//! at construction, and an unknown unit is an error rather than a guess.
//!
//! ```rust
//! use ilrt_core::{Measurement, MeasurementKind};
//! use rust_decimal::Decimal;
//!
//! let p = Measurement::pressure_in(1_000, "P1", Some(Decimal::new(101325, 5)), "bar")?;
//! assert_eq!(p.kind(), MeasurementKind::Pressure);
//! assert_eq!(p.value(), Some(Decimal::from(101325)));
//!
//! let later = p.with_new_timestamp(2_000);
//! assert_eq!(later.time_utc(), 2_000);
//! assert_eq!(p.time_utc(), 1_000);
//! # Ok::<(), ilrt_core::IlrtError>(())
//! ```
//!
//! Values are optional: a source may report a reading it could not produce,
//! and a calibration applied to a missing value yields a missing value.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::physics::{CELSIUS_TO_KELVIN, PASCALS_PER_BAR, PASCALS_PER_KILOPASCAL};
use crate::errors::IlrtResult;

pub mod units;
pub mod vector;

pub use vector::{ErrorSeverity, MeasurementError, MeasurementVector};

/// Physical quantity carried by a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeasurementKind {
    /// Absolute pressure
    Pressure,
    /// Air temperature
    Temperature,
    /// Relative humidity
    Humidity,
    /// Specific gas constant of humid air
    GasConstant,
    /// Leakage rate
    Leakage,
}

impl MeasurementKind {
    /// Every kind, in declaration order
    pub const ALL: [MeasurementKind; 5] = [
        MeasurementKind::Pressure,
        MeasurementKind::Temperature,
        MeasurementKind::Humidity,
        MeasurementKind::GasConstant,
        MeasurementKind::Leakage,
    ];

    /// Unit the value of this kind is stored in
    pub const fn default_unit(self) -> &'static str {
        units::canonical_unit(self)
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeasurementKind::Pressure => "Pressure",
            MeasurementKind::Temperature => "Temperature",
            MeasurementKind::Humidity => "Humidity",
            MeasurementKind::GasConstant => "GasConstant",
            MeasurementKind::Leakage => "Leakage",
        };
        f.write_str(name)
    }
}

/// One immutable sensor reading or derived quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    kind: MeasurementKind,
    time_utc: i64,
    source_id: String,
    value: Option<Decimal>,
    #[serde(default)]
    source_sigma: Option<Decimal>,
    #[serde(default)]
    lower_bound: Option<Decimal>,
    #[serde(default)]
    upper_bound: Option<Decimal>,
}

impl Measurement {
    /// Creates a measurement whose value is already in the canonical unit.
    pub fn new(
        kind: MeasurementKind,
        time_utc: i64,
        source_id: impl Into<String>,
        value: Option<Decimal>,
    ) -> Self {
        Self {
            kind,
            time_utc,
            source_id: source_id.into(),
            value,
            source_sigma: None,
            lower_bound: None,
            upper_bound: None,
        }
    }

    /// Creates a measurement from a value given in `unit`.
    ///
    /// Fails with [`IlrtError::InvalidUnit`](crate::IlrtError::InvalidUnit)
    /// when `unit` is not accepted for `kind`, even if the value is missing.
    pub fn with_unit(
        kind: MeasurementKind,
        time_utc: i64,
        source_id: impl Into<String>,
        value: Option<Decimal>,
        unit: &str,
    ) -> IlrtResult<Self> {
        let canonical = match value {
            Some(v) => Some(units::to_canonical(kind, v, unit)?),
            None => {
                units::to_canonical(kind, Decimal::ZERO, unit)?;
                None
            }
        };
        Ok(Self::new(kind, time_utc, source_id, canonical))
    }

    /// Pressure in pascals
    pub fn pressure(time_utc: i64, source_id: impl Into<String>, pascals: Option<Decimal>) -> Self {
        Self::new(MeasurementKind::Pressure, time_utc, source_id, pascals)
    }

    /// Pressure in `Pa`, `bar` or `kPa`
    pub fn pressure_in(
        time_utc: i64,
        source_id: impl Into<String>,
        value: Option<Decimal>,
        unit: &str,
    ) -> IlrtResult<Self> {
        Self::with_unit(MeasurementKind::Pressure, time_utc, source_id, value, unit)
    }

    /// Temperature in degrees Celsius
    pub fn temperature(time_utc: i64, source_id: impl Into<String>, celsius: Option<Decimal>) -> Self {
        Self::new(MeasurementKind::Temperature, time_utc, source_id, celsius)
    }

    /// Temperature in `C` or `K`
    pub fn temperature_in(
        time_utc: i64,
        source_id: impl Into<String>,
        value: Option<Decimal>,
        unit: &str,
    ) -> IlrtResult<Self> {
        Self::with_unit(MeasurementKind::Temperature, time_utc, source_id, value, unit)
    }

    /// Relative humidity in percent
    pub fn humidity(time_utc: i64, source_id: impl Into<String>, percent: Option<Decimal>) -> Self {
        Self::new(MeasurementKind::Humidity, time_utc, source_id, percent)
    }

    /// Specific gas constant in Nm/(kg·K)
    pub fn gas_constant(time_utc: i64, source_id: impl Into<String>, value: Option<Decimal>) -> Self {
        Self::new(MeasurementKind::GasConstant, time_utc, source_id, value)
    }

    /// Leakage rate in v/v%/d
    pub fn leakage(time_utc: i64, source_id: impl Into<String>, value: Option<Decimal>) -> Self {
        Self::new(MeasurementKind::Leakage, time_utc, source_id, value)
    }

    /// Attaches the source's reported standard deviation.
    pub fn with_sigma(mut self, sigma: Option<Decimal>) -> Self {
        self.source_sigma = sigma;
        self
    }

    /// Attaches believability bounds, in the canonical unit.
    pub fn with_bounds(mut self, lower: Option<Decimal>, upper: Option<Decimal>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    pub fn time_utc(&self) -> i64 {
        self.time_utc
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Value in the canonical unit
    pub fn value(&self) -> Option<Decimal> {
        self.value
    }

    /// Canonical unit of this measurement
    pub fn unit(&self) -> &'static str {
        self.kind.default_unit()
    }

    pub fn source_sigma(&self) -> Option<Decimal> {
        self.source_sigma
    }

    pub fn lower_bound(&self) -> Option<Decimal> {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> Option<Decimal> {
        self.upper_bound
    }

    /// Checks the value against the attached bounds, both inclusive.
    ///
    /// Missing bounds are not checked. A missing value is believable only
    /// when no bound is attached at all.
    pub fn is_believable(&self) -> bool {
        match self.value {
            Some(v) => {
                self.lower_bound.map_or(true, |lo| lo <= v)
                    && self.upper_bound.map_or(true, |hi| v <= hi)
            }
            None => self.lower_bound.is_none() && self.upper_bound.is_none(),
        }
    }

    /// Copy of this measurement at another instant.
    pub fn with_new_timestamp(&self, time_utc: i64) -> Self {
        Self {
            time_utc,
            ..self.clone()
        }
    }

    /// Copy of this measurement with another canonical value.
    pub fn with_new_value(&self, value: Option<Decimal>) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }

    /// Temperature in kelvin; `None` for other kinds or a missing value.
    pub fn kelvin_value(&self) -> Option<Decimal> {
        match self.kind {
            MeasurementKind::Temperature => self.value.map(|c| c + CELSIUS_TO_KELVIN),
            _ => None,
        }
    }

    /// Pressure in bar; `None` for other kinds or a missing value.
    pub fn bar_value(&self) -> Option<Decimal> {
        match self.kind {
            MeasurementKind::Pressure => self.value.and_then(|pa| pa.checked_div(PASCALS_PER_BAR)),
            _ => None,
        }
    }

    /// Pressure in kilopascals; `None` for other kinds or a missing value.
    pub fn kilo_pascal_value(&self) -> Option<Decimal> {
        match self.kind {
            MeasurementKind::Pressure => {
                self.value.and_then(|pa| pa.checked_div(PASCALS_PER_KILOPASCAL))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{}{}", v, self.unit()),
            None => write!(f, "-{}", self.unit()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IlrtError;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn temperature_in_kelvin_is_stored_in_celsius() {
        let t = Measurement::temperature_in(0, "T1", Some(d("300")), "K").unwrap();
        assert_eq!(t.value(), Some(d("26.85")));
        assert_eq!(t.unit(), "C");
        assert_eq!(t.kelvin_value(), Some(d("300")));
    }

    #[test]
    fn pressure_accessors_convert_back() {
        let p = Measurement::pressure(0, "P1", Some(d("101325")));
        assert_eq!(p.bar_value(), Some(d("1.01325")));
        assert_eq!(p.kilo_pascal_value(), Some(d("101.325")));
        assert_eq!(p.kelvin_value(), None);
    }

    #[test]
    fn unit_is_checked_even_without_value() {
        let err = Measurement::pressure_in(0, "P1", None, "mmHg").unwrap_err();
        assert!(matches!(err, IlrtError::InvalidUnit { .. }));
        assert!(Measurement::pressure_in(0, "P1", None, "bar").is_ok());
    }

    #[test]
    fn believability_bounds_are_inclusive() {
        let base = Measurement::humidity(0, "H1", Some(d("50")))
            .with_bounds(Some(d("50")), Some(d("60")));
        assert!(base.is_believable());
        assert!(base.with_new_value(Some(d("60"))).is_believable());
        assert!(!base.with_new_value(Some(d("60.01"))).is_believable());
        assert!(!base.with_new_value(Some(d("49.99"))).is_believable());
        assert!(!base.with_new_value(None).is_believable());
    }

    #[test]
    fn unbounded_measurement_is_believable() {
        let m = Measurement::humidity(0, "H1", Some(d("-5")));
        assert!(m.is_believable());
        assert!(m.with_new_value(None).is_believable());
    }

    #[test]
    fn display_shows_value_and_unit() {
        assert_eq!(Measurement::humidity(0, "H1", Some(d("41.5"))).to_string(), "41.5%");
        assert_eq!(Measurement::leakage(0, "L", None).to_string(), "-v/v%/d");
    }

    #[test]
    fn serde_roundtrip_keeps_decimal_exact() {
        let m = Measurement::pressure(5, "P1", Some(d("101325.0000000001")))
            .with_sigma(Some(d("0.5")));
        let json = serde_json::to_string(&m).unwrap();
        let back: Measurement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    fn any_kind() -> impl Strategy<Value = MeasurementKind> {
        prop::sample::select(MeasurementKind::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn with_new_timestamp_only_changes_time(
            kind in any_kind(),
            t0 in any::<i64>(),
            t1 in any::<i64>(),
            mantissa in -1_000_000_000i64..1_000_000_000,
            scale in 0u32..8,
        ) {
            let original = Measurement::new(kind, t0, "S", Some(Decimal::new(mantissa, scale)))
                .with_sigma(Some(Decimal::ONE))
                .with_bounds(Some(Decimal::ZERO), None);
            let snapshot = original.clone();
            let moved = original.with_new_timestamp(t1);

            prop_assert_eq!(moved.time_utc(), t1);
            prop_assert_eq!(moved.kind(), original.kind());
            prop_assert_eq!(moved.source_id(), original.source_id());
            prop_assert_eq!(moved.value(), original.value());
            prop_assert_eq!(moved.source_sigma(), original.source_sigma());
            prop_assert_eq!(moved.lower_bound(), original.lower_bound());
            prop_assert_eq!(moved.upper_bound(), original.upper_bound());
            prop_assert_eq!(&original, &snapshot);
        }
    }
}
