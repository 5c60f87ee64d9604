//! Unit handling for measurement construction
//!
//! Each kind has one canonical unit. Values given in any other accepted unit
//! are converted exactly once, when the measurement is built; everything
//! downstream works in the canonical unit only.

use rust_decimal::Decimal;

use crate::constants::physics::{CELSIUS_TO_KELVIN, PASCALS_PER_BAR, PASCALS_PER_KILOPASCAL};
use crate::errors::{IlrtError, IlrtResult};
use crate::measurement::MeasurementKind;

/// Pascal, canonical pressure unit
pub const PASCAL: &str = "Pa";
/// Bar
pub const BAR: &str = "bar";
/// Kilopascal
pub const KILO_PASCAL: &str = "kPa";
/// Degrees Celsius, canonical temperature unit
pub const CELSIUS: &str = "C";
/// Kelvin
pub const KELVIN: &str = "K";
/// Relative humidity in percent, canonical humidity unit
pub const PERCENT: &str = "%";
/// Specific gas constant unit
pub const NEWTON_METRE_PER_KG_KELVIN: &str = "Nm/(kg*K)";
/// Leakage rate unit: volume percent per day
pub const VOLUME_PERCENT_PER_DAY: &str = "v/v%/d";

/// Canonical unit of a measurement kind.
pub const fn canonical_unit(kind: MeasurementKind) -> &'static str {
    match kind {
        MeasurementKind::Pressure => PASCAL,
        MeasurementKind::Temperature => CELSIUS,
        MeasurementKind::Humidity => PERCENT,
        MeasurementKind::GasConstant => NEWTON_METRE_PER_KG_KELVIN,
        MeasurementKind::Leakage => VOLUME_PERCENT_PER_DAY,
    }
}

enum Conversion {
    Identity,
    Scale(Decimal),
    Offset(Decimal),
}

fn conversion(kind: MeasurementKind, unit: &str) -> Option<Conversion> {
    let conversion = match (kind, unit) {
        (MeasurementKind::Pressure, PASCAL) => Conversion::Identity,
        (MeasurementKind::Pressure, BAR) => Conversion::Scale(PASCALS_PER_BAR),
        (MeasurementKind::Pressure, KILO_PASCAL | "KPa") => Conversion::Scale(PASCALS_PER_KILOPASCAL),
        (MeasurementKind::Temperature, CELSIUS | "°C") => Conversion::Identity,
        (MeasurementKind::Temperature, KELVIN) => Conversion::Offset(CELSIUS_TO_KELVIN),
        (MeasurementKind::Humidity, PERCENT) => Conversion::Identity,
        (MeasurementKind::GasConstant, NEWTON_METRE_PER_KG_KELVIN) => Conversion::Identity,
        (MeasurementKind::Leakage, VOLUME_PERCENT_PER_DAY) => Conversion::Identity,
        _ => return None,
    };
    Some(conversion)
}

/// Converts `value`, expressed in `unit`, to the canonical unit of `kind`.
///
/// Unit matching is exact apart from the two legacy spellings `KPa` and `°C`.
/// Anything else, the empty string included, is rejected. A value whose
/// converted form does not fit in a `Decimal` fails with
/// [`IlrtError::ConversionOverflow`].
pub fn to_canonical(kind: MeasurementKind, value: Decimal, unit: &str) -> IlrtResult<Decimal> {
    let conversion = conversion(kind, unit).ok_or_else(|| IlrtError::InvalidUnit {
        kind,
        unit: unit.to_string(),
    })?;

    let converted = match conversion {
        Conversion::Identity => Some(value),
        Conversion::Scale(factor) => value.checked_mul(factor),
        Conversion::Offset(zero) => value.checked_sub(zero),
    };
    converted.ok_or_else(|| IlrtError::ConversionOverflow {
        kind,
        unit: unit.to_string(),
    })
}
