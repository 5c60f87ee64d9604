//! Averaging stages
//!
//! Each stage appends one synthetic measurement to the vector it receives
//! and keeps every original measurement. When a tick does not allow a
//! result, the stage publishes nothing for it.
//!
//! | Stage                | Appends           | Kind          | Average                        |
//! |----------------------|-------------------|---------------|--------------------------------|
//! | `AveragePressure`    | `AVG_PRESSURE`    | `Pressure`    | arithmetic, 10 dp              |
//! | `AverageTemperature` | `AVG_TEMPERATURE` | `Temperature` | volume-weighted harmonic       |
//! | `AverageGasConstant` | `AVG_R`           | `GasConstant` | volume-weighted harmonic of R  |
//!
//! Intermediate results are rounded half-up to 16 significant digits after
//! every operation.
//!
//! ## Humid Air Gas Constant
//!
//! For each humidity sensor paired with a temperature sensor:
//!
//! ```text
//! P_sat = 10^(A − B / (T + C))                         Antoine, T in °C
//! R     = R_L · P / (P − (1 − R_L / R_G) · φ/100 · P_sat)
//! ```
//!
//! The power of ten is evaluated in `f64`; everything else stays decimal.

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::constants::physics::{
    ANTOINE_A, ANTOINE_B, ANTOINE_C, CREDIBLE_HUMIDITY_MAX_PERCENT, CREDIBLE_HUMIDITY_MIN_PERCENT,
    CREDIBLE_TEMPERATURE_MAX_C, CREDIBLE_TEMPERATURE_MIN_C, GAS_CONSTANT_DRY_AIR,
    GAS_CONSTANT_WATER_VAPOUR,
};
use crate::constants::{
    round_significant, AVERAGE_PRESSURE_SCALE, AVG_GAS_CONSTANT_SOURCE_ID, AVG_PRESSURE_SOURCE_ID,
    AVG_TEMPERATURE_SOURCE_ID, ROUNDING,
};
use crate::measurement::{Measurement, MeasurementKind, MeasurementVector};
use crate::traits::{SensorCatalog, VectorStage};

fn add(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_add(b).map(round_significant)
}

fn sub(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_sub(b).map(round_significant)
}

fn mul(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_mul(b).map(round_significant)
}

fn div(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_div(b).map(round_significant)
}

fn in_range(value: Decimal, min: Decimal, max: Decimal) -> bool {
    min <= value && value <= max
}

/// Appends the arithmetic mean of all pressure readings as `AVG_PRESSURE`
#[derive(Debug, Default)]
pub struct AveragePressure;

impl AveragePressure {
    pub fn new() -> Self {
        Self
    }

    fn average(vector: &MeasurementVector) -> Option<Decimal> {
        let mut sum = Decimal::ZERO;
        let mut count: u32 = 0;
        for value in vector
            .of_kind(MeasurementKind::Pressure)
            .filter_map(Measurement::value)
        {
            sum = sum.checked_add(value)?;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let mean = sum.checked_div(Decimal::from(count))?;
        Some(mean.round_dp_with_strategy(AVERAGE_PRESSURE_SCALE, ROUNDING))
    }
}

impl VectorStage for AveragePressure {
    fn process(&mut self, vector: &MeasurementVector) -> Option<MeasurementVector> {
        let mean = Self::average(vector)?;
        Some(vector.with_measurement(Measurement::pressure(
            vector.time_utc(),
            AVG_PRESSURE_SOURCE_ID,
            Some(mean),
        )))
    }

    fn name(&self) -> &'static str {
        "AveragePressure"
    }
}

/// Appends the volume-weighted harmonic mean temperature as `AVG_TEMPERATURE`
///
/// Only readings within 0–100 °C count. A reading of exactly 0 °C adds its
/// weight to the numerator but no term to the denominator.
pub struct AverageTemperature {
    catalog: Arc<dyn SensorCatalog>,
}

impl AverageTemperature {
    pub fn new(catalog: Arc<dyn SensorCatalog>) -> Self {
        Self { catalog }
    }

    fn average(&self, vector: &MeasurementVector) -> Option<Decimal> {
        let mut volume_sum = Decimal::ZERO;
        let mut denominator = Decimal::ZERO;

        for m in vector.of_kind(MeasurementKind::Temperature) {
            let Some(celsius) = m.value() else { continue };
            if !in_range(celsius, CREDIBLE_TEMPERATURE_MIN_C, CREDIBLE_TEMPERATURE_MAX_C) {
                continue;
            }
            let weight = self.catalog.volume_factor(m.source_id());
            volume_sum = add(volume_sum, weight)?;
            if !celsius.is_zero() {
                denominator = add(denominator, div(weight, celsius)?)?;
            }
        }

        if volume_sum.is_zero() || denominator.is_zero() {
            return None;
        }
        div(volume_sum, denominator)
    }
}

impl VectorStage for AverageTemperature {
    fn process(&mut self, vector: &MeasurementVector) -> Option<MeasurementVector> {
        let mean = self.average(vector)?;
        Some(vector.with_measurement(Measurement::temperature(
            vector.time_utc(),
            AVG_TEMPERATURE_SOURCE_ID,
            Some(mean),
        )))
    }

    fn name(&self) -> &'static str {
        "AverageTemperature"
    }
}

/// Appends the volume-weighted harmonic mean specific gas constant of humid
/// air as `AVG_R`
///
/// Needs `AVG_PRESSURE` in the incoming vector. Each humidity reading is
/// combined with the reading of its paired temperature sensor from the same
/// tick; the weight is the volume factor of the temperature sensor's
/// location. A pair is skipped when either reading is missing or outside
/// 0–100, when the weight is not positive, or when the formula is undefined.
pub struct AverageGasConstant {
    catalog: Arc<dyn SensorCatalog>,
}

impl AverageGasConstant {
    pub fn new(catalog: Arc<dyn SensorCatalog>) -> Self {
        Self { catalog }
    }

    fn average(&self, vector: &MeasurementVector) -> Option<Decimal> {
        let pressure = vector
            .get_kind(AVG_PRESSURE_SOURCE_ID, MeasurementKind::Pressure)?
            .value()?;

        let mut weight_sum = Decimal::ZERO;
        let mut weight_over_r_sum = Decimal::ZERO;
        let mut pairs = 0usize;

        for humidity in vector.of_kind(MeasurementKind::Humidity) {
            let Some((weight, r)) = self.pair_gas_constant(vector, humidity, pressure) else {
                continue;
            };
            let (Some(ws), Some(wrs)) = (
                add(weight_sum, weight),
                div(weight, r).and_then(|w_over_r| add(weight_over_r_sum, w_over_r)),
            ) else {
                continue;
            };
            weight_sum = ws;
            weight_over_r_sum = wrs;
            pairs += 1;
        }

        if pairs == 0 {
            log::debug!("No usable humidity/temperature pair at {}", vector.time_utc());
            return None;
        }
        div(weight_sum, weight_over_r_sum)
    }

    /// (weight, R) for one humidity reading, or `None` if the pair is skipped
    fn pair_gas_constant(
        &self,
        vector: &MeasurementVector,
        humidity: &Measurement,
        pressure: Decimal,
    ) -> Option<(Decimal, Decimal)> {
        let phi = humidity.value()?;
        if !in_range(phi, CREDIBLE_HUMIDITY_MIN_PERCENT, CREDIBLE_HUMIDITY_MAX_PERCENT) {
            return None;
        }

        let temperature_id = self.catalog.paired_temperature(humidity.source_id())?;
        let celsius = vector
            .get_kind(temperature_id, MeasurementKind::Temperature)?
            .value()?;
        if !in_range(celsius, CREDIBLE_TEMPERATURE_MIN_C, CREDIBLE_TEMPERATURE_MAX_C) {
            return None;
        }

        let weight = self.catalog.volume_factor(temperature_id);
        if weight <= Decimal::ZERO {
            return None;
        }

        let saturation = saturation_pressure(celsius)?;
        let r = humid_air_gas_constant(pressure, phi, saturation)?;
        (r > Decimal::ZERO).then_some((weight, r))
    }
}

/// Saturation vapour pressure of water over the Antoine equation.
///
/// `None` at the singularity `T = −C` and when `10^x` leaves the decimal
/// range. Results too small for a decimal become zero.
pub fn saturation_pressure(celsius: Decimal) -> Option<Decimal> {
    let shifted = add(celsius, ANTOINE_C)?;
    if shifted.is_zero() {
        return None;
    }
    let exponent = sub(ANTOINE_A, div(ANTOINE_B, shifted)?)?;
    let raw = libm::pow(10.0, exponent.to_f64()?);
    match Decimal::from_f64_retain(raw) {
        Some(value) => Some(round_significant(value)),
        None if raw.is_finite() && raw.abs() < 1.0 => Some(Decimal::ZERO),
        None => None,
    }
}

/// Specific gas constant of humid air, Nm/(kg·K).
///
/// `None` when the denominator is not positive.
pub fn humid_air_gas_constant(pressure: Decimal, phi: Decimal, saturation: Decimal) -> Option<Decimal> {
    let one_minus_ratio = sub(
        Decimal::ONE,
        div(GAS_CONSTANT_DRY_AIR, GAS_CONSTANT_WATER_VAPOUR)?,
    )?;
    let phi_fraction = div(phi, Decimal::ONE_HUNDRED)?;
    let correction = mul(mul(one_minus_ratio, phi_fraction)?, saturation)?;
    let denominator = sub(pressure, correction)?;
    if denominator <= Decimal::ZERO {
        return None;
    }
    div(mul(GAS_CONSTANT_DRY_AIR, pressure)?, denominator)
}

impl VectorStage for AverageGasConstant {
    fn process(&mut self, vector: &MeasurementVector) -> Option<MeasurementVector> {
        let mean = self.average(vector)?;
        Some(vector.with_measurement(Measurement::gas_constant(
            vector.time_utc(),
            AVG_GAS_CONSTANT_SOURCE_ID,
            Some(mean),
        )))
    }

    fn name(&self) -> &'static str {
        "AverageGasConstant"
    }
}
