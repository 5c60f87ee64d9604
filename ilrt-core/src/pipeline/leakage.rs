//! Two-point leakage rate stage
//!
//! ## Algorithm
//!
//! From the averages appended upstream the stage computes the air density
//! and linearises it against the reference state:
//!
//! ```text
//! ρ   = P / (R · T)                 P in Pa, T in K, R in Nm/(kg·K)
//! y   = ln(ρ / ρ∞ − 1)
//! Arn = (y − y_prev) / Δt           Δt in seconds
//! Brn = y_prev
//! L   = 8640000 · Arn · (1 / (1 + e^Brn) − 1)       v/v%/d
//! ```
//!
//! ## State
//!
//! The stage remembers one sample `(ρ, t)`. The first usable tick publishes
//! the sentinel `-1` and stores its sample. A later tick that cannot produce
//! a rate (non-increasing time, undefined logarithm) publishes nothing and
//! leaves the stored sample alone.

use rust_decimal::{Decimal, MathematicalOps};

use crate::constants::physics::{LEAKAGE_RATE_FACTOR, LEAKAGE_SENTINEL, REFERENCE_DENSITY};
use crate::constants::{
    round_significant, AVG_GAS_CONSTANT_SOURCE_ID, AVG_PRESSURE_SOURCE_ID,
    AVG_TEMPERATURE_SOURCE_ID, LEAKAGE_SCALE, LEAKAGE_SOURCE_ID, ROUNDING,
};
use crate::measurement::{Measurement, MeasurementKind, MeasurementVector};
use crate::traits::VectorStage;

const MILLIS_PER_SECOND: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    density: Decimal,
    time_utc: i64,
}

/// Appends the leakage rate as `LEAKAGE`
#[derive(Debug, Default)]
pub struct Leakage {
    previous: Option<Sample>,
}

impl Leakage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a sample has been remembered yet
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// `P / (R · T)` if all three averages are present and positive and the
    /// density exceeds the reference density.
    fn density(vector: &MeasurementVector) -> Option<Decimal> {
        let positive = |m: &Measurement| m.value().filter(|v| *v > Decimal::ZERO);

        let pressure = vector
            .get_kind(AVG_PRESSURE_SOURCE_ID, MeasurementKind::Pressure)
            .and_then(positive)?;
        let kelvin = vector
            .get_kind(AVG_TEMPERATURE_SOURCE_ID, MeasurementKind::Temperature)
            .and_then(Measurement::kelvin_value)
            .filter(|k| *k > Decimal::ZERO)?;
        let gas_constant = vector
            .get_kind(AVG_GAS_CONSTANT_SOURCE_ID, MeasurementKind::GasConstant)
            .and_then(positive)?;

        let density = pressure
            .checked_div(gas_constant.checked_mul(kelvin)?)
            .map(round_significant)?;
        if density <= REFERENCE_DENSITY {
            log::debug!(
                "Density {} at {} not above reference {}",
                density,
                vector.time_utc(),
                REFERENCE_DENSITY
            );
            return None;
        }
        Some(density)
    }

    /// `ln(ρ / ρ∞ − 1)`, `None` where the logarithm is undefined
    fn linearised(density: Decimal) -> Option<Decimal> {
        let ratio = density.checked_div(REFERENCE_DENSITY)?.checked_sub(Decimal::ONE)?;
        ratio.checked_ln().map(round_significant)
    }

    fn rate(previous: Sample, current: Sample) -> Option<Decimal> {
        let dt = Decimal::from(current.time_utc.checked_sub(previous.time_utc)?)
            .checked_div(MILLIS_PER_SECOND)?;
        if dt <= Decimal::ZERO {
            return None;
        }

        let y_prev = Self::linearised(previous.density)?;
        let y_curr = Self::linearised(current.density)?;

        let arn = y_curr.checked_sub(y_prev)?.checked_div(dt)?;
        let brn = y_prev;
        let term = Decimal::ONE
            .checked_div(Decimal::ONE.checked_add(brn.checked_exp()?)?)?
            .checked_sub(Decimal::ONE)?;
        let rate = LEAKAGE_RATE_FACTOR.checked_mul(arn)?.checked_mul(term)?;
        Some(rate.round_dp_with_strategy(LEAKAGE_SCALE, ROUNDING))
    }
}

impl VectorStage for Leakage {
    fn process(&mut self, vector: &MeasurementVector) -> Option<MeasurementVector> {
        let current = Sample {
            density: Self::density(vector)?,
            time_utc: vector.time_utc(),
        };

        let value = match self.previous {
            None => LEAKAGE_SENTINEL,
            Some(previous) => match Self::rate(previous, current) {
                Some(rate) => rate,
                None => {
                    log::debug!(
                        "No leakage rate between {} and {}",
                        previous.time_utc,
                        current.time_utc
                    );
                    return None;
                }
            },
        };
        self.previous = Some(current);

        Some(vector.with_measurement(Measurement::leakage(
            vector.time_utc(),
            LEAKAGE_SOURCE_ID,
            Some(value),
        )))
    }

    fn name(&self) -> &'static str {
        "Leakage"
    }

    fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tick(t: i64, pressure: &str, celsius: &str, r: &str) -> MeasurementVector {
        MeasurementVector::new(
            t,
            vec![
                Measurement::pressure(t, AVG_PRESSURE_SOURCE_ID, Some(d(pressure))),
                Measurement::temperature(t, AVG_TEMPERATURE_SOURCE_ID, Some(d(celsius))),
                Measurement::gas_constant(t, AVG_GAS_CONSTANT_SOURCE_ID, Some(d(r))),
            ],
        )
    }

    fn leakage_of(v: &MeasurementVector) -> Decimal {
        v.get(LEAKAGE_SOURCE_ID).and_then(Measurement::value).unwrap()
    }

    #[test]
    fn first_tick_is_sentinel() {
        let mut stage = Leakage::new();
        let out = stage.process(&tick(1_000, "101325", "20", "287")).unwrap();
        assert_eq!(leakage_of(&out), d("-1"));
        assert_eq!(out.len(), 4);
        assert!(stage.has_previous());
    }

    #[test]
    fn second_tick_an_hour_later_yields_rate() {
        let mut stage = Leakage::new();
        stage.process(&tick(1_000, "101325", "20", "287")).unwrap();
        let out = stage
            .process(&tick(3_601_000, "101000", "20", "287"))
            .unwrap();
        let rate = leakage_of(&out);
        assert_ne!(rate, d("-1"));
        assert!((rate - d("8.067009")).abs() < d("0.001"), "rate {}", rate);
        assert!(rate.scale() <= LEAKAGE_SCALE);
    }

    #[test]
    fn same_timestamp_publishes_nothing_and_keeps_state() {
        let mut stage = Leakage::new();
        stage.process(&tick(1_000, "101325", "20", "287")).unwrap();
        assert!(stage.process(&tick(1_000, "101000", "20", "287")).is_none());
        assert!(stage.process(&tick(500, "101000", "20", "287")).is_none());

        let out = stage
            .process(&tick(3_601_000, "101000", "20", "287"))
            .unwrap();
        assert!((leakage_of(&out) - d("8.067009")).abs() < d("0.001"));
    }

    #[test]
    fn low_density_publishes_nothing() {
        let mut stage = Leakage::new();
        assert!(stage.process(&tick(0, "90000", "20", "287")).is_none());
        assert!(!stage.has_previous());
    }

    #[test]
    fn missing_or_non_positive_inputs_publish_nothing() {
        let mut stage = Leakage::new();
        assert!(stage.process(&tick(0, "0", "20", "287")).is_none());
        assert!(stage.process(&tick(0, "101325", "20", "-1")).is_none());
        assert!(stage.process(&tick(0, "101325", "-280", "287")).is_none());

        let partial = MeasurementVector::new(
            0,
            vec![Measurement::pressure(0, AVG_PRESSURE_SOURCE_ID, Some(d("101325")))],
        );
        assert!(stage.process(&partial).is_none());
        assert!(!stage.has_previous());
    }

    #[test]
    fn reset_restarts_with_sentinel() {
        let mut stage = Leakage::new();
        stage.process(&tick(0, "101325", "20", "287")).unwrap();
        stage.reset();
        let out = stage.process(&tick(3_600_000, "101000", "20", "287")).unwrap();
        assert_eq!(leakage_of(&out), d("-1"));
    }
}
