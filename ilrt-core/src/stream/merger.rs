//! Timing/data stream merger
//!
//! Decouples the sampling cadence from the cadence at which sensors report.
//! The data stream only updates a "latest value per sensor" table; the timing
//! stream decides when a vector goes out. Each tick of the timing stream
//! produces exactly one vector, stamped with the tick's time, holding the
//! latest value of every sensor seen so far (sorted by source id). Before any
//! data has arrived that vector is empty.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::measurement::{Measurement, MeasurementVector};

use super::{Subscription, VectorStream};

type LatestValues = Arc<Mutex<BTreeMap<String, Measurement>>>;

/// Re-emits the latest data values on every timing tick
pub struct StreamMerger {
    output: VectorStream,
    latest: LatestValues,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl StreamMerger {
    /// Subscribes to both streams immediately.
    pub fn new(timing: &VectorStream, data: &VectorStream) -> Self {
        let output = VectorStream::new("merger");
        let latest: LatestValues = Arc::new(Mutex::new(BTreeMap::new()));

        let table = Arc::clone(&latest);
        let data_sub = data.subscribe(move |vector: &MeasurementVector| {
            let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
            for m in vector.measurements() {
                table.insert(m.source_id().to_string(), m.clone());
            }
            Ok(())
        });

        let table = Arc::clone(&latest);
        let sink = output.clone();
        let timing_sub = timing.subscribe(move |tick: &MeasurementVector| {
            let at = tick.time_utc();
            let merged: Vec<Measurement> = {
                let table = table.lock().unwrap_or_else(PoisonError::into_inner);
                table.values().map(|m| m.with_new_timestamp(at)).collect()
            };
            log::trace!("Merged {} sensors at {}", merged.len(), at);
            sink.publish(&MeasurementVector::new(at, merged));
            Ok(())
        });

        Self {
            output,
            latest,
            subscriptions: Mutex::new(vec![timing_sub, data_sub]),
        }
    }

    /// Stream of merged vectors
    pub fn stream(&self) -> &VectorStream {
        &self.output
    }

    /// Number of sensors with at least one value so far
    pub fn known_sensors(&self) -> usize {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Unsubscribes from both inputs, forgets every value and drops all
    /// subscribers. Safe to call more than once.
    pub fn stop(&self) {
        let subs: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for sub in &subs {
            sub.unsubscribe();
        }
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.output.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn collect(stream: &VectorStream) -> Arc<Mutex<Vec<MeasurementVector>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        stream.subscribe(move |v: &MeasurementVector| {
            sink.lock().unwrap().push(v.clone());
            Ok(())
        });
        seen
    }

    fn pressure(t: i64, id: &str, v: i64) -> Measurement {
        Measurement::pressure(t, id, Some(Decimal::from(v)))
    }

    #[test]
    fn emits_empty_vector_before_any_data() {
        let timing = VectorStream::new("timing");
        let data = VectorStream::new("data");
        let merger = StreamMerger::new(&timing, &data);
        let seen = collect(merger.stream());

        timing.publish(&MeasurementVector::new(100, Vec::new()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].time_utc(), 100);
        assert!(seen[0].is_empty());
    }

    #[test]
    fn latest_values_are_restamped_and_sorted() {
        let timing = VectorStream::new("timing");
        let data = VectorStream::new("data");
        let merger = StreamMerger::new(&timing, &data);
        let seen = collect(merger.stream());

        data.publish(&MeasurementVector::new(10, vec![pressure(10, "P2", 1), pressure(10, "P1", 2)]));
        data.publish(&MeasurementVector::new(20, vec![pressure(20, "P2", 3)]));
        timing.publish(&MeasurementVector::new(50, vec![pressure(50, "IGNORED", 0)]));

        let seen = seen.lock().unwrap();
        let out = &seen[0];
        assert_eq!(out.time_utc(), 50);
        let ids: Vec<&str> = out.measurements().iter().map(Measurement::source_id).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
        assert!(out.measurements().iter().all(|m| m.time_utc() == 50));
        assert_eq!(out.get("P2").and_then(Measurement::value), Some(Decimal::from(3)));
    }

    #[test]
    fn stop_detaches_and_forgets() {
        let timing = VectorStream::new("timing");
        let data = VectorStream::new("data");
        let merger = StreamMerger::new(&timing, &data);
        let seen = collect(merger.stream());

        data.publish(&MeasurementVector::new(10, vec![pressure(10, "P1", 1)]));
        assert_eq!(merger.known_sensors(), 1);

        merger.stop();
        merger.stop();
        timing.publish(&MeasurementVector::new(50, Vec::new()));

        assert_eq!(merger.known_sensors(), 0);
        assert_eq!(timing.subscriber_count(), 0);
        assert_eq!(data.subscriber_count(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }
}
