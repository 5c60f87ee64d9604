//! Indexed view over a [`SiteConfig`]

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::traits::SensorCatalog;

use super::{SensorConfig, SensorType, SiteConfig, ValidRange};

/// [`SensorCatalog`] backed by a site configuration
///
/// Built once per chain. Lookups are hash-map hits; the site itself is
/// never consulted again after indexing.
#[derive(Debug, Clone)]
pub struct SiteCatalog {
    site: SiteConfig,
    /// sensor id -> (location index, sensor index)
    sensors_by_id: HashMap<String, (usize, usize)>,
    /// humidity sensor id -> temperature sensor id
    humidity_pairs: HashMap<String, String>,
}

impl SiteCatalog {
    /// Indexes `site`.
    ///
    /// Within each location, every humidity sensor is paired with the first
    /// temperature sensor of that location. Humidity sensors in a location
    /// without temperature sensors stay unpaired. When a sensor id appears
    /// twice, the later entry wins.
    pub fn new(mut site: SiteConfig) -> Self {
        let mut sensors_by_id = HashMap::new();
        let mut humidity_pairs = HashMap::new();

        for (li, location) in site.locations.iter_mut().enumerate() {
            let mut primary_temperature: Option<String> = None;
            let mut humidity_ids = Vec::new();

            for (si, sensor) in location.sensors.iter_mut().enumerate() {
                if sensor.location_id.is_none() {
                    sensor.location_id = Some(location.id.clone());
                }
                sensors_by_id.insert(sensor.id.clone(), (li, si));
                match sensor.sensor_type {
                    SensorType::Temperature if primary_temperature.is_none() => {
                        primary_temperature = Some(sensor.id.clone());
                    }
                    SensorType::Humidity => humidity_ids.push(sensor.id.clone()),
                    _ => {}
                }
            }

            if let Some(temperature_id) = primary_temperature {
                for humidity_id in humidity_ids {
                    humidity_pairs.insert(humidity_id, temperature_id.clone());
                }
            }
        }

        log::debug!(
            "Indexed site '{}': {} sensors, {} humidity pairs",
            site.id,
            sensors_by_id.len(),
            humidity_pairs.len()
        );

        Self {
            site,
            sensors_by_id,
            humidity_pairs,
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Configuration of one sensor
    pub fn sensor(&self, sensor_id: &str) -> Option<&SensorConfig> {
        let &(li, si) = self.sensors_by_id.get(sensor_id)?;
        self.site.locations.get(li)?.sensors.get(si)
    }
}

impl SensorCatalog for SiteCatalog {
    fn valid_range(&self, sensor_id: &str) -> Option<ValidRange> {
        self.sensor(sensor_id)?.valid_range
    }

    fn volume_factor(&self, sensor_id: &str) -> Decimal {
        self.sensors_by_id
            .get(sensor_id)
            .and_then(|&(li, _)| self.site.locations.get(li))
            .and_then(|location| location.volume_factor)
            .unwrap_or(Decimal::ONE)
    }

    fn paired_temperature(&self, humidity_id: &str) -> Option<&str> {
        self.humidity_pairs.get(humidity_id).map(String::as_str)
    }

    fn sensors(&self) -> Vec<SensorConfig> {
        self.site.sensors().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationConfig;

    fn site() -> SiteConfig {
        SiteConfig::new("S")
            .with_location(
                LocationConfig::new("A", Some(Decimal::new(25, 2)))
                    .with_sensor(SensorConfig::new("H1", SensorType::Humidity))
                    .with_sensor(SensorConfig::new("T1", SensorType::Temperature))
                    .with_sensor(SensorConfig::new("T2", SensorType::Temperature))
                    .with_sensor(SensorConfig::new("H2", SensorType::Humidity)),
            )
            .with_location(
                LocationConfig::new("B", None)
                    .with_sensor(SensorConfig::new("H3", SensorType::Humidity))
                    .with_sensor(SensorConfig::new("P1", SensorType::Pressure)),
            )
    }

    #[test]
    fn humidity_pairs_with_first_temperature_of_location() {
        let catalog = SiteCatalog::new(site());
        assert_eq!(catalog.paired_temperature("H1"), Some("T1"));
        assert_eq!(catalog.paired_temperature("H2"), Some("T1"));
        assert_eq!(catalog.paired_temperature("H3"), None);
        assert_eq!(catalog.paired_temperature("T1"), None);
    }

    #[test]
    fn volume_factor_defaults_to_one() {
        let catalog = SiteCatalog::new(site());
        assert_eq!(catalog.volume_factor("T2"), Decimal::new(25, 2));
        assert_eq!(catalog.volume_factor("P1"), Decimal::ONE);
        assert_eq!(catalog.volume_factor("unknown"), Decimal::ONE);
    }

    #[test]
    fn sensors_learn_their_location() {
        let catalog = SiteCatalog::new(site());
        assert_eq!(
            catalog.sensor("P1").and_then(|s| s.location_id.as_deref()),
            Some("B")
        );
        let ids: Vec<String> = catalog.sensors().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["H1", "T1", "T2", "H2", "H3", "P1"]);
    }
}
