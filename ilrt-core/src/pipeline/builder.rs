//! Chain builder and the two standard chains
//!
//! A [`Chain`] is an ordered list of [`StageStream`]s, each subscribed to its
//! predecessor, plus one output stream that republishes the tail. Consumers
//! subscribe to the chain output and never see the individual stages.

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::{CalibrationConfig, SensorConfig, SiteCatalog, SiteConfig};
use crate::measurement::MeasurementVector;
use crate::stream::{Subscription, VectorStream};
use crate::traits::{SensorCatalog, VectorStage};

use super::{
    AverageGasConstant, AveragePressure, AverageTemperature, BelievabilityFilter, Calibrator,
    Leakage, StageStream,
};

/// A wired sequence of stages
pub struct Chain {
    name: &'static str,
    stages: Vec<StageStream>,
    output: VectorStream,
    tail: Mutex<Option<Subscription>>,
    catalog: Arc<dyn SensorCatalog>,
}

impl Chain {
    /// Start building a chain fed by `source`
    pub fn builder(
        name: &'static str,
        source: &VectorStream,
        catalog: Arc<dyn SensorCatalog>,
    ) -> ChainBuilder {
        ChainBuilder::new(name, source, catalog)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Output stream republishing whatever the last stage publishes
    pub fn stream(&self) -> &VectorStream {
        &self.output
    }

    /// Configured sensors in site order
    pub fn list_sensors(&self) -> Vec<SensorConfig> {
        self.catalog.sensors()
    }

    /// Stage names, head first
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(StageStream::name).collect()
    }

    /// Tears the chain down.
    ///
    /// The exposed tail subscription goes first, then every stage from tail
    /// to head, then the chain's own subscribers. Safe to call repeatedly.
    pub fn stop(&self) {
        let tail = self
            .tail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tail) = tail {
            tail.unsubscribe();
            log::debug!("{}: stopping {} stages", self.name, self.stages.len());
        }
        for stage in self.stages.iter().rev() {
            stage.stop();
        }
        self.output.clear();
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder wiring stages onto a source stream
pub struct ChainBuilder {
    name: &'static str,
    source: VectorStream,
    stages: Vec<StageStream>,
    catalog: Arc<dyn SensorCatalog>,
}

impl ChainBuilder {
    pub fn new(name: &'static str, source: &VectorStream, catalog: Arc<dyn SensorCatalog>) -> Self {
        Self {
            name,
            source: source.clone(),
            stages: Vec::new(),
            catalog,
        }
    }

    /// Append a stage subscribed to the current tail
    pub fn add_stage<S: VectorStage + 'static>(self, stage: S) -> Self {
        self.add_boxed(Box::new(stage))
    }

    /// Append an already boxed stage
    pub fn add_boxed(mut self, stage: Box<dyn VectorStage>) -> Self {
        let upstream = self
            .stages
            .last()
            .map_or(&self.source, StageStream::stream);
        let wired = StageStream::attach_boxed(upstream, stage);
        self.stages.push(wired);
        self
    }

    /// Append `stage` only when present
    pub fn add_optional<S: VectorStage + 'static>(self, stage: Option<S>) -> Self {
        match stage {
            Some(stage) => self.add_stage(stage),
            None => self,
        }
    }

    /// Finish wiring and expose the tail
    pub fn build(self) -> Chain {
        let output = VectorStream::new(self.name);
        let tail_stream = self
            .stages
            .last()
            .map_or(&self.source, StageStream::stream);

        let sink = output.clone();
        let tail = tail_stream.subscribe(move |vector: &MeasurementVector| {
            sink.publish(vector);
            Ok(())
        });

        log::debug!("{}: built with {} stages", self.name, self.stages.len());

        Chain {
            name: self.name,
            stages: self.stages,
            output,
            tail: Mutex::new(Some(tail)),
            catalog: self.catalog,
        }
    }
}

/// Filter, optional calibration, both averages, gas constant and leakage
#[derive(Debug)]
pub struct FullChain {
    chain: Chain,
}

impl FullChain {
    pub fn new(
        site: SiteConfig,
        calibration: Option<CalibrationConfig>,
        source: &VectorStream,
    ) -> Self {
        Self::with_catalog(Arc::new(SiteCatalog::new(site)), calibration, source)
    }

    pub fn with_catalog(
        catalog: Arc<dyn SensorCatalog>,
        calibration: Option<CalibrationConfig>,
        source: &VectorStream,
    ) -> Self {
        let chain = Chain::builder("FullChain", source, Arc::clone(&catalog))
            .add_stage(BelievabilityFilter::new(Arc::clone(&catalog)))
            .add_optional(calibration.map(Calibrator::new))
            .add_stage(AveragePressure::new())
            .add_stage(AverageTemperature::new(Arc::clone(&catalog)))
            .add_stage(AverageGasConstant::new(catalog))
            .add_stage(Leakage::new())
            .build();
        Self { chain }
    }

    pub fn stream(&self) -> &VectorStream {
        self.chain.stream()
    }

    pub fn list_sensors(&self) -> Vec<SensorConfig> {
        self.chain.list_sensors()
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn stop(&self) {
        self.chain.stop();
    }
}

/// Filter followed by the average pressure
#[derive(Debug)]
pub struct StackedChain {
    chain: Chain,
}

impl StackedChain {
    pub fn new(site: SiteConfig, source: &VectorStream) -> Self {
        Self::with_catalog(Arc::new(SiteCatalog::new(site)), source)
    }

    pub fn with_catalog(catalog: Arc<dyn SensorCatalog>, source: &VectorStream) -> Self {
        let chain = Chain::builder("StackedChain", source, Arc::clone(&catalog))
            .add_stage(BelievabilityFilter::new(catalog))
            .add_stage(AveragePressure::new())
            .build();
        Self { chain }
    }

    pub fn stream(&self) -> &VectorStream {
        self.chain.stream()
    }

    pub fn list_sensors(&self) -> Vec<SensorConfig> {
        self.chain.list_sensors()
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn stop(&self) {
        self.chain.stop();
    }
}
