//! Stream integration for vector stages
//!
//! [`StageStream`] subscribes a [`VectorStage`] to an upstream stream and
//! republishes whatever the stage produces on its own output stream. It also
//! owns the behavior every stage shares:
//!
//! - vectors flagged with a severe error skip the stage and go out unchanged
//! - a `None` from the stage means nothing is published for that tick
//! - `stop` detaches from upstream, resets the stage and drops subscribers

use std::sync::{Arc, Mutex, PoisonError};

use crate::measurement::MeasurementVector;
use crate::stream::{Subscription, VectorStream};
use crate::traits::VectorStage;

type SharedStage = Arc<Mutex<Box<dyn VectorStage>>>;

/// A stage wired between two vector streams
pub struct StageStream {
    name: &'static str,
    stage: SharedStage,
    output: VectorStream,
    upstream: Mutex<Option<Subscription>>,
}

impl StageStream {
    /// Subscribes `stage` to `upstream`.
    pub fn attach<S: VectorStage + 'static>(upstream: &VectorStream, stage: S) -> Self {
        Self::attach_boxed(upstream, Box::new(stage))
    }

    /// Subscribes an already boxed stage to `upstream`.
    pub fn attach_boxed(upstream: &VectorStream, stage: Box<dyn VectorStage>) -> Self {
        let name = stage.name();
        let output = VectorStream::new(name);
        let stage: SharedStage = Arc::new(Mutex::new(stage));

        let worker = Arc::clone(&stage);
        let sink = output.clone();
        let subscription = upstream.subscribe(move |vector: &MeasurementVector| {
            if vector.has_severe_error() {
                log::debug!("{}: severe error at {}, passing through", name, vector.time_utc());
                sink.publish(vector);
                return Ok(());
            }

            let produced = worker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .process(vector);

            match produced {
                Some(out) => sink.publish(&out),
                None => log::debug!("{}: nothing to publish at {}", name, vector.time_utc()),
            }
            Ok(())
        });

        Self {
            name,
            stage,
            output,
            upstream: Mutex::new(Some(subscription)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Output of this stage
    pub fn stream(&self) -> &VectorStream {
        &self.output
    }

    /// Whether the stage is still subscribed upstream
    pub fn is_attached(&self) -> bool {
        self.upstream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Detaches from upstream, clears stage state and subscribers.
    /// Calling it again does nothing more.
    pub fn stop(&self) {
        let subscription = self
            .upstream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            log::trace!("{}: detached from upstream", self.name);
        }
        self.stage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset();
        self.output.clear();
    }
}

impl std::fmt::Debug for StageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageStream")
            .field("name", &self.name)
            .field("attached", &self.is_attached())
            .finish()
    }
}
