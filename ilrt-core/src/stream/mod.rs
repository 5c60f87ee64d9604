//! Publish/subscribe streams
//!
//! Every stage of the pipeline is wired to its predecessor through a
//! [`Stream`]. A stream owns its subscriber list; each subscriber holds a
//! [`Subscription`] handle whose only purpose is to remove itself again.
//!
//! ## Delivery Guarantees
//!
//! - `publish` is synchronous. It returns after every subscriber present at
//!   the start of the call has been invoked once.
//! - A failing handler is isolated. Returned errors and panics are logged and
//!   delivery carries on with the next subscriber.
//! - The subscriber list is copy-on-write. `publish` works on a snapshot, so
//!   subscribing or unsubscribing from inside a handler only takes effect on
//!   the next publish.
//!
//! ```rust
//! use ilrt_core::stream::Stream;
//! use std::sync::{Arc, Mutex};
//!
//! let stream: Stream<u32> = Stream::new("numbers");
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = Arc::clone(&seen);
//! let sub = stream.subscribe(move |n: &u32| {
//!     sink.lock().unwrap().push(*n);
//!     Ok(())
//! });
//!
//! stream.publish(&1);
//! sub.unsubscribe();
//! stream.publish(&2);
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//! ```
//!
//! ## Module Organization
//! - Core stream and subscription handle (this file)
//! - `merger` - Timing/data stream merger

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwap;

use crate::measurement::{Measurement, MeasurementVector};

pub mod merger;

pub use merger::StreamMerger;

/// Outcome of a subscriber callback
pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

type Handler<T> = Arc<dyn Fn(&T) -> HandlerResult + Send + Sync>;

/// Stream of single measurements
pub type MeasurementStream = Stream<Measurement>;

/// Stream of measurement vectors; the flavor used by all pipeline stages
pub type VectorStream = Stream<MeasurementVector>;

struct Subscribers<T> {
    label: &'static str,
    next_id: AtomicU64,
    handlers: ArcSwap<Vec<(u64, Handler<T>)>>,
}

impl<T> Subscribers<T> {
    fn snapshot(&self) -> Arc<Vec<(u64, Handler<T>)>> {
        self.handlers.load_full()
    }

    /// `update` is rerun if another writer got in first.
    fn replace<F>(&self, mut update: F)
    where
        F: FnMut(&[(u64, Handler<T>)]) -> Vec<(u64, Handler<T>)>,
    {
        self.handlers.rcu(|current| Arc::new(update(current.as_slice())));
    }
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64) -> bool;
}

impl<T> Detach for Subscribers<T> {
    fn detach(&self, id: u64) -> bool {
        let mut removed = false;
        self.replace(|current| {
            removed = current.iter().any(|(sid, _)| *sid == id);
            current
                .iter()
                .filter(|(sid, _)| *sid != id)
                .cloned()
                .collect()
        });
        removed
    }
}

/// Synchronous fan-out publisher
///
/// Clones share one subscriber list.
pub struct Stream<T> {
    inner: Arc<Subscribers<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("label", &self.inner.label)
            .field("subscribers", &self.inner.snapshot().len())
            .finish()
    }
}

impl<T: 'static> Stream<T> {
    /// Creates a stream; `label` only shows up in log output.
    pub fn new(label: &'static str) -> Self {
        Self {
            inner: Arc::new(Subscribers {
                label,
                next_id: AtomicU64::new(0),
                handlers: ArcSwap::from_pointee(Vec::new()),
            }),
        }
    }

    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    /// Registers `handler` for every subsequent publish.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let handler: Handler<T> = Arc::new(handler);
        self.inner.replace(|current| {
            let mut next = current.to_vec();
            next.push((id, Arc::clone(&handler)));
            next
        });

        let subscribers: Arc<dyn Detach> = self.inner.clone();
        Subscription {
            target: Arc::downgrade(&subscribers),
            id,
        }
    }

    /// Delivers `item` to every current subscriber, in subscription order.
    pub fn publish(&self, item: &T) {
        let handlers = self.inner.snapshot();
        for (id, handler) in handlers.iter() {
            match panic::catch_unwind(AssertUnwindSafe(|| (handler.as_ref())(item))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    log::error!(
                        "Subscriber {} of stream '{}' failed: {}",
                        id,
                        self.inner.label,
                        e
                    );
                }
                Err(payload) => {
                    log::error!(
                        "Subscriber {} of stream '{}' panicked: {}",
                        id,
                        self.inner.label,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
    }

    /// Removes every subscriber.
    pub fn clear(&self) {
        self.inner.replace(|_| Vec::new());
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.snapshot().len()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Handle returned by [`Stream::subscribe`]
///
/// Does not keep the stream alive. Dropping the handle leaves the
/// subscription in place; call [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    target: Weak<dyn Detach>,
    id: u64,
}

impl Subscription {
    /// Removes the subscriber. Repeated calls, and calls after the stream
    /// is gone, do nothing.
    pub fn unsubscribe(&self) {
        if let Some(target) = self.target.upgrade() {
            if target.detach(self.id) {
                log::trace!("Subscriber {} detached", self.id);
            }
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(stream: &Stream<u32>) -> (Subscription, Arc<Mutex<Vec<u32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = stream.subscribe(move |n: &u32| {
            sink.lock().unwrap().push(*n);
            Ok(())
        });
        (sub, seen)
    }

    #[test]
    fn failing_subscriber_does_not_block_others() {
        let stream = Stream::new("test");
        let _bad = stream.subscribe(|_: &u32| Err("boom".into()));
        let (_sub, seen) = recorder(&stream);

        stream.publish(&1);
        stream.publish(&2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn panicking_subscriber_is_isolated() {
        let stream = Stream::new("test");
        let _bad = stream.subscribe(|n: &u32| -> HandlerResult {
            if *n > 0 {
                panic!("cannot handle {}", n);
            }
            Ok(())
        });
        let (_sub, seen) = recorder(&stream);

        stream.publish(&5);
        stream.publish(&6);
        assert_eq!(*seen.lock().unwrap(), vec![5, 6]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let stream = Stream::new("test");
        let (sub, seen) = recorder(&stream);
        assert_eq!(stream.subscriber_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        stream.publish(&1);

        assert_eq!(stream.subscriber_count(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unsubscribe_after_stream_dropped_is_noop() {
        let stream = Stream::new("test");
        let (sub, _) = recorder(&stream);
        drop(stream);
        sub.unsubscribe();
    }

    #[test]
    fn subscribe_during_publish_applies_to_next_publish() {
        let stream: Stream<u32> = Stream::new("test");
        let late_seen = Arc::new(Mutex::new(Vec::new()));

        let handle = stream.clone();
        let sink = Arc::clone(&late_seen);
        let _registrar = stream.subscribe(move |n: &u32| {
            if *n == 1 {
                let sink = Arc::clone(&sink);
                handle.subscribe(move |m: &u32| {
                    sink.lock().unwrap().push(*m);
                    Ok(())
                });
            }
            Ok(())
        });

        stream.publish(&1);
        assert!(late_seen.lock().unwrap().is_empty());
        stream.publish(&2);
        assert_eq!(*late_seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn clear_removes_everyone() {
        let stream = Stream::new("test");
        let (_a, seen_a) = recorder(&stream);
        let (_b, seen_b) = recorder(&stream);
        stream.clear();
        stream.publish(&3);
        assert!(seen_a.lock().unwrap().is_empty());
        assert!(seen_b.lock().unwrap().is_empty());
    }

    #[test]
    fn concurrent_subscribe_and_unsubscribe_lose_nothing() {
        let stream: Stream<u32> = Stream::new("test");
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let stream = stream.clone();
                std::thread::spawn(move || {
                    let subs: Vec<Subscription> =
                        (0..50).map(|_| stream.subscribe(|_: &u32| Ok(()))).collect();
                    for sub in subs.iter().step_by(2) {
                        sub.unsubscribe();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(stream.subscriber_count(), 8 * 25);
    }
}
