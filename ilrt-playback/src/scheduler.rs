//! Playback scheduler
//!
//! ## Scheduling Model
//!
//! Every item of a session gets its own one-shot task on the scheduler's
//! worker, keyed by its index. The task sleeps for the wall-clock delay the
//! [`VirtualTimeTracker`] reports for the item's offset from the first item,
//! waits for its turn, publishes and advances the shared `next_index`
//! marker with a compare-and-set:
//!
//! ```text
//! items:   [0]      [1]      [2]      [3]
//! tasks:    sleep ─▶ wait turn ─▶ publish ─▶ CAS(i, i+1) ─▶ notify
//! marker:   0 ──────▶ 1 ──────▶ 2 ──────▶ 3 ──────▶ 4
//! ```
//!
//! Speed changes and resume abort every pending task and spawn fresh ones
//! from the marker, with delays recomputed against the tracker. Aborting is
//! best effort: a task already inside `publish` finishes, so an item may be
//! delivered twice around a reschedule but is never skipped.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start──▶ Playing ⇄ Paused ──stop──▶ Idle ──shutdown──▶ (gone)
//! ```
//!
//! A session that has delivered everything stays active until
//! [`stop_playback`](PlaybackScheduler::stop_playback).

use std::pin::pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ilrt_core::stream::Stream;
use ilrt_core::time::{SystemClock, TimeSource, Timestamp};
use ilrt_core::{IlrtError, IlrtResult, Measurement, MeasurementVector, VirtualTimeTracker};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Anything that can be replayed: it has a timestamp and can be moved in time
pub trait PlaybackItem: Clone + Send + Sync + 'static {
    fn time_utc(&self) -> i64;

    /// Copy moved by `delta_ms`, nested timestamps included
    fn shifted_by(&self, delta_ms: i64) -> Self;
}

impl PlaybackItem for MeasurementVector {
    fn time_utc(&self) -> i64 {
        MeasurementVector::time_utc(self)
    }

    fn shifted_by(&self, delta_ms: i64) -> Self {
        MeasurementVector::shifted_by(self, delta_ms)
    }
}

impl PlaybackItem for Measurement {
    fn time_utc(&self) -> i64 {
        Measurement::time_utc(self)
    }

    fn shifted_by(&self, delta_ms: i64) -> Self {
        self.with_new_timestamp(self.time_utc().saturating_add(delta_ms))
    }
}

/// How delivered items are stamped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimestampMode {
    /// First item lands on the session start time, deltas preserved
    #[default]
    AnchorToStart,
    /// Items keep their recorded timestamps
    Original,
}

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackConfig {
    /// Initial speed factor, positive and finite
    pub speed: f64,
    /// How long `shutdown` waits for the worker before abandoning it
    pub shutdown_grace_ms: u64,
    /// Stamping used by [`PlaybackScheduler::start_playback`]
    pub timestamp_mode: TimestampMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            shutdown_grace_ms: 5_000,
            timestamp_mode: TimestampMode::default(),
        }
    }
}

/// State shared with the delivery tasks
struct Shared<T> {
    stream: Stream<T>,
    next_index: AtomicUsize,
    /// Bumped on start and stop so tasks of an old session stay silent
    generation: AtomicU64,
    turn: Notify,
}

struct Session<T> {
    items: Arc<Vec<T>>,
    first_time: i64,
    /// Added to every timestamp on delivery
    shift: i64,
    paused: bool,
}

struct State<T> {
    runtime: Option<Runtime>,
    tracker: VirtualTimeTracker,
    speed: f64,
    session: Option<Session<T>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<T> State<T> {
    fn cancel_tasks(&mut self) {
        let cancelled = self.tasks.len();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if cancelled > 0 {
            log::trace!("Cancelled {} pending deliveries", cancelled);
        }
    }
}

/// Replays a recorded sequence on a dedicated worker at (scaled) real time
pub struct PlaybackScheduler<T: PlaybackItem> {
    shared: Arc<Shared<T>>,
    state: Mutex<State<T>>,
    clock: Arc<dyn TimeSource>,
    config: PlaybackConfig,
}

impl<T: PlaybackItem> PlaybackScheduler<T> {
    /// Scheduler with default settings on the system clock
    pub fn new() -> IlrtResult<Self> {
        Self::with_config(PlaybackConfig::default())
    }

    pub fn with_config(config: PlaybackConfig) -> IlrtResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Scheduler reading wall-clock time from `clock`.
    ///
    /// Fails on an invalid configured speed or when the worker runtime
    /// cannot be built.
    pub fn with_clock(config: PlaybackConfig, clock: Arc<dyn TimeSource>) -> IlrtResult<Self> {
        let mut tracker = VirtualTimeTracker::new();
        tracker.set_speed(clock.now(), config.speed)?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ilrt-playback")
            .enable_time()
            .build()
            .map_err(|e| IlrtError::Runtime(e.to_string()))?;

        Ok(Self {
            shared: Arc::new(Shared {
                stream: Stream::new("playback"),
                next_index: AtomicUsize::new(0),
                generation: AtomicU64::new(0),
                turn: Notify::new(),
            }),
            state: Mutex::new(State {
                runtime: Some(runtime),
                tracker,
                speed: config.speed,
                session: None,
                tasks: Vec::new(),
            }),
            clock,
            config,
        })
    }

    /// Stream the items are published on
    pub fn stream(&self) -> &Stream<T> {
        &self.shared.stream
    }

    /// Starts a session stamped per the configured [`TimestampMode`].
    pub fn start_playback(&self, items: Vec<T>, start_time: Timestamp) -> IlrtResult<()> {
        self.start_playback_with_mode(items, start_time, self.config.timestamp_mode)
    }

    /// Starts a session.
    ///
    /// Rejected without any state change while another session is active,
    /// when `items` is empty, or after [`shutdown`](Self::shutdown).
    pub fn start_playback_with_mode(
        &self,
        items: Vec<T>,
        start_time: Timestamp,
        mode: TimestampMode,
    ) -> IlrtResult<()> {
        let mut state = self.lock_state();
        if state.runtime.is_none() {
            return Err(IlrtError::RuntimeUnavailable);
        }
        if state.session.is_some() {
            return Err(IlrtError::PlaybackActive);
        }
        let first_time = match items.first() {
            Some(first) => first.time_utc(),
            None => return Err(IlrtError::EmptyPlayback),
        };

        let shift = match mode {
            TimestampMode::Original => 0,
            TimestampMode::AnchorToStart => start_time.saturating_sub(first_time),
        };

        let now = self.clock.now();
        let speed = state.speed;
        state.tracker.start(now);
        state.tracker.set_speed(now, speed)?;

        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.next_index.store(0, Ordering::SeqCst);

        log::info!(
            "Starting playback of {} items at speed {} ({:?})",
            items.len(),
            speed,
            mode
        );
        state.session = Some(Session {
            items: Arc::new(items),
            first_time,
            shift,
            paused: false,
        });
        self.schedule_from_marker(&mut state);
        Ok(())
    }

    /// Changes the speed factor.
    ///
    /// While playing, pending deliveries are rescheduled for the new speed.
    /// Otherwise the speed is only recorded and applies to the next start
    /// or resume.
    pub fn set_speed(&self, factor: f64) -> IlrtResult<()> {
        let mut state = self.lock_state();
        state.tracker.set_speed(self.clock.now(), factor)?;
        state.speed = factor;

        let playing = state.session.as_ref().map_or(false, |s| !s.paused);
        if playing {
            log::debug!("Speed changed to {}, rescheduling", factor);
            state.cancel_tasks();
            self.schedule_from_marker(&mut state);
        }
        Ok(())
    }

    /// Freezes playback; nothing is delivered until [`resume`](Self::resume).
    pub fn pause(&self) {
        let mut state = self.lock_state();
        match state.session.as_mut() {
            Some(session) if !session.paused => session.paused = true,
            _ => return,
        }
        state.tracker.pause(self.clock.now());
        state.cancel_tasks();
        log::info!(
            "Playback paused after {} items",
            self.shared.next_index.load(Ordering::SeqCst)
        );
    }

    pub fn resume(&self) {
        let mut state = self.lock_state();
        let remaining = match state.session.as_mut() {
            Some(session) if session.paused => {
                session.paused = false;
                self.shared.next_index.load(Ordering::SeqCst) < session.items.len()
            }
            _ => return,
        };
        if !remaining {
            return;
        }
        state.tracker.resume(self.clock.now());
        log::info!("Playback resumed");
        self.schedule_from_marker(&mut state);
    }

    /// Cancels all pending deliveries and forgets the session. Safe to call
    /// when idle.
    pub fn stop_playback(&self) {
        let mut state = self.lock_state();
        self.stop_locked(&mut state);
    }

    /// Stops playback, drops all subscribers and shuts the worker down.
    ///
    /// Waits up to the configured grace period for the worker; from inside
    /// an async context the worker is released in the background instead.
    /// Every later start fails with [`IlrtError::RuntimeUnavailable`].
    pub fn shutdown(&self) {
        let runtime = {
            let mut state = self.lock_state();
            self.stop_locked(&mut state);
            state.runtime.take()
        };
        self.shared.stream.clear();

        let Some(runtime) = runtime else {
            return;
        };
        if Handle::try_current().is_ok() {
            runtime.shutdown_background();
        } else {
            runtime.shutdown_timeout(Duration::from_millis(self.config.shutdown_grace_ms));
        }
        log::info!("Playback worker shut down");
    }

    /// Session active, not paused, items left to deliver
    pub fn is_playing(&self) -> bool {
        let state = self.lock_state();
        state.session.as_ref().map_or(false, |s| {
            !s.paused && self.shared.next_index.load(Ordering::SeqCst) < s.items.len()
        })
    }

    /// Whether a session exists, finished or not
    pub fn is_active(&self) -> bool {
        self.lock_state().session.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.lock_state()
            .session
            .as_ref()
            .map_or(false, |s| s.paused)
    }

    pub fn speed(&self) -> f64 {
        self.lock_state().speed
    }

    /// Items delivered so far in the current session
    pub fn delivered_count(&self) -> usize {
        self.shared.next_index.load(Ordering::SeqCst)
    }

    fn lock_state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_locked(&self, state: &mut State<T>) {
        state.cancel_tasks();
        if state.session.take().is_some() {
            log::info!(
                "Playback stopped after {} items",
                self.shared.next_index.load(Ordering::SeqCst)
            );
        }
        state.tracker.reset();
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        self.shared.next_index.store(0, Ordering::SeqCst);
        self.shared.turn.notify_waiters();
    }

    /// Spawns one delivery task per undelivered item.
    fn schedule_from_marker(&self, state: &mut State<T>) {
        let (Some(runtime), Some(session)) = (state.runtime.as_ref(), state.session.as_ref()) else {
            return;
        };

        let now = self.clock.now();
        let from = self.shared.next_index.load(Ordering::SeqCst);
        let generation = self.shared.generation.load(Ordering::SeqCst);
        let mut spawned = Vec::with_capacity(session.items.len().saturating_sub(from));

        for (index, item) in session.items.iter().enumerate().skip(from) {
            let offset = item.time_utc().saturating_sub(session.first_time);
            let delay = state.tracker.calculate_delay(offset, now);
            let delivery = Delivery {
                shared: Arc::clone(&self.shared),
                items: Arc::clone(&session.items),
                index,
                shift: session.shift,
                generation,
            };
            spawned.push(runtime.spawn(delivery.run(delay_duration(delay))));
        }

        log::trace!(
            "Scheduled {} deliveries from index {}",
            spawned.len(),
            from
        );
        state.tasks.extend(spawned);
    }
}

impl<T: PlaybackItem> Drop for PlaybackScheduler<T> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.cancel_tasks();
        if let Some(runtime) = state.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn delay_duration(ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(ms).unwrap_or(0))
}

/// One scheduled delivery
struct Delivery<T> {
    shared: Arc<Shared<T>>,
    items: Arc<Vec<T>>,
    index: usize,
    shift: i64,
    generation: u64,
}

impl<T: PlaybackItem> Delivery<T> {
    async fn run(self, delay: Duration) {
        tokio::time::sleep(delay).await;
        if !self.wait_for_turn().await {
            return;
        }
        if self.shared.generation.load(Ordering::SeqCst) != self.generation {
            return;
        }
        let Some(item) = self.items.get(self.index) else {
            return;
        };

        let published = if self.shift == 0 {
            item.clone()
        } else {
            item.shifted_by(self.shift)
        };
        self.shared.stream.publish(&published);

        let index = self.index;
        if self
            .shared
            .next_index
            .compare_exchange(index, index + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            log::trace!("Delivered item {} at {}", index, published.time_utc());
        }
        self.shared.turn.notify_waiters();
    }

    /// Waits until every earlier item has gone out. `false` when this item
    /// was already delivered or its session ended.
    async fn wait_for_turn(&self) -> bool {
        loop {
            let mut notified = pin!(self.shared.turn.notified());
            notified.as_mut().enable();

            if self.shared.generation.load(Ordering::SeqCst) != self.generation {
                return false;
            }
            let next = self.shared.next_index.load(Ordering::SeqCst);
            if next > self.index {
                return false;
            }
            if next == self.index {
                return true;
            }
            notified.await;
        }
    }
}
