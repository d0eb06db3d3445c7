//! Scalar dataref subscriptions

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::DEFAULT_FREQUENCY;

/// Change listener for a scalar dataref
pub type ValueListener = Arc<dyn Fn(&DataRefElement, f32) + Send + Sync>;

/// One subscribed scalar dataref
///
/// The id doubles as the wire correlation id and the registry key. Value
/// fields are updated by the receive path only and read concurrently by the
/// staleness scan, so each one is individually atomic.
pub struct DataRefElement {
    id: i32,
    path: String,
    description: Option<String>,
    frequency: AtomicI32,
    /// `f32` bit pattern
    value: AtomicU32,
    last_update: Mutex<Option<Instant>>,
    listeners: RwLock<Vec<ValueListener>>,
}

impl DataRefElement {
    /// Create an element for `path` under a caller-chosen id
    pub fn new(id: i32, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            description: None,
            frequency: AtomicI32::new(DEFAULT_FREQUENCY),
            value: AtomicU32::new(0f32.to_bits()),
            last_update: Mutex::new(None),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Set the requested update rate
    pub fn with_frequency(self, frequency: i32) -> Self {
        self.frequency.store(frequency, Ordering::Relaxed);
        self
    }

    /// Attach a human-readable description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Requested updates per second
    pub fn frequency(&self) -> i32 {
        self.frequency.load(Ordering::Relaxed)
    }

    pub fn set_frequency(&self, frequency: i32) {
        self.frequency.store(frequency, Ordering::Relaxed);
    }

    /// Last received value (0.0 until the first update)
    pub fn value(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Acquire))
    }

    /// When the last value arrived
    pub fn last_update(&self) -> Option<Instant> {
        *self.last_update.lock()
    }

    /// True once at least one value has been received
    pub fn is_initialized(&self) -> bool {
        self.last_update.lock().is_some()
    }

    /// Time since the last update, `None` if nothing was ever received
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.last_update()
            .map(|at| now.saturating_duration_since(at))
    }

    /// Whether the element needs to be requested again
    ///
    /// An element that never received a value is always stale.
    pub fn is_stale(&self, now: Instant, max_age: Duration) -> bool {
        match self.age(now) {
            Some(age) => age > max_age,
            None => true,
        }
    }

    /// Register a change listener; listeners run in registration order
    pub fn on_change<F>(&self, listener: F)
    where
        F: Fn(&DataRefElement, f32) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Store a freshly decoded value and notify listeners
    pub fn update(&self, value: f32, now: Instant) {
        self.value.store(value.to_bits(), Ordering::Release);
        *self.last_update.lock() = Some(now);

        // Listeners may subscribe further listeners, so call them unlocked
        let listeners: Vec<ValueListener> = self.listeners.read().clone();
        for listener in listeners {
            listener(self, value);
        }
    }
}

impl fmt::Debug for DataRefElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataRefElement")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("frequency", &self.frequency())
            .field("value", &self.value())
            .field("last_update", &self.last_update())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
