//! Subscription registry
//!
//! Maps element ids to subscribed scalar elements. Structural changes
//! (subscribe/unsubscribe) take the write lock; the receive path and the
//! staleness scan take the read lock just long enough to clone out the
//! elements they need, so listeners and network sends never run under it.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::codec::ValueUpdate;
use crate::element::DataRefElement;
use crate::string_element::StringDataRefElement;
use crate::{Error, Result};

/// Id-keyed set of live subscriptions
#[derive(Debug, Default)]
pub struct Registry {
    elements: RwLock<HashMap<i32, Arc<DataRefElement>>>,
    /// Ids given back by unsubscribe, reused before minting new ones
    released: Mutex<Vec<i32>>,
    next_id: AtomicI32,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out an id not currently in use
    pub fn allocate_id(&self) -> i32 {
        let elements = self.elements.read();
        let mut released = self.released.lock();
        while let Some(id) = released.pop() {
            if !elements.contains_key(&id) {
                return id;
            }
        }
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if !elements.contains_key(&id) {
                return id;
            }
        }
    }

    /// Register `element`, replacing any element stored under the same id
    ///
    /// A positive `frequency` overrides the element's own; `listener` is
    /// attached before the element becomes visible to the receive path.
    /// No request is sent here: never-updated elements are stale and get
    /// requested by the next staleness scan.
    pub fn subscribe<F>(
        &self,
        element: Arc<DataRefElement>,
        frequency: i32,
        listener: Option<F>,
    ) -> Result<()>
    where
        F: Fn(&DataRefElement, f32) + Send + Sync + 'static,
    {
        if element.path().is_empty() {
            return Err(Error::InvalidArgument(format!(
                "subscribe: element {} has no dataref path",
                element.id()
            )));
        }

        if frequency > 0 {
            element.set_frequency(frequency);
        }
        if let Some(listener) = listener {
            element.on_change(listener);
        }

        debug!(
            "subscribed {} (id: {}, {} Hz)",
            element.path(),
            element.id(),
            element.frequency()
        );

        if let Some(previous) = self.elements.write().insert(element.id(), element) {
            debug!("id {} replaced previous subscription {}", previous.id(), previous.path());
        }
        Ok(())
    }

    /// Subscribe every character of a string dataref
    ///
    /// Each offset gets its own scalar element with a freshly allocated id
    /// and path `"{base}[{offset}]"`. Returns the child elements.
    pub fn subscribe_string(
        &self,
        element: Arc<StringDataRefElement>,
        frequency: i32,
    ) -> Result<Vec<Arc<DataRefElement>>> {
        if element.path().is_empty() {
            return Err(Error::InvalidArgument(
                "subscribe: string dataref has no path".to_string(),
            ));
        }
        if element.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "subscribe: string dataref {} has zero length",
                element.path()
            )));
        }

        let mut children = Vec::with_capacity(element.len());
        for offset in 0..element.len() {
            let child = Arc::new(DataRefElement::new(
                self.allocate_id(),
                element.char_path(offset),
            ));
            let composite = element.clone();
            self.subscribe(
                child.clone(),
                frequency,
                Some(move |_: &DataRefElement, value: f32| composite.update(offset, value)),
            )?;
            children.push(child);
        }
        Ok(children)
    }

    /// Remove the element subscribed under `path`
    ///
    /// The caller is responsible for telling the simulator to stop.
    pub fn unsubscribe(&self, path: &str) -> Result<Arc<DataRefElement>> {
        let removed = {
            let mut elements = self.elements.write();
            let id = elements
                .iter()
                .find(|(_, e)| e.path() == path)
                .map(|(id, _)| *id);
            id.and_then(|id| elements.remove(&id))
        };

        match removed {
            Some(element) => {
                self.released.lock().push(element.id());
                debug!("unsubscribed {} (id: {})", path, element.id());
                Ok(element)
            }
            None => Err(Error::InvalidArgument(format!(
                "unsubscribe: no element in registry matches {}",
                path
            ))),
        }
    }

    pub fn get(&self, id: i32) -> Option<Arc<DataRefElement>> {
        self.elements.read().get(&id).cloned()
    }

    pub fn find_by_path(&self, path: &str) -> Option<Arc<DataRefElement>> {
        self.elements
            .read()
            .values()
            .find(|e| e.path() == path)
            .cloned()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.elements.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.read().is_empty()
    }

    /// Snapshot of all registered elements
    pub fn elements(&self) -> Vec<Arc<DataRefElement>> {
        self.elements.read().values().cloned().collect()
    }

    /// Elements whose last update is older than `max_age`
    pub fn stale(&self, now: Instant, max_age: Duration) -> Vec<Arc<DataRefElement>> {
        self.elements
            .read()
            .values()
            .filter(|e| e.is_stale(now, max_age))
            .cloned()
            .collect()
    }

    /// Apply decoded values in order
    ///
    /// `on_applied` runs after each element's own listeners. Stops at the
    /// first id that is not registered and reports it as a protocol
    /// violation; values before it stay applied.
    pub fn apply<F>(&self, updates: &[ValueUpdate], now: Instant, mut on_applied: F) -> Result<usize>
    where
        F: FnMut(&DataRefElement),
    {
        for (applied, update) in updates.iter().enumerate() {
            let Some(element) = self.get(update.id) else {
                debug!("{} of {} values applied before unknown id", applied, updates.len());
                return Err(Error::ProtocolViolation { id: update.id });
            };
            element.update(update.value, now);
            on_applied(element.as_ref());
        }
        Ok(updates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type NoListener = fn(&DataRefElement, f32);

    #[test]
    fn test_allocate_skips_taken_ids() {
        let registry = Registry::new();
        registry
            .subscribe(Arc::new(DataRefElement::new(0, "sim/a")), 1, None::<NoListener>)
            .unwrap();
        assert_eq!(registry.allocate_id(), 1);
        assert_eq!(registry.allocate_id(), 2);
    }

    #[test]
    fn test_released_ids_are_reused() {
        let registry = Registry::new();
        let id = registry.allocate_id();
        registry
            .subscribe(Arc::new(DataRefElement::new(id, "sim/a")), 1, None::<NoListener>)
            .unwrap();
        registry.unsubscribe("sim/a").unwrap();
        assert_eq!(registry.allocate_id(), id);
    }

    #[test]
    fn test_subscribe_rejects_empty_path() {
        let registry = Registry::new();
        let err = registry
            .subscribe(Arc::new(DataRefElement::new(4, "")), 1, None::<NoListener>)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_non_positive_frequency_keeps_element_frequency() {
        let registry = Registry::new();
        let element = Arc::new(DataRefElement::new(1, "sim/a").with_frequency(7));
        registry.subscribe(element.clone(), 0, None::<NoListener>).unwrap();
        assert_eq!(element.frequency(), 7);
        registry.subscribe(element.clone(), 20, None::<NoListener>).unwrap();
        assert_eq!(element.frequency(), 20);
    }

    #[test]
    fn test_resubscribe_same_id_replaces() {
        let registry = Registry::new();
        registry
            .subscribe(Arc::new(DataRefElement::new(9, "sim/old")), 1, None::<NoListener>)
            .unwrap();
        registry
            .subscribe(Arc::new(DataRefElement::new(9, "sim/new")), 1, None::<NoListener>)
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(9).unwrap().path(), "sim/new");
    }
}
