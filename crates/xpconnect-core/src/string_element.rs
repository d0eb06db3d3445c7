//! String datarefs
//!
//! X-Plane exposes strings as byte arrays. Each character offset is streamed
//! as its own scalar subscription (`path[0]`, `path[1]`, ...) and written back
//! into a fixed-length buffer here.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

/// Change listener for a string dataref
pub type StringListener = Arc<dyn Fn(&StringDataRefElement, &str) + Send + Sync>;

/// Composite string dataref assembled from per-character elements
pub struct StringDataRefElement {
    path: String,
    buffer: Mutex<Vec<char>>,
    listeners: RwLock<Vec<StringListener>>,
}

impl StringDataRefElement {
    /// Create a composite of `length` characters for the array dataref `path`
    pub fn new(path: impl Into<String>, length: usize) -> Self {
        Self {
            path: path.into(),
            buffer: Mutex::new(vec!['\0'; length]),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Base path, without an index
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Declared string length
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the scalar element carrying character `offset`
    pub fn char_path(&self, offset: usize) -> String {
        format!("{}[{}]", self.path, offset)
    }

    /// Current text, up to the first unfilled or NUL character
    pub fn value(&self) -> String {
        self.buffer
            .lock()
            .iter()
            .take_while(|c| **c != '\0')
            .collect()
    }

    /// Register a change listener; listeners run in registration order
    pub fn on_change<F>(&self, listener: F)
    where
        F: Fn(&StringDataRefElement, &str) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Write the character carried by `value` at `offset` and notify
    ///
    /// Listeners fire on every character update, not once the whole
    /// string has arrived. Offsets past the declared length are ignored.
    pub fn update(&self, offset: usize, value: f32) {
        {
            let mut buffer = self.buffer.lock();
            let Some(slot) = buffer.get_mut(offset) else {
                tracing::debug!("{}: offset {} outside buffer", self.path, offset);
                return;
            };
            *slot = code_point_to_char(value);
        }

        let text = self.value();
        let listeners: Vec<StringListener> = self.listeners.read().clone();
        for listener in listeners {
            listener(self, &text);
        }
    }
}

fn code_point_to_char(value: f32) -> char {
    // Negative and NaN saturate to 0, i.e. NUL
    char::from_u32(value as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

impl fmt::Debug for StringDataRefElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringDataRefElement")
            .field("path", &self.path)
            .field("length", &self.len())
            .field("value", &self.value())
            .finish()
    }
}
