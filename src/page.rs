//! Field handles and the page that owns them.
//!
//! The binder only ever sees [`Field`] handles passed in explicitly. [`Page`]
//! is the in-process stand-in for the admin form: it resolves element ids and
//! hidden inputs, and [`InputField`] dispatches key-release events to the
//! listeners registered on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

/// Listener invoked on every key release in a field
pub type KeyUpListener = Arc<dyn Fn() + Send + Sync>;

/// A text input the binder reads from and writes into
pub trait Field: Send + Sync {
    fn id(&self) -> &str;

    fn value(&self) -> String;

    fn set_value(&self, value: &str);

    fn add_key_up_listener(&self, listener: KeyUpListener);
}

#[derive(Default)]
pub struct InputField {
    id: String,
    value: RwLock<String>,
    listeners: Mutex<Vec<KeyUpListener>>,
}

impl InputField {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_value(id: impl Into<String>, value: impl Into<String>) -> Self {
        let field = Self::new(id);
        field.set_value(&value.into());
        field
    }

    /// Dispatch a key-release event to every registered listener
    pub fn key_up(&self) {
        // Listeners run outside the lock so they may touch the field.
        let listeners: Vec<KeyUpListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener();
        }
    }

    /// Replace the value and fire key-up, as a keystroke would
    pub fn type_text(&self, text: &str) {
        self.set_value(text);
        self.key_up();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Field for InputField {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> String {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_value(&self, value: &str) {
        let mut current = self.value.write().unwrap_or_else(PoisonError::into_inner);
        *current = value.to_string();
    }

    fn add_key_up_listener(&self, listener: KeyUpListener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

/// Form markup: text inputs by element id and hidden inputs by name
#[derive(Default)]
pub struct Page {
    fields: HashMap<String, Arc<InputField>>,
    hidden_inputs: RwLock<HashMap<String, String>>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: InputField) -> Self {
        self.fields.insert(field.id().to_string(), Arc::new(field));
        self
    }

    pub fn with_hidden_input(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_hidden_input(name, value);
        self
    }

    pub fn element_by_id(&self, id: &str) -> Option<Arc<InputField>> {
        let field = self.fields.get(id).cloned();
        if field.is_none() {
            debug!("No element with id '{}'", id);
        }
        field
    }

    pub fn hidden_input_value(&self, name: &str) -> Option<String> {
        self.hidden_inputs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn set_hidden_input(&self, name: impl Into<String>, value: impl Into<String>) {
        self.hidden_inputs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    pub fn remove_hidden_input(&self, name: &str) -> Option<String> {
        self.hidden_inputs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_type_text_fires_listeners() {
        let field = InputField::new("id_name_ar");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        field.add_key_up_listener(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        field.type_text("س");
        field.type_text("سل");

        assert_eq!(field.value(), "سل");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(field.listener_count(), 1);
    }

    #[test]
    fn test_page_lookup() {
        let page = Page::new()
            .with_field(InputField::with_value("id_name_en", "Tower"))
            .with_hidden_input("csrfmiddlewaretoken", "abc");

        assert_eq!(page.element_by_id("id_name_en").unwrap().value(), "Tower");
        assert!(page.element_by_id("id_name_ar").is_none());
        assert_eq!(page.hidden_input_value("csrfmiddlewaretoken").as_deref(), Some("abc"));

        page.remove_hidden_input("csrfmiddlewaretoken");
        assert!(page.hidden_input_value("csrfmiddlewaretoken").is_none());
    }
}
