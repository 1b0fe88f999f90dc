use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Process-local key-value backend. Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
    }

    pub fn compare_and_swap(&self, key: &str, expected: Option<&str>, new: &str) -> bool {
        let mut entries = self.entries.lock().unwrap();
        if entries.get(key).map(String::as_str) == expected {
            entries.insert(key.to_owned(), new.to_owned());
            true
        } else {
            false
        }
    }
}
