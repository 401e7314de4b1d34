use std::sync::{Arc, RwLock};

/// Holds the session cookies returned by the backend when a session is created.
///
/// Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    cookies: Arc<RwLock<Option<String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        match self.cookies.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, cookies: String) {
        match self.cookies.write() {
            Ok(mut guard) => *guard = Some(cookies),
            Err(poisoned) => *poisoned.into_inner() = Some(cookies),
        }
    }

    pub fn clear(&self) {
        match self.cookies.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.get().is_some()
    }
}
