//! Registry of local objects callable from the JVM.

use crate::error::Result;
use crate::protocol::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A local object the JVM can invoke methods on.
///
/// Implementations receive the decoded arguments and return a [`Value`]
/// (use [`Value::Null`] for `void` methods). An `Err` is reported back to
/// the JVM as an invocation failure with the error's display text.
#[async_trait::async_trait]
pub trait CallbackObject: Send + Sync + 'static {
    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value>;
}

struct Registered {
    object: Arc<dyn CallbackObject>,
    interfaces: Vec<String>,
}

/// Shared registry mapping `p<n>` IDs to local objects.
///
/// The registry is mutated from two sides — the outbound encoder registers
/// objects, the callback server looks them up and removes them — and a
/// single interior mutex serializes both. IDs are never reused within a
/// session.
pub struct CallbackRegistry {
    inner: Mutex<RegistryInner>,
}

struct RegistryInner {
    next_id: u64,
    objects: HashMap<String, Registered>,
    /// Object identity -> assigned ID, so re-encoding the same object
    /// reuses its registration.
    by_identity: HashMap<usize, String>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 0,
                objects: HashMap::new(),
                by_identity: HashMap::new(),
            }),
        }
    }

    /// Register an object and return its ID. Registering the same object
    /// again returns the ID from its first registration.
    pub fn register(&self, object: Arc<dyn CallbackObject>, interfaces: Vec<String>) -> String {
        let identity = Arc::as_ptr(&object) as *const () as usize;
        let mut inner = self.inner.lock().unwrap();
        if let Some(id) = inner.by_identity.get(&identity) {
            return id.clone();
        }
        let id = format!("p{}", inner.next_id);
        inner.next_id += 1;
        inner.by_identity.insert(identity, id.clone());
        inner.objects.insert(
            id.clone(),
            Registered { object, interfaces },
        );
        id
    }

    /// Look up a registered object by ID.
    pub fn lookup(&self, id: &str) -> Option<(Arc<dyn CallbackObject>, Vec<String>)> {
        let inner = self.inner.lock().unwrap();
        inner
            .objects
            .get(id)
            .map(|r| (r.object.clone(), r.interfaces.clone()))
    }

    /// Remove a registration. Idempotent: removing an absent ID is a no-op.
    pub fn remove(&self, id: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(removed) = inner.objects.remove(id) {
            let identity = Arc::as_ptr(&removed.object) as *const () as usize;
            inner.by_identity.remove(&identity);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().unwrap().objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("CallbackRegistry")
            .field("registered", &inner.objects.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}
