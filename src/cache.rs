use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

/// Collection handles keyed by name, guarded by its own lock.
/// The lock is never held while a handle is being derived.
pub struct CollectionCache<C> {
    inner: RwLock<HashMap<String, C>>,
}

impl<C> Default for CollectionCache<C> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<C> Debug for CollectionCache<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionCache")
            .field("names", &self.names())
            .finish()
    }
}

impl<C: Clone> CollectionCache<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<C> {
        self.inner.read().get(name).cloned()
    }

    /// Look up `name`, deriving and storing it on a miss.
    /// Two racing misses may both call `derive`; the later insert wins.
    pub fn get_or_derive<F>(&self, name: &str, derive: F) -> Option<C>
    where
        F: FnOnce() -> Option<C>,
    {
        if let Some(c) = self.get(name) {
            return Some(c);
        }
        let c = derive()?;
        self.inner.write().insert(name.to_string(), c.clone());
        Some(c)
    }
}

impl<C> CollectionCache<C> {
    /// Swap the whole content in one step
    pub fn replace(&self, map: HashMap<String, C>) {
        *self.inner.write() = map;
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    /// Cached names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().keys().cloned().collect();
        names.sort();
        names
    }
}
