//! Host registration storage.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;

use crate::provider::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Ctor = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Host registration: lifetime, constructor, and the singleton cache.
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    pub(crate) ctor: Ctor,
    /// Populated on first resolution of a singleton; unused for transients.
    pub(crate) single: OnceCell<AnyArc>,
}

impl Registration {
    pub(crate) fn new(lifetime: Lifetime, ctor: Ctor) -> Self {
        Self {
            lifetime,
            ctor,
            single: OnceCell::new(),
        }
    }
}

/// All host registrations, last registration for a key wins.
#[derive(Default)]
pub(crate) struct Registrations {
    one: HashMap<Key, Registration>,
}

impl Registrations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: Key, registration: Registration) {
        self.one.insert(key, registration);
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.one.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &Key) -> Option<&mut Registration> {
        self.one.get_mut(key)
    }

    #[inline(always)]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.one.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.one.len()
    }

    #[cfg(feature = "diagnostics")]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.one.iter()
    }
}
