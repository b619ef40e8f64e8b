//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type and related functionality
//! for resolving registered services from the DI container.

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::internal::{with_circular_catch, DisposeBag};
use crate::keyed::KeyedTeardown;
use crate::registration::{AnyArc, Registration, Registrations};
use crate::traits::{Dispose, Resolver, ResolverCore};
use crate::{DiError, DiResult, Key, Lifetime};

pub mod context;
pub use context::ResolverContext;

/// Service provider for resolving dependencies from the DI container.
///
/// Built from a `ServiceCollection`. Resolves host services by type, hosts one
/// `KeyedServices<T>` singleton per keyed service type, and owns the root
/// dispose bag that tears everything down in `dispose_all`.
///
/// # Thread Safety
///
/// ServiceProvider is `Send + Sync` and cheap to clone; clones share the same
/// singletons and the same keyed registries.
///
/// # Examples
///
/// ```
/// use keyed_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<Database>() }
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    registrations: Registrations,
    root_disposers: Mutex<DisposeBag>,
    /// Keyed registries in creation order. Never drained: each one keeps its
    /// own bag.
    keyed: Vec<Arc<dyn KeyedTeardown>>,
}

impl ServiceProvider {
    pub(crate) fn new(registrations: Registrations, keyed: Vec<Arc<dyn KeyedTeardown>>) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                registrations,
                root_disposers: Mutex::new(DisposeBag::default()),
                keyed,
            }),
        }
    }

    fn pending_disposals(&self) -> usize {
        let keyed: usize = self.inner.keyed.iter().map(|r| r.pending_disposals()).sum();
        keyed + self.inner.root_disposers.lock().len()
    }

    /// Disposes everything the provider owns.
    ///
    /// Disposers registered by host singleton factories run first, in LIFO
    /// order. Then every keyed registry disposes the keyed instances it built,
    /// most recently created registry first. Hooks are drained as they run, so
    /// a second call only runs hooks recorded since the first, including those
    /// of keyed instances built in between.
    ///
    /// # Examples
    ///
    /// ```
    /// use keyed_di::{Dispose, KeyedResolver, KeyedServiceCollectionExt, ServiceCollection};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// struct Connection { closed: Arc<AtomicUsize> }
    /// impl Dispose for Connection {
    ///     fn dispose(&self) {
    ///         self.closed.fetch_add(1, Ordering::SeqCst);
    ///     }
    /// }
    ///
    /// # fn main() -> keyed_di::DiResult<()> {
    /// let closed = Arc::new(AtomicUsize::new(0));
    /// let counter = closed.clone();
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_keyed_singleton_disposable("primary", move |_| Connection { closed: counter.clone() })?;
    ///
    /// let provider = services.build();
    /// provider.get_by_key::<Connection>("primary")?;
    /// provider.dispose_all();
    /// provider.dispose_all();
    /// assert_eq!(closed.load(Ordering::SeqCst), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn dispose_all(&self) {
        let mut bag = self.inner.root_disposers.lock().take();
        tracing::debug!(
            hooks = bag.len(),
            keyed_registries = self.inner.keyed.len(),
            "disposing service provider"
        );
        bag.run_all_sync_reverse();
        for registry in self.inner.keyed.iter().rev() {
            registry.dispose();
        }
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Service Provider Debug ===\n");
        for (k, r) in self.inner.registrations.iter() {
            let state = if r.single.get().is_some() { "built" } else { "pending" };
            s.push_str(&format!("  {:?}: {:?} ({})\n", k, r.lifetime, state));
        }
        s
    }

    fn resolve_registration(&self, key: &Key, reg: &Registration) -> DiResult<AnyArc> {
        match reg.lifetime {
            Lifetime::Singleton => {
                if let Some(value) = reg.single.get() {
                    return Ok(value.clone());
                }
                with_circular_catch(Cow::Borrowed(key.display_name()), || {
                    reg.single
                        .get_or_try_init(|| {
                            let ctx = ResolverContext::new(self);
                            (reg.ctor)(&ctx)
                        })
                        .cloned()
                })
            }
            Lifetime::Transient => with_circular_catch(Cow::Borrowed(key.display_name()), || {
                let ctx = ResolverContext::new(self);
                (reg.ctor)(&ctx)
            }),
        }
    }
}

impl Clone for ServiceProvider {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for ServiceProvider {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let pending = self.pending_disposals();
            if pending > 0 {
                tracing::warn!(
                    hooks = pending,
                    "ServiceProvider dropped with undisposed resources. Call dispose_all() before dropping."
                );
            }
        }
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        match self.inner.registrations.get(key) {
            Some(reg) => self.resolve_registration(key, reg),
            None => Err(DiError::NotFound(key.display_name())),
        }
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.inner.root_disposers.lock().push_sync(f);
    }
}

impl Resolver for ServiceProvider {}
