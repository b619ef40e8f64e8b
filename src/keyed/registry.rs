//! The per-type keyed service registry.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use crate::error::{DiError, DiResult};
use crate::internal::{with_circular_catch, DisposeBag};
use crate::key::Key;
use crate::keyed::chain::{FactoryChain, KeyedDecorator, KeyedFactory};
use crate::provider::ResolverContext;
use crate::traits::{Dispose, Resolver, ResolverCore};

/// Everything the registry knows about one key.
struct Slot<T: ?Sized> {
    chain: FactoryChain<T>,
    /// Set by the first `get`; from then on the chain is frozen.
    claimed: AtomicBool,
    instance: OnceCell<Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Slot<T> {
    fn new(chain: FactoryChain<T>) -> Self {
        Self {
            chain,
            claimed: AtomicBool::new(false),
            instance: OnceCell::new(),
        }
    }
}

/// Keyed singletons of one service type `T`.
///
/// One registry exists per `T` and lives in the host container as a
/// singleton. It maps string keys to factory chains, builds each key's
/// instance on first request, keeps it for its own lifetime, and disposes
/// whatever disposables were recorded while building.
///
/// Construction of a key runs at most once, even when many threads ask for
/// the same key at the same time. Locks are per key during construction, so
/// building one key never blocks resolving another. A construction that fails
/// is not memoized and the next `get` tries again.
///
/// Usually reached through [`KeyedServiceCollectionExt`](crate::KeyedServiceCollectionExt)
/// and [`KeyedResolver`](crate::KeyedResolver), but it can be driven directly:
///
/// ```
/// use keyed_di::{KeyedServices, ServiceCollection};
/// use std::sync::Arc;
///
/// # fn main() -> keyed_di::DiResult<()> {
/// let provider = ServiceCollection::new().build();
/// let registry = KeyedServices::<str>::new();
///
/// registry.add("greeting", |_| Ok(Arc::from("hello")))?;
/// registry.decorate("greeting", |_, inner| Ok(Arc::from(format!("{}!", inner).as_str())))?;
///
/// assert_eq!(&*registry.get("greeting", &provider)?, "hello!");
/// assert!(registry.is_resolved("greeting"));
/// # Ok(())
/// # }
/// ```
pub struct KeyedServices<T: ?Sized + Send + Sync + 'static> {
    slots: RwLock<HashMap<String, Arc<Slot<T>>>>,
    disposables: Mutex<DisposeBag>,
}

impl<T: ?Sized + Send + Sync + 'static> Default for KeyedServices<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Send + Sync + 'static> KeyedServices<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            disposables: Mutex::new(DisposeBag::default()),
        }
    }

    fn service_name() -> &'static str {
        std::any::type_name::<T>()
    }

    /// Adds the initial factory for `key`.
    ///
    /// Fails with [`DiError::DuplicateKey`] when `key` already has a factory;
    /// the existing factory is left untouched.
    pub fn add<F>(&self, key: impl Into<String>, factory: F) -> DiResult<()>
    where
        F: Fn(&ResolverContext) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let factory: KeyedFactory<T> = Arc::new(factory);
        self.insert(key.into(), FactoryChain::new(factory))
    }

    fn insert(&self, key: String, chain: FactoryChain<T>) -> DiResult<()> {
        let mut slots = self.slots.write();
        if slots.contains_key(&key) {
            return Err(DiError::DuplicateKey {
                service: Self::service_name(),
                key,
            });
        }

        tracing::debug!(service = Self::service_name(), key = key.as_str(), "adding keyed factory");
        slots.insert(key, Arc::new(Slot::new(chain)));
        Ok(())
    }

    /// Layers `decorator` over the chain of `key`.
    ///
    /// The decorator receives whatever the chain built so far returns, so the
    /// most recently added decorator is the outermost one.
    ///
    /// # Errors
    ///
    /// - [`DiError::DecorateUnknownKey`] when `key` has no factory.
    /// - [`DiError::KeyAlreadyRequested`] when `key` has already been requested,
    ///   whether or not that request managed to build it.
    pub fn decorate<F>(&self, key: &str, decorator: F) -> DiResult<()>
    where
        F: Fn(&ResolverContext, Arc<T>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let mut slots = self.slots.write();
        let slot = slots.get(key).ok_or_else(|| DiError::DecorateUnknownKey {
            service: Self::service_name(),
            key: key.to_string(),
        })?;
        if slot.claimed.load(Ordering::Acquire) {
            return Err(DiError::KeyAlreadyRequested {
                service: Self::service_name(),
                key: key.to_string(),
            });
        }

        let decorator: KeyedDecorator<T> = Arc::new(decorator);
        let chain = slot.chain.decorated(decorator);
        tracing::debug!(
            service = Self::service_name(),
            key,
            decorators = chain.depth(),
            "decorating keyed service"
        );
        slots.insert(key.to_string(), Arc::new(Slot::new(chain)));
        Ok(())
    }

    /// Layers `decorator` over the chain of every key registered so far.
    ///
    /// Keys added afterwards are not decorated. Either every current key is
    /// decorated or, on error, none is.
    ///
    /// # Errors
    ///
    /// [`DiError::KeyAlreadyRequested`] when any current key has already been
    /// requested.
    pub fn decorate_all<F>(&self, decorator: F) -> DiResult<()>
    where
        F: Fn(&ResolverContext, Arc<T>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let mut slots = self.slots.write();

        let mut claimed: Vec<&String> = slots
            .iter()
            .filter(|(_, slot)| slot.claimed.load(Ordering::Acquire))
            .map(|(key, _)| key)
            .collect();
        claimed.sort();
        if let Some(key) = claimed.first() {
            return Err(DiError::KeyAlreadyRequested {
                service: Self::service_name(),
                key: key.to_string(),
            });
        }

        let decorator: KeyedDecorator<T> = Arc::new(decorator);
        for slot in slots.values_mut() {
            *slot = Arc::new(Slot::new(slot.chain.decorated(decorator.clone())));
        }
        tracing::debug!(service = Self::service_name(), keys = slots.len(), "decorating all keyed services");
        Ok(())
    }

    /// Returns the instance of `key`, building it on first request.
    ///
    /// `resolver` is what factories and decorators see through their
    /// `ResolverContext`. Disposers they register are recorded here, not in
    /// the resolver.
    ///
    /// # Errors
    ///
    /// - [`DiError::KeyNotFound`] when `key` was never added.
    /// - [`DiError::Circular`] when building `key` requires `key` itself.
    /// - Any error returned by the factory chain, unchanged.
    pub fn get(&self, key: &str, resolver: &dyn ResolverCore) -> DiResult<Arc<T>> {
        let slot = {
            let slots = self.slots.read();
            let slot = slots.get(key).ok_or_else(|| DiError::KeyNotFound {
                service: Self::service_name(),
                key: key.to_string(),
            })?;
            slot.claimed.store(true, Ordering::Release);
            slot.clone()
        };

        if let Some(instance) = slot.instance.get() {
            tracing::trace!(service = Self::service_name(), key, "keyed service cache hit");
            return Ok(instance.clone());
        }

        let name = format!("{}[{}]", Self::service_name(), key);
        with_circular_catch(Cow::Owned(name), || {
            slot.instance
                .get_or_try_init(|| {
                    tracing::debug!(service = Self::service_name(), key, "constructing keyed service");
                    let construction = KeyedConstruction {
                        resolver,
                        disposables: &self.disposables,
                    };
                    let ctx = ResolverContext::new(&construction);
                    slot.chain.build(&ctx)
                })
                .cloned()
        })
    }

    /// Returns true when `key` has a factory.
    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.read().contains_key(key)
    }

    /// Returns true when the instance of `key` has been built.
    pub fn is_resolved(&self, key: &str) -> bool {
        self.slots
            .read()
            .get(key)
            .map_or(false, |slot| slot.instance.get().is_some())
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let slots = self.slots.read();
        let mut keys: Vec<&String> = slots.keys().collect();
        keys.sort();

        let mut s = format!("=== Keyed services of {} ===\n", Self::service_name());
        for key in keys {
            let slot = &slots[key];
            let state = if slot.instance.get().is_some() { "built" } else { "pending" };
            s.push_str(&format!("  {}: {} decorator(s), {}\n", key, slot.chain.depth(), state));
        }
        s.push_str(&format!("  disposables: {}\n", self.disposables.lock().len()));
        s
    }
}

impl<T: ?Sized + Dispose> KeyedServices<T> {
    /// Adds the initial factory for `key` of a disposable service.
    ///
    /// Every value built for `key` is recorded for disposal: the factory's
    /// output, and the output of each decorator layered on `key` afterwards.
    pub fn add_disposable<F>(&self, key: impl Into<String>, factory: F) -> DiResult<()>
    where
        F: Fn(&ResolverContext) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let factory: KeyedFactory<T> = Arc::new(move |ctx: &ResolverContext| -> DiResult<Arc<T>> {
            let value = factory(ctx)?;
            ctx.register_disposer(value.clone());
            Ok(value)
        });
        self.insert(key.into(), FactoryChain::disposable(factory))
    }

    /// Adds a pre-built disposable value under `key`.
    ///
    /// The value is recorded for disposal once, on the first request of `key`.
    /// A value that is never requested is never disposed.
    pub fn add_disposable_instance(&self, key: impl Into<String>, value: Arc<T>) -> DiResult<()> {
        let recorded = AtomicBool::new(false);
        let factory: KeyedFactory<T> = Arc::new(move |ctx: &ResolverContext| -> DiResult<Arc<T>> {
            if !recorded.swap(true, Ordering::AcqRel) {
                ctx.register_disposer(value.clone());
            }
            Ok(value.clone())
        });
        self.insert(key.into(), FactoryChain::disposable(factory))
    }
}

/// Disposes every recorded instance, most recently built first.
///
/// Instances that were never built are never disposed. Each recorded hook runs
/// once; calling `dispose` again only runs hooks recorded since the last call.
impl<T: ?Sized + Send + Sync + 'static> Dispose for KeyedServices<T> {
    fn dispose(&self) {
        let mut bag = self.disposables.lock().take();
        tracing::debug!(service = Self::service_name(), hooks = bag.len(), "disposing keyed services");
        bag.run_all_sync_reverse();
    }
}

/// What the provider needs from a keyed registry at teardown.
pub(crate) trait KeyedTeardown: Dispose {
    /// Hooks recorded and not yet run.
    fn pending_disposals(&self) -> usize;
}

impl<T: ?Sized + Send + Sync + 'static> KeyedTeardown for KeyedServices<T> {
    fn pending_disposals(&self) -> usize {
        self.disposables.lock().len()
    }
}

/// Resolver seen by a keyed factory chain while it builds an instance.
///
/// Resolution goes to the outer resolver; disposers go to the registry.
struct KeyedConstruction<'a> {
    resolver: &'a dyn ResolverCore,
    disposables: &'a Mutex<DisposeBag>,
}

impl<'a> ResolverCore for KeyedConstruction<'a> {
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.resolver.resolve_any(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.disposables.lock().push_sync(f);
    }
}
