//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of_trait, key_of_type, Key};
use crate::traits::Dispose;

/// Object-safe resolution core.
///
/// Implemented by the `ServiceProvider`, by `ResolverContext`, and by the
/// adapter a keyed registry installs while it constructs an instance. That
/// adapter is how disposers registered by keyed factories end up in the
/// registry's own dispose bag instead of the provider's.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single host service.
    ///
    /// Returns the service as `Arc<dyn Any>`; the typed helpers on [`Resolver`]
    /// take care of the downcast.
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>>;

    /// Registers a synchronous disposal hook with whatever owns the current
    /// construction (the provider root, or a keyed registry).
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);
}

/// Typed resolution helpers built on [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use keyed_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str);
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) {
///         println!("LOG: {}", msg);
///     }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(42usize);
/// collection.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
///
/// let provider = collection.build();
/// assert_eq!(*provider.get_required::<usize>(), 42);
/// provider.get_required_trait::<dyn Logger>().log("resolved");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    fn get<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&key_of_type::<T>())?;
        any.downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a trait object registered with `add_singleton_trait*`.
    fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let any = self.resolve_any(&key_of_trait::<T>())?;
        // Trait objects are stored as Arc<Arc<dyn Trait>>
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves a concrete service type, panicking on failure.
    ///
    /// ```should_panic
    /// use keyed_di::{ServiceCollection, Resolver};
    ///
    /// let provider = ServiceCollection::new().build();
    /// let _ = provider.get_required::<String>();
    /// ```
    fn get_required<T: 'static + Send + Sync>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait object, panicking on failure.
    fn get_required_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Arc<T> {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    /// Registers a service for disposal when its owner is torn down.
    ///
    /// Called from a factory, the hook belongs to the provider for plain
    /// singletons and to the keyed registry for keyed services.
    ///
    /// # Examples
    ///
    /// ```
    /// use keyed_di::{Dispose, ServiceCollection, Resolver};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    ///
    /// struct Pool { closed: AtomicBool }
    /// impl Dispose for Pool {
    ///     fn dispose(&self) {
    ///         self.closed.store(true, Ordering::SeqCst);
    ///     }
    /// }
    ///
    /// let pool = Arc::new(Pool { closed: AtomicBool::new(false) });
    /// let handle = pool.clone();
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_factory::<u8, _>(move |r| {
    ///     r.register_disposer(handle.clone());
    ///     1
    /// });
    ///
    /// let provider = services.build();
    /// provider.get_required::<u8>();
    /// provider.dispose_all();
    /// assert!(pool.closed.load(Ordering::SeqCst));
    /// ```
    fn register_disposer<T>(&self, service: Arc<T>)
    where
        T: ?Sized + Dispose,
    {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }
}
