//! Container-facing keyed operations.

use std::sync::Arc;

use crate::collection::ServiceCollection;
use crate::error::{DiError, DiResult};
use crate::keyed::KeyedServices;
use crate::provider::ResolverContext;
use crate::traits::{Dispose, Resolver};

/// Keyed registration on a [`ServiceCollection`].
///
/// The first keyed registration of a service type `T` creates its
/// `KeyedServices<T>` registry and registers it as a host singleton; later
/// calls reuse it. Every method reports misconfiguration right away, at the
/// call that caused it.
///
/// # Examples
///
/// ```
/// use keyed_di::{KeyedResolver, KeyedServiceCollectionExt, ServiceCollection};
/// use std::sync::Arc;
///
/// # fn main() -> keyed_di::DiResult<()> {
/// let mut services = ServiceCollection::new();
/// services
///     .add_keyed_singleton("blub", "blub".to_string())?
///     .add_keyed_singleton("bløb", "bløb".to_string())?
///     .decorate_keyed::<String, _>("blub", |_, s| Arc::new(format!("DECORATED{}", s)))?;
///
/// let provider = services.build();
/// assert_eq!(&*provider.get_by_key::<String>("blub")?, "DECORATEDblub");
/// assert_eq!(&*provider.get_by_key::<String>("bløb")?, "bløb");
/// # Ok(())
/// # }
/// ```
pub trait KeyedServiceCollectionExt {
    /// Registers a pre-built value under `key`.
    fn add_keyed_singleton<T>(&mut self, key: impl Into<String>, value: T) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static;

    /// Registers a pre-built disposable value under `key`.
    ///
    /// The value is disposed with the registry once `key` has been requested.
    fn add_keyed_singleton_disposable_instance<T>(&mut self, key: impl Into<String>, value: T) -> DiResult<&mut Self>
    where
        T: Dispose;

    /// Registers a factory for `key`, run on first request of that key.
    fn add_keyed_singleton_factory<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static;

    /// Registers a fallible factory for `key`.
    ///
    /// A failure reaches the caller of `get_by_key` unchanged and is not
    /// cached: the next request runs the factory again.
    fn add_keyed_singleton_try_factory<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static;

    /// Registers a factory for a disposable `T`.
    ///
    /// The built value is disposed with the registry, and so is every value a
    /// decorator of `key` returns.
    fn add_keyed_singleton_disposable<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: Dispose,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static;

    /// Registers a trait object factory for `key`.
    fn add_keyed_singleton_trait_factory<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Arc<T> + Send + Sync + 'static;

    /// Registers a trait object factory whose trait has `Dispose` as a
    /// supertrait.
    ///
    /// The built value is disposed with the registry, and so is every value a
    /// decorator of `key` returns.
    fn add_keyed_singleton_trait_disposable<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Dispose,
        F: Fn(&ResolverContext) -> Arc<T> + Send + Sync + 'static;

    /// Decorates the service registered under `key`.
    ///
    /// When `key` was registered through a `*_disposable` method, the value the
    /// decorator returns is disposed with the registry as well, unless it is
    /// the very value the decorator received.
    ///
    /// # Errors
    ///
    /// - [`DiError::RegistryNotRegistered`] before any keyed registration of `T`.
    /// - [`DiError::DecorateUnknownKey`] when `key` is not registered.
    fn decorate_keyed<T, F>(&mut self, key: &str, decorator: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext, Arc<T>) -> Arc<T> + Send + Sync + 'static;

    /// Decorates every service of type `T` registered with a key so far.
    /// Keys registered after this call are not decorated.
    ///
    /// # Errors
    ///
    /// [`DiError::RegistryNotRegistered`] before any keyed registration of `T`.
    fn decorate_all_keyed<T, F>(&mut self, decorator: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext, Arc<T>) -> Arc<T> + Send + Sync + 'static;
}

impl KeyedServiceCollectionExt for ServiceCollection {
    fn add_keyed_singleton<T>(&mut self, key: impl Into<String>, value: T) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
    {
        let value = Arc::new(value);
        self.keyed_registry_or_insert::<T>()
            .add(key, move |_: &ResolverContext| -> DiResult<Arc<T>> { Ok(value.clone()) })?;
        Ok(self)
    }

    fn add_keyed_singleton_disposable_instance<T>(&mut self, key: impl Into<String>, value: T) -> DiResult<&mut Self>
    where
        T: Dispose,
    {
        self.keyed_registry_or_insert::<T>()
            .add_disposable_instance(key, Arc::new(value))?;
        Ok(self)
    }

    fn add_keyed_singleton_factory<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.keyed_registry_or_insert::<T>()
            .add(key, move |r: &ResolverContext| -> DiResult<Arc<T>> { Ok(Arc::new(factory(r))) })?;
        Ok(self)
    }

    fn add_keyed_singleton_try_factory<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext) -> DiResult<T> + Send + Sync + 'static,
    {
        self.keyed_registry_or_insert::<T>()
            .add(key, move |r: &ResolverContext| -> DiResult<Arc<T>> { factory(r).map(Arc::new) })?;
        Ok(self)
    }

    fn add_keyed_singleton_disposable<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: Dispose,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.keyed_registry_or_insert::<T>()
            .add_disposable(key, move |r: &ResolverContext| -> DiResult<Arc<T>> { Ok(Arc::new(factory(r))) })?;
        Ok(self)
    }

    fn add_keyed_singleton_trait_factory<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext) -> Arc<T> + Send + Sync + 'static,
    {
        self.keyed_registry_or_insert::<T>()
            .add(key, move |r: &ResolverContext| -> DiResult<Arc<T>> { Ok(factory(r)) })?;
        Ok(self)
    }

    fn add_keyed_singleton_trait_disposable<T, F>(&mut self, key: impl Into<String>, factory: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Dispose,
        F: Fn(&ResolverContext) -> Arc<T> + Send + Sync + 'static,
    {
        self.keyed_registry_or_insert::<T>()
            .add_disposable(key, move |r: &ResolverContext| -> DiResult<Arc<T>> { Ok(factory(r)) })?;
        Ok(self)
    }

    fn decorate_keyed<T, F>(&mut self, key: &str, decorator: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext, Arc<T>) -> Arc<T> + Send + Sync + 'static,
    {
        let registry = self.keyed_registry::<T>().ok_or_else(|| DiError::RegistryNotRegistered {
            service: std::any::type_name::<T>(),
            key: Some(key.to_string()),
        })?;
        registry.decorate(key, move |r: &ResolverContext, inner: Arc<T>| -> DiResult<Arc<T>> {
            Ok(decorator(r, inner))
        })?;
        Ok(self)
    }

    fn decorate_all_keyed<T, F>(&mut self, decorator: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext, Arc<T>) -> Arc<T> + Send + Sync + 'static,
    {
        let registry = self.keyed_registry::<T>().ok_or_else(|| DiError::RegistryNotRegistered {
            service: std::any::type_name::<T>(),
            key: None,
        })?;
        registry.decorate_all(move |r: &ResolverContext, inner: Arc<T>| -> DiResult<Arc<T>> {
            Ok(decorator(r, inner))
        })?;
        Ok(self)
    }
}

/// Keyed resolution for every [`Resolver`]: the `ServiceProvider` itself and
/// the `ResolverContext` handed to factories.
///
/// # Examples
///
/// ```
/// use keyed_di::{DiError, KeyedResolver, KeyedServiceCollectionExt, ServiceCollection};
///
/// # fn main() -> keyed_di::DiResult<()> {
/// let mut services = ServiceCollection::new();
/// services.add_keyed_singleton("eu-west", 8443u16)?;
/// services.add_keyed_singleton_factory("eu-central", |r| *r.get_required_by_key::<u16>("eu-west") + 1)?;
///
/// let provider = services.build();
/// assert_eq!(*provider.get_by_key::<u16>("eu-central")?, 8444);
/// assert!(matches!(provider.get_by_key::<u16>("us-east"), Err(DiError::KeyNotFound { .. })));
/// assert!(matches!(provider.get_by_key::<u32>("eu-west"), Err(DiError::RegistryNotFound { .. })));
/// # Ok(())
/// # }
/// ```
pub trait KeyedResolver: Resolver + Sized {
    /// The registry holding every keyed `T`, if any keyed `T` was registered.
    fn keyed_services<T>(&self) -> Option<Arc<KeyedServices<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<KeyedServices<T>>().ok()
    }

    /// Resolves the service of type `T` registered under `key`.
    ///
    /// # Errors
    ///
    /// - [`DiError::RegistryNotFound`] when no keyed `T` was ever registered.
    /// - [`DiError::KeyNotFound`] when `key` was never registered for `T`.
    /// - Whatever the factory chain of `key` returns on failure.
    fn get_by_key<T>(&self, key: &str) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let registry = match self.get::<KeyedServices<T>>() {
            Ok(registry) => registry,
            Err(DiError::NotFound(_)) => {
                return Err(DiError::RegistryNotFound {
                    service: std::any::type_name::<T>(),
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e),
        };
        registry.get(key, self)
    }

    /// Resolves the service of type `T` registered under `key`, panicking on failure.
    fn get_required_by_key<T>(&self, key: &str) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_by_key::<T>(key).unwrap_or_else(|e| {
            panic!("Failed to resolve {} with key '{}': {}", std::any::type_name::<T>(), key, e)
        })
    }
}

impl<R: Resolver> KeyedResolver for R {}
