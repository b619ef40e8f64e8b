//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type, which records host
//! registrations and the per-type keyed registries, and builds the
//! ServiceProvider.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::keyed::{KeyedServices, KeyedTeardown};
use crate::key::{key_of_trait, key_of_type};
use crate::provider::ResolverContext;
use crate::registration::{AnyArc, Registration, Registrations};
use crate::{DiError, DiResult, Lifetime, ServiceProvider};

/// A keyed registry as tracked by the collection: the typed registry behind
/// `Any` for lookups, and the same registry as a teardown handle for `build`.
struct KeyedEntry {
    type_id: TypeId,
    registry: Arc<dyn Any + Send + Sync>,
    teardown: Arc<dyn KeyedTeardown>,
}

/// Registration surface of the container.
///
/// Host services are registered with the `add_*` methods below; keyed
/// services go through [`KeyedServiceCollectionExt`](crate::KeyedServiceCollectionExt).
///
/// # Examples
///
/// ```rust
/// use keyed_di::{ServiceCollection, Resolver};
///
/// struct Config { database_url: String }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Config { database_url: "postgres://localhost".to_string() });
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<Config>().database_url, "postgres://localhost");
/// ```
#[derive(Default)]
pub struct ServiceCollection {
    registrations: Registrations,
    keyed: Vec<KeyedEntry>,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registrations: Registrations::new(),
            keyed: Vec::new(),
        }
    }

    // ----- Concrete Type Registrations -----

    /// Registers a pre-built singleton value.
    ///
    /// A later registration of the same type replaces this one.
    pub fn add_singleton<T: 'static + Send + Sync>(&mut self, value: T) -> &mut Self {
        self.insert_singleton_arc(Arc::new(value));
        self
    }

    /// Registers a singleton factory that runs on first request.
    ///
    /// The factory runs at most once per provider, even under concurrent first
    /// access.
    ///
    /// ```rust
    /// # use keyed_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Database { url: String }
    /// struct UserService { db: Arc<Database> }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "postgres://localhost".to_string() });
    /// services.add_singleton_factory::<UserService, _>(|resolver| UserService {
    ///     db: resolver.get_required::<Database>(),
    /// });
    /// ```
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Singleton, factory)
    }

    /// Registers a transient factory that runs on every request.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, factory)
    }

    fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext) -> T + Send + Sync + 'static,
    {
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> { Ok(Arc::new(factory(r))) };
        self.registrations
            .insert(key_of_type::<T>(), Registration::new(lifetime, Arc::new(ctor)));
        self
    }

    fn insert_singleton_arc<T: 'static + Send + Sync>(&mut self, arc: Arc<T>) {
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(arc.clone()) };
        self.registrations
            .insert(key_of_type::<T>(), Registration::new(Lifetime::Singleton, Arc::new(ctor)));
    }

    // ----- Trait Registrations -----

    /// Registers a singleton trait implementation.
    ///
    /// ```rust
    /// # use keyed_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// trait Logger: Send + Sync {
    ///     fn log(&self, message: &str);
    /// }
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, _message: &str) {}
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton_trait::<dyn Logger>(Arc::new(FileLogger));
    /// ```
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + 'static + Send + Sync,
    {
        // Stored as Arc<Arc<dyn Trait>> in Any
        let any_arc: AnyArc = Arc::new(value);
        let ctor = move |_: &ResolverContext| -> DiResult<AnyArc> { Ok(any_arc.clone()) };
        self.registrations
            .insert(key_of_trait::<T>(), Registration::new(Lifetime::Singleton, Arc::new(ctor)));
        self
    }

    /// Registers a singleton trait factory returning `Arc<dyn Trait>`.
    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        F: Fn(&ResolverContext) -> Arc<Trait> + Send + Sync + 'static,
    {
        let ctor = move |r: &ResolverContext| -> DiResult<AnyArc> { Ok(Arc::new(factory(r))) };
        self.registrations
            .insert(key_of_trait::<Trait>(), Registration::new(Lifetime::Singleton, Arc::new(ctor)));
        self
    }

    // ----- Decoration -----

    /// Wraps an existing concrete registration with a decorator.
    ///
    /// The decorator receives the value produced by the current registration
    /// and returns its replacement.
    ///
    /// # Errors
    ///
    /// [`DiError::DecorateNotRegistered`] when `T` has no host registration yet.
    ///
    /// ```rust
    /// # use keyed_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// # fn main() -> keyed_di::DiResult<()> {
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton("db".to_string());
    /// services.decorate::<String, _>(|_, inner| Arc::new(format!("traced-{}", inner)))?;
    ///
    /// let provider = services.build();
    /// assert_eq!(&*provider.get_required::<String>(), "traced-db");
    /// # Ok(())
    /// # }
    /// ```
    pub fn decorate<T, F>(&mut self, decorator: F) -> DiResult<&mut Self>
    where
        T: 'static + Send + Sync,
        F: Fn(&ResolverContext, Arc<T>) -> Arc<T> + Send + Sync + 'static,
    {
        let key = key_of_type::<T>();
        let registration = self
            .registrations
            .get_mut(&key)
            .ok_or(DiError::DecorateNotRegistered(key.display_name()))?;

        let old_ctor = registration.ctor.clone();
        registration.ctor = Arc::new(move |resolver: &ResolverContext| -> DiResult<AnyArc> {
            let original = old_ctor(resolver)?;
            let typed = original
                .downcast::<T>()
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))?;
            Ok(decorator(resolver, typed) as AnyArc)
        });
        tracing::debug!(service = key.display_name(), "decorating service");
        Ok(self)
    }

    // ----- Introspection -----

    /// Returns true when a concrete type `T` has a host registration.
    pub fn contains<T: 'static>(&self) -> bool {
        self.registrations.contains_key(&key_of_type::<T>())
    }

    /// Number of host registrations, counting each keyed registry once.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.len() == 0
    }

    // ----- Keyed registry bookkeeping -----

    /// The keyed registry of `T`, if any keyed registration of `T` happened.
    pub(crate) fn keyed_registry<T>(&self) -> Option<Arc<KeyedServices<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<KeyedServices<T>>();
        self.keyed
            .iter()
            .find(|entry| entry.type_id == type_id)
            .and_then(|entry| entry.registry.clone().downcast::<KeyedServices<T>>().ok())
    }

    /// The keyed registry of `T`, created and registered as a host singleton
    /// on first use.
    pub(crate) fn keyed_registry_or_insert<T>(&mut self) -> Arc<KeyedServices<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if let Some(registry) = self.keyed_registry::<T>() {
            return registry;
        }

        let registry = Arc::new(KeyedServices::<T>::new());
        tracing::debug!(service = std::any::type_name::<T>(), "creating keyed service registry");
        self.insert_singleton_arc(registry.clone());
        self.keyed.push(KeyedEntry {
            type_id: TypeId::of::<KeyedServices<T>>(),
            registry: registry.clone(),
            teardown: registry.clone(),
        });
        registry
    }

    // ----- Build -----

    /// Consumes the collection and creates the `ServiceProvider`.
    ///
    /// Every keyed registry is handed to the provider, and each
    /// `ServiceProvider::dispose_all` call disposes whatever the registries
    /// built since the previous call.
    ///
    /// ```
    /// use keyed_di::{ServiceCollection, Resolver};
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_singleton(42usize);
    /// collection.add_transient_factory::<String, _>(|_| "Hello".to_string());
    ///
    /// let provider = collection.build();
    /// assert_eq!(*provider.get_required::<usize>(), 42);
    /// assert_eq!(&*provider.get_required::<String>(), "Hello");
    /// ```
    pub fn build(self) -> ServiceProvider {
        let registries = self.keyed.into_iter().map(|entry| entry.teardown).collect();
        ServiceProvider::new(self.registrations, registries)
    }
}
