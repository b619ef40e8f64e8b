//! Error types for the dependency injection container and its keyed registries.

/// Dependency injection errors
///
/// Covers the host container (lookup, downcast, cycles) as well as the keyed
/// registries. Keyed variants always carry the service type name and the key so
/// a misconfiguration can be diagnosed from the message alone.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use keyed_di::DiError;
///
/// let duplicate = DiError::DuplicateKey { service: "alloc::string::String", key: "primary".into() };
/// assert_eq!(
///     duplicate.to_string(),
///     "Cannot add factory for alloc::string::String with key 'primary': a factory with that key exists already"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiError {
    /// Service not registered
    #[error("Service not found: {0}")]
    NotFound(&'static str),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A host decorator targeted a type with no registration.
    #[error("Cannot decorate {0}: no service of that type is registered")]
    DecorateNotRegistered(&'static str),

    /// A second initial factory was added under an existing key.
    #[error("Cannot add factory for {service} with key '{key}': a factory with that key exists already")]
    DuplicateKey { service: &'static str, key: String },
    /// A decorator targeted a key that has no factory.
    #[error("Cannot decorate {service} with key '{key}': no factory is registered under that key")]
    DecorateUnknownKey { service: &'static str, key: String },
    /// A decorator was added before any keyed registration of the service type.
    #[error("Cannot decorate {service}{}: no keyed services of that type have been registered", fmt_key(.key))]
    RegistryNotRegistered { service: &'static str, key: Option<String> },
    /// A decorator targeted a key that has already been requested. The key's
    /// chain is frozen from its first request on, even if that request failed.
    #[error("Cannot decorate {service} with key '{key}': the key has already been requested")]
    KeyAlreadyRequested { service: &'static str, key: String },

    /// Keyed resolution of a service type that was never registered with any key.
    #[error("Cannot find keyed services for {service} (requested key '{key}'): no keyed services of that type were registered")]
    RegistryNotFound { service: &'static str, key: String },
    /// Keyed resolution of a key that was never added.
    #[error("Could not find a registered instance of {service} with key '{key}'")]
    KeyNotFound { service: &'static str, key: String },

    /// A user supplied factory or decorator failed to build its value.
    #[error("Construction failed: {0}")]
    Construction(String),
}

fn fmt_key(key: &Option<String>) -> String {
    match key {
        Some(key) => format!(" with key '{}'", key),
        None => String::new(),
    }
}

/// Result type for DI operations
///
/// # Examples
///
/// ```rust
/// use keyed_di::{DiResult, DiError};
///
/// fn open_pool() -> DiResult<u32> {
///     Err(DiError::Construction("pool exhausted".to_string()))
/// }
///
/// assert!(open_pool().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
