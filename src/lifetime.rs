//! Host service lifetimes.

/// Lifetimes supported by the host container.
///
/// Keyed registrations are always singletons; transient registrations exist
/// only for plain (unkeyed) host services.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Clock;
/// struct Request { id: u32 }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Clock);
/// services.add_transient_factory::<Request, _>(|_| Request { id: 7 });
///
/// let provider = services.build();
/// assert!(Arc::ptr_eq(&provider.get_required::<Clock>(), &provider.get_required::<Clock>()));
/// assert!(!Arc::ptr_eq(&provider.get_required::<Request>(), &provider.get_required::<Request>()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Built once per provider and shared by every caller.
    Singleton,
    /// Built again on every resolution, never cached.
    Transient,
}
