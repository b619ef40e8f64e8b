//! Resolver context for dependency injection.
//!
//! This module contains the ResolverContext type which provides
//! the interface for factory functions to resolve dependencies.

use std::any::Any;
use std::sync::Arc;

use crate::error::DiResult;
use crate::key::Key;
use crate::traits::{Resolver, ResolverCore};

/// Context passed to factory and decorator functions.
///
/// ResolverContext wraps whichever resolver is driving the current
/// construction. Factories use it to resolve other services, keyed or not,
/// and to register disposers; the wrapped resolver decides who owns those
/// disposers.
///
/// # Examples
///
/// ```
/// use keyed_di::{KeyedResolver, KeyedServiceCollectionExt, Resolver, ServiceCollection};
///
/// struct Settings { shard_count: usize }
/// struct Shard { id: usize, of: usize }
///
/// # fn main() -> keyed_di::DiResult<()> {
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Settings { shard_count: 4 });
/// services.add_keyed_singleton_factory("shard-0", |r| Shard {
///     id: 0,
///     of: r.get_required::<Settings>().shard_count,
/// })?;
///
/// let provider = services.build();
/// let shard = provider.get_by_key::<Shard>("shard-0")?;
/// assert_eq!((shard.id, shard.of), (0, 4));
/// # Ok(())
/// # }
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    /// Creates a new ResolverContext wrapping the given resolver.
    pub(crate) fn new<T>(resolver: &'a T) -> Self
    where
        T: ResolverCore,
    {
        Self { resolver }
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_any(&self, key: &Key) -> DiResult<Arc<dyn Any + Send + Sync>> {
        self.resolver.resolve_any(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.resolver.push_sync_disposer(f);
    }
}

impl<'a> Resolver for ResolverContext<'a> {}
