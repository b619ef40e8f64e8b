//! Keyed singleton registrations.
//!
//! A keyed registration stores several instances of the same service type
//! side by side, each under its own string key:
//!
//! - [`KeyedServices<T>`] is the registry for one type `T`. It builds each
//!   key's instance once, caches it, applies decorators, and disposes what it
//!   built.
//! - [`KeyedServiceCollectionExt`] registers and decorates keyed services on a
//!   `ServiceCollection`.
//! - [`KeyedResolver`] resolves them from a `ServiceProvider` or from inside
//!   another factory.

mod chain;
mod extensions;
mod registry;

pub use chain::{KeyedDecorator, KeyedFactory};
pub use extensions::{KeyedResolver, KeyedServiceCollectionExt};
pub use registry::KeyedServices;
pub(crate) use registry::KeyedTeardown;
