//! # keyed-di
//!
//! Keyed singleton registrations for a type-safe dependency injection
//! container, inspired by Microsoft.Extensions.DependencyInjection.
//!
//! A keyed registration lets several instances of the same service type live
//! side by side, each named by a string key, each resolved, decorated and
//! disposed on its own.
//!
//! ## Features
//!
//! - **Singleton per key**: each key's instance is built once, on first
//!   request, even when many threads ask at the same time
//! - **Per-key locking**: building one key never blocks resolving another
//! - **Decoration**: wrap one key, or every key of a type, before first use
//! - **Disposal**: disposable keyed instances are torn down with the provider,
//!   including those hidden behind decorators
//! - **Early errors**: duplicate keys and decorating unknown keys fail at
//!   registration time
//!
//! ## Quick Start
//!
//! ```rust
//! use keyed_di::{KeyedResolver, KeyedServiceCollectionExt, ServiceCollection};
//! use std::sync::Arc;
//!
//! trait Storage: Send + Sync {
//!     fn location(&self) -> String;
//! }
//!
//! struct Bucket(&'static str);
//! impl Storage for Bucket {
//!     fn location(&self) -> String {
//!         format!("s3://{}", self.0)
//!     }
//! }
//!
//! struct Audited(Arc<dyn Storage>);
//! impl Storage for Audited {
//!     fn location(&self) -> String {
//!         format!("audited:{}", self.0.location())
//!     }
//! }
//!
//! # fn main() -> keyed_di::DiResult<()> {
//! let mut services = ServiceCollection::new();
//! services
//!     .add_keyed_singleton_trait_factory::<dyn Storage, _>("images", |_| Arc::new(Bucket("images")))?
//!     .add_keyed_singleton_trait_factory::<dyn Storage, _>("backups", |_| Arc::new(Bucket("backups")))?
//!     .decorate_keyed::<dyn Storage, _>("backups", |_, inner| Arc::new(Audited(inner)))?;
//!
//! let provider = services.build();
//! assert_eq!(provider.get_by_key::<dyn Storage>("images")?.location(), "s3://images");
//! assert_eq!(provider.get_by_key::<dyn Storage>("backups")?.location(), "audited:s3://backups");
//!
//! provider.dispose_all();
//! # Ok(())
//! # }
//! ```
//!
//! ## Host container
//!
//! Keyed registries live in a small host container: `ServiceCollection` to
//! register, `ServiceProvider` to resolve by type. The keyed layer needs only
//! two things from it, registering a singleton and resolving one by type, but
//! the host is usable on its own:
//!
//! ```rust
//! use keyed_di::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! struct Database { url: String }
//! struct UserService { db: Arc<Database> }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database { url: "postgres://localhost".to_string() });
//! services.add_transient_factory::<UserService, _>(|resolver| UserService {
//!     db: resolver.get_required::<Database>(),
//! });
//!
//! let provider = services.build();
//! assert_eq!(provider.get_required::<UserService>().db.url, "postgres://localhost");
//! ```

// Module declarations
pub mod collection;
pub mod error;
pub mod key;
pub mod keyed;
pub mod lifetime;
pub mod provider;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use collection::ServiceCollection;
pub use error::{DiError, DiResult};
pub use internal::CircularPanic;
pub use key::{key_of_trait, key_of_type, Key};
pub use keyed::{KeyedDecorator, KeyedFactory, KeyedResolver, KeyedServiceCollectionExt, KeyedServices};
pub use lifetime::Lifetime;
pub use provider::{ResolverContext, ServiceProvider};
pub use traits::{Dispose, Resolver, ResolverCore};
