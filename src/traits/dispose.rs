//! The disposable capability.

/// Trait for synchronous resource disposal.
///
/// Implement it for services that hold resources needing explicit teardown
/// (connections, file handles, background workers). Conformance is checked at
/// compile time: the `*_disposable` keyed registrations require it, and
/// `Resolver::register_disposer` accepts only disposable values.
///
/// A trait object is disposable when `Dispose` is one of its supertraits, so
/// `dyn Store` below can be registered with
/// `add_keyed_singleton_trait_disposable`.
///
/// # Examples
///
/// ```
/// use keyed_di::Dispose;
///
/// trait Store: Dispose {
///     fn put(&self, value: &str);
/// }
///
/// struct FileStore { path: String }
///
/// impl Store for FileStore {
///     fn put(&self, _value: &str) {}
/// }
///
/// impl Dispose for FileStore {
///     fn dispose(&self) {
///         println!("closing {}", self.path);
///     }
/// }
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Releases the held resources. Called at most once per recorded value.
    fn dispose(&self);
}
