//! Factory chains: the initial factory of a key composed with its decorators.

use std::sync::Arc;

use crate::error::DiResult;
use crate::provider::ResolverContext;
use crate::traits::{Dispose, Resolver};

/// Builds the instance of one key.
pub type KeyedFactory<T> =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<Arc<T>> + Send + Sync>;

/// Replaces the value produced by the rest of a chain.
pub type KeyedDecorator<T> =
    Arc<dyn for<'a> Fn(&ResolverContext<'a>, Arc<T>) -> DiResult<Arc<T>> + Send + Sync>;

/// Records a built value for disposal with whoever owns the construction.
pub(crate) type Recorder<T> = for<'a> fn(&ResolverContext<'a>, &Arc<T>);

fn record_disposable<T: ?Sized + Dispose>(ctx: &ResolverContext, value: &Arc<T>) {
    ctx.register_disposer(value.clone());
}

/// A factory followed by zero or more decorators, as one callable.
///
/// Decorating never mutates a chain; it returns a new chain whose outermost
/// step is the decorator, so `c.decorated(d1).decorated(d2)` builds
/// `d2(d1(c()))`.
///
/// A chain of a disposable `T` carries a recorder, and every decorator layered
/// on it records the value it returns, unless it hands back its input as is.
pub(crate) struct FactoryChain<T: ?Sized> {
    run: KeyedFactory<T>,
    recorder: Option<Recorder<T>>,
    depth: usize,
}

impl<T: ?Sized + Send + Sync + 'static> FactoryChain<T> {
    pub(crate) fn new(factory: KeyedFactory<T>) -> Self {
        Self {
            run: factory,
            recorder: None,
            depth: 0,
        }
    }

    pub(crate) fn decorated(&self, decorator: KeyedDecorator<T>) -> Self {
        let inner = self.run.clone();
        let recorder = self.recorder;
        Self {
            run: Arc::new(move |ctx: &ResolverContext| -> DiResult<Arc<T>> {
                let value = inner(ctx)?;
                let decorated = decorator(ctx, value.clone())?;
                if let Some(record) = recorder {
                    if !Arc::ptr_eq(&decorated, &value) {
                        record(ctx, &decorated);
                    }
                }
                Ok(decorated)
            }),
            recorder,
            depth: self.depth + 1,
        }
    }

    /// Runs the whole chain. Errors from any step propagate unchanged.
    pub(crate) fn build(&self, ctx: &ResolverContext) -> DiResult<Arc<T>> {
        (self.run)(ctx)
    }

    /// Number of decorators layered over the initial factory.
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

impl<T: ?Sized + Dispose> FactoryChain<T> {
    /// A chain whose decorators record what they build. `factory` is expected
    /// to record its own output.
    pub(crate) fn disposable(factory: KeyedFactory<T>) -> Self {
        Self {
            run: factory,
            recorder: Some(record_disposable::<T>),
            depth: 0,
        }
    }
}
