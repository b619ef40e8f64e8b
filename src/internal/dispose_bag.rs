//! Internal disposal bag for managing cleanup hooks.

/// Disposal hooks executed in LIFO order.
///
/// Used both by the provider root and by every keyed registry. Hooks are
/// consumed as they run, so draining the same bag twice never runs a hook twice.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<Box<dyn FnOnce() + Send>>,
}

impl DisposeBag {
    /// Add a synchronous disposal hook.
    pub(crate) fn push_sync(&mut self, f: Box<dyn FnOnce() + Send>) {
        self.sync.push(f);
    }

    /// Execute all hooks in reverse order (LIFO).
    pub(crate) fn run_all_sync_reverse(&mut self) {
        while let Some(f) = self.sync.pop() {
            (f)();
        }
    }

    /// Moves every recorded hook out, leaving the bag empty.
    ///
    /// Callers drain under their lock and run the hooks after releasing it.
    pub(crate) fn take(&mut self) -> DisposeBag {
        std::mem::take(self)
    }

    pub(crate) fn len(&self) -> usize {
        self.sync.len()
    }
}
