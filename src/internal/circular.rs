//! Circular dependency detection infrastructure.
//!
//! Host singletons and keyed instances share one thread-local resolution
//! stack. Keyed entries are named `Type[key]`, so a keyed factory that asks
//! for its own key is reported as a cycle instead of blocking on its own
//! initialization cell.

use std::borrow::Cow;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{DiError, DiResult};

const MAX_DEPTH: usize = 1024;

thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<Cow<'static, str>>> = const { RefCell::new(Vec::new()) };
}

/// Panic payload for circular dependency detection.
///
/// Raised when a resolution re-enters a service that is already being built
/// on the current thread and converted back into `DiError::Circular` by the
/// nearest enclosing resolution.
///
/// Example path: `["app::Cache[hot]", "app::Store", "app::Cache[hot]"]`
#[derive(Debug)]
pub struct CircularPanic {
    /// The complete circular dependency path showing the cycle.
    pub path: Box<[String]>,
}

/// Guard for managing the thread-local resolution stack
pub(crate) struct StackGuard {
    _private: (),
}

impl StackGuard {
    pub(crate) fn new(name: Cow<'static, str>) -> Self {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            if stack.iter().any(|n| *n == name) {
                let mut path: Vec<String> = stack.iter().map(|n| n.to_string()).collect();
                path.push(name.into_owned());
                drop(stack);
                panic::panic_any(CircularPanic { path: path.into_boxed_slice() });
            }

            if stack.len() >= MAX_DEPTH {
                let depth = stack.len();
                drop(stack);
                panic::panic_any(DiError::DepthExceeded(depth));
            }

            stack.push(name);
        });

        Self { _private: () }
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Execute a closure with circular dependency detection
///
/// Cycle and depth panics raised anywhere below this frame are turned into
/// errors; any other panic keeps unwinding.
pub(crate) fn with_circular_catch<T, F>(name: Cow<'static, str>, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    let _guard = StackGuard::new(name);

    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let payload = match payload.downcast::<CircularPanic>() {
                Ok(circular) => return Err(DiError::Circular(circular.path.into_vec())),
                Err(payload) => payload,
            };
            match payload.downcast::<DiError>() {
                Ok(error) => Err(*error),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
    }
}
