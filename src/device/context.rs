//! Execution context: parallelism configuration and cancellation.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Execution context threaded through every [`Engine`](crate::Engine) call.
///
/// Owns the configured worker count for the `std::thread::scope` fan-out and
/// a cancellation flag collaborators may poll between operations (never
/// mid-kernel). This core is CPU-only; there is no device/allocator registry
/// to own here (see DESIGN.md).
#[derive(Clone)]
pub struct Context {
    parallelism: NonZeroUsize,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// Creates a context using `std::thread::available_parallelism()` as the
    /// worker count, falling back to `1` if it cannot be determined.
    #[must_use]
    pub fn new() -> Self {
        let parallelism = std::thread::available_parallelism()
            .unwrap_or(NonZeroUsize::new(1).expect("1 is non-zero"));
        Self {
            parallelism,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a context pinned to a fixed worker count, overriding
    /// `std::thread::available_parallelism()`. Used for deterministic
    /// benchmarking and tests.
    #[must_use]
    pub fn with_parallelism(workers: usize) -> Self {
        let parallelism = NonZeroUsize::new(workers).unwrap_or(NonZeroUsize::new(1).expect("1 is non-zero"));
        Self {
            parallelism,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Configured worker count for the `std::thread::scope` fan-out.
    #[must_use]
    pub(crate) fn workers(&self) -> usize {
        self.parallelism.get()
    }

    /// Requests cancellation. Collaborators poll [`Context::is_cancelled`]
    /// between operations; a cancellation is never observed mid-kernel.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if [`Context::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
            .field("workers", &self.workers())
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_nonzero_parallelism() {
        let ctx = Context::new();
        assert!(ctx.workers() >= 1);
    }

    #[test]
    fn test_with_parallelism_override() {
        let ctx = Context::with_parallelism(4);
        assert_eq!(ctx.workers(), 4);
    }

    #[test]
    fn test_with_parallelism_zero_clamps_to_one() {
        let ctx = Context::with_parallelism(0);
        assert_eq!(ctx.workers(), 1);
    }

    #[test]
    fn test_cancel_flag() {
        let ctx = Context::new();
        assert!(!ctx.is_cancelled());
        ctx.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_clone_shares_cancellation() {
        let ctx = Context::new();
        let clone = ctx.clone();
        ctx.cancel();
        assert!(clone.is_cancelled());
    }
}
