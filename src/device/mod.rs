//! Execution context threaded through every engine call.
//!
//! Provides [`Context`]: parallelism configuration and cooperative
//! cancellation. Device selection is config-only at this layer — the core
//! is CPU-only and allocates tensor buffers directly through the system
//! allocator (see DESIGN.md).

mod context;

pub use context::Context;
