//! Command execution module
//!
//! Provides process execution with:
//! - Synchronous stdout capture on the calling thread
//! - Asynchronous capture on an injectable worker pool
//! - Completion callbacks and cancellable task handles

pub mod async_shell;
pub mod pool;
pub mod runner;

pub use async_shell::{AsyncShell, Responder, TaskHandle};
pub use pool::WorkerPool;
pub use runner::{capture_output, Invocation, Runner};
