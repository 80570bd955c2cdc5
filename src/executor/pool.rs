//! Worker pool for asynchronous execution
//!
//! A pool is either an owned multi-thread tokio runtime, built from
//! [`PoolConfig`], or a handle to a runtime the caller already has.
//! Owned pools are torn down explicitly with [`WorkerPool::shutdown`], or
//! when dropped. Both are safe from inside an async context.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::config::PoolConfig;
use crate::error::ShellError;

/// Reusable set of worker threads that runs submitted tasks
pub struct WorkerPool {
    handle: Handle,
    /// Present only for owned pools; taken on shutdown
    runtime: Option<Runtime>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_owned() { "owned" } else { "shared" };
        f.debug_struct("WorkerPool").field("kind", &kind).finish()
    }
}

impl WorkerPool {
    /// Build an owned pool
    ///
    /// # Errors
    /// * `ShellError::Pool` - If the runtime could not be started
    pub fn new(config: &PoolConfig) -> Result<Self, ShellError> {
        let mut builder = Builder::new_multi_thread();
        builder.thread_name(config.thread_name.clone()).enable_all();
        if config.workers > 0 {
            builder.worker_threads(config.workers);
        }

        let runtime = builder
            .build()
            .map_err(|e| ShellError::Pool(format!("Failed to create runtime: {}", e)))?;

        tracing::debug!(
            workers = config.workers,
            thread_name = %config.thread_name,
            "worker pool started"
        );

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }

    /// Use an existing runtime as the pool
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            runtime: None,
        }
    }

    /// Use the runtime the caller is running on
    ///
    /// # Errors
    /// * `ShellError::Pool` - If called outside a tokio runtime
    pub fn current() -> Result<Self, ShellError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|e| ShellError::Pool(e.to_string()))
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Whether this pool owns its runtime
    pub fn is_owned(&self) -> bool {
        self.runtime.is_some()
    }

    /// Schedule a future on a pool worker
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Stop an owned pool, waiting up to `timeout` for running tasks
    ///
    /// Tasks still running afterwards are dropped, which kills their
    /// children. From inside an async context the wait happens on a
    /// separate thread and this returns immediately. Shared pools are left
    /// untouched.
    pub fn shutdown(mut self, timeout: Duration) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };

        tracing::debug!("worker pool shutting down");

        if in_async_context() {
            // Blocking here would panic; let a plain thread do the waiting
            let spawned = std::thread::Builder::new()
                .name("shellrun-pool-shutdown".to_string())
                .spawn(move || runtime.shutdown_timeout(timeout));
            if let Err(e) = spawned {
                tracing::warn!("Failed to spawn shutdown thread: {}", e);
            }
        } else {
            runtime.shutdown_timeout(timeout);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            if in_async_context() {
                runtime.shutdown_background();
            } else {
                drop(runtime);
            }
        }
    }
}

fn in_async_context() -> bool {
    Handle::try_current().is_ok()
}
