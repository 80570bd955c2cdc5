//! Asynchronous execution on a worker pool
//!
//! [`AsyncShell`] submits runs to its [`WorkerPool`] and returns right away.
//! Results reach the caller through an optional callback, invoked once on a
//! pool worker, and through the returned [`TaskHandle`]. There is no ordering
//! between tasks.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use super::pool::WorkerPool;
use super::runner::{Invocation, Runner};
use crate::config::Config;
use crate::error::ShellError;

/// Completion callback, called with the captured output
///
/// Runs on a pool worker, so long blocking work here holds up that worker.
pub type Responder = Box<dyn FnOnce(String) + Send + 'static>;

/// Submits runs to a worker pool
#[derive(Debug)]
pub struct AsyncShell {
    runner: Arc<Runner>,
    pool: WorkerPool,
    shutdown_timeout: Duration,
    next_id: AtomicU64,
}

impl AsyncShell {
    pub fn new(runner: Runner, pool: WorkerPool) -> Self {
        Self {
            runner: Arc::new(runner),
            pool,
            shutdown_timeout: Duration::from_secs(5),
            next_id: AtomicU64::new(1),
        }
    }

    /// Build a runner and an owned pool from configuration
    pub fn from_config(config: &Config) -> Result<Self, ShellError> {
        let runner = Runner::from_config(config.runner.clone())?;
        let pool = WorkerPool::new(&config.pool)?;
        Ok(Self::new(runner, pool).with_shutdown_timeout(config.pool.shutdown_timeout()))
    }

    /// How long [`AsyncShell::shutdown`] waits for running tasks
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Run `program` with `args` on the pool
    pub fn execute<S: AsRef<str>>(&self, program: &str, args: &[S]) -> TaskHandle {
        self.submit(Invocation::program(program, args), None)
    }

    /// Run `program` with `args` on the pool, then call `on_complete`
    pub fn execute_with<S, F>(&self, program: &str, args: &[S], on_complete: F) -> TaskHandle
    where
        S: AsRef<str>,
        F: FnOnce(String) + Send + 'static,
    {
        self.submit(Invocation::program(program, args), Some(Box::new(on_complete)))
    }

    /// Run a shell command on the pool
    pub fn execute_command(&self, command: &str) -> TaskHandle {
        self.submit(Invocation::shell(command), None)
    }

    /// Run a shell command on the pool, then call `on_complete`
    pub fn execute_command_with<F>(&self, command: &str, on_complete: F) -> TaskHandle
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.submit(Invocation::shell(command), Some(Box::new(on_complete)))
    }

    /// Submit an invocation
    ///
    /// Never blocks. The responder fires only if the run produces output;
    /// errors are delivered through the handle alone. A panicking responder
    /// turns the result into `ShellError::TaskPanicked`.
    pub fn submit(&self, invocation: Invocation, responder: Option<Responder>) -> TaskHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let runner = Arc::clone(&self.runner);

        tracing::debug!(task = id, command = %invocation, "submitting task");

        let join = self.pool.spawn(async move {
            let result = match (runner.execute_async(&invocation).await, responder) {
                (Ok(output), Some(responder)) => {
                    let delivered = output.clone();
                    match catch_unwind(AssertUnwindSafe(move || responder(delivered))) {
                        Ok(()) => Ok(output),
                        Err(payload) => {
                            let message = panic_message(payload.as_ref());
                            tracing::warn!(task = id, "callback panicked: {}", message);
                            Err(ShellError::TaskPanicked { task: id, message })
                        }
                    }
                }
                (Err(e), _) => {
                    tracing::warn!(task = id, "task failed: {}", e);
                    Err(e)
                }
                (Ok(output), None) => Ok(output),
            };

            // Nobody may be listening; the result is then discarded
            let _ = tx.send(result);
            tracing::debug!(task = id, "task finished");
        });

        TaskHandle {
            id,
            result: rx,
            abort: join.abort_handle(),
        }
    }

    /// Tear down the pool, waiting for running tasks up to the shutdown timeout
    pub fn shutdown(self) {
        self.pool.shutdown(self.shutdown_timeout);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle to one submitted task
///
/// Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct TaskHandle {
    id: u64,
    result: oneshot::Receiver<Result<String, ShellError>>,
    abort: AbortHandle,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Abort the task, killing its child if one is running
    ///
    /// The callback will not fire unless it already has.
    pub fn cancel(&self) {
        tracing::debug!(task = self.id, "cancelling task");
        self.abort.abort();
    }

    /// Whether the task has run to completion or been cancelled
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }

    /// Wait for the result
    ///
    /// Resolves to `ShellError::Cancelled` if the task was aborted or its
    /// pool shut down before it finished.
    pub async fn join(self) -> Result<String, ShellError> {
        let id = self.id;
        self.result
            .await
            .unwrap_or(Err(ShellError::Cancelled { task: id }))
    }

    /// Block the current thread until the result arrives
    ///
    /// Must not be called from within an async context.
    pub fn wait(self) -> Result<String, ShellError> {
        let id = self.id;
        self.result
            .blocking_recv()
            .unwrap_or(Err(ShellError::Cancelled { task: id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExecMode, PoolConfig, RunnerConfig};
    use std::sync::mpsc;
    use std::sync::Mutex;

    fn shell(mode: ExecMode) -> AsyncShell {
        let runner = Runner::from_config(RunnerConfig::default().with_mode(mode)).unwrap();
        let pool = WorkerPool::new(&PoolConfig::default().with_workers(2)).unwrap();
        AsyncShell::new(runner, pool).with_shutdown_timeout(Duration::from_secs(1))
    }

    #[test]
    fn test_callback_receives_output() {
        let shell = shell(ExecMode::Compat);
        let (tx, rx) = mpsc::channel();

        let handle = shell.execute_command_with("echo hello", move |out| {
            tx.send(out).unwrap();
        });

        assert_eq!(rx.recv_timeout(Duration::from_secs(10)).unwrap(), "hello\n");
        assert_eq!(handle.wait().unwrap(), "hello\n");
        // Exactly once
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        shell.shutdown();
    }

    #[test]
    fn test_submit_returns_before_callback() {
        let shell = shell(ExecMode::Compat);
        let log = Arc::new(Mutex::new(Vec::new()));
        let (gate_tx, gate_rx) = mpsc::channel::<()>();

        let cb_log = Arc::clone(&log);
        let handle = shell.execute_command_with("echo hello", move |_| {
            gate_rx.recv().unwrap();
            cb_log.lock().unwrap().push("callback");
        });
        log.lock().unwrap().push("returned");
        gate_tx.send(()).unwrap();

        handle.wait().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["returned", "callback"]);

        shell.shutdown();
    }

    #[test]
    fn test_callback_runs_on_pool_thread() {
        let shell = shell(ExecMode::Compat);
        let (tx, rx) = mpsc::channel();

        let handle = shell.execute_with("echo", &["x"], move |_| {
            let name = std::thread::current().name().map(|n| n.to_string());
            tx.send(name).unwrap();
        });
        handle.wait().unwrap();

        let name = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(name.as_deref(), Some("shellrun-worker"));

        shell.shutdown();
    }

    #[test]
    fn test_task_ids_are_unique() {
        let shell = shell(ExecMode::Compat);

        let first = shell.execute("true", &[] as &[&str]);
        let second = shell.execute_command("true");
        assert_ne!(first.id(), second.id());

        first.wait().unwrap();
        second.wait().unwrap();
        shell.shutdown();
    }

    #[test]
    fn test_failure_skips_callback() {
        let shell = shell(ExecMode::Strict);
        let (tx, rx) = mpsc::channel::<String>();

        let handle = shell.execute_command_with("exit 2", move |out| {
            tx.send(out).unwrap();
        });

        match handle.wait() {
            Err(ShellError::NonZeroExit { exit_code, .. }) => assert_eq!(exit_code, Some(2)),
            other => panic!("Expected NonZeroExit, got {:?}", other),
        }
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        shell.shutdown();
    }

    #[test]
    fn test_cancel_long_running_task() {
        let shell = shell(ExecMode::Compat);
        let (tx, rx) = mpsc::channel::<String>();

        let handle = shell.execute_command_with("sleep 30", move |out| {
            tx.send(out).unwrap();
        });
        handle.cancel();

        match handle.wait() {
            Err(ShellError::Cancelled { .. }) => {}
            other => panic!("Expected Cancelled, got {:?}", other),
        }
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        shell.shutdown();
    }

    #[test]
    fn test_panicking_callback_is_not_cancellation() {
        let shell = shell(ExecMode::Compat);

        let handle = shell.execute_command_with("echo hi", |_| panic!("callback bug"));

        match handle.wait() {
            Err(ShellError::TaskPanicked { message, .. }) => assert_eq!(message, "callback bug"),
            other => panic!("Expected TaskPanicked, got {:?}", other),
        }

        // Workers survive a panicking callback
        assert_eq!(shell.execute_command("echo again").wait().unwrap(), "again\n");
        shell.shutdown();
    }

    #[test]
    fn test_panic_message_formats() {
        let owned: Box<dyn Any + Send> = Box::new(format!("code {}", 3));
        assert_eq!(panic_message(owned.as_ref()), "code 3");

        let other: Box<dyn Any + Send> = Box::new(5u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[tokio::test]
    async fn test_owned_pool_teardown_from_async_caller() {
        let stopped = shell(ExecMode::Strict);
        assert_eq!(stopped.execute_command("echo hi").join().await.unwrap(), "hi\n");
        stopped.shutdown();

        let dropped = shell(ExecMode::Strict);
        assert_eq!(dropped.execute_command("echo bye").join().await.unwrap(), "bye\n");
        drop(dropped);
    }

    #[tokio::test]
    async fn test_join_on_shared_pool() {
        let runner = Runner::new().unwrap();
        let shell = AsyncShell::new(runner, WorkerPool::current().unwrap());

        let handle = shell.execute_command("echo joined");
        assert_eq!(handle.join().await.unwrap(), "joined\n");
    }
}
