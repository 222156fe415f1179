//! Client-side tokio runtime.

use std::{future::Future, sync::Arc};

use thiserror::Error;
use tokio::runtime::{Builder, Runtime};

/// Shared runtime of the lobby client.
#[derive(Debug, Clone)]
pub struct ClientRuntime {
    runtime: Arc<Runtime>,
}

impl ClientRuntime {
    /// Builds a multi-thread runtime with two workers for the directory task,
    /// the LAN source and join tasks.
    pub fn multi_thread() -> Result<Self, RuntimeError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("lobby-client")
            .enable_all()
            .build()
            .map_err(RuntimeError::Build)?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    /// Drives a future to completion on the runtime (CLI entry point).
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Errors while building the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to build tokio runtime: {0}")]
    Build(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_on_drives_spawned_tasks() {
        let runtime = ClientRuntime::multi_thread().unwrap();
        let answer = runtime.block_on(async { tokio::spawn(async { 21 * 2 }).await.unwrap() });
        assert_eq!(answer, 42);
    }
}
