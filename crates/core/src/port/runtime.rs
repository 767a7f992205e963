// Runtime CLI Port
// Abstraction over invocations of the container runtime binary

use async_trait::async_trait;
use thiserror::Error;

/// Captured output of one runtime CLI invocation
#[derive(Debug, Clone)]
pub struct CliOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Invocation errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("podman not found in PATH")]
    NotFound,

    #[error("spawn failed: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Runtime CLI trait
///
/// Implementations:
/// - PodmanCli: invokes the real podman binary (infra-podman crate)
/// - mocks::MockRuntimeCli: scripted outputs for unit tests
#[async_trait]
pub trait RuntimeCli: Send + Sync {
    /// Invoke the runtime binary once with `args`, capturing output.
    ///
    /// A non-zero exit is NOT an error at this layer; callers decide what
    /// it means for the operation they issued.
    ///
    /// # Errors
    /// - CliError::SpawnFailed if the binary cannot be started
    /// - CliError::Io if output collection fails
    async fn run(&self, args: &[String]) -> Result<CliOutput, CliError>;

    /// Best-effort, non-blocking container removal used from Drop paths.
    /// Must not block and must not panic.
    fn remove_detached(&self, container_id: &str);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock Runtime CLI for testing.
    ///
    /// Scripted responses are consumed in order; once exhausted every call
    /// returns the default output (success with empty streams unless
    /// overridden). All invocations are recorded for assertion.
    pub struct MockRuntimeCli {
        responses: Mutex<VecDeque<Result<CliOutput, CliError>>>,
        default: CliOutput,
        calls: Mutex<Vec<Vec<String>>>,
        detached_removals: Mutex<Vec<String>>,
    }

    impl MockRuntimeCli {
        pub fn new() -> Self {
            Self::with_default(0, "", "")
        }

        /// Set the output returned after scripted responses run out.
        pub fn with_default(exit_code: i32, stdout: &str, stderr: &str) -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                default: CliOutput {
                    exit_code: Some(exit_code),
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                },
                calls: Mutex::new(Vec::new()),
                detached_removals: Mutex::new(Vec::new()),
            }
        }

        pub fn push_ok(&self, exit_code: i32, stdout: &str, stderr: &str) {
            self.responses.lock().unwrap().push_back(Ok(CliOutput {
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }));
        }

        pub fn push_err(&self, err: CliError) {
            self.responses.lock().unwrap().push_back(Err(err));
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn detached_removals(&self) -> Vec<String> {
            self.detached_removals.lock().unwrap().clone()
        }
    }

    impl Default for MockRuntimeCli {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl RuntimeCli for MockRuntimeCli {
        async fn run(&self, args: &[String]) -> Result<CliOutput, CliError> {
            self.calls.lock().unwrap().push(args.to_vec());

            match self.responses.lock().unwrap().pop_front() {
                Some(response) => response,
                None => Ok(self.default.clone()),
            }
        }

        fn remove_detached(&self, container_id: &str) {
            self.detached_removals
                .lock()
                .unwrap()
                .push(container_id.to_string());
        }
    }
}
