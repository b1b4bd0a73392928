//! Script executor
//!
//! Stages the script plus a fixed launcher in a scratch directory, spawns the
//! interpreter with a fully replaced environment, and enforces a wall-clock
//! timeout with a hard kill. Every script-level failure (non-zero exit,
//! timeout, launch failure) comes back as a structured [`ExecutionResult`],
//! never as an error.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time;
use tracing::{debug, warn};

use roost_core::domain::execution::ExecutionResult;

/// Launcher handed to the interpreter: loads the script to define its
/// top-level names, calls the target function with no arguments, and prints a
/// non-None return value to stdout. Exceptions go to stderr with a traceback
/// and exit code 1.
const LAUNCHER: &str = r#"import sys
import traceback

script_path = sys.argv[1]
func_name = sys.argv[2]

namespace = {"__name__": "roost_script"}
with open(script_path) as f:
    source = f.read()

try:
    exec(compile(source, script_path, "exec"), namespace)
except Exception as e:
    print(f"Error loading script: {e}", file=sys.stderr)
    traceback.print_exc(file=sys.stderr)
    sys.exit(1)

func = namespace.get(func_name)
if func is None:
    print(f"Function {func_name} not found in script", file=sys.stderr)
    sys.exit(1)

try:
    result = func()
    if result is not None:
        print(result)
except Exception as e:
    print(f"Error executing {func_name}: {e}", file=sys.stderr)
    traceback.print_exc(file=sys.stderr)
    sys.exit(1)
"#;

/// Executes script functions in isolated subprocesses.
#[derive(Debug, Clone)]
pub struct Executor {
    timeout: Duration,
    interpreter: String,
}

impl Executor {
    /// Creates an executor with the default `python3` interpreter.
    pub fn new(timeout_seconds: u64) -> Self {
        Self::with_interpreter(timeout_seconds, "python3")
    }

    pub fn with_interpreter(timeout_seconds: u64, interpreter: impl Into<String>) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_seconds),
            interpreter: interpreter.into(),
        }
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout.as_secs()
    }

    /// Executes `func_name()` from `script_text` in a separate OS process.
    ///
    /// The child's environment is replaced by `env` in its entirety; scripts
    /// never inherit the orchestrator's ambient variables.
    pub async fn execute(
        &self,
        script_text: &str,
        func_name: &str,
        env: &HashMap<String, String>,
    ) -> ExecutionResult {
        let workdir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return ExecutionResult::failed(
                    None,
                    String::new(),
                    String::new(),
                    format!("Failed to stage script: {}", e),
                );
            }
        };

        let script_path = workdir.path().join("script.py");
        let launcher_path = workdir.path().join("launcher.py");
        if let Err(e) = std::fs::write(&script_path, script_text)
            .and_then(|_| std::fs::write(&launcher_path, LAUNCHER))
        {
            return ExecutionResult::failed(
                None,
                String::new(),
                String::new(),
                format!("Failed to stage script: {}", e),
            );
        }

        debug!(func = func_name, script = %script_path.display(), "executing script");

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&launcher_path)
            .arg(&script_path)
            .arg(func_name)
            .env_clear()
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(func = func_name, error = %e, "failed to launch interpreter");
                return ExecutionResult::failed(
                    None,
                    String::new(),
                    String::new(),
                    format!("Failed to launch interpreter: {}", e),
                );
            }
        };

        let stdout_task = spawn_reader(child.stdout.take());
        let stderr_task = spawn_reader(child.stderr.take());

        match time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();

                match status.code() {
                    Some(0) => {
                        debug!(func = func_name, "execution succeeded");
                        ExecutionResult::success(0, stdout, stderr)
                    }
                    Some(code) => {
                        warn!(func = func_name, exit_code = code, "execution failed");
                        ExecutionResult::failed(
                            Some(code),
                            stdout,
                            stderr,
                            format!("Script exited with code {}", code),
                        )
                    }
                    // Killed by a signal before exiting.
                    None => {
                        warn!(func = func_name, "script terminated by signal");
                        ExecutionResult::failed(
                            None,
                            stdout,
                            stderr,
                            "Script terminated by signal".to_string(),
                        )
                    }
                }
            }
            Ok(Err(e)) => {
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                ExecutionResult::failed(
                    None,
                    stdout,
                    stderr,
                    format!("Failed to wait for script process: {}", e),
                )
            }
            Err(_) => {
                warn!(
                    func = func_name,
                    timeout_seconds = self.timeout.as_secs(),
                    "execution timed out, killing process"
                );

                // The script is not trusted to exit voluntarily: hard kill,
                // then reap so no zombie is left behind.
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "failed to kill timed-out process");
                }
                let _ = child.wait().await;

                // Output collected up to the kill is best-effort.
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                ExecutionResult::timeout(self.timeout.as_secs(), stdout, stderr)
            }
        }
    }
}

/// Drains one output pipe to completion, decoding permissively.
fn spawn_reader<R>(pipe: Option<R>) -> tokio::task::JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}
