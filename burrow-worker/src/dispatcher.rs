//! The embedded-interpreter shim is explicitly out of scope (spec §1): this
//! crate never evaluates handler code itself. `Dispatcher` is the seam where
//! that collaborator plugs in — grounded directly in tvix's
//! `build/src/buildservice/dummy.rs` (a `BuildService` that always errors,
//! used when no real backend is configured) and
//! `build/src/buildservice/oci.rs` (`spawn_bundle`, which shells out to an
//! external `runc`-like binary and streams its stdio).

use async_trait::async_trait;

use crate::Error;

/// Runs one invocation of an installed handler and returns its raw output
/// bytes. A real deployment plugs in whatever runtime actually evaluates the
/// installed code (a language interpreter, a micro-VM, a container runtime);
/// this crate only defines the contract and the process boundary around it.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, handler_name: &str, payload: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Always fails. Useful as a placeholder so the worker host can be built,
/// wired, and tested end-to-end before a real dispatcher is plugged in.
pub struct UnavailableDispatcher;

#[async_trait]
impl Dispatcher for UnavailableDispatcher {
    async fn dispatch(&self, _handler_name: &str, _payload: &[u8]) -> Result<Vec<u8>, Error> {
        Err(Error::Handler(
            "no handler dispatcher configured for this worker host".into(),
        ))
    }
}

/// Shells out to an external runner binary for each invocation, passing the
/// handler name as an argument and the payload on stdin, reading the output
/// from stdout. Stderr is captured and surfaced as the error message on
/// non-zero exit, matching how `spawn_bundle` treats a failing sandboxed
/// build.
pub struct SubprocessDispatcher {
    runner_path: std::path::PathBuf,
    install_dir: std::path::PathBuf,
}

impl SubprocessDispatcher {
    pub fn new(runner_path: impl Into<std::path::PathBuf>, install_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            runner_path: runner_path.into(),
            install_dir: install_dir.into(),
        }
    }
}

#[async_trait]
impl Dispatcher for SubprocessDispatcher {
    async fn dispatch(&self, handler_name: &str, payload: &[u8]) -> Result<Vec<u8>, Error> {
        use tokio::io::AsyncWriteExt;
        use tokio::process::Command;

        let mut child = Command::new(&self.runner_path)
            .arg(handler_name)
            .current_dir(&self.install_dir)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child.stdin.take().expect("stdin piped");
        stdin.write_all(payload).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(Error::Handler(String::from_utf8_lossy(&output.stderr).into_owned()))
        }
    }
}
