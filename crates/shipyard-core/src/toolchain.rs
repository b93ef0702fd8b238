//! External toolchain invocation and build-log capture.
//!
//! Runs the checkout's `configure.*` and `build.*` scripts in order and
//! captures their output. Non-zero exits are not errors at this layer: the
//! pipeline always proceeds to packaging, and the build log is the only
//! failure signal downstream. A step that cannot be spawned, or that
//! exceeds the optional timeout, is recorded the same way.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::manifest::Platform;

/// Separator between captured streams in the build log.
pub const LOG_DELIMITER: &[u8] = b"\n\n\n\n";

/// Captured output of one toolchain step.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// Step name (`configure`, `build`).
    pub step: String,

    /// Process exit code; -1 when the step could not run to completion.
    pub exit_code: i32,

    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl StepOutput {
    fn failed(step: &str, message: String) -> Self {
        Self {
            step: step.to_string(),
            exit_code: -1,
            stdout: Vec::new(),
            stderr: message.into_bytes(),
        }
    }
}

/// Runs the configure/build scripts against a checked-out commit.
#[derive(Debug)]
pub struct ToolchainRunner {
    dependencies_dir: PathBuf,
    step_timeout: Option<Duration>,
}

impl ToolchainRunner {
    /// `dependencies_dir` is passed to the configure step via `-DD=<dir>`.
    /// `step_timeout` bounds each step; `None` waits indefinitely.
    pub fn new(dependencies_dir: PathBuf, step_timeout: Option<Duration>) -> Self {
        Self {
            dependencies_dir,
            step_timeout,
        }
    }

    /// Run both steps in order inside `checkout`, capturing each one's
    /// stdout and stderr. Never fails: broken steps become log content.
    pub async fn run(&self, checkout: &Path, platform: Platform) -> Vec<StepOutput> {
        let ext = platform.script_ext();
        let configure = checkout.join(format!("configure.{ext}"));
        let build = checkout.join(format!("build.{ext}"));
        let deps_arg = format!("-DD={}", self.dependencies_dir.display());

        vec![
            self.run_step("configure", &configure, &[&deps_arg], checkout)
                .await,
            self.run_step("build", &build, &[], checkout).await,
        ]
    }

    async fn run_step(
        &self,
        step: &str,
        program: &Path,
        args: &[&str],
        cwd: &Path,
    ) -> StepOutput {
        debug!(step, program = %program.display(), "running toolchain step");

        let child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!(step, error = %e, "toolchain step failed to spawn");
                return StepOutput::failed(
                    step,
                    format!("shipyard: failed to spawn {}: {e}\n", program.display()),
                );
            }
        };

        let output = match self.step_timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(step, timeout_secs = limit.as_secs(), "toolchain step timed out");
                    return StepOutput::failed(
                        step,
                        format!(
                            "shipyard: step {step} timed out after {} seconds\n",
                            limit.as_secs()
                        ),
                    );
                }
            },
            None => child.wait_with_output().await,
        };

        match output {
            Ok(output) => StepOutput {
                step: step.to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                stdout: output.stdout,
                stderr: output.stderr,
            },
            Err(e) => StepOutput::failed(step, format!("shipyard: failed to wait on {step}: {e}\n")),
        }
    }
}

/// Concatenate captured streams into a single build log: every step's
/// stdout in invocation order, then every step's stderr in invocation
/// order, each section terminated by [`LOG_DELIMITER`].
pub fn render_build_log(steps: &[StepOutput]) -> Vec<u8> {
    let mut log = Vec::new();
    for step in steps {
        log.extend_from_slice(&step.stdout);
        log.extend_from_slice(LOG_DELIMITER);
    }
    for step in steps {
        log.extend_from_slice(&step.stderr);
        log.extend_from_slice(LOG_DELIMITER);
    }
    log
}
