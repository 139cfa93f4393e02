//! Compiler invocation: run the typesetting driver for one rendered document.
//!
//! [`Compiler`] is the seam the schedulers depend on. [`LatexmkCompiler`]
//! is the production implementation; tests substitute in-process stubs.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::cancel::CancellationToken;
use crate::constants::{CHILD_POLL_INTERVAL, DEFAULT_ENGINE, DEFAULT_TOOL, DIAGNOSTIC_TAIL_CHARS};
use crate::project::{ProjectDescriptor, Variant};

/// One compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileJob {
    /// Identifies the task in progress output, e.g. `3_exam`.
    pub job_id: String,
    /// Rendered document handed to the compiler.
    pub source_path: PathBuf,
    /// Basename for the compiler's output artifacts.
    pub output_basename: String,
}

impl CompileJob {
    /// Job for `variant` of the project at `project_index`.
    #[must_use]
    pub fn for_variant(
        project_index: usize,
        project: &ProjectDescriptor,
        variant: Variant,
        source_path: PathBuf,
    ) -> Self {
        Self {
            job_id: variant.job_id(project_index),
            source_path,
            output_basename: variant.output_basename(&project.name),
        }
    }
}

/// Outcome of one compiler invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileResult {
    pub succeeded: bool,
    pub job_id: String,
    /// Wall-clock time from spawn to exit.
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Leading part of the diagnostic output, set only on failure.
    pub diagnostic_tail: Option<String>,
}

impl CompileResult {
    #[must_use]
    pub fn success(job_id: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            succeeded: true,
            job_id: job_id.into(),
            elapsed,
            diagnostic_tail: None,
        }
    }

    /// Failed result; `diagnostic` is cut to [`DIAGNOSTIC_TAIL_CHARS`].
    #[must_use]
    pub fn failure(job_id: impl Into<String>, elapsed: Duration, diagnostic: &str) -> Self {
        Self {
            succeeded: false,
            job_id: job_id.into(),
            elapsed,
            diagnostic_tail: truncate_diagnostic(diagnostic),
        }
    }
}

/// Serialize a [`Duration`] as fractional seconds.
pub fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Keep at most [`DIAGNOSTIC_TAIL_CHARS`] characters; empty text yields `None`.
#[must_use]
pub fn truncate_diagnostic(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.chars().take(DIAGNOSTIC_TAIL_CHARS).collect())
    }
}

/// Something that can compile a rendered document.
pub trait Compiler: Send + Sync {
    /// Compile `job`, blocking until the compiler has finished.
    ///
    /// Never panics on compiler failure; every failure is a failed result.
    fn compile(&self, job: &CompileJob) -> CompileResult;
}

/// Runs `latexmk -<engine> -jobname=<basename> -cd <path>`.
#[derive(Debug, Clone)]
pub struct LatexmkCompiler {
    program: String,
    engine: String,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl LatexmkCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: DEFAULT_TOOL.to_string(),
            engine: DEFAULT_ENGINE.to_string(),
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Use another driver executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Use another engine flag (without the leading dash).
    #[must_use]
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Kill a compiler that runs longer than `timeout`. `None` waits forever.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kill running compilers once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Command-line arguments for `job`.
    #[must_use]
    pub fn args(&self, job: &CompileJob) -> Vec<String> {
        vec![
            format!("-{}", self.engine),
            format!("-jobname={}", job.output_basename),
            "-cd".to_string(),
            job.source_path.display().to_string(),
        ]
    }

    fn wait(&self, child: &mut Child, start: Instant) -> Result<ExitStatus, Interruption> {
        loop {
            if let Some(status) = child.try_wait().map_err(Interruption::Wait)? {
                return Ok(status);
            }
            if self.cancel.is_cancelled() {
                kill(child);
                return Err(Interruption::Cancelled);
            }
            if let Some(timeout) = self.timeout {
                if start.elapsed() >= timeout {
                    kill(child);
                    return Err(Interruption::TimedOut(timeout));
                }
            }
            std::thread::sleep(CHILD_POLL_INTERVAL);
        }
    }
}

impl Default for LatexmkCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler for LatexmkCompiler {
    fn compile(&self, job: &CompileJob) -> CompileResult {
        let args = self.args(job);
        tracing::debug!(job = %job.job_id, "exec: {} {}", self.program, args.join(" "));

        let start = Instant::now();
        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // The driver leads its own process group so a kill reaches the engine it runs.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);
        let spawned = command.spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return CompileResult::failure(
                    &job.job_id,
                    start.elapsed(),
                    &format!("failed to start {}: {e}", self.program),
                );
            }
        };

        // Drain both pipes concurrently so a chatty compiler never blocks on a full pipe.
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = self.wait(&mut child, start);
        let elapsed = start.elapsed();

        match status {
            Ok(status) => {
                let _ = join_reader(stdout);
                let stderr = join_reader(stderr);
                if status.success() {
                    CompileResult::success(&job.job_id, elapsed)
                } else {
                    tracing::debug!(job = %job.job_id, %status, "compiler failed");
                    CompileResult::failure(&job.job_id, elapsed, &stderr)
                }
            }
            // Readers are left detached: a child that left the driver's group may still hold the pipes.
            Err(interruption) => {
                tracing::warn!(job = %job.job_id, "{interruption}");
                CompileResult::failure(&job.job_id, elapsed, &interruption.to_string())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum Interruption {
    #[error("compiler timed out after {0:?} and was killed")]
    TimedOut(Duration),
    #[error("compilation cancelled")]
    Cancelled,
    #[error("failed to wait for compiler: {0}")]
    Wait(std::io::Error),
}

/// Kill the driver's whole process group, then reap the driver.
fn kill(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let group = i32::try_from(child.id()).map(Pid::from_raw);
        match group {
            Ok(pid) => {
                if let Err(errno) = killpg(pid, Signal::SIGKILL) {
                    tracing::debug!(%errno, "killpg failed, killing driver only");
                    let _ = child.kill();
                }
            }
            Err(_) => {
                let _ = child.kill();
            }
        }
    }
    #[cfg(not(unix))]
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
