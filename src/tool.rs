//! Adapter around the external findsim binary.
//!
//! The sweep and the comparator only see the [`Tool`] trait, so tests can
//! swap the real subprocess for an in-process fake.

use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::{HarnessError, Result};

/// How often a child under a timeout is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a successful tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Standard output, lossily decoded as UTF-8.
    pub stdout: String,
    /// Wall-clock time of the invocation as seen by the harness.
    pub elapsed: Duration,
}

/// Something that can run the similarity-search tool.
pub trait Tool: Sync {
    /// Program name used in log lines and error messages.
    fn name(&self) -> &str;

    /// Run with the given argument vector and wait for completion.
    ///
    /// Implementations must return [`HarnessError::ExternalToolFailure`] for a
    /// non-zero exit status.
    fn run(&self, args: &[String]) -> Result<ToolOutput>;

    /// Render a command line for logs and errors.
    fn render(&self, args: &[String]) -> String {
        render_command(self.name(), args)
    }
}

/// The real findsim binary, run as a child process without a shell.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    program: PathBuf,
    display: String,
    workdir: PathBuf,
    timeout: Option<Duration>,
}

impl ExternalTool {
    /// Create an adapter running `program` inside `workdir`.
    ///
    /// A relative `workdir` is resolved against the current directory. A
    /// `program` containing a path separator is resolved against `workdir`;
    /// a bare name is looked up on `PATH`.
    pub fn new(program: impl AsRef<Path>, workdir: impl AsRef<Path>) -> Result<Self> {
        let workdir = absolute(workdir.as_ref())?;
        let program = program.as_ref();
        let display = program.display().to_string();
        Ok(Self {
            program: resolve_program(&workdir, program),
            display,
            workdir,
            timeout: None,
        })
    }

    /// Kill the child and fail with [`HarnessError::Timeout`] after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory the tool runs in.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn spawn(&self, args: &[String]) -> Result<Child> {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // A timed child leads its own process group so that a timeout also
        // takes down anything it forked and the output pipes close.
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        command.spawn().map_err(|source| HarnessError::Spawn {
            program: self.program.clone(),
            source,
        })
    }
}

impl Tool for ExternalTool {
    fn name(&self) -> &str {
        &self.display
    }

    fn run(&self, args: &[String]) -> Result<ToolOutput> {
        let command = self.render(args);
        debug!(%command, workdir = %self.workdir.display(), "running tool");

        let start = Instant::now();
        let child = self.spawn(args)?;
        let output = match self.timeout {
            None => child.wait_with_output(),
            Some(timeout) => match wait_with_timeout(child, timeout) {
                Ok(Some(output)) => Ok(output),
                Ok(None) => {
                    return Err(HarnessError::Timeout {
                        command,
                        secs: timeout.as_secs(),
                    })
                }
                Err(e) => Err(e),
            },
        }
        .map_err(|source| HarnessError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let elapsed = start.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        trace!(%command, %stdout, "tool output");

        if !output.status.success() {
            return Err(HarnessError::ExternalToolFailure {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(ToolOutput { stdout, elapsed })
    }
}

/// Join program and arguments, quoting arguments that contain whitespace.
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push('\'');
            rendered.push_str(arg);
            rendered.push('\'');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| HarnessError::io(".", e))?;
    Ok(cwd.join(path))
}

fn resolve_program(workdir: &Path, program: &Path) -> PathBuf {
    if program.is_absolute() || program.components().count() == 1 {
        program.to_path_buf()
    } else {
        workdir.join(program)
    }
}

// Pipes are drained on separate threads so a chatty child cannot block on a
// full pipe while we poll it. Returns `None` if the child was killed.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> std::io::Result<Option<Output>> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break Some(status);
        }
        if start.elapsed() > timeout {
            kill_group(&mut child)?;
            child.wait()?;
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(status.map(|status| Output {
        status,
        stdout,
        stderr,
    }))
}

#[cfg(unix)]
fn kill_group(child: &mut Child) -> std::io::Result<()> {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: plain syscall; a negative pid addresses the child's own group.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
        return Ok(());
    }
    child.kill()
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}
