//! External solver process invocation.
//!
//! The encoded instance is written to a fresh temp file whose path goes into
//! the argument vector; stdout is redirected into a second temp file. Both
//! files live in [`NamedTempFile`] guards and are removed when the guards drop,
//! whatever the outcome. No shell is involved.
//!
//! On unix the solver leads its own process group, and a deadline kill
//! signals the whole group so helpers the solver started die with it.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

use crate::error::SolveError;

const INPUT_PREFIX: &str = "optimize-route-input";
const OUTPUT_PREFIX: &str = "optimize-route-output";

/// Interval between exit checks while a deadline is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One element of a solver argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Value(OsString),
    /// Replaced by the input file path at invocation time.
    InputPath,
}

/// Program plus argument vector, built without any shell.
///
/// # Examples
///
/// ```
/// use optimizer_api::invoke::SolverCommand;
///
/// let cmd = SolverCommand::new("vroom").arg("-t").arg("-i").input_path();
/// assert_eq!(cmd.render("/tmp/in.txt"), ["vroom", "-t", "-i", "/tmp/in.txt"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverCommand {
    program: PathBuf,
    args: Vec<Arg>,
}

impl SolverCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<OsString>) -> Self {
        self.args.push(Arg::Value(value.into()));
        self
    }

    pub fn input_path(mut self) -> Self {
        self.args.push(Arg::InputPath);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn resolve_args<'a>(&'a self, input: &'a Path) -> impl Iterator<Item = OsString> + 'a {
        self.args.iter().map(move |arg| match arg {
            Arg::Value(v) => v.clone(),
            Arg::InputPath => input.as_os_str().to_owned(),
        })
    }

    /// Full command line as strings, for logging and tests.
    pub fn render(&self, input: impl AsRef<Path>) -> Vec<String> {
        let input = input.as_ref();
        std::iter::once(self.program.as_os_str().to_owned())
            .chain(self.resolve_args(input))
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }
}

/// Result of running a solver process to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Exit code 0; holds the captured stdout.
    Completed(String),
    /// Non-zero exit, or terminated by a signal (`code` is `None`).
    Failed { code: Option<i32> },
    /// Killed after the deadline elapsed.
    TimedOut { after: Duration },
}

/// Runs `command` on `input`, capturing stdout through a temp file.
///
/// Temp files are created in `tmp_dir` with random names, so concurrent
/// invocations never collide. When `timeout` is set the child is killed once
/// it elapses.
pub fn invoke(
    command: &SolverCommand,
    input: &str,
    tmp_dir: &Path,
    timeout: Option<Duration>,
) -> Result<Invocation, SolveError> {
    let mut input_file = Builder::new().prefix(INPUT_PREFIX).tempfile_in(tmp_dir)?;
    input_file.write_all(input.as_bytes())?;
    input_file.flush()?;

    let output_file = Builder::new().prefix(OUTPUT_PREFIX).tempfile_in(tmp_dir)?;

    let status = run(command, &input_file, &output_file, timeout)?;
    let invocation = match status {
        Some(status) if status.success() => {
            Invocation::Completed(std::fs::read_to_string(output_file.path())?)
        }
        Some(status) => Invocation::Failed {
            code: status.code(),
        },
        None => Invocation::TimedOut {
            after: timeout.unwrap_or_default(),
        },
    };
    Ok(invocation)
}

/// Spawns the process and waits; `None` means the deadline killed it.
fn run(
    command: &SolverCommand,
    input_file: &NamedTempFile,
    output_file: &NamedTempFile,
    timeout: Option<Duration>,
) -> Result<Option<ExitStatus>, SolveError> {
    let stdout = output_file.as_file().try_clone()?;

    debug!(command = ?command.render(input_file.path()), "Spawning solver");
    let mut process = Command::new(command.program());
    process
        .args(command.resolve_args(input_file.path()))
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::inherit());
    #[cfg(unix)]
    process.process_group(0);
    let mut child = process.spawn()?;

    match timeout {
        None => Ok(Some(child.wait()?)),
        Some(limit) => wait_with_deadline(&mut child, limit),
    }
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<Option<ExitStatus>, SolveError> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            warn!(pid = child.id(), limit_ms = limit.as_millis() as u64, "Solver exceeded deadline, killing");
            // The child may exit between try_wait and kill.
            if let Err(e) = kill_tree(child) {
                debug!("Kill after deadline failed: {}", e);
            }
            child.wait()?;
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Kills the solver's process group; its pid is the group id.
#[cfg(unix)]
fn kill_tree(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL)?;
    Ok(())
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}
