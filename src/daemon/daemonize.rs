// Daemonization support for Unix systems

use super::pid::PidFile;
use crate::config::ServiceDescriptor;
use crate::error::{DaemonError, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Turn the calling process into a detached daemon.
///
/// Performs the double fork, so this only returns in the final grandchild;
/// the original process and the intermediate session leader both exit with
/// status 0. On return the process runs in `descriptor.work_dir` with umask 0,
/// its standard streams are redirected, its pid is recorded in `pid_file`, and
/// SIGTERM leads to a clean exit that removes the pidfile.
///
/// The singleton check is the caller's job, see [`DaemonManager::start`].
///
/// [`DaemonManager::start`]: super::DaemonManager::start
#[cfg(unix)]
pub fn daemonize(descriptor: &ServiceDescriptor, pid_file: &PidFile) -> Result<u32> {
    use crate::error::ForkStage;
    use nix::sys::stat::{umask, Mode};
    use nix::unistd::{fork, setsid, ForkResult};

    tracing::debug!(service = %descriptor.name, "Detaching from terminal");
    flush_std_streams();

    // First fork
    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => std::process::exit(0),
        Ok(ForkResult::Child) => {}
        Err(e) => return Err(DaemonError::Fork(ForkStage::First, e.to_string())),
    }

    std::env::set_current_dir(&descriptor.work_dir).map_err(|source| DaemonError::WorkDir {
        path: descriptor.work_dir.clone(),
        source,
    })?;
    umask(Mode::empty());
    setsid().map_err(|e| DaemonError::Setsid(e.to_string()))?;

    // Second fork so the daemon is not a session leader and can never
    // acquire a controlling terminal again
    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => std::process::exit(0),
        Ok(ForkResult::Child) => {}
        Err(e) => return Err(DaemonError::Fork(ForkStage::Second, e.to_string())),
    }

    flush_std_streams();
    StdioRedirect::open(descriptor)?.apply()?;

    let pid = std::process::id();
    pid_file.write(pid)?;
    register_exit_hook(pid_file, pid)?;
    install_termination_handler(descriptor.name.clone())?;

    tracing::info!(service = %descriptor.name, pid, "Daemon started");
    Ok(pid)
}

#[cfg(not(unix))]
pub fn daemonize(_descriptor: &ServiceDescriptor, _pid_file: &PidFile) -> Result<u32> {
    Err(DaemonError::Other(
        "Daemonization is only supported on Unix systems".to_string(),
    ))
}

fn flush_std_streams() {
    use std::io::Write;

    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}

/// Opened redirect targets for the three standard streams
struct StdioRedirect {
    stdin: File,
    stdout: File,
    stderr: File,
}

impl StdioRedirect {
    fn open(descriptor: &ServiceDescriptor) -> Result<Self> {
        let stdin = OpenOptions::new()
            .read(true)
            .open(&descriptor.stdin)
            .map_err(|source| redirect_open_error("stdin", &descriptor.stdin, source))?;
        let stdout = open_append(&descriptor.stdout)
            .map_err(|source| redirect_open_error("stdout", &descriptor.stdout, source))?;
        let stderr = open_append(&descriptor.stderr)
            .map_err(|source| redirect_open_error("stderr", &descriptor.stderr, source))?;

        Ok(Self {
            stdin,
            stdout,
            stderr,
        })
    }

    /// Replace descriptors 0, 1 and 2 with the opened files
    #[cfg(unix)]
    fn apply(self) -> Result<()> {
        use nix::libc;
        use std::os::unix::io::AsRawFd;

        let targets = [
            ("stdin", &self.stdin, libc::STDIN_FILENO),
            ("stdout", &self.stdout, libc::STDOUT_FILENO),
            ("stderr", &self.stderr, libc::STDERR_FILENO),
        ];

        for (stream, file, target_fd) in targets {
            if unsafe { libc::dup2(file.as_raw_fd(), target_fd) } < 0 {
                return Err(DaemonError::Redirect {
                    stream,
                    reason: std::io::Error::last_os_error().to_string(),
                });
            }
        }

        // The originals are closed on drop; 0, 1 and 2 keep the files open
        Ok(())
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn redirect_open_error(stream: &'static str, path: &Path, source: std::io::Error) -> DaemonError {
    DaemonError::RedirectOpen {
        stream,
        path: path.to_path_buf(),
        source,
    }
}

/// Pidfile and pid the exit hook cleans up for
#[cfg(unix)]
static EXIT_HOOK_TARGET: std::sync::OnceLock<(PidFile, u32)> = std::sync::OnceLock::new();

#[cfg(unix)]
extern "C" fn remove_pid_file_at_exit() {
    if let Some((pid_file, pid)) = EXIT_HOOK_TARGET.get() {
        pid_file.remove_if_owned(*pid);
    }
}

/// Remove the pidfile on every `exit`, including the one issued by the
/// termination handler, as long as it still records `pid`
#[cfg(unix)]
fn register_exit_hook(pid_file: &PidFile, pid: u32) -> Result<()> {
    use nix::libc;

    if EXIT_HOOK_TARGET.set((pid_file.clone(), pid)).is_err() {
        return Err(DaemonError::ExitHook);
    }
    if unsafe { libc::atexit(remove_pid_file_at_exit) } != 0 {
        return Err(DaemonError::ExitHook);
    }
    Ok(())
}

/// Map SIGTERM to `exit(1)` so the exit hook runs.
///
/// The handler runs on its own thread, which is why this must only be called
/// after both forks.
#[cfg(unix)]
fn install_termination_handler(service: String) -> Result<()> {
    ctrlc::set_handler(move || {
        tracing::info!(service = %service, "Received termination signal, exiting");
        std::process::exit(1);
    })?;
    Ok(())
}
