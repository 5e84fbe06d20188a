#![allow(dead_code)]

use assert_cmd::Command;
use daemonctl::daemon::is_process_alive;
use daemonctl::ServiceDescriptor;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A demo service living in its own temp directory.
///
/// Any daemon still recorded in the pidfile is killed on drop so a failing
/// test does not leave processes behind.
pub struct TestService {
    dir: TempDir,
    config: PathBuf,
    descriptor: ServiceDescriptor,
}

impl TestService {
    pub fn new(name: &str) -> Self {
        let dir = TempDir::new().expect("failed to create tempdir");
        let work_dir = dir.path().join("work");
        fs::create_dir(&work_dir).expect("failed to create work dir");

        let descriptor = ServiceDescriptor::new(name)
            .pid_file(dir.path().join("run").join(format!("{name}.pid")))
            .stdin("/dev/null")
            .stdout(dir.path().join("stdout.log"))
            .stderr(dir.path().join("stderr.log"))
            .work_dir(&work_dir);

        let config = dir.path().join("service.toml");
        let contents = toml::to_string(&descriptor).expect("failed to serialize descriptor");
        fs::write(&config, contents).expect("failed to write config");

        Self {
            dir,
            config,
            descriptor,
        }
    }

    pub fn cmd(&self, command: &str) -> Command {
        self.cmd_with(&[], command)
    }

    /// Like `cmd`, with extra demo options placed before the command
    pub fn cmd_with(&self, options: &[&str], command: &str) -> Command {
        let mut cmd = Command::cargo_bin("daemonctl").expect("daemonctl binary not built");
        cmd.env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config)
            .args(options)
            .arg(command);
        cmd.timeout(WAIT_TIMEOUT);
        cmd
    }

    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    pub fn pid_file(&self) -> &Path {
        &self.descriptor.pid_file
    }

    pub fn write_pid_file(&self, contents: &str) {
        let path = self.pid_file();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn read_pid(&self) -> Option<u32> {
        fs::read_to_string(self.pid_file())
            .ok()
            .and_then(|content| content.trim().parse().ok())
    }

    /// Wait until the pidfile names a live process other than `previous`
    pub fn wait_for_new_pid(&self, previous: Option<u32>) -> u32 {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            if let Some(pid) = self.read_pid() {
                if Some(pid) != previous && is_process_alive(pid) {
                    return pid;
                }
            }

            if Instant::now() >= deadline {
                panic!("Timed out waiting for a new pid in {:?}", self.pid_file());
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn wait_for_pid(&self) -> u32 {
        self.wait_for_new_pid(None)
    }

    pub fn wait_for_pid_file_removed(&self) {
        wait_for(
            || !self.pid_file().exists(),
            &format!("{:?} to be removed", self.pid_file()),
        );
    }

    pub fn wait_for_log(&self, path: &Path, needle: &str) -> String {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            if let Ok(content) = fs::read_to_string(path) {
                if content.contains(needle) {
                    return content;
                }
            }

            if Instant::now() >= deadline {
                panic!("Timed out waiting for '{needle}' in {:?}", path);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        if let Some(pid) = self.read_pid() {
            if pid != 999_999_999 && is_process_alive(pid) {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
            }
        }
    }
}

pub fn wait_for<F: Fn() -> bool>(condition: F, what: &str) {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while !condition() {
        if Instant::now() >= deadline {
            panic!("Timed out waiting for {what}");
        }
        thread::sleep(POLL_INTERVAL);
    }
}

pub fn wait_until_dead(pid: u32) {
    wait_for(|| !is_process_alive(pid), &format!("process {pid} to exit"));
}

pub fn send_sigterm(pid: u32) {
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).expect("failed to send SIGTERM");
}
