use crate::error::{DaemonError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything needed to run one named service as a daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Service name, used only for display
    #[serde(default = "default_name")]
    pub name: String,

    /// Pidfile recording the running instance
    #[serde(default = "default_pid_file")]
    pub pid_file: PathBuf,

    /// Standard input source of the daemon
    #[serde(default = "default_stdin")]
    pub stdin: PathBuf,

    /// File the daemon's standard output is appended to
    #[serde(default = "default_log_file")]
    pub stdout: PathBuf,

    /// File the daemon's standard error is appended to
    #[serde(default = "default_log_file")]
    pub stderr: PathBuf,

    /// Working directory of the daemon
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

// Default value functions for serde
fn default_name() -> String {
    "daemon".to_string()
}

fn default_pid_file() -> PathBuf {
    std::env::temp_dir().join("daemonctl.pid")
}

fn default_stdin() -> PathBuf {
    PathBuf::from("/dev/null")
}

fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("daemonctl.log")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("/")
}

impl Default for ServiceDescriptor {
    fn default() -> Self {
        Self {
            name: default_name(),
            pid_file: default_pid_file(),
            stdin: default_stdin(),
            stdout: default_log_file(),
            stderr: default_log_file(),
            work_dir: default_work_dir(),
        }
    }
}

impl ServiceDescriptor {
    /// Create a descriptor with default paths for the named service
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn pid_file(mut self, path: impl AsRef<Path>) -> Self {
        self.pid_file = path.as_ref().to_path_buf();
        self
    }

    pub fn stdin(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin = path.as_ref().to_path_buf();
        self
    }

    pub fn stdout(mut self, path: impl AsRef<Path>) -> Self {
        self.stdout = path.as_ref().to_path_buf();
        self
    }

    pub fn stderr(mut self, path: impl AsRef<Path>) -> Self {
        self.stderr = path.as_ref().to_path_buf();
        self
    }

    pub fn work_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.work_dir = path.as_ref().to_path_buf();
        self
    }

    /// Load a descriptor from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let mut descriptor: ServiceDescriptor = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| DaemonError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| DaemonError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(DaemonError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        descriptor.expand_env_vars();
        descriptor.validate()?;

        Ok(descriptor)
    }

    /// Validate the descriptor
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DaemonError::ConfigError("name must not be empty".to_string()));
        }

        let paths = [
            ("pid_file", &self.pid_file),
            ("stdin", &self.stdin),
            ("stdout", &self.stdout),
            ("stderr", &self.stderr),
            ("work_dir", &self.work_dir),
        ];
        for (field, path) in paths {
            if path.as_os_str().is_empty() {
                return Err(DaemonError::ConfigError(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Make every relative path absolute with respect to `base`.
    ///
    /// The daemon changes its working directory before it opens the redirect
    /// targets and writes the pidfile, while the controller keeps its own, so
    /// both sides must agree on absolute locations.
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        let absolute = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                base.join(path)
            }
        };

        self.pid_file = absolute(self.pid_file);
        self.stdin = absolute(self.stdin);
        self.stdout = absolute(self.stdout);
        self.stderr = absolute(self.stderr);
        self.work_dir = absolute(self.work_dir);
        self
    }

    /// Expand environment variables in every path
    fn expand_env_vars(&mut self) {
        self.pid_file = expand_env_in_path(&self.pid_file);
        self.stdin = expand_env_in_path(&self.stdin);
        self.stdout = expand_env_in_path(&self.stdout);
        self.stderr = expand_env_in_path(&self.stderr);
        self.work_dir = expand_env_in_path(&self.work_dir);
    }
}

/// Expand `$VAR` and `${VAR}` references in a string
fn expand_env_in_string(s: &str) -> String {
    let mut result = s.to_string();

    // Longest names first so $HOME_DIR is not clobbered by $HOME
    let mut vars: Vec<(String, String)> = std::env::vars().collect();
    vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    for (key, value) in vars {
        result = result.replace(&format!("${{{}}}", key), &value);
        result = result.replace(&format!("${}", key), &value);
    }

    result
}

fn expand_env_in_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(expand_env_in_string(&path_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_point_at_temp_dir() {
        let descriptor = ServiceDescriptor::default();

        assert_eq!(descriptor.name, "daemon");
        assert_eq!(descriptor.pid_file, std::env::temp_dir().join("daemonctl.pid"));
        assert_eq!(descriptor.stdin, PathBuf::from("/dev/null"));
        assert_eq!(descriptor.stdout, descriptor.stderr);
        assert_eq!(descriptor.work_dir, PathBuf::from("/"));
    }

    #[test]
    fn test_builder_overrides_paths() {
        let descriptor = ServiceDescriptor::new("maind")
            .pid_file("/run/maind.pid")
            .stdout("/var/log/maind.out")
            .stderr("/var/log/maind.err")
            .work_dir("/srv");

        assert_eq!(descriptor.name, "maind");
        assert_eq!(descriptor.pid_file, PathBuf::from("/run/maind.pid"));
        assert_eq!(descriptor.stdout, PathBuf::from("/var/log/maind.out"));
        assert_eq!(descriptor.stderr, PathBuf::from("/var/log/maind.err"));
        assert_eq!(descriptor.work_dir, PathBuf::from("/srv"));
        assert_eq!(descriptor.stdin, PathBuf::from("/dev/null"));
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let descriptor = ServiceDescriptor::new("  ");
        assert!(matches!(
            descriptor.validate(),
            Err(DaemonError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let descriptor = ServiceDescriptor::new("svc").pid_file("");
        let err = descriptor.validate().unwrap_err();
        assert!(err.to_string().contains("pid_file"));
    }

    #[test]
    fn test_resolve_relative_to() {
        let descriptor = ServiceDescriptor::new("svc")
            .pid_file("run/svc.pid")
            .stdout("/var/log/svc.log")
            .work_dir(".");

        let resolved = descriptor.resolve_relative_to(Path::new("/home/op"));

        assert_eq!(resolved.pid_file, PathBuf::from("/home/op/run/svc.pid"));
        assert_eq!(resolved.stdout, PathBuf::from("/var/log/svc.log"));
        assert_eq!(resolved.work_dir, PathBuf::from("/home/op/."));
    }

    #[test]
    fn test_from_toml_file_with_partial_fields() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("svc.toml");
        fs::write(
            &config_path,
            r#"
                name = "ticker"
                pid_file = "/tmp/ticker.pid"
                stdout = "/tmp/ticker.out"
            "#,
        )
        .unwrap();

        let descriptor = ServiceDescriptor::from_file(&config_path).unwrap();
        assert_eq!(descriptor.name, "ticker");
        assert_eq!(descriptor.pid_file, PathBuf::from("/tmp/ticker.pid"));
        assert_eq!(descriptor.stdout, PathBuf::from("/tmp/ticker.out"));
        assert_eq!(descriptor.stderr, default_log_file());
        assert_eq!(descriptor.work_dir, PathBuf::from("/"));
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("svc.json");
        fs::write(
            &config_path,
            r#"{"name": "ticker", "work_dir": "/srv", "stdin": "/dev/zero"}"#,
        )
        .unwrap();

        let descriptor = ServiceDescriptor::from_file(&config_path).unwrap();
        assert_eq!(descriptor.name, "ticker");
        assert_eq!(descriptor.work_dir, PathBuf::from("/srv"));
        assert_eq!(descriptor.stdin, PathBuf::from("/dev/zero"));
    }

    #[test]
    fn test_from_file_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("svc.yaml");
        fs::write(&config_path, "name: ticker").unwrap();

        let result = ServiceDescriptor::from_file(&config_path);
        assert!(matches!(result, Err(DaemonError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("svc.toml");
        fs::write(&config_path, "name = ").unwrap();

        let result = ServiceDescriptor::from_file(&config_path);
        assert!(matches!(result, Err(DaemonError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_file_expands_env_vars() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("svc.toml");
        std::env::set_var("DAEMONCTL_TEST_RUN_DIR", "/var/run/daemonctl-test");
        fs::write(
            &config_path,
            r#"pid_file = "${DAEMONCTL_TEST_RUN_DIR}/svc.pid""#,
        )
        .unwrap();

        let descriptor = ServiceDescriptor::from_file(&config_path).unwrap();
        assert_eq!(
            descriptor.pid_file,
            PathBuf::from("/var/run/daemonctl-test/svc.pid")
        );
    }
}
