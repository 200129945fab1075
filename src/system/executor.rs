// src/system/executor.rs

use crate::{
    core::template::TemplateError,
    models::ProcessDescriptor,
    system::interrupt::{self, INTERRUPTED_EXIT_CODE},
};
use std::io::ErrorKind;
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command '{command}' could not be started: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command '{command}' could not be awaited: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
    /// A one-shot launch finished unsuccessfully. The code is propagated as the
    /// dispatcher's own exit status.
    #[error("Command exited with code {code}.")]
    ExitStatus { code: i32 },
}

const SIGINT: i32 = 2;

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ChildExit {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Whether the child ended because of Ctrl+C.
    pub fn interrupted(&self) -> bool {
        self.signal == Some(SIGINT) || self.code == Some(INTERRUPTED_EXIT_CODE)
    }

    /// The status a shell would report for this child.
    pub fn shell_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl std::fmt::Display for ChildExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "{}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => write!(f, "unknown"),
        }
    }
}

/// Starts a child process and blocks until it terminates.
///
/// Implementations must not return before the child has exited, so a caller
/// never has two children alive at once.
pub trait Launcher {
    fn launch(&mut self, descriptor: &ProcessDescriptor) -> Result<ChildExit, ExecutionError>;
}

/// Launches real processes with inherited standard streams.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&mut self, descriptor: &ProcessDescriptor) -> Result<ChildExit, ExecutionError> {
        execute(descriptor)
    }
}

/// Runs a descriptor to completion. The child shares the dispatcher's stdin,
/// stdout and stderr so it can prompt the user itself.
pub fn execute(descriptor: &ProcessDescriptor) -> Result<ChildExit, ExecutionError> {
    let command_line = descriptor.display_line();
    let clean_cwd = dunce::simplified(&descriptor.cwd);
    log::debug!(
        "Launching '{}' in '{}' with {} env override(s).",
        command_line,
        clean_cwd.display(),
        descriptor.env.len()
    );

    // Ctrl+C while the child runs belongs to the child.
    let _shield = interrupt::shield();

    let mut command = StdCommand::new(&descriptor.program);
    command
        .args(&descriptor.args)
        .current_dir(clean_cwd)
        .envs(&descriptor.env)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    // Windows shims such as `npx.cmd` are not found by a direct spawn; retry through `cmd /C`.
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
            log::debug!("Program '{}' not found. Retrying with cmd /C.", descriptor.program);
            StdCommand::new("cmd")
                .arg("/C")
                .arg(&descriptor.program)
                .args(&descriptor.args)
                .current_dir(clean_cwd)
                .envs(&descriptor.env)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|source| ExecutionError::Spawn {
                    command: command_line.clone(),
                    source,
                })?
        }
        Err(source) => {
            return Err(ExecutionError::Spawn {
                command: command_line,
                source,
            });
        }
    };

    let pid = child.id();
    let status = child.wait().map_err(|source| ExecutionError::Wait {
        command: command_line.clone(),
        source,
    })?;

    let exit = ChildExit::from_status(status);
    log::debug!("Child {} ('{}') exited with {}.", pid, command_line, exit);
    Ok(exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn descriptor(program: &str, args: &[&str]) -> ProcessDescriptor {
        ProcessDescriptor {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            cwd: std::env::current_dir().unwrap(),
            env: HashMap::new(),
        }
    }

    #[test]
    fn test_missing_program_is_a_spawn_error() {
        let result = execute(&descriptor("launchdeck-definitely-not-a-program", &[]));
        assert!(matches!(result, Err(ExecutionError::Spawn { .. })));
    }

    #[test]
    fn test_shell_code_mapping() {
        assert_eq!(ChildExit::from_code(3).shell_code(), 3);
        let killed = ChildExit {
            code: None,
            signal: Some(2),
        };
        assert_eq!(killed.shell_code(), 130);
        assert!(killed.interrupted());
        assert!(ChildExit::from_code(130).interrupted());
        assert!(!ChildExit::from_code(1).interrupted());
        assert_eq!(killed.to_string(), "signal 2");
        assert!(!killed.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_is_reported() {
        let exit = execute(&descriptor("sh", &["-c", "exit 7"])).unwrap();
        assert_eq!(exit.code, Some(7));
        assert!(!exit.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_environment_is_merged_not_replaced() {
        let mut d = descriptor(
            "sh",
            &["-c", r#"test "$PROJECT_CONTEXT" = demo && test -n "$PATH""#],
        );
        d.env.insert("PROJECT_CONTEXT".to_string(), "demo".to_string());
        let exit = execute(&d).unwrap();
        assert!(exit.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = descriptor("sh", &["-c", "touch marker"]);
        d.cwd = PathBuf::from(dir.path());
        assert!(execute(&d).unwrap().success());
        assert!(dir.path().join("marker").exists());
    }
}
