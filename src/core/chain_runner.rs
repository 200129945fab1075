// src/core/chain_runner.rs

use crate::{
    constants::ENV_HANDOFF_FILE,
    core::template::ExpandContext,
    models::{Chain, ChainPolicy, HandoffFile},
    system::{
        executor::{ChildExit, ExecutionError, Launcher},
        interrupt::{self, INTERRUPTED_EXIT_CODE},
    },
};
use colored::Colorize;
use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("'{0}' already exists and will not be overwritten.")]
    AlreadyExists(String),
    #[error("Could not write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not remove '{path}': {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub enum StepOutcome {
    Exited(ChildExit),
    /// The step could not be started; the message is what was shown to the user.
    LaunchFailed(String),
    /// Not run because an earlier step failed under [`ChainPolicy::FailFast`].
    Skipped,
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Exited(exit) => !exit.success(),
            Self::LaunchFailed(_) => true,
            Self::Skipped => false,
        }
    }
}

#[derive(Debug)]
pub struct StepRecord {
    pub label: String,
    pub outcome: StepOutcome,
}

/// What happened during one chain execution.
#[derive(Debug)]
pub struct ChainReport {
    pub chain: String,
    pub policy: ChainPolicy,
    pub steps: Vec<StepRecord>,
    pub aborted: bool,
    /// A step was ended with Ctrl+C; the chain stopped whatever its policy.
    pub interrupted: bool,
}

impl ChainReport {
    pub fn all_succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|s| matches!(&s.outcome, StepOutcome::Exited(exit) if exit.success()))
    }

    /// Exit status for a one-shot chain run. Under `Continue` the chain always
    /// completes with 0; under `FailFast` the failing step's status is returned.
    /// An interrupted chain reports 130.
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            return INTERRUPTED_EXIT_CODE;
        }
        if self.policy == ChainPolicy::Continue {
            return 0;
        }
        self.steps
            .iter()
            .find_map(|s| match &s.outcome {
                StepOutcome::Exited(exit) if !exit.success() => Some(exit.shell_code()),
                StepOutcome::LaunchFailed(_) => Some(1),
                _ => None,
            })
            .unwrap_or(0)
    }
}

/// Runs every step of `chain` in order, one child at a time.
///
/// The hand-off file, if any, is written before the first step and removed
/// when this function returns, whatever the steps did. Ctrl+C during a step
/// ends that step and stops the chain, but never this function.
pub fn run_chain<L: Launcher + ?Sized>(
    chain: &Chain,
    ctx: &ExpandContext,
    launcher: &mut L,
) -> ChainReport {
    // Declared before the cleanup guard so it is released after the file is removed.
    let _shield = interrupt::shield();

    println!(
        "\n{}",
        chain.title.as_deref().unwrap_or(&chain.name).magenta().bold()
    );
    if let Some(intro) = &chain.intro {
        println!("{}", intro.trim_end());
    }

    let written = chain
        .handoff
        .as_ref()
        .and_then(|handoff| write_handoff(handoff, &ctx.cwd));

    // Removal runs on every exit path out of this function.
    let _cleanup = scopeguard::guard(written.clone(), |path| {
        if let Some(path) = path {
            if let Err(e) = remove_handoff(&path) {
                log::warn!("{}", e);
                eprintln!("{} {}", t!("common.warning").yellow().bold(), e);
            }
        }
    });

    let step_ctx = match &written {
        Some(path) => {
            let mut env = ctx.base_env.clone();
            env.insert(ENV_HANDOFF_FILE.to_string(), path.to_string_lossy().into_owned());
            ctx.clone().with_base_env(env)
        }
        None => ctx.clone(),
    };

    let total = chain.steps.len();
    let mut records = Vec::with_capacity(total);
    let mut aborted = false;
    let mut interrupted = false;

    for (i, step) in chain.steps.iter().enumerate() {
        if aborted {
            records.push(StepRecord {
                label: step.label.clone(),
                outcome: StepOutcome::Skipped,
            });
            continue;
        }

        println!(
            "\n{}",
            format!(
                t!("chain.info.step_banner"),
                index = i + 1,
                total = total,
                label = step.label
            )
            .cyan()
            .bold()
        );

        let outcome = match step_ctx
            .instantiate(&step.template, &[])
            .map_err(ExecutionError::from)
            .and_then(|descriptor| {
                println!("{} {}", "→".blue(), descriptor.display_line().green());
                launcher.launch(&descriptor)
            }) {
            Ok(exit) => {
                println!("{}", step_finished_line(&step.label, exit));
                StepOutcome::Exited(exit)
            }
            Err(e) => {
                let message = e.to_string();
                eprintln!(
                    "{} {}",
                    format!(t!("chain.error.step_failed"), label = step.label).red().bold(),
                    message
                );
                StepOutcome::LaunchFailed(message)
            }
        };

        let remaining = total - (i + 1);
        if matches!(&outcome, StepOutcome::Exited(exit) if exit.interrupted()) {
            aborted = true;
            interrupted = true;
            println!(
                "{}",
                format!(t!("chain.warning.interrupted"), remaining = remaining).yellow()
            );
        } else if outcome.is_failure() && chain.policy == ChainPolicy::FailFast {
            aborted = true;
            if remaining > 0 {
                println!(
                    "{}",
                    format!(t!("chain.warning.aborted"), remaining = remaining).yellow()
                );
            }
        }
        records.push(StepRecord {
            label: step.label.clone(),
            outcome,
        });
    }

    let report = ChainReport {
        chain: chain.name.clone(),
        policy: chain.policy,
        steps: records,
        aborted,
        interrupted,
    };

    if report.aborted {
        println!(
            "\n{}",
            format!(t!("chain.error.incomplete"), name = chain.name).red().bold()
        );
    } else {
        if let Some(summary) = &chain.summary {
            println!("\n{}", summary.trim_end());
        }
        println!(
            "\n{}",
            format!(t!("chain.success.complete"), name = chain.name).green().bold()
        );
    }

    report
}

/// Writes the hand-off file. Failures are reported as warnings and the chain
/// carries on without it.
/// Starts on a fresh line; a child's last output may not end with one.
fn step_finished_line(label: &str, exit: ChildExit) -> String {
    format!(
        "\n{}",
        format!(t!("chain.info.step_finished"), label = label, code = exit).dimmed()
    )
}

fn write_handoff(handoff: &HandoffFile, cwd: &Path) -> Option<PathBuf> {
    let path = if handoff.path.is_absolute() {
        handoff.path.clone()
    } else {
        cwd.join(&handoff.path)
    };

    match create_new(&path, &handoff.content) {
        Ok(()) => {
            log::debug!("Hand-off file written to '{}'.", path.display());
            println!(
                "{}",
                format!(t!("chain.info.handoff_written"), path = path.display()).dimmed()
            );
            Some(path)
        }
        Err(e) => {
            log::warn!("{}", e);
            eprintln!("{} {}", t!("common.warning").yellow().bold(), e);
            None
        }
    }
}

fn create_new(path: &Path, content: &str) -> Result<(), HandoffError> {
    let display = path.display().to_string();
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            ErrorKind::AlreadyExists => HandoffError::AlreadyExists(display.clone()),
            _ => HandoffError::Write {
                path: display.clone(),
                source,
            },
        })?;

    if let Err(source) = file.write_all(content.as_bytes()) {
        // Do not leave a truncated file behind.
        drop(file);
        let _ = fs::remove_file(path);
        return Err(HandoffError::Write {
            path: display,
            source,
        });
    }
    Ok(())
}

fn remove_handoff(path: &Path) -> Result<(), HandoffError> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Hand-off file '{}' removed.", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(HandoffError::Remove {
            path: path.display().to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChainStep, CommandTemplate, ProcessDescriptor};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    /// Records launches and answers with scripted exit codes. A code of `-1`
    /// simulates a launch failure.
    struct ScriptedLauncher {
        codes: Vec<i32>,
        launched: Vec<ProcessDescriptor>,
        handoff_seen: Vec<Option<String>>,
    }

    impl ScriptedLauncher {
        fn new(codes: &[i32]) -> Self {
            Self {
                codes: codes.to_vec(),
                launched: Vec::new(),
                handoff_seen: Vec::new(),
            }
        }
    }

    impl Launcher for ScriptedLauncher {
        fn launch(&mut self, descriptor: &ProcessDescriptor) -> Result<ChildExit, ExecutionError> {
            let seen = descriptor
                .env
                .get(ENV_HANDOFF_FILE)
                .and_then(|p| fs::read_to_string(p).ok());
            self.handoff_seen.push(seen);
            self.launched.push(descriptor.clone());

            let code = self.codes.remove(0);
            if code < 0 {
                return Err(ExecutionError::Spawn {
                    command: descriptor.program.clone(),
                    source: std::io::Error::from(ErrorKind::NotFound),
                });
            }
            Ok(ChildExit::from_code(code))
        }
    }

    fn step(label: &str, program: &str) -> ChainStep {
        ChainStep {
            label: label.to_string(),
            template: CommandTemplate {
                program: program.to_string(),
                args: vec![],
                cwd: None,
                env: BTreeMap::new(),
            },
        }
    }

    fn two_step_chain(policy: ChainPolicy, handoff: Option<HandoffFile>) -> Chain {
        Chain {
            name: "orchestrate".to_string(),
            title: None,
            intro: None,
            summary: Some("done".to_string()),
            policy,
            handoff,
            steps: vec![step("Expert", "expert"), step("Builder", "builder")],
        }
    }

    #[test]
    fn test_continue_runs_every_step_after_failure() {
        let dir = tempdir().unwrap();
        let ctx = ExpandContext::new(dir.path(), None);
        let mut launcher = ScriptedLauncher::new(&[3, 0]);

        let report = run_chain(&two_step_chain(ChainPolicy::Continue, None), &ctx, &mut launcher);

        let programs: Vec<_> = launcher.launched.iter().map(|d| d.program.as_str()).collect();
        assert_eq!(programs, vec!["expert", "builder"]);
        assert!(!report.aborted);
        assert!(!report.all_succeeded());
        assert!(matches!(report.steps[0].outcome, StepOutcome::Exited(e) if e.code == Some(3)));
        assert!(matches!(report.steps[1].outcome, StepOutcome::Exited(e) if e.code == Some(0)));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_fail_fast_skips_remaining_steps() {
        let dir = tempdir().unwrap();
        let ctx = ExpandContext::new(dir.path(), None);
        let mut launcher = ScriptedLauncher::new(&[3]);

        let report = run_chain(&two_step_chain(ChainPolicy::FailFast, None), &ctx, &mut launcher);

        assert_eq!(launcher.launched.len(), 1);
        assert!(report.aborted);
        assert!(matches!(report.steps[1].outcome, StepOutcome::Skipped));
        assert_eq!(report.exit_code(), 3);
    }

    #[test]
    fn test_launch_failure_counts_as_failed_step() {
        let dir = tempdir().unwrap();
        let ctx = ExpandContext::new(dir.path(), None);

        let mut launcher = ScriptedLauncher::new(&[-1, 0]);
        let report = run_chain(&two_step_chain(ChainPolicy::Continue, None), &ctx, &mut launcher);
        assert!(matches!(report.steps[0].outcome, StepOutcome::LaunchFailed(_)));
        assert_eq!(launcher.launched.len(), 2);

        let mut launcher = ScriptedLauncher::new(&[-1]);
        let report = run_chain(&two_step_chain(ChainPolicy::FailFast, None), &ctx, &mut launcher);
        assert!(report.aborted);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_handoff_file_visible_to_steps_and_removed_after_failure() {
        let dir = tempdir().unwrap();
        let ctx = ExpandContext::new(dir.path(), None);
        let handoff = HandoffFile {
            path: PathBuf::from("temp-agent-requirements.md"),
            content: "# Requirements".to_string(),
        };
        let mut launcher = ScriptedLauncher::new(&[1, 0]);

        run_chain(
            &two_step_chain(ChainPolicy::Continue, Some(handoff)),
            &ctx,
            &mut launcher,
        );

        assert_eq!(
            launcher.handoff_seen,
            vec![Some("# Requirements".to_string()), Some("# Requirements".to_string())]
        );
        assert!(!dir.path().join("temp-agent-requirements.md").exists());
    }

    #[test]
    fn test_handoff_removed_when_fail_fast_aborts() {
        let dir = tempdir().unwrap();
        let ctx = ExpandContext::new(dir.path(), None);
        let handoff = HandoffFile {
            path: PathBuf::from("handoff.md"),
            content: "x".to_string(),
        };
        let mut launcher = ScriptedLauncher::new(&[-1]);

        let report = run_chain(
            &two_step_chain(ChainPolicy::FailFast, Some(handoff)),
            &ctx,
            &mut launcher,
        );

        assert!(report.aborted);
        assert!(!dir.path().join("handoff.md").exists());
    }

    #[test]
    fn test_existing_file_is_never_overwritten_or_removed() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("notes.md");
        fs::write(&existing, "keep me").unwrap();
        let ctx = ExpandContext::new(dir.path(), None);
        let handoff = HandoffFile {
            path: PathBuf::from("notes.md"),
            content: "replacement".to_string(),
        };
        let mut launcher = ScriptedLauncher::new(&[0, 0]);

        let report = run_chain(
            &two_step_chain(ChainPolicy::Continue, Some(handoff)),
            &ctx,
            &mut launcher,
        );

        assert!(report.all_succeeded());
        assert_eq!(launcher.handoff_seen, vec![None, None]);
        assert_eq!(fs::read_to_string(&existing).unwrap(), "keep me");
    }

    #[test]
    fn test_step_finished_line_starts_on_a_new_line() {
        let line = step_finished_line("Builder", ChildExit::from_code(0));
        assert!(line.starts_with('\n'));
        assert!(line.contains("Builder"));
    }

    #[test]
    fn test_interrupted_step_stops_chain_under_any_policy() {
        let dir = tempdir().unwrap();
        let ctx = ExpandContext::new(dir.path(), None);
        let handoff = HandoffFile {
            path: PathBuf::from("handoff.md"),
            content: "x".to_string(),
        };
        let mut launcher = ScriptedLauncher::new(&[130]);

        let report = run_chain(
            &two_step_chain(ChainPolicy::Continue, Some(handoff)),
            &ctx,
            &mut launcher,
        );

        assert_eq!(launcher.launched.len(), 1);
        assert!(report.aborted);
        assert!(report.interrupted);
        assert!(matches!(report.steps[1].outcome, StepOutcome::Skipped));
        assert_eq!(report.exit_code(), 130);
        assert!(!dir.path().join("handoff.md").exists());
    }

    fn sh_step(label: &str, script: &str) -> ChainStep {
        ChainStep {
            label: label.to_string(),
            template: CommandTemplate {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string()],
                cwd: None,
                env: BTreeMap::new(),
            },
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_handoff_removed_after_ctrl_c_reaches_dispatcher() {
        use crate::system::{executor::SystemLauncher, interrupt};

        interrupt::install().unwrap();
        let dir = tempdir().unwrap();
        let ctx = ExpandContext::new(dir.path(), None);
        let chain = Chain {
            name: "interrupted".to_string(),
            title: None,
            intro: None,
            summary: None,
            policy: ChainPolicy::Continue,
            handoff: Some(HandoffFile {
                path: PathBuf::from("h.md"),
                content: "instructions".to_string(),
            }),
            steps: vec![
                // `$$` keeps the dollar sign for the shell.
                sh_step("Signal parent", "kill -INT $$PPID; sleep 1"),
                sh_step("Read hand-off", r#"test -f "$$LAUNCHDECK_HANDOFF_FILE""#),
            ],
        };

        let report = run_chain(&chain, &ctx, &mut SystemLauncher);

        assert!(report.all_succeeded());
        assert!(!dir.path().join("h.md").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_real_steps_never_overlap() {
        use crate::system::executor::SystemLauncher;

        let dir = tempdir().unwrap();
        let ctx = ExpandContext::new(dir.path(), None);
        let chain = Chain {
            name: "ordered".to_string(),
            title: None,
            intro: None,
            summary: None,
            policy: ChainPolicy::Continue,
            handoff: None,
            steps: vec![
                sh_step("A", "echo a-start >> log; sleep 0.2; echo a-end >> log"),
                sh_step("B", "echo b-start >> log; echo b-end >> log"),
            ],
        };

        let report = run_chain(&chain, &ctx, &mut SystemLauncher);

        assert!(report.all_succeeded());
        let log = fs::read_to_string(dir.path().join("log")).unwrap();
        assert_eq!(log, "a-start\na-end\nb-start\nb-end\n");
    }
}
