// src/core/session.rs

//! The dispatcher loop: prompt, resolve, act, report, prompt again.
//!
//! Selections are handled strictly one at a time. A launch blocks until its
//! child exits, so no prompt is read and no other child is started meanwhile.

use crate::{
    core::{
        chain_runner::{self, ChainReport},
        menu::{Menu, Resolution},
        template::ExpandContext,
    },
    models::{EntryAction, MenuEntry},
    system::{
        executor::{ChildExit, ExecutionError, Launcher},
        prompt::{PromptError, Prompter},
    },
};
use colored::Colorize;

/// The result of handling one line of input.
#[derive(Debug)]
pub enum Selection {
    Exit,
    Empty,
    NotFound,
    /// A note-only entry was shown; nothing was launched.
    Noted,
    Launched(Result<ChildExit, ExecutionError>),
    Chained(ChainReport),
}

/// Counters for one interactive session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub launches: usize,
    pub chains: usize,
    pub notes: usize,
    pub unrecognized: usize,
}

#[derive(Debug)]
pub struct Dispatcher<'a, L: Launcher> {
    menu: &'a Menu,
    ctx: &'a ExpandContext,
    launcher: L,
}

impl<'a, L: Launcher> Dispatcher<'a, L> {
    pub fn new(menu: &'a Menu, ctx: &'a ExpandContext, launcher: L) -> Self {
        Self {
            menu,
            ctx,
            launcher,
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Runs the interactive loop until `exit` or end of input.
    pub fn run_interactive<P: Prompter + ?Sized>(
        &mut self,
        prompter: &mut P,
    ) -> Result<SessionSummary, PromptError> {
        let mut summary = SessionSummary::default();
        let prompt = match self.menu.range_hint() {
            Some(range) => format!(t!("session.prompt.with_range"), range = range),
            None => t!("session.prompt.plain").to_string(),
        };

        print!("{}", self.menu.render());
        loop {
            let Some(line) = prompter.read_line(&prompt)? else {
                log::debug!("Input exhausted; leaving menu '{}'.", self.menu.name);
                println!("\n{}", t!("session.info.goodbye"));
                return Ok(summary);
            };

            match self.select(&line, &[]) {
                Selection::Exit => {
                    println!("{}", t!("session.info.goodbye"));
                    return Ok(summary);
                }
                Selection::Empty => {}
                Selection::NotFound => summary.unrecognized += 1,
                Selection::Noted => summary.notes += 1,
                Selection::Launched(_) => {
                    summary.launches += 1;
                    print!("{}", self.menu.render());
                }
                Selection::Chained(_) => {
                    summary.chains += 1;
                    print!("{}", self.menu.render());
                }
            }
        }
    }

    /// Handles one line of input. `extra_args` are appended to a launched
    /// entry's arguments (used by one-shot pass-through).
    pub fn select(&mut self, input: &str, extra_args: &[String]) -> Selection {
        let menu = self.menu;
        log::debug!("Resolving input {:?} in menu '{}'.", input, menu.name);
        match menu.resolve(input) {
            Resolution::Exit => Selection::Exit,
            Resolution::Empty => Selection::Empty,
            Resolution::NotFound => {
                let message = match menu.range_hint() {
                    Some(range) => format!(t!("session.error.invalid_with_range"), range = range),
                    None => t!("session.error.invalid_plain").to_string(),
                };
                println!("{}", message.red());
                Selection::NotFound
            }
            Resolution::Entry(entry) => self.act(entry, extra_args),
        }
    }

    fn act(&mut self, entry: &MenuEntry, extra_args: &[String]) -> Selection {
        if let Some(note) = &entry.note {
            println!("{} {}", t!("common.warning").yellow().bold(), note);
        }

        match &entry.action {
            EntryAction::Note(message) => {
                println!("{} {}", t!("common.warning").yellow().bold(), message);
                Selection::Noted
            }
            EntryAction::Chain(chain) => {
                Selection::Chained(chain_runner::run_chain(chain, self.ctx, &mut self.launcher))
            }
            EntryAction::Launch(template) => {
                let result = self
                    .ctx
                    .instantiate(template, extra_args)
                    .map_err(ExecutionError::from)
                    .and_then(|descriptor| {
                        println!(
                            "{}",
                            format!(t!("session.info.launching"), label = entry.label)
                                .cyan()
                                .bold()
                        );
                        log::info!("Launching: {}", descriptor.display_line());
                        self.launcher.launch(&descriptor)
                    });

                match &result {
                    Ok(exit) => {
                        let message = format!(t!("session.info.ended"), code = exit);
                        if exit.success() {
                            println!("\n{}\n", message.green());
                        } else {
                            println!("\n{}\n", message.yellow());
                        }
                    }
                    Err(e) => {
                        eprintln!("{} {}", t!("session.error.launch_failed").red().bold(), e);
                    }
                }
                Selection::Launched(result)
            }
        }
    }
}
