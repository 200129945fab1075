// src/bin/launchdeck.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use launchdeck::{
    cli::{Cli, handlers},
    core::config_loader::LoadOptions,
    system::{executor, interrupt},
};

// --- Command Definition and Registry ---

/// Defines a system command, its aliases, and its handler function.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &LoadOptions) -> Result<()>,
}

/// The single source of truth for all actions. To add an action, add an entry here.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "chain",
        aliases: &[],
        handler: handlers::chain::handle,
    },
    CommandDefinition {
        name: "check",
        aliases: &[],
        handler: handlers::check::handle,
    },
    CommandDefinition {
        name: "init",
        aliases: &[],
        handler: handlers::init::handle,
    },
    CommandDefinition {
        name: "list",
        aliases: &["ls"],
        handler: handlers::list::handle,
    },
    CommandDefinition {
        name: "menu",
        aliases: &[],
        handler: handlers::menu::handle,
    },
    CommandDefinition {
        name: "pick",
        aliases: &["run"],
        handler: handlers::pick::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// The main entry point of `launchdeck`.
/// Sets up logging, parses arguments, dispatches to the handler, and performs
/// centralized error handling.
fn main() {
    env_logger::init();

    // Ctrl+C while a child or chain is running is left to the child; otherwise
    // the process exits with 130.
    if let Err(e) = interrupt::install() {
        log::warn!("Could not install the Ctrl+C handler: {}", e);
    }

    if let Err(e) = run_cli(Cli::parse()) {
        // --- Centralized Error Handling ---
        // A child's failure has already been shown by the child itself; only its
        // status is passed on.
        if let Some(executor::ExecutionError::ExitStatus { code }) =
            e.downcast_ref::<executor::ExecutionError>()
        {
            std::process::exit(*code);
        }

        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Resolves the action name and its arguments.
///
/// - `launchdeck` opens the default menu.
/// - `launchdeck <action> [args...]` runs a registered action.
/// - `launchdeck <menu>` is a shortcut for `menu <menu>`.
/// - `launchdeck <menu> <selection> [args...]` is a shortcut for `pick`.
fn route(mut args: Vec<String>) -> (String, Vec<String>) {
    if args.is_empty() {
        return ("menu".to_string(), args);
    }
    let first = args.remove(0);

    if let Some(command) = find_command(&first) {
        (command.name.to_string(), args)
    } else if args.is_empty() {
        ("menu".to_string(), vec![first])
    } else {
        let mut pick_args = vec![first];
        pick_args.extend(args);
        ("pick".to_string(), pick_args)
    }
}

/// The main application dispatcher.
fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let options = cli.load_options();
    let (action_name, action_args) = route(cli.args);
    log::debug!("Dispatching '{}' with {:?}.", action_name, action_args);

    match find_command(&action_name) {
        Some(command) => (command.handler)(action_args, &options),
        None => handlers::menu::handle(action_args, &options),
    }
}
