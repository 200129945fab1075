use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;

use super::commons;
use crate::{
    core::{
        config_loader::LoadOptions,
        session::{Dispatcher, Selection},
    },
    system::executor::{ExecutionError, SystemLauncher},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Resolves one selection without prompting and exits with its status."
)]
struct PickArgs {
    /// The menu to resolve the selection in.
    menu: String,

    /// A number or name shown in the menu listing.
    selection: String,

    /// Extra arguments appended to the launched command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// The main handler for the `pick` command.
///
/// A launched entry propagates the child's exit status; a chain propagates the
/// status computed by its policy.
pub fn handle(args: Vec<String>, options: &LoadOptions) -> Result<()> {
    let pick_args = PickArgs::try_parse_from(&args)?;
    let loaded = commons::load_deck(options)?;
    let menu = loaded.menu(Some(pick_args.menu.as_str()))?;

    let mut dispatcher = Dispatcher::new(menu, &loaded.context, SystemLauncher);
    match dispatcher.select(&pick_args.selection, &pick_args.args) {
        Selection::Exit | Selection::Noted => Ok(()),
        Selection::Empty | Selection::NotFound => Err(anyhow!(
            t!("pick.error.unknown_selection"),
            selection = pick_args.selection.cyan(),
            menu = menu.name.yellow()
        )),
        Selection::Launched(Ok(exit)) => commons::exit_to_result(exit),
        // The dispatcher has already reported why the launch failed.
        Selection::Launched(Err(e)) => {
            log::debug!("One-shot launch failed: {}", e);
            Err(ExecutionError::ExitStatus { code: 1 }.into())
        }
        Selection::Chained(report) => match report.exit_code() {
            0 => Ok(()),
            code => Err(ExecutionError::ExitStatus { code }.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_through_arguments_keep_their_flags() {
        let parsed =
            PickArgs::try_parse_from(["agents", "cli", "--verbose", "-x", "run"]).unwrap();
        assert_eq!(parsed.menu, "agents");
        assert_eq!(parsed.selection, "cli");
        assert_eq!(parsed.args, vec!["--verbose", "-x", "run"]);
    }

    #[test]
    fn test_selection_is_required() {
        assert!(PickArgs::try_parse_from(["agents"]).is_err());
    }
}
