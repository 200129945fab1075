use anyhow::Result;
use clap::Parser;

use super::commons;
use crate::{
    core::{config_loader::LoadOptions, session::Dispatcher},
    system::{executor::SystemLauncher, prompt::TerminalPrompter},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Opens a menu and dispatches selections until `exit`."
)]
struct MenuArgs {
    /// The menu to open. Defaults to the deck's default menu.
    name: Option<String>,
}

/// The main handler for the `menu` command (also the default action).
pub fn handle(args: Vec<String>, options: &LoadOptions) -> Result<()> {
    let menu_args = MenuArgs::try_parse_from(&args)?;
    let loaded = commons::load_deck(options)?;
    let menu = loaded.menu(menu_args.name.as_deref())?;

    let mut dispatcher = Dispatcher::new(menu, &loaded.context, SystemLauncher);
    let mut prompter = TerminalPrompter::new();
    let summary = dispatcher.run_interactive(&mut prompter)?;

    log::debug!(
        "Session on '{}' ended: {} launch(es), {} chain(s), {} note(s), {} unrecognized input(s).",
        menu.name,
        summary.launches,
        summary.chains,
        summary.notes,
        summary.unrecognized
    );
    Ok(())
}
