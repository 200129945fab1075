// src/cli/handlers/init.rs

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::{
    fs,
    io::IsTerminal,
    path::{Path, PathBuf},
};

use crate::{
    constants::{CONFIG_FILENAME, EMBEDDED_DECK},
    core::{config_loader::LoadOptions, paths},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Writes the default deck so it can be edited."
)]
struct InitArgs {
    /// Where to write the deck. Defaults to the per-user config directory.
    #[arg(long, short)]
    path: Option<PathBuf>,

    /// Overwrite an existing file without asking.
    #[arg(long, short)]
    force: bool,
}

/// What happened to the target file.
#[derive(Debug, PartialEq, Eq)]
enum InitOutcome {
    Written,
    Overwritten,
    Kept,
}

/// The main handler for the `init` command.
pub fn handle(args: Vec<String>, _options: &LoadOptions) -> Result<()> {
    let init_args = InitArgs::try_parse_from(&args)?;

    let target = match init_args.path {
        Some(path) if path.is_dir() => path.join(CONFIG_FILENAME),
        Some(path) => path,
        None => paths::get_config_dir()?.join(CONFIG_FILENAME),
    };

    let outcome = write_default_deck(&target, init_args.force, confirm_overwrite)?;
    match outcome {
        InitOutcome::Kept => {
            println!("{}", format!(t!("init.info.kept"), path = target.display()).yellow());
        }
        InitOutcome::Written | InitOutcome::Overwritten => {
            println!(
                "{} {}",
                t!("common.success").green().bold(),
                format!(t!("init.success.written"), path = target.display())
            );
        }
    }
    Ok(())
}

/// Writes the embedded deck to `target`. An existing file is only replaced when
/// `force` is set or `confirm` agrees.
fn write_default_deck(
    target: &Path,
    force: bool,
    confirm: impl FnOnce(&Path) -> Result<bool>,
) -> Result<InitOutcome> {
    let exists = target.exists();
    if exists && !force && !confirm(target)? {
        log::debug!("Keeping existing deck at '{}'.", target.display());
        return Ok(InitOutcome::Kept);
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create directory '{}'.", parent.display()))?;
    }
    fs::write(target, EMBEDDED_DECK)
        .with_context(|| format!("Could not write deck file '{}'.", target.display()))?;
    log::debug!("Default deck written to '{}'.", target.display());

    Ok(if exists {
        InitOutcome::Overwritten
    } else {
        InitOutcome::Written
    })
}

fn confirm_overwrite(target: &Path) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Err(anyhow!(
            t!("init.error.exists_non_interactive"),
            path = target.display()
        ));
    }
    let answer = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(t!("init.prompt.overwrite"), path = target.display()))
        .default(false)
        .interact()?;
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writes_into_missing_directories() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("launchdeck.toml");

        let outcome = write_default_deck(&target, false, |_| panic!("no prompt expected")).unwrap();

        assert_eq!(outcome, InitOutcome::Written);
        assert_eq!(fs::read_to_string(&target).unwrap(), EMBEDDED_DECK);
    }

    #[test]
    fn test_existing_file_kept_when_declined() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("launchdeck.toml");
        fs::write(&target, "# mine").unwrap();

        let outcome = write_default_deck(&target, false, |_| Ok(false)).unwrap();

        assert_eq!(outcome, InitOutcome::Kept);
        assert_eq!(fs::read_to_string(&target).unwrap(), "# mine");
    }

    #[test]
    fn test_existing_file_replaced_when_confirmed_or_forced() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("launchdeck.toml");

        fs::write(&target, "# mine").unwrap();
        assert_eq!(
            write_default_deck(&target, false, |_| Ok(true)).unwrap(),
            InitOutcome::Overwritten
        );

        fs::write(&target, "# mine").unwrap();
        assert_eq!(
            write_default_deck(&target, true, |_| panic!("force skips the prompt")).unwrap(),
            InitOutcome::Overwritten
        );
        assert_eq!(fs::read_to_string(&target).unwrap(), EMBEDDED_DECK);
    }

    #[test]
    fn test_init_args() {
        let parsed = InitArgs::try_parse_from(["--path", "deck.toml", "--force"]).unwrap();
        assert_eq!(parsed.path, Some(PathBuf::from("deck.toml")));
        assert!(parsed.force);
    }
}
