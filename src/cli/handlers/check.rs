use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use super::commons;
use crate::{
    core::{
        compiler::Deck,
        config_loader::LoadOptions,
        template::{ExpandContext, TemplateError},
    },
    models::EntryAction,
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Validates the active deck.")]
struct CheckArgs {}

/// The main handler for the `check` command.
///
/// Compilation problems (alias collisions, unknown chains, entries without an
/// action) make the load itself fail and are reported by `main`. Commands that
/// compile but cannot be resolved in the current environment are warnings.
pub fn handle(args: Vec<String>, options: &LoadOptions) -> Result<()> {
    CheckArgs::try_parse_from(&args)?;
    let loaded = commons::load_deck(options)?;

    let unresolved = unresolved_commands(&loaded.deck, &loaded.context);
    for (context, error) in &unresolved {
        println!("{} {}: {}", t!("common.warning").yellow().bold(), context, error);
    }

    println!(
        "{} {}",
        t!("common.success").green().bold(),
        format!(
            t!("check.success.valid"),
            source = commons::describe_source(&loaded.source),
            menus = loaded.deck.menus.len(),
            chains = loaded.deck.chains.len()
        )
    );
    if !unresolved.is_empty() {
        println!(
            "{}",
            format!(t!("check.info.unresolved"), count = unresolved.len()).dimmed()
        );
    }
    Ok(())
}

/// Tries to instantiate every command of the deck and returns the ones that fail.
fn unresolved_commands(deck: &Deck, ctx: &ExpandContext) -> Vec<(String, TemplateError)> {
    let mut failures = Vec::new();

    for (menu_name, menu) in &deck.menus {
        for entry in menu.entries() {
            if let EntryAction::Launch(template) = &entry.action
                && let Err(e) = ctx.instantiate(template, &[])
            {
                failures.push((format!("menu '{}', entry '{}'", menu_name, entry.label), e));
            }
        }
    }
    for (chain_name, chain) in &deck.chains {
        for step in &chain.steps {
            if let Err(e) = ctx.instantiate(&step.template, &[]) {
                failures.push((format!("chain '{}', step '{}'", chain_name, step.label), e));
            }
        }
    }
    failures
}
