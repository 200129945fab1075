use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::fmt::Write;

use super::commons;
use crate::core::{compiler::Deck, config_loader::LoadOptions};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Prints the deck's menus and chains, or the entries of one menu."
)]
struct ListArgs {
    /// Show the entries of this menu instead of the overview.
    menu: Option<String>,
}

/// The main handler for the `list` command.
pub fn handle(args: Vec<String>, options: &LoadOptions) -> Result<()> {
    let list_args = ListArgs::try_parse_from(&args)?;
    let loaded = commons::load_deck(options)?;

    match list_args.menu {
        Some(name) => print!("{}", loaded.menu(Some(name.as_str()))?.render()),
        None => print!(
            "{}",
            render_overview(&loaded.deck, &commons::describe_source(&loaded.source))
        ),
    }
    Ok(())
}

fn render_overview(deck: &Deck, source: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", t!("list.label.deck").blue(), source);

    let _ = writeln!(out, "\n{}", t!("list.header.menus").bold());
    for (name, menu) in &deck.menus {
        let marker = if *name == deck.default_menu { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} {:<20} {:>3} {}  {}",
            marker.green().bold(),
            name.cyan(),
            menu.entries().len(),
            t!("list.label.entries"),
            menu.title.as_deref().unwrap_or_default().dimmed()
        );
    }

    if !deck.chains.is_empty() {
        let _ = writeln!(out, "\n{}", t!("list.header.chains").bold());
        for (name, chain) in &deck.chains {
            let _ = writeln!(
                out,
                "  {:<20} {:>3} {}  {}",
                name.magenta(),
                chain.steps.len(),
                t!("list.label.steps"),
                chain.title.as_deref().unwrap_or_default().dimmed()
            );
        }
    }
    out
}
