//! # Compiler
//!
//! Transforms the flexible `launchdeck.toml` syntax into immutable, validated
//! tables: one [`Menu`] per `[menus.<name>]` and one [`Chain`] per
//! `[chains.<name>]`. All problems are collected and reported together, so a
//! deck with three mistakes fails once with three messages.

use crate::{
    constants::{FALLBACK_MENU, RESERVED_EXIT},
    core::menu::{Menu, normalize_token},
    models::{
        Chain, ChainConfig, ChainPolicy, ChainStep, CommandConfig, CommandTemplate, DeckConfig,
        EntryAction, EntryConfig, HandoffFile, MenuConfig, MenuEntry,
    },
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use thiserror::Error;

lazy_static! {
    // An alias is non-empty and has no surrounding whitespace.
    static ref ALIAS_RE: Regex = Regex::new(r"^\S(?:.*\S)?$").expect("alias regex is valid");
}

/// A problem found while compiling or validating a deck.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableIssue {
    #[error("menu '{menu}': alias '{alias}' is used by more than one entry")]
    DuplicateAlias { menu: String, alias: String },
    #[error("menu '{menu}': alias '{alias}' collides with the reserved input 'exit'")]
    ReservedAlias { menu: String, alias: String },
    #[error("menu '{menu}': alias '{alias}' is empty or has surrounding whitespace")]
    MalformedAlias { menu: String, alias: String },
    #[error("menu '{menu}': entry '{label}' has no aliases")]
    NoAliases { menu: String, label: String },
    #[error("{context}: needs one of `run`, `program` or `chain`, or a `note`")]
    NoAction { context: String },
    #[error("{context}: only one of `run`, `program` or `chain` may be set")]
    AmbiguousAction { context: String },
    #[error("{context}: refers to unknown chain '{chain}'")]
    UnknownChain { context: String, chain: String },
    #[error("{context}: could not split command line '{run}'")]
    UnparsableRun { context: String, run: String },
    #[error("{context}: the command is empty")]
    EmptyCommand { context: String },
    #[error("chain '{chain}' has no steps")]
    EmptyChain { chain: String },
    #[error("default menu '{menu}' is not defined")]
    UnknownDefaultMenu { menu: String },
    #[error("the deck defines no menus")]
    NoMenus,
}

/// The compiled, immutable form of a deck.
#[derive(Debug, Clone)]
pub struct Deck {
    pub menus: BTreeMap<String, Menu>,
    pub chains: BTreeMap<String, Chain>,
    pub default_menu: String,
    pub toolchain_root: Option<String>,
    /// Deck-wide environment overrides.
    pub env: BTreeMap<String, String>,
}

// --- PUBLIC COMPILER API ---

/// Compiles a whole deck. `policy_override` replaces every chain's policy
/// (used by `--fail-fast` and `--continue-on-error`).
pub fn compile_deck(
    config: &DeckConfig,
    policy_override: Option<ChainPolicy>,
) -> Result<Deck, Vec<TableIssue>> {
    let mut issues = Vec::new();

    let mut chains = BTreeMap::new();
    for (name, chain_config) in &config.chains {
        let policy = policy_override
            .or(chain_config.policy)
            .unwrap_or(config.settings.chain_policy);
        match compile_chain(name, chain_config, policy) {
            Ok(chain) => {
                chains.insert(name.clone(), chain);
            }
            Err(mut chain_issues) => issues.append(&mut chain_issues),
        }
    }

    let mut menus = BTreeMap::new();
    for (name, menu_config) in &config.menus {
        let case_insensitive = menu_config
            .case_insensitive
            .unwrap_or(config.settings.case_insensitive);
        // Aliases are checked on the raw entries so a menu that fails to
        // compile still reports its alias problems.
        let labels: Vec<String> = menu_config.entries.iter().map(entry_label).collect();
        issues.extend(check_aliases(
            name,
            case_insensitive,
            menu_config
                .entries
                .iter()
                .zip(&labels)
                .map(|(entry, label)| (label.as_str(), entry.aliases.as_slice())),
        ));
        match compile_menu(name, menu_config, case_insensitive, &chains) {
            Ok(menu) => {
                menus.insert(name.clone(), menu);
            }
            Err(mut menu_issues) => issues.append(&mut menu_issues),
        }
    }

    let default_menu = match &config.settings.default_menu {
        Some(name) => {
            if !config.menus.contains_key(name) {
                issues.push(TableIssue::UnknownDefaultMenu { menu: name.clone() });
            }
            name.clone()
        }
        None if config.menus.contains_key(FALLBACK_MENU) => FALLBACK_MENU.to_string(),
        None => match config.menus.keys().next() {
            Some(first) => first.clone(),
            None => {
                issues.push(TableIssue::NoMenus);
                String::new()
            }
        },
    };

    if !issues.is_empty() {
        return Err(issues);
    }

    log::debug!(
        "Compiled deck with {} menu(s) and {} chain(s); default menu '{}'.",
        menus.len(),
        chains.len(),
        default_menu
    );

    Ok(Deck {
        menus,
        chains,
        default_menu,
        toolchain_root: config.settings.toolchain_root.clone(),
        env: config.env.clone(),
    })
}

/// Checks a menu table independently of how it was built: alias syntax, alias
/// uniqueness, and collisions with the reserved `exit` input.
pub fn validate_menu(menu: &Menu) -> Vec<TableIssue> {
    check_aliases(
        &menu.name,
        menu.case_insensitive,
        menu.entries()
            .iter()
            .map(|entry| (entry.label.as_str(), entry.aliases.as_slice())),
    )
}

// --- INTERNAL HELPERS ---

/// Alias checks over `(label, aliases)` pairs, shared by [`validate_menu`] and
/// [`compile_deck`].
fn check_aliases<'a>(
    menu: &str,
    case_insensitive: bool,
    entries: impl Iterator<Item = (&'a str, &'a [String])>,
) -> Vec<TableIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let reserved = normalize_token(RESERVED_EXIT, case_insensitive);

    for (label, aliases) in entries {
        if aliases.is_empty() {
            issues.push(TableIssue::NoAliases {
                menu: menu.to_string(),
                label: label.to_string(),
            });
        }
        for alias in aliases {
            if !ALIAS_RE.is_match(alias) {
                issues.push(TableIssue::MalformedAlias {
                    menu: menu.to_string(),
                    alias: alias.clone(),
                });
                continue;
            }
            let key = normalize_token(alias, case_insensitive);
            if key == reserved {
                issues.push(TableIssue::ReservedAlias {
                    menu: menu.to_string(),
                    alias: alias.clone(),
                });
            } else if !seen.insert(key) {
                issues.push(TableIssue::DuplicateAlias {
                    menu: menu.to_string(),
                    alias: alias.clone(),
                });
            }
        }
    }
    issues
}

fn compile_menu(
    name: &str,
    menu_config: &MenuConfig,
    case_insensitive: bool,
    chains: &BTreeMap<String, Chain>,
) -> Result<Menu, Vec<TableIssue>> {
    let mut issues = Vec::new();
    let mut entries = Vec::with_capacity(menu_config.entries.len());

    for entry_config in &menu_config.entries {
        let context = format!(
            "menu '{}', entry '{}'",
            name,
            entry_label(entry_config)
        );
        match compile_entry(entry_config, &context, &menu_config.env, chains) {
            Ok(entry) => entries.push(entry),
            Err(issue) => issues.push(issue),
        }
    }

    if !issues.is_empty() {
        return Err(issues);
    }

    Ok(Menu::new(name, entries)
        .with_title(menu_config.title.clone(), menu_config.description.clone())
        .with_case_insensitive(case_insensitive))
}

fn entry_label(entry: &EntryConfig) -> String {
    if !entry.label.is_empty() {
        return entry.label.clone();
    }
    entry.aliases.last().cloned().unwrap_or_default()
}

fn compile_entry(
    entry: &EntryConfig,
    context: &str,
    menu_env: &BTreeMap<String, String>,
    chains: &BTreeMap<String, Chain>,
) -> Result<MenuEntry, TableIssue> {
    let has_command = !entry.command.is_empty();

    let action = match (&entry.chain, has_command, &entry.note) {
        (Some(_), true, _) => {
            return Err(TableIssue::AmbiguousAction {
                context: context.to_string(),
            });
        }
        (Some(chain_name), false, _) => match chains.get(chain_name) {
            Some(chain) => EntryAction::Chain(chain.clone()),
            None => {
                return Err(TableIssue::UnknownChain {
                    context: context.to_string(),
                    chain: chain_name.clone(),
                });
            }
        },
        (None, true, _) => EntryAction::Launch(compile_command(&entry.command, menu_env, context)?),
        (None, false, Some(note)) => EntryAction::Note(note.clone()),
        (None, false, None) => {
            return Err(TableIssue::NoAction {
                context: context.to_string(),
            });
        }
    };

    // A note-only entry already prints its note as the action.
    let note = match action {
        EntryAction::Note(_) => None,
        _ => entry.note.clone(),
    };

    Ok(MenuEntry {
        aliases: entry.aliases.clone(),
        label: entry_label(entry),
        group: entry.group.clone(),
        note,
        action,
    })
}

fn compile_chain(
    name: &str,
    chain_config: &ChainConfig,
    policy: ChainPolicy,
) -> Result<Chain, Vec<TableIssue>> {
    if chain_config.steps.is_empty() {
        return Err(vec![TableIssue::EmptyChain {
            chain: name.to_string(),
        }]);
    }

    let mut issues = Vec::new();
    let mut steps = Vec::with_capacity(chain_config.steps.len());
    for (i, step) in chain_config.steps.iter().enumerate() {
        let context = format!("chain '{}', step {} ('{}')", name, i + 1, step.label);
        if step.command.is_empty() {
            issues.push(TableIssue::NoAction { context });
            continue;
        }
        match compile_command(&step.command, &chain_config.env, &context) {
            Ok(template) => steps.push(ChainStep {
                label: step.label.clone(),
                template,
            }),
            Err(issue) => issues.push(issue),
        }
    }

    if !issues.is_empty() {
        return Err(issues);
    }

    Ok(Chain {
        name: name.to_string(),
        title: chain_config.title.clone(),
        intro: chain_config.intro.clone(),
        summary: chain_config.summary.clone(),
        policy,
        handoff: chain_config.handoff.as_ref().map(|h| HandoffFile {
            path: PathBuf::from(&h.path),
            content: h.content.clone(),
        }),
        steps,
    })
}

/// Compiles the command part of an entry or step. `inherited_env` (the menu's
/// or chain's `env`) sits below the command's own `env`.
fn compile_command(
    command: &CommandConfig,
    inherited_env: &BTreeMap<String, String>,
    context: &str,
) -> Result<CommandTemplate, TableIssue> {
    let (program, mut args) = match (&command.run, &command.program) {
        (Some(_), Some(_)) => {
            return Err(TableIssue::AmbiguousAction {
                context: context.to_string(),
            });
        }
        (Some(run), None) => {
            let mut parts = shlex::split(run)
                .ok_or_else(|| TableIssue::UnparsableRun {
                    context: context.to_string(),
                    run: run.clone(),
                })?
                .into_iter();
            let program = parts.next().ok_or_else(|| TableIssue::EmptyCommand {
                context: context.to_string(),
            })?;
            (program, parts.collect::<Vec<_>>())
        }
        (None, Some(program)) => (program.clone(), Vec::new()),
        (None, None) => {
            return Err(TableIssue::NoAction {
                context: context.to_string(),
            });
        }
    };

    if program.trim().is_empty() {
        return Err(TableIssue::EmptyCommand {
            context: context.to_string(),
        });
    }
    args.extend(command.args.iter().cloned());

    let mut env = inherited_env.clone();
    env.extend(command.env.iter().map(|(k, v)| (k.clone(), v.clone())));

    Ok(CommandTemplate {
        program,
        args,
        cwd: command.cwd.clone(),
        env,
    })
}
