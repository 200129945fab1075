// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

// --- `launchdeck.toml` MODELS (what is read from the configuration file) ---

/// Represents the deserialized structure of a `launchdeck.toml` file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct DeckConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    /// Environment overrides applied to every launched process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub menus: BTreeMap<String, MenuConfig>,
    #[serde(default)]
    pub chains: BTreeMap<String, ChainConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SettingsConfig {
    /// Root directory of the external toolchain, referenced as `<deck::root>`.
    pub toolchain_root: Option<String>,
    /// Menu opened when no menu is named on the command line.
    pub default_menu: Option<String>,
    #[serde(default)]
    pub chain_policy: ChainPolicy,
    #[serde(default)]
    pub case_insensitive: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct MenuConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Overrides `settings.case_insensitive` for this menu.
    pub case_insensitive: Option<bool>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub entries: Vec<EntryConfig>,
}

/// One `[[menus.<name>.entries]]` table.
///
/// Exactly one of `run`, `program` or `chain` selects the action. An entry with
/// none of them must carry a `note`, which is then printed instead of launching.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct EntryConfig {
    pub aliases: Vec<String>,
    #[serde(default)]
    pub label: String,
    pub group: Option<String>,
    pub note: Option<String>,
    #[serde(flatten)]
    pub command: CommandConfig,
    pub chain: Option<String>,
}

/// The command part shared by menu entries and chain steps.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct CommandConfig {
    /// A full command line, split with shell quoting rules.
    pub run: Option<String>,
    pub program: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub cwd: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl CommandConfig {
    pub fn is_empty(&self) -> bool {
        self.run.is_none() && self.program.is_none()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ChainConfig {
    pub title: Option<String>,
    pub intro: Option<String>,
    pub summary: Option<String>,
    /// Overrides `settings.chain_policy` for this chain.
    pub policy: Option<ChainPolicy>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub handoff: Option<HandoffConfig>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct StepConfig {
    pub label: String,
    #[serde(flatten)]
    pub command: CommandConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct HandoffConfig {
    /// Path of the transient file, relative to the working directory.
    pub path: String,
    pub content: String,
}

// --- RUNTIME MODELS (compiled, immutable tables) ---

/// Whether a chain keeps going after a step fails.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ChainPolicy {
    /// Every step runs regardless of the previous step's outcome.
    #[default]
    Continue,
    /// The chain stops at the first step that fails to launch or exits nonzero.
    FailFast,
}

/// A command as stored in a menu table. Tokens and shell variables are still
/// unexpanded; see [`crate::core::template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<String>,
    pub env: BTreeMap<String, String>,
}

/// A fully specified child invocation. Stdio is always inherited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessDescriptor {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Merged on top of the inherited environment, never replacing it.
    pub env: HashMap<String, String>,
}

impl ProcessDescriptor {
    /// Renders the invocation as a single shell-quoted line for display.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| shlex::try_quote(part).map_or_else(|_| part.to_string(), |q| q.into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryAction {
    Launch(CommandTemplate),
    Chain(Chain),
    /// Print the message and return to the prompt. Nothing is launched.
    Note(String),
}

/// One selectable item of a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub aliases: Vec<String>,
    pub label: String,
    pub group: Option<String>,
    /// Printed before the action runs.
    pub note: Option<String>,
    pub action: EntryAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    pub label: String,
    pub template: CommandTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffFile {
    pub path: PathBuf,
    pub content: String,
}

/// An ordered sequence of commands run strictly one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub name: String,
    pub title: Option<String>,
    pub intro: Option<String>,
    pub summary: Option<String>,
    pub policy: ChainPolicy,
    pub handoff: Option<HandoffFile>,
    pub steps: Vec<ChainStep>,
}
