//! # Config Loader
//!
//! Finds the active deck (a `launchdeck.toml` file or the embedded default),
//! parses it, and compiles it into immutable tables.

use crate::{
    constants::{EMBEDDED_DECK, ENV_CONFIG, ENV_TOOLCHAIN_ROOT},
    core::{
        compiler::{self, Deck, TableIssue},
        menu::Menu,
        paths::{self, ConfigSource},
        template::{ExpandContext, TemplateError},
    },
    models::{ChainPolicy, DeckConfig},
};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read deck file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML file at '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("The deck has {} problem(s):\n{}", .0.len(), format_issues(.0))]
    Invalid(Vec<TableIssue>),
    #[error("Menu '{name}' is not defined. Available menus: {available}")]
    UnknownMenu { name: String, available: String },
    #[error("Chain '{name}' is not defined. Available chains: {available}")]
    UnknownChain { name: String, available: String },
    #[error("Invalid toolchain root: {0}")]
    ToolchainRoot(#[from] TemplateError),
    #[error("Could not determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

fn format_issues(issues: &[TableIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {}", issue))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Options coming from the command line.
#[derive(Debug, Default, Clone)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub policy_override: Option<ChainPolicy>,
}

/// A compiled deck plus everything needed to launch from it.
#[derive(Debug)]
pub struct LoadedDeck {
    pub source: ConfigSource,
    pub deck: Deck,
    pub context: ExpandContext,
}

impl LoadedDeck {
    /// Looks up a menu, falling back to the deck's default when `name` is `None`.
    pub fn menu(&self, name: Option<&str>) -> Result<&Menu, ConfigError> {
        let name = name.unwrap_or(&self.deck.default_menu);
        self.deck
            .menus
            .get(name)
            .ok_or_else(|| ConfigError::UnknownMenu {
                name: name.to_string(),
                available: join_keys(self.deck.menus.keys()),
            })
    }

    pub fn chain(&self, name: &str) -> Result<&crate::models::Chain, ConfigError> {
        self.deck
            .chains
            .get(name)
            .ok_or_else(|| ConfigError::UnknownChain {
                name: name.to_string(),
                available: join_keys(self.deck.chains.keys()),
            })
    }
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    let joined = keys.map(String::as_str).collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "(none)".to_string()
    } else {
        joined
    }
}

/// Loads the active deck using the process environment and current directory.
pub fn load(options: &LoadOptions) -> Result<LoadedDeck, ConfigError> {
    let cwd = env::current_dir().map_err(ConfigError::CurrentDir)?;
    let env_config = env::var(ENV_CONFIG).ok();
    let env_root = env::var(ENV_TOOLCHAIN_ROOT).ok();
    let user_path = paths::user_config_path();

    let source = paths::resolve_config_source(
        options.config_path.as_deref(),
        env_config.as_deref(),
        &cwd,
        user_path.as_deref(),
    );
    load_from(source, options.policy_override, &cwd, env_root.as_deref())
}

/// Loads and compiles a deck from an explicit source.
pub fn load_from(
    source: ConfigSource,
    policy_override: Option<ChainPolicy>,
    cwd: &Path,
    env_root: Option<&str>,
) -> Result<LoadedDeck, ConfigError> {
    let config = read_config(&source)?;
    let deck = compiler::compile_deck(&config, policy_override).map_err(ConfigError::Invalid)?;

    // The environment variable wins over the file so one deck can serve several checkouts.
    let root_template = env_root
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .or_else(|| deck.toolchain_root.clone());

    let bare = ExpandContext::new(cwd, None);
    let toolchain_root = match root_template {
        Some(template) => Some(PathBuf::from(bare.expand(&template)?)),
        None => None,
    };
    if toolchain_root.is_none() {
        log::debug!("No toolchain root configured; entries using <deck::root> will fail to launch.");
    }

    let context = ExpandContext::new(cwd, toolchain_root).with_base_env(deck.env.clone());
    Ok(LoadedDeck {
        source,
        deck,
        context,
    })
}

/// Parses the deck configuration from its source.
pub fn read_config(source: &ConfigSource) -> Result<DeckConfig, ConfigError> {
    match source {
        ConfigSource::File(path) => {
            log::debug!("Loading deck from '{}'.", path.display());
            let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
                path: path.display().to_string(),
                source: e,
            })
        }
        ConfigSource::Embedded => {
            log::debug!("No deck file found; using the embedded default deck.");
            toml::from_str(EMBEDDED_DECK).map_err(|e| ConfigError::TomlParse {
                path: "<embedded>".to_string(),
                source: e,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SMALL_DECK: &str = r#"
        [settings]
        toolchain_root = "/from/file"

        [[menus.tools.entries]]
        aliases = ["1"]
        run = "echo hi"
    "#;

    fn write_deck(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("launchdeck.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_uses_file_root() {
        let dir = tempdir().unwrap();
        let path = write_deck(dir.path(), SMALL_DECK);

        let loaded = load_from(ConfigSource::File(path), None, dir.path(), None).unwrap();

        assert_eq!(loaded.context.toolchain_root, Some(PathBuf::from("/from/file")));
        assert_eq!(loaded.deck.default_menu, "tools");
        assert!(loaded.menu(None).is_ok());
    }

    #[test]
    fn test_env_root_overrides_file_root() {
        let dir = tempdir().unwrap();
        let path = write_deck(dir.path(), SMALL_DECK);

        let loaded = load_from(ConfigSource::File(path), None, dir.path(), Some("/from/env")).unwrap();

        assert_eq!(loaded.context.toolchain_root, Some(PathBuf::from("/from/env")));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = load_from(
            ConfigSource::File(dir.path().join("nope.toml")),
            None,
            dir.path(),
            None,
        );
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = write_deck(dir.path(), "[menus\n");
        let result = load_from(ConfigSource::File(path), None, dir.path(), None);
        assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
    }

    #[test]
    fn test_invalid_deck_lists_every_issue() {
        let dir = tempdir().unwrap();
        let path = write_deck(
            dir.path(),
            r#"
            [[menus.m.entries]]
            aliases = ["1"]
            run = "a"

            [[menus.m.entries]]
            aliases = ["1"]
            run = "b"
            "#,
        );
        let err = load_from(ConfigSource::File(path), None, dir.path(), None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("1 problem(s)"));
        assert!(message.contains("alias '1'"));
    }

    #[test]
    fn test_unknown_menu_and_chain_name_alternatives() {
        let dir = tempdir().unwrap();
        let loaded = load_from(ConfigSource::Embedded, None, dir.path(), None).unwrap();

        let err = loaded.menu(Some("nope")).unwrap_err().to_string();
        assert!(err.contains("agents"));
        assert!(err.contains("demos"));

        assert!(loaded.chain("orchestrate").is_ok());
        assert!(matches!(loaded.chain("nope"), Err(ConfigError::UnknownChain { .. })));
    }

    #[test]
    fn test_policy_override_reaches_chains() {
        let dir = tempdir().unwrap();
        let loaded =
            load_from(ConfigSource::Embedded, Some(ChainPolicy::FailFast), dir.path(), None)
                .unwrap();
        assert_eq!(loaded.chain("orchestrate").unwrap().policy, ChainPolicy::FailFast);
    }
}
