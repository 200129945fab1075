// src/constants.rs

/// Name of the per-user configuration directory (under the system config dir).
pub const CONFIG_DIR_NAME: &str = "launchdeck";

/// Name of the deck configuration file.
pub const CONFIG_FILENAME: &str = "launchdeck.toml";

/// Input that always ends an interactive session. No menu entry can claim it.
pub const RESERVED_EXIT: &str = "exit";

/// Environment variable naming the deck file to load.
pub const ENV_CONFIG: &str = "LAUNCHDECK_CONFIG";

/// Environment variable overriding `settings.toolchain_root`.
pub const ENV_TOOLCHAIN_ROOT: &str = "LAUNCHDECK_TOOLCHAIN_ROOT";

/// Injected into chain steps when the chain has a hand-off file.
pub const ENV_HANDOFF_FILE: &str = "LAUNCHDECK_HANDOFF_FILE";

pub const TOKEN_ROOT: &str = "<deck::root>";
pub const TOKEN_PROJECT: &str = "<deck::project>";
pub const TOKEN_CWD: &str = "<deck::cwd>";

/// Menu opened when neither the command line nor the deck names one.
pub const FALLBACK_MENU: &str = "agents";

/// The deck used when no configuration file is found.
pub const EMBEDDED_DECK: &str = include_str!("../assets/default_deck.toml");
