// src/cli/handlers/commons.rs

// Shared helpers for the action handlers.

use crate::{
    core::{
        config_loader::{self, LoadOptions, LoadedDeck},
        paths::ConfigSource,
    },
    system::executor::{ChildExit, ExecutionError},
};
use anyhow::Result;

/// Loads and compiles the active deck, logging where it came from.
pub fn load_deck(options: &LoadOptions) -> Result<LoadedDeck> {
    let loaded = config_loader::load(options)?;
    log::debug!("Active deck: {}", describe_source(&loaded.source));
    Ok(loaded)
}

/// Human-readable name of a deck source.
pub fn describe_source(source: &ConfigSource) -> String {
    match source {
        ConfigSource::File(path) => path.display().to_string(),
        ConfigSource::Embedded => t!("common.label.embedded_deck").to_string(),
    }
}

/// Turns a child's exit into the result of a one-shot action. A nonzero exit
/// becomes [`ExecutionError::ExitStatus`], which `main` maps to the process
/// exit code without printing anything.
pub fn exit_to_result(exit: ChildExit) -> Result<()> {
    if exit.success() {
        Ok(())
    } else {
        Err(ExecutionError::ExitStatus {
            code: exit.shell_code(),
        }
        .into())
    }
}
