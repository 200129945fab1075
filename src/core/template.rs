// src/core/template.rs

//! Turns a stored [`CommandTemplate`] into a [`ProcessDescriptor`].
//!
//! Expansion happens once per selection, so a deck can reference
//! `<deck::root>` even when no toolchain root is configured, as long as the
//! entries using it are never chosen.

use crate::constants::{TOKEN_CWD, TOKEN_PROJECT, TOKEN_ROOT};
use crate::models::{CommandTemplate, ProcessDescriptor};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(
        "'{value}' uses <deck::root>, but no toolchain root is configured (set `settings.toolchain_root` or LAUNCHDECK_TOOLCHAIN_ROOT)."
    )]
    MissingRoot { value: String },
    #[error("Failed to expand '{value}': {message}")]
    Expansion { value: String, message: String },
}

/// Values available to templates at launch time.
#[derive(Debug, Clone)]
pub struct ExpandContext {
    pub toolchain_root: Option<PathBuf>,
    pub cwd: PathBuf,
    pub project: String,
    /// Deck-wide `[env]` overrides, applied below menu and entry overrides.
    pub base_env: BTreeMap<String, String>,
}

impl ExpandContext {
    pub fn new(cwd: &Path, toolchain_root: Option<PathBuf>) -> Self {
        Self {
            toolchain_root,
            cwd: cwd.to_path_buf(),
            project: super::paths::project_name(cwd),
            base_env: BTreeMap::new(),
        }
    }

    pub fn with_base_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.base_env = env;
        self
    }

    /// Expands deck tokens, then `~` and `$VAR` references.
    ///
    /// An unset variable is an error. A literal dollar sign is written `$$`.
    pub fn expand(&self, value: &str) -> Result<String, TemplateError> {
        let mut expanded = value.to_string();

        if expanded.contains(TOKEN_ROOT) {
            let root = self
                .toolchain_root
                .as_ref()
                .ok_or_else(|| TemplateError::MissingRoot {
                    value: value.to_string(),
                })?;
            expanded = expanded.replace(TOKEN_ROOT, &root.to_string_lossy());
        }
        expanded = expanded
            .replace(TOKEN_PROJECT, &self.project)
            .replace(TOKEN_CWD, &self.cwd.to_string_lossy());

        // `shellexpand::full` handles both the home dir and env vars.
        shellexpand::full(&expanded)
            .map(|cow| cow.into_owned())
            .map_err(|e| TemplateError::Expansion {
                value: value.to_string(),
                message: e.to_string(),
            })
    }

    /// Builds a fresh descriptor for one launch.
    ///
    /// `extra_args` are appended after the template's own arguments verbatim.
    pub fn instantiate(
        &self,
        template: &CommandTemplate,
        extra_args: &[String],
    ) -> Result<ProcessDescriptor, TemplateError> {
        let program = self.expand(&template.program)?;

        let mut args = template
            .args
            .iter()
            .map(|arg| self.expand(arg))
            .collect::<Result<Vec<_>, _>>()?;
        args.extend(extra_args.iter().cloned());

        let cwd = match &template.cwd {
            Some(dir) => {
                let expanded = PathBuf::from(self.expand(dir)?);
                if expanded.is_absolute() {
                    expanded
                } else {
                    self.cwd.join(expanded)
                }
            }
            None => self.cwd.clone(),
        };

        let mut env: HashMap<String, String> = HashMap::new();
        for (key, value) in self.base_env.iter().chain(template.env.iter()) {
            env.insert(key.clone(), self.expand(value)?);
        }

        Ok(ProcessDescriptor {
            program,
            args,
            cwd,
            env,
        })
    }
}
