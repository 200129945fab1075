// src/core/menu.rs

use crate::constants::RESERVED_EXIT;
use crate::models::{EntryAction, MenuEntry};
use colored::Colorize;
use std::fmt::Write;

/// An immutable choice table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub case_insensitive: bool,
    entries: Vec<MenuEntry>,
}

/// The outcome of matching one line of input against a menu.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The reserved literal. Takes precedence over any alias.
    Exit,
    Entry(&'a MenuEntry),
    /// Blank input.
    Empty,
    NotFound,
}

impl Menu {
    /// Builds a menu without validating it. Use
    /// [`crate::core::compiler::validate_menu`] before handing it to a session.
    pub fn new(name: impl Into<String>, entries: Vec<MenuEntry>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            case_insensitive: false,
            entries,
        }
    }

    pub fn with_title(mut self, title: Option<String>, description: Option<String>) -> Self {
        self.title = title;
        self.description = description;
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Normalizes an alias or input for comparison under this menu's rules.
    pub fn normalize(&self, token: &str) -> String {
        normalize_token(token, self.case_insensitive)
    }

    pub fn resolve(&self, input: &str) -> Resolution<'_> {
        let needle = self.normalize(input);
        if needle.is_empty() {
            return Resolution::Empty;
        }
        if needle == self.normalize(RESERVED_EXIT) {
            return Resolution::Exit;
        }

        self.entries
            .iter()
            .find(|entry| entry.aliases.iter().any(|alias| self.normalize(alias) == needle))
            .map_or(Resolution::NotFound, Resolution::Entry)
    }

    /// The span of numeric aliases, e.g. `1-14`, used in prompts and diagnostics.
    pub fn range_hint(&self) -> Option<String> {
        let numbers = self
            .entries
            .iter()
            .flat_map(|entry| entry.aliases.iter())
            .filter_map(|alias| alias.trim().parse::<u32>().ok());

        let (min, max) = numbers.fold(None, |acc: Option<(u32, u32)>, n| match acc {
            None => Some((n, n)),
            Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
        })?;

        if min == max {
            Some(min.to_string())
        } else {
            Some(format!("{}-{}", min, max))
        }
    }

    /// Renders the listing shown above the prompt, grouped by entry group.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let heading = self.title.as_deref().unwrap_or(&self.name);
        let _ = writeln!(out, "\n{}", heading.bold());
        let _ = writeln!(out, "{}", "=".repeat(heading.chars().count()).dimmed());
        if let Some(description) = &self.description {
            let _ = writeln!(out, "{}", description.trim_end());
        }

        let mut current_group: Option<&str> = None;
        for entry in &self.entries {
            if entry.group.as_deref() != current_group {
                current_group = entry.group.as_deref();
                if let Some(group) = current_group {
                    let _ = writeln!(out, "\n{}", group.green().bold());
                }
            }

            let keys = entry.aliases.join(", ");
            let label = match &entry.action {
                EntryAction::Note(_) => entry.label.yellow().to_string(),
                EntryAction::Chain(_) => entry.label.magenta().to_string(),
                EntryAction::Launch(_) => entry.label.clone(),
            };
            let _ = writeln!(out, "  {:<24} {}", keys.cyan(), label);
        }
        out
    }
}

pub fn normalize_token(token: &str, case_insensitive: bool) -> String {
    if case_insensitive {
        token.trim().to_lowercase()
    } else {
        token.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CommandTemplate;
    use std::collections::BTreeMap;

    fn launch_entry(aliases: &[&str], program: &str) -> MenuEntry {
        MenuEntry {
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            label: program.to_string(),
            group: None,
            note: None,
            action: EntryAction::Launch(CommandTemplate {
                program: program.to_string(),
                args: vec![],
                cwd: None,
                env: BTreeMap::new(),
            }),
        }
    }

    fn agents_menu() -> Menu {
        let entries = (1..=14)
            .map(|i| launch_entry(&[&i.to_string(), &format!("agent{}", i)], "bmad"))
            .collect();
        Menu::new("agents", entries)
    }

    #[test]
    fn test_resolve_numeric_and_mnemonic_aliases() {
        let menu = agents_menu();
        let by_number = menu.resolve("3");
        let by_name = menu.resolve("  agent3 \n");
        assert_eq!(by_number, by_name);
        assert!(matches!(by_number, Resolution::Entry(e) if e.aliases.contains(&"3".to_string())));
    }

    #[test]
    fn test_unknown_input_is_not_found() {
        let menu = agents_menu();
        assert_eq!(menu.resolve("99"), Resolution::NotFound);
        assert_eq!(menu.resolve("Agent3"), Resolution::NotFound);
    }

    #[test]
    fn test_blank_input_is_empty() {
        assert_eq!(agents_menu().resolve("   "), Resolution::Empty);
    }

    #[test]
    fn test_reserved_exit_beats_an_exit_alias() {
        let menu = Menu::new("m", vec![launch_entry(&["exit", "1"], "rm")]);
        assert_eq!(menu.resolve("exit"), Resolution::Exit);
        assert_eq!(menu.resolve("  exit  "), Resolution::Exit);
    }

    #[test]
    fn test_case_insensitive_menu() {
        let menu = agents_menu().with_case_insensitive(true);
        assert!(matches!(menu.resolve("AGENT7"), Resolution::Entry(_)));
        assert_eq!(menu.resolve("EXIT"), Resolution::Exit);
    }

    #[test]
    fn test_exit_is_case_sensitive_by_default() {
        assert_eq!(agents_menu().resolve("EXIT"), Resolution::NotFound);
    }

    #[test]
    fn test_range_hint() {
        assert_eq!(agents_menu().range_hint().as_deref(), Some("1-14"));
        let named_only = Menu::new("m", vec![launch_entry(&["only"], "x")]);
        assert_eq!(named_only.range_hint(), None);
        let single = Menu::new("m", vec![launch_entry(&["5"], "x")]);
        assert_eq!(single.range_hint().as_deref(), Some("5"));
    }

    #[test]
    fn test_render_lists_every_alias() {
        colored::control::set_override(false);
        let rendered = agents_menu().render();
        assert!(rendered.contains("14, agent14"));
        assert!(rendered.starts_with("\nagents"));
    }
}
