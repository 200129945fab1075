use crate::{core::config_loader::LoadOptions, models::ChainPolicy};
use clap::Parser;
use std::path::PathBuf;

pub mod handlers;

/// Builds the color-aware help string at runtime.
fn build_help_string() -> &'static str {
    // Replaces semantic tags like `<title>` in the help template with ANSI styles.
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    let template = t!("cli.help.template");

    let title = if use_colors { "\x1b[1;33m" } else { "" }; // Bold Yellow
    let hl = if use_colors { "\x1b[1;36m" } else { "" }; // Bold Cyan
    let cmd = if use_colors { "\x1b[36m" } else { "" }; // Cyan
    let group = if use_colors { "\x1b[1;32m" } else { "" }; // Bold Green
    let dim = if use_colors { "\x1b[2m" } else { "" };
    let reset = if use_colors { "\x1b[0m" } else { "" };

    let formatted_string = template
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<hl>", hl)
        .replace("</hl>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<group>", group)
        .replace("</group>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset);

    Box::leak(formatted_string.into_boxed_str())
}

/// launchdeck: a menu-driven launcher for agent toolchains.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    help_template = { build_help_string() },
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Deck file to load instead of the discovered one.
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stop a chain at the first failing step.
    #[arg(long, conflicts_with = "continue_on_error")]
    pub fail_fast: bool,

    /// Run every chain step even after a failure.
    #[arg(long)]
    pub continue_on_error: bool,

    /// The action and its arguments. Everything after the action is passed
    /// through untouched so that launched programs can receive their own flags.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// The chain policy forced from the command line, if any.
    pub fn policy_override(&self) -> Option<ChainPolicy> {
        if self.fail_fast {
            Some(ChainPolicy::FailFast)
        } else if self.continue_on_error {
            Some(ChainPolicy::Continue)
        } else {
            None
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            policy_override: self.policy_override(),
        }
    }
}
