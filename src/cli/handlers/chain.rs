use anyhow::Result;
use clap::Parser;

use super::commons;
use crate::{
    core::{chain_runner, config_loader::LoadOptions},
    system::executor::{ExecutionError, SystemLauncher},
};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Runs a chain of steps from start to finish.")]
struct ChainArgs {
    /// The chain to run.
    name: String,
}

/// The main handler for the `chain` command.
pub fn handle(args: Vec<String>, options: &LoadOptions) -> Result<()> {
    let chain_args = ChainArgs::try_parse_from(&args)?;
    let loaded = commons::load_deck(options)?;
    let chain = loaded.chain(&chain_args.name)?;

    let report = chain_runner::run_chain(chain, &loaded.context, &mut SystemLauncher);
    log::debug!(
        "Chain '{}' finished under {:?}; aborted: {}.",
        report.chain,
        report.policy,
        report.aborted
    );

    match report.exit_code() {
        0 => Ok(()),
        code => Err(ExecutionError::ExitStatus { code }.into()),
    }
}
