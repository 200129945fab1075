// src/cli/handlers/mod.rs

// One module per action. Every handler takes the raw arguments that follow the
// action name and parses them with its own `no_binary_name` clap struct.

pub mod chain;
pub mod check;
pub mod commons;
pub mod init;
pub mod list;
pub mod menu;
pub mod pick;
