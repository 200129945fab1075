// src/core/mod.rs

pub mod chain_runner;
pub mod compiler;
pub mod config_loader;
pub mod menu;
pub mod paths;
pub mod session;
pub mod template;
