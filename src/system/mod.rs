//! # System Interaction Layer
//!
//! The boundary between the dispatcher and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: Spawns one child process at a time with inherited standard
//!   streams and waits for it, reporting the exit code or terminating signal.
//!   Handles the platform differences (e.g. `cmd /C` shims on Windows).
//! - **`interrupt`**: Ctrl+C handling. Interrupts are left to the live child
//!   while a shield is held, so cleanup still runs afterwards.
//! - **`prompt`**: Reads menu selections, through `dialoguer` on a terminal or
//!   line by line when standard input is piped.

pub mod executor;
pub mod interrupt;
pub mod prompt;
