// src/system/interrupt.rs

//! Ctrl+C handling.
//!
//! A terminal interrupt reaches the whole foreground process group, so a live
//! child receives it directly. While a [`Shield`] is held the dispatcher
//! survives the interrupt and lets the child decide what to do with it; cleanup
//! (e.g. removing a chain's hand-off file) then runs normally. With no shield
//! held the dispatcher exits with the conventional status 130.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static SHIELD_DEPTH: AtomicUsize = AtomicUsize::new(0);
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Exit status a shell reports for a process ended by SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Installs the process-wide handler. Calling it again is a no-op.
pub fn install() -> Result<(), ctrlc::Error> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    ctrlc::set_handler(|| {
        if is_shielded() {
            log::debug!("Interrupt received while shielded; leaving it to the child.");
        } else {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    })
    .inspect_err(|_| INSTALLED.store(false, Ordering::SeqCst))
}

/// Keeps the dispatcher alive through interrupts until dropped. Shields nest.
#[derive(Debug)]
pub struct Shield {
    _private: (),
}

pub fn shield() -> Shield {
    SHIELD_DEPTH.fetch_add(1, Ordering::SeqCst);
    Shield { _private: () }
}

impl Drop for Shield {
    fn drop(&mut self) {
        SHIELD_DEPTH.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn is_shielded() -> bool {
    SHIELD_DEPTH.load(Ordering::SeqCst) > 0
}
