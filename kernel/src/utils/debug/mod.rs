/*
 * Debugging and Logging Utilities
 *
 * Kernel logger and the log buffer it writes to.
 */

pub mod log_buffer;
pub mod logger;
pub mod ring_buffer;

use core::sync::atomic::{AtomicBool, Ordering};

static LOGGER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the kernel logger once
///
/// Later calls are no-ops. If the host already installed its own logger,
/// that one stays in place and keeps receiving the module's records.
pub fn init() {
    if LOGGER_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }

    match logger::init() {
        Ok(()) => log::info!("Logger initialized correctly"),
        Err(_) => log::debug!("Host logger already installed"),
    }
}
