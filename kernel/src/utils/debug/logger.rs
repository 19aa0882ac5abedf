/*
 * Kernel Logging System
 *
 * log::Log implementation for the virtchar module. Each record is
 * formatted as "[LEVEL] message" into a bounded line and appended to the
 * kernel log buffer. Lines longer than LOG_LINE_MAX are truncated.
 */

use core::fmt::Write;

use heapless::String;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

use super::log_buffer;

/// Longest formatted log line, newline included
pub const LOG_LINE_MAX: usize = 256;

/// Custom logger writing into the kernel log buffer.
struct VirtcharLogger;

impl log::Log for VirtcharLogger {
    /// Checks if the given log level is enabled.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    /// Formats the record and appends it to the log buffer.
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line: String<LOG_LINE_MAX> = String::new();
        // A full line keeps whatever fit; the newline is re-added below.
        let _ = write!(line, "[{}] {}", record.level(), record.args());
        if line.push('\n').is_err() {
            line.pop();
            let _ = line.push('\n');
        }
        log_buffer::write_log(&line);
    }

    /// Flushes the logger (no-op in this case).
    fn flush(&self) {}
}

/// The logger instance used for logging.
static LOGGER: VirtcharLogger = VirtcharLogger;

/// Installs the logger
///
/// Fails if a logger (this one or another) is already installed.
pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Info))
}
