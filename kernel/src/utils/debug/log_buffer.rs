/*
 * Buffered Logging System
 *
 * Kernel log buffer: formatted log lines are appended to a global ring
 * buffer and drained by whoever reads the log (dmesg-style). When the
 * buffer is full the oldest bytes are overwritten.
 */

use super::ring_buffer::RingBuffer;
use spin::Mutex;

/// Size of the kernel log buffer
pub const LOG_BUFFER_SIZE: usize = 32 * 1024; // 32KB

/// Global log buffer
static LOG_BUFFER: Mutex<RingBuffer<LOG_BUFFER_SIZE>> = Mutex::new(RingBuffer::new());

/// Append a log message to the buffer
pub fn write_log(message: &str) {
    LOG_BUFFER.lock().write(message.as_bytes());
}

/// Drain buffered log bytes into `dest`
///
/// Returns the number of bytes read; 0 when the log is empty.
pub fn read_log(dest: &mut [u8]) -> usize {
    LOG_BUFFER.lock().read(dest)
}

/// Get current buffer usage (for monitoring)
pub fn buffer_usage() -> usize {
    LOG_BUFFER.lock().len()
}
