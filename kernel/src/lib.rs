/*
 * virtchar - Virtual Character Device Driver
 *
 * A single fixed-capacity buffer exposed as a character device node
 * through open/read/write/release.
 *
 * Layout:
 * - virtchar: device record, buffer store, session protocol and the
 *   registration guards used by init/teardown
 * - io: file operations table, user/kernel copies, sessions and file
 *   descriptors
 * - module: init/exit and the loader-side module slot
 * - devfs: in-memory registration service
 * - config: load-time settings and module metadata
 * - utils: kernel logger and log buffer
 */

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod config;
pub mod devfs;
pub mod io;
pub mod module;
pub mod utils;
pub mod virtchar;

pub use config::{DeviceConfig, MODULE_INFO};
pub use module::{ModuleSlot, VirtcharModule};
pub use virtchar::{VirtcharDevice, VirtcharError};
