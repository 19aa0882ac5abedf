/*
 * Input/Output System
 *
 * Device abstraction layer for character devices: the file operations
 * table, user/kernel boundary copies, and per-process sessions with
 * file descriptor semantics.
 */

pub mod device;
pub mod fd;
pub mod uaccess;

// Re-export device abstraction types
pub use device::{DevNumber, Errno, FileOperations, Stat, S_IFCHR, S_IFMT};
pub use fd::{FileDescriptorTable, OpenFile, SessionState};
pub use uaccess::{Fault, KernelBuffer, KernelBytes, UserPtr, UserSliceReader, UserSliceWriter};
