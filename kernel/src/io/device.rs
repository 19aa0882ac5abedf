/*
 * Device Abstraction Layer
 *
 * File operations table for character devices, plus the POSIX errno
 * subset and device numbers shared by the registration layer.
 *
 * A device node exposes exactly four operations: open, read, write and
 * release. The caller's session owns the file offset and passes it in by
 * reference, as with a struct file's f_pos.
 */

use super::uaccess::{UserSliceReader, UserSliceWriter};

/// File operations table for a character device
///
/// Registered with the device number through `cdev_add` and invoked for
/// every session opened on the node.
pub trait FileOperations: Send + Sync {
    /// Open a new session on the device
    fn open(&self) -> Result<(), Errno>;

    /// Read up to `dest.len()` bytes at `*offset` into the caller's buffer
    ///
    /// Returns the number of bytes transferred; 0 signals end of stream.
    /// On success `*offset` is advanced by the returned count. On error it
    /// is left untouched.
    fn read(&self, dest: &mut dyn UserSliceWriter, offset: &mut u64) -> Result<usize, Errno>;

    /// Write up to `src.len()` bytes from the caller's buffer at `*offset`
    ///
    /// Returns the number of bytes transferred and advances `*offset` by
    /// the same amount.
    fn write(&self, src: &dyn UserSliceReader, offset: &mut u64) -> Result<usize, Errno>;

    /// Close a session previously opened with `open`
    fn release(&self) -> Result<(), Errno>;
}

/// POSIX errno values
///
/// Subset of standard POSIX error codes for kernel ABI compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Errno {
    EPERM = 1,   // Operation not permitted
    ENOENT = 2,  // No such file or directory
    EIO = 5,     // I/O error
    ENXIO = 6,   // No such device or address
    EBADF = 9,   // Bad file descriptor
    ENOMEM = 12, // Out of memory
    EFAULT = 14, // Bad address
    EBUSY = 16,  // Device or resource busy
    EEXIST = 17, // File exists
    ENODEV = 19, // No such device
    EINVAL = 22, // Invalid argument
    EMFILE = 24, // Too many open files
    ENOSPC = 28, // No space left on device
}

impl Errno {
    /// Positive errno code
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Negative return value, as handed back through the ssize_t ABI
    pub const fn as_neg(self) -> isize {
        -(self as i32 as isize)
    }
}

impl core::fmt::Display for Errno {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Errno::EPERM => "Operation not permitted",
            Errno::ENOENT => "No such file or directory",
            Errno::EIO => "I/O error",
            Errno::ENXIO => "No such device or address",
            Errno::EBADF => "Bad file descriptor",
            Errno::ENOMEM => "Out of memory",
            Errno::EFAULT => "Bad address",
            Errno::EBUSY => "Device or resource busy",
            Errno::EEXIST => "File exists",
            Errno::ENODEV => "No such device",
            Errno::EINVAL => "Invalid argument",
            Errno::EMFILE => "Too many open files",
            Errno::ENOSPC => "No space left on device",
        };
        write!(f, "{} (errno {})", msg, self.code())
    }
}

/// Convert an operation result into the ssize_t return convention
///
/// Non-negative byte count on success, negative errno on failure.
pub fn to_ssize(result: Result<usize, Errno>) -> isize {
    match result {
        Ok(count) => count as isize,
        Err(errno) => errno.as_neg(),
    }
}

/// Number of bits reserved for the minor number
pub const MINORBITS: u32 = 20;

const MINORMASK: u32 = (1 << MINORBITS) - 1;

/// Packed (major, minor) device number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DevNumber(u32);

impl DevNumber {
    /// Build a device number from its parts
    ///
    /// The major is truncated to 12 bits and the minor to 20 bits.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self(((major & 0xfff) << MINORBITS) | (minor & MINORMASK))
    }

    pub const fn major(self) -> u32 {
        self.0 >> MINORBITS
    }

    pub const fn minor(self) -> u32 {
        self.0 & MINORMASK
    }

    /// Raw packed value
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for DevNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.major(), self.minor())
    }
}

/// Minimal stat structure
///
/// Subset of POSIX struct stat: type/mode, the device number a special
/// file refers to, and size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    pub st_mode: u32, // File type and mode
    pub st_rdev: u32, // Device number (special files)
    pub st_size: u64, // Size in bytes
}

// File type constants (POSIX)
pub const S_IFMT: u32 = 0o170000; // File type mask
pub const S_IFCHR: u32 = 0o020000; // Character device

/// Check if mode indicates a character device
#[inline]
#[allow(non_snake_case)]
pub fn S_ISCHR(mode: u32) -> bool {
    (mode & S_IFMT) == S_IFCHR
}
