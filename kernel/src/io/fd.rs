/*
 * File Descriptor Table
 *
 * Per-process file descriptor table for sessions opened on device nodes.
 * Each entry maps an integer FD to an OpenFile, which carries the session
 * cursor shared by reads and writes on that descriptor.
 *
 * Standard FDs 0, 1, 2 are reserved for stdin/stdout/stderr; opened
 * devices are allocated from 3 upward.
 */

use super::device::{Errno, FileOperations};
use super::uaccess::{UserSliceReader, UserSliceWriter};
use alloc::collections::BTreeMap;
use alloc::sync::Arc;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// One open session on a device
///
/// Created by a successful `open`, closed by `release`. The cursor starts
/// at 0 and only moves when a transfer succeeds. A session that is dropped
/// while still open is released.
pub struct OpenFile {
    fops: Arc<dyn FileOperations>,
    pos: u64,
    state: SessionState,
}

impl OpenFile {
    /// Open a session (Closed -> Open)
    pub fn open(fops: Arc<dyn FileOperations>) -> Result<Self, Errno> {
        fops.open()?;
        Ok(Self {
            fops,
            pos: 0,
            state: SessionState::Open,
        })
    }

    /// Read at the session cursor
    pub fn read(&mut self, dest: &mut dyn UserSliceWriter) -> Result<usize, Errno> {
        self.ensure_open()?;
        self.fops.read(dest, &mut self.pos)
    }

    /// Write at the session cursor
    pub fn write(&mut self, src: &dyn UserSliceReader) -> Result<usize, Errno> {
        self.ensure_open()?;
        self.fops.write(src, &mut self.pos)
    }

    /// Close the session (Open -> Closed)
    ///
    /// Returns EBADF if the session was already released.
    pub fn release(&mut self) -> Result<(), Errno> {
        self.ensure_open()?;
        self.state = SessionState::Closed;
        self.fops.release()
    }

    /// Current cursor
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn ensure_open(&self) -> Result<(), Errno> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(Errno::EBADF),
        }
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        if self.state == SessionState::Open {
            self.state = SessionState::Closed;
            if let Err(err) = self.fops.release() {
                log::error!("release on drop failed: {}", err);
            }
        }
    }
}

/// Per-process file descriptor table
pub struct FileDescriptorTable {
    fds: BTreeMap<i32, OpenFile>,
    next_fd: i32,
}

impl FileDescriptorTable {
    /// Create a new empty file descriptor table
    pub fn new() -> Self {
        Self {
            fds: BTreeMap::new(),
            next_fd: 3, // 0, 1, 2 reserved for stdin/stdout/stderr
        }
    }

    /// Open a session on a device and allocate a descriptor for it
    ///
    /// No descriptor is consumed if the device refuses the open. EMFILE
    /// once the descriptor space is used up; the device is not opened then.
    pub fn open(&mut self, fops: Arc<dyn FileOperations>) -> Result<i32, Errno> {
        let fd = self.next_fd;
        let next_fd = fd.checked_add(1).ok_or(Errno::EMFILE)?;
        let file = OpenFile::open(fops)?;
        self.next_fd = next_fd;
        self.fds.insert(fd, file);
        Ok(fd)
    }

    pub fn read(&mut self, fd: i32, dest: &mut dyn UserSliceWriter) -> Result<usize, Errno> {
        self.get_mut(fd)?.read(dest)
    }

    pub fn write(&mut self, fd: i32, src: &dyn UserSliceReader) -> Result<usize, Errno> {
        self.get_mut(fd)?.write(src)
    }

    /// Cursor of the session behind `fd`
    pub fn position(&self, fd: i32) -> Result<u64, Errno> {
        self.fds.get(&fd).map(OpenFile::position).ok_or(Errno::EBADF)
    }

    /// Release the session and free the descriptor
    ///
    /// The descriptor is freed even if the device reports an error on
    /// release.
    pub fn close(&mut self, fd: i32) -> Result<(), Errno> {
        let mut file = self.fds.remove(&fd).ok_or(Errno::EBADF)?;
        file.release()
    }

    /// Get number of open file descriptors
    pub fn count(&self) -> usize {
        self.fds.len()
    }

    /// Check if a file descriptor is valid
    pub fn is_valid(&self, fd: i32) -> bool {
        self.fds.contains_key(&fd)
    }

    fn get_mut(&mut self, fd: i32) -> Result<&mut OpenFile, Errno> {
        self.fds.get_mut(&fd).ok_or(Errno::EBADF)
    }
}

impl Default for FileDescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}
