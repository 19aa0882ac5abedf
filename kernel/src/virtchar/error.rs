/*
 * virtchar Error Types
 *
 * Failures of the device core and of module init. Every variant maps to
 * the errno handed back to the caller or the loader.
 */

use crate::io::{Errno, Fault};

/// Device and module error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtcharError {
    /// Buffer store or device record could not be allocated
    AllocationFailure,
    /// The registration service rejected a step of module init
    RegistrationFailure(Errno),
    /// Copy across the user/kernel boundary failed
    Fault,
    /// Write with no room left in the buffer
    OutOfSpace,
    /// Device configuration rejected before init
    InvalidConfig,
}

impl VirtcharError {
    /// Errno reported for this error
    pub fn errno(self) -> Errno {
        match self {
            VirtcharError::AllocationFailure => Errno::ENOMEM,
            VirtcharError::RegistrationFailure(errno) => errno,
            VirtcharError::Fault => Errno::EFAULT,
            VirtcharError::OutOfSpace => Errno::ENOSPC,
            VirtcharError::InvalidConfig => Errno::EINVAL,
        }
    }
}

impl core::fmt::Display for VirtcharError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            VirtcharError::AllocationFailure => write!(f, "Allocation failed"),
            VirtcharError::RegistrationFailure(errno) => {
                write!(f, "Registration failed: {}", errno)
            }
            VirtcharError::Fault => write!(f, "Bad address"),
            VirtcharError::OutOfSpace => write!(f, "No space left in buffer"),
            VirtcharError::InvalidConfig => write!(f, "Invalid device configuration"),
        }
    }
}

impl From<Fault> for VirtcharError {
    fn from(_: Fault) -> Self {
        VirtcharError::Fault
    }
}

impl From<VirtcharError> for Errno {
    fn from(err: VirtcharError) -> Self {
        err.errno()
    }
}
