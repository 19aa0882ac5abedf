/*
 * User/Kernel Boundary Copies
 *
 * copy_out / copy_in primitives used by device read and write. The device
 * core treats them as opaque fallible operations: either the whole
 * requested range is transferred, or the call fails with `Fault` and the
 * caller's state must stay as it was.
 *
 * Two backings are provided:
 * - KernelBuffer / KernelBytes: caller memory that is already a kernel
 *   slice (in-kernel users, tests)
 * - UserPtr: raw caller address range, validated the same way syscall
 *   arguments are before it is dereferenced
 */

/// Exclusive upper bound of the user half of the address space
pub const USER_SPACE_END: usize = 0x0000_8000_0000_0000;

/// A copy across the user/kernel boundary failed (bad address)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault;

impl core::fmt::Display for Fault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Bad address")
    }
}

/// Destination in the caller's address space (copy_to_user side)
pub trait UserSliceWriter {
    /// Number of bytes the caller asked for
    fn len(&self) -> usize;

    /// Copy `src` to the start of the caller's buffer
    ///
    /// Fails with `Fault` if the destination cannot hold `src.len()` bytes
    /// or is not accessible.
    fn copy_out(&mut self, src: &[u8]) -> Result<(), Fault>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Source in the caller's address space (copy_from_user side)
pub trait UserSliceReader {
    /// Number of bytes the caller offered
    fn len(&self) -> usize;

    /// Fill `dst` from the start of the caller's buffer
    fn copy_in(&self, dst: &mut [u8]) -> Result<(), Fault>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Kernel-resident destination buffer
pub struct KernelBuffer<'a> {
    buf: &'a mut [u8],
}

impl<'a> KernelBuffer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf }
    }
}

impl UserSliceWriter for KernelBuffer<'_> {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<(), Fault> {
        let dst = self.buf.get_mut(..src.len()).ok_or(Fault)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

/// Kernel-resident source buffer
pub struct KernelBytes<'a> {
    data: &'a [u8],
}

impl<'a> KernelBytes<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl UserSliceReader for KernelBytes<'_> {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn copy_in(&self, dst: &mut [u8]) -> Result<(), Fault> {
        let src = self.data.get(..dst.len()).ok_or(Fault)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

/// Raw caller address range
///
/// Every copy validates the address range first:
/// - Not NULL
/// - Within userspace address range (< USER_SPACE_END)
/// - Does not overflow when adding the length
#[derive(Debug, Clone, Copy)]
pub struct UserPtr {
    addr: usize,
    len: usize,
}

impl UserPtr {
    /// Wrap a caller address range
    ///
    /// # Safety
    ///
    /// If the range passes validation it must be mapped, and valid for
    /// reads and writes of `len` bytes for as long as this value is used.
    /// Ranges that fail validation are never dereferenced.
    pub unsafe fn new(addr: usize, len: usize) -> Self {
        Self { addr, len }
    }

    fn validate(&self, count: usize) -> Result<(), Fault> {
        if self.addr == 0 {
            return Err(Fault);
        }
        if count > self.len {
            return Err(Fault);
        }
        let end = self.addr.checked_add(count).ok_or(Fault)?;
        if self.addr >= USER_SPACE_END || end > USER_SPACE_END {
            return Err(Fault);
        }
        Ok(())
    }
}

impl UserSliceWriter for UserPtr {
    fn len(&self) -> usize {
        self.len
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<(), Fault> {
        self.validate(src.len())?;
        // SAFETY: the range was validated above and the constructor's
        // contract guarantees it is mapped and writable.
        unsafe {
            core::ptr::copy_nonoverlapping(src.as_ptr(), self.addr as *mut u8, src.len());
        }
        Ok(())
    }
}

impl UserSliceReader for UserPtr {
    fn len(&self) -> usize {
        self.len
    }

    fn copy_in(&self, dst: &mut [u8]) -> Result<(), Fault> {
        self.validate(dst.len())?;
        // SAFETY: see copy_out.
        unsafe {
            core::ptr::copy_nonoverlapping(self.addr as *const u8, dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_buffer_copy_out() {
        let mut storage = [0u8; 8];
        let mut dest = KernelBuffer::new(&mut storage);
        assert_eq!(dest.len(), 8);
        assert!(dest.copy_out(b"abc").is_ok());
        assert_eq!(dest.copy_out(b"too long for it"), Err(Fault));
        assert_eq!(&storage[..3], b"abc");
    }

    #[test]
    fn test_kernel_bytes_copy_in() {
        let src = KernelBytes::new(b"hello");
        let mut dst = [0u8; 4];
        assert!(src.copy_in(&mut dst).is_ok());
        assert_eq!(&dst, b"hell");

        let mut big = [0u8; 6];
        assert_eq!(src.copy_in(&mut big), Err(Fault));
    }

    #[test]
    fn test_user_ptr_rejects_bad_ranges() {
        // None of these are dereferenced: validation fails first.
        let mut null = unsafe { UserPtr::new(0, 16) };
        assert_eq!(null.copy_out(b"x"), Err(Fault));

        let mut kernel_half = unsafe { UserPtr::new(USER_SPACE_END, 16) };
        assert_eq!(kernel_half.copy_out(b"x"), Err(Fault));

        let straddling = unsafe { UserPtr::new(USER_SPACE_END - 2, 16) };
        let mut dst = [0u8; 4];
        assert_eq!(straddling.copy_in(&mut dst), Err(Fault));

        let short = unsafe { UserPtr::new(0x1000, 2) };
        assert_eq!(short.copy_in(&mut dst), Err(Fault));
    }
}
