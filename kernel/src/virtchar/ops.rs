/*
 * Device Operations
 *
 * open / read / write / release for the virtchar device.
 *
 * Transfers are clamped to the room left between the cursor and the end
 * of the buffer, so oversized requests become short transfers. At exact
 * exhaustion the two directions differ: read returns 0 (end of stream),
 * write fails with ENOSPC. A faulting copy fails with EFAULT and never
 * moves the cursor.
 */

use super::{VirtcharDevice, VirtcharError};
use crate::io::{Errno, FileOperations, UserSliceReader, UserSliceWriter};
use core::sync::atomic::Ordering;

impl VirtcharDevice {
    /// Count a new open and return the updated total
    pub fn dev_open(&self) -> u32 {
        let count = self.open_count.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        log::info!("Device opened {} time(s)", count);
        count
    }

    /// Read at `*offset` into the caller's buffer
    pub fn dev_read(
        &self,
        dest: &mut dyn UserSliceWriter,
        offset: &mut u64,
    ) -> Result<usize, VirtcharError> {
        let bytes_to_read = self
            .store
            .read_with(*offset, dest.len(), |src| dest.copy_out(src))?;
        if bytes_to_read == 0 {
            return Ok(0);
        }

        *offset += bytes_to_read as u64;
        log::info!("Read {} bytes from device", bytes_to_read);
        Ok(bytes_to_read)
    }

    /// Write the caller's buffer at `*offset`
    pub fn dev_write(
        &self,
        src: &dyn UserSliceReader,
        offset: &mut u64,
    ) -> Result<usize, VirtcharError> {
        if src.is_empty() {
            return Err(VirtcharError::OutOfSpace);
        }

        let bytes_to_write = self
            .store
            .write_with(*offset, src.len(), |dst| src.copy_in(dst))?;

        *offset += bytes_to_write as u64;
        log::info!("Wrote {} bytes to device", bytes_to_write);
        Ok(bytes_to_write)
    }

    pub fn dev_release(&self) {
        log::info!("Device successfully closed");
    }
}

impl FileOperations for VirtcharDevice {
    fn open(&self) -> Result<(), Errno> {
        self.dev_open();
        Ok(())
    }

    fn read(&self, dest: &mut dyn UserSliceWriter, offset: &mut u64) -> Result<usize, Errno> {
        self.dev_read(dest, offset).map_err(|err| {
            log::debug!("read at {} failed: {}", offset, err);
            Errno::from(err)
        })
    }

    fn write(&self, src: &dyn UserSliceReader, offset: &mut u64) -> Result<usize, Errno> {
        self.dev_write(src, offset).map_err(|err| {
            log::debug!("write at {} failed: {}", offset, err);
            Errno::from(err)
        })
    }

    fn release(&self) -> Result<(), Errno> {
        self.dev_release();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Fault, KernelBuffer, KernelBytes};

    /// Destination that faults on its first `failures` copies
    struct FlakyDest<'a> {
        inner: KernelBuffer<'a>,
        failures: usize,
    }

    impl UserSliceWriter for FlakyDest<'_> {
        fn len(&self) -> usize {
            self.inner.len()
        }

        fn copy_out(&mut self, src: &[u8]) -> Result<(), Fault> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(Fault);
            }
            self.inner.copy_out(src)
        }
    }

    /// Source that always faults
    struct BadSource(usize);

    impl UserSliceReader for BadSource {
        fn len(&self) -> usize {
            self.0
        }

        fn copy_in(&self, _dst: &mut [u8]) -> Result<(), Fault> {
            Err(Fault)
        }
    }

    #[test]
    fn test_write_then_read_back() {
        let dev = VirtcharDevice::new(1024).unwrap();
        let input = b"0123456789";

        let mut wpos = 0;
        assert_eq!(dev.dev_write(&KernelBytes::new(input), &mut wpos), Ok(10));
        assert_eq!(wpos, 10);

        let mut out = [0u8; 20];
        let mut rpos = 0;
        assert_eq!(dev.dev_read(&mut KernelBuffer::new(&mut out), &mut rpos), Ok(20));
        assert_eq!(&out[..10], input);
        assert_eq!(&out[10..], &[0u8; 10]);
        assert_eq!(rpos, 20);
    }

    #[test]
    fn test_read_at_capacity_is_eof() {
        let dev = VirtcharDevice::new(16).unwrap();
        let mut out = [0u8; 4];
        let mut pos = 16;
        assert_eq!(dev.dev_read(&mut KernelBuffer::new(&mut out), &mut pos), Ok(0));
        assert_eq!(pos, 16);
    }

    #[test]
    fn test_write_at_capacity_is_out_of_space() {
        let dev = VirtcharDevice::new(16).unwrap();
        let mut pos = 16;
        assert_eq!(
            dev.dev_write(&KernelBytes::new(b"x"), &mut pos),
            Err(VirtcharError::OutOfSpace)
        );
        assert_eq!(pos, 16);
    }

    #[test]
    fn test_empty_write_is_out_of_space() {
        let dev = VirtcharDevice::new(16).unwrap();
        let mut pos = 0;
        assert_eq!(
            dev.dev_write(&KernelBytes::new(b""), &mut pos),
            Err(VirtcharError::OutOfSpace)
        );
    }

    #[test]
    fn test_writes_accumulate_and_truncate() {
        let dev = VirtcharDevice::new(8).unwrap();
        let mut pos = 0;
        assert_eq!(dev.dev_write(&KernelBytes::new(b"abcde"), &mut pos), Ok(5));
        assert_eq!(dev.dev_write(&KernelBytes::new(b"fghij"), &mut pos), Ok(3));
        assert_eq!(pos, 8);
        assert_eq!(
            dev.dev_write(&KernelBytes::new(b"k"), &mut pos),
            Err(VirtcharError::OutOfSpace)
        );

        let mut out = [0u8; 16];
        let mut rpos = 0;
        assert_eq!(dev.dev_read(&mut KernelBuffer::new(&mut out), &mut rpos), Ok(8));
        assert_eq!(&out[..8], b"abcdefgh");
    }

    #[test]
    fn test_read_fault_keeps_cursor() {
        let dev = VirtcharDevice::new(8).unwrap();
        dev.store().write_at(0, b"abcdefgh").unwrap();

        let mut out = [0u8; 4];
        let mut pos = 2;
        let mut dest = FlakyDest {
            inner: KernelBuffer::new(&mut out),
            failures: 1,
        };
        assert_eq!(dev.dev_read(&mut dest, &mut pos), Err(VirtcharError::Fault));
        assert_eq!(pos, 2);

        assert_eq!(dev.dev_read(&mut dest, &mut pos), Ok(4));
        assert_eq!(pos, 6);
        assert_eq!(&out, b"cdef");
    }

    #[test]
    fn test_write_fault_keeps_cursor() {
        let dev = VirtcharDevice::new(8).unwrap();
        let mut pos = 0;
        assert_eq!(dev.dev_write(&KernelBytes::new(b"ab"), &mut pos), Ok(2));
        assert_eq!(dev.dev_write(&BadSource(3), &mut pos), Err(VirtcharError::Fault));
        assert_eq!(pos, 2);

        assert_eq!(dev.dev_write(&KernelBytes::new(b"cde"), &mut pos), Ok(3));
        assert_eq!(pos, 5);

        // Retried bytes follow the earlier ones with no gap or overlap.
        let mut out = [0xffu8; 8];
        let mut rpos = 0;
        assert_eq!(dev.dev_read(&mut KernelBuffer::new(&mut out), &mut rpos), Ok(8));
        assert_eq!(&out, b"abcde\0\0\0");
    }

    #[test]
    fn test_open_count_only_grows() {
        let dev = VirtcharDevice::new(8).unwrap();
        for _ in 0..3 {
            FileOperations::open(&dev).unwrap();
            FileOperations::release(&dev).unwrap();
        }
        assert_eq!(dev.dev_open(), 4);
        assert_eq!(dev.open_count(), 4);
    }

    #[test]
    fn test_errno_surface() {
        let dev = VirtcharDevice::new(4).unwrap();
        let mut pos = 4;
        assert_eq!(
            FileOperations::write(&dev, &KernelBytes::new(b"a"), &mut pos),
            Err(Errno::ENOSPC)
        );
        let mut pos = 0;
        assert_eq!(
            FileOperations::write(&dev, &BadSource(1), &mut pos),
            Err(Errno::EFAULT)
        );
    }
}
