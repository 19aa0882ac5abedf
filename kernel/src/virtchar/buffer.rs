/*
 * Buffer Store
 *
 * Fixed-capacity byte array backing the device. All access goes through
 * an Extent, which can only be produced by clamping an (offset, length)
 * request against the capacity, so every slice taken from the buffer is
 * in bounds by construction.
 *
 * One spin lock guards the whole array. Copies to and from the caller run
 * with the lock held, so concurrent sessions never see a torn transfer.
 */

use super::error::VirtcharError;
use crate::io::Fault;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops::Range;
use spin::Mutex;

/// Clamped byte range inside a buffer of known capacity
///
/// Invariant: `start + len <= capacity` of the store that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    start: usize,
    len: usize,
}

impl Extent {
    /// Clamp a request of `requested` bytes at `offset`
    ///
    /// Offsets at or past the capacity yield an empty extent positioned at
    /// the end of the buffer.
    pub fn clamp(capacity: usize, offset: u64, requested: usize) -> Self {
        match usize::try_from(offset) {
            Ok(start) if start < capacity => Self {
                start,
                len: requested.min(capacity - start),
            },
            _ => Self {
                start: capacity,
                len: 0,
            },
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Fixed-capacity byte store
pub struct BufferStore {
    data: Mutex<Box<[u8]>>,
    capacity: usize,
}

impl BufferStore {
    /// Allocate a zero-filled store of `capacity` bytes
    ///
    /// Returns AllocationFailure instead of aborting when the memory is
    /// not available.
    pub fn try_new(capacity: usize) -> Result<Self, VirtcharError> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| VirtcharError::AllocationFailure)?;
        data.resize(capacity, 0);

        Ok(Self {
            data: Mutex::new(data.into_boxed_slice()),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clamp a request against this store
    pub fn extent(&self, offset: u64, requested: usize) -> Extent {
        Extent::clamp(self.capacity, offset, requested)
    }

    /// Hand up to `max_len` bytes at `offset` to `copy`, under the lock
    ///
    /// Returns the number of bytes handed out. Past the end, or for an
    /// empty request, returns 0 without calling `copy`.
    pub fn read_with<F>(&self, offset: u64, max_len: usize, copy: F) -> Result<usize, Fault>
    where
        F: FnOnce(&[u8]) -> Result<(), Fault>,
    {
        let extent = self.extent(offset, max_len);
        if extent.is_empty() {
            return Ok(0);
        }

        let data = self.data.lock();
        copy(&data[extent.range()])?;
        Ok(extent.len())
    }

    /// Let `fill` write up to `max_len` bytes at `offset`, under the lock
    ///
    /// Fails with OutOfSpace when `offset` is at or past the capacity.
    /// If `fill` faults the bytes of the extent are unspecified.
    pub fn write_with<F>(&self, offset: u64, max_len: usize, fill: F) -> Result<usize, VirtcharError>
    where
        F: FnOnce(&mut [u8]) -> Result<(), Fault>,
    {
        let extent = self.extent(offset, max_len);
        if extent.start() == self.capacity {
            return Err(VirtcharError::OutOfSpace);
        }
        if extent.is_empty() {
            return Ok(0);
        }

        let mut data = self.data.lock();
        fill(&mut data[extent.range()])?;
        Ok(extent.len())
    }

    /// Copy up to `dest.len()` bytes at `offset` into `dest`
    pub fn read_at(&self, offset: u64, dest: &mut [u8]) -> usize {
        let extent = self.extent(offset, dest.len());
        if extent.is_empty() {
            return 0;
        }

        let data = self.data.lock();
        dest[..extent.len()].copy_from_slice(&data[extent.range()]);
        extent.len()
    }

    /// Store up to `data.len()` bytes at `offset`
    pub fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize, VirtcharError> {
        self.write_with(offset, data.len(), |dst| {
            dst.copy_from_slice(&data[..dst.len()]);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_clamping() {
        assert_eq!(Extent::clamp(16, 0, 4), Extent { start: 0, len: 4 });
        assert_eq!(Extent::clamp(16, 10, 100), Extent { start: 10, len: 6 });
        assert_eq!(Extent::clamp(16, 16, 1), Extent { start: 16, len: 0 });
        assert_eq!(Extent::clamp(16, u64::MAX, 1), Extent { start: 16, len: 0 });
        assert!(Extent::clamp(16, 3, 0).is_empty());
    }

    #[test]
    fn test_new_store_is_zeroed() {
        let store = BufferStore::try_new(8).unwrap();
        assert_eq!(store.capacity(), 8);

        let mut buf = [0xffu8; 8];
        assert_eq!(store.read_at(0, &mut buf), 8);
        assert_eq!(buf, [0u8; 8]);
    }

    #[test]
    fn test_allocation_failure() {
        assert_eq!(
            BufferStore::try_new(usize::MAX).err(),
            Some(VirtcharError::AllocationFailure)
        );
    }

    #[test]
    fn test_write_then_read_back() {
        let store = BufferStore::try_new(16).unwrap();
        assert_eq!(store.write_at(4, b"data"), Ok(4));

        let mut buf = [0u8; 4];
        assert_eq!(store.read_at(4, &mut buf), 4);
        assert_eq!(&buf, b"data");
    }

    #[test]
    fn test_short_transfers_at_the_end() {
        let store = BufferStore::try_new(8).unwrap();
        assert_eq!(store.write_at(6, b"abcd"), Ok(2));

        let mut buf = [0u8; 4];
        assert_eq!(store.read_at(6, &mut buf), 2);
        assert_eq!(&buf[..2], b"ab");
    }

    #[test]
    fn test_end_of_buffer() {
        let store = BufferStore::try_new(8).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(store.read_at(8, &mut buf), 0);
        assert_eq!(store.read_at(100, &mut buf), 0);
        assert_eq!(store.write_at(8, b"x"), Err(VirtcharError::OutOfSpace));
        assert_eq!(store.write_at(9, b"x"), Err(VirtcharError::OutOfSpace));
        assert_eq!(store.write_at(0, b""), Ok(0));
    }

    #[test]
    fn test_faulting_copy_is_reported() {
        let store = BufferStore::try_new(8).unwrap();
        assert_eq!(store.read_with(0, 4, |_| Err(Fault)), Err(Fault));
        assert_eq!(
            store.write_with(0, 4, |_| Err(Fault)),
            Err(VirtcharError::Fault)
        );
    }

    #[test]
    fn test_empty_read_skips_copy() {
        let store = BufferStore::try_new(8).unwrap();
        let mut called = false;
        let n = store
            .read_with(8, 4, |_| {
                called = true;
                Ok(())
            })
            .unwrap();
        assert_eq!(n, 0);
        assert!(!called);
    }
}
