/*
 * Virtual Character Device
 *
 * The device record: one fixed-capacity buffer shared by every session,
 * and a counter of how many times the device has been opened.
 *
 * The record is created by module init and handed to the registration
 * layer as the device's file operations; see ops.rs for the session
 * protocol and registration.rs for the init/teardown guards.
 */

pub mod buffer;
pub mod error;
pub mod ops;
pub mod registration;

pub use buffer::{BufferStore, Extent};
pub use error::VirtcharError;
pub use registration::{
    CdevRegistration, ChrdevRegion, ClassId, DeviceClass, NodeRegistration, Registrar,
};

use core::sync::atomic::{AtomicU32, Ordering};

/// Device record
pub struct VirtcharDevice {
    store: BufferStore,
    open_count: AtomicU32,
}

impl VirtcharDevice {
    /// Allocate the record with a buffer of `buffer_size` bytes
    pub fn new(buffer_size: usize) -> Result<Self, VirtcharError> {
        Ok(Self {
            store: BufferStore::try_new(buffer_size)?,
            open_count: AtomicU32::new(0),
        })
    }

    /// Total number of opens since the record was created
    ///
    /// Never decremented; wraps on overflow.
    pub fn open_count(&self) -> u32 {
        self.open_count.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn store(&self) -> &BufferStore {
        &self.store
    }
}
