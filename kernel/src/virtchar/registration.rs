/*
 * Registration Guards
 *
 * Interface to the host's registration service and one guard per
 * registration step. Each guard undoes its step when dropped, so an init
 * path that bails out with `?` releases everything acquired so far, last
 * acquired first.
 *
 * Steps, in acquisition order:
 * 1. ChrdevRegion     - dynamic major number for the device name
 * 2. DeviceClass      - device class the node is created under
 * 3. CdevRegistration - binds the file operations to the device number
 * 4. NodeRegistration - the device node itself (/dev/<name>)
 */

use crate::io::{DevNumber, Errno, FileOperations};
use alloc::sync::Arc;

/// Device class handle returned by the registration service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub usize);

/// Host registration service
///
/// Implemented outside the device core; `devfs::DevRegistry` is the
/// in-memory implementation.
pub trait Registrar: Send + Sync {
    /// Allocate a device number region with a dynamic major
    fn register(&self, name: &str, first_minor: u32, count: u32) -> Result<DevNumber, Errno>;

    /// Free a region returned by `register`
    fn unregister(&self, first: DevNumber, count: u32);

    fn create_class(&self, name: &str) -> Result<ClassId, Errno>;

    fn destroy_class(&self, class: ClassId);

    /// Make `fops` reachable through device numbers `devno..devno+count`
    fn add_cdev(
        &self,
        devno: DevNumber,
        count: u32,
        fops: Arc<dyn FileOperations>,
    ) -> Result<(), Errno>;

    fn del_cdev(&self, devno: DevNumber, count: u32);

    /// Create the device node `name` for `devno` under `class`
    fn create_node(&self, class: ClassId, devno: DevNumber, name: &str) -> Result<(), Errno>;

    fn destroy_node(&self, class: ClassId, devno: DevNumber);
}

/// Allocated device number region
pub struct ChrdevRegion {
    registrar: Arc<dyn Registrar>,
    first: DevNumber,
    count: u32,
}

impl ChrdevRegion {
    pub fn alloc(
        registrar: &Arc<dyn Registrar>,
        name: &str,
        first_minor: u32,
        count: u32,
    ) -> Result<Self, Errno> {
        let first = registrar.register(name, first_minor, count)?;
        Ok(Self {
            registrar: registrar.clone(),
            first,
            count,
        })
    }

    pub fn first(&self) -> DevNumber {
        self.first
    }

    pub fn major(&self) -> u32 {
        self.first.major()
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Drop for ChrdevRegion {
    fn drop(&mut self) {
        self.registrar.unregister(self.first, self.count);
        log::debug!("Released device region {}", self.first);
    }
}

/// Created device class
pub struct DeviceClass {
    registrar: Arc<dyn Registrar>,
    id: ClassId,
}

impl DeviceClass {
    pub fn create(registrar: &Arc<dyn Registrar>, name: &str) -> Result<Self, Errno> {
        let id = registrar.create_class(name)?;
        Ok(Self {
            registrar: registrar.clone(),
            id,
        })
    }

    pub fn id(&self) -> ClassId {
        self.id
    }
}

impl Drop for DeviceClass {
    fn drop(&mut self) {
        self.registrar.destroy_class(self.id);
        log::debug!("Destroyed device class {}", self.id.0);
    }
}

/// Character device bound to a device number region
pub struct CdevRegistration {
    registrar: Arc<dyn Registrar>,
    devno: DevNumber,
    count: u32,
}

impl CdevRegistration {
    pub fn add(
        registrar: &Arc<dyn Registrar>,
        region: &ChrdevRegion,
        fops: Arc<dyn FileOperations>,
    ) -> Result<Self, Errno> {
        registrar.add_cdev(region.first(), region.count(), fops)?;
        Ok(Self {
            registrar: registrar.clone(),
            devno: region.first(),
            count: region.count(),
        })
    }
}

impl Drop for CdevRegistration {
    fn drop(&mut self) {
        self.registrar.del_cdev(self.devno, self.count);
        log::debug!("Deleted cdev {}", self.devno);
    }
}

/// Device node
pub struct NodeRegistration {
    registrar: Arc<dyn Registrar>,
    class: ClassId,
    devno: DevNumber,
}

impl NodeRegistration {
    pub fn create(
        registrar: &Arc<dyn Registrar>,
        class: &DeviceClass,
        devno: DevNumber,
        name: &str,
    ) -> Result<Self, Errno> {
        registrar.create_node(class.id(), devno, name)?;
        Ok(Self {
            registrar: registrar.clone(),
            class: class.id(),
            devno,
        })
    }

    pub fn devno(&self) -> DevNumber {
        self.devno
    }
}

impl Drop for NodeRegistration {
    fn drop(&mut self) {
        self.registrar.destroy_node(self.class, self.devno);
        log::debug!("Destroyed device node {}", self.devno);
    }
}
