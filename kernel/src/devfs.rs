/*
 * In-Memory Device Registry
 *
 * Minimal registration service for character devices: dynamic major
 * allocation, device classes, cdev bindings and /dev nodes, all held in
 * memory. Opening a node resolves path -> device number -> file
 * operations, the same chain a real kernel walks.
 *
 * Dynamic majors are handed out from 254 downward, stopping at 234.
 */

use crate::io::device::{DevNumber, Errno, FileOperations, MINORBITS, S_IFCHR, Stat};
use crate::virtchar::registration::{ClassId, Registrar};
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use spin::Mutex;

/// Directory device nodes are created in
pub const DEV_DIR: &str = "/dev";

const DYNAMIC_MAJOR_START: u32 = 254;
const DYNAMIC_MAJOR_END: u32 = 234;

/// Permission bits of created nodes (rw-rw-rw-)
const NODE_PERMISSIONS: u32 = 0o666;

struct Region {
    name: String,
    first_minor: u32,
    count: u32,
}

struct Cdev {
    count: u32,
    fops: Arc<dyn FileOperations>,
}

struct Node {
    class: ClassId,
    devno: DevNumber,
}

#[derive(Default)]
struct RegistryState {
    regions: BTreeMap<u32, Region>,
    classes: BTreeMap<ClassId, String>,
    next_class: usize,
    cdevs: BTreeMap<DevNumber, Cdev>,
    nodes: BTreeMap<String, Node>,
}

impl RegistryState {
    fn find_cdev(&self, devno: DevNumber) -> Option<&Cdev> {
        let (first, cdev) = self.cdevs.range(..=devno).next_back()?;
        let covers = first.major() == devno.major()
            && devno.minor() < first.minor() + cdev.count;
        covers.then_some(cdev)
    }
}

/// In-memory registration service
pub struct DevRegistry {
    state: Mutex<RegistryState>,
}

impl DevRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Path of the node created for device `name`
    pub fn node_path(name: &str) -> String {
        format!("{}/{}", DEV_DIR, name)
    }

    /// Resolve a node path to the file operations bound to it
    ///
    /// ENOENT if there is no such node, ENXIO if the node's device number
    /// has no cdev behind it.
    pub fn lookup(&self, path: &str) -> Result<Arc<dyn FileOperations>, Errno> {
        let state = self.state.lock();
        let node = state.nodes.get(path).ok_or(Errno::ENOENT)?;
        let cdev = state.find_cdev(node.devno).ok_or(Errno::ENXIO)?;
        Ok(cdev.fops.clone())
    }

    pub fn stat(&self, path: &str) -> Result<Stat, Errno> {
        let state = self.state.lock();
        let node = state.nodes.get(path).ok_or(Errno::ENOENT)?;
        Ok(Stat {
            st_mode: S_IFCHR | NODE_PERMISSIONS,
            st_rdev: node.devno.raw(),
            st_size: 0,
        })
    }

    /// Name a major was registered under
    pub fn region_name(&self, major: u32) -> Option<String> {
        self.state.lock().regions.get(&major).map(|r| r.name.clone())
    }

    pub fn is_major_allocated(&self, major: u32) -> bool {
        self.state.lock().regions.contains_key(&major)
    }

    pub fn region_count(&self) -> usize {
        self.state.lock().regions.len()
    }

    pub fn class_count(&self) -> usize {
        self.state.lock().classes.len()
    }

    pub fn cdev_count(&self) -> usize {
        self.state.lock().cdevs.len()
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().nodes.len()
    }
}

impl Default for DevRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registrar for DevRegistry {
    fn register(&self, name: &str, first_minor: u32, count: u32) -> Result<DevNumber, Errno> {
        let in_range = first_minor
            .checked_add(count)
            .is_some_and(|end| end <= 1 << MINORBITS);
        if count == 0 || !in_range {
            return Err(Errno::EINVAL);
        }

        let mut state = self.state.lock();
        let major = (DYNAMIC_MAJOR_END..=DYNAMIC_MAJOR_START)
            .rev()
            .find(|major| !state.regions.contains_key(major))
            .ok_or(Errno::EBUSY)?;

        state.regions.insert(
            major,
            Region {
                name: name.to_string(),
                first_minor,
                count,
            },
        );
        log::debug!("devfs: major {} allocated to {}", major, name);
        Ok(DevNumber::new(major, first_minor))
    }

    fn unregister(&self, first: DevNumber, count: u32) {
        let mut state = self.state.lock();
        let matches = state
            .regions
            .get(&first.major())
            .is_some_and(|r| r.first_minor == first.minor() && r.count == count);
        if matches {
            state.regions.remove(&first.major());
            log::debug!("devfs: major {} released", first.major());
        }
    }

    fn create_class(&self, name: &str) -> Result<ClassId, Errno> {
        let mut state = self.state.lock();
        if state.classes.values().any(|existing| existing == name) {
            return Err(Errno::EEXIST);
        }

        let id = ClassId(state.next_class);
        state.next_class += 1;
        state.classes.insert(id, name.to_string());
        Ok(id)
    }

    fn destroy_class(&self, class: ClassId) {
        self.state.lock().classes.remove(&class);
    }

    fn add_cdev(
        &self,
        devno: DevNumber,
        count: u32,
        fops: Arc<dyn FileOperations>,
    ) -> Result<(), Errno> {
        let mut state = self.state.lock();
        let region = state.regions.get(&devno.major()).ok_or(Errno::ENXIO)?;
        let region_end = region.first_minor + region.count;
        let inside = devno.minor() >= region.first_minor
            && devno.minor().checked_add(count).is_some_and(|end| end <= region_end);
        if count == 0 || !inside {
            return Err(Errno::EINVAL);
        }

        let overlaps = (0..count).any(|i| {
            state
                .find_cdev(DevNumber::new(devno.major(), devno.minor() + i))
                .is_some()
        });
        if overlaps {
            return Err(Errno::EBUSY);
        }

        state.cdevs.insert(devno, Cdev { count, fops });
        Ok(())
    }

    fn del_cdev(&self, devno: DevNumber, count: u32) {
        let mut state = self.state.lock();
        if state.cdevs.get(&devno).is_some_and(|c| c.count == count) {
            state.cdevs.remove(&devno);
        }
    }

    fn create_node(&self, class: ClassId, devno: DevNumber, name: &str) -> Result<(), Errno> {
        let mut state = self.state.lock();
        if !state.classes.contains_key(&class) {
            return Err(Errno::EINVAL);
        }

        let path = Self::node_path(name);
        if state.nodes.contains_key(&path) {
            return Err(Errno::EEXIST);
        }

        log::debug!("devfs: created {} ({})", path, devno);
        state.nodes.insert(path, Node { class, devno });
        Ok(())
    }

    fn destroy_node(&self, class: ClassId, devno: DevNumber) {
        self.state
            .lock()
            .nodes
            .retain(|_, node| !(node.class == class && node.devno == devno));
    }
}
