/*
 * virtchar Module Lifecycle
 *
 * Init and teardown of the virtchar device, and the slot the loader keeps
 * the loaded module in.
 *
 * Init acquires, in order:
 * 1. a device number region with a dynamic major
 * 2. the device class
 * 3. the device record (buffer allocation)
 * 4. the cdev binding the device's file operations to the region
 * 5. the device node
 *
 * Every step is held by a guard. If a step fails, init returns early and
 * the guards acquired so far drop in reverse order. Teardown is the drop
 * of VirtcharModule, whose fields are declared in reverse acquisition
 * order.
 */

use crate::config::{DeviceConfig, MODULE_INFO};
use crate::io::{DevNumber, Errno, FileOperations};
use crate::utils::debug;
use crate::virtchar::{
    CdevRegistration, ChrdevRegion, DeviceClass, NodeRegistration, Registrar, VirtcharDevice,
    VirtcharError,
};
use alloc::sync::Arc;
use spin::Mutex;

/// A loaded virtchar module
pub struct VirtcharModule {
    // Field order is teardown order.
    node: NodeRegistration,
    #[allow(dead_code)] // only held until teardown
    cdev: CdevRegistration,
    device: Arc<VirtcharDevice>,
    #[allow(dead_code)] // only held until teardown
    class: DeviceClass,
    region: ChrdevRegion,
}

impl VirtcharModule {
    /// Register and publish the device
    pub fn init(
        registrar: &Arc<dyn Registrar>,
        config: &DeviceConfig,
    ) -> Result<Self, VirtcharError> {
        config.validate().inspect_err(|_| {
            log::error!("Invalid device configuration");
        })?;
        let name = config.name();

        let region = ChrdevRegion::alloc(registrar, name, config.first_minor(), config.minor_count())
            .map_err(|errno| {
                log::error!("Failed to allocate a major number");
                VirtcharError::RegistrationFailure(errno)
            })?;
        log::info!("Registered with major number {}", region.major());

        let class = DeviceClass::create(registrar, name).map_err(|errno| {
            log::error!("Failed to create device class");
            VirtcharError::RegistrationFailure(errno)
        })?;

        let device = Arc::new(VirtcharDevice::new(config.buffer_size()).inspect_err(|_| {
            log::error!("Failed to allocate buffer");
        })?);

        let fops: Arc<dyn FileOperations> = device.clone();
        let cdev = CdevRegistration::add(registrar, &region, fops).map_err(|errno| {
            log::error!("Failed to add cdev");
            VirtcharError::RegistrationFailure(errno)
        })?;

        let node = NodeRegistration::create(registrar, &class, region.first(), name).map_err(
            |errno| {
                log::error!("Failed to create device");
                VirtcharError::RegistrationFailure(errno)
            },
        )?;

        log::info!("Device initialized successfully");
        Ok(Self {
            node,
            cdev,
            device,
            class,
            region,
        })
    }

    /// The device record
    pub fn device(&self) -> &Arc<VirtcharDevice> {
        &self.device
    }

    pub fn devno(&self) -> DevNumber {
        self.node.devno()
    }

    pub fn major(&self) -> u32 {
        self.region.major()
    }

    /// Tear the device down
    pub fn exit(self) {
        drop(self);
        log::info!("Device unregistered and module unloaded");
    }
}

/// Loader-side holder of the module
///
/// Loading runs init and keeps the module until it is unloaded. Only one
/// instance can be loaded at a time.
pub struct ModuleSlot {
    registrar: Arc<dyn Registrar>,
    loaded: Mutex<Option<VirtcharModule>>,
}

impl ModuleSlot {
    pub fn new(registrar: Arc<dyn Registrar>) -> Self {
        debug::init();
        Self {
            registrar,
            loaded: Mutex::new(None),
        }
    }

    /// Load the module (module_init)
    ///
    /// EEXIST if it is already loaded; otherwise the errno of the failing
    /// init step, with every earlier step undone.
    pub fn load(&self, config: &DeviceConfig) -> Result<(), Errno> {
        let mut loaded = self.loaded.lock();
        if loaded.is_some() {
            return Err(Errno::EEXIST);
        }

        log::info!(
            "Loading {} {} ({}) by {}, license {}",
            MODULE_INFO.name,
            MODULE_INFO.version,
            MODULE_INFO.description,
            MODULE_INFO.author,
            MODULE_INFO.license
        );
        let module = VirtcharModule::init(&self.registrar, config)?;
        *loaded = Some(module);
        Ok(())
    }

    /// Unload the module (module_exit)
    ///
    /// ENOENT if nothing is loaded.
    pub fn unload(&self) -> Result<(), Errno> {
        let module = self.loaded.lock().take().ok_or(Errno::ENOENT)?;
        module.exit();
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().is_some()
    }

    /// Run `f` against the loaded module
    pub fn with_module<R>(&self, f: impl FnOnce(&VirtcharModule) -> R) -> Option<R> {
        self.loaded.lock().as_ref().map(f)
    }
}

impl Drop for ModuleSlot {
    fn drop(&mut self) {
        if let Some(module) = self.loaded.get_mut().take() {
            module.exit();
        }
    }
}
