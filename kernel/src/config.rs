/*
 * Device Configuration
 *
 * Load-time settings for the virtchar device and the module metadata
 * reported to the loader.
 */

use crate::virtchar::VirtcharError;
use heapless::String;

/// Default device, class and node name
pub const DEVICE_NAME: &str = "virtchar";

/// Default buffer capacity in bytes
pub const BUFFER_SIZE: usize = 1024;

/// Longest accepted device name
pub const DEVICE_NAME_MAX: usize = 32;

/// One device, one minor
const MINOR_COUNT: u32 = 1;

/// Module metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub author: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub license: &'static str,
}

pub const MODULE_INFO: ModuleInfo = ModuleInfo {
    name: DEVICE_NAME,
    author: "Ameed Othman <othman.ameed@gmail.com>",
    description: "Virtual Character Device Driver",
    version: "1.0",
    license: "GPL",
};

/// Device configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    name: String<DEVICE_NAME_MAX>,
    buffer_size: usize,
    first_minor: u32,
}

impl DeviceConfig {
    /// Use `name` for the region, class and node
    ///
    /// Names that are empty, longer than DEVICE_NAME_MAX or contain '/'
    /// are rejected.
    pub fn with_name(mut self, name: &str) -> Result<Self, VirtcharError> {
        if name.is_empty() || name.contains('/') {
            return Err(VirtcharError::InvalidConfig);
        }
        self.name = String::try_from(name).map_err(|_| VirtcharError::InvalidConfig)?;
        Ok(self)
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_first_minor(mut self, first_minor: u32) -> Self {
        self.first_minor = first_minor;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn first_minor(&self) -> u32 {
        self.first_minor
    }

    pub fn minor_count(&self) -> u32 {
        MINOR_COUNT
    }

    /// Check the settings before anything is registered
    pub fn validate(&self) -> Result<(), VirtcharError> {
        if self.name.is_empty() || self.buffer_size == 0 {
            return Err(VirtcharError::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut name = String::new();
        // DEVICE_NAME is shorter than DEVICE_NAME_MAX.
        let _ = name.push_str(DEVICE_NAME);
        Self {
            name,
            buffer_size: BUFFER_SIZE,
            first_minor: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::default();
        assert_eq!(config.name(), "virtchar");
        assert_eq!(config.buffer_size(), 1024);
        assert_eq!(config.first_minor(), 0);
        assert_eq!(config.minor_count(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DeviceConfig::default()
            .with_name("scratch")
            .unwrap()
            .with_buffer_size(64)
            .with_first_minor(3);
        assert_eq!(config.name(), "scratch");
        assert_eq!(config.buffer_size(), 64);
        assert_eq!(config.first_minor(), 3);
    }

    #[test]
    fn test_rejected_settings() {
        let config = DeviceConfig::default();
        assert_eq!(config.clone().with_name("").err(), Some(VirtcharError::InvalidConfig));
        assert_eq!(config.clone().with_name("a/b").err(), Some(VirtcharError::InvalidConfig));
        let long = "x".repeat(DEVICE_NAME_MAX + 1);
        assert_eq!(config.clone().with_name(&long).err(), Some(VirtcharError::InvalidConfig));
        assert_eq!(
            config.with_buffer_size(0).validate(),
            Err(VirtcharError::InvalidConfig)
        );
    }
}
