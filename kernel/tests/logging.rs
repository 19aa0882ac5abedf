//! The module's log lines land in the kernel log buffer.
//!
//! Kept in its own test binary: it installs the global logger and drains
//! the global log buffer.

use std::sync::Arc;

use virtchar::devfs::DevRegistry;
use virtchar::io::{FileDescriptorTable, KernelBuffer, KernelBytes};
use virtchar::utils::debug::log_buffer;
use virtchar::virtchar::Registrar;
use virtchar::{DeviceConfig, ModuleSlot};

fn drain_log() -> String {
    let mut log = Vec::new();
    let mut chunk = [0u8; 512];
    loop {
        let n = log_buffer::read_log(&mut chunk);
        if n == 0 {
            break;
        }
        log.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&log).into_owned()
}

#[test]
fn lifecycle_is_logged() {
    let registry = Arc::new(DevRegistry::new());
    let registrar: Arc<dyn Registrar> = registry.clone();
    let slot = ModuleSlot::new(registrar);
    slot.load(&DeviceConfig::default()).unwrap();

    let mut fds = FileDescriptorTable::new();
    let fd = fds.open(registry.lookup("/dev/virtchar").unwrap()).unwrap();
    fds.write(fd, &KernelBytes::new(b"hello")).unwrap();
    let mut out = [0u8; 3];
    fds.read(fd, &mut KernelBuffer::new(&mut out)).unwrap();
    fds.close(fd).unwrap();
    slot.unload().unwrap();

    assert!(log_buffer::buffer_usage() > 0);
    let log = drain_log();
    assert_eq!(log_buffer::buffer_usage(), 0);

    for expected in [
        "[INFO] Logger initialized correctly",
        "by Ameed Othman <othman.ameed@gmail.com>, license GPL",
        "[INFO] Registered with major number 254",
        "[INFO] Device initialized successfully",
        "[INFO] Device opened 1 time(s)",
        "[INFO] Wrote 5 bytes to device",
        "[INFO] Read 3 bytes from device",
        "[INFO] Device successfully closed",
        "[INFO] Device unregistered and module unloaded",
    ] {
        assert!(log.contains(expected), "missing {:?} in log:\n{}", expected, log);
    }
    // Debug records are filtered out.
    assert!(!log.contains("[DEBUG]"));

    let opened = log.find("Device opened").unwrap();
    let closed = log.find("Device successfully closed").unwrap();
    assert!(opened < closed);
    assert!(log.lines().all(|line| line.starts_with('[')));
}
