/*
 * Kernel Utilities
 */

pub mod debug;
