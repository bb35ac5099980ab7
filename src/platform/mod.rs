// CmdSift - platform/mod.rs
//
// Platform abstraction layer: working-directory paths, settings file,
// encoding-aware file reading.

pub mod config;
pub mod fs;
