// CmdSift - app/mod.rs
//
// Application layer: run orchestration and loading of the key configuration
// and name table from the working directory.
// Dependencies: core, platform, util.

pub mod batch;
pub mod key_config;
pub mod name_table;
