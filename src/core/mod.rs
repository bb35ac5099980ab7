// CmdSift - core/mod.rs
//
// Core business logic layer: classification, aggregation, deduplication,
// export formatting, and input discovery.
// Must NOT depend on: platform or app.

pub mod aggregate;
pub mod classify;
pub mod dedup;
pub mod discovery;
pub mod export;
pub mod model;
