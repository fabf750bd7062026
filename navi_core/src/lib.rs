// navi_core/src/lib.rs

// Pure planning-orchestration library. No I/O beyond the report writer handed in by the host.
pub mod config;
pub mod controller;
pub mod error;
pub mod frames;
pub mod messages;
pub mod planning;
pub mod prelude;
pub mod publisher;
pub mod readiness;
pub mod stats;
pub mod sweep;
pub mod types;
