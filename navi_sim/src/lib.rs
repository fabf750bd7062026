// navi_sim/src/lib.rs

// Host side of the planning controller: configuration, static transforms, in-process
// topics and the fixed-rate loop. The binary in `main.rs` wires these together.
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod serde_helpers;
pub mod sinks;
pub mod tf_tree;
pub mod topics;
