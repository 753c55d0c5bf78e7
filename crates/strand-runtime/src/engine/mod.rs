//! Workflow execution engine.
//!
//! The engine drives one run at a time from Pending to a terminal
//! state: it loads the graph, scopes it if the run targets a node
//! subset, and executes ready nodes in level-synchronous concurrent
//! batches, persisting every transition through the store port.

mod config;
mod executor;
mod handler;
mod input;
#[cfg(test)]
pub(crate) mod testing;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use executor::{Engine, RunRequest, RunSummary};
pub use input::{IMAGES_HANDLE, aggregate_inputs, extract_output};
