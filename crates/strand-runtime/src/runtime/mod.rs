//! Run lifecycle service.
//!
//! Sits between a trigger surface (HTTP handler, queue consumer, test)
//! and the engine: creates the run row, guards against duplicate
//! in-flight triggers for the same run, spawns the execution task, and
//! assembles poll documents from persisted state.

mod service;

pub use service::{RunHandle, RuntimeService};
