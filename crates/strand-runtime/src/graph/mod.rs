//! Workflow graph model.
//!
//! This module provides the persisted graph entities and their runtime
//! representation:
//! - [`NodeId`] / [`WorkflowId`]: identifier newtypes
//! - [`Node`] / [`NodeKind`]: typed nodes with per-type config schemas
//! - [`Edge`]: directed data dependencies with optional named handles
//! - [`WorkflowGraph`]: structural graph used by the scheduler

mod edge;
mod id;
mod node;
mod workflow;

pub use edge::Edge;
pub use id::{NodeId, WorkflowId};
pub use node::{
    CropConfig, ExtractFrameConfig, LlmConfig, Node, NodeKind, Position, TextConfig, UploadConfig,
};
pub use workflow::{Workflow, WorkflowGraph};
