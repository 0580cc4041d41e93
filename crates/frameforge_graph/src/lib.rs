// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph data model for FrameForge.
//!
//! This crate owns the editable side of a render-pipeline program:
//! - Typed nodes, pins and links with structural-edit operations
//! - A deferred command queue with undo history
//! - The variable pool and custom-node (sub-graph) registry
//! - Document save/load and the global ID allocator
//!
//! ## Architecture
//!
//! The [`Graph`] store is the authoritative owner of nodes and links and
//! enforces link compatibility and cascading deletes. All GUI-triggered
//! edits go through [`command::CommandQueue`] so mutation happens at a
//! defined flush point and can be undone. Compilation and execution of
//! a graph live in the `frameforge_pipeline` crate.

pub mod command;
pub mod custom;
pub mod document;
pub mod graph;
pub mod ident;
pub mod link;
pub mod node;
pub mod pin;
pub mod variable;

pub use custom::{CustomNodeDef, CustomNodeRegistry};
pub use document::{Document, DocumentError};
pub use graph::{Graph, GraphError};
pub use ident::{CustomNodeId, LinkId, NodeId, PinId, VariableId};
pub use link::Link;
pub use node::{Node, NodeKind};
pub use pin::{Pin, PinDirection, PinType, PinValue};
