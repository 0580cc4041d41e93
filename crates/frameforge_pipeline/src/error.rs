// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compile-time error collection.

use frameforge_graph::NodeId;

/// One compile-time semantic problem.
///
/// Compilation never aborts on these; they are collected across the
/// whole graph in one pass so the frontend can show every problem at
/// once and highlight the offending nodes. A pipeline whose error list
/// is non-empty must not be run.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
    /// Human-readable description.
    pub message: String,
    /// Offending node, for UI highlighting.
    pub node: Option<NodeId>,
}

impl CompileError {
    /// Error attached to a node.
    pub fn at(node: NodeId, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            node: Some(node),
        }
    }

    /// Error with no single offending node.
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            node: None,
        }
    }
}
