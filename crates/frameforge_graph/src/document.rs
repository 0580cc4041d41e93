// SPDX-License-Identifier: MIT OR Apache-2.0
//! Document persistence: the editable graph, variable pool and custom
//! node definitions as one RON file.
//!
//! Node-kind and pin-type enums are persisted by variant name and are
//! append-only, so documents written by older builds keep loading.

use crate::custom::CustomNodeRegistry;
use crate::ident::{reset_id_allocator, resume_id_allocator};
use crate::variable::VariablePool;
use crate::Graph;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current document format version.
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Error from saving or loading a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// File I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed RON.
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization error.
    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),

    /// Saved with a newer format than this build understands.
    #[error("unsupported document version {found} (this build reads up to {supported})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Highest version this build reads.
        supported: u32,
    },
}

/// A complete editable document.
#[derive(Debug, Serialize, Deserialize)]
pub struct Document {
    /// Format version, checked on load.
    pub version: u32,
    /// The main graph.
    pub graph: Graph,
    /// The variable pool.
    pub variables: VariablePool,
    /// Custom node definitions.
    pub custom_nodes: CustomNodeRegistry,
}

impl Document {
    /// Create a new document with seeded entry nodes.
    ///
    /// Resets the global ID allocator to its floor; only call this when
    /// starting a fresh document, not while another is open.
    pub fn new() -> Self {
        reset_id_allocator();
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            graph: Graph::with_entry_nodes(),
            variables: VariablePool::new(),
            custom_nodes: CustomNodeRegistry::new(),
        }
    }

    /// Save to a RON file.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        tracing::info!("saved document to {}", path.display());
        Ok(())
    }

    /// Load from a RON file.
    ///
    /// On success the global ID allocator resumes one past the highest
    /// ID found in the document. On failure nothing is mutated; the
    /// caller keeps its live document.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let text = std::fs::read_to_string(path)?;
        let document: Self = ron::from_str(&text)?;
        if document.version > DOCUMENT_FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
                supported: DOCUMENT_FORMAT_VERSION,
            });
        }
        resume_id_allocator(document.highest_id());
        tracing::info!("loaded document from {}", path.display());
        Ok(document)
    }

    /// Highest raw ID used anywhere in the document.
    pub fn highest_id(&self) -> u64 {
        self.graph
            .highest_id()
            .max(self.variables.highest_id())
            .max(self.custom_nodes.highest_id())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
