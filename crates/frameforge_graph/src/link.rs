// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::ident::{LinkId, PinId};
use serde::{Deserialize, Serialize};

/// A directed connection from an output pin to an input pin.
///
/// A link exists only while both endpoint pins exist; the graph store
/// severs links as part of pin and node removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID.
    pub id: LinkId,
    /// Source (output) pin.
    pub from: PinId,
    /// Destination (input) pin.
    pub to: PinId,
}

impl Link {
    /// Create a new link with a fresh ID.
    pub fn new(from: PinId, to: PinId) -> Self {
        Self {
            id: LinkId::new(),
            from,
            to,
        }
    }

    /// Check whether this link touches a specific pin.
    pub fn involves_pin(&self, pin: PinId) -> bool {
        self.from == pin || self.to == pin
    }
}
