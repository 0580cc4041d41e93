// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stable identifiers and the process-wide ID allocator.
//!
//! Every node, pin, link, variable and custom-node definition carries a
//! `u64` minted from one monotonically increasing counter, so loaded
//! documents can resume the counter one past the highest ID they contain
//! and freshly minted IDs never collide with persisted ones.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// IDs below this value are reserved for well-known built-ins.
pub const FIRST_DYNAMIC_ID: u64 = 1000;

static NEXT_ID: AtomicU64 = AtomicU64::new(FIRST_DYNAMIC_ID);

/// Mint the next unique raw ID.
pub fn next_raw_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Reset the allocator to the reserved floor (new document).
pub fn reset_id_allocator() {
    NEXT_ID.store(FIRST_DYNAMIC_ID, Ordering::Relaxed);
}

/// Resume the allocator one past `highest` (loaded document).
///
/// Never moves the counter below the reserved floor or backwards past
/// IDs already handed out in this session.
pub fn resume_id_allocator(highest: u64) {
    let floor = highest.saturating_add(1).max(FIRST_DYNAMIC_ID);
    NEXT_ID.fetch_max(floor, Ordering::Relaxed);
}

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Mint a fresh ID from the global allocator.
            pub fn new() -> Self {
                Self(next_raw_id())
            }

            /// Get the raw ID value.
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(
    /// Unique identifier for a node.
    NodeId
);
define_id!(
    /// Unique identifier for a pin.
    PinId
);
define_id!(
    /// Unique identifier for a link.
    LinkId
);
define_id!(
    /// Unique identifier for a variable.
    VariableId
);
define_id!(
    /// Unique identifier for a custom-node definition.
    CustomNodeId
);
