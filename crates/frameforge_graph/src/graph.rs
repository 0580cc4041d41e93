// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph store: authoritative owner of nodes, links and canvas positions.
//!
//! All structural mutation is synchronous and immediate; batching and
//! undo live in the command layer above. The store enforces link
//! compatibility, the single-producer/single-successor invariants, and
//! cascading deletes.

use crate::ident::{LinkId, NodeId, PinId};
use crate::link::Link;
use crate::node::{Node, NodeKind};
use crate::pin::{can_be_linked, Pin, PinDirection};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error from a structural graph operation.
///
/// These indicate caller bugs (stale IDs, invalid targets), surfaced as
/// typed errors rather than debug asserts.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not found.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Pin not found.
    #[error("pin not found: {0:?}")]
    PinNotFound(PinId),

    /// Link not found.
    #[error("link not found: {0:?}")]
    LinkNotFound(LinkId),

    /// Pin types or directions are incompatible.
    #[error("pins cannot be linked")]
    IncompatiblePins,

    /// Destination pin is literal-driven; toggle the constant off first.
    #[error("pin is driven by a constant: {0:?}")]
    PinIsConstant(PinId),

    /// Fixed pins are part of the node's layout and cannot be removed.
    #[error("fixed pin is not removable: {0:?}")]
    FixedPinNotRemovable(PinId),

    /// Custom pins are only valid on extensible node kinds.
    #[error("node kind does not accept custom pins: {0:?}")]
    NotExtensible(NodeId),

    /// The entry nodes cannot be deleted.
    #[error("entry node is not removable: {0:?}")]
    EntryNodeNotRemovable(NodeId),

    /// A graph holds exactly one node of this entry kind.
    #[error("graph already contains this entry kind")]
    DuplicateEntryNode,
}

/// A node graph: nodes, links, and per-node canvas positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    links: IndexMap<LinkId, Link>,
    positions: IndexMap<NodeId, [f32; 2]>,
    /// Incrementally maintained pin-to-owner index.
    pin_owners: HashMap<PinId, NodeId>,
}

impl Graph {
    /// Create a new empty graph (no entry nodes; used for sub-graphs).
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            links: IndexMap::new(),
            positions: IndexMap::new(),
            pin_owners: HashMap::new(),
        }
    }

    /// Create a graph seeded with its `OnStart` and `OnUpdate` entry nodes.
    pub fn with_entry_nodes() -> Self {
        let mut graph = Self::new();
        let start = Node::create(NodeKind::OnStart);
        let update = Node::create(NodeKind::OnUpdate);
        graph
            .add_node(start)
            .expect("empty graph accepts OnStart");
        let update_id = graph
            .add_node(update)
            .expect("empty graph accepts OnUpdate");
        graph.set_position(update_id, [0.0, 150.0]);
        graph
    }

    // --- nodes ---

    /// Insert a node, indexing its pins and seeding a default position.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        match node.kind {
            NodeKind::OnStart if self.find_by_kind(NodeKind::OnStart).is_some() => {
                return Err(GraphError::DuplicateEntryNode);
            }
            NodeKind::OnUpdate if self.find_by_kind(NodeKind::OnUpdate).is_some() => {
                return Err(GraphError::DuplicateEntryNode);
            }
            _ => {}
        }
        let id = node.id;
        for pin in node.all_pins() {
            self.pin_owners.insert(pin.id, id);
        }
        self.nodes.insert(id, node);
        self.positions.entry(id).or_insert([0.0, 0.0]);
        Ok(id)
    }

    /// Remove a node, severing every link touching any of its pins first.
    ///
    /// Entry nodes are not removable.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        if matches!(node.kind, NodeKind::OnStart | NodeKind::OnUpdate) {
            return Err(GraphError::EntryNodeNotRemovable(id));
        }
        let pin_ids: Vec<PinId> = node.all_pins().map(|p| p.id).collect();
        self.links
            .retain(|_, link| !pin_ids.iter().any(|p| link.involves_pin(*p)));
        for pin in &pin_ids {
            self.pin_owners.remove(pin);
        }
        self.positions.shift_remove(&id);
        // Checked above.
        Ok(self.nodes.shift_remove(&id).expect("node exists"))
    }

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// First node of the given kind, if any.
    pub fn find_by_kind(&self, kind: NodeKind) -> Option<&Node> {
        self.nodes.values().find(|n| n.kind == kind)
    }

    /// The graph's `OnStart` entry node.
    pub fn on_start(&self) -> Option<&Node> {
        self.find_by_kind(NodeKind::OnStart)
    }

    /// The graph's `OnUpdate` entry node.
    pub fn on_update(&self) -> Option<&Node> {
        self.find_by_kind(NodeKind::OnUpdate)
    }

    /// All `OnKeyEvent` entry nodes.
    pub fn key_event_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .filter(|n| n.kind == NodeKind::OnKeyEvent)
    }

    // --- links ---

    /// Link two pins, normalizing argument order so either may be the
    /// output side.
    ///
    /// Realizes "one producer per data input, one successor per exec
    /// output": a previous link into the destination, or out of an exec
    /// source, is silently replaced.
    pub fn add_link(&mut self, a: PinId, b: PinId) -> Result<LinkId, GraphError> {
        let pin_a = self.pin(a).ok_or(GraphError::PinNotFound(a))?;
        let pin_b = self.pin(b).ok_or(GraphError::PinNotFound(b))?;
        if !can_be_linked(pin_a, pin_b) {
            return Err(GraphError::IncompatiblePins);
        }
        let (from, to) = if pin_a.direction == PinDirection::Output {
            (a, b)
        } else {
            (b, a)
        };
        let to_pin = self.pin(to).expect("validated above");
        if to_pin.constant.is_some() {
            return Err(GraphError::PinIsConstant(to));
        }
        let is_exec_link = to_pin.is_exec();

        // One incoming link per input pin.
        if let Some(old) = self.link_into(to).map(|l| l.id) {
            self.links.shift_remove(&old);
        }
        // One outgoing link per exec output pin.
        if is_exec_link {
            let old = self.links_from(from).next().map(|l| l.id);
            if let Some(old) = old {
                self.links.shift_remove(&old);
            }
        }

        let link = Link::new(from, to);
        let id = link.id;
        self.links.insert(id, link);
        Ok(id)
    }

    /// Re-insert a previously removed link verbatim (undo path).
    pub fn restore_link(&mut self, link: Link) -> Result<(), GraphError> {
        if self.pin(link.from).is_none() {
            return Err(GraphError::PinNotFound(link.from));
        }
        if self.pin(link.to).is_none() {
            return Err(GraphError::PinNotFound(link.to));
        }
        self.links.insert(link.id, link);
        Ok(())
    }

    /// Remove a link by ID.
    pub fn remove_link(&mut self, id: LinkId) -> Result<Link, GraphError> {
        self.links
            .shift_remove(&id)
            .ok_or(GraphError::LinkNotFound(id))
    }

    /// Remove every link touching any pin of the given node.
    pub fn remove_all_links(&mut self, node: NodeId) -> Result<Vec<Link>, GraphError> {
        let node_ref = self.nodes.get(&node).ok_or(GraphError::NodeNotFound(node))?;
        let pin_ids: Vec<PinId> = node_ref.all_pins().map(|p| p.id).collect();
        let mut removed = Vec::new();
        self.links.retain(|_, link| {
            if pin_ids.iter().any(|p| link.involves_pin(*p)) {
                removed.push(link.clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    /// Get a link by ID.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// All links in insertion order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// The link feeding an input pin, if any.
    pub fn link_into(&self, pin: PinId) -> Option<&Link> {
        self.links.values().find(|l| l.to == pin)
    }

    /// Links originating from an output pin.
    pub fn links_from(&self, pin: PinId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.from == pin)
    }

    /// The output pin feeding an input pin, if linked.
    pub fn output_feeding(&self, input: PinId) -> Option<PinId> {
        self.link_into(input).map(|l| l.from)
    }

    // --- pins ---

    /// A pin by ID, via the incremental owner index.
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        let owner = self.pin_owners.get(&id)?;
        self.nodes.get(owner)?.pin(id)
    }

    /// A mutable pin by ID.
    pub fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        let owner = *self.pin_owners.get(&id)?;
        self.nodes.get_mut(&owner)?.pin_mut(id)
    }

    /// The node owning a pin.
    pub fn pin_owner(&self, id: PinId) -> Option<NodeId> {
        self.pin_owners.get(&id).copied()
    }

    /// Whether a pin is a user-added (removable) custom pin.
    pub fn is_custom_pin(&self, id: PinId) -> bool {
        self.pin_owners
            .get(&id)
            .and_then(|owner| self.nodes.get(owner))
            .is_some_and(|n| n.custom_pins.iter().any(|p| p.id == id))
    }

    /// Add a custom pin to an extensible node.
    pub fn add_custom_pin(&mut self, node: NodeId, pin: Pin) -> Result<PinId, GraphError> {
        let node_ref = self.nodes.get_mut(&node).ok_or(GraphError::NodeNotFound(node))?;
        if !node_ref.kind.is_extensible() {
            return Err(GraphError::NotExtensible(node));
        }
        let id = pin.id;
        node_ref.custom_pins.push(pin);
        self.pin_owners.insert(id, node);
        Ok(id)
    }

    /// Remove a custom pin, severing its links first.
    ///
    /// Fixed pins are part of the node layout and are rejected.
    pub fn remove_pin(&mut self, id: PinId) -> Result<Pin, GraphError> {
        let owner = *self.pin_owners.get(&id).ok_or(GraphError::PinNotFound(id))?;
        if !self.is_custom_pin(id) {
            return Err(GraphError::FixedPinNotRemovable(id));
        }
        self.links.retain(|_, link| !link.involves_pin(id));
        self.pin_owners.remove(&id);
        let node = self.nodes.get_mut(&owner).expect("owner indexed");
        let index = node
            .custom_pins
            .iter()
            .position(|p| p.id == id)
            .expect("custom pin present");
        Ok(node.custom_pins.remove(index))
    }

    /// Remove every custom pin of a node (links severed first).
    pub fn remove_all_custom_pins(&mut self, node: NodeId) -> Result<Vec<Pin>, GraphError> {
        let node_ref = self.nodes.get(&node).ok_or(GraphError::NodeNotFound(node))?;
        let ids: Vec<PinId> = node_ref.custom_pins.iter().map(|p| p.id).collect();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            removed.push(self.remove_pin(id)?);
        }
        Ok(removed)
    }

    // --- positions ---

    /// Canvas position of a node.
    pub fn position(&self, node: NodeId) -> Option<[f32; 2]> {
        self.positions.get(&node).copied()
    }

    /// Set the canvas position of a node.
    pub fn set_position(&mut self, node: NodeId, position: [f32; 2]) {
        self.positions.insert(node, position);
    }

    /// Highest raw ID used by any node, pin or link in this graph.
    pub fn highest_id(&self) -> u64 {
        let node_max = self.nodes.keys().map(|id| id.0).max().unwrap_or(0);
        let pin_max = self.pin_owners.keys().map(|id| id.0).max().unwrap_or(0);
        let link_max = self.links.keys().map(|id| id.0).max().unwrap_or(0);
        node_max.max(pin_max).max(link_max)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
