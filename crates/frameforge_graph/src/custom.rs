// SPDX-License-Identifier: MIT OR Apache-2.0
//! User-authored custom nodes: named, reusable sub-graphs.
//!
//! A definition owns its sub-graph behind `Arc<RwLock<..>>` so every
//! instance placed in any parent graph shares the one edited body; the
//! instance node itself is a thin wrapper cloned per placement.

use crate::ident::{CustomNodeId, NodeId};
use crate::node::{Node, NodeKind};
use crate::pin::{Pin, PinDirection, PinType};
use crate::Graph;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One boundary pin of a custom node: the placeholder node inside the
/// sub-graph and the face pin it exposes on instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryBinding {
    /// Placeholder node inside the sub-graph.
    pub placeholder: NodeId,
    /// Label of the face pin.
    pub label: String,
    /// Type of the face pin.
    pub pin_type: PinType,
}

/// A custom node definition: name, shared sub-graph, boundary bindings.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomNodeDef {
    /// Stable definition ID.
    pub id: CustomNodeId,
    /// User-chosen name.
    pub name: String,
    /// The sub-graph body, shared by all instances.
    pub graph: Arc<RwLock<Graph>>,
    /// Input boundary bindings, in face-pin order.
    pub inputs: Vec<BoundaryBinding>,
    /// Output boundary bindings, in face-pin order.
    pub outputs: Vec<BoundaryBinding>,
}

impl CustomNodeDef {
    /// Create an empty definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CustomNodeId::new(),
            name: name.into(),
            graph: Arc::new(RwLock::new(Graph::new())),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Add an input boundary: places a placeholder node in the sub-graph
    /// and exposes an input pin on every instance's face.
    pub fn add_input(&mut self, label: &str, pin_type: PinType) -> NodeId {
        let placeholder = Node::pin_placeholder(PinDirection::Input, pin_type, label);
        let id = placeholder.id;
        self.graph
            .write()
            .add_node(placeholder)
            .expect("placeholders are never entry nodes");
        self.inputs.push(BoundaryBinding {
            placeholder: id,
            label: label.to_string(),
            pin_type,
        });
        id
    }

    /// Add an output boundary.
    pub fn add_output(&mut self, label: &str, pin_type: PinType) -> NodeId {
        let placeholder = Node::pin_placeholder(PinDirection::Output, pin_type, label);
        let id = placeholder.id;
        self.graph
            .write()
            .add_node(placeholder)
            .expect("placeholders are never entry nodes");
        self.outputs.push(BoundaryBinding {
            placeholder: id,
            label: label.to_string(),
            pin_type,
        });
        id
    }

    /// Build an instance node exposing the boundary pins, in order.
    pub fn instantiate(&self) -> Node {
        let mut pins = Vec::with_capacity(self.inputs.len() + self.outputs.len());
        for binding in &self.inputs {
            pins.push(Pin::input_with_default(binding.label.clone(), binding.pin_type));
        }
        for binding in &self.outputs {
            pins.push(Pin::output(binding.label.clone(), binding.pin_type));
        }
        Node {
            id: NodeId::new(),
            kind: NodeKind::CustomInstance(self.id),
            label: self.name.clone(),
            pins,
            custom_pins: Vec::new(),
        }
    }

    /// Index of an input boundary by its placeholder node.
    pub fn input_index_of(&self, placeholder: NodeId) -> Option<usize> {
        self.inputs.iter().position(|b| b.placeholder == placeholder)
    }

    /// Index of an output boundary by its placeholder node.
    pub fn output_index_of(&self, placeholder: NodeId) -> Option<usize> {
        self.outputs.iter().position(|b| b.placeholder == placeholder)
    }
}

/// Registry of custom node definitions, keyed by stable ID.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CustomNodeRegistry {
    defs: IndexMap<CustomNodeId, Arc<CustomNodeDef>>,
}

impl CustomNodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition.
    pub fn register(&mut self, def: CustomNodeDef) -> CustomNodeId {
        let id = def.id;
        self.defs.insert(id, Arc::new(def));
        id
    }

    /// Get a definition by ID.
    pub fn get(&self, id: CustomNodeId) -> Option<&Arc<CustomNodeDef>> {
        self.defs.get(&id)
    }

    /// Build an instance node of a registered definition.
    pub fn instantiate(&self, id: CustomNodeId) -> Option<Node> {
        self.defs.get(&id).map(|def| def.instantiate())
    }

    /// All definitions, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CustomNodeDef>> {
        self.defs.values()
    }

    /// Highest raw ID used by any definition or its sub-graph contents.
    pub fn highest_id(&self) -> u64 {
        self.defs
            .values()
            .map(|def| def.id.0.max(def.graph.read().highest_id()))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_pins_mirror_boundary_order() {
        let mut def = CustomNodeDef::new("Scale And Offset");
        def.add_input("Value", PinType::Float);
        def.add_input("Scale", PinType::Float);
        def.add_output("Result", PinType::Float);

        let instance = def.instantiate();
        let inputs: Vec<_> = instance.inputs().collect();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].label, "Value");
        assert_eq!(inputs[1].label, "Scale");
        assert_eq!(instance.outputs().count(), 1);
        assert!(matches!(instance.kind, NodeKind::CustomInstance(id) if id == def.id));
    }

    #[test]
    fn test_instances_share_one_sub_graph() {
        let mut registry = CustomNodeRegistry::new();
        let mut def = CustomNodeDef::new("Body");
        def.add_output("Out", PinType::Float);
        let shared = Arc::clone(&def.graph);
        let id = registry.register(def);

        let _a = registry.instantiate(id).unwrap();
        let _b = registry.instantiate(id).unwrap();

        // Editing through the definition is visible via the shared handle.
        let node_count_before = shared.read().node_count();
        registry
            .get(id)
            .unwrap()
            .graph
            .write()
            .add_node(Node::create(crate::node::NodeKind::Float))
            .unwrap();
        assert_eq!(shared.read().node_count(), node_count_before + 1);
    }

    #[test]
    fn test_placeholder_index_lookup() {
        let mut def = CustomNodeDef::new("Body");
        let a = def.add_input("A", PinType::Float);
        let b = def.add_input("B", PinType::Float);
        let out = def.add_output("Out", PinType::Float);
        assert_eq!(def.input_index_of(a), Some(0));
        assert_eq!(def.input_index_of(b), Some(1));
        assert_eq!(def.output_index_of(out), Some(0));
        assert_eq!(def.output_index_of(a), None);
    }
}
