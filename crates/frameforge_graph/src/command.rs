// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor commands for deferred execution and undo support.
//!
//! The presentation layer enqueues commands while it is mid-iteration
//! over the graph; the queue flushes them at a defined point per frame,
//! pushing each executed command onto a LIFO history stack. Undo is a
//! deferred request serviced at the same flush point. Commands flagged
//! [`UndoPolicy::SkipUndo`] (copy) are discarded from the top of the
//! stack without blocking the undo of the action before them.

use crate::graph::{Graph, GraphError};
use crate::ident::{LinkId, NodeId, PinId};
use crate::link::Link;
use crate::node::Node;
use crate::pin::{Pin, PinDirection, PinValue};
use std::collections::VecDeque;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Structural graph error (stale ID, incompatible pins, ...).
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Paste requested with nothing on the clipboard.
    #[error("clipboard is empty")]
    EmptyClipboard,

    /// Invalid operation.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Whether a command participates in undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoPolicy {
    /// Pushed to history; undone by popping.
    #[default]
    Undoable,
    /// Discarded when encountered on the top of the history stack.
    SkipUndo,
}

/// Clipboard state shared between copy and paste commands.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    /// IDs of the nodes captured by the last copy.
    pub nodes: Vec<NodeId>,
    /// Centroid of their canvas positions at copy time.
    pub centroid: [f32; 2],
}

/// Shared state commands communicate through.
#[derive(Debug, Default)]
pub struct CommandContext {
    /// Last copied selection, if any.
    pub clipboard: Option<Clipboard>,
}

/// Trait for graph edit commands that can be undone.
pub trait GraphCommand: std::fmt::Debug {
    /// Human-readable description (menus, history UI).
    fn description(&self) -> &'static str;

    /// Execute against the graph.
    fn execute(&mut self, ctx: &mut CommandContext, graph: &mut Graph)
        -> Result<(), CommandError>;

    /// Reverse the command's effect.
    fn undo(&mut self, ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError>;

    /// Whether this command participates in undo history.
    fn undo_policy(&self) -> UndoPolicy {
        UndoPolicy::Undoable
    }
}

/// Deferred command queue plus LIFO undo history.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: VecDeque<Box<dyn GraphCommand>>,
    history: Vec<Box<dyn GraphCommand>>,
    undo_requested: bool,
}

impl CommandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a command for the next flush.
    pub fn submit(&mut self, command: Box<dyn GraphCommand>) {
        self.pending.push_back(command);
    }

    /// Request that one undo step be performed at the next flush.
    pub fn request_undo(&mut self) {
        self.undo_requested = true;
    }

    /// Number of commands awaiting execution.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether any undoable history exists.
    pub fn can_undo(&self) -> bool {
        self.history
            .iter()
            .any(|c| c.undo_policy() == UndoPolicy::Undoable)
    }

    /// Execute all pending commands, then service an undo request.
    ///
    /// Failed commands are refused (not pushed to history); every error
    /// is collected so the caller can surface all of them.
    pub fn flush(&mut self, ctx: &mut CommandContext, graph: &mut Graph) -> Vec<CommandError> {
        let mut errors = Vec::new();
        while let Some(mut command) = self.pending.pop_front() {
            match command.execute(ctx, graph) {
                Ok(()) => self.history.push(command),
                Err(err) => {
                    tracing::warn!("command '{}' refused: {err}", command.description());
                    errors.push(err);
                }
            }
        }
        if self.undo_requested {
            self.undo_requested = false;
            // Skip-undo entries are discarded, never undone.
            while let Some(top) = self.history.last() {
                if top.undo_policy() == UndoPolicy::SkipUndo {
                    self.history.pop();
                } else {
                    break;
                }
            }
            if let Some(mut command) = self.history.pop() {
                if let Err(err) = command.undo(ctx, graph) {
                    tracing::warn!("undo of '{}' failed: {err}", command.description());
                    errors.push(err);
                }
            }
        }
        errors
    }
}

// --- commands ---

/// Add a node at a canvas position.
#[derive(Debug)]
pub struct AddNodeCommand {
    node: Node,
    position: [f32; 2],
}

impl AddNodeCommand {
    /// Create the command; the node is inserted verbatim on execute.
    pub fn new(node: Node, position: [f32; 2]) -> Self {
        Self { node, position }
    }

    /// ID the node will have once executed.
    pub fn node_id(&self) -> NodeId {
        self.node.id
    }
}

impl GraphCommand for AddNodeCommand {
    fn description(&self) -> &'static str {
        "Add Node"
    }

    fn execute(
        &mut self,
        _ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        let id = graph.add_node(self.node.clone())?;
        graph.set_position(id, self.position);
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError> {
        graph.remove_node(self.node.id)?;
        Ok(())
    }
}

/// Link two pins.
#[derive(Debug)]
pub struct AddLinkCommand {
    a: PinId,
    b: PinId,
    created: Option<LinkId>,
    /// Links the replace semantics displaced; restored on undo.
    displaced: Vec<Link>,
}

impl AddLinkCommand {
    /// Create the command; argument order does not matter.
    pub fn new(a: PinId, b: PinId) -> Self {
        Self {
            a,
            b,
            created: None,
            displaced: Vec::new(),
        }
    }
}

impl GraphCommand for AddLinkCommand {
    fn description(&self) -> &'static str {
        "Add Link"
    }

    fn execute(
        &mut self,
        _ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        // Back up whatever the replace semantics will displace.
        let (from, to) = {
            let pin_a = graph.pin(self.a).ok_or(GraphError::PinNotFound(self.a))?;
            if pin_a.direction == PinDirection::Output {
                (self.a, self.b)
            } else {
                (self.b, self.a)
            }
        };
        self.displaced.clear();
        if let Some(link) = graph.link_into(to) {
            self.displaced.push(link.clone());
        }
        if graph.pin(to).is_some_and(Pin::is_exec) {
            if let Some(link) = graph.links_from(from).next() {
                self.displaced.push(link.clone());
            }
        }
        self.created = Some(graph.add_link(self.a, self.b)?);
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError> {
        if let Some(id) = self.created.take() {
            graph.remove_link(id)?;
        }
        for link in self.displaced.drain(..) {
            graph.restore_link(link)?;
        }
        Ok(())
    }
}

/// Remove a link by ID.
#[derive(Debug)]
pub struct RemoveLinkCommand {
    id: LinkId,
    backup: Option<Link>,
}

impl RemoveLinkCommand {
    /// Create the command.
    pub fn new(id: LinkId) -> Self {
        Self { id, backup: None }
    }
}

impl GraphCommand for RemoveLinkCommand {
    fn description(&self) -> &'static str {
        "Remove Link"
    }

    fn execute(
        &mut self,
        _ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        self.backup = Some(graph.remove_link(self.id)?);
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError> {
        let link = self
            .backup
            .take()
            .ok_or_else(|| CommandError::InvalidOperation("undo before execute".into()))?;
        graph.restore_link(link)?;
        Ok(())
    }
}

/// Add a custom pin to an extensible node.
#[derive(Debug)]
pub struct AddPinCommand {
    node: NodeId,
    pin: Pin,
}

impl AddPinCommand {
    /// Create the command with a prebuilt pin.
    pub fn new(node: NodeId, pin: Pin) -> Self {
        Self { node, pin }
    }
}

impl GraphCommand for AddPinCommand {
    fn description(&self) -> &'static str {
        "Add Pin"
    }

    fn execute(
        &mut self,
        _ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        graph.add_custom_pin(self.node, self.pin.clone())?;
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError> {
        graph.remove_pin(self.pin.id)?;
        Ok(())
    }
}

/// Remove a custom pin (fixed pins are refused by the store).
#[derive(Debug)]
pub struct RemovePinCommand {
    pin: PinId,
    backup: Option<(NodeId, Pin)>,
    links: Vec<Link>,
}

impl RemovePinCommand {
    /// Create the command.
    pub fn new(pin: PinId) -> Self {
        Self {
            pin,
            backup: None,
            links: Vec::new(),
        }
    }
}

impl GraphCommand for RemovePinCommand {
    fn description(&self) -> &'static str {
        "Remove Pin"
    }

    fn execute(
        &mut self,
        _ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        let owner = graph
            .pin_owner(self.pin)
            .ok_or(GraphError::PinNotFound(self.pin))?;
        self.links = graph
            .links()
            .filter(|l| l.involves_pin(self.pin))
            .cloned()
            .collect();
        let pin = graph.remove_pin(self.pin)?;
        self.backup = Some((owner, pin));
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError> {
        let (owner, pin) = self
            .backup
            .take()
            .ok_or_else(|| CommandError::InvalidOperation("undo before execute".into()))?;
        graph.add_custom_pin(owner, pin)?;
        for link in self.links.drain(..) {
            graph.restore_link(link)?;
        }
        Ok(())
    }
}

/// Remove a selection of nodes.
///
/// Undo re-adds clones at their original positions; links that existed
/// between the removed nodes are not restored. That loss is a known
/// limitation of the backup shape, kept as-is.
#[derive(Debug)]
pub struct RemoveSelectedNodesCommand {
    selected: Vec<NodeId>,
    backups: Vec<(Node, [f32; 2])>,
}

impl RemoveSelectedNodesCommand {
    /// Create the command.
    pub fn new(selected: Vec<NodeId>) -> Self {
        Self {
            selected,
            backups: Vec::new(),
        }
    }
}

impl GraphCommand for RemoveSelectedNodesCommand {
    fn description(&self) -> &'static str {
        "Remove Nodes"
    }

    fn execute(
        &mut self,
        _ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        self.backups.clear();
        for id in &self.selected {
            let node = graph.node(*id).ok_or(GraphError::NodeNotFound(*id))?;
            if node.kind.is_entry() && !matches!(node.kind, crate::node::NodeKind::OnKeyEvent) {
                continue;
            }
            let position = graph.position(*id).unwrap_or([0.0, 0.0]);
            self.backups.push((node.clone(), position));
            graph.remove_node(*id)?;
        }
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError> {
        for (node, position) in self.backups.drain(..) {
            let id = graph.add_node(node)?;
            graph.set_position(id, position);
        }
        Ok(())
    }
}

/// Capture the selected nodes onto the clipboard.
///
/// Explicitly non-undoable: it has no inverse and must not block the
/// undo of the action before it.
#[derive(Debug)]
pub struct CopySelectedNodesCommand {
    selected: Vec<NodeId>,
}

impl CopySelectedNodesCommand {
    /// Create the command.
    pub fn new(selected: Vec<NodeId>) -> Self {
        Self { selected }
    }
}

impl GraphCommand for CopySelectedNodesCommand {
    fn description(&self) -> &'static str {
        "Copy Nodes"
    }

    fn undo_policy(&self) -> UndoPolicy {
        UndoPolicy::SkipUndo
    }

    fn execute(
        &mut self,
        ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        let mut nodes = Vec::new();
        let mut sum = [0.0f32, 0.0f32];
        for id in &self.selected {
            let node = graph.node(*id).ok_or(GraphError::NodeNotFound(*id))?;
            // Entry nodes cannot be duplicated.
            if matches!(
                node.kind,
                crate::node::NodeKind::OnStart | crate::node::NodeKind::OnUpdate
            ) {
                continue;
            }
            let position = graph.position(*id).unwrap_or([0.0, 0.0]);
            sum[0] += position[0];
            sum[1] += position[1];
            nodes.push(*id);
        }
        if nodes.is_empty() {
            return Err(CommandError::InvalidOperation(
                "nothing copyable selected".into(),
            ));
        }
        let count = nodes.len() as f32;
        ctx.clipboard = Some(Clipboard {
            nodes,
            centroid: [sum[0] / count, sum[1] / count],
        });
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, _graph: &mut Graph) -> Result<(), CommandError> {
        Ok(())
    }
}

/// Paste the last-copied set at a cursor position.
///
/// Clones each surviving copied node with fresh node and pin IDs,
/// offsets positions by the centroid-to-cursor delta, and re-creates
/// only the links whose both endpoints were inside the copied set.
#[derive(Debug)]
pub struct PasteNodesCommand {
    cursor: [f32; 2],
    pasted: Vec<NodeId>,
}

impl PasteNodesCommand {
    /// Create the command.
    pub fn new(cursor: [f32; 2]) -> Self {
        Self {
            cursor,
            pasted: Vec::new(),
        }
    }

    /// IDs created by the paste (valid after execute).
    pub fn pasted(&self) -> &[NodeId] {
        &self.pasted
    }
}

impl GraphCommand for PasteNodesCommand {
    fn description(&self) -> &'static str {
        "Paste Nodes"
    }

    fn execute(
        &mut self,
        ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        let clipboard = ctx.clipboard.clone().ok_or(CommandError::EmptyClipboard)?;
        let offset = [
            self.cursor[0] - clipboard.centroid[0],
            self.cursor[1] - clipboard.centroid[1],
        ];

        let mut pin_remap: std::collections::HashMap<PinId, PinId> =
            std::collections::HashMap::new();
        self.pasted.clear();
        for id in &clipboard.nodes {
            // Nodes deleted since the copy are skipped.
            let Some(original) = graph.node(*id) else {
                continue;
            };
            let mut clone = original.clone();
            clone.id = NodeId::new();
            for pin in clone.all_pins_mut() {
                let fresh = PinId::new();
                pin_remap.insert(pin.id, fresh);
                pin.id = fresh;
            }
            let position = graph.position(*id).unwrap_or([0.0, 0.0]);
            let new_id = graph.add_node(clone)?;
            graph.set_position(new_id, [position[0] + offset[0], position[1] + offset[1]]);
            self.pasted.push(new_id);
        }

        // Cross-boundary links are intentionally dropped.
        let internal: Vec<(PinId, PinId)> = graph
            .links()
            .filter_map(|l| {
                let from = pin_remap.get(&l.from)?;
                let to = pin_remap.get(&l.to)?;
                Some((*from, *to))
            })
            .collect();
        for (from, to) in internal {
            graph.add_link(from, to)?;
        }
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError> {
        for id in self.pasted.drain(..) {
            graph.remove_node(id)?;
        }
        Ok(())
    }
}

/// Toggle an input pin from link-driven to literal-driven.
#[derive(Debug)]
pub struct MakePinConstantCommand {
    pin: PinId,
    value: PinValue,
    removed_link: Option<Link>,
}

impl MakePinConstantCommand {
    /// Create the command with the literal to install.
    pub fn new(pin: PinId, value: PinValue) -> Self {
        Self {
            pin,
            value,
            removed_link: None,
        }
    }
}

impl GraphCommand for MakePinConstantCommand {
    fn description(&self) -> &'static str {
        "Make Pin Constant"
    }

    fn execute(
        &mut self,
        _ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        {
            let pin = graph.pin(self.pin).ok_or(GraphError::PinNotFound(self.pin))?;
            if pin.direction != PinDirection::Input {
                return Err(CommandError::InvalidOperation(
                    "only input pins take constants".into(),
                ));
            }
            if pin.pin_type != crate::pin::PinType::Any
                && self.value.pin_type() != pin.pin_type
            {
                return Err(CommandError::InvalidOperation(format!(
                    "literal type {:?} does not match pin type {:?}",
                    self.value.pin_type(),
                    pin.pin_type
                )));
            }
        }
        // Constants win over links: sever the producer first.
        if let Some(link) = graph.link_into(self.pin).map(|l| l.id) {
            self.removed_link = Some(graph.remove_link(link)?);
        }
        let pin = graph.pin_mut(self.pin).expect("checked above");
        pin.constant = Some(self.value.clone());
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError> {
        let pin = graph
            .pin_mut(self.pin)
            .ok_or(GraphError::PinNotFound(self.pin))?;
        pin.constant = None;
        if let Some(link) = self.removed_link.take() {
            graph.restore_link(link)?;
        }
        Ok(())
    }
}

/// Toggle an input pin from literal-driven back to link-driven.
#[derive(Debug)]
pub struct MakeConstantToPinCommand {
    pin: PinId,
    removed: Option<PinValue>,
}

impl MakeConstantToPinCommand {
    /// Create the command.
    pub fn new(pin: PinId) -> Self {
        Self { pin, removed: None }
    }
}

impl GraphCommand for MakeConstantToPinCommand {
    fn description(&self) -> &'static str {
        "Make Constant To Pin"
    }

    fn execute(
        &mut self,
        _ctx: &mut CommandContext,
        graph: &mut Graph,
    ) -> Result<(), CommandError> {
        let pin = graph
            .pin_mut(self.pin)
            .ok_or(GraphError::PinNotFound(self.pin))?;
        self.removed = pin.constant.take();
        if self.removed.is_none() {
            return Err(CommandError::InvalidOperation(
                "pin carries no constant".into(),
            ));
        }
        Ok(())
    }

    fn undo(&mut self, _ctx: &mut CommandContext, graph: &mut Graph) -> Result<(), CommandError> {
        let pin = graph
            .pin_mut(self.pin)
            .ok_or(GraphError::PinNotFound(self.pin))?;
        pin.constant = self.removed.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ArithmeticOp, NodeKind};
    use crate::pin::PinType;

    fn flush_ok(queue: &mut CommandQueue, ctx: &mut CommandContext, graph: &mut Graph) {
        let errors = queue.flush(ctx, graph);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    fn graph_signature(graph: &Graph) -> (Vec<NodeId>, Vec<LinkId>, Vec<(PinId, Option<PinValue>)>) {
        let mut nodes: Vec<NodeId> = graph.node_ids().collect();
        nodes.sort();
        let mut links: Vec<LinkId> = graph.links().map(|l| l.id).collect();
        links.sort();
        let mut pins: Vec<(PinId, Option<PinValue>)> = graph
            .nodes()
            .flat_map(|n| n.all_pins().map(|p| (p.id, p.constant.clone())))
            .collect();
        pins.sort_by_key(|(id, _)| *id);
        (nodes, links, pins)
    }

    #[test]
    fn test_commands_are_deferred_until_flush() {
        let mut graph = Graph::with_entry_nodes();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        queue.submit(Box::new(AddNodeCommand::new(
            Node::create(NodeKind::Float),
            [10.0, 20.0],
        )));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(queue.pending_count(), 1);

        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_add_node_round_trip() {
        let mut graph = Graph::with_entry_nodes();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();
        let before = graph_signature(&graph);

        queue.submit(Box::new(AddNodeCommand::new(
            Node::create(NodeKind::Float),
            [0.0, 0.0],
        )));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        queue.request_undo();
        flush_ok(&mut queue, &mut ctx, &mut graph);

        assert_eq!(graph_signature(&graph), before);
    }

    #[test]
    fn test_add_link_round_trip_restores_displaced_link() {
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        let a = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let b = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let op = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        let into = graph.node(op).unwrap().input_at(0).unwrap().id;
        graph.pin_mut(into).unwrap().constant = None;
        let out_a = graph.node(a).unwrap().output_at(0).unwrap().id;
        let out_b = graph.node(b).unwrap().output_at(0).unwrap().id;
        graph.add_link(out_a, into).unwrap();
        let before = graph_signature(&graph);

        queue.submit(Box::new(AddLinkCommand::new(out_b, into)));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph.output_feeding(into), Some(out_b));

        queue.request_undo();
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph_signature(&graph), before);
        assert_eq!(graph.output_feeding(into), Some(out_a));
    }

    #[test]
    fn test_remove_link_round_trip() {
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        let a = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let op = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        let into = graph.node(op).unwrap().input_at(0).unwrap().id;
        graph.pin_mut(into).unwrap().constant = None;
        let out = graph.node(a).unwrap().output_at(0).unwrap().id;
        let link = graph.add_link(out, into).unwrap();
        let before = graph_signature(&graph);

        queue.submit(Box::new(RemoveLinkCommand::new(link)));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph.link_count(), 0);

        queue.request_undo();
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph_signature(&graph), before);
    }

    #[test]
    fn test_make_pin_constant_round_trip() {
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        let a = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let op = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        let into = graph.node(op).unwrap().input_at(0).unwrap().id;
        graph.pin_mut(into).unwrap().constant = None;
        let out = graph.node(a).unwrap().output_at(0).unwrap().id;
        graph.add_link(out, into).unwrap();
        let before = graph_signature(&graph);

        queue.submit(Box::new(MakePinConstantCommand::new(
            into,
            PinValue::Float(2.5),
        )));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph.link_count(), 0);
        assert_eq!(
            graph.pin(into).unwrap().constant,
            Some(PinValue::Float(2.5))
        );

        queue.request_undo();
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph_signature(&graph), before);
    }

    #[test]
    fn test_make_constant_to_pin_round_trip() {
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        let op = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        // Operator inputs are literal-driven out of the box.
        let into = graph.node(op).unwrap().input_at(0).unwrap().id;
        assert!(graph.pin(into).unwrap().constant.is_some());
        let before = graph_signature(&graph);

        queue.submit(Box::new(MakeConstantToPinCommand::new(into)));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert!(graph.pin(into).unwrap().constant.is_none());

        queue.request_undo();
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph_signature(&graph), before);
    }

    #[test]
    fn test_make_constant_to_pin_refused_without_constant() {
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        let op = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        let into = graph.node(op).unwrap().input_at(0).unwrap().id;
        graph.pin_mut(into).unwrap().constant = None;

        queue.submit(Box::new(MakeConstantToPinCommand::new(into)));
        let errors = queue.flush(&mut ctx, &mut graph);
        assert_eq!(errors.len(), 1);
        assert!(!queue.can_undo());
    }

    #[test]
    fn test_add_remove_pin_round_trip_on_bind_table() {
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        let table = graph.add_node(Node::create(NodeKind::BindTable)).unwrap();
        let tex = graph.add_node(Node::create(NodeKind::LoadTexture)).unwrap();
        let tex_out = graph.node(tex).unwrap().output_at(0).unwrap().id;

        let pin = Pin::input("Albedo", PinType::Texture);
        let pin_id = pin.id;
        queue.submit(Box::new(AddPinCommand::new(table, pin)));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        graph.add_link(tex_out, pin_id).unwrap();
        let before = graph_signature(&graph);

        queue.submit(Box::new(RemovePinCommand::new(pin_id)));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert!(graph.pin(pin_id).is_none());
        assert_eq!(graph.link_count(), 0);

        // Undo restores the pin and the link it carried.
        queue.request_undo();
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph_signature(&graph), before);
        assert_eq!(graph.output_feeding(pin_id), Some(tex_out));

        // A second undo reverses the add as well, severing the link.
        queue.request_undo();
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert!(graph.pin(pin_id).is_none());
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_constant_type_mismatch_refused() {
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();
        let op = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        let into = graph.node(op).unwrap().input_at(0).unwrap().id;
        graph.pin_mut(into).unwrap().constant = None;

        queue.submit(Box::new(MakePinConstantCommand::new(
            into,
            PinValue::String("nope".into()),
        )));
        let errors = queue.flush(&mut ctx, &mut graph);
        assert_eq!(errors.len(), 1);
        assert!(!queue.can_undo());
    }

    #[test]
    fn test_copy_does_not_block_undo() {
        let mut graph = Graph::with_entry_nodes();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        queue.submit(Box::new(AddNodeCommand::new(
            Node::create(NodeKind::Float),
            [0.0, 0.0],
        )));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        let float_id = graph.find_by_kind(NodeKind::Float).unwrap().id;

        queue.submit(Box::new(CopySelectedNodesCommand::new(vec![float_id])));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert!(ctx.clipboard.is_some());

        // Undo skips the copy and removes the added node.
        queue.request_undo();
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert!(graph.find_by_kind(NodeKind::Float).is_none());
    }

    #[test]
    fn test_copy_paste_preserves_internal_links_only() {
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        let a = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let b = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        let outside = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        graph.set_position(a, [0.0, 0.0]);
        graph.set_position(b, [100.0, 0.0]);

        let a_out = graph.node(a).unwrap().output_at(0).unwrap().id;
        let b_lhs = graph.node(b).unwrap().input_at(0).unwrap().id;
        let b_rhs = graph.node(b).unwrap().input_at(1).unwrap().id;
        graph.pin_mut(b_lhs).unwrap().constant = None;
        graph.pin_mut(b_rhs).unwrap().constant = None;
        graph.add_link(a_out, b_lhs).unwrap();
        // Cross-boundary link: outside node into the copied operator.
        let outside_out = graph.node(outside).unwrap().output_at(0).unwrap().id;
        graph.add_link(outside_out, b_rhs).unwrap();

        queue.submit(Box::new(CopySelectedNodesCommand::new(vec![a, b])));
        let paste = Box::new(PasteNodesCommand::new([500.0, 500.0]));
        queue.submit(paste);
        flush_ok(&mut queue, &mut ctx, &mut graph);

        assert_eq!(graph.node_count(), 5);
        let new_ids: Vec<NodeId> = graph
            .node_ids()
            .filter(|id| *id != a && *id != b && *id != outside)
            .collect();
        assert_eq!(new_ids.len(), 2);

        // One new internal link between the copies; no new link touches
        // the originals or the outside node.
        assert_eq!(graph.link_count(), 3);
        let new_pins: Vec<PinId> = new_ids
            .iter()
            .flat_map(|id| graph.node(*id).unwrap().all_pins().map(|p| p.id))
            .collect();
        let internal_new = graph
            .links()
            .filter(|l| new_pins.contains(&l.from) && new_pins.contains(&l.to))
            .count();
        assert_eq!(internal_new, 1);

        // Positions keep the copied layout's relative offset.
        let positions: Vec<[f32; 2]> = new_ids
            .iter()
            .map(|id| graph.position(*id).unwrap())
            .collect();
        let dx = (positions[0][0] - positions[1][0]).abs();
        assert!((dx - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_remove_selected_nodes_loses_internal_links() {
        // The backup shape only captures nodes and positions; links
        // between removed nodes do not survive an undo.
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        let a = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let b = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        let a_out = graph.node(a).unwrap().output_at(0).unwrap().id;
        let b_lhs = graph.node(b).unwrap().input_at(0).unwrap().id;
        graph.pin_mut(b_lhs).unwrap().constant = None;
        graph.add_link(a_out, b_lhs).unwrap();

        queue.submit(Box::new(RemoveSelectedNodesCommand::new(vec![a, b])));
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert_eq!(graph.node_count(), 0);

        queue.request_undo();
        flush_ok(&mut queue, &mut ctx, &mut graph);
        assert!(graph.node(a).is_some());
        assert!(graph.node(b).is_some());
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_stale_id_refused_with_typed_error() {
        let mut graph = Graph::new();
        let mut ctx = CommandContext::default();
        let mut queue = CommandQueue::new();

        queue.submit(Box::new(RemoveLinkCommand::new(LinkId::new())));
        let errors = queue.flush(&mut ctx, &mut graph);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            CommandError::Graph(GraphError::LinkNotFound(_))
        ));
    }
}
