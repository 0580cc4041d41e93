// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin evaluation: lowering data pins to expression trees.
//!
//! The evaluator walks backwards from an input pin through constants,
//! links and custom-node boundaries, producing an [`Expr`] per pin.
//! It never aborts: every semantic problem is recorded as a
//! [`CompileError`] and replaced by a type-appropriate default constant
//! so one pass surfaces every problem in the graph.

use crate::error::CompileError;
use crate::expr::Expr;
use crate::runtime::delta_time_key;
use crate::value::Value;
use frameforge_graph::custom::{BoundaryBinding, CustomNodeRegistry};
use frameforge_graph::variable::{name_key, VariablePool};
use frameforge_graph::{CustomNodeId, Graph, NodeId, NodeKind, PinDirection, PinId, PinType};
use std::collections::HashMap;

/// Immutable snapshot compilation reads from.
///
/// Custom-node sub-graphs are cloned out of their shared locks up
/// front, so evaluation never takes a lock and the compile sees one
/// consistent state even if an editor keeps mutating definitions.
pub struct CompileSource<'a> {
    /// The root graph.
    pub graph: &'a Graph,
    /// The variable pool.
    pub variables: &'a VariablePool,
    subs: HashMap<CustomNodeId, SubGraphSnapshot>,
}

/// Cloned body and boundary bindings of one custom node definition.
pub struct SubGraphSnapshot {
    /// Sub-graph body.
    pub graph: Graph,
    /// Input boundaries, in face-pin order.
    pub inputs: Vec<BoundaryBinding>,
    /// Output boundaries, in face-pin order.
    pub outputs: Vec<BoundaryBinding>,
}

impl<'a> CompileSource<'a> {
    /// Snapshot a graph, its variables and every registered custom node.
    pub fn snapshot(
        graph: &'a Graph,
        variables: &'a VariablePool,
        registry: &CustomNodeRegistry,
    ) -> Self {
        let subs = registry
            .iter()
            .map(|def| {
                (
                    def.id,
                    SubGraphSnapshot {
                        graph: def.graph.read().clone(),
                        inputs: def.inputs.clone(),
                        outputs: def.outputs.clone(),
                    },
                )
            })
            .collect();
        Self {
            graph,
            variables,
            subs,
        }
    }

    /// Snapshot of a custom node definition.
    pub fn sub(&self, id: CustomNodeId) -> Option<&SubGraphSnapshot> {
        self.subs.get(&id)
    }
}

/// One level of custom-node inlining.
struct Frame {
    /// Definition whose sub-graph is being evaluated.
    def: CustomNodeId,
    /// Instance node in the parent graph.
    instance: NodeId,
}

/// Stack of custom-node frames; empty means the root graph.
#[derive(Default)]
pub struct Scope {
    frames: Vec<Frame>,
}

impl Scope {
    /// A scope positioned at the root graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn contains(&self, def: CustomNodeId) -> bool {
        self.frames.iter().any(|f| f.def == def)
    }
}

/// Lowers data pins to expressions, collecting errors as it goes.
pub struct Evaluator<'a> {
    source: &'a CompileSource<'a>,
    /// Problems found so far.
    pub errors: Vec<CompileError>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator over a snapshot.
    pub fn new(source: &'a CompileSource<'a>) -> Self {
        Self {
            source,
            errors: Vec::new(),
        }
    }

    /// Drain the collected errors.
    pub fn take_errors(&mut self) -> Vec<CompileError> {
        std::mem::take(&mut self.errors)
    }

    fn current_graph(&self, scope: &Scope) -> &'a Graph {
        match scope.frames.last() {
            Some(frame) => self
                .source
                .sub(frame.def)
                .map(|s| &s.graph)
                .unwrap_or(self.source.graph),
            None => self.source.graph,
        }
    }

    /// Lower the n-th data input of a node.
    pub fn eval_node_input(&mut self, scope: &mut Scope, node: NodeId, index: usize) -> Expr {
        let pin = self
            .current_graph(scope)
            .node(node)
            .and_then(|n| n.input_at(index))
            .map(|p| p.id);
        match pin {
            Some(pin) => self.eval_input(scope, pin),
            None => {
                self.errors
                    .push(CompileError::at(node, format!("node has no input {index}")));
                Expr::Const(Value::Bool(false))
            }
        }
    }

    /// Lower an input pin: constant wins, then the incoming link, then a
    /// default constant with a missing-link error.
    pub fn eval_input(&mut self, scope: &mut Scope, pin: PinId) -> Expr {
        let facts = {
            let graph = self.current_graph(scope);
            graph.pin(pin).map(|p| {
                (
                    p.constant.clone(),
                    p.pin_type,
                    p.label.clone(),
                    graph.output_feeding(pin),
                    graph.pin_owner(pin),
                )
            })
        };
        let Some((constant, pin_type, label, feeding, owner)) = facts else {
            self.errors
                .push(CompileError::general(format!("stale pin reference: {pin:?}")));
            return Expr::Const(Value::Bool(false));
        };
        if let Some(literal) = constant {
            return Expr::Const(Value::from_literal(&literal));
        }
        match feeding {
            Some(from) => self.eval_output(scope, from),
            None => {
                self.errors.push(CompileError {
                    message: format!("missing link on input '{label}'"),
                    node: owner,
                });
                Expr::Const(Value::default_for(pin_type))
            }
        }
    }

    /// Lower an output pin by dispatching on its producing node's kind.
    pub fn eval_output(&mut self, scope: &mut Scope, pin: PinId) -> Expr {
        let facts = {
            let graph = self.current_graph(scope);
            graph.pin_owner(pin).and_then(|owner| {
                let node = graph.node(owner)?;
                let out_index = node.outputs().position(|p| p.id == pin)?;
                let p = node.pin(pin)?;
                Some((owner, node.kind, out_index, p.pin_type, p.is_exec()))
            })
        };
        let Some((owner, kind, out_index, pin_type, is_exec)) = facts else {
            self.errors
                .push(CompileError::general(format!("stale pin reference: {pin:?}")));
            return Expr::Const(Value::Bool(false));
        };
        if is_exec {
            self.errors.push(CompileError::at(
                owner,
                "execution pin cannot be used as a value",
            ));
            return Expr::Const(Value::Bool(false));
        }

        match kind {
            // Constant nodes forward their (usually literal-driven) input.
            NodeKind::Bool | NodeKind::Int | NodeKind::Float | NodeKind::String => {
                self.eval_node_input(scope, owner, 0)
            }
            NodeKind::MakeFloat2 => Expr::MakeFloat2(
                Box::new(self.eval_node_input(scope, owner, 0)),
                Box::new(self.eval_node_input(scope, owner, 1)),
            ),
            NodeKind::MakeFloat3 => Expr::MakeFloat3(
                Box::new(self.eval_node_input(scope, owner, 0)),
                Box::new(self.eval_node_input(scope, owner, 1)),
                Box::new(self.eval_node_input(scope, owner, 2)),
            ),
            NodeKind::MakeFloat4 => Expr::MakeFloat4(
                Box::new(self.eval_node_input(scope, owner, 0)),
                Box::new(self.eval_node_input(scope, owner, 1)),
                Box::new(self.eval_node_input(scope, owner, 2)),
                Box::new(self.eval_node_input(scope, owner, 3)),
            ),
            NodeKind::SplitFloat2 | NodeKind::SplitFloat3 | NodeKind::SplitFloat4 => {
                Expr::Component {
                    source: Box::new(self.eval_node_input(scope, owner, 0)),
                    index: out_index,
                }
            }
            NodeKind::FloatOperator(op) => Expr::FloatBinary {
                op,
                lhs: Box::new(self.eval_node_input(scope, owner, 0)),
                rhs: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::IntOperator(op) => Expr::IntBinary {
                op,
                lhs: Box::new(self.eval_node_input(scope, owner, 0)),
                rhs: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::FloatCompare(op) => Expr::FloatCompare {
                op,
                lhs: Box::new(self.eval_node_input(scope, owner, 0)),
                rhs: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::IntCompare(op) => Expr::IntCompare {
                op,
                lhs: Box::new(self.eval_node_input(scope, owner, 0)),
                rhs: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::LogicOperator(op) => Expr::Logic {
                op,
                lhs: Box::new(self.eval_node_input(scope, owner, 0)),
                rhs: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::Mat4Compose => Expr::ComposeTransform {
                translation: Box::new(self.eval_node_input(scope, owner, 0)),
                rotation: Box::new(self.eval_node_input(scope, owner, 1)),
                scale: Box::new(self.eval_node_input(scope, owner, 2)),
            },
            NodeKind::Mat4Multiply => Expr::MatrixMultiply {
                lhs: Box::new(self.eval_node_input(scope, owner, 0)),
                rhs: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::Perspective => Expr::Perspective {
                fov_y: Box::new(self.eval_node_input(scope, owner, 0)),
                aspect: Box::new(self.eval_node_input(scope, owner, 1)),
                near: Box::new(self.eval_node_input(scope, owner, 2)),
                far: Box::new(self.eval_node_input(scope, owner, 3)),
            },
            NodeKind::LookAt => Expr::LookAt {
                eye: Box::new(self.eval_node_input(scope, owner, 0)),
                target: Box::new(self.eval_node_input(scope, owner, 1)),
                up: Box::new(self.eval_node_input(scope, owner, 2)),
            },
            NodeKind::GetVariable(id) => match self.source.variables.get(id) {
                Some(var) => Expr::ReadVariable {
                    key: name_key(&var.name),
                    ty: var.ty.pin_type(),
                },
                None => {
                    self.errors
                        .push(CompileError::at(owner, "variable no longer exists"));
                    Expr::Const(Value::default_for(pin_type))
                }
            },
            // Only the Delta Time output is a data pin; the exec output
            // was rejected above.
            NodeKind::OnUpdate => Expr::ReadVariable {
                key: delta_time_key(),
                ty: PinType::Float,
            },
            NodeKind::LoadTexture => Expr::LoadTexture {
                slot: owner,
                path: Box::new(self.eval_node_input(scope, owner, 0)),
            },
            NodeKind::CreateTexture => Expr::CreateTexture {
                slot: owner,
                width: Box::new(self.eval_node_input(scope, owner, 0)),
                height: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::LoadShader => Expr::LoadShader {
                slot: owner,
                vertex: Box::new(self.eval_node_input(scope, owner, 0)),
                fragment: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::LoadScene => Expr::LoadScene {
                slot: owner,
                path: Box::new(self.eval_node_input(scope, owner, 0)),
            },
            NodeKind::SceneObjectAt => Expr::SceneObjectAt {
                scene: Box::new(self.eval_node_input(scope, owner, 0)),
                index: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::ObjectMesh => {
                Expr::ObjectMesh(Box::new(self.eval_node_input(scope, owner, 0)))
            }
            NodeKind::ObjectTransform => {
                Expr::ObjectTransform(Box::new(self.eval_node_input(scope, owner, 0)))
            }
            NodeKind::MatrixBuffer => Expr::MatrixBuffer {
                slot: owner,
                matrix: Box::new(self.eval_node_input(scope, owner, 0)),
            },
            NodeKind::MakeRenderState => Expr::RenderState {
                depth_test: Box::new(self.eval_node_input(scope, owner, 0)),
                depth_write: Box::new(self.eval_node_input(scope, owner, 1)),
            },
            NodeKind::BindTable => self.eval_bind_table(scope, owner),
            NodeKind::CustomInstance(def) => {
                self.eval_custom_output(scope, owner, def, out_index)
            }
            NodeKind::PinPlaceholder => self.eval_boundary_input(scope, owner, pin_type),
            // Remaining kinds only expose exec outputs, rejected above.
            _ => {
                self.errors.push(CompileError::at(
                    owner,
                    "node does not produce a value",
                ));
                Expr::Const(Value::default_for(pin_type))
            }
        }
    }

    fn eval_bind_table(&mut self, scope: &mut Scope, owner: NodeId) -> Expr {
        let pins: Vec<(PinId, String, PinType)> = {
            let graph = self.current_graph(scope);
            match graph.node(owner) {
                Some(node) => node
                    .custom_pins
                    .iter()
                    .filter(|p| p.direction == PinDirection::Input)
                    .map(|p| (p.id, p.label.clone(), p.pin_type))
                    .collect(),
                None => Vec::new(),
            }
        };
        let mut entries = Vec::with_capacity(pins.len());
        for (pin, label, ty) in pins {
            if !matches!(
                ty,
                PinType::Texture | PinType::Buffer | PinType::Float | PinType::Float4 | PinType::Mat4
            ) {
                self.errors.push(CompileError::at(
                    owner,
                    format!("binding '{label}' has unbindable type {ty:?}"),
                ));
                continue;
            }
            let expr = self.eval_input(scope, pin);
            entries.push((label, ty, expr));
        }
        Expr::BindTable { entries }
    }

    /// Cross from a custom instance's output pin into its sub-graph.
    fn eval_custom_output(
        &mut self,
        scope: &mut Scope,
        instance: NodeId,
        def: CustomNodeId,
        out_index: usize,
    ) -> Expr {
        if scope.contains(def) {
            self.errors.push(CompileError::at(
                instance,
                "recursive custom node: definition contains itself",
            ));
            return Expr::Const(Value::Bool(false));
        }
        let placeholder = match self.source.sub(def) {
            Some(sub) => sub.outputs.get(out_index).map(|b| b.placeholder),
            None => None,
        };
        let Some(placeholder) = placeholder else {
            self.errors.push(CompileError::at(
                instance,
                "custom node definition is missing",
            ));
            return Expr::Const(Value::Bool(false));
        };
        scope.frames.push(Frame { def, instance });
        // An output boundary's placeholder carries one input pin inside
        // the body.
        let inner = self
            .current_graph(scope)
            .node(placeholder)
            .and_then(|n| n.input_at(0))
            .map(|p| p.id);
        let expr = match inner {
            Some(pin) => self.eval_input(scope, pin),
            None => {
                self.errors.push(CompileError::at(
                    placeholder,
                    "output boundary has no inner pin",
                ));
                Expr::Const(Value::Bool(false))
            }
        };
        scope.frames.pop();
        expr
    }

    /// Cross from an input-boundary placeholder back out to the
    /// instance's face pin in the parent scope.
    fn eval_boundary_input(
        &mut self,
        scope: &mut Scope,
        placeholder: NodeId,
        pin_type: PinType,
    ) -> Expr {
        let Some(frame) = scope.frames.pop() else {
            self.errors.push(CompileError::at(
                placeholder,
                "boundary pin outside a custom node body",
            ));
            return Expr::Const(Value::default_for(pin_type));
        };
        let index = self
            .source
            .sub(frame.def)
            .and_then(|sub| sub.inputs.iter().position(|b| b.placeholder == placeholder));
        let face_pin = index.and_then(|index| {
            self.current_graph(scope)
                .node(frame.instance)
                .and_then(|n| n.input_at(index))
                .map(|p| p.id)
        });
        let expr = match face_pin {
            Some(pin) => self.eval_input(scope, pin),
            None => {
                self.errors.push(CompileError::at(
                    placeholder,
                    "boundary pin has no matching face pin",
                ));
                Expr::Const(Value::default_for(pin_type))
            }
        };
        scope.frames.push(frame);
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;
    use crate::runtime::ExecutionContext;
    use frameforge_graph::node::{ArithmeticOp, Node};
    use frameforge_graph::pin::PinValue;
    use frameforge_graph::CustomNodeDef;

    fn set_constant(graph: &mut Graph, node: NodeId, input: usize, value: PinValue) {
        let pin = graph.node(node).unwrap().input_at(input).unwrap().id;
        graph.pin_mut(pin).unwrap().constant = Some(value);
    }

    fn clear_constant(graph: &mut Graph, node: NodeId, input: usize) {
        let pin = graph.node(node).unwrap().input_at(input).unwrap().id;
        graph.pin_mut(pin).unwrap().constant = None;
    }

    fn link(graph: &mut Graph, from_node: NodeId, out: usize, to_node: NodeId, input: usize) {
        let from = graph.node(from_node).unwrap().output_at(out).unwrap().id;
        let to = graph.node(to_node).unwrap().input_at(input).unwrap().id;
        graph.add_link(from, to).unwrap();
    }

    fn eval_value(expr: &Expr) -> Value {
        let mut ctx = ExecutionContext::new();
        let mut backend = NullBackend::new();
        expr.eval(&mut ctx, &mut backend)
    }

    #[test]
    fn test_addition_lowers_and_evaluates() {
        let mut graph = Graph::new();
        let a = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let b = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let op = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        set_constant(&mut graph, a, 0, PinValue::Float(3.0));
        set_constant(&mut graph, b, 0, PinValue::Float(4.0));
        clear_constant(&mut graph, op, 0);
        clear_constant(&mut graph, op, 1);
        link(&mut graph, a, 0, op, 0);
        link(&mut graph, b, 0, op, 1);

        let variables = VariablePool::new();
        let registry = CustomNodeRegistry::new();
        let source = CompileSource::snapshot(&graph, &variables, &registry);
        let mut evaluator = Evaluator::new(&source);
        let mut scope = Scope::new();

        let result_pin = graph.node(op).unwrap().output_at(0).unwrap().id;
        let expr = evaluator.eval_output(&mut scope, result_pin);
        assert!(evaluator.errors.is_empty());
        assert_eq!(eval_value(&expr), Value::Float(7.0));
    }

    #[test]
    fn test_unwired_input_reports_missing_link_once() {
        let mut graph = Graph::new();
        let split = graph.add_node(Node::create(NodeKind::SplitFloat2)).unwrap();

        let variables = VariablePool::new();
        let registry = CustomNodeRegistry::new();
        let source = CompileSource::snapshot(&graph, &variables, &registry);
        let mut evaluator = Evaluator::new(&source);
        let mut scope = Scope::new();

        // Split's Vector input has no default constant and no link.
        let expr = evaluator.eval_node_input(&mut scope, split, 0);
        assert_eq!(evaluator.errors.len(), 1);
        assert!(evaluator.errors[0].message.contains("missing link"));
        assert_eq!(eval_value(&expr), Value::Float2([0.0; 2]));
    }

    #[test]
    fn test_custom_node_inlines_across_boundaries() {
        // Body: Out = X + 1.0
        let mut def = CustomNodeDef::new("Add One");
        let x = def.add_input("X", PinType::Float);
        let out = def.add_output("Out", PinType::Float);
        {
            let mut body = def.graph.write();
            let op = body
                .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
                .unwrap();
            clear_constant(&mut body, op, 0);
            set_constant(&mut body, op, 1, PinValue::Float(1.0));
            link(&mut body, x, 0, op, 0);
            link(&mut body, op, 0, out, 0);
        }
        let mut registry = CustomNodeRegistry::new();
        let instance_node = def.instantiate();
        let def_id = registry.register(def);

        let mut graph = Graph::new();
        let instance = graph.add_node(instance_node).unwrap();
        set_constant(&mut graph, instance, 0, PinValue::Float(41.0));

        let variables = VariablePool::new();
        let source = CompileSource::snapshot(&graph, &variables, &registry);
        let mut evaluator = Evaluator::new(&source);
        let mut scope = Scope::new();

        let out_pin = graph.node(instance).unwrap().output_at(0).unwrap().id;
        let expr = evaluator.eval_output(&mut scope, out_pin);
        assert!(evaluator.errors.is_empty(), "{:?}", evaluator.errors);
        assert_eq!(eval_value(&expr), Value::Float(42.0));
        assert!(matches!(
            registry.get(def_id),
            Some(def) if def.name == "Add One"
        ));
    }

    #[test]
    fn test_recursive_custom_node_rejected() {
        let mut def = CustomNodeDef::new("Ouroboros");
        let out = def.add_output("Out", PinType::Float);
        // Place an instance of the definition inside its own body.
        let inner_instance = def.instantiate();
        {
            let mut body = def.graph.write();
            let inner = body.add_node(inner_instance).unwrap();
            link(&mut body, inner, 0, out, 0);
        }
        let root_instance = def.instantiate();
        let mut registry = CustomNodeRegistry::new();
        registry.register(def);

        let mut graph = Graph::new();
        let instance = graph.add_node(root_instance).unwrap();

        let variables = VariablePool::new();
        let source = CompileSource::snapshot(&graph, &variables, &registry);
        let mut evaluator = Evaluator::new(&source);
        let mut scope = Scope::new();

        let out_pin = graph.node(instance).unwrap().output_at(0).unwrap().id;
        let _ = evaluator.eval_output(&mut scope, out_pin);
        assert!(evaluator
            .errors
            .iter()
            .any(|e| e.message.contains("recursive")));
    }

    #[test]
    fn test_exec_output_rejected_as_value() {
        let graph = Graph::with_entry_nodes();
        let start_pin = graph.on_start().unwrap().output_at(0).unwrap().id;

        let variables = VariablePool::new();
        let registry = CustomNodeRegistry::new();
        let source = CompileSource::snapshot(&graph, &variables, &registry);
        let mut evaluator = Evaluator::new(&source);
        let mut scope = Scope::new();

        let _ = evaluator.eval_output(&mut scope, start_pin);
        assert_eq!(evaluator.errors.len(), 1);
    }
}
