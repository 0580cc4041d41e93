// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph compiler: lowering execution chains to instruction lists.
//!
//! Each entry node's exec output is followed link by link into a
//! singly-linked [`Instruction`] chain; data inputs are lowered to
//! [`Expr`] trees by the evaluator along the way. Compilation is
//! total: problems become [`CompileError`]s and the offending
//! instruction degrades to a no-op, so the caller always gets the
//! complete error list in one pass.

use crate::error::CompileError;
use crate::evaluator::{CompileSource, Evaluator, Scope};
use crate::expr::Expr;
use frameforge_graph::{NodeId, NodeKind, PinId};
use std::collections::HashSet;

/// What one instruction does when executed.
#[derive(Debug)]
pub enum InstructionOp {
    /// Store a value into a runtime variable.
    SetVariable {
        /// Variable name-hash key.
        key: u64,
        /// Value source.
        value: Expr,
    },
    /// Conditional: on `true` continue to `next`, on `false` run
    /// `otherwise` and stop.
    Branch {
        /// Condition source.
        condition: Expr,
        /// False-path chain.
        otherwise: Option<Box<Instruction>>,
    },
    /// Print a float to the console.
    Print {
        /// Value source.
        value: Expr,
    },
    /// Print a string to the console.
    PrintString {
        /// Text source.
        text: Expr,
    },
    /// Clear a render target to a color.
    ClearTarget {
        /// Target texture source.
        target: Expr,
        /// Clear color source.
        color: Expr,
    },
    /// Submit one draw.
    DrawMesh {
        /// Mesh source.
        mesh: Expr,
        /// Shader source.
        shader: Expr,
        /// Bindings source.
        bindings: Expr,
        /// Depth-state source.
        state: Expr,
        /// Target texture source.
        target: Expr,
    },
    /// Designate the displayed texture.
    Present {
        /// Texture source.
        texture: Expr,
    },
    /// Placeholder for a node that failed to compile.
    Nop,
}

/// One step of an execution chain.
#[derive(Debug)]
pub struct Instruction {
    /// Graph node this instruction came from.
    pub node: NodeId,
    /// Operation.
    pub op: InstructionOp,
    /// Next step, if any.
    pub next: Option<Box<Instruction>>,
}

/// A compiled key-event chain.
#[derive(Debug)]
pub struct KeyChain {
    /// The `OnKeyEvent` node.
    pub node: NodeId,
    /// Key name source, evaluated each frame.
    pub key: Expr,
    /// Chain run on frames where the key is pressed.
    pub chain: Option<Box<Instruction>>,
}

/// Output of a whole-graph compile.
#[derive(Debug, Default)]
pub struct CompiledPipeline {
    /// Chain run once at start.
    pub on_start: Option<Box<Instruction>>,
    /// Chain run every frame.
    pub on_update: Option<Box<Instruction>>,
    /// Key-gated chains, in graph order.
    pub key_chains: Vec<KeyChain>,
    /// Every problem found; non-empty means not runnable.
    pub errors: Vec<CompileError>,
}

impl CompiledPipeline {
    /// Whether the pipeline compiled cleanly and may be run.
    pub fn is_runnable(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Compile a snapshot into executable chains.
pub fn compile(source: &CompileSource<'_>) -> CompiledPipeline {
    let mut compiler = Compiler {
        evaluator: Evaluator::new(source),
        source,
        scope: Scope::new(),
    };
    let mut pipeline = CompiledPipeline::default();

    match source.graph.on_start() {
        Some(node) => {
            pipeline.on_start = compiler.chain_from_entry(node.id);
        }
        None => compiler
            .evaluator
            .errors
            .push(CompileError::general("graph has no On Start entry")),
    }
    match source.graph.on_update() {
        Some(node) => {
            pipeline.on_update = compiler.chain_from_entry(node.id);
        }
        None => compiler
            .evaluator
            .errors
            .push(CompileError::general("graph has no On Update entry")),
    }
    let key_nodes: Vec<NodeId> = source.graph.key_event_nodes().map(|n| n.id).collect();
    for node in key_nodes {
        let key = compiler.evaluator.eval_node_input(&mut compiler.scope, node, 0);
        let chain = compiler.chain_from_entry(node);
        pipeline.key_chains.push(KeyChain { node, key, chain });
    }

    pipeline.errors = compiler.evaluator.take_errors();
    tracing::debug!(
        errors = pipeline.errors.len(),
        key_chains = pipeline.key_chains.len(),
        "graph compiled"
    );
    pipeline
}

struct Compiler<'a> {
    evaluator: Evaluator<'a>,
    source: &'a CompileSource<'a>,
    scope: Scope,
}

impl Compiler<'_> {
    fn chain_from_entry(&mut self, entry: NodeId) -> Option<Box<Instruction>> {
        let exec_out = self.exec_output(entry, 0)?;
        let mut visited = HashSet::new();
        visited.insert(entry);
        self.compile_chain(exec_out, &mut visited)
    }

    /// Exec chains only exist in the root graph; custom instances are
    /// pure data nodes.
    fn exec_output(&self, node: NodeId, index: usize) -> Option<PinId> {
        self.source
            .graph
            .node(node)?
            .outputs()
            .filter(|p| p.is_exec())
            .nth(index)
            .map(|p| p.id)
    }

    fn compile_chain(
        &mut self,
        from: PinId,
        visited: &mut HashSet<NodeId>,
    ) -> Option<Box<Instruction>> {
        let to = self.source.graph.links_from(from).next().map(|l| l.to)?;
        let node = self.source.graph.pin_owner(to)?;
        if !visited.insert(node) {
            self.evaluator
                .errors
                .push(CompileError::at(node, "execution chain forms a cycle"));
            return None;
        }
        let kind = self.source.graph.node(node)?.kind;
        let (op, next_from) = self.compile_node(node, kind, visited);
        let next = next_from.and_then(|pin| self.compile_chain(pin, visited));
        Some(Box::new(Instruction { node, op, next }))
    }

    /// Lower one exec-capable node; returns the op and the exec output
    /// the chain continues from.
    fn compile_node(
        &mut self,
        node: NodeId,
        kind: NodeKind,
        visited: &mut HashSet<NodeId>,
    ) -> (InstructionOp, Option<PinId>) {
        match kind {
            NodeKind::If => {
                let condition = self.evaluator.eval_node_input(&mut self.scope, node, 1);
                let otherwise = self
                    .exec_output(node, 1)
                    .and_then(|pin| self.compile_chain(pin, visited));
                (
                    InstructionOp::Branch {
                        condition,
                        otherwise,
                    },
                    self.exec_output(node, 0),
                )
            }
            NodeKind::Print => {
                let value = self.evaluator.eval_node_input(&mut self.scope, node, 1);
                (InstructionOp::Print { value }, self.exec_output(node, 0))
            }
            NodeKind::PrintString => {
                let text = self.evaluator.eval_node_input(&mut self.scope, node, 1);
                (InstructionOp::PrintString { text }, self.exec_output(node, 0))
            }
            NodeKind::SetVariable(id) => {
                let op = match self.source.variables.get(id) {
                    Some(var) => InstructionOp::SetVariable {
                        key: frameforge_graph::variable::name_key(&var.name),
                        value: self.evaluator.eval_node_input(&mut self.scope, node, 1),
                    },
                    None => {
                        self.evaluator
                            .errors
                            .push(CompileError::at(node, "variable no longer exists"));
                        InstructionOp::Nop
                    }
                };
                (op, self.exec_output(node, 0))
            }
            NodeKind::ClearTarget => {
                let target = self.evaluator.eval_node_input(&mut self.scope, node, 1);
                let color = self.evaluator.eval_node_input(&mut self.scope, node, 2);
                (
                    InstructionOp::ClearTarget { target, color },
                    self.exec_output(node, 0),
                )
            }
            NodeKind::DrawMesh => {
                let mesh = self.evaluator.eval_node_input(&mut self.scope, node, 1);
                let shader = self.evaluator.eval_node_input(&mut self.scope, node, 2);
                let bindings = self.evaluator.eval_node_input(&mut self.scope, node, 3);
                let state = self.evaluator.eval_node_input(&mut self.scope, node, 4);
                let target = self.evaluator.eval_node_input(&mut self.scope, node, 5);
                (
                    InstructionOp::DrawMesh {
                        mesh,
                        shader,
                        bindings,
                        state,
                        target,
                    },
                    self.exec_output(node, 0),
                )
            }
            NodeKind::Present => {
                let texture = self.evaluator.eval_node_input(&mut self.scope, node, 1);
                (InstructionOp::Present { texture }, self.exec_output(node, 0))
            }
            _ => {
                self.evaluator.errors.push(CompileError::at(
                    node,
                    "node cannot appear on an execution chain",
                ));
                (InstructionOp::Nop, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frameforge_graph::custom::CustomNodeRegistry;
    use frameforge_graph::node::Node;
    use frameforge_graph::pin::PinValue;
    use frameforge_graph::variable::VariablePool;
    use frameforge_graph::Graph;

    fn set_constant(graph: &mut Graph, node: NodeId, input: usize, value: PinValue) {
        let pin = graph.node(node).unwrap().input_at(input).unwrap().id;
        graph.pin_mut(pin).unwrap().constant = Some(value);
    }

    fn link_exec(graph: &mut Graph, from_node: NodeId, out: usize, to_node: NodeId) {
        let from = graph.node(from_node).unwrap().output_at(out).unwrap().id;
        let to = graph.node(to_node).unwrap().input_at(0).unwrap().id;
        graph.add_link(from, to).unwrap();
    }

    fn compile_graph(graph: &Graph) -> CompiledPipeline {
        let variables = VariablePool::new();
        let registry = CustomNodeRegistry::new();
        let source = CompileSource::snapshot(graph, &variables, &registry);
        compile(&source)
    }

    #[test]
    fn test_linear_chain_compiles_in_order() {
        let mut graph = Graph::with_entry_nodes();
        let start = graph.on_start().unwrap().id;
        let print = graph.add_node(Node::create(NodeKind::Print)).unwrap();
        let print2 = graph.add_node(Node::create(NodeKind::Print)).unwrap();
        set_constant(&mut graph, print, 1, PinValue::Float(1.0));
        set_constant(&mut graph, print2, 1, PinValue::Float(2.0));
        link_exec(&mut graph, start, 0, print);
        link_exec(&mut graph, print, 0, print2);

        let pipeline = compile_graph(&graph);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);
        let first = pipeline.on_start.as_ref().unwrap();
        assert_eq!(first.node, print);
        assert!(matches!(first.op, InstructionOp::Print { .. }));
        let second = first.next.as_ref().unwrap();
        assert_eq!(second.node, print2);
        assert!(second.next.is_none());
        assert!(pipeline.on_update.is_none());
    }

    #[test]
    fn test_unwired_condition_is_one_missing_link_error() {
        let mut graph = Graph::with_entry_nodes();
        let start = graph.on_start().unwrap().id;
        let branch = graph.add_node(Node::create(NodeKind::If)).unwrap();
        link_exec(&mut graph, start, 0, branch);

        let pipeline = compile_graph(&graph);
        assert_eq!(pipeline.errors.len(), 1);
        assert!(pipeline.errors[0].message.contains("missing link"));
        assert!(!pipeline.is_runnable());
        // The chain still exists with a fallback-false condition.
        assert!(matches!(
            pipeline.on_start.as_ref().unwrap().op,
            InstructionOp::Branch { .. }
        ));
    }

    #[test]
    fn test_execution_cycle_detected() {
        let mut graph = Graph::with_entry_nodes();
        let start = graph.on_start().unwrap().id;
        let a = graph.add_node(Node::create(NodeKind::Print)).unwrap();
        let b = graph.add_node(Node::create(NodeKind::Print)).unwrap();
        set_constant(&mut graph, a, 1, PinValue::Float(0.0));
        set_constant(&mut graph, b, 1, PinValue::Float(0.0));
        link_exec(&mut graph, start, 0, a);
        link_exec(&mut graph, a, 0, b);
        link_exec(&mut graph, b, 0, a);

        let pipeline = compile_graph(&graph);
        assert!(pipeline
            .errors
            .iter()
            .any(|e| e.message.contains("cycle")));
    }

    #[test]
    fn test_key_event_chains_collected() {
        let mut graph = Graph::with_entry_nodes();
        let key = graph.add_node(Node::create(NodeKind::OnKeyEvent)).unwrap();
        set_constant(&mut graph, key, 0, PinValue::String("Space".into()));
        let print = graph.add_node(Node::create(NodeKind::PrintString)).unwrap();
        set_constant(&mut graph, print, 1, PinValue::String("jump".into()));
        link_exec(&mut graph, key, 0, print);

        let pipeline = compile_graph(&graph);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);
        assert_eq!(pipeline.key_chains.len(), 1);
        assert_eq!(pipeline.key_chains[0].node, key);
        assert!(pipeline.key_chains[0].chain.is_some());
    }

    #[test]
    fn test_branch_paths_compile_separately() {
        let mut graph = Graph::with_entry_nodes();
        let start = graph.on_start().unwrap().id;
        let branch = graph.add_node(Node::create(NodeKind::If)).unwrap();
        let cond = graph.add_node(Node::create(NodeKind::Bool)).unwrap();
        set_constant(&mut graph, cond, 0, PinValue::Bool(true));
        let yes = graph.add_node(Node::create(NodeKind::PrintString)).unwrap();
        let no = graph.add_node(Node::create(NodeKind::PrintString)).unwrap();
        set_constant(&mut graph, yes, 1, PinValue::String("yes".into()));
        set_constant(&mut graph, no, 1, PinValue::String("no".into()));

        link_exec(&mut graph, start, 0, branch);
        // Wire condition.
        let cond_out = graph.node(cond).unwrap().output_at(0).unwrap().id;
        let cond_in = graph.node(branch).unwrap().input_at(1).unwrap().id;
        graph.add_link(cond_out, cond_in).unwrap();
        // True and False exec outputs.
        let yes_in = graph.node(yes).unwrap().input_at(0).unwrap().id;
        let no_in = graph.node(no).unwrap().input_at(0).unwrap().id;
        let true_out = graph.node(branch).unwrap().output_at(0).unwrap().id;
        let false_out = graph.node(branch).unwrap().output_at(1).unwrap().id;
        graph.add_link(true_out, yes_in).unwrap();
        graph.add_link(false_out, no_in).unwrap();

        let pipeline = compile_graph(&graph);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);
        let instr = pipeline.on_start.as_ref().unwrap();
        let InstructionOp::Branch { otherwise, .. } = &instr.op else {
            panic!("expected a branch");
        };
        assert_eq!(otherwise.as_ref().unwrap().node, no);
        assert_eq!(instr.next.as_ref().unwrap().node, yes);
    }
}
