// SPDX-License-Identifier: MIT OR Apache-2.0
//! Execution runtime: the context instructions run against and the
//! Idle/Running state machine driving compiled chains.

use crate::backend::{
    BufferHandle, DrawCall, RenderBackend, SceneDesc, ShaderHandle, TextureHandle,
};
use crate::compiler::{CompiledPipeline, Instruction, InstructionOp};
use crate::console::ConsoleLog;
use crate::value::Value;
use frameforge_graph::variable::{name_key, VariablePool, VariableValue};
use std::collections::{HashMap, HashSet};

/// Reserved variable name the frame delta is published under.
pub const DELTA_TIME_NAME: &str = "delta_time";

/// Runtime key of the frame delta.
pub fn delta_time_key() -> u64 {
    name_key(DELTA_TIME_NAME)
}

/// Handles cached by resource-producing expressions, keyed by the raw
/// ID of the declaring node.
#[derive(Debug, Default)]
pub struct ResourceTable {
    /// Cached texture handles.
    pub textures: HashMap<u64, TextureHandle>,
    /// Cached buffer handles.
    pub buffers: HashMap<u64, BufferHandle>,
    /// Cached shader handles.
    pub shaders: HashMap<u64, ShaderHandle>,
    /// Cached scene descriptions.
    pub scenes: HashMap<u64, SceneDesc>,
}

/// Keyboard state the host feeds in between ticks.
///
/// Held keys persist until released; the just-pressed and just-released
/// sets are edge snapshots dropped at the end of every tick.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<String>,
    just_pressed: HashSet<String>,
    just_released: HashSet<String>,
}

impl InputState {
    /// Mark a key as pressed down.
    pub fn press(&mut self, key: impl Into<String>) {
        let key = key.into();
        if self.held.insert(key.clone()) {
            self.just_pressed.insert(key);
        }
    }

    /// Mark a key as released.
    pub fn release(&mut self, key: &str) {
        if self.held.remove(key) {
            self.just_released.insert(key.to_string());
        }
    }

    /// Whether a key is currently held.
    pub fn is_pressed(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    /// Whether a key went down since the last frame boundary.
    pub fn just_pressed(&self, key: &str) -> bool {
        self.just_pressed.contains(key)
    }

    /// Whether a key went up since the last frame boundary.
    pub fn just_released(&self, key: &str) -> bool {
        self.just_released.contains(key)
    }

    /// Drop the edge snapshots. The runtime calls this after every tick.
    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

/// Mutable state one run accumulates: variables, cached resources,
/// input, console output and the cooperative failure flag.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    vars: HashMap<u64, Value>,
    /// Cached resource handles.
    pub resources: ResourceTable,
    /// Host-fed keyboard state.
    pub input: InputState,
    /// Texture last designated by a Present instruction.
    pub render_target: Option<TextureHandle>,
    /// Console output of this run.
    pub console: ConsoleLog,
    failed: bool,
}

impl ExecutionContext {
    /// Create a fresh context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a variable, falling back to the type default when unset.
    pub fn read_var(&self, key: u64, ty: frameforge_graph::PinType) -> Value {
        self.vars
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Value::default_for(ty))
    }

    /// Write a variable.
    pub fn write_var(&mut self, key: u64, value: Value) {
        self.vars.insert(key, value);
    }

    /// Record a recoverable run-time problem and set the failure flag.
    ///
    /// For the rest of the frame, resource-touching instructions skip
    /// their backend work; the next tick starts with the flag cleared.
    pub fn report_failure(&mut self, message: String) {
        tracing::warn!(%message, "pipeline run failure");
        self.console.warn(message);
        self.failed = true;
    }

    /// Whether any instruction has failed this frame.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Clear the failure flag; the runtime does this at the top of each
    /// tick so a bad frame does not poison the next one.
    pub fn clear_failure(&mut self) {
        self.failed = false;
    }
}

/// Walk one instruction chain to completion.
pub fn run_chain(
    chain: Option<&Instruction>,
    ctx: &mut ExecutionContext,
    backend: &mut dyn RenderBackend,
) {
    let mut cursor = chain;
    while let Some(instr) = cursor {
        match &instr.op {
            InstructionOp::Nop => {}
            InstructionOp::SetVariable { key, value } => {
                let value = value.eval(ctx, backend);
                ctx.write_var(*key, value);
            }
            InstructionOp::Branch {
                condition,
                otherwise,
            } => {
                if !condition.eval(ctx, backend).as_bool() {
                    run_chain(otherwise.as_deref(), ctx, backend);
                    return;
                }
            }
            InstructionOp::Print { value } => {
                let value = value.eval(ctx, backend).as_float();
                ctx.console.info(format!("{value:.6}"));
            }
            InstructionOp::PrintString { text } => {
                let text = text.eval(ctx, backend).as_str().to_string();
                ctx.console.info(text);
            }
            // A failed frame skips GPU work entirely, input evaluation
            // included, so resource leaves issue no further loads.
            InstructionOp::ClearTarget { target, color } => {
                if !ctx.failed() {
                    let target = target.eval(ctx, backend).as_texture();
                    let color = color.eval(ctx, backend).as_float4();
                    if !ctx.failed() {
                        match target {
                            Some(target) => {
                                if let Err(err) = backend.clear(target, color) {
                                    ctx.report_failure(format!("clear failed: {err}"));
                                }
                            }
                            None => {
                                ctx.report_failure("clear target has no texture".to_string());
                            }
                        }
                    }
                }
            }
            InstructionOp::DrawMesh {
                mesh,
                shader,
                bindings,
                state,
                target,
            } => {
                if !ctx.failed() {
                    let mesh = mesh.eval(ctx, backend).as_mesh();
                    let shader = shader.eval(ctx, backend).as_shader();
                    let bindings = bindings.eval(ctx, backend).as_bind_table();
                    let state = state.eval(ctx, backend).as_render_state();
                    let target = target.eval(ctx, backend).as_texture();
                    if !ctx.failed() {
                        match (mesh, shader, target) {
                            (Some(mesh), Some(shader), Some(target)) => {
                                let call = DrawCall {
                                    mesh,
                                    shader,
                                    bindings,
                                    state,
                                    target,
                                };
                                if let Err(err) = backend.draw(&call) {
                                    ctx.report_failure(format!("draw failed: {err}"));
                                }
                            }
                            _ => ctx.report_failure("draw is missing a resource".to_string()),
                        }
                    }
                }
            }
            InstructionOp::Present { texture } => {
                if !ctx.failed() {
                    let texture = texture.eval(ctx, backend).as_texture();
                    match texture {
                        Some(texture) => ctx.render_target = Some(texture),
                        None if !ctx.failed() => {
                            ctx.report_failure("present has no texture".to_string());
                        }
                        None => {}
                    }
                }
            }
        }
        cursor = instr.next.as_deref();
    }
}

/// State of the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Not running; edits are free.
    Idle,
    /// A compiled pipeline is live and ticking.
    Running,
}

/// Error from starting a run.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// The pipeline carries compile errors.
    #[error("pipeline has {0} compile error(s)")]
    NotRunnable(usize),

    /// A run is already live; stop it first.
    #[error("runtime is already running")]
    AlreadyRunning,
}

/// The Idle/Running state machine driving a compiled pipeline.
#[derive(Debug, Default)]
pub struct Runtime {
    pipeline: Option<CompiledPipeline>,
    ctx: ExecutionContext,
    running: bool,
}

impl Runtime {
    /// Create an idle runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> RuntimeState {
        if self.running {
            RuntimeState::Running
        } else {
            RuntimeState::Idle
        }
    }

    /// Whether a run is live.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The live context (variables, console, input).
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Mutable access, for feeding input between ticks.
    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.ctx
    }

    /// Console output of the current (or last) run.
    pub fn console(&self) -> &ConsoleLog {
        &self.ctx.console
    }

    /// Start a run: seed variables from their initial values, execute
    /// the start chain once, then transition to Running.
    pub fn start(
        &mut self,
        pipeline: CompiledPipeline,
        variables: &VariablePool,
        backend: &mut dyn RenderBackend,
    ) -> Result<(), StartError> {
        if self.running {
            return Err(StartError::AlreadyRunning);
        }
        if !pipeline.is_runnable() {
            return Err(StartError::NotRunnable(pipeline.errors.len()));
        }
        self.ctx = ExecutionContext::new();
        for var in variables.iter() {
            self.ctx
                .write_var(name_key(&var.name), initial_value(&var.initial));
        }
        self.pipeline = Some(pipeline);
        if let Some(pipeline) = &self.pipeline {
            run_chain(pipeline.on_start.as_deref(), &mut self.ctx, backend);
        }
        self.running = true;
        tracing::info!("pipeline run started");
        Ok(())
    }

    /// Advance one frame: publish the delta, run the update chain, then
    /// every key chain whose key is currently pressed. The input edge
    /// snapshots are dropped once the frame is done.
    pub fn tick(&mut self, dt: f32, backend: &mut dyn RenderBackend) {
        if !self.running {
            return;
        }
        self.ctx.clear_failure();
        self.ctx.write_var(delta_time_key(), Value::Float(dt));
        if let Some(pipeline) = &self.pipeline {
            run_chain(pipeline.on_update.as_deref(), &mut self.ctx, backend);
            for key_chain in &pipeline.key_chains {
                let key = key_chain.key.eval(&mut self.ctx, backend);
                if self.ctx.input.is_pressed(key.as_str()) {
                    run_chain(key_chain.chain.as_deref(), &mut self.ctx, backend);
                }
            }
        }
        self.ctx.input.end_frame();
    }

    /// Stop the run, releasing every backend resource created by it.
    ///
    /// The context (console included) stays readable until the next
    /// start.
    pub fn stop(&mut self, backend: &mut dyn RenderBackend) {
        if !self.running {
            return;
        }
        backend.release_all();
        self.ctx.resources = ResourceTable::default();
        self.pipeline = None;
        self.running = false;
        tracing::info!("pipeline run stopped");
    }
}

fn initial_value(initial: &VariableValue) -> Value {
    match initial {
        VariableValue::Bool(v) => Value::Bool(*v),
        VariableValue::Int(v) => Value::Int(*v),
        VariableValue::Float(v) => Value::Float(*v),
        VariableValue::Float2(v) => Value::Float2(*v),
        VariableValue::Float3(v) => Value::Float3(*v),
        VariableValue::Float4(v) => Value::Float4(*v),
        VariableValue::Mat4(v) => Value::Mat4(*v),
        // References resolve to nothing until a run assigns them.
        VariableValue::TextureRef => Value::Texture(None),
        VariableValue::ShaderRef => Value::Shader(None),
        VariableValue::SceneRef => Value::Scene(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;
    use crate::compiler::compile;
    use crate::console::LogLevel;
    use crate::evaluator::CompileSource;
    use frameforge_graph::custom::CustomNodeRegistry;
    use frameforge_graph::node::{ArithmeticOp, Node};
    use frameforge_graph::pin::PinValue;
    use frameforge_graph::variable::VariableType;
    use frameforge_graph::{Graph, NodeId, NodeKind};

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

    fn compile_with(graph: &Graph, variables: &VariablePool) -> CompiledPipeline {
        let registry = CustomNodeRegistry::new();
        let source = CompileSource::snapshot(graph, variables, &registry);
        compile(&source)
    }

    fn info_lines(runtime: &Runtime) -> Vec<String> {
        runtime
            .console()
            .entries()
            .iter()
            .filter(|e| e.level == LogLevel::Info)
            .map(|e| e.message.clone())
            .collect()
    }

    #[test]
    fn test_addition_prints_once_on_start() {
        let mut graph = Graph::with_entry_nodes();
        let start = graph.on_start().unwrap().id;
        let a = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let b = graph.add_node(Node::create(NodeKind::Float)).unwrap();
        let op = graph
            .add_node(Node::create(NodeKind::FloatOperator(ArithmeticOp::Add)))
            .unwrap();
        let print = graph.add_node(Node::create(NodeKind::Print)).unwrap();
        set_constant(&mut graph, a, 0, PinValue::Float(3.0));
        set_constant(&mut graph, b, 0, PinValue::Float(4.0));
        clear_constant(&mut graph, op, 0);
        clear_constant(&mut graph, op, 1);
        clear_constant(&mut graph, print, 1);
        link(&mut graph, a, 0, op, 0);
        link(&mut graph, b, 0, op, 1);
        link(&mut graph, op, 0, print, 1);
        link(&mut graph, start, 0, print, 0);

        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);

        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        runtime.start(pipeline, &variables, &mut backend).unwrap();

        assert_eq!(info_lines(&runtime), vec!["7.000000".to_string()]);
        assert!(runtime.is_running());
    }

    #[test]
    fn test_unrunnable_pipeline_refused() {
        let mut graph = Graph::with_entry_nodes();
        let start = graph.on_start().unwrap().id;
        let branch = graph.add_node(Node::create(NodeKind::If)).unwrap();
        link(&mut graph, start, 0, branch, 0);

        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        assert!(!pipeline.is_runnable());

        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        assert!(matches!(
            runtime.start(pipeline, &variables, &mut backend),
            Err(StartError::NotRunnable(1))
        ));
        assert!(!runtime.is_running());
    }

    #[test]
    fn test_unwired_condition_falls_back_to_false_path() {
        let mut graph = Graph::with_entry_nodes();
        let start = graph.on_start().unwrap().id;
        let branch = graph.add_node(Node::create(NodeKind::If)).unwrap();
        let yes = graph.add_node(Node::create(NodeKind::PrintString)).unwrap();
        let no = graph.add_node(Node::create(NodeKind::PrintString)).unwrap();
        set_constant(&mut graph, yes, 1, PinValue::String("then".into()));
        set_constant(&mut graph, no, 1, PinValue::String("else".into()));
        link(&mut graph, start, 0, branch, 0);
        link(&mut graph, branch, 0, yes, 0);
        link(&mut graph, branch, 1, no, 0);

        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        assert_eq!(pipeline.errors.len(), 1);

        // Walk the start chain directly; start() refuses errored
        // pipelines.
        let mut ctx = ExecutionContext::new();
        let mut backend = NullBackend::new();
        run_chain(pipeline.on_start.as_deref(), &mut ctx, &mut backend);
        let lines: Vec<&str> = ctx.console.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(lines, vec!["else"]);
    }

    #[test]
    fn test_delta_time_reaches_print() {
        let mut graph = Graph::with_entry_nodes();
        let update = graph.on_update().unwrap().id;
        let print = graph.add_node(Node::create(NodeKind::Print)).unwrap();
        clear_constant(&mut graph, print, 1);
        link(&mut graph, update, 0, print, 0);
        // Delta Time is the update node's second output.
        link(&mut graph, update, 1, print, 1);

        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);

        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        runtime.start(pipeline, &variables, &mut backend).unwrap();
        runtime.tick(0.25, &mut backend);

        assert_eq!(info_lines(&runtime), vec!["0.250000".to_string()]);
    }

    #[test]
    fn test_resources_cached_across_ticks() {
        let mut graph = Graph::with_entry_nodes();
        let update = graph.on_update().unwrap().id;
        let tex = graph.add_node(Node::create(NodeKind::LoadTexture)).unwrap();
        let present = graph.add_node(Node::create(NodeKind::Present)).unwrap();
        set_constant(&mut graph, tex, 0, PinValue::String("albedo.png".into()));
        link(&mut graph, update, 0, present, 0);
        link(&mut graph, tex, 0, present, 1);

        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);

        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        runtime.start(pipeline, &variables, &mut backend).unwrap();
        runtime.tick(0.016, &mut backend);
        runtime.tick(0.016, &mut backend);

        assert_eq!(backend.texture_loads(), 1);
        assert!(runtime.context().render_target.is_some());
    }

    #[test]
    fn test_key_chain_gated_on_pressed_state() {
        let mut graph = Graph::with_entry_nodes();
        let key = graph.add_node(Node::create(NodeKind::OnKeyEvent)).unwrap();
        set_constant(&mut graph, key, 0, PinValue::String("Space".into()));
        let print = graph.add_node(Node::create(NodeKind::PrintString)).unwrap();
        set_constant(&mut graph, print, 1, PinValue::String("jump".into()));
        link(&mut graph, key, 0, print, 0);

        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);

        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        runtime.start(pipeline, &variables, &mut backend).unwrap();

        runtime.tick(0.016, &mut backend);
        assert!(info_lines(&runtime).is_empty());

        runtime.context_mut().input.press("Space");
        runtime.tick(0.016, &mut backend);
        runtime.context_mut().input.release("Space");
        runtime.tick(0.016, &mut backend);

        assert_eq!(info_lines(&runtime), vec!["jump".to_string()]);
    }

    #[test]
    fn test_set_then_get_variable_across_chains() {
        let mut variables = VariablePool::new();
        let speed = variables.create("speed", VariableType::Float).unwrap();

        let mut graph = Graph::with_entry_nodes();
        let start = graph.on_start().unwrap().id;
        let update = graph.on_update().unwrap().id;
        let set = graph
            .add_node(Node::set_variable(speed, "speed", VariableType::Float.pin_type()))
            .unwrap();
        set_constant(&mut graph, set, 1, PinValue::Float(5.0));
        let get = graph
            .add_node(Node::get_variable(speed, "speed", VariableType::Float.pin_type()))
            .unwrap();
        let print = graph.add_node(Node::create(NodeKind::Print)).unwrap();
        clear_constant(&mut graph, print, 1);
        link(&mut graph, start, 0, set, 0);
        link(&mut graph, update, 0, print, 0);
        link(&mut graph, get, 0, print, 1);

        let pipeline = compile_with(&graph, &variables);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);

        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        runtime.start(pipeline, &variables, &mut backend).unwrap();
        runtime.tick(0.016, &mut backend);

        assert_eq!(info_lines(&runtime), vec!["5.000000".to_string()]);
    }

    #[test]
    fn test_stop_releases_resources_and_returns_to_idle() {
        let mut graph = Graph::with_entry_nodes();
        let start = graph.on_start().unwrap().id;
        let tex = graph.add_node(Node::create(NodeKind::LoadTexture)).unwrap();
        let present = graph.add_node(Node::create(NodeKind::Present)).unwrap();
        set_constant(&mut graph, tex, 0, PinValue::String("a.png".into()));
        link(&mut graph, start, 0, present, 0);
        link(&mut graph, tex, 0, present, 1);

        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        runtime.start(pipeline, &variables, &mut backend).unwrap();
        assert_eq!(runtime.state(), RuntimeState::Running);

        runtime.stop(&mut backend);
        assert_eq!(runtime.state(), RuntimeState::Idle);
        assert!(matches!(
            backend.calls.last(),
            Some(crate::backend::RecordedCall::ReleaseAll)
        ));
    }

    #[test]
    fn test_failed_load_sets_flag_and_skips_draw_work() {
        let mut graph = Graph::with_entry_nodes();
        let update = graph.on_update().unwrap().id;
        let tex = graph.add_node(Node::create(NodeKind::LoadTexture)).unwrap();
        let clear = graph.add_node(Node::create(NodeKind::ClearTarget)).unwrap();
        set_constant(&mut graph, tex, 0, PinValue::String("missing.png".into()));
        link(&mut graph, update, 0, clear, 0);
        link(&mut graph, tex, 0, clear, 1);

        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);

        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        backend.fail_paths.push("missing.png".into());
        runtime.start(pipeline, &variables, &mut backend).unwrap();
        runtime.tick(0.016, &mut backend);

        assert!(runtime.context().failed());
        assert!(!backend
            .calls
            .iter()
            .any(|c| matches!(c, crate::backend::RecordedCall::Clear(..))));
    }

    #[test]
    fn test_failure_skips_resource_loads_later_in_chain() {
        let mut graph = Graph::with_entry_nodes();
        let update = graph.on_update().unwrap().id;
        let bad = graph.add_node(Node::create(NodeKind::LoadTexture)).unwrap();
        let good = graph.add_node(Node::create(NodeKind::LoadTexture)).unwrap();
        let first = graph.add_node(Node::create(NodeKind::ClearTarget)).unwrap();
        let second = graph.add_node(Node::create(NodeKind::ClearTarget)).unwrap();
        set_constant(&mut graph, bad, 0, PinValue::String("missing.png".into()));
        set_constant(&mut graph, good, 0, PinValue::String("good.png".into()));
        link(&mut graph, update, 0, first, 0);
        link(&mut graph, bad, 0, first, 1);
        link(&mut graph, first, 0, second, 0);
        link(&mut graph, good, 0, second, 1);

        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        assert!(pipeline.is_runnable(), "{:?}", pipeline.errors);

        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        backend.fail_paths.push("missing.png".into());
        runtime.start(pipeline, &variables, &mut backend).unwrap();
        runtime.tick(0.016, &mut backend);

        // The second clear never evaluates its inputs, so its texture
        // is never loaded.
        assert!(runtime.context().failed());
        assert_eq!(backend.texture_loads(), 0);
        assert!(!backend
            .calls
            .iter()
            .any(|c| matches!(c, crate::backend::RecordedCall::Clear(..))));
    }

    #[test]
    fn test_input_edges_tracked_and_dropped_per_tick() {
        let mut input = InputState::default();
        input.press("W");
        assert!(input.is_pressed("W"));
        assert!(input.just_pressed("W"));

        input.end_frame();
        assert!(input.is_pressed("W"));
        assert!(!input.just_pressed("W"));

        input.release("W");
        assert!(!input.is_pressed("W"));
        assert!(input.just_released("W"));
        input.end_frame();
        assert!(!input.just_released("W"));

        // The runtime drops the edge snapshots at the end of each tick.
        let graph = Graph::with_entry_nodes();
        let variables = VariablePool::new();
        let pipeline = compile_with(&graph, &variables);
        let mut runtime = Runtime::new();
        let mut backend = NullBackend::new();
        runtime.start(pipeline, &variables, &mut backend).unwrap();
        runtime.context_mut().input.press("Space");
        runtime.tick(0.016, &mut backend);
        assert!(runtime.context().input.is_pressed("Space"));
        assert!(!runtime.context().input.just_pressed("Space"));
    }
}
