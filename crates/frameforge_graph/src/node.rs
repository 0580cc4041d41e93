// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions: the closed set of node kinds and the pin-layout factory.
//!
//! Node kinds are one sum type instead of a class hierarchy; behavior that
//! varies per kind (pin layout, display name, category, execution
//! capability) lives in exhaustive matches here so a missing arm is a
//! compile error when a kind is added.

use crate::ident::{CustomNodeId, NodeId, VariableId};
use crate::pin::{Pin, PinDirection, PinType, PinValue};
use serde::{Deserialize, Serialize};

/// Arithmetic operator token carried by operator nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl ArithmeticOp {
    /// The literal operator token.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// Comparison operator token carried by comparison nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl CompareOp {
    /// The literal operator token.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }
}

/// Logic operator token carried by logic nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOp {
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `XOR`
    Xor,
}

impl LogicOp {
    /// The literal operator token.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
        }
    }
}

/// Node category, used by the frontend to group the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Graph entry points.
    Entry,
    /// Literal values and vector construction.
    Value,
    /// Arithmetic, comparison, logic, matrices.
    Math,
    /// Control flow and debugging.
    Flow,
    /// Variable access.
    Variable,
    /// Resource loading and creation.
    Resource,
    /// Draw submission.
    Draw,
    /// User-authored custom nodes.
    Custom,
}

/// The closed set of node kinds.
///
/// Persisted by variant name; variants are append-only so old documents
/// keep loading as the kind set grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Entry: runs once when the pipeline starts.
    OnStart,
    /// Entry: runs every frame.
    OnUpdate,
    /// Entry: runs on frames where its key is pressed.
    OnKeyEvent,
    /// Boolean literal.
    Bool,
    /// Integer literal.
    Int,
    /// Float literal.
    Float,
    /// String literal.
    String,
    /// Compose a 2D vector from floats.
    MakeFloat2,
    /// Compose a 3D vector from floats.
    MakeFloat3,
    /// Compose a 4D vector from floats.
    MakeFloat4,
    /// Split a 2D vector into floats.
    SplitFloat2,
    /// Split a 3D vector into floats.
    SplitFloat3,
    /// Split a 4D vector into floats.
    SplitFloat4,
    /// Float arithmetic.
    FloatOperator(ArithmeticOp),
    /// Integer arithmetic.
    IntOperator(ArithmeticOp),
    /// Float comparison.
    FloatCompare(CompareOp),
    /// Integer comparison.
    IntCompare(CompareOp),
    /// Boolean logic.
    LogicOperator(LogicOp),
    /// Compose a transform matrix from translation/rotation/scale.
    Mat4Compose,
    /// Multiply two matrices.
    Mat4Multiply,
    /// Perspective projection matrix.
    Perspective,
    /// View matrix from eye/target/up.
    LookAt,
    /// Read a pool variable.
    GetVariable(VariableId),
    /// Write a pool variable.
    SetVariable(VariableId),
    /// If/else branching on execution flow.
    If,
    /// Print a float to the console.
    Print,
    /// Print a string to the console.
    PrintString,
    /// Load a texture from disk.
    LoadTexture,
    /// Create a blank render-target texture.
    CreateTexture,
    /// Load and compile a shader program.
    LoadShader,
    /// Load a scene from disk.
    LoadScene,
    /// Pick an object out of a scene by index.
    SceneObjectAt,
    /// Mesh of a scene object.
    ObjectMesh,
    /// Local transform of a scene object.
    ObjectTransform,
    /// Upload a matrix into a uniform buffer.
    MatrixBuffer,
    /// Depth-test/depth-write state.
    MakeRenderState,
    /// Shader resource bindings; the one custom-pin-extensible kind.
    BindTable,
    /// Clear a render target to a color.
    ClearTarget,
    /// Issue an indexed draw.
    DrawMesh,
    /// Designate the texture the frontend displays.
    Present,
    /// Instance of a user-authored custom node.
    CustomInstance(CustomNodeId),
    /// Boundary pin placeholder inside a custom node's sub-graph.
    PinPlaceholder,
}

impl NodeKind {
    /// Display name for the palette and node header.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OnStart => "On Start",
            Self::OnUpdate => "On Update",
            Self::OnKeyEvent => "On Key Event",
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::MakeFloat2 => "Make Float2",
            Self::MakeFloat3 => "Make Float3",
            Self::MakeFloat4 => "Make Float4",
            Self::SplitFloat2 => "Split Float2",
            Self::SplitFloat3 => "Split Float3",
            Self::SplitFloat4 => "Split Float4",
            Self::FloatOperator(_) => "Float Operator",
            Self::IntOperator(_) => "Int Operator",
            Self::FloatCompare(_) => "Float Compare",
            Self::IntCompare(_) => "Int Compare",
            Self::LogicOperator(_) => "Logic Operator",
            Self::Mat4Compose => "Compose Transform",
            Self::Mat4Multiply => "Multiply Matrices",
            Self::Perspective => "Perspective",
            Self::LookAt => "Look At",
            Self::GetVariable(_) => "Get Variable",
            Self::SetVariable(_) => "Set Variable",
            Self::If => "If",
            Self::Print => "Print",
            Self::PrintString => "Print String",
            Self::LoadTexture => "Load Texture",
            Self::CreateTexture => "Create Texture",
            Self::LoadShader => "Load Shader",
            Self::LoadScene => "Load Scene",
            Self::SceneObjectAt => "Scene Object At",
            Self::ObjectMesh => "Object Mesh",
            Self::ObjectTransform => "Object Transform",
            Self::MatrixBuffer => "Matrix Buffer",
            Self::MakeRenderState => "Render State",
            Self::BindTable => "Bind Table",
            Self::ClearTarget => "Clear Target",
            Self::DrawMesh => "Draw Mesh",
            Self::Present => "Present",
            Self::CustomInstance(_) => "Custom Node",
            Self::PinPlaceholder => "Pin",
        }
    }

    /// Palette category.
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::OnStart | Self::OnUpdate | Self::OnKeyEvent => NodeCategory::Entry,
            Self::Bool
            | Self::Int
            | Self::Float
            | Self::String
            | Self::MakeFloat2
            | Self::MakeFloat3
            | Self::MakeFloat4
            | Self::SplitFloat2
            | Self::SplitFloat3
            | Self::SplitFloat4 => NodeCategory::Value,
            Self::FloatOperator(_)
            | Self::IntOperator(_)
            | Self::FloatCompare(_)
            | Self::IntCompare(_)
            | Self::LogicOperator(_)
            | Self::Mat4Compose
            | Self::Mat4Multiply
            | Self::Perspective
            | Self::LookAt => NodeCategory::Math,
            Self::GetVariable(_) | Self::SetVariable(_) => NodeCategory::Variable,
            Self::If | Self::Print | Self::PrintString => NodeCategory::Flow,
            Self::LoadTexture
            | Self::CreateTexture
            | Self::LoadShader
            | Self::LoadScene
            | Self::SceneObjectAt
            | Self::ObjectMesh
            | Self::ObjectTransform
            | Self::MatrixBuffer
            | Self::MakeRenderState
            | Self::BindTable => NodeCategory::Resource,
            Self::ClearTarget | Self::DrawMesh | Self::Present => NodeCategory::Draw,
            Self::CustomInstance(_) | Self::PinPlaceholder => NodeCategory::Custom,
        }
    }

    /// Whether this kind is a graph entry point.
    pub fn is_entry(&self) -> bool {
        matches!(self, Self::OnStart | Self::OnUpdate | Self::OnKeyEvent)
    }

    /// Whether this kind can appear on an execution chain.
    pub fn is_exec_capable(&self) -> bool {
        matches!(
            self,
            Self::OnStart
                | Self::OnUpdate
                | Self::OnKeyEvent
                | Self::If
                | Self::Print
                | Self::PrintString
                | Self::SetVariable(_)
                | Self::ClearTarget
                | Self::DrawMesh
                | Self::Present
        )
    }

    /// Whether the user may add custom pins to nodes of this kind.
    pub fn is_extensible(&self) -> bool {
        matches!(self, Self::BindTable)
    }
}

/// A node in the graph.
///
/// A node owns its pins; pins never outlive their node. Fixed pins come
/// from the kind's layout, custom pins are user-added and only valid on
/// extensible kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node ID.
    pub id: NodeId,
    /// Node kind.
    pub kind: NodeKind,
    /// Display label.
    pub label: String,
    /// Fixed pins, in layout order.
    pub pins: Vec<Pin>,
    /// User-added pins, in creation order.
    pub custom_pins: Vec<Pin>,
}

impl Node {
    /// Create a node of the given kind with its fixed pin layout.
    ///
    /// `GetVariable`/`SetVariable`, custom instances and pin placeholders
    /// need extra context and have dedicated constructors.
    pub fn create(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            label: kind.display_name().to_string(),
            pins: fixed_pin_layout(&kind),
            custom_pins: Vec::new(),
            kind,
        }
    }

    /// Create a variable-read node typed after the variable.
    pub fn get_variable(id: VariableId, name: &str, pin_type: PinType) -> Self {
        Self {
            id: NodeId::new(),
            kind: NodeKind::GetVariable(id),
            label: format!("Get {name}"),
            pins: vec![Pin::output("Value", pin_type)],
            custom_pins: Vec::new(),
        }
    }

    /// Create a variable-write node typed after the variable.
    pub fn set_variable(id: VariableId, name: &str, pin_type: PinType) -> Self {
        Self {
            id: NodeId::new(),
            kind: NodeKind::SetVariable(id),
            label: format!("Set {name}"),
            pins: vec![
                Pin::input("Exec", PinType::Exec),
                Pin::input_with_default("Value", pin_type),
                Pin::output("Then", PinType::Exec),
            ],
            custom_pins: Vec::new(),
        }
    }

    /// Create a boundary pin placeholder for a custom node's sub-graph.
    ///
    /// `direction` is the direction of the pin exposed on the custom
    /// node's face; inside the sub-graph the placeholder carries the
    /// opposite direction.
    pub fn pin_placeholder(direction: PinDirection, pin_type: PinType, label: &str) -> Self {
        let inner = match direction {
            PinDirection::Input => Pin::output(label, pin_type),
            PinDirection::Output => Pin::input(label, pin_type),
        };
        Self {
            id: NodeId::new(),
            kind: NodeKind::PinPlaceholder,
            label: label.to_string(),
            pins: vec![inner],
            custom_pins: Vec::new(),
        }
    }

    /// All pins, fixed then custom.
    pub fn all_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().chain(self.custom_pins.iter())
    }

    /// Mutable access to all pins, fixed then custom.
    pub fn all_pins_mut(&mut self) -> impl Iterator<Item = &mut Pin> {
        self.pins.iter_mut().chain(self.custom_pins.iter_mut())
    }

    /// Input pins, fixed then custom.
    pub fn inputs(&self) -> impl Iterator<Item = &Pin> {
        self.all_pins().filter(|p| p.direction == PinDirection::Input)
    }

    /// Output pins, fixed then custom.
    pub fn outputs(&self) -> impl Iterator<Item = &Pin> {
        self.all_pins().filter(|p| p.direction == PinDirection::Output)
    }

    /// The n-th input pin.
    pub fn input_at(&self, index: usize) -> Option<&Pin> {
        self.inputs().nth(index)
    }

    /// The n-th output pin.
    pub fn output_at(&self, index: usize) -> Option<&Pin> {
        self.outputs().nth(index)
    }

    /// A pin by ID, searching fixed and custom pins.
    pub fn pin(&self, id: crate::ident::PinId) -> Option<&Pin> {
        self.all_pins().find(|p| p.id == id)
    }

    /// A mutable pin by ID, searching fixed and custom pins.
    pub fn pin_mut(&mut self, id: crate::ident::PinId) -> Option<&mut Pin> {
        self.all_pins_mut().find(|p| p.id == id)
    }
}

/// Fixed pin layout for the argument-free kinds.
fn fixed_pin_layout(kind: &NodeKind) -> Vec<Pin> {
    use PinType as T;
    match kind {
        NodeKind::OnStart => vec![Pin::output("Start", T::Exec)],
        NodeKind::OnUpdate => vec![
            Pin::output("Update", T::Exec),
            Pin::output("Delta Time", T::Float),
        ],
        NodeKind::OnKeyEvent => vec![
            Pin::input_with_default("Key", T::String),
            Pin::output("Pressed", T::Exec),
        ],
        NodeKind::Bool => vec![
            Pin::input_with_default("Value", T::Bool),
            Pin::output("Value", T::Bool),
        ],
        NodeKind::Int => vec![
            Pin::input_with_default("Value", T::Int),
            Pin::output("Value", T::Int),
        ],
        NodeKind::Float => vec![
            Pin::input_with_default("Value", T::Float),
            Pin::output("Value", T::Float),
        ],
        NodeKind::String => vec![
            Pin::input_with_default("Value", T::String),
            Pin::output("Value", T::String),
        ],
        NodeKind::MakeFloat2 => vec![
            Pin::input_with_default("X", T::Float),
            Pin::input_with_default("Y", T::Float),
            Pin::output("Vector", T::Float2),
        ],
        NodeKind::MakeFloat3 => vec![
            Pin::input_with_default("X", T::Float),
            Pin::input_with_default("Y", T::Float),
            Pin::input_with_default("Z", T::Float),
            Pin::output("Vector", T::Float3),
        ],
        NodeKind::MakeFloat4 => vec![
            Pin::input_with_default("X", T::Float),
            Pin::input_with_default("Y", T::Float),
            Pin::input_with_default("Z", T::Float),
            Pin::input_with_default("W", T::Float),
            Pin::output("Vector", T::Float4),
        ],
        NodeKind::SplitFloat2 => vec![
            Pin::input("Vector", T::Float2),
            Pin::output("X", T::Float),
            Pin::output("Y", T::Float),
        ],
        NodeKind::SplitFloat3 => vec![
            Pin::input("Vector", T::Float3),
            Pin::output("X", T::Float),
            Pin::output("Y", T::Float),
            Pin::output("Z", T::Float),
        ],
        NodeKind::SplitFloat4 => vec![
            Pin::input("Vector", T::Float4),
            Pin::output("X", T::Float),
            Pin::output("Y", T::Float),
            Pin::output("Z", T::Float),
            Pin::output("W", T::Float),
        ],
        NodeKind::FloatOperator(_) => vec![
            Pin::input_with_default("A", T::Float),
            Pin::input_with_default("B", T::Float),
            Pin::output("Result", T::Float),
        ],
        NodeKind::IntOperator(_) => vec![
            Pin::input_with_default("A", T::Int),
            Pin::input_with_default("B", T::Int),
            Pin::output("Result", T::Int),
        ],
        NodeKind::FloatCompare(_) => vec![
            Pin::input_with_default("A", T::Float),
            Pin::input_with_default("B", T::Float),
            Pin::output("Result", T::Bool),
        ],
        NodeKind::IntCompare(_) => vec![
            Pin::input_with_default("A", T::Int),
            Pin::input_with_default("B", T::Int),
            Pin::output("Result", T::Bool),
        ],
        NodeKind::LogicOperator(_) => vec![
            Pin::input_with_default("A", T::Bool),
            Pin::input_with_default("B", T::Bool),
            Pin::output("Result", T::Bool),
        ],
        NodeKind::Mat4Compose => {
            let mut scale = Pin::input("Scale", T::Float3);
            scale.constant = Some(PinValue::Float3([1.0, 1.0, 1.0]));
            vec![
                Pin::input_with_default("Translation", T::Float3),
                Pin::input_with_default("Rotation", T::Float3),
                scale,
                Pin::output("Matrix", T::Mat4),
            ]
        }
        NodeKind::Mat4Multiply => vec![
            Pin::input_with_default("A", T::Mat4),
            Pin::input_with_default("B", T::Mat4),
            Pin::output("Matrix", T::Mat4),
        ],
        NodeKind::Perspective => {
            let mut fov = Pin::input("Fov Y", T::Float);
            fov.constant = Some(PinValue::Float(1.0));
            let mut aspect = Pin::input("Aspect", T::Float);
            aspect.constant = Some(PinValue::Float(16.0 / 9.0));
            let mut near = Pin::input("Near", T::Float);
            near.constant = Some(PinValue::Float(0.1));
            let mut far = Pin::input("Far", T::Float);
            far.constant = Some(PinValue::Float(100.0));
            vec![fov, aspect, near, far, Pin::output("Matrix", T::Mat4)]
        }
        NodeKind::LookAt => {
            let mut up = Pin::input("Up", T::Float3);
            up.constant = Some(PinValue::Float3([0.0, 1.0, 0.0]));
            vec![
                Pin::input_with_default("Eye", T::Float3),
                Pin::input_with_default("Target", T::Float3),
                up,
                Pin::output("Matrix", T::Mat4),
            ]
        }
        NodeKind::If => vec![
            Pin::input("Exec", T::Exec),
            Pin::input("Condition", T::Bool),
            Pin::output("True", T::Exec),
            Pin::output("False", T::Exec),
        ],
        NodeKind::Print => vec![
            Pin::input("Exec", T::Exec),
            Pin::input_with_default("Value", T::Float),
            Pin::output("Then", T::Exec),
        ],
        NodeKind::PrintString => vec![
            Pin::input("Exec", T::Exec),
            Pin::input_with_default("Text", T::String),
            Pin::output("Then", T::Exec),
        ],
        NodeKind::LoadTexture => vec![
            Pin::input_with_default("Path", T::String),
            Pin::output("Texture", T::Texture),
        ],
        NodeKind::CreateTexture => {
            let mut width = Pin::input("Width", T::Int);
            width.constant = Some(PinValue::Int(256));
            let mut height = Pin::input("Height", T::Int);
            height.constant = Some(PinValue::Int(256));
            vec![width, height, Pin::output("Texture", T::Texture)]
        }
        NodeKind::LoadShader => vec![
            Pin::input_with_default("Vertex Path", T::String),
            Pin::input_with_default("Fragment Path", T::String),
            Pin::output("Shader", T::Shader),
        ],
        NodeKind::LoadScene => vec![
            Pin::input_with_default("Path", T::String),
            Pin::output("Scene", T::Scene),
        ],
        NodeKind::SceneObjectAt => vec![
            Pin::input("Scene", T::Scene),
            Pin::input_with_default("Index", T::Int),
            Pin::output("Object", T::SceneObject),
        ],
        NodeKind::ObjectMesh => vec![
            Pin::input("Object", T::SceneObject),
            Pin::output("Mesh", T::Mesh),
        ],
        NodeKind::ObjectTransform => vec![
            Pin::input("Object", T::SceneObject),
            Pin::output("Matrix", T::Mat4),
        ],
        NodeKind::MatrixBuffer => vec![
            Pin::input_with_default("Matrix", T::Mat4),
            Pin::output("Buffer", T::Buffer),
        ],
        NodeKind::MakeRenderState => {
            let mut test = Pin::input("Depth Test", T::Bool);
            test.constant = Some(PinValue::Bool(true));
            let mut write = Pin::input("Depth Write", T::Bool);
            write.constant = Some(PinValue::Bool(true));
            vec![test, write, Pin::output("State", T::RenderState)]
        }
        NodeKind::BindTable => vec![Pin::output("Bindings", T::BindTable)],
        NodeKind::ClearTarget => vec![
            Pin::input("Exec", T::Exec),
            Pin::input("Target", T::Texture),
            Pin::input_with_default("Color", T::Float4),
            Pin::output("Then", T::Exec),
        ],
        NodeKind::DrawMesh => vec![
            Pin::input("Exec", T::Exec),
            Pin::input("Mesh", T::Mesh),
            Pin::input("Shader", T::Shader),
            Pin::input("Bindings", T::BindTable),
            Pin::input("State", T::RenderState),
            Pin::input("Target", T::Texture),
            Pin::output("Then", T::Exec),
        ],
        NodeKind::Present => vec![
            Pin::input("Exec", T::Exec),
            Pin::input("Texture", T::Texture),
            Pin::output("Then", T::Exec),
        ],
        // Payload-carrying kinds have dedicated constructors; an empty
        // layout here means the caller went through the wrong path.
        NodeKind::GetVariable(_)
        | NodeKind::SetVariable(_)
        | NodeKind::CustomInstance(_)
        | NodeKind::PinPlaceholder => Vec::new(),
    }
}
