// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions: typed, directional connection points on nodes.

use crate::ident::PinId;
use serde::{Deserialize, Serialize};

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDirection {
    /// Input pin (consumes a value or execution flow).
    Input,
    /// Output pin (produces a value or execution flow).
    Output,
}

/// Data type that can flow through a pin.
///
/// Persisted by name; variants are append-only so old documents keep
/// loading as the kind set grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinType {
    /// Execution flow ("run next").
    Exec,
    /// Boolean value.
    Bool,
    /// Integer value.
    Int,
    /// Floating point value.
    Float,
    /// 2D vector.
    Float2,
    /// 3D vector.
    Float3,
    /// 4D vector.
    Float4,
    /// 4x4 matrix.
    Mat4,
    /// String value.
    String,
    /// Texture resource.
    Texture,
    /// GPU buffer resource.
    Buffer,
    /// Mesh resource.
    Mesh,
    /// Shader program resource.
    Shader,
    /// Shader resource binding table.
    BindTable,
    /// Rasterizer/depth state.
    RenderState,
    /// Loaded scene.
    Scene,
    /// Object within a scene.
    SceneObject,
    /// Any type (generic pins).
    Any,
}

impl PinType {
    /// Check whether two pin types may be linked.
    ///
    /// Exec links only to exec; otherwise the types must be equal or
    /// either side must be `Any`. Direction is checked separately.
    pub fn can_link_to(&self, other: &PinType) -> bool {
        match (self, other) {
            (Self::Exec, Self::Exec) => true,
            (Self::Exec, _) | (_, Self::Exec) => false,
            (Self::Any, _) | (_, Self::Any) => true,
            (a, b) => a == b,
        }
    }
}

/// Literal value an input pin may carry in place of an incoming link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PinValue {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f32),
    /// 2D vector literal.
    Float2([f32; 2]),
    /// 3D vector literal.
    Float3([f32; 3]),
    /// 4D vector literal.
    Float4([f32; 4]),
    /// 4x4 matrix literal (column major).
    Mat4([[f32; 4]; 4]),
    /// String literal.
    String(String),
}

impl PinValue {
    /// Get the pin type this literal satisfies.
    pub fn pin_type(&self) -> PinType {
        match self {
            Self::Bool(_) => PinType::Bool,
            Self::Int(_) => PinType::Int,
            Self::Float(_) => PinType::Float,
            Self::Float2(_) => PinType::Float2,
            Self::Float3(_) => PinType::Float3,
            Self::Float4(_) => PinType::Float4,
            Self::Mat4(_) => PinType::Mat4,
            Self::String(_) => PinType::String,
        }
    }

    /// Default literal for a pin type, if the type has a literal form.
    pub fn default_for(pin_type: PinType) -> Option<Self> {
        match pin_type {
            PinType::Bool => Some(Self::Bool(false)),
            PinType::Int => Some(Self::Int(0)),
            PinType::Float => Some(Self::Float(0.0)),
            PinType::Float2 => Some(Self::Float2([0.0; 2])),
            PinType::Float3 => Some(Self::Float3([0.0; 3])),
            PinType::Float4 => Some(Self::Float4([0.0; 4])),
            PinType::Mat4 => Some(Self::Mat4(IDENTITY_MAT4)),
            PinType::String => Some(Self::String(String::new())),
            _ => None,
        }
    }
}

/// Column-major 4x4 identity matrix.
pub const IDENTITY_MAT4: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// A pin on a node.
///
/// A pin's type and direction never change after creation; the only
/// mutable aspect is whether an input pin carries a literal constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// Unique pin ID.
    pub id: PinId,
    /// Human-readable label.
    pub label: String,
    /// Pin direction.
    pub direction: PinDirection,
    /// Data type.
    pub pin_type: PinType,
    /// Literal constant substituting for a missing link (inputs only).
    pub constant: Option<PinValue>,
}

impl Pin {
    /// Create a new input pin.
    pub fn input(label: impl Into<String>, pin_type: PinType) -> Self {
        Self {
            id: PinId::new(),
            label: label.into(),
            direction: PinDirection::Input,
            pin_type,
            constant: None,
        }
    }

    /// Create a new output pin.
    pub fn output(label: impl Into<String>, pin_type: PinType) -> Self {
        Self {
            id: PinId::new(),
            label: label.into(),
            direction: PinDirection::Output,
            pin_type,
            constant: None,
        }
    }

    /// Create a new input pin pre-populated with its type's default literal.
    pub fn input_with_default(label: impl Into<String>, pin_type: PinType) -> Self {
        let mut pin = Self::input(label, pin_type);
        pin.constant = PinValue::default_for(pin_type);
        pin
    }

    /// Whether this is an execution-flow pin.
    pub fn is_exec(&self) -> bool {
        self.pin_type == PinType::Exec
    }
}

/// Check whether two pins may be linked, normalizing argument order so
/// the source is the output side.
///
/// Same-direction pairs are always rejected.
pub fn can_be_linked(a: &Pin, b: &Pin) -> bool {
    if a.direction == b.direction {
        return false;
    }
    let (from, to) = if a.direction == PinDirection::Output {
        (a, b)
    } else {
        (b, a)
    };
    from.pin_type.can_link_to(&to.pin_type)
}
