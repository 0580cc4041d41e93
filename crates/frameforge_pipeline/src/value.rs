// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime values flowing through compiled expressions.

use crate::backend::{
    BindingSet, BufferHandle, MeshHandle, RenderStateDesc, SceneDesc, SceneObjectDesc,
    ShaderHandle, TextureHandle,
};
use frameforge_graph::pin::{PinValue, IDENTITY_MAT4};
use frameforge_graph::PinType;

/// A typed runtime value.
///
/// Resource variants carry `None` when the producing expression failed
/// or was never wired; instructions treat that as a run-time resource
/// error, not a crash.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f32),
    /// 2D vector.
    Float2([f32; 2]),
    /// 3D vector.
    Float3([f32; 3]),
    /// 4D vector.
    Float4([f32; 4]),
    /// 4x4 matrix, column major.
    Mat4([[f32; 4]; 4]),
    /// String.
    Str(String),
    /// Texture handle.
    Texture(Option<TextureHandle>),
    /// Buffer handle.
    Buffer(Option<BufferHandle>),
    /// Mesh handle.
    Mesh(Option<MeshHandle>),
    /// Shader handle.
    Shader(Option<ShaderHandle>),
    /// Shader resource bindings.
    BindTable(BindingSet),
    /// Depth state.
    RenderState(RenderStateDesc),
    /// Loaded scene.
    Scene(Option<SceneDesc>),
    /// Object within a scene.
    SceneObject(Option<SceneObjectDesc>),
}

impl Value {
    /// Type-appropriate default, used when a required input is missing.
    pub fn default_for(pin_type: PinType) -> Self {
        match pin_type {
            PinType::Bool => Self::Bool(false),
            PinType::Int => Self::Int(0),
            PinType::Float => Self::Float(0.0),
            PinType::Float2 => Self::Float2([0.0; 2]),
            PinType::Float3 => Self::Float3([0.0; 3]),
            PinType::Float4 => Self::Float4([0.0; 4]),
            PinType::Mat4 => Self::Mat4(IDENTITY_MAT4),
            PinType::String => Self::Str(String::new()),
            PinType::Texture => Self::Texture(None),
            PinType::Buffer => Self::Buffer(None),
            PinType::Mesh => Self::Mesh(None),
            PinType::Shader => Self::Shader(None),
            PinType::BindTable => Self::BindTable(BindingSet::default()),
            PinType::RenderState => Self::RenderState(RenderStateDesc::default()),
            PinType::Scene => Self::Scene(None),
            PinType::SceneObject => Self::SceneObject(None),
            // Exec and Any never reach runtime evaluation as value types.
            PinType::Exec | PinType::Any => Self::Bool(false),
        }
    }

    /// Lift a pin literal into a runtime value.
    pub fn from_literal(literal: &PinValue) -> Self {
        match literal {
            PinValue::Bool(v) => Self::Bool(*v),
            PinValue::Int(v) => Self::Int(*v),
            PinValue::Float(v) => Self::Float(*v),
            PinValue::Float2(v) => Self::Float2(*v),
            PinValue::Float3(v) => Self::Float3(*v),
            PinValue::Float4(v) => Self::Float4(*v),
            PinValue::Mat4(v) => Self::Mat4(*v),
            PinValue::String(v) => Self::Str(v.clone()),
        }
    }

    /// As a bool; non-bools read as `false`.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(v) => *v,
            _ => false,
        }
    }

    /// As an integer; non-ints read as `0`.
    pub fn as_int(&self) -> i64 {
        match self {
            Self::Int(v) => *v,
            _ => 0,
        }
    }

    /// As a float; non-floats read as `0.0`.
    pub fn as_float(&self) -> f32 {
        match self {
            Self::Float(v) => *v,
            _ => 0.0,
        }
    }

    /// As a 2D vector.
    pub fn as_float2(&self) -> [f32; 2] {
        match self {
            Self::Float2(v) => *v,
            _ => [0.0; 2],
        }
    }

    /// As a 3D vector.
    pub fn as_float3(&self) -> [f32; 3] {
        match self {
            Self::Float3(v) => *v,
            _ => [0.0; 3],
        }
    }

    /// As a 4D vector.
    pub fn as_float4(&self) -> [f32; 4] {
        match self {
            Self::Float4(v) => *v,
            _ => [0.0; 4],
        }
    }

    /// As a matrix.
    pub fn as_mat4(&self) -> [[f32; 4]; 4] {
        match self {
            Self::Mat4(v) => *v,
            _ => IDENTITY_MAT4,
        }
    }

    /// As a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Str(v) => v.as_str(),
            _ => "",
        }
    }

    /// As a texture handle, if present.
    pub fn as_texture(&self) -> Option<TextureHandle> {
        match self {
            Self::Texture(v) => *v,
            _ => None,
        }
    }

    /// As a buffer handle, if present.
    pub fn as_buffer(&self) -> Option<BufferHandle> {
        match self {
            Self::Buffer(v) => *v,
            _ => None,
        }
    }

    /// As a mesh handle, if present.
    pub fn as_mesh(&self) -> Option<MeshHandle> {
        match self {
            Self::Mesh(v) => *v,
            _ => None,
        }
    }

    /// As a shader handle, if present.
    pub fn as_shader(&self) -> Option<ShaderHandle> {
        match self {
            Self::Shader(v) => *v,
            _ => None,
        }
    }

    /// As a binding set.
    pub fn as_bind_table(&self) -> BindingSet {
        match self {
            Self::BindTable(v) => v.clone(),
            _ => BindingSet::default(),
        }
    }

    /// As a render state.
    pub fn as_render_state(&self) -> RenderStateDesc {
        match self {
            Self::RenderState(v) => *v,
            _ => RenderStateDesc::default(),
        }
    }

    /// As a scene, if present.
    pub fn as_scene(&self) -> Option<SceneDesc> {
        match self {
            Self::Scene(v) => v.clone(),
            _ => None,
        }
    }

    /// As a scene object, if present.
    pub fn as_scene_object(&self) -> Option<SceneObjectDesc> {
        match self {
            Self::SceneObject(v) => v.clone(),
            _ => None,
        }
    }
}
