// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-wide variable pool, independent of any graph.

use crate::ident::VariableId;
use crate::pin::{PinType, IDENTITY_MAT4};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Types a variable may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    /// Boolean.
    Bool,
    /// Integer.
    Int,
    /// Float.
    Float,
    /// 2D vector.
    Float2,
    /// 3D vector.
    Float3,
    /// 4D vector.
    Float4,
    /// 4x4 matrix.
    Mat4,
    /// Texture reference.
    TextureRef,
    /// Shader reference.
    ShaderRef,
    /// Scene reference.
    SceneRef,
}

impl VariableType {
    /// The pin type a variable of this type flows through.
    pub fn pin_type(&self) -> PinType {
        match self {
            Self::Bool => PinType::Bool,
            Self::Int => PinType::Int,
            Self::Float => PinType::Float,
            Self::Float2 => PinType::Float2,
            Self::Float3 => PinType::Float3,
            Self::Float4 => PinType::Float4,
            Self::Mat4 => PinType::Mat4,
            Self::TextureRef => PinType::Texture,
            Self::ShaderRef => PinType::Shader,
            Self::SceneRef => PinType::Scene,
        }
    }
}

/// Initial payload of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariableValue {
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
    /// 4x4 matrix.
    Mat4([[f32; 4]; 4]),
    /// Texture reference (unresolved until a run binds it).
    TextureRef,
    /// Shader reference.
    ShaderRef,
    /// Scene reference.
    SceneRef,
}

impl VariableValue {
    /// Default payload for a variable type.
    pub fn default_for(ty: VariableType) -> Self {
        match ty {
            VariableType::Bool => Self::Bool(false),
            VariableType::Int => Self::Int(0),
            VariableType::Float => Self::Float(0.0),
            VariableType::Float2 => Self::Float2([0.0; 2]),
            VariableType::Float3 => Self::Float3([0.0; 3]),
            VariableType::Float4 => Self::Float4([0.0; 4]),
            VariableType::Mat4 => Self::Mat4(IDENTITY_MAT4),
            VariableType::TextureRef => Self::TextureRef,
            VariableType::ShaderRef => Self::ShaderRef,
            VariableType::SceneRef => Self::SceneRef,
        }
    }
}

/// A named, typed, globally addressable value slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    /// Stable ID from the global allocator.
    pub id: VariableId,
    /// User-chosen name.
    pub name: String,
    /// Variable type (fixed at creation).
    pub ty: VariableType,
    /// Initial value a run starts from.
    pub initial: VariableValue,
}

/// FNV-1a hash of a variable name.
///
/// This is the key the execution runtime stores variable state under.
/// Collisions between differently-named variables are only guarded
/// against at creation time ([`VariablePool::contains_name`]); two
/// colliding names arriving via a loaded document would silently alias.
pub fn name_key(name: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in name.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Error from variable pool operations.
#[derive(Debug, thiserror::Error)]
pub enum VariableError {
    /// A variable with this name already exists.
    #[error("variable name already in use: {0}")]
    DuplicateName(String),

    /// Variable not found.
    #[error("variable not found: {0:?}")]
    NotFound(VariableId),
}

/// The pool of all variables in the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariablePool {
    variables: IndexMap<VariableId, Variable>,
}

impl VariablePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a variable with its type's default initial value.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        ty: VariableType,
    ) -> Result<VariableId, VariableError> {
        let name = name.into();
        if self.contains_name(&name) {
            return Err(VariableError::DuplicateName(name));
        }
        let variable = Variable {
            id: VariableId::new(),
            initial: VariableValue::default_for(ty),
            name,
            ty,
        };
        let id = variable.id;
        self.variables.insert(id, variable);
        Ok(id)
    }

    /// Delete a variable.
    pub fn remove(&mut self, id: VariableId) -> Result<Variable, VariableError> {
        self.variables
            .shift_remove(&id)
            .ok_or(VariableError::NotFound(id))
    }

    /// Get a variable by ID.
    pub fn get(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(&id)
    }

    /// Get a mutable variable by ID.
    pub fn get_mut(&mut self, id: VariableId) -> Option<&mut Variable> {
        self.variables.get_mut(&id)
    }

    /// Whether a variable with this name exists.
    pub fn contains_name(&self, name: &str) -> bool {
        self.variables.values().any(|v| v.name == name)
    }

    /// All variables in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Highest raw ID used by any variable.
    pub fn highest_id(&self) -> u64 {
        self.variables.keys().map(|id| id.0).max().unwrap_or(0)
    }
}
