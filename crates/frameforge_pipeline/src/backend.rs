// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render backend capability interface.
//!
//! The runtime only ever commands the backend (create, bind, draw); it
//! never queries GPU state. Handles are opaque and owned by the
//! execution context's resource table for the duration of a run.

use std::collections::HashMap;

/// Opaque texture handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Opaque GPU buffer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Opaque mesh handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Opaque shader program handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// One object of a loaded scene: a mesh and its local transform.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObjectDesc {
    /// Mesh uploaded by the loader.
    pub mesh: MeshHandle,
    /// Column-major local transform.
    pub transform: [[f32; 4]; 4],
}

/// A loaded scene: an ordered list of objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDesc {
    /// Objects in file order.
    pub objects: Vec<SceneObjectDesc>,
}

/// Depth state for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStateDesc {
    /// Depth testing enabled.
    pub depth_test: bool,
    /// Depth writes enabled.
    pub depth_write: bool,
}

impl Default for RenderStateDesc {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: true,
        }
    }
}

/// One shader resource binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A sampled texture.
    Texture(TextureHandle),
    /// A uniform buffer.
    Buffer(BufferHandle),
    /// A float pushed as a uniform.
    Float(f32),
    /// A vec4 pushed as a uniform.
    Float4([f32; 4]),
    /// A matrix pushed as a uniform.
    Mat4([[f32; 4]; 4]),
}

/// Named shader resource bindings, in pin order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingSet {
    /// `(name, binding)` pairs.
    pub entries: Vec<(String, Binding)>,
}

/// A complete draw submission.
#[derive(Debug, Clone)]
pub struct DrawCall {
    /// Mesh to draw.
    pub mesh: MeshHandle,
    /// Shader program.
    pub shader: ShaderHandle,
    /// Shader resource bindings.
    pub bindings: BindingSet,
    /// Depth state.
    pub state: RenderStateDesc,
    /// Render target.
    pub target: TextureHandle,
}

/// Error from a backend operation.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Asset could not be loaded.
    #[error("failed to load asset '{path}': {reason}")]
    LoadFailed {
        /// Requested path.
        path: String,
        /// Loader-provided reason.
        reason: String,
    },

    /// Handle does not name a live resource.
    #[error("invalid resource handle")]
    InvalidHandle,

    /// Backend-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Capability interface the compiled pipeline runs against.
///
/// Invoked only from within instruction execution; all calls are
/// synchronous and blocking-acceptable.
pub trait RenderBackend {
    /// Load a texture from disk.
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, BackendError>;

    /// Create a blank render-target texture.
    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureHandle, BackendError>;

    /// Load and link a shader program from vertex/fragment sources.
    fn load_shader(&mut self, vertex: &str, fragment: &str) -> Result<ShaderHandle, BackendError>;

    /// Load a scene, uploading its meshes.
    fn load_scene(&mut self, path: &str) -> Result<SceneDesc, BackendError>;

    /// Create a uniform buffer holding one matrix.
    fn create_matrix_buffer(&mut self, matrix: [[f32; 4]; 4])
        -> Result<BufferHandle, BackendError>;

    /// Overwrite a matrix buffer's contents.
    fn write_matrix_buffer(
        &mut self,
        buffer: BufferHandle,
        matrix: [[f32; 4]; 4],
    ) -> Result<(), BackendError>;

    /// Clear a render target to a color.
    fn clear(&mut self, target: TextureHandle, color: [f32; 4]) -> Result<(), BackendError>;

    /// Submit a draw.
    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError>;

    /// Release every resource created during the run.
    fn release_all(&mut self);
}

/// Calls a [`NullBackend`] records, for assertions.
#[derive(Debug, Clone)]
pub enum RecordedCall {
    /// `load_texture(path)`
    LoadTexture(String),
    /// `create_texture(width, height)`
    CreateTexture(u32, u32),
    /// `load_shader(vertex, fragment)`
    LoadShader(String, String),
    /// `load_scene(path)`
    LoadScene(String),
    /// `create_matrix_buffer`
    CreateMatrixBuffer,
    /// `write_matrix_buffer`
    WriteMatrixBuffer(BufferHandle),
    /// `clear(target, color)`
    Clear(TextureHandle, [f32; 4]),
    /// `draw(mesh, target)`
    Draw(MeshHandle, TextureHandle),
    /// `release_all`
    ReleaseAll,
}

/// Headless backend: mints sequential handles and records every call.
///
/// Paths listed in [`NullBackend::fail_paths`] fail to load, for
/// exercising the runtime's failure flag.
#[derive(Debug, Default)]
pub struct NullBackend {
    next_handle: u64,
    /// Every call made, in order.
    pub calls: Vec<RecordedCall>,
    /// Paths whose loads should fail.
    pub fail_paths: Vec<String>,
    /// Scenes served by `load_scene`, keyed by path.
    pub scenes: HashMap<String, SceneDesc>,
}

impl NullBackend {
    /// Create a backend that succeeds on everything.
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn check_path(&self, path: &str) -> Result<(), BackendError> {
        if self.fail_paths.iter().any(|p| p == path) {
            return Err(BackendError::LoadFailed {
                path: path.to_string(),
                reason: "marked unloadable".to_string(),
            });
        }
        Ok(())
    }

    /// Number of recorded `load_texture` calls.
    pub fn texture_loads(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::LoadTexture(_)))
            .count()
    }
}

impl RenderBackend for NullBackend {
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, BackendError> {
        self.check_path(path)?;
        self.calls.push(RecordedCall::LoadTexture(path.to_string()));
        Ok(TextureHandle(self.mint()))
    }

    fn create_texture(&mut self, width: u32, height: u32) -> Result<TextureHandle, BackendError> {
        self.calls.push(RecordedCall::CreateTexture(width, height));
        Ok(TextureHandle(self.mint()))
    }

    fn load_shader(&mut self, vertex: &str, fragment: &str) -> Result<ShaderHandle, BackendError> {
        self.check_path(vertex)?;
        self.check_path(fragment)?;
        self.calls
            .push(RecordedCall::LoadShader(vertex.to_string(), fragment.to_string()));
        Ok(ShaderHandle(self.mint()))
    }

    fn load_scene(&mut self, path: &str) -> Result<SceneDesc, BackendError> {
        self.check_path(path)?;
        self.calls.push(RecordedCall::LoadScene(path.to_string()));
        match self.scenes.get(path) {
            Some(scene) => Ok(scene.clone()),
            None => {
                let mesh = MeshHandle(self.mint());
                Ok(SceneDesc {
                    objects: vec![SceneObjectDesc {
                        mesh,
                        transform: frameforge_graph::pin::IDENTITY_MAT4,
                    }],
                })
            }
        }
    }

    fn create_matrix_buffer(
        &mut self,
        _matrix: [[f32; 4]; 4],
    ) -> Result<BufferHandle, BackendError> {
        self.calls.push(RecordedCall::CreateMatrixBuffer);
        Ok(BufferHandle(self.mint()))
    }

    fn write_matrix_buffer(
        &mut self,
        buffer: BufferHandle,
        _matrix: [[f32; 4]; 4],
    ) -> Result<(), BackendError> {
        self.calls.push(RecordedCall::WriteMatrixBuffer(buffer));
        Ok(())
    }

    fn clear(&mut self, target: TextureHandle, color: [f32; 4]) -> Result<(), BackendError> {
        self.calls.push(RecordedCall::Clear(target, color));
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), BackendError> {
        self.calls.push(RecordedCall::Draw(call.mesh, call.target));
        Ok(())
    }

    fn release_all(&mut self) {
        self.calls.push(RecordedCall::ReleaseAll);
    }
}
