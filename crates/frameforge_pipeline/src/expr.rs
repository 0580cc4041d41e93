// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value expression trees.
//!
//! An expression is built once at compile time and evaluated against
//! the execution context every time its owning instruction runs.
//! Evaluation is side-effect-free except for the resource-producing
//! leaves, which create their resource on first reach and cache the
//! handle in the context's resource table under their declaring node's
//! slot, so resources survive across frames without reloading.

use crate::backend::{Binding, BindingSet, RenderBackend, RenderStateDesc};
use crate::runtime::ExecutionContext;
use crate::value::Value;
use frameforge_graph::node::{ArithmeticOp, CompareOp, LogicOp};
use frameforge_graph::{NodeId, PinType};

/// A compiled value expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Literal value.
    Const(Value),
    /// Read a pool variable from the runtime environment.
    ReadVariable {
        /// Name-hash key.
        key: u64,
        /// Variable's pin type, for the default when unset.
        ty: PinType,
    },
    /// Float arithmetic.
    FloatBinary {
        /// Operator token.
        op: ArithmeticOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Integer arithmetic.
    IntBinary {
        /// Operator token.
        op: ArithmeticOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Float comparison.
    FloatCompare {
        /// Operator token.
        op: CompareOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Integer comparison.
    IntCompare {
        /// Operator token.
        op: CompareOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Boolean logic.
    Logic {
        /// Operator token.
        op: LogicOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Compose a 2D vector.
    MakeFloat2(Box<Expr>, Box<Expr>),
    /// Compose a 3D vector.
    MakeFloat3(Box<Expr>, Box<Expr>, Box<Expr>),
    /// Compose a 4D vector.
    MakeFloat4(Box<Expr>, Box<Expr>, Box<Expr>, Box<Expr>),
    /// Extract one component of a vector.
    Component {
        /// Vector source.
        source: Box<Expr>,
        /// Component index (0..4).
        index: usize,
    },
    /// Translation/rotation/scale to matrix.
    ComposeTransform {
        /// Translation.
        translation: Box<Expr>,
        /// Euler rotation, radians, XYZ order.
        rotation: Box<Expr>,
        /// Per-axis scale.
        scale: Box<Expr>,
    },
    /// Matrix product `lhs * rhs`.
    MatrixMultiply {
        /// Left matrix.
        lhs: Box<Expr>,
        /// Right matrix.
        rhs: Box<Expr>,
    },
    /// Perspective projection.
    Perspective {
        /// Vertical field of view, radians.
        fov_y: Box<Expr>,
        /// Aspect ratio.
        aspect: Box<Expr>,
        /// Near plane.
        near: Box<Expr>,
        /// Far plane.
        far: Box<Expr>,
    },
    /// View matrix.
    LookAt {
        /// Camera position.
        eye: Box<Expr>,
        /// Point looked at.
        target: Box<Expr>,
        /// Up direction.
        up: Box<Expr>,
    },
    /// Load a texture from disk (cached by slot).
    LoadTexture {
        /// Declaring node, the cache slot.
        slot: NodeId,
        /// File path.
        path: Box<Expr>,
    },
    /// Create a render-target texture (cached by slot).
    CreateTexture {
        /// Declaring node, the cache slot.
        slot: NodeId,
        /// Width in pixels.
        width: Box<Expr>,
        /// Height in pixels.
        height: Box<Expr>,
    },
    /// Load a shader program (cached by slot).
    LoadShader {
        /// Declaring node, the cache slot.
        slot: NodeId,
        /// Vertex source path.
        vertex: Box<Expr>,
        /// Fragment source path.
        fragment: Box<Expr>,
    },
    /// Load a scene (cached by slot).
    LoadScene {
        /// Declaring node, the cache slot.
        slot: NodeId,
        /// File path.
        path: Box<Expr>,
    },
    /// Pick an object out of a scene.
    SceneObjectAt {
        /// Scene source.
        scene: Box<Expr>,
        /// Object index.
        index: Box<Expr>,
    },
    /// Mesh of a scene object.
    ObjectMesh(Box<Expr>),
    /// Transform of a scene object.
    ObjectTransform(Box<Expr>),
    /// Uniform buffer holding a matrix, refreshed every evaluation.
    MatrixBuffer {
        /// Declaring node, the cache slot.
        slot: NodeId,
        /// Matrix source.
        matrix: Box<Expr>,
    },
    /// Depth state.
    RenderState {
        /// Depth testing.
        depth_test: Box<Expr>,
        /// Depth writes.
        depth_write: Box<Expr>,
    },
    /// Named shader resource bindings.
    BindTable {
        /// `(name, type, source)` per bound pin, in pin order.
        entries: Vec<(String, PinType, Expr)>,
    },
}

impl Expr {
    /// Evaluate against the running context.
    pub fn eval(&self, ctx: &mut ExecutionContext, backend: &mut dyn RenderBackend) -> Value {
        match self {
            Self::Const(value) => value.clone(),
            Self::ReadVariable { key, ty } => ctx.read_var(*key, *ty),
            Self::FloatBinary { op, lhs, rhs } => {
                let a = lhs.eval(ctx, backend).as_float();
                let b = rhs.eval(ctx, backend).as_float();
                Value::Float(match op {
                    ArithmeticOp::Add => a + b,
                    ArithmeticOp::Sub => a - b,
                    ArithmeticOp::Mul => a * b,
                    ArithmeticOp::Div => a / b,
                })
            }
            Self::IntBinary { op, lhs, rhs } => {
                let a = lhs.eval(ctx, backend).as_int();
                let b = rhs.eval(ctx, backend).as_int();
                Value::Int(match op {
                    ArithmeticOp::Add => a.wrapping_add(b),
                    ArithmeticOp::Sub => a.wrapping_sub(b),
                    ArithmeticOp::Mul => a.wrapping_mul(b),
                    ArithmeticOp::Div => {
                        if b == 0 {
                            0
                        } else {
                            a.wrapping_div(b)
                        }
                    }
                })
            }
            Self::FloatCompare { op, lhs, rhs } => {
                let a = lhs.eval(ctx, backend).as_float();
                let b = rhs.eval(ctx, backend).as_float();
                Value::Bool(apply_compare(*op, a.partial_cmp(&b)))
            }
            Self::IntCompare { op, lhs, rhs } => {
                let a = lhs.eval(ctx, backend).as_int();
                let b = rhs.eval(ctx, backend).as_int();
                Value::Bool(apply_compare(*op, Some(a.cmp(&b))))
            }
            Self::Logic { op, lhs, rhs } => {
                let a = lhs.eval(ctx, backend).as_bool();
                let b = rhs.eval(ctx, backend).as_bool();
                Value::Bool(match op {
                    LogicOp::And => a && b,
                    LogicOp::Or => a || b,
                    LogicOp::Xor => a ^ b,
                })
            }
            Self::MakeFloat2(x, y) => Value::Float2([
                x.eval(ctx, backend).as_float(),
                y.eval(ctx, backend).as_float(),
            ]),
            Self::MakeFloat3(x, y, z) => Value::Float3([
                x.eval(ctx, backend).as_float(),
                y.eval(ctx, backend).as_float(),
                z.eval(ctx, backend).as_float(),
            ]),
            Self::MakeFloat4(x, y, z, w) => Value::Float4([
                x.eval(ctx, backend).as_float(),
                y.eval(ctx, backend).as_float(),
                z.eval(ctx, backend).as_float(),
                w.eval(ctx, backend).as_float(),
            ]),
            Self::Component { source, index } => {
                let component = match source.eval(ctx, backend) {
                    Value::Float2(v) => v.get(*index).copied(),
                    Value::Float3(v) => v.get(*index).copied(),
                    Value::Float4(v) => v.get(*index).copied(),
                    _ => None,
                };
                Value::Float(component.unwrap_or(0.0))
            }
            Self::ComposeTransform {
                translation,
                rotation,
                scale,
            } => {
                let t = translation.eval(ctx, backend).as_float3();
                let r = rotation.eval(ctx, backend).as_float3();
                let s = scale.eval(ctx, backend).as_float3();
                Value::Mat4(compose_transform(t, r, s))
            }
            Self::MatrixMultiply { lhs, rhs } => {
                let a = lhs.eval(ctx, backend).as_mat4();
                let b = rhs.eval(ctx, backend).as_mat4();
                Value::Mat4(mat_mul(a, b))
            }
            Self::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Value::Mat4(perspective(
                fov_y.eval(ctx, backend).as_float(),
                aspect.eval(ctx, backend).as_float(),
                near.eval(ctx, backend).as_float(),
                far.eval(ctx, backend).as_float(),
            )),
            Self::LookAt { eye, target, up } => Value::Mat4(look_at(
                eye.eval(ctx, backend).as_float3(),
                target.eval(ctx, backend).as_float3(),
                up.eval(ctx, backend).as_float3(),
            )),
            Self::LoadTexture { slot, path } => {
                if let Some(handle) = ctx.resources.textures.get(&slot.0) {
                    return Value::Texture(Some(*handle));
                }
                let path = path.eval(ctx, backend).as_str().to_string();
                match backend.load_texture(&path) {
                    Ok(handle) => {
                        ctx.resources.textures.insert(slot.0, handle);
                        Value::Texture(Some(handle))
                    }
                    Err(err) => {
                        ctx.report_failure(format!("texture load failed: {err}"));
                        Value::Texture(None)
                    }
                }
            }
            Self::CreateTexture {
                slot,
                width,
                height,
            } => {
                if let Some(handle) = ctx.resources.textures.get(&slot.0) {
                    return Value::Texture(Some(*handle));
                }
                let w = width.eval(ctx, backend).as_int().max(1) as u32;
                let h = height.eval(ctx, backend).as_int().max(1) as u32;
                match backend.create_texture(w, h) {
                    Ok(handle) => {
                        ctx.resources.textures.insert(slot.0, handle);
                        Value::Texture(Some(handle))
                    }
                    Err(err) => {
                        ctx.report_failure(format!("texture create failed: {err}"));
                        Value::Texture(None)
                    }
                }
            }
            Self::LoadShader {
                slot,
                vertex,
                fragment,
            } => {
                if let Some(handle) = ctx.resources.shaders.get(&slot.0) {
                    return Value::Shader(Some(*handle));
                }
                let vs = vertex.eval(ctx, backend).as_str().to_string();
                let fs = fragment.eval(ctx, backend).as_str().to_string();
                match backend.load_shader(&vs, &fs) {
                    Ok(handle) => {
                        ctx.resources.shaders.insert(slot.0, handle);
                        Value::Shader(Some(handle))
                    }
                    Err(err) => {
                        ctx.report_failure(format!("shader load failed: {err}"));
                        Value::Shader(None)
                    }
                }
            }
            Self::LoadScene { slot, path } => {
                if let Some(scene) = ctx.resources.scenes.get(&slot.0) {
                    return Value::Scene(Some(scene.clone()));
                }
                let path = path.eval(ctx, backend).as_str().to_string();
                match backend.load_scene(&path) {
                    Ok(scene) => {
                        ctx.resources.scenes.insert(slot.0, scene.clone());
                        Value::Scene(Some(scene))
                    }
                    Err(err) => {
                        ctx.report_failure(format!("scene load failed: {err}"));
                        Value::Scene(None)
                    }
                }
            }
            Self::SceneObjectAt { scene, index } => {
                let idx = index.eval(ctx, backend).as_int();
                let object = scene
                    .eval(ctx, backend)
                    .as_scene()
                    .and_then(|s| s.objects.get(idx.max(0) as usize).cloned());
                Value::SceneObject(object)
            }
            Self::ObjectMesh(object) => {
                Value::Mesh(object.eval(ctx, backend).as_scene_object().map(|o| o.mesh))
            }
            Self::ObjectTransform(object) => {
                let transform = object
                    .eval(ctx, backend)
                    .as_scene_object()
                    .map(|o| o.transform);
                match transform {
                    Some(m) => Value::Mat4(m),
                    None => Value::Mat4(frameforge_graph::pin::IDENTITY_MAT4),
                }
            }
            Self::MatrixBuffer { slot, matrix } => {
                let m = matrix.eval(ctx, backend).as_mat4();
                if let Some(handle) = ctx.resources.buffers.get(&slot.0).copied() {
                    if let Err(err) = backend.write_matrix_buffer(handle, m) {
                        ctx.report_failure(format!("buffer write failed: {err}"));
                    }
                    return Value::Buffer(Some(handle));
                }
                match backend.create_matrix_buffer(m) {
                    Ok(handle) => {
                        ctx.resources.buffers.insert(slot.0, handle);
                        Value::Buffer(Some(handle))
                    }
                    Err(err) => {
                        ctx.report_failure(format!("buffer create failed: {err}"));
                        Value::Buffer(None)
                    }
                }
            }
            Self::RenderState {
                depth_test,
                depth_write,
            } => Value::RenderState(RenderStateDesc {
                depth_test: depth_test.eval(ctx, backend).as_bool(),
                depth_write: depth_write.eval(ctx, backend).as_bool(),
            }),
            Self::BindTable { entries } => {
                let mut set = BindingSet::default();
                for (name, ty, source) in entries {
                    let value = source.eval(ctx, backend);
                    let binding = match ty {
                        PinType::Texture => value.as_texture().map(Binding::Texture),
                        PinType::Buffer => value.as_buffer().map(Binding::Buffer),
                        PinType::Float => Some(Binding::Float(value.as_float())),
                        PinType::Float4 => Some(Binding::Float4(value.as_float4())),
                        PinType::Mat4 => Some(Binding::Mat4(value.as_mat4())),
                        _ => None,
                    };
                    match binding {
                        Some(binding) => set.entries.push((name.clone(), binding)),
                        None => {
                            ctx.report_failure(format!("binding '{name}' has no resource"));
                        }
                    }
                }
                Value::BindTable(set)
            }
        }
    }
}

fn apply_compare(op: CompareOp, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering;
    let Some(ordering) = ordering else {
        // NaN compares false on everything except `!=`.
        return op == CompareOp::Ne;
    };
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Ge => ordering != Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
    }
}

// --- matrix helpers (column major) ---

/// `a * b`.
pub fn mat_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut out = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            let mut sum = 0.0;
            for k in 0..4 {
                sum += a[k][row] * b[col][k];
            }
            out[col][row] = sum;
        }
    }
    out
}

/// Right-handed perspective projection, depth 0..1.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> [[f32; 4]; 4] {
    let f = 1.0 / (fov_y * 0.5).tan();
    let range = near - far;
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far / range, -1.0],
        [0.0, 0.0, (near * far) / range, 0.0],
    ]
}

/// Right-handed view matrix.
pub fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> [[f32; 4]; 4] {
    let forward = normalize(sub3(target, eye));
    let right = normalize(cross(forward, up));
    let true_up = cross(right, forward);
    [
        [right[0], true_up[0], -forward[0], 0.0],
        [right[1], true_up[1], -forward[1], 0.0],
        [right[2], true_up[2], -forward[2], 0.0],
        [-dot(right, eye), -dot(true_up, eye), dot(forward, eye), 1.0],
    ]
}

/// Translation * rotation (XYZ euler, radians) * scale.
pub fn compose_transform(
    translation: [f32; 3],
    rotation: [f32; 3],
    scale: [f32; 3],
) -> [[f32; 4]; 4] {
    let (sx, cx) = rotation[0].sin_cos();
    let (sy, cy) = rotation[1].sin_cos();
    let (sz, cz) = rotation[2].sin_cos();

    let rot_x = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, cx, sx, 0.0],
        [0.0, -sx, cx, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let rot_y = [
        [cy, 0.0, -sy, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [sy, 0.0, cy, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let rot_z = [
        [cz, sz, 0.0, 0.0],
        [-sz, cz, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let scale_m = [
        [scale[0], 0.0, 0.0, 0.0],
        [0.0, scale[1], 0.0, 0.0],
        [0.0, 0.0, scale[2], 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let translate = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [translation[0], translation[1], translation[2], 1.0],
    ];
    mat_mul(translate, mat_mul(mat_mul(rot_z, mat_mul(rot_y, rot_x)), scale_m))
}

fn sub3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len <= f32::EPSILON {
        return [0.0, 0.0, 0.0];
    }
    [v[0] / len, v[1] / len, v[2] / len]
}
