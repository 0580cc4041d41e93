// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compilation and execution of FrameForge node graphs.
//!
//! A graph authored with `frameforge_graph` is snapshotted into a
//! [`evaluator::CompileSource`], lowered by [`compiler::compile`] into
//! per-entry instruction chains, and driven by [`runtime::Runtime`]
//! against a [`backend::RenderBackend`] implementation. Compilation is
//! error-collecting rather than fail-fast; a pipeline only runs when
//! its error list is empty.

pub mod backend;
pub mod compiler;
pub mod console;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod runtime;
pub mod value;

pub use backend::{NullBackend, RenderBackend};
pub use compiler::{compile, CompiledPipeline, Instruction, InstructionOp};
pub use console::{ConsoleEntry, ConsoleLog, LogLevel};
pub use error::CompileError;
pub use evaluator::{CompileSource, Evaluator, Scope};
pub use expr::Expr;
pub use runtime::{ExecutionContext, Runtime, RuntimeState, StartError};
pub use value::Value;
