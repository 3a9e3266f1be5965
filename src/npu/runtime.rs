//! Model Runtime Capability
//!
//! The tensor-graph engine is opaque to this crate. A runtime only has to
//! load a model, allocate its tensors into a scratch arena, hand out
//! tensor views, and run the graph.

use crate::npu::error::NpuError;
use crate::npu::tensor::{TensorView, TensorViewMut};

/// Schema version this crate's runtimes are built against.
pub const RUNTIME_SCHEMA_VERSION: u32 = 3;

/// Metadata read from a loaded model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelHeader {
    /// Schema version the model was written with
    pub schema_version: u32,
    /// Scratch arena the model declares it needs, in bytes
    pub arena_size: usize,
}

/// Tensor-graph inference runtime.
///
/// Call order: `load_model`, `allocate_tensors`, then any number of
/// `input_tensor` / `invoke` / `output_tensor` rounds.
pub trait ModelRuntime: Send {
    /// Parse a model and report its header.
    fn load_model(&mut self, model: &[u8]) -> Result<ModelHeader, NpuError>;

    /// Reserve a scratch arena of `arena_size` bytes and place all tensors in it.
    fn allocate_tensors(&mut self, arena_size: usize) -> Result<(), NpuError>;

    /// Writable view of input tensor `index`.
    fn input_tensor(&mut self, index: usize) -> Option<TensorViewMut<'_>>;

    /// Read-only view of output tensor `index`.
    fn output_tensor(&self, index: usize) -> Option<TensorView<'_>>;

    /// Run the graph once over the current input.
    fn invoke(&mut self) -> Result<(), NpuError>;
}

impl<R: ModelRuntime + ?Sized> ModelRuntime for Box<R> {
    fn load_model(&mut self, model: &[u8]) -> Result<ModelHeader, NpuError> {
        (**self).load_model(model)
    }

    fn allocate_tensors(&mut self, arena_size: usize) -> Result<(), NpuError> {
        (**self).allocate_tensors(arena_size)
    }

    fn input_tensor(&mut self, index: usize) -> Option<TensorViewMut<'_>> {
        (**self).input_tensor(index)
    }

    fn output_tensor(&self, index: usize) -> Option<TensorView<'_>> {
        (**self).output_tensor(index)
    }

    fn invoke(&mut self) -> Result<(), NpuError> {
        (**self).invoke()
    }
}
