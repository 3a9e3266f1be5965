//! Model-Backed Glint Backend
//!
//! Wraps a [`ModelRuntime`]. Each step writes a speed-scaled triangular
//! wave into input tensor 0, runs the model, and reduces output tensor 0
//! to a single glint byte.
//!
//! Init is the risky part on device (model load and tensor allocation),
//! so every failure is reported and leaves the backend `Failed` instead of
//! taking the process down.

use tracing::debug;

use crate::npu::runtime::{ModelRuntime, RUNTIME_SCHEMA_VERSION};
use crate::npu::tensor::{reduce_to_glint, synthesize_input, wave_amplitude, TensorDescriptor};
use crate::npu::{BackendKind, BackendState, InferenceBackend, MotionSample, NpuError};

/// Default ceiling on the scratch arena a model may request (256 KiB).
pub const DEFAULT_ARENA_LIMIT: usize = 256 * 1024;

const INPUT_INDEX: usize = 0;
const OUTPUT_INDEX: usize = 0;

/// Model inference backend.
pub struct NeutronBackend<R: ModelRuntime> {
    runtime: R,
    model: Vec<u8>,
    arena_limit: usize,
    state: BackendState,
    input_desc: Option<TensorDescriptor>,
    output_desc: Option<TensorDescriptor>,
}

impl<R: ModelRuntime> NeutronBackend<R> {
    /// Create an uninitialized backend for `model`.
    pub fn new(runtime: R, model: Vec<u8>) -> Self {
        Self {
            runtime,
            model,
            arena_limit: DEFAULT_ARENA_LIMIT,
            state: BackendState::Uninitialized,
            input_desc: None,
            output_desc: None,
        }
    }

    /// Override the arena ceiling.
    pub fn with_arena_limit(mut self, limit: usize) -> Self {
        self.arena_limit = limit;
        self
    }

    /// Input tensor 0 descriptor, once ready.
    pub fn input_descriptor(&self) -> Option<&TensorDescriptor> {
        self.input_desc.as_ref()
    }

    /// Output tensor 0 descriptor, once ready.
    pub fn output_descriptor(&self) -> Option<&TensorDescriptor> {
        self.output_desc.as_ref()
    }

    fn try_init(&mut self) -> Result<(), NpuError> {
        let header = self.runtime.load_model(&self.model)?;
        if header.schema_version != RUNTIME_SCHEMA_VERSION {
            return Err(NpuError::SchemaVersionMismatch {
                expected: RUNTIME_SCHEMA_VERSION,
                found: header.schema_version,
            });
        }
        if header.arena_size > self.arena_limit {
            return Err(NpuError::ArenaLimitExceeded {
                requested: header.arena_size,
                limit: self.arena_limit,
            });
        }
        self.runtime.allocate_tensors(header.arena_size)?;

        let input = self
            .runtime
            .input_tensor(INPUT_INDEX)
            .map(|t| t.desc)
            .ok_or(NpuError::MissingTensor { role: "input", index: INPUT_INDEX })?;
        let output = self
            .runtime
            .output_tensor(OUTPUT_INDEX)
            .map(|t| t.desc)
            .ok_or(NpuError::MissingTensor { role: "output", index: OUTPUT_INDEX })?;

        debug!(
            input_shape = ?input.shape(),
            input_type = ?input.dtype,
            output_shape = ?output.shape(),
            output_type = ?output.dtype,
            arena = header.arena_size,
            "model tensors allocated"
        );

        self.input_desc = Some(input);
        self.output_desc = Some(output);
        Ok(())
    }
}

impl<R: ModelRuntime> InferenceBackend for NeutronBackend<R> {
    fn kind(&self) -> BackendKind {
        BackendKind::Neutron
    }

    fn init(&mut self) -> Result<(), NpuError> {
        self.state = BackendState::Uninitialized;
        self.input_desc = None;
        self.output_desc = None;

        match self.try_init() {
            Ok(()) => {
                self.state = BackendState::Ready;
                Ok(())
            }
            Err(e) => {
                self.input_desc = None;
                self.output_desc = None;
                self.state = BackendState::Failed;
                Err(e)
            }
        }
    }

    fn step(&mut self, motion: &MotionSample) -> Result<u8, NpuError> {
        if self.state != BackendState::Ready {
            return Err(NpuError::NotReady);
        }

        let amplitude = wave_amplitude(motion.speed_x, motion.speed_y);
        {
            let mut input = self
                .runtime
                .input_tensor(INPUT_INDEX)
                .ok_or(NpuError::MissingTensor { role: "input", index: INPUT_INDEX })?;
            synthesize_input(&mut input, amplitude);
        }

        self.runtime.invoke()?;

        let output = self
            .runtime
            .output_tensor(OUTPUT_INDEX)
            .ok_or(NpuError::MissingTensor { role: "output", index: OUTPUT_INDEX })?;
        Ok(reduce_to_glint(&output))
    }

    fn state(&self) -> BackendState {
        self.state
    }
}
