//! Host Reference Runtime
//!
//! A small pure-Rust [`ModelRuntime`] for desktop builds and tests. Models
//! are JSON documents:
//!
//! ```json
//! {
//!   "version": 3,
//!   "arena_size": 1024,
//!   "input":  { "shape": [1, 32], "dtype": "uint8" },
//!   "output": { "shape": [1, 4],  "dtype": "int8" },
//!   "op": "max_pool"
//! }
//! ```
//!
//! The single op pools the input into as many buckets as the output has
//! elements. Input and output tensors share one scratch arena.

use serde::{Serialize, Deserialize};

use crate::npu::error::NpuError;
use crate::npu::runtime::{ModelHeader, ModelRuntime};
use crate::npu::tensor::{TensorDescriptor, TensorType, TensorView, TensorViewMut};

/// Tensor declaration in a model document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    /// Dimension sizes
    pub shape: Vec<u32>,
    /// Element type
    pub dtype: TensorType,
}

/// Graph operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolOp {
    /// Bucket maximum
    MaxPool,
    /// Bucket mean (truncated)
    MeanPool,
}

/// A model document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDoc {
    /// Schema version
    pub version: u32,
    /// Declared scratch arena size in bytes
    pub arena_size: usize,
    /// Input tensor 0
    pub input: TensorSpec,
    /// Output tensor 0
    pub output: TensorSpec,
    /// Operation
    pub op: PoolOp,
}

impl ModelDoc {
    /// Serialize to model bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        // A derived Serialize over plain data cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Loaded model with resolved descriptors.
#[derive(Debug)]
struct LoadedModel {
    input: TensorDescriptor,
    output: TensorDescriptor,
    op: PoolOp,
}

/// Pure-Rust runtime for JSON models.
#[derive(Debug, Default)]
pub struct ReferenceRuntime {
    model: Option<LoadedModel>,
    arena: Vec<u8>,
    allocated: bool,
}

impl ReferenceRuntime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    fn input_len(&self) -> usize {
        self.model.as_ref().map(|m| m.input.byte_len()).unwrap_or(0)
    }
}

/// Map one input element to the 0..=255 activation domain.
fn activation(dtype: TensorType, data: &[u8], i: usize) -> u8 {
    match dtype {
        TensorType::UInt8 => data[i],
        TensorType::Int8 => ((data[i] as i8 as i32) + 128) as u8,
        TensorType::Float32 => {
            let c = &data[i * 4..i * 4 + 4];
            let v = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
            (v.clamp(0.0, 1.0) * 255.0) as u8
        }
    }
}

/// Write an activation into output element `j`.
fn store(dtype: TensorType, out: &mut [u8], j: usize, value: u8) {
    match dtype {
        TensorType::UInt8 => out[j] = value,
        TensorType::Int8 => out[j] = ((value as i32) - 128) as i8 as u8,
        TensorType::Float32 => {
            out[j * 4..j * 4 + 4].copy_from_slice(&(value as f32 / 255.0).to_le_bytes());
        }
    }
}

/// Bytes needed for input and output together.
fn tensors_size(input: &TensorDescriptor, output: &TensorDescriptor) -> Result<usize, NpuError> {
    input
        .checked_byte_len()
        .zip(output.checked_byte_len())
        .and_then(|(i, o)| i.checked_add(o))
        .ok_or_else(|| NpuError::ModelInvalid("tensor size overflow".into()))
}

impl ModelRuntime for ReferenceRuntime {
    fn load_model(&mut self, model: &[u8]) -> Result<ModelHeader, NpuError> {
        self.model = None;
        self.allocated = false;
        self.arena.clear();

        let doc: ModelDoc =
            serde_json::from_slice(model).map_err(|e| NpuError::ModelInvalid(e.to_string()))?;
        let input = TensorDescriptor::new(&doc.input.shape, doc.input.dtype)?;
        let output = TensorDescriptor::new(&doc.output.shape, doc.output.dtype)?;
        tensors_size(&input, &output)?;

        self.model = Some(LoadedModel { input, output, op: doc.op });
        Ok(ModelHeader {
            schema_version: doc.version,
            arena_size: doc.arena_size,
        })
    }

    fn allocate_tensors(&mut self, arena_size: usize) -> Result<(), NpuError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| NpuError::ModelInvalid("no model loaded".into()))?;
        let required = tensors_size(&model.input, &model.output)?;
        if arena_size < required {
            return Err(NpuError::ArenaTooSmall { required, available: arena_size });
        }
        self.arena = vec![0u8; arena_size];
        self.allocated = true;
        Ok(())
    }

    fn input_tensor(&mut self, index: usize) -> Option<TensorViewMut<'_>> {
        if index != 0 || !self.allocated {
            return None;
        }
        let desc = self.model.as_ref()?.input;
        let len = desc.byte_len();
        Some(TensorViewMut { desc, data: &mut self.arena[..len] })
    }

    fn output_tensor(&self, index: usize) -> Option<TensorView<'_>> {
        if index != 0 || !self.allocated {
            return None;
        }
        let desc = self.model.as_ref()?.output;
        let start = self.input_len();
        Some(TensorView { desc, data: &self.arena[start..start + desc.byte_len()] })
    }

    fn invoke(&mut self) -> Result<(), NpuError> {
        let model = match (&self.model, self.allocated) {
            (Some(model), true) => model,
            _ => return Err(NpuError::InvokeFailed("tensors not allocated".into())),
        };
        let (input, output, op) = (model.input, model.output, model.op);
        let n = input.element_count();
        let m = output.element_count();
        if n == 0 || m == 0 {
            return Ok(());
        }

        let (in_bytes, rest) = self.arena.split_at_mut(input.byte_len());
        let out_bytes = &mut rest[..output.byte_len()];

        for j in 0..m {
            let lo = j * n / m;
            let hi = ((j + 1) * n / m).max(lo + 1).min(n);
            let values = (lo..hi).map(|i| activation(input.dtype, in_bytes, i));
            let pooled = match op {
                PoolOp::MaxPool => values.max().unwrap_or(0),
                PoolOp::MeanPool => {
                    let sum: u32 = values.map(u32::from).sum();
                    (sum / (hi - lo) as u32) as u8
                }
            };
            store(output.dtype, out_bytes, j, pooled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(input: TensorType, output: TensorType, op: PoolOp) -> ModelDoc {
        ModelDoc {
            version: 3,
            arena_size: 512,
            input: TensorSpec { shape: vec![1, 32], dtype: input },
            output: TensorSpec { shape: vec![1, 4], dtype: output },
            op,
        }
    }

    fn loaded(doc: &ModelDoc) -> ReferenceRuntime {
        let mut rt = ReferenceRuntime::new();
        let header = rt.load_model(&doc.to_bytes()).unwrap();
        rt.allocate_tensors(header.arena_size).unwrap();
        rt
    }

    #[test]
    fn test_load_reports_header() {
        let mut rt = ReferenceRuntime::new();
        let header = rt.load_model(&doc(TensorType::UInt8, TensorType::UInt8, PoolOp::MaxPool).to_bytes()).unwrap();
        assert_eq!(header, ModelHeader { schema_version: 3, arena_size: 512 });
    }

    #[test]
    fn test_garbage_model_rejected() {
        let mut rt = ReferenceRuntime::new();
        let err = rt.load_model(b"\x1c\x00\x00\x00TFL3").unwrap_err();
        assert!(matches!(err, NpuError::ModelInvalid(_)));
    }

    #[test]
    fn test_unknown_dtype_rejected() {
        let json = br#"{"version":3,"arena_size":64,
            "input":{"shape":[4],"dtype":"int16"},
            "output":{"shape":[1],"dtype":"uint8"},"op":"max_pool"}"#;
        let mut rt = ReferenceRuntime::new();
        assert!(matches!(rt.load_model(json), Err(NpuError::ModelInvalid(_))));
    }

    #[test]
    fn test_rank_too_high_rejected() {
        let mut d = doc(TensorType::UInt8, TensorType::UInt8, PoolOp::MaxPool);
        d.input.shape = vec![1, 1, 1, 1, 32];
        let mut rt = ReferenceRuntime::new();
        assert_eq!(rt.load_model(&d.to_bytes()), Err(NpuError::InvalidShape { rank: 5 }));
    }

    #[test]
    fn test_oversized_tensor_rejected() {
        let mut d = doc(TensorType::UInt8, TensorType::UInt8, PoolOp::MaxPool);
        d.input.shape = vec![65536; 4];
        let mut rt = ReferenceRuntime::new();
        assert_eq!(
            rt.load_model(&d.to_bytes()),
            Err(NpuError::ModelInvalid("tensor size overflow".into()))
        );
        assert!(rt.allocate_tensors(1024).is_err());
        assert!(rt.input_tensor(0).is_none());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_combined_size_overflow_rejected() {
        let mut d = doc(TensorType::UInt8, TensorType::Float32, PoolOp::MaxPool);
        // Each tensor fits on its own (2^64 - 2^33 + 1 and ~2^34 bytes), the sum does not
        d.input.shape = vec![u32::MAX, u32::MAX];
        d.output.shape = vec![u32::MAX];
        let mut rt = ReferenceRuntime::new();
        assert!(matches!(rt.load_model(&d.to_bytes()), Err(NpuError::ModelInvalid(_))));
    }

    #[test]
    fn test_arena_too_small() {
        let mut d = doc(TensorType::Float32, TensorType::Float32, PoolOp::MaxPool);
        d.arena_size = 64;
        let mut rt = ReferenceRuntime::new();
        let header = rt.load_model(&d.to_bytes()).unwrap();
        assert_eq!(
            rt.allocate_tensors(header.arena_size),
            Err(NpuError::ArenaTooSmall { required: 144, available: 64 })
        );
        assert!(rt.input_tensor(0).is_none());
    }

    #[test]
    fn test_tensors_need_allocation() {
        let mut rt = ReferenceRuntime::new();
        assert!(rt.allocate_tensors(1024).is_err());
        rt.load_model(&doc(TensorType::UInt8, TensorType::UInt8, PoolOp::MaxPool).to_bytes()).unwrap();
        assert!(rt.input_tensor(0).is_none());
        assert!(rt.output_tensor(0).is_none());
        assert!(rt.invoke().is_err());
    }

    #[test]
    fn test_only_tensor_zero_exists() {
        let mut rt = loaded(&doc(TensorType::UInt8, TensorType::UInt8, PoolOp::MaxPool));
        assert!(rt.input_tensor(1).is_none());
        assert!(rt.output_tensor(1).is_none());
        assert_eq!(rt.input_tensor(0).unwrap().data.len(), 32);
        assert_eq!(rt.output_tensor(0).unwrap().data.len(), 4);
    }

    #[test]
    fn test_max_pool_uint8() {
        let mut rt = loaded(&doc(TensorType::UInt8, TensorType::UInt8, PoolOp::MaxPool));
        {
            let input = rt.input_tensor(0).unwrap();
            for (i, b) in input.data.iter_mut().enumerate() {
                *b = i as u8 * 3;
            }
        }
        rt.invoke().unwrap();
        let out = rt.output_tensor(0).unwrap();
        assert_eq!(out.data, &[21, 45, 69, 93]);
    }

    #[test]
    fn test_mean_pool_to_int8() {
        let mut rt = loaded(&doc(TensorType::UInt8, TensorType::Int8, PoolOp::MeanPool));
        rt.input_tensor(0).unwrap().data.fill(200);
        rt.invoke().unwrap();
        let out = rt.output_tensor(0).unwrap();
        assert!(out.data.iter().all(|&b| b as i8 == 72));
    }

    #[test]
    fn test_max_pool_to_float() {
        let mut rt = loaded(&doc(TensorType::UInt8, TensorType::Float32, PoolOp::MaxPool));
        rt.input_tensor(0).unwrap().data.fill(255);
        rt.invoke().unwrap();
        let out = rt.output_tensor(0).unwrap();
        let first = f32::from_le_bytes([out.data[0], out.data[1], out.data[2], out.data[3]]);
        assert_eq!(first, 1.0);
    }

    #[test]
    fn test_more_outputs_than_inputs() {
        let mut d = doc(TensorType::UInt8, TensorType::UInt8, PoolOp::MaxPool);
        d.input.shape = vec![2];
        d.output.shape = vec![4];
        let mut rt = loaded(&d);
        rt.input_tensor(0).unwrap().data.copy_from_slice(&[10, 20]);
        rt.invoke().unwrap();
        assert_eq!(rt.output_tensor(0).unwrap().data, &[10, 10, 20, 20]);
    }
}
