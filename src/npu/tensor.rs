//! Tensor Descriptors and Views
//!
//! Tensor buffers belong to the model runtime. Backends see them only
//! through borrowed views, so a view can never outlive the runtime borrow
//! it came from.
//!
//! The two per-step transforms live here as well: the triangular-wave
//! input synthesis and the output-to-glint reduction.

use serde::{Serialize, Deserialize};

use crate::npu::error::NpuError;

/// Maximum supported tensor rank.
pub const MAX_TENSOR_DIMS: usize = 4;

/// Baseline byte of the synthesized input wave.
pub const INPUT_BASELINE: u8 = 127;

/// Largest amplitude of the synthesized input wave.
pub const INPUT_MAX_AMPLITUDE: i32 = 80;

/// Period of the synthesized input wave, in elements.
pub const INPUT_WAVE_PERIOD: usize = 32;

/// Tensor element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorType {
    /// 32-bit IEEE float
    Float32,
    /// Unsigned 8-bit
    UInt8,
    /// Signed 8-bit
    Int8,
}

impl TensorType {
    /// Bytes per element.
    #[inline]
    pub const fn element_size(self) -> usize {
        match self {
            TensorType::Float32 => 4,
            TensorType::UInt8 | TensorType::Int8 => 1,
        }
    }
}

/// Shape (rank ≤ 4) plus element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TensorDescriptor {
    dims: [u32; MAX_TENSOR_DIMS],
    rank: usize,
    /// Element type
    pub dtype: TensorType,
}

impl TensorDescriptor {
    /// Create a descriptor. Fails for rank > 4.
    pub fn new(shape: &[u32], dtype: TensorType) -> Result<Self, NpuError> {
        if shape.len() > MAX_TENSOR_DIMS {
            return Err(NpuError::InvalidShape { rank: shape.len() });
        }
        let mut dims = [0u32; MAX_TENSOR_DIMS];
        dims[..shape.len()].copy_from_slice(shape);
        Ok(Self { dims, rank: shape.len(), dtype })
    }

    /// Dimension sizes, outermost first.
    #[inline]
    pub fn shape(&self) -> &[u32] {
        &self.dims[..self.rank]
    }

    /// Number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Product of the dimensions; 0 if any dimension is 0.
    pub fn element_count(&self) -> usize {
        self.shape()
            .iter()
            .try_fold(1usize, |n, &d| {
                if d == 0 { None } else { Some(n.saturating_mul(d as usize)) }
            })
            .unwrap_or(0)
    }

    /// Element count with a floor of 1, used to size per-step loops.
    #[inline]
    pub fn loop_count(&self) -> usize {
        self.element_count().max(1)
    }

    /// Buffer size in bytes.
    pub fn byte_len(&self) -> usize {
        self.element_count().saturating_mul(self.dtype.element_size())
    }

    /// Buffer size in bytes, or `None` if it does not fit `usize`.
    pub fn checked_byte_len(&self) -> Option<usize> {
        self.shape()
            .iter()
            .try_fold(self.dtype.element_size(), |n, &d| n.checked_mul(d as usize))
    }
}

/// Read-only borrowed tensor.
#[derive(Clone, Copy, Debug)]
pub struct TensorView<'a> {
    /// Shape and type
    pub desc: TensorDescriptor,
    /// Raw little-endian element bytes
    pub data: &'a [u8],
}

/// Writable borrowed tensor.
#[derive(Debug)]
pub struct TensorViewMut<'a> {
    /// Shape and type
    pub desc: TensorDescriptor,
    /// Raw little-endian element bytes
    pub data: &'a mut [u8],
}

impl TensorViewMut<'_> {
    /// Reborrow as read-only.
    pub fn as_view(&self) -> TensorView<'_> {
        TensorView { desc: self.desc, data: &*self.data }
    }
}

// =============================================================================
// INPUT SYNTHESIS
// =============================================================================

/// Wave amplitude from integer speeds: `clamp(|vx| + |vy|, 0, 80)`.
#[inline]
pub fn wave_amplitude(speed_x: i32, speed_y: i32) -> u8 {
    let sum = speed_x.unsigned_abs().saturating_add(speed_y.unsigned_abs());
    sum.min(INPUT_MAX_AMPLITUDE as u32) as u8
}

/// Byte at flattened index `i` of the triangular input wave.
///
/// Rises from the baseline over the first half of each 32-element period
/// and falls back over the second half.
#[inline]
pub fn wave_sample(i: usize, amplitude: u8) -> u8 {
    let t = (i % INPUT_WAVE_PERIOD) as u32;
    let amp = amplitude as u32;
    let offset = if t < 16 { amp * t / 16 } else { amp * (31 - t) / 16 };
    INPUT_BASELINE.wrapping_add(offset as u8)
}

/// Fill the input tensor with the triangular wave.
///
/// One byte is written per element index, whatever the element type. The
/// write covers `loop_count()` bytes, bounded by the buffer length.
pub fn synthesize_input(tensor: &mut TensorViewMut<'_>, amplitude: u8) {
    let n = tensor.desc.loop_count().min(tensor.data.len());
    for (i, byte) in tensor.data[..n].iter_mut().enumerate() {
        *byte = wave_sample(i, amplitude);
    }
}

// =============================================================================
// OUTPUT REDUCTION
// =============================================================================

/// Reduce an output tensor to one glint byte by its element type.
///
/// - uint8: maximum element
/// - int8: maximum element + 128
/// - float32: maximum element clamped to [0, 1], × 255, truncated
///
/// An empty buffer reduces to 0.
pub fn reduce_to_glint(tensor: &TensorView<'_>) -> u8 {
    let n = tensor.desc.loop_count();
    match tensor.desc.dtype {
        TensorType::UInt8 => tensor.data.iter().take(n).copied().max().unwrap_or(0),
        TensorType::Int8 => {
            let max = tensor
                .data
                .iter()
                .take(n)
                .map(|&b| b as i8 as i32)
                .max()
                .unwrap_or(-128);
            (max + 128).clamp(0, 255) as u8
        }
        TensorType::Float32 => {
            let mut values = tensor
                .data
                .chunks_exact(4)
                .take(n)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
            let Some(first) = values.next() else {
                return 0;
            };
            let max = values.fold(first, |m, v| if v > m { v } else { m });
            // NaN survives the clamp and casts to 0
            (max.clamp(0.0, 1.0) * 255.0) as u8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(shape: &[u32], dtype: TensorType) -> TensorDescriptor {
        TensorDescriptor::new(shape, dtype).unwrap()
    }

    #[test]
    fn test_element_count() {
        assert_eq!(desc(&[1, 32], TensorType::UInt8).element_count(), 32);
        assert_eq!(desc(&[2, 3, 4, 5], TensorType::Int8).element_count(), 120);
        assert_eq!(desc(&[], TensorType::UInt8).element_count(), 1);
        assert_eq!(desc(&[4, 0, 2], TensorType::UInt8).element_count(), 0);
        assert_eq!(desc(&[4, 0, 2], TensorType::UInt8).loop_count(), 1);
        assert_eq!(desc(&[1, 8], TensorType::Float32).byte_len(), 32);
    }

    #[test]
    fn test_checked_byte_len() {
        assert_eq!(desc(&[1, 8], TensorType::Float32).checked_byte_len(), Some(32));
        assert_eq!(desc(&[4, 0], TensorType::UInt8).checked_byte_len(), Some(0));
        assert_eq!(desc(&[65536; 4], TensorType::UInt8).checked_byte_len(), None);
    }

    #[test]
    fn test_rank_limit() {
        let err = TensorDescriptor::new(&[1, 2, 3, 4, 5], TensorType::UInt8).unwrap_err();
        assert_eq!(err, NpuError::InvalidShape { rank: 5 });
    }

    #[test]
    fn test_wave_amplitude() {
        assert_eq!(wave_amplitude(0, 0), 0);
        assert_eq!(wave_amplitude(-30, 20), 50);
        assert_eq!(wave_amplitude(300, 0), 80);
        assert_eq!(wave_amplitude(i32::MIN, i32::MIN), 80);
    }

    #[test]
    fn test_triangular_wave_32_elements() {
        let amp = 80u8;
        let mut buf = [0u8; 32];
        let mut view = TensorViewMut { desc: desc(&[1, 32], TensorType::UInt8), data: &mut buf };
        synthesize_input(&mut view, amp);

        assert_eq!(buf[0], INPUT_BASELINE);
        assert_eq!(buf[8], INPUT_BASELINE + amp / 2);
        // Peak plateau at the half-period boundary
        assert_eq!(buf[15], INPUT_BASELINE + 75);
        assert_eq!(buf[16], buf[15]);
        assert_eq!(buf[24], INPUT_BASELINE + 35);
        assert_eq!(buf[31], INPUT_BASELINE);
        // Rising then falling
        assert!(buf[..16].windows(2).all(|w| w[0] <= w[1]));
        assert!(buf[16..].windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_wave_zero_amplitude_is_flat() {
        assert!((0..64).all(|i| wave_sample(i, 0) == INPUT_BASELINE));
    }

    #[test]
    fn test_wave_tail_wraps_mid_period() {
        let mut buf = [0u8; 40];
        let mut view = TensorViewMut { desc: desc(&[40], TensorType::UInt8), data: &mut buf };
        synthesize_input(&mut view, 64);
        assert_eq!(buf[32], INPUT_BASELINE);
        assert_eq!(buf[39], wave_sample(7, 64));
    }

    #[test]
    fn test_degenerate_shape_writes_one_byte() {
        let mut buf = [0u8; 4];
        let mut view = TensorViewMut { desc: desc(&[0, 4], TensorType::UInt8), data: &mut buf };
        synthesize_input(&mut view, 80);
        assert_eq!(buf, [INPUT_BASELINE, 0, 0, 0]);
    }

    #[test]
    fn test_float_input_writes_bytes_per_element() {
        let mut buf = [0u8; 16];
        let mut view = TensorViewMut { desc: desc(&[4], TensorType::Float32), data: &mut buf };
        synthesize_input(&mut view, 32);
        assert_eq!(&buf[..4], &[127, 129, 131, 133]);
        assert_eq!(&buf[4..], &[0u8; 12]);
    }

    #[test]
    fn test_reduce_uint8() {
        let data = [3u8, 200, 17, 42];
        let view = TensorView { desc: desc(&[4], TensorType::UInt8), data: &data };
        assert_eq!(reduce_to_glint(&view), 200);
    }

    #[test]
    fn test_reduce_int8_remaps() {
        let data = [(-100i8) as u8, (-3i8) as u8, (-50i8) as u8];
        let view = TensorView { desc: desc(&[3], TensorType::Int8), data: &data };
        assert_eq!(reduce_to_glint(&view), 125);

        let data = [127u8];
        let view = TensorView { desc: desc(&[1], TensorType::Int8), data: &data };
        assert_eq!(reduce_to_glint(&view), 255);

        let data = [(-128i8) as u8, (-128i8) as u8];
        let view = TensorView { desc: desc(&[2], TensorType::Int8), data: &data };
        assert_eq!(reduce_to_glint(&view), 0);
    }

    #[test]
    fn test_reduce_float32_clamps_and_scales() {
        let floats = |vals: &[f32]| vals.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>();

        let data = floats(&[0.1, 0.5, 0.25]);
        let view = TensorView { desc: desc(&[3], TensorType::Float32), data: &data };
        assert_eq!(reduce_to_glint(&view), 127);

        let data = floats(&[-2.0, 3.5]);
        let view = TensorView { desc: desc(&[2], TensorType::Float32), data: &data };
        assert_eq!(reduce_to_glint(&view), 255);

        let data = floats(&[-2.0, -0.5]);
        let view = TensorView { desc: desc(&[2], TensorType::Float32), data: &data };
        assert_eq!(reduce_to_glint(&view), 0);
    }

    #[test]
    fn test_reduce_respects_element_count() {
        let data = [1u8, 2, 250];
        let view = TensorView { desc: desc(&[2], TensorType::UInt8), data: &data };
        assert_eq!(reduce_to_glint(&view), 2);
    }

    #[test]
    fn test_reduce_empty_buffer() {
        let view = TensorView { desc: desc(&[4], TensorType::Float32), data: &[] };
        assert_eq!(reduce_to_glint(&view), 0);
    }

    #[test]
    fn test_tensor_type_serde_names() {
        let t: TensorType = serde_json::from_str("\"int8\"").unwrap();
        assert_eq!(t, TensorType::Int8);
        assert!(serde_json::from_str::<TensorType>("\"int16\"").is_err());
    }
}
