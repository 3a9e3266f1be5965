//! Procedural Glint Backend
//!
//! Always available: `glint = clamp(|vx| + |vy|, 0, 255)`.

use crate::core::fixed::clamp_i32;
use crate::npu::{BackendKind, BackendState, InferenceBackend, MotionSample, NpuError};

/// Speed-proportional glint.
#[derive(Debug, Default)]
pub struct StubBackend {
    state: BackendState,
}

impl StubBackend {
    /// Create an uninitialized stub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Glint for a motion sample.
    #[inline]
    pub fn glint_for(motion: &MotionSample) -> u8 {
        let speed = motion.speed_x.saturating_add(motion.speed_y);
        clamp_i32(speed, 0, 255) as u8
    }
}

impl InferenceBackend for StubBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Stub
    }

    fn init(&mut self) -> Result<(), NpuError> {
        self.state = BackendState::Ready;
        Ok(())
    }

    fn step(&mut self, motion: &MotionSample) -> Result<u8, NpuError> {
        if self.state != BackendState::Ready {
            return Err(NpuError::NotReady);
        }
        Ok(Self::glint_for(motion))
    }

    fn state(&self) -> BackendState {
        self.state
    }
}
