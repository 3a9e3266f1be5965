//! Backend Router
//!
//! Holds the one backend selected at startup and presents the uniform
//! `init` / `step` surface. Two gates sit in front of every step:
//!
//! 1. `inference_enabled` must be set (default off), and
//! 2. the backend must have reached `Ready`.
//!
//! With inference disabled a Neutron backend is not even initialized,
//! while the stub still initializes so it stays selectable and testable.

use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::npu::neutron::{NeutronBackend, DEFAULT_ARENA_LIMIT};
use crate::npu::runtime::ModelRuntime;
use crate::npu::stub::StubBackend;
use crate::npu::{BackendKind, BackendState, InferenceBackend, MotionSample, NpuError};

/// Inference configuration supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpuConfig {
    /// Run inference at all. Off until the selected backend is validated.
    pub inference_enabled: bool,
    /// Backend to build
    pub backend: BackendKind,
    /// Largest scratch arena a model may request, bytes
    pub arena_limit: usize,
}

impl Default for NpuConfig {
    fn default() -> Self {
        Self {
            inference_enabled: false,
            backend: BackendKind::Stub,
            arena_limit: DEFAULT_ARENA_LIMIT,
        }
    }
}

/// Owns the active backend and its state.
pub struct BackendRouter {
    inference_enabled: bool,
    backend: Box<dyn InferenceBackend>,
    state: BackendState,
}

impl BackendRouter {
    /// Build the backend named by `config`.
    ///
    /// `runtime` and `model` are only used when the Neutron backend is
    /// selected.
    pub fn new<R>(config: &NpuConfig, runtime: R, model: Vec<u8>) -> Self
    where
        R: ModelRuntime + 'static,
    {
        let backend: Box<dyn InferenceBackend> = match config.backend {
            BackendKind::Stub => Box::new(StubBackend::new()),
            BackendKind::Neutron => {
                Box::new(NeutronBackend::new(runtime, model).with_arena_limit(config.arena_limit))
            }
        };
        Self::with_backend(config.inference_enabled, backend)
    }

    /// Router over the procedural backend.
    pub fn stub(inference_enabled: bool) -> Self {
        Self::with_backend(inference_enabled, Box::new(StubBackend::new()))
    }

    /// Router over an already-built backend.
    pub fn with_backend(inference_enabled: bool, backend: Box<dyn InferenceBackend>) -> Self {
        Self {
            inference_enabled,
            backend,
            state: BackendState::Uninitialized,
        }
    }

    /// Selected backend.
    pub fn select(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Status-line tag of the selected backend: `'S'` or `'N'`.
    pub fn tag(&self) -> char {
        self.select().tag()
    }

    /// Router-level state.
    pub fn state(&self) -> BackendState {
        self.state
    }

    /// Check if steps can run.
    pub fn is_ready(&self) -> bool {
        self.inference_enabled && self.state == BackendState::Ready
    }

    /// Whether the inference gate is open.
    pub fn inference_enabled(&self) -> bool {
        self.inference_enabled
    }

    /// Try to bring the selected backend to `Ready`.
    ///
    /// Neutron init is skipped while inference is disabled and the router
    /// stays `Uninitialized`. Any failure is non-fatal: the router ends up
    /// `Failed` and every later step reports `NotReady`.
    pub fn init(&mut self) -> Result<(), NpuError> {
        self.state = BackendState::Uninitialized;
        let kind = self.select();

        if kind == BackendKind::Neutron && !self.inference_enabled {
            info!(backend = %kind, "inference disabled, skipping backend init");
            return Err(NpuError::InferenceDisabled);
        }

        match self.backend.init() {
            Ok(()) => {
                self.state = BackendState::Ready;
                info!(backend = %kind, tag = %kind.tag(), "NPU backend ready");
                Ok(())
            }
            Err(e) => {
                self.state = BackendState::Failed;
                warn!(backend = %kind, error = %e, "NPU backend init failed");
                Err(e)
            }
        }
    }

    /// Compute this frame's glint.
    ///
    /// No side effects when gated. Runtime failures are returned for the
    /// caller to absorb; the router stays `Ready`.
    pub fn step(&mut self, motion: &MotionSample) -> Result<u8, NpuError> {
        if !self.inference_enabled {
            return Err(NpuError::InferenceDisabled);
        }
        if self.state != BackendState::Ready {
            return Err(NpuError::NotReady);
        }
        self.backend.step(motion).map_err(|e| {
            debug!(backend = %self.backend.kind(), error = %e, "glint step failed");
            e
        })
    }
}

impl std::fmt::Debug for BackendRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRouter")
            .field("backend", &self.select())
            .field("inference_enabled", &self.inference_enabled)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npu::reference::{ModelDoc, PoolOp, ReferenceRuntime, TensorSpec};
    use crate::npu::runtime::RUNTIME_SCHEMA_VERSION;
    use crate::npu::tensor::TensorType;

    fn model_bytes(version: u32) -> Vec<u8> {
        ModelDoc {
            version,
            arena_size: 512,
            input: TensorSpec { shape: vec![1, 64], dtype: TensorType::UInt8 },
            output: TensorSpec { shape: vec![1, 1], dtype: TensorType::UInt8 },
            op: PoolOp::MaxPool,
        }
        .to_bytes()
    }

    fn router(backend: BackendKind, enabled: bool, version: u32) -> BackendRouter {
        let config = NpuConfig { inference_enabled: enabled, backend, ..NpuConfig::default() };
        BackendRouter::new(&config, ReferenceRuntime::new(), model_bytes(version))
    }

    #[test]
    fn test_default_config() {
        let config = NpuConfig::default();
        assert!(!config.inference_enabled);
        assert_eq!(config.backend, BackendKind::Stub);
    }

    #[test]
    fn test_select_and_tag() {
        let r = router(BackendKind::Stub, true, RUNTIME_SCHEMA_VERSION);
        assert_eq!(r.select(), BackendKind::Stub);
        assert_eq!(r.tag(), 'S');
        let r = router(BackendKind::Neutron, true, RUNTIME_SCHEMA_VERSION);
        assert_eq!(r.select(), BackendKind::Neutron);
        assert_eq!(r.tag(), 'N');
    }

    #[test]
    fn test_disabled_gate_blocks_every_backend() {
        let motion = MotionSample::new(100, 0);

        let mut stub = router(BackendKind::Stub, false, RUNTIME_SCHEMA_VERSION);
        assert!(stub.init().is_ok());
        assert_eq!(stub.state(), BackendState::Ready);
        assert_eq!(stub.step(&motion), Err(NpuError::InferenceDisabled));
        assert!(!stub.is_ready());

        let mut neutron = router(BackendKind::Neutron, false, RUNTIME_SCHEMA_VERSION);
        assert_eq!(neutron.init(), Err(NpuError::InferenceDisabled));
        assert_eq!(neutron.state(), BackendState::Uninitialized);
        assert_eq!(neutron.step(&motion), Err(NpuError::InferenceDisabled));
    }

    #[test]
    fn test_step_before_init() {
        let mut r = router(BackendKind::Stub, true, RUNTIME_SCHEMA_VERSION);
        assert_eq!(r.step(&MotionSample::new(1, 1)), Err(NpuError::NotReady));
    }

    #[test]
    fn test_stub_enabled_produces_glint() {
        let mut r = BackendRouter::stub(true);
        r.init().unwrap();
        assert!(r.is_ready());
        assert_eq!(r.step(&MotionSample::new(100, 50)), Ok(150));
        assert_eq!(r.step(&MotionSample::new(300, 0)), Ok(255));
    }

    #[test]
    fn test_neutron_enabled_produces_glint() {
        let mut r = router(BackendKind::Neutron, true, RUNTIME_SCHEMA_VERSION);
        r.init().unwrap();
        assert_eq!(r.step(&MotionSample::new(0, 0)), Ok(127));
        assert_eq!(r.step(&MotionSample::new(80, 0)), Ok(202));
    }

    #[test]
    fn test_neutron_init_failure_disables_router() {
        let mut r = router(BackendKind::Neutron, true, 1);
        assert!(matches!(r.init(), Err(NpuError::SchemaVersionMismatch { .. })));
        assert_eq!(r.state(), BackendState::Failed);
        assert!(!r.is_ready());
        for _ in 0..3 {
            assert_eq!(r.step(&MotionSample::new(10, 10)), Err(NpuError::NotReady));
        }
    }

    #[test]
    fn test_oversized_model_leaves_router_failed() {
        let model = ModelDoc {
            version: RUNTIME_SCHEMA_VERSION,
            arena_size: 1024,
            input: TensorSpec { shape: vec![65536; 4], dtype: TensorType::UInt8 },
            output: TensorSpec { shape: vec![1, 1], dtype: TensorType::UInt8 },
            op: PoolOp::MaxPool,
        }
        .to_bytes();
        let config = NpuConfig { inference_enabled: true, backend: BackendKind::Neutron, ..NpuConfig::default() };
        let mut r = BackendRouter::new(&config, ReferenceRuntime::new(), model);

        assert!(matches!(r.init(), Err(NpuError::ModelInvalid(_))));
        assert_eq!(r.state(), BackendState::Failed);
        assert_eq!(r.step(&MotionSample::new(10, 10)), Err(NpuError::NotReady));
    }

    #[test]
    fn test_arena_limit_from_config() {
        let config = NpuConfig {
            inference_enabled: true,
            backend: BackendKind::Neutron,
            arena_limit: 256,
        };
        let mut r = BackendRouter::new(&config, ReferenceRuntime::new(), model_bytes(RUNTIME_SCHEMA_VERSION));
        assert_eq!(
            r.init(),
            Err(NpuError::ArenaLimitExceeded { requested: 512, limit: 256 })
        );
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: NpuConfig = serde_json::from_str(r#"{"backend":"neutron"}"#).unwrap();
        assert_eq!(config.backend, BackendKind::Neutron);
        assert!(!config.inference_enabled);
        assert_eq!(config.arena_limit, DEFAULT_ARENA_LIMIT);
    }
}
