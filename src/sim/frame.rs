//! Frame Orchestration
//!
//! One render frame runs, in order:
//!
//! ```text
//! AccelSource -> SimInput -> World::step -> MotionSample -> BackendRouter::step -> glint
//! ```
//!
//! A failed backend step is never fatal. The previous glint is kept and
//! the frame reports that inference did not produce it.

use tracing::trace;

use crate::npu::{BackendRouter, MotionSample};
use crate::platform::AccelSource;
use crate::sim::input::{SimInput, DEFAULT_ACCEL_MAP_DENOM};
use crate::sim::physics::Bounces;
use crate::sim::render::BallSprite;
use crate::sim::state::{Ball, SimParams, World};

/// Result of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameOutput {
    /// Input used for the step
    pub input: SimInput,
    /// Ball after the step, glint applied
    pub ball: Ball,
    /// Glint shown this frame
    pub glint: u8,
    /// True if the backend produced `glint` this frame
    pub inferred: bool,
    /// Walls hit during the step
    pub bounces: Bounces,
}

/// Drives the world and the glint backend once per frame.
#[derive(Debug)]
pub struct FrameDriver {
    world: World,
    router: BackendRouter,
    params: SimParams,
    map_denom: i32,
    last_input: SimInput,
    last_glint: u8,
    frames: u64,
    inferred_frames: u64,
}

impl FrameDriver {
    /// Create a driver over an initialized world and a router.
    ///
    /// The router's `init` is the caller's job; an un-initialized router
    /// simply never produces glint.
    pub fn new(world: World, router: BackendRouter, params: SimParams) -> Self {
        Self {
            world,
            router,
            params,
            map_denom: DEFAULT_ACCEL_MAP_DENOM,
            last_input: SimInput::ZERO,
            last_glint: 0,
            frames: 0,
            inferred_frames: 0,
        }
    }

    /// Override the counts-per-g used to normalize raw readings.
    pub fn with_map_denom(mut self, map_denom: i32) -> Self {
        self.map_denom = map_denom;
        self
    }

    /// Read the sensor and run a frame.
    ///
    /// A missing reading repeats the previous frame's input.
    pub fn run_frame<A: AccelSource + ?Sized>(&mut self, accel: &mut A) -> FrameOutput {
        let input = match accel.read_counts() {
            Some(counts) => SimInput::from_counts(counts, self.map_denom),
            None => self.last_input,
        };
        self.step_input(&input)
    }

    /// Run a frame from an already-normalized input.
    pub fn step_input(&mut self, input: &SimInput) -> FrameOutput {
        self.last_input = *input;
        self.world.step(input, &self.params);
        self.frames += 1;

        let motion = MotionSample::from_velocity(self.world.ball.velocity);
        let inferred = match self.router.step(&motion) {
            Ok(glint) => {
                self.last_glint = glint;
                self.inferred_frames += 1;
                true
            }
            Err(e) => {
                trace!(frame = self.frames, error = %e, "keeping previous glint");
                false
            }
        };
        self.world.ball.glint = self.last_glint;

        FrameOutput {
            input: *input,
            ball: self.world.ball,
            glint: self.last_glint,
            inferred,
            bounces: self.world.last_bounces,
        }
    }

    /// Sprite for the current ball.
    pub fn sprite(&self) -> BallSprite {
        BallSprite::from_ball(&self.world.ball, &self.params.bounds)
    }

    /// The simulated world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The backend router.
    pub fn router(&self) -> &BackendRouter {
        &self.router
    }

    /// Parameters in use.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Frames run so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames whose glint came from the backend.
    pub fn inferred_frames(&self) -> u64 {
        self.inferred_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npu::{BackendKind, BackendState, InferenceBackend, NpuError};
    use crate::platform::ScriptedAccel;
    use crate::core::fixed::Q15_MAX;
    use crate::sim::input::AccelCounts;

    fn driver(router: BackendRouter) -> FrameDriver {
        FrameDriver::new(World::new(480, 320), router, SimParams::default())
    }

    /// Succeeds on a fixed schedule, fails otherwise.
    struct Flaky {
        calls: u32,
    }

    impl InferenceBackend for Flaky {
        fn kind(&self) -> BackendKind {
            BackendKind::Neutron
        }

        fn init(&mut self) -> Result<(), NpuError> {
            Ok(())
        }

        fn step(&mut self, _motion: &MotionSample) -> Result<u8, NpuError> {
            self.calls += 1;
            match self.calls {
                1 => Ok(40),
                3 => Ok(90),
                _ => Err(NpuError::InvokeFailed("busy".into())),
            }
        }

        fn state(&self) -> BackendState {
            BackendState::Ready
        }
    }

    struct Silent;

    impl AccelSource for Silent {
        fn read_counts(&mut self) -> Option<AccelCounts> {
            None
        }
    }

    #[test]
    fn test_disabled_router_keeps_zero_glint() {
        let mut router = BackendRouter::stub(false);
        router.init().unwrap();
        let mut d = driver(router);

        let out = d.step_input(&SimInput::new(16384, 0));

        assert!(!out.inferred);
        assert_eq!(out.glint, 0);
        assert_eq!(d.world().ball.glint, 0);
        assert!(out.ball.velocity.x > 0);
    }

    #[test]
    fn test_stub_glint_tracks_speed() {
        let mut router = BackendRouter::stub(true);
        router.init().unwrap();
        let mut d = driver(router);

        let mut out = d.step_input(&SimInput::ZERO);
        for _ in 0..30 {
            out = d.step_input(&SimInput::new(Q15_MAX, 0));
        }

        let speed = MotionSample::from_velocity(out.ball.velocity);
        assert!(out.inferred);
        assert_eq!(out.glint as i32, (speed.speed_x + speed.speed_y).min(255));
        assert_eq!(d.inferred_frames(), 31);
    }

    #[test]
    fn test_failed_step_retains_previous_glint() {
        let mut router = BackendRouter::with_backend(true, Box::new(Flaky { calls: 0 }));
        router.init().unwrap();
        let mut d = driver(router);

        let glints: Vec<(u8, bool)> = (0..4)
            .map(|_| {
                let out = d.step_input(&SimInput::ZERO);
                (out.glint, out.inferred)
            })
            .collect();

        assert_eq!(glints, vec![(40, true), (40, false), (90, true), (90, false)]);
        assert_eq!(d.world().ball.glint, 90);
        assert_eq!(d.frames(), 4);
        assert_eq!(d.inferred_frames(), 2);
    }

    #[test]
    fn test_missing_reading_repeats_input() {
        let mut d = driver(BackendRouter::stub(false));
        let mut accel = ScriptedAccel::new(256, 100, 100);

        let first = d.run_frame(&mut accel);
        let repeated = d.run_frame(&mut Silent);

        assert_eq!(first.input, SimInput::new(-16384, -16384));
        assert_eq!(repeated.input, first.input);
    }

    #[test]
    fn test_map_denom_override() {
        let mut d = driver(BackendRouter::stub(false)).with_map_denom(1024);
        let mut accel = ScriptedAccel::new(256, 100, 100);
        assert_eq!(d.run_frame(&mut accel).input, SimInput::new(-8192, -8192));
    }

    #[test]
    fn test_sprite_follows_ball() {
        let mut d = driver(BackendRouter::stub(false));
        d.step_input(&SimInput::ZERO);
        let sprite = d.sprite();
        assert_eq!((sprite.cx, sprite.cy), d.world().ball.pixel());
    }
}
