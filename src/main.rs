//! EdgeAI Sand Host Demo
//!
//! Runs the ball simulation against a scripted accelerometer and an
//! in-memory display, then verifies determinism by replaying the recorded
//! inputs.
//!
//! Environment:
//! - `EDGEAI_CONFIG`: JSON config file (optional)
//! - `EDGEAI_MODEL`: model file for the Neutron backend (optional)
//! - `EDGEAI_FRAMES`: frames to run (default 600)
//! - `EDGEAI_ENABLE_NPU_INFERENCE`, `EDGEAI_NPU_BACKEND`, `EDGEAI_ACCEL_MAP_DENOM`

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use edgeai_sand::{
    EdgeAiConfig, FrameDriver, SimInput, World, TICK_RATE, VERSION,
    npu::{
        reference::{ModelDoc, PoolOp, ReferenceRuntime, TensorSpec},
        runtime::RUNTIME_SCHEMA_VERSION,
        tensor::TensorType,
        BackendRouter,
    },
    platform::{FrameBuffer, PixelSink, ScriptedAccel},
    sim::{physics, render::{draw_ball, BallSprite, BACKGROUND_RGB565}},
};

const DEFAULT_FRAMES: u32 = 600;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("EdgeAI Sand v{}", VERSION);
    info!("Frame Rate: {} Hz", TICK_RATE);

    let config = load_config()?;
    let frames = match std::env::var("EDGEAI_FRAMES") {
        Ok(v) => v.trim().parse::<u32>().with_context(|| format!("EDGEAI_FRAMES={v:?}"))?,
        Err(_) => DEFAULT_FRAMES,
    };

    run_demo(&config, frames)
}

fn load_config() -> Result<EdgeAiConfig> {
    let mut config = match std::env::var("EDGEAI_CONFIG") {
        Ok(path) => EdgeAiConfig::load(&path).with_context(|| format!("loading {path}"))?,
        Err(_) => EdgeAiConfig::default(),
    };
    config.apply_env().context("applying environment overrides")?;
    config.validate()?;
    Ok(config)
}

/// Model bytes from `EDGEAI_MODEL`, or a small built-in pooling model.
fn load_model() -> Result<Vec<u8>> {
    match std::env::var("EDGEAI_MODEL") {
        Ok(path) => std::fs::read(&path).with_context(|| format!("reading model {path}")),
        Err(_) => Ok(ModelDoc {
            version: RUNTIME_SCHEMA_VERSION,
            arena_size: 1024,
            input: TensorSpec { shape: vec![1, 32], dtype: TensorType::UInt8 },
            output: TensorSpec { shape: vec![1, 4], dtype: TensorType::UInt8 },
            op: PoolOp::MaxPool,
        }
        .to_bytes()),
    }
}

fn run_demo(config: &EdgeAiConfig, frames: u32) -> Result<()> {
    let (width, height) = (config.display.width, config.display.height);
    info!("=== Starting Demo Run ===");
    info!(
        "Display {}x{}, backend {} ({}), inference {}",
        width,
        height,
        config.npu.backend,
        config.npu.backend.tag(),
        if config.npu.inference_enabled { "enabled" } else { "disabled" },
    );

    let mut router = BackendRouter::new(&config.npu, ReferenceRuntime::new(), load_model()?);
    if let Err(e) = router.init() {
        warn!("Backend not ready ({}), glint stays at its last value", e);
    }

    let world = World::new(width as i32, height as i32);
    let mut driver = FrameDriver::new(world, router, config.sim)
        .with_map_denom(config.display.accel_map_denom);
    let mut accel = ScriptedAccel::default();
    let mut screen = FrameBuffer::new(width, height, BACKGROUND_RGB565);

    let mut inputs: Vec<SimInput> = Vec::with_capacity(frames as usize);
    let mut bounces = 0u32;
    let mut previous: Option<BallSprite> = None;

    info!("Running {} frames...", frames);

    for f in 0..frames {
        let out = driver.run_frame(&mut accel);
        inputs.push(out.input);
        if out.bounces.any() {
            bounces += 1;
        }

        // Erase the previous ball, then draw the new one
        if let Some(old) = previous {
            let blank = BallSprite { color: BACKGROUND_RGB565, glint: 0, ..old };
            draw_ball(&mut screen, &blank, BACKGROUND_RGB565);
        }
        let sprite = driver.sprite();
        draw_ball(&mut screen, &sprite, BACKGROUND_RGB565);
        previous = Some(sprite);

        // Report every second
        if f % TICK_RATE == 0 {
            let (x, y) = out.ball.position.to_floats();
            let (vx, vy) = out.ball.velocity.to_floats();
            info!(
                "Frame {}: pos ({:.1}, {:.1}) vel ({:.1}, {:.1}) glint {} [{}]",
                f, x, y, vx, vy, out.glint, driver.router().tag()
            );
        }
    }

    // Print final results
    info!("=== Run Results ===");
    let world = driver.world();
    let (x, y) = world.ball.pixel();
    info!("Final ball pixel: ({}, {})", x, y);
    info!("Frames with bounces: {}", bounces);
    info!("Frames with inferred glint: {}/{}", driver.inferred_frames(), driver.frames());
    let (screen_w, screen_h) = screen.size();
    info!("Display writes: {} ({}x{})", screen.writes, screen_w, screen_h);

    let hash = world.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (_, replay_hash) = physics::replay(width as i32, height as i32, &inputs, &config.sim);
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        anyhow::bail!("determinism failure: replay hash differs")
    }
}
