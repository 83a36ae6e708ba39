//! Goal Chase demo entry point
//!
//! Runs the engine against a simulated pose stream: a vehicle that drives
//! toward each goal and an alignment tool sitting in front of it. Time is
//! derived from the frame counter so a full round plays out in a few seconds.
//! The producer stays in lockstep with the engine so it always steers toward
//! the current goal.
//!
//! Usage: `goal-chase [config.json] [seed]`

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use glam::{DQuat, DVec3};

use goal_chase::engine::Clock;
use goal_chase::math::QuatLayout;
use goal_chase::{Config, Engine, EngineHandle, Error, GameEvent};

/// Simulated stream rate
const STREAM_FPS: f64 = 60.0;
/// Simulated vehicle top speed (m/s)
const VEHICLE_SPEED: f64 = 0.4;
/// Simulated vehicle turn rate (rad/s)
const VEHICLE_TURN_RATE: f64 = 3.0;
/// Longest wait for the engine to publish a frame
const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> goal_chase::Result<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(time_seed);
    log::info!("Goal Chase (simulated stream) starting, seed {}", seed);

    let frames = Arc::new(AtomicU64::new(0));
    let clock_frames = Arc::clone(&frames);
    let clock: Clock = Arc::new(move || clock_frames.load(Ordering::SeqCst) as f64 / STREAM_FPS);

    let handle = Engine::spawn_with_clock(config.clone(), seed, clock)?;
    let sink = handle.sink();

    let player_id = config.bodies.player;
    let alignment_id = config.bodies.alignment;
    let alignment = DVec3::new(0.0, 0.5, 0.0);
    let mut position = DVec3::ZERO;
    let mut yaw = 0.0_f64;
    let dt = 1.0 / STREAM_FPS;
    let total_frames = ((config.round_duration_secs + 2.0) * STREAM_FPS) as u64;

    for frame in 0..total_frames {
        frames.store(frame, Ordering::SeqCst);
        if frame == STREAM_FPS as u64 {
            handle.start_round()?;
        }

        if let Some(goal) = handle.snapshot().goal {
            steer(&mut position, &mut yaw, goal, dt);
        }

        let q = DQuat::from_rotation_z(yaw);
        sink.pose(player_id, position.to_array(), raw_quat(q, config.quat_layout))?;
        sink.pose(
            alignment_id,
            alignment.to_array(),
            raw_quat(DQuat::IDENTITY, config.quat_layout),
        )?;
        sink.frame_tick()?;
        wait_for_frame(&handle, frame + 1)?;

        for event in handle.drain_events() {
            if let GameEvent::RoundEnded { score, .. } = event {
                log::info!("Simulated driver scored {}", score);
            }
        }
    }

    let snapshot = handle.shutdown();
    log::info!(
        "Finished after {} frames: phase {:?}, high score {}",
        snapshot.frame,
        snapshot.phase,
        snapshot.high_score
    );
    Ok(())
}

/// Block until the engine has published frame `frame`
fn wait_for_frame(handle: &EngineHandle, frame: u64) -> goal_chase::Result<()> {
    let start = Instant::now();
    while handle.snapshot().frame < frame {
        if start.elapsed() > FRAME_TIMEOUT {
            return Err(Error::EngineStopped);
        }
        std::thread::yield_now();
    }
    Ok(())
}

/// Turn toward the goal at a bounded rate and drive forward
fn steer(position: &mut DVec3, yaw: &mut f64, goal: DVec3, dt: f64) {
    let to_goal = (goal - *position).truncate();
    if to_goal.length() < 1e-6 {
        return;
    }
    let wanted = to_goal.y.atan2(to_goal.x);
    let turn = goal_chase::normalize_angle(wanted - *yaw);
    let max_turn = VEHICLE_TURN_RATE * dt;
    *yaw = goal_chase::normalize_angle(*yaw + turn.clamp(-max_turn, max_turn));

    // Slow down while facing away from the goal
    let speed = VEHICLE_SPEED * turn.cos().max(0.0);
    position.x += yaw.cos() * speed * dt;
    position.y += yaw.sin() * speed * dt;
}

/// Encode a quaternion the way the configured stream would deliver it
fn raw_quat(q: DQuat, layout: QuatLayout) -> [f64; 4] {
    match layout {
        QuatLayout::Wxyz => [q.w, q.x, q.y, q.z],
        QuatLayout::Xyzw => [q.x, q.y, q.z, q.w],
    }
}

fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(duration_seed)
        .unwrap_or(0)
}

/// Fold a duration into a seed without dropping its high bits
fn duration_seed(d: Duration) -> u64 {
    d.as_secs() ^ u64::from(d.subsec_nanos())
}
