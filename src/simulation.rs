use anyhow::Result;
use ballpit_common::{AimTracker, GestureConfig, Launch, SimParams, SimulationConfig, Snapshot, Vector2D, World};
use log::{debug, info, trace, warn};
use std::collections::VecDeque;

/// Drives a `World` frame by frame: replays the scripted gestures between
/// steps and records snapshots.
pub struct BallSimulation {
    /// The simulation configuration, including the scripted gestures.
    config: SimulationConfig,
    /// Runtime parameters derived from the configuration.
    params: SimParams,
    /// Steps the driver will take.
    total_frames: u64,
    /// All active balls.
    world: World,
    /// Pointer state shared across gestures (a gesture may leave the aim open).
    aim: AimTracker,
    /// Gestures not yet replayed, in frame order.
    pending_gestures: VecDeque<GestureConfig>,
    /// Number of steps taken so far.
    current_frame: u64,
    /// Collisions resolved during the most recent step.
    last_collisions: usize,
    /// Stores collected snapshots at record intervals.
    recorded_snapshots: Vec<Snapshot>,
}

impl BallSimulation {
    /// Creates a new simulation with an empty world that will run for
    /// `total_frames` steps (the config value unless overridden).
    pub fn new(config: SimulationConfig, total_frames: u64) -> Result<Self> {
        let params = config.get_sim_params();
        let world = World::from_params(&params);
        let aim = AimTracker::new(params.viewport, params.dimensions);
        let pending_gestures: VecDeque<GestureConfig> = config.gestures.iter().cloned().collect();

        let sim = Self {
            config,
            params,
            total_frames,
            world,
            aim,
            pending_gestures,
            current_frame: 0,
            last_collisions: 0,
            recorded_snapshots: Vec::new(),
        };

        let unreachable = sim.unreachable_gestures();
        if unreachable > 0 {
            warn!(
                "{} gesture(s) scheduled at or after frame {} will never run.",
                unreachable, sim.total_frames
            );
        }
        Ok(sim)
    }

    /// Pending gestures scheduled past the last simulated frame.
    pub fn unreachable_gestures(&self) -> usize {
        self.pending_gestures
            .iter()
            .filter(|g| g.frame >= self.total_frames)
            .count()
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    pub fn current_ball_count(&self) -> usize {
        self.world.len()
    }

    /// Advances the simulation by one frame.
    ///
    /// Gestures due at this frame are replayed first, so new balls take part
    /// in the step that follows.
    pub fn step(&mut self) -> Result<()> {
        while self
            .pending_gestures
            .front()
            .is_some_and(|g| g.frame <= self.current_frame)
        {
            if let Some(gesture) = self.pending_gestures.pop_front() {
                self.replay_gesture(&gesture)?;
            }
        }

        self.last_collisions = self.world.step();
        if self.last_collisions > 0 {
            trace!("Frame {}: {} collisions", self.current_frame, self.last_collisions);
        }

        self.current_frame += 1;
        Ok(())
    }

    /// Feeds one scripted gesture through the aim tracker, spawning a ball
    /// for every launch it produces.
    fn replay_gesture(&mut self, gesture: &GestureConfig) -> Result<()> {
        debug!("Replaying gesture scheduled for frame {} at frame {}", gesture.frame, self.current_frame);

        let mut launches: Vec<Launch> = Vec::new();
        launches.extend(self.aim.press(Vector2D::from(gesture.press)));
        for &point in &gesture.drag {
            launches.extend(self.aim.move_to(Vector2D::from(point)));
        }
        if gesture.release {
            launches.extend(self.aim.release());
        }

        for launch in launches {
            self.world.spawn(launch)?;
        }
        Ok(())
    }

    /// Collects the current metrics and stores them as a Snapshot.
    pub fn record_snapshot(&mut self) -> Result<()> {
        let time = self.current_frame as f64 * self.params.frame_interval_secs;
        debug!("Recording snapshot at frame {} ({:.2} s)...", self.current_frame, time);

        let balls = if self.config.output.save_positions_in_snapshot {
            Some(self.world.views().collect())
        } else {
            None
        };

        let snapshot = Snapshot {
            frame: self.current_frame,
            time,
            ball_count: self.world.len() as u32,
            grounded_count: self.world.grounded_count() as u32,
            resting_count: self.world.resting_count() as u32,
            kinetic_energy: self.world.kinetic_energy(),
            collisions: self.last_collisions as u32,
            balls,
        };
        self.recorded_snapshots.push(snapshot);

        Ok(())
    }

    /// Provides access to the recorded snapshots.
    pub fn get_recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    /// Final `(x, y, radius)` of every ball.
    pub fn get_results(&self) -> Vec<(f64, f64, f64)> {
        self.world.views().map(|v| (v.x, v.y, v.radius)).collect()
    }

    /// Logs a one-line summary of the current state.
    pub fn log_status(&self) {
        info!(
            "Frame {}/{} | Balls: {} (grounded {}, resting {}) | Kinetic energy: {:.4}",
            self.current_frame,
            self.total_frames,
            self.world.len(),
            self.world.grounded_count(),
            self.world.resting_count(),
            self.world.kinetic_energy()
        );
    }
}
