//! Gym-style episode interface over the lander simulator.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ColliderRole, LanderConfig};
use crate::error::{LanderError, Result};
use crate::simulator::{InitialConditions, LanderAction, LanderSimulator, LanderStatus};

/// Observation of the lander state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Center of mass position in meters.
    pub position: [f64; 2],
    /// Linear velocity in m/s.
    pub velocity: [f64; 2],
    /// Rotation in radians.
    pub rotation: f64,
    /// Angular velocity in rad/s.
    pub angular_velocity: f64,
    /// Worst structural stress this episode.
    pub breakage: f64,
    /// Settled ground contact per leg collider, in collider order.
    pub leg_contacts: Vec<bool>,
    /// Deepest collider ground penetration; zero when clear of the ground.
    pub min_y: f64,
}

impl Observation {
    /// Flatten into a feature vector. Contacts are encoded as 0.0 or 1.0.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut v = Vec::with_capacity(8 + self.leg_contacts.len());
        v.extend_from_slice(&self.position);
        v.extend_from_slice(&self.velocity);
        v.push(self.rotation);
        v.push(self.angular_velocity);
        v.push(self.breakage);
        v.extend(self.leg_contacts.iter().map(|&c| if c { 1.0 } else { 0.0 }));
        v.push(self.min_y);
        v
    }
}

/// Episode status reported by [`LanderEnv::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    /// Episode continues.
    Running,
    /// The lander crashed.
    Crashed,
    /// The lander landed.
    Landed,
    /// The step limit was reached first.
    TimedOut,
}

impl EpisodeStatus {
    /// Whether the episode is over.
    pub fn is_done(self) -> bool {
        self != EpisodeStatus::Running
    }
}

/// Result of one environment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// State after the step.
    pub observation: Observation,
    /// Episode status after the step.
    pub status: EpisodeStatus,
    /// Shorthand for `status.is_done()`.
    pub done: bool,
}

/// Environment stepping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Simulation timestep in seconds.
    pub dt: f64,
    /// Simulation updates per environment step.
    pub substeps: u32,
    /// Episode length limit in environment steps.
    pub max_steps: Option<u32>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,
            substeps: 5,
            max_steps: None,
        }
    }
}

impl EnvConfig {
    /// Check the stepping parameters.
    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(LanderError::InvalidEnvironment(format!(
                "dt must be positive and finite, got {}",
                self.dt
            )));
        }
        if self.substeps == 0 {
            return Err(LanderError::InvalidEnvironment(
                "substeps must be at least 1".to_string(),
            ));
        }
        if self.max_steps == Some(0) {
            return Err(LanderError::InvalidEnvironment(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lander environment for RL training.
pub struct LanderEnv {
    /// The simulator.
    sim: LanderSimulator,
    /// Stepping parameters.
    config: EnvConfig,
    /// Environment steps taken this episode.
    current_step: u32,
}

impl LanderEnv {
    /// Create an environment from a lander and a stepping configuration.
    ///
    /// The episode starts from [`InitialConditions::default`].
    pub fn new(lander: LanderConfig, config: EnvConfig) -> Result<Self> {
        config.validate()?;
        let sim = LanderSimulator::new(lander)?;

        Ok(Self {
            sim,
            config,
            current_step: 0,
        })
    }

    /// Start a new episode.
    ///
    /// Returns the initial observation.
    pub fn reset(&mut self, initial: InitialConditions) -> Observation {
        self.sim.reset(&initial);
        self.current_step = 0;

        self.observe()
    }

    /// Step the environment with an action.
    ///
    /// Substeps stop early once the lander crashes or lands. Stepping a
    /// finished episode returns the current state without advancing it.
    pub fn step(&mut self, action: LanderAction) -> StepResult {
        let was_done = self.status().is_done();
        if !was_done {
            self.sim.set_action(action);

            for _ in 0..self.config.substeps {
                self.sim.update(self.config.dt);
                if self.sim.status() != LanderStatus::Running {
                    break;
                }
            }

            self.current_step += 1;
        }

        let status = self.status();
        if status.is_done() && !was_done {
            debug!(step = self.current_step, ?status, "episode finished");
        }

        StepResult {
            observation: self.observe(),
            status,
            done: status.is_done(),
        }
    }

    /// Current episode status.
    pub fn status(&self) -> EpisodeStatus {
        match self.sim.status() {
            LanderStatus::Crashed => EpisodeStatus::Crashed,
            LanderStatus::Landed => EpisodeStatus::Landed,
            LanderStatus::Running => match self.config.max_steps {
                Some(max) if self.current_step >= max => EpisodeStatus::TimedOut,
                _ => EpisodeStatus::Running,
            },
        }
    }

    /// Get current observation without stepping.
    pub fn observe(&self) -> Observation {
        let body = self.sim.body();
        let position = body.position();
        let velocity = body.velocity();

        let leg_contacts = body
            .colliders()
            .iter()
            .filter(|c| c.role() == ColliderRole::Leg)
            .map(|c| c.contacted())
            .collect();

        Observation {
            position: [position.x, position.y],
            velocity: [velocity.x, velocity.y],
            rotation: body.rotation(),
            angular_velocity: body.angular_velocity(),
            breakage: body.breakage(),
            leg_contacts,
            min_y: body.min_y(),
        }
    }

    /// Length of [`Observation::to_vec`].
    pub fn observation_dim(&self) -> usize {
        8 + self.num_legs()
    }

    /// Action dimension: thrust and rcs.
    pub fn action_dim(&self) -> usize {
        2
    }

    /// Environment steps taken this episode.
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// Stepping parameters.
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// The underlying simulator.
    pub fn simulator(&self) -> &LanderSimulator {
        &self.sim
    }

    fn num_legs(&self) -> usize {
        self.sim
            .body()
            .colliders()
            .iter()
            .filter(|c| c.role() == ColliderRole::Leg)
            .count()
    }
}
