//! The lander vehicle: thrust, reaction control, and touchdown outcomes.

use lander_math::{rotation, Vec2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::body::RigidBody;
use crate::config::{ColliderRole, LanderConfig};
use crate::error::Result;

/// Engine command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LanderAction {
    /// Main engine acceleration along the body up axis, m/s².
    pub thrust: f64,
    /// Reaction-control angular acceleration, rad/s². Positive is
    /// counter-clockwise.
    pub rcs: f64,
}

impl LanderAction {
    /// Create an action.
    pub fn new(thrust: f64, rcs: f64) -> Self {
        Self { thrust, rcs }
    }
}

/// Episode outcome so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanderStatus {
    /// Still flying or still moving on the ground.
    Running,
    /// Structural failure or touchdown too fast.
    Crashed,
    /// At rest on both legs.
    Landed,
}

/// Pose and velocity to start an episode from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Center of mass position in meters.
    pub position: [f64; 2],
    /// Linear velocity in m/s.
    pub velocity: [f64; 2],
    /// Rotation in radians.
    pub rotation: f64,
    /// Angular velocity in rad/s.
    pub angular_velocity: f64,
}

impl Default for InitialConditions {
    /// Hovering 40 m up, at rest.
    fn default() -> Self {
        Self {
            position: [0.0, 40.0],
            velocity: [0.0, 0.0],
            rotation: 0.0,
            angular_velocity: 0.0,
        }
    }
}

/// Lander simulator.
///
/// Owns one rigid body built from a validated [`LanderConfig`] and turns
/// its per-step contact results into a crashed/landed outcome. Both outcome
/// flags are absorbing until the next [`initialize`](Self::initialize).
#[derive(Debug, Clone)]
pub struct LanderSimulator {
    config: LanderConfig,
    body: RigidBody,
    crashed: bool,
    landed: bool,
    action: LanderAction,
}

impl LanderSimulator {
    /// Build a simulator and start it from [`InitialConditions::default`].
    pub fn new(config: LanderConfig) -> Result<Self> {
        config.validate()?;
        let body = RigidBody::from_config(&config.vehicle);
        let mut sim = Self {
            config,
            body,
            crashed: false,
            landed: false,
            action: LanderAction::default(),
        };
        sim.reset(&InitialConditions::default());
        Ok(sim)
    }

    /// Start a new episode from the given state.
    ///
    /// Clears the outcome, the breakage, the collider state and the action,
    /// then runs a zero-length step so contact flags reflect the new pose.
    /// An initial pose already in hard ground contact can therefore end the
    /// episode immediately.
    pub fn initialize(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        rotation: f64,
        angular_velocity: f64,
    ) {
        self.body.set_position(position);
        self.body.set_rotation(rotation);
        self.body.set_velocity(velocity);
        self.body.set_angular_velocity(angular_velocity);

        self.body.reset_collisions();
        self.body.reset_breakage();

        self.crashed = false;
        self.landed = false;
        self.action = LanderAction::default();

        debug!(
            x = position.x,
            y = position.y,
            vx = velocity.x,
            vy = velocity.y,
            rotation,
            angular_velocity,
            "episode initialized"
        );

        self.update(0.0);
    }

    /// [`initialize`](Self::initialize) from an [`InitialConditions`].
    pub fn reset(&mut self, initial: &InitialConditions) {
        self.initialize(
            Vec2::from(initial.position),
            Vec2::from(initial.velocity),
            initial.rotation,
            initial.angular_velocity,
        );
    }

    /// Set the engine command used by every following [`update`](Self::update).
    ///
    /// Thrust is clamped to `[0, max_thrust]` and rcs to
    /// `[-max_rcs, max_rcs]`. NaN components become zero.
    pub fn set_action(&mut self, action: LanderAction) {
        self.action = LanderAction {
            thrust: clamp_or_zero(action.thrust, 0.0, self.config.max_thrust),
            rcs: clamp_or_zero(action.rcs, -self.config.max_rcs, self.config.max_rcs),
        };
    }

    /// Advance the simulation by `dt` seconds and update the outcome.
    pub fn update(&mut self, dt: f64) {
        let mut accel = rotation(self.body.rotation()) * Vec2::new(0.0, self.action.thrust);
        accel.y -= self.config.gravity;

        let force = accel * self.body.mass();
        let torque = self.action.rcs * self.body.moment_of_inertia();
        self.body.update(dt, force, torque);

        self.evaluate_outcome();
    }

    fn evaluate_outcome(&mut self) {
        if self.crashed || self.landed {
            return;
        }

        let breakage = self.body.breakage();
        if breakage > self.config.breakage_limit {
            debug!(breakage, "structural failure");
            self.crashed = true;
            return;
        }

        if !self.legs_contacted() {
            return;
        }

        // Touchdown speed is horizontal; vertical impacts fail through breakage.
        let ground_speed = self.body.velocity().x.abs();
        if ground_speed > self.config.crash_speed {
            debug!(ground_speed, "touchdown too fast");
            self.crashed = true;
        } else if ground_speed < self.config.landing_speed {
            debug!(ground_speed, breakage, "landed");
            self.landed = true;
        }
    }

    /// Whether every leg collider was in settled contact during the last step.
    pub fn legs_contacted(&self) -> bool {
        self.body
            .colliders()
            .iter()
            .filter(|c| c.role() == ColliderRole::Leg)
            .all(|c| c.contacted())
    }

    /// The vehicle body.
    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    /// The configuration this simulator was built from.
    pub fn config(&self) -> &LanderConfig {
        &self.config
    }

    /// The clamped action currently applied.
    pub fn action(&self) -> LanderAction {
        self.action
    }

    /// Worst structural stress this episode.
    pub fn breakage(&self) -> f64 {
        self.body.breakage()
    }

    /// Whether the episode ended in a crash.
    pub fn crashed(&self) -> bool {
        self.crashed
    }

    /// Whether the episode ended in a landing.
    pub fn landed(&self) -> bool {
        self.landed
    }

    /// Current outcome.
    pub fn status(&self) -> LanderStatus {
        if self.crashed {
            LanderStatus::Crashed
        } else if self.landed {
            LanderStatus::Landed
        } else {
            LanderStatus::Running
        }
    }
}

fn clamp_or_zero(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LanderError;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const DT: f64 = 0.02;

    fn simulator() -> LanderSimulator {
        LanderSimulator::new(LanderConfig::default()).unwrap()
    }

    /// Center-of-mass height at which the leg feet touch the ground.
    fn leg_height(sim: &LanderSimulator) -> f64 {
        -sim.body().colliders()[0].local_position().y
    }

    /// Run until the episode ends, checking outcome invariants on the way.
    fn run_episode(sim: &mut LanderSimulator, max_steps: usize) -> LanderStatus {
        let mut breakage = sim.breakage();
        for _ in 0..max_steps {
            if sim.status() != LanderStatus::Running {
                break;
            }
            sim.update(DT);
            assert!(!(sim.crashed() && sim.landed()));
            assert!(sim.breakage() >= breakage);
            breakage = sim.breakage();
        }
        sim.status()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = LanderConfig::default();
        config.vehicle.moment_of_inertia = -1.0;
        assert!(matches!(
            LanderSimulator::new(config),
            Err(LanderError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_new_starts_running() {
        let sim = simulator();
        assert_eq!(sim.status(), LanderStatus::Running);
        assert_eq!(sim.body().position(), Vec2::new(0.0, 40.0));
        assert_eq!(sim.breakage(), 0.0);
    }

    #[test]
    fn test_set_action_clamps() {
        let mut sim = simulator();

        sim.set_action(LanderAction::new(10.0, 1.0));
        assert_eq!(sim.action(), LanderAction::new(4.0, 0.25));

        sim.set_action(LanderAction::new(-3.0, -1.0));
        assert_eq!(sim.action(), LanderAction::new(0.0, -0.25));

        sim.set_action(LanderAction::new(2.0, 0.1));
        assert_eq!(sim.action(), LanderAction::new(2.0, 0.1));

        sim.set_action(LanderAction::new(f64::NAN, f64::NAN));
        assert_eq!(sim.action(), LanderAction::default());
    }

    #[test]
    fn test_action_persists_across_updates() {
        let mut sim = simulator();
        sim.set_action(LanderAction::new(4.0, 0.0));

        for _ in 0..10 {
            sim.update(DT);
        }

        assert_eq!(sim.action(), LanderAction::new(4.0, 0.0));
        let expected = (4.0 - 1.622) * DT * 10.0;
        assert_relative_eq!(sim.body().velocity().y, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_thrust_follows_body_axis() {
        let mut sim = simulator();
        sim.initialize(Vec2::new(0.0, 40.0), Vec2::zeros(), PI / 2.0, 0.0);
        sim.set_action(LanderAction::new(2.0, 0.0));

        sim.update(0.1);

        // Nose pointing left: thrust pushes toward -x.
        assert_relative_eq!(sim.body().velocity().x, -0.2, epsilon = 1e-9);
        assert_relative_eq!(sim.body().velocity().y, -0.1622, epsilon = 1e-9);
    }

    #[test]
    fn test_rcs_spins_vehicle() {
        let mut sim = simulator();
        sim.set_action(LanderAction::new(0.0, -0.25));

        sim.update(0.1);

        assert_relative_eq!(sim.body().angular_velocity(), -0.025, epsilon = 1e-12);
    }

    #[test]
    fn test_soft_vertical_touchdown_lands() {
        let mut sim = simulator();
        let h = leg_height(&sim);
        sim.initialize(Vec2::new(0.0, h + 0.05), Vec2::new(0.0, -0.2), 0.0, 0.0);

        assert_eq!(run_episode(&mut sim, 500), LanderStatus::Landed);
        assert!(sim.landed());
        assert!(!sim.crashed());
        assert!(sim.legs_contacted());
        assert!(sim.breakage() < 1.0);
    }

    #[test]
    fn test_settling_from_rest_lands() {
        let mut sim = simulator();
        let h = leg_height(&sim);
        sim.initialize(Vec2::new(0.0, h + 0.5), Vec2::zeros(), 0.0, 0.0);

        assert_eq!(run_episode(&mut sim, 500), LanderStatus::Landed);
    }

    #[test]
    fn test_hard_vertical_impact_crashes() {
        let mut sim = simulator();
        let h = leg_height(&sim);
        sim.initialize(Vec2::new(0.0, h + 1.0), Vec2::new(0.0, -5.0), 0.0, 0.0);

        assert_eq!(run_episode(&mut sim, 500), LanderStatus::Crashed);
        assert!(sim.breakage() > 1.0);
        assert!(!sim.landed());
    }

    #[test]
    fn test_vertical_touchdown_is_judged_by_breakage() {
        for speed in [1.1, 1.5, 2.0] {
            let mut sim = simulator();
            let h = leg_height(&sim);
            sim.initialize(Vec2::new(0.0, h + 0.001), Vec2::new(0.0, -speed), 0.0, 0.0);

            let status = run_episode(&mut sim, 500);

            assert_eq!(status, LanderStatus::Landed, "approach at {speed} m/s");
            assert!(sim.breakage() > 0.0);
            assert!(sim.breakage() < sim.config().breakage_limit);
        }
    }

    #[test]
    fn test_fast_horizontal_touchdown_crashes() {
        let mut sim = simulator();
        let h = leg_height(&sim);
        sim.initialize(Vec2::new(0.0, h + 0.05), Vec2::new(2.0, -0.2), 0.0, 0.0);

        assert_eq!(run_episode(&mut sim, 500), LanderStatus::Crashed);
        // Crashed on ground speed, not structure.
        assert!(sim.breakage() < 1.0);
        assert!(sim.legs_contacted());
    }

    #[test]
    fn test_single_leg_impact_breaks_strut() {
        let mut sim = simulator();
        sim.initialize(Vec2::new(0.0, 5.0), Vec2::new(0.0, -4.0), 0.3, 0.0);

        assert_eq!(run_episode(&mut sim, 500), LanderStatus::Crashed);
        assert!(sim.breakage() > 1.0);
        assert!(!sim.legs_contacted());
    }

    #[test]
    fn test_outcome_is_absorbing() {
        let mut sim = simulator();
        let h = leg_height(&sim);
        sim.initialize(Vec2::new(0.0, h + 0.05), Vec2::new(0.0, -0.2), 0.0, 0.0);
        assert_eq!(run_episode(&mut sim, 500), LanderStatus::Landed);

        // Lifting off again does not clear the outcome.
        sim.set_action(LanderAction::new(4.0, 0.0));
        for _ in 0..100 {
            sim.update(DT);
        }
        assert!(sim.body().position().y > h + 1.0);
        assert_eq!(sim.status(), LanderStatus::Landed);
    }

    #[test]
    fn test_initialize_clears_episode() {
        let mut sim = simulator();
        let h = leg_height(&sim);
        sim.initialize(Vec2::new(0.0, h + 1.0), Vec2::new(0.0, -5.0), 0.0, 0.0);
        sim.set_action(LanderAction::new(1.0, 0.1));
        run_episode(&mut sim, 500);
        assert!(sim.crashed());

        sim.initialize(Vec2::new(10.0, 30.0), Vec2::new(1.0, 0.0), 0.2, 0.0);

        assert_eq!(sim.status(), LanderStatus::Running);
        assert_eq!(sim.breakage(), 0.0);
        assert_eq!(sim.action(), LanderAction::default());
        assert_eq!(sim.body().position(), Vec2::new(10.0, 30.0));
        assert!(sim
            .body()
            .colliders()
            .iter()
            .all(|c| !c.collided() && !c.contacted()));
    }

    #[test]
    fn test_initialize_in_violent_contact_is_terminal() {
        let mut sim = simulator();
        let h = leg_height(&sim);
        sim.initialize(Vec2::new(0.0, h - 0.01), Vec2::new(0.0, -6.0), 0.0, 0.0);
        assert!(sim.crashed());
    }

    #[test]
    fn test_reset_from_initial_conditions() {
        let mut sim = simulator();
        let initial = InitialConditions {
            position: [1.0, 20.0],
            velocity: [0.5, -1.0],
            rotation: 0.1,
            angular_velocity: 0.01,
        };
        sim.reset(&initial);

        assert_eq!(sim.body().position(), Vec2::new(1.0, 20.0));
        assert_eq!(sim.body().velocity(), Vec2::new(0.5, -1.0));
        assert_eq!(sim.body().rotation(), 0.1);
        assert_eq!(sim.body().angular_velocity(), 0.01);
    }
}
