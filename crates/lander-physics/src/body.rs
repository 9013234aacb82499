//! Rigid body integration and ground contact resolution.
//!
//! The body moves in the plane above an implicit ground at `y = 0`. Contact
//! is only tested at the body's colliders. Each step runs two sequential
//! impulse passes against a predicted pose:
//!
//! - a *bounce* pass at the body's restitution, before the step's applied
//!   force is added to the velocity, and
//! - a *settle* pass that sweeps restitution from -0.9 up to 0.0 after it,
//!   so resting contacts bleed off residual approach speed without bouncing.
//!
//! Impulses are applied as soon as they are computed, so later colliders in
//! the same pass see the updated velocities.

use lander_math::{cross, perp, rotation, solve_spd, Mat2, Vec2};
use tracing::{trace, warn};

use crate::collider::Collider;
use crate::config::VehicleConfig;

/// Maximum bounce-pass iterations per step.
const BOUNCE_ITERATIONS: usize = 5;

/// Settle-pass restitution schedule runs from -0.9 to 0.0 in tenths.
const SETTLE_FIRST_TENTH: i32 = -9;

#[derive(Debug, Clone, Copy)]
enum ContactPass {
    Bounce,
    Settle,
}

#[derive(Debug, Clone, Copy)]
struct Pose {
    position: Vec2,
    rotation: f64,
}

/// A planar rigid body with point colliders.
#[derive(Debug, Clone)]
pub struct RigidBody {
    mass: f64,
    moment_of_inertia: f64,
    static_friction: f64,
    kinetic_friction: f64,
    restitution: f64,

    position: Vec2,
    rotation: f64,
    velocity: Vec2,
    angular_velocity: f64,

    colliders: Vec<Collider>,
    bounding_radius: f64,
    breakage: f64,
}

impl RigidBody {
    /// Create a body at rest at the origin.
    ///
    /// Mass and moment of inertia must be positive; see
    /// [`VehicleConfig::validate`].
    pub fn new(
        mass: f64,
        moment_of_inertia: f64,
        static_friction: f64,
        kinetic_friction: f64,
        restitution: f64,
        colliders: Vec<Collider>,
    ) -> Self {
        let bounding_radius = colliders
            .iter()
            .map(|c| c.local_position().norm())
            .fold(0.0, f64::max);

        Self {
            mass,
            moment_of_inertia,
            static_friction,
            kinetic_friction,
            restitution,
            position: Vec2::zeros(),
            rotation: 0.0,
            velocity: Vec2::zeros(),
            angular_velocity: 0.0,
            colliders,
            bounding_radius,
            breakage: 0.0,
        }
    }

    /// Create a body from a vehicle description.
    pub fn from_config(vehicle: &VehicleConfig) -> Self {
        let colliders = vehicle
            .colliders
            .iter()
            .map(|c| Collider::from_config(vehicle, c))
            .collect();

        Self::new(
            vehicle.mass,
            vehicle.moment_of_inertia,
            vehicle.static_friction,
            vehicle.kinetic_friction,
            vehicle.restitution,
            colliders,
        )
    }

    /// Advance the body by `dt` seconds under a constant `force` (N, world
    /// frame) and `torque` (N·m).
    ///
    /// `dt = 0` leaves the pose unchanged but still resolves any approaching
    /// ground contact and refreshes the collider flags.
    pub fn update(&mut self, dt: f64, force: Vec2, torque: f64) {
        let start = rotation(self.rotation);
        let jacobians: Vec<Vec2> = self
            .colliders
            .iter_mut()
            .map(|c| {
                c.reset_collision();
                start * perp(&c.local_position())
            })
            .collect();

        let delta_vel = force * (dt / self.mass);
        let delta_rot_vel = torque * (dt / self.moment_of_inertia);

        let bounce_settled = (0..BOUNCE_ITERATIONS).any(|_| {
            let predicted = self.predict(dt, delta_vel, delta_rot_vel);
            !self.process_collisions(
                self.restitution,
                &predicted,
                &jacobians,
                ContactPass::Bounce,
            )
        });

        self.velocity += delta_vel;
        self.angular_velocity += delta_rot_vel;

        let contact_settled = (SETTLE_FIRST_TENTH..=0).any(|tenths| {
            let restitution = f64::from(tenths) / 10.0;
            let predicted = self.predict(dt, Vec2::zeros(), 0.0);
            !self.process_collisions(restitution, &predicted, &jacobians, ContactPass::Settle)
        });

        if !(bounce_settled && contact_settled) {
            trace!(
                bounce_settled,
                contact_settled,
                "contact passes hit their iteration cap"
            );
        }

        self.position += self.velocity * dt;
        self.rotation += self.angular_velocity * dt;

        self.breakage = self
            .colliders
            .iter()
            .map(Collider::stress)
            .fold(self.breakage, f64::max);
    }

    fn predict(&self, dt: f64, delta_vel: Vec2, delta_rot_vel: f64) -> Pose {
        Pose {
            position: self.position + (self.velocity + delta_vel) * dt,
            rotation: self.rotation + (self.angular_velocity + delta_rot_vel) * dt,
        }
    }

    /// Resolve every penetrating, approaching collider at `predicted`,
    /// lowest first. Returns whether any impulse was applied.
    fn process_collisions(
        &mut self,
        restitution: f64,
        predicted: &Pose,
        jacobians: &[Vec2],
        pass: ContactPass,
    ) -> bool {
        if predicted.position.y > self.bounding_radius {
            return false;
        }

        let rot = rotation(predicted.rotation);
        let offsets: Vec<Vec2> = self
            .colliders
            .iter()
            .map(|c| rot * c.local_position())
            .collect();

        // Stable sort: equal heights keep collider order.
        let mut order: Vec<usize> = (0..offsets.len()).collect();
        order.sort_by(|&a, &b| offsets[a].y.total_cmp(&offsets[b].y));

        let mut resolved = false;

        for i in order {
            let offset = offsets[i];
            if predicted.position.y + offset.y > 0.0 {
                break;
            }

            let contact_vel = self.velocity + jacobians[i] * self.angular_velocity;
            if contact_vel.y >= 0.0 {
                continue;
            }

            let Some(impulse) = self.contact_impulse(&offset, &contact_vel, restitution) else {
                warn!(
                    collider = i,
                    "singular contact mass matrix, skipping collider"
                );
                continue;
            };

            self.apply_impulse(&offset, &impulse);

            let collider = &mut self.colliders[i];
            match pass {
                ContactPass::Bounce => collider.collided = true,
                ContactPass::Settle => collider.contacted = true,
            }
            collider.impulse += rot.inverse() * impulse;
            resolved = true;
        }

        resolved
    }

    /// Impulse at `offset` that cancels tangential velocity and scales the
    /// normal velocity by `-restitution`, limited by the friction cone.
    fn contact_impulse(&self, offset: &Vec2, contact_vel: &Vec2, restitution: f64) -> Option<Vec2> {
        let lever = Vec2::new(offset.y, -offset.x);
        let k: Mat2 =
            Mat2::identity() / self.mass + lever * lever.transpose() / self.moment_of_inertia;
        let target = Vec2::new(-contact_vel.x, -(1.0 + restitution) * contact_vel.y);

        let impulse = solve_spd(&k, &target)?;
        if impulse.x.abs() <= self.static_friction * impulse.y {
            return Some(impulse);
        }

        // Sliding: tangential impulse is pinned to the kinetic cone edge and
        // the normal impulse re-solved against the same normal target.
        let friction = if contact_vel.x > 0.0 {
            -self.kinetic_friction
        } else {
            self.kinetic_friction
        };
        let normal = target.y / (friction * k[(1, 0)] + k[(1, 1)]);
        Some(Vec2::new(normal * friction, normal))
    }

    fn apply_impulse(&mut self, offset: &Vec2, impulse: &Vec2) {
        self.velocity += *impulse / self.mass;
        self.angular_velocity += cross(offset, impulse) / self.moment_of_inertia;
    }

    /// Deepest ground penetration among the colliders at the current pose.
    ///
    /// Zero when no collider is below ground.
    pub fn min_y(&self) -> f64 {
        let rot = rotation(self.rotation);
        self.colliders
            .iter()
            .map(|c| -(self.position.y + (rot * c.local_position()).y))
            .fold(0.0, f64::max)
    }

    /// World-frame position of collider `index`.
    pub fn collider_world_position(&self, index: usize) -> Option<Vec2> {
        let offset = rotation(self.rotation) * self.colliders.get(index)?.local_position();
        Some(self.position + offset)
    }

    /// Clear every collider's per-step flags and impulse.
    pub fn reset_collisions(&mut self) {
        self.colliders.iter_mut().for_each(Collider::reset_collision);
    }

    /// Forget all accumulated structural damage.
    pub fn reset_breakage(&mut self) {
        self.breakage = 0.0;
    }

    /// Worst collider stress seen since the last reset.
    pub fn breakage(&self) -> f64 {
        self.breakage
    }

    /// Colliders in construction order.
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// Largest collider distance from the body origin.
    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    /// Position of the center of mass in meters.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Set the position of the center of mass.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Rotation in radians, counter-clockwise.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Set the rotation.
    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
    }

    /// Linear velocity in m/s.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Set the linear velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Angular velocity in rad/s.
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Set the angular velocity.
    pub fn set_angular_velocity(&mut self, angular_velocity: f64) {
        self.angular_velocity = angular_velocity;
    }

    /// Mass in kg.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Moment of inertia in kg·m².
    pub fn moment_of_inertia(&self) -> f64 {
        self.moment_of_inertia
    }
}
