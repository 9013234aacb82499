//! Contact points attached to the rigid body.

use lander_math::{Mat2, Vec2};

use crate::config::{ColliderConfig, ColliderRole, VehicleConfig};

/// A fixed contact point on the body and its per-step contact state.
#[derive(Debug, Clone)]
pub struct Collider {
    local_position: Vec2,
    strength: Mat2,
    role: ColliderRole,
    /// Resolved by the bounce pass during the last step.
    pub(crate) collided: bool,
    /// Resolved by the settle pass during the last step.
    pub(crate) contacted: bool,
    /// Impulse applied here during the last step, in the collider frame.
    pub(crate) impulse: Vec2,
}

impl Collider {
    /// Create a collider at `local_position` (body frame).
    pub fn new(local_position: Vec2, strength: Mat2, role: ColliderRole) -> Self {
        Self {
            local_position,
            strength,
            role,
            collided: false,
            contacted: false,
            impulse: Vec2::zeros(),
        }
    }

    /// Build a collider from its configuration entry.
    pub fn from_config(vehicle: &VehicleConfig, config: &ColliderConfig) -> Self {
        Self::new(
            vehicle.body_position(config),
            config.strength.matrix(),
            config.role,
        )
    }

    /// Offset from the body origin in body coordinates.
    pub fn local_position(&self) -> Vec2 {
        self.local_position
    }

    /// Impulse-to-stress matrix.
    pub fn strength(&self) -> &Mat2 {
        &self.strength
    }

    /// Collider role.
    pub fn role(&self) -> ColliderRole {
        self.role
    }

    /// Whether the bounce pass resolved an impact here this step.
    pub fn collided(&self) -> bool {
        self.collided
    }

    /// Whether the settle pass resolved a contact here this step.
    pub fn contacted(&self) -> bool {
        self.contacted
    }

    /// Impulse accumulated this step, in the collider's local frame.
    pub fn accumulated_impulse(&self) -> Vec2 {
        self.impulse
    }

    /// Unitless stress of this step's accumulated impulse.
    pub fn stress(&self) -> f64 {
        (self.strength * self.impulse).norm()
    }

    pub(crate) fn reset_collision(&mut self) {
        self.collided = false;
        self.contacted = false;
        self.impulse = Vec2::zeros();
    }
}
