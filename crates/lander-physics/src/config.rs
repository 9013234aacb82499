//! Vehicle and environment configuration.
//!
//! Every physical constant, collider, action limit and outcome threshold
//! lives here, so alternate vehicles can be simulated without touching the
//! solver. [`LanderConfig::default`] is the reference lunar lander.

use std::f64::consts::PI;
use std::path::Path;

use lander_math::{mat2_from_rows, Mat2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{LanderError, Result};

/// What a collider is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColliderRole {
    /// Landing foot. Touchdown is judged on these.
    Leg,
    /// Load-bearing leg structure that is not a touchdown point.
    Strut,
    /// Point on the vehicle body.
    Hull,
}

/// How a collider converts accumulated impulse into stress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrengthSpec {
    /// A strut along `direction` (radians, body frame) that tolerates
    /// `strength` N·s axially and `strength * shear_ratio` N·s across.
    Strut {
        /// Axial impulse capacity in N·s.
        strength: f64,
        /// Shear capacity as a fraction of `strength`.
        shear_ratio: f64,
        /// Strut axis angle in radians.
        direction: f64,
    },
    /// Identity mapping: any impulse above 1 N·s is a failure.
    Rigid,
    /// Explicit row-major strength matrix.
    Matrix {
        /// Matrix rows.
        rows: [[f64; 2]; 2],
    },
}

impl StrengthSpec {
    /// The 2x2 matrix mapping a local-frame impulse to a stress vector.
    pub fn matrix(&self) -> Mat2 {
        match *self {
            StrengthSpec::Strut {
                strength,
                shear_ratio,
                direction,
            } => {
                let shear = strength * shear_ratio;
                let (sin, cos) = direction.sin_cos();
                mat2_from_rows([
                    [cos / strength, sin / strength],
                    [-sin / shear, cos / shear],
                ])
            }
            StrengthSpec::Rigid => Mat2::identity(),
            StrengthSpec::Matrix { rows } => mat2_from_rows(rows),
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            StrengthSpec::Strut {
                strength,
                shear_ratio,
                direction,
            } => {
                positive("strength", strength)?;
                positive("shear_ratio", shear_ratio)?;
                finite("direction", direction)
            }
            StrengthSpec::Rigid => Ok(()),
            StrengthSpec::Matrix { rows } => rows
                .iter()
                .flatten()
                .try_for_each(|&v| finite("strength matrix entry", v)),
        }
    }
}

/// Maps normalized image coordinates (`[0, 1]`, `y` up) into body
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFrame {
    /// Meters per image unit (applied to both axes).
    pub scale: f64,
    /// Body origin (center of mass) in image coordinates.
    pub origin: [f64; 2],
}

impl ImageFrame {
    /// Map an image-space point into body coordinates.
    pub fn to_body(&self, x: f64, y: f64) -> Vec2 {
        Vec2::new(
            (x - self.origin[0]) * self.scale,
            (y - self.origin[1]) * self.scale,
        )
    }
}

/// One contact point on the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderConfig {
    /// Offset from the center of mass. Body meters, or image units when the
    /// vehicle declares a [`ImageFrame`].
    pub position: [f64; 2],
    /// Collider role.
    pub role: ColliderRole,
    /// Load capacity.
    pub strength: StrengthSpec,
}

/// Rigid-body constants and geometry of a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Mass in kg.
    pub mass: f64,
    /// Moment of inertia about the center of mass in kg·m².
    pub moment_of_inertia: f64,
    /// Coulomb static friction coefficient.
    pub static_friction: f64,
    /// Coulomb kinetic friction coefficient.
    pub kinetic_friction: f64,
    /// Restitution used by the bounce pass.
    pub restitution: f64,
    /// Optional image frame that collider positions are expressed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<ImageFrame>,
    /// Contact points, in solver tie-break order.
    pub colliders: Vec<ColliderConfig>,
}

impl VehicleConfig {
    /// Collider position in body coordinates.
    pub fn body_position(&self, collider: &ColliderConfig) -> Vec2 {
        let [x, y] = collider.position;
        match &self.frame {
            Some(frame) => frame.to_body(x, y),
            None => Vec2::new(x, y),
        }
    }

    /// Check that the vehicle describes a physically usable body.
    pub fn validate(&self) -> Result<()> {
        positive("mass", self.mass)?;
        positive("moment_of_inertia", self.moment_of_inertia)?;
        non_negative("static_friction", self.static_friction)?;
        non_negative("kinetic_friction", self.kinetic_friction)?;
        non_negative("restitution", self.restitution)?;
        if self.kinetic_friction > self.static_friction {
            return Err(LanderError::FrictionOrder {
                static_: self.static_friction,
                kinetic: self.kinetic_friction,
            });
        }
        if let Some(frame) = &self.frame {
            positive("frame.scale", frame.scale)?;
        }
        if self.colliders.is_empty() {
            return Err(LanderError::NoColliders);
        }
        if !self.colliders.iter().any(|c| c.role == ColliderRole::Leg) {
            return Err(LanderError::NoLegColliders);
        }
        for collider in &self.colliders {
            finite("collider position", collider.position[0])?;
            finite("collider position", collider.position[1])?;
            collider.strength.validate()?;
        }
        Ok(())
    }
}

/// Strut strength of the reference lander's legs, in N·s.
const LEG_STRENGTH: f64 = 3.0e4;
const LEG_SHEAR_RATIO: f64 = 0.4;

fn leg_strut(x: f64, y: f64, role: ColliderRole, direction: f64) -> ColliderConfig {
    ColliderConfig {
        position: [x, y],
        role,
        strength: StrengthSpec::Strut {
            strength: LEG_STRENGTH,
            shear_ratio: LEG_SHEAR_RATIO,
            direction,
        },
    }
}

fn hull_point(x: f64, y: f64) -> ColliderConfig {
    ColliderConfig {
        position: [x, y],
        role: ColliderRole::Hull,
        strength: StrengthSpec::Rigid,
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: 11036.4,
            moment_of_inertia: 28258.7,
            static_friction: 1.0,
            kinetic_friction: 0.9,
            restitution: 0.2,
            frame: Some(ImageFrame {
                scale: 9.0,
                origin: [0.5, 0.35],
            }),
            colliders: vec![
                leg_strut(0.0541, 0.0456, ColliderRole::Leg, PI / 6.0),
                leg_strut(0.9459, 0.0456, ColliderRole::Leg, PI * 5.0 / 6.0),
                leg_strut(0.0000, 0.0627, ColliderRole::Strut, PI / 6.0),
                leg_strut(1.0000, 0.0626, ColliderRole::Strut, PI * 5.0 / 6.0),
                hull_point(0.2251, 0.6980),
                hull_point(0.4729, 0.8348),
                hull_point(0.6211, 0.6809),
                hull_point(0.7493, 0.4929),
            ],
        }
    }
}

/// Full simulator configuration: vehicle, environment and outcome rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanderConfig {
    /// The vehicle.
    pub vehicle: VehicleConfig,
    /// Downward gravitational acceleration in m/s².
    pub gravity: f64,
    /// Maximum main-engine acceleration along the body up axis, m/s².
    pub max_thrust: f64,
    /// Maximum reaction-control angular acceleration, rad/s².
    pub max_rcs: f64,
    /// Breakage above this value is a crash.
    pub breakage_limit: f64,
    /// Horizontal speed at leg contact above which the landing is a crash, m/s.
    pub crash_speed: f64,
    /// Horizontal speed at leg contact below which the vehicle has landed, m/s.
    pub landing_speed: f64,
}

impl Default for LanderConfig {
    fn default() -> Self {
        Self {
            vehicle: VehicleConfig::default(),
            gravity: 1.622,
            max_thrust: 4.0,
            max_rcs: 0.25,
            breakage_limit: 1.0,
            crash_speed: 1.0,
            landing_speed: 0.5,
        }
    }
}

impl LanderConfig {
    /// Parse and validate a TOML configuration.
    ///
    /// Missing top-level keys fall back to the reference lander.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check every constant the simulator depends on.
    pub fn validate(&self) -> Result<()> {
        self.vehicle.validate()?;
        non_negative("gravity", self.gravity)?;
        non_negative("max_thrust", self.max_thrust)?;
        non_negative("max_rcs", self.max_rcs)?;
        positive("breakage_limit", self.breakage_limit)?;
        positive("landing_speed", self.landing_speed)?;
        positive("crash_speed", self.crash_speed)?;
        if self.crash_speed < self.landing_speed {
            return Err(LanderError::InvalidParameter {
                name: "crash_speed",
                value: self.crash_speed,
            });
        }
        Ok(())
    }
}

fn finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LanderError::InvalidParameter { name, value })
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(LanderError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(LanderError::InvalidParameter { name, value })
    }
}
