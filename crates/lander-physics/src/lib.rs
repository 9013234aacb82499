#![warn(missing_docs)]

//! Rigid-body contact physics for a 2D planetary lander.
//!
//! A single rigid body carries a set of point colliders and meets a flat
//! ground at `y = 0`. Ground contacts are resolved with sequential impulses
//! and Coulomb friction, and the impulse taken at each collider is turned into
//! a structural stress so that hard touchdowns break the vehicle.
//!
//! # Features
//!
//! - Bounce and settle contact passes with static/kinetic friction
//! - Per-collider strength matrices and episode breakage tracking
//! - Thrust and reaction-control actuation with crash/landing outcomes
//! - TOML vehicle and environment configuration
//! - Gym-style observation/step API for RL training
//!
//! # Example
//!
//! ```ignore
//! use lander_physics::{EnvConfig, InitialConditions, LanderAction, LanderConfig, LanderEnv};
//!
//! let config = LanderConfig::from_file("lander.toml")?;
//! let mut env = LanderEnv::new(config, EnvConfig::default())?;
//!
//! env.reset(InitialConditions::default());
//! loop {
//!     let result = env.step(LanderAction::new(1.6, 0.0));
//!     if result.done {
//!         println!("{:?} with breakage {}", result.status, result.observation.breakage);
//!         break;
//!     }
//! }
//! ```

mod body;
mod collider;
mod config;
mod error;
mod gym;
mod simulator;

pub use body::RigidBody;
pub use collider::Collider;
pub use config::{
    ColliderConfig, ColliderRole, ImageFrame, LanderConfig, StrengthSpec, VehicleConfig,
};
pub use error::{LanderError, Result};
pub use gym::{EnvConfig, EpisodeStatus, LanderEnv, Observation, StepResult};
pub use simulator::{InitialConditions, LanderAction, LanderSimulator, LanderStatus};
