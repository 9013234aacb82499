//! Error types for lander configuration.

use thiserror::Error;

/// Errors raised while loading or validating a lander configuration.
///
/// The simulation itself never fails; every fallible check happens once,
/// when a configuration is turned into a simulator.
#[derive(Error, Debug)]
pub enum LanderError {
    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid TOML for the expected schema.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A physical constant or limit is out of range.
    #[error("Invalid value for {name}: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The vehicle has no colliders.
    #[error("Vehicle has no colliders")]
    NoColliders,

    /// The vehicle has no collider tagged as a landing leg.
    #[error("Vehicle has no leg colliders")]
    NoLegColliders,

    /// Kinetic friction exceeds static friction.
    #[error("Kinetic friction {kinetic} exceeds static friction {static_}")]
    FrictionOrder {
        /// Static friction coefficient.
        static_: f64,
        /// Kinetic friction coefficient.
        kinetic: f64,
    },

    /// Environment stepping parameters are unusable.
    #[error("Invalid environment configuration: {0}")]
    InvalidEnvironment(String),
}

/// Result type for lander configuration.
pub type Result<T> = std::result::Result<T, LanderError>;
