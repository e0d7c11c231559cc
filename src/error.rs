//! Error types for observing-block generation and upload.
//!
//! Three kinds of failures exist, matching the three phases of a run:
//! malformed configuration ([`ConfigError`]), external name/ephemeris
//! resolution ([`ResolveError`]) and proposal-service upload
//! ([`SyncError`]). All of them abort the current OB; configuration
//! errors abort the whole run (a malformed OB must never be partially
//! uploaded).

use thiserror::Error;

/// Result type for observing-block operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed or incomplete input configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown observing mode '{mode}' in OB '{ob}'")]
    UnknownMode { ob: String, mode: String },

    #[error("unknown coordinate system '{0}'")]
    UnknownCoordSystem(String),

    #[error("invalid 'coord' value for coordinate system '{system}'")]
    InvalidCoord { system: String },

    #[error("no '{key}' specified in OB '{ob}'")]
    MissingTarget { ob: String, key: &'static str },

    #[error("object with label '{label}' from sequence not found in OB '{ob}'")]
    UnknownLabel { ob: String, label: String },

    #[error("sequence '{sequence}' in OB '{ob}' contains more than one object")]
    MultipleObjects { ob: String, sequence: String },

    #[error("sequence '{sequence}' in OB '{ob}' references no object")]
    NoObject { ob: String, sequence: String },

    #[error(
        "sequence '{sequence}' in OB '{ob}' contains objects with different {setting}. \
         Please split them on different lines"
    )]
    InconsistentSettings {
        ob: String,
        sequence: String,
        setting: &'static str,
    },

    #[error("'swap' is only valid in dual off-axis sequences (OB '{ob}')")]
    SwapNotAllowed { ob: String },

    #[error("science positions in OB '{ob}' average to zero, acquisition direction is undefined")]
    DegenerateAcquisition { ob: String },

    #[error("'ephemeris' used as a coord_syst, but no ephemeris predictor is available")]
    EphemerisUnavailable,

    #[error("cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Name-lookup or ephemeris failures.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("target '{0}' is not known by the name resolver")]
    NotFound(String),

    #[error("multiple matches for target '{0}', the name is ambiguous")]
    Ambiguous(String),

    #[error("ephemeris prediction for '{0}' returned no solution")]
    NoSolution(String),

    #[error(
        "{band} band magnitude not found for target '{target}'. \
         Please specify it with '{key}: xx' in the YAML"
    )]
    MissingMagnitude {
        target: String,
        band: char,
        key: &'static str,
    },

    #[error("name resolver request failed: {0}")]
    Service(String),
}

/// Remote proposal-service call made out of order or rejected.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("template '{template}' synced before being created on the service")]
    OutOfOrder { template: String },

    #[error("OB '{ob}' synced before its templates were generated")]
    NotGenerated { ob: String },

    #[error("templates for OB '{ob}' were already generated")]
    AlreadyGenerated { ob: String },

    #[error("run '{0}' not found on the proposal service")]
    RunNotFound(String),

    #[error("proposal service request failed: {0}")]
    Service(String),
}

/// Crate-level error, one variant per failure kind.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
