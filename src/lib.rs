//! # gravity-obs
//!
//! Generate GRAVITY observing blocks (OBs) from a declarative YAML
//! configuration and upload them to the ESO proposal service.
//!
//! The core is the template-generation engine: it turns a list of named
//! objects, coordinate declarations and an observing-sequence string into
//! an ordered collection of instrument templates (acquisition plus science
//! exposures) with correctly accumulated sky offsets, across the six
//! observing-mode variants (single/dual field, on/off-axis, wide field).
//!
//! ## Architecture
//!
//! - [`config`]: YAML configuration model (`setup` + `ObservingBlocks`)
//! - [`coord`]: coordinate-system normalization and sky geometry
//! - [`templates`]: ordered instrument-parameter mappings with fixed
//!   per-kind schemas and service-side versioning
//! - [`ob`]: the per-OB state machine generating templates and acquisition
//! - [`remote`]: collaborator interfaces (proposal service, name resolver,
//!   ephemeris predictor) and their HTTP implementations
//! - [`sync`]: the create-then-update upload flow
//!
//! Processing is strictly sequential and synchronous: one OB is generated,
//! resolved, confirmed and uploaded before the next begins.

pub mod config;
pub mod coord;
pub mod error;
pub mod ob;
pub mod remote;
pub mod sync;
pub mod templates;


pub use error::{ConfigError, Error, ResolveError, Result, SyncError};
