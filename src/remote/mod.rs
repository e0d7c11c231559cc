//! Interfaces to the external collaborators: the proposal service, the
//! target name resolver and the ephemeris predictor.
//!
//! The generation engine only talks to these traits; the reqwest-backed
//! implementations live in [`p2`] and [`simbad`], and tests substitute
//! in-memory fakes.

use chrono::NaiveDate;

use crate::error::{Error, ResolveError, SyncError};
use crate::templates::Params;

pub mod p2;
pub mod simbad;

/// Numeric identifier of an item (run container, folder, OB, template) on
/// the proposal service.
pub type ItemId = i64;

/// One observing run visible to the authenticated user.
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Program identifier, e.g. `60.A-9252(M)`.
    pub prog_id: String,
    /// Root container of the run.
    pub container_id: ItemId,
}

/// Kind of item inside a run container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    Concatenation,
    Ob,
}

/// One item inside a run container.
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
}

/// Target fields attached to an OB on the proposal service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObTarget {
    pub name: String,
    /// Sexagesimal RA, `HH:MM:SS.sss`.
    pub ra: String,
    /// Sexagesimal Dec, `+DD:MM:SS.sss`.
    pub dec: String,
    /// Proper motion in RA, arcsec/yr.
    pub pm_ra: f64,
    /// Proper motion in Dec, arcsec/yr.
    pub pm_dec: f64,
}

/// Remote proposal service (ESO P2 or a stand-in).
///
/// Calls are synchronous and blocking; there is no retry policy, a failed
/// call surfaces immediately and halts the current OB.
pub trait ProposalService {
    /// Enumerate the runs visible to the authenticated user.
    fn list_runs(&self) -> Result<Vec<RunRecord>, SyncError>;

    /// Find a named item in a container, optionally filtered by kind.
    fn find_item(
        &self,
        container_id: ItemId,
        name: &str,
        kind: Option<ItemKind>,
    ) -> Result<Option<ItemRecord>, SyncError>;

    /// Create a folder inside a container.
    fn create_folder(&self, container_id: ItemId, name: &str) -> Result<ItemRecord, SyncError>;

    /// Create a concatenation inside a container.
    fn create_concatenation(
        &self,
        container_id: ItemId,
        name: &str,
    ) -> Result<ItemRecord, SyncError>;

    /// Create an observing block inside a container.
    fn create_ob(&self, container_id: ItemId, name: &str) -> Result<ItemRecord, SyncError>;

    /// Set the target fields of an OB.
    fn set_ob_target(&self, ob_id: ItemId, target: &ObTarget) -> Result<(), SyncError>;

    /// Create a template under an OB. Returns the template id and its
    /// initial version number.
    fn create_template(
        &self,
        ob_id: ItemId,
        template_name: &str,
    ) -> Result<(ItemId, i64), SyncError>;

    /// Push the full parameter mapping of a template, with optimistic
    /// version checking. Returns the new version number.
    fn set_template_params(
        &self,
        ob_id: ItemId,
        template_id: ItemId,
        params: &Params,
        version: i64,
    ) -> Result<i64, SyncError>;
}

/// A record returned by the name resolver for a single, unambiguous target.
#[derive(Debug, Clone, Default)]
pub struct TargetRecord {
    pub name: String,
    /// ICRS right ascension, degrees.
    pub ra_deg: f64,
    /// ICRS declination, degrees.
    pub dec_deg: f64,
    /// Proper motion in RA, arcsec/yr.
    pub pm_ra: Option<f64>,
    /// Proper motion in Dec, arcsec/yr.
    pub pm_dec: Option<f64>,
    /// Parallax, mas.
    pub parallax_mas: Option<f64>,
    pub mag_g: Option<f64>,
    pub mag_h: Option<f64>,
    pub mag_k: Option<f64>,
}

/// Sky-coordinate resolution from an astronomical name-lookup service.
///
/// Multiple-match and no-match results are fatal for the current OB.
pub trait TargetResolver {
    fn resolve(&self, name: &str) -> Result<TargetRecord, ResolveError>;
}

/// Predicted position of a solar-system body relative to its host star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedPosition {
    pub dra_mas: f64,
    pub ddec_mas: f64,
    pub sep_mas: f64,
    pub pa_deg: f64,
}

/// Ephemeris-based planet-position prediction, an optional collaborator.
pub trait EphemerisPredictor {
    fn predict(&self, body: &str, date: NaiveDate) -> Result<PredictedPosition, Error>;
}

/// Stand-in used when no ephemeris predictor is wired in. Any `ephemeris`
/// coordinate declaration then fails with a configuration error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEphemeris;

impl EphemerisPredictor for NoEphemeris {
    fn predict(&self, _body: &str, _date: NaiveDate) -> Result<PredictedPosition, Error> {
        Err(crate::error::ConfigError::EphemerisUnavailable.into())
    }
}
