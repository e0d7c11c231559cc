//! YAML configuration model.
//!
//! A configuration document has a `setup` section (run identifier, folder,
//! optional concatenation, observation date, calibration flag, plus any
//! instrument-parameter overrides) and an `ObservingBlocks` section mapping
//! OB names to their mode, sequence, objects and targets. Keys that are not
//! part of the typed model are kept as free-form parameter overrides and
//! applied to templates through [`crate::templates::Template::populate_from`],
//! which discards anything outside a template's schema.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::coord::CoordDecl;
use crate::error::ConfigError;


/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct ObsConfig {
    pub setup: Setup,
    #[serde(rename = "ObservingBlocks")]
    pub observing_blocks: IndexMap<String, ObConfig>,
}

impl ObsConfig {
    /// Load a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// The `setup` section, shared by every OB in the document.
#[derive(Debug, Clone, Deserialize)]
pub struct Setup {
    /// Program identifier of the observing run, e.g. `60.A-9252(M)`.
    pub run_id: String,
    /// Folder to create (or reuse) inside the run.
    pub folder: String,
    /// Optional concatenation container inside the folder.
    #[serde(default)]
    pub concatenation: Option<String>,
    /// Observation date, used for ephemeris predictions.
    pub date: NaiveDate,
    /// Generate calibrator templates instead of science ones.
    #[serde(default)]
    pub calib: bool,
    /// Instrument-parameter overrides applied to every template.
    #[serde(flatten)]
    pub overrides: IndexMap<String, Value>,
}

/// One OB declaration under `ObservingBlocks`.
#[derive(Debug, Clone, Deserialize)]
pub struct ObConfig {
    /// Observing mode literal (`single_on`, `dual_off`, ...).
    pub mode: String,
    /// Whitespace-tokenized observing sequence, one entry per line.
    #[serde(default)]
    pub sequence: Vec<String>,
    /// Named objects referenced from the sequence.
    #[serde(default)]
    pub objects: IndexMap<String, ObjectSpec>,
    /// Primary target, default for both channels in on/off-axis modes.
    #[serde(default)]
    pub target: Option<String>,
    /// Dedicated fringe-tracker target.
    #[serde(default)]
    pub ft_target: Option<String>,
    /// Dedicated science-channel target.
    #[serde(default)]
    pub sc_target: Option<String>,
    /// Coude guide star: `ft`, `science`, or a resolvable name.
    #[serde(default)]
    pub guide_star: Option<String>,
    /// Per-OB calibration override; falls back to the setup flag.
    #[serde(default)]
    pub calib: Option<bool>,
    /// Magnitude overrides, used when the resolver has no photometry.
    #[serde(default)]
    pub k_mag: Option<f64>,
    #[serde(default)]
    pub h_mag: Option<f64>,
    #[serde(default)]
    pub g_mag: Option<f64>,
    /// OB-level coordinate declaration (off-axis/wide acquisition override).
    #[serde(default)]
    pub coord_syst: Option<String>,
    #[serde(default)]
    pub coord: Option<Value>,
    /// Instrument-parameter overrides applied to this OB's templates.
    #[serde(flatten)]
    pub overrides: IndexMap<String, Value>,
}

impl ObConfig {
    /// Parse the OB-level coordinate declaration, if any.
    pub fn coord_decl(&self) -> Result<Option<CoordDecl>, ConfigError> {
        match &self.coord_syst {
            None => Ok(None),
            Some(system) => Ok(Some(CoordDecl::parse(system, self.coord.as_ref())?)),
        }
    }
}

/// A named object with a coordinate declaration and per-exposure
/// instrument overrides.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObjectSpec {
    #[serde(default)]
    pub coord_syst: Option<String>,
    #[serde(default)]
    pub coord: Option<Value>,
    /// Per-exposure instrument overrides (DIT, frame counts, ...).
    #[serde(flatten)]
    pub overrides: IndexMap<String, Value>,
}

impl ObjectSpec {
    /// Parse the object's coordinate declaration. `None` means the object
    /// sits at the reference pointing (zero offset).
    pub fn coord_decl(&self) -> Result<Option<CoordDecl>, ConfigError> {
        match &self.coord_syst {
            None => Ok(None),
            Some(system) => Ok(Some(CoordDecl::parse(system, self.coord.as_ref())?)),
        }
    }

    /// A per-exposure instrument setting, if declared on this object.
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.overrides.get(key)
    }
}
