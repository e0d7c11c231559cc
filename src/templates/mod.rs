//! Instrument templates: ordered parameter mappings with fixed per-kind
//! default sets.
//!
//! A template is one instrument configuration step inside an OB, either the
//! acquisition or one exposure (or a swap). The parameter schema is closed:
//! construction seeds the full key set for the kind, and
//! [`Template::populate_from`] only ever overwrites keys that already
//! exist, so malformed configuration cannot inject unknown instrument
//! parameters.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use crate::coord::Offset;
use crate::error::SyncError;
use crate::remote::{ItemId, ProposalService};

mod acquisition;
mod science;


/// Ordered instrument-parameter mapping, insertion order preserved.
pub type Params = IndexMap<String, Value>;

/// Parameter keys shared across modules.
pub mod keys {
    pub const OBSSEQ: &str = "SEQ.OBSSEQ";
    pub const RELOFF_X: &str = "SEQ.RELOFF.X";
    pub const RELOFF_Y: &str = "SEQ.RELOFF.Y";
    pub const SOBJ_NAME: &str = "SEQ.INS.SOBJ.NAME";
    pub const SOBJ_X: &str = "SEQ.INS.SOBJ.X";
    pub const SOBJ_Y: &str = "SEQ.INS.SOBJ.Y";
    pub const SOBJ_MAG: &str = "SEQ.INS.SOBJ.MAG";
    pub const SOBJ_HMAG: &str = "SEQ.INS.SOBJ.HMAG";
    pub const FT_NAME: &str = "SEQ.FT.ROBJ.NAME";
    pub const FT_MAG: &str = "SEQ.FT.ROBJ.MAG";
    pub const FT_HMAG: &str = "SEQ.FT.ROBJ.HMAG";
    pub const FT_ALPHA: &str = "SEQ.FT.ROBJ.ALPHA";
    pub const FT_DELTA: &str = "SEQ.FT.ROBJ.DELTA";
    pub const FT_PMA: &str = "SEQ.FT.ROBJ.PMA";
    pub const FT_PMD: &str = "SEQ.FT.ROBJ.PMD";
    pub const FT_PARALLAX: &str = "SEQ.FT.ROBJ.PARALLAX";
    pub const TARG_PARALLAX: &str = "TEL.TARG.PARALLAX";
    pub const GS_SOURCE: &str = "COU.AG.GSSOURCE";
    pub const GS_ALPHA: &str = "COU.AG.ALPHA";
    pub const GS_DELTA: &str = "COU.AG.DELTA";
    pub const GS_PMA: &str = "COU.AG.PMA";
    pub const GS_PMD: &str = "COU.AG.PMD";
    pub const GS_PARALLAX: &str = "COU.AG.PARALLAX";
    pub const GS_MAG: &str = "COU.GS.MAG";
    pub const DIT: &str = "DET2.DIT";
    pub const NDIT_OBJECT: &str = "DET2.NDIT.OBJECT";
    pub const NDIT_SKY: &str = "DET2.NDIT.SKY";
}

/// The fixed set of template kinds, each with its own default parameter
/// table and service-side template name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    SingleOnAxisAcq,
    SingleOffAxisAcq,
    DualOnAxisAcq,
    DualOffAxisAcq,
    DualWideAcq,
    SingleExp { calib: bool },
    DualExp { calib: bool },
    DualSwap,
}

impl TemplateKind {
    /// Template name understood by the proposal service.
    pub fn template_name(self) -> &'static str {
        match self {
            TemplateKind::SingleOnAxisAcq => "GRAVITY_single_onaxis_acq",
            TemplateKind::SingleOffAxisAcq => "GRAVITY_single_offaxis_acq",
            TemplateKind::DualOnAxisAcq => "GRAVITY_dual_onaxis_acq",
            TemplateKind::DualOffAxisAcq => "GRAVITY_dual_offaxis_acq",
            TemplateKind::DualWideAcq => "GRAVITY_dual_wide_acq",
            TemplateKind::SingleExp { calib: false } => "GRAVITY_single_obs_exp",
            TemplateKind::SingleExp { calib: true } => "GRAVITY_single_obs_calibrator",
            TemplateKind::DualExp { calib: false } => "GRAVITY_dual_obs_exp",
            TemplateKind::DualExp { calib: true } => "GRAVITY_dual_obs_calibrator",
            TemplateKind::DualSwap => "GRAVITY_dual_obs_swap",
        }
    }

    pub fn is_acquisition(self) -> bool {
        matches!(
            self,
            TemplateKind::SingleOnAxisAcq
                | TemplateKind::SingleOffAxisAcq
                | TemplateKind::DualOnAxisAcq
                | TemplateKind::DualOffAxisAcq
                | TemplateKind::DualWideAcq
        )
    }

    /// True for dual-field science exposures, the only templates carrying
    /// relative offset sequences.
    pub fn is_dual_exposure(self) -> bool {
        matches!(self, TemplateKind::DualExp { .. })
    }

    fn defaults(self) -> Params {
        match self {
            TemplateKind::SingleOnAxisAcq => acquisition::single_on_axis(),
            TemplateKind::SingleOffAxisAcq => acquisition::single_off_axis(),
            TemplateKind::DualOnAxisAcq => acquisition::dual_on_axis(),
            TemplateKind::DualOffAxisAcq => acquisition::dual_off_axis(),
            TemplateKind::DualWideAcq => acquisition::dual_wide(),
            TemplateKind::SingleExp { .. } => science::single_exp(),
            TemplateKind::DualExp { .. } => science::dual_exp(),
            TemplateKind::DualSwap => science::swap(),
        }
    }
}

/// Handle and version of a template already created on the service.
#[derive(Debug, Clone, Copy)]
struct RemoteHandle {
    ob_id: ItemId,
    template_id: ItemId,
    version: i64,
}

/// One instrument template: a kind plus its ordered parameter mapping.
#[derive(Debug, Clone)]
pub struct Template {
    kind: TemplateKind,
    params: Params,
    remote: Option<RemoteHandle>,
}

impl Template {
    pub fn new(kind: TemplateKind) -> Self {
        Template {
            kind,
            params: kind.defaults(),
            remote: None,
        }
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.template_name()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Service-side version of the last accepted update, if any.
    pub fn version(&self) -> Option<i64> {
        self.remote.map(|r| r.version)
    }

    /// Overwrite one of the template's pre-declared parameters.
    pub(crate) fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.params.insert(key.to_string(), value.into());
    }

    /// True if `key` belongs to this template's schema and is still unset.
    pub(crate) fn is_unset(&self, key: &str) -> bool {
        matches!(self.params.get(key), Some(Value::Null))
    }

    /// Overwrite every parameter present in both `config` and the
    /// template's key set. Keys outside the predefined set are silently
    /// ignored; the schema never grows.
    pub fn populate_from(&mut self, config: &IndexMap<String, Value>) {
        for (key, value) in config {
            if self.params.contains_key(key) {
                self.params.insert(key.clone(), value.clone());
            }
        }
    }

    /// Install the relative offset sequences, one entry per exposure token.
    pub(crate) fn set_offsets(&mut self, offsets: &[Offset]) {
        let xs: Vec<Value> = offsets.iter().map(|o| Value::from(o.dra)).collect();
        let ys: Vec<Value> = offsets.iter().map(|o| Value::from(o.ddec)).collect();
        self.set(keys::RELOFF_X, xs);
        self.set(keys::RELOFF_Y, ys);
    }

    /// First entry of the offset sequences, if this template carries any.
    pub fn first_offset(&self) -> Option<Offset> {
        let x = self.get(keys::RELOFF_X)?.as_array()?.first()?.as_f64()?;
        let y = self.get(keys::RELOFF_Y)?.as_array()?.first()?.as_f64()?;
        Some(Offset::new(x, y))
    }

    /// Subtract `delta` from the first offset entry. Used by on-axis dual
    /// acquisition to make offsets relative to the acquisition pointing.
    pub(crate) fn shift_first_offset(&mut self, delta: Offset) {
        let Some(first) = self.first_offset() else {
            return;
        };
        let corrected = first - delta;
        if let Some(Value::Array(xs)) = self.params.get_mut(keys::RELOFF_X) {
            xs[0] = Value::from(corrected.dra);
        }
        if let Some(Value::Array(ys)) = self.params.get_mut(keys::RELOFF_Y) {
            ys[0] = Value::from(corrected.ddec);
        }
    }

    /// Number of exposure tokens in the observing sequence string.
    pub fn sequence_len(&self) -> usize {
        self.get(keys::OBSSEQ)
            .and_then(Value::as_str)
            .map(|s| s.split_whitespace().count())
            .unwrap_or(0)
    }

    // Right-pad the offset sequences with zeros so their length matches the
    // observing sequence. Reconciliation before transmission only.
    fn pad_offsets(&mut self) {
        let want = self.sequence_len();
        for key in [keys::RELOFF_X, keys::RELOFF_Y] {
            if let Some(Value::Array(seq)) = self.params.get_mut(key) {
                if seq.len() < want {
                    warn!(
                        template = self.kind.template_name(),
                        key,
                        have = seq.len(),
                        want,
                        "padding offset sequence with zeros"
                    );
                }
                while seq.len() < want {
                    seq.push(Value::from(0.0));
                }
            }
        }
    }

    /// Register the template with the service under the given OB,
    /// capturing its handle and initial version.
    pub fn sync_create(
        &mut self,
        service: &dyn ProposalService,
        ob_id: ItemId,
    ) -> Result<(), SyncError> {
        let (template_id, version) = service.create_template(ob_id, self.name())?;
        self.remote = Some(RemoteHandle {
            ob_id,
            template_id,
            version,
        });
        Ok(())
    }

    /// Push the full parameter mapping, replacing the stored version with
    /// the one returned by the service. Fails if called before
    /// [`Template::sync_create`].
    pub fn sync_update(&mut self, service: &dyn ProposalService) -> Result<(), SyncError> {
        let Some(remote) = self.remote else {
            return Err(SyncError::OutOfOrder {
                template: self.name().to_string(),
            });
        };
        self.pad_offsets();
        let version = service.set_template_params(
            remote.ob_id,
            remote.template_id,
            &self.params,
            remote.version,
        )?;
        self.remote = Some(RemoteHandle { version, ..remote });
        Ok(())
    }
}
