//! Observing-block generation: the state machine turning a declarative OB
//! configuration into an acquisition template plus an ordered list of
//! science templates.
//!
//! One [`ObservingBlock`] handles exactly one OB end-to-end. Its lifecycle
//! is one-directional: templates are generated first, the acquisition is
//! derived from the generated templates, targets are resolved, and the
//! result is uploaded. No state is shared across OBs.

use tracing::debug;

use crate::config::{ObConfig, ObjectSpec, Setup};
use crate::coord::{format_dec_dms, format_ra_hms};
use crate::error::{ConfigError, Error, SyncError};
use crate::remote::{EphemerisPredictor, ItemId, ObTarget, ProposalService};
use crate::templates::{Template, TemplateKind};

mod acquisition;
mod science;
mod sequence;

#[cfg(test)]
mod ob_tests;

pub use sequence::Segment;

/// The six observing-mode variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsMode {
    SingleOn,
    SingleOff,
    DualOn,
    DualOff,
    DualWideOn,
    DualWideOff,
}

impl ObsMode {
    /// Parse a mode literal from the configuration.
    pub fn parse(mode: &str, ob: &str) -> Result<ObsMode, ConfigError> {
        match mode {
            "single_on" => Ok(ObsMode::SingleOn),
            "single_off" => Ok(ObsMode::SingleOff),
            "dual_on" => Ok(ObsMode::DualOn),
            "dual_off" => Ok(ObsMode::DualOff),
            "dual_wide_on" => Ok(ObsMode::DualWideOn),
            "dual_wide_off" => Ok(ObsMode::DualWideOff),
            other => Err(ConfigError::UnknownMode {
                ob: ob.to_string(),
                mode: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObsMode::SingleOn => "single_on",
            ObsMode::SingleOff => "single_off",
            ObsMode::DualOn => "dual_on",
            ObsMode::DualOff => "dual_off",
            ObsMode::DualWideOn => "dual_wide_on",
            ObsMode::DualWideOff => "dual_wide_off",
        }
    }

    /// Dual-field modes observe two channels simultaneously.
    pub fn is_dual(self) -> bool {
        !matches!(self, ObsMode::SingleOn | ObsMode::SingleOff)
    }

    /// Wide modes acquire both channels from absolute sky positions.
    pub fn is_wide(self) -> bool {
        matches!(self, ObsMode::DualWideOn | ObsMode::DualWideOff)
    }

    /// Only the off-axis dual modes may exchange FT/SC roles mid-sequence.
    pub fn allows_swap(self) -> bool {
        matches!(self, ObsMode::DualOff | ObsMode::DualWideOff)
    }

    pub fn acquisition_kind(self) -> TemplateKind {
        match self {
            ObsMode::SingleOn => TemplateKind::SingleOnAxisAcq,
            ObsMode::SingleOff => TemplateKind::SingleOffAxisAcq,
            ObsMode::DualOn => TemplateKind::DualOnAxisAcq,
            ObsMode::DualOff => TemplateKind::DualOffAxisAcq,
            ObsMode::DualWideOn | ObsMode::DualWideOff => TemplateKind::DualWideAcq,
        }
    }

    fn exposure_kind(self, calib: bool) -> TemplateKind {
        if self.is_dual() {
            TemplateKind::DualExp { calib }
        } else {
            TemplateKind::SingleExp { calib }
        }
    }
}

/// Lifecycle phase of an [`ObservingBlock`]. Transitions are
/// one-directional; re-entry is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    TemplatesGenerated,
    AcquisitionGenerated,
    Synced,
}

/// One observing block: configuration, generated templates and the derived
/// acquisition.
#[derive(Debug, Clone)]
pub struct ObservingBlock {
    label: String,
    mode: ObsMode,
    setup: Setup,
    cfg: ObConfig,
    calib: bool,
    templates: Vec<Template>,
    acquisition: Option<Template>,
    target: Option<ObTarget>,
    phase: Phase,
}

impl ObservingBlock {
    /// Build a block from its configuration entry. Fails on an unknown
    /// mode literal.
    pub fn new(label: &str, cfg: ObConfig, setup: Setup) -> Result<Self, ConfigError> {
        let mode = ObsMode::parse(&cfg.mode, label)?;
        let calib = cfg.calib.unwrap_or(setup.calib);
        Ok(ObservingBlock {
            label: label.to_string(),
            mode,
            setup,
            cfg,
            calib,
            templates: Vec::new(),
            acquisition: None,
            target: None,
            phase: Phase::Uninitialized,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn mode(&self) -> ObsMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    /// Science/swap templates, in observing-sequence order.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn acquisition(&self) -> Option<&Template> {
        self.acquisition.as_ref()
    }

    /// Resolved target record, if [`ObservingBlock::resolve_targets`] ran.
    pub fn target(&self) -> Option<&ObTarget> {
        self.target.as_ref()
    }

    fn object(&self, label: &str) -> Result<&ObjectSpec, ConfigError> {
        self.cfg.objects.get(label).ok_or_else(|| ConfigError::UnknownLabel {
            ob: self.label.clone(),
            label: label.to_string(),
        })
    }

    /// Generate the science/swap templates from the observing sequence,
    /// then derive the acquisition template from them.
    pub fn generate_templates(&mut self, ephemeris: &dyn EphemerisPredictor) -> Result<(), Error> {
        if self.phase != Phase::Uninitialized {
            return Err(SyncError::AlreadyGenerated {
                ob: self.label.clone(),
            }
            .into());
        }
        for line in self.cfg.sequence.clone() {
            let segments = sequence::split_segments(&line, self.mode.allows_swap(), &self.label)?;
            for segment in segments {
                let template = match segment {
                    Segment::Swap => self.emit_swap(),
                    Segment::Exposures(tokens) => self.emit_exposures(&tokens, ephemeris)?,
                };
                self.templates.push(template);
            }
        }
        self.phase = Phase::TemplatesGenerated;
        debug!(ob = %self.label, count = self.templates.len(), "science templates generated");

        self.generate_acquisition(ephemeris)?;
        self.phase = Phase::AcquisitionGenerated;
        Ok(())
    }

    /// Upload this OB's templates under an already-created service OB:
    /// create each template, then push its parameters.
    pub fn sync(
        &mut self,
        service: &dyn ProposalService,
        ob_id: ItemId,
    ) -> Result<(), SyncError> {
        let acquisition = match (&self.phase, self.acquisition.as_mut()) {
            (Phase::AcquisitionGenerated, Some(acquisition)) => acquisition,
            _ => {
                return Err(SyncError::NotGenerated {
                    ob: self.label.clone(),
                })
            }
        };
        // acquisition first: the instrument executes it before any exposure
        acquisition.sync_create(service, ob_id)?;
        for template in &mut self.templates {
            template.sync_create(service, ob_id)?;
        }
        acquisition.sync_update(service)?;
        for template in &mut self.templates {
            template.sync_update(service)?;
        }
        self.phase = Phase::Synced;
        Ok(())
    }

    /// Target fields to attach to the service OB. Falls back to a bare
    /// name when no resolution ran.
    pub fn target_record(&self) -> ObTarget {
        if let Some(target) = &self.target {
            return target.clone();
        }
        let name = self
            .cfg
            .sc_target
            .as_deref()
            .or(self.cfg.target.as_deref())
            .unwrap_or(&self.label);
        ObTarget {
            name: name.to_string(),
            ra: "00:00:00.000".to_string(),
            dec: "+00:00:00.000".to_string(),
            pm_ra: 0.0,
            pm_dec: 0.0,
        }
    }

    fn target_from_record(record: &crate::remote::TargetRecord) -> ObTarget {
        ObTarget {
            name: record.name.clone(),
            ra: format_ra_hms(record.ra_deg),
            dec: format_dec_dms(record.dec_deg),
            pm_ra: record.pm_ra.unwrap_or(0.0),
            pm_dec: record.pm_dec.unwrap_or(0.0),
        }
    }
}
