//! Acquisition derivation and target resolution.
//!
//! The acquisition template is generated once, after all science templates
//! exist. On-axis dual modes point it at the mean science position
//! (normalized to a small fixed separation); off-axis mode lets an
//! explicit OB-level coordinate declaration win over the computed mean;
//! wide modes acquire both channels from name-resolved sky positions.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{info, warn};

use crate::coord::{self, round2, CoordDecl, Offset};
use crate::error::{ConfigError, Error, ResolveError, SyncError};
use crate::remote::{EphemerisPredictor, TargetRecord, TargetResolver};
use crate::templates::{keys, Template};

use super::{ObsMode, ObservingBlock, Phase};

impl ObservingBlock {
    pub(super) fn generate_acquisition(
        &mut self,
        ephemeris: &dyn EphemerisPredictor,
    ) -> Result<(), Error> {
        let mut acq = Template::new(self.mode.acquisition_kind());
        self.fill_magnitudes(&mut acq);

        match self.mode {
            ObsMode::SingleOn | ObsMode::SingleOff => {
                self.set_channel_names(&mut acq)?;
                acq.populate_from(&self.setup.overrides);
            }
            ObsMode::DualOn => {
                self.set_channel_names(&mut acq)?;
                let pointing = self.acquisition_pointing()?;
                acq.set(keys::SOBJ_X, pointing.dra);
                acq.set(keys::SOBJ_Y, pointing.ddec);
                // offsets become relative to the acquisition pointing
                for template in &mut self.templates {
                    template.shift_first_offset(pointing);
                }
                acq.populate_from(&self.setup.overrides);
            }
            ObsMode::DualOff => {
                self.set_channel_names(&mut acq)?;
                // an explicit OB-level declaration beats the computed mean
                let decl = self.cfg.coord_decl()?;
                if decl.is_none() {
                    let pointing = self.acquisition_pointing()?;
                    acq.set(keys::SOBJ_X, pointing.dra);
                    acq.set(keys::SOBJ_Y, pointing.ddec);
                }
                acq.populate_from(&self.setup.overrides);
                acq.populate_from(&self.cfg.overrides);
                if let Some(decl) = decl {
                    let offset = decl.resolve(self.setup.date, ephemeris)?;
                    acq.set(keys::SOBJ_X, offset.dra);
                    acq.set(keys::SOBJ_Y, offset.ddec);
                }
            }
            ObsMode::DualWideOn | ObsMode::DualWideOff => {
                // wide mode acquires from absolute positions, both targets
                // must be declared explicitly
                let ft = self.required_target(self.cfg.ft_target.as_deref(), "ft_target")?;
                acq.set(keys::FT_NAME, ft);
                let sc = self.required_target(self.cfg.sc_target.as_deref(), "sc_target")?;
                acq.set(keys::SOBJ_NAME, sc);
                acq.populate_from(&self.setup.overrides);
                acq.populate_from(&self.cfg.overrides);
            }
        }

        self.acquisition = Some(acq);
        Ok(())
    }

    /// Resolve the OB's targets with the name-lookup service and populate
    /// the acquisition coordinates, proper motions, parallaxes and
    /// magnitudes that are still unset.
    pub fn resolve_targets(
        &mut self,
        resolver: &dyn TargetResolver,
        ephemeris: &dyn EphemerisPredictor,
    ) -> Result<(), Error> {
        if self.phase != Phase::AcquisitionGenerated {
            return Err(SyncError::NotGenerated {
                ob: self.label.clone(),
            }
            .into());
        }
        if self.mode.is_wide() {
            self.resolve_wide(resolver, ephemeris)
        } else {
            self.resolve_primary(resolver)
        }
    }

    // Single/dual on/off-axis: one record serves both channels.
    fn resolve_primary(&mut self, resolver: &dyn TargetResolver) -> Result<(), Error> {
        let name = self
            .required_target(self.cfg.target.as_deref(), "target")?
            .to_string();
        info!(ob = %self.label, target = %name, "resolving target");
        let record = resolver.resolve(&name)?;
        let guide_star = self.resolve_guide_star(resolver)?;
        self.target = Some(Self::target_from_record(&record));

        let acq = self.acquisition.as_mut().expect("acquisition generated");
        apply_guide_star(acq, self.cfg.guide_star.as_deref(), guide_star.as_ref())?;
        set_unset_magnitude(acq, keys::GS_MAG, record.mag_g, &name, 'G', "g_mag")?;
        set_parallax(acq, keys::TARG_PARALLAX, &record);
        set_unset_magnitude(acq, keys::SOBJ_MAG, record.mag_k, &name, 'K', "k_mag")?;
        set_unset_magnitude(acq, keys::SOBJ_HMAG, record.mag_h, &name, 'H', "h_mag")?;
        set_unset_magnitude(acq, keys::FT_MAG, record.mag_k, &name, 'K', "k_mag")?;
        set_unset_magnitude(acq, keys::FT_HMAG, record.mag_h, &name, 'H', "h_mag")?;
        Ok(())
    }

    // Wide: FT anchor and SC target are resolved independently.
    fn resolve_wide(
        &mut self,
        resolver: &dyn TargetResolver,
        ephemeris: &dyn EphemerisPredictor,
    ) -> Result<(), Error> {
        let sc_name = self
            .required_target(self.cfg.sc_target.as_deref(), "sc_target")?
            .to_string();
        let ft_name = self
            .required_target(self.cfg.ft_target.as_deref(), "ft_target")?
            .to_string();

        info!(ob = %self.label, target = %sc_name, "resolving science target");
        let sc = resolver.resolve(&sc_name)?;
        let guide_star = self.resolve_guide_star(resolver)?;
        self.target = Some(Self::target_from_record(&sc));

        info!(ob = %self.label, target = %ft_name, "resolving fringe-tracker target");
        let ft = resolver.resolve(&ft_name)?;

        let acq = self.acquisition.as_mut().expect("acquisition generated");

        // science channel
        apply_guide_star(acq, self.cfg.guide_star.as_deref(), guide_star.as_ref())?;
        set_unset_magnitude(acq, keys::GS_MAG, sc.mag_g, &sc_name, 'G', "g_mag")?;
        set_parallax(acq, keys::TARG_PARALLAX, &sc);
        set_unset_magnitude(acq, keys::SOBJ_MAG, sc.mag_k, &sc_name, 'K', "k_mag")?;

        // fringe-tracker anchor
        acq.set(keys::FT_ALPHA, coord::format_ra_hms(ft.ra_deg));
        acq.set(keys::FT_DELTA, coord::format_dec_dms(ft.dec_deg));
        match (ft.pm_ra, ft.pm_dec) {
            (Some(pm_ra), Some(pm_dec)) => {
                acq.set(keys::FT_PMA, round5(pm_ra));
                acq.set(keys::FT_PMD, round5(pm_dec));
            }
            _ => warn!(target = %ft_name, "proper motion not found on the name resolver"),
        }
        set_parallax(acq, keys::FT_PARALLAX, &ft);
        set_unset_magnitude(acq, keys::FT_MAG, ft.mag_k, &ft_name, 'K', "k_mag")?;
        set_unset_magnitude(acq, keys::FT_HMAG, ft.mag_h, &ft_name, 'H', "h_mag")?;

        // user-declared SC coordinates override the resolved position,
        // applied as a directional offset from the FT anchor
        if self.mode == ObsMode::DualWideOn {
            if let Some(decl) = self.cfg.coord_decl()? {
                let (pa, sep) = match &decl {
                    CoordDecl::RaDec { dra, ddec } => {
                        ((*dra).atan2(*ddec).to_degrees(), (dra.powi(2) + ddec.powi(2)).sqrt())
                    }
                    CoordDecl::PaSep { pa, sep } => (*pa, *sep),
                    CoordDecl::Ephemeris { body } => {
                        let predicted = ephemeris.predict(body, self.setup.date)?;
                        (predicted.pa_deg, predicted.sep_mas)
                    }
                };
                let (ra_deg, dec_deg) = coord::directional_offset_deg(ft.ra_deg, ft.dec_deg, pa, sep);
                let target = self.target.as_mut().expect("science target resolved");
                target.ra = coord::format_ra_hms(ra_deg);
                target.dec = coord::format_dec_dms(dec_deg);
            }
        }
        Ok(())
    }

    // FT/SC channel names, both defaulting to the primary target. Single
    // acquisitions have no separate FT object and only name the SC channel.
    fn set_channel_names(&self, acq: &mut Template) -> Result<(), ConfigError> {
        let sc = match &self.cfg.sc_target {
            Some(name) => name.as_str(),
            None => self.required_target(self.cfg.target.as_deref(), "target")?,
        };
        acq.set(keys::SOBJ_NAME, sc);
        if self.mode.is_dual() {
            let ft = match &self.cfg.ft_target {
                Some(name) => name.as_str(),
                None => self.required_target(self.cfg.target.as_deref(), "target")?,
            };
            acq.set(keys::FT_NAME, ft);
        }
        Ok(())
    }

    fn required_target<'a>(
        &self,
        name: Option<&'a str>,
        key: &'static str,
    ) -> Result<&'a str, ConfigError> {
        name.ok_or_else(|| ConfigError::MissingTarget {
            ob: self.label.clone(),
            key,
        })
    }

    // Mean of the first offsets across the dual science templates,
    // normalized to a unit vector: acquisition points toward, not at, the
    // mean science position.
    fn acquisition_pointing(&self) -> Result<Offset, ConfigError> {
        let firsts: Vec<Offset> = self
            .templates
            .iter()
            .filter(|t| t.kind().is_dual_exposure())
            .filter_map(|t| t.first_offset())
            .collect();
        let degenerate = || ConfigError::DegenerateAcquisition {
            ob: self.label.clone(),
        };
        if firsts.is_empty() {
            return Err(degenerate());
        }
        let n = firsts.len() as f64;
        let mean = firsts
            .into_iter()
            .fold(Offset::ZERO, |acc, o| acc + o);
        let mean = Offset::new(mean.dra / n, mean.ddec / n);
        let norm = mean.norm();
        if norm < 1e-9 {
            return Err(degenerate());
        }
        Ok(Offset::new(round2(mean.dra / norm), round2(mean.ddec / norm)))
    }

    // OB-level magnitude overrides pre-seed the acquisition so the
    // resolver only fills what is still missing.
    fn fill_magnitudes(&self, acq: &mut Template) {
        let mut mags: IndexMap<String, Value> = IndexMap::new();
        if let Some(k) = self.cfg.k_mag {
            mags.insert(keys::SOBJ_MAG.into(), k.into());
            mags.insert(keys::FT_MAG.into(), k.into());
        }
        if let Some(h) = self.cfg.h_mag {
            mags.insert(keys::SOBJ_HMAG.into(), h.into());
            mags.insert(keys::FT_HMAG.into(), h.into());
        }
        if let Some(g) = self.cfg.g_mag {
            mags.insert(keys::GS_MAG.into(), g.into());
        }
        acq.populate_from(&mags);
    }

    // Resolve the guide star when it is a real name rather than a channel
    // keyword.
    fn resolve_guide_star(
        &self,
        resolver: &dyn TargetResolver,
    ) -> Result<Option<TargetRecord>, Error> {
        match self.cfg.guide_star.as_deref() {
            Some(name) if !matches!(name.to_lowercase().as_str(), "ft" | "science") => {
                info!(ob = %self.label, guide_star = %name, "resolving guide star");
                Ok(Some(resolver.resolve(name)?))
            }
            _ => Ok(None),
        }
    }
}

// Fill a magnitude parameter that is part of the template's schema and
// still unset. A magnitude the resolver cannot provide is fatal; the user
// has to declare it in the YAML.
fn set_unset_magnitude(
    acq: &mut Template,
    key: &str,
    value: Option<f64>,
    target: &str,
    band: char,
    cfg_key: &'static str,
) -> Result<(), ResolveError> {
    if !acq.is_unset(key) {
        return Ok(());
    }
    match value {
        Some(mag) => {
            acq.set(key, round2(mag));
            Ok(())
        }
        None => Err(ResolveError::MissingMagnitude {
            target: target.to_string(),
            band,
            key: cfg_key,
        }),
    }
}

// Parallax arrives in mas and is carried in arcseconds; a missing value
// is only a warning.
fn set_parallax(acq: &mut Template, key: &str, record: &TargetRecord) {
    match record.parallax_mas {
        Some(plx) => acq.set(key, round4(plx / 1000.0)),
        None => {
            warn!(target = %record.name, "parallax not found on the name resolver");
            acq.set(key, 0.0);
        }
    }
}

fn apply_guide_star(
    acq: &mut Template,
    declared: Option<&str>,
    record: Option<&TargetRecord>,
) -> Result<(), ResolveError> {
    let Some(name) = declared else {
        return Ok(());
    };
    match name.to_lowercase().as_str() {
        "ft" => acq.set(keys::GS_SOURCE, "FT"),
        "science" => acq.set(keys::GS_SOURCE, "SCIENCE"),
        _ => {
            let gs = record.expect("guide star resolved");
            acq.set(keys::GS_SOURCE, "SETUPFILE");
            acq.set(keys::GS_ALPHA, coord::format_ra_hms(gs.ra_deg));
            acq.set(keys::GS_DELTA, coord::format_dec_dms(gs.dec_deg));
            match (gs.pm_ra, gs.pm_dec) {
                (Some(pm_ra), Some(pm_dec)) => {
                    acq.set(keys::GS_PMA, round5(pm_ra));
                    acq.set(keys::GS_PMD, round5(pm_dec));
                }
                _ => warn!(target = %name, "proper motion not found on the name resolver"),
            }
            match gs.parallax_mas {
                Some(plx) => acq.set(keys::GS_PARALLAX, round4(plx / 1000.0)),
                None => {
                    warn!(target = %name, "parallax not found on the name resolver");
                    acq.set(keys::GS_PARALLAX, 0.0);
                }
            }
            set_unset_magnitude(acq, keys::GS_MAG, gs.mag_g, name, 'G', "g_mag")?;
        }
    }
    Ok(())
}

fn round4(x: f64) -> f64 {
    (x * 1e4).round() / 1e4
}

fn round5(x: f64) -> f64 {
    (x * 1e5).round() / 1e5
}
