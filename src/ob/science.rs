//! Science-template emission: one template per swap-delimited segment.

use tracing::warn;

use crate::coord::Offset;
use crate::error::{ConfigError, Error};
use crate::remote::EphemerisPredictor;
use crate::templates::{keys, Template, TemplateKind};

use super::sequence::{distinct_objects, is_sky};
use super::ObservingBlock;

// Per-exposure detector settings that must agree when a segment mixes
// several objects.
const SHARED_SETTINGS: [&str; 3] = [keys::DIT, keys::NDIT_OBJECT, keys::NDIT_SKY];

impl ObservingBlock {
    /// Emit the science template for one segment of exposure tokens.
    pub(super) fn emit_exposures(
        &self,
        tokens: &[String],
        ephemeris: &dyn EphemerisPredictor,
    ) -> Result<Template, Error> {
        if !tokens.iter().any(|t| is_sky(t)) {
            warn!(
                ob = %self.label,
                sequence = %tokens.join(" "),
                "no sky exposure in sequence"
            );
        }
        if self.mode.is_dual() {
            self.emit_dual(tokens, ephemeris)
        } else {
            self.emit_single(tokens).map_err(Error::from)
        }
    }

    /// A bare swap segment: role exchange only, no offsets.
    pub(super) fn emit_swap(&self) -> Template {
        let mut template = Template::new(TemplateKind::DualSwap);
        template.populate_from(&self.cfg.overrides);
        template
    }

    // Single-field: exactly one distinct object per segment, no offsets.
    fn emit_single(&self, tokens: &[String]) -> Result<Template, ConfigError> {
        let labels = distinct_objects(tokens);
        let label = match labels.as_slice() {
            [] => {
                return Err(ConfigError::NoObject {
                    ob: self.label.clone(),
                    sequence: tokens.join(" "),
                })
            }
            [label] => *label,
            _ => {
                return Err(ConfigError::MultipleObjects {
                    ob: self.label.clone(),
                    sequence: tokens.join(" "),
                })
            }
        };
        let object = self.object(label)?;

        let mut template = Template::new(self.mode.exposure_kind(self.calib));
        template.populate_from(&self.cfg.overrides);
        template.populate_from(&object.overrides);
        template.set(keys::OBSSEQ, exposure_codes(tokens));
        Ok(template)
    }

    // Dual-field: resolve each object's coordinates and accumulate the
    // relative offset sequence alongside the exposure codes.
    fn emit_dual(
        &self,
        tokens: &[String],
        ephemeris: &dyn EphemerisPredictor,
    ) -> Result<Template, Error> {
        self.check_shared_settings(tokens)?;

        let mut template = Template::new(self.mode.exposure_kind(self.calib));
        template.populate_from(&self.cfg.overrides);

        let mut offsets: Vec<Offset> = Vec::with_capacity(tokens.len());
        let mut running = Offset::ZERO;
        for token in tokens {
            if is_sky(token) {
                offsets.push(Offset::ZERO);
                continue;
            }
            let object = self.object(token)?;
            let raw = match object.coord_decl()? {
                Some(decl) => decl.resolve(self.setup.date, ephemeris)?,
                None => Offset::ZERO,
            };
            // offsets are cumulative on the instrument side: each entry is
            // the delta from the previous pointing, so the partial sums
            // reproduce the resolved positions
            let corrected = raw - running;
            offsets.push(corrected);
            running = running + corrected;
            template.populate_from(&object.overrides);
        }
        template.set_offsets(&offsets);
        template.set(keys::OBSSEQ, exposure_codes(tokens));
        Ok(template)
    }

    // When a segment references several distinct objects, their detector
    // settings must agree; splitting them across lines is the fix.
    fn check_shared_settings(&self, tokens: &[String]) -> Result<(), ConfigError> {
        let labels = distinct_objects(tokens);
        if labels.len() < 2 {
            return Ok(());
        }
        for setting in SHARED_SETTINGS {
            let mut values = Vec::new();
            for label in &labels {
                let value = self.object(label)?.setting(setting);
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            if values.len() > 1 {
                return Err(ConfigError::InconsistentSettings {
                    ob: self.label.clone(),
                    sequence: tokens.join(" "),
                    setting,
                });
            }
        }
        Ok(())
    }
}

/// Instrument sequence-code string: one `O`/`S` per token, space-separated.
fn exposure_codes(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| if is_sky(t) { "S" } else { "O" })
        .collect::<Vec<_>>()
        .join(" ")
}
