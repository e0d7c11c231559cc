//! Coordinate declarations and sky geometry.
//!
//! Every per-object coordinate declaration, whatever its system, is
//! normalized into a single [`Offset`] in milliarcseconds relative to the
//! fringe-tracker pointing. Position angles follow the usual convention:
//! North = 0 deg, East = 90 deg.

use chrono::NaiveDate;
use serde_json::Value;
use std::ops::{Add, Sub};

use crate::error::{ConfigError, Error};
use crate::remote::EphemerisPredictor;

/// Milliarcseconds per degree.
pub const MAS_PER_DEG: f64 = 3_600_000.0;

/// Relative sky offset in milliarcseconds (RA direction, Dec direction).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub dra: f64,
    pub ddec: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { dra: 0.0, ddec: 0.0 };

    pub fn new(dra: f64, ddec: f64) -> Self {
        Offset { dra, ddec }
    }

    /// Round both components to 2 decimal places (the service schema
    /// carries offsets with 0.01 mas resolution).
    pub fn rounded(self) -> Self {
        Offset {
            dra: round2(self.dra),
            ddec: round2(self.ddec),
        }
    }

    pub fn norm(self) -> f64 {
        (self.dra * self.dra + self.ddec * self.ddec).sqrt()
    }
}

impl Add for Offset {
    type Output = Offset;

    fn add(self, rhs: Offset) -> Offset {
        Offset::new(self.dra + rhs.dra, self.ddec + rhs.ddec)
    }
}

impl Sub for Offset {
    type Output = Offset;

    fn sub(self, rhs: Offset) -> Offset {
        Offset::new(self.dra - rhs.dra, self.ddec - rhs.ddec)
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// A parsed coordinate declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordDecl {
    /// Relative RA/Dec offset in mas, used as-is.
    RaDec { dra: f64, ddec: f64 },
    /// Position angle (deg) and separation (mas).
    PaSep { pa: f64, sep: f64 },
    /// Solar-system body whose offset is predicted by an ephemeris service.
    Ephemeris { body: String },
}

impl CoordDecl {
    /// Parse a `coord_syst`/`coord` pair from the configuration.
    ///
    /// `radec` and `pasep` expect a two-number sequence, `ephemeris`
    /// expects the body identifier as a string.
    pub fn parse(system: &str, coord: Option<&Value>) -> Result<CoordDecl, ConfigError> {
        let invalid = || ConfigError::InvalidCoord {
            system: system.to_string(),
        };
        match system {
            "radec" => {
                let (a, b) = coord_pair(coord).ok_or_else(invalid)?;
                Ok(CoordDecl::RaDec { dra: a, ddec: b })
            }
            "pasep" => {
                let (pa, sep) = coord_pair(coord).ok_or_else(invalid)?;
                Ok(CoordDecl::PaSep { pa, sep })
            }
            "ephemeris" => {
                let body = coord
                    .and_then(Value::as_str)
                    .ok_or_else(invalid)?
                    .to_string();
                Ok(CoordDecl::Ephemeris { body })
            }
            other => Err(ConfigError::UnknownCoordSystem(other.to_string())),
        }
    }

    /// Resolve the declaration into an [`Offset`], rounded to 2 decimals.
    pub fn resolve(
        &self,
        date: NaiveDate,
        ephemeris: &dyn EphemerisPredictor,
    ) -> Result<Offset, Error> {
        let offset = match self {
            CoordDecl::RaDec { dra, ddec } => Offset::new(*dra, *ddec),
            CoordDecl::PaSep { pa, sep } => pasep_to_offset(*pa, *sep),
            CoordDecl::Ephemeris { body } => {
                let predicted = ephemeris.predict(body, date)?;
                Offset::new(predicted.dra_mas, predicted.ddec_mas)
            }
        };
        Ok(offset.rounded())
    }
}

fn coord_pair(coord: Option<&Value>) -> Option<(f64, f64)> {
    let seq = coord?.as_array()?;
    if seq.len() != 2 {
        return None;
    }
    Some((seq[0].as_f64()?, seq[1].as_f64()?))
}

/// Convert a position angle (deg, North = 0, East = 90) and separation
/// (mas) into an RA/Dec offset.
pub fn pasep_to_offset(pa_deg: f64, sep_mas: f64) -> Offset {
    let pa = pa_deg.to_radians();
    Offset::new(sep_mas * pa.sin(), sep_mas * pa.cos())
}

/// Point at the given position angle and separation from `(ra_deg, dec_deg)`,
/// following a great circle. Returns the new position in degrees.
///
/// Used in wide mode to derive the absolute science-target position from
/// the resolved fringe-tracker position.
pub fn directional_offset_deg(
    ra_deg: f64,
    dec_deg: f64,
    pa_deg: f64,
    sep_mas: f64,
) -> (f64, f64) {
    let dec = dec_deg.to_radians();
    let pa = pa_deg.to_radians();
    let sigma = (sep_mas / MAS_PER_DEG).to_radians();

    let sin_dec2 = dec.sin() * sigma.cos() + dec.cos() * sigma.sin() * pa.cos();
    let dec2 = sin_dec2.asin();
    let dra = (pa.sin() * sigma.sin() * dec.cos()).atan2(sigma.cos() - dec.sin() * sin_dec2);

    (
        (ra_deg + dra.to_degrees()).rem_euclid(360.0),
        dec2.to_degrees(),
    )
}

/// Format a right ascension in degrees as `HH:MM:SS.sss` (hourangle).
pub fn format_ra_hms(ra_deg: f64) -> String {
    let hours = ra_deg.rem_euclid(360.0) / 15.0;
    let total_ms = (hours * 3_600_000.0).round() as i64;
    let h = (total_ms / 3_600_000) % 24;
    let m = (total_ms / 60_000) % 60;
    let s = (total_ms % 60_000) as f64 / 1000.0;
    format!("{:02}:{:02}:{:06.3}", h, m, s)
}

/// Format a declination in degrees as `+DD:MM:SS.sss` (sign always shown).
pub fn format_dec_dms(dec_deg: f64) -> String {
    let sign = if dec_deg.is_sign_negative() { '-' } else { '+' };
    let total_ms = (dec_deg.abs() * 3_600_000.0).round() as i64;
    let d = total_ms / 3_600_000;
    let m = (total_ms / 60_000) % 60;
    let s = (total_ms % 60_000) as f64 / 1000.0;
    format!("{}{:02}:{:02}:{:06.3}", sign, d, m, s)
}
