//! Simbad TAP name resolver.
//!
//! One synchronous ADQL query per target, returning position, proper
//! motion, parallax and the G/H/K photometry the acquisition templates
//! need. Anything other than exactly one row is fatal.

use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::ResolveError;

use super::{TargetRecord, TargetResolver};

const SIMBAD_TAP_URL: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap/sync";

/// Blocking Simbad TAP client.
pub struct SimbadResolver {
    http: Client,
    url: String,
}

impl SimbadResolver {
    pub fn new() -> Self {
        SimbadResolver {
            http: Client::new(),
            url: SIMBAD_TAP_URL.to_string(),
        }
    }

    /// Point the resolver at a different TAP endpoint (mirrors, tests).
    pub fn with_url(url: &str) -> Self {
        SimbadResolver {
            http: Client::new(),
            url: url.to_string(),
        }
    }

    fn query(&self, name: &str) -> Result<Value, ResolveError> {
        let adql = format!(
            "SELECT b.main_id, b.ra, b.dec, b.pmra, b.pmdec, b.plx_value, \
             f.G, f.H, f.K \
             FROM basic b \
             JOIN ident i ON i.oidref = b.oid \
             LEFT JOIN allfluxes f ON f.oidref = b.oid \
             WHERE i.id = '{}'",
            name.replace('\'', "''")
        );
        self.http
            .get(&self.url)
            .query(&[
                ("request", "doQuery"),
                ("lang", "adql"),
                ("format", "json"),
                ("query", &adql),
            ])
            .send()
            .map_err(|e| ResolveError::Service(e.to_string()))?
            .error_for_status()
            .map_err(|e| ResolveError::Service(e.to_string()))?
            .json()
            .map_err(|e| ResolveError::Service(e.to_string()))
    }
}

impl Default for SimbadResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetResolver for SimbadResolver {
    fn resolve(&self, name: &str) -> Result<TargetRecord, ResolveError> {
        let response = self.query(name)?;
        let rows = response
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| ResolveError::Service("malformed TAP response".to_string()))?;
        let row = match rows.as_slice() {
            [] => return Err(ResolveError::NotFound(name.to_string())),
            [row] => row,
            _ => return Err(ResolveError::Ambiguous(name.to_string())),
        };
        let column = |i: usize| row.get(i).cloned().unwrap_or(Value::Null);
        let float = |i: usize| column(i).as_f64();

        let ra_deg = float(1)
            .ok_or_else(|| ResolveError::Service(format!("no RA in TAP row for '{}'", name)))?;
        let dec_deg = float(2)
            .ok_or_else(|| ResolveError::Service(format!("no Dec in TAP row for '{}'", name)))?;
        Ok(TargetRecord {
            name: name.to_string(),
            ra_deg,
            dec_deg,
            // proper motion comes back in mas/yr, templates carry arcsec/yr
            pm_ra: float(3).map(|pm| pm / 1000.0),
            pm_dec: float(4).map(|pm| pm / 1000.0),
            parallax_mas: float(5),
            mag_g: float(6),
            mag_h: float(7),
            mag_k: float(8),
        })
    }
}
