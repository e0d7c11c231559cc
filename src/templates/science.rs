//! Default parameter tables for the science-exposure template kinds.

use serde_json::json;

use super::Params;

// Detector and sequence parameters common to single and dual exposures.
fn base() -> Params {
    let mut p = Params::new();
    p.insert("DET2.DIT".into(), 0.3.into());
    p.insert("DET2.NDIT.OBJECT".into(), 16.into());
    p.insert("DET2.NDIT.SKY".into(), 16.into());
    p.insert("SEQ.SKY.X".into(), 2000.into());
    p.insert("SEQ.SKY.Y".into(), 2000.into());
    p.insert("SEQ.HWPOFF".into(), json!([0.0]));
    p.insert("SEQ.OBSSEQ".into(), "O S".into());
    p
}

pub(super) fn single_exp() -> Params {
    base()
}

pub(super) fn dual_exp() -> Params {
    let mut p = base();
    p.insert("SEQ.RELOFF.X".into(), json!([0.0]));
    p.insert("SEQ.RELOFF.Y".into(), json!([0.0]));
    p
}

// The swap template carries no exposure at all, only the fringe-tracker
// mode to use while the field roles are exchanged.
pub(super) fn swap() -> Params {
    let mut p = Params::new();
    p.insert("SEQ.FT.MODE".into(), "AUTO".into());
    p
}
