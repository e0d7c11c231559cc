//! Default parameter tables for the acquisition template kinds.
//!
//! Magnitude and parallax parameters start out as nulls; they are filled
//! from the OB-level overrides and then from the name-resolver record, in
//! that order.

use serde_json::Value;

use super::Params;

// Parameters common to every acquisition variant.
fn base() -> Params {
    let mut p = Params::new();
    p.insert("SEQ.FT.MODE".into(), "AUTO".into());
    p.insert("SEQ.MET.MODE".into(), "ON".into());
    p.insert("SEQ.INS.SOBJ.NAME".into(), "Name".into());
    p.insert("SEQ.INS.SOBJ.MAG".into(), Value::Null);
    p.insert("SEQ.INS.SOBJ.DIAMETER".into(), 0.0.into());
    p.insert("SEQ.INS.SOBJ.VIS".into(), 1.0.into());
    p.insert("TEL.TARG.PARALLAX".into(), 0.0.into());
    p.insert("INS.SPEC.RES".into(), "MED".into());
    p.insert("INS.FT.POL".into(), "OUT".into());
    p.insert("INS.SPEC.POL".into(), "OUT".into());
    p.insert("COU.AG.TYPE".into(), "ADAPT_OPT".into());
    p.insert("COU.AG.GSSOURCE".into(), "FT".into());
    p.insert("COU.AG.ALPHA".into(), "00:00:00.000".into());
    p.insert("COU.AG.DELTA".into(), "00:00:00.000".into());
    p.insert("COU.AG.PARALLAX".into(), 0.0.into());
    p.insert("COU.AG.PMA".into(), 0.0.into());
    p.insert("COU.AG.PMD".into(), 0.0.into());
    p.insert("COU.AG.EPOCH".into(), 2000.0.into());
    p.insert("COU.GS.MAG".into(), Value::Null);
    p.insert("ISS.BASELINE".into(), Value::Null);
    p.insert("ISS.VLTITYPE".into(), Value::Null);
    p
}

pub(super) fn single_on_axis() -> Params {
    let mut p = base();
    p.insert("SEQ.INS.SOBJ.HMAG".into(), Value::Null);
    p
}

pub(super) fn single_off_axis() -> Params {
    let mut p = base();
    // off-axis runs with the metrology laser off
    p.insert("SEQ.MET.MODE".into(), "OFF".into());
    p.insert("SEQ.INS.SOBJ.HMAG".into(), Value::Null);
    p
}

pub(super) fn dual_on_axis() -> Params {
    let mut p = base();
    p.insert("SEQ.FT.ROBJ.NAME".into(), "Name".into());
    p.insert("SEQ.FT.ROBJ.MAG".into(), Value::Null);
    p.insert("SEQ.FT.ROBJ.HMAG".into(), Value::Null);
    p.insert("SEQ.FT.ROBJ.DIAMETER".into(), 0.0.into());
    p.insert("SEQ.FT.ROBJ.VIS".into(), 1.0.into());
    p.insert("SEQ.INS.SOBJ.X".into(), 0.0.into());
    p.insert("SEQ.INS.SOBJ.Y".into(), 0.0.into());
    p
}

pub(super) fn dual_off_axis() -> Params {
    let mut p = dual_on_axis();
    // SC object picking strategy: T operator, A automatic, F separation tracking
    p.insert("SEQ.PICKSC".into(), "A".into());
    p
}

pub(super) fn dual_wide() -> Params {
    let mut p = base();
    p.insert("SEQ.FT.ROBJ.NAME".into(), "Name".into());
    p.insert("SEQ.FT.ROBJ.ALPHA".into(), "00:00:00.000".into());
    p.insert("SEQ.FT.ROBJ.DELTA".into(), "00:00:00.000".into());
    p.insert("SEQ.FT.ROBJ.PARALLAX".into(), 0.0.into());
    p.insert("SEQ.FT.ROBJ.PMA".into(), 0.0.into());
    p.insert("SEQ.FT.ROBJ.PMD".into(), 0.0.into());
    p.insert("SEQ.FT.ROBJ.EPOCH".into(), 2000.0.into());
    p.insert("SEQ.FT.ROBJ.MAG".into(), Value::Null);
    p.insert("SEQ.FT.ROBJ.HMAG".into(), Value::Null);
    p.insert("SEQ.FT.ROBJ.DIAMETER".into(), 0.0.into());
    p.insert("SEQ.FT.ROBJ.VIS".into(), 1.0.into());
    p.insert("SEQ.INS.SOBJ.X".into(), 0.0.into());
    p.insert("SEQ.INS.SOBJ.Y".into(), 0.0.into());
    p.insert("COU.AG.GSSOURCE".into(), "SCIENCE".into());
    p
}
