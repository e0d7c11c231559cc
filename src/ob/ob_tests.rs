#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::config::ObsConfig;
    use crate::coord::Offset;
    use crate::error::{ConfigError, Error, ResolveError, SyncError};
    use crate::ob::{ObservingBlock, ObsMode, Phase};
    use crate::remote::{
        EphemerisPredictor, NoEphemeris, PredictedPosition, TargetRecord, TargetResolver,
    };
    use crate::templates::keys;

    /// Name resolver backed by a fixed table of records.
    struct FakeResolver(HashMap<String, TargetRecord>);

    impl FakeResolver {
        fn with(records: &[TargetRecord]) -> Self {
            FakeResolver(
                records
                    .iter()
                    .map(|r| (r.name.clone(), r.clone()))
                    .collect(),
            )
        }
    }

    impl TargetResolver for FakeResolver {
        fn resolve(&self, name: &str) -> Result<TargetRecord, ResolveError> {
            self.0
                .get(name)
                .cloned()
                .ok_or_else(|| ResolveError::NotFound(name.to_string()))
        }
    }

    /// Ephemeris predictor returning one fixed position for one body.
    struct FakeEphemeris {
        body: &'static str,
        position: PredictedPosition,
    }

    impl EphemerisPredictor for FakeEphemeris {
        fn predict(&self, body: &str, _date: NaiveDate) -> Result<PredictedPosition, Error> {
            if body == self.body {
                Ok(self.position)
            } else {
                Err(ResolveError::NoSolution(body.to_string()).into())
            }
        }
    }

    fn star() -> TargetRecord {
        TargetRecord {
            name: "HD 206893".to_string(),
            ra_deg: 326.3414,
            dec_deg: -12.7829,
            pm_ra: Some(0.093),
            pm_dec: Some(0.0003),
            parallax_mas: Some(24.5),
            mag_g: Some(6.44),
            mag_h: Some(5.69),
            mag_k: Some(5.59),
        }
    }

    fn doc(blocks: &str) -> String {
        format!(
            "setup:\n  run_id: 60.A-9252(M)\n  folder: tests\n  date: 2024-03-01\n\nObservingBlocks:\n{blocks}"
        )
    }

    fn block(blocks: &str, label: &str) -> ObservingBlock {
        let cfg = ObsConfig::from_yaml(&doc(blocks)).unwrap();
        let ob = cfg.observing_blocks[label].clone();
        ObservingBlock::new(label, ob, cfg.setup).unwrap()
    }

    fn reloff(ob: &ObservingBlock, index: usize) -> (Vec<f64>, Vec<f64>) {
        let template = &ob.templates()[index];
        let xs = template.get(keys::RELOFF_X).unwrap().as_array().unwrap();
        let ys = template.get(keys::RELOFF_Y).unwrap().as_array().unwrap();
        (
            xs.iter().map(|v| v.as_f64().unwrap()).collect(),
            ys.iter().map(|v| v.as_f64().unwrap()).collect(),
        )
    }

    #[test]
    fn test_unknown_mode() {
        let cfg = ObsConfig::from_yaml(&doc("  OB1:\n    mode: triple_on\n")).unwrap();
        let ob = cfg.observing_blocks["OB1"].clone();
        let err = ObservingBlock::new("OB1", ob, cfg.setup).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownMode { ob, mode } if ob == "OB1" && mode == "triple_on"
        ));
    }

    #[test]
    fn test_mode_properties() {
        assert!(!ObsMode::SingleOn.is_dual());
        assert!(ObsMode::DualOn.is_dual());
        assert!(ObsMode::DualWideOff.is_wide());
        assert!(ObsMode::DualOff.allows_swap());
        assert!(ObsMode::DualWideOff.allows_swap());
        assert!(!ObsMode::DualOn.allows_swap());
        assert!(!ObsMode::DualWideOn.allows_swap());
    }

    #[test]
    fn test_single_on_templates() {
        let mut ob = block(
            "  Star:\n    mode: single_on\n    target: HD 206893\n    sequence:\n      - s s sky\n    objects:\n      s: {}\n",
            "Star",
        );
        ob.generate_templates(&NoEphemeris).unwrap();

        assert_eq!(ob.phase(), Phase::AcquisitionGenerated);
        assert_eq!(ob.templates().len(), 1);
        let exp = &ob.templates()[0];
        assert_eq!(exp.name(), "GRAVITY_single_obs_exp");
        assert_eq!(exp.get(keys::OBSSEQ), Some(&json!("O O S")));
        // single-field exposures carry no offset sequences
        assert!(exp.get(keys::RELOFF_X).is_none());

        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.name(), "GRAVITY_single_onaxis_acq");
        assert_eq!(acq.get(keys::SOBJ_NAME), Some(&json!("HD 206893")));
        // single acquisitions have no separate fringe-tracker object
        assert!(acq.get(keys::FT_NAME).is_none());
    }

    #[test]
    fn test_single_rejects_multiple_objects() {
        let mut ob = block(
            "  Star:\n    mode: single_on\n    target: T\n    sequence:\n      - a b sky\n    objects:\n      a: {}\n      b: {}\n",
            "Star",
        );
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MultipleObjects { .. })
        ));
    }

    #[test]
    fn test_sequence_with_only_sky_is_rejected() {
        let mut ob = block(
            "  Star:\n    mode: single_off\n    target: T\n    sequence:\n      - sky sky\n    objects:\n      s: {}\n",
            "Star",
        );
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NoObject { .. })));
    }

    #[test]
    fn test_unknown_label() {
        let mut ob = block(
            "  Planet:\n    mode: dual_on\n    target: T\n    sequence:\n      - b c sky\n    objects:\n      b:\n        coord_syst: radec\n        coord: [10.0, 0.0]\n",
            "Planet",
        );
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnknownLabel { label, .. }) if label == "c"
        ));
    }

    #[test]
    fn test_dual_off_cumulative_offsets() {
        let mut ob = block(
            "  Binary:\n    mode: dual_off\n    target: T\n    sequence:\n      - b sky c\n    objects:\n      b:\n        coord_syst: radec\n        coord: [10.0, 0.0]\n      c:\n        coord_syst: radec\n        coord: [30.0, 20.0]\n",
            "Binary",
        );
        ob.generate_templates(&NoEphemeris).unwrap();

        let (xs, ys) = reloff(&ob, 0);
        // each entry is the delta from the previous pointing
        assert_eq!(xs, [10.0, 0.0, 20.0]);
        assert_eq!(ys, [0.0, 0.0, 20.0]);
        // partial sums reproduce the resolved positions
        assert_eq!(xs[0] + xs[1] + xs[2], 30.0);
        assert_eq!(ys[0] + ys[1] + ys[2], 20.0);

        // off-axis: acquisition points toward the first science position,
        // offsets stay absolute
        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.name(), "GRAVITY_dual_offaxis_acq");
        assert_eq!(acq.get(keys::SOBJ_X), Some(&json!(1.0)));
        assert_eq!(acq.get(keys::SOBJ_Y), Some(&json!(0.0)));
    }

    #[test]
    fn test_dual_on_offsets_relative_to_acquisition() {
        let mut ob = block(
            "  Planet:\n    mode: dual_on\n    target: T\n    sequence:\n      - b sky\n      - c sky\n    objects:\n      b:\n        coord_syst: radec\n        coord: [10.0, 0.0]\n      c:\n        coord_syst: radec\n        coord: [30.0, 40.0]\n",
            "Planet",
        );
        ob.generate_templates(&NoEphemeris).unwrap();

        // mean of the first offsets is (20, 20), normalized to (0.71, 0.71)
        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.get(keys::SOBJ_X), Some(&json!(0.71)));
        assert_eq!(acq.get(keys::SOBJ_Y), Some(&json!(0.71)));

        // every template's first offset is shifted by the pointing
        assert_eq!(
            ob.templates()[0].first_offset(),
            Some(Offset::new(10.0 - 0.71, 0.0 - 0.71))
        );
        assert_eq!(
            ob.templates()[1].first_offset(),
            Some(Offset::new(30.0 - 0.71, 40.0 - 0.71))
        );
    }

    #[test]
    fn test_degenerate_acquisition() {
        let mut ob = block(
            "  Planet:\n    mode: dual_on\n    target: T\n    sequence:\n      - b sky\n      - c sky\n    objects:\n      b:\n        coord_syst: radec\n        coord: [10.0, 0.0]\n      c:\n        coord_syst: radec\n        coord: [-10.0, 0.0]\n",
            "Planet",
        );
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::DegenerateAcquisition { .. })
        ));
    }

    #[test]
    fn test_pasep_object() {
        let mut ob = block(
            "  Planet:\n    mode: dual_off\n    target: T\n    sequence:\n      - b sky\n    objects:\n      b:\n        coord_syst: pasep\n        coord: [90.0, 100.0]\n",
            "Planet",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        let (xs, ys) = reloff(&ob, 0);
        assert_eq!(xs, [100.0, 0.0]);
        assert_eq!(ys, [0.0, 0.0]);
    }

    #[test]
    fn test_ob_coord_rescues_zero_offset_sequence() {
        // objects without declarations sit at the reference pointing; the
        // OB-level declaration then fixes the acquisition direction
        let mut ob = block(
            "  Cal:\n    mode: dual_off\n    target: T\n    coord_syst: radec\n    coord: [500.0, -250.0]\n    sequence:\n      - c sky\n    objects:\n      c: {}\n",
            "Cal",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.get(keys::SOBJ_X), Some(&json!(500.0)));
        assert_eq!(acq.get(keys::SOBJ_Y), Some(&json!(-250.0)));
        let (xs, ys) = reloff(&ob, 0);
        assert_eq!(xs, [0.0, 0.0]);
        assert_eq!(ys, [0.0, 0.0]);
    }

    #[test]
    fn test_dual_off_zero_offsets_without_coord_is_degenerate() {
        let mut ob = block(
            "  Cal:\n    mode: dual_off\n    target: T\n    sequence:\n      - c sky\n    objects:\n      c: {}\n",
            "Cal",
        );
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::DegenerateAcquisition { .. })
        ));
    }

    #[test]
    fn test_dual_off_ob_coord_overrides_acquisition() {
        let mut ob = block(
            "  Binary:\n    mode: dual_off\n    target: T\n    coord_syst: pasep\n    coord: [0.0, 850.0]\n    sequence:\n      - b sky\n    objects:\n      b:\n        coord_syst: radec\n        coord: [10.0, 0.0]\n",
            "Binary",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.get(keys::SOBJ_X), Some(&json!(0.0)));
        assert_eq!(acq.get(keys::SOBJ_Y), Some(&json!(850.0)));
    }

    #[test]
    fn test_swap_segments() {
        let mut ob = block(
            "  Binary:\n    mode: dual_off\n    target: T\n    sequence:\n      - B sky swap B sky\n    objects:\n      B:\n        coord_syst: radec\n        coord: [400.0, 0.0]\n",
            "Binary",
        );
        ob.generate_templates(&NoEphemeris).unwrap();

        let names: Vec<&str> = ob.templates().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            [
                "GRAVITY_dual_obs_exp",
                "GRAVITY_dual_obs_swap",
                "GRAVITY_dual_obs_exp"
            ]
        );
        // the running offset resets across the swap
        let (xs, _) = reloff(&ob, 2);
        assert_eq!(xs, [400.0, 0.0]);
    }

    #[test]
    fn test_swap_rejected_in_on_axis() {
        let mut ob = block(
            "  Planet:\n    mode: dual_on\n    target: T\n    sequence:\n      - b swap b\n    objects:\n      b:\n        coord_syst: radec\n        coord: [10.0, 0.0]\n",
            "Planet",
        );
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::SwapNotAllowed { .. })
        ));
    }

    #[test]
    fn test_inconsistent_detector_settings() {
        let mut ob = block(
            "  Planet:\n    mode: dual_on\n    target: T\n    sequence:\n      - b c sky\n    objects:\n      b:\n        coord_syst: radec\n        coord: [10.0, 0.0]\n        DET2.DIT: 1.0\n      c:\n        coord_syst: radec\n        coord: [20.0, 0.0]\n        DET2.DIT: 3.0\n",
            "Planet",
        );
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InconsistentSettings { setting, .. }) if setting == "DET2.DIT"
        ));
    }

    #[test]
    fn test_repeated_object_settings_are_consistent() {
        let mut ob = block(
            "  Planet:\n    mode: dual_on\n    target: T\n    sequence:\n      - b b sky\n    objects:\n      b:\n        coord_syst: radec\n        coord: [10.0, 0.0]\n        DET2.DIT: 3.0\n",
            "Planet",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        assert_eq!(
            ob.templates()[0].get(keys::DIT),
            Some(&json!(3.0))
        );
    }

    #[test]
    fn test_ephemeris_object_without_predictor() {
        let mut ob = block(
            "  Planet:\n    mode: dual_on\n    target: T\n    sequence:\n      - b sky\n    objects:\n      b:\n        coord_syst: ephemeris\n        coord: beta Pic b\n",
            "Planet",
        );
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::EphemerisUnavailable)
        ));
    }

    #[test]
    fn test_ephemeris_object_with_predictor() {
        let ephemeris = FakeEphemeris {
            body: "beta Pic b",
            position: PredictedPosition {
                dra_mas: 155.4,
                ddec_mas: -211.9,
                sep_mas: 262.8,
                pa_deg: 143.7,
            },
        };
        let mut ob = block(
            "  Planet:\n    mode: dual_on\n    target: T\n    sequence:\n      - b sky\n    objects:\n      b:\n        coord_syst: ephemeris\n        coord: beta Pic b\n",
            "Planet",
        );
        ob.generate_templates(&ephemeris).unwrap();
        // offsets carry the prediction, shifted by the unit pointing
        let first = ob.templates()[0].first_offset().unwrap();
        assert_abs_diff_eq!(first.dra + 0.59, 155.4, epsilon = 1e-9);
        assert_abs_diff_eq!(first.ddec - 0.81, -211.9, epsilon = 1e-9);
    }

    #[test]
    fn test_generate_twice_fails() {
        let mut ob = block(
            "  Star:\n    mode: single_on\n    target: T\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Star",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Sync(SyncError::AlreadyGenerated { .. })
        ));
    }

    #[test]
    fn test_resolve_before_generate_fails() {
        let resolver = FakeResolver::with(&[star()]);
        let mut ob = block(
            "  Star:\n    mode: single_on\n    target: HD 206893\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Star",
        );
        let err = ob.resolve_targets(&resolver, &NoEphemeris).unwrap_err();
        assert!(matches!(err, Error::Sync(SyncError::NotGenerated { .. })));
    }

    #[test]
    fn test_resolve_primary_fills_acquisition() {
        let resolver = FakeResolver::with(&[star()]);
        let mut ob = block(
            "  Star:\n    mode: single_on\n    target: HD 206893\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Star",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        ob.resolve_targets(&resolver, &NoEphemeris).unwrap();

        let acq = ob.acquisition().unwrap();
        // parallax mas -> arcsec
        assert_eq!(acq.get(keys::TARG_PARALLAX), Some(&json!(0.0245)));
        assert_eq!(acq.get(keys::SOBJ_MAG), Some(&json!(5.59)));
        assert_eq!(acq.get(keys::SOBJ_HMAG), Some(&json!(5.69)));

        let target = ob.target().unwrap();
        assert_eq!(target.name, "HD 206893");
        assert_eq!(target.ra, "21:45:21.936");
        assert_eq!(target.dec, "-12:46:58.440");
        assert_eq!(target.pm_ra, 0.093);
    }

    #[test]
    fn test_resolve_missing_magnitude_is_fatal() {
        let mut record = star();
        record.mag_k = None;
        let resolver = FakeResolver::with(&[record]);
        let mut ob = block(
            "  Star:\n    mode: single_on\n    target: HD 206893\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Star",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        let err = ob.resolve_targets(&resolver, &NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Resolve(ResolveError::MissingMagnitude { band: 'K', key: "k_mag", .. })
        ));
    }

    #[test]
    fn test_magnitude_override_beats_resolver() {
        let mut record = star();
        record.mag_k = None;
        let resolver = FakeResolver::with(&[record]);
        let mut ob = block(
            "  Star:\n    mode: single_on\n    target: HD 206893\n    k_mag: 7.2\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Star",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        ob.resolve_targets(&resolver, &NoEphemeris).unwrap();
        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.get(keys::SOBJ_MAG), Some(&json!(7.2)));
    }

    #[test]
    fn test_guide_star_keyword() {
        let resolver = FakeResolver::with(&[star()]);
        let mut ob = block(
            "  Star:\n    mode: single_on\n    target: HD 206893\n    guide_star: science\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Star",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        ob.resolve_targets(&resolver, &NoEphemeris).unwrap();
        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.get(keys::GS_SOURCE), Some(&json!("SCIENCE")));
    }

    #[test]
    fn test_guide_star_by_name() {
        let mut gs = star();
        gs.name = "GS 1".to_string();
        gs.ra_deg = 180.0;
        gs.dec_deg = 0.0;
        let resolver = FakeResolver::with(&[star(), gs]);
        let mut ob = block(
            "  Star:\n    mode: single_on\n    target: HD 206893\n    guide_star: GS 1\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Star",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        ob.resolve_targets(&resolver, &NoEphemeris).unwrap();

        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.get(keys::GS_SOURCE), Some(&json!("SETUPFILE")));
        assert_eq!(acq.get(keys::GS_ALPHA), Some(&json!("12:00:00.000")));
        assert_eq!(acq.get(keys::GS_DELTA), Some(&json!("+00:00:00.000")));
        assert_eq!(acq.get(keys::GS_PARALLAX), Some(&json!(0.0245)));
    }

    #[test]
    fn test_wide_requires_both_targets() {
        let mut ob = block(
            "  Wide:\n    mode: dual_wide_on\n    sc_target: SC\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Wide",
        );
        let err = ob.generate_templates(&NoEphemeris).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingTarget { key: "ft_target", .. })
        ));
    }

    #[test]
    fn test_wide_resolution() {
        let mut ft = star();
        ft.name = "FT star".to_string();
        ft.ra_deg = 10.0;
        ft.dec_deg = 0.0;
        let mut sc = star();
        sc.name = "SC star".to_string();
        let resolver = FakeResolver::with(&[ft, sc]);

        let mut ob = block(
            "  Wide:\n    mode: dual_wide_on\n    ft_target: FT star\n    sc_target: SC star\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Wide",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        assert_eq!(ob.acquisition().unwrap().name(), "GRAVITY_dual_wide_acq");

        ob.resolve_targets(&resolver, &NoEphemeris).unwrap();
        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.get(keys::FT_NAME), Some(&json!("FT star")));
        assert_eq!(acq.get(keys::SOBJ_NAME), Some(&json!("SC star")));
        assert_eq!(acq.get(keys::FT_ALPHA), Some(&json!("00:40:00.000")));
        assert_eq!(acq.get(keys::FT_DELTA), Some(&json!("+00:00:00.000")));
        assert_eq!(acq.get(keys::FT_PARALLAX), Some(&json!(0.0245)));
        assert_eq!(ob.target().unwrap().name, "SC star");
    }

    #[test]
    fn test_wide_coord_override_moves_science_target() {
        let mut ft = star();
        ft.name = "FT star".to_string();
        ft.ra_deg = 10.0;
        ft.dec_deg = 0.0;
        let mut sc = star();
        sc.name = "SC star".to_string();
        let resolver = FakeResolver::with(&[ft, sc]);

        // one degree due East of the FT anchor
        let mut ob = block(
            "  Wide:\n    mode: dual_wide_on\n    ft_target: FT star\n    sc_target: SC star\n    coord_syst: pasep\n    coord: [90.0, 3600000.0]\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Wide",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        ob.resolve_targets(&resolver, &NoEphemeris).unwrap();

        let target = ob.target().unwrap();
        assert_eq!(target.ra, "00:44:00.000"); // 11 deg
        assert_eq!(target.dec, "+00:00:00.000");
    }

    #[test]
    fn test_stray_object_keys_never_reach_templates() {
        // 'name' is not part of any template schema; it stays in the
        // object's overrides and is filtered out during population
        let mut ob = block(
            "  Binary:\n    mode: dual_off\n    target: T\n    sequence:\n      - B sky\n    objects:\n      B:\n        name: GJ 65 B\n        coord_syst: radec\n        coord: [400.0, 0.0]\n",
            "Binary",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        assert!(ob.templates()[0].get("name").is_none());
        assert!(ob.acquisition().unwrap().get("name").is_none());
    }

    #[test]
    fn test_dual_wide_off_swap_generation() {
        let mut ob = block(
            "  Wide:\n    mode: dual_wide_off\n    ft_target: FT star\n    sc_target: SC star\n    sequence:\n      - B sky swap B sky\n    objects:\n      B:\n        coord_syst: radec\n        coord: [400.0, -300.0]\n",
            "Wide",
        );
        ob.generate_templates(&NoEphemeris).unwrap();

        let names: Vec<&str> = ob.templates().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            [
                "GRAVITY_dual_obs_exp",
                "GRAVITY_dual_obs_swap",
                "GRAVITY_dual_obs_exp"
            ]
        );
        // the running offset resets across the swap
        let (xs, ys) = reloff(&ob, 2);
        assert_eq!(xs, [400.0, 0.0]);
        assert_eq!(ys, [-300.0, 0.0]);

        // wide acquisition points from resolved sky positions, not from
        // sequence geometry
        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.name(), "GRAVITY_dual_wide_acq");
        assert_eq!(acq.get(keys::SOBJ_X), Some(&json!(0.0)));
        assert_eq!(acq.get(keys::SOBJ_Y), Some(&json!(0.0)));
        assert_eq!(acq.get(keys::FT_NAME), Some(&json!("FT star")));
        assert_eq!(acq.get(keys::SOBJ_NAME), Some(&json!("SC star")));
    }

    #[test]
    fn test_wide_off_coord_does_not_move_science_target() {
        let mut ft = star();
        ft.name = "FT star".to_string();
        ft.ra_deg = 10.0;
        ft.dec_deg = 0.0;
        let mut sc = star();
        sc.name = "SC star".to_string();
        let resolver = FakeResolver::with(&[ft, sc]);

        // an SC coordinate declaration is honored in wide on-axis only
        let mut ob = block(
            "  Wide:\n    mode: dual_wide_off\n    ft_target: FT star\n    sc_target: SC star\n    coord_syst: pasep\n    coord: [90.0, 3600000.0]\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Wide",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        ob.resolve_targets(&resolver, &NoEphemeris).unwrap();

        // the target keeps the resolved SC position
        let target = ob.target().unwrap();
        assert_eq!(target.name, "SC star");
        assert_eq!(target.ra, "21:45:21.936");
        assert_eq!(target.dec, "-12:46:58.440");
    }

    #[test]
    fn test_calibrator_templates() {
        let mut ob = block(
            "  Cal:\n    mode: dual_off\n    target: T\n    calib: true\n    sequence:\n      - c sky\n    objects:\n      c:\n        coord_syst: radec\n        coord: [600.0, 0.0]\n",
            "Cal",
        );
        ob.generate_templates(&NoEphemeris).unwrap();
        assert_eq!(ob.templates()[0].name(), "GRAVITY_dual_obs_calibrator");
    }

    #[test]
    fn test_target_record_fallback() {
        let ob = block(
            "  Star:\n    mode: single_on\n    target: HD 206893\n    sequence:\n      - s sky\n    objects:\n      s: {}\n",
            "Star",
        );
        let record = ob.target_record();
        assert_eq!(record.name, "HD 206893");
        assert_eq!(record.ra, "00:00:00.000");
        assert_eq!(record.pm_ra, 0.0);
    }

    #[test]
    fn test_setup_overrides_reach_templates() {
        let raw = "setup:\n  run_id: 60.A-9252(M)\n  folder: tests\n  date: 2024-03-01\n  DET2.DIT: 10.0\n  INS.SPEC.RES: HIGH\n\nObservingBlocks:\n  Star:\n    mode: single_on\n    target: T\n    sequence:\n      - s sky\n    objects:\n      s: {}\n";
        let cfg = ObsConfig::from_yaml(raw).unwrap();
        let ob_cfg = cfg.observing_blocks["Star"].clone();
        let mut ob = ObservingBlock::new("Star", ob_cfg, cfg.setup).unwrap();
        ob.generate_templates(&NoEphemeris).unwrap();

        // instrument setup reaches the acquisition; keys outside its
        // schema, like detector settings, are dropped
        let acq = ob.acquisition().unwrap();
        assert_eq!(acq.get("INS.SPEC.RES"), Some(&json!("HIGH")));
        assert!(acq.get(keys::DIT).is_none());
    }
}
