// crates/gt_physics/tests/properties.rs

//! 性质测试：分块无关性、排水上界、底行连续性、基底分类幂等

mod common;

use common::{column3, grid_config, set2, value2, Harness};
use gt_config::{ThermalConfig, SECONDS_PER_YEAR};
use gt_physics::column::{warm_base_alpha, Level0Eqn};
use gt_physics::{
    BasalState, ColumnParams, ColumnState, DefaultEnthalpyConverter, EnthalpyConverter,
    StepOptions, StepReport,
};

/// 非均匀冰穹：含无冰柱、漂浮行、平流与应变热
fn dome(procs: (usize, usize)) -> Harness {
    let mut h = Harness::new(ThermalConfig::default(), grid_config(5, 400.0, procs));
    set2(&mut h.state.fields.thickness, |i, j| {
        if (i, j) == (0, 0) {
            0.0
        } else {
            200.0 + 100.0 * i as f64 + 50.0 * j as f64
        }
    });
    set2(&mut h.state.fields.geothermal_flux, |_, _| 0.05);
    set2(&mut h.state.fields.basal_frictional_heating, |i, _| 0.002 * i as f64);
    for f in h.state.fields.floating.iter_mut() {
        let patch = *f.patch();
        for (i, j) in patch.owned() {
            f.values_mut(i, j).unwrap()[0] = j == 3;
        }
    }
    h.state.fields.bedrock_temperature = h.grid.create_bedrock_field3("litho_temp", 262.0);

    let u = 10.0 / SECONDS_PER_YEAR;
    let w = -0.1 / SECONDS_PER_YEAR;
    for f in h.state.fields.u.iter_mut() {
        f.fill(u);
    }
    for f in h.state.fields.v.iter_mut() {
        f.fill(-0.5 * u);
    }
    for f in h.state.fields.w.iter_mut() {
        f.fill(w);
    }
    for f in h.state.fields.strain_heating.iter_mut() {
        f.fill(1.0e-7);
    }

    let mut temp = h.grid.create_ice_field3("temp", 0.0);
    for f in temp.iter_mut() {
        let patch = *f.patch();
        for (i, j) in patch.owned() {
            let t = 240.0 + i as f64 + 2.0 * j as f64;
            f.column_mut(i, j).unwrap().iter_mut().for_each(|v| *v = t);
        }
    }
    h.state
        .set_enthalpy_from_temperature_cold(&h.grid, &h.ec, &temp)
        .unwrap();
    h
}

fn run(h: &mut Harness, steps: usize) -> StepReport {
    let mut total = StepReport::default();
    for _ in 0..steps {
        total.merge(h.step(5.0, StepOptions::default()).unwrap());
    }
    total
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn test_results_independent_of_decomposition() {
    let mut reference = dome((1, 1));
    let reference_report = run(&mut reference, 3);

    for procs in [(3, 2), (2, 2), (2, 1)] {
        let mut h = dome(procs);
        let report = run(&mut h, 3);
        assert_eq!(report.combined_columns, reference_report.combined_columns);
        assert_eq!(report.ice_only_columns, reference_report.ice_only_columns);
        assert_eq!(report.sacrificed_columns, reference_report.sacrificed_columns);

        for (i, j) in h.points() {
            let a = column3(&reference.state.fields.enthalpy, i, j);
            let b = column3(&h.state.fields.enthalpy, i, j);
            assert!(a.iter().zip(&b).all(|(x, y)| close(*x, *y)), "({i}, {j}) {procs:?}");

            let a = column3(&reference.state.fields.bedrock_temperature, i, j);
            let b = column3(&h.state.fields.bedrock_temperature, i, j);
            assert!(a.iter().zip(&b).all(|(x, y)| close(*x, *y)));

            for (fa, fb) in [
                (&reference.state.basal_melt_rate, &h.state.basal_melt_rate),
                (&reference.state.fields.hmelt, &h.state.fields.hmelt),
            ] {
                assert!(close(value2(fa, i, j), value2(fb, i, j)));
            }
        }
    }
}

#[test]
fn test_new_enthalpy_ghosts_are_exchanged() {
    let mut h = dome((3, 2));
    run(&mut h, 1);
    for f in &h.state.fields.enthalpy {
        assert!(f.ghosts_valid());
    }
    // 跨分块边界的邻居与拥有者一致
    let f = h
        .state
        .fields
        .enthalpy
        .iter()
        .find(|f| f.patch().owns(1, 1))
        .unwrap();
    let ghost = f.column(2, 1).unwrap().to_vec();
    assert_eq!(ghost, column3(&h.state.fields.enthalpy, 2, 1));
}

#[test]
fn test_liquid_fraction_never_exceeds_cap_after_step() {
    let config = ThermalConfig {
        hmelt_max: 1000.0,
        ..Default::default()
    };
    let mut h = Harness::new(config, grid_config(1, 0.0, (2, 2)));
    h.temperate_slab(650.0, 0.03);
    set2(&mut h.state.fields.thickness, |i, j| 450.0 + 50.0 * (i + j) as f64);
    h.step(2.0, StepOptions::default()).unwrap();

    let omega_max = h.config.liquid_water_fraction_max;
    let omega = h.state.liquid_fraction(&h.grid, &h.ec).unwrap();
    for (i, j) in h.points() {
        assert!(column3(&omega, i, j).iter().all(|&w| w <= omega_max + 1e-12));
        assert!(value2(&h.state.fields.hmelt, i, j) >= 0.0);
    }
}

#[test]
fn test_bottom_row_continuous_across_melting_enthalpy() {
    let config = ThermalConfig::default();
    let ec = DefaultEnthalpyConverter::new(&config);
    let params = ColumnParams::new(&config, SECONDS_PER_YEAR, 50.0, 1.0e4, 1.0e4);
    let window = config.warm_base_enthalpy_window();
    let mut state = ColumnState::new(6, 1);
    state.set_indices_and_clear(0, 0, 5).unwrap();
    state.w[0] = -0.2 / SECONDS_PER_YEAR;
    let e_s0 = ec.enthalpy_cts(ec.pressure_from_depth(250.0));
    state.enth_s[0] = e_s0;
    let q = 0.06;

    let row = |e0: f64, state: &mut ColumnState| {
        let mut values = [e0; 6];
        values[1] = e0 - 500.0;
        state.set_uniform_enthalpy(&values);
        if e0 < e_s0 {
            Level0Eqn::neumann(&params, q)
        } else {
            let alpha = warm_base_alpha(e0, e_s0, window);
            Level0Eqn::outflow(&params, state).blend(Level0Eqn::neumann(&params, q), alpha)
        }
    };

    let delta = 1.0e-3;
    let below = row(e_s0 - delta, &mut state);
    let above = row(e_s0 + delta, &mut state);
    assert!((below.a0 - above.a0).abs() < 1e-6);
    assert!((below.a1 - above.a1).abs() < 1e-6);
    assert!((below.b - above.b).abs() < 1e-6 * below.b.abs().max(1.0));

    // 窗口上沿与纯出流行衔接
    let top = row(e_s0 + window + delta, &mut state);
    let edge = row(e_s0 + window - delta, &mut state);
    assert!((top.a0 - edge.a0).abs() < 1e-6);
    assert!((top.a1 - edge.a1).abs() < 1e-6);
}

#[test]
fn test_basal_classification_is_idempotent() {
    let ec = DefaultEnthalpyConverter::default();
    let e_s0 = ec.enthalpy_cts(ec.pressure_from_depth(1500.0));
    for (e0, floating, mbz) in [
        (e_s0 - 1.0, false, 5),
        (e_s0 - 1.0, false, 1),
        (e_s0, false, 5),
        (e_s0 + 1.0e4, true, 1),
    ] {
        let first = BasalState::classify(e0, e_s0, floating, mbz);
        for _ in 0..3 {
            assert_eq!(BasalState::classify(e0, e_s0, floating, mbz), first);
        }
    }
    assert_eq!(
        BasalState::classify(e_s0 - 1.0, e_s0, false, 5),
        BasalState::GroundedColdWithBedrock
    );
    assert_eq!(
        BasalState::classify(e_s0, e_s0, false, 1),
        BasalState::GroundedTemperate
    );
}
