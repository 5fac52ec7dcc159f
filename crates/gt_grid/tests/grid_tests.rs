// crates/gt_grid/tests/grid_tests.rs

//! 分布式网格集成测试

use gt_config::{GridConfig, SpacingPolicy};
use gt_grid::{DistributedGrid, PatchDecomposition};

fn config() -> GridConfig {
    GridConfig {
        mx: 9,
        my: 7,
        lx: 9000.0,
        ly: 7000.0,
        mz: 21,
        mbz: 6,
        lz: 2000.0,
        lbz: 500.0,
        spacing: SpacingPolicy::quadratic(),
        ..Default::default()
    }
}

#[test]
fn test_fine_grid_spacing_is_min_of_ice_and_bedrock() {
    let grid = DistributedGrid::new(&config(), 1).unwrap();
    let vertical = grid.vertical();
    let fine = grid.fine();

    let dzb = 500.0 / 5.0;
    assert!(fine.dz <= vertical.dz_min.min(dzb) + 1e-9);
    assert!(fine.zlevels.windows(2).all(|w| (w[1] - w[0] - fine.dz).abs() < 1e-9));
    assert_eq!(*fine.zlevels.last().unwrap(), 2000.0);
    assert!(fine.zblevels[0] <= -500.0 + 1e-9);
    assert!(fine.zblevels.last().unwrap().abs() < 1e-12);
}

#[test]
fn test_fine_column_interpolation_is_exact_for_linear_profiles() {
    let grid = DistributedGrid::new(&config(), 1).unwrap();
    let mut enth = grid.create_ice_field3("enthalpy", 0.0);
    let patch = grid.patches()[0];

    let levels = enth[0].levels().to_vec();
    let column = enth[0].column_mut(3, 2).unwrap();
    for (v, z) in column.iter_mut().zip(levels.iter()) {
        *v = 1.0e5 + 3.0 * z;
    }
    assert!(patch.owns(3, 2));

    let fine = grid.fine();
    let mut out = vec![0.0; fine.mz()];
    enth[0].fine_column(3, 2, fine, &mut out).unwrap();
    for (v, z) in out.iter().zip(fine.zlevels.iter()) {
        assert!((v - (1.0e5 + 3.0 * z)).abs() < 1e-6);
    }

    enth[0].set_fine_column(3, 2, fine, &out).unwrap();
    for (v, z) in enth[0].column(3, 2).unwrap().iter().zip(levels.iter()) {
        assert!((v - (1.0e5 + 3.0 * z)).abs() < 1e-6);
    }
}

#[test]
fn test_halo_exchange_matches_across_decompositions() {
    let cfg = config();
    for (nx, ny) in [(1, 1), (3, 2), (2, 3)] {
        let decomp = PatchDecomposition::new(cfg.mx, cfg.my, nx, ny).unwrap();
        let grid = DistributedGrid::with_decomposition(&cfg, decomp).unwrap();
        let mut thk = grid.create_field2("thk", 0.0);
        for f in thk.iter_mut() {
            let patch = *f.patch();
            for (i, j) in patch.owned() {
                f.set(i, j, (10 * i + j) as f64).unwrap();
            }
        }
        grid.halo_exchange(&mut thk).unwrap();

        for f in &thk {
            let patch = *f.patch();
            for (i, j) in patch.owned() {
                let n = f.neighbors(i, j).unwrap();
                let ip1 = (i + 1) % cfg.mx;
                let jm1 = (j + cfg.my - 1) % cfg.my;
                assert_eq!(n[0], (10 * ip1 + j) as f64);
                assert_eq!(n[6], (10 * i + jm1) as f64);
            }
        }
    }
}

#[test]
fn test_three_dimensional_halo_exchange() {
    let cfg = config();
    let decomp = PatchDecomposition::new(cfg.mx, cfg.my, 3, 1).unwrap();
    let grid = DistributedGrid::with_decomposition(&cfg, decomp).unwrap();
    let mut enth = grid.create_ice_field3("enthalpy", 0.0);
    for f in enth.iter_mut() {
        let patch = *f.patch();
        for (i, j) in patch.owned() {
            let column = f.column_mut(i, j).unwrap();
            for (k, v) in column.iter_mut().enumerate() {
                *v = (i * 1000 + j * 10 + k) as f64;
            }
        }
    }
    assert!(enth.iter().all(|f| !f.ghosts_valid()));
    grid.halo_exchange(&mut enth).unwrap();
    assert!(enth.iter().all(|f| f.ghosts_valid()));

    // 分块 0 的西侧幽灵列来自分块 2 的最后一列
    let star = enth[0].plane_star(0, 0, 4).unwrap();
    assert_eq!(star.im1, (8 * 1000 + 4) as f64);
}

#[test]
fn test_mismatched_decomposition_rejected() {
    let decomp = PatchDecomposition::new(10, 7, 2, 1).unwrap();
    assert!(DistributedGrid::with_decomposition(&config(), decomp).is_err());
}
