//! Full runs on the reference channel: 70 x 20 grid, beam at i = 10..=18, height 8.

use bf_solver::{
    Domain, FlowModel, Obstacle, RunStatus, SimConfig, SweepMode, VelocityOptions, normalize, solve,
    velocity_field,
};

fn channel() -> Domain {
    Domain::new(
        70,
        20,
        Obstacle {
            start: 10,
            length: 8,
            height: 8,
        },
    )
    .unwrap()
}

#[test]
fn potential_flow_converges() {
    let domain = channel();
    let solution = solve(&domain, &SimConfig::potential()).unwrap();
    let report = &solution.report;

    assert_eq!(report.status, RunStatus::Converged);
    assert!(report.max_diff_u < 1e-5);
    assert!(report.max_diff_u >= 0.0);

    let psi = &solution.state.stream;
    for j in 1..=20 {
        assert!(psi[(0, j)] > psi[(0, j - 1)]);
    }
    for i in 10..=18 {
        for j in 0..=8 {
            assert_eq!(psi[(i, j)], 0.0);
        }
    }
    // flow is squeezed over the beam: streamlines stay between the walls
    for i in 1..70 {
        for j in 1..20 {
            assert!(psi[(i, j)] >= -1e-6 && psi[(i, j)] <= 20.0 + 1e-6);
        }
    }

    let v = velocity_field(psi, &domain, 1.0, VelocityOptions::for_model(FlowModel::PotentialFlow));
    let max = v.iter().map(|s| s.magnitude).fold(0.0, f64::max);
    assert!((max - 1.0).abs() < 1e-12);
}

#[test]
fn red_black_potential_flow_matches_gauss_seidel() {
    let domain = channel();
    let gs = solve(&domain, &SimConfig::potential()).unwrap();
    let rb = solve(
        &domain,
        &SimConfig {
            sweep: SweepMode::RedBlack,
            ..SimConfig::potential()
        },
    )
    .unwrap();
    assert_eq!(rb.report.status, RunStatus::Converged);
    let (a, b) = (gs.state.stream.as_matrix(), rb.state.stream.as_matrix());
    let worst = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max);
    // both stop within 1e-5 per iteration of the same fixed point
    assert!(worst < 0.05, "{worst}");
}

#[test]
fn viscous_low_reynolds_converges_and_skips_obstacle_rows() {
    let domain = channel();
    let cfg = SimConfig::viscous(0.5);
    let mut solution = solve(&domain, &cfg).unwrap();
    let report = &solution.report;

    assert_eq!(report.status, RunStatus::Converged);
    assert!(report.iterations < cfg.max_iterations);
    assert!(solution.state.is_finite());
    assert!(report.max_diff_u >= 0.0 && report.max_diff_u < 10.0 * cfg.tolerance);
    assert!(report.max_diff_w >= 0.0 && report.max_diff_w < 10.0 * cfg.tolerance);

    normalize(&mut solution.state.stream, 1.0, 1.0);
    let v = velocity_field(&solution.state.stream, &domain, 1.0, VelocityOptions::default());
    assert!(v.iter().all(|s| !domain.is_solid(s.i, s.j)));
    assert_eq!(v.len(), 68 * 18 - 9 * 8);
    assert!(v.iter().all(|s| s.magnitude.is_finite()));
}

#[test]
fn viscous_reynolds_five_is_flagged_and_finite() {
    let domain = channel();
    let cfg = SimConfig {
        max_iterations: 20_000,
        ..SimConfig::viscous(5.0)
    };
    let solution = solve(&domain, &cfg).unwrap();
    let status = solution.report.status;

    assert!(
        matches!(status, RunStatus::Converged | RunStatus::PartialConverged(_)),
        "{status:?}"
    );
    assert!(solution.state.is_finite());
    assert!(solution.report.max_diff_u.is_finite());
    assert_eq!(solution.report.effective_tolerance, cfg.tolerance * 200.0);
}

#[test]
fn unstable_relaxation_factor_diverges() {
    let domain = channel();
    let cfg = SimConfig {
        omega: Some(2.5),
        max_iterations: 5000,
        ..SimConfig::viscous(0.5)
    };
    let solution = solve(&domain, &cfg).unwrap();
    assert_eq!(solution.report.status, RunStatus::Diverged);
    assert!(solution.report.iterations < 5000);
}

#[test]
fn invalid_configuration_fails_before_iterating() {
    let domain = channel();
    let cfg = SimConfig {
        tolerance: 0.0,
        ..SimConfig::viscous(0.5)
    };
    assert!(solve(&domain, &cfg).is_err());
}
