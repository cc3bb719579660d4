//! Invariants of boundary enforcement and of a single relaxation step.

use bf_solver::{
    BoundaryEnforcer, Domain, Field, FlowModel, FlowState, FreeSurface, Obstacle, Relaxation,
    SimConfig, SimParams,
};
use proptest::prelude::*;

fn arb_geometry() -> impl Strategy<Value = Domain> {
    (12usize..40, 8usize..20)
        .prop_flat_map(|(nx, ny)| {
            (
                Just(nx),
                Just(ny),
                2usize..nx / 2,
                0usize..4,
                0usize..ny - 2,
            )
        })
        .prop_filter_map("obstacle must fit", |(nx, ny, start, length, height)| {
            Domain::new(
                nx,
                ny,
                Obstacle {
                    start,
                    length,
                    height,
                },
            )
            .ok()
        })
}

fn random_state(domain: &Domain, seed: u64) -> FlowState {
    // cheap deterministic noise, enough to exercise every branch
    let noise = |i: usize, j: usize, salt: u64| {
        let x = (i as u64 * 73_856_093) ^ (j as u64 * 19_349_663) ^ seed.wrapping_mul(salt);
        ((x % 2001) as f64 - 1000.0) / 100.0
    };
    FlowState {
        stream: Field::from_fn(domain.nx(), domain.ny(), |i, j| noise(i, j, 31)),
        vorticity: Field::from_fn(domain.nx(), domain.ny(), |i, j| noise(i, j, 17)),
    }
}

fn params(model: FlowModel, re: f64, free_surface: FreeSurface) -> SimParams {
    let base = match model {
        FlowModel::PotentialFlow => SimConfig::potential(),
        FlowModel::ViscousVorticity => SimConfig::viscous(re),
    };
    SimParams::from_config(&SimConfig {
        free_surface: Some(free_surface),
        ..base
    })
    .unwrap()
}

fn arb_params() -> impl Strategy<Value = SimParams> {
    (
        prop_oneof![Just(FlowModel::PotentialFlow), Just(FlowModel::ViscousVorticity)],
        prop_oneof![Just(0.5), Just(1.0), Just(2.0), Just(3.0)],
        prop_oneof![Just(FreeSurface::Extrapolate), Just(FreeSurface::Pinned)],
    )
        .prop_map(|(m, re, fs)| params(m, re, fs))
}

proptest! {
    #[test]
    fn enforcement_is_idempotent(domain in arb_geometry(), p in arb_params(), seed in any::<u64>()) {
        let enforcer = BoundaryEnforcer::new(&p);
        let mut once = random_state(&domain, seed);
        enforcer.apply(&domain, &mut once);
        let mut twice = once.clone();
        enforcer.apply(&domain, &mut twice);
        prop_assert_eq!(once.stream, twice.stream);
        prop_assert_eq!(once.vorticity, twice.vorticity);
    }

    #[test]
    fn obstacle_is_zero_and_edges_hold(domain in arb_geometry(), p in arb_params(), seed in any::<u64>()) {
        let enforcer = BoundaryEnforcer::new(&p);
        let mut s = random_state(&domain, seed);
        enforcer.apply(&domain, &mut s);
        let (nx, ny) = (domain.nx(), domain.ny());

        for i in 0..=nx {
            for j in 0..=ny {
                if domain.is_solid(i, j) {
                    prop_assert_eq!(s.stream[(i, j)], 0.0);
                    prop_assert_eq!(s.vorticity[(i, j)], 0.0);
                }
            }
            if !domain.is_solid(i, 0) {
                prop_assert_eq!(s.stream[(i, 0)], 0.0);
                prop_assert_eq!(s.vorticity[(i, 0)], 0.0);
            }
        }
        for j in 0..=ny {
            prop_assert_eq!(s.stream[(0, j)], j as f64 * p.v0);
        }
        for j in 1..ny {
            prop_assert_eq!(s.stream[(nx, j)], s.stream[(nx - 1, j)]);
            prop_assert_eq!(s.vorticity[(nx, j)], s.vorticity[(nx - 1, j)]);
        }
        if p.model.has_vorticity() {
            let o = domain.obstacle();
            let h2 = p.h * p.h;
            for j in 1..=o.height {
                prop_assert_eq!(s.vorticity[(o.start - 1, j)], -2.0 * s.stream[(o.start - 2, j)] / h2);
            }
        }
    }

    #[test]
    fn smoothing_never_touches_obstacle(domain in arb_geometry(), seed in any::<u64>()) {
        let p = params(FlowModel::ViscousVorticity, 7.0, FreeSurface::Extrapolate);
        let mut s = random_state(&domain, seed);
        BoundaryEnforcer::new(&p).apply(&domain, &mut s);
        for i in 0..=domain.nx() {
            for j in 0..=domain.ny() {
                if domain.is_solid(i, j) {
                    prop_assert_eq!(s.vorticity[(i, j)], 0.0);
                }
            }
        }
        prop_assert!(s.is_finite());
    }
}

#[test]
fn free_stream_is_a_fixed_point_of_the_stream_sweep() {
    // no obstacle cells above the centerline and zero vorticity
    let domain = Domain::new(
        40,
        12,
        Obstacle {
            start: 5,
            length: 0,
            height: 0,
        },
    )
    .unwrap();
    let p = params(FlowModel::PotentialFlow, 0.5, FreeSurface::Pinned);
    let mut s = FlowState::new(&domain);
    BoundaryEnforcer::new(&p).initialize(&domain, &mut s);
    let before = s.stream.clone();
    Relaxation::new(&p).sweep_stream(&domain, &mut s);
    assert_eq!(s.stream, before);
}
