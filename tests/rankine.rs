use thermo_solver::process::{
    cycle_diagram, solve_rankine, CalcError, CyclePoint, RankineInput,
};
use thermo_solver::properties::{
    FixtureBackend, Fluid, PropertyError, StandardBackend, StateInput, StatePoint,
};

fn assert_close(label: &str, actual: f64, expected: f64, rel_tol: f64) {
    let denom = expected.abs().max(1.0);
    let diff = (actual - expected).abs();
    assert!(
        diff <= rel_tol * denom,
        "{label} expected {expected:.6} got {actual:.6} (diff {diff:.6}, tol {rel_tol})"
    );
}

fn input(boiler_bar: f64, inlet_c: f64, condenser_bar: f64) -> RankineInput {
    RankineInput {
        boiler_pressure_bar: boiler_bar,
        turbine_inlet_temp_c: inlet_c,
        condenser_pressure_bar: condenser_bar,
    }
}

fn point(p: f64, t: f64, h: f64, s: f64, v: f64, quality: Option<f64>) -> StatePoint {
    StatePoint {
        pressure_pa: p,
        temperature_k: t,
        enthalpy_j_per_kg: h,
        entropy_j_per_kg_k: s,
        specific_volume_m3_per_kg: v,
        internal_energy_j_per_kg: h - p * v,
        quality,
    }
}

/// 30 bar / 350 °C / 0.1 bar 사이클을 흉내 내는 합성 물성표
fn synthetic_cycle() -> FixtureBackend {
    let p_cond = 1.0e4;
    let p_boiler = 3.0e6;
    let v1 = 0.00101;
    let h1 = 191_800.0;
    let h2 = h1 + v1 * (p_boiler - p_cond);
    FixtureBackend::new()
        .with_state(
            Fluid::Water,
            StateInput::PQ { p: p_cond, q: 0.0 },
            point(p_cond, 318.96, h1, 649.2, v1, Some(0.0)),
        )
        .with_state(
            Fluid::Water,
            StateInput::PH { p: p_boiler, h: h2 },
            point(p_boiler, 319.1, h2, 649.2, 0.0010085, None),
        )
        .with_state(
            Fluid::Water,
            StateInput::PQ { p: p_boiler, q: 1.0 },
            point(p_boiler, 507.0, 2_803_300.0, 6_186.0, 0.06668, Some(1.0)),
        )
        .with_state(
            Fluid::Water,
            StateInput::PT {
                p: p_boiler,
                t: 623.15,
            },
            point(p_boiler, 623.15, 3_115_300.0, 6_744.2, 0.09053, None),
        )
        .with_state(
            Fluid::Water,
            StateInput::PS {
                p: p_cond,
                s: 6_744.2,
            },
            point(p_cond, 318.96, 2_136_100.0, 6_744.2, 11.8, Some(0.8125)),
        )
}

#[test]
fn cycle_arithmetic_with_synthetic_properties() {
    let result = solve_rankine(&synthetic_cycle(), &input(30.0, 350.0, 0.1)).expect("cycle");

    let w_pump = 0.00101 * (3.0e6 - 1.0e4);
    assert_close("w_pump", result.pump_work_j_per_kg, w_pump, 1e-9);
    assert_close("w_turbine", result.turbine_work_j_per_kg, 979_200.0, 1e-9);
    assert_close("w_net", result.net_work_j_per_kg, 979_200.0 - w_pump, 1e-9);
    let q_in = 3_115_300.0 - (191_800.0 + w_pump);
    assert_close("q_in", result.heat_added_j_per_kg, q_in, 1e-9);
    assert_close(
        "eta",
        result.thermal_efficiency,
        (979_200.0 - w_pump) / q_in,
        1e-9,
    );

    let order: Vec<CyclePoint> = result.states.iter().map(|s| s.point).collect();
    assert_eq!(order, CyclePoint::ORDER.to_vec());
}

#[test]
fn water_cycle_reference_scenario() {
    let backend = StandardBackend::new();
    let result = solve_rankine(&backend, &input(30.0, 350.0, 0.1)).expect("cycle");

    let s3 = result.state(CyclePoint::TurbineInlet).unwrap();
    let s4 = result.state(CyclePoint::TurbineExit).unwrap();
    assert!(s4.enthalpy_j_per_kg < s3.enthalpy_j_per_kg);
    assert_close("isentropic", s4.entropy_j_per_kg_k, s3.entropy_j_per_kg_k, 1e-4);
    assert!(result.pump_work_j_per_kg > 0.0);
    assert!(result.turbine_work_j_per_kg > 0.0);
    assert!(result.net_work_j_per_kg > 0.0);
    // 교재 값 약 33.4 %
    assert!(
        (0.32..0.35).contains(&result.thermal_efficiency),
        "eta={}",
        result.thermal_efficiency
    );
    assert_close("pump", result.pump_work_j_per_kg, 3_020.0, 0.01);

    let s1 = result.state(CyclePoint::PumpInlet).unwrap();
    assert_eq!(s1.quality, Some(0.0));
    assert!(s4.quality.is_some());
}

#[test]
fn higher_boiler_pressure_raises_efficiency() {
    let backend = StandardBackend::new();
    let low = solve_rankine(&backend, &input(30.0, 400.0, 0.1)).unwrap();
    let high = solve_rankine(&backend, &input(60.0, 400.0, 0.1)).unwrap();
    assert!(high.thermal_efficiency > low.thermal_efficiency);
}

#[test]
fn saturated_turbine_inlet_is_a_lookup_error() {
    // 30 bar 포화온도 약 233.9 °C
    let err = solve_rankine(&StandardBackend::new(), &input(30.0, 200.0, 0.1)).unwrap_err();
    match err {
        CalcError::PropertyLookup { step, source } => {
            assert_eq!(step, "turbine inlet");
            assert!(matches!(source, PropertyError::OutOfRange { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn supercritical_boiler_has_no_saturation_reference() {
    let err = solve_rankine(&StandardBackend::new(), &input(250.0, 600.0, 0.1)).unwrap_err();
    assert_eq!(err.kind(), "property_lookup");
}

#[test]
fn invalid_inputs_are_rejected_before_lookup() {
    // 빈 물성표: 조회까지 가면 PropertyLookup이 나온다
    let backend = FixtureBackend::new();
    let cases = [
        input(0.0, 350.0, 0.1),
        input(-5.0, 350.0, 0.1),
        input(30.0, 350.0, 0.0),
        input(30.0, 350.0, 30.0),
        input(30.0, 350.0, 40.0),
        input(30.0, -273.15, 0.1),
        input(30.0, f64::NAN, 0.1),
    ];
    for case in cases {
        let err = solve_rankine(&backend, &case).unwrap_err();
        assert!(
            matches!(err, CalcError::InvalidInput { .. }),
            "{case:?} -> {err:?}"
        );
    }
}

#[test]
fn diagram_closes_the_cycle() {
    let backend = StandardBackend::new();
    let result = solve_rankine(&backend, &RankineInput::default()).unwrap();
    let diagram = cycle_diagram(&backend, &result);
    assert_eq!(diagram.cycle_entropy.len(), 5);
    assert_eq!(diagram.cycle_entropy[0], diagram.cycle_entropy[4]);
    assert_close("p1", diagram.cycle_pressure_bar[0], 0.1, 1e-9);
    assert_close("p3", diagram.cycle_pressure_bar[2], 35.0, 1e-9);
    assert_eq!(diagram.dome.temperature_k.len(), 50);
    assert!(diagram
        .dome
        .entropy_liquid
        .iter()
        .zip(&diagram.dome.entropy_vapor)
        .all(|(l, v)| l < v));
}

#[test]
fn diagram_without_dome_data_keeps_cycle() {
    let backend = synthetic_cycle();
    let result = solve_rankine(&backend, &input(30.0, 350.0, 0.1)).unwrap();
    let diagram = cycle_diagram(&backend, &result);
    assert!(diagram.dome.is_empty());
    assert_eq!(diagram.cycle_temperature_k.len(), 5);
}
