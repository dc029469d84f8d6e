//! End-to-end tests: element list to derived equations to transient waveform.

use std::collections::BTreeSet;
use std::time::Duration;

use approx::assert_relative_eq;
use kirchhoff_ode::circuits::{Branch, VoltageMap};
use kirchhoff_ode::prelude::*;

fn series_rlc() -> Vec<Element> {
    vec![
        Element::voltage_source("V1", 1, 0, 10.0).unwrap(),
        Element::resistor("R1", 1, 2, 5.0).unwrap(),
        Element::inductor("L1", 2, 3, 0.5).unwrap(),
        Element::capacitor("C1", 3, 0, 0.25).unwrap(),
    ]
}

/// V1(100 V) - R1(1) - L1(1 mH) - R2(10) to ground, with C1(1 mF) hung off
/// the R2 node through an ideal line.
fn bridged_rlc() -> Vec<Element> {
    vec![
        Element::voltage_source("V1", 1, 0, 100.0).unwrap(),
        Element::resistor("R1", 1, 2, 1.0).unwrap(),
        Element::inductor("L1", 2, 3, 1e-3).unwrap(),
        Element::resistor("R2", 3, 0, 10.0).unwrap(),
        Element::line("X1", 3, 4).unwrap(),
        Element::capacitor("C1", 4, 0, 1e-3).unwrap(),
    ]
}

fn symbol_names(expr: &Expr) -> BTreeSet<String> {
    expr.symbols().iter().map(ToString::to_string).collect()
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

#[test]
fn series_rlc_yields_the_canonical_two_state_system() {
    let topology = CircuitTopology::new(series_rlc()).unwrap();
    let equations = topology.derive().unwrap();

    let u_l = &equations.voltage_expressions[&Symbol::voltage("L1")];
    let expected: BTreeSet<String> = ["I_L1", "R1", "U_C1", "U_V1"].map(String::from).into();
    assert_eq!(symbol_names(u_l), expected);
    assert_eq!(
        equations.current_expressions[&Symbol::current("C1")].to_string(),
        "I_L1"
    );

    let model = StateSpaceModel::bind(&topology, &equations).unwrap();
    assert_eq!(model.state_names(), vec!["I_L1".to_owned(), "U_C1".to_owned()]);
    let (i, u) = (0.4, 3.0);
    let dx = model.rhs(0.0, &StateVector::from_vec(vec![i, u]));
    assert_relative_eq!(dx[0], (10.0 - 5.0 * i - u) / 0.5, epsilon = 1e-12);
    assert_relative_eq!(dx[1], i / 0.25, epsilon = 1e-12);
}

#[test]
fn resistor_only_networks_have_no_equations() {
    let ladder = vec![
        Element::voltage_source("V1", 1, 0, 5.0).unwrap(),
        Element::resistor("R1", 1, 2, 1.0).unwrap(),
        Element::resistor("R2", 2, 0, 2.0).unwrap(),
        Element::line("X1", 2, 3).unwrap(),
        Element::resistor("R3", 3, 0, 3.0).unwrap(),
    ];
    let topology = CircuitTopology::new(ladder).unwrap();
    let equations = topology.derive().unwrap();
    assert!(equations.current_expressions.is_empty());
    assert!(equations.voltage_expressions.is_empty());
    assert_eq!(StateSpaceModel::bind(&topology, &equations).unwrap().dimension(), 0);
}

#[test]
fn lines_never_name_a_branch() {
    let topology = CircuitTopology::new(bridged_rlc()).unwrap();
    let names: BTreeSet<&str> = topology.branches().iter().map(Branch::name).collect();
    assert_eq!(names, BTreeSet::from(["C1", "L1", "R2"]));

    for (idx, element) in topology.elements().iter().enumerate() {
        let branch = topology.branch_of(idx).unwrap();
        assert_eq!(
            topology
                .branches()
                .iter()
                .filter(|b| b.members().iter().any(|m| m.element == idx))
                .count(),
            1,
            "{} must lie on exactly one branch",
            element.name()
        );
        assert!(branch.sigma(idx).is_some());
    }
}

#[test]
fn reversing_traversal_flips_every_voltage_label() {
    let topology = CircuitTopology::new(bridged_rlc()).unwrap();
    let reversed: Vec<Branch> = topology.branches().iter().map(Branch::reversed).collect();
    let flipped = VoltageMap::resolve(reversed.iter(), topology.elements()).unwrap();

    assert_eq!(flipped.len(), topology.voltages().len());
    for entry in topology.voltages().iter() {
        let other = flipped.get(entry.element()).unwrap();
        assert_eq!(other.is_negative(), !entry.is_negative());
        assert_eq!(other.pair()[0], entry.pair()[1]);
        assert_eq!(other.pair()[1], entry.pair()[0]);

        let (p, q) = (&entry.pair()[0], &entry.pair()[1]);
        assert_eq!(
            entry.drop_between(p, q).unwrap().simplify(),
            other.drop_between(p, q).unwrap().simplify()
        );
    }
}

#[test]
fn rederiving_is_byte_identical() {
    let render = || {
        let topology = CircuitTopology::new(bridged_rlc()).unwrap();
        let model = StateSpaceModel::from_topology(&topology).unwrap();
        (topology.derive().unwrap().to_string(), model.to_string())
    };
    assert_eq!(render(), render());

    let topology = CircuitTopology::new(bridged_rlc()).unwrap();
    assert_eq!(topology.derive().unwrap(), topology.derive().unwrap());
}

#[test]
fn named_nodes_derive_like_numbered_ones() {
    let elements = vec![
        Element::voltage_source("V1", "vin", "0", 10.0).unwrap(),
        Element::resistor("R1", "vin", "mid", 5.0).unwrap(),
        Element::inductor("L1", "mid", "out", 0.5).unwrap(),
        Element::capacitor("C1", "out", "0", 0.25).unwrap(),
    ];
    let named = StateSpaceModel::from_topology(&CircuitTopology::new(elements).unwrap()).unwrap();
    let numbered =
        StateSpaceModel::from_topology(&CircuitTopology::new(series_rlc()).unwrap()).unwrap();
    let x = StateVector::from_vec(vec![-0.2, 1.5]);
    let (a, b) = (named.rhs(0.0, &x), numbered.rhs(0.0, &x));
    assert_relative_eq!(a[0], b[0], epsilon = 1e-12);
    assert_relative_eq!(a[1], b[1], epsilon = 1e-12);
}

// ---------------------------------------------------------------------------
// Transient behaviour
// ---------------------------------------------------------------------------

#[test]
fn bridged_rlc_settles_at_dc_operating_point() {
    let topology = CircuitTopology::new(bridged_rlc()).unwrap();
    let model = StateSpaceModel::from_topology(&topology).unwrap();
    let initial = InitialConditions::new().with("I_L1", 0.0).with("U_C1", 0.0);
    let config = SimulationConfig::fixed(
        "bridged_rlc",
        Duration::from_secs(1),
        Duration::from_micros(100),
    );
    let waveform = simulate(&model, &initial, &config).unwrap();

    assert_eq!(waveform.len(), 10_001);
    let last = waveform.final_state().unwrap();
    assert_relative_eq!(last[0], 100.0 / 11.0, max_relative = 1e-6);
    assert_relative_eq!(last[1], 1000.0 / 11.0, max_relative = 1e-6);
}

#[test]
fn adaptive_and_fixed_step_agree() {
    let topology = CircuitTopology::new(bridged_rlc()).unwrap();
    let model = StateSpaceModel::from_topology(&topology).unwrap();
    let initial: InitialConditions = [("L1", 0.0), ("C1", 0.0)].into_iter().collect();
    let duration = Duration::from_millis(20);

    let fixed = simulate(
        &model,
        &initial,
        &SimulationConfig::fixed("fixed", duration, Duration::from_micros(10)),
    )
    .unwrap();
    let adaptive = simulate(
        &model,
        &initial,
        &SimulationConfig::adaptive("adaptive", duration, Duration::from_micros(10), 1e-9, 1e-9),
    )
    .unwrap();

    assert_relative_eq!(*adaptive.times.last().unwrap(), 0.02, epsilon = 1e-12);
    assert!(adaptive.len() < fixed.len());
    let (f, a) = (fixed.final_state().unwrap(), adaptive.final_state().unwrap());
    assert_relative_eq!(f[0], a[0], max_relative = 1e-5);
    assert_relative_eq!(f[1], a[1], max_relative = 1e-5);
}

#[test]
fn waveform_exports_one_column_per_state() {
    let model = StateSpaceModel::from_topology(&CircuitTopology::new(series_rlc()).unwrap()).unwrap();
    let initial = InitialConditions::new().with("L1", 0.0).with("C1", 0.0);
    let config = SimulationConfig::fixed("csv", Duration::from_millis(10), Duration::from_millis(1));
    let waveform = simulate(&model, &initial, &config).unwrap();

    let mut buffer = Vec::new();
    write_transient_state_csv(&mut buffer, &waveform).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("time,I_L1,U_C1"));
    assert_eq!(lines.count(), waveform.len());
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn dangling_element_is_a_disconnected_topology() {
    let mut elements = series_rlc();
    elements.push(Element::resistor("R9", 2, 9, 1.0).unwrap());
    assert!(matches!(
        CircuitTopology::new(elements),
        Err(Error::DisconnectedTopology { node, .. }) if node == NodeId::Index(9)
    ));
}

#[test]
fn separate_loop_is_a_disconnected_topology() {
    let mut elements = series_rlc();
    elements.extend([
        Element::resistor("R5", 5, 6, 1.0).unwrap(),
        Element::resistor("R6", 6, 7, 1.0).unwrap(),
        Element::resistor("R7", 7, 5, 1.0).unwrap(),
    ]);
    assert!(matches!(
        CircuitTopology::new(elements),
        Err(Error::DisconnectedTopology { .. })
    ));
}

#[test]
fn unknown_prefix_is_rejected() {
    assert!(matches!(
        Element::new("Q1", 1, 0, Some(1.0)),
        Err(Error::UnknownElementKind(name)) if name == "Q1"
    ));
}

#[test]
fn every_state_needs_an_initial_condition() {
    let model = StateSpaceModel::from_topology(&CircuitTopology::new(series_rlc()).unwrap()).unwrap();
    let config = SimulationConfig::fixed("rlc", Duration::from_secs(1), Duration::from_millis(1));
    let err = simulate(&model, &InitialConditions::new().with("I_L1", 0.0), &config).unwrap_err();
    assert!(matches!(err, Error::MissingInitialCondition(name) if name == "U_C1"));
}
