//! Property-based tests for native decomposition.
//!
//! Random circuits are decomposed onto random targets and checked for:
//! - every operation native and on a coupling edge
//! - measurements landing on the physical home of their logical qubit
//! - the same output state as the source circuit, up to global phase
//! - an unchanged operation list on a universal, fully connected target

use std::f64::consts::PI;

use num_complex::Complex64;
use proptest::prelude::*;
use qrun_compile::{CouplingMap, DecomposedCircuit, Decomposer, Layout, NativeGateSet, Unitary2x2};
use qrun_ir::{Circuit, CircuitBuilder, Operation, QubitId, StandardGate};

// ============================================================================
// Generators
// ============================================================================

#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    X(u32),
    Sdg(u32),
    Rz(f64, u32),
    Ry(f64, u32),
    CX(u32, u32),
    CP(f64, u32, u32),
    CRy(f64, u32, u32),
    Swap(u32, u32),
    Ccx(u32, u32, u32),
    ControlledH(u32, u32),
}

impl GateOp {
    fn apply(self, builder: &mut CircuitBuilder) {
        let q = QubitId;
        let _ = match self {
            GateOp::H(a) => builder.h(q(a)),
            GateOp::X(a) => builder.x(q(a)),
            GateOp::Sdg(a) => builder.sdg(q(a)),
            GateOp::Rz(theta, a) => builder.rz(theta, q(a)),
            GateOp::Ry(theta, a) => builder.ry(theta, q(a)),
            GateOp::CX(a, b) => builder.cx(q(a), q(b)),
            GateOp::CP(theta, a, b) => builder.cp(theta, q(a), q(b)),
            GateOp::CRy(theta, a, b) => builder.cry(theta, q(a), q(b)),
            GateOp::Swap(a, b) => builder.swap(q(a), q(b)),
            GateOp::Ccx(a, b, c) => builder.ccx(q(a), q(b), q(c)),
            GateOp::ControlledH(a, b) => {
                builder.controlled(Operation::single(StandardGate::H, q(b)), [q(a)])
            }
        };
    }
}

fn arb_angle() -> impl Strategy<Value = f64> {
    -PI..PI
}

fn arb_pair(n: u32) -> impl Strategy<Value = (u32, u32)> {
    (0..n, 0..n).prop_filter("qubits must differ", |(a, b)| a != b)
}

fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    let n = num_qubits;
    prop_oneof![
        (0..n).prop_map(GateOp::H),
        (0..n).prop_map(GateOp::X),
        (0..n).prop_map(GateOp::Sdg),
        (arb_angle(), 0..n).prop_map(|(t, a)| GateOp::Rz(t, a)),
        (arb_angle(), 0..n).prop_map(|(t, a)| GateOp::Ry(t, a)),
        arb_pair(n).prop_map(|(a, b)| GateOp::CX(a, b)),
        (arb_angle(), arb_pair(n)).prop_map(|(t, (a, b))| GateOp::CP(t, a, b)),
        (arb_angle(), arb_pair(n)).prop_map(|(t, (a, b))| GateOp::CRy(t, a, b)),
        arb_pair(n).prop_map(|(a, b)| GateOp::Swap(a, b)),
        arb_pair(n).prop_map(|(a, b)| GateOp::ControlledH(a, b)),
        (0..n, 0..n, 0..n)
            .prop_filter("qubits must differ", |(a, b, c)| a != b && b != c && a != c)
            .prop_map(|(a, b, c)| GateOp::Ccx(a, b, c)),
    ]
}

/// Circuits over 3 to 5 qubits, every qubit measured at the end.
fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (3_u32..=5).prop_flat_map(|num_qubits| {
        prop::collection::vec(arb_gate_op(num_qubits), 1..=12).prop_map(move |ops| {
            let mut builder = CircuitBuilder::with_size("random", num_qubits, num_qubits);
            for op in ops {
                op.apply(&mut builder);
            }
            let _ = builder.measure_all();
            builder.build()
        })
    })
}

fn arb_topology() -> impl Strategy<Value = CouplingMap> {
    prop_oneof![
        Just(CouplingMap::linear(6)),
        Just(CouplingMap::star(5)),
        Just(CouplingMap::grid(2, 3)),
        Just(CouplingMap::full(5)),
    ]
}

fn arb_gate_set() -> impl Strategy<Value = NativeGateSet> {
    prop_oneof![
        Just(NativeGateSet::origin()),
        Just(NativeGateSet::iqm()),
        Just(NativeGateSet::ibm()),
        Just(NativeGateSet::universal()),
    ]
}

// ============================================================================
// State-vector helpers (test only)
// ============================================================================

fn apply_controlled(state: &mut [Complex64], u: &Unitary2x2, controls: &[u32], target: u32) {
    let tb = 1usize << target;
    for i in 0..state.len() {
        if i & tb != 0 || controls.iter().any(|c| i & (1 << c) == 0) {
            continue;
        }
        let (a0, a1) = (state[i], state[i | tb]);
        state[i] = u.data[0] * a0 + u.data[1] * a1;
        state[i | tb] = u.data[2] * a0 + u.data[3] * a1;
    }
}

fn apply(state: &mut [Complex64], op: &Operation) {
    match op {
        Operation::Single { gate, qubit } => {
            apply_controlled(state, &Unitary2x2::from_gate(gate).unwrap(), &[], qubit.0);
        }
        Operation::Two {
            gate,
            control,
            target,
        } => {
            let base = Unitary2x2::from_gate(&gate.controlled_base().unwrap()).unwrap();
            apply_controlled(state, &base, &[control.0], target.0);
        }
        Operation::Swap { a, b } => {
            let x = Unitary2x2::x();
            apply_controlled(state, &x, &[a.0], b.0);
            apply_controlled(state, &x, &[b.0], a.0);
            apply_controlled(state, &x, &[a.0], b.0);
        }
        Operation::Controlled { base, controls } => match base.as_ref() {
            Operation::Single { gate, qubit } => {
                let ctrl: Vec<u32> = controls.iter().map(|q| q.0).collect();
                apply_controlled(state, &Unitary2x2::from_gate(gate).unwrap(), &ctrl, qubit.0);
            }
            other => panic!("no state-vector rule for {other:?}"),
        },
        Operation::Measure { .. } => {}
    }
}

fn simulate(ops: &[Operation], num_qubits: u32) -> Vec<Complex64> {
    let mut state = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
    state[0] = Complex64::new(1.0, 0.0);
    for op in ops {
        apply(&mut state, op);
    }
    state
}

/// Move each logical bit of `index` to its physical slot.
fn to_physical(index: usize, layout: &Layout) -> usize {
    layout
        .iter()
        .filter(|(l, _)| index & (1 << l.0) != 0)
        .fold(0, |acc, (_, p)| acc | (1 << p))
}

fn assert_same_state(circuit: &Circuit, decomposed: &DecomposedCircuit) -> Result<(), TestCaseError> {
    let logical = simulate(circuit.operations(), circuit.num_qubits());
    let physical = simulate(decomposed.operations(), decomposed.num_physical_qubits());

    let (anchor, _) = logical
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
        .unwrap();
    let phase = physical[to_physical(anchor, decomposed.final_layout())] / logical[anchor];

    for (i, amp) in logical.iter().enumerate() {
        let got = physical[to_physical(i, decomposed.final_layout())];
        prop_assert!((amp * phase - got).norm() < 1e-6, "amplitude {} differs", i);
    }
    Ok(())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decomposed_operations_are_native_and_adjacent(
        circuit in arb_circuit(),
        topology in arb_topology(),
        natives in arb_gate_set(),
    ) {
        let decomposed = Decomposer::new(topology.clone(), natives.clone())
            .decompose(&circuit)
            .unwrap();

        for op in decomposed.operations() {
            prop_assert!(natives.is_native(op), "{} is not native", op.name());
            if let [a, b] = op.qubits().as_slice() {
                prop_assert!(topology.is_connected(a.0, b.0), "{} on {} and {}", op.name(), a, b);
            }
        }
    }

    #[test]
    fn measurements_follow_their_logical_qubit(
        circuit in arb_circuit(),
        topology in arb_topology(),
        natives in arb_gate_set(),
    ) {
        let decomposed = Decomposer::new(topology, natives).decompose(&circuit).unwrap();

        let expected: Vec<_> = circuit
            .measurement_map()
            .into_iter()
            .map(|(c, q)| (c, decomposed.final_layout().physical(q).unwrap()))
            .collect();
        prop_assert_eq!(decomposed.measurement_map(), expected);
        prop_assert_eq!(decomposed.measured_clbits(), circuit.measured_clbits());
    }

    #[test]
    fn decomposition_preserves_the_output_state(
        circuit in arb_circuit(),
        topology in arb_topology(),
        natives in arb_gate_set(),
    ) {
        let decomposed = Decomposer::new(topology, natives).decompose(&circuit).unwrap();
        assert_same_state(&circuit, &decomposed)?;
    }

    #[test]
    fn universal_full_target_is_identity(circuit in arb_circuit()) {
        let n = circuit.num_qubits();
        let decomposed = Decomposer::new(CouplingMap::full(n), NativeGateSet::universal())
            .decompose(&circuit)
            .unwrap();

        prop_assert_eq!(decomposed.operations(), circuit.operations());
        prop_assert_eq!(decomposed.initial_layout(), decomposed.final_layout());
    }
}

#[test]
fn native_toffoli_is_expanded_on_a_chain() {
    let mut builder = CircuitBuilder::with_size("toffoli", 3, 3);
    builder.x(QubitId(0)).unwrap();
    builder.x(QubitId(1)).unwrap();
    builder.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
    builder.measure_all().unwrap();
    let circuit = builder.build();

    for topology in [CouplingMap::linear(3), CouplingMap::grid(2, 3)] {
        let decomposed = Decomposer::new(topology.clone(), NativeGateSet::universal())
            .decompose(&circuit)
            .unwrap();
        assert!(decomposed.operations().iter().all(|op| op.num_qubits() <= 2));
        decomposed.verify(&topology, &NativeGateSet::universal()).unwrap();
        assert_same_state(&circuit, &decomposed).unwrap();
    }
}

#[test]
fn bell_circuit_round_trips_on_universal_target() {
    let circuit = Circuit::bell().unwrap();
    let decomposed = Decomposer::new(CouplingMap::full(2), NativeGateSet::universal())
        .decompose(&circuit)
        .unwrap();

    assert_eq!(decomposed.operations(), circuit.operations());
}

#[test]
fn grid_target_yields_cz_only_entanglers() {
    let mut builder = CircuitBuilder::new("ghz", 72, 72);
    let q = builder.alloc_qubits(13).unwrap();
    builder.h(q[0]).unwrap();
    for i in 1..q.len() {
        builder.cx(q[0], q[i]).unwrap();
    }
    builder.measure_all().unwrap();
    let circuit = builder.build();

    let decomposed = Decomposer::new(CouplingMap::grid(6, 12), NativeGateSet::origin())
        .decompose(&circuit)
        .unwrap();

    assert!(
        decomposed
            .operations()
            .iter()
            .filter(|op| op.num_qubits() == 2)
            .all(|op| op.name() == "cz")
    );
    assert_eq!(decomposed.measured_clbits().len(), 13);
}
