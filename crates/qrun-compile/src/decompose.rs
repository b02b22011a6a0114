//! End-to-end native decomposition of a circuit.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use qrun_ir::{Circuit, ClbitId, Operation};

use crate::error::{CompileError, CompileResult};
use crate::manager::PassManager;
use crate::pass::Program;
use crate::passes::{BasicRouting, BasisTranslation, NativeVerification, TrivialLayout, verify_native};
use crate::property::{CouplingMap, Layout, NativeGateSet, PropertySet};

/// Rewrites circuits into a target's native gates and connectivity.
///
/// Runs layout, gate-set translation, routing (with measurement remap) and
/// verification, in that order.
pub struct Decomposer {
    coupling_map: CouplingMap,
    native_gates: NativeGateSet,
    manager: PassManager,
}

impl Decomposer {
    /// Create a decomposer for a target topology and native gate set.
    pub fn new(coupling_map: CouplingMap, native_gates: NativeGateSet) -> Self {
        let mut manager = PassManager::new();
        manager.add_pass(TrivialLayout);
        manager.add_pass(BasisTranslation);
        manager.add_pass(BasicRouting);
        manager.add_pass(NativeVerification);

        Self {
            coupling_map,
            native_gates,
            manager,
        }
    }

    /// The target topology.
    pub fn coupling_map(&self) -> &CouplingMap {
        &self.coupling_map
    }

    /// The target native gate set.
    pub fn native_gates(&self) -> &NativeGateSet {
        &self.native_gates
    }

    /// Decompose a circuit.
    ///
    /// The input is left untouched; the result carries the initial and
    /// final logical-to-physical layouts.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name(), qubits = circuit.num_qubits()))]
    pub fn decompose(&self, circuit: &Circuit) -> CompileResult<DecomposedCircuit> {
        let mut program = Program::from(circuit);
        let mut properties =
            PropertySet::new().with_target(self.coupling_map.clone(), self.native_gates.clone());

        self.manager.run(&mut program, &mut properties)?;

        let initial_layout = properties
            .initial_layout
            .ok_or(CompileError::MissingLayout)?;
        let final_layout = properties.layout.ok_or(CompileError::MissingLayout)?;

        info!(
            "Decomposed '{}': {} -> {} operations",
            circuit.name(),
            circuit.num_ops(),
            program.operations.len()
        );

        Ok(DecomposedCircuit {
            name: program.name,
            num_logical_qubits: program.num_qubits,
            num_physical_qubits: self.coupling_map.num_qubits(),
            num_clbits: program.num_clbits,
            operations: program.operations,
            initial_layout,
            final_layout,
        })
    }
}

/// A circuit of native operations on physical qubit indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecomposedCircuit {
    name: String,
    num_logical_qubits: u32,
    num_physical_qubits: u32,
    num_clbits: u32,
    operations: Vec<Operation>,
    initial_layout: Layout,
    final_layout: Layout,
}

impl DecomposedCircuit {
    /// Circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical qubits the source circuit allocated.
    pub fn num_logical_qubits(&self) -> u32 {
        self.num_logical_qubits
    }

    /// Physical qubits in the target topology.
    pub fn num_physical_qubits(&self) -> u32 {
        self.num_physical_qubits
    }

    /// Classical bits the source circuit allocated.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Native operations on physical qubits.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Layout before any routing swap.
    pub fn initial_layout(&self) -> &Layout {
        &self.initial_layout
    }

    /// Layout after the last routing swap.
    pub fn final_layout(&self) -> &Layout {
        &self.final_layout
    }

    /// Classical bits written by a measurement, ascending.
    pub fn measured_clbits(&self) -> Vec<ClbitId> {
        self.measurement_map().into_iter().map(|(c, _)| c).collect()
    }

    /// (clbit, physical qubit) for every measurement, by clbit.
    pub fn measurement_map(&self) -> Vec<(ClbitId, u32)> {
        let mut map: Vec<_> = self
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Measure { qubit, clbit } => Some((*clbit, qubit.0)),
                _ => None,
            })
            .collect();
        map.sort_by_key(|(c, _)| *c);
        map
    }

    /// Physical qubits touched by any operation, ascending.
    pub fn used_physical_qubits(&self) -> Vec<u32> {
        let mut used: Vec<u32> = self
            .operations
            .iter()
            .flat_map(Operation::qubits)
            .map(|q| q.0)
            .collect();
        used.sort_unstable();
        used.dedup();
        used
    }

    /// Check the operations against a topology and native gate set.
    pub fn verify(&self, coupling_map: &CouplingMap, natives: &NativeGateSet) -> CompileResult<()> {
        verify_native(&self.operations, coupling_map, natives)
    }
}
