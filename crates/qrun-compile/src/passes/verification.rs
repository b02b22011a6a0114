//! Verification that a routed program fits the target.

use qrun_ir::Operation;

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind, Program};
use crate::property::{CouplingMap, NativeGateSet, PropertySet};

/// Analysis pass asserting every operation is native and every multi-qubit
/// operation sits on coupling-map edges.
pub struct NativeVerification;

impl Pass for NativeVerification {
    fn name(&self) -> &'static str {
        "NativeVerification"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, program: &mut Program, properties: &mut PropertySet) -> CompileResult<()> {
        let coupling_map = properties
            .coupling_map
            .as_ref()
            .ok_or(CompileError::MissingCouplingMap)?;
        let natives = properties
            .native_gates
            .as_ref()
            .ok_or(CompileError::MissingNativeGates)?;

        verify_native(&program.operations, coupling_map, natives)
    }
}

/// Check physical operations against a topology and native gate set.
pub fn verify_native(
    operations: &[Operation],
    coupling_map: &CouplingMap,
    natives: &NativeGateSet,
) -> CompileResult<()> {
    for (index, op) in operations.iter().enumerate() {
        if !natives.is_native(op) {
            return Err(CompileError::VerificationFailed(format!(
                "operation {index} ('{}') is not in the native gate set",
                op.name()
            )));
        }

        let qubits = op.qubits();
        if let Some(q) = qubits.iter().find(|q| q.0 >= coupling_map.num_qubits()) {
            return Err(CompileError::VerificationFailed(format!(
                "operation {index} ('{}') uses {q} outside a {}-qubit topology",
                op.name(),
                coupling_map.num_qubits()
            )));
        }

        for (i, a) in qubits.iter().enumerate() {
            for b in &qubits[i + 1..] {
                if !coupling_map.is_connected(a.0, b.0) {
                    return Err(CompileError::VerificationFailed(format!(
                        "operation {index} ('{}') acts on non-adjacent {a} and {b}",
                        op.name()
                    )));
                }
            }
        }
    }
    Ok(())
}
