//! Layout passes for mapping logical qubits to physical qubits.

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind, Program};
use crate::property::{Layout, PropertySet};

/// Trivial layout pass.
///
/// Maps logical qubit i to physical qubit i.
pub struct TrivialLayout;

impl Pass for TrivialLayout {
    fn name(&self) -> &'static str {
        "TrivialLayout"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, program: &mut Program, properties: &mut PropertySet) -> CompileResult<()> {
        let coupling_map = properties
            .coupling_map
            .as_ref()
            .ok_or(CompileError::MissingCouplingMap)?;

        let available = coupling_map.num_qubits();
        if program.num_qubits > available {
            return Err(CompileError::CircuitTooLarge {
                required: program.num_qubits,
                available,
            });
        }

        let layout = Layout::trivial(program.num_qubits, available);
        properties.initial_layout = Some(layout.clone());
        properties.layout = Some(layout);

        Ok(())
    }

    fn should_run(&self, _program: &Program, properties: &PropertySet) -> bool {
        properties.layout.is_none() && properties.coupling_map.is_some()
    }
}
