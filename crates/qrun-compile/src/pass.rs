//! Pass trait and the program representation passes operate on.

use serde::{Deserialize, Serialize};

use qrun_ir::{Circuit, Operation};

use crate::error::CompileResult;
use crate::property::PropertySet;

/// The kind of decomposition pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Analysis pass that reads but does not modify the program.
    Analysis,
    /// Transformation pass that modifies the program.
    Transformation,
}

/// A mutable operation list moving through the pass pipeline.
///
/// Before routing, qubit ids are logical; after routing they are physical
/// indices of the target topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Circuit name.
    pub name: String,
    /// Number of logical qubits the source circuit allocated.
    pub num_qubits: u32,
    /// Number of classical bits.
    pub num_clbits: u32,
    /// Operations in order.
    pub operations: Vec<Operation>,
}

impl From<&Circuit> for Program {
    fn from(circuit: &Circuit) -> Self {
        Self {
            name: circuit.name().to_string(),
            num_qubits: circuit.num_qubits(),
            num_clbits: circuit.num_clbits(),
            operations: circuit.operations().to_vec(),
        }
    }
}

/// A decomposition pass.
///
/// Each pass performs one transformation or analysis on the program and
/// communicates with later passes through the [`PropertySet`].
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass on the given program.
    ///
    /// Analysis passes must leave `program` untouched and may write to the
    /// `PropertySet`.
    fn run(&self, program: &mut Program, properties: &mut PropertySet) -> CompileResult<()>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _program: &Program, _properties: &PropertySet) -> bool {
        true
    }
}
