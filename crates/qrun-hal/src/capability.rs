//! Backend capability introspection.
//!
//! [`Capabilities`] describe what a backend executes: qubit count,
//! connectivity, native gates and shot limit. The execution client checks
//! requests against them, and [`Capabilities::decomposer`] builds the
//! matching native decomposer.

use serde::{Deserialize, Serialize};

use qrun_compile::{CouplingMap, Decomposer, NativeGateSet};

/// Hardware capabilities of a quantum backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Qubit connectivity. All edges are bidirectional.
    pub coupling_map: CouplingMap,
    /// Gates executed without translation.
    pub native_gates: NativeGateSet,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (not real hardware).
    pub is_simulator: bool,
}

impl Capabilities {
    /// Create capabilities for a hardware device.
    pub fn new(
        name: impl Into<String>,
        coupling_map: CouplingMap,
        native_gates: NativeGateSet,
        max_shots: u32,
    ) -> Self {
        Self {
            name: name.into(),
            num_qubits: coupling_map.num_qubits(),
            coupling_map,
            native_gates,
            max_shots,
            is_simulator: false,
        }
    }

    /// Create capabilities for a fully connected simulator accepting every
    /// builder gate.
    pub fn simulator(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            is_simulator: true,
            ..Self::new(
                name,
                CouplingMap::full(num_qubits),
                NativeGateSet::universal(),
                100_000,
            )
        }
    }

    /// Mark these capabilities as belonging to a simulator.
    #[must_use]
    pub fn with_simulator(mut self, is_simulator: bool) -> Self {
        self.is_simulator = is_simulator;
        self
    }

    /// A decomposer targeting this backend.
    pub fn decomposer(&self) -> Decomposer {
        Decomposer::new(self.coupling_map.clone(), self.native_gates.clone())
    }
}
