//! Target properties shared between decomposition passes.
//!
//! A [`PropertySet`] carries the target description ([`CouplingMap`] and
//! [`NativeGateSet`]) into the pass pipeline and carries the [`Layout`] the
//! passes compute back out.
//!
//! # Example
//!
//! ```
//! use qrun_compile::{CouplingMap, NativeGateSet, PropertySet};
//!
//! let props = PropertySet::new().with_target(CouplingMap::grid(6, 12), NativeGateSet::origin());
//!
//! assert_eq!(props.coupling_map.as_ref().unwrap().num_qubits(), 72);
//! assert!(props.native_gates.as_ref().unwrap().contains("cz"));
//! ```

use petgraph::algo::astar;
use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};

use qrun_ir::{Operation, QubitId};

use crate::error::CompileError;

/// A mapping from logical qubits to physical qubits.
///
/// Physical qubits are array slots; logical qubits are stable keys into the
/// logical-to-physical table. Slots without a logical qubit hold ancillas in
/// their initial state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Physical slot of each logical qubit, indexed by logical id.
    physical: Vec<u32>,
    /// Logical qubit held by each physical slot.
    slots: Vec<Option<QubitId>>,
}

impl Layout {
    /// Create a trivial layout (logical qubit i -> physical qubit i).
    ///
    /// `num_logical` must not exceed `num_physical`.
    pub fn trivial(num_logical: u32, num_physical: u32) -> Self {
        let slots = (0..num_physical)
            .map(|p| (p < num_logical).then_some(QubitId(p)))
            .collect();
        Self {
            physical: (0..num_logical.min(num_physical)).collect(),
            slots,
        }
    }

    /// Get the physical qubit for a logical qubit.
    pub fn physical(&self, logical: QubitId) -> Option<u32> {
        self.physical.get(logical.index()).copied()
    }

    /// Get the logical qubit for a physical qubit.
    pub fn logical(&self, physical: u32) -> Option<QubitId> {
        self.slots.get(physical as usize).copied().flatten()
    }

    /// Exchange the contents of two physical slots.
    pub fn swap(&mut self, p1: u32, p2: u32) {
        let (i1, i2) = (p1 as usize, p2 as usize);
        if i1 >= self.slots.len() || i2 >= self.slots.len() {
            return;
        }

        self.slots.swap(i1, i2);
        if let Some(l) = self.slots[i1] {
            self.physical[l.index()] = p1;
        }
        if let Some(l) = self.slots[i2] {
            self.physical[l.index()] = p2;
        }
    }

    /// Number of logical qubits mapped.
    pub fn num_logical(&self) -> usize {
        self.physical.len()
    }

    /// Number of physical slots.
    pub fn num_physical(&self) -> usize {
        self.slots.len()
    }

    /// Iterate over (logical, physical) pairs in logical order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        self.physical
            .iter()
            .enumerate()
            .map(|(l, &p)| (QubitId(l as u32), p))
    }
}

/// Serialized form of a [`CouplingMap`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TopologySpec {
    num_qubits: u32,
    edges: Vec<(u32, u32)>,
}

/// Target device coupling map.
///
/// An undirected graph over physical qubit indices; an edge means a native
/// two-qubit gate can act on the pair directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TopologySpec", into = "TopologySpec")]
pub struct CouplingMap {
    /// Number of physical qubits.
    num_qubits: u32,
    /// Connectivity graph, nodes are physical indices.
    graph: UnGraphMap<u32, ()>,
}

impl CouplingMap {
    /// Create a coupling map with the given number of qubits and no edges.
    pub fn new(num_qubits: u32) -> Self {
        let mut graph = UnGraphMap::with_capacity(num_qubits as usize, 0);
        for q in 0..num_qubits {
            graph.add_node(q);
        }
        Self { num_qubits, graph }
    }

    /// Build a coupling map from an explicit edge list.
    pub fn from_edges(
        num_qubits: u32,
        edges: impl IntoIterator<Item = (u32, u32)>,
    ) -> Result<Self, CompileError> {
        let mut map = Self::new(num_qubits);
        for (q1, q2) in edges {
            if q1 >= num_qubits || q2 >= num_qubits {
                return Err(CompileError::InvalidTopology(format!(
                    "edge ({q1}, {q2}) references a qubit outside 0..{num_qubits}"
                )));
            }
            if q1 == q2 {
                return Err(CompileError::InvalidTopology(format!(
                    "self-loop on qubit {q1}"
                )));
            }
            map.add_edge(q1, q2);
        }
        Ok(map)
    }

    /// Add an edge between two qubits (bidirectional).
    pub fn add_edge(&mut self, q1: u32, q2: u32) {
        self.graph.add_edge(q1, q2, ());
    }

    /// Check if two qubits are directly connected.
    #[inline]
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        self.graph.contains_edge(q1, q2)
    }

    /// Get the number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the coupling edges, each pair listed once.
    pub fn edges(&self) -> Vec<(u32, u32)> {
        self.graph.all_edges().map(|(a, b, ())| (a, b)).collect()
    }

    /// Get neighbors of a qubit.
    pub fn neighbors(&self, qubit: u32) -> impl Iterator<Item = u32> + '_ {
        self.graph.neighbors(qubit)
    }

    /// Shortest path from `from` to `to`, both endpoints included.
    ///
    /// Returns `None` if the qubits lie in different components.
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        if !self.graph.contains_node(from) || !self.graph.contains_node(to) {
            return None;
        }
        astar(&self.graph, from, |n| n == to, |_| 1u32, |_| 0u32).map(|(_, path)| path)
    }

    /// Shortest-path distance, `None` if unreachable.
    pub fn distance(&self, from: u32, to: u32) -> Option<u32> {
        self.shortest_path(from, to)
            .map(|path| path.len().saturating_sub(1) as u32)
    }

    /// Create a linear coupling map (0-1-2-3-...).
    pub fn linear(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n.saturating_sub(1) {
            map.add_edge(i, i + 1);
        }
        map
    }

    /// Create a fully connected coupling map.
    pub fn full(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                map.add_edge(i, j);
            }
        }
        map
    }

    /// Create a star topology (center qubit connected to all others).
    pub fn star(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 1..n {
            map.add_edge(0, i);
        }
        map
    }

    /// Create a rectangular grid, qubits numbered row-major.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut map = Self::new(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let q = r * cols + c;
                if c + 1 < cols {
                    map.add_edge(q, q + 1);
                }
                if r + 1 < rows {
                    map.add_edge(q, q + cols);
                }
            }
        }
        map
    }
}

impl TryFrom<TopologySpec> for CouplingMap {
    type Error = CompileError;

    fn try_from(spec: TopologySpec) -> Result<Self, Self::Error> {
        Self::from_edges(spec.num_qubits, spec.edges)
    }
}

impl From<CouplingMap> for TopologySpec {
    fn from(map: CouplingMap) -> Self {
        Self {
            num_qubits: map.num_qubits,
            edges: map.edges(),
        }
    }
}

/// How an arbitrary single-qubit unitary is written with native gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneQubitBasis {
    /// RZ · RY · RZ.
    RzRy,
    /// RZ · RX · RZ.
    RzRx,
    /// RZ · SX · RZ · SX · RZ.
    RzSx,
    /// Phased RX pulses only.
    Prx,
    /// A single U(θ, φ, λ).
    U,
}

/// The native two-qubit entangling gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entangler {
    /// Controlled-X.
    Cx,
    /// Controlled-Z.
    Cz,
}

impl Entangler {
    /// Gate name of the entangler.
    pub fn name(self) -> &'static str {
        match self {
            Entangler::Cx => "cx",
            Entangler::Cz => "cz",
        }
    }
}

/// Native gate set for the target device.
///
/// Besides the set of executable gate names it records the single-qubit
/// basis and the entangler translation targets, both guaranteed to be
/// members of the set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct NativeGateSet {
    /// Gate names, lowercase.
    gates: Vec<String>,
    /// Single-qubit translation target.
    one_qubit: OneQubitBasis,
    /// Two-qubit translation target.
    entangler: Entangler,
}

impl NativeGateSet {
    /// Build a gate set from gate names, inferring the translation targets.
    ///
    /// Fails with [`CompileError::InvalidGateSet`] if the names contain no
    /// universal single-qubit family or no entangler.
    pub fn from_names(names: impl IntoIterator<Item = impl Into<String>>) -> Result<Self, CompileError> {
        let gates: Vec<String> = names
            .into_iter()
            .map(|g| g.into().to_ascii_lowercase())
            .collect();
        let has = |name: &str| gates.iter().any(|g| g == name);

        let one_qubit = if has("u") {
            OneQubitBasis::U
        } else if has("rz") && has("ry") {
            OneQubitBasis::RzRy
        } else if has("rz") && has("rx") {
            OneQubitBasis::RzRx
        } else if has("rz") && has("sx") {
            OneQubitBasis::RzSx
        } else if has("prx") {
            OneQubitBasis::Prx
        } else {
            return Err(CompileError::InvalidGateSet(format!(
                "no universal single-qubit family in [{}]",
                gates.join(", ")
            )));
        };

        let entangler = if has("cx") {
            Entangler::Cx
        } else if has("cz") {
            Entangler::Cz
        } else {
            return Err(CompileError::InvalidGateSet(format!(
                "no cx or cz entangler in [{}]",
                gates.join(", ")
            )));
        };

        Ok(Self {
            gates,
            one_qubit,
            entangler,
        })
    }

    fn fixed(names: &[&str], one_qubit: OneQubitBasis, entangler: Entangler) -> Self {
        Self {
            gates: names.iter().map(|g| (*g).to_string()).collect(),
            one_qubit,
            entangler,
        }
    }

    /// Superconducting cloud chip basis (RZ + RX + RY + CZ).
    pub fn origin() -> Self {
        Self::fixed(&["rz", "rx", "ry", "cz"], OneQubitBasis::RzRy, Entangler::Cz)
    }

    /// IQM basis (PRX + CZ).
    pub fn iqm() -> Self {
        Self::fixed(&["prx", "cz"], OneQubitBasis::Prx, Entangler::Cz)
    }

    /// IBM basis (RZ + SX + X + CX).
    pub fn ibm() -> Self {
        Self::fixed(&["rz", "sx", "x", "cx"], OneQubitBasis::RzSx, Entangler::Cx)
    }

    /// Every kind the circuit builder can produce.
    pub fn universal() -> Self {
        Self::fixed(
            &[
                "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz",
                "p", "u", "prx", "cx", "cy", "cz", "ch", "crx", "cry", "crz", "cp", "rzz", "swap",
                "ccx", "ccz", "cswap",
            ],
            OneQubitBasis::U,
            Entangler::Cx,
        )
    }

    /// Check if a gate is in the set.
    pub fn contains(&self, gate: &str) -> bool {
        self.gates.iter().any(|g| g == gate)
    }

    /// Check if an operation executes directly. Measurements always do.
    ///
    /// A controlled operation only counts in its canonical spelling, so a
    /// `Controlled` one-control `X` is not a native `cx`.
    pub fn is_native(&self, operation: &Operation) -> bool {
        match operation {
            Operation::Measure { .. } => true,
            Operation::Single { gate, .. } | Operation::Two { gate, .. } => self.contains(gate.name()),
            Operation::Swap { .. } => self.contains("swap"),
            Operation::Controlled { base, controls } => {
                let canonical = match base.as_ref() {
                    Operation::Single { gate, .. } => controls.len() > 1 || gate.controlled().is_none(),
                    Operation::Two { gate, .. } => gate.controlled_base().is_none(),
                    Operation::Swap { .. } => true,
                    Operation::Controlled { .. } | Operation::Measure { .. } => false,
                };
                canonical && self.contains(&operation.name())
            }
        }
    }

    /// Gate names.
    pub fn gates(&self) -> &[String] {
        &self.gates
    }

    /// Single-qubit translation target.
    pub fn one_qubit(&self) -> OneQubitBasis {
        self.one_qubit
    }

    /// Two-qubit translation target.
    pub fn entangler(&self) -> Entangler {
        self.entangler
    }
}

impl TryFrom<Vec<String>> for NativeGateSet {
    type Error = CompileError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_names(names)
    }
}

impl From<NativeGateSet> for Vec<String> {
    fn from(set: NativeGateSet) -> Self {
        set.gates
    }
}

/// Properties shared between decomposition passes.
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    /// Current logical-to-physical mapping, updated by routing.
    pub layout: Option<Layout>,

    /// Mapping chosen by the layout pass, before any swaps.
    pub initial_layout: Option<Layout>,

    /// Target coupling map defining allowed two-qubit interactions.
    pub coupling_map: Option<CouplingMap>,

    /// Target native gate set.
    pub native_gates: Option<NativeGateSet>,
}

impl PropertySet {
    /// Create a new empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target coupling map and native gate set.
    #[must_use]
    pub fn with_target(mut self, coupling_map: CouplingMap, native_gates: NativeGateSet) -> Self {
        self.coupling_map = Some(coupling_map);
        self.native_gates = Some(native_gates);
        self
    }
}
