//! Circuit builder and frozen circuit.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::operation::Operation;
use crate::qubit::{ClbitId, QubitId};
use crate::register::{RegisterAllocator, RegisterIndex};

/// Incrementally builds a [`Circuit`].
///
/// The builder owns one allocator per register. Every appended operation is
/// checked against what has been allocated so far, and each classical bit
/// may be the target of at most one measurement.
#[derive(Debug, Clone)]
pub struct CircuitBuilder {
    /// Name of the circuit.
    name: String,
    /// Qubit pool.
    qubits: RegisterAllocator<QubitId>,
    /// Classical-bit pool.
    clbits: RegisterAllocator<ClbitId>,
    /// Operations appended so far.
    operations: Vec<Operation>,
    /// Classical bit to the qubit measured into it.
    measured: FxHashMap<ClbitId, QubitId>,
}

impl CircuitBuilder {
    /// Create a builder over pools of the given sizes. Nothing is allocated.
    pub fn new(name: impl Into<String>, qubit_pool: u32, clbit_pool: u32) -> Self {
        Self {
            name: name.into(),
            qubits: RegisterAllocator::new(qubit_pool),
            clbits: RegisterAllocator::new(clbit_pool),
            operations: Vec::new(),
            measured: FxHashMap::default(),
        }
    }

    /// Create a builder with exactly `num_qubits` and `num_clbits` already
    /// allocated.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            qubits: RegisterAllocator::fully_allocated(num_qubits),
            clbits: RegisterAllocator::fully_allocated(num_clbits),
            operations: Vec::new(),
            measured: FxHashMap::default(),
        }
    }

    /// Allocate `count` qubits from the pool.
    pub fn alloc_qubits(&mut self, count: u32) -> IrResult<Vec<QubitId>> {
        self.qubits.allocate(count)
    }

    /// Allocate `count` classical bits from the pool.
    pub fn alloc_clbits(&mut self, count: u32) -> IrResult<Vec<ClbitId>> {
        self.clbits.allocate(count)
    }

    /// Number of qubits allocated so far.
    pub fn num_qubits(&self) -> u32 {
        self.qubits.allocated()
    }

    /// Number of classical bits allocated so far.
    pub fn num_clbits(&self) -> u32 {
        self.clbits.allocated()
    }

    /// Append an operation after validating it.
    ///
    /// Fails with [`IrError::InvalidReference`] if it touches an index that
    /// was not allocated, and with [`IrError::DuplicateMeasurement`] if it
    /// measures into a classical bit that already holds a result.
    pub fn append(&mut self, operation: Operation) -> IrResult<&mut Self> {
        self.validate(&operation)?;

        if let Operation::Measure { qubit, clbit } = operation {
            self.measured.insert(clbit, qubit);
        }
        self.operations.push(operation);
        Ok(self)
    }

    fn validate(&self, operation: &Operation) -> IrResult<()> {
        operation.validate_shape()?;

        let qubits = operation.qubits();
        let mut seen = FxHashSet::default();
        for &qubit in &qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: Some(operation.name()),
                });
            }
            check_reference(&self.qubits, qubit, operation)?;
        }

        if let Some(clbit) = operation.clbit() {
            check_reference(&self.clbits, clbit, operation)?;
            if let Some(&first) = self.measured.get(&clbit) {
                return Err(IrError::DuplicateMeasurement {
                    clbit,
                    first,
                    second: qubits[0],
                });
            }
        }

        Ok(())
    }

    /// Freeze the builder into an immutable circuit.
    pub fn build(self) -> Circuit {
        Circuit {
            name: self.name,
            num_qubits: self.qubits.allocated(),
            num_clbits: self.clbits.allocated(),
            operations: self.operations,
        }
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    fn single(&mut self, gate: StandardGate, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Operation::single(gate, qubit))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::X, qubit)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Y, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::S, qubit)
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Sdg, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::T, qubit)
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Tdg, qubit)
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::SX, qubit)
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Rx(theta), qubit)
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Ry(theta), qubit)
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::Rz(theta), qubit)
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::P(theta), qubit)
    }

    /// Apply universal U gate.
    pub fn u(&mut self, theta: f64, phi: f64, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.single(StandardGate::U(theta, phi, lambda), qubit)
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    fn two(&mut self, gate: StandardGate, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Operation::two(gate, control, target))
    }

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CX, control, target)
    }

    /// Apply CY gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CY, control, target)
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CZ, control, target)
    }

    /// Apply controlled-Hadamard gate.
    pub fn ch(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CH, control, target)
    }

    /// Apply controlled-Rx gate.
    pub fn crx(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CRx(theta), control, target)
    }

    /// Apply controlled-Ry gate.
    pub fn cry(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CRy(theta), control, target)
    }

    /// Apply controlled-Rz gate.
    pub fn crz(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CRz(theta), control, target)
    }

    /// Apply controlled-phase gate.
    pub fn cp(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::CP(theta), control, target)
    }

    /// Apply RZZ (ZZ rotation) gate.
    pub fn rzz(&mut self, theta: f64, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.two(StandardGate::RZZ(theta), q1, q2)
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.append(Operation::swap(q1, q2))
    }

    // =========================================================================
    // Multi-qubit and controlled gates
    // =========================================================================

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        let op = Operation::controlled(Operation::single(StandardGate::X, target), [c1, c2])?;
        self.append(op)
    }

    /// Apply `base` conditioned on every qubit in `controls`.
    pub fn controlled(
        &mut self,
        base: Operation,
        controls: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        let op = Operation::controlled(base, controls)?;
        self.append(op)
    }

    // =========================================================================
    // Measurement
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.append(Operation::measure(qubit, clbit))
    }

    /// Measure every allocated qubit `i` into classical bit `i`.
    ///
    /// All measurements are validated before any is appended, so a failure
    /// leaves the builder unchanged.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        let measurements: Vec<Operation> = (0..self.qubits.allocated())
            .map(|i| Operation::measure(QubitId(i), ClbitId(i)))
            .collect();
        for op in &measurements {
            self.validate(op)?;
        }
        for op in measurements {
            self.append(op)?;
        }
        Ok(self)
    }
}

fn check_reference<T: RegisterIndex>(
    register: &RegisterAllocator<T>,
    id: T,
    operation: &Operation,
) -> IrResult<()> {
    if register.contains(id) {
        Ok(())
    } else {
        Err(IrError::InvalidReference {
            kind: T::KIND,
            index: id.raw(),
            allocated: register.allocated(),
            operation: operation.name(),
        })
    }
}

/// A frozen quantum circuit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circuit {
    name: String,
    num_qubits: u32,
    num_clbits: u32,
    operations: Vec<Operation>,
}

impl Circuit {
    /// Create a Bell state circuit with both qubits measured.
    pub fn bell() -> IrResult<Self> {
        let mut builder = CircuitBuilder::with_size("bell", 2, 2);
        builder
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure_all()?;
        Ok(builder.build())
    }

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of allocated qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of allocated classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// The ordered operations.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of operations.
    pub fn num_ops(&self) -> usize {
        self.operations.len()
    }

    /// Classical bits written by a measurement, ascending.
    pub fn measured_clbits(&self) -> Vec<ClbitId> {
        self.measurement_map().into_iter().map(|(c, _)| c).collect()
    }

    /// `(classical bit, measured qubit)` pairs, ascending by classical bit.
    pub fn measurement_map(&self) -> Vec<(ClbitId, QubitId)> {
        let mut map: Vec<_> = self
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Measure { qubit, clbit } => Some((*clbit, *qubit)),
                _ => None,
            })
            .collect();
        map.sort_by_key(|(c, _)| *c);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bell_circuit() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.num_ops(), 4);
        assert_eq!(
            circuit.measurement_map(),
            vec![(ClbitId(0), QubitId(0)), (ClbitId(1), QubitId(1))]
        );
    }

    #[test]
    fn test_allocation_then_build() {
        let mut builder = CircuitBuilder::new("alloc", 24, 24);
        let q = builder.alloc_qubits(3).unwrap();
        let c = builder.alloc_clbits(2).unwrap();

        builder
            .x(q[2])
            .unwrap()
            .h(q[0])
            .unwrap()
            .cp(std::f64::consts::FRAC_PI_2, q[1], q[0])
            .unwrap()
            .measure(q[0], c[0])
            .unwrap()
            .measure(q[1], c[1])
            .unwrap();

        let circuit = builder.build();
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.measured_clbits(), vec![ClbitId(0), ClbitId(1)]);
    }

    #[test]
    fn test_invalid_qubit_reference() {
        let mut builder = CircuitBuilder::new("bad", 24, 24);
        builder.alloc_qubits(2).unwrap();

        let err = builder.cx(QubitId(0), QubitId(5)).unwrap_err();
        assert!(matches!(
            err,
            IrError::InvalidReference {
                index: 5,
                allocated: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_clbit_reference() {
        let mut builder = CircuitBuilder::new("bad", 4, 4);
        builder.alloc_qubits(1).unwrap();

        let err = builder.measure(QubitId(0), ClbitId(0)).unwrap_err();
        assert!(matches!(err, IrError::InvalidReference { index: 0, allocated: 0, .. }));
    }

    #[test]
    fn test_duplicate_measurement_rejected() {
        let mut builder = CircuitBuilder::with_size("dup", 2, 1);
        builder.measure(QubitId(0), ClbitId(0)).unwrap();

        let err = builder.measure(QubitId(1), ClbitId(0)).unwrap_err();
        assert!(matches!(
            err,
            IrError::DuplicateMeasurement {
                clbit: ClbitId(0),
                first: QubitId(0),
                second: QubitId(1),
            }
        ));
        assert_eq!(builder.build().num_ops(), 1);
    }

    #[test]
    fn test_duplicate_qubit_rejected() {
        let mut builder = CircuitBuilder::with_size("dup", 2, 0);
        assert!(matches!(
            builder.cx(QubitId(1), QubitId(1)),
            Err(IrError::DuplicateQubit { .. })
        ));
        assert!(matches!(
            builder.ccx(QubitId(0), QubitId(1), QubitId(1)),
            Err(IrError::DuplicateQubit { .. })
        ));
    }

    #[test]
    fn test_controlled_builder() {
        let mut builder = CircuitBuilder::with_size("ctrl", 4, 0);
        builder
            .controlled(
                Operation::single(StandardGate::Rz(std::f64::consts::FRAC_PI_4), QubitId(3)),
                [QubitId(0)],
            )
            .unwrap();

        let circuit = builder.build();
        assert_eq!(circuit.operations()[0].qubits(), vec![QubitId(0), QubitId(3)]);
    }

    #[test]
    fn test_measure_all_needs_clbits() {
        let mut builder = CircuitBuilder::with_size("short", 3, 2);
        assert!(matches!(
            builder.measure_all(),
            Err(IrError::InvalidReference { index: 2, .. })
        ));
        assert!(builder.build().operations().is_empty());
    }

    #[test]
    fn test_failed_measure_all_appends_nothing() {
        let mut builder = CircuitBuilder::with_size("taken", 3, 3);
        builder.h(QubitId(0)).unwrap();
        builder.measure(QubitId(0), ClbitId(2)).unwrap();

        assert!(matches!(
            builder.measure_all(),
            Err(IrError::DuplicateMeasurement { clbit: ClbitId(2), .. })
        ));
        let circuit = builder.build();
        assert_eq!(circuit.num_ops(), 2);
        assert_eq!(circuit.measured_clbits(), vec![ClbitId(2)]);
    }
}
