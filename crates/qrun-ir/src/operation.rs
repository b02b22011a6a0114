//! Circuit operations.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::qubit::{ClbitId, QubitId};

/// A single step of a circuit.
///
/// Operations are immutable once created. Builders validate them against
/// the allocated registers before they enter a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A single-qubit gate.
    Single {
        /// The gate applied.
        gate: StandardGate,
        /// The qubit acted on.
        qubit: QubitId,
    },
    /// A two-qubit gate in (control, target) order.
    Two {
        /// The gate applied.
        gate: StandardGate,
        /// Control qubit.
        control: QubitId,
        /// Target qubit.
        target: QubitId,
    },
    /// A base operation conditioned on every control qubit being `|1⟩`.
    Controlled {
        /// The operation to control. Never a measurement or another
        /// controlled operation.
        base: Box<Operation>,
        /// Control qubits, in order.
        controls: Vec<QubitId>,
    },
    /// Exchange the states of two qubits.
    Swap {
        /// First qubit.
        a: QubitId,
        /// Second qubit.
        b: QubitId,
    },
    /// Measure a qubit in the computational basis into a classical bit.
    Measure {
        /// The measured qubit.
        qubit: QubitId,
        /// The classical bit written.
        clbit: ClbitId,
    },
}

impl Operation {
    /// Create a single-qubit gate operation.
    pub fn single(gate: StandardGate, qubit: QubitId) -> Self {
        Operation::Single { gate, qubit }
    }

    /// Create a two-qubit gate operation.
    pub fn two(gate: StandardGate, control: QubitId, target: QubitId) -> Self {
        Operation::Two {
            gate,
            control,
            target,
        }
    }

    /// Create a swap operation.
    pub fn swap(a: QubitId, b: QubitId) -> Self {
        Operation::Swap { a, b }
    }

    /// Create a measurement operation.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Operation::Measure { qubit, clbit }
    }

    /// Create a controlled operation.
    ///
    /// Controlling an already controlled operation merges the control lists,
    /// outer controls first. Forms that have a two-qubit gate come back in
    /// that spelling: one control on `X` is a `CX` and one more control on a
    /// `CX` is a doubly controlled `X`.
    pub fn controlled(base: Operation, controls: impl IntoIterator<Item = QubitId>) -> IrResult<Self> {
        let mut controls: Vec<QubitId> = controls.into_iter().collect();
        if controls.is_empty() {
            return Err(IrError::EmptyControls {
                gate_name: base.name(),
            });
        }

        match base {
            Operation::Measure { .. } => Err(IrError::InvalidControlBase {
                gate_name: base.name(),
            }),
            Operation::Controlled {
                base: inner,
                controls: inner_controls,
            } => {
                controls.extend(inner_controls);
                Ok(Operation::Controlled {
                    base: inner,
                    controls,
                })
            }
            Operation::Single { gate, qubit } if controls.len() == 1 => match gate.controlled() {
                Some(two) => Ok(Operation::two(two, controls[0], qubit)),
                None => Ok(Operation::Controlled {
                    base: Box::new(Operation::single(gate, qubit)),
                    controls,
                }),
            },
            Operation::Two {
                gate,
                control,
                target,
            } => match gate.controlled_base() {
                Some(single) => {
                    controls.push(control);
                    Ok(Operation::Controlled {
                        base: Box::new(Operation::single(single, target)),
                        controls,
                    })
                }
                None => Ok(Operation::Controlled {
                    base: Box::new(Operation::two(gate, control, target)),
                    controls,
                }),
            },
            base => Ok(Operation::Controlled {
                base: Box::new(base),
                controls,
            }),
        }
    }

    /// Human-readable name, used in diagnostics.
    ///
    /// Controlled operations are named by prefixing one `c` per control,
    /// e.g. `ccx` for a doubly controlled X.
    pub fn name(&self) -> String {
        match self {
            Operation::Single { gate, .. } | Operation::Two { gate, .. } => gate.name().to_string(),
            Operation::Controlled { base, controls } => {
                format!("{}{}", "c".repeat(controls.len()), base.name())
            }
            Operation::Swap { .. } => "swap".to_string(),
            Operation::Measure { .. } => "measure".to_string(),
        }
    }

    /// All qubits this operation touches; for controlled operations the
    /// controls come first.
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Operation::Single { qubit, .. } | Operation::Measure { qubit, .. } => vec![*qubit],
            Operation::Two {
                control, target, ..
            } => vec![*control, *target],
            Operation::Controlled { base, controls } => {
                let mut qubits = controls.clone();
                qubits.extend(base.qubits());
                qubits
            }
            Operation::Swap { a, b } => vec![*a, *b],
        }
    }

    /// Classical bit written by this operation, if any.
    pub fn clbit(&self) -> Option<ClbitId> {
        match self {
            Operation::Measure { clbit, .. } => Some(*clbit),
            _ => None,
        }
    }

    /// Number of qubits this operation touches.
    pub fn num_qubits(&self) -> usize {
        match self {
            Operation::Single { .. } | Operation::Measure { .. } => 1,
            Operation::Two { .. } | Operation::Swap { .. } => 2,
            Operation::Controlled { base, controls } => controls.len() + base.num_qubits(),
        }
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self, Operation::Measure { .. })
    }

    /// Return a copy with every qubit rewritten through `map`.
    #[must_use]
    pub fn map_qubits(&self, map: impl Fn(QubitId) -> QubitId) -> Self {
        match self.try_map_qubits(&mut |q| Ok::<_, Infallible>(map(q))) {
            Ok(op) => op,
            Err(never) => match never {},
        }
    }

    /// Return a copy with every qubit rewritten through a fallible `map`.
    ///
    /// Stops at the first qubit `map` rejects.
    pub fn try_map_qubits<E>(
        &self,
        map: &mut impl FnMut(QubitId) -> Result<QubitId, E>,
    ) -> Result<Self, E> {
        Ok(match self {
            Operation::Single { gate, qubit } => Operation::Single {
                gate: *gate,
                qubit: map(*qubit)?,
            },
            Operation::Two {
                gate,
                control,
                target,
            } => Operation::Two {
                gate: *gate,
                control: map(*control)?,
                target: map(*target)?,
            },
            Operation::Controlled { base, controls } => {
                let controls = controls
                    .iter()
                    .map(|&q| map(q))
                    .collect::<Result<Vec<_>, E>>()?;
                Operation::Controlled {
                    base: Box::new(base.try_map_qubits(map)?),
                    controls,
                }
            }
            Operation::Swap { a, b } => Operation::Swap {
                a: map(*a)?,
                b: map(*b)?,
            },
            Operation::Measure { qubit, clbit } => Operation::Measure {
                qubit: map(*qubit)?,
                clbit: *clbit,
            },
        })
    }

    /// Check that gate arity matches the variant it is placed in.
    pub fn validate_shape(&self) -> IrResult<()> {
        match self {
            Operation::Single { gate, .. } => check_arity(gate, 1),
            Operation::Two { gate, .. } => check_arity(gate, 2),
            Operation::Controlled { base, controls } => {
                if controls.is_empty() {
                    return Err(IrError::EmptyControls {
                        gate_name: base.name(),
                    });
                }
                if matches!(
                    **base,
                    Operation::Measure { .. } | Operation::Controlled { .. }
                ) {
                    return Err(IrError::InvalidControlBase {
                        gate_name: base.name(),
                    });
                }
                base.validate_shape()
            }
            Operation::Swap { .. } | Operation::Measure { .. } => Ok(()),
        }
    }
}

fn check_arity(gate: &StandardGate, expected: u32) -> IrResult<()> {
    if gate.num_qubits() == expected {
        Ok(())
    } else {
        Err(IrError::QubitCountMismatch {
            gate_name: gate.name().to_string(),
            expected,
            got: gate.num_qubits(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_operation() {
        let op = Operation::two(StandardGate::CX, QubitId(0), QubitId(1));
        assert_eq!(op.name(), "cx");
        assert_eq!(op.qubits(), vec![QubitId(0), QubitId(1)]);
        assert_eq!(op.clbit(), None);
        assert!(op.validate_shape().is_ok());
    }

    #[test]
    fn test_measure_operation() {
        let op = Operation::measure(QubitId(2), ClbitId(0));
        assert!(op.is_measure());
        assert_eq!(op.clbit(), Some(ClbitId(0)));
        assert_eq!(op.name(), "measure");
    }

    #[test]
    fn test_controlled_flattens() {
        let inner = Operation::controlled(Operation::single(StandardGate::X, QubitId(2)), [QubitId(1)])
            .unwrap();
        let outer = Operation::controlled(inner, [QubitId(0)]).unwrap();

        match &outer {
            Operation::Controlled { base, controls } => {
                assert_eq!(controls, &vec![QubitId(0), QubitId(1)]);
                assert_eq!(**base, Operation::single(StandardGate::X, QubitId(2)));
            }
            other => panic!("expected controlled operation, got {other:?}"),
        }
        assert_eq!(outer.name(), "ccx");
        assert_eq!(outer.num_qubits(), 3);
    }

    #[test]
    fn test_controlled_takes_two_qubit_spelling() {
        let ch = Operation::controlled(Operation::single(StandardGate::H, QubitId(1)), [QubitId(0)])
            .unwrap();
        assert_eq!(ch, Operation::two(StandardGate::CH, QubitId(0), QubitId(1)));

        let crz = Operation::controlled(Operation::single(StandardGate::Rz(0.25), QubitId(3)), [QubitId(2)])
            .unwrap();
        assert_eq!(crz, Operation::two(StandardGate::CRz(0.25), QubitId(2), QubitId(3)));

        let ccz = Operation::controlled(Operation::two(StandardGate::CZ, QubitId(1), QubitId(2)), [QubitId(0)])
            .unwrap();
        assert_eq!(
            ccz,
            Operation::Controlled {
                base: Box::new(Operation::single(StandardGate::Z, QubitId(2))),
                controls: vec![QubitId(0), QubitId(1)],
            }
        );

        // No two-qubit gate for a controlled S.
        let cs = Operation::controlled(Operation::single(StandardGate::S, QubitId(1)), [QubitId(0)]).unwrap();
        assert!(matches!(cs, Operation::Controlled { .. }));
        assert_eq!(cs.name(), "cs");

        let crzz =
            Operation::controlled(Operation::two(StandardGate::RZZ(0.5), QubitId(1), QubitId(2)), [QubitId(0)])
                .unwrap();
        assert_eq!(crzz.name(), "crzz");
    }

    #[test]
    fn test_controlled_rejects_measure_and_empty() {
        let measure = Operation::measure(QubitId(0), ClbitId(0));
        assert!(matches!(
            Operation::controlled(measure, [QubitId(1)]),
            Err(IrError::InvalidControlBase { .. })
        ));

        let x = Operation::single(StandardGate::X, QubitId(0));
        assert!(matches!(
            Operation::controlled(x, []),
            Err(IrError::EmptyControls { .. })
        ));
    }

    #[test]
    fn test_arity_mismatch() {
        let op = Operation::single(StandardGate::CX, QubitId(0));
        assert!(matches!(
            op.validate_shape(),
            Err(IrError::QubitCountMismatch {
                expected: 1,
                got: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_try_map_qubits_stops_on_error() {
        let op = Operation::two(StandardGate::CX, QubitId(0), QubitId(9));
        let result = op.try_map_qubits(&mut |q| if q.0 < 5 { Ok(q) } else { Err(q) });
        assert_eq!(result, Err(QubitId(9)));
    }

    #[test]
    fn test_map_qubits() {
        let op = Operation::measure(QubitId(0), ClbitId(3));
        let mapped = op.map_qubits(|q| QubitId(q.0 + 5));
        assert_eq!(mapped, Operation::measure(QubitId(5), ClbitId(3)));
    }
}
