//! Quantum gate types.

use serde::{Deserialize, Serialize};

/// Standard gates with known semantics.
///
/// Parameters are plain angles in radians. The set is closed so that
/// translation tables over it can be checked for exhaustiveness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(f64, f64, f64),
    /// Phased RX gate: PRX(θ, φ) = RZ(φ) · RX(θ) · RZ(-φ).
    PRX(f64, f64),

    // Two-qubit gates, (control, target) order
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// Controlled rotation around X.
    CRx(f64),
    /// Controlled rotation around Y.
    CRy(f64),
    /// Controlled rotation around Z.
    CRz(f64),
    /// Controlled phase gate.
    CP(f64),
    /// ZZ rotation gate.
    RZZ(f64),
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(_, _, _) => "u",
            StandardGate::PRX(_, _) => "prx",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::CRx(_) => "crx",
            StandardGate::CRy(_) => "cry",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::RZZ(_) => "rzz",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_)
            | StandardGate::U(_, _, _)
            | StandardGate::PRX(_, _) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::RZZ(_) => 2,
        }
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<f64> {
        match *self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::CRx(p)
            | StandardGate::CRy(p)
            | StandardGate::CRz(p)
            | StandardGate::CP(p)
            | StandardGate::RZZ(p) => vec![p],
            StandardGate::U(theta, phi, lambda) => vec![theta, phi, lambda],
            StandardGate::PRX(theta, phi) => vec![theta, phi],
            _ => vec![],
        }
    }

    /// Check if this gate carries angle parameters.
    pub fn is_parameterized(&self) -> bool {
        !self.parameters().is_empty()
    }

    /// For a two-qubit controlled gate, the single-qubit gate it applies to
    /// the target when the control is set.
    ///
    /// Returns `None` for single-qubit gates and for `RZZ`, which is not of
    /// controlled form.
    pub fn controlled_base(&self) -> Option<StandardGate> {
        match *self {
            StandardGate::CX => Some(StandardGate::X),
            StandardGate::CY => Some(StandardGate::Y),
            StandardGate::CZ => Some(StandardGate::Z),
            StandardGate::CH => Some(StandardGate::H),
            StandardGate::CRx(theta) => Some(StandardGate::Rx(theta)),
            StandardGate::CRy(theta) => Some(StandardGate::Ry(theta)),
            StandardGate::CRz(theta) => Some(StandardGate::Rz(theta)),
            StandardGate::CP(theta) => Some(StandardGate::P(theta)),
            _ => None,
        }
    }

    /// The two-qubit gate that applies this gate under one control, the
    /// inverse of [`StandardGate::controlled_base`].
    pub fn controlled(&self) -> Option<StandardGate> {
        match *self {
            StandardGate::X => Some(StandardGate::CX),
            StandardGate::Y => Some(StandardGate::CY),
            StandardGate::Z => Some(StandardGate::CZ),
            StandardGate::H => Some(StandardGate::CH),
            StandardGate::Rx(theta) => Some(StandardGate::CRx(theta)),
            StandardGate::Ry(theta) => Some(StandardGate::CRy(theta)),
            StandardGate::Rz(theta) => Some(StandardGate::CRz(theta)),
            StandardGate::P(theta) => Some(StandardGate::CP(theta)),
            _ => None,
        }
    }
}
