//! qrun circuit representation
//!
//! This crate provides the data structures every algorithm builds on:
//! register allocation, a closed vocabulary of gate and measurement
//! operations, and a validating circuit builder.
//!
//! # Core Components
//!
//! - **Registers**: [`RegisterAllocator`] hands out [`QubitId`] and [`ClbitId`]
//!   values from a fixed-size pool
//! - **Gates**: [`StandardGate`] for built-in gates (H, X, CX, CP, ...)
//! - **Operations**: [`Operation`], a tagged variant over single-qubit,
//!   two-qubit, controlled, swap and measurement steps
//! - **Circuit**: [`CircuitBuilder`] to accumulate operations and the frozen
//!   [`Circuit`] it produces
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qrun_ir::{CircuitBuilder, QubitId, ClbitId};
//!
//! let mut builder = CircuitBuilder::new("bell_state", 72, 72);
//! let q = builder.alloc_qubits(2).unwrap();
//! let c = builder.alloc_clbits(2).unwrap();
//!
//! builder
//!     .h(q[0]).unwrap()
//!     .cx(q[0], q[1]).unwrap()
//!     .measure(q[0], c[0]).unwrap()
//!     .measure(q[1], c[1]).unwrap();
//!
//! let circuit = builder.build();
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.measured_clbits(), vec![ClbitId(0), ClbitId(1)]);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg`, `T`, `Tdg` | 1 | Phase gates |
//! | `SX`, `SXdg` | 1 | sqrt(X) and its inverse |
//! | `Rx`, `Ry`, `Rz`, `P` | 1 | Rotation and phase gates |
//! | `U` | 1 | Universal single-qubit gate U(θ,φ,λ) |
//! | `PRX` | 1 | Phased RX rotation |
//! | `CX`, `CY`, `CZ`, `CH` | 2 | Controlled Paulis and Hadamard |
//! | `CRx`, `CRy`, `CRz`, `CP` | 2 | Controlled rotations and phase |
//! | `RZZ` | 2 | ZZ interaction |
//! | swap | 2 | [`Operation::Swap`] |
//! | controlled | n | [`Operation::Controlled`] over any unitary operation |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod operation;
pub mod qubit;
pub mod register;

pub use circuit::{Circuit, CircuitBuilder};
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use operation::Operation;
pub use qubit::{ClbitId, QubitId};
pub use register::{RegisterAllocator, RegisterIndex, RegisterKind};
