//! qrun native decomposition
//!
//! This crate rewrites a [`qrun_ir::Circuit`] into the gates and
//! connectivity a target device executes directly. It follows a pass-based
//! architecture: a [`PassManager`] runs [`Pass`] objects that share a
//! [`PropertySet`].
//!
//! # Pipeline
//!
//! ```text
//! Circuit
//!    |
//!    v
//! TrivialLayout       logical i -> physical i
//! BasisTranslation    non-native operations -> native sequences
//! BasicRouting        SWAP chains for non-adjacent pairs, measurement remap
//! NativeVerification  every operation native and on a coupling edge
//!    |
//!    v
//! DecomposedCircuit (physical qubits + initial/final layout)
//! ```
//!
//! # Example
//!
//! ```rust
//! use qrun_compile::{CouplingMap, Decomposer, NativeGateSet};
//! use qrun_ir::Circuit;
//!
//! let circuit = Circuit::bell().unwrap();
//! let decomposer = Decomposer::new(CouplingMap::grid(6, 12), NativeGateSet::origin());
//! let decomposed = decomposer.decompose(&circuit).unwrap();
//!
//! assert!(decomposed
//!     .operations()
//!     .iter()
//!     .all(|op| NativeGateSet::origin().is_native(op)));
//! ```
//!
//! # Native gate sets
//!
//! | Preset | Gates | 1q family |
//! |--------|-------|-----------|
//! | [`NativeGateSet::origin`] | RZ, RX, RY, CZ | RZ·RY·RZ |
//! | [`NativeGateSet::iqm`] | PRX, CZ | PRX |
//! | [`NativeGateSet::ibm`] | RZ, SX, X, CX | RZ·SX·RZ·SX·RZ |
//! | [`NativeGateSet::universal`] | everything | U |

pub mod decompose;
pub mod error;
pub mod manager;
pub mod pass;
pub mod passes;
pub mod property;
pub mod unitary;

pub use decompose::{DecomposedCircuit, Decomposer};
pub use error::{CompileError, CompileResult};
pub use manager::PassManager;
pub use pass::{Pass, PassKind, Program};
pub use passes::{translate, verify_native};
pub use property::{CouplingMap, Entangler, Layout, NativeGateSet, OneQubitBasis, PropertySet};
pub use unitary::Unitary2x2;
