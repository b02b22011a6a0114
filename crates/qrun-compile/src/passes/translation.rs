//! Native gate-set translation.

use std::f64::consts::PI;

use qrun_ir::{Operation, QubitId, StandardGate};

use crate::error::{CompileError, CompileResult};
use crate::pass::{Pass, PassKind, Program};
use crate::property::{NativeGateSet, OneQubitBasis, PropertySet};
use crate::unitary::Unitary2x2;

/// Basis translation pass.
///
/// Replaces every operation outside the target's native gate set by a fixed
/// native sequence with the same unitary action up to global phase. Native
/// operations and measurements are passed through unchanged.
pub struct BasisTranslation;

impl Pass for BasisTranslation {
    fn name(&self) -> &'static str {
        "BasisTranslation"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, program: &mut Program, properties: &mut PropertySet) -> CompileResult<()> {
        let natives = properties
            .native_gates
            .as_ref()
            .ok_or(CompileError::MissingNativeGates)?;

        let mut translated = Vec::with_capacity(program.operations.len());
        for op in &program.operations {
            translate_into(op, natives, &mut translated)?;
        }

        program.operations = translated;
        Ok(())
    }

    fn should_run(&self, _program: &Program, properties: &PropertySet) -> bool {
        properties.native_gates.is_some()
    }
}

/// Translate a single operation into the native gate set.
///
/// Qubit ids are carried over as-is, so the function works on logical and
/// physical operations alike.
pub fn translate(op: &Operation, natives: &NativeGateSet) -> CompileResult<Vec<Operation>> {
    let mut out = Vec::new();
    translate_into(op, natives, &mut out)?;
    Ok(out)
}

/// Expand an operation by its decomposition rule even when it is native.
///
/// Routing uses this for native multi-qubit operations whose qubits are not
/// pairwise adjacent. The sub-operations are translated as usual.
pub fn lower(op: &Operation, natives: &NativeGateSet) -> CompileResult<Vec<Operation>> {
    let mut out = Vec::new();
    lower_into(op, natives, &mut out)?;
    Ok(out)
}

fn translate_into(
    op: &Operation,
    natives: &NativeGateSet,
    out: &mut Vec<Operation>,
) -> CompileResult<()> {
    if natives.is_native(op) {
        out.push(op.clone());
        return Ok(());
    }
    lower_into(op, natives, out)
}

fn lower_into(
    op: &Operation,
    natives: &NativeGateSet,
    out: &mut Vec<Operation>,
) -> CompileResult<()> {
    match op {
        Operation::Single { gate, qubit } => {
            let matrix = Unitary2x2::from_gate(gate)
                .ok_or_else(|| unsupported(op, "not a single-qubit gate"))?;
            emit_single(&matrix, *qubit, natives, out);
            Ok(())
        }
        Operation::Two {
            gate,
            control,
            target,
        } => lower_two(op, gate, *control, *target, natives, out),
        Operation::Swap { a, b } => {
            for (c, t) in [(*a, *b), (*b, *a), (*a, *b)] {
                emit(Operation::two(StandardGate::CX, c, t), natives, out)?;
            }
            Ok(())
        }
        Operation::Controlled { base, controls } => {
            lower_controlled(op, base, controls, natives, out)
        }
        Operation::Measure { .. } => {
            out.push(op.clone());
            Ok(())
        }
    }
}

fn emit(op: Operation, natives: &NativeGateSet, out: &mut Vec<Operation>) -> CompileResult<()> {
    translate_into(&op, natives, out)
}

fn unsupported(op: &Operation, reason: &str) -> CompileError {
    CompileError::UnsupportedGate {
        gate: op.name(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// Single-qubit emission
// ============================================================================

/// Emit an arbitrary single-qubit unitary in the target's one-qubit family.
///
/// Global phase is dropped; callers that need it under control account for
/// it separately.
fn emit_single(u: &Unitary2x2, q: QubitId, natives: &NativeGateSet, out: &mut Vec<Operation>) {
    if u.is_identity() {
        return;
    }

    let (alpha, beta, gamma, _phase) = u.zyz_decomposition();
    let flat = Unitary2x2::is_negligible(beta);

    match natives.one_qubit() {
        OneQubitBasis::RzRy => {
            if flat {
                push_rz(alpha + gamma, q, out);
            } else {
                push_rz(gamma, q, out);
                push_native(StandardGate::Ry(Unitary2x2::normalize_angle(beta)), q, out);
                push_rz(alpha, q, out);
            }
        }
        OneQubitBasis::RzRx => {
            if flat {
                push_rz(alpha + gamma, q, out);
            } else {
                push_rz(gamma - PI / 2.0, q, out);
                push_native(StandardGate::Rx(Unitary2x2::normalize_angle(beta)), q, out);
                push_rz(alpha + PI / 2.0, q, out);
            }
        }
        OneQubitBasis::RzSx => {
            if flat {
                push_rz(alpha + gamma, q, out);
            } else {
                push_rz(gamma, q, out);
                push_native(StandardGate::SX, q, out);
                push_rz(beta + PI, q, out);
                push_native(StandardGate::SX, q, out);
                push_rz(alpha + PI, q, out);
            }
        }
        OneQubitBasis::Prx => {
            if !flat {
                push_native(
                    StandardGate::PRX(beta, Unitary2x2::normalize_angle(PI / 2.0 - gamma)),
                    q,
                    out,
                );
            }
            // RZ(λ) = PRX(π, λ/2) · PRX(π, 0) up to phase.
            let lambda = Unitary2x2::normalize_angle(alpha + gamma);
            if !Unitary2x2::is_negligible(lambda) {
                push_native(StandardGate::PRX(PI, 0.0), q, out);
                push_native(StandardGate::PRX(PI, lambda / 2.0), q, out);
            }
        }
        OneQubitBasis::U => {
            push_native(
                StandardGate::U(
                    beta,
                    Unitary2x2::normalize_angle(alpha),
                    Unitary2x2::normalize_angle(gamma),
                ),
                q,
                out,
            );
        }
    }
}

fn push_native(gate: StandardGate, q: QubitId, out: &mut Vec<Operation>) {
    out.push(Operation::single(gate, q));
}

fn push_rz(angle: f64, q: QubitId, out: &mut Vec<Operation>) {
    if !Unitary2x2::is_negligible(angle) {
        push_native(StandardGate::Rz(Unitary2x2::normalize_angle(angle)), q, out);
    }
}

/// Emit a rotation gate, skipping it when it is the identity up to phase.
fn emit_rotation(
    gate: StandardGate,
    angle: f64,
    q: QubitId,
    natives: &NativeGateSet,
    out: &mut Vec<Operation>,
) -> CompileResult<()> {
    if Unitary2x2::is_negligible(angle) {
        return Ok(());
    }
    emit(Operation::single(gate, q), natives, out)
}

// ============================================================================
// Two-qubit lowering
// ============================================================================

fn lower_two(
    op: &Operation,
    gate: &StandardGate,
    control: QubitId,
    target: QubitId,
    natives: &NativeGateSet,
    out: &mut Vec<Operation>,
) -> CompileResult<()> {
    match *gate {
        StandardGate::CX => {
            // Not native, so the entangler is CZ.
            emit(Operation::single(StandardGate::H, target), natives, out)?;
            emit(Operation::two(StandardGate::CZ, control, target), natives, out)?;
            emit(Operation::single(StandardGate::H, target), natives, out)
        }
        StandardGate::CZ => {
            // Not native, so the entangler is CX.
            emit(Operation::single(StandardGate::H, target), natives, out)?;
            emit(Operation::two(StandardGate::CX, control, target), natives, out)?;
            emit(Operation::single(StandardGate::H, target), natives, out)
        }
        StandardGate::RZZ(theta) => {
            emit(Operation::two(StandardGate::CX, control, target), natives, out)?;
            emit_rotation(StandardGate::Rz(theta), theta, target, natives, out)?;
            emit(Operation::two(StandardGate::CX, control, target), natives, out)
        }
        StandardGate::CY
        | StandardGate::CH
        | StandardGate::CRx(_)
        | StandardGate::CRy(_)
        | StandardGate::CRz(_)
        | StandardGate::CP(_) => {
            let matrix = gate
                .controlled_base()
                .as_ref()
                .and_then(Unitary2x2::from_gate)
                .ok_or_else(|| unsupported(op, "controlled gate without a single-qubit base"))?;
            controlled_unitary(&matrix, control, target, natives, out)
        }
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
        | StandardGate::PRX(_, _) => Err(unsupported(op, "single-qubit gate placed on two qubits")),
    }
}

/// Controlled-U as A · CX · B · CX · C with a phase on the control.
///
/// With `U = e^(iδ) RZ(α) RY(β) RZ(γ)`:
/// `C = RZ((γ-α)/2)`, `B = RY(-β/2) RZ(-(γ+α)/2)`, `A = RZ(α) RY(β/2)`.
fn controlled_unitary(
    u: &Unitary2x2,
    control: QubitId,
    target: QubitId,
    natives: &NativeGateSet,
    out: &mut Vec<Operation>,
) -> CompileResult<()> {
    let (alpha, beta, gamma, delta) = u.zyz_decomposition();

    let c_angle = (gamma - alpha) / 2.0;
    emit_rotation(StandardGate::Rz(c_angle), c_angle, target, natives, out)?;
    emit(Operation::two(StandardGate::CX, control, target), natives, out)?;

    let b_angle = -(gamma + alpha) / 2.0;
    emit_rotation(StandardGate::Rz(b_angle), b_angle, target, natives, out)?;
    emit_rotation(StandardGate::Ry(-beta / 2.0), beta, target, natives, out)?;
    emit(Operation::two(StandardGate::CX, control, target), natives, out)?;

    emit_rotation(StandardGate::Ry(beta / 2.0), beta, target, natives, out)?;
    emit_rotation(StandardGate::Rz(alpha), alpha, target, natives, out)?;
    emit_rotation(StandardGate::P(delta), delta, control, natives, out)
}

// ============================================================================
// Multi-controlled lowering
// ============================================================================

fn lower_controlled(
    op: &Operation,
    base: &Operation,
    controls: &[QubitId],
    natives: &NativeGateSet,
    out: &mut Vec<Operation>,
) -> CompileResult<()> {
    match (base, controls) {
        (Operation::Single { gate, qubit }, [c]) => match gate.controlled() {
            Some(two) => emit(Operation::two(two, *c, *qubit), natives, out),
            None => {
                let matrix =
                    Unitary2x2::from_gate(gate).ok_or_else(|| unsupported(op, "invalid base gate"))?;
                controlled_unitary(&matrix, *c, *qubit, natives, out)
            }
        },
        (
            Operation::Single {
                gate: StandardGate::X,
                qubit,
            },
            [a, b],
        ) => toffoli(*a, *b, *qubit, natives, out),
        (
            Operation::Single {
                gate: StandardGate::Z,
                qubit,
            },
            [a, b],
        ) => {
            emit(Operation::single(StandardGate::H, *qubit), natives, out)?;
            toffoli(*a, *b, *qubit, natives, out)?;
            emit(Operation::single(StandardGate::H, *qubit), natives, out)
        }
        (Operation::Single { gate, qubit }, [a, b]) => {
            let matrix =
                Unitary2x2::from_gate(gate).ok_or_else(|| unsupported(op, "invalid base gate"))?;
            doubly_controlled_unitary(&matrix, *a, *b, *qubit, natives, out)
        }
        (
            Operation::Two {
                gate: StandardGate::RZZ(theta),
                control,
                target,
            },
            [c],
        ) => {
            emit(Operation::two(StandardGate::CX, *control, *target), natives, out)?;
            let rz = Operation::single(StandardGate::Rz(*theta), *target);
            emit(Operation::controlled(rz, [*c])?, natives, out)?;
            emit(Operation::two(StandardGate::CX, *control, *target), natives, out)
        }
        (
            Operation::Two {
                gate,
                control,
                target,
            },
            [c],
        ) => {
            let single = gate
                .controlled_base()
                .ok_or_else(|| unsupported(op, "invalid base gate"))?;
            let lifted = Operation::controlled(Operation::single(single, *target), [*c, *control])?;
            emit(lifted, natives, out)
        }
        (Operation::Swap { a, b }, [c]) => {
            emit(Operation::two(StandardGate::CX, *b, *a), natives, out)?;
            toffoli(*c, *a, *b, natives, out)?;
            emit(Operation::two(StandardGate::CX, *b, *a), natives, out)
        }
        _ => Err(unsupported(
            op,
            &format!(
                "no native rule for {} control(s) on '{}'",
                controls.len(),
                base.name()
            ),
        )),
    }
}

/// Toffoli on target `t` with controls `a`, `b`: six CX plus T gates.
fn toffoli(
    a: QubitId,
    b: QubitId,
    t: QubitId,
    natives: &NativeGateSet,
    out: &mut Vec<Operation>,
) -> CompileResult<()> {
    let cx = |control, target| Operation::two(StandardGate::CX, control, target);
    let one = Operation::single;

    let sequence = [
        one(StandardGate::H, t),
        cx(b, t),
        one(StandardGate::Tdg, t),
        cx(a, t),
        one(StandardGate::T, t),
        cx(b, t),
        one(StandardGate::Tdg, t),
        cx(a, t),
        one(StandardGate::T, b),
        one(StandardGate::T, t),
        one(StandardGate::H, t),
        cx(a, b),
        one(StandardGate::T, a),
        one(StandardGate::Tdg, b),
        cx(a, b),
    ];

    for op in sequence {
        emit(op, natives, out)?;
    }
    Ok(())
}

/// Doubly controlled U via `V = sqrt(U)`:
/// C-V(b, t) · CX(a, b) · C-V†(b, t) · CX(a, b) · C-V(a, t).
fn doubly_controlled_unitary(
    u: &Unitary2x2,
    a: QubitId,
    b: QubitId,
    t: QubitId,
    natives: &NativeGateSet,
    out: &mut Vec<Operation>,
) -> CompileResult<()> {
    let v = u.sqrt();
    let v_dagger = v.dagger();

    controlled_unitary(&v, b, t, natives, out)?;
    emit(Operation::two(StandardGate::CX, a, b), natives, out)?;
    controlled_unitary(&v_dagger, b, t, natives, out)?;
    emit(Operation::two(StandardGate::CX, a, b), natives, out)?;
    controlled_unitary(&v, a, t, natives, out)
}
