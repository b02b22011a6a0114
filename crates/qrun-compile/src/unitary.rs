//! 2x2 unitary matrices for single-qubit gate translation.
//!
//! Provides the matrices of every single-qubit [`StandardGate`], matrix
//! products, square roots and the ZYZ Euler decomposition the translation
//! tables are built on.

use num_complex::Complex64;
use std::f64::consts::PI;

use qrun_ir::StandardGate;

/// Tolerance for floating point comparisons.
pub(crate) const EPSILON: f64 = 1e-10;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// A 2x2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct Unitary2x2 {
    /// The matrix elements in row-major order: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a new 2x2 unitary matrix.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// Create the identity matrix.
    pub fn identity() -> Self {
        Self::new(ONE, ZERO, ZERO, ONE)
    }

    /// Create a Hadamard matrix.
    pub fn h() -> Self {
        let s = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);
        Self::new(s, s, s, -s)
    }

    /// Create a Pauli-X matrix.
    pub fn x() -> Self {
        Self::new(ZERO, ONE, ONE, ZERO)
    }

    /// Create a Pauli-Y matrix.
    pub fn y() -> Self {
        Self::new(ZERO, Complex64::new(0.0, -1.0), Complex64::new(0.0, 1.0), ZERO)
    }

    /// Create a Pauli-Z matrix.
    pub fn z() -> Self {
        Self::new(ONE, ZERO, ZERO, -ONE)
    }

    /// Create an SX gate (sqrt(X)).
    pub fn sx() -> Self {
        let p = Complex64::new(0.5, 0.5);
        let m = Complex64::new(0.5, -0.5);
        Self::new(p, m, m, p)
    }

    /// Create an RX rotation matrix.
    pub fn rx(theta: f64) -> Self {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new(0.0, -(theta / 2.0).sin());
        Self::new(c, s, s, c)
    }

    /// Create an RY rotation matrix.
    pub fn ry(theta: f64) -> Self {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new((theta / 2.0).sin(), 0.0);
        Self::new(c, -s, s, c)
    }

    /// Create an RZ rotation matrix.
    pub fn rz(theta: f64) -> Self {
        Self::new(
            Complex64::from_polar(1.0, -theta / 2.0),
            ZERO,
            ZERO,
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// Create a phase gate P(lambda).
    pub fn p(lambda: f64) -> Self {
        Self::new(ONE, ZERO, ZERO, Complex64::from_polar(1.0, lambda))
    }

    /// Create a U gate U(theta, phi, lambda).
    pub fn u(theta: f64, phi: f64, lambda: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        )
    }

    /// Create a phased RX gate: RZ(phi) · RX(theta) · RZ(-phi).
    pub fn prx(theta: f64, phi: f64) -> Self {
        Self::rz(phi) * Self::rx(theta) * Self::rz(-phi)
    }

    /// Matrix of a single-qubit gate, `None` for two-qubit gates.
    pub fn from_gate(gate: &StandardGate) -> Option<Self> {
        let matrix = match *gate {
            StandardGate::I => Self::identity(),
            StandardGate::X => Self::x(),
            StandardGate::Y => Self::y(),
            StandardGate::Z => Self::z(),
            StandardGate::H => Self::h(),
            StandardGate::S => Self::p(PI / 2.0),
            StandardGate::Sdg => Self::p(-PI / 2.0),
            StandardGate::T => Self::p(PI / 4.0),
            StandardGate::Tdg => Self::p(-PI / 4.0),
            StandardGate::SX => Self::sx(),
            StandardGate::SXdg => Self::sx().dagger(),
            StandardGate::Rx(theta) => Self::rx(theta),
            StandardGate::Ry(theta) => Self::ry(theta),
            StandardGate::Rz(theta) => Self::rz(theta),
            StandardGate::P(lambda) => Self::p(lambda),
            StandardGate::U(theta, phi, lambda) => Self::u(theta, phi, lambda),
            StandardGate::PRX(theta, phi) => Self::prx(theta, phi),
            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::RZZ(_) => return None,
        };
        Some(matrix)
    }

    /// Multiply this matrix by another: self * other.
    #[allow(clippy::many_single_char_names)]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// Get the conjugate transpose (dagger).
    pub fn dagger(&self) -> Self {
        Self::new(
            self.data[0].conj(),
            self.data[2].conj(),
            self.data[1].conj(),
            self.data[3].conj(),
        )
    }

    /// A matrix `V` with `V · V = self`.
    ///
    /// Uses the closed form `(M + sI) / sqrt(tr M + 2s)` with `s = ±sqrt(det M)`;
    /// for a unitary at least one sign gives a non-zero denominator.
    pub fn sqrt(&self) -> Self {
        let [a, b, c, d] = self.data;
        let det_root = (a * d - b * c).sqrt();

        for s in [det_root, -det_root] {
            let t = (a + d + s * 2.0).sqrt();
            if t.norm() > EPSILON {
                return Self::new((a + s) / t, b / t, c / t, (d + s) / t);
            }
        }

        // Unreachable for unitary input: both denominators vanish only when
        // det M = 0.
        *self
    }

    /// Check if this is approximately identity (up to global phase).
    pub fn is_identity(&self) -> bool {
        let [a, b, c, d] = self.data;

        if b.norm() > EPSILON || c.norm() > EPSILON {
            return false;
        }

        (a - d).norm() < EPSILON
    }

    /// Check whether two matrices are equal up to a global phase.
    pub fn equiv_up_to_phase(&self, other: &Self, tolerance: f64) -> bool {
        (self.dagger() * *other).is_identity_within(tolerance)
    }

    fn is_identity_within(&self, tolerance: f64) -> bool {
        let [a, b, c, d] = self.data;
        b.norm() < tolerance && c.norm() < tolerance && (a - d).norm() < tolerance
    }

    /// Decompose into RZ(alpha) * RY(beta) * RZ(gamma) * `global_phase`.
    ///
    /// Returns (alpha, beta, gamma, `global_phase`) with
    /// `self = e^(i·global_phase) · RZ(alpha) · RY(beta) · RZ(gamma)` and
    /// `beta` in `[0, π]`.
    pub fn zyz_decomposition(&self) -> (f64, f64, f64, f64) {
        let [a, b, c, d] = self.data;

        let det = a * d - b * c;
        let global_phase = det.arg() / 2.0;

        // Remove global phase to get SU(2) matrix
        let phase_factor = Complex64::from_polar(1.0, -global_phase);
        let a = a * phase_factor;
        let b = b * phase_factor;
        let c = c * phase_factor;

        // For SU(2): U = [[cos(b/2)*e^(-i(a+g)/2), -sin(b/2)*e^(-i(a-g)/2)],
        //                 [sin(b/2)*e^(i(a-g)/2),   cos(b/2)*e^(i(a+g)/2)]]
        let beta = 2.0 * a.norm().clamp(0.0, 1.0).acos();

        if beta.abs() < EPSILON {
            let alpha_plus_gamma = -2.0 * a.arg();
            return (
                alpha_plus_gamma / 2.0,
                0.0,
                alpha_plus_gamma / 2.0,
                global_phase,
            );
        }

        if (beta - PI).abs() < EPSILON {
            let alpha_minus_gamma = -2.0 * (-b).arg();
            return (
                alpha_minus_gamma / 2.0,
                PI,
                -alpha_minus_gamma / 2.0,
                global_phase,
            );
        }

        let alpha_plus_gamma = -2.0 * a.arg();
        let alpha_minus_gamma = 2.0 * c.arg();

        let alpha = f64::midpoint(alpha_plus_gamma, alpha_minus_gamma);
        let gamma = (alpha_plus_gamma - alpha_minus_gamma) / 2.0;

        (alpha, beta, gamma, global_phase)
    }

    /// Normalize angles to [-pi, pi].
    pub fn normalize_angle(angle: f64) -> f64 {
        if angle.is_nan() || angle.is_infinite() {
            return 0.0;
        }
        let mut a = angle.rem_euclid(2.0 * PI);
        if a > PI {
            a -= 2.0 * PI;
        }
        a
    }

    /// Check whether a rotation by `angle` is the identity up to global phase.
    pub fn is_negligible(angle: f64) -> bool {
        Self::normalize_angle(angle).abs() < EPSILON
    }
}

impl Default for Unitary2x2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Unitary2x2 {
    type Output = Self;

    #[allow(clippy::needless_pass_by_value)]
    fn mul(self, rhs: Self) -> Self::Output {
        Unitary2x2::mul(&self, &rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(u: &Unitary2x2) -> Unitary2x2 {
        let (alpha, beta, gamma, phase) = u.zyz_decomposition();
        let global = Complex64::from_polar(1.0, phase);
        let r = Unitary2x2::rz(alpha) * Unitary2x2::ry(beta) * Unitary2x2::rz(gamma);
        Unitary2x2::new(
            r.data[0] * global,
            r.data[1] * global,
            r.data[2] * global,
            r.data[3] * global,
        )
    }

    fn assert_exact(expected: &Unitary2x2, got: &Unitary2x2) {
        for i in 0..4 {
            assert!(
                (expected.data[i] - got.data[i]).norm() < 1e-9,
                "Mismatch at {i}: expected {:?}, got {:?}",
                expected.data[i],
                got.data[i]
            );
        }
    }

    #[test]
    fn test_hadamard_squared() {
        let h = Unitary2x2::h();
        assert!((h * h).is_identity());
    }

    #[test]
    fn test_pauli_squared() {
        for m in [Unitary2x2::x(), Unitary2x2::y(), Unitary2x2::z()] {
            assert!((m * m).is_identity());
        }
    }

    #[test]
    fn test_zyz_reconstructs_standard_gates() {
        let gates = [
            StandardGate::H,
            StandardGate::X,
            StandardGate::Y,
            StandardGate::S,
            StandardGate::Tdg,
            StandardGate::SX,
            StandardGate::Rx(0.3),
            StandardGate::P(PI / 4.0),
            StandardGate::U(0.4, 1.2, -2.1),
            StandardGate::PRX(1.1, 0.7),
        ];
        for gate in gates {
            let u = Unitary2x2::from_gate(&gate).unwrap();
            assert_exact(&u, &reconstruct(&u));
        }
    }

    #[test]
    fn test_zyz_beta_range() {
        let (_, beta, _, _) = Unitary2x2::u(2.5, 0.1, 0.2).zyz_decomposition();
        assert!((0.0..=PI).contains(&beta));
        assert!((beta - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_sqrt() {
        for m in [
            Unitary2x2::z(),
            Unitary2x2::x(),
            Unitary2x2::h(),
            Unitary2x2::identity(),
            Unitary2x2::u(0.4, 1.2, -2.1),
        ] {
            let v = m.sqrt();
            assert_exact(&m, &(v * v));
        }
    }

    #[test]
    fn test_equiv_up_to_phase() {
        let s_squared = Unitary2x2::p(PI / 2.0) * Unitary2x2::p(PI / 2.0);
        assert!(s_squared.equiv_up_to_phase(&Unitary2x2::z(), 1e-9));
        assert!(Unitary2x2::rz(PI).equiv_up_to_phase(&Unitary2x2::z(), 1e-9));
        assert!(!Unitary2x2::x().equiv_up_to_phase(&Unitary2x2::z(), 1e-9));
    }

    #[test]
    fn test_two_qubit_gates_have_no_matrix() {
        assert!(Unitary2x2::from_gate(&StandardGate::CX).is_none());
        assert!(Unitary2x2::from_gate(&StandardGate::CP(0.5)).is_none());
    }

    #[test]
    fn test_negligible_angles() {
        assert!(Unitary2x2::is_negligible(0.0));
        assert!(Unitary2x2::is_negligible(2.0 * PI));
        assert!(!Unitary2x2::is_negligible(PI));
    }
}
