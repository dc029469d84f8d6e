//! Shared numerical primitives anchored on `nalgebra`.

use nalgebra::DVector;

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Dense state vector of an ODE system.
pub type StateVector = DVector<Scalar>;

/// True when every component of `v` is finite.
#[must_use]
pub fn all_finite(v: &StateVector) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Max-norm of `err` scaled componentwise by `abs_tol + rel_tol * |x|`.
#[must_use]
pub fn scaled_error_norm(err: &StateVector, x: &StateVector, abs_tol: Scalar, rel_tol: Scalar) -> Scalar {
    err.iter()
        .zip(x.iter())
        .map(|(e, xi)| (e / (abs_tol + rel_tol * xi.abs())).abs())
        .fold(0.0, Scalar::max)
}
