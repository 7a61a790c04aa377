//! Numeric approximation of all complex roots of a univariate polynomial.

use crate::{
    primitive::{complex_from_rational, modulus},
    uni::UniPoly,
};
use rug::{float::Constant, Complex, Float};
use std::cmp::Ordering;
use tracing::trace;

/// The maximum number of Aberth-Ehrlich sweeps before giving up on convergence.
const MAX_SWEEPS: usize = 2_000;

/// Approximates every complex root of `p`, repeated roots included, using the Aberth-Ehrlich
/// simultaneous iteration at `prec` bits.
///
/// The iteration converges cubically for simple roots and linearly for multiple ones; in either
/// case the returned values are as accurate as the iteration could make them within
/// [`MAX_SWEEPS`] sweeps.
pub fn roots(p: &UniPoly, prec: u32) -> Vec<Complex> {
    let coeffs: Vec<Complex> = p
        .coeffs()
        .iter()
        .map(|c| complex_from_rational(c, prec))
        .collect();
    complex_roots(&coeffs, prec)
}

/// Like [`roots`], for a polynomial with complex coefficients listed from the constant term up.
/// Trailing zero coefficients are ignored.
pub fn complex_roots(coeffs: &[Complex], prec: u32) -> Vec<Complex> {
    let len = coeffs.iter().rposition(|c| !c.is_zero()).map_or(0, |i| i + 1);
    if len <= 1 {
        return Vec::new();
    }
    let n = len - 1;

    let lc = coeffs[n].clone();
    let coeffs: Vec<Complex> = coeffs[..len]
        .iter()
        .map(|c| Complex::with_val(prec, c / &lc))
        .collect();

    if n == 1 {
        return vec![-coeffs[0].clone()];
    }

    // start on a circle of the Cauchy bound radius, rotated off the real axis
    let bound = coeffs[..n]
        .iter()
        .map(modulus)
        .fold(Float::with_val(prec, 0), |acc, m| acc.max(&m));
    let radius = bound + 1u32;
    let tau = Float::with_val(prec, Constant::Pi) * 2u32;
    let mut z: Vec<Complex> = (0..n)
        .map(|k| {
            let angle = Float::with_val(prec, &tau * k as u32) / n as u32 + 0.4f64;
            let (sin, cos) = angle.sin_cos(Float::new(prec));
            let r = Float::with_val(prec, &radius) * (1.0 + 0.5 * (k as f64) / (n as f64)) / 2u32;
            Complex::with_val(prec, (Float::with_val(prec, &r * &cos), Float::with_val(prec, &r * &sin)))
        })
        .collect();

    let eps = Float::with_val(prec, Float::i_exp(1, -(prec as i32) + 16));
    for sweep in 0..MAX_SWEEPS {
        let mut converged = true;
        for k in 0..n {
            let (value, deriv) = horner(&coeffs, &z[k], prec);
            if value.is_zero() {
                continue;
            }
            let ratio = Complex::with_val(prec, &value / &deriv);

            let mut repulsion = Complex::new(prec);
            for j in 0..n {
                if j != k {
                    let diff = Complex::with_val(prec, &z[k] - &z[j]);
                    repulsion += diff.recip();
                }
            }

            let denom = Complex::with_val(prec, 1) - Complex::with_val(prec, &ratio * &repulsion);
            let step = if denom.is_zero() { ratio } else { ratio / denom };
            let size = modulus(&step);
            let scale = modulus(&z[k]).max(&Float::with_val(prec, 1));
            if size > Float::with_val(prec, &eps * &scale) {
                converged = false;
            }
            z[k] -= step;
        }

        if converged {
            trace!(degree = n, sweeps = sweep + 1, "aberth iteration converged");
            break;
        }
    }

    z
}

/// Evaluates a monic polynomial and its derivative at `z`.
fn horner(coeffs: &[Complex], z: &Complex, prec: u32) -> (Complex, Complex) {
    let mut value = Complex::new(prec);
    let mut deriv = Complex::new(prec);
    for c in coeffs.iter().rev() {
        deriv *= z;
        deriv += &value;
        value *= z;
        value += c;
    }
    (value, deriv)
}

/// The index of the root in `roots` closest to `target`.
pub fn closest(roots: &[Complex], target: &Complex) -> Option<usize> {
    roots
        .iter()
        .map(|r| modulus(&Complex::with_val(r.prec().0, r - target)))
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
}

/// Orders roots by decreasing real part, breaking ties by decreasing imaginary part. Real parts
/// closer than `2^-(prec/2)` count as a tie.
pub fn sort_by_real_part(roots: &mut [Complex]) {
    roots.sort_by(|a, b| {
        let prec = a.prec().0;
        let tol = Float::with_val(prec, Float::i_exp(1, -(prec as i32) / 2));
        let diff = Float::with_val(prec, a.real() - b.real());
        if Float::with_val(prec, diff.abs_ref()) <= tol {
            b.imag().partial_cmp(a.imag()).unwrap_or(Ordering::Equal)
        } else {
            b.real().partial_cmp(a.real()).unwrap_or(Ordering::Equal)
        }
    });
}
