//! Numeric-guided factorization over the rationals.
//!
//! The irreducible factor of a squarefree polynomial that vanishes at a given root is the product
//! of `(t - r)` over some subset of its roots containing that root. Subsets are tried by
//! increasing size; a subset whose scaled product has near-integer coefficients gives a candidate
//! that is then confirmed by exact division, so a returned factor is always a true factor.

use crate::{
    primitive::modulus,
    roots::{closest, roots},
    uni::UniPoly,
};
use rug::{Complex, Float, Integer, Rational};
use tracing::{debug, trace};

/// The maximum number of root subsets examined by [`factor_containing`]. A subset size whose
/// search could not finish within it is not started.
const MAX_CANDIDATES: usize = 1 << 16;

/// Returns the monic irreducible factor over Q of `p` that vanishes at the root of `p` closest to
/// `approx`.
///
/// Repeated factors of `p` are removed first. Returns [`None`] if that factor has degree above
/// `max_degree`, or if it could not be isolated within the candidate budget.
pub fn factor_containing(
    p: &UniPoly,
    approx: &Complex,
    prec: u32,
    max_degree: usize,
) -> Option<UniPoly> {
    factor_containing_multiple(p, approx, prec, max_degree, 1)
}

/// Like [`factor_containing`], for a factor whose degree is known to be a multiple of `step`.
/// Only subsets of those sizes are examined, and a bound below `step` gives [`None`] without
/// computing any root.
pub fn factor_containing_multiple(
    p: &UniPoly,
    approx: &Complex,
    prec: u32,
    max_degree: usize,
    step: usize,
) -> Option<UniPoly> {
    let step = step.max(1);
    let q = p.squarefree_part().primitive();
    let n = q.degree();
    if q.is_zero() || n == 0 || n.min(max_degree) < step {
        return None;
    }
    if n == 1 {
        return Some(q.monic());
    }
    if step < n && subsets(n - 1, step - 1) > MAX_CANDIDATES {
        debug!(degree = n, step, "factor search budget exhausted");
        return None;
    }

    let rts = roots(&q, prec);
    let target = closest(&rts, approx)?;
    let lc = Complex::with_val(prec, q.leading().numer());
    let tol = Float::with_val(prec, Float::i_exp(1, -(prec as i32) / 2));

    let others: Vec<usize> = (0..n).filter(|&i| i != target).collect();
    let mut examined = 0usize;
    for size in (step..=n.min(max_degree)).step_by(step) {
        if size == n {
            debug!(degree = n, "polynomial is irreducible");
            return Some(q.monic());
        }

        if examined + subsets(others.len(), size - 1) > MAX_CANDIDATES {
            debug!(degree = n, size, "factor search budget exhausted");
            return None;
        }

        let mut combo: Vec<usize> = (0..size - 1).collect();
        loop {
            examined += 1;

            let subset: Vec<&Complex> = std::iter::once(&rts[target])
                .chain(combo.iter().map(|&i| &rts[others[i]]))
                .collect();
            if let Some(candidate) = candidate(&subset, &lc, &tol, prec) {
                if q.divisible_by(&candidate) {
                    trace!(degree = candidate.degree(), "found factor {}", candidate);
                    return Some(candidate.monic());
                }
            }

            if !next_combination(&mut combo, others.len()) {
                break;
            }
        }
    }

    None
}

/// Factors `p` into monic irreducible factors over Q, each listed once with its multiplicity.
///
/// Factors are peeled off one root at a time with [`factor_containing`]. Returns [`None`] if a
/// factor could not be isolated within the candidate budget.
pub fn factor(p: &UniPoly, prec: u32) -> Option<Vec<(UniPoly, u32)>> {
    let mut out = Vec::new();
    let mut rest = p.monic();
    let mut multiplicity = 0u32;
    let mut parts = Vec::new();

    // split by multiplicity first: rest = prod(parts[i]^(i+1))
    while rest.degree() > 0 {
        let g = rest.gcd(&rest.derivative());
        let sqf = rest.div_rem(&g).0;
        parts.push(sqf);
        rest = g;
    }
    for i in 0..parts.len().saturating_sub(1) {
        parts[i] = parts[i].div_rem(&parts[i + 1]).0;
    }

    for part in parts {
        multiplicity += 1;
        let mut rest = part;
        while rest.degree() > 0 {
            let rts = roots(&rest, prec);
            let f = factor_containing(&rest, rts.first()?, prec, rest.degree())?;
            rest = rest.div_rem(&f).0;
            out.push((f, multiplicity));
        }
    }

    Some(out)
}

/// Builds `lc * product(t - r)` over `subset` and rounds it to integer coefficients, returning
/// [`None`] when the trace or any coefficient is not close to an integer.
fn candidate(subset: &[&Complex], lc: &Complex, tol: &Float, prec: u32) -> Option<UniPoly> {
    // cheap rejection on the first two power sums before expanding the product: for a true
    // factor, lc * p1 and lc^2 * p2 are integers
    let mut p1 = Complex::new(prec);
    let mut p2 = Complex::new(prec);
    for r in subset {
        p1 += *r;
        p2 += Complex::with_val(prec, r.square_ref());
    }
    near_integer(&Complex::with_val(prec, &p1 * lc), tol)?;
    let lc2 = Complex::with_val(prec, lc.square_ref());
    near_integer(&Complex::with_val(prec, &p2 * &lc2), tol)?;

    let mut coeffs = vec![lc.clone()];
    for r in subset {
        let mut next = vec![Complex::new(prec); coeffs.len() + 1];
        for (i, c) in coeffs.iter().enumerate() {
            next[i + 1] += c;
            next[i] -= Complex::with_val(prec, c * *r);
        }
        coeffs = next;
    }

    let ints = coeffs
        .iter()
        .map(|c| near_integer(c, tol).map(Rational::from))
        .collect::<Option<Vec<_>>>()?;
    Some(UniPoly::new(ints))
}

/// Rounds `z` to the nearest integer if it lies within `tol` (relative) of one.
fn near_integer(z: &Complex, tol: &Float) -> Option<Integer> {
    let prec = z.prec().0;
    let rounded = z.real().to_integer()?;
    let diff = z.clone() - Complex::with_val(prec, &rounded);
    let scale = Float::with_val(prec, &rounded).abs() + 1u32;
    (modulus(&diff) <= Float::with_val(prec, tol * &scale)).then_some(rounded)
}

/// The number of `k`-subsets of `n` elements, or anything above [`MAX_CANDIDATES`] once it
/// exceeds it.
fn subsets(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let mut count = 1usize;
    for i in 0..k.min(n - k) {
        count = count * (n - i) / (i + 1);
        if count > MAX_CANDIDATES {
            return MAX_CANDIDATES + 1;
        }
    }
    count
}

/// Advances `combo` to the next `combo.len()`-subset of `0..n` in lexicographic order. Returns
/// false once every subset has been produced.
fn next_combination(combo: &mut [usize], n: usize) -> bool {
    let k = combo.len();
    let mut i = k;
    while i > 0 {
        i -= 1;
        if combo[i] < n - k + i {
            combo[i] += 1;
            for j in i + 1..k {
                combo[j] = combo[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn uni(high: &[i64]) -> UniPoly {
        UniPoly::from_high(high.iter().map(|&c| Rational::from(c)))
    }

    #[test]
    fn cube_root_factor() {
        // t^3 + 8 = (t + 2)(t^2 - 2t + 4); the principal cube root of -8 is 1 + i*sqrt(3)
        let p = uni(&[1, 0, 0, 8]);
        let principal = Complex::with_val(256, (1.0, 3f64.sqrt()));
        assert_eq!(factor_containing(&p, &principal, 256, 16), Some(uni(&[1, -2, 4])));

        let real = Complex::with_val(256, -2.0);
        assert_eq!(factor_containing(&p, &real, 256, 16), Some(uni(&[1, 2])));
    }

    #[test]
    fn fourth_root_of_four() {
        // t^4 - 4 = (t^2 - 2)(t^2 + 2)
        let p = uni(&[1, 0, 0, 0, -4]);
        let approx = Complex::with_val(256, 2f64.sqrt());
        assert_eq!(factor_containing(&p, &approx, 256, 16), Some(uni(&[1, 0, -2])));
    }

    #[test]
    fn irreducible_and_degree_bound() {
        let p = uni(&[1, 0, -10, 0, 1]);
        let approx = Complex::with_val(256, 2f64.sqrt() + 3f64.sqrt());
        assert_eq!(factor_containing(&p, &approx, 256, 16), Some(p.clone()));
        assert_eq!(factor_containing(&p, &approx, 256, 2), None);
    }

    #[test]
    fn non_monic_rational_factor() {
        // (2t - 1)(t^2 + 1)
        let p = uni(&[2, -1, 2, -1]);
        let approx = Complex::with_val(256, 0.5);
        assert_eq!(
            factor_containing(&p, &approx, 256, 16),
            Some(UniPoly::new(vec![Rational::from((-1, 2)), Rational::from(1)])),
        );
    }

    #[test]
    fn full_factorization() {
        // (t - 1)^2 (t^2 - 2)
        let p = uni(&[1, -2, -1, 4, -2]);
        let mut factors = factor(&p, 256).unwrap();
        factors.sort_by_key(|(f, _)| f.degree());
        assert_eq!(factors, vec![(uni(&[1, -1]), 2), (uni(&[1, 0, -2]), 1)]);
    }

    #[test]
    fn sizes_follow_the_step() {
        // t^4 - 10t^2 + 1 is irreducible, so no factor of degree 2 exists and the search stops at
        // the full degree
        let p = uni(&[1, 0, -10, 0, 1]);
        let approx = Complex::with_val(256, 2f64.sqrt() + 3f64.sqrt());
        assert_eq!(factor_containing_multiple(&p, &approx, 256, 16, 2), Some(p.clone()));
        assert_eq!(factor_containing_multiple(&p, &approx, 256, 3, 2), None);

        // (t^2 - 2)(t^2 - 3), looking for the factor through sqrt(3) in steps of two
        let p = uni(&[1, 0, -5, 0, 6]);
        let approx = Complex::with_val(256, 3f64.sqrt());
        assert_eq!(factor_containing_multiple(&p, &approx, 256, 16, 2), Some(uni(&[1, 0, -3])));
    }

    #[test]
    fn bound_below_the_step_skips_the_roots() {
        // a degree 32 polynomial whose factor must have degree 32 is out of reach of the bound
        let p = (2..34).fold(UniPoly::new(vec![Rational::from(1)]), |acc, k| {
            acc.mul(&uni(&[1, -k]))
        });
        let approx = Complex::with_val(256, 2.0);
        assert_eq!(factor_containing_multiple(&p, &approx, 256, 16, 32), None);
    }

    #[test]
    fn combinations() {
        let mut combo = vec![0, 1];
        let mut seen = vec![combo.clone()];
        while next_combination(&mut combo, 4) {
            seen.push(combo.clone());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen.last(), Some(&vec![2, 3]));
        assert_eq!(subsets(4, 2), 6);
        assert_eq!(subsets(15, 7), 6435);
        assert_eq!(subsets(31, 15), MAX_CANDIDATES + 1);
        assert_eq!(subsets(3, 5), 0);
    }
}
