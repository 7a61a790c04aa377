//! Arithmetic modulo a triangular set of minimal polynomials.
//!
//! A triangular set is a list `(var, P)` where each `P` is monic in `var` and only uses the
//! variables of earlier entries besides `var`. Elements of the extension are polynomials reduced
//! modulo the set.

use cas_poly::Poly;
use std::fmt;
use tracing::trace;

/// Inversion hit a nonzero element that is not invertible: the relation of `var` is reducible and
/// `factor` is a nontrivial common factor of it and the element.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroDivisor {
    pub var: usize,
    pub factor: Poly,
}

impl fmt::Display for ZeroDivisor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "zero divisor: relation of x{} has the factor {}", self.var, self.factor)
    }
}

/// Reduces `p` modulo the relations, highest first.
pub fn reduce(p: &Poly, rels: &[(usize, Poly)]) -> Poly {
    let mut p = p.clone();
    for (var, minpoly) in rels.iter().rev() {
        if p.degree_in(*var) >= minpoly.degree_in(*var) {
            p = p.rem_monic(*var, minpoly);
        }
    }
    p
}

/// Finds `(m, e)` with `p * m = e` modulo the relations, where `e` uses none of the relation
/// variables.
///
/// The extended Euclidean algorithm runs on `p` and the relation of the highest variable `p`
/// uses, with pseudo-division so that every step stays polynomial. The last remainder is free of
/// that variable and is inverted recursively over the relations below it.
pub fn invert(p: &Poly, rels: &[(usize, Poly)]) -> Result<(Poly, Poly), ZeroDivisor> {
    let p = reduce(p, rels);
    let dim = p.dim();
    let pos = match rels.iter().rposition(|(var, _)| p.uses(*var)) {
        Some(pos) => pos,
        None => return Ok((Poly::one(dim), p)),
    };
    let (var, minpoly) = &rels[pos];
    let below = &rels[..=pos];

    let (mut r0, mut s0) = (minpoly.clone(), Poly::zero(dim));
    let (mut r1, mut s1) = (p.clone(), Poly::one(dim));
    while r1.uses(*var) {
        let division = r0.pseudo_div(&r1, *var);
        let scale = r1.leading_coefficient_in(*var).pow(division.steps);
        let r2 = reduce(&division.remainder, below);
        if r2.is_zero() {
            trace!(var, factor = %r1, "zero divisor during inversion");
            return Err(ZeroDivisor { var: *var, factor: r1 });
        }
        let s2 = reduce(&(&(&scale * &s0) - &(&division.quotient * &s1)), below);

        let (content, r2) = r2.primitive_integer();
        let s2 = s2.scale(&content.recip());
        r0 = std::mem::replace(&mut r1, r2);
        s0 = std::mem::replace(&mut s1, s2);
    }

    let (m, e) = invert(&r1, &rels[..pos])?;
    Ok((reduce(&(&s1 * &m), rels), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_poly::primitive::rat;

    use pretty_assertions::assert_eq;

    fn sqrt2() -> Vec<(usize, Poly)> {
        let a = Poly::var(0, 1);
        vec![(0, &a.pow(2) - &Poly::constant(2, 1))]
    }

    #[test]
    fn reduce_powers() {
        let a = Poly::var(0, 1);
        assert_eq!(reduce(&a.pow(3), &sqrt2()), a.scale(&rat(2, 1)));
        assert_eq!(reduce(&a.pow(4), &sqrt2()), Poly::constant(4, 1));
    }

    #[test]
    fn invert_quadratic() {
        // (1 + a)(a - 1) = 1
        let a = Poly::var(0, 1);
        let p = &a + &Poly::one(1);
        let (m, e) = invert(&p, &sqrt2()).unwrap();
        assert!(e.is_constant());
        assert_eq!(reduce(&(&p * &m), &sqrt2()), e);
    }

    #[test]
    fn invert_nested() {
        // a = sqrt(2), b = sqrt(a)
        let a = Poly::var(0, 2);
        let b = Poly::var(1, 2);
        let rels = vec![
            (0, &a.pow(2) - &Poly::constant(2, 2)),
            (1, &b.pow(2) - &a),
        ];
        let (m, e) = invert(&b, &rels).unwrap();
        assert!(e.is_constant());
        assert_eq!(reduce(&(&b * &m), &rels), e);
    }

    #[test]
    fn reducible_relation() {
        let a = Poly::var(0, 1);
        let rels = vec![(0, &a.pow(2) - &Poly::one(1))];
        let p = &a - &Poly::one(1);
        let err = invert(&p, &rels).unwrap_err();
        assert_eq!(err.var, 0);
        assert_eq!(err.factor, p);
    }

    #[test]
    fn free_elements_are_their_own_denominator() {
        let x = Poly::var(1, 2);
        let (m, e) = invert(&x, &sqrt2()).unwrap();
        assert!(m.is_one());
        assert_eq!(e, x);
    }
}
