//! Sparse multivariate polynomials with rational coefficients.
//!
//! A [`Poly`] shares its term map behind an [`Rc`]. Cloning is cheap, and every mutating
//! operation goes through [`Rc::make_mut`], which mutates in place only when the polynomial is
//! the sole owner of its terms and copies them otherwise.

mod content;
mod div;
mod ops;

pub use div::PseudoDivision;

use crate::monomial::Monomial;
use rug::{ops::Pow, Complex, Rational};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    rc::Rc,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A sparse polynomial over the rationals in the generators `x0, x1, ...`.
///
/// `dim` is the number of generators in scope. It only records how many generators the
/// polynomial is considered over; monomials never depend on it, so two polynomials with
/// different `dim` can be combined directly and the result takes the larger `dim`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Poly {
    dim: usize,
    terms: Rc<BTreeMap<Monomial, Rational>>,
}

impl PartialEq for Poly {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.terms, &other.terms) || self.terms == other.terms
    }
}

impl Eq for Poly {}

impl Poly {
    /// The zero polynomial.
    pub fn zero(dim: usize) -> Self {
        Self { dim, terms: Rc::new(BTreeMap::new()) }
    }

    /// The constant polynomial `1`.
    pub fn one(dim: usize) -> Self {
        Self::constant(Rational::from(1), dim)
    }

    /// A constant polynomial.
    pub fn constant(c: impl Into<Rational>, dim: usize) -> Self {
        Self::monomial(Monomial::one(), c, dim)
    }

    /// The generator `x_var`. The dimension is raised to include `var` if needed.
    pub fn var(var: usize, dim: usize) -> Self {
        Self::monomial(Monomial::var(var, 1), 1, dim.max(var + 1))
    }

    /// A single term `c * m`.
    pub fn monomial(m: Monomial, c: impl Into<Rational>, dim: usize) -> Self {
        let c = c.into();
        let dim = dim.max(m.width());
        let mut terms = BTreeMap::new();
        if c.cmp0().is_ne() {
            terms.insert(m, c);
        }
        Self { dim, terms: Rc::new(terms) }
    }

    /// Builds a polynomial from `(monomial, coefficient)` pairs, adding up repeated monomials.
    pub fn from_terms(terms: impl IntoIterator<Item = (Monomial, Rational)>, dim: usize) -> Self {
        let mut poly = Self::zero(dim);
        for (m, c) in terms {
            poly.add_term(m, c);
        }
        poly
    }

    /// The number of generators in scope.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns this polynomial considered over at least `dim` generators.
    pub fn embed(&self, dim: usize) -> Self {
        Self { dim: self.dim.max(dim), terms: Rc::clone(&self.terms) }
    }

    /// Iterates over the terms in increasing monomial order.
    pub fn terms(&self) -> impl DoubleEndedIterator<Item = (&Monomial, &Rational)> {
        self.terms.iter()
    }

    /// The number of nonzero terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.as_constant().map_or(false, |c| c == 1)
    }

    /// Returns true if the polynomial has no generator in it (zero included).
    pub fn is_constant(&self) -> bool {
        self.terms.keys().all(Monomial::is_one)
    }

    /// Returns the value of a constant polynomial.
    pub fn as_constant(&self) -> Option<Rational> {
        match self.terms.len() {
            0 => Some(Rational::new()),
            1 => self.terms.get(&Monomial::one()).cloned(),
            _ => None,
        }
    }

    /// The coefficient of the given monomial.
    pub fn coefficient(&self, m: &Monomial) -> Rational {
        self.terms.get(m).cloned().unwrap_or_default()
    }

    /// The term with the lexicographically largest monomial.
    pub fn leading_term(&self) -> Option<(&Monomial, &Rational)> {
        self.terms.iter().next_back()
    }

    /// The coefficient of the leading term, or zero.
    pub fn leading_coefficient(&self) -> Rational {
        self.leading_term().map(|(_, c)| c.clone()).unwrap_or_default()
    }

    /// Adds `c * m` in place.
    pub fn add_term(&mut self, m: Monomial, c: Rational) {
        if c.cmp0().is_eq() {
            return;
        }
        self.dim = self.dim.max(m.width());
        let terms = Rc::make_mut(&mut self.terms);
        match terms.get_mut(&m) {
            Some(existing) => {
                *existing += c;
                if existing.cmp0().is_eq() {
                    terms.remove(&m);
                }
            },
            None => {
                terms.insert(m, c);
            },
        }
    }

    /// The highest exponent of `var` in any term.
    pub fn degree_in(&self, var: usize) -> u32 {
        self.terms.keys().map(|m| m.exponent(var)).max().unwrap_or(0)
    }

    /// The largest total degree of any term.
    pub fn total_degree(&self) -> u32 {
        self.terms.keys().map(Monomial::total_degree).max().unwrap_or(0)
    }

    /// Returns true if `var` occurs in some term.
    pub fn uses(&self, var: usize) -> bool {
        self.terms.keys().any(|m| m.exponent(var) > 0)
    }

    /// The set of generators occurring in the polynomial.
    pub fn variables(&self) -> BTreeSet<usize> {
        self.terms
            .keys()
            .flat_map(|m| m.factors().map(|(v, _)| v))
            .collect()
    }

    /// The lowest generator occurring in the polynomial.
    pub fn min_var(&self) -> Option<usize> {
        self.terms
            .keys()
            .filter_map(|m| m.factors().next().map(|(v, _)| v))
            .min()
    }

    /// The highest generator occurring in the polynomial.
    pub fn max_var(&self) -> Option<usize> {
        self.terms.keys().filter(|m| !m.is_one()).map(|m| m.width() - 1).max()
    }

    /// The coefficient of `var^exp`, as a polynomial free of `var`.
    pub fn coefficient_in(&self, var: usize, exp: u32) -> Self {
        Self::from_terms(
            self.terms
                .iter()
                .filter(|(m, _)| m.exponent(var) == exp)
                .map(|(m, c)| (m.with_exponent(var, 0), c.clone())),
            self.dim,
        )
    }

    /// The coefficients of the polynomial viewed as univariate in `var`, indexed by exponent.
    pub fn coefficients_in(&self, var: usize) -> Vec<Self> {
        let mut coeffs = vec![Self::zero(self.dim); self.degree_in(var) as usize + 1];
        for (m, c) in self.terms.iter() {
            let e = m.exponent(var) as usize;
            coeffs[e].add_term(m.with_exponent(var, 0), c.clone());
        }
        coeffs
    }

    /// The coefficient of the highest power of `var`.
    pub fn leading_coefficient_in(&self, var: usize) -> Self {
        self.coefficient_in(var, self.degree_in(var))
    }

    /// Builds `sum(coeffs[e] * var^e)`.
    pub fn from_coefficients(var: usize, coeffs: &[Self], dim: usize) -> Self {
        let mut poly = Self::zero(dim.max(var + 1));
        for (e, c) in coeffs.iter().enumerate() {
            for (m, k) in c.terms() {
                poly.add_term(m.with_exponent(var, e as u32), k.clone());
            }
        }
        poly
    }

    /// Multiplies every term by `x_var^exp`.
    pub fn shift(&self, var: usize, exp: u32) -> Self {
        Self::from_terms(
            self.terms
                .iter()
                .map(|(m, c)| (m.with_exponent(var, m.exponent(var) + exp), c.clone())),
            self.dim.max(var + 1),
        )
    }

    /// Substitutes `value` for `var` using Horner's scheme.
    pub fn substitute(&self, var: usize, value: &Self) -> Self {
        if !self.uses(var) {
            return self.clone();
        }
        let coeffs = self.coefficients_in(var);
        let mut iter = coeffs.into_iter().rev();
        let mut result = iter.next().unwrap_or_else(|| Self::zero(self.dim));
        for c in iter {
            result = &(&result * value) + &c;
        }
        result.embed(self.dim)
    }

    /// Maps every generator index through `map`, which must be injective on the generators in
    /// use.
    pub fn rename(&self, map: impl Fn(usize) -> usize, dim: usize) -> Self {
        Self::from_terms(
            self.terms.iter().map(|(m, c)| (m.rename(&map), c.clone())),
            dim,
        )
    }

    /// The partial derivative with respect to `var`.
    pub fn derivative(&self, var: usize) -> Self {
        Self::from_terms(
            self.terms.iter().filter_map(|(m, c)| {
                let e = m.exponent(var);
                (e > 0).then(|| (m.with_exponent(var, e - 1), c.clone() * e))
            }),
            self.dim,
        )
    }

    /// Applies `f` to every coefficient, dropping terms that become zero.
    pub fn map_coefficients(&self, f: impl Fn(&Rational) -> Rational) -> Self {
        Self::from_terms(self.terms.iter().map(|(m, c)| (m.clone(), f(c))), self.dim)
    }

    /// Splits the polynomial by the part of each monomial below `var`: every key is a monomial
    /// over the generators `0..var`, and its value collects the terms over `var..`.
    pub fn group_below(&self, var: usize) -> BTreeMap<Monomial, Self> {
        let mut groups: BTreeMap<Monomial, Self> = BTreeMap::new();
        for (m, c) in self.terms.iter() {
            let (low, high) = m.split_at(var);
            groups
                .entry(low)
                .or_insert_with(|| Self::zero(self.dim))
                .add_term(high, c.clone());
        }
        groups
    }

    /// Evaluates the polynomial numerically. `values[v]` is the value of generator `v`; the
    /// slice must cover every generator in use.
    pub fn eval_complex(&self, values: &[Complex], prec: u32) -> Complex {
        let mut sum = Complex::new(prec);
        for (m, c) in self.terms.iter() {
            let mut term = crate::primitive::complex_from_rational(c, prec);
            for (var, exp) in m.factors() {
                term *= Complex::with_val(prec, &values[var]).pow(exp);
            }
            sum += term;
        }
        sum
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }

        for (i, (m, c)) in self.terms.iter().rev().enumerate() {
            let negative = c.cmp0().is_lt();
            let abs = Rational::from(c.abs_ref());
            match (i, negative) {
                (0, true) => write!(f, "-")?,
                (0, false) => {},
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            if m.is_one() {
                write!(f, "{}", abs)?;
            } else if abs == 1 {
                write!(f, "{}", m)?;
            } else {
                write!(f, "{}*{}", abs, m)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::rat;

    use pretty_assertions::assert_eq;

    /// `x0`, `x1`, `x2` over three generators.
    fn xyz() -> (Poly, Poly, Poly) {
        (Poly::var(0, 3), Poly::var(1, 3), Poly::var(2, 3))
    }

    #[test]
    fn copy_on_write() {
        let (x, _, _) = xyz();
        let shared = x.clone();
        let mut owned = x.clone();
        owned.add_term(Monomial::one(), Rational::from(1));
        assert_eq!(shared, x);
        assert_eq!(owned.to_string(), "x0 + 1");
    }

    #[test]
    fn coefficient_views() {
        let (x, y, _) = xyz();
        // x^2*y + 3x + y - 1
        let p = &(&(&(&x * &x) * &y) + &x.scale(&Rational::from(3))) + &(&y - &Poly::one(3));
        let coeffs = p.coefficients_in(0);
        assert_eq!(coeffs.len(), 3);
        assert_eq!(coeffs[2], y);
        assert_eq!(coeffs[1], Poly::constant(3, 3));
        assert_eq!(coeffs[0], &y - &Poly::one(3));
        assert_eq!(Poly::from_coefficients(0, &coeffs, 3), p);
    }

    #[test]
    fn horner_substitution() {
        let (x, y, _) = xyz();
        let p = &(&x * &x) - &Poly::constant(2, 3);
        let q = p.substitute(0, &(&y + &Poly::one(3)));
        assert_eq!(q.to_string(), "x1^2 + 2*x1 - 1");
    }

    #[test]
    fn derivative_and_display() {
        let (x, y, z) = xyz();
        let p = &(&(&x * &x) * &z) - &y.scale(&rat(1, 2));
        assert_eq!(p.to_string(), "x0^2*x2 - 1/2*x1");
        assert_eq!(p.derivative(0).to_string(), "2*x0*x2");
        assert_eq!(p.min_var(), Some(0));
        assert_eq!(p.max_var(), Some(2));
    }

    #[test]
    fn grouping() {
        let (x, y, z) = xyz();
        let p = &(&(&x * &z) + &(&x * &y)) + &z;
        let groups = p.group_below(2);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&Monomial::var(0, 1)], Poly::var(2, 3));
        assert_eq!(groups[&Monomial::one()], z);
    }
}
