//! Dense univariate polynomials over the rationals.

use crate::{monomial::Monomial, poly::Poly, primitive::complex_from_rational};
use rug::{Complex, Integer, Rational};
use std::fmt;

/// A dense univariate polynomial with rational coefficients, stored from the constant term up.
/// The leading coefficient is never zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UniPoly {
    coeffs: Vec<Rational>,
}

impl UniPoly {
    /// Creates a polynomial from coefficients listed from the constant term up.
    pub fn new(mut coeffs: Vec<Rational>) -> Self {
        while coeffs.last().map_or(false, |c| c.cmp0().is_eq()) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    /// Creates a polynomial from coefficients listed from the highest degree down.
    pub fn from_high(coeffs: impl IntoIterator<Item = Rational>) -> Self {
        let mut coeffs: Vec<_> = coeffs.into_iter().collect();
        coeffs.reverse();
        Self::new(coeffs)
    }

    /// `t^n - c`.
    pub fn binomial(n: usize, c: Rational) -> Self {
        let mut coeffs = vec![Rational::new(); n + 1];
        coeffs[0] = -c;
        coeffs[n] = Rational::from(1);
        Self::new(coeffs)
    }

    /// Views `p` as univariate in `var`. Returns [`None`] if another generator occurs.
    pub fn from_poly(p: &Poly, var: usize) -> Option<Self> {
        let mut coeffs = vec![Rational::new(); p.degree_in(var) as usize + 1];
        for (m, c) in p.terms() {
            if m.factors().any(|(v, _)| v != var) {
                return None;
            }
            coeffs[m.exponent(var) as usize] = c.clone();
        }
        Some(Self::new(coeffs))
    }

    /// Converts back to a sparse polynomial in the generator `var`.
    pub fn to_poly(&self, var: usize, dim: usize) -> Poly {
        Poly::from_terms(
            self.coeffs
                .iter()
                .enumerate()
                .map(|(e, c)| (Monomial::var(var, e as u32), c.clone())),
            dim.max(var + 1),
        )
    }

    /// The coefficients from the constant term up.
    pub fn coeffs(&self) -> &[Rational] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// The degree, with the zero polynomial reported as degree zero.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn leading(&self) -> Rational {
        self.coeffs.last().cloned().unwrap_or_default()
    }

    /// Divides by the leading coefficient.
    pub fn monic(&self) -> Self {
        let lc = self.leading();
        if lc.cmp0().is_eq() || lc == 1 {
            return self.clone();
        }
        Self::new(self.coeffs.iter().map(|c| c.clone() / &lc).collect())
    }

    /// Scales to coprime integer coefficients with a positive leading coefficient.
    pub fn primitive(&self) -> Self {
        let mut num_gcd = Integer::new();
        let mut den_lcm = Integer::from(1);
        for c in &self.coeffs {
            num_gcd.gcd_mut(c.numer());
            den_lcm.lcm_mut(c.denom());
        }
        if num_gcd == 0 {
            return self.clone();
        }
        let mut scale = Rational::from((den_lcm, num_gcd));
        if self.leading().cmp0().is_lt() {
            scale = -scale;
        }
        Self::new(self.coeffs.iter().map(|c| c.clone() * &scale).collect())
    }

    /// Polynomial multiplication.
    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::default();
        }
        let mut out = vec![Rational::new(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] += Rational::from(a * b);
            }
        }
        Self::new(out)
    }

    /// Euclidean division, returning `(quotient, remainder)`. Panics if `divisor` is zero.
    pub fn div_rem(&self, divisor: &Self) -> (Self, Self) {
        assert!(!divisor.is_zero(), "division by the zero polynomial");
        let mut rem = self.coeffs.clone();
        let d = divisor.degree();
        let lc = divisor.leading();
        if rem.len() <= d {
            return (Self::default(), self.clone());
        }

        let mut quot = vec![Rational::new(); rem.len() - d];
        for i in (0..quot.len()).rev() {
            let q = Rational::from(&rem[i + d] / &lc);
            if q.cmp0().is_ne() {
                for (j, c) in divisor.coeffs.iter().enumerate() {
                    rem[i + j] -= Rational::from(&q * c);
                }
            }
            quot[i] = q;
        }
        rem.truncate(d);
        (Self::new(quot), Self::new(rem))
    }

    /// Returns true if `divisor` divides `self` exactly.
    pub fn divisible_by(&self, divisor: &Self) -> bool {
        self.div_rem(divisor).1.is_zero()
    }

    /// The derivative.
    pub fn derivative(&self) -> Self {
        Self::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(e, c)| c.clone() * e as u32)
                .collect(),
        )
    }

    /// The monic greatest common divisor.
    pub fn gcd(&self, other: &Self) -> Self {
        let (mut a, mut b) = (self.clone(), other.clone());
        while !b.is_zero() {
            let r = a.div_rem(&b).1;
            a = b;
            b = r;
        }
        a.monic()
    }

    /// Divides out repeated factors.
    pub fn squarefree_part(&self) -> Self {
        let g = self.gcd(&self.derivative());
        if g.degree() == 0 {
            return self.clone();
        }
        self.div_rem(&g).0
    }

    /// Evaluates at a rational point.
    pub fn eval(&self, x: &Rational) -> Rational {
        self.coeffs
            .iter()
            .rev()
            .fold(Rational::new(), |acc, c| acc * x + c)
    }

    /// Evaluates at a complex point with Horner's scheme.
    pub fn eval_complex(&self, z: &Complex, prec: u32) -> Complex {
        let mut acc = Complex::new(prec);
        for c in self.coeffs.iter().rev() {
            acc *= z;
            acc += complex_from_rational(c, prec);
        }
        acc
    }
}

impl fmt::Display for UniPoly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_poly(0, 1))
    }
}
