//! Exact fraction arithmetic over the tower.
//!
//! A [`Frac`] is kept in canonical form by every operation:
//!
//! - the numerator is reduced modulo the tower relations;
//! - the denominator is free of algebraic generators (it is rationalized when needed);
//! - numerator and denominator have no common polynomial factor;
//! - both have integer coefficients, the denominator is primitive with a positive leading
//!   coefficient, and the integer contents are coprime.
//!
//! Two fractions denote the same value exactly when they are equal, as long as the tower
//! relations are irreducible. Signed infinity is `±1/0` and an undefined value is `0/0`.

use crate::{
    engine::{Engine, Inversion},
    numeric::Env,
    tower::Tower,
};
use cas_poly::{gcd, Poly};
use rug::{Complex, Integer, Rational};
use std::cmp::Ordering;
use tracing::trace;

/// A fraction of polynomials over the tower of an [`Engine`].
#[derive(Debug, Clone, PartialEq)]
pub struct Frac {
    pub num: Poly,
    pub den: Poly,
}

/// The result of [`Engine::cancel`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cancelled {
    /// The numerator cofactor.
    pub num: Poly,

    /// The denominator cofactor.
    pub den: Poly,

    /// The common factor taken out of both.
    pub common: Frac,
}

impl Frac {
    pub fn zero() -> Self {
        Self { num: Poly::zero(0), den: Poly::one(0) }
    }

    pub fn one() -> Self {
        Self::constant(1)
    }

    /// A rational constant.
    pub fn constant(c: impl Into<Rational>) -> Self {
        let (num, den) = c.into().into_numer_denom();
        Self { num: Poly::constant(num, 0), den: Poly::constant(den, 0) }
    }

    /// A polynomial with integer coefficients, which is its own canonical form.
    pub(crate) fn integral(num: Poly) -> Self {
        Self { den: Poly::one(num.dim()), num }
    }

    /// Signed infinity: positive unless `negative`.
    pub fn infinity(negative: bool) -> Self {
        let num = if negative { -1 } else { 1 };
        Self { num: Poly::constant(num, 0), den: Poly::zero(0) }
    }

    pub fn undefined() -> Self {
        Self { num: Poly::zero(0), den: Poly::zero(0) }
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero() && !self.den.is_zero()
    }

    pub fn is_infinite(&self) -> bool {
        self.den.is_zero() && !self.num.is_zero()
    }

    pub fn is_undefined(&self) -> bool {
        self.den.is_zero() && self.num.is_zero()
    }

    /// Returns true for infinity and undefined values.
    pub fn is_sentinel(&self) -> bool {
        self.den.is_zero()
    }

    /// The value, if it is a rational constant.
    pub fn as_constant(&self) -> Option<Rational> {
        if self.is_sentinel() {
            return None;
        }
        let num = self.num.as_constant()?;
        let den = self.den.as_constant()?;
        Some(num / den)
    }

    /// The numeric value at `env`, over the generators of `tower`.
    pub fn eval(&self, tower: &Tower, env: &Env, prec: u32) -> Option<Complex> {
        if self.is_sentinel() {
            return None;
        }
        let num = tower.eval(&self.num, env, prec)?;
        let den = tower.eval(&self.den, env, prec)?;
        if den.is_zero() {
            return None;
        }
        Some(num / den)
    }

    /// The sign of a rational constant or an infinity.
    fn sign(&self) -> Option<Ordering> {
        if self.is_infinite() {
            return self.num.as_constant().map(|c| c.cmp0());
        }
        self.as_constant().map(|c| c.cmp0())
    }
}

/// The integer coefficient scale of `p`: the rational `c` such that `p / c` has coprime integer
/// coefficients with a positive leading coefficient.
fn content(p: &Poly) -> (Rational, Poly) {
    p.primitive_integer()
}

/// Divides `a` and `b` by their greatest common divisor, returning `(g, a / g, b / g)`.
fn cofactors(a: &Poly, b: &Poly) -> (Poly, Poly, Poly) {
    let g = gcd(a, b);
    if g.is_constant() {
        return (Poly::one(g.dim()), a.clone(), b.clone());
    }
    match (a.div_exact(&g), b.div_exact(&g)) {
        (Some(qa), Some(qb)) => (g, qa, qb),
        _ => (Poly::one(g.dim()), a.clone(), b.clone()),
    }
}

impl Engine<'_> {
    /// Brings `num / den` to canonical form.
    pub fn canonical(&mut self, num: &Poly, den: &Poly) -> Frac {
        let mut num = self.tower.reduce(num);
        let mut den = self.tower.reduce(den);

        if den.is_zero() {
            return if num.is_zero() {
                Frac::undefined()
            } else {
                let negative = num.as_constant().map_or(false, |c| c.cmp0().is_lt());
                Frac::infinity(negative)
            };
        }
        if num.is_zero() {
            return Frac::zero();
        }

        if self.tower.uses_algebraic(&den) {
            match self.invert_poly(&den) {
                Inversion::Inverse(m, e) => {
                    num = self.tower.reduce(&(&num * &m));
                    den = e;
                },
                Inversion::Zero => return Frac::infinity(false),
                Inversion::Failed => {
                    trace!(%den, "denominator kept unrationalized");
                    self.complete = false;
                },
            }
            if num.is_zero() {
                return Frac::zero();
            }
        }

        let (_, num, den) = cofactors(&num, &den);
        self.finish(num, den)
    }

    /// Normalizes the integer contents of a fraction whose polynomial parts are already coprime.
    fn finish(&self, num: Poly, den: Poly) -> Frac {
        let dim = self.tower.dim();
        let (cn, num) = content(&num);
        let (cd, den) = content(&den);
        let (numer, denom) = (cn / cd).into_numer_denom();
        Frac {
            num: num.scale(&Rational::from(numer)).embed(dim),
            den: den.scale(&Rational::from(denom)).embed(dim),
        }
    }

    /// Cancels the common factor of `num` and `den`. The returned cofactors are the canonical
    /// fraction of `num / den`, and `common` times each cofactor gives back the original
    /// polynomial.
    pub fn cancel(&mut self, num: &Poly, den: &Poly) -> Cancelled {
        let reduced = self.canonical(num, den);
        let common = if reduced.num.is_zero() {
            self.canonical(den, &Poly::one(0))
        } else {
            self.canonical(num, &reduced.num)
        };
        Cancelled { num: reduced.num, den: reduced.den, common }
    }

    /// `a + b`.
    pub fn add(&mut self, a: &Frac, b: &Frac) -> Frac {
        if a.is_undefined() || b.is_undefined() {
            return Frac::undefined();
        }
        match (a.is_infinite(), b.is_infinite()) {
            (true, true) if a.sign() == b.sign() => return a.clone(),
            (true, true) => return Frac::undefined(),
            (true, false) => return a.clone(),
            (false, true) => return b.clone(),
            (false, false) => {},
        }
        if a.is_zero() {
            return self.refreshed(b);
        }
        if b.is_zero() {
            return self.refreshed(a);
        }

        if a.den.is_one() && b.den.is_one() {
            let num = self.tower.reduce(&(&a.num + &b.num));
            return Frac::integral(num);
        }

        let (_, da, db) = cofactors(&a.den, &b.den);
        let num = &(&a.num * &db) + &(&b.num * &da);
        let den = &a.den * &db;
        self.canonical(&num, &den)
    }

    /// `a - b`.
    pub fn sub(&mut self, a: &Frac, b: &Frac) -> Frac {
        let b = self.neg(b);
        self.add(a, &b)
    }

    /// `-a`.
    pub fn neg(&self, a: &Frac) -> Frac {
        Frac { num: -&a.num, den: a.den.clone() }
    }

    /// `a * b`. Each numerator is cancelled against the other denominator first. A product that
    /// involves algebraic generators gets a full cancellation pass afterwards, since reducing
    /// modulo the relations can expose new common factors.
    pub fn mul(&mut self, a: &Frac, b: &Frac) -> Frac {
        if a.is_undefined() || b.is_undefined() {
            return Frac::undefined();
        }
        if a.is_infinite() || b.is_infinite() {
            if a.is_zero() || b.is_zero() {
                return Frac::undefined();
            }
            let negative = match (a.sign(), b.sign()) {
                (Some(sa), Some(sb)) => (sa == Ordering::Less) != (sb == Ordering::Less),
                _ => false,
            };
            return Frac::infinity(negative);
        }
        if a.is_zero() || b.is_zero() {
            return Frac::zero();
        }

        let (_, an, bd) = cofactors(&a.num, &b.den);
        let (_, bn, ad) = cofactors(&b.num, &a.den);
        let num = &an * &bn;
        let den = &ad * &bd;
        if self.tower.only_ordinary(&num) {
            self.finish(num, den)
        } else {
            self.canonical(&num, &den)
        }
    }

    /// `1 / a`. The reciprocal of zero is positive infinity.
    pub fn inv(&mut self, a: &Frac) -> Frac {
        if a.is_undefined() {
            return Frac::undefined();
        }
        if a.is_infinite() {
            return Frac::zero();
        }
        if a.is_zero() {
            return Frac::infinity(false);
        }
        self.canonical(&a.den, &a.num)
    }

    /// `a / b`.
    pub fn div(&mut self, a: &Frac, b: &Frac) -> Frac {
        let b = self.inv(b);
        self.mul(a, &b)
    }

    /// `a^exp` by repeated squaring. A negative exponent inverts first.
    pub fn pow(&mut self, a: &Frac, exp: &Integer) -> Frac {
        if exp.cmp0().is_lt() {
            let inverse = self.inv(a);
            return self.pow(&inverse, &Integer::from(-exp));
        }
        if exp.cmp0().is_eq() {
            return if a.is_sentinel() { Frac::undefined() } else { Frac::one() };
        }
        if a.is_sentinel() || a.is_zero() {
            let negative = exp.is_odd() && a.sign() == Some(Ordering::Less);
            return match (a.is_undefined(), a.is_infinite()) {
                (true, _) => Frac::undefined(),
                (_, true) => Frac::infinity(negative),
                _ => Frac::zero(),
            };
        }

        if self.tower.only_ordinary(&a.num) {
            if let Some(e) = exp.to_u32() {
                return Frac { num: a.num.pow(e), den: a.den.pow(e) };
            }
        }

        let mut result = Frac::one();
        let mut base = a.clone();
        let mut exp = exp.clone();
        while exp.cmp0().is_gt() {
            if exp.is_odd() {
                result = self.mul(&result, &base);
            }
            exp >>= 1;
            if exp.cmp0().is_gt() {
                base = self.mul(&base, &base);
            }
        }
        result
    }

    /// The sum of `terms`, combined pairwise from the middle when there are many terms or any
    /// term has a denominator.
    pub fn sum(&mut self, terms: &[Frac]) -> Frac {
        let balanced = terms.len() > self.options.balanced_threshold
            || terms.iter().any(|t| !t.den.is_one());
        match terms {
            [] => Frac::zero(),
            [term] => self.refreshed(term),
            _ if balanced => {
                let (left, right) = terms.split_at(terms.len() / 2);
                let left = self.sum(left);
                let right = self.sum(right);
                self.add(&left, &right)
            },
            [first, rest @ ..] => rest
                .iter()
                .fold(self.refreshed(first), |acc, term| self.add(&acc, term)),
        }
    }

    /// The product of `factors`, combined like [`Engine::sum`].
    pub fn product(&mut self, factors: &[Frac]) -> Frac {
        let balanced = factors.len() > self.options.balanced_threshold
            || factors.iter().any(|f| !f.den.is_one());
        match factors {
            [] => Frac::one(),
            [factor] => self.refreshed(factor),
            _ if balanced => {
                let (left, right) = factors.split_at(factors.len() / 2);
                let left = self.product(left);
                let right = self.product(right);
                self.mul(&left, &right)
            },
            [first, rest @ ..] => rest
                .iter()
                .fold(self.refreshed(first), |acc, factor| self.mul(&acc, factor)),
        }
    }

    /// `a` rewritten through any merges and splits that happened since it was built.
    pub fn refreshed(&mut self, a: &Frac) -> Frac {
        if a.is_sentinel() {
            return a.clone();
        }
        let num = self.tower.reduce(&a.num);
        let den = self.tower.refresh(&a.den);
        if num == a.num && den == a.den && !self.tower.uses_algebraic(&den) {
            let dim = self.tower.dim();
            return Frac { num: num.embed(dim), den: den.embed(dim) };
        }
        self.canonical(&num, &den)
    }
}
