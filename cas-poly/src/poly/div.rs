use super::Poly;
use crate::monomial::Monomial;
use rug::Rational;

/// The result of [`Poly::pseudo_div`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PseudoDivision {
    /// The pseudo-quotient.
    pub quotient: Poly,

    /// The pseudo-remainder, of lower degree than the divisor in the chosen generator.
    pub remainder: Poly,

    /// How many times the dividend was multiplied by the divisor's leading coefficient.
    pub steps: u32,
}

impl Poly {
    /// Divides `self` by `divisor`, returning [`None`] if the division is not exact.
    ///
    /// Uses lexicographic leading-term division: if `divisor` divides `self`, every leading
    /// term of the running remainder is divisible by the leading term of `divisor`.
    pub fn div_exact(&self, divisor: &Poly) -> Option<Poly> {
        let dim = self.dim.max(divisor.dim);
        let (lm, lc) = match divisor.leading_term() {
            Some((m, c)) => (m.clone(), c.clone()),
            None => return None,
        };

        if let Some(c) = divisor.as_constant() {
            return Some(self.scale(&c.recip()).embed(dim));
        }

        let mut rem = self.clone();
        let mut quot = Poly::zero(dim);
        while let Some((m, c)) = rem.leading_term().map(|(m, c)| (m.clone(), c.clone())) {
            let m = m.div(&lm)?;
            let c = c / &lc;
            rem -= &divisor.mul_term(&m, &c);
            quot.add_term(m, c);
        }
        Some(quot)
    }

    /// Pseudo-division in the generator `var`: finds `q` and `r` with
    /// `lc(divisor)^steps * self = q * divisor + r` and `deg_var(r) < deg_var(divisor)`, where
    /// `lc` is the leading coefficient in `var`.
    ///
    /// Panics if `divisor` is zero.
    pub fn pseudo_div(&self, divisor: &Poly, var: usize) -> PseudoDivision {
        assert!(!divisor.is_zero(), "pseudo-division by zero");
        let db = divisor.degree_in(var);
        let lcb = divisor.leading_coefficient_in(var);

        let mut quotient = Poly::zero(self.dim);
        let mut remainder = self.clone();
        let mut steps = 0;
        while !remainder.is_zero() && remainder.degree_in(var) >= db {
            let dr = remainder.degree_in(var);
            let t = remainder.coefficient_in(var, dr).shift(var, dr - db);
            quotient = &(&quotient * &lcb) + &t;
            remainder = &(&remainder * &lcb) - &(&t * divisor);
            steps += 1;
        }

        PseudoDivision { quotient, remainder, steps }
    }

    /// The remainder of `self` modulo `modulus`, which must be monic in `var` of degree at
    /// least one. The remainder has degree below `deg_var(modulus)` in `var`.
    pub fn rem_monic(&self, var: usize, modulus: &Poly) -> Poly {
        let d = modulus.degree_in(var);
        debug_assert!(d > 0 && modulus.leading_coefficient_in(var).is_one());

        // x^d = -(modulus - x^d)
        let mut tail = modulus.clone();
        tail.add_term(Monomial::var(var, d), Rational::from(-1));
        let tail = -tail;

        let mut current = self.clone();
        loop {
            let mut low = Poly::zero(current.dim);
            let mut high = Poly::zero(current.dim);
            for (m, c) in current.terms() {
                let e = m.exponent(var);
                if e >= d {
                    high.add_term(m.with_exponent(var, e - d), c.clone());
                } else {
                    low.add_term(m.clone(), c.clone());
                }
            }
            if high.is_zero() {
                return low.embed(self.dim.max(modulus.dim));
            }
            current = &low + &(&high * &tail);
        }
    }
}
