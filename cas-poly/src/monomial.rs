//! Exponent tuples over generator indices.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An exponent tuple over generator indices, ordered lexicographically with index 0 the most
/// significant generator.
///
/// Trailing zero exponents are never stored, so monomials over different numbers of generators
/// compare as if the shorter tuple were padded with zeros. Embedding a polynomial into a larger
/// set of generators therefore never touches its monomials.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Monomial(Vec<u32>);

impl Monomial {
    /// The monomial `1`.
    pub fn one() -> Self {
        Self(Vec::new())
    }

    /// The monomial `x_var^exp`.
    pub fn var(var: usize, exp: u32) -> Self {
        let mut exps = vec![0; var + 1];
        exps[var] = exp;
        Self::from_exponents(exps)
    }

    /// Creates a monomial from an exponent tuple, trimming trailing zeros.
    pub fn from_exponents(mut exps: Vec<u32>) -> Self {
        while exps.last() == Some(&0) {
            exps.pop();
        }
        Self(exps)
    }

    /// The stored exponents. Generators past the end have exponent zero.
    pub fn exponents(&self) -> &[u32] {
        &self.0
    }

    /// The exponent of the given generator.
    pub fn exponent(&self, var: usize) -> u32 {
        self.0.get(var).copied().unwrap_or(0)
    }

    /// Returns true if this is the monomial `1`.
    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    /// One past the highest generator index with a nonzero exponent.
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// The sum of all exponents.
    pub fn total_degree(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Iterates over `(generator, exponent)` pairs with a nonzero exponent.
    pub fn factors(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.0.iter().copied().enumerate().filter(|&(_, e)| e > 0)
    }

    /// Returns a copy with the exponent of `var` replaced.
    pub fn with_exponent(&self, var: usize, exp: u32) -> Self {
        let mut exps = self.0.clone();
        if exps.len() <= var {
            exps.resize(var + 1, 0);
        }
        exps[var] = exp;
        Self::from_exponents(exps)
    }

    /// Multiplies two monomials.
    pub fn mul(&self, other: &Self) -> Self {
        let (long, short) = if self.0.len() >= other.0.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut exps = long.0.clone();
        for (e, s) in exps.iter_mut().zip(short.0.iter()) {
            *e += s;
        }
        Self(exps)
    }

    /// Divides `self` by `other`, returning [`None`] if `other` does not divide `self`.
    pub fn div(&self, other: &Self) -> Option<Self> {
        if other.0.len() > self.0.len() {
            return None;
        }
        let mut exps = self.0.clone();
        for (e, o) in exps.iter_mut().zip(other.0.iter()) {
            *e = e.checked_sub(*o)?;
        }
        Some(Self::from_exponents(exps))
    }

    /// Maps each generator index through `map`, which must be injective on the indices in use.
    pub fn rename(&self, map: impl Fn(usize) -> usize) -> Self {
        let mut exps = Vec::new();
        for (var, exp) in self.factors() {
            let to = map(var);
            if exps.len() <= to {
                exps.resize(to + 1, 0);
            }
            exps[to] += exp;
        }
        Self::from_exponents(exps)
    }

    /// Splits the monomial at `var`: the part over generators below `var`, and the part over
    /// `var` and above.
    pub fn split_at(&self, var: usize) -> (Self, Self) {
        let low = self.0.iter().copied().take(var).collect();
        let mut high = vec![0; var.min(self.0.len())];
        high.extend(self.0.iter().copied().skip(var));
        (Self::from_exponents(low), Self::from_exponents(high))
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_one() {
            return write!(f, "1");
        }

        let mut first = true;
        for (var, exp) in self.factors() {
            if !first {
                write!(f, "*")?;
            }
            first = false;
            match exp {
                1 => write!(f, "x{}", var)?,
                _ => write!(f, "x{}^{}", var, exp)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn padded_comparison() {
        let a = Monomial::from_exponents(vec![1, 0, 0]);
        let b = Monomial::from_exponents(vec![1]);
        assert_eq!(a, b);
        assert!(Monomial::from_exponents(vec![1, 2]) > b);
        assert!(Monomial::from_exponents(vec![2]) > Monomial::from_exponents(vec![1, 5]));
        assert!(Monomial::one() < Monomial::var(3, 1));
    }

    #[test]
    fn divide() {
        let a = Monomial::from_exponents(vec![2, 1, 3]);
        let b = Monomial::from_exponents(vec![1, 1]);
        assert_eq!(a.div(&b), Some(Monomial::from_exponents(vec![1, 0, 3])));
        assert_eq!(b.div(&a), None);
        assert_eq!(a.div(&b).unwrap().mul(&b), a);
    }

    #[test]
    fn split_and_rename() {
        let m = Monomial::from_exponents(vec![2, 0, 1, 4]);
        let (low, high) = m.split_at(2);
        assert_eq!(low, Monomial::from_exponents(vec![2]));
        assert_eq!(high, Monomial::from_exponents(vec![0, 0, 1, 4]));
        assert_eq!(low.mul(&high), m);

        let swapped = m.rename(|v| match v {
            0 => 3,
            3 => 0,
            v => v,
        });
        assert_eq!(swapped, Monomial::from_exponents(vec![4, 0, 1, 2]));
    }
}
