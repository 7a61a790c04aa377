use super::Poly;
use crate::monomial::Monomial;
use rug::Rational;
use std::{
    collections::BTreeMap,
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    rc::Rc,
};

impl Poly {
    /// Multiplies every coefficient by `c`.
    pub fn scale(&self, c: &Rational) -> Self {
        if c.cmp0().is_eq() {
            return Self::zero(self.dim);
        }
        self.map_coefficients(|k| k.clone() * c)
    }

    /// Multiplies by `c * m`.
    pub fn mul_term(&self, m: &Monomial, c: &Rational) -> Self {
        if c.cmp0().is_eq() {
            return Self::zero(self.dim.max(m.width()));
        }
        let terms: BTreeMap<_, _> = self
            .terms
            .iter()
            .map(|(k, v)| (k.mul(m), v.clone() * c))
            .collect();
        Self { dim: self.dim.max(m.width()), terms: Rc::new(terms) }
    }

    /// Raises the polynomial to a nonnegative integer power by repeated squaring.
    pub fn pow(&self, mut exp: u32) -> Self {
        let mut base = self.clone();
        let mut result = Self::one(self.dim);
        while exp > 0 {
            if exp & 1 == 1 {
                result = &result * &base;
            }
            exp >>= 1;
            if exp > 0 {
                base = &base * &base;
            }
        }
        result
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Poly) {
        self.dim = self.dim.max(rhs.dim);
        for (m, c) in rhs.terms.iter() {
            self.add_term(m.clone(), c.clone());
        }
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, rhs: &Poly) {
        self.dim = self.dim.max(rhs.dim);
        for (m, c) in rhs.terms.iter() {
            self.add_term(m.clone(), -c.clone());
        }
    }
}

impl MulAssign<&Poly> for Poly {
    fn mul_assign(&mut self, rhs: &Poly) {
        *self = &*self * rhs;
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        // fold the smaller map into a copy of the larger one
        let (mut big, small) = if self.len() >= rhs.len() {
            (self.clone(), rhs)
        } else {
            (rhs.clone(), self)
        };
        big += small;
        big
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: &Poly) -> Poly {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl Mul for &Poly {
    type Output = Poly;

    fn mul(self, rhs: &Poly) -> Poly {
        let dim = self.dim.max(rhs.dim);
        if self.is_zero() || rhs.is_zero() {
            return Poly::zero(dim);
        }

        let mut out = Poly::zero(dim);
        for (m, c) in rhs.terms.iter() {
            for (n, d) in self.terms.iter() {
                out.add_term(n.mul(m), Rational::from(c * d));
            }
        }
        out
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        self.map_coefficients(|c| -c.clone())
    }
}

impl Neg for Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        -&self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn expand_binomial() {
        let x = Poly::var(0, 1);
        let p = (&x + &Poly::one(1)).pow(3);
        assert_eq!(p.to_string(), "x0^3 + 3*x0^2 + 3*x0 + 1");
    }

    #[test]
    fn difference_of_squares() {
        let x = Poly::var(0, 2);
        let y = Poly::var(1, 2);
        let p = &(&x + &y) * &(&x - &y);
        assert_eq!(p, &(&x * &x) - &(&y * &y));
        assert!((&p - &p).is_zero());
    }

    #[test]
    fn mixed_dimensions() {
        let x = Poly::var(0, 1);
        let z = Poly::var(4, 5);
        let p = &x + &z;
        assert_eq!(p.dim(), 5);
        assert_eq!(p.to_string(), "x0 + x4");
    }
}
