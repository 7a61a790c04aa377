use super::Poly;
use crate::gcd::gcd;
use rug::{Integer, Rational};

impl Poly {
    /// Splits the polynomial into `(c, p)` with `self = c * p`, where `p` has coprime integer
    /// coefficients and a positive leading coefficient.
    ///
    /// The zero polynomial returns `(0, 0)`.
    pub fn primitive_integer(&self) -> (Rational, Poly) {
        if self.is_zero() {
            return (Rational::new(), self.clone());
        }

        let mut num_gcd = Integer::new();
        let mut den_lcm = Integer::from(1);
        for (_, c) in self.terms() {
            num_gcd.gcd_mut(c.numer());
            den_lcm.lcm_mut(c.denom());
        }

        let mut content = Rational::from((num_gcd, den_lcm));
        if self.leading_coefficient().cmp0().is_lt() {
            content = -content;
        }
        let inverse = content.clone().recip();
        (content, self.scale(&inverse))
    }

    /// The primitive integer associate of this polynomial (see [`Poly::primitive_integer`]).
    pub fn normalized(&self) -> Poly {
        self.primitive_integer().1
    }

    /// The content of the polynomial viewed as univariate in `var`: the normalized GCD of its
    /// coefficients, a polynomial free of `var`.
    pub fn content_in(&self, var: usize) -> Poly {
        let mut content = Poly::zero(self.dim);
        for c in self.coefficients_in(var) {
            if content.is_one() {
                break;
            }
            content = gcd(&content, &c);
        }
        content
    }

    /// Divides out [`Poly::content_in`].
    pub fn primitive_in(&self, var: usize) -> Poly {
        let content = self.content_in(var);
        if content.is_zero() || content.is_one() {
            return self.clone();
        }
        self.div_exact(&content).unwrap_or_else(|| self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::rat;

    use pretty_assertions::assert_eq;

    #[test]
    fn rational_content() {
        let x = Poly::var(0, 1);
        // -(3/4)x + 1/2 = -(1/4) * (3x - 2)
        let p = &x.scale(&rat(-3, 4)) + &Poly::constant(rat(1, 2), 1);
        let (c, prim) = p.primitive_integer();
        assert_eq!(c, rat(-1, 4));
        assert_eq!(prim.to_string(), "3*x0 - 2");
    }

    #[test]
    fn content_in_variable() {
        let x = Poly::var(0, 2);
        let y = Poly::var(1, 2);
        // (y + 1) * x^2 + (y + 1) * 2y
        let yp1 = &y + &Poly::one(2);
        let p = &(&yp1 * &x.pow(2)) + &(&yp1 * &y.scale(&rat(2, 1)));
        assert_eq!(p.content_in(0), yp1);
        assert_eq!(p.primitive_in(0), &x.pow(2) + &y.scale(&rat(2, 1)));
    }
}
