//! Squarefree decomposition of multivariate polynomials over the rationals.

use crate::{gcd::gcd, poly::Poly};
use rug::Rational;

/// A polynomial written as `content * product(factor^multiplicity)`, where the factors are
/// pairwise coprime, squarefree, and normalized to coprime integer coefficients with a positive
/// leading coefficient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Squarefree {
    /// The rational constant in front of the product.
    pub content: Rational,

    /// The factors with their multiplicities. A multiplicity may appear more than once when the
    /// factors come from different generators.
    pub factors: Vec<(Poly, u32)>,
}

impl Squarefree {
    /// Multiplies the decomposition back out.
    pub fn expand(&self, dim: usize) -> Poly {
        self.factors
            .iter()
            .fold(Poly::constant(self.content.clone(), dim), |acc, (f, e)| &acc * &f.pow(*e))
    }
}

/// Computes the squarefree decomposition of `p`.
///
/// The content with respect to the lowest generator is decomposed recursively; the primitive part
/// is decomposed with Yun's algorithm in that generator.
pub fn squarefree(p: &Poly) -> Squarefree {
    let dim = p.dim();
    let mut factors = Vec::new();
    collect(&p.normalized(), &mut factors);

    let product = factors
        .iter()
        .fold(Poly::one(dim), |acc, (f, e): &(Poly, u32)| &acc * &f.pow(*e));
    let content = p
        .div_exact(&product)
        .and_then(|c| c.as_constant())
        .unwrap_or_else(|| p.primitive_integer().0);

    Squarefree { content, factors }
}

/// Pushes the squarefree factors of the primitive integer polynomial `p` onto `out`.
fn collect(p: &Poly, out: &mut Vec<(Poly, u32)>) {
    let var = match p.min_var() {
        Some(var) => var,
        None => return,
    };

    let content = p.content_in(var);
    if !content.is_one() {
        collect(&content, out);
    }
    let pp = match p.div_exact(&content) {
        Some(pp) => pp.normalized(),
        None => p.clone(),
    };

    yun(&pp, var, out);
}

/// Yun's algorithm for a polynomial primitive in `var`.
fn yun(p: &Poly, var: usize, out: &mut Vec<(Poly, u32)>) {
    let dp = p.derivative(var);
    let g = gcd(p, &dp);

    let exact = |a: &Poly, b: &Poly| a.div_exact(b).unwrap_or_else(|| a.clone());
    let mut b = exact(p, &g);
    let mut c = exact(&dp, &g);
    let mut multiplicity = 1;

    while !b.is_constant() {
        let d = &c - &b.derivative(var);
        let a = gcd(&b, &d);
        if !a.is_constant() {
            out.push((a.normalized(), multiplicity));
        }
        b = exact(&b, &a);
        c = exact(&d, &a);
        multiplicity += 1;
    }
}

/// Returns true if `p` has no repeated factor.
pub fn is_squarefree(p: &Poly) -> bool {
    squarefree(p).factors.iter().all(|(_, e)| *e == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::rat;

    use pretty_assertions::assert_eq;

    #[test]
    fn univariate() {
        let x = Poly::var(0, 1);
        let one = Poly::one(1);
        // 3 (x - 1)^2 (x + 2)
        let p = (&(&x - &one).pow(2) * &(&x + &Poly::constant(2, 1))).scale(&rat(3, 1));
        let sqf = squarefree(&p);
        assert_eq!(sqf.content, rat(3, 1));
        assert_eq!(sqf.factors, vec![(&x + &Poly::constant(2, 1), 1), (&x - &one, 2)]);
        assert_eq!(sqf.expand(1), p);
    }

    #[test]
    fn multivariate_with_content() {
        let x = Poly::var(0, 2);
        let y = Poly::var(1, 2);
        // x^2 * y^3 * (y + 1)
        let p = &(&x.pow(2) * &y.pow(3)) * &(&y + &Poly::one(2));
        let sqf = squarefree(&p);
        assert_eq!(sqf.expand(2), p);

        let mut mults: Vec<_> = sqf.factors.iter().map(|(f, e)| (f.to_string(), *e)).collect();
        mults.sort();
        assert_eq!(mults, vec![
            ("x0".to_string(), 2),
            ("x1".to_string(), 3),
            ("x1 + 1".to_string(), 1),
        ]);
    }

    #[test]
    fn squarefree_check() {
        let x = Poly::var(0, 1);
        assert!(is_squarefree(&(&x.pow(2) - &Poly::constant(2, 1))));
        assert!(!is_squarefree(&x.pow(2)));
    }
}
