//! Property-based tests for polynomial arithmetic.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{gcd::gcd, monomial::Monomial, poly::Poly, squarefree::squarefree};
    use rug::Rational;

    // small polynomials in two generators with integer coefficients
    fn small_poly() -> impl Strategy<Value = Poly> {
        proptest::collection::vec(((0u32..3, 0u32..3), -5i64..=5), 0..5).prop_map(|terms| {
            Poly::from_terms(
                terms.into_iter().map(|((a, b), c)| {
                    (Monomial::from_exponents(vec![a, b]), Rational::from(c))
                }),
                2,
            )
        })
    }

    fn nonzero_poly() -> impl Strategy<Value = Poly> {
        small_poly().prop_filter("polynomial must be non-zero", |p| !p.is_zero())
    }

    proptest! {
        #[test]
        fn mul_commutative(a in small_poly(), b in small_poly()) {
            prop_assert_eq!(&a * &b, &b * &a);
        }

        #[test]
        fn distributive(a in small_poly(), b in small_poly(), c in small_poly()) {
            prop_assert_eq!(&a * &(&b + &c), &(&a * &b) + &(&a * &c));
        }

        #[test]
        fn exact_division_recovers_factor(a in nonzero_poly(), b in nonzero_poly()) {
            prop_assert_eq!((&a * &b).div_exact(&b), Some(a));
        }

        #[test]
        fn gcd_divides_both(a in nonzero_poly(), b in nonzero_poly(), c in nonzero_poly()) {
            let x = &a * &c;
            let y = &b * &c;
            let g = gcd(&x, &y);
            prop_assert!(x.div_exact(&g).is_some());
            prop_assert!(y.div_exact(&g).is_some());
            // the common factor is always found
            prop_assert!(g.div_exact(&c.normalized()).is_some());
        }

        #[test]
        fn squarefree_expands_back(a in nonzero_poly(), b in nonzero_poly()) {
            let p = &(&a * &a) * &b;
            prop_assert_eq!(squarefree(&p).expand(2), p);
        }
    }
}
