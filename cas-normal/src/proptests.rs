//! Property-based tests for the fraction kernel.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::{ctxt::NormalOptions, engine::Engine, expr::Expr, kernel::Frac};
    use cas_poly::{Monomial, Poly};
    use rug::Rational;

    // small polynomials in x and y with integer coefficients
    fn small_poly() -> impl Strategy<Value = Poly> {
        proptest::collection::vec(((0u32..3, 0u32..3), -5i64..=5), 0..4).prop_map(|terms| {
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

    fn fraction() -> impl Strategy<Value = (Poly, Poly)> {
        (small_poly(), nonzero_poly())
    }

    fn with_engine<T>(f: impl FnOnce(&mut Engine) -> T) -> T {
        let options = NormalOptions::default();
        let mut sink = Vec::<crate::diagnostic::Diagnostic>::new();
        let mut engine = Engine::new(&options, &mut sink);
        engine.tower.ordinary(&Expr::symbol("x"));
        engine.tower.ordinary(&Expr::symbol("y"));
        f(&mut engine)
    }

    proptest! {
        #[test]
        fn add_commutative(a in fraction(), b in fraction()) {
            let (ab, ba) = with_engine(|engine| {
                let a = engine.canonical(&a.0, &a.1);
                let b = engine.canonical(&b.0, &b.1);
                (engine.add(&a, &b), engine.add(&b, &a))
            });
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn mul_associative(a in fraction(), b in fraction(), c in fraction()) {
            let (left, right) = with_engine(|engine| {
                let a = engine.canonical(&a.0, &a.1);
                let b = engine.canonical(&b.0, &b.1);
                let c = engine.canonical(&c.0, &c.1);
                let ab = engine.mul(&a, &b);
                let bc = engine.mul(&b, &c);
                (engine.mul(&ab, &c), engine.mul(&a, &bc))
            });
            prop_assert_eq!(left, right);
        }

        #[test]
        fn distributive(a in fraction(), b in fraction(), c in fraction()) {
            let (left, right) = with_engine(|engine| {
                let a = engine.canonical(&a.0, &a.1);
                let b = engine.canonical(&b.0, &b.1);
                let c = engine.canonical(&c.0, &c.1);
                let sum = engine.add(&b, &c);
                let ab = engine.mul(&a, &b);
                let ac = engine.mul(&a, &c);
                (engine.mul(&a, &sum), engine.add(&ab, &ac))
            });
            prop_assert_eq!(left, right);
        }

        #[test]
        fn difference_with_itself(a in fraction()) {
            let diff = with_engine(|engine| {
                let a = engine.canonical(&a.0, &a.1);
                engine.sub(&a, &a)
            });
            prop_assert!(diff.is_zero());
        }

        #[test]
        fn inverse(a in nonzero_poly(), b in nonzero_poly()) {
            let product = with_engine(|engine| {
                let a = engine.canonical(&a, &b);
                let inv = engine.inv(&a);
                engine.mul(&a, &inv)
            });
            prop_assert_eq!(product, Frac::one());
        }

        #[test]
        fn cancel_reconstructs(num in nonzero_poly(), den in nonzero_poly(), common in nonzero_poly()) {
            let num = &num * &common;
            let den = &den * &common;
            let (from_num, from_den, whole_num, whole_den) = with_engine(|engine| {
                let cancelled = engine.cancel(&num, &den);
                let from_num = engine.mul(&cancelled.common, &Frac::integral(cancelled.num));
                let from_den = engine.mul(&cancelled.common, &Frac::integral(cancelled.den));
                let one = Poly::one(2);
                (from_num, from_den, engine.canonical(&num, &one), engine.canonical(&den, &one))
            });
            prop_assert_eq!(from_num, whole_num);
            prop_assert_eq!(from_den, whole_den);
        }
    }
}
