//! Greatest common divisors of multivariate polynomials over the rationals.
//!
//! The algorithm is the recursive primitive polynomial remainder sequence: the polynomials are
//! viewed as univariate in their lowest common generator, contents are split off and handled
//! recursively, and the primitive parts are reduced by pseudo-division, taking primitive parts
//! after each step to keep the coefficients small.

use crate::poly::Poly;

/// The greatest common divisor of `a` and `b`, normalized to coprime integer coefficients with a
/// positive leading coefficient. `gcd(0, 0) = 0`.
pub fn gcd(a: &Poly, b: &Poly) -> Poly {
    let dim = a.dim().max(b.dim());
    if a.is_zero() {
        return b.normalized().embed(dim);
    }
    if b.is_zero() {
        return a.normalized().embed(dim);
    }
    if a.is_constant() || b.is_constant() {
        return Poly::one(dim);
    }
    if a == b {
        return a.normalized().embed(dim);
    }

    let var = match (a.min_var(), b.min_var()) {
        (Some(u), Some(v)) => u.min(v),
        _ => return Poly::one(dim),
    };

    // a generator that only one side uses contributes nothing beyond that side's content
    if !a.uses(var) {
        return gcd(a, &b.content_in(var));
    }
    if !b.uses(var) {
        return gcd(&a.content_in(var), b);
    }

    let ca = a.content_in(var);
    let cb = b.content_in(var);
    let content = gcd(&ca, &cb);

    let mut r0 = a.primitive_in(var);
    let mut r1 = b.primitive_in(var);
    if r0.degree_in(var) < r1.degree_in(var) {
        std::mem::swap(&mut r0, &mut r1);
    }

    loop {
        let rem = r0.pseudo_div(&r1, var).remainder;
        if rem.is_zero() {
            break;
        }
        if rem.degree_in(var) == 0 {
            // coprime primitive parts
            return content.embed(dim);
        }
        r0 = r1;
        r1 = rem.primitive_in(var).normalized();
    }

    (&content * &r1.primitive_in(var)).normalized().embed(dim)
}

/// The greatest common divisor of every polynomial in `polys`.
pub fn gcd_all<'a>(polys: impl IntoIterator<Item = &'a Poly>) -> Poly {
    let mut acc: Option<Poly> = None;
    for p in polys {
        acc = Some(match acc {
            Some(g) if g.is_one() => return g,
            Some(g) => gcd(&g, p),
            None => p.normalized(),
        });
    }
    acc.unwrap_or_else(|| Poly::zero(0))
}

/// The least common multiple of `a` and `b`, normalized like [`gcd`].
pub fn lcm(a: &Poly, b: &Poly) -> Poly {
    if a.is_zero() || b.is_zero() {
        return Poly::zero(a.dim().max(b.dim()));
    }
    let g = gcd(a, b);
    let prod = a * b;
    prod.div_exact(&g).unwrap_or(prod).normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::rat;

    use pretty_assertions::assert_eq;

    #[test]
    fn univariate_common_factor() {
        let x = Poly::var(0, 1);
        let one = Poly::one(1);
        // (x - 1)(x + 1) and (x - 1)^2
        let a = &(&x - &one) * &(&x + &one);
        let b = (&x - &one).pow(2);
        assert_eq!(gcd(&a, &b), &x - &one);
    }

    #[test]
    fn multivariate_common_factor() {
        let x = Poly::var(0, 3);
        let y = Poly::var(1, 3);
        let z = Poly::var(2, 3);
        let common = &(&x * &y) + &z.scale(&rat(2, 3));
        let a = &common * &(&x + &y);
        let b = &common * &(&(&y * &z) - &Poly::one(3));
        assert_eq!(gcd(&a, &b), common.normalized());
        assert_eq!(gcd(&a, &b).to_string(), "3*x0*x1 + 2*x2");
    }

    #[test]
    fn coprime_and_constants() {
        let x = Poly::var(0, 2);
        let y = Poly::var(1, 2);
        assert!(gcd(&x, &y).is_one());
        assert!(gcd(&x.scale(&rat(6, 1)), &Poly::constant(4, 2)).is_one());
        assert_eq!(gcd(&Poly::zero(2), &y.scale(&rat(-2, 1))), y);
    }

    #[test]
    fn content_only_common_part() {
        let x = Poly::var(0, 2);
        let y = Poly::var(1, 2);
        // (y^2 - 1) x and (y + 1) x^2 + (y + 1)
        let yp = &y + &Poly::one(2);
        let ym = &y - &Poly::one(2);
        let a = &(&yp * &ym) * &x;
        let b = &yp * &(&x.pow(2) + &Poly::one(2));
        assert_eq!(gcd(&a, &b), yp);
    }

    #[test]
    fn integer_content_does_not_grow() {
        let x = Poly::var(0, 2);
        let y = Poly::var(1, 2);
        let three = |p: &Poly| p.scale(&rat(3, 1));
        // 3xy + 3x + 1 shared by two cofactors with integer content
        let common = &(&three(&(&x * &y)) + &three(&x)) + &Poly::one(2);
        let f = three(&(&(&x.pow(3).scale(&rat(2, 1)) + &(&x * &y).scale(&rat(4, 1)))
            + &Poly::constant(6, 2)));
        let g = &(&(&three(&(&x.pow(2) * &y.pow(2))) - &three(&(&x.pow(2) * &y)))
            + &x.scale(&rat(5, 1)))
            * &(&x.scale(&rat(2, 1)) + &Poly::constant(8, 2));
        let a = &common * &f;
        let b = &common * &g;
        assert_eq!(gcd(&a, &b), common);
        assert_eq!(gcd(&a.scale(&rat(-4, 1)), &b.scale(&rat(6, 1))), common);
    }

    #[test]
    fn least_common_multiple() {
        let x = Poly::var(0, 1);
        let one = Poly::one(1);
        let a = &x * &(&x - &one);
        let b = &x * &(&x + &one);
        assert_eq!(lcm(&a, &b), &x * &(&(&x * &x) - &one));
    }
}
