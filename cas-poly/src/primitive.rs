//! Functions to construct [`Integer`]s, [`Rational`]s, [`Float`]s, and [`Complex`] numbers from
//! various types, plus a few scalar helpers shared by the polynomial algorithms.

use once_cell::sync::Lazy;
use rug::{ops::Pow, Assign, Complex, Float, Integer, Rational};

/// The number of bits of precision to use when computing numeric approximations.
pub const PRECISION: u32 = 1 << 9;

/// Primes below this bound are divided out by trial division in [`extract_power`].
const TRIAL_DIVISION_BOUND: usize = 10_000;

/// The primes below [`TRIAL_DIVISION_BOUND`], by a sieve of Eratosthenes.
static SMALL_PRIMES: Lazy<Vec<u32>> = Lazy::new(|| {
    let mut composite = vec![false; TRIAL_DIVISION_BOUND];
    let mut primes = Vec::new();
    for p in 2..TRIAL_DIVISION_BOUND {
        if composite[p] {
            continue;
        }
        primes.push(p as u32);
        for multiple in (p * p..TRIAL_DIVISION_BOUND).step_by(p) {
            composite[multiple] = true;
        }
    }
    primes
});

/// Creates an [`Integer`] with the given value.
pub fn int<T>(n: T) -> Integer
where
    Integer: From<T>,
{
    Integer::from(n)
}

/// Creates a [`Rational`] with the given numerator and denominator.
///
/// Panics if the denominator is zero.
pub fn rat<N, D>(num: N, den: D) -> Rational
where
    Integer: From<N> + From<D>,
{
    Rational::from((Integer::from(num), Integer::from(den)))
}

/// Creates a [`Float`] with the given value.
pub fn float<T>(n: T) -> Float
where
    Float: Assign<T>,
{
    Float::with_val(PRECISION, n)
}

/// Creates a [`Complex`] with the given value.
pub fn complex<T>(n: T) -> Complex
where
    Complex: Assign<T>,
{
    Complex::with_val(PRECISION, n)
}

/// Converts a [`Rational`] to a [`Complex`] with the given precision.
pub fn complex_from_rational(r: &Rational, prec: u32) -> Complex {
    Complex::with_val(prec, (Float::with_val(prec, r), Float::new(prec)))
}

/// The absolute value of a [`Complex`] number as a [`Float`].
pub fn modulus(z: &Complex) -> Float {
    Float::with_val(z.prec().0, z.abs_ref())
}

/// Returns true if `a` and `b` agree to within the relative tolerance `tol`.
///
/// Values that are both smaller than `tol` in absolute value are considered equal.
pub fn approx_eq(a: &Complex, b: &Complex, tol: f64) -> bool {
    let diff = modulus(&(a.clone() - b)).to_f64();
    let scale = modulus(a).to_f64().max(modulus(b).to_f64()).max(1.0);
    diff <= tol * scale
}

/// Splits `n` into `(s, r)` such that `n = s^q * r`, with `s > 0` and `r` free of `q`-th powers
/// as far as can be determined.
///
/// Prime factors below a fixed bound are removed by trial division; the remaining cofactor is
/// tested for being a perfect `q`-th power. The sign of `n` is kept on `r`.
pub fn extract_power(n: &Integer, q: u32) -> (Integer, Integer) {
    let mut rest = Integer::from(n.abs_ref());
    let mut outside = int(1);
    let mut inside = int(1);

    if q <= 1 || rest <= 1 {
        return (int(1), n.clone());
    }

    for &p in SMALL_PRIMES.iter() {
        if rest == 1 || Integer::from(p).square() > rest {
            break;
        }

        let mut e = 0u32;
        while rest.is_divisible_u(p) {
            rest.div_exact_u_mut(p);
            e += 1;
        }

        if e > 0 {
            outside *= Integer::from(p).pow(e / q);
            inside *= Integer::from(p).pow(e % q);
        }
    }

    if rest > 1 {
        let (root, rem) = rest.clone().root_rem(Integer::new(), q);
        if rem == 0 {
            outside *= root;
        } else {
            inside *= rest;
        }
    }

    if n.cmp0().is_lt() {
        inside = -inside;
    }

    (outside, inside)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn extract_square() {
        assert_eq!(extract_power(&int(8), 2), (int(2), int(2)));
        assert_eq!(extract_power(&int(72), 2), (int(6), int(2)));
        assert_eq!(extract_power(&int(49), 2), (int(7), int(1)));
    }

    #[test]
    fn extract_cube_negative() {
        assert_eq!(extract_power(&int(-54), 3), (int(3), int(-2)));
        assert_eq!(extract_power(&int(-8), 3), (int(2), int(-1)));
    }

    #[test]
    fn extract_large_cofactor() {
        // 1000003 is a prime above the trial-division bound
        let p = int(1_000_003);
        let n = p.clone() * &p * 3;
        assert_eq!(extract_power(&n, 2), (p, int(3)));
    }

    #[test]
    fn approx_comparison() {
        let a = complex((1.0, 2.0));
        let b = complex((1.0 + 1e-15, 2.0));
        assert!(approx_eq(&a, &b, 1e-12));
        assert!(!approx_eq(&a, &complex((1.1, 2.0)), 1e-12));
    }
}
