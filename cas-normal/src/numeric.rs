//! Arbitrary-precision numeric evaluation of expressions on the principal branch.
//!
//! Numeric values are only used to tell roots apart: which factor of a minimal polynomial
//! vanishes at a generator, or which candidate root a radical denotes. They never enter the
//! exact result.

use crate::{ctxt::NormalOptions, expr::{Expr, Primary}};
use cas_poly::{
    primitive::{approx_eq, complex_from_rational},
    roots::{complex_roots, sort_by_real_part},
};
use rug::{ops::Pow, Complex, Float, Rational};
use std::collections::HashMap;
use tracing::trace;

/// Values of the free symbols.
pub type Env = HashMap<String, Rational>;

/// The precision the increasing-precision loop starts at.
const START_PRECISION: u32 = 64;

/// Evaluates `expr` at `prec` bits, with every symbol taking its value from `env`.
///
/// Multivalued operations take their principal value: `b^e` is `exp(e * ln(b))` with the
/// principal logarithm, and a `rootof` node takes the root with the largest real part, ties
/// broken by the largest imaginary part. Returns [`None`] for unknown symbols and functions,
/// division by zero and the infinite and undefined sentinels.
pub fn evaluate(expr: &Expr, env: &Env, prec: u32) -> Option<Complex> {
    let value = match expr {
        Expr::Primary(primary) => evaluate_primary(primary, env, prec)?,
        Expr::Add(terms) => {
            let mut sum = Complex::new(prec);
            for term in terms {
                sum += evaluate(term, env, prec)?;
            }
            sum
        },
        Expr::Mul(factors) => {
            let mut product = Complex::with_val(prec, 1);
            for factor in factors {
                product *= evaluate(factor, env, prec)?;
            }
            product
        },
        Expr::Neg(inner) => -evaluate(inner, env, prec)?,
        Expr::Inv(inner) => {
            let value = evaluate(inner, env, prec)?;
            if value.is_zero() {
                return None;
            }
            value.recip()
        },
        Expr::Exp(base, exp) => power(base, exp, env, prec)?,
        Expr::RootOf(repr, minpoly) => rootof(repr, minpoly, env, prec)?,
    };

    (value.real().is_finite() && value.imag().is_finite()).then_some(value)
}

fn evaluate_primary(primary: &Primary, env: &Env, prec: u32) -> Option<Complex> {
    Some(match primary {
        Primary::Integer(n) => Complex::with_val(prec, n),
        Primary::Rational(r) => complex_from_rational(r, prec),
        Primary::Complex(re, im) => Complex::with_val(
            prec,
            (Float::with_val(prec, re), Float::with_val(prec, im)),
        ),
        Primary::Symbol(name) => complex_from_rational(env.get(name)?, prec),
        Primary::Call(name, args) => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, env, prec))
                .collect::<Option<Vec<_>>>()?;
            call(name, args)?
        },
        Primary::Infinity | Primary::Undefined => return None,
    })
}

/// The principal value of `base^exp`. Integer exponents are applied exactly.
fn power(base: &Expr, exp: &Expr, env: &Env, prec: u32) -> Option<Complex> {
    let b = evaluate(base, env, prec)?;
    if let Some(n) = exp.as_integer() {
        if b.is_zero() && n.cmp0().is_lt() {
            return None;
        }
        return Some(b.pow(n));
    }

    let e = evaluate(exp, env, prec)?;
    if b.is_zero() {
        return (*e.real() > 0).then(|| Complex::new(prec));
    }
    Some(b.pow(&e))
}

/// The value of a `rootof` node: `repr` at the conventional root of `minpoly`.
fn rootof(repr: &[Expr], minpoly: &[Expr], env: &Env, prec: u32) -> Option<Complex> {
    let mut coeffs = minpoly
        .iter()
        .map(|c| evaluate(c, env, prec))
        .collect::<Option<Vec<_>>>()?;
    coeffs.reverse();

    let mut roots = complex_roots(&coeffs, prec);
    sort_by_real_part(&mut roots);
    let root = roots.into_iter().next()?;

    let mut acc = Complex::new(prec);
    for c in repr {
        acc *= &root;
        acc += evaluate(c, env, prec)?;
    }
    Some(acc)
}

/// The functions the evaluator knows, all on their principal branch.
fn call(name: &str, mut args: Vec<Complex>) -> Option<Complex> {
    if name == "log" && args.len() == 2 {
        let base = args.pop()?.ln();
        let value = args.pop()?.ln();
        return (!base.is_zero()).then(|| value / base);
    }
    if args.len() != 1 {
        return None;
    }

    let x = args.pop()?;
    let prec = x.prec().0;
    Some(match name {
        "sqrt" => x.sqrt(),
        "exp" => x.exp(),
        "ln" | "log" if x.is_zero() => return None,
        "ln" | "log" => x.ln(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" => x.asin(),
        "acos" => x.acos(),
        "atan" => x.atan(),
        "sinh" => x.sinh(),
        "cosh" => x.cosh(),
        "tanh" => x.tanh(),
        "abs" => Complex::with_val(prec, x.abs_ref()),
        _ => return None,
    })
}

/// Calls `f` at increasing precision until two consecutive values agree within the tolerance,
/// and returns the more precise one.
///
/// The precision starts at 64 bits and doubles up to the maximum precision. Returns [`None`] if
/// `f` fails or the values never agree.
pub fn until_stable(
    options: &NormalOptions,
    f: impl Fn(u32) -> Option<Complex>,
) -> Option<Complex> {
    let mut prec = START_PRECISION;
    let mut previous = f(prec)?;
    while prec < options.max_precision {
        prec = (prec * 2).min(options.max_precision);
        let current = f(prec)?;
        if approx_eq(&previous, &current, options.tolerance) {
            trace!(prec, "numeric value stable");
            return Some(current);
        }
        previous = current;
    }
    None
}

/// [`evaluate`] at increasing precision until the value is stable.
pub fn evaluate_until_stable(expr: &Expr, env: &Env, options: &NormalOptions) -> Option<Complex> {
    until_stable(options, |prec| evaluate(expr, env, prec))
}
