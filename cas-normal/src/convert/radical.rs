//! Radicals `b^(1/q)` on the principal branch.
//!
//! The radicand is rationalized first, `(n/d)^(1/q) = (n * d^(q-1))^(1/q) / d`. Then the `q`-th
//! powers are taken out of `m = n * d^(q-1)`:
//!
//! - a rational `m` becomes `s * r^(1/q)` with an integer `r` free of `q`-th powers;
//! - a constant algebraic `m` is adjoined through `t^q - m`;
//! - a parametric `m` is split by its squarefree decomposition into `D^q * R`, and `R^(1/q)`
//!   becomes a stacked radical generator, shared by every radical with the same `R` and `q`.
//!
//! Taking out a non-constant `D` can move the result to another branch, a `q`-th root of unity
//! times the principal one. Every rotation is checked against the principal value of the original
//! node, and the matching root of unity is adjoined when it is not `±1`.

use crate::{
    branch::Valuation,
    classify::radical_key,
    engine::Engine,
    expr::Expr,
    kernel::Frac,
    numeric::{evaluate, Env},
    tower::{Extension, GeneratorKind, Shape},
};
use cas_error::Error;
use cas_poly::{
    primitive::{complex_from_rational, extract_power},
    squarefree,
    Poly,
    UniPoly,
};
use rug::{float::Constant, ops::Pow, Complex, Float, Integer, Rational};
use tracing::debug;

impl Engine<'_> {
    /// Converts `base^(1/q)`.
    pub(super) fn convert_radical(&mut self, base: &Expr, q: u32) -> Result<Frac, Error> {
        let b = self.convert(base)?;
        if b.is_sentinel() || b.is_zero() {
            return Ok(b);
        }
        if let Some(c) = b.as_constant() {
            return Ok(self.rational_radical(&c, q));
        }

        let m = self.tower.reduce(&(&b.num * &b.den.pow(q - 1)));
        let split = split_radicand(&m, q);
        let root = match split.inside.as_constant() {
            Some(c) => self.rational_radical(&c, split.index),
            None if self.tower.is_constant(&split.inside) => {
                self.constant_radical(&split.inside, split.index)
            },
            None => self.parametric_radical(&split.inside, split.index),
        };

        let scale = self.canonical(&split.outside, &b.den);
        let value = self.mul(&scale, &root);
        let exact = split.outside.is_constant() && b.den.is_constant() && split.index == q;
        Ok(if exact { value } else { self.principal_branch(base, q, value) })
    }

    /// `c^(1/q)` for a rational `c`.
    fn rational_radical(&mut self, c: &Rational, q: u32) -> Frac {
        let (s, r) = extract_rational_power(c, q);
        if r == 1 {
            return Frac::constant(s);
        }

        let prec = self.options.precision;
        let r = Rational::from(r);
        let approx = principal_root(&complex_from_rational(&r, prec), q, prec);
        let t = self.tower.dim();
        let f = UniPoly::binomial(q as usize, r.clone()).to_poly(t, t + 1);
        let expr = Expr::rational(r).pow(Expr::rational(Rational::from((1, q))));
        let image = self.adjoin_constant(&f, t, &approx, &expr);
        let root = self.element(&image);
        self.mul(&Frac::constant(s), &root)
    }

    /// `m^(1/q)` for `m` in the constant field.
    fn constant_radical(&mut self, m: &Poly, q: u32) -> Frac {
        let prec = self.options.precision;
        let Some(value) = self.tower.eval(m, &Env::new(), prec) else {
            return self.parametric_radical(m, q);
        };
        let approx = principal_root(&value, q, prec);
        let t = self.tower.dim();
        let f = &Poly::var(t, t + 1).pow(q) - &m.embed(t + 1);
        let expr = self.tower.raw_expr(m).pow(Expr::rational(Rational::from((1, q))));
        let image = self.adjoin_constant(&f, t, &approx, &expr);
        self.element(&image)
    }

    /// `R^(1/q)` for a radicand that depends on ordinary generators, as a radical generator.
    fn parametric_radical(&mut self, radicand: &Poly, q: u32) -> Frac {
        let radicand = self.tower.reduce(radicand);
        let existing = self.tower.algebraic().iter().copied().find(|&v| {
            match self.tower.generator(v).map(|g| &g.kind) {
                Some(GeneratorKind::Extension(Extension {
                    shape: Shape::Radical { radicand: other, index },
                    ..
                })) => *index == q && self.tower.reduce(other) == radicand,
                _ => false,
            }
        });
        if let Some(var) = existing {
            return Frac::integral(self.tower.var(var));
        }

        let var = self.tower.dim();
        let minpoly = &Poly::var(var, var + 1).pow(q) - &radicand.embed(var + 1);
        let origin = self.tower.raw_expr(&radicand).pow(Expr::rational(Rational::from((1, q))));
        debug!(%origin, "adjoining radical");
        let var = self.tower.push_extension(Extension {
            minpoly,
            origin,
            shape: Shape::Radical { radicand, index: q },
        });
        Frac::integral(self.tower.var(var))
    }

    /// Picks the rotation `ζ^k * value`, with `ζ = exp(2πi/q)`, that matches the principal
    /// value of `base^(1/q)`.
    fn principal_branch(&mut self, base: &Expr, q: u32, value: Frac) -> Frac {
        let subject = radical_key(base, q);
        let symbols = base.free_symbols();
        let selection = {
            let tower = &self.tower;
            let value = &value;
            let target = |env: &Env, prec: u32| evaluate(&subject, env, prec);
            let rotations: Vec<_> = (0..q)
                .map(|k| {
                    move |env: &Env, prec: u32| {
                        Some(value.eval(tower, env, prec)? * root_of_unity(q, k, prec))
                    }
                })
                .collect();
            let candidates: Vec<Valuation> = rotations.iter().map(|f| f as Valuation).collect();
            self.selector.select(
                &subject,
                &symbols,
                self.options,
                &mut *self.sink,
                &target,
                &candidates,
            )
        };

        let k = selection.index as u32;
        if k == 0 {
            value
        } else if 2 * k == q {
            self.neg(&value)
        } else {
            let zeta = self.unit_root(q, k);
            self.mul(&value, &zeta)
        }
    }

    /// `exp(2πik/q)`, adjoined as a constant through `t^q - 1`.
    fn unit_root(&mut self, q: u32, k: u32) -> Frac {
        let prec = self.options.precision;
        let approx = root_of_unity(q, k, prec);
        let t = self.tower.dim();
        let f = UniPoly::binomial(q as usize, Rational::from(1)).to_poly(t, t + 1);
        let expr = Expr::int(-1).pow(Expr::rational(Rational::from((2 * k, q))));
        let image = self.adjoin_constant(&f, t, &approx, &expr);
        self.element(&image)
    }
}

/// A radicand `m` written as `outside^q * inside` with `inside^(1/index)` equal to
/// `(m / outside^q)^(1/q)` up to a root of unity.
#[derive(Debug)]
struct Split {
    outside: Poly,
    inside: Poly,
    index: u32,
}

fn split_radicand(m: &Poly, q: u32) -> Split {
    let dim = m.dim();
    let decomposition = squarefree(m);
    let (s, r) = extract_rational_power(&decomposition.content, q);

    let mut outside = Poly::constant(s, dim);
    let mut kept = Vec::new();
    for (f, e) in &decomposition.factors {
        if e / q > 0 {
            outside = &outside * &f.pow(e / q);
        }
        if e % q > 0 {
            kept.push((f.clone(), e % q));
        }
    }

    // (x^2)^(1/4) shares its generator with x^(1/2)
    let g = kept.iter().fold(q, |g, (_, e)| gcd_u32(g, *e));
    let (r, index) = match extract_power(&r, g) {
        (s, one) if g > 1 && !kept.is_empty() && one == 1 => {
            for (_, e) in &mut kept {
                *e /= g;
            }
            (s, q / g)
        },
        _ => (r, q),
    };

    let inside = kept
        .iter()
        .fold(Poly::constant(r, dim), |acc, (f, e)| &acc * &f.pow(*e));
    Split { outside, inside, index }
}

/// Splits `c` into `(s, r)` with `c = s^q * r`, `s > 0` and `r` an integer free of `q`-th
/// powers carrying the sign.
fn extract_rational_power(c: &Rational, q: u32) -> (Rational, Integer) {
    let (numer, denom) = c.clone().into_numer_denom();
    let scaled = numer * denom.clone().pow(q - 1);
    let (s, r) = extract_power(&scaled, q);
    (Rational::from((s, denom)), r)
}

/// The principal `q`-th root of `value`.
fn principal_root(value: &Complex, q: u32, prec: u32) -> Complex {
    if value.is_zero() {
        return value.clone();
    }
    value.clone().pow(&complex_from_rational(&Rational::from((1, q)), prec))
}

/// `exp(2πik/q)`.
fn root_of_unity(q: u32, k: u32, prec: u32) -> Complex {
    let angle = Float::with_val(prec, Constant::Pi) * (2 * k) / q;
    let (sin, cos) = angle.sin_cos(Float::new(prec));
    Complex::with_val(prec, (cos, sin))
}

fn gcd_u32(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd_u32(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assume::{Assumptions, Interval},
        ctxt::NormalOptions,
        diagnostic::Diagnostic,
        parse::parse,
    };

    use pretty_assertions::assert_eq;

    fn lowered(src: &str, options: &NormalOptions) -> (Frac, Vec<String>, Vec<Diagnostic>) {
        let mut sink = Vec::<Diagnostic>::new();
        let mut engine = Engine::new(options, &mut sink);
        let frac = engine.lower(&parse(src).unwrap(), &[]).unwrap();
        let relations = engine
            .tower()
            .relations()
            .iter()
            .map(|(_, minpoly)| minpoly.to_string())
            .collect();
        drop(engine);
        (frac, relations, sink)
    }

    #[test]
    fn integer_squares_are_extracted() {
        let (frac, relations, _) = lowered("sqrt(8)", &NormalOptions::default());
        assert_eq!(frac.num.to_string(), "2*x0");
        assert_eq!(relations, vec!["x0^2 - 2"]);

        let (frac, relations, _) = lowered("sqrt(9/4)", &NormalOptions::default());
        assert_eq!(frac.as_constant(), Some(Rational::from((3, 2))));
        assert!(relations.is_empty());
    }

    #[test]
    fn composite_index_uses_the_principal_factor() {
        let (frac, relations, _) = lowered("4^(1/4) - sqrt(2)", &NormalOptions::default());
        assert!(frac.is_zero());
        assert_eq!(relations, vec!["x0^2 - 2"]);
    }

    #[test]
    fn negative_cube_root_is_complex() {
        let (frac, relations, _) = lowered("(-8)^(1/3)", &NormalOptions::default());
        assert_eq!(frac.num.to_string(), "2*x0");
        assert_eq!(relations, vec!["x0^2 - x0 + 1"]);
    }

    #[test]
    fn radical_denominators_are_rationalized() {
        let (frac, _, _) = lowered("1/sqrt(2)", &NormalOptions::default());
        assert_eq!(frac.num.to_string(), "x0");
        assert_eq!(frac.den.to_string(), "2");
    }

    #[test]
    fn branch_of_extracted_factor() {
        let positive = NormalOptions::default()
            .with_assumptions(Assumptions::new().with("x", Interval::positive()));
        let (frac, _, sink) = lowered("sqrt(x^2)", &positive);
        assert_eq!(frac.num.to_string(), "x0");
        assert!(sink.is_empty());

        let negative = NormalOptions::default()
            .with_assumptions(Assumptions::new().with("x", Interval::negative()));
        let (frac, _, sink) = lowered("sqrt(x^2)", &negative);
        assert_eq!(frac.num.to_string(), "-x0");
        assert!(sink.is_empty());
    }

    #[test]
    fn cube_root_branch_is_a_root_of_unity() {
        let positive = NormalOptions::default()
            .with_assumptions(Assumptions::new().with("x", Interval::positive()));
        let (frac, relations, sink) = lowered("(x^3)^(1/3)", &positive);
        assert_eq!(frac.num.to_string(), "x0");
        assert!(relations.is_empty());
        assert!(sink.is_empty());

        // the principal cube root of a negative x^3 is x * exp(4πi/3)
        let negative = NormalOptions::default()
            .with_assumptions(Assumptions::new().with("x", Interval::negative()));
        let (frac, relations, sink) = lowered("(x^3)^(1/3)", &negative);
        assert_eq!(frac.num.to_string(), "x0*x1");
        assert_eq!(relations, vec!["x1^2 + x1 + 1"]);
        assert!(sink.is_empty());
    }

    #[test]
    fn rotations() {
        let z = root_of_unity(3, 1, 128);
        assert!((z.real().to_f64() + 0.5).abs() < 1e-12);
        assert!((z.imag().to_f64() - 3f64.sqrt() / 2.0).abs() < 1e-12);
        let z = root_of_unity(4, 2, 128);
        assert!((z.real().to_f64() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn unassumed_branch_warns() {
        let (_, _, sink) = lowered("sqrt(x^2)", &NormalOptions::default());
        assert!(matches!(sink.as_slice(), [Diagnostic::HeuristicBranch { .. }]));
    }

    #[test]
    fn parametric_radicals_are_shared() {
        let options = NormalOptions::default()
            .with_assumptions(Assumptions::new().with("x", Interval::positive()));
        let (frac, relations, _) = lowered("sqrt(x)*sqrt(x) + (x^2)^(1/4) - sqrt(x)", &options);
        assert_eq!(frac.num.to_string(), "x0");
        assert_eq!(relations, vec!["-x0 + x1^2"]);
    }

    #[test]
    fn splitting() {
        let x = Poly::var(0, 1);
        let m = x.pow(5).scale(&Rational::from(8));
        let split = split_radicand(&m, 2);
        assert_eq!(split.outside.to_string(), "2*x0^2");
        assert_eq!(split.inside.to_string(), "2*x0");
        assert_eq!(split.index, 2);

        let split = split_radicand(&x.pow(2).scale(&Rational::from(4)), 4);
        assert_eq!(split.inside.to_string(), "2*x0");
        assert_eq!(split.index, 2);
    }

    #[test]
    fn rational_powers() {
        assert_eq!(
            extract_rational_power(&Rational::from((-8, 27)), 3),
            (Rational::from((2, 3)), Integer::from(-1)),
        );
        assert_eq!(
            extract_rational_power(&Rational::from((1, 2)), 2),
            (Rational::from((1, 2)), Integer::from(2)),
        );
    }
}
