//! Lowering of expressions to canonical fractions.
//!
//! A top-level conversion runs in four steps:
//!
//! 1. [`Engine::prepare`] rewrites the known algebraic calls (`sqrt`, `cbrt`, `root`) to powers,
//!    folds literal exponents, and normalizes the arguments of every node that stays opaque.
//! 2. The [classifier](crate::classify) lists the generators.
//! 3. The algebraic generators are converted first, constant ones before parametric ones, and
//!    cached. This makes the tower independent of where each generator occurs in the expression.
//! 4. The body is converted node by node with the fraction kernel.

mod radical;
mod rootof;

use crate::{
    classify::{classify, radical_key},
    engine::Engine,
    error::MalformedInput,
    expr::{Expr, Primary},
    kernel::Frac,
};
use cas_error::Error;
use cas_poly::{Monomial, Poly};
use rug::{ops::Pow, Complex, Integer, Rational};
use tracing::{debug, trace};

impl Engine<'_> {
    /// Converts `expr` to a canonical fraction over this engine's tower. The `hint` expressions
    /// become the first ordinary generators, in order.
    pub fn lower(&mut self, expr: &Expr, hint: &[Expr]) -> Result<Frac, Error> {
        let prepared = self.prepare(expr)?;
        let hint = hint.iter().map(|h| self.prepare(h)).collect::<Result<Vec<_>, _>>()?;
        let classification = classify(&prepared, &hint, self.options)?;

        for generator in &classification.ordinary {
            self.tower.ordinary(generator);
        }
        for demoted in &classification.demoted {
            self.incomplete(demoted);
        }
        for node in &classification.algebraic {
            trace!(expr = %node.expr, tier = node.tier, "converting algebraic generator");
            let frac = self.convert(&node.expr)?;
            self.cache.insert(node.expr.clone(), frac);
        }

        let frac = self.convert(&prepared)?;
        Ok(self.refreshed(&frac))
    }

    /// Brings `expr` into the shape the classifier expects. See the module documentation.
    pub(crate) fn prepare(&mut self, expr: &Expr) -> Result<Expr, Error> {
        Ok(match expr {
            Expr::Primary(Primary::Call(name, args)) => self.prepare_call(expr, name, args)?,
            Expr::Primary(_) => expr.clone(),
            Expr::Add(terms) => Expr::Add(self.prepare_all(terms)?),
            Expr::Mul(factors) => Expr::Mul(self.prepare_all(factors)?),
            Expr::Neg(inner) => -self.prepare(inner)?,
            Expr::Inv(inner) => self.prepare(inner)?.recip(),
            Expr::Exp(base, exp) => match fold_rational(exp) {
                Some(e) if *e.denom() == 1 => self.prepare(base)?.pow(Expr::rational(e)),
                Some(e) if self.options.extensions && *e.denom() <= self.options.max_radical_index => {
                    self.prepare(base)?.pow(Expr::rational(e))
                },
                Some(e) => self.normal_arg(base)?.pow(Expr::rational(e)),
                None => self.normal_arg(base)?.pow(self.normal_arg(exp)?),
            },
            Expr::RootOf(repr, minpoly) => {
                Expr::RootOf(self.prepare_all(repr)?, self.prepare_all(minpoly)?)
            },
        })
    }

    fn prepare_all(&mut self, items: &[Expr]) -> Result<Vec<Expr>, Error> {
        items.iter().map(|item| self.prepare(item)).collect()
    }

    fn prepare_call(&mut self, expr: &Expr, name: &str, args: &[Expr]) -> Result<Expr, Error> {
        let malformed = |reason: &str| {
            Error::unspanned(MalformedInput { expr: expr.to_string(), reason: reason.to_string() })
        };
        match (name, args) {
            ("sqrt", [arg]) => self.prepare(&arg.clone().sqrt()),
            ("cbrt", [arg]) => self.prepare(&arg.clone().pow_ratio(1, 3)),
            ("sqrt" | "cbrt", _) => Err(malformed("expected exactly one argument")),
            ("root", [arg, index]) => match index.as_integer() {
                Some(n) if *n >= 1 => {
                    let e = Rational::from((Integer::from(1), n.clone()));
                    self.prepare(&arg.clone().pow(Expr::rational(e)))
                },
                _ => Ok(Expr::call(name, vec![self.normal_arg(arg)?, self.normal_arg(index)?])),
            },
            ("root", _) => Err(malformed("expected a radicand and an index")),
            ("rootof", _) => Err(malformed("expected two coefficient lists")),
            _ => {
                let args = args.iter().map(|arg| self.normal_arg(arg)).collect::<Result<_, _>>()?;
                Ok(Expr::call(name, args))
            },
        }
    }

    /// Normalizes the argument of an opaque node with a fresh tower.
    fn normal_arg(&mut self, expr: &Expr) -> Result<Expr, Error> {
        if matches!(expr, Expr::Primary(Primary::Integer(_) | Primary::Rational(_) | Primary::Symbol(_))) {
            return Ok(expr.clone());
        }
        let mut inner = Engine::new(self.options, &mut *self.sink);
        let frac = inner.lower(expr, &[])?;
        let normal = inner.render(&frac);
        if !inner.complete {
            self.complete = false;
        }
        Ok(normal)
    }

    /// Converts one node of a prepared expression.
    pub(crate) fn convert(&mut self, expr: &Expr) -> Result<Frac, Error> {
        if let Some(cached) = self.cache.get(expr).cloned() {
            return Ok(self.refreshed(&cached));
        }

        Ok(match expr {
            Expr::Primary(Primary::Integer(n)) => Frac::constant(Rational::from(n)),
            Expr::Primary(Primary::Rational(r)) => Frac::constant(r.clone()),
            Expr::Primary(Primary::Complex(re, im)) => {
                let i = self.imaginary_unit();
                let im = self.mul(&Frac::constant(im.clone()), &i);
                self.add(&Frac::constant(re.clone()), &im)
            },
            Expr::Primary(Primary::Infinity) => Frac::infinity(false),
            Expr::Primary(Primary::Undefined) => Frac::undefined(),
            Expr::Primary(Primary::Symbol(_) | Primary::Call(..)) => self.generator(expr),
            Expr::Add(terms) => {
                let terms = terms.iter().map(|t| self.convert(t)).collect::<Result<Vec<_>, _>>()?;
                self.sum(&terms)
            },
            Expr::Mul(factors) => self.convert_product(factors)?,
            Expr::Neg(inner) => {
                let inner = self.convert(inner)?;
                self.neg(&inner)
            },
            Expr::Inv(inner) => {
                let inner = self.convert(inner)?;
                self.inv(&inner)
            },
            Expr::Exp(base, exp) => self.convert_power(expr, base, exp)?,
            Expr::RootOf(repr, minpoly) => self.convert_rootof(expr, repr, minpoly)?,
        })
    }

    /// The ordinary generator `expr`, registering it if the classifier did not see it.
    fn generator(&mut self, expr: &Expr) -> Frac {
        let var = match self.tower.find_ordinary(expr) {
            Some(var) => var,
            None => {
                debug!(%expr, "late ordinary generator");
                self.tower.ordinary(expr)
            },
        };
        Frac::integral(self.tower.var(var))
    }

    /// A polynomial over the tower as a canonical fraction.
    pub(crate) fn element(&mut self, p: &Poly) -> Frac {
        self.canonical(p, &Poly::one(0))
    }

    /// The imaginary unit: adjoined as a root of `t^2 + 1` the first time it is needed, then
    /// shared by every complex literal.
    fn imaginary_unit(&mut self) -> Frac {
        if !self.options.extensions {
            return self.generator(&Expr::imaginary());
        }
        if let Some(image) = self.tower.imaginary.clone() {
            return self.element(&image);
        }

        let t = self.tower.dim();
        let f = &Poly::var(t, t + 1).pow(2) + &Poly::one(t + 1);
        let approx = Complex::with_val(self.options.precision, (0, 1));
        let image = self.adjoin_constant(&f, t, &approx, &Expr::imaginary());
        self.tower.imaginary = Some(image.clone());
        self.element(&image)
    }

    /// Converts a product. A leading run of rational literals and integer powers of ordinary
    /// generators is collected into a single monomial first.
    fn convert_product(&mut self, factors: &[Expr]) -> Result<Frac, Error> {
        let mut coefficient = Rational::from(1);
        let mut num = Monomial::one();
        let mut den = Monomial::one();
        let mut split = 0;
        for factor in factors {
            if !self.monomial_factor(factor, &mut coefficient, &mut num, &mut den) {
                break;
            }
            split += 1;
        }

        let mut fracs = Vec::with_capacity(factors.len() - split + 1);
        if split > 0 {
            let dim = self.tower.dim();
            let (numer, denom) = coefficient.into_numer_denom();
            let num = Poly::monomial(num, numer, dim);
            let den = Poly::monomial(den, denom, dim);
            fracs.push(self.canonical(&num, &den));
        }
        for factor in &factors[split..] {
            fracs.push(self.convert(factor)?);
        }
        Ok(self.product(&fracs))
    }

    /// Folds `factor` into the running monomial if it is a nonzero rational literal or an
    /// integer power of an ordinary generator, possibly inverted.
    fn monomial_factor(
        &self,
        factor: &Expr,
        coefficient: &mut Rational,
        num: &mut Monomial,
        den: &mut Monomial,
    ) -> bool {
        let (inner, inverted) = match factor {
            Expr::Inv(inner) => (&**inner, true),
            other => (other, false),
        };
        if let Some(r) = inner.as_rational() {
            if r.cmp0().is_eq() {
                return false;
            }
            *coefficient *= if inverted { r.recip() } else { r };
            return true;
        }

        let (base, exp) = match inner {
            Expr::Exp(base, exp) => match exp.as_integer().and_then(|e| e.to_i32()) {
                Some(e) => (&**base, e),
                None => return false,
            },
            other => (other, 1),
        };
        if !matches!(base, Expr::Primary(Primary::Symbol(_) | Primary::Call(..))) {
            return false;
        }
        let Some(var) = self.tower.find_ordinary(base) else {
            return false;
        };

        let exp = if inverted { -exp } else { exp };
        let target = if exp >= 0 { num } else { den };
        *target = target.mul(&Monomial::var(var, exp.unsigned_abs()));
        true
    }

    /// Converts `base^exp`.
    fn convert_power(&mut self, expr: &Expr, base: &Expr, exp: &Expr) -> Result<Frac, Error> {
        let Some(e) = exp.as_rational() else {
            return Ok(self.generator(expr));
        };
        let (p, q) = e.into_numer_denom();
        if q == 1 {
            let base = self.convert(base)?;
            return Ok(self.pow(&base, &p));
        }

        let q = q.to_u32().unwrap_or(u32::MAX);
        let key = radical_key(base, q);
        let root = match self.cache.get(&key).cloned() {
            Some(cached) => self.refreshed(&cached),
            None => match self.tower.find_ordinary(&key) {
                Some(var) => Frac::integral(self.tower.var(var)),
                None if self.options.extensions && q <= self.options.max_radical_index => {
                    let root = self.convert_radical(base, q)?;
                    self.cache.insert(key, root.clone());
                    root
                },
                None => self.generator(&key),
            },
        };
        Ok(self.pow(&root, &p))
    }
}

/// The value of an expression built from rational literals with sums, products, negations,
/// reciprocals and integer powers.
fn fold_rational(expr: &Expr) -> Option<Rational> {
    Some(match expr {
        Expr::Primary(Primary::Integer(n)) => Rational::from(n),
        Expr::Primary(Primary::Rational(r)) => r.clone(),
        Expr::Add(terms) => {
            let mut sum = Rational::new();
            for term in terms {
                sum += fold_rational(term)?;
            }
            sum
        },
        Expr::Mul(factors) => {
            let mut product = Rational::from(1);
            for factor in factors {
                product *= fold_rational(factor)?;
            }
            product
        },
        Expr::Neg(inner) => -fold_rational(inner)?,
        Expr::Inv(inner) => {
            let value = fold_rational(inner)?;
            if value.cmp0().is_eq() {
                return None;
            }
            value.recip()
        },
        Expr::Exp(base, exp) => {
            let base = fold_rational(base)?;
            let exp = exp.as_integer()?.to_i32()?;
            if exp < 0 && base.cmp0().is_eq() {
                return None;
            }
            base.pow(exp)
        },
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ctxt::NormalOptions, diagnostic::Diagnostic, parse::parse};

    use pretty_assertions::assert_eq;

    fn prepared(src: &str, options: &NormalOptions) -> Expr {
        let mut sink = Vec::<Diagnostic>::new();
        let mut engine = Engine::new(options, &mut sink);
        engine.prepare(&parse(src).unwrap()).unwrap()
    }

    fn lowered(src: &str) -> (Frac, Vec<Diagnostic>) {
        let options = NormalOptions::default();
        let mut sink = Vec::<Diagnostic>::new();
        let mut engine = Engine::new(&options, &mut sink);
        let frac = engine.lower(&parse(src).unwrap(), &[]).unwrap();
        drop(engine);
        (frac, sink)
    }

    #[test]
    fn literal_exponents_fold() {
        let options = NormalOptions::default();
        assert_eq!(prepared("2^(1/2)", &options), Expr::int(2).sqrt());
        assert_eq!(prepared("x^(4/2)", &options), Expr::symbol("x").pow(Expr::int(2)));
        assert_eq!(prepared("root(x, 3)", &options), Expr::symbol("x").pow_ratio(1, 3));
        assert_eq!(prepared("x^(1/100)", &options).to_string(), "x^(1/100)");
    }

    #[test]
    fn opaque_arguments_are_normalized() {
        let options = NormalOptions::default();
        assert_eq!(prepared("sin((x^2 - 1)/(x - 1))", &options).to_string(), "sin(x + 1)");
        assert_eq!(prepared("2^((x^2 - 1)/(x - 1))", &options).to_string(), "2^(x + 1)");
    }

    #[test]
    fn malformed_calls() {
        let options = NormalOptions::default();
        let mut sink = Vec::<Diagnostic>::new();
        let mut engine = Engine::new(&options, &mut sink);
        let sqrt = Expr::call("sqrt", vec![Expr::int(2), Expr::int(3)]);
        let err = engine.prepare(&sqrt).unwrap_err();
        assert_eq!(err.to_string(), "malformed expression `sqrt(2, 3)`: expected exactly one argument");

        let rootof = Expr::call("rootof", vec![Expr::int(1)]);
        assert!(engine.prepare(&rootof).is_err());
    }

    #[test]
    fn monomial_prefix() {
        let (frac, sink) = lowered("3*x^2*y^-1/z");
        assert_eq!(frac.num.to_string(), "3*x0^2");
        assert_eq!(frac.den.to_string(), "x1*x2");
        assert!(sink.is_empty());
    }

    #[test]
    fn rational_fractions() {
        let (frac, _) = lowered("(x^2 - 1)/(x - 1)");
        assert_eq!(frac, Frac::integral(&Poly::var(0, 1) + &Poly::one(1)));

        let (frac, _) = lowered("1/(x - x)");
        assert!(frac.is_infinite());
        let (frac, _) = lowered("0/0");
        assert!(frac.is_undefined());
    }

    #[test]
    fn argument_order_does_not_matter() {
        let (a, _) = lowered("sqrt(3) + sqrt(2)");
        let (b, _) = lowered("sqrt(2) + sqrt(3)");
        assert_eq!(a, b);
    }

    #[test]
    fn complex_literals_share_the_imaginary_unit() {
        let (frac, _) = lowered("(1 + 2*i)*(1 - 2*i)");
        assert_eq!(frac.as_constant(), Some(Rational::from(5)));
        let (frac, _) = lowered("i^2");
        assert_eq!(frac.as_constant(), Some(Rational::from(-1)));
    }
}
