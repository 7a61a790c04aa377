//! `rootof(repr, minpoly)` nodes.
//!
//! The root `θ` of `minpoly` is adjoined once per minimal polynomial, under the key
//! `rootof([1, 0], minpoly)`, and `repr(θ)` is then evaluated with the fraction kernel. A
//! non-monic `a_0 θ^n + a_1 θ^(n-1) + ... + a_n` is made monic with `φ = a_0 θ`, whose minimal
//! polynomial is `φ^n + sum(a_i a_0^(i-1) φ^(n-i))`.
//!
//! Constant minimal polynomials denote the root with the largest real part, then the largest
//! imaginary part, and merge into the constant field. Parametric ones are stacked.

use crate::{
    classify::check_rootof,
    engine::Engine,
    error::MalformedInput,
    expr::Expr,
    kernel::Frac,
    numeric::{evaluate, Env},
    tower::{Extension, GeneratorKind, Shape},
};
use cas_error::Error;
use cas_poly::{
    gcd,
    roots::{complex_roots, sort_by_real_part},
    Poly,
};
use rug::Complex;
use tracing::debug;

impl Engine<'_> {
    /// Converts `rootof(repr, minpoly)`.
    pub(super) fn convert_rootof(
        &mut self,
        expr: &Expr,
        repr: &[Expr],
        minpoly: &[Expr],
    ) -> Result<Frac, Error> {
        if !self.options.extensions {
            return Ok(self.generator(expr));
        }
        check_rootof(expr, minpoly)?;

        let key = Expr::RootOf(vec![Expr::int(1), Expr::int(0)], minpoly.to_vec());
        let theta = if let Some(var) = self.tower.find_ordinary(&key) {
            Frac::integral(self.tower.var(var))
        } else if let Some(cached) = self.cache.get(&key).cloned() {
            self.refreshed(&cached)
        } else {
            let theta = self.adjoin_rootof(&key, minpoly)?;
            self.cache.insert(key.clone(), theta.clone());
            theta
        };
        if *expr == key {
            return Ok(theta);
        }

        let mut value = Frac::zero();
        for c in repr {
            let c = self.convert(c)?;
            let shifted = self.mul(&value, &theta);
            value = self.add(&shifted, &c);
        }
        Ok(value)
    }

    /// Adjoins the root of `minpoly` and returns it.
    fn adjoin_rootof(&mut self, key: &Expr, minpoly: &[Expr]) -> Result<Frac, Error> {
        let malformed = |reason: &str| {
            Error::unspanned(MalformedInput { expr: key.to_string(), reason: reason.to_string() })
        };

        let mut fracs = Vec::with_capacity(minpoly.len());
        for c in minpoly {
            let c = self.convert(c)?;
            if c.is_sentinel() {
                return Err(malformed("a coefficient is infinite or undefined"));
            }
            fracs.push(c);
        }
        if fracs[0].is_zero() {
            return Err(malformed("the minimal polynomial has a zero leading coefficient"));
        }

        // clear denominators: every coefficient times a common multiple of the denominators
        let common = fracs.iter().fold(Poly::one(self.tower.dim()), |acc, f| {
            let g = gcd(&acc, &f.den);
            let product = &acc * &f.den;
            product.div_exact(&g).unwrap_or(product)
        });
        let scale = Frac::integral(common);
        let mut coeffs = Vec::with_capacity(fracs.len());
        for f in &fracs {
            coeffs.push(self.mul(f, &scale).num);
        }

        let n = coeffs.len() - 1;
        let lc = coeffs[0].clone();
        let dim = self.tower.dim();
        let (monic, lc) = match lc.as_constant() {
            Some(c) => {
                let inv = c.recip();
                (coeffs.iter().map(|a| a.scale(&inv)).collect::<Vec<_>>(), Poly::one(dim))
            },
            None => {
                let mut monic = vec![Poly::one(dim)];
                let mut power = Poly::one(dim);
                for a in &coeffs[1..] {
                    monic.push(self.tower.reduce(&(a * &power)));
                    power = &power * &lc;
                }
                (monic, lc)
            },
        };
        // low to high for the polynomial constructors
        let low: Vec<Poly> = monic.iter().rev().cloned().collect();

        if low.iter().all(|c| self.tower.is_constant(c)) {
            if let Some(theta) = self.constant_rootof(key, &low, &lc, minpoly)? {
                return Ok(theta);
            }
        }

        let phi = self.stacked_rootof(key, &low, &lc, n);
        Ok(self.canonical(&phi, &lc))
    }

    /// Adjoins the convention root of a constant minimal polynomial to the constant field.
    /// Returns [`None`] if the coefficients cannot be evaluated.
    fn constant_rootof(
        &mut self,
        key: &Expr,
        low: &[Poly],
        lc: &Poly,
        minpoly: &[Expr],
    ) -> Result<Option<Frac>, Error> {
        let prec = self.options.precision;
        let env = Env::new();
        let mut values = Vec::with_capacity(minpoly.len());
        for c in minpoly.iter().rev() {
            let Some(value) = evaluate(c, &env, prec) else {
                return Ok(None);
            };
            values.push(value);
        }
        let mut roots = complex_roots(&values, prec);
        sort_by_real_part(&mut roots);
        let Some(root) = roots.into_iter().next() else {
            return Ok(None);
        };
        let Some(scale) = self.tower.eval(lc, &env, prec) else {
            return Ok(None);
        };
        let approx = Complex::with_val(prec, &root * &scale);

        let t = self.tower.dim();
        let f = Poly::from_coefficients(t, low, t + 1);
        let origin = if lc.is_one() {
            key.clone()
        } else {
            Expr::product(vec![self.tower.raw_expr(lc), key.clone()])
        };
        let image = self.adjoin_constant(&f, t, &approx, &origin);
        Ok(Some(self.canonical(&image, lc)))
    }

    /// Adjoins `φ` as a generator with the monic minimal polynomial `low`, or finds the one
    /// already adjoined.
    fn stacked_rootof(&mut self, key: &Expr, low: &[Poly], lc: &Poly, n: usize) -> Poly {
        let existing = self.tower.algebraic().iter().copied().find(|&v| {
            match self.tower.generator(v).map(|g| &g.kind) {
                Some(GeneratorKind::Extension(Extension { shape: Shape::RootOf, minpoly, .. })) => {
                    self.tower.refresh(minpoly) == Poly::from_coefficients(v, low, v + 1)
                },
                _ => false,
            }
        });
        if let Some(var) = existing {
            return self.tower.var(var);
        }

        let var = self.tower.dim();
        let minpoly = Poly::from_coefficients(var, low, var + 1);
        let origin = if lc.is_one() {
            key.clone()
        } else {
            Expr::product(vec![self.tower.raw_expr(lc), key.clone()])
        };
        debug!(degree = n, %minpoly, "stacking rootof");
        let var = self.tower.push_extension(Extension { minpoly, origin, shape: Shape::RootOf });
        self.tower.var(var)
    }
}
