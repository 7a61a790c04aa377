//! Adjoining constant algebraic numbers to the tower.
//!
//! Every constant algebraic number lives in the field `Q(δ)` of the primitive generator `δ`. A new
//! number `β` is first looked up among the numbers already adjoined. Otherwise, for a small shift
//! `k`, `γ = β + k·δ` generates the compositum `Q(δ, β)`. The minimal polynomial of `γ` is the
//! irreducible factor of `R(z) = Res_y(M(y), f(z - k·y, y))` vanishing at `γ`, where `M` is the
//! minimal polynomial of `δ` and `f` the one of `β`. Then `δ` is the root of the linear gcd of
//! `M(y)` and `f(γ - k·y, y)` over `Q(γ)`, which gives `δ = G(γ)` and `β = γ - k·G(γ)`. The old
//! generator is retired with the substitution `G`.
//!
//! A compositum above [`NormalOptions::max_extension_degree`] is not formed. The number is stacked
//! as its own generator over `Q(δ)` instead, so it does not cancel against the rest of the field.
//!
//! [`NormalOptions::max_extension_degree`]: crate::ctxt::NormalOptions::max_extension_degree

use crate::{
    diagnostic::Diagnostic,
    engine::{Engine, Inversion},
    expr::Expr,
    tower::{ext, Extension, MergeRecord, Primitive, Shape, Source},
};
use cas_poly::{
    factor_containing,
    factor_containing_multiple,
    primitive::{approx_eq, complex_from_rational},
    resultant,
    Poly,
    UniPoly,
};
use rug::{Complex, Rational};
use tracing::debug;

/// The shifts `k` tried for a merge, in order.
const SHIFTS: [i64; 12] = [1, -1, 2, -2, 3, -3, 4, -4, 5, -5, 6, -6];

impl Engine<'_> {
    /// Adjoins the constant algebraic number `expr` and returns it as a polynomial in the constant
    /// generators.
    ///
    /// `f` is a polynomial that vanishes at the number, in the scratch generator `t`, which must
    /// be [`Tower::dim`], with coefficients in the constant generators. `approx` is the number's
    /// numeric value at the working precision.
    ///
    /// [`Tower::dim`]: crate::tower::Tower::dim
    pub(crate) fn adjoin_constant(&mut self, f: &Poly, t: usize, approx: &Complex, expr: &Expr) -> Poly {
        let f = self.tower.refresh(f);
        if let Some(image) = self.reuse(&f, t, approx) {
            debug!(%expr, %image, "constant already in the field");
            return image;
        }

        let others = f.variables().into_iter().any(|v| v != t && Some(v) != self.tower.primitive());
        let primitive = match &self.tower.primitive {
            Some(primitive) if !others => primitive.clone(),
            Some(_) => return self.stack(&f, t, approx, expr),
            None if others => return self.stack(&f, t, approx, expr),
            None => return self.adjoin_first(&f, t, approx, expr),
        };

        for k in SHIFTS {
            match self.try_merge(&f, t, approx, expr, &primitive, k) {
                Merge::Done(image) => return image,
                Merge::Retry => continue,
                Merge::TooLarge(degree) => {
                    self.emit(Diagnostic::ExtensionTooLarge {
                        degree,
                        limit: self.options.max_extension_degree,
                    });
                    return self.stack(&f, t, approx, expr);
                },
                Merge::Stack => break,
            }
        }
        self.stack(&f, t, approx, expr)
    }

    /// An adjoined number with the same value that is a root of `f`.
    fn reuse(&self, f: &Poly, t: usize, approx: &Complex) -> Option<Poly> {
        self.tower.sources.iter().find_map(|source| {
            if !approx_eq(&source.approx, approx, self.options.tolerance) {
                return None;
            }
            let image = self.tower.refresh(&source.image);
            self.tower.reduce(&f.substitute(t, &image)).is_zero().then_some(image)
        })
    }

    /// Adjoins the first constant number, which becomes the primitive generator.
    fn adjoin_first(&mut self, f: &Poly, t: usize, approx: &Complex, expr: &Expr) -> Poly {
        let Some(u) = UniPoly::from_poly(f, t) else {
            return self.stack(f, t, approx, expr);
        };
        let g = factor_containing(&u, approx, self.options.precision, self.options.max_extension_degree)
            .unwrap_or_else(|| u.squarefree_part().monic());
        let dim = self.tower.dim();
        if g.degree() == 1 {
            let image = Poly::constant(-g.coeffs()[0].clone(), dim);
            debug!(%expr, %image, "constant is rational");
            return image;
        }

        let var = self.tower.push_extension(Extension {
            minpoly: g.to_poly(t, t + 1),
            origin: expr.clone(),
            shape: Shape::Primitive,
        });
        let image = self.tower.var(var);
        self.tower.primitive = Some(Primitive { var, approx: approx.clone() });
        self.tower.sources.push(Source {
            expr: expr.clone(),
            image: image.clone(),
            approx: approx.clone(),
            degree: g.degree(),
        });
        image
    }

    /// Merges `β` into the primitive generator `δ` with the shift `k`.
    fn try_merge(
        &mut self,
        f: &Poly,
        t: usize,
        approx: &Complex,
        expr: &Expr,
        primitive: &Primitive,
        k: i64,
    ) -> Merge {
        let delta = primitive.var;
        let Some(minpoly) = self.tower.extension(delta).map(|ext| ext.minpoly.clone()) else {
            return Merge::Stack;
        };
        let y = t + 1;
        let dim = t + 2;
        let shift = Rational::from(k);
        let yv = Poly::var(y, dim);
        let z_minus_ky = &Poly::var(t, dim) - &yv.scale(&shift);

        let m_y = minpoly.substitute(delta, &yv).embed(dim);
        let f_y = f.substitute(delta, &yv).substitute(t, &z_minus_ky).embed(dim);
        let res = resultant(&m_y, &f_y, y);
        let Some(r) = UniPoly::from_poly(&res, t) else {
            return Merge::Stack;
        };
        if r.is_zero() || r.squarefree_part().degree() != r.degree() {
            debug!(k, "resultant not squarefree, trying another shift");
            return Merge::Retry;
        }

        let prec = self.options.precision;
        let target = Complex::with_val(
            prec,
            approx + Complex::with_val(prec, &primitive.approx * complex_from_rational(&shift, prec)),
        );
        // Q(γ) contains Q(δ), so the degree of γ is a multiple of the degree of δ
        let degree_m = minpoly.degree_in(delta) as usize;
        let Some(g) = factor_containing_multiple(
            &r,
            &target,
            prec,
            self.options.max_extension_degree,
            degree_m,
        ) else {
            debug!(k, degree = r.degree(), "compositum too large");
            return Merge::TooLarge(r.degree());
        };

        if g.degree() == degree_m {
            // β is already in Q(δ): it is the common root of f(t) and g(t + k*δ)
            let g_shifted = g
                .to_poly(t, t + 1)
                .substitute(t, &(&Poly::var(t, t + 1) + &self.tower.var(delta).scale(&shift)));
            let rels = self.tower.relations();
            return match linear_root(f, &g_shifted, t, &rels) {
                Some(image) => {
                    debug!(k, %expr, %image, "constant lies in the primitive field");
                    self.tower.sources.push(Source {
                        expr: expr.clone(),
                        image: image.clone(),
                        approx: approx.clone(),
                        degree: 1,
                    });
                    Merge::Done(image)
                },
                None => Merge::Retry,
            };
        }
        debug!(k, degree = g.degree(), %expr, "merging constant into the primitive element");

        // δ is the root of the gcd of M(y) and f(z - k*y, y) over Q(z) = Q[z]/g(z)
        let rels = vec![(t, g.to_poly(t, dim))];
        let Some(substitution) = linear_root(&m_y, &f_y, y, &rels) else {
            debug!(k, "gcd over the compositum is not linear");
            return Merge::Retry;
        };

        let origin = expr.clone() + Expr::product(vec![Expr::int(k), self.primitive_origin(delta)]);
        let gamma = self.tower.push_extension(Extension {
            minpoly: g.to_poly(t, t + 1),
            origin,
            shape: Shape::Primitive,
        });
        debug_assert_eq!(gamma, t);
        self.tower.retire(delta, gamma, substitution.embed(gamma + 1));
        let image = self.tower.reduce(&(&self.tower.var(gamma) - &substitution.scale(&shift)));

        self.tower.primitive = Some(Primitive { var: gamma, approx: target });
        self.tower.merges.push(MergeRecord {
            retired: delta,
            merged: gamma,
            shift: k,
            substitution: substitution.embed(gamma + 1),
            degree: g.degree(),
        });
        self.tower.sources.push(Source {
            expr: expr.clone(),
            image: image.clone(),
            approx: approx.clone(),
            degree: g.degree() / degree_m.max(1),
        });
        Merge::Done(image)
    }

    /// The origin expression of the primitive generator.
    fn primitive_origin(&self, delta: usize) -> Expr {
        self.tower.extension(delta).map_or_else(|| Expr::int(0), |ext| ext.origin.clone())
    }

    /// Adjoins `β` as its own generator over the constant field.
    fn stack(&mut self, f: &Poly, t: usize, approx: &Complex, expr: &Expr) -> Poly {
        let lc = f.leading_coefficient_in(t);
        let monic = match lc.as_constant() {
            Some(c) if c.cmp0().is_ne() => f.scale(&c.recip()),
            _ => match self.invert_poly(&lc) {
                Inversion::Inverse(m, e) => match e.as_constant() {
                    Some(e) if e.cmp0().is_ne() => self.tower.reduce(&(f * &m)).scale(&e.recip()),
                    _ => f.clone(),
                },
                _ => f.clone(),
            },
        };
        debug!(%expr, minpoly = %monic, "stacking constant extension");
        let var = self.tower.push_extension(Extension {
            minpoly: monic.embed(t + 1),
            origin: expr.clone(),
            shape: Shape::Stacked,
        });
        let image = self.tower.var(var);
        self.tower.sources.push(Source {
            expr: expr.clone(),
            image: image.clone(),
            approx: approx.clone(),
            degree: monic.degree_in(t) as usize,
        });
        image
    }
}

/// The root of the linear gcd of `a` and `b` in `var`, over the field given by `rels`. Returns
/// [`None`] if the gcd is not linear.
fn linear_root(a: &Poly, b: &Poly, var: usize, rels: &[(usize, Poly)]) -> Option<Poly> {
    let mut r0 = ext::reduce(a, rels);
    let mut r1 = ext::reduce(b, rels);
    if r0.degree_in(var) < r1.degree_in(var) {
        std::mem::swap(&mut r0, &mut r1);
    }
    loop {
        if r1.is_zero() || r1.degree_in(var) == 0 {
            return None;
        }
        let rem = ext::reduce(&r0.pseudo_div(&r1, var).remainder, rels);
        if rem.is_zero() {
            break;
        }
        r0 = std::mem::replace(&mut r1, rem.primitive_integer().1);
    }
    if r1.degree_in(var) != 1 {
        return None;
    }

    let (m, e) = ext::invert(&r1.coefficient_in(var, 1), rels).ok()?;
    let e = e.as_constant().filter(|e| e.cmp0().is_ne())?;
    let root = -&(&r1.coefficient_in(var, 0) * &m);
    Some(ext::reduce(&root.scale(&e.recip()), rels))
}

/// The outcome of one merge attempt.
enum Merge {
    Done(Poly),
    Retry,
    TooLarge(usize),
    Stack,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ctxt::NormalOptions, numeric::Env};
    use assert_float_eq::assert_float_absolute_eq;
    use cas_poly::primitive::rat;

    use pretty_assertions::assert_eq;

    /// Adjoins the principal square root of `n`.
    fn adjoin_sqrt(engine: &mut Engine, n: i64) -> Poly {
        let t = engine.tower.dim();
        let tv = Poly::var(t, t + 1);
        let f = &tv.pow(2) - &Poly::constant(n, t + 1);
        let approx = Complex::with_val(engine.options.precision, n).sqrt();
        engine.adjoin_constant(&f, t, &approx, &Expr::int(n).sqrt())
    }

    fn value(engine: &Engine, p: &Poly) -> f64 {
        engine.tower.eval(p, &Env::new(), 128).unwrap().real().to_f64()
    }

    #[test]
    fn first_constant_becomes_primitive() {
        let options = NormalOptions::default();
        let mut sink = Vec::<Diagnostic>::new();
        let mut engine = Engine::new(&options, &mut sink);
        let sqrt2 = adjoin_sqrt(&mut engine, 2);
        assert_eq!(engine.tower.primitive(), Some(0));
        assert_eq!(sqrt2, Poly::var(0, 1));

        let again = adjoin_sqrt(&mut engine, 2);
        assert_eq!(again, sqrt2);

        // 4^(1/2) is rational
        let t = engine.tower.dim();
        let f = &Poly::var(t, t + 1).pow(2) - &Poly::constant(4, t + 1);
        let two = engine.adjoin_constant(&f, t, &Complex::with_val(256, 2), &Expr::int(4).sqrt());
        assert_eq!(two, Poly::constant(2, 1));
    }

    #[test]
    fn merge_is_sound() {
        let options = NormalOptions::default();
        let mut sink = Vec::<Diagnostic>::new();
        let mut engine = Engine::new(&options, &mut sink);
        let sqrt2 = adjoin_sqrt(&mut engine, 2);
        let sqrt3 = adjoin_sqrt(&mut engine, 3);

        let record = &engine.tower.merges()[0];
        assert_eq!((record.retired, record.degree), (0, 4));
        assert!(engine.tower.check_sources(&options));

        assert_float_absolute_eq!(value(&engine, &sqrt2), 2f64.sqrt(), 1e-12);
        assert_float_absolute_eq!(value(&engine, &sqrt3), 3f64.sqrt(), 1e-12);

        // sqrt(2) * sqrt(3) squared is 6
        let product = engine.tower.reduce(&(&sqrt2 * &sqrt3));
        assert_eq!(engine.tower.reduce(&product.pow(2)), Poly::constant(6, engine.tower.dim()));

        // sqrt(6) is already in Q(sqrt(2), sqrt(3))
        let sqrt6 = adjoin_sqrt(&mut engine, 6);
        assert_eq!(sqrt6, product);
        assert_eq!(engine.tower.merges().len(), 1);
        assert_eq!(engine.tower.sources().iter().map(|s| s.degree).product::<usize>(), 4);
        assert!(sink.is_empty());
    }

    #[test]
    fn large_compositum_is_stacked() {
        let options = NormalOptions { max_extension_degree: 2, ..Default::default() };
        let mut sink = Vec::<Diagnostic>::new();
        let mut engine = Engine::new(&options, &mut sink);
        let sqrt2 = adjoin_sqrt(&mut engine, 2);
        let sqrt3 = adjoin_sqrt(&mut engine, 3);
        assert!(engine.tower.merges().is_empty());
        assert_eq!(engine.tower.extension(1).map(|ext| ext.shape.clone()), Some(Shape::Stacked));
        assert_float_absolute_eq!(value(&engine, &sqrt3), 3f64.sqrt(), 1e-12);
        assert_eq!(engine.tower.reduce(&sqrt2.pow(2)), Poly::constant(rat(2, 1), 2));
        drop(engine);
        assert_eq!(sink, vec![Diagnostic::ExtensionTooLarge { degree: 4, limit: 2 }]);
    }

    #[test]
    fn fifth_square_root_stops_at_the_bound() {
        let options = NormalOptions::default();
        let mut sink = Vec::<Diagnostic>::new();
        let mut engine = Engine::new(&options, &mut sink);
        for n in [2, 3, 5, 7] {
            adjoin_sqrt(&mut engine, n);
        }
        assert_eq!(engine.tower.merges().len(), 3);
        let delta = engine.tower.primitive().unwrap();
        assert_eq!(engine.tower.extension(delta).unwrap().minpoly.degree_in(delta), 16);

        // only a factor of degree 16 is admissible, and that search is too large to finish
        let sqrt11 = adjoin_sqrt(&mut engine, 11);
        assert_eq!(engine.tower.merges().len(), 3);
        assert_float_absolute_eq!(value(&engine, &sqrt11), 11f64.sqrt(), 1e-12);
        assert_eq!(engine.tower.primitive(), Some(delta));
        drop(engine);
        assert_eq!(sink, vec![Diagnostic::ExtensionTooLarge { degree: 32, limit: 16 }]);
    }
}
