//! Closed forms of numbers in the constant field `Q(δ)`.
//!
//! A number `c(δ)` is written, trying in order:
//!
//! 1. as a rational;
//! 2. as `u ± w*sqrt(r)` when `c^2 = a*c + b` for rationals `a` and `b`, with a squarefree
//!    integer `r` and `sqrt(-1)` written `i`;
//! 3. in the basis of power products of the numbers that were adjoined to build `δ`, found by an
//!    exact linear solve;
//! 4. as a `rootof` node.

use super::Term;
use crate::{
    branch::Valuation,
    engine::Engine,
    expr::Expr,
    numeric::{evaluate, Env},
};
use cas_poly::{
    factor_containing,
    primitive::{approx_eq, complex_from_rational, extract_power},
    resultant,
    roots::{roots, sort_by_real_part},
    Poly,
    UniPoly,
};
use rug::{Complex, Integer, Rational};
use std::{cmp::Reverse, collections::BTreeSet};
use tracing::trace;

impl Engine<'_> {
    /// Writes the constant `c`, a polynomial in the primitive generator, as a list of terms.
    pub(super) fn closed_form(&mut self, c: &Poly) -> Vec<Term> {
        if let Some(r) = c.as_constant() {
            return vec![(r, Vec::new())];
        }
        let Some(delta) = self.tower.primitive() else {
            return vec![(Rational::from(1), vec![self.tower.raw_expr(c)])];
        };

        if let Some(terms) = self.quadratic_form(c, delta) {
            return terms;
        }
        if let Some(terms) = self.basis_form(c, delta) {
            return terms;
        }
        trace!(%c, "no radical closed form");
        self.rootof_form(c, delta)
    }

    fn quadratic_form(&mut self, c: &Poly, delta: usize) -> Option<Vec<Term>> {
        let square = self.tower.reduce(&c.pow(2));
        let j = c.degree_in(delta);
        let lead = c.coefficient_in(delta, j).as_constant()?;
        let a = square.coefficient_in(delta, j).as_constant()? / lead;
        let b = (&square - &c.scale(&a)).as_constant()?;

        let u = a / 2u32;
        let disc = Rational::from(&u * &u) + b;
        let (numer, denom) = disc.into_numer_denom();
        let (s, r) = extract_power(&(numer * &denom), 2);
        if r == 1 {
            return None;
        }
        let w = Rational::from((s, denom));
        let root = if r == -1 { Expr::imaginary() } else { Expr::int(r).sqrt() };

        let subject = self.tower.raw_expr(c);
        let tower = &self.tower;
        let target = |env: &Env, prec: u32| tower.eval(c, env, prec);
        let plus = |env: &Env, prec: u32| signed(&u, &w, &root, env, prec);
        let minus = |env: &Env, prec: u32| signed(&u, &-w.clone(), &root, env, prec);
        let candidates: [Valuation; 2] = [&plus, &minus];
        let selection = self.selector.select(
            &subject,
            &BTreeSet::new(),
            self.options,
            &mut *self.sink,
            &target,
            &candidates,
        );

        let w = if selection.index == 0 { w } else { -w };
        let mut terms = Vec::with_capacity(2);
        if u.cmp0().is_ne() {
            terms.push((u, Vec::new()));
        }
        terms.push((w, vec![root]));
        Some(terms)
    }

    fn basis_form(&mut self, c: &Poly, delta: usize) -> Option<Vec<Term>> {
        let degree = self.tower.extension(delta)?.minpoly.degree_in(delta) as usize;
        let sources: Vec<(Expr, Poly, usize)> = self
            .tower
            .sources
            .iter()
            .filter(|source| source.degree > 1)
            .map(|source| (source.expr.clone(), self.tower.refresh(&source.image), source.degree))
            .filter(|(_, image, _)| image.variables().into_iter().all(|v| v == delta))
            .collect();
        if sources.is_empty() {
            return None;
        }

        let mut exponents: Vec<Vec<u32>> = vec![Vec::new()];
        for (_, _, d) in &sources {
            let d = *d as u32;
            exponents = exponents
                .into_iter()
                .flat_map(|e| {
                    (0..d).map(move |k| {
                        let mut e = e.clone();
                        e.push(k);
                        e
                    })
                })
                .collect();
        }
        if exponents.len() != degree {
            return None;
        }
        exponents.sort_by_key(|e| (e.iter().sum::<u32>(), Reverse(e.clone())));

        let dim = self.tower.dim();
        let mut columns = Vec::with_capacity(degree);
        for e in &exponents {
            let mut value = Poly::one(dim);
            for ((_, image, _), &k) in sources.iter().zip(e) {
                if k > 0 {
                    value = self.tower.reduce(&(&value * &image.pow(k)));
                }
            }
            columns.push(coordinates(&value, delta, degree)?);
        }
        let coords = solve(&columns, &coordinates(c, delta, degree)?)?;

        let mut terms = Vec::new();
        for (e, x) in exponents.iter().zip(coords) {
            if x.cmp0().is_eq() {
                continue;
            }
            let (multiplier, mut factors) = basis_element(&sources, e);
            factors.sort_by_cached_key(factor_key);
            terms.push((x * multiplier, factors));
        }
        // the sources are in adjoin order, which depends on how the input was written
        terms.sort_by_cached_key(|(_, factors)| {
            (factors.len(), factors.iter().map(factor_key).collect::<Vec<_>>())
        });
        Some(terms)
    }

    /// `rootof([1, 0], f)` when `c` is the convention root of its minimal polynomial `f`, else
    /// `rootof(c, M)` when `δ` is the convention root of its own, else `c` over the expression
    /// `δ` was built from.
    fn rootof_form(&mut self, c: &Poly, delta: usize) -> Vec<Term> {
        let fallback = vec![(Rational::from(1), vec![self.tower.raw_expr(c)])];
        let Some(minpoly) = self.tower.extension(delta).map(|ext| ext.minpoly.clone()) else {
            return fallback;
        };
        let prec = self.options.precision;
        let env = Env::new();
        let (Some(approx), Some(delta_approx)) = (
            self.tower.eval(c, &env, prec),
            self.tower.eval(&self.tower.var(delta), &env, prec),
        ) else {
            return fallback;
        };

        // the minimal polynomial of c is a factor of Res_δ(M(δ), z - c(δ))
        let z = self.tower.dim();
        let shifted = &Poly::var(z, z + 1) - &c.embed(z + 1);
        let res = resultant(&minpoly.embed(z + 1), &shifted, delta);
        let own = UniPoly::from_poly(&res, z).and_then(|u| {
            factor_containing(&u, &approx, prec, self.options.max_extension_degree)
        });
        if let Some(f) = own {
            if self.is_convention_root(&f, &approx) {
                let key = Expr::RootOf(vec![Expr::int(1), Expr::int(0)], coefficient_exprs(&f.primitive()));
                return vec![(Rational::from(1), vec![key])];
            }
        }

        if let (Some(m), Some(repr)) = (UniPoly::from_poly(&minpoly, delta), UniPoly::from_poly(c, delta)) {
            if self.is_convention_root(&m, &delta_approx) {
                let node = Expr::RootOf(coefficient_exprs(&repr), coefficient_exprs(&m.primitive()));
                return vec![(Rational::from(1), vec![node])];
            }
        }
        fallback
    }

    fn is_convention_root(&self, f: &UniPoly, approx: &Complex) -> bool {
        let mut rts = roots(f, self.options.precision);
        sort_by_real_part(&mut rts);
        rts.first()
            .map_or(false, |first| approx_eq(first, approx, self.options.tolerance))
    }
}

/// `u + w*root` at `env`.
fn signed(u: &Rational, w: &Rational, root: &Expr, env: &Env, prec: u32) -> Option<Complex> {
    let root = evaluate(root, env, prec)?;
    Some(complex_from_rational(u, prec) + complex_from_rational(w, prec) * root)
}

/// The coefficients of `p` in `1, δ, ..., δ^(n-1)`, if `p` only uses `δ` below degree `n`.
fn coordinates(p: &Poly, delta: usize, n: usize) -> Option<Vec<Rational>> {
    if p.degree_in(delta) as usize >= n.max(1) {
        return None;
    }
    (0..n)
        .map(|k| p.coefficient_in(delta, k as u32).as_constant())
        .collect()
}

/// Solves `sum(x_j * columns[j]) = target` exactly. Returns [`None`] for a singular system.
fn solve(columns: &[Vec<Rational>], target: &[Rational]) -> Option<Vec<Rational>> {
    let n = target.len();
    let mut rows: Vec<Vec<Rational>> = (0..n)
        .map(|i| {
            let mut row: Vec<Rational> = columns.iter().map(|col| col[i].clone()).collect();
            row.push(target[i].clone());
            row
        })
        .collect();

    for col in 0..n {
        let pivot = (col..n).find(|&r| rows[r][col].cmp0().is_ne())?;
        rows.swap(col, pivot);
        let inv = rows[col][col].clone().recip();
        for k in col..=n {
            rows[col][k] *= &inv;
        }
        for r in 0..n {
            if r == col || rows[r][col].cmp0().is_eq() {
                continue;
            }
            let factor = rows[r][col].clone();
            for k in col..=n {
                let step = Rational::from(&factor * &rows[col][k]);
                rows[r][k] -= step;
            }
        }
    }
    Some(rows.into_iter().map(|mut row| row.pop().unwrap_or_default()).collect())
}

/// The basis element with exponents `exps` over `sources`, as a rational multiplier and factors.
/// Square roots of integers are combined into one when at most one radicand is negative.
fn basis_element(sources: &[(Expr, Poly, usize)], exps: &[u32]) -> (Rational, Vec<Expr>) {
    let mut radicands = Vec::new();
    let mut others = Vec::new();
    for ((expr, _, _), &k) in sources.iter().zip(exps) {
        if k == 0 {
            continue;
        }
        match expr {
            Expr::Exp(base, exp) => match (base.as_integer(), exp.as_rational()) {
                (Some(n), Some(r)) if k == 1 && r == Rational::from((1, 2)) => radicands.push(n.clone()),
                (_, Some(r)) => others.push(rational_power((**base).clone(), r * k)),
                _ => others.push(expr.clone().pow(Expr::int(k))),
            },
            _ if k == 1 => others.push(expr.clone()),
            _ => others.push(expr.clone().pow(Expr::int(k))),
        }
    }

    let mut multiplier = Rational::from(1);
    let mut factors = Vec::new();
    let negatives = radicands.iter().filter(|n| n.cmp0().is_lt()).count();
    if radicands.len() > 1 && negatives <= 1 {
        let product = radicands.iter().fold(Integer::from(1), |acc, n| acc * n);
        let (s, r) = extract_power(&product, 2);
        multiplier = Rational::from(s);
        if r == -1 {
            factors.push(Expr::imaginary());
        } else if r != 1 {
            factors.push(Expr::int(r).sqrt());
        }
    } else {
        factors.extend(radicands.into_iter().map(|n| Expr::int(n).sqrt()));
    }
    factors.extend(others);
    (multiplier, factors)
}

/// Orders basis factors by value rather than by adjoin order: integer radicands by radicand and
/// then exponent, ahead of everything else.
fn factor_key(factor: &Expr) -> (u8, Integer, Rational, String) {
    if let Expr::Primary(crate::expr::Primary::Complex(re, im)) = factor {
        if re.cmp0().is_eq() && *im == 1 {
            return (0, Integer::from(-1), Rational::from((1, 2)), String::new());
        }
    }
    if let Expr::Exp(base, exp) = factor {
        if let (Some(n), Some(r)) = (base.as_integer(), exp.as_rational()) {
            return (0, n.clone(), r, String::new());
        }
    }
    (1, Integer::new(), Rational::new(), factor.to_string())
}

/// `base^r`, written as an integer power when `r` is an integer.
fn rational_power(base: Expr, r: Rational) -> Expr {
    if r == 1 {
        base
    } else {
        base.pow(Expr::rational(r))
    }
}

/// The coefficients of `u` as literals, highest degree first.
fn coefficient_exprs(u: &UniPoly) -> Vec<Expr> {
    u.coeffs().iter().rev().map(|c| Expr::rational(c.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ctxt::NormalOptions, parse::parse};

    use pretty_assertions::assert_eq;

    fn rendered(src: &str) -> String {
        let options = NormalOptions::default();
        let mut sink = Vec::<crate::diagnostic::Diagnostic>::new();
        let mut engine = Engine::new(&options, &mut sink);
        let frac = engine.lower(&parse(src).unwrap(), &[]).unwrap();
        engine.render(&frac).to_string()
    }

    #[test]
    fn linear_solve() {
        let r = |n: i64| Rational::from(n);
        // x + y = 3, x - y = 1
        let columns = vec![vec![r(1), r(1)], vec![r(1), r(-1)]];
        assert_eq!(solve(&columns, &[r(3), r(1)]), Some(vec![r(2), r(1)]));

        let singular = vec![vec![r(1), r(2)], vec![r(2), r(4)]];
        assert_eq!(solve(&singular, &[r(1), r(1)]), None);
    }

    #[test]
    fn radicands_combine() {
        let sources = vec![
            (Expr::int(2).sqrt(), Poly::zero(0), 2),
            (Expr::int(6).sqrt(), Poly::zero(0), 2),
        ];
        let (multiplier, factors) = basis_element(&sources, &[1, 1]);
        assert_eq!(multiplier, Rational::from(2));
        assert_eq!(factors, vec![Expr::int(3).sqrt()]);

        let negative = vec![
            (Expr::int(-1).sqrt(), Poly::zero(0), 2),
            (Expr::int(-3).sqrt(), Poly::zero(0), 2),
        ];
        let (multiplier, factors) = basis_element(&negative, &[1, 1]);
        assert_eq!(multiplier, Rational::from(1));
        assert_eq!(factors.len(), 2);
    }

    #[test]
    fn cube_roots_use_the_basis() {
        assert_eq!(rendered("2^(1/3)*2^(1/3)"), "2^(2/3)");
        assert_eq!(rendered("(2^(1/3))^3"), "2");
    }

    #[test]
    fn nested_radical_uses_the_source_basis() {
        assert_eq!(rendered("sqrt(1 + sqrt(2))"), "sqrt(sqrt(2) + 1)");
        assert_eq!(rendered("sqrt(1 + sqrt(2))^2"), "1 + sqrt(2)");
    }
}
