//! Rendering canonical fractions back to expressions.
//!
//! The numerator is grouped by the monomial of its ordinary generators, in descending order with
//! the constant group last, and then by the monomial of the stacked algebraic generators. What
//! remains of each group is a polynomial in the primitive generator `δ`, which is written in
//! closed form (see [`closed`]). Rational coefficients that closed forms produce are moved into
//! the denominator, so rendering a fraction and lowering the result gives the fraction back.

mod closed;

use crate::{
    branch::Valuation,
    engine::Engine,
    expr::{Expr, Primary},
    kernel::Frac,
    numeric::{evaluate, Env},
    tower::{Extension, GeneratorKind, Shape},
};
use cas_poly::{Monomial, Poly};
use rug::{Integer, Rational};
use std::collections::BTreeMap;

/// A rendered term: a rational coefficient times a product of factors.
pub(crate) type Term = (Rational, Vec<Expr>);

impl Engine<'_> {
    /// Writes `frac` as an expression over the generators' expressions.
    pub fn render(&mut self, frac: &Frac) -> Expr {
        if frac.is_undefined() {
            return Expr::Primary(Primary::Undefined);
        }
        if frac.is_infinite() {
            let infinity = Expr::Primary(Primary::Infinity);
            return match frac.num.as_constant() {
                Some(c) if c.cmp0().is_lt() => -infinity,
                _ => infinity,
            };
        }

        let frac = self.refreshed(frac);
        let mut terms = self.terms(&frac.num);
        let mut den = frac.den.clone();

        let lcm = terms
            .iter()
            .fold(Integer::from(1), |acc, (c, _)| acc.lcm(c.denom()));
        if lcm != 1 {
            let scale = Rational::from(lcm);
            for (c, _) in &mut terms {
                *c *= &scale;
            }
            den = den.scale(&scale);
        }

        let (content, _) = den.primitive_integer();
        let common = terms
            .iter()
            .fold(content.numer().clone(), |acc, (c, _)| acc.gcd(c.numer()));
        if common > 1 {
            let scale = Rational::from((Integer::from(1), common));
            for (c, _) in &mut terms {
                *c *= &scale;
            }
            den = den.scale(&scale);
        }

        let num = Expr::sum(terms.into_iter().map(term_expr).collect());
        if den.is_one() {
            return num;
        }
        let den = self.render_poly(&den).recip();
        match num {
            Expr::Mul(mut factors) => {
                factors.push(den);
                Expr::Mul(factors)
            },
            num => Expr::Mul(vec![num, den]),
        }
    }

    /// Writes a polynomial over the tower as an expression, without moving rational
    /// coefficients anywhere.
    pub(crate) fn render_poly(&mut self, p: &Poly) -> Expr {
        let terms = self.terms(p);
        Expr::sum(terms.into_iter().map(term_expr).collect())
    }

    /// The terms of `p`, grouped as described in the module documentation.
    fn terms(&mut self, p: &Poly) -> Vec<Term> {
        let p = self.tower.refresh(p);
        let primitive = self.tower.primitive();
        let dim = self.tower.dim();

        let mut groups: BTreeMap<(Monomial, Monomial), Poly> = BTreeMap::new();
        for (m, c) in p.terms() {
            let mut ordinary = Monomial::one();
            let mut stacked = Monomial::one();
            let mut delta = Monomial::one();
            for (var, exp) in m.factors() {
                let part = match self.tower.generator(var).map(|g| &g.kind) {
                    Some(GeneratorKind::Ordinary(_)) => &mut ordinary,
                    _ if Some(var) == primitive => &mut delta,
                    _ => &mut stacked,
                };
                *part = part.with_exponent(var, exp);
            }
            let coefficient = Poly::monomial(delta, c.clone(), dim);
            let group = groups.entry((ordinary, stacked)).or_insert_with(|| Poly::zero(dim));
            *group = &*group + &coefficient;
        }

        let mut terms = Vec::new();
        for ((ordinary, stacked), c) in groups.into_iter().rev() {
            let mut factors = Vec::new();
            for (var, exp) in stacked.factors() {
                factors.push(self.stacked_factor(var, exp));
            }
            for (var, exp) in ordinary.factors() {
                let base = self.tower.var_expr(var).cloned().unwrap_or_else(|| Expr::int(0));
                factors.push(power(base, exp));
            }

            for (coefficient, basis) in self.closed_form(&c) {
                let mut term = basis;
                term.extend(factors.iter().cloned());
                terms.push((coefficient, term));
            }
        }
        terms
    }

    /// `var^exp` for an algebraic generator outside the constant field.
    fn stacked_factor(&mut self, var: usize, exp: u32) -> Expr {
        let Some(ext) = self.tower.extension(var).cloned() else {
            return Expr::int(0);
        };
        match &ext.shape {
            Shape::Radical { radicand, index } => {
                let base = self.render_poly(radicand);
                base.pow(Expr::rational(Rational::from((exp, *index))))
            },
            Shape::RootOf if ext.minpoly.degree_in(var) == 2 => {
                let root = self.quadratic_root(var, &ext);
                power(root, exp)
            },
            _ => power(ext.origin, exp),
        }
    }

    /// The root `-p1/2 ± sqrt(p1^2/4 - p0)` of `φ^2 + p1 φ + p0` that the generator `var`
    /// stands for.
    fn quadratic_root(&mut self, var: usize, ext: &Extension) -> Expr {
        let p1 = ext.minpoly.coefficient_in(var, 1);
        let p0 = ext.minpoly.coefficient_in(var, 0);
        let u = self.canonical(&-&p1, &Poly::constant(2, 0));
        let disc = self.canonical(
            &(&p1.pow(2) - &p0.scale(&Rational::from(4))),
            &Poly::constant(4, 0),
        );
        let u = self.render(&u);
        let w = self.render(&disc).sqrt();
        let (plus, minus) = if u.is_zero() {
            (w.clone(), -w)
        } else {
            (Expr::sum(vec![u.clone(), w.clone()]), Expr::sum(vec![u, -w]))
        };

        let generator = self.tower.var(var);
        let symbols = self.tower.symbols_of(&generator);
        let tower = &self.tower;
        let target = |env: &Env, prec: u32| tower.eval(&generator, env, prec);
        let first = |env: &Env, prec: u32| evaluate(&plus, env, prec);
        let second = |env: &Env, prec: u32| evaluate(&minus, env, prec);
        let candidates: [Valuation; 2] = [&first, &second];
        let selection = self.selector.select(
            &ext.origin,
            &symbols,
            self.options,
            &mut *self.sink,
            &target,
            &candidates,
        );
        if selection.index == 0 {
            plus
        } else {
            minus
        }
    }
}

/// `base^exp`, or `base` for an exponent of one.
fn power(base: Expr, exp: u32) -> Expr {
    if exp == 1 {
        base
    } else {
        base.pow(Expr::int(exp))
    }
}

fn term_expr((coefficient, mut factors): Term) -> Expr {
    if factors.is_empty() {
        return Expr::rational(coefficient);
    }
    if coefficient == 1 {
        return Expr::product(factors);
    }
    factors.insert(0, Expr::rational(coefficient));
    Expr::Mul(factors)
}
