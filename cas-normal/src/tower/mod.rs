//! The tower of generators a canonical fraction is written over.
//!
//! Every generator is a polynomial variable. Ordinary generators (symbols and opaque
//! subexpressions) come first. Algebraic generators follow, each with a minimal polynomial that
//! is monic in its own variable and whose coefficients only use the ordinary generators and the
//! algebraic generators before it in [`Tower::relations`] order.
//!
//! Constant algebraic numbers all live in one primitive generator `δ`. Adjoining a new constant
//! number either reuses an existing one or merges it into `δ`, retiring the old primitive
//! generator (see [`crate::merge`]). A retired generator keeps the substitution that rewrites it
//! in terms of the new one; [`Tower::refresh`] applies these substitutions to polynomials built
//! before the merge.

pub mod ext;

use crate::{
    ctxt::NormalOptions,
    expr::Expr,
    numeric::{evaluate, Env},
};
use cas_poly::{primitive::complex_from_rational, Monomial, Poly, UniPoly};
use rug::{ops::Pow, Complex, Rational};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// How an algebraic generator came about, which decides how it is rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// The primitive element of the constant field.
    Primitive,

    /// `φ = radicand^(1/index)` on the principal branch, over a radicand that depends on ordinary
    /// generators.
    Radical {
        radicand: Poly,
        index: u32,
    },

    /// A root of a minimal polynomial with parametric coefficients.
    RootOf,

    /// A constant number that could not be merged into the primitive element.
    Stacked,
}

/// An algebraic generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    /// The minimal polynomial, monic in the generator's own variable.
    pub minpoly: Poly,

    /// An expression with the generator's value, used for numeric evaluation.
    pub origin: Expr,

    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorKind {
    /// An opaque subexpression.
    Ordinary(Expr),

    /// An algebraic generator.
    Extension(Extension),

    /// A generator replaced by a merge. Polynomials that still use it are rewritten with the
    /// substitution, a polynomial in later generators.
    Retired {
        substitution: Poly,
    },
}

/// A generator and the tier it sits at: 0 for ordinary generators, and one more than the highest
/// tier its minimal polynomial depends on for algebraic ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub kind: GeneratorKind,
    pub tier: usize,
}

/// A constant algebraic number that was adjoined to the tower.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// How the number was written.
    pub expr: Expr,

    /// The number as a polynomial in the primitive generator, or the generator it was stacked
    /// on.
    pub image: Poly,

    /// A numeric approximation.
    pub approx: Complex,

    /// The degree of the field extension the number added when it was adjoined: 1 if it was
    /// already in the field.
    pub degree: usize,
}

/// A record of one merge of a constant number into the primitive element.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRecord {
    /// The primitive generator that was retired.
    pub retired: usize,

    /// The new primitive generator, `β + k·δ`.
    pub merged: usize,

    /// The shift `k`.
    pub shift: i64,

    /// `δ` as a polynomial in the new generator.
    pub substitution: Poly,

    /// The degree of the new primitive element over Q.
    pub degree: usize,
}

/// The primitive element of the constant field.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub var: usize,

    /// A numeric approximation at the working precision.
    pub approx: Complex,
}

/// An element `repr(θ) mod minpoly(θ)` of a single algebraic generator `θ`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionElement {
    pub repr: UniPoly,
    pub generator: usize,
}

/// The generators a canonical fraction is written over. See the module documentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tower {
    generators: Vec<Generator>,

    /// The ordinary generators by expression.
    ordinary: HashMap<Expr, usize>,

    /// The number of ordinary generators registered before the first algebraic one.
    ordinary_len: usize,

    /// Active algebraic generators in dependency order. A merged generator takes the place of the
    /// one it retired.
    algebraic: Vec<usize>,

    pub(crate) primitive: Option<Primitive>,

    pub(crate) sources: Vec<Source>,

    /// The imaginary unit, once it has been adjoined.
    pub(crate) imaginary: Option<Poly>,

    pub(crate) merges: Vec<MergeRecord>,
}

impl Tower {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of generators, retired ones included. Polynomials over this tower use the
    /// variables `0..dim()`.
    pub fn dim(&self) -> usize {
        self.generators.len()
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn generator(&self, var: usize) -> Option<&Generator> {
        self.generators.get(var)
    }

    /// The number of leading ordinary generators.
    pub fn ordinary_len(&self) -> usize {
        self.ordinary_len
    }

    /// The merges performed so far.
    pub fn merges(&self) -> &[MergeRecord] {
        &self.merges
    }

    /// The constant numbers adjoined so far.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// The primitive generator of the constant field, if any constant number was adjoined.
    pub fn primitive(&self) -> Option<usize> {
        self.primitive.as_ref().map(|p| p.var)
    }

    /// Returns the variable of the ordinary generator `expr`, registering it if needed.
    pub fn ordinary(&mut self, expr: &Expr) -> usize {
        if let Some(&var) = self.ordinary.get(expr) {
            return var;
        }
        let var = self.generators.len();
        if var == self.ordinary_len {
            self.ordinary_len += 1;
        } else {
            debug!(%expr, var, "ordinary generator registered after algebraic ones");
        }
        self.generators.push(Generator { kind: GeneratorKind::Ordinary(expr.clone()), tier: 0 });
        self.ordinary.insert(expr.clone(), var);
        var
    }

    /// Returns the variable of the ordinary generator `expr` if it is registered.
    pub fn find_ordinary(&self, expr: &Expr) -> Option<usize> {
        self.ordinary.get(expr).copied()
    }

    /// Pushes a new algebraic generator and returns its variable, which is the current
    /// [`Tower::dim`]. The minimal polynomial must already be written in that variable.
    pub(crate) fn push_extension(&mut self, extension: Extension) -> usize {
        let var = self.generators.len();
        let tier = 1 + self.tier_of(&extension.minpoly, var);
        debug!(var, tier, minpoly = %extension.minpoly, origin = %extension.origin, "new extension");
        self.generators.push(Generator { kind: GeneratorKind::Extension(extension), tier });
        self.algebraic.push(var);
        var
    }

    /// The highest tier of the generators `p` uses, ignoring `skip`.
    pub fn tier_of(&self, p: &Poly, skip: usize) -> usize {
        p.variables()
            .into_iter()
            .filter(|&v| v != skip)
            .filter_map(|v| self.generators.get(v))
            .map(|g| g.tier)
            .max()
            .unwrap_or(0)
    }

    /// Retires `old`, putting `new` (which must be the last generator) in its place among the
    /// relations. Relations and sources that used `old` are rewritten.
    pub(crate) fn retire(&mut self, old: usize, new: usize, substitution: Poly) {
        debug!(old, new, %substitution, "retiring generator");
        if let Some(pos) = self.algebraic.iter().position(|&v| v == old) {
            self.algebraic.retain(|&v| v != new);
            self.algebraic[pos] = new;
        }
        if let Some(g) = self.generators.get_mut(old) {
            g.kind = GeneratorKind::Retired { substitution };
        }
        self.rewrite_relations();
    }

    /// Replaces the relation of `var` by a degree-one factor `var - value`, retiring the
    /// generator.
    pub(crate) fn collapse(&mut self, var: usize, value: Poly) {
        debug!(var, %value, "generator collapsed to a lower field");
        self.algebraic.retain(|&v| v != var);
        if let Some(g) = self.generators.get_mut(var) {
            g.kind = GeneratorKind::Retired { substitution: value };
        }
        if self.primitive() == Some(var) {
            self.primitive = None;
        }
        self.rewrite_relations();
    }

    /// Replaces the minimal polynomial of `var` by a factor of it.
    pub(crate) fn set_minpoly(&mut self, var: usize, minpoly: Poly) {
        if let Some(Generator { kind: GeneratorKind::Extension(ext), .. }) = self.generators.get_mut(var) {
            debug!(var, %minpoly, "minimal polynomial split");
            ext.minpoly = minpoly;
        }
        self.rewrite_relations();
    }

    /// Rewrites the relations through the retired generators, keeping each one reduced modulo
    /// the relations before it.
    fn rewrite_relations(&mut self) {
        for i in 0..self.algebraic.len() {
            let var = self.algebraic[i];
            let minpoly = match self.extension(var) {
                Some(ext) => ext.minpoly.clone(),
                None => continue,
            };
            let rels = self.relations_before(i);
            let rewritten = ext::reduce(&self.refresh(&minpoly), &rels);
            let radicand = match self.extension(var).map(|e| &e.shape) {
                Some(Shape::Radical { radicand, .. }) => Some(ext::reduce(&self.refresh(radicand), &rels)),
                _ => None,
            };
            if let Some(Generator { kind: GeneratorKind::Extension(ext), .. }) = self.generators.get_mut(var) {
                ext.minpoly = rewritten;
                if let (Shape::Radical { radicand: old, .. }, Some(new)) = (&mut ext.shape, radicand) {
                    *old = new;
                }
            }
        }
    }

    /// The algebraic generator `var`, unless it is retired or ordinary.
    pub fn extension(&self, var: usize) -> Option<&Extension> {
        match self.generators.get(var) {
            Some(Generator { kind: GeneratorKind::Extension(ext), .. }) => Some(ext),
            _ => None,
        }
    }

    /// Returns true if `var` is an active algebraic generator.
    pub fn is_algebraic(&self, var: usize) -> bool {
        self.extension(var).is_some()
    }

    /// Returns true if `var` is the primitive generator or a constant number stacked on it.
    /// A retired generator is constant when its substitution is.
    pub fn is_constant_var(&self, var: usize) -> bool {
        match self.generators.get(var).map(|g| &g.kind) {
            Some(GeneratorKind::Extension(ext)) => matches!(ext.shape, Shape::Primitive | Shape::Stacked),
            Some(GeneratorKind::Retired { substitution }) => self.is_constant(substitution),
            _ => false,
        }
    }

    /// The active relations `(var, minpoly)`, in dependency order.
    pub fn relations(&self) -> Vec<(usize, Poly)> {
        self.relations_before(self.algebraic.len())
    }

    fn relations_before(&self, end: usize) -> Vec<(usize, Poly)> {
        self.algebraic[..end]
            .iter()
            .filter_map(|&v| self.extension(v).map(|ext| (v, ext.minpoly.clone())))
            .collect()
    }

    /// The active algebraic generators, in dependency order.
    pub fn algebraic(&self) -> &[usize] {
        &self.algebraic
    }

    /// Rewrites `p` through the substitutions of retired generators.
    pub fn refresh(&self, p: &Poly) -> Poly {
        let mut p = p.clone();
        loop {
            let retired = p.variables().into_iter().find_map(|v| match self.generators.get(v) {
                Some(Generator { kind: GeneratorKind::Retired { substitution }, .. }) => {
                    Some((v, substitution))
                },
                _ => None,
            });
            match retired {
                Some((v, substitution)) => p = p.substitute(v, substitution),
                None => return p.embed(self.dim()),
            }
        }
    }

    /// Refreshes `p` and reduces it modulo the relations. Two polynomials denote the same value
    /// exactly when their reductions are equal, as long as every relation is irreducible.
    pub fn reduce(&self, p: &Poly) -> Poly {
        ext::reduce(&self.refresh(p), &self.relations())
    }

    /// Returns true if `p` uses an active algebraic generator.
    pub fn uses_algebraic(&self, p: &Poly) -> bool {
        p.variables().into_iter().any(|v| self.is_algebraic(v))
    }

    /// Returns true if `p` uses ordinary generators only, so no relation or substitution applies
    /// to it.
    pub fn only_ordinary(&self, p: &Poly) -> bool {
        p.variables().into_iter().all(|v| {
            matches!(self.generators.get(v), Some(Generator { kind: GeneratorKind::Ordinary(_), .. }))
        })
    }

    /// Returns true if `p` uses only constant generators: the primitive element and numbers
    /// stacked on it.
    pub fn is_constant(&self, p: &Poly) -> bool {
        p.variables().into_iter().all(|v| self.is_constant_var(v))
    }

    /// Views `p` as an element of a single algebraic generator, if it is one.
    pub fn extension_element(&self, p: &Poly) -> Option<ExtensionElement> {
        let vars = p.variables();
        let generator = match vars.iter().copied().collect::<Vec<_>>().as_slice() {
            [v] if self.is_algebraic(*v) => *v,
            _ => return None,
        };
        Some(ExtensionElement { repr: UniPoly::from_poly(p, generator)?, generator })
    }

    /// The expression a generator stands for in numeric evaluation.
    pub fn var_expr(&self, var: usize) -> Option<&Expr> {
        match &self.generators.get(var)?.kind {
            GeneratorKind::Ordinary(expr) => Some(expr),
            GeneratorKind::Extension(ext) => Some(&ext.origin),
            GeneratorKind::Retired { .. } => None,
        }
    }

    /// Writes `p` as an expression over the generators' own expressions, without any
    /// simplification. Used for the origins of new generators.
    pub fn raw_expr(&self, p: &Poly) -> Expr {
        let p = self.refresh(p);
        let terms = p
            .terms()
            .rev()
            .map(|(m, c)| {
                let mut factors = vec![Expr::rational(c.clone())];
                for (var, exp) in m.factors() {
                    let base = self.var_expr(var).cloned().unwrap_or_else(|| Expr::int(0));
                    factors.push(if exp == 1 { base } else { base.pow(Expr::int(exp)) });
                }
                if factors.len() > 1 && factors[0].is_one() {
                    factors.remove(0);
                }
                Expr::product(factors)
            })
            .collect();
        Expr::sum(terms)
    }

    /// The generators `p` depends on: those it uses after refreshing, and those the minimal
    /// polynomials, radicands and substitutions of these use in turn.
    pub fn dependencies(&self, p: &Poly) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<usize> = self.refresh(p).variables().into_iter().collect();
        while let Some(var) = stack.pop() {
            if !seen.insert(var) {
                continue;
            }
            match self.generators.get(var).map(|g| &g.kind) {
                Some(GeneratorKind::Extension(ext)) => {
                    stack.extend(ext.minpoly.variables().into_iter().filter(|&v| v != var));
                    if let Shape::Radical { radicand, .. } = &ext.shape {
                        stack.extend(radicand.variables());
                    }
                },
                Some(GeneratorKind::Retired { substitution }) => stack.extend(substitution.variables()),
                _ => {},
            }
        }
        seen
    }

    /// The free symbols `p` depends on, through the ordinary generators it uses directly or
    /// through the minimal polynomials of algebraic generators.
    pub fn symbols_of(&self, p: &Poly) -> BTreeSet<String> {
        self.dependencies(p)
            .into_iter()
            .filter_map(|var| match self.generators.get(var).map(|g| &g.kind) {
                Some(GeneratorKind::Ordinary(expr)) => Some(expr.free_symbols()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Numeric values of every generator at `env`, indexed by variable. Extensions are evaluated
    /// in dependency order and retired generators take the value of their substitution.
    pub fn values(&self, env: &Env, prec: u32) -> Option<Vec<Complex>> {
        self.values_of(|_| true, env, prec)
    }

    /// Like [`Tower::values`], but only the generators in `needed` are evaluated. The others are
    /// left at zero.
    fn values_of(
        &self,
        needed: impl Fn(usize) -> bool,
        env: &Env,
        prec: u32,
    ) -> Option<Vec<Complex>> {
        let mut values = vec![Complex::new(prec); self.dim()];
        for (var, g) in self.generators.iter().enumerate() {
            if let GeneratorKind::Ordinary(expr) = &g.kind {
                if needed(var) {
                    values[var] = evaluate(expr, env, prec)?;
                }
            }
        }
        for &var in &self.algebraic {
            let ext = match self.extension(var) {
                Some(ext) if needed(var) => ext,
                _ => continue,
            };
            values[var] = match &ext.shape {
                Shape::Radical { radicand, index } => {
                    let r = radicand.eval_complex(&values, prec);
                    if r.is_zero() {
                        r
                    } else {
                        r.pow(&complex_from_rational(&Rational::from((1, *index)), prec))
                    }
                },
                Shape::Primitive => match &self.primitive {
                    Some(p) if p.var == var && p.approx.prec().0 >= prec => {
                        Complex::with_val(prec, &p.approx)
                    },
                    _ => evaluate(&ext.origin, env, prec)?,
                },
                Shape::RootOf | Shape::Stacked => evaluate(&ext.origin, env, prec)?,
            };
        }
        for (var, g) in self.generators.iter().enumerate().rev() {
            if let GeneratorKind::Retired { substitution } = &g.kind {
                if needed(var) {
                    values[var] = substitution.eval_complex(&values, prec);
                }
            }
        }
        Some(values)
    }

    /// The numeric value of `p` at `env`. Only the generators `p` depends on need a value, so a
    /// constant is evaluated without binding any symbol.
    pub fn eval(&self, p: &Poly, env: &Env, prec: u32) -> Option<Complex> {
        let p = self.refresh(p);
        let needed = self.dependencies(&p);
        let values = self.values_of(|var| needed.contains(&var), env, prec)?;
        Some(p.eval_complex(&values, prec))
    }

    /// A polynomial in the ordinary generator or extension `var`.
    pub fn var(&self, var: usize) -> Poly {
        Poly::var(var, self.dim())
    }

    /// The monomial of the ordinary part of `m`.
    pub fn split_ordinary(&self, m: &Monomial) -> (Monomial, Monomial) {
        m.split_at(self.ordinary_len)
    }

    /// Checks the numeric soundness of every merge: each source, evaluated through its image in
    /// the current tower, must match its recorded approximation.
    pub fn check_sources(&self, options: &NormalOptions) -> bool {
        let env = Env::new();
        self.sources.iter().all(|source| {
            self.eval(&source.image, &env, options.precision)
                .map_or(false, |value| {
                    cas_poly::primitive::approx_eq(&value, &source.approx, options.tolerance)
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::assert_float_absolute_eq;
    use cas_poly::primitive::rat;

    use pretty_assertions::assert_eq;

    fn sqrt(n: i64) -> Expr {
        Expr::int(n).sqrt()
    }

    /// `x`, then `sqrt(2)` merged into `sqrt(2) + sqrt(3)`.
    fn merged() -> Tower {
        let mut tower = Tower::new();
        tower.ordinary(&Expr::symbol("x"));
        let d = tower.push_extension(Extension {
            minpoly: &Poly::var(1, 2).pow(2) - &Poly::constant(2, 2),
            origin: sqrt(2),
            shape: Shape::Primitive,
        });
        let g = Poly::var(2, 3);
        let minpoly = &(&g.pow(4) - &g.pow(2).scale(&rat(10, 1))) + &Poly::one(3);
        let merged = tower.push_extension(Extension {
            minpoly,
            origin: sqrt(2) + sqrt(3),
            shape: Shape::Primitive,
        });
        let substitution = (&g.pow(3) - &g.scale(&rat(9, 1))).scale(&rat(1, 2));
        tower.retire(d, merged, substitution);
        tower
    }

    #[test]
    fn ordinary_generators_are_shared() {
        let mut tower = Tower::new();
        let x = tower.ordinary(&Expr::symbol("x"));
        let y = tower.ordinary(&Expr::symbol("y"));
        assert_eq!((x, y), (0, 1));
        assert_eq!(tower.ordinary(&Expr::symbol("x")), 0);
        assert_eq!(tower.ordinary_len(), 2);
    }

    #[test]
    fn retired_generators_are_substituted() {
        let tower = merged();
        assert_eq!(tower.algebraic(), &[2]);
        let d = Poly::var(1, 3);
        assert_eq!(tower.reduce(&d.pow(2)), Poly::constant(2, 3));
        assert!(!tower.uses_algebraic(&Poly::var(0, 3)));
        assert!(tower.is_constant(&d));
    }

    #[test]
    fn numeric_values_follow_substitutions() {
        let tower = merged();
        let values = tower.values(&Env::new(), 128);
        assert!(values.is_none(), "x has no value");

        let env: Env = [("x".to_string(), rat(1, 2))].into_iter().collect();
        let values = tower.values(&env, 128).unwrap();
        assert_float_absolute_eq!(values[0].real().to_f64(), 0.5, 1e-12);
        assert_float_absolute_eq!(values[1].real().to_f64(), 2f64.sqrt(), 1e-12);
        assert_float_absolute_eq!(values[2].real().to_f64(), 2f64.sqrt() + 3f64.sqrt(), 1e-12);
    }

    #[test]
    fn constants_evaluate_without_symbols() {
        let tower = merged();
        let d = Poly::var(1, 3);
        assert_eq!(tower.dependencies(&d).into_iter().collect::<Vec<_>>(), vec![2]);
        let value = tower.eval(&d.scale(&rat(-1, 1)), &Env::new(), 128).unwrap();
        assert_float_absolute_eq!(value.real().to_f64(), -(2f64.sqrt()), 1e-12);
        assert!(tower.eval(&Poly::var(0, 3), &Env::new(), 128).is_none());
    }

    #[test]
    fn symbols_through_radicands() {
        let mut tower = Tower::new();
        let x = tower.ordinary(&Expr::symbol("x"));
        let radicand = Poly::var(x, 2);
        let phi = tower.push_extension(Extension {
            minpoly: &Poly::var(1, 2).pow(2) - &radicand,
            origin: Expr::symbol("x").sqrt(),
            shape: Shape::Radical { radicand, index: 2 },
        });
        assert_eq!(tower.generator(phi).map(|g| g.tier), Some(1));
        let names: Vec<_> = tower.symbols_of(&Poly::var(phi, 2)).into_iter().collect();
        assert_eq!(names, vec!["x".to_string()]);
        assert_eq!(tower.raw_expr(&Poly::var(phi, 2).scale(&rat(2, 1))).to_string(), "2*sqrt(x)");
    }
}
