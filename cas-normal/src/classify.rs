//! Classification of the generators of an expression.
//!
//! Sums, products, negations, reciprocals and integer powers are transparent. Rational powers
//! `b^(p/q)` with a small enough `q` and `rootof` nodes are algebraic: their generator sits one
//! tier above the highest tier their argument depends on. Everything else is an ordinary
//! generator at tier 0.

use crate::{
    ctxt::NormalOptions,
    error::MalformedInput,
    expr::{Expr, Primary},
};
use cas_error::Error;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// An algebraic generator found by [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlgebraicNode {
    /// The generator: `b^(1/q)` for a radical, `rootof([1, 0], minpoly)` for a root.
    pub expr: Expr,

    pub tier: usize,

    /// True if the generator does not depend on any ordinary generator.
    pub constant: bool,
}

/// The generators of an expression, as found by [`classify`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Ordinary generators: the hints first, then symbols alphabetically, then the other opaque
    /// nodes by their text.
    pub ordinary: Vec<Expr>,

    /// Algebraic generators: constant ones first, then by tier, then by text.
    pub algebraic: Vec<AlgebraicNode>,

    /// Algebraic nodes that were demoted to ordinary generators.
    pub demoted: Vec<Expr>,

    /// True if a complex literal occurs.
    pub imaginary: bool,
}

impl Classification {
    /// True if nothing had to be demoted.
    pub fn is_complete(&self) -> bool {
        self.demoted.is_empty()
    }

    /// The generators grouped by tier, ordinary ones first.
    pub fn tiers(&self) -> Vec<Vec<Expr>> {
        let mut tiers = vec![self.ordinary.clone()];
        for node in &self.algebraic {
            if tiers.len() <= node.tier {
                tiers.resize(node.tier + 1, Vec::new());
            }
            tiers[node.tier].push(node.expr.clone());
        }
        tiers
    }
}

/// What a subexpression depends on.
#[derive(Debug, Clone, Copy)]
struct Depends {
    tier: usize,
    constant: bool,
}

impl Depends {
    const RATIONAL: Self = Self { tier: 0, constant: true };
    const ORDINARY: Self = Self { tier: 0, constant: false };

    fn join(self, other: Self) -> Self {
        Self { tier: self.tier.max(other.tier), constant: self.constant && other.constant }
    }
}

/// Classifies the generators of a prepared expression, in which `sqrt`-like calls have already
/// been rewritten to powers and the arguments of opaque nodes normalized.
///
/// Fails with [`MalformedInput`] for a `rootof` node whose minimal polynomial has fewer than two
/// coefficients or a zero leading coefficient.
pub fn classify(expr: &Expr, hint: &[Expr], options: &NormalOptions) -> Result<Classification, Error> {
    let mut classifier = Classifier {
        options,
        ordinary: Vec::new(),
        algebraic: HashMap::new(),
        demoted: Vec::new(),
        imaginary: false,
    };
    classifier.visit(expr)?;
    Ok(classifier.finish(hint))
}

struct Classifier<'a> {
    options: &'a NormalOptions,
    ordinary: Vec<Expr>,
    algebraic: HashMap<Expr, AlgebraicNode>,
    demoted: Vec<Expr>,
    imaginary: bool,
}

impl Classifier<'_> {
    fn visit(&mut self, expr: &Expr) -> Result<Depends, Error> {
        Ok(match expr {
            Expr::Primary(Primary::Integer(_) | Primary::Rational(_)) => Depends::RATIONAL,
            Expr::Primary(Primary::Infinity | Primary::Undefined) => Depends::RATIONAL,
            Expr::Primary(Primary::Complex(..)) => {
                if self.options.extensions {
                    self.imaginary = true;
                    self.algebraic(Expr::imaginary(), Depends { tier: 1, constant: true })
                } else {
                    self.ordinary(Expr::imaginary())
                }
            },
            Expr::Primary(Primary::Symbol(_) | Primary::Call(..)) => self.ordinary(expr.clone()),
            Expr::Add(items) | Expr::Mul(items) => {
                let mut depends = Depends::RATIONAL;
                for item in items {
                    depends = depends.join(self.visit(item)?);
                }
                depends
            },
            Expr::Neg(inner) | Expr::Inv(inner) => self.visit(inner)?,
            Expr::Exp(base, exp) => match exp.as_rational() {
                Some(e) if *e.denom() == 1 => self.visit(base)?,
                Some(e) => {
                    let q = e.denom().to_u32().unwrap_or(u32::MAX);
                    let key = radical_key(base, q);
                    if !self.options.extensions || q > self.options.max_radical_index {
                        return Ok(self.ordinary(key));
                    }
                    let inner = self.visit(base)?;
                    self.algebraic(key, Depends { tier: inner.tier + 1, constant: inner.constant })
                },
                None => self.ordinary(expr.clone()),
            },
            Expr::RootOf(repr, minpoly) => {
                check_rootof(expr, minpoly)?;
                if !self.options.extensions {
                    return Ok(self.ordinary(expr.clone()));
                }
                let key = Expr::RootOf(vec![Expr::int(1), Expr::int(0)], minpoly.clone());
                if minpoly.len() - 1 > self.options.max_extension_degree {
                    debug!(%expr, "rootof degree above the extension limit");
                    self.demoted.push(key.clone());
                    return Ok(self.ordinary(key));
                }

                let mut coefficients = Depends::RATIONAL;
                for c in minpoly {
                    coefficients = coefficients.join(self.visit(c)?);
                }
                let node = self.algebraic(
                    key,
                    Depends { tier: coefficients.tier + 1, constant: coefficients.constant },
                );
                let mut depends = node;
                for c in repr {
                    depends = depends.join(self.visit(c)?);
                }
                depends
            },
        })
    }

    fn ordinary(&mut self, expr: Expr) -> Depends {
        if !self.ordinary.contains(&expr) {
            debug!(%expr, "ordinary generator");
            self.ordinary.push(expr);
        }
        Depends::ORDINARY
    }

    /// Registers an algebraic generator, demoting it if the tower would grow too high.
    fn algebraic(&mut self, expr: Expr, depends: Depends) -> Depends {
        if depends.tier > self.options.max_tower_height {
            debug!(%expr, tier = depends.tier, "tower too high, demoting");
            if !self.demoted.contains(&expr) {
                self.demoted.push(expr.clone());
            }
            return self.ordinary(expr);
        }
        let node = self.algebraic.entry(expr.clone()).or_insert_with(|| {
            debug!(%expr, tier = depends.tier, constant = depends.constant, "algebraic generator");
            AlgebraicNode { expr, tier: depends.tier, constant: depends.constant }
        });
        node.tier = node.tier.max(depends.tier);
        Depends { tier: node.tier, constant: depends.constant }
    }

    fn finish(self, hint: &[Expr]) -> Classification {
        let mut ordinary: Vec<Expr> = hint.to_vec();
        let mut symbols = BTreeMap::new();
        let mut others = BTreeMap::new();
        for expr in self.ordinary {
            if ordinary.contains(&expr) {
                continue;
            }
            match expr.as_symbol() {
                Some(name) => symbols.insert(name.to_string(), expr),
                None => others.insert(expr.to_string(), expr),
            };
        }
        ordinary.extend(symbols.into_values());
        ordinary.extend(others.into_values());

        let mut algebraic: Vec<AlgebraicNode> = self.algebraic.into_values().collect();
        algebraic.sort_by_cached_key(|node| (!node.constant, node.tier, node.expr.to_string()));

        Classification { ordinary, algebraic, demoted: self.demoted, imaginary: self.imaginary }
    }
}

/// The generator of the radical `base^(p/q)`: `base^(1/q)`.
pub(crate) fn radical_key(base: &Expr, q: u32) -> Expr {
    base.clone().pow(Expr::rational(rug::Rational::from((1, q))))
}

/// Checks the shape of a `rootof` minimal polynomial.
pub(crate) fn check_rootof(expr: &Expr, minpoly: &[Expr]) -> Result<(), Error> {
    let reason = if minpoly.len() < 2 {
        "the minimal polynomial needs at least two coefficients"
    } else if minpoly[0].is_zero() {
        "the minimal polynomial has a zero leading coefficient"
    } else {
        return Ok(());
    };
    Err(Error::unspanned(MalformedInput { expr: expr.to_string(), reason: reason.to_string() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::Engine, parse::parse};

    use pretty_assertions::assert_eq;

    /// Parses `src` and brings it into the shape the classifier expects.
    fn prepared(src: &str, options: &NormalOptions) -> Expr {
        let mut sink = Vec::<crate::diagnostic::Diagnostic>::new();
        let mut engine = Engine::new(options, &mut sink);
        engine.prepare(&parse(src).unwrap()).unwrap()
    }

    fn tiers(src: &str, options: &NormalOptions) -> Vec<Vec<String>> {
        let expr = prepared(src, options);
        classify(&expr, &[], options)
            .unwrap()
            .tiers()
            .into_iter()
            .map(|tier| tier.into_iter().map(|e| e.to_string()).collect())
            .collect()
    }

    #[test]
    fn ordinary_order() {
        let options = NormalOptions::default();
        assert_eq!(
            tiers("sin(y) + z*x + f(a) + y", &options),
            vec![vec!["x", "y", "z", "f(a)", "sin(y)"]],
        );

        let expr = prepared("x + y", &options);
        let hinted = classify(&expr, &[Expr::symbol("y")], &options).unwrap();
        assert_eq!(hinted.ordinary, vec![Expr::symbol("y"), Expr::symbol("x")]);
    }

    #[test]
    fn radical_tiers() {
        let options = NormalOptions::default();
        assert_eq!(
            tiers("(1 + 2^(1/2))^(1/3) + x^(3/2) + 3^(1/2)", &options),
            vec![
                vec!["x".to_string()],
                vec!["sqrt(2)".to_string(), "sqrt(3)".to_string(), "sqrt(x)".to_string()],
                vec!["(1 + sqrt(2))^(1/3)".to_string()],
            ],
        );
    }

    #[test]
    fn constant_nodes_come_first() {
        let options = NormalOptions::default();
        let expr = prepared("(1 + 2^(1/2))^(1/3) + x^(1/2)", &options);
        let order: Vec<_> = classify(&expr, &[], &options)
            .unwrap()
            .algebraic
            .into_iter()
            .map(|node| node.expr.to_string())
            .collect();
        assert_eq!(order, vec!["sqrt(2)", "(1 + sqrt(2))^(1/3)", "sqrt(x)"]);
    }

    #[test]
    fn demotion() {
        let options = NormalOptions { max_tower_height: 1, ..Default::default() };
        let expr = prepared("(1 + 2^(1/2))^(1/2)", &options);
        let classification = classify(&expr, &[], &options).unwrap();
        assert!(!classification.is_complete());
        assert_eq!(classification.ordinary, vec![expr.clone()]);

        let rational = classify(&expr, &[], &NormalOptions::rational()).unwrap();
        assert!(rational.is_complete());
        assert!(rational.algebraic.is_empty());
    }

    #[test]
    fn complex_literals() {
        let options = NormalOptions::default();
        let expr = prepared("2 + 3*i", &options);
        let classification = classify(&expr, &[], &options).unwrap();
        assert!(classification.imaginary);
        assert_eq!(classification.algebraic[0].expr, Expr::imaginary());
    }

    #[test]
    fn malformed_rootof() {
        let options = NormalOptions::default();
        let expr = Expr::RootOf(vec![Expr::int(1)], vec![Expr::int(0), Expr::int(1)]);
        let err = classify(&expr, &[], &options).unwrap_err();
        assert_eq!(
            err.kind.message(),
            "malformed expression `rootof([1], [0, 1])`: the minimal polynomial has a zero leading coefficient",
        );
    }
}
