//! Numeric disambiguation between candidate roots.
//!
//! A candidate is chosen when it is the only one that matches the target value. Values that
//! depend on free symbols are compared at witness points: values of the symbols drawn from the
//! recorded assumptions, or at random when nothing is recorded about a symbol.

use crate::{
    ctxt::NormalOptions,
    diagnostic::{emit, Diagnostic, DiagnosticSink},
    expr::Expr,
    numeric::{until_stable, Env},
};
use cas_poly::primitive::{approx_eq, modulus};
use rand::{rngs::StdRng, SeedableRng};
use rug::{Complex, Float};
use std::{cmp::Ordering, collections::BTreeSet};
use tracing::{debug, trace};

/// A numeric value as a function of the witness point and the precision.
pub type Valuation<'a> = &'a dyn Fn(&Env, u32) -> Option<Complex>;

/// The outcome of [`BranchSelector::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The index of the chosen candidate.
    pub index: usize,

    /// True if the choice was made at a random witness point or was a fallback.
    pub heuristic: bool,
}

/// Picks the candidate root matching a target value. The witness generator is seeded, so the
/// same inputs always make the same choices.
#[derive(Debug, Clone)]
pub struct BranchSelector {
    rng: StdRng,
}

impl BranchSelector {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Chooses the candidate whose value matches `target`.
    ///
    /// `subject` names the value in diagnostics and `symbols` are the free symbols the values
    /// depend on. Without symbols the values are compared once, at increasing precision. With
    /// symbols, up to [`NormalOptions::witness_retries`] witness points are tried until one
    /// decides; a [`Diagnostic::HeuristicBranch`] is emitted when a symbol without assumptions
    /// had to be drawn. If nothing decides, a [`Diagnostic::UnresolvedBranch`] is emitted and the
    /// first candidate is returned.
    pub fn select(
        &mut self,
        subject: &Expr,
        symbols: &BTreeSet<String>,
        options: &NormalOptions,
        sink: &mut dyn DiagnosticSink,
        target: Valuation,
        candidates: &[Valuation],
    ) -> Selection {
        if candidates.len() == 1 {
            return Selection { index: 0, heuristic: false };
        }

        if symbols.is_empty() {
            if let Some(index) = decide(&Env::new(), options, target, candidates) {
                debug!(%subject, index, "branch chosen");
                return Selection { index, heuristic: false };
            }
        } else {
            for attempt in 0..options.witness_retries {
                let Some(env) = self.witness(symbols, options) else {
                    break;
                };
                trace!(%subject, attempt, ?env, "witness drawn");
                let Some(index) = decide(&env, options, target, candidates) else {
                    continue;
                };

                let unassumed: Vec<_> = symbols
                    .iter()
                    .filter(|name| options.assumptions.query(name).is_none())
                    .map(|name| (name.clone(), env[name].clone()))
                    .collect();
                let heuristic = !unassumed.is_empty();
                if heuristic {
                    emit(sink, Diagnostic::HeuristicBranch { expr: subject.clone(), witness: unassumed });
                }
                debug!(%subject, index, attempt, "branch chosen at a witness point");
                return Selection { index, heuristic };
            }
        }

        emit(sink, Diagnostic::UnresolvedBranch { expr: subject.clone() });
        Selection { index: 0, heuristic: true }
    }

    /// Draws a witness point for `symbols`. Returns [`None`] if some symbol's assumptions cannot
    /// be satisfied.
    fn witness(&mut self, symbols: &BTreeSet<String>, options: &NormalOptions) -> Option<Env> {
        symbols
            .iter()
            .map(|name| Some((name.clone(), options.assumptions.sample(name, &mut self.rng)?)))
            .collect()
    }
}

/// Evaluates the target and every candidate at `env`. Returns the index of the closest candidate
/// if it matches the target and no other candidate matches as well.
fn decide(
    env: &Env,
    options: &NormalOptions,
    target: Valuation,
    candidates: &[Valuation],
) -> Option<usize> {
    let target = until_stable(options, |prec| target(env, prec))?;
    let mut distances: Vec<(usize, Float, bool)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(i, candidate)| {
            let value = until_stable(options, |prec| candidate(env, prec))?;
            let close = approx_eq(&value, &target, options.tolerance);
            Some((i, modulus(&(value - &target)), close))
        })
        .collect();
    distances.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    match distances.as_slice() {
        [(index, _, true)] => Some(*index),
        [(index, _, true), (_, _, false), ..] => Some(*index),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assume::{Assumptions, Interval};
    use cas_poly::primitive::complex_from_rational;
    use rug::Rational;

    use pretty_assertions::assert_eq;

    fn constant(value: f64) -> impl Fn(&Env, u32) -> Option<Complex> {
        move |_, prec| Some(Complex::with_val(prec, value))
    }

    /// The value of the symbol `x`, or of `-x`.
    fn symbol(sign: i32) -> impl Fn(&Env, u32) -> Option<Complex> {
        move |env, prec| Some(complex_from_rational(&(env.get("x")?.clone() * sign), prec))
    }

    #[test]
    fn closest_constant_candidate() {
        let mut selector = BranchSelector::new(1);
        let mut sink = Vec::<crate::diagnostic::Diagnostic>::new();
        let target = constant(-2.0);
        let (a, b) = (constant(2.0), constant(-2.0));
        let selection = selector.select(
            &Expr::int(-2),
            &BTreeSet::new(),
            &NormalOptions::default(),
            &mut sink,
            &target,
            &[&a, &b],
        );
        assert_eq!(selection, Selection { index: 1, heuristic: false });
        assert!(sink.is_empty());
    }

    #[test]
    fn no_match_is_unresolved() {
        let mut selector = BranchSelector::new(1);
        let mut sink = Vec::<crate::diagnostic::Diagnostic>::new();
        let target = constant(0.5);
        let (a, b) = (constant(2.0), constant(-2.0));
        let selection = selector.select(
            &Expr::int(0),
            &BTreeSet::new(),
            &NormalOptions::default(),
            &mut sink,
            &target,
            &[&a, &b],
        );
        assert_eq!(selection, Selection { index: 0, heuristic: true });
        assert_eq!(sink, vec![Diagnostic::UnresolvedBranch { expr: Expr::int(0) }]);
    }

    #[test]
    fn assumptions_decide_without_warning() {
        // sqrt(x^2) is x for positive x and -x for negative x
        let symbols: BTreeSet<_> = ["x".to_string()].into_iter().collect();
        let target = |env: &Env, prec| {
            let x = complex_from_rational(env.get("x")?, prec);
            Some(Complex::with_val(prec, x.abs_ref()))
        };
        let (plus, minus) = (symbol(1), symbol(-1));

        for (interval, expected) in [(Interval::positive(), 0), (Interval::negative(), 1)] {
            let options = NormalOptions::default()
                .with_assumptions(Assumptions::new().with("x", interval));
            let mut sink = Vec::<crate::diagnostic::Diagnostic>::new();
            let selection = BranchSelector::new(7).select(
                &Expr::symbol("x"),
                &symbols,
                &options,
                &mut sink,
                &target,
                &[&plus, &minus],
            );
            assert_eq!(selection, Selection { index: expected, heuristic: false });
            assert!(sink.is_empty());
        }
    }

    #[test]
    fn random_witness_warns() {
        let symbols: BTreeSet<_> = ["x".to_string()].into_iter().collect();
        let target = symbol(1);
        let (plus, minus) = (symbol(1), symbol(-1));
        let mut sink = Vec::<crate::diagnostic::Diagnostic>::new();
        let selection = BranchSelector::new(7).select(
            &Expr::symbol("x"),
            &symbols,
            &NormalOptions::default(),
            &mut sink,
            &target,
            &[&plus, &minus],
        );
        assert_eq!(selection, Selection { index: 0, heuristic: true });
        match sink.as_slice() {
            [Diagnostic::HeuristicBranch { witness, .. }] => {
                assert_eq!(witness.len(), 1);
                assert_ne!(witness[0].1, Rational::new());
            },
            other => panic!("unexpected diagnostics {:?}", other),
        }
    }
}
