//! State shared by every step of one top-level normalization.

use crate::{
    branch::{BranchSelector, Valuation},
    ctxt::NormalOptions,
    diagnostic::{emit, Diagnostic, DiagnosticSink},
    expr::Expr,
    kernel::Frac,
    numeric::Env,
    tower::{ext::{self, ZeroDivisor}, Tower},
};
use cas_poly::Poly;
use std::collections::HashMap;
use tracing::debug;

/// The most relation splits a single inversion may trigger.
const MAX_SPLITS: usize = 64;

/// The result of [`Engine::invert_poly`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inversion {
    /// `p * m = e` in the tower, with `e` free of algebraic generators.
    Inverse(Poly, Poly),

    /// `p` is zero in the tower.
    Zero,

    /// The inversion could not be completed.
    Failed,
}

/// The tower being built, the options, the branch selector and the diagnostic sink of one
/// normalization.
pub struct Engine<'a> {
    pub(crate) options: &'a NormalOptions,
    pub(crate) tower: Tower,
    pub(crate) selector: BranchSelector,
    pub(crate) sink: &'a mut dyn DiagnosticSink,

    /// False once some subexpression was kept opaque.
    pub(crate) complete: bool,

    /// Converted subexpressions.
    pub(crate) cache: HashMap<Expr, Frac>,
}

impl<'a> Engine<'a> {
    pub fn new(options: &'a NormalOptions, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self::with_tower(options, sink, Tower::new())
    }

    /// An engine that continues building on an existing tower.
    pub fn with_tower(options: &'a NormalOptions, sink: &'a mut dyn DiagnosticSink, tower: Tower) -> Self {
        Self {
            options,
            tower,
            selector: BranchSelector::new(options.seed),
            sink,
            complete: true,
            cache: HashMap::new(),
        }
    }

    pub fn tower(&self) -> &Tower {
        &self.tower
    }

    pub fn into_tower(self) -> Tower {
        self.tower
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Pushes a diagnostic to the sink.
    pub(crate) fn emit(&mut self, diagnostic: Diagnostic) {
        emit(&mut *self.sink, diagnostic);
    }

    /// Marks the result incomplete because `expr` was kept opaque.
    pub(crate) fn incomplete(&mut self, expr: &Expr) {
        self.complete = false;
        self.emit(Diagnostic::ConversionIncomplete { expr: expr.clone() });
    }

    /// Inverts `p` in the tower. A zero divisor splits the relation it came from and the
    /// inversion is retried in the smaller field.
    pub(crate) fn invert_poly(&mut self, p: &Poly) -> Inversion {
        for _ in 0..MAX_SPLITS {
            let p = self.tower.reduce(p);
            if p.is_zero() {
                return Inversion::Zero;
            }
            match ext::invert(&p, &self.tower.relations()) {
                Ok((_, e)) if e.is_zero() => return Inversion::Zero,
                Ok((m, e)) => return Inversion::Inverse(m, e),
                Err(zero_divisor) => {
                    if !self.split(zero_divisor) {
                        return Inversion::Failed;
                    }
                },
            }
        }
        Inversion::Failed
    }

    /// Replaces the relation `P` of `var` by the factor of `P` that vanishes at the generator:
    /// either the monic form of the zero divisor's factor `f`, or the cofactor `P / f`.
    ///
    /// Returns false if the factor could not be made monic over the generators below.
    fn split(&mut self, zero_divisor: ZeroDivisor) -> bool {
        let ZeroDivisor { var, factor } = zero_divisor;
        let rels = self.tower.relations();
        let Some(pos) = rels.iter().position(|(v, _)| *v == var) else {
            return false;
        };
        let below = &rels[..pos];
        let minpoly = &rels[pos].1;

        let lc = factor.leading_coefficient_in(var);
        let monic = match ext::invert(&lc, below) {
            Ok((m, e)) => match e.as_constant() {
                Some(e) if e.cmp0().is_ne() => ext::reduce(&(&factor * &m).scale(&e.recip()), below),
                _ => return false,
            },
            Err(_) => return false,
        };
        let division = minpoly.pseudo_div(&monic, var);
        let cofactor = ext::reduce(&division.quotient, below);
        debug!(var, factor = %monic, %cofactor, "splitting relation");

        let subject = self.tower.var_expr(var).cloned().unwrap_or_else(|| Expr::int(0));
        let symbols = self.tower.symbols_of(&self.tower.var(var));
        let tower = &self.tower;
        let zero = |_: &Env, prec: u32| Some(rug::Complex::new(prec));
        let vanish_factor = |env: &Env, prec: u32| tower.eval(&monic, env, prec);
        let vanish_cofactor = |env: &Env, prec: u32| tower.eval(&cofactor, env, prec);
        let candidates: [Valuation; 2] = [&vanish_factor, &vanish_cofactor];
        let selection = self.selector.select(
            &subject,
            &symbols,
            self.options,
            &mut *self.sink,
            &zero,
            &candidates,
        );

        let kept = if selection.index == 0 { monic } else { cofactor };
        if kept.degree_in(var) == 1 {
            let value = -&kept.coefficient_in(var, 0);
            self.tower.collapse(var, value);
        } else {
            self.tower.set_minpoly(var, kept);
        }
        true
    }
}
