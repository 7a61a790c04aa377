//! Canonical normal forms of symbolic expressions.
//!
//! An expression is lowered to a canonical fraction `num / den` of polynomials over a tower of
//! generators: ordinary generators for symbols and opaque nodes, and algebraic generators for
//! radicals and `rootof` nodes. Constant algebraic numbers share one primitive element, so
//! numbers such as `sqrt(2) * sqrt(3)` and `sqrt(6)` cancel. Two expressions have the same
//! normal form exactly when their fractions are equal.
//!
//! ```
//! use cas_normal::{normalize, parse, NormalOptions};
//!
//! let expr = parse("(x^2 - 1)/(x - 1) + sqrt(8)").unwrap();
//! let normal = normalize(&expr, &NormalOptions::default()).unwrap();
//! assert_eq!(normal.expr.to_string(), "x + 1 + 2*sqrt(2)");
//! assert!(normal.complete);
//! ```
//!
//! Problems that do not stop the computation, such as a branch that was picked at a random
//! point, are reported as [`Diagnostic`]s. Everything else is a [`cas_error::Error`].
//!
//! # Features
//!
//! - `serde`: Derives `Serialize` and `Deserialize` for the options and the polynomial types.

pub mod assume;
pub mod branch;
pub mod classify;
pub mod ctxt;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod expr;
pub mod interrupt;
pub mod kernel;
pub mod numeric;
pub mod parse;
pub mod tower;

mod convert;
mod merge;
mod proptests;
mod render;

pub use assume::{Assumptions, Interval};
pub use ctxt::NormalOptions;
pub use diagnostic::{Diagnostic, DiagnosticSink};
pub use engine::Engine;
pub use expr::{Expr, Primary};
pub use interrupt::{clear_interrupt, is_interrupted, request_interrupt};
pub use kernel::Frac;
pub use parse::parse;
pub use tower::Tower;

use cas_error::Error;
use classify::classify;
use tracing::debug;

/// The result of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The normal form.
    pub expr: Expr,

    /// False if some subexpression was kept as an opaque generator, in which case equal values may
    /// still have different normal forms.
    pub complete: bool,

    /// Everything that was reported along the way.
    pub diagnostics: Vec<Diagnostic>,
}

/// A canonical fraction together with the tower it lives in.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalFraction {
    tower: Tower,
    frac: Frac,
    complete: bool,
}

impl CanonicalFraction {
    pub fn tower(&self) -> &Tower {
        &self.tower
    }

    pub fn frac(&self) -> &Frac {
        &self.frac
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_zero(&self) -> bool {
        self.frac.is_zero()
    }

    /// The numerator, written over the generators' expressions.
    pub fn numerator(&self, options: &NormalOptions) -> Expr {
        self.render_part(&self.frac.num, options)
    }

    /// The denominator, written over the generators' expressions.
    pub fn denominator(&self, options: &NormalOptions) -> Expr {
        self.render_part(&self.frac.den, options)
    }

    fn render_part(&self, p: &cas_poly::Poly, options: &NormalOptions) -> Expr {
        let mut discard = ();
        let mut engine = Engine::with_tower(options, &mut discard, self.tower.clone());
        engine.render_poly(p)
    }
}

/// Computes the normal form of `expr`, collecting diagnostics into the result.
pub fn normalize(expr: &Expr, options: &NormalOptions) -> Result<Normalized, Error> {
    let mut diagnostics = Vec::new();
    let (expr, complete) = normalize_with(expr, options, &mut diagnostics)?;
    Ok(Normalized { expr, complete, diagnostics })
}

/// Computes the normal form of `expr`, handing diagnostics to `sink`. Returns the normal form and
/// whether it is complete.
pub fn normalize_with(
    expr: &Expr,
    options: &NormalOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<(Expr, bool), Error> {
    interrupt::poll()?;
    let mut engine = Engine::new(options, sink);
    let frac = engine.lower(expr, &[])?;
    let normal = engine.render(&frac);
    debug!(input = %expr, output = %normal, complete = engine.is_complete(), "normalized");
    Ok((normal, engine.is_complete()))
}

/// Computes the normal form of `expr` with radicals and `rootof` nodes treated as opaque
/// generators.
pub fn ratnormal(expr: &Expr, options: &NormalOptions) -> Result<Normalized, Error> {
    let options = NormalOptions { extensions: false, ..options.clone() };
    normalize(expr, &options)
}

/// Lowers `expr` to a canonical fraction. The `hint` expressions become the first ordinary
/// generators, in order.
pub fn to_canonical_fraction(
    expr: &Expr,
    hint: &[Expr],
    options: &NormalOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<CanonicalFraction, Error> {
    interrupt::poll()?;
    let mut engine = Engine::new(options, sink);
    let frac = engine.lower(expr, hint)?;
    let complete = engine.is_complete();
    Ok(CanonicalFraction { tower: engine.into_tower(), frac, complete })
}

/// Writes a canonical fraction back as an expression.
pub fn fraction_to_expression(
    fraction: &CanonicalFraction,
    options: &NormalOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<Expr, Error> {
    interrupt::poll()?;
    let mut engine = Engine::with_tower(options, sink, fraction.tower.clone());
    Ok(engine.render(&fraction.frac))
}

/// The generators of `expr`, by tier. Tier 0 holds the ordinary generators, and each higher tier
/// the algebraic nodes whose coefficients only use lower tiers.
pub fn generators(expr: &Expr, options: &NormalOptions) -> Result<Vec<Vec<Expr>>, Error> {
    interrupt::poll()?;
    let mut discard = ();
    let mut engine = Engine::new(options, &mut discard);
    let prepared = engine.prepare(expr)?;
    Ok(classify(&prepared, &[], options)?.tiers())
}
