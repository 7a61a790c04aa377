//! Recoverable outcomes of a normalization.
//!
//! None of these stop the computation. Each one is logged at `warn` level and pushed to the
//! caller's [`DiagnosticSink`].

use crate::expr::Expr;
use rug::Rational;
use std::fmt;
use tracing::warn;

/// Something the caller should know about a result that is otherwise usable.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A subexpression could not be rationalized and was kept as an opaque generator.
    ConversionIncomplete {
        expr: Expr,
    },

    /// Merging a constant extension into the tower would exceed the degree limit, so it was
    /// stacked on its own. Numbers in the two extensions do not cancel against each other.
    ExtensionTooLarge {
        degree: usize,
        limit: usize,
    },

    /// The branch of a root could not be decided. The first candidate was used.
    UnresolvedBranch {
        expr: Expr,
    },

    /// The branch of a root was decided at a random point of the free symbols, so the choice
    /// holds there but is not proven elsewhere.
    HeuristicBranch {
        expr: Expr,

        /// The witness values of the symbols without recorded assumptions.
        witness: Vec<(String, Rational)>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConversionIncomplete { expr } => {
                write!(f, "`{}` was kept as an opaque generator", expr)
            },
            Self::ExtensionTooLarge { degree, limit } => write!(
                f,
                "merged extension of degree {} exceeds the limit of {}; stacking instead",
                degree, limit,
            ),
            Self::UnresolvedBranch { expr } => {
                write!(f, "could not decide the branch of `{}`; using the first candidate", expr)
            },
            Self::HeuristicBranch { expr, witness } => {
                write!(f, "choosing root of `{}` at parameter values ", expr)?;
                for (i, (name, value)) in witness.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", name, value)?;
                }
                Ok(())
            },
        }
    }
}

/// A one-way channel for diagnostics.
pub trait DiagnosticSink {
    fn push(&mut self, diagnostic: Diagnostic);
}

/// Discards every diagnostic.
impl DiagnosticSink for () {
    fn push(&mut self, _: Diagnostic) {}
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn push(&mut self, diagnostic: Diagnostic) {
        Vec::push(self, diagnostic);
    }
}

/// Logs the diagnostic, then hands it to the sink.
pub(crate) fn emit(sink: &mut dyn DiagnosticSink, diagnostic: Diagnostic) {
    warn!("{}", diagnostic);
    sink.push(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_poly::primitive::rat;

    use pretty_assertions::assert_eq;

    #[test]
    fn heuristic_message() {
        let diagnostic = Diagnostic::HeuristicBranch {
            expr: Expr::symbol("x").pow(Expr::int(2)).sqrt(),
            witness: vec![("x".to_string(), rat(3, 211))],
        };
        assert_eq!(
            diagnostic.to_string(),
            "choosing root of `sqrt(x^2)` at parameter values x = 3/211",
        );
    }

    #[test]
    fn sinks() {
        let mut kept = Vec::<Diagnostic>::new();
        emit(&mut kept, Diagnostic::ExtensionTooLarge { degree: 32, limit: 16 });
        assert_eq!(kept.len(), 1);
        emit(&mut (), Diagnostic::UnresolvedBranch { expr: Expr::int(1) });
    }
}
