//! Hard errors of the engine. Recoverable outcomes are [`Diagnostic`]s instead.
//!
//! [`Diagnostic`]: crate::diagnostic::Diagnostic

use ariadne::{Label, Report, ReportKind};
use cas_error::{report_offset, ErrorKind, EXPR};
use std::ops::Range;

/// Builds a report with one label per span, in the style shared by every error of this crate.
pub(crate) fn report<'a>(
    src_id: &'a str,
    spans: &[Range<usize>],
    message: String,
    label: String,
    help: Option<String>,
) -> Report<'static, (&'a str, Range<usize>)> {
    let mut builder = Report::build(ReportKind::Error, src_id, report_offset(spans))
        .with_message(message)
        .with_labels(spans.iter().map(|span| {
            Label::new((src_id, span.clone()))
                .with_message(label.clone())
                .with_color(EXPR)
        }));
    if let Some(help) = help {
        builder.set_help(help);
    }
    builder.finish()
}

/// An expression node has a shape the engine never expects, such as `sqrt` with two arguments or
/// a `rootof` whose minimal polynomial has a zero leading coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedInput {
    /// The offending node, as text.
    pub expr: String,

    /// What is wrong with it.
    pub reason: String,
}

impl ErrorKind for MalformedInput {
    fn message(&self) -> String {
        format!("malformed expression `{}`: {}", self.expr, self.reason)
    }

    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        report(
            src_id,
            spans,
            self.message(),
            self.reason.clone(),
            None,
        )
    }
}

/// The computation was interrupted with [`request_interrupt`].
///
/// [`request_interrupt`]: crate::interrupt::request_interrupt
#[derive(Debug, Clone, PartialEq)]
pub struct UserInterrupt;

impl ErrorKind for UserInterrupt {
    fn message(&self) -> String {
        "interrupted".to_string()
    }

    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        report(
            src_id,
            spans,
            self.message(),
            "the normalization of this expression was abandoned".to_string(),
            Some("clear the interrupt flag and run it again".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_error::Error;

    use pretty_assertions::assert_eq;

    #[test]
    fn malformed_report() {
        let err = Error::new(
            vec![0..10],
            MalformedInput {
                expr: "sqrt(1, 2)".to_string(),
                reason: "expected one argument".to_string(),
            },
        );
        assert_eq!(err.to_string(), "malformed expression `sqrt(1, 2)`: expected one argument");
        let rendered = strip_ansi_escapes::strip_str(err.render("input", "sqrt(1, 2)"));
        assert!(rendered.contains("expected one argument"));
    }

    #[test]
    fn interrupt_report_has_help() {
        let report = report(
            "input",
            &[],
            "interrupted".to_string(),
            "here".to_string(),
            Some("retry".to_string()),
        );
        let mut buf = Vec::new();
        report.write(("input", ariadne::Source::from("x + 1")), &mut buf).unwrap();
        let rendered = strip_ansi_escapes::strip_str(String::from_utf8_lossy(&buf));
        assert!(rendered.contains("interrupted"));
        assert!(rendered.contains("retry"));

        let err = Error::unspanned(UserInterrupt);
        let rendered = strip_ansi_escapes::strip_str(err.render("input", "x + 1"));
        assert!(rendered.contains("clear the interrupt flag"));
    }
}
