//! Contains the common [`ErrorKind`] trait used by all hard errors of the normal-form engine to
//! display user-facing error messages.
//!
//! Errors carry the byte spans of the input they originated from, if any. Errors raised on an
//! expression tree built in code rather than read from text carry no spans; their reports point
//! at the start of the source.

use ariadne::{Color, Report, Source};
use std::{fmt::{self, Debug}, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur during normalization or while reading input.
pub trait ErrorKind: Debug + Send {
    /// A one-line description of the error, used as the report title and by [`Display`].
    ///
    /// [`Display`]: std::fmt::Display
    fn message(&self) -> String;

    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)>;
}

/// An error associated with regions of source code that can be highlighted.
#[derive(Debug)]
pub struct Error {
    /// The regions of the source code that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given spans and kind.
    pub fn new(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self { spans, kind: Box::new(kind) }
    }

    /// Creates an error that is not tied to any source text.
    pub fn unspanned(kind: impl ErrorKind + 'static) -> Self {
        Self::new(Vec::new(), kind)
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<(&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }

    /// Renders the report against `src` into a string, color codes included.
    pub fn render(&self, src_id: &str, src: &str) -> String {
        let mut buf = Vec::new();
        // writing into a `Vec` cannot fail
        let _ = self.build_report(src_id).write((src_id, Source::from(src)), &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.message())
    }
}

impl std::error::Error for Error {}

/// The offset a report starts at: the first span, or the start of the source.
pub fn report_offset(spans: &[Range<usize>]) -> usize {
    spans.first().map_or(0, |span| span.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ariadne::{Label, ReportKind};

    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct UnexpectedComma;

    impl ErrorKind for UnexpectedComma {
        fn message(&self) -> String {
            "unexpected `,`".to_string()
        }

        fn build_report<'a>(
            &self,
            src_id: &'a str,
            spans: &[Range<usize>],
        ) -> Report<(&'a str, Range<usize>)> {
            let mut builder = Report::build(ReportKind::Error, src_id, report_offset(spans))
                .with_message(self.message())
                .with_labels(spans.iter().map(|span| {
                    Label::new((src_id, span.clone()))
                        .with_message("this comma")
                        .with_color(EXPR)
                }));
            builder.set_help("remove the comma");
            builder.finish()
        }
    }

    #[test]
    fn display_uses_message() {
        let err = Error::new(vec![1..2], UnexpectedComma);
        assert_eq!(err.to_string(), "unexpected `,`");
    }

    #[test]
    fn rendered_report() {
        let err = Error::new(vec![1..2], UnexpectedComma);
        let rendered = strip_ansi_escapes::strip_str(err.render("input", "x, y"));
        assert!(rendered.contains("unexpected `,`"));
        assert!(rendered.contains("this comma"));
        assert!(rendered.contains("remove the comma"));
    }

    #[test]
    fn unspanned_report() {
        let err = Error::unspanned(UnexpectedComma);
        assert_eq!(err.spans, Vec::<Range<usize>>::new());
        let rendered = strip_ansi_escapes::strip_str(err.render("input", "x + 1"));
        assert!(rendered.contains("unexpected `,`"));
    }
}
