//! Errors reported while reading an expression from text.

use crate::error::report;
use ariadne::{Fmt, Report};
use cas_error::{ErrorKind, EXPR};
use std::ops::Range;

/// An unexpected token was encountered.
#[derive(Debug, Clone, PartialEq)]
pub struct UnexpectedToken {
    /// The text of the token that was found.
    pub found: String,
}

impl ErrorKind for UnexpectedToken {
    fn message(&self) -> String {
        format!("unexpected `{}`", self.found)
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
            format!("I expected to see an {} here", "expression".fg(EXPR)),
            None,
        )
    }
}

/// The end of the source code was reached unexpectedly.
#[derive(Debug, Clone, PartialEq)]
pub struct UnexpectedEof;

impl ErrorKind for UnexpectedEof {
    fn message(&self) -> String {
        "unexpected end of input".to_string()
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
            format!("you might need to add another {} here", "expression".fg(EXPR)),
            None,
        )
    }
}

/// A parenthesis or bracket was opened but never closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Unclosed {
    /// The delimiter that was left open, `(` or `[`.
    pub open: char,
}

impl ErrorKind for Unclosed {
    fn message(&self) -> String {
        format!("unclosed `{}`", self.open)
    }

    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        let close = if self.open == '(' { ')' } else { ']' };
        report(
            src_id,
            spans,
            self.message(),
            "this delimiter is never closed".to_string(),
            Some(format!("add a `{}` to close it", close)),
        )
    }
}

/// A numeric literal could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidNumber {
    /// The literal text.
    pub literal: String,
}

impl ErrorKind for InvalidNumber {
    fn message(&self) -> String {
        format!("invalid number `{}`", self.literal)
    }

    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)> {
        report(src_id, spans, self.message(), "this number".to_string(), None)
    }
}

/// `rootof` was called without its two coefficient lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedCoefficientLists;

impl ErrorKind for ExpectedCoefficientLists {
    fn message(&self) -> String {
        "expected two coefficient lists".to_string()
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
            format!("this {} needs two lists", "rootof".fg(EXPR)),
            Some("write `rootof([repr coefficients], [minimal polynomial coefficients])`, highest degree first".to_string()),
        )
    }
}
