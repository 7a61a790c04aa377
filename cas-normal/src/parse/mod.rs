//! A small reader that turns text such as `sqrt(8) + (x^2 - 1)/(x - 1)` into an [`Expr`].
//!
//! The grammar, loosest binding first:
//!
//! ```text
//! sum     = product (("+" | "-") product)*
//! product = unary (("*" | "/") unary | implicit)*
//! unary   = "-" unary | power
//! power   = primary ("^" unary)?
//! primary = number | name | name "(" args ")" | "(" sum ")"
//! ```
//!
//! Implicit multiplication applies between a number and a following name or parenthesis, so
//! `2x` and `3(x + 1)` are products. Decimals are read exactly: `1.5` is `3/2`.
//!
//! A few names are special: `i` is the imaginary unit, `infinity` and `undefined` are the
//! sentinels, `sqrt(a)`, `cbrt(a)` and `root(a, n)` become rational powers, and
//! `rootof([..], [..])` becomes an [`Expr::RootOf`] node.

pub mod error;
pub mod token;

use crate::expr::{Expr, Primary};
use cas_error::{Error, ErrorKind};
use rug::{Integer, Rational};
use std::ops::Range;
use token::{tokenize_complete, Token, TokenKind};

/// Reads an expression from text.
pub fn parse(source: &str) -> Result<Expr, Error> {
    let mut parser = Parser::new(source);
    let expr = parser.parse_sum()?;
    match parser.current_token() {
        Some(token) => Err(parser.error(error::UnexpectedToken { found: token.lexeme.to_string() })),
        None => Ok(expr),
    }
}

/// A recursive-descent parser over the non-whitespace tokens of the source.
#[derive(Debug, Clone)]
pub struct Parser<'source> {
    /// The tokens that this parser is currently parsing.
    tokens: Box<[Token<'source>]>,

    /// The index of the **next** token to be parsed.
    cursor: usize,

    /// The length of the source, used for spans at the end of input.
    len: usize,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            tokens: tokenize_complete(source),
            cursor: 0,
            len: source.len(),
        }
    }

    /// Creates an error that points at the current token, or the end of the source code if the
    /// cursor is at the end of the stream.
    pub fn error(&self, kind: impl ErrorKind + 'static) -> Error {
        Error::new(vec![self.span()], kind)
    }

    /// Returns the span of the current token, or the end of the source code if the cursor is at
    /// the end of the stream.
    pub fn span(&self) -> Range<usize> {
        self.tokens
            .get(self.cursor)
            .map_or(self.len..self.len, |token| token.span.clone())
    }

    /// Returns the current token. The cursor is not moved.
    pub fn current_token(&self) -> Option<&Token<'source>> {
        self.tokens.get(self.cursor)
    }

    /// Returns true if the current token has the given kind.
    fn at(&self, kind: TokenKind) -> bool {
        self.current_token().map_or(false, |token| token.kind == kind)
    }

    /// Returns the next token to be parsed, then advances the cursor.
    ///
    /// Returns an EOF error if there are no more tokens.
    pub fn next_token(&mut self) -> Result<Token<'source>, Error> {
        let token = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| self.error(error::UnexpectedEof))?;
        self.cursor += 1;
        Ok(token)
    }

    /// Consumes the closing delimiter matching the one opened at `open_span`.
    fn expect_close(&mut self, close: TokenKind, open: char, open_span: Range<usize>) -> Result<(), Error> {
        if self.at(close) {
            self.cursor += 1;
            Ok(())
        } else if self.current_token().is_none() {
            Err(Error::new(vec![open_span], error::Unclosed { open }))
        } else {
            let found = self.tokens[self.cursor].lexeme.to_string();
            Err(self.error(error::UnexpectedToken { found }))
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, Error> {
        let mut terms = vec![self.parse_product()?];
        loop {
            if self.at(TokenKind::Add) {
                self.cursor += 1;
                terms.push(self.parse_product()?);
            } else if self.at(TokenKind::Sub) {
                self.cursor += 1;
                terms.push(-self.parse_product()?);
            } else {
                break;
            }
        }
        Ok(Expr::sum(terms))
    }

    fn parse_product(&mut self) -> Result<Expr, Error> {
        let first_is_number = self.at(TokenKind::Int) || self.at(TokenKind::Decimal);
        let mut factors = vec![self.parse_unary()?];
        let mut implicit_ok = first_is_number;
        loop {
            if self.at(TokenKind::Mul) {
                self.cursor += 1;
                implicit_ok = self.at(TokenKind::Int) || self.at(TokenKind::Decimal);
                factors.push(self.parse_unary()?);
            } else if self.at(TokenKind::Div) {
                self.cursor += 1;
                implicit_ok = false;
                factors.push(self.parse_unary()?.recip());
            } else if implicit_ok
                && self.current_token().map_or(false, |token| token.kind.starts_operand())
            {
                implicit_ok = false;
                factors.push(self.parse_power()?);
            } else {
                break;
            }
        }
        Ok(Expr::product(factors))
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        if self.at(TokenKind::Sub) {
            self.cursor += 1;
            return Ok(-self.parse_unary()?);
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, Error> {
        let base = self.parse_primary()?;
        if self.at(TokenKind::Exp) {
            self.cursor += 1;
            let exp = self.parse_unary()?;
            return Ok(base.pow(exp));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Int => {
                let n = Integer::from_str_radix(token.lexeme, 10).map_err(|_| {
                    Error::new(vec![token.span.clone()], error::InvalidNumber {
                        literal: token.lexeme.to_string(),
                    })
                })?;
                Ok(Expr::from(n))
            },
            TokenKind::Decimal => Ok(Expr::rational(parse_decimal(&token)?)),
            TokenKind::OpenParen => {
                let inner = self.parse_sum()?;
                self.expect_close(TokenKind::CloseParen, '(', token.span)?;
                Ok(inner)
            },
            TokenKind::Name if self.at(TokenKind::OpenParen) => self.parse_call(token),
            TokenKind::Name => Ok(match token.lexeme {
                "i" => Expr::imaginary(),
                "infinity" => Expr::Primary(Primary::Infinity),
                "undefined" => Expr::Primary(Primary::Undefined),
                name => Expr::symbol(name),
            }),
            _ => {
                self.cursor -= 1;
                Err(self.error(error::UnexpectedToken { found: token.lexeme.to_string() }))
            },
        }
    }

    /// Parses the argument list of a call to `name`, with the cursor on the opening parenthesis.
    fn parse_call(&mut self, name: Token<'source>) -> Result<Expr, Error> {
        let open = self.next_token()?;
        if name.lexeme == "rootof" {
            return self.parse_rootof(name, open.span);
        }

        let mut args = Vec::new();
        if !self.at(TokenKind::CloseParen) {
            args.push(self.parse_sum()?);
            while self.at(TokenKind::Comma) {
                self.cursor += 1;
                args.push(self.parse_sum()?);
            }
        }
        self.expect_close(TokenKind::CloseParen, '(', open.span)?;

        let index = match (name.lexeme, args.len()) {
            ("root", 2) => args[1].as_integer().filter(|n| **n >= 1).cloned(),
            _ => None,
        };
        Ok(match (name.lexeme, args.len(), index) {
            ("sqrt", 1, _) => args.remove(0).sqrt(),
            ("cbrt", 1, _) => args.remove(0).pow_ratio(1, 3),
            ("root", 2, Some(n)) => args.remove(0).pow(Expr::rational(Rational::from((1, n)))),
            (name, _, _) => Expr::call(name, args),
        })
    }

    /// Parses `([..], [..])` after `rootof`.
    fn parse_rootof(&mut self, name: Token<'source>, open: Range<usize>) -> Result<Expr, Error> {
        let whole = name.span.start..self.span().end;
        let expected = |_| Error::new(vec![whole.clone()], error::ExpectedCoefficientLists);

        let repr = self.parse_list().map_err(expected)?;
        if !self.at(TokenKind::Comma) {
            return Err(Error::new(vec![whole.clone()], error::ExpectedCoefficientLists));
        }
        self.cursor += 1;
        let minpoly = self.parse_list().map_err(expected)?;
        self.expect_close(TokenKind::CloseParen, '(', open)?;
        Ok(Expr::RootOf(repr, minpoly))
    }

    /// Parses `[a, b, ...]`.
    fn parse_list(&mut self) -> Result<Vec<Expr>, Error> {
        let open = self.next_token()?;
        if open.kind != TokenKind::OpenBracket {
            self.cursor -= 1;
            return Err(self.error(error::UnexpectedToken { found: open.lexeme.to_string() }));
        }

        let mut items = Vec::new();
        if !self.at(TokenKind::CloseBracket) {
            items.push(self.parse_sum()?);
            while self.at(TokenKind::Comma) {
                self.cursor += 1;
                items.push(self.parse_sum()?);
            }
        }
        self.expect_close(TokenKind::CloseBracket, '[', open.span)?;
        Ok(items)
    }
}

/// Reads a decimal literal such as `12.25` exactly.
fn parse_decimal(token: &Token) -> Result<Rational, Error> {
    let invalid = || {
        Error::new(vec![token.span.clone()], error::InvalidNumber {
            literal: token.lexeme.to_string(),
        })
    };
    let (whole, frac) = token.lexeme.split_once('.').ok_or_else(invalid)?;
    let digits = format!("{}{}", whole, frac);
    let numer = Integer::from_str_radix(&digits, 10).map_err(|_| invalid())?;
    let denom = Integer::from(Integer::u_pow_u(10, frac.len() as u32));
    Ok(Rational::from((numer, denom)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn x() -> Expr {
        Expr::symbol("x")
    }

    #[test]
    fn precedence() {
        let expr = parse("x^2 - 2x + 1").unwrap();
        assert_eq!(expr, Expr::Add(vec![
            x().pow(Expr::int(2)),
            Expr::Neg(Box::new(Expr::Mul(vec![Expr::int(2), x()]))),
            Expr::int(1),
        ]));
    }

    #[test]
    fn quotient_and_unary_minus() {
        let expr = parse("-x^2/(x - 1)").unwrap();
        assert_eq!(expr, Expr::Mul(vec![
            Expr::Neg(Box::new(x().pow(Expr::int(2)))),
            Expr::Add(vec![x(), Expr::int(-1)]).recip(),
        ]));
    }

    #[test]
    fn right_associative_powers() {
        let expr = parse("2^3^x").unwrap();
        assert_eq!(expr, Expr::int(2).pow(Expr::int(3).pow(x())));
        assert_eq!(parse("2^-1").unwrap(), Expr::int(2).pow(Expr::int(-1)));
    }

    #[test]
    fn special_names() {
        assert_eq!(parse("sqrt(8)").unwrap(), Expr::int(8).sqrt());
        assert_eq!(parse("root(x, 4)").unwrap(), x().pow_ratio(1, 4));
        assert_eq!(parse("cbrt(-8)").unwrap(), Expr::int(-8).pow_ratio(1, 3));
        assert_eq!(parse("1 + 2i").unwrap(), Expr::Add(vec![
            Expr::int(1),
            Expr::Mul(vec![Expr::int(2), Expr::imaginary()]),
        ]));
        assert_eq!(parse("sin(x, y)").unwrap(), Expr::call("sin", vec![x(), Expr::symbol("y")]));
    }

    #[test]
    fn decimals_are_exact() {
        assert_eq!(parse("1.25").unwrap(), Expr::rational(Rational::from((5, 4))));
        assert_eq!(parse("3.").unwrap(), Expr::int(3));
    }

    #[test]
    fn rootof_node() {
        let expr = parse("rootof([1, 0], [1, 0, -2])").unwrap();
        assert_eq!(expr, Expr::RootOf(
            vec![Expr::int(1), Expr::int(0)],
            vec![Expr::int(1), Expr::int(0), Expr::int(-2)],
        ));
    }

    #[test]
    fn reader_errors() {
        let err = parse("(x + 1").unwrap_err();
        assert_eq!(format!("{:?}", err.kind), "Unclosed { open: '(' }");
        assert_eq!(err.spans, vec![0..1]);

        let err = parse("x +").unwrap_err();
        assert_eq!(format!("{:?}", err.kind), "UnexpectedEof");

        let err = parse("x $ 1").unwrap_err();
        assert_eq!(err.to_string(), "unexpected `$`");
        assert_eq!(err.spans, vec![2..3]);

        let err = parse("rootof(x)").unwrap_err();
        assert_eq!(format!("{:?}", err.kind), "ExpectedCoefficientLists");
    }
}
