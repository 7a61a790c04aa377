use logos::{Lexer, Logos};
use std::ops::Range;

/// The different kinds of tokens that can be produced by the tokenizer.
#[derive(Logos, Clone, Copy, Debug, PartialEq)]
pub enum TokenKind {
    #[regex(r"[ \t\n\r]+")]
    Whitespace,

    #[token("+")]
    Add,

    #[token("-")]
    Sub,

    #[token("*")]
    Mul,

    #[token("/")]
    Div,

    #[token("^")]
    Exp,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Name,

    #[token(",")]
    Comma,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token("[")]
    OpenBracket,

    #[token("]")]
    CloseBracket,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"[0-9]+\.[0-9]*")]
    Decimal,

    #[regex(r".", priority = 0)]
    Symbol,
}

impl TokenKind {
    /// Returns true if a token of this kind can start an operand, which makes it eligible for
    /// implicit multiplication after a number.
    pub fn starts_operand(self) -> bool {
        matches!(self, TokenKind::Name | TokenKind::OpenParen)
    }
}

/// A token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'source> {
    /// The region of the source code that this token originated from.
    pub span: Range<usize>,

    /// The kind of token.
    pub kind: TokenKind,

    /// The raw lexeme that was parsed into this token.
    pub lexeme: &'source str,
}

/// Returns an iterator over the token kinds produced by the tokenizer.
pub fn tokenize(input: &str) -> Lexer<TokenKind> {
    TokenKind::lexer(input)
}

/// Returns all non-whitespace tokens of the input. Characters the tokenizer does not recognize
/// come out as [`TokenKind::Symbol`] tokens, which the parser reports.
pub fn tokenize_complete(input: &str) -> Box<[Token]> {
    let mut lexer = tokenize(input);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let kind = result.unwrap_or(TokenKind::Symbol);
        if kind != TokenKind::Whitespace {
            tokens.push(Token {
                span: lexer.span(),
                kind,
                lexeme: lexer.slice(),
            });
        }
    }

    tokens.into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    /// Compares the tokens produced by the tokenizer to the raw expected tokens.
    fn compare_tokens<const N: usize>(input: &str, expected: [(TokenKind, &str); N]) {
        let tokens = tokenize_complete(input);
        let actual: Vec<_> = tokens.iter().map(|t| (t.kind, t.lexeme)).collect();
        assert_eq!(actual, expected.to_vec());
    }

    #[test]
    fn radical_expr() {
        compare_tokens("2*sqrt(8) - 1.5", [
            (TokenKind::Int, "2"),
            (TokenKind::Mul, "*"),
            (TokenKind::Name, "sqrt"),
            (TokenKind::OpenParen, "("),
            (TokenKind::Int, "8"),
            (TokenKind::CloseParen, ")"),
            (TokenKind::Sub, "-"),
            (TokenKind::Decimal, "1.5"),
        ]);
    }

    #[test]
    fn rootof_lists() {
        compare_tokens("rootof([1,0],[1,0,-2])", [
            (TokenKind::Name, "rootof"),
            (TokenKind::OpenParen, "("),
            (TokenKind::OpenBracket, "["),
            (TokenKind::Int, "1"),
            (TokenKind::Comma, ","),
            (TokenKind::Int, "0"),
            (TokenKind::CloseBracket, "]"),
            (TokenKind::Comma, ","),
            (TokenKind::OpenBracket, "["),
            (TokenKind::Int, "1"),
            (TokenKind::Comma, ","),
            (TokenKind::Int, "0"),
            (TokenKind::Comma, ","),
            (TokenKind::Sub, "-"),
            (TokenKind::Int, "2"),
            (TokenKind::CloseBracket, "]"),
            (TokenKind::CloseParen, ")"),
        ]);
    }

    #[test]
    fn unknown_character() {
        compare_tokens("x $ 1", [
            (TokenKind::Name, "x"),
            (TokenKind::Symbol, "$"),
            (TokenKind::Int, "1"),
        ]);
    }
}
