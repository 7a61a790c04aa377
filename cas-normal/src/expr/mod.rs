//! The symbolic expression tree consumed and produced by the normal-form engine.
//!
//! An [`Expr`] is a plain tagged tree. Sums and products are n-ary, subtraction is represented as
//! addition of an [`Expr::Neg`] term, and division as multiplication by an [`Expr::Inv`] factor.
//! A power whose exponent is an integer or rational literal is an integer or rational power; any
//! other power is opaque to the engine.
//!
//! # Structural equality
//!
//! The [`PartialEq`], [`Eq`] and [`Hash`] implementations compare trees **structurally**: `x + 1`
//! and `1 + x` are different expressions. This is the equality the engine uses to recognize
//! repeated generators, so the same opaque subexpression must be spelled the same way to be
//! treated as the same generator. Normalizing an expression first makes its spelling canonical.

mod display;
mod iter;

use cas_poly::primitive::int;
use iter::ExprIter;
use rug::{Integer, Rational};
use std::{collections::BTreeSet, ops::{Add, AddAssign, Mul, MulAssign, Neg}};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single term / factor, such as a number, variable, or function call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Primary {
    /// An integer, such as `2` or `-144`.
    Integer(Integer),

    /// A rational number that is not an integer, such as `1/2`.
    Rational(Rational),

    /// A complex literal `re + im*i` with a nonzero imaginary part.
    Complex(Rational, Rational),

    /// A variable, such as `x` or `y`.
    Symbol(String),

    /// A function call, such as `sin(x)` or `f(x, y)`.
    Call(String, Vec<Expr>),

    /// Unsigned infinity. Negative infinity is the negation of this value.
    Infinity,

    /// An undefined value, such as `0/0`.
    Undefined,
}

/// A symbolic expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    /// A single term or factor.
    Primary(Primary),

    /// Multiple terms added together.
    Add(Vec<Expr>),

    /// Multiple factors multiplied together.
    Mul(Vec<Expr>),

    /// The negation of an expression.
    Neg(Box<Expr>),

    /// The reciprocal of an expression.
    Inv(Box<Expr>),

    /// An expression raised to a power.
    Exp(Box<Expr>, Box<Expr>),

    /// `repr(theta)` where `theta` is a root of `minpoly`. Both polynomials are dense coefficient
    /// lists, highest degree first. Which root is meant is fixed by the root convention: the root
    /// with the largest real part, ties broken by the largest imaginary part.
    RootOf(Vec<Expr>, Vec<Expr>),
}

impl Expr {
    /// Creates an integer expression.
    pub fn int<T>(n: T) -> Self
    where
        Integer: From<T>,
    {
        Self::Primary(Primary::Integer(int(n)))
    }

    /// Creates a rational expression, demoted to an integer when the denominator is one.
    pub fn rational(r: Rational) -> Self {
        if *r.denom() == 1 {
            Self::Primary(Primary::Integer(r.into_numer_denom().0))
        } else {
            Self::Primary(Primary::Rational(r))
        }
    }

    /// Creates a complex literal, demoted to a rational when the imaginary part is zero.
    pub fn complex(re: Rational, im: Rational) -> Self {
        if im.cmp0().is_eq() {
            Self::rational(re)
        } else {
            Self::Primary(Primary::Complex(re, im))
        }
    }

    /// The imaginary unit.
    pub fn imaginary() -> Self {
        Self::Primary(Primary::Complex(Rational::new(), Rational::from(1)))
    }

    /// Creates a symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Primary(Primary::Symbol(name.into()))
    }

    /// Creates a function call.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::Primary(Primary::Call(name.into(), args))
    }

    /// Creates an n-ary sum, collapsing zero or one term.
    pub fn sum(terms: Vec<Expr>) -> Self {
        Self::Add(terms).downgrade()
    }

    /// Creates an n-ary product, collapsing zero or one factor.
    pub fn product(factors: Vec<Expr>) -> Self {
        Self::Mul(factors).downgrade()
    }

    /// Returns this expression raised to `exp`. No simplification is done.
    pub fn pow(self, exp: Expr) -> Self {
        Self::Exp(Box::new(self), Box::new(exp))
    }

    /// Returns this expression raised to the rational power `p/q`.
    pub fn pow_ratio(self, p: i64, q: i64) -> Self {
        self.pow(Self::rational(Rational::from((p, q))))
    }

    /// Returns the square root of this expression. No simplification is done.
    pub fn sqrt(self) -> Self {
        self.pow_ratio(1, 2)
    }

    /// Returns the reciprocal of this expression. No simplification is done.
    pub fn recip(self) -> Self {
        Self::Inv(Box::new(self))
    }

    /// If the expression is a [`Primary::Integer`], returns a reference to the contained integer.
    pub fn as_integer(&self) -> Option<&Integer> {
        match self {
            Self::Primary(Primary::Integer(int)) => Some(int),
            _ => None,
        }
    }

    /// If the expression is an integer or rational literal, returns its value.
    pub fn as_rational(&self) -> Option<Rational> {
        match self {
            Self::Primary(Primary::Integer(int)) => Some(Rational::from(int)),
            Self::Primary(Primary::Rational(r)) => Some(r.clone()),
            _ => None,
        }
    }

    /// If the expression is a [`Primary::Symbol`], returns a reference to the contained symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Primary(Primary::Symbol(sym)) => Some(sym),
            _ => None,
        }
    }

    /// Returns true if the expression is the integer zero.
    pub fn is_zero(&self) -> bool {
        self.as_integer().map_or(false, |n| n.cmp0().is_eq())
    }

    /// Returns true if the expression is the integer one.
    pub fn is_one(&self) -> bool {
        self.as_integer().map_or(false, |n| *n == 1)
    }

    /// Trivially downgrades the expression into a simpler form.
    ///
    /// Some operations may result in an [`Expr::Add`] with zero / one term, or an [`Expr::Mul`]
    /// with zero / one factor. This function checks for these cases and simplifies the expression
    /// into the single term / factor, or the integer 0 or 1.
    pub(crate) fn downgrade(self) -> Self {
        match self {
            Self::Add(mut terms) => match terms.len() {
                0 => Self::int(0),
                1 => terms.remove(0),
                _ => Self::Add(terms),
            },
            Self::Mul(mut factors) => match factors.len() {
                0 => Self::int(1),
                1 => factors.remove(0),
                _ => Self::Mul(factors),
            },
            _ => self,
        }
    }

    /// The direct subexpressions of this expression, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Self::Primary(Primary::Call(_, args)) => args.iter().collect(),
            Self::Primary(_) => Vec::new(),
            Self::Add(items) | Self::Mul(items) => items.iter().collect(),
            Self::Neg(inner) | Self::Inv(inner) => vec![&**inner],
            Self::Exp(base, exp) => vec![&**base, &**exp],
            Self::RootOf(repr, minpoly) => repr.iter().chain(minpoly.iter()).collect(),
        }
    }

    /// Returns an iterator that traverses the tree of expressions in left-to-right post-order
    /// (i.e. depth-first).
    pub fn post_order_iter(&self) -> ExprIter {
        ExprIter::new(self)
    }

    /// The names of the symbols occurring anywhere in the expression.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        self.post_order_iter()
            .filter_map(|expr| expr.as_symbol().map(str::to_string))
            .collect()
    }
}

impl From<Primary> for Expr {
    fn from(primary: Primary) -> Self {
        Self::Primary(primary)
    }
}

impl From<Integer> for Expr {
    fn from(n: Integer) -> Self {
        Self::Primary(Primary::Integer(n))
    }
}

impl From<Rational> for Expr {
    fn from(r: Rational) -> Self {
        Self::rational(r)
    }
}

/// Adds two [`Expr`]s together, flattening nested sums.
impl Add for Expr {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for Expr {
    fn add_assign(&mut self, rhs: Self) {
        let lhs = std::mem::replace(self, Self::Add(Vec::new()));
        let mut terms = match lhs {
            Self::Add(terms) => terms,
            other => vec![other],
        };
        match rhs {
            Self::Add(more) => terms.extend(more),
            other => terms.push(other),
        }
        *self = Self::Add(terms);
    }
}

/// Multiplies two [`Expr`]s together, flattening nested products.
impl Mul for Expr {
    type Output = Self;

    fn mul(mut self, rhs: Self) -> Self::Output {
        self *= rhs;
        self
    }
}

impl MulAssign for Expr {
    fn mul_assign(&mut self, rhs: Self) {
        let lhs = std::mem::replace(self, Self::Mul(Vec::new()));
        let mut factors = match lhs {
            Self::Mul(factors) => factors,
            other => vec![other],
        };
        match rhs {
            Self::Mul(more) => factors.extend(more),
            other => factors.push(other),
        }
        *self = Self::Mul(factors);
    }
}

/// Negates an expression. Numeric literals are negated in place.
impl Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Self::Primary(Primary::Integer(n)) => Self::Primary(Primary::Integer(-n)),
            Self::Primary(Primary::Rational(r)) => Self::Primary(Primary::Rational(-r)),
            Self::Primary(Primary::Complex(re, im)) => Self::Primary(Primary::Complex(-re, -im)),
            Self::Neg(inner) => *inner,
            other => Self::Neg(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn flattening_operators() {
        let x = Expr::symbol("x");
        let y = Expr::symbol("y");
        let sum = (x.clone() + y.clone()) + (Expr::int(1) + x.clone());
        assert_eq!(sum, Expr::Add(vec![x.clone(), y.clone(), Expr::int(1), x.clone()]));

        let product = x.clone() * (y.clone() * Expr::int(2));
        assert_eq!(product, Expr::Mul(vec![x, y, Expr::int(2)]));
    }

    #[test]
    fn literal_constructors() {
        assert_eq!(Expr::rational(Rational::from((4, 2))), Expr::int(2));
        assert_eq!(Expr::complex(Rational::from(3), Rational::new()), Expr::int(3));
        assert_eq!(-Expr::int(3), Expr::int(-3));
        assert_eq!(-(-Expr::symbol("x")), Expr::symbol("x"));
        assert_eq!(Expr::sum(vec![]), Expr::int(0));
        assert_eq!(Expr::product(vec![Expr::symbol("z")]), Expr::symbol("z"));
    }

    #[test]
    fn symbols() {
        let expr = Expr::call("sin", vec![Expr::symbol("y")]) + Expr::symbol("x").sqrt();
        let names: Vec<_> = expr.free_symbols().into_iter().collect();
        assert_eq!(names, vec!["x".to_string(), "y".to_string()]);
    }
}
