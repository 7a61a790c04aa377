//! Text rendering of expressions.
//!
//! Sums are written with spaces around `+` and `-`; products, quotients and powers without.
//! Square roots are written `sqrt(..)`, other rational powers `b^(p/q)`.

use super::{Expr, Primary};
use rug::Rational;
use std::fmt::{self, Display, Formatter};

impl Display for Primary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Rational(r) => write!(f, "{}", r),
            Self::Complex(re, im) => fmt_complex(f, re, im),
            Self::Symbol(sym) => write!(f, "{}", sym),
            Self::Call(name, args) => {
                write!(f, "{}(", name)?;
                fmt_list(f, args)?;
                write!(f, ")")
            },
            Self::Infinity => write!(f, "infinity"),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

fn fmt_complex(f: &mut Formatter<'_>, re: &Rational, im: &Rational) -> fmt::Result {
    let imag = |f: &mut Formatter<'_>, im: &Rational| {
        if *im == 1 {
            write!(f, "i")
        } else if *im.denom() == 1 {
            write!(f, "{}*i", im)
        } else {
            write!(f, "({})*i", im)
        }
    };

    if re.cmp0().is_eq() {
        if *im == -1 {
            return write!(f, "-i");
        }
        return imag(f, im);
    }

    write!(f, "{}", re)?;
    if im.cmp0().is_lt() {
        write!(f, " - ")?;
        imag(f, &Rational::from(-im))
    } else {
        write!(f, " + ")?;
        imag(f, im)
    }
}

fn fmt_list(f: &mut Formatter<'_>, items: &[Expr]) -> fmt::Result {
    let mut iter = items.iter();
    if let Some(item) = iter.next() {
        write!(f, "{}", item)?;
        for item in iter {
            write!(f, ", {}", item)?;
        }
    }
    Ok(())
}

/// If `term` reads as a negative quantity, returns its absolute form so a sum can print it after
/// a ` - `.
fn negated(term: &Expr) -> Option<Expr> {
    match term {
        Expr::Neg(inner) => Some((**inner).clone()),
        Expr::Primary(Primary::Integer(n)) if n.cmp0().is_lt() => Some(-term.clone()),
        Expr::Primary(Primary::Rational(r)) if r.cmp0().is_lt() => Some(-term.clone()),
        Expr::Primary(Primary::Complex(re, im))
            if re.cmp0().is_lt() || (re.cmp0().is_eq() && im.cmp0().is_lt()) =>
        {
            Some(-term.clone())
        },
        Expr::Mul(factors) => {
            let (first, rest) = factors.split_first()?;
            let positive = negated(first)?;
            let mut factors = Vec::with_capacity(factors.len());
            if !positive.is_one() || rest.is_empty() {
                factors.push(positive);
            }
            factors.extend(rest.iter().cloned());
            Some(Expr::product(factors))
        },
        _ => None,
    }
}

/// Returns true if `expr` is a negative integer or rational literal.
fn is_negative_number(expr: &Expr) -> bool {
    match expr {
        Expr::Primary(Primary::Integer(n)) => n.cmp0().is_lt(),
        Expr::Primary(Primary::Rational(r)) => r.cmp0().is_lt(),
        _ => false,
    }
}

/// Returns true if `expr` must be parenthesized as a factor of a product.
fn paren_in_product(expr: &Expr, first: bool) -> bool {
    match expr {
        Expr::Add(_) | Expr::Inv(_) => true,
        Expr::Neg(_) => !first,
        Expr::Primary(Primary::Rational(_)) => true,
        Expr::Primary(Primary::Complex(re, im)) => re.cmp0().is_ne() || (!first && im.cmp0().is_lt()),
        Expr::Primary(Primary::Integer(n)) => !first && n.cmp0().is_lt(),
        _ => false,
    }
}

/// Returns true if `expr` must be parenthesized as the base of a power or as a denominator.
fn paren_as_operand(expr: &Expr) -> bool {
    match expr {
        Expr::Primary(Primary::Integer(n)) => n.cmp0().is_lt(),
        Expr::Primary(Primary::Rational(_)) => true,
        Expr::Primary(Primary::Complex(re, im)) => re.cmp0().is_ne() || *im != 1,
        Expr::Primary(_) | Expr::RootOf(..) => false,
        _ => true,
    }
}

fn fmt_operand(f: &mut Formatter<'_>, expr: &Expr, paren: bool) -> fmt::Result {
    if paren {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

fn fmt_product(f: &mut Formatter<'_>, factors: &[Expr]) -> fmt::Result {
    let mut numer: Vec<&Expr> = Vec::new();
    let mut denom: Vec<&Expr> = Vec::new();
    for factor in factors {
        match factor {
            Expr::Inv(inner) => denom.push(&**inner),
            other => numer.push(other),
        }
    }

    if numer.len() > 1 || (!numer.is_empty() && !denom.is_empty()) {
        if let Some(Expr::Primary(Primary::Integer(n))) = numer.first() {
            if *n == -1 {
                write!(f, "-")?;
                numer.remove(0);
            }
        }
    }

    if numer.is_empty() {
        write!(f, "1")?;
    }
    for (i, factor) in numer.iter().enumerate() {
        if i > 0 {
            write!(f, "*")?;
        }
        fmt_operand(f, factor, paren_in_product(factor, i == 0))?;
    }

    match denom.as_slice() {
        [] => Ok(()),
        [single] => {
            write!(f, "/")?;
            let paren = matches!(single, Expr::Mul(_)) || paren_as_operand(single)
                && !matches!(single, Expr::Exp(..));
            fmt_operand(f, single, paren)
        },
        many => {
            write!(f, "/(")?;
            for (i, factor) in many.iter().enumerate() {
                if i > 0 {
                    write!(f, "*")?;
                }
                fmt_operand(f, factor, paren_in_product(factor, i == 0))?;
            }
            write!(f, ")")
        },
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary(primary) => write!(f, "{}", primary),
            Self::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    match (i, negated(term)) {
                        (0, _) => fmt_operand(f, term, matches!(term, Self::Add(_)))?,
                        (_, Some(positive)) => {
                            write!(f, " - ")?;
                            fmt_operand(f, &positive, matches!(positive, Self::Add(_)))?;
                        },
                        (_, None) => {
                            write!(f, " + ")?;
                            fmt_operand(f, term, matches!(term, Self::Add(_)))?;
                        },
                    }
                }
                Ok(())
            },
            Self::Mul(factors) => fmt_product(f, factors),
            Self::Neg(inner) => {
                write!(f, "-")?;
                fmt_operand(f, inner, matches!(**inner, Self::Add(_) | Self::Neg(_)) || is_negative_number(inner))
            },
            Self::Inv(inner) => {
                write!(f, "1/")?;
                fmt_operand(f, inner, !matches!(**inner, Self::Exp(..)) && paren_as_operand(inner))
            },
            Self::Exp(base, exp) => {
                if let Some(r) = exp.as_rational() {
                    if r == Rational::from((1, 2)) {
                        return write!(f, "sqrt({})", base);
                    }
                }
                fmt_operand(f, base, paren_as_operand(base))?;
                write!(f, "^")?;
                let bare = match &**exp {
                    Self::Primary(Primary::Integer(n)) => n.cmp0().is_ge(),
                    Self::Primary(Primary::Symbol(_) | Primary::Call(..)) => true,
                    _ => false,
                };
                fmt_operand(f, exp, !bare)
            },
            Self::RootOf(repr, minpoly) => {
                write!(f, "rootof([")?;
                fmt_list(f, repr)?;
                write!(f, "], [")?;
                fmt_list(f, minpoly)?;
                write!(f, "])")
            },
        }
    }
}
