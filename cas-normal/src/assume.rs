//! A store of sign and range facts about symbols.
//!
//! The branch selector consults the store to decide which root a radical denotes when the value
//! depends on a free symbol: with `x > 0` recorded, `sqrt(x^2)` is `x`; with `x < 0`, it is `-x`.

use rand::Rng;
use rug::Rational;
use std::{cmp::Ordering, collections::BTreeMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One end of an [`Interval`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bound {
    /// The value of the endpoint.
    pub value: Rational,

    /// Whether the endpoint itself belongs to the interval.
    pub closed: bool,
}

impl Bound {
    pub fn open(value: impl Into<Rational>) -> Self {
        Self { value: value.into(), closed: false }
    }

    pub fn closed(value: impl Into<Rational>) -> Self {
        Self { value: value.into(), closed: true }
    }
}

/// A real interval with optional endpoints. A missing endpoint is unbounded on that side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl Interval {
    /// The open interval `(0, inf)`.
    pub fn positive() -> Self {
        Self { lower: Some(Bound::open(0)), upper: None }
    }

    /// The open interval `(-inf, 0)`.
    pub fn negative() -> Self {
        Self { lower: None, upper: Some(Bound::open(0)) }
    }

    /// The interval `[0, inf)`.
    pub fn nonnegative() -> Self {
        Self { lower: Some(Bound::closed(0)), upper: None }
    }

    /// The open interval `(lower, upper)`.
    pub fn between(lower: impl Into<Rational>, upper: impl Into<Rational>) -> Self {
        Self { lower: Some(Bound::open(lower)), upper: Some(Bound::open(upper)) }
    }

    /// Returns true if no real number lies in the interval.
    pub fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lo), Some(hi)) => match lo.value.cmp(&hi.value) {
                Ordering::Greater => true,
                Ordering::Equal => !(lo.closed && hi.closed),
                Ordering::Less => false,
            },
            _ => false,
        }
    }

    /// Returns true if `value` lies in the interval.
    pub fn contains(&self, value: &Rational) -> bool {
        let above = self.lower.as_ref().map_or(true, |lo| match value.cmp(&lo.value) {
            Ordering::Greater => true,
            Ordering::Equal => lo.closed,
            Ordering::Less => false,
        });
        let below = self.upper.as_ref().map_or(true, |hi| match value.cmp(&hi.value) {
            Ordering::Less => true,
            Ordering::Equal => hi.closed,
            Ordering::Greater => false,
        });
        above && below
    }

    /// Returns the intersection of two intervals.
    pub fn intersection(self, other: Self) -> Self {
        let lower = match (self.lower, other.lower) {
            (Some(a), Some(b)) => Some(match a.value.cmp(&b.value) {
                Ordering::Greater => a,
                Ordering::Less => b,
                Ordering::Equal => Bound { closed: a.closed && b.closed, value: a.value },
            }),
            (a, b) => a.or(b),
        };
        let upper = match (self.upper, other.upper) {
            (Some(a), Some(b)) => Some(match a.value.cmp(&b.value) {
                Ordering::Less => a,
                Ordering::Greater => b,
                Ordering::Equal => Bound { closed: a.closed && b.closed, value: a.value },
            }),
            (a, b) => a.or(b),
        };
        Self { lower, upper }
    }

    /// The sign every member of the interval shares, if there is one.
    pub fn sign(&self) -> Option<Ordering> {
        let zero = Rational::new();
        if self.is_empty() {
            return None;
        }
        if let Some(lo) = &self.lower {
            if lo.value > zero || (lo.value == zero && !lo.closed) {
                return Some(Ordering::Greater);
            }
        }
        if let Some(hi) = &self.upper {
            if hi.value < zero || (hi.value == zero && !hi.closed) {
                return Some(Ordering::Less);
            }
        }
        match (&self.lower, &self.upper) {
            (Some(lo), Some(hi)) if lo.value == zero && hi.value == zero => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Draws a rational point of the interval. Unbounded sides are sampled from a spread of
    /// values with denominator 211, so that accidental coincidences with small rationals are
    /// unlikely.
    pub fn sample(&self, rng: &mut impl Rng) -> Option<Rational> {
        if self.is_empty() {
            return None;
        }

        let mut offset = || Rational::from((rng.gen_range(1..=4000), 211));
        let point = match (&self.lower, &self.upper) {
            (None, None) => {
                let mut offset = offset();
                if rng.gen_bool(0.5) {
                    offset = -offset;
                }
                offset
            },
            (Some(lo), None) => lo.value.clone() + offset(),
            (None, Some(hi)) => hi.value.clone() - offset(),
            (Some(lo), Some(hi)) if lo.value == hi.value => lo.value.clone(),
            (Some(lo), Some(hi)) => {
                let t = Rational::from((rng.gen_range(1..=210), 211));
                let width = Rational::from(&hi.value - &lo.value);
                lo.value.clone() + width * t
            },
        };
        Some(point)
    }
}

/// Facts about symbols, each an [`Interval`] the symbol is known to lie in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assumptions {
    facts: BTreeMap<String, Interval>,
}

impl Assumptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `symbol` lies in `interval`, on top of anything already known.
    pub fn assume(&mut self, symbol: impl Into<String>, interval: Interval) {
        let symbol = symbol.into();
        let merged = match self.facts.remove(&symbol) {
            Some(known) => known.intersection(interval),
            None => interval,
        };
        self.facts.insert(symbol, merged);
    }

    /// Builder form of [`Assumptions::assume`].
    pub fn with(mut self, symbol: impl Into<String>, interval: Interval) -> Self {
        self.assume(symbol, interval);
        self
    }

    /// Returns what is known about `symbol`.
    pub fn query(&self, symbol: &str) -> Option<&Interval> {
        self.facts.get(symbol)
    }

    /// Drops everything known about `symbol`.
    pub fn forget(&mut self, symbol: &str) -> Option<Interval> {
        self.facts.remove(symbol)
    }

    /// The sign of `symbol`, if the recorded facts decide it.
    pub fn sign_of(&self, symbol: &str) -> Option<Ordering> {
        self.query(symbol).and_then(Interval::sign)
    }

    /// Draws a witness value for `symbol` that respects its recorded facts, or any value if
    /// nothing is recorded.
    pub fn sample(&self, symbol: &str, rng: &mut impl Rng) -> Option<Rational> {
        match self.query(symbol) {
            Some(interval) => interval.sample(rng),
            None => Interval::default().sample(rng),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_poly::primitive::rat;
    use rand::{rngs::StdRng, SeedableRng};

    use pretty_assertions::assert_eq;

    #[test]
    fn facts_intersect() {
        let mut store = Assumptions::new();
        store.assume("x", Interval::nonnegative());
        assert_eq!(store.sign_of("x"), None);

        store.assume("x", Interval::between(-1, 3));
        assert_eq!(store.query("x"), Some(&Interval {
            lower: Some(Bound::closed(0)),
            upper: Some(Bound::open(3)),
        }));

        store.assume("x", Interval::positive());
        assert_eq!(store.sign_of("x"), Some(Ordering::Greater));

        assert!(store.forget("x").is_some());
        assert_eq!(store.sign_of("x"), None);
    }

    #[test]
    fn signs() {
        assert_eq!(Interval::negative().sign(), Some(Ordering::Less));
        assert_eq!(Interval::between(2, 5).sign(), Some(Ordering::Greater));
        assert_eq!(Interval::between(-2, 5).sign(), None);
        let zero = Interval { lower: Some(Bound::closed(0)), upper: Some(Bound::closed(0)) };
        assert_eq!(zero.sign(), Some(Ordering::Equal));
        assert!(Interval::between(1, 1).is_empty());
    }

    #[test]
    fn samples_respect_facts() {
        let mut rng = StdRng::seed_from_u64(7);
        let store = Assumptions::new()
            .with("a", Interval::negative())
            .with("b", Interval::between(rat(1, 2), 1));
        for _ in 0..50 {
            let a = store.sample("a", &mut rng).unwrap();
            assert!(a < 0);
            let b = store.sample("b", &mut rng).unwrap();
            assert!(Interval::between(rat(1, 2), 1).contains(&b));
            let c = store.sample("c", &mut rng).unwrap();
            assert!(c != 0);
        }
    }
}
