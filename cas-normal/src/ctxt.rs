use crate::assume::Assumptions;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default seed for witness draws. Any fixed value works; it only has to be the same from run
/// to run so that normal forms are reproducible.
pub const DEFAULT_SEED: u64 = 0x5eed_cafe;

/// Options controlling a normalization, threaded by reference through every step.
///
/// The default options are suitable for most uses. Use [`NormalOptions::rational`] for the
/// rational-normal mode, where radicals and `rootof` nodes are treated as opaque generators.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NormalOptions {
    /// The working precision in bits for numeric evaluation. Defaults to 256.
    pub precision: u32,

    /// The largest precision the increasing-precision loop of the branch selector may reach.
    /// Defaults to 2048.
    pub max_precision: u32,

    /// The relative tolerance within which two consecutive numeric evaluations agree. Defaults to
    /// `1e-12`.
    pub tolerance: f64,

    /// The largest degree over Q of a merged constant extension. Defaults to 16.
    pub max_extension_degree: usize,

    /// The largest denominator `q` of a rational power `b^(p/q)` that is treated as a radical.
    /// Defaults to 16.
    pub max_radical_index: u32,

    /// The largest tier an extension generator may sit at. Defaults to 8.
    pub max_tower_height: usize,

    /// The number of random witness points the branch selector tries before giving up. Defaults
    /// to 10.
    pub witness_retries: usize,

    /// The seed for the witness generator. Defaults to [`DEFAULT_SEED`].
    pub seed: u64,

    /// The number of terms above which sums and products are combined by divide and conquer.
    /// Defaults to 4.
    pub balanced_threshold: usize,

    /// When false, algebraic nodes are opaque generators. Defaults to true.
    pub extensions: bool,

    /// Facts about the free symbols, used to pick branches. Defaults to no facts.
    pub assumptions: Assumptions,
}

impl Default for NormalOptions {
    fn default() -> Self {
        Self {
            precision: 256,
            max_precision: 2048,
            tolerance: 1e-12,
            max_extension_degree: 16,
            max_radical_index: 16,
            max_tower_height: 8,
            witness_retries: 10,
            seed: DEFAULT_SEED,
            balanced_threshold: 4,
            extensions: true,
            assumptions: Assumptions::default(),
        }
    }
}

impl NormalOptions {
    /// The default options with algebraic extensions turned off.
    pub fn rational() -> Self {
        Self { extensions: false, ..Default::default() }
    }

    /// Returns these options with the given assumptions.
    pub fn with_assumptions(self, assumptions: Assumptions) -> Self {
        Self { assumptions, ..self }
    }
}
