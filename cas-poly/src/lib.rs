//! Exact polynomial arithmetic over the rationals.
//!
//! This crate provides the ground-ring machinery used by the normal-form engine:
//!
//! - [`Poly`], a sparse multivariate polynomial with rational coefficients and copy-on-write
//!   storage, with exact and pseudo-division and reduction modulo a monic polynomial;
//! - [`gcd`] and [`lcm`] of multivariate polynomials, and [`squarefree`] decomposition;
//! - [`resultant`]s with respect to one generator;
//! - [`UniPoly`], dense univariate polynomials, with numeric [`roots`] and the numeric-guided
//!   [`factor_containing`] that isolates the irreducible factor vanishing at a given root.

pub mod factor;
pub mod gcd;
pub mod monomial;
pub mod poly;
pub mod primitive;
pub mod resultant;
pub mod roots;
pub mod squarefree;
pub mod uni;

mod proptests;

pub use factor::{factor, factor_containing, factor_containing_multiple};
pub use gcd::{gcd, gcd_all, lcm};
pub use monomial::Monomial;
pub use poly::{Poly, PseudoDivision};
pub use resultant::resultant;
pub use roots::{complex_roots, roots};
pub use squarefree::{squarefree, Squarefree};
pub use uni::UniPoly;
