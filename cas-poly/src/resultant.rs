//! Resultants of multivariate polynomials with respect to one generator.

use crate::poly::Poly;
use tracing::trace;

/// The resultant of `a` and `b` with respect to the generator `var`, a polynomial free of `var`.
///
/// It is computed as the determinant of the Sylvester matrix using fraction-free Bareiss
/// elimination, so every intermediate division is exact.
pub fn resultant(a: &Poly, b: &Poly, var: usize) -> Poly {
    let dim = a.dim().max(b.dim());
    if a.is_zero() || b.is_zero() {
        return Poly::zero(dim);
    }

    let m = a.degree_in(var) as usize;
    let n = b.degree_in(var) as usize;
    if m == 0 {
        return a.pow(n as u32).embed(dim);
    }
    if n == 0 {
        return b.pow(m as u32).embed(dim);
    }

    let size = m + n;
    trace!(m, n, "sylvester matrix of size {}", size);
    let ca = a.coefficients_in(var);
    let cb = b.coefficients_in(var);

    // rows 0..n hold shifted copies of a, rows n..n+m shifted copies of b, highest degree first
    let mut matrix = vec![vec![Poly::zero(dim); size]; size];
    for row in 0..n {
        for (k, c) in ca.iter().rev().enumerate() {
            matrix[row][row + k] = c.clone();
        }
    }
    for row in 0..m {
        for (k, c) in cb.iter().rev().enumerate() {
            matrix[n + row][row + k] = c.clone();
        }
    }

    determinant(matrix, dim)
}

/// The determinant of a square matrix of polynomials by Bareiss elimination.
pub fn determinant(mut matrix: Vec<Vec<Poly>>, dim: usize) -> Poly {
    let size = matrix.len();
    if size == 0 {
        return Poly::one(dim);
    }

    let mut negate = false;
    let mut previous = Poly::one(dim);
    for k in 0..size - 1 {
        if matrix[k][k].is_zero() {
            match (k + 1..size).find(|&i| !matrix[i][k].is_zero()) {
                Some(i) => {
                    matrix.swap(k, i);
                    negate = !negate;
                },
                None => return Poly::zero(dim),
            }
        }

        for i in k + 1..size {
            for j in k + 1..size {
                let num = &(&matrix[i][j] * &matrix[k][k]) - &(&matrix[i][k] * &matrix[k][j]);
                matrix[i][j] = num
                    .div_exact(&previous)
                    .expect("Bareiss elimination divides exactly");
            }
            matrix[i][k] = Poly::zero(dim);
        }
        previous = matrix[k][k].clone();
    }

    let det = matrix[size - 1][size - 1].clone();
    if negate {
        -det
    } else {
        det
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::rat;

    use pretty_assertions::assert_eq;

    #[test]
    fn resultant_of_linear_factors() {
        // Res_x(x - 2, x^2 - 3) = (2)^2 - 3 = 1
        let x = Poly::var(0, 1);
        let a = &x - &Poly::constant(2, 1);
        let b = &x.pow(2) - &Poly::constant(3, 1);
        assert_eq!(resultant(&a, &b, 0), Poly::one(1));
    }

    #[test]
    fn compositum_polynomial() {
        // Res_y(y^2 - 2, (z - y)^2 - 3) = z^4 - 10 z^2 + 1, the minimal polynomial of sqrt2+sqrt3
        let z = Poly::var(0, 2);
        let y = Poly::var(1, 2);
        let a = &y.pow(2) - &Poly::constant(2, 2);
        let b = &(&z - &y).pow(2) - &Poly::constant(3, 2);
        let r = resultant(&a, &b, 1);
        assert_eq!(r.to_string(), "x0^4 - 10*x0^2 + 1");
    }

    #[test]
    fn determinant_small() {
        let m = vec![
            vec![Poly::constant(2, 0), Poly::constant(1, 0)],
            vec![Poly::constant(rat(1, 2), 0), Poly::constant(3, 0)],
        ];
        assert_eq!(determinant(m, 0), Poly::constant(rat(11, 2), 0));
    }
}
