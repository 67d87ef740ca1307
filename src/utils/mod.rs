pub mod plot;

use nalgebra::SMatrix;

use crate::error::{Error, Result};

/// Induced 1-norm (max absolute column sum)
pub fn norm1<const R: usize, const C: usize>(m: &SMatrix<f64, R, C>) -> f64 {
    m.column_iter()
        .map(|column| column.lp_norm(1))
        .fold(0.0, f64::max)
}

/// 1-norm condition number, given the matrix and its inverse.
pub fn condition_number<const D: usize>(m: &SMatrix<f64, D, D>, m_inv: &SMatrix<f64, D, D>) -> f64 {
    norm1(m) * norm1(m_inv)
}

pub fn symmetrize<const D: usize>(m: &SMatrix<f64, D, D>) -> SMatrix<f64, D, D> {
    (m + m.transpose()) * 0.5
}

pub fn ensure_finite<const R: usize, const C: usize>(
    m: &SMatrix<f64, R, C>,
    name: &'static str,
) -> Result<()> {
    if m.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(Error::NonFinite(name))
    }
}

/// LU based inverse that reports which matrix failed.
pub fn inverse<const D: usize>(
    m: SMatrix<f64, D, D>,
    name: &'static str,
) -> Result<SMatrix<f64, D, D>> {
    let inv = m.try_inverse().ok_or(Error::SingularMatrix(name))?;
    ensure_finite(&inv, name)?;
    Ok(inv)
}

/// Like [`inverse`], but also fails when the 1-norm condition number is
/// beyond what f64 can resolve.
pub fn well_conditioned_inverse<const D: usize>(
    m: SMatrix<f64, D, D>,
    name: &'static str,
) -> Result<SMatrix<f64, D, D>> {
    let inv = inverse(m, name)?;
    if !(condition_number(&m, &inv) * f64::EPSILON < 1.0) {
        return Err(Error::SingularMatrix(name));
    }
    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix2, Matrix2x3};

    #[test]
    fn norm1_is_max_column_sum() {
        let m = Matrix2x3::new(1.0, -4.0, 0.5, -2.0, 1.0, 0.5);
        approx::assert_abs_diff_eq!(5.0, norm1(&m));
    }

    #[test]
    fn condition_number_of_identity_is_one() {
        let i = Matrix2::<f64>::identity();
        approx::assert_abs_diff_eq!(1.0, condition_number(&i, &i));
    }

    #[test]
    fn inverse_reports_singular_matrix() {
        let m = Matrix2::new(1.0, 2.0, 2.0, 4.0);
        assert!(matches!(inverse(m, "m"), Err(Error::SingularMatrix("m"))));
    }

    #[test]
    fn nearly_singular_matrix_is_rejected() {
        let m = Matrix2::new(1.0, 0.0, 0.0, 1e-17);
        assert!(inverse(m, "m").is_ok());
        assert!(matches!(
            well_conditioned_inverse(m, "m"),
            Err(Error::SingularMatrix("m"))
        ));
        let m = Matrix2::new(2.0, 1.0, 1.0, 3.0);
        approx::assert_abs_diff_eq!(
            well_conditioned_inverse(m, "m").unwrap() * m,
            Matrix2::identity(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn symmetrize_averages_off_diagonal() {
        let m = Matrix2::new(1.0, 2.0, 4.0, 3.0);
        let s = symmetrize(&m);
        approx::assert_abs_diff_eq!(s, Matrix2::new(1.0, 3.0, 3.0, 3.0));
    }
}
