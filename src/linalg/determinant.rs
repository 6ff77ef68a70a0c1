use tracing::instrument;

use crate::{
    domains::rational::Rational,
    linalg::{
        matrix::{Matrix, MatrixError},
        reduce::{triangularize, ReductionResult},
        trace::{StepKind, StepTrace},
    },
};

/// A determinant with the elimination that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Determinant {
    pub value: Rational,
    pub swap_count: usize,
    pub steps: StepTrace,
}

/// Compute the determinant of a square matrix as `(-1)^swaps` times the
/// product of the diagonal of its upper-triangular form.
///
/// A matrix for which some column has no pivot has determinant zero; the
/// trace then ends with the column that revealed it.
#[instrument(level = "trace", skip_all, fields(%matrix))]
pub fn determinant(matrix: &Matrix) -> Result<Determinant, MatrixError> {
    if !matrix.is_square() {
        return Err(MatrixError::NotSquare {
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
        });
    }

    let ReductionResult {
        matrix: triangular,
        mut steps,
        swap_count,
        singular,
        ..
    } = triangularize(matrix);

    let value = if singular {
        Rational::zero()
    } else {
        let diagonal: Vec<Rational> = (0..triangular.nrows())
            .map(|i| triangular[(i, i)].clone())
            .collect();

        let mut value: Rational = diagonal.iter().product();
        if swap_count % 2 == 1 {
            value = -value;
        }

        steps.note(StepKind::DiagonalProduct {
            diagonal,
            swaps: swap_count,
            value: value.clone(),
        });
        value
    };

    steps.note(StepKind::Determinant {
        minor: None,
        value: value.clone(),
    });

    Ok(Determinant {
        value,
        swap_count,
        steps,
    })
}

#[cfg(test)]
mod test {
    use crate::{
        domains::rational::Rational,
        linalg::{
            determinant::determinant,
            matrix::{Matrix, MatrixError},
            trace::StepKind,
        },
    };

    #[test]
    fn triangular_product() {
        let m = Matrix::parse(&[
            vec!["1", "2", "3"],
            vec!["4", "5", "16"],
            vec!["7", "8", "9"],
        ])
        .unwrap();

        let d = determinant(&m).unwrap();
        assert_eq!(d.value, 60.into());
        assert!(matches!(
            d.steps.iter().rev().nth(1).map(|s| &s.kind),
            Some(StepKind::DiagonalProduct { .. })
        ));
    }

    #[test]
    fn swap_flips_sign() {
        let m = Matrix::parse(&[vec!["0", "1"], vec!["1", "0"]]).unwrap();
        let d = determinant(&m).unwrap();
        assert_eq!(d.swap_count, 1);
        assert_eq!(d.value, (-1).into());
    }

    #[test]
    fn fractions() {
        let m = Matrix::parse(&[vec!["1/2", "1/3"], vec!["1/4", "1/5"]]).unwrap();
        assert_eq!(determinant(&m).unwrap().value, (1, 60).into());
    }

    #[test]
    fn singular() {
        let m = Matrix::parse(&[
            vec!["5", "-3", "2"],
            vec!["-7", "3", "-7"],
            vec!["9", "-5", "5"],
        ])
        .unwrap();

        let d = determinant(&m).unwrap();
        assert_eq!(d.value, Rational::zero());
        assert!(d
            .steps
            .iter()
            .any(|s| matches!(s.kind, StepKind::NoPivot { column: 2 })));
        assert_eq!(
            d.steps.last().unwrap().kind,
            StepKind::Determinant {
                minor: None,
                value: Rational::zero()
            }
        );
    }

    #[test]
    fn not_square() {
        let m = Matrix::parse(&[vec!["1", "2"]]).unwrap();
        assert_eq!(
            determinant(&m),
            Err(MatrixError::NotSquare { nrows: 1, ncols: 2 })
        );
    }
}
