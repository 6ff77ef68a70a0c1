use tracing::{debug, instrument};

use crate::{
    domains::rational::Rational,
    linalg::{
        determinant::{determinant, Determinant},
        matrix::{Matrix, MatrixError},
        trace::{Stage, StepKind, StepTrace},
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CramerSolution {
    pub solutions: Vec<Rational>,
    pub determinant: Determinant,
    /// The determinant of `A` with column `i` replaced by `b`, for every `i`.
    pub minors: Vec<Determinant>,
    pub steps: StepTrace,
}

/// Solve the square system `A x = b` with Cramer's rule:
/// `x_i = det(A_i) / det(A)`, where `A_i` is `A` with column `i` replaced by `b`.
///
/// The trace is a narrative of the determinants and ratios. The elimination
/// of every determinant is available in [CramerSolution::determinant] and
/// [CramerSolution::minors].
#[instrument(level = "trace", skip_all, fields(%a))]
pub fn solve_cramer(a: &Matrix, b: &[Rational]) -> Result<CramerSolution, MatrixError> {
    if !a.is_square() {
        return Err(MatrixError::NotSquare {
            nrows: a.nrows(),
            ncols: a.ncols(),
        });
    }

    let n = a.nrows();
    if b.len() != n {
        return Err(MatrixError::ShapeMismatch {
            lhs: (n, n),
            rhs: (b.len(), 1),
        });
    }

    let det = determinant(a)?;
    if det.value.is_zero() {
        debug!("Coefficient matrix is singular");
        return Err(MatrixError::SingularSystem { steps: det.steps });
    }

    let mut steps = StepTrace::new();
    steps.record(StepKind::Stage(Stage::Initial), a);
    steps.note(StepKind::Determinant {
        minor: None,
        value: det.value.clone(),
    });

    let mut solutions = Vec::with_capacity(n);
    let mut minors = Vec::with_capacity(n);
    for i in 0..n {
        let a_i = a.with_column_replaced(i, b)?;
        steps.record(StepKind::ReplaceColumn { column: i }, &a_i);

        let d_i = determinant(&a_i)?;
        steps.note(StepKind::Determinant {
            minor: Some(i),
            value: d_i.value.clone(),
        });

        let x = d_i.value.checked_div(&det.value)?;
        steps.note(StepKind::CramerRatio {
            variable: i,
            numerator: d_i.value.clone(),
            denominator: det.value.clone(),
            value: x.clone(),
        });

        solutions.push(x);
        minors.push(d_i);
    }

    Ok(CramerSolution {
        solutions,
        determinant: det,
        minors,
        steps,
    })
}

/// Solve an augmented system `[A | b]` with Cramer's rule.
pub fn solve_cramer_augmented(augmented: &Matrix) -> Result<CramerSolution, MatrixError> {
    let n = augmented.nrows();
    if augmented.ncols() != n + 1 {
        return Err(MatrixError::NotAugmented {
            nrows: n,
            ncols: augmented.ncols(),
        });
    }

    solve_cramer(&augmented.columns(0..n), &augmented.column(n))
}

#[cfg(test)]
mod test {
    use crate::{
        domains::rational::Rational,
        linalg::{
            cramer::{solve_cramer, solve_cramer_augmented},
            matrix::{Matrix, MatrixError},
            trace::StepKind,
        },
    };

    #[test]
    fn two_by_two() {
        let a = Matrix::parse(&[vec!["1", "1"], vec!["1", "3"]]).unwrap();
        let s = solve_cramer(&a, &[12.into(), 26.into()]).unwrap();

        assert_eq!(s.solutions, vec![5.into(), 7.into()]);
        assert_eq!(s.determinant.value, 2.into());
        assert_eq!(s.minors[0].value, 10.into());
        assert_eq!(s.minors[1].value, 14.into());
        assert_eq!(
            s.steps.last().unwrap().kind,
            StepKind::CramerRatio {
                variable: 1,
                numerator: 14.into(),
                denominator: 2.into(),
                value: 7.into()
            }
        );
    }

    #[test]
    fn fractional_solution() {
        let m = Matrix::parse(&[
            vec!["2", "1", "-1", "8"],
            vec!["-3", "-1", "2", "-11"],
            vec!["-2", "1", "2", "-3"],
        ])
        .unwrap();
        let s = solve_cramer_augmented(&m).unwrap();
        assert_eq!(s.solutions, vec![2.into(), 3.into(), (-1).into()]);

        let a = Matrix::parse(&[vec!["3", "2"], vec!["1", "4"]]).unwrap();
        let s = solve_cramer(&a, &[1.into(), 1.into()]).unwrap();
        assert_eq!(s.solutions, vec![Rational::from((1, 5)), (1, 5).into()]);
    }

    #[test]
    fn errors() {
        let singular = Matrix::parse(&[vec!["1", "2"], vec!["2", "4"]]).unwrap();
        assert!(matches!(
            solve_cramer(&singular, &[1.into(), 2.into()]),
            Err(MatrixError::SingularSystem { .. })
        ));

        let a = Matrix::identity(2);
        assert!(matches!(
            solve_cramer(&a, &[1.into()]),
            Err(MatrixError::ShapeMismatch { .. })
        ));

        let wide = Matrix::parse(&[vec!["1", "2", "3"]]).unwrap();
        assert!(matches!(
            solve_cramer(&wide, &[1.into()]),
            Err(MatrixError::NotSquare { .. })
        ));
        assert!(matches!(
            solve_cramer_augmented(&Matrix::identity(2)),
            Err(MatrixError::NotAugmented { .. })
        ));
    }
}
