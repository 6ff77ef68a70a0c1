use tracing::{debug, instrument};

use crate::linalg::{
    matrix::{Matrix, MatrixError},
    reduce::{ReductionMode, Reducer},
    trace::{Stage, StepKind, StepTrace},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inverse {
    pub inverse: Matrix,
    pub steps: StepTrace,
}

/// Invert a square matrix by reducing `[A | I]` to `[I | A^-1]`.
///
/// Pivots are only selected in the left block. If one of its columns has no
/// pivot the matrix is singular and the trace up to that point is returned
/// in the error.
#[instrument(level = "trace", skip_all, fields(%matrix))]
pub fn invert(matrix: &Matrix) -> Result<Inverse, MatrixError> {
    if !matrix.is_square() {
        return Err(MatrixError::NotSquare {
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
        });
    }

    let n = matrix.nrows();
    let augmented = matrix.augment(&Matrix::identity(n))?;

    let r = Reducer::new(ReductionMode::ReducedRowEchelon)
        .with_max_col(n)
        .with_initial_stage(Stage::Augmented)
        .reduce(&augmented);

    if r.rank() < n {
        debug!("Matrix is singular: rank {} < {}", r.rank(), n);
        return Err(MatrixError::NotInvertible { steps: r.steps });
    }

    debug_assert!(r.matrix.columns(0..n).is_identity());

    let inverse = r.matrix.columns(n..2 * n);
    let mut steps = r.steps;
    steps.record(StepKind::Stage(Stage::Result), &inverse);

    Ok(Inverse { inverse, steps })
}
