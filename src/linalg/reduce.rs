use std::cmp::Ordering;

use tracing::{debug, instrument};

use crate::linalg::{
    matrix::Matrix,
    trace::{Stage, StepKind, StepTrace},
};

/// The target form of a reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReductionMode {
    /// Zero the entries below each pivot using `factor = entry / pivot`.
    /// Pivots are not normalized, so the diagonal can be used for the determinant.
    UpperTriangular,
    /// Normalize each pivot to one and zero the entries below it.
    RowEchelon,
    /// Normalize each pivot to one and zero the entries above and below it.
    ReducedRowEchelon,
}

impl ReductionMode {
    fn final_stage(&self) -> Stage {
        match self {
            ReductionMode::UpperTriangular => Stage::UpperTriangular,
            ReductionMode::RowEchelon => Stage::RowEchelon,
            ReductionMode::ReducedRowEchelon => Stage::Reduced,
        }
    }
}

/// The outcome of a reduction. The input matrix is never modified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReductionResult {
    pub matrix: Matrix,
    pub steps: StepTrace,
    /// The pivot columns in increasing order. Pivot `k` lives in row `k`.
    pub pivot_columns: Vec<usize>,
    pub swap_count: usize,
    /// True if some eligible column did not receive a pivot.
    pub singular: bool,
}

impl ReductionResult {
    pub fn rank(&self) -> usize {
        self.pivot_columns.len()
    }
}

/// Gauss-Jordan elimination with partial pivoting and a full trace.
///
/// Columns are visited from left to right, up to `max_col`. For each column
/// the row with the largest absolute entry on or below the current pivot row
/// is selected, ties going to the topmost row. Columns without a non-zero
/// candidate are recorded as [StepKind::NoPivot] and skipped without
/// advancing the pivot row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reducer {
    mode: ReductionMode,
    max_col: Option<usize>,
    initial_stage: Stage,
}

impl Reducer {
    pub fn new(mode: ReductionMode) -> Reducer {
        Reducer {
            mode,
            max_col: None,
            initial_stage: Stage::Initial,
        }
    }

    /// Only select pivots in the first `max_col` columns. The remaining
    /// columns are augmented: they take part in every row operation.
    pub fn with_max_col(mut self, max_col: usize) -> Reducer {
        self.max_col = Some(max_col);
        self
    }

    /// Set the stage that labels the starting snapshot.
    pub fn with_initial_stage(mut self, stage: Stage) -> Reducer {
        self.initial_stage = stage;
        self
    }

    #[instrument(level = "trace", skip_all, fields(%matrix, mode = ?self.mode))]
    pub fn reduce(&self, matrix: &Matrix) -> ReductionResult {
        let (nrows, ncols) = (matrix.nrows(), matrix.ncols());
        let max_col = self.max_col.unwrap_or(ncols).min(ncols);

        let mut m = matrix.clone();
        let mut steps = StepTrace::new();
        steps.record(StepKind::Stage(self.initial_stage), &m);

        let mut pivot_columns = vec![];
        let mut swap_count = 0;
        let mut singular = false;

        let mut i = 0;
        for j in 0..max_col {
            if i == nrows {
                debug!("Out of rows: columns {}..{} have no pivot", j, max_col);
                singular = true;
                for column in j..max_col {
                    steps.record(StepKind::NoPivot { column }, &m);
                }
                break;
            }

            let p = (i + 1..nrows).fold(i, |best, k| {
                if m[(k, j)].abs_cmp(&m[(best, j)]) == Ordering::Greater {
                    k
                } else {
                    best
                }
            });

            if m[(p, j)].is_zero() {
                debug!("No pivot in column {}", j);
                singular = true;
                steps.record(StepKind::NoPivot { column: j }, &m);
                continue;
            }

            if p != i {
                debug!("Swapping rows {} and {} for column {}", i, p, j);
                m.swap_rows(i, p);
                swap_count += 1;
                steps.record(StepKind::Swap { first: i, second: p }, &m);
            }

            let pivot = m[(i, j)].clone();
            if self.mode != ReductionMode::UpperTriangular {
                m.mul_row(i, &pivot.inv());
                steps.record(
                    StepKind::Scale {
                        row: i,
                        divisor: pivot.clone(),
                    },
                    &m,
                );
            }

            let start = if self.mode == ReductionMode::ReducedRowEchelon {
                0
            } else {
                i + 1
            };

            for k in start..nrows {
                if k == i || m[(k, j)].is_zero() {
                    continue;
                }

                let factor = if self.mode == ReductionMode::UpperTriangular {
                    &m[(k, j)] / &pivot
                } else {
                    m[(k, j)].clone()
                };

                m.eliminate_row(k, &factor, i);
                steps.record(
                    StepKind::Eliminate {
                        target: k,
                        factor,
                        source: i,
                    },
                    &m,
                );
            }

            pivot_columns.push(j);
            i += 1;
        }

        steps.record(StepKind::Stage(self.mode.final_stage()), &m);
        debug!(
            "Reduced with {} pivots and {} swaps",
            pivot_columns.len(),
            swap_count
        );

        ReductionResult {
            matrix: m,
            steps,
            pivot_columns,
            swap_count,
            singular,
        }
    }
}

/// Bring a square or rectangular matrix to upper-triangular form without
/// normalizing the pivots.
pub fn triangularize(matrix: &Matrix) -> ReductionResult {
    Reducer::new(ReductionMode::UpperTriangular).reduce(matrix)
}

/// Bring the coefficient part of an augmented matrix `[A | b]` to row-echelon
/// form with unit pivots, ready for back substitution.
pub fn forward_eliminate(augmented: &Matrix) -> ReductionResult {
    Reducer::new(ReductionMode::RowEchelon)
        .with_max_col(augmented.ncols() - 1)
        .reduce(augmented)
}

/// Bring a matrix to reduced row-echelon form, selecting pivots in every column.
pub fn reduce_to_rref(matrix: &Matrix) -> ReductionResult {
    Reducer::new(ReductionMode::ReducedRowEchelon).reduce(matrix)
}

#[cfg(test)]
mod test {
    use crate::{
        domains::rational::Rational,
        linalg::{
            matrix::Matrix,
            reduce::{forward_eliminate, reduce_to_rref, triangularize, ReductionMode, Reducer},
            trace::{Stage, StepKind},
        },
    };

    #[test]
    fn rref_with_swap() {
        let m = Matrix::parse(&[vec!["1", "2", "5"], vec!["2", "4", "10"]]).unwrap();
        let r = reduce_to_rref(&m);

        let kinds: Vec<_> = r.steps.iter().map(|s| s.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Stage(Stage::Initial),
                StepKind::Swap { first: 0, second: 1 },
                StepKind::Scale {
                    row: 0,
                    divisor: 2.into()
                },
                StepKind::Eliminate {
                    target: 1,
                    factor: 1.into(),
                    source: 0
                },
                StepKind::NoPivot { column: 1 },
                StepKind::NoPivot { column: 2 },
                StepKind::Stage(Stage::Reduced),
            ]
        );

        assert_eq!(r.pivot_columns, vec![0]);
        assert_eq!(r.swap_count, 1);
        assert!(r.singular);
        assert_eq!(
            r.matrix,
            Matrix::parse(&[vec!["1", "2", "5"], vec!["0", "0", "0"]]).unwrap()
        );
        assert_eq!(r.steps.steps()[0].snapshot.as_ref(), Some(&m));
    }

    #[test]
    fn identity_needs_no_eliminations() {
        let r = reduce_to_rref(&Matrix::identity(3));
        assert!(r.matrix.is_identity());
        assert_eq!(r.pivot_columns, vec![0, 1, 2]);
        assert!(!r.singular);
        assert!(r
            .steps
            .iter()
            .all(|s| !matches!(s.kind, StepKind::Eliminate { .. } | StepKind::Swap { .. })));
    }

    #[test]
    fn partial_pivoting_prefers_largest_magnitude() {
        let m = Matrix::parse(&[vec!["1", "1"], vec!["-3", "1"], vec!["3", "2"]]).unwrap();
        let r = triangularize(&m);

        // ties go to the topmost row
        assert_eq!(r.steps.steps()[1].kind, StepKind::Swap { first: 0, second: 1 });
        assert_eq!(r.matrix[(0, 0)], (-3).into());
    }

    #[test]
    fn upper_triangular_keeps_pivots() {
        let m = Matrix::parse(&[vec!["2", "1"], vec!["1", "3"]]).unwrap();
        let r = triangularize(&m);

        assert_eq!(r.matrix[(0, 0)], 2.into());
        assert_eq!(r.matrix[(1, 0)], Rational::zero());
        assert_eq!(r.matrix[(1, 1)], (5, 2).into());
        assert!(r
            .steps
            .iter()
            .all(|s| !matches!(s.kind, StepKind::Scale { .. })));
        assert_eq!(
            r.steps.steps()[1].kind,
            StepKind::Eliminate {
                target: 1,
                factor: (1, 2).into(),
                source: 0
            }
        );
    }

    #[test]
    fn zero_column_does_not_advance_pivot_row() {
        let m = Matrix::parse(&[vec!["0", "1", "2"], vec!["0", "3", "4"]]).unwrap();
        let r = Reducer::new(ReductionMode::ReducedRowEchelon).reduce(&m);

        assert_eq!(r.pivot_columns, vec![1, 2]);
        assert!(r.singular);
        assert_eq!(
            r.matrix,
            Matrix::parse(&[vec!["0", "1", "0"], vec!["0", "0", "1"]]).unwrap()
        );
    }

    #[test]
    fn max_col_leaves_augmented_columns() {
        let m = Matrix::parse(&[vec!["1", "1", "12"], vec!["1", "3", "26"]]).unwrap();
        let r = forward_eliminate(&m);

        assert_eq!(r.pivot_columns, vec![0, 1]);
        assert!(!r.singular);
        assert_eq!(
            r.matrix,
            Matrix::parse(&[vec!["1", "1", "12"], vec!["0", "1", "7"]]).unwrap()
        );
        assert_eq!(r.steps.last().unwrap().kind, StepKind::Stage(Stage::RowEchelon));
    }

    #[test]
    fn out_of_rows_is_singular() {
        let m = Matrix::parse(&[vec!["1", "2", "3"]]).unwrap();
        let r = reduce_to_rref(&m);
        assert_eq!(r.pivot_columns, vec![0]);
        assert!(r.singular);

        let kinds: Vec<_> = r.steps.iter().map(|s| s.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Stage(Stage::Initial),
                StepKind::Scale {
                    row: 0,
                    divisor: 1.into()
                },
                StepKind::NoPivot { column: 1 },
                StepKind::NoPivot { column: 2 },
                StepKind::Stage(Stage::Reduced),
            ]
        );
    }

    #[test]
    fn input_is_untouched() {
        let m = Matrix::parse(&[vec!["4", "2"], vec!["8", "1"]]).unwrap();
        let copy = m.clone();
        let _ = reduce_to_rref(&m);
        assert_eq!(m, copy);
    }
}
