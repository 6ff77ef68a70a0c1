use tracing::{debug, instrument};

use crate::linalg::{
    matrix::Matrix,
    reduce::{reduce_to_rref, ReductionResult},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rank {
    pub rank: usize,
    pub pivot_columns: Vec<usize>,
    pub reduction: ReductionResult,
}

/// Get the rank of the matrix from the number of pivots of its reduced
/// row-echelon form.
pub fn rank(matrix: &Matrix) -> Rank {
    let reduction = reduce_to_rref(matrix);
    Rank {
        rank: reduction.rank(),
        pivot_columns: reduction.pivot_columns.clone(),
        reduction,
    }
}

/// How the independence of a set of column vectors was decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndependenceReason {
    /// There are more vectors than entries per vector.
    MoreVectorsThanDimensions,
    /// There is a single vector, which is independent iff it is non-zero.
    SingleVector,
    /// The rank equals the number of vectors, or it does not.
    RowReduction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Independence {
    pub independent: bool,
    pub reason: IndependenceReason,
    /// The rank, unless the answer followed from the dimensions alone.
    pub rank: Option<usize>,
    pub pivot_columns: Vec<usize>,
    pub reduction: Option<ReductionResult>,
}

/// Decide whether the columns of `matrix` are linearly independent.
#[instrument(level = "trace", skip_all, fields(%matrix))]
pub fn test_independence(matrix: &Matrix) -> Independence {
    let (nrows, ncols) = (matrix.nrows(), matrix.ncols());

    if ncols > nrows {
        debug!("{} vectors in dimension {} are dependent", ncols, nrows);
        return Independence {
            independent: false,
            reason: IndependenceReason::MoreVectorsThanDimensions,
            rank: None,
            pivot_columns: vec![],
            reduction: None,
        };
    }

    if ncols == 1 {
        let independent = !matrix.is_zero();
        return Independence {
            independent,
            reason: IndependenceReason::SingleVector,
            rank: Some(independent as usize),
            pivot_columns: if independent { vec![0] } else { vec![] },
            reduction: None,
        };
    }

    let r = rank(matrix);
    Independence {
        independent: r.rank == ncols,
        reason: IndependenceReason::RowReduction,
        rank: Some(r.rank),
        pivot_columns: r.pivot_columns,
        reduction: Some(r.reduction),
    }
}

#[cfg(test)]
mod test {
    use crate::linalg::{
        matrix::Matrix,
        rank::{rank, test_independence, IndependenceReason},
    };

    #[test]
    fn rank_of_dependent_rows() {
        let m = Matrix::parse(&[
            vec!["1", "2", "3"],
            vec!["4", "5", "6"],
            vec!["7", "8", "9"],
        ])
        .unwrap();

        let r = rank(&m);
        assert_eq!(r.rank, 2);
        assert_eq!(r.pivot_columns, vec![0, 1]);
        assert_eq!(
            r.reduction.matrix,
            Matrix::parse(&[
                vec!["1", "0", "-1"],
                vec!["0", "1", "2"],
                vec!["0", "0", "0"]
            ])
            .unwrap()
        );

        assert_eq!(rank(&Matrix::new(2, 3)).rank, 0);
    }

    #[test]
    fn independence() {
        let m = Matrix::parse(&[vec!["1", "0"], vec!["0", "1"], vec!["1", "1"]]).unwrap();
        let i = test_independence(&m);
        assert!(i.independent);
        assert_eq!(i.reason, IndependenceReason::RowReduction);
        assert_eq!(i.rank, Some(2));

        let m = Matrix::parse(&[vec!["1", "2"], vec!["2", "4"]]).unwrap();
        let i = test_independence(&m);
        assert!(!i.independent);
        assert_eq!(i.pivot_columns, vec![0]);
    }

    #[test]
    fn more_vectors_than_dimensions() {
        let m = Matrix::parse(&[vec!["1", "0", "3"], vec!["0", "1", "4"]]).unwrap();
        let i = test_independence(&m);
        assert!(!i.independent);
        assert_eq!(i.reason, IndependenceReason::MoreVectorsThanDimensions);
        assert_eq!(i.rank, None);
        assert!(i.reduction.is_none());
    }

    #[test]
    fn single_vector() {
        let zero = Matrix::new(3, 1);
        let i = test_independence(&zero);
        assert!(!i.independent);
        assert_eq!(i.reason, IndependenceReason::SingleVector);
        assert_eq!(i.rank, Some(0));

        let v = Matrix::parse(&[vec!["0"], vec!["2"], vec!["0"]]).unwrap();
        assert!(test_independence(&v).independent);
    }
}
