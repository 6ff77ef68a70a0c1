use std::{
    fmt::Display,
    ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Range, Sub, SubAssign},
    slice::Chunks,
};

use smallvec::SmallVec;

use crate::{
    domains::rational::{Rational, RationalError},
    linalg::trace::StepTrace,
    printer::MatrixPrinter,
};

/// A raw matrix entry as supplied by a caller, before validation.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Integer(i64),
    Float(f64),
    Text(String),
    Rational(Rational),
}

impl Cell {
    /// Convert the cell into an exact rational.
    pub fn to_rational(&self) -> Result<Rational, RationalError> {
        match self {
            Cell::Integer(i) => Ok((*i).into()),
            Cell::Float(f) => Rational::try_from(*f),
            Cell::Text(s) => s.parse(),
            Cell::Rational(r) => Ok(r.clone()),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => f.write_str(s),
            Cell::Rational(r) => write!(f, "{}", r),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Integer(value as i64)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Rational> for Cell {
    fn from(value: Rational) -> Self {
        Cell::Rational(value)
    }
}

/// Errors that can occur when building or operating on matrices.
///
/// Errors raised after a reduction has started carry the trace that was
/// recorded up to the point of failure.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixError {
    InvalidShape(String),
    InvalidElement {
        position: Option<(usize, usize)>,
        value: String,
    },
    NotSquare {
        nrows: usize,
        ncols: usize,
    },
    NotAugmented {
        nrows: usize,
        ncols: usize,
    },
    ShapeMismatch {
        lhs: (usize, usize),
        rhs: (usize, usize),
    },
    DivisionByZero,
    SingularSystem {
        steps: StepTrace,
    },
    NotInvertible {
        steps: StepTrace,
    },
    Inconsistent {
        steps: StepTrace,
    },
    UnsupportedOperation(String),
}

impl MatrixError {
    /// The partial trace attached to the error, if any.
    pub fn steps(&self) -> Option<&StepTrace> {
        match self {
            MatrixError::SingularSystem { steps }
            | MatrixError::NotInvertible { steps }
            | MatrixError::Inconsistent { steps } => Some(steps),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixError::InvalidShape(reason) => write!(f, "Invalid matrix shape: {}", reason),
            MatrixError::InvalidElement {
                position: Some((r, c)),
                value,
            } => write!(
                f,
                "Invalid element '{}' at row {}, column {}",
                value,
                r + 1,
                c + 1
            ),
            MatrixError::InvalidElement {
                position: None,
                value,
            } => write!(f, "Invalid element '{}'", value),
            MatrixError::NotSquare { nrows, ncols } => {
                write!(f, "The matrix is not square: ({},{})", nrows, ncols)
            }
            MatrixError::NotAugmented { nrows, ncols } => write!(
                f,
                "The matrix is not an augmented system: ({},{}) needs {} columns",
                nrows,
                ncols,
                nrows + 1
            ),
            MatrixError::ShapeMismatch { lhs, rhs } => write!(
                f,
                "The shapes are not compatible: ({},{}) vs ({},{})",
                lhs.0, lhs.1, rhs.0, rhs.1
            ),
            MatrixError::DivisionByZero => write!(f, "Division by zero"),
            MatrixError::SingularSystem { .. } => {
                write!(f, "The system does not have a unique solution")
            }
            MatrixError::NotInvertible { .. } => write!(f, "The matrix is singular"),
            MatrixError::Inconsistent { .. } => write!(f, "The system is inconsistent"),
            MatrixError::UnsupportedOperation(op) => {
                write!(f, "Unsupported matrix operation '{}'", op)
            }
        }
    }
}

impl std::error::Error for MatrixError {}

impl From<RationalError> for MatrixError {
    fn from(e: RationalError) -> Self {
        match e {
            RationalError::DivisionByZero => MatrixError::DivisionByZero,
            RationalError::InvalidLiteral(value) => MatrixError::InvalidElement {
                position: None,
                value,
            },
            RationalError::NotFinite => MatrixError::InvalidElement {
                position: None,
                value: RationalError::NotFinite.to_string(),
            },
        }
    }
}

/// A dense row-major matrix with exact rational entries.
/// A vector can be represented as a matrix with one row or one column.
///
/// A matrix always has at least one row and one column.
#[derive(Clone, Hash, PartialEq, Eq, Debug)]
pub struct Matrix {
    pub(crate) data: SmallVec<[Rational; 16]>,
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
}

impl Matrix {
    /// Create a new zeroed matrix with `nrows` rows and `ncols` columns.
    pub fn new(nrows: usize, ncols: usize) -> Matrix {
        Matrix {
            data: (0..nrows * ncols).map(|_| Rational::zero()).collect(),
            nrows,
            ncols,
        }
    }

    /// Create a new square matrix with `nrows` rows and ones on the main diagonal and zeroes elsewhere.
    pub fn identity(nrows: usize) -> Matrix {
        Matrix {
            data: (0..nrows * nrows)
                .map(|i| {
                    if i % nrows == i / nrows {
                        Rational::one()
                    } else {
                        Rational::zero()
                    }
                })
                .collect(),
            nrows,
            ncols: nrows,
        }
    }

    /// Create a new column vector from a list of scalars.
    pub fn new_vec(data: Vec<Rational>) -> Result<Matrix, MatrixError> {
        let nrows = data.len();
        Matrix::from_linear(data, nrows, 1)
    }

    /// Convert a linear representation of a matrix to a `Matrix`.
    pub fn from_linear(
        data: Vec<Rational>,
        nrows: usize,
        ncols: usize,
    ) -> Result<Matrix, MatrixError> {
        if nrows == 0 || ncols == 0 {
            return Err(MatrixError::InvalidShape(format!(
                "a matrix needs at least one row and one column, got ({},{})",
                nrows, ncols
            )));
        }

        if data.len() != nrows * ncols {
            return Err(MatrixError::InvalidShape(format!(
                "data length does not match matrix dimensions: {} vs ({},{})",
                data.len(),
                nrows,
                ncols
            )));
        }

        Ok(Matrix {
            data: data.into(),
            nrows,
            ncols,
        })
    }

    /// Create a new matrix from a 2-dimensional vector of scalars.
    pub fn from_nested_vec(matrix: Vec<Vec<Rational>>) -> Result<Matrix, MatrixError> {
        let nrows = matrix.len();
        let ncols = matrix.first().map(|r| r.len()).unwrap_or(0);

        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in matrix.into_iter().enumerate() {
            if row.len() != ncols {
                return Err(MatrixError::InvalidShape(format!(
                    "row {} has {} entries, expected {}",
                    i + 1,
                    row.len(),
                    ncols
                )));
            }
            data.extend(row);
        }

        Matrix::from_linear(data, nrows, ncols)
    }

    /// Validate a grid of raw cells and convert it into a matrix.
    ///
    /// The grid must be non-empty and rectangular, and every cell must be
    /// an integer, a decimal or a fraction `a/b` with `b != 0`.
    pub fn validate<C: Clone + Into<Cell>>(grid: &[Vec<C>]) -> Result<Matrix, MatrixError> {
        let ncols = grid.first().map(|r| r.len()).unwrap_or(0);
        if grid.is_empty() || ncols == 0 {
            return Err(MatrixError::InvalidShape(
                "a matrix needs at least one row and one column".to_owned(),
            ));
        }

        let mut data = Vec::with_capacity(grid.len() * ncols);
        for (i, row) in grid.iter().enumerate() {
            if row.len() != ncols {
                return Err(MatrixError::InvalidShape(format!(
                    "row {} has {} entries, expected {}",
                    i + 1,
                    row.len(),
                    ncols
                )));
            }

            for (j, c) in row.iter().enumerate() {
                let cell: Cell = c.clone().into();
                let r = cell.to_rational().map_err(|_| MatrixError::InvalidElement {
                    position: Some((i, j)),
                    value: cell.to_string(),
                })?;
                data.push(r);
            }
        }

        Matrix::from_linear(data, grid.len(), ncols)
    }

    /// Parse a grid of textual cells, such as `"3"`, `"-0.5"` or `"2/7"`.
    pub fn parse<S: AsRef<str>>(grid: &[Vec<S>]) -> Result<Matrix, MatrixError> {
        let cells: Vec<Vec<Cell>> = grid
            .iter()
            .map(|r| r.iter().map(|s| Cell::from(s.as_ref())).collect())
            .collect();
        Matrix::validate(&cells)
    }

    /// Return the number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Return the number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Return the entries in row-major order.
    pub fn data(&self) -> &[Rational] {
        &self.data
    }

    /// Return the `i`th row.
    pub fn row(&self, i: usize) -> &[Rational] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    /// Return a copy of the `j`th column.
    pub fn column(&self, j: usize) -> Vec<Rational> {
        (0..self.nrows).map(|i| self[(i, j)].clone()).collect()
    }

    /// Return an iterator over the rows of the matrix.
    pub fn row_iter(&self) -> Chunks<'_, Rational> {
        self.data.chunks(self.ncols)
    }

    /// Return true iff every entry in the matrix is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|e| e.is_zero())
    }

    pub fn is_identity(&self) -> bool {
        self.is_square()
            && self.data.iter().enumerate().all(|(i, e)| {
                if i % self.ncols == i / self.ncols {
                    e.is_one()
                } else {
                    e.is_zero()
                }
            })
    }

    /// Transpose the matrix.
    pub fn transpose(&self) -> Matrix {
        let mut m = Matrix::new(self.ncols, self.nrows);
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                m[(j, i)] = self[(i, j)].clone();
            }
        }
        m
    }

    /// Multiply the scalar `e` to each entry of the matrix.
    pub fn mul_scalar(&self, e: &Rational) -> Matrix {
        Matrix {
            data: self.data.iter().map(|ee| ee * e).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    /// Append the columns of `other` to the right of `self`.
    pub fn augment(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.nrows != other.nrows {
            return Err(MatrixError::ShapeMismatch {
                lhs: (self.nrows, self.ncols),
                rhs: (other.nrows, other.ncols),
            });
        }

        let ncols = self.ncols + other.ncols;
        let mut data = SmallVec::with_capacity(self.nrows * ncols);
        for (a, b) in self.row_iter().zip(other.row_iter()) {
            data.extend(a.iter().cloned());
            data.extend(b.iter().cloned());
        }

        Ok(Matrix {
            data,
            nrows: self.nrows,
            ncols,
        })
    }

    /// Return the block of all rows restricted to the columns in `cols`.
    ///
    /// Panics when the range is empty or out of bounds.
    pub fn columns(&self, cols: Range<usize>) -> Matrix {
        assert!(
            cols.start < cols.end && cols.end <= self.ncols,
            "Column range {:?} is invalid for a matrix with {} columns",
            cols,
            self.ncols
        );

        Matrix {
            data: self
                .row_iter()
                .flat_map(|r| r[cols.clone()].iter().cloned())
                .collect(),
            nrows: self.nrows,
            ncols: cols.end - cols.start,
        }
    }

    /// Return a copy of the matrix where column `j` is replaced by `column`.
    pub fn with_column_replaced(&self, j: usize, column: &[Rational]) -> Result<Matrix, MatrixError> {
        if column.len() != self.nrows || j >= self.ncols {
            return Err(MatrixError::ShapeMismatch {
                lhs: (self.nrows, self.ncols),
                rhs: (column.len(), 1),
            });
        }

        let mut m = self.clone();
        for (i, e) in column.iter().enumerate() {
            m[(i, j)] = e.clone();
        }
        Ok(m)
    }

    /// Swap rows `i` and `j`.
    pub fn swap_rows(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }

        for l in 0..self.ncols {
            self.data.swap(i * self.ncols + l, j * self.ncols + l);
        }
    }

    /// Multiply every entry of row `i` by `scalar`.
    pub fn mul_row(&mut self, i: usize, scalar: &Rational) {
        for l in 0..self.ncols {
            self[(i, l)] *= scalar;
        }
    }

    /// Replace row `target` by `row[target] - factor * row[source]`.
    pub fn eliminate_row(&mut self, target: usize, factor: &Rational, source: usize) {
        for l in 0..self.ncols {
            let mut e = std::mem::take(&mut self[(target, l)]);
            e -= &self[(source, l)] * factor;
            self[(target, l)] = e;
        }
    }

    pub fn checked_add(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape(rhs)?;
        Ok(self + rhs)
    }

    pub fn checked_sub(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_shape(rhs)?;
        Ok(self - rhs)
    }

    pub fn checked_mul(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        if self.ncols != rhs.nrows {
            return Err(MatrixError::ShapeMismatch {
                lhs: (self.nrows, self.ncols),
                rhs: (rhs.nrows, rhs.ncols),
            });
        }
        Ok(self * rhs)
    }

    fn check_same_shape(&self, rhs: &Matrix) -> Result<(), MatrixError> {
        if self.nrows != rhs.nrows || self.ncols != rhs.ncols {
            Err(MatrixError::ShapeMismatch {
                lhs: (self.nrows, self.ncols),
                rhs: (rhs.nrows, rhs.ncols),
            })
        } else {
            Ok(())
        }
    }

    /// Render every entry with its canonical `n` or `n/d` form.
    pub fn to_strings(&self) -> Vec<Vec<String>> {
        self.row_iter()
            .map(|r| r.iter().map(|e| e.to_string()).collect())
            .collect()
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Rational;

    /// Get the `i`th row and `j`th column of the matrix, where `index=(i,j)`.
    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.data[index.0 * self.ncols + index.1]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Rational {
        &mut self.data[index.0 * self.ncols + index.1]
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        MatrixPrinter::new(self).fmt(f)
    }
}

impl Add<&Matrix> for &Matrix {
    type Output = Matrix;

    /// Add two matrices. Panics when the shapes differ.
    fn add(self, rhs: &Matrix) -> Self::Output {
        if self.nrows != rhs.nrows || self.ncols != rhs.ncols {
            panic!(
                "Cannot add matrices of different dimensions: ({},{}) vs ({},{})",
                self.nrows, self.ncols, rhs.nrows, rhs.ncols
            );
        }

        Matrix {
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a + b).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl AddAssign<&Matrix> for Matrix {
    fn add_assign(&mut self, rhs: &Matrix) {
        *self = &*self + rhs;
    }
}

impl Sub<&Matrix> for &Matrix {
    type Output = Matrix;

    /// Subtract two matrices. Panics when the shapes differ.
    fn sub(self, rhs: &Matrix) -> Self::Output {
        if self.nrows != rhs.nrows || self.ncols != rhs.ncols {
            panic!(
                "Cannot subtract matrices of different dimensions: ({},{}) vs ({},{})",
                self.nrows, self.ncols, rhs.nrows, rhs.ncols
            );
        }

        Matrix {
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| a - b).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl SubAssign<&Matrix> for Matrix {
    fn sub_assign(&mut self, rhs: &Matrix) {
        *self = &*self - rhs;
    }
}

impl Mul<&Matrix> for &Matrix {
    type Output = Matrix;

    /// Multiply two matrices. Panics when the inner dimensions differ.
    fn mul(self, rhs: &Matrix) -> Self::Output {
        if self.ncols != rhs.nrows {
            panic!(
                "Cannot multiply matrices because of a dimension mismatch: ({},{}) vs ({},{})",
                self.nrows, self.ncols, rhs.nrows, rhs.ncols
            );
        }

        let mut m = Matrix::new(self.nrows, rhs.ncols);
        for i in 0..self.nrows {
            for j in 0..rhs.ncols {
                m[(i, j)] = (0..self.ncols).map(|k| &self[(i, k)] * &rhs[(k, j)]).sum();
            }
        }

        m
    }
}

impl Neg for Matrix {
    type Output = Matrix;

    /// Negate each entry of the matrix.
    fn neg(mut self) -> Self::Output {
        for e in &mut self.data {
            *e = -&*e;
        }

        self
    }
}

#[cfg(test)]
mod test {
    use crate::{
        domains::rational::Rational,
        linalg::matrix::{Cell, Matrix, MatrixError},
    };

    #[test]
    fn basics() {
        let a = Matrix::from_linear(
            vec![1.into(), 2.into(), 3.into(), 4.into(), 5.into(), 6.into()],
            2,
            3,
        )
        .unwrap();

        assert_eq!(a.transpose().data.as_slice(), &[1, 4, 2, 5, 3, 6].map(Rational::from));
        assert_eq!(a.row(1), &[4, 5, 6].map(Rational::from));
        assert_eq!(a.column(2), vec![3.into(), 6.into()]);
        assert!((&a - &a).is_zero());
        assert_eq!((-a.clone())[(1, 2)], (-6).into());

        let b = Matrix::from_nested_vec(vec![
            vec![7.into(), 8.into()],
            vec![9.into(), 10.into()],
            vec![11.into(), 12.into()],
        ])
        .unwrap();

        let c = &a * &b;
        assert_eq!(c.data.as_slice(), &[58, 64, 139, 154].map(Rational::from));
        assert_eq!(c[(0, 1)], 64.into());

        let mut d = a.clone();
        d += &a;
        assert_eq!(d, a.mul_scalar(&2.into()));

        assert!(matches!(
            a.checked_mul(&a),
            Err(MatrixError::ShapeMismatch {
                lhs: (2, 3),
                rhs: (2, 3)
            })
        ));
    }

    #[test]
    fn validate() {
        let m = Matrix::validate(&[
            vec![Cell::from(1), Cell::from("-2/4"), Cell::from(0.25)],
            vec![Cell::from(" 3 "), Cell::from(Rational::from((1, 3))), Cell::from("7.")],
        ])
        .unwrap();

        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m[(0, 1)], (-1, 2).into());
        assert_eq!(m[(0, 2)], (1, 4).into());
        assert_eq!(m[(1, 0)], 3.into());
        assert_eq!(m[(1, 2)], 7.into());
    }

    #[test]
    fn validate_errors() {
        assert!(matches!(
            Matrix::parse::<&str>(&[]),
            Err(MatrixError::InvalidShape(_))
        ));
        assert!(matches!(
            Matrix::parse::<&str>(&[vec![]]),
            Err(MatrixError::InvalidShape(_))
        ));
        assert!(matches!(
            Matrix::parse(&[vec!["1", "2"], vec!["3"]]),
            Err(MatrixError::InvalidShape(_))
        ));
        assert_eq!(
            Matrix::parse(&[vec!["1", "2"], vec!["3", "x"]]),
            Err(MatrixError::InvalidElement {
                position: Some((1, 1)),
                value: "x".to_owned()
            })
        );
        assert_eq!(
            Matrix::parse(&[vec!["1/0"]]),
            Err(MatrixError::InvalidElement {
                position: Some((0, 0)),
                value: "1/0".to_owned()
            })
        );
        assert!(matches!(
            Matrix::validate(&[vec![f64::INFINITY]]),
            Err(MatrixError::InvalidElement { .. })
        ));
        assert_eq!(
            Matrix::parse(&[vec!["1", "1 2"]]),
            Err(MatrixError::InvalidElement {
                position: Some((0, 1)),
                value: "1 2".to_owned()
            })
        );
    }

    #[test]
    fn signed_denominators_and_exponents() {
        let m = Matrix::parse(&[vec!["1/-2", "-3/-4"], vec!["1e-3", " 2.5E2 "]]).unwrap();
        assert_eq!(m[(0, 0)], (-1, 2).into());
        assert_eq!(m[(0, 1)], (3, 4).into());
        assert_eq!(m[(1, 0)], (1, 1000).into());
        assert_eq!(m[(1, 1)], 250.into());
    }

    #[test]
    fn blocks() {
        let a = Matrix::parse(&[vec!["1", "2"], vec!["3", "4"]]).unwrap();
        let aug = a.augment(&Matrix::identity(2)).unwrap();
        assert_eq!(aug.ncols(), 4);
        assert_eq!(aug.columns(0..2), a);
        assert!(aug.columns(2..4).is_identity());

        let replaced = a.with_column_replaced(1, &[5.into(), 6.into()]).unwrap();
        assert_eq!(replaced.column(1), vec![5.into(), 6.into()]);
        assert!(a.with_column_replaced(1, &[5.into()]).is_err());
    }

    #[test]
    fn row_operations() {
        let mut a = Matrix::parse(&[vec!["2", "4"], vec!["3", "1"]]).unwrap();
        a.swap_rows(0, 1);
        assert_eq!(a.row(0), &[3, 1].map(Rational::from));

        a.mul_row(1, &(1, 2).into());
        assert_eq!(a.row(1), &[1, 2].map(Rational::from));

        a.eliminate_row(0, &3.into(), 1);
        assert_eq!(a.row(0), &[0, -5].map(Rational::from));
    }
}
