use std::fmt::Display;

use ahash::{AHashMap, AHashSet};
use smartstring::alias::String;
use tracing::{debug, instrument};

use crate::{
    domains::rational::Rational,
    linalg::{
        matrix::{Matrix, MatrixError},
        reduce::{forward_eliminate, ReductionMode, ReductionResult, Reducer},
        trace::{StepKind, StepTrace, SubstitutedTerm},
    },
    printer::FormatOptions,
};

/// A pivot variable expressed in the free variables:
/// `variable = constant − Σ coefficient × free`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParametricExpression {
    pub variable: String,
    pub constant: Rational,
    pub terms: Vec<(Rational, String)>,
}

impl ParametricExpression {
    /// Evaluate the expression for the given values of the free variables.
    /// Returns `None` if a free variable in the expression has no value.
    pub fn evaluate(&self, free: &AHashMap<String, Rational>) -> Option<Rational> {
        let mut value = self.constant.clone();
        for (c, v) in &self.terms {
            value -= c * free.get(v)?;
        }
        Some(value)
    }
}

/// The solution set of a linear system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SystemSolution {
    Unique {
        variables: Vec<String>,
        values: Vec<Rational>,
    },
    Infinite {
        free: Vec<String>,
        expressions: Vec<ParametricExpression>,
    },
    /// Row `row` of the reduced matrix reads `0 = c` with `c != 0`.
    Inconsistent { row: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemReport {
    pub solution: SystemSolution,
    /// The variables whose columns contain a pivot.
    pub pivot_variables: Vec<String>,
    pub reduction: ReductionResult,
}

/// Default variable names `x₁, …, xₙ`.
pub fn default_variable_names(n: usize) -> Vec<String> {
    let opts = FormatOptions::default();
    (0..n)
        .map(|i| crate::printer::variable_name(i, &opts).into())
        .collect()
}

/// Classify an augmented system `[A | b]` with `n` unknowns and `n` equations
/// as having a unique solution, infinitely many solutions or no solution.
pub fn classify_system(augmented: &Matrix) -> Result<SystemReport, MatrixError> {
    let names = default_variable_names(augmented.ncols().saturating_sub(1));
    classify_system_with_names(augmented, &names)
}

/// Classify an augmented system, naming the unknowns with `names`.
#[instrument(level = "trace", skip_all, fields(%augmented))]
pub fn classify_system_with_names<S: AsRef<str>>(
    augmented: &Matrix,
    names: &[S],
) -> Result<SystemReport, MatrixError> {
    let n = augmented.nrows();
    if augmented.ncols() != n + 1 {
        return Err(MatrixError::NotAugmented {
            nrows: n,
            ncols: augmented.ncols(),
        });
    }

    if names.len() != n {
        return Err(MatrixError::ShapeMismatch {
            lhs: (n, n),
            rhs: (names.len(), 1),
        });
    }
    let names: Vec<String> = names.iter().map(|s| s.as_ref().into()).collect();

    let reduction = Reducer::new(ReductionMode::ReducedRowEchelon)
        .with_max_col(n)
        .reduce(augmented);
    let m = &reduction.matrix;

    let pivot_variables = reduction
        .pivot_columns
        .iter()
        .map(|&c| names[c].clone())
        .collect();

    let solution = if let Some(row) = inconsistent_row(m, n) {
        debug!("Row {} reads 0 = {}", row, m[(row, n)]);
        SystemSolution::Inconsistent { row }
    } else if reduction.rank() == n {
        SystemSolution::Unique {
            variables: names,
            values: (0..n).map(|i| m[(i, n)].clone()).collect(),
        }
    } else {
        let pivots: AHashSet<usize> = reduction.pivot_columns.iter().copied().collect();
        let free_columns: Vec<usize> = (0..n).filter(|c| !pivots.contains(c)).collect();

        let expressions = reduction
            .pivot_columns
            .iter()
            .enumerate()
            .map(|(row, &col)| ParametricExpression {
                variable: names[col].clone(),
                constant: m[(row, n)].clone(),
                terms: free_columns
                    .iter()
                    .filter(|&&f| !m[(row, f)].is_zero())
                    .map(|&f| (m[(row, f)].clone(), names[f].clone()))
                    .collect(),
            })
            .collect();

        SystemSolution::Infinite {
            free: free_columns.iter().map(|&f| names[f].clone()).collect(),
            expressions,
        }
    };

    Ok(SystemReport {
        solution,
        pivot_variables,
        reduction,
    })
}

/// Find a row whose first `n` entries are zero while the last one is not.
fn inconsistent_row(m: &Matrix, n: usize) -> Option<usize> {
    m.row_iter()
        .position(|r| r[..n].iter().all(|e| e.is_zero()) && !r[n].is_zero())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GaussianSolution {
    pub values: Vec<Rational>,
    /// The forward elimination to row-echelon form.
    pub reduction: ReductionResult,
    /// The elimination followed by the back substitution narrative.
    pub steps: StepTrace,
}

/// Solve a square augmented system `[A | b]` by forward elimination to
/// row-echelon form followed by back substitution.
#[instrument(level = "trace", skip_all, fields(%augmented))]
pub fn solve_gaussian(augmented: &Matrix) -> Result<GaussianSolution, MatrixError> {
    let n = augmented.nrows();
    if augmented.ncols() != n + 1 {
        return Err(MatrixError::NotAugmented {
            nrows: n,
            ncols: augmented.ncols(),
        });
    }

    let reduction = forward_eliminate(augmented);
    if reduction.singular {
        let steps = reduction.steps;
        return if inconsistent_row(&reduction.matrix, n).is_some() {
            Err(MatrixError::Inconsistent { steps })
        } else {
            Err(MatrixError::SingularSystem { steps })
        };
    }

    let m = &reduction.matrix;
    let mut steps = reduction.steps.clone();
    let mut values = vec![Rational::zero(); n];

    for i in (0..n).rev() {
        let rhs = m[(i, n)].clone();
        let terms: Vec<SubstitutedTerm> = (i + 1..n)
            .filter(|&j| !m[(i, j)].is_zero())
            .map(|j| SubstitutedTerm {
                coefficient: m[(i, j)].clone(),
                variable: j,
                value: values[j].clone(),
            })
            .collect();

        let mut value = rhs.clone();
        for t in &terms {
            value -= &t.coefficient * &t.value;
        }

        steps.note(StepKind::BackSubstitution {
            variable: i,
            rhs,
            terms,
            value: value.clone(),
        });
        values[i] = value;
    }

    Ok(GaussianSolution {
        values,
        reduction,
        steps,
    })
}

impl SystemSolution {
    /// Render the solution with the given options.
    pub fn format(&self, opts: &FormatOptions) -> std::string::String {
        crate::printer::SolutionPrinter::new(self, opts).to_string()
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, SystemSolution::Unique { .. })
    }
}

impl Display for SystemSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::printer::SolutionPrinter::new(self, &FormatOptions::default()).fmt(f)
    }
}
