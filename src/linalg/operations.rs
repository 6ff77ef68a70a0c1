use std::{fmt::Display, str::FromStr};

use tracing::instrument;

use crate::{
    domains::rational::Rational,
    linalg::{
        matrix::{Matrix, MatrixError},
        trace::{EntryComputation, Stage, StepKind, StepTrace},
    },
};

/// A binary matrix operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
}

impl FromStr for Operation {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "+" | "add" | "sum" | "suma" => Ok(Operation::Add),
            "-" | "sub" | "subtract" | "resta" => Ok(Operation::Subtract),
            "*" | "×" | "mul" | "multiply" | "multiplicacion" | "multiplicación" => {
                Ok(Operation::Multiply)
            }
            _ => Err(MatrixError::UnsupportedOperation(s.to_owned())),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Add => f.write_str("add"),
            Operation::Subtract => f.write_str("subtract"),
            Operation::Multiply => f.write_str("multiply"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationResult {
    pub result: Matrix,
    pub steps: StepTrace,
}

/// Compute `(scalar_a · A) op (scalar_b · B)` one row at a time, recording
/// the computation of every entry.
#[instrument(level = "trace", skip_all, fields(%a, %b, %op))]
pub fn operate(
    a: &Matrix,
    b: &Matrix,
    op: Operation,
    scalar_a: Option<&Rational>,
    scalar_b: Option<&Rational>,
) -> Result<OperationResult, MatrixError> {
    let compatible = match op {
        Operation::Add | Operation::Subtract => a.nrows() == b.nrows() && a.ncols() == b.ncols(),
        Operation::Multiply => a.ncols() == b.nrows(),
    };
    if !compatible {
        return Err(MatrixError::ShapeMismatch {
            lhs: (a.nrows(), a.ncols()),
            rhs: (b.nrows(), b.ncols()),
        });
    }

    let mut steps = StepTrace::new();
    let a = scale_operand(a, 'A', scalar_a, &mut steps);
    let b = scale_operand(b, 'B', scalar_b, &mut steps);

    let ncols = match op {
        Operation::Multiply => b.ncols(),
        _ => a.ncols(),
    };
    let mut result = Matrix::new(a.nrows(), ncols);

    for i in 0..a.nrows() {
        let mut entries = Vec::with_capacity(ncols);
        for j in 0..ncols {
            let (operands, value): (Vec<(Rational, Rational)>, Rational) = match op {
                Operation::Add => {
                    let (x, y) = (&a[(i, j)], &b[(i, j)]);
                    (vec![(x.clone(), y.clone())], x + y)
                }
                Operation::Subtract => {
                    let (x, y) = (&a[(i, j)], &b[(i, j)]);
                    (vec![(x.clone(), y.clone())], x - y)
                }
                Operation::Multiply => {
                    let operands: Vec<_> = (0..a.ncols())
                        .map(|k| (a[(i, k)].clone(), b[(k, j)].clone()))
                        .collect();
                    let value = operands.iter().map(|(x, y)| x * y).sum();
                    (operands, value)
                }
            };

            result[(i, j)] = value.clone();
            entries.push(EntryComputation {
                column: j,
                operands,
                value,
            });
        }

        steps.record(
            StepKind::RowComputation {
                operation: op,
                row: i,
                entries,
            },
            &result,
        );
    }

    steps.record(StepKind::Stage(Stage::Result), &result);
    Ok(OperationResult { result, steps })
}

fn scale_operand(
    m: &Matrix,
    operand: char,
    scalar: Option<&Rational>,
    steps: &mut StepTrace,
) -> Matrix {
    match scalar {
        Some(s) if !s.is_one() => {
            let scaled = m.mul_scalar(s);
            steps.record(
                StepKind::ScaleOperand {
                    operand,
                    scalar: s.clone(),
                },
                &scaled,
            );
            scaled
        }
        _ => m.clone(),
    }
}

/// Transpose a matrix, recording the input and the result.
pub fn transpose_traced(matrix: &Matrix) -> OperationResult {
    let mut steps = StepTrace::new();
    steps.record(StepKind::Stage(Stage::Initial), matrix);

    let result = matrix.transpose();
    steps.record(StepKind::Stage(Stage::Transposed), &result);

    OperationResult { result, steps }
}
