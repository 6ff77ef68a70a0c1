use crate::{
    domains::rational::Rational,
    linalg::{matrix::Matrix, operations::Operation},
    printer::{FormatOptions, RationalPrinter, RenderedStep, StepPrinter},
};

/// A labelled phase of a computation, recorded as a heading in the trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Initial,
    Augmented,
    UpperTriangular,
    RowEchelon,
    Reduced,
    Transposed,
    Result,
}

/// The value of one entry of a row computed during a matrix operation,
/// together with the operand pairs it was computed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryComputation {
    pub column: usize,
    pub operands: Vec<(Rational, Rational)>,
    pub value: Rational,
}

/// A single term `coefficient × x_variable` with the value that was
/// substituted for the variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstitutedTerm {
    pub coefficient: Rational,
    pub variable: usize,
    pub value: Rational,
}

/// What happened in a step. Row, column and variable indices are zero-based;
/// they are shown one-based when rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepKind {
    Stage(Stage),
    /// `R_first ↔ R_second`.
    Swap { first: usize, second: usize },
    /// `R_row → R_row ÷ divisor`.
    Scale { row: usize, divisor: Rational },
    /// `R_target → R_target − factor × R_source`.
    Eliminate {
        target: usize,
        factor: Rational,
        source: usize,
    },
    /// No non-zero entry was found on or below the pivot row of `column`.
    NoPivot { column: usize },
    /// The determinant as the signed product of the diagonal of a triangular form.
    DiagonalProduct {
        diagonal: Vec<Rational>,
        swaps: usize,
        value: Rational,
    },
    /// The determinant of the coefficient matrix, or of the matrix with
    /// column `minor` replaced by the right-hand side.
    Determinant {
        minor: Option<usize>,
        value: Rational,
    },
    ReplaceColumn { column: usize },
    CramerRatio {
        variable: usize,
        numerator: Rational,
        denominator: Rational,
        value: Rational,
    },
    BackSubstitution {
        variable: usize,
        rhs: Rational,
        terms: Vec<SubstitutedTerm>,
        value: Rational,
    },
    /// An operand of a matrix operation was multiplied by a scalar.
    ScaleOperand { operand: char, scalar: Rational },
    RowComputation {
        operation: Operation,
        row: usize,
        entries: Vec<EntryComputation>,
    },
}

/// A step with the matrix state immediately after it, if it changed or
/// produced a matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub snapshot: Option<Matrix>,
}

/// An append-only, ordered record of the steps of a computation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepTrace {
    steps: Vec<Step>,
}

impl StepTrace {
    pub fn new() -> StepTrace {
        StepTrace { steps: vec![] }
    }

    /// Append a step together with a snapshot of `matrix`.
    pub fn record(&mut self, kind: StepKind, matrix: &Matrix) {
        self.steps.push(Step {
            kind,
            snapshot: Some(matrix.clone()),
        });
    }

    /// Append a step that does not change any matrix.
    pub fn note(&mut self, kind: StepKind) {
        self.steps.push(Step {
            kind,
            snapshot: None,
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// The most recent snapshot in the trace.
    pub fn last_snapshot(&self) -> Option<&Matrix> {
        self.steps.iter().rev().find_map(|s| s.snapshot.as_ref())
    }

    /// Turn every step into a description and the rendered cells of its snapshot.
    pub fn render(&self, opts: &FormatOptions) -> Vec<RenderedStep> {
        self.steps
            .iter()
            .map(|s| RenderedStep {
                description: StepPrinter::new(&s.kind, opts).to_string(),
                matrix: s.snapshot.as_ref().map(|m| {
                    m.row_iter()
                        .map(|r| {
                            r.iter()
                                .map(|e| RationalPrinter::new(e, opts).to_string())
                                .collect()
                        })
                        .collect()
                }),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a StepTrace {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl IntoIterator for StepTrace {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}
