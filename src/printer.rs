use std::fmt::{self, Write};

use smartstring::alias::String as Label;

use crate::{
    domains::rational::Rational,
    linalg::{
        matrix::Matrix,
        operations::Operation,
        system::SystemSolution,
        trace::{EntryComputation, Stage, StepKind, SubstitutedTerm},
    },
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrintMode {
    /// Subscripts and mathematical operators, such as `R₁ → R₁ − 2 × R₂`.
    Unicode,
    /// Plain ASCII, such as `R1 -> R1 - 2 * R2`.
    Ascii,
    /// LaTeX math, such as `R_{1} \to R_{1} - 2 \times R_{2}`.
    Latex,
}

/// Options that control how steps, matrices and solutions are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatOptions {
    pub print_mode: PrintMode,
    /// The letter used for rows, `R` by default. Spanish textbooks use `F`.
    pub row_label: Label,
    /// The prefix of default variable names.
    pub variable_prefix: Label,
}

impl FormatOptions {
    pub fn unicode() -> FormatOptions {
        FormatOptions {
            print_mode: PrintMode::Unicode,
            row_label: "R".into(),
            variable_prefix: "x".into(),
        }
    }

    pub fn ascii() -> FormatOptions {
        FormatOptions {
            print_mode: PrintMode::Ascii,
            ..FormatOptions::unicode()
        }
    }

    pub fn latex() -> FormatOptions {
        FormatOptions {
            print_mode: PrintMode::Latex,
            ..FormatOptions::unicode()
        }
    }

    pub fn with_row_label(mut self, label: &str) -> FormatOptions {
        self.row_label = label.into();
        self
    }

    pub fn with_variable_prefix(mut self, prefix: &str) -> FormatOptions {
        self.variable_prefix = prefix.into();
        self
    }

    fn swap(&self) -> &'static str {
        match self.print_mode {
            PrintMode::Unicode => "↔",
            PrintMode::Ascii => "<->",
            PrintMode::Latex => "\\leftrightarrow",
        }
    }

    fn arrow(&self) -> &'static str {
        match self.print_mode {
            PrintMode::Unicode => "→",
            PrintMode::Ascii => "->",
            PrintMode::Latex => "\\to",
        }
    }

    fn divide(&self) -> &'static str {
        match self.print_mode {
            PrintMode::Unicode => "÷",
            PrintMode::Ascii => "/",
            PrintMode::Latex => "\\div",
        }
    }

    fn minus(&self) -> &'static str {
        match self.print_mode {
            PrintMode::Unicode => "−",
            PrintMode::Ascii | PrintMode::Latex => "-",
        }
    }

    fn times(&self) -> &'static str {
        match self.print_mode {
            PrintMode::Unicode => "×",
            PrintMode::Ascii => "*",
            PrintMode::Latex => "\\times",
        }
    }

    fn cdot(&self) -> &'static str {
        match self.print_mode {
            PrintMode::Unicode => "·",
            PrintMode::Ascii => "*",
            PrintMode::Latex => "\\cdot ",
        }
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions::unicode()
    }
}

/// Write `n` with Unicode subscript digits.
pub fn subscript(n: usize) -> String {
    const DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];
    n.to_string()
        .bytes()
        .map(|b| DIGITS[(b - b'0') as usize])
        .collect()
}

fn indexed(base: &str, indices: &[usize], opts: &FormatOptions) -> String {
    match opts.print_mode {
        PrintMode::Unicode => {
            let mut s = base.to_owned();
            let separate = indices.len() > 1 && indices.iter().any(|&i| i > 9);
            for (k, i) in indices.iter().enumerate() {
                if separate && k > 0 {
                    s.push(',');
                }
                s.push_str(&subscript(*i));
            }
            s
        }
        PrintMode::Ascii if indices.len() == 1 => format!("{}{}", base, indices[0]),
        PrintMode::Ascii => format!(
            "{}[{}]",
            base,
            indices
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(",")
        ),
        PrintMode::Latex => format!(
            "{}_{{{}}}",
            base,
            indices
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(",")
        ),
    }
}

/// The label of the zero-based row `i`, such as `R₁`.
pub fn row_name(i: usize, opts: &FormatOptions) -> String {
    indexed(&opts.row_label, &[i + 1], opts)
}

/// The default name of the zero-based variable `i`, such as `x₁`.
pub fn variable_name(i: usize, opts: &FormatOptions) -> String {
    indexed(&opts.variable_prefix, &[i + 1], opts)
}

/// A step in a form ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStep {
    pub description: String,
    pub matrix: Option<Vec<Vec<String>>>,
}

/// Prints a rational number, as `-3/4` or as `-\frac{3}{4}` in LaTeX mode.
pub struct RationalPrinter<'a> {
    pub number: &'a Rational,
    pub opts: &'a FormatOptions,
    /// Wrap negative numbers in parentheses.
    pub parenthesize: bool,
}

impl<'a> RationalPrinter<'a> {
    pub fn new(number: &'a Rational, opts: &'a FormatOptions) -> RationalPrinter<'a> {
        RationalPrinter {
            number,
            opts,
            parenthesize: false,
        }
    }

    /// Print the number as an operand, wrapping negative values in parentheses.
    pub fn operand(number: &'a Rational, opts: &'a FormatOptions) -> RationalPrinter<'a> {
        RationalPrinter {
            number,
            opts,
            parenthesize: true,
        }
    }
}

impl<'a> fmt::Display for RationalPrinter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let wrap = self.parenthesize && self.number.is_negative();
        if wrap {
            f.write_char('(')?;
        }

        if self.opts.print_mode == PrintMode::Latex && !self.number.is_integer() {
            if self.number.is_negative() {
                f.write_char('-')?;
            }
            write!(
                f,
                "\\frac{{{}}}{{{}}}",
                self.number.numerator().abs(),
                self.number.denominator()
            )?;
        } else {
            write!(f, "{}", self.number)?;
        }

        if wrap {
            f.write_char(')')?;
        }
        Ok(())
    }
}

pub struct MatrixPrinter<'a> {
    pub matrix: &'a Matrix,
    pub opts: FormatOptions,
}

impl<'a> MatrixPrinter<'a> {
    pub fn new(matrix: &'a Matrix) -> MatrixPrinter<'a> {
        MatrixPrinter {
            matrix,
            opts: FormatOptions::default(),
        }
    }

    pub fn new_with_options(matrix: &'a Matrix, opts: FormatOptions) -> MatrixPrinter<'a> {
        MatrixPrinter { matrix, opts }
    }
}

impl<'a> fmt::Display for MatrixPrinter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .matrix
            .row_iter()
            .map(|r| {
                r.iter()
                    .map(|e| RationalPrinter::new(e, &self.opts).to_string())
                    .collect()
            })
            .collect();

        if self.opts.print_mode == PrintMode::Latex {
            f.write_str("\\begin{pmatrix}")?;
            for (i, r) in cells.iter().enumerate() {
                if i > 0 {
                    f.write_str(" \\\\ ")?;
                }
                f.write_str(&r.join(" & "))?;
            }
            return f.write_str("\\end{pmatrix}");
        }

        let mut widths = vec![0; self.matrix.ncols()];
        for r in &cells {
            for (w, c) in widths.iter_mut().zip(r) {
                *w = (*w).max(c.chars().count());
            }
        }

        for (i, r) in cells.iter().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            f.write_char('[')?;
            for (c, w) in r.iter().zip(&widths) {
                write!(f, " {:>w$}", c, w = w)?;
            }
            f.write_str(" ]")?;
        }
        Ok(())
    }
}

/// Prints the description of a step, such as `R₂ → R₂ − 3 × R₁`.
pub struct StepPrinter<'a> {
    pub kind: &'a StepKind,
    pub opts: &'a FormatOptions,
}

impl<'a> StepPrinter<'a> {
    pub fn new(kind: &'a StepKind, opts: &'a FormatOptions) -> StepPrinter<'a> {
        StepPrinter { kind, opts }
    }

    fn number<'b>(&'b self, r: &'b Rational) -> RationalPrinter<'b> {
        RationalPrinter::new(r, self.opts)
    }

    fn operand<'b>(&'b self, r: &'b Rational) -> RationalPrinter<'b> {
        RationalPrinter::operand(r, self.opts)
    }

    fn fmt_stage(&self, f: &mut fmt::Formatter, stage: &Stage) -> fmt::Result {
        f.write_str(match stage {
            Stage::Initial => "Initial matrix",
            Stage::Augmented => "Augmented matrix [A | I]",
            Stage::UpperTriangular => "Upper-triangular form",
            Stage::RowEchelon => "Row-echelon form",
            Stage::Reduced => "Reduced row-echelon form",
            Stage::Transposed => "Transposed matrix",
            Stage::Result => "Result",
        })
    }

    fn fmt_back_substitution(
        &self,
        f: &mut fmt::Formatter,
        variable: usize,
        rhs: &Rational,
        terms: &[SubstitutedTerm],
        value: &Rational,
    ) -> fmt::Result {
        let opts = self.opts;
        write!(f, "{} = ", variable_name(variable, opts))?;

        if !terms.is_empty() {
            let symbolic: Vec<String> = terms
                .iter()
                .map(|t| {
                    format!(
                        "{}{}{}",
                        self.operand(&t.coefficient),
                        opts.cdot(),
                        variable_name(t.variable, opts)
                    )
                })
                .collect();
            let numeric: Vec<String> = terms
                .iter()
                .map(|t| {
                    format!(
                        "{} {} {}",
                        self.operand(&t.coefficient),
                        opts.times(),
                        self.operand(&t.value)
                    )
                })
                .collect();

            for parts in [symbolic, numeric] {
                write!(f, "{} {} ", self.number(rhs), opts.minus())?;
                if parts.len() == 1 {
                    write!(f, "{} = ", parts[0])?;
                } else {
                    write!(f, "({}) = ", parts.join(" + "))?;
                }
            }
        }

        write!(f, "{}", self.number(value))
    }

    fn fmt_entry(
        &self,
        f: &mut fmt::Formatter,
        operation: Operation,
        row: usize,
        entry: &EntryComputation,
    ) -> fmt::Result {
        let opts = self.opts;
        write!(f, "{} = ", indexed("c", &[row + 1, entry.column + 1], opts))?;

        match operation {
            Operation::Add | Operation::Subtract => {
                let sign = if operation == Operation::Add {
                    "+"
                } else {
                    opts.minus()
                };
                for (x, y) in &entry.operands {
                    write!(f, "{} {} {}", self.number(x), sign, self.operand(y))?;
                }
            }
            Operation::Multiply => {
                for (k, (x, y)) in entry.operands.iter().enumerate() {
                    if k > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{}{}{}", self.operand(x), opts.cdot(), self.operand(y))?;
                }
            }
        }

        write!(f, " = {}", self.number(&entry.value))
    }
}

impl<'a> fmt::Display for StepPrinter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let opts = self.opts;
        match self.kind {
            StepKind::Stage(stage) => self.fmt_stage(f, stage),
            StepKind::Swap { first, second } => write!(
                f,
                "{} {} {}",
                row_name(*first, opts),
                opts.swap(),
                row_name(*second, opts)
            ),
            StepKind::Scale { row, divisor } => {
                let r = row_name(*row, opts);
                write!(
                    f,
                    "{} {} {} {} {}",
                    r,
                    opts.arrow(),
                    r,
                    opts.divide(),
                    self.operand(divisor)
                )
            }
            StepKind::Eliminate {
                target,
                factor,
                source,
            } => {
                let t = row_name(*target, opts);
                write!(
                    f,
                    "{} {} {} {} {} {} {}",
                    t,
                    opts.arrow(),
                    t,
                    opts.minus(),
                    self.operand(factor),
                    opts.times(),
                    row_name(*source, opts)
                )
            }
            StepKind::NoPivot { column } => write!(f, "No pivot in column {}", column + 1),
            StepKind::DiagonalProduct {
                diagonal,
                swaps,
                value,
            } => {
                f.write_str("det = ")?;
                if *swaps > 0 {
                    match opts.print_mode {
                        PrintMode::Latex => write!(f, "(-1)^{{{}}}", swaps)?,
                        _ => write!(f, "({}1)^{}", opts.minus(), swaps)?,
                    }
                    write!(f, " {} ", opts.times())?;
                }
                for (i, d) in diagonal.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", opts.times())?;
                    }
                    write!(f, "{}", self.operand(d))?;
                }
                write!(f, " = {}", self.number(value))
            }
            StepKind::Determinant { minor, value } => match minor {
                Some(i) => write!(
                    f,
                    "det({}) = {}",
                    indexed("A", &[i + 1], opts),
                    self.number(value)
                ),
                None => write!(f, "det(A) = {}", self.number(value)),
            },
            StepKind::ReplaceColumn { column } => write!(
                f,
                "Replace column {} of A with b to form {}",
                column + 1,
                indexed("A", &[column + 1], opts)
            ),
            StepKind::CramerRatio {
                variable,
                numerator,
                denominator,
                value,
            } => write!(
                f,
                "{} = det({}) {} det(A) = {} {} {} = {}",
                variable_name(*variable, opts),
                indexed("A", &[variable + 1], opts),
                opts.divide(),
                self.number(numerator),
                opts.divide(),
                self.operand(denominator),
                self.number(value)
            ),
            StepKind::BackSubstitution {
                variable,
                rhs,
                terms,
                value,
            } => self.fmt_back_substitution(f, *variable, rhs, terms, value),
            StepKind::ScaleOperand { operand, scalar } => write!(
                f,
                "{} {} {} {} {}",
                operand,
                opts.arrow(),
                self.operand(scalar),
                opts.times(),
                operand
            ),
            StepKind::RowComputation {
                operation,
                row,
                entries,
            } => {
                write!(f, "Row {}: ", row + 1)?;
                for (k, e) in entries.iter().enumerate() {
                    if k > 0 {
                        f.write_str(", ")?;
                    }
                    self.fmt_entry(f, *operation, *row, e)?;
                }
                Ok(())
            }
        }
    }
}

/// Prints the solution set of a system, such as `x₁ = 5 − 2·x₂, x₂ free`.
pub struct SolutionPrinter<'a> {
    pub solution: &'a SystemSolution,
    pub opts: &'a FormatOptions,
}

impl<'a> SolutionPrinter<'a> {
    pub fn new(solution: &'a SystemSolution, opts: &'a FormatOptions) -> SolutionPrinter<'a> {
        SolutionPrinter { solution, opts }
    }
}

impl<'a> fmt::Display for SolutionPrinter<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let opts = self.opts;
        match self.solution {
            SystemSolution::Unique { variables, values } => {
                for (i, (v, x)) in variables.iter().zip(values).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", v, RationalPrinter::new(x, opts))?;
                }
                Ok(())
            }
            SystemSolution::Infinite { free, expressions } => {
                for (i, e) in expressions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = ", e.variable)?;

                    let mut empty = e.constant.is_zero();
                    if !empty {
                        write!(f, "{}", RationalPrinter::new(&e.constant, opts))?;
                    }

                    for (c, name) in &e.terms {
                        // the expression reads `constant − c·name`
                        let subtract = !c.is_negative();
                        let magnitude = c.abs();
                        if empty {
                            if subtract {
                                f.write_str(opts.minus())?;
                            }
                            empty = false;
                        } else {
                            write!(f, " {} ", if subtract { opts.minus() } else { "+" })?;
                        }

                        if !magnitude.is_one() {
                            write!(f, "{}{}", RationalPrinter::new(&magnitude, opts), opts.cdot())?;
                        }
                        f.write_str(name)?;
                    }

                    if empty {
                        f.write_char('0')?;
                    }
                }

                if !free.is_empty() {
                    if !expressions.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} free", free.join(", "))?;
                }
                Ok(())
            }
            SystemSolution::Inconsistent { row } => {
                write!(f, "No solution: row {} reads 0 = c with c ≠ 0", row + 1)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        domains::rational::Rational,
        linalg::{
            matrix::Matrix,
            system::{ParametricExpression, SystemSolution},
            trace::{StepKind, SubstitutedTerm},
        },
        printer::{
            row_name, subscript, FormatOptions, MatrixPrinter, SolutionPrinter, StepPrinter,
        },
    };

    fn render(kind: &StepKind, opts: &FormatOptions) -> String {
        StepPrinter::new(kind, opts).to_string()
    }

    #[test]
    fn subscripts() {
        assert_eq!(subscript(0), "₀");
        assert_eq!(subscript(12), "₁₂");
        assert_eq!(row_name(0, &FormatOptions::unicode()), "R₁");
        assert_eq!(row_name(1, &FormatOptions::unicode().with_row_label("F")), "F₂");
        assert_eq!(row_name(9, &FormatOptions::ascii()), "R10");
        assert_eq!(row_name(2, &FormatOptions::latex()), "R_{3}");
    }

    #[test]
    fn row_operations() {
        let u = FormatOptions::unicode();
        let a = FormatOptions::ascii();

        let swap = StepKind::Swap { first: 0, second: 1 };
        assert_eq!(render(&swap, &u), "R₁ ↔ R₂");
        assert_eq!(render(&swap, &a), "R1 <-> R2");

        let scale = StepKind::Scale {
            row: 0,
            divisor: 2.into(),
        };
        assert_eq!(render(&scale, &u), "R₁ → R₁ ÷ 2");

        let eliminate = StepKind::Eliminate {
            target: 1,
            factor: (-3, 2).into(),
            source: 0,
        };
        assert_eq!(render(&eliminate, &u), "R₂ → R₂ − (-3/2) × R₁");
        assert_eq!(render(&eliminate, &a), "R2 -> R2 - (-3/2) * R1");
        assert_eq!(
            render(&eliminate, &FormatOptions::latex()),
            "R_{2} \\to R_{2} - (-\\frac{3}{2}) \\times R_{1}"
        );
    }

    #[test]
    fn narrative() {
        let u = FormatOptions::unicode();

        let det = StepKind::DiagonalProduct {
            diagonal: vec![2.into(), (5, 2).into()],
            swaps: 1,
            value: (-5).into(),
        };
        assert_eq!(render(&det, &u), "det = (−1)^1 × 2 × 5/2 = -5");

        let ratio = StepKind::CramerRatio {
            variable: 0,
            numerator: 3.into(),
            denominator: (-1).into(),
            value: (-3).into(),
        };
        assert_eq!(render(&ratio, &u), "x₁ = det(A₁) ÷ det(A) = 3 ÷ (-1) = -3");

        let back = StepKind::BackSubstitution {
            variable: 0,
            rhs: 12.into(),
            terms: vec![SubstitutedTerm {
                coefficient: 1.into(),
                variable: 1,
                value: 7.into(),
            }],
            value: 5.into(),
        };
        assert_eq!(render(&back, &u), "x₁ = 12 − 1·x₂ = 12 − 1 × 7 = 5");
    }

    #[test]
    fn matrices() {
        let m = Matrix::parse(&[vec!["1", "-1/2"], vec!["10", "3"]]).unwrap();
        assert_eq!(MatrixPrinter::new(&m).to_string(), "[  1 -1/2 ]\n[ 10    3 ]");
        assert_eq!(
            MatrixPrinter::new_with_options(&m, FormatOptions::latex()).to_string(),
            "\\begin{pmatrix}1 & -\\frac{1}{2} \\\\ 10 & 3\\end{pmatrix}"
        );
    }

    #[test]
    fn solutions() {
        let infinite = SystemSolution::Infinite {
            free: vec!["x₂".into()],
            expressions: vec![ParametricExpression {
                variable: "x₁".into(),
                constant: 5.into(),
                terms: vec![(2.into(), "x₂".into())],
            }],
        };
        assert_eq!(infinite.to_string(), "x₁ = 5 − 2·x₂, x₂ free");

        let homogeneous = SystemSolution::Infinite {
            free: vec!["y".into()],
            expressions: vec![ParametricExpression {
                variable: "x".into(),
                constant: Rational::zero(),
                terms: vec![((-1).into(), "y".into())],
            }],
        };
        assert_eq!(
            SolutionPrinter::new(&homogeneous, &FormatOptions::ascii()).to_string(),
            "x = y, y free"
        );

        let unique = SystemSolution::Unique {
            variables: vec!["x".into(), "y".into()],
            values: vec![5.into(), (7, 2).into()],
        };
        assert_eq!(unique.to_string(), "x = 5, y = 7/2");
    }
}
