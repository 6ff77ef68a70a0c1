//! Parse linear equations such as `2x - y/3 = 4(z + 1)` into rows of an
//! augmented matrix.
//!
//! An equation is a sum of terms on each side of a single `=`. Products and
//! quotients are allowed as long as the result stays linear: a product needs
//! at least one constant factor and a divisor must be a non-zero constant.
//! A number directly followed by a variable or a parenthesis is an implicit
//! product, so `2x` reads as `2*x`.

use std::fmt::Display;

use ahash::AHashMap;
use smartstring::{LazyCompact, SmartString};

use crate::{
    domains::rational::Rational,
    linalg::matrix::{Matrix, MatrixError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The zero-based index of the equation in the system, if known.
    pub equation: Option<usize>,
    pub message: String,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.equation {
            Some(i) => write!(f, "Equation {}: {}", i + 1, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<MatrixError> for ParseError {
    fn from(e: MatrixError) -> Self {
        ParseError {
            equation: None,
            message: e.to_string(),
        }
    }
}

fn error<T>(message: impl Into<String>) -> Result<T, ParseError> {
    Err(ParseError {
        equation: None,
        message: message.into(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(SmartString<LazyCompact>),
    ID(SmartString<LazyCompact>),
    Plus,
    Minus,
    Times,
    Divide,
    Equals,
    OpenParenthesis,
    CloseParenthesis,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => f.write_str(n),
            Token::ID(v) => f.write_str(v),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Times => f.write_str("*"),
            Token::Divide => f.write_str("/"),
            Token::Equals => f.write_str("="),
            Token::OpenParenthesis => f.write_str("("),
            Token::CloseParenthesis => f.write_str(")"),
        }
    }
}

/// Map typographic operators to their ASCII form and drop invisible characters.
fn normalize(c: char) -> Option<char> {
    match c {
        '−' | '–' | '⁻' => Some('-'),
        '⁺' => Some('+'),
        '×' | '·' | '⋅' | '∙' => Some('*'),
        '÷' | '∕' => Some('/'),
        '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}' => None,
        c if c.is_whitespace() => None,
        c => Some(c),
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = input.chars().filter_map(normalize).collect();
    let mut tokens = vec![];

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Times,
            '/' => Token::Divide,
            '=' => Token::Equals,
            '(' => Token::OpenParenthesis,
            ')' => Token::CloseParenthesis,
            c if c.is_ascii_digit() || c == '.' => {
                let mut n = SmartString::new();
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    n.push(chars[i]);
                    i += 1;
                }
                tokens.push(Token::Number(n));
                continue;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut id = SmartString::new();
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    id.push(chars[i]);
                    i += 1;
                }
                tokens.push(Token::ID(id));
                continue;
            }
            c => return error(format!("unexpected character '{}'", c)),
        };

        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

/// A linear form `Σ coefficients[i] · x_i + constant`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Linear {
    coefficients: Vec<Rational>,
    constant: Rational,
}

impl Linear {
    fn constant(n: usize, c: Rational) -> Linear {
        Linear {
            coefficients: vec![Rational::zero(); n],
            constant: c,
        }
    }

    fn is_constant(&self) -> bool {
        self.coefficients.iter().all(|c| c.is_zero())
    }

    fn scale(mut self, s: &Rational) -> Linear {
        for c in &mut self.coefficients {
            *c *= s;
        }
        self.constant *= s;
        self
    }

    fn add(mut self, other: &Linear, subtract: bool) -> Linear {
        for (a, b) in self.coefficients.iter_mut().zip(&other.coefficients) {
            if subtract {
                *a -= b;
            } else {
                *a += b;
            }
        }
        if subtract {
            self.constant -= &other.constant;
        } else {
            self.constant += &other.constant;
        }
        self
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    variables: &'a AHashMap<&'a str, usize>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn expression(&mut self) -> Result<Linear, ParseError> {
        let mut lhs = self.term()?;
        while let Some(t @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = lhs.add(&rhs, *t == Token::Minus);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Linear, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Times) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    lhs = self.multiply(lhs, rhs)?;
                }
                Some(Token::Divide) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if !rhs.is_constant() {
                        return error("division by an expression with variables is not linear");
                    }
                    let inv = rhs
                        .constant
                        .checked_inv()
                        .or_else(|_| error("division by zero"))?;
                    lhs = lhs.scale(&inv);
                }
                Some(Token::Number(_) | Token::ID(_) | Token::OpenParenthesis) => {
                    let rhs = self.unary()?;
                    lhs = self.multiply(lhs, rhs)?;
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn multiply(&self, lhs: Linear, rhs: Linear) -> Result<Linear, ParseError> {
        if lhs.is_constant() {
            Ok(rhs.scale(&lhs.constant))
        } else if rhs.is_constant() {
            Ok(lhs.scale(&rhs.constant))
        } else {
            error("a product of variables is not linear")
        }
    }

    fn unary(&mut self) -> Result<Linear, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(self.unary()?.scale(&(-1).into()))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Linear, ParseError> {
        let n = self.variables.len();
        match self.next() {
            Some(Token::Number(s)) => {
                let r: Rational = s
                    .parse()
                    .or_else(|_| error(format!("'{}' is not a number", s)))?;
                Ok(Linear::constant(n, r))
            }
            Some(Token::ID(v)) => match self.variables.get(v.as_str()) {
                Some(&i) => {
                    let mut l = Linear::constant(n, Rational::zero());
                    l.coefficients[i] = Rational::one();
                    Ok(l)
                }
                None => error(format!("unknown variable '{}'", v)),
            },
            Some(Token::OpenParenthesis) => {
                let e = self.expression()?;
                match self.next() {
                    Some(Token::CloseParenthesis) => Ok(e),
                    _ => error("unbalanced parentheses"),
                }
            }
            Some(t) => error(format!("unexpected '{}'", t)),
            None => error("unexpected end of expression"),
        }
    }
}

fn parse_side(
    tokens: &[Token],
    variables: &AHashMap<&str, usize>,
) -> Result<Linear, ParseError> {
    if tokens.is_empty() {
        return error("one side of the equation is empty");
    }

    let mut p = Parser {
        tokens,
        pos: 0,
        variables,
    };
    let l = p.expression()?;
    match p.peek() {
        None => Ok(l),
        Some(t) => error(format!("unexpected '{}'", t)),
    }
}

fn variable_map<S: AsRef<str>>(variables: &[S]) -> Result<AHashMap<&str, usize>, ParseError> {
    let mut map = AHashMap::default();
    for (i, v) in variables.iter().enumerate() {
        if map.insert(v.as_ref(), i).is_some() {
            return error(format!("variable '{}' is listed twice", v.as_ref()));
        }
    }
    Ok(map)
}

fn parse_with_map(
    equation: &str,
    variables: &AHashMap<&str, usize>,
) -> Result<Vec<Rational>, ParseError> {
    let tokens = tokenize(equation)?;

    let mut sides = tokens.split(|t| *t == Token::Equals);
    let (lhs, rhs) = match (sides.next(), sides.next(), sides.next()) {
        (Some(l), Some(r), None) => (l, r),
        _ => return error("an equation needs exactly one '='"),
    };

    let lhs = parse_side(lhs, variables)?;
    let rhs = parse_side(rhs, variables)?;

    // move every variable to the left and every constant to the right
    let constant = &rhs.constant - &lhs.constant;
    let mut row = lhs.add(&rhs, true).coefficients;
    row.push(constant);
    Ok(row)
}

/// Parse a single equation into the coefficients of `variables` followed by
/// the right-hand side constant.
pub fn parse_equation<S: AsRef<str>>(
    equation: &str,
    variables: &[S],
) -> Result<Vec<Rational>, ParseError> {
    parse_with_map(equation, &variable_map(variables)?)
}

/// Parse a system of equations into the augmented matrix `[A | b]`.
pub fn parse_system<E: AsRef<str>, S: AsRef<str>>(
    equations: &[E],
    variables: &[S],
) -> Result<Matrix, ParseError> {
    if variables.is_empty() {
        return error("a system needs at least one variable");
    }

    let map = variable_map(variables)?;
    let mut rows = Vec::with_capacity(equations.len());
    for (i, e) in equations.iter().enumerate() {
        let row = parse_with_map(e.as_ref(), &map).map_err(|mut err| {
            err.equation = Some(i);
            err
        })?;
        rows.push(row);
    }

    Ok(Matrix::from_nested_vec(rows)?)
}
