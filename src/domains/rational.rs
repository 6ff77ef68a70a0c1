use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    iter::{Product, Sum},
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rug::{ops::Pow, Integer as ArbitraryPrecisionInteger, Rational as ArbitraryPrecisionRational};

use crate::utils;

/// Errors that can occur when constructing or dividing rational numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RationalError {
    DivisionByZero,
    InvalidLiteral(String),
    NotFinite,
}

impl Display for RationalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RationalError::DivisionByZero => write!(f, "Division by zero"),
            RationalError::InvalidLiteral(s) => {
                write!(f, "'{}' is not an integer, decimal or fraction", s)
            }
            RationalError::NotFinite => write!(f, "Floating point value is not finite"),
        }
    }
}

impl std::error::Error for RationalError {}

/// An exact rational number in lowest terms with a positive denominator.
///
/// Values whose numerator and denominator fit in an `i64` are stored inline,
/// all others are stored as an arbitrary-precision `rug` rational. The
/// representation is canonical: a value is `Large` only if it does not fit
/// in `Natural`, so structural equality is value equality.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Rational {
    Natural(i64, i64),
    Large(ArbitraryPrecisionRational),
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl Rational {
    /// Create `num/den`, reduced to lowest terms.
    pub fn new(num: i64, den: i64) -> Result<Rational, RationalError> {
        if den == 0 {
            return Err(RationalError::DivisionByZero);
        }

        Ok(Rational::from_i128(num as i128, den as i128))
    }

    pub fn zero() -> Rational {
        Rational::Natural(0, 1)
    }

    pub fn one() -> Rational {
        Rational::Natural(1, 1)
    }

    /// Normalize `num/den`. The denominator must be non-zero and both values
    /// must be at most `2^127` in absolute value.
    fn from_i128(num: i128, den: i128) -> Rational {
        debug_assert!(den != 0);

        let g = utils::gcd_signed_i128(num, den) as i128;
        let (mut num, mut den) = (num / g, den / g);
        if den < 0 {
            num = -num;
            den = -den;
        }

        match (i64::try_from(num), i64::try_from(den)) {
            (Ok(n), Ok(d)) => Rational::Natural(n, d),
            _ => Rational::Large(ArbitraryPrecisionRational::from((num, den))),
        }
    }

    /// Convert a multi-precision rational, demoting it to the inline
    /// representation when it fits.
    fn from_large(r: ArbitraryPrecisionRational) -> Rational {
        match (r.numer().to_i64(), r.denom().to_i64()) {
            (Some(n), Some(d)) => Rational::Natural(n, d),
            _ => Rational::Large(r),
        }
    }

    pub fn to_multi_prec(&self) -> ArbitraryPrecisionRational {
        match self {
            Rational::Natural(n, d) => ArbitraryPrecisionRational::from((*n, *d)),
            Rational::Large(r) => r.clone(),
        }
    }

    pub fn numerator(&self) -> ArbitraryPrecisionInteger {
        match self {
            Rational::Natural(n, _) => ArbitraryPrecisionInteger::from(*n),
            Rational::Large(r) => r.numer().clone(),
        }
    }

    pub fn denominator(&self) -> ArbitraryPrecisionInteger {
        match self {
            Rational::Natural(_, d) => ArbitraryPrecisionInteger::from(*d),
            Rational::Large(r) => r.denom().clone(),
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Rational::Natural(0, _))
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Rational::Natural(1, 1))
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Rational::Natural(n, _) => *n < 0,
            Rational::Large(r) => r.cmp0() == Ordering::Less,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Rational::Natural(_, d) => *d == 1,
            Rational::Large(r) => *r.denom() == 1,
        }
    }

    pub fn abs(&self) -> Rational {
        if self.is_negative() {
            -self
        } else {
            self.clone()
        }
    }

    /// Compare the absolute values of `self` and `other`.
    pub fn abs_cmp(&self, other: &Rational) -> Ordering {
        match (self, other) {
            (Rational::Natural(n1, d1), Rational::Natural(n2, d2)) => {
                let a = (*n1 as i128).abs() * *d2 as i128;
                let b = (*n2 as i128).abs() * *d1 as i128;
                a.cmp(&b)
            }
            _ => self.abs().cmp(&other.abs()),
        }
    }

    /// Compute `1/self`, failing when `self` is zero.
    pub fn checked_inv(&self) -> Result<Rational, RationalError> {
        match self {
            Rational::Natural(0, _) => Err(RationalError::DivisionByZero),
            Rational::Natural(n, d) => Ok(Rational::from_i128(*d as i128, *n as i128)),
            Rational::Large(r) => Ok(Rational::from_large(r.clone().recip())),
        }
    }

    /// Compute `1/self`.
    ///
    /// Panics when `self` is zero, use [`Rational::checked_inv`] to get an error instead.
    pub fn inv(&self) -> Rational {
        match self.checked_inv() {
            Ok(r) => r,
            Err(e) => panic!("{}", e),
        }
    }

    /// Compute `self/other`, failing when `other` is zero.
    pub fn checked_div(&self, other: &Rational) -> Result<Rational, RationalError> {
        match (self, other) {
            (_, Rational::Natural(0, _)) => Err(RationalError::DivisionByZero),
            (Rational::Natural(n1, d1), Rational::Natural(n2, d2)) => Ok(Rational::from_i128(
                *n1 as i128 * *d2 as i128,
                *d1 as i128 * *n2 as i128,
            )),
            _ => Ok(Rational::from_large(ArbitraryPrecisionRational::from(
                &self.to_multi_prec() / &other.to_multi_prec(),
            ))),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Rational::Natural(n, d) => *n as f64 / *d as f64,
            Rational::Large(r) => r.to_f64(),
        }
    }

    fn from_integers(
        num: ArbitraryPrecisionInteger,
        den: ArbitraryPrecisionInteger,
    ) -> Result<Rational, RationalError> {
        if den == 0 {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Rational::from_large(ArbitraryPrecisionRational::from((
            num, den,
        ))))
    }
}

fn parse_digits(s: &str, literal: &str) -> Result<ArbitraryPrecisionInteger, RationalError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RationalError::InvalidLiteral(literal.to_owned()));
    }
    s.parse::<ArbitraryPrecisionInteger>()
        .map_err(|_| RationalError::InvalidLiteral(literal.to_owned()))
}

fn split_sign(s: &str) -> (bool, &str) {
    match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    }
}

fn parse_integer(s: &str, literal: &str) -> Result<ArbitraryPrecisionInteger, RationalError> {
    let (negative, digits) = split_sign(s);
    let n = parse_digits(digits, literal)?;
    Ok(if negative { -n } else { n })
}

/// Parse `[sign] digits [. digits] [(e|E) [sign] digits]` into a numerator
/// and a denominator.
fn parse_decimal(
    s: &str,
    literal: &str,
) -> Result<(ArbitraryPrecisionInteger, ArbitraryPrecisionInteger), RationalError> {
    let invalid = || RationalError::InvalidLiteral(literal.to_owned());

    let (negative, body) = split_sign(s);
    let (mantissa, exponent) = match body.find(|c: char| c == 'e' || c == 'E') {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };

    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int.is_empty() && frac.is_empty() {
        return Err(invalid());
    }

    let mut num = if int.is_empty() {
        ArbitraryPrecisionInteger::new()
    } else {
        parse_digits(int, literal)?
    };
    let mut den = ArbitraryPrecisionInteger::from(1);

    if !frac.is_empty() {
        let scale = ArbitraryPrecisionInteger::from(10).pow(frac.len() as u32);
        num = num * &scale + parse_digits(frac, literal)?;
        den = scale;
    }

    if let Some(e) = exponent {
        let (e_negative, e_digits) = split_sign(e);
        if e_digits.is_empty() || !e_digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let e: u32 = e_digits.parse().map_err(|_| invalid())?;

        let scale = ArbitraryPrecisionInteger::from(10).pow(e);
        if e_negative {
            den *= &scale;
        } else {
            num *= &scale;
        }
    }

    Ok((if negative { -num } else { num }, den))
}

impl FromStr for Rational {
    type Err = RationalError;

    /// Parse an integer (`-12`), a decimal (`0.25`, `2.5E2`) or a fraction
    /// (`-3/4`, `1/-2`). Blanks are allowed at either end and around the
    /// slash, but not inside a number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.trim();

        let (num, den) = if let Some((n, d)) = literal.split_once('/') {
            (
                parse_integer(n.trim(), literal)?,
                parse_integer(d.trim(), literal)?,
            )
        } else {
            parse_decimal(literal, literal)?
        };

        Rational::from_integers(num, den)
    }
}

impl TryFrom<f64> for Rational {
    type Error = RationalError;

    /// Convert a floating point number through its shortest decimal
    /// representation, so that `0.1` becomes `1/10`.
    fn try_from(f: f64) -> Result<Self, Self::Error> {
        if !f.is_finite() {
            return Err(RationalError::NotFinite);
        }

        format!("{}", f).parse()
    }
}

impl From<i64> for Rational {
    #[inline]
    fn from(value: i64) -> Self {
        Rational::Natural(value, 1)
    }
}

impl From<i32> for Rational {
    #[inline]
    fn from(value: i32) -> Self {
        Rational::Natural(value as i64, 1)
    }
}

impl From<(i64, i64)> for Rational {
    /// Create `num/den`. Panics when `den` is zero.
    #[inline]
    fn from((num, den): (i64, i64)) -> Self {
        assert!(den != 0, "Denominator of a rational number cannot be zero");
        Rational::from_i128(num as i128, den as i128)
    }
}

impl From<ArbitraryPrecisionInteger> for Rational {
    fn from(value: ArbitraryPrecisionInteger) -> Self {
        Rational::from_large(ArbitraryPrecisionRational::from(value))
    }
}

impl From<ArbitraryPrecisionRational> for Rational {
    fn from(value: ArbitraryPrecisionRational) -> Self {
        Rational::from_large(value)
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rational::Natural(n, 1) => write!(f, "{}", n),
            Rational::Natural(n, d) => write!(f, "{}/{}", n, d),
            Rational::Large(r) => r.fmt(f),
        }
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Rational::Natural(n1, d1), Rational::Natural(n2, d2)) => {
                (*n1 as i128 * *d2 as i128).cmp(&(*n2 as i128 * *d1 as i128))
            }
            _ => self.to_multi_prec().cmp(&other.to_multi_prec()),
        }
    }
}

impl<'a, 'b> Add<&'b Rational> for &'a Rational {
    type Output = Rational;

    fn add(self, other: &'b Rational) -> Rational {
        match (self, other) {
            (Rational::Natural(0, _), _) => other.clone(),
            (_, Rational::Natural(0, _)) => self.clone(),
            (Rational::Natural(n1, d1), Rational::Natural(n2, d2)) => Rational::from_i128(
                *n1 as i128 * *d2 as i128 + *n2 as i128 * *d1 as i128,
                *d1 as i128 * *d2 as i128,
            ),
            _ => Rational::from_large(ArbitraryPrecisionRational::from(
                &self.to_multi_prec() + &other.to_multi_prec(),
            )),
        }
    }
}

impl<'a, 'b> Sub<&'b Rational> for &'a Rational {
    type Output = Rational;

    fn sub(self, other: &'b Rational) -> Rational {
        match (self, other) {
            (_, Rational::Natural(0, _)) => self.clone(),
            (Rational::Natural(n1, d1), Rational::Natural(n2, d2)) => Rational::from_i128(
                *n1 as i128 * *d2 as i128 - *n2 as i128 * *d1 as i128,
                *d1 as i128 * *d2 as i128,
            ),
            _ => Rational::from_large(ArbitraryPrecisionRational::from(
                &self.to_multi_prec() - &other.to_multi_prec(),
            )),
        }
    }
}

impl<'a, 'b> Mul<&'b Rational> for &'a Rational {
    type Output = Rational;

    fn mul(self, other: &'b Rational) -> Rational {
        match (self, other) {
            (Rational::Natural(0, _), _) | (_, Rational::Natural(0, _)) => Rational::zero(),
            (Rational::Natural(n1, d1), Rational::Natural(n2, d2)) => Rational::from_i128(
                *n1 as i128 * *n2 as i128,
                *d1 as i128 * *d2 as i128,
            ),
            _ => Rational::from_large(ArbitraryPrecisionRational::from(
                &self.to_multi_prec() * &other.to_multi_prec(),
            )),
        }
    }
}

impl<'a, 'b> Div<&'b Rational> for &'a Rational {
    type Output = Rational;

    /// Divide two rationals. Panics on division by zero, like integer division.
    fn div(self, other: &'b Rational) -> Rational {
        match self.checked_div(other) {
            Ok(r) => r,
            Err(e) => panic!("{}", e),
        }
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        match self {
            Rational::Natural(n, d) => Rational::from_i128(-(*n as i128), *d as i128),
            Rational::Large(r) => Rational::from_large(ArbitraryPrecisionRational::from(-r)),
        }
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        -&self
    }
}

macro_rules! forward_owned_ops {
    ($($tr:ident, $f:ident, $tr_assign:ident, $f_assign:ident);*) => {
        $(
        impl $tr<Rational> for Rational {
            type Output = Rational;

            #[inline]
            fn $f(self, other: Rational) -> Rational {
                (&self).$f(&other)
            }
        }

        impl<'a> $tr<&'a Rational> for Rational {
            type Output = Rational;

            #[inline]
            fn $f(self, other: &'a Rational) -> Rational {
                (&self).$f(other)
            }
        }

        impl<'a> $tr_assign<&'a Rational> for Rational {
            #[inline]
            fn $f_assign(&mut self, other: &'a Rational) {
                *self = (&*self).$f(other);
            }
        }

        impl $tr_assign<Rational> for Rational {
            #[inline]
            fn $f_assign(&mut self, other: Rational) {
                *self = (&*self).$f(&other);
            }
        }
        )*
    };
}

forward_owned_ops!(
    Add, add, AddAssign, add_assign;
    Sub, sub, SubAssign, sub_assign;
    Mul, mul, MulAssign, mul_assign;
    Div, div, DivAssign, div_assign
);

impl Sum for Rational {
    fn sum<I: Iterator<Item = Rational>>(iter: I) -> Rational {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Rational> for Rational {
    fn sum<I: Iterator<Item = &'a Rational>>(iter: I) -> Rational {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}

impl Product for Rational {
    fn product<I: Iterator<Item = Rational>>(iter: I) -> Rational {
        iter.fold(Rational::one(), |acc, x| acc * x)
    }
}

impl<'a> Product<&'a Rational> for Rational {
    fn product<I: Iterator<Item = &'a Rational>>(iter: I) -> Rational {
        iter.fold(Rational::one(), |acc, x| acc * x)
    }
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;

    use super::{Rational, RationalError};

    #[test]
    fn normalization() {
        assert_eq!(Rational::new(6, -8).unwrap(), Rational::Natural(-3, 4));
        assert_eq!(Rational::new(0, -5).unwrap(), Rational::Natural(0, 1));
        assert_eq!(Rational::new(1, 0), Err(RationalError::DivisionByZero));
        assert_eq!(Rational::from((10, 5)), Rational::from(2));
    }

    #[test]
    fn parse() {
        assert_eq!("12".parse::<Rational>().unwrap(), 12.into());
        assert_eq!(" -3 / 4 ".parse::<Rational>().unwrap(), (-3, 4).into());
        assert_eq!("0.25".parse::<Rational>().unwrap(), (1, 4).into());
        assert_eq!("-1.5".parse::<Rational>().unwrap(), (-3, 2).into());
        assert_eq!("+.5".parse::<Rational>().unwrap(), (1, 2).into());
        assert_eq!("6/4".parse::<Rational>().unwrap(), (3, 2).into());
        assert_eq!(
            "1/0".parse::<Rational>(),
            Err(RationalError::DivisionByZero)
        );
        assert!(matches!(
            "abc".parse::<Rational>(),
            Err(RationalError::InvalidLiteral(_))
        ));
        assert_eq!("1/-2".parse::<Rational>().unwrap(), (-1, 2).into());
        assert_eq!("-3/-4".parse::<Rational>().unwrap(), (3, 4).into());
        assert_eq!("1e-3".parse::<Rational>().unwrap(), (1, 1000).into());
        assert_eq!("2.5E2".parse::<Rational>().unwrap(), 250.into());
        assert_eq!("-.5e+1".parse::<Rational>().unwrap(), (-5).into());
        assert!("1 2".parse::<Rational>().is_err());
        assert!("- 3".parse::<Rational>().is_err());
        assert!("1e".parse::<Rational>().is_err());
        assert!("1.5/2".parse::<Rational>().is_err());
        assert!("1.2.3".parse::<Rational>().is_err());
        assert!("".parse::<Rational>().is_err());
        assert!("-".parse::<Rational>().is_err());
    }

    #[test]
    fn from_float() {
        assert_eq!(Rational::try_from(0.1).unwrap(), (1, 10).into());
        assert_eq!(Rational::try_from(-2.0).unwrap(), (-2).into());
        assert_eq!(Rational::try_from(f64::NAN), Err(RationalError::NotFinite));
    }

    #[test]
    fn arithmetic() {
        let a: Rational = (1, 2).into();
        let b: Rational = (1, 3).into();

        assert_eq!(&a + &b, (5, 6).into());
        assert_eq!(&a - &b, (1, 6).into());
        assert_eq!(&a * &b, (1, 6).into());
        assert_eq!(&a / &b, (3, 2).into());
        assert_eq!(-a.clone(), (-1, 2).into());
        assert_eq!(a.inv(), 2.into());
        assert_eq!(
            a.checked_div(&Rational::zero()),
            Err(RationalError::DivisionByZero)
        );
    }

    #[test]
    fn display() {
        assert_eq!(Rational::from(5).to_string(), "5");
        assert_eq!(Rational::from((-7, 3)).to_string(), "-7/3");
        assert_eq!(Rational::zero().to_string(), "0");
    }

    #[test]
    fn overflow_promotes_and_demotes() {
        let big = Rational::from(i64::MAX);
        let sum = &big + &big;
        assert!(matches!(sum, Rational::Large(_)));
        assert_eq!(sum.to_string(), "18446744073709551614");

        let back = &sum - &big;
        assert_eq!(back, Rational::Natural(i64::MAX, 1));

        let min = Rational::from(i64::MIN);
        assert!(matches!(-&min, Rational::Large(_)));
        assert_eq!(-(-&min), min);
    }

    #[test]
    fn ordering() {
        let a: Rational = (-3, 4).into();
        let b: Rational = (2, 3).into();
        assert!(a < b);
        assert_eq!(a.abs_cmp(&b), Ordering::Greater);
        assert_eq!(Rational::from(-2).abs_cmp(&2.into()), Ordering::Equal);
    }

    #[test]
    fn large_literal() {
        let r: Rational = "123456789012345678901234567890/3".parse().unwrap();
        assert_eq!(r.to_string(), "41152263004115226300411522630");
        assert!(r.is_integer());
    }
}
