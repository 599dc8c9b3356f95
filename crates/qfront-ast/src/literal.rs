//! Exact numeric literals.
//!
//! Literal text is turned into arbitrary-precision values straight from its
//! digits. Nothing in this module goes through `f64`; consumers that need a
//! machine float convert explicitly, outside of the front-end.

use std::fmt;

use num_bigint::{BigInt, BigUint, Sign};
use num_complex::Complex;
use num_rational::BigRational;
use num_traits::Zero;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Largest `|exponent|` accepted in literal text.
pub const MAX_EXPONENT: i64 = i32::MAX as i64;

/// Largest `|exponent|` for which [`Decimal::to_rational`] expands the power
/// of ten.
pub const MAX_RATIONAL_EXPONENT: i64 = 100_000;

/// Errors produced while interpreting literal text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LiteralError {
    #[error("empty numeric literal")]
    Empty,

    #[error("invalid digit '{digit}' in {radix} literal")]
    InvalidDigit { digit: char, radix: &'static str },

    #[error("misplaced '_' separator in `{0}`")]
    MisplacedSeparator(String),

    #[error("exponent in `{0}` is out of range")]
    ExponentOutOfRange(String),

    #[error("expected an integer literal, found `{0}`")]
    NotAnInteger(String),

    #[error("unknown unit `{unit}`; expected one of dt, ns, us, µs, ms, s")]
    UnknownUnit { unit: String },

    #[error("duration literal `{0}` is missing a time unit")]
    MissingUnit(String),

    #[error("unexpected suffix `{suffix}` on {kind} literal")]
    UnexpectedSuffix { suffix: String, kind: LiteralKind },
}

/// Subtype requested from [`parse_literal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralKind {
    Integer,
    Float,
    Imaginary,
    Angle,
    Duration,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralKind::Integer => write!(f, "integer"),
            LiteralKind::Float => write!(f, "float"),
            LiteralKind::Imaginary => write!(f, "imaginary"),
            LiteralKind::Angle => write!(f, "angle"),
            LiteralKind::Duration => write!(f, "duration"),
        }
    }
}

/// Time units allowed on duration literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Backend-dependent sample time.
    Dt,
    Ns,
    Us,
    Ms,
    S,
}

impl TimeUnit {
    /// Parse a unit suffix. Both the micro sign (U+00B5) and Greek mu
    /// (U+03BC) spell microseconds.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "dt" => Some(TimeUnit::Dt),
            "ns" => Some(TimeUnit::Ns),
            "us" | "\u{b5}s" | "\u{3bc}s" => Some(TimeUnit::Us),
            "ms" => Some(TimeUnit::Ms),
            "s" => Some(TimeUnit::S),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Dt => "dt",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exact decimal number `mantissa × 10^exponent`.
///
/// Always normalised: the mantissa carries no trailing decimal zeros and zero
/// is stored as `0 × 10^0`, so structural equality is numeric equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: BigInt,
    exponent: i64,
}

impl Decimal {
    pub fn new(mantissa: BigInt, exponent: i64) -> Self {
        let mut decimal = Self { mantissa, exponent };
        decimal.normalize();
        decimal
    }

    pub fn zero() -> Self {
        Self {
            mantissa: BigInt::zero(),
            exponent: 0,
        }
    }

    pub fn from_integer(value: BigUint) -> Self {
        Self::new(BigInt::from_biguint(Sign::Plus, value), 0)
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    /// Whether the value has no fractional part.
    pub fn is_integral(&self) -> bool {
        self.exponent >= 0
    }

    /// Exact rational value, if the exponent is small enough to expand.
    pub fn to_rational(&self) -> Option<BigRational> {
        if self.exponent.abs() > MAX_RATIONAL_EXPONENT {
            return None;
        }
        let power = num_traits::pow(BigInt::from(10u8), usize::try_from(self.exponent.abs()).ok()?);
        Some(if self.exponent >= 0 {
            BigRational::from_integer(&self.mantissa * power)
        } else {
            BigRational::new(self.mantissa.clone(), power)
        })
    }

    fn normalize(&mut self) {
        if self.mantissa.is_zero() {
            self.exponent = 0;
            return;
        }
        let ten = BigInt::from(10u8);
        while (&self.mantissa % &ten).is_zero() {
            self.mantissa /= &ten;
            self.exponent += 1;
        }
    }
}

impl fmt::Display for Decimal {
    /// Exact rendering: positional for moderate exponents, `MeE` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negative = self.mantissa.sign() == Sign::Minus;
        let digits = self.mantissa.magnitude().to_string();
        let sign = if negative { "-" } else { "" };

        match self.exponent {
            0 => write!(f, "{sign}{digits}"),
            e @ 1..=6 => write!(f, "{sign}{digits}{}", "0".repeat(usize::try_from(e).unwrap_or(0))),
            e @ -30..=-1 => {
                let frac = usize::try_from(-e).unwrap_or(0);
                if digits.len() > frac {
                    let (int, rest) = digits.split_at(digits.len() - frac);
                    write!(f, "{sign}{int}.{rest}")
                } else {
                    write!(f, "{sign}0.{}{digits}", "0".repeat(frac - digits.len()))
                }
            }
            e => write!(f, "{sign}{digits}e{e}"),
        }
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The value held by a [`NumericLiteral`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Integer(BigUint),
    Float(Decimal),
    /// Purely imaginary value; the real part is zero.
    Imaginary(Complex<Decimal>),
    Angle(Decimal),
    Duration { value: Decimal, unit: TimeUnit },
}

/// A parsed numeric literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumericLiteral {
    pub value: LiteralValue,
}

impl NumericLiteral {
    pub fn kind(&self) -> LiteralKind {
        match self.value {
            LiteralValue::Integer(_) => LiteralKind::Integer,
            LiteralValue::Float(_) => LiteralKind::Float,
            LiteralValue::Imaginary(_) => LiteralKind::Imaginary,
            LiteralValue::Angle(_) => LiteralKind::Angle,
            LiteralValue::Duration { .. } => LiteralKind::Duration,
        }
    }

    pub fn unit(&self) -> Option<TimeUnit> {
        match self.value {
            LiteralValue::Duration { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// The value as an exact decimal (the imaginary part for imaginary
    /// literals).
    pub fn decimal(&self) -> Decimal {
        match &self.value {
            LiteralValue::Integer(v) => Decimal::from_integer(v.clone()),
            LiteralValue::Float(d) | LiteralValue::Angle(d) => d.clone(),
            LiteralValue::Imaginary(c) => c.im.clone(),
            LiteralValue::Duration { value, .. } => value.clone(),
        }
    }

    pub fn as_integer(&self) -> Option<&BigUint> {
        match &self.value {
            LiteralValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// Re-tag an unsuffixed integer or float literal as an angle.
    #[must_use]
    pub fn into_angle(self) -> Self {
        match self.value {
            LiteralValue::Integer(v) => Self {
                value: LiteralValue::Angle(Decimal::from_integer(v)),
            },
            LiteralValue::Float(d) => Self {
                value: LiteralValue::Angle(d),
            },
            other => Self { value: other },
        }
    }
}

impl fmt::Display for NumericLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            LiteralValue::Integer(v) => write!(f, "{v}"),
            LiteralValue::Float(d) | LiteralValue::Angle(d) => write!(f, "{d}"),
            LiteralValue::Imaginary(c) => write!(f, "{}im", c.im),
            LiteralValue::Duration { value, unit } => write!(f, "{value}{unit}"),
        }
    }
}

impl Serialize for NumericLiteral {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("NumericLiteral", 3)?;
        s.serialize_field("kind", &self.kind())?;
        s.serialize_field("value", &self.decimal())?;
        s.serialize_field("unit", &self.unit())?;
        s.end()
    }
}

/// Parse literal text as the requested subtype.
///
/// `text` is the exact token text, including any unit or `im` suffix.
pub fn parse_literal(text: &str, kind: LiteralKind) -> Result<NumericLiteral, LiteralError> {
    if text.is_empty() {
        return Err(LiteralError::Empty);
    }

    let value = match kind {
        LiteralKind::Integer => LiteralValue::Integer(parse_integer(text)?),
        LiteralKind::Float => LiteralValue::Float(unsuffixed(text, kind)?),
        LiteralKind::Angle => LiteralValue::Angle(unsuffixed(text, kind)?),
        LiteralKind::Imaginary => {
            let (value, suffix) = decimal_and_suffix(text)?;
            if suffix != "im" {
                return Err(LiteralError::UnexpectedSuffix {
                    suffix: suffix.to_string(),
                    kind,
                });
            }
            LiteralValue::Imaginary(Complex::new(Decimal::zero(), value))
        }
        LiteralKind::Duration => {
            let (value, suffix) = decimal_and_suffix(text)?;
            if suffix.is_empty() {
                return Err(LiteralError::MissingUnit(text.to_string()));
            }
            let unit = TimeUnit::from_suffix(suffix).ok_or_else(|| LiteralError::UnknownUnit {
                unit: suffix.to_string(),
            })?;
            LiteralValue::Duration { value, unit }
        }
    };
    Ok(NumericLiteral { value })
}

fn decimal_and_suffix(text: &str) -> Result<(Decimal, &str), LiteralError> {
    let (number, suffix) = split_number(text);
    if number.is_empty() {
        return Err(LiteralError::Empty);
    }
    Ok((parse_decimal(number)?, suffix.trim_start()))
}

fn unsuffixed(text: &str, kind: LiteralKind) -> Result<Decimal, LiteralError> {
    let (value, suffix) = decimal_and_suffix(text)?;
    if suffix.is_empty() {
        Ok(value)
    } else {
        Err(LiteralError::UnexpectedSuffix {
            suffix: suffix.to_string(),
            kind,
        })
    }
}

/// Classify number-with-suffix text: `im` makes it imaginary, anything else
/// is read as a duration (and rejected later if the unit is unknown).
pub fn suffix_kind(text: &str) -> LiteralKind {
    let (_, suffix) = split_number(text);
    if suffix.trim_start() == "im" {
        LiteralKind::Imaginary
    } else {
        LiteralKind::Duration
    }
}

fn parse_integer(text: &str) -> Result<BigUint, LiteralError> {
    let (radix, name, body) = match text.get(..2) {
        Some("0x" | "0X") => (16, "hexadecimal", &text[2..]),
        Some("0o" | "0O") => (8, "octal", &text[2..]),
        Some("0b" | "0B") => (2, "binary", &text[2..]),
        _ => (10, "decimal", text),
    };

    if radix == 10 && text.contains(['.', 'e', 'E']) {
        return Err(LiteralError::NotAnInteger(text.to_string()));
    }
    let digits = strip_separators(body, text)?;
    if digits.is_empty() {
        return Err(LiteralError::Empty);
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_digit(radix)) {
        return Err(LiteralError::InvalidDigit {
            digit: bad,
            radix: name,
        });
    }
    BigUint::parse_bytes(digits.as_bytes(), radix).ok_or(LiteralError::Empty)
}

/// Split decimal text into the numeric part and whatever follows it.
fn split_number(text: &str) -> (&str, &str) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    text.split_at(i)
}

fn parse_decimal(number: &str) -> Result<Decimal, LiteralError> {
    let (significand, exponent) = match number.find(['e', 'E']) {
        Some(pos) => (&number[..pos], Some(&number[pos + 1..])),
        None => (number, None),
    };
    let (int_part, frac_part) = match significand.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (significand, ""),
    };

    let int_digits = strip_separators(int_part, number)?;
    let frac_digits = strip_separators(frac_part, number)?;
    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(LiteralError::Empty);
    }

    let exponent: i64 = match exponent {
        Some(exp) => exp
            .parse::<i64>()
            .ok()
            .filter(|e| e.abs() <= MAX_EXPONENT)
            .ok_or_else(|| LiteralError::ExponentOutOfRange(number.to_string()))?,
        None => 0,
    };
    let frac_len =
        i64::try_from(frac_digits.len()).map_err(|_| LiteralError::ExponentOutOfRange(number.to_string()))?;

    let digits = format!("{int_digits}{frac_digits}");
    // Fold trailing zeros into the exponent before building the big integer.
    let significant = digits.trim_end_matches('0');
    if significant.is_empty() {
        return Ok(Decimal::zero());
    }
    let zeros = i64::try_from(digits.len() - significant.len()).unwrap_or(0);
    let mantissa = BigInt::parse_bytes(significant.as_bytes(), 10).ok_or(LiteralError::Empty)?;
    Ok(Decimal::new(mantissa, exponent - frac_len + zeros))
}

/// Remove `_` separators, which may only sit between two digits.
fn strip_separators(body: &str, whole: &str) -> Result<String, LiteralError> {
    if body.starts_with('_') || body.ends_with('_') || body.contains("__") {
        return Err(LiteralError::MisplacedSeparator(whole.to_string()));
    }
    Ok(body.chars().filter(|&c| c != '_').collect())
}
