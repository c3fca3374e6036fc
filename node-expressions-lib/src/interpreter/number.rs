use crate::interpreter::parser::ParseError;
use std::fmt;
use std::fmt::Formatter;
use std::str::FromStr;

/// The numeric domain a parser works in. Ordered from narrowest to widest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum NumericKind {
    #[default]
    Integer,
    Float,
    Double,
}

impl NumericKind {
    /// Whether literals of this kind may contain a decimal point.
    pub fn is_fractional(&self) -> bool {
        !matches!(self, NumericKind::Integer)
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NumericKind::Integer => write!(f, "integer"),
            NumericKind::Float => write!(f, "float"),
            NumericKind::Double => write!(f, "double"),
        }
    }
}

impl FromStr for NumericKind {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(NumericKind::Integer),
            "float" | "single" => Ok(NumericKind::Float),
            "double" => Ok(NumericKind::Double),
            _ => Err(ParseError::UnsupportedNumericKind(input.to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f32),
    Double(f64),
}

impl Number {
    pub fn kind(&self) -> NumericKind {
        match self {
            Number::Integer(_) => NumericKind::Integer,
            Number::Float(_) => NumericKind::Float,
            Number::Double(_) => NumericKind::Double,
        }
    }

    pub fn zero(kind: NumericKind) -> Number {
        match kind {
            NumericKind::Integer => Number::Integer(0),
            NumericKind::Float => Number::Float(0.0),
            NumericKind::Double => Number::Double(0.0),
        }
    }

    /// Parses a literal as the given kind, `None` if the text is not a valid literal.
    pub fn parse(text: &str, kind: NumericKind) -> Option<Number> {
        match kind {
            NumericKind::Integer => text.parse().ok().map(Number::Integer),
            NumericKind::Float => text.parse().ok().map(Number::Float),
            NumericKind::Double => text.parse().ok().map(Number::Double),
        }
    }

    /// Converts into a kind at least as wide as the current one.
    pub fn promote(self, kind: NumericKind) -> Number {
        match (self, kind.max(self.kind())) {
            (Number::Integer(value), NumericKind::Float) => Number::Float(value as f32),
            (Number::Integer(value), NumericKind::Double) => Number::Double(value as f64),
            (Number::Float(value), NumericKind::Double) => Number::Double(value as f64),
            (number, _) => number,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Integer(value) => value as f64,
            Number::Float(value) => value as f64,
            Number::Double(value) => value,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(value) => write!(f, "{}", value),
            Number::Float(value) => write!(f, "{}", value),
            Number::Double(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Double(value)
    }
}
