use crate::interpreter::number::Number;
use crate::interpreter::syntax::ExpressionError;
use crate::interpreter::token::Token;
use std::fmt;
use std::fmt::Formatter;

/// A binary operator together with its parsing metadata.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OperatorRule {
    Assignment,
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Power,
}

impl OperatorRule {
    pub fn from_symbol(symbol: char) -> Option<OperatorRule> {
        match symbol {
            '=' => Some(OperatorRule::Assignment),
            '+' => Some(OperatorRule::Addition),
            '-' => Some(OperatorRule::Subtraction),
            '*' => Some(OperatorRule::Multiplication),
            '/' => Some(OperatorRule::Division),
            '^' => Some(OperatorRule::Power),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            OperatorRule::Assignment => '=',
            OperatorRule::Addition => '+',
            OperatorRule::Subtraction => '-',
            OperatorRule::Multiplication => '*',
            OperatorRule::Division => '/',
            OperatorRule::Power => '^',
        }
    }

    pub fn token(&self) -> Token {
        Token::Operator(*self)
    }

    pub(crate) fn precedence(&self) -> u8 {
        match self {
            OperatorRule::Assignment => 0,
            OperatorRule::Addition | OperatorRule::Subtraction => 1,
            OperatorRule::Multiplication | OperatorRule::Division => 2,
            OperatorRule::Power => 3,
        }
    }

    /// Whether a leading use like `-x` is read as `0 - x`.
    pub fn allows_unary(&self) -> bool {
        matches!(self, OperatorRule::Addition | OperatorRule::Subtraction)
    }

    pub(crate) fn precedence_eq(&self, other: &Self) -> bool {
        self.precedence().eq(&other.precedence())
    }

    pub(crate) fn precedence_ge(&self, other: &Self) -> bool {
        self.precedence().ge(&other.precedence())
    }

    pub(crate) fn precedence_lt(&self, other: &Self) -> bool {
        self.precedence().lt(&other.precedence())
    }

    /// Applies the operator, promoting both operands to the wider of their kinds.
    ///
    /// An assignment evaluates to its right operand.
    pub fn evaluate(&self, a: Number, b: Number) -> Result<Number, ExpressionError> {
        if *self == OperatorRule::Assignment {
            return Ok(b);
        }
        let kind = a.kind().max(b.kind());
        let result = match (a.promote(kind), b.promote(kind)) {
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(self.evaluate_integer(a, b)?),
            (Number::Float(a), Number::Float(b)) => Number::Float(match self {
                OperatorRule::Addition => a + b,
                OperatorRule::Subtraction => a - b,
                OperatorRule::Multiplication => a * b,
                OperatorRule::Division => a / b,
                OperatorRule::Power => a.powf(b),
                OperatorRule::Assignment => b,
            }),
            (a, b) => Number::Double(match self {
                OperatorRule::Addition => a.as_f64() + b.as_f64(),
                OperatorRule::Subtraction => a.as_f64() - b.as_f64(),
                OperatorRule::Multiplication => a.as_f64() * b.as_f64(),
                OperatorRule::Division => a.as_f64() / b.as_f64(),
                OperatorRule::Power => a.as_f64().powf(b.as_f64()),
                OperatorRule::Assignment => b.as_f64(),
            }),
        };
        debug_assert_eq!(result.kind(), kind);
        Ok(result)
    }

    fn evaluate_integer(&self, a: i64, b: i64) -> Result<i64, ExpressionError> {
        Ok(match self {
            OperatorRule::Addition => a.wrapping_add(b),
            OperatorRule::Subtraction => a.wrapping_sub(b),
            OperatorRule::Multiplication => a.wrapping_mul(b),
            OperatorRule::Division => {
                if b == 0 {
                    return Err(ExpressionError::DivisionByZero);
                }
                a.wrapping_div(b)
            }
            OperatorRule::Power => match u32::try_from(b) {
                Ok(exponent) => a.wrapping_pow(exponent),
                // Negative (or huge) exponents go through floating point and truncate.
                Err(_) => (a as f64).powf(b as f64) as i64,
            },
            OperatorRule::Assignment => b,
        })
    }
}

impl fmt::Display for OperatorRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
