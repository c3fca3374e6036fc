use crate::interpreter::number::Number;
use crate::interpreter::operator::OperatorRule;
use std::fmt;
use std::fmt::Formatter;

/// A discrete part of a rendered expression
#[derive(Clone, PartialEq)]
pub enum Token {
    Number(Number),
    Identifier(String),
    Operator(OperatorRule),
    OpenParenthesis,
    CloseParenthesis,
    /// Stands in for an operand that has not been attached yet.
    Missing,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{}", value),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Operator(rule) => write!(f, "{}", rule),
            Token::OpenParenthesis => write!(f, "("),
            Token::CloseParenthesis => write!(f, ")"),
            Token::Missing => write!(f, "?"),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
