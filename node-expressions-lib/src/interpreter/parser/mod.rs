mod context;
mod infix_converter;

use crate::interpreter::number::{Number, NumericKind};
use crate::interpreter::operator::OperatorRule;
use crate::interpreter::parser::infix_converter::InfixConverter;
use crate::interpreter::syntax::expression_tree::{ExpressionId, Expressions};
use crate::interpreter::syntax::ExpressionError;
use itertools::Itertools;
use std::fmt;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("an operator was expected but none was found")]
    MissingOperator,
    #[error("an operator is missing its right operand")]
    MissingRightOperand,
    #[error("operator '{0}' is missing its left operand")]
    MissingLeftOperand(OperatorRule),
    #[error("unary '{0}' is preceded by an operand it cannot use")]
    TrailingLeftOperand(OperatorRule),
    #[error("'{0}' cannot be used as a unary operator")]
    UnsupportedUnaryOperator(OperatorRule),
    #[error("'{0}' is not a supported numeric kind")]
    UnsupportedNumericKind(String),
    #[error("more than one assignment in '{0}'")]
    MultipleAssignments(String),
    #[error("illegal assignment: {0}")]
    IllegalAssignment(AssignmentViolation),
    #[error("missing ')' in '{0}'")]
    UnterminatedSubContext(String),
    #[error("unknown token '{token}' in '{context}'")]
    UnknownToken { token: char, context: String },
    #[error("'{text}' is not a valid {kind} literal")]
    InvalidNumber { text: String, kind: NumericKind },
    #[error("parsing ended in an illegal state: {0}")]
    IllegalPostParseState(String),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentViolation {
    /// The assigned-to side is not a single variable.
    LeftNotVariable,
    /// The variable being assigned also appears in the assigned value.
    LeftInRight(String),
    /// The assignment is an operand of another operation.
    Nested,
}

impl Display for AssignmentViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentViolation::LeftNotVariable => {
                write!(f, "only a variable can be assigned to")
            }
            AssignmentViolation::LeftInRight(name) => {
                write!(f, "'{}' cannot be assigned a value that uses itself", name)
            }
            AssignmentViolation::Nested => {
                write!(f, "an assignment cannot be part of another expression")
            }
        }
    }
}

/// Expression trees parsed from one input, sharing a single arena and its variable bindings.
#[derive(Debug)]
pub struct ParsedExpressions {
    expressions: Expressions,
    roots: Vec<ExpressionId>,
}

impl ParsedExpressions {
    /// Root of every parsed expression, in input order.
    pub fn roots(&self) -> &[ExpressionId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn expressions(&self) -> &Expressions {
        &self.expressions
    }

    pub fn expressions_mut(&mut self) -> &mut Expressions {
        &mut self.expressions
    }

    /// Evaluates every root, in input order.
    pub fn values(&self) -> Result<Vec<Number>, ExpressionError> {
        self.roots
            .iter()
            .map(|root| self.expressions.value(*root))
            .collect()
    }
}

impl Display for ParsedExpressions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rendered = self
            .roots
            .iter()
            .map(|root| self.expressions.display(*root))
            .join("; ");
        f.write_str(&rendered)
    }
}

/// Parses `;`-separated infix expressions into expression trees.
///
/// Literals are read as numbers of the given kind, and a leading `+` or `-` is read as
/// an operation on zero.
///
/// # Examples
///
/// ```
/// # use anyhow::Result;
/// # fn main() -> Result<()> {
/// use node_expressions::interpreter::number::{Number, NumericKind};
/// use node_expressions::interpreter::parser::parse;
///
/// let parsed = parse("a = 3; b = 4; (a + b) * 2", NumericKind::Integer)?;
/// assert_eq!(parsed.values()?[2], Number::Integer(14));
/// # Ok::<(), anyhow::Error>(()) }
/// ```
pub fn parse(text: &str, kind: NumericKind) -> Result<ParsedExpressions, ParseError> {
    let mut converter = InfixConverter::new(kind);
    let roots = converter.convert_all(text)?;
    Ok(ParsedExpressions {
        expressions: converter.into_expressions(),
        roots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parameterized_macro::parameterized;
    use pretty_assertions::assert_eq;

    #[test]
    fn precedence_shapes_the_tree() {
        let parsed = parse("2 + 3 * 4", NumericKind::Integer).unwrap();
        let expressions = parsed.expressions();
        let root = parsed.roots()[0];

        assert_eq!(expressions.get(root).rule(), Some(OperatorRule::Addition));
        let right = expressions.right(root).unwrap();
        assert_eq!(
            expressions.get(right).rule(),
            Some(OperatorRule::Multiplication)
        );
        assert_eq!(parsed.values().unwrap(), vec![Number::Integer(14)]);
    }

    #[test]
    fn assignments_are_visible_to_later_expressions() {
        let mut parsed = parse("a = 3; b = 4; (a + b) * 2", NumericKind::Integer).unwrap();

        assert_eq!(parsed.len(), 3);
        assert_eq!(
            parsed.values().unwrap(),
            vec![
                Number::Integer(3),
                Number::Integer(4),
                Number::Integer(14)
            ]
        );

        parsed.expressions_mut().bind("a", Number::Integer(6));
        assert_eq!(parsed.values().unwrap()[2], Number::Integer(20));
    }

    #[test]
    fn rebinding_does_not_rerun_earlier_assignments() {
        let parsed = parse("x = 1; y = x + 1; x = 10; y", NumericKind::Integer).unwrap();

        assert_eq!(
            parsed.values().unwrap(),
            vec![
                Number::Integer(10),
                Number::Integer(2),
                Number::Integer(10),
                Number::Integer(2)
            ]
        );
        assert_eq!(
            parsed.expressions().binding("y"),
            Some(Number::Integer(2))
        );
    }

    #[test]
    fn long_sums_parse_and_evaluate() {
        let text = vec!["1"; 20_000].join(" + ");

        let parsed = parse(&text, NumericKind::Integer).unwrap();

        assert_eq!(parsed.values().unwrap(), vec![Number::Integer(20_000)]);
    }

    #[test]
    fn unbound_variable_is_not_ready() {
        let parsed = parse("a + 1", NumericKind::Integer).unwrap();

        assert!(matches!(
            parsed.values(),
            Err(ExpressionError::EvaluationNotReady(_))
        ));
    }

    #[test]
    fn display_joins_expressions() {
        let parsed = parse("a=1;((b))+a*(2-1);", NumericKind::Integer).unwrap();

        assert_eq!(parsed.to_string(), "a = 1; b + a * (2 - 1)");
    }

    #[parameterized(
    text = {
    "2 + 3 * 4",
    "-5 + 2",
    "+5",
    "10 / 3",
    "2 ^ 3 ^ 2",
    "7 - (2 - 1)",
    "-(2 * 3)",
    },
    expected = {
    14,
    -3,
    5,
    3,
    64,
    6,
    -6,
    }
    )]
    fn integer_expressions_evaluate(text: &str, expected: i64) {
        let parsed = parse(text, NumericKind::Integer).unwrap();

        pretty_assertions::assert_eq!(parsed.values().unwrap(), vec![Number::Integer(expected)]);
    }

    #[test]
    fn double_kind_reads_decimal_literals() {
        let parsed = parse("1.5 * 2", NumericKind::Double).unwrap();

        assert_eq!(parsed.values().unwrap(), vec![Number::Double(3.0)]);
    }

    #[test]
    fn integer_division_by_zero_fails_on_evaluation() {
        let parsed = parse("1 / 0", NumericKind::Integer).unwrap();

        assert_eq!(parsed.values(), Err(ExpressionError::DivisionByZero));
    }

    #[parameterized(
    text = {
    "a = b = c",
    "a =",
    "a $ b",
    "(a + 1",
    "a = a ^ 5",
    "2 = 3",
    "-a b",
    "* 2",
    "a b",
    "1.5",
    "(b = 2) + 1",
    ")",
    "a + / b",
    },
    expected = {
    ParseError::MultipleAssignments("a = b = c".to_string()),
    ParseError::MissingRightOperand,
    ParseError::UnknownToken { token: '$', context: "a $ b".to_string() },
    ParseError::UnterminatedSubContext("(a + 1".to_string()),
    ParseError::IllegalAssignment(AssignmentViolation::LeftInRight("a".to_string())),
    ParseError::IllegalAssignment(AssignmentViolation::LeftNotVariable),
    ParseError::TrailingLeftOperand(OperatorRule::Subtraction),
    ParseError::UnsupportedUnaryOperator(OperatorRule::Multiplication),
    ParseError::IllegalPostParseState("2 operands remain in 'a b'".to_string()),
    ParseError::UnknownToken { token: '.', context: "1.5".to_string() },
    ParseError::IllegalAssignment(AssignmentViolation::Nested),
    ParseError::UnknownToken { token: ')', context: ")".to_string() },
    ParseError::MissingLeftOperand(OperatorRule::Division),
    }
    )]
    fn malformed_input_is_rejected(text: &str, expected: ParseError) {
        pretty_assertions::assert_eq!(parse(text, NumericKind::Integer).unwrap_err(), expected);
    }

    #[test]
    fn errors_render_readable_messages() {
        let error = parse("a = a", NumericKind::Integer).unwrap_err();

        assert_eq!(
            error.to_string(),
            "illegal assignment: 'a' cannot be assigned a value that uses itself"
        );
    }
}
