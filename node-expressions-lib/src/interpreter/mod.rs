pub mod number;
pub mod operator;
pub mod parser;
pub mod syntax;
pub mod token;

use crate::interpreter::number::{Number, NumericKind};
use crate::interpreter::parser::ParsedExpressions;
use crate::interpreter::token::Token;
use anyhow::{Context, Result};
use log::debug;
use string_builder::Builder;

/// Converts the given input string into equivalent expression trees,
/// one per `;`-separated expression.
///
/// # Arguments
///
/// * `expression`: The text-representation of the infix expressions.
/// * `kind`: The numeric kind literals are read as.
///
/// returns: The parsed expressions, sharing their variable bindings.
///
/// # Examples
///
/// ```
/// use node_expressions::interpreter::convert;
/// use node_expressions::interpreter::number::NumericKind;
/// # use anyhow::Result;
///
/// # fn main() -> Result<()> {
/// let parsed = convert("x = 2; x ^ 2", NumericKind::Integer)?;
/// assert_eq!(parsed.to_string(), "x = 2; x ^ 2");
/// # Ok::<(), anyhow::Error>(()) }
/// ```
pub fn convert(expression: &str, kind: NumericKind) -> Result<ParsedExpressions> {
    let parsed = parser::parse(expression, kind)
        .with_context(|| format!("Failed to parse '{}'", expression))?;
    debug!("Converted '{}' into {}", expression, parsed);
    Ok(parsed)
}

/// Parses and evaluates every `;`-separated expression, in order.
///
/// # Examples
///
/// ```
/// use node_expressions::interpreter::evaluate;
/// use node_expressions::interpreter::number::{Number, NumericKind};
/// # use anyhow::Result;
///
/// # fn main() -> Result<()> {
/// let values = evaluate("a = 3; -a * 2", NumericKind::Integer)?;
/// assert_eq!(values, vec![Number::Integer(3), Number::Integer(-6)]);
/// # Ok::<(), anyhow::Error>(()) }
/// ```
pub fn evaluate(expression: &str, kind: NumericKind) -> Result<Vec<Number>> {
    let parsed = convert(expression, kind)?;
    parsed
        .values()
        .with_context(|| format!("Failed to evaluate '{}'", parsed))
}

/// Pretty-prints the given vector of tokens with added whitespace.
///
/// # Arguments
///
/// * `tokens`: The tokens to print.
///
/// returns: A pretty-printed text-version of the given tokens.
///
/// # Examples
///
/// ```
/// use node_expressions::interpreter::tokens_to_string;
/// use node_expressions::interpreter::number::Number;
/// use node_expressions::interpreter::operator::OperatorRule;
/// use node_expressions::interpreter::token::Token;
/// # use anyhow::Result;
///
/// # fn main() -> Result<()> {
/// let tokens = vec![
///     Token::Identifier("x".to_string()),
///     Token::Operator(OperatorRule::Power),
///     Token::Number(Number::Integer(2)),
/// ];
/// let pretty_printed_tokens = tokens_to_string(tokens)?;
/// assert_eq!(pretty_printed_tokens, "x ^ 2");
/// # Ok::<(), anyhow::Error>(()) }
/// ```
pub fn tokens_to_string(tokens: Vec<Token>) -> Result<String> {
    let mut builder = Builder::new(tokens.len());

    for token in tokens {
        match token {
            Token::Operator(_) => {
                builder.append(" ");
                builder.append(token.to_string());
                builder.append(" ");
            }
            _ => builder.append(token.to_string()),
        }
    }

    builder.string().context("Failed to build token string")
}
