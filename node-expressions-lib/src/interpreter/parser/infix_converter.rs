use crate::interpreter::number::{Number, NumericKind};
use crate::interpreter::operator::OperatorRule;
use crate::interpreter::parser::context::{Context, PendingOperator};
use crate::interpreter::parser::{AssignmentViolation, ParseError};
use crate::interpreter::syntax::expression_tree::{ExpressionId, Expressions};
use crate::interpreter::syntax::ExpressionError;
use log::{debug, trace};
use std::mem;

/// Turns infix text into expression trees with an operand stack and an operator stack.
///
/// Parenthesised parts are parsed in a fresh [`Context`] while the enclosing one
/// waits on the `saved` stack.
pub(super) struct InfixConverter {
    kind: NumericKind,
    expressions: Expressions,
    current: Context,
    saved: Vec<Context>,
}

impl InfixConverter {
    pub(super) fn new(kind: NumericKind) -> Self {
        InfixConverter {
            kind,
            expressions: Expressions::new(),
            current: Context::default(),
            saved: Vec::new(),
        }
    }

    pub(super) fn into_expressions(self) -> Expressions {
        self.expressions
    }

    /// Converts every `;`-separated expression in `text`, in order.
    ///
    /// On failure all in-flight contexts are dropped.
    pub(super) fn convert_all(&mut self, text: &str) -> Result<Vec<ExpressionId>, ParseError> {
        let result = self.convert_segments(text);
        if result.is_err() {
            self.saved.clear();
            self.current = Context::default();
        }
        result
    }

    fn convert_segments(&mut self, text: &str) -> Result<Vec<ExpressionId>, ParseError> {
        let mut segments: Vec<&str> = text.split(';').collect();
        while segments.len() > 1 && segments.last().map_or(false, |s| s.trim().is_empty()) {
            segments.pop();
        }

        let mut roots = Vec::with_capacity(segments.len());
        for segment in segments {
            self.current = Context::new(segment);
            roots.push(self.parse_current()?);
        }

        if !self.saved.is_empty() {
            return Err(ParseError::IllegalPostParseState(format!(
                "{} sub-contexts were never closed",
                self.saved.len()
            )));
        }
        debug!("Parsed {} expression(s) as {}", roots.len(), self.kind);
        Ok(roots)
    }

    fn parse_current(&mut self) -> Result<ExpressionId, ParseError> {
        let source: Vec<char> = self.current.text.chars().collect();
        let mut position = 0;

        while let Some(&character) = source.get(position) {
            position = match character {
                c if c.is_whitespace() => position + 1,
                c if c.is_ascii_digit() || (c == '.' && self.kind.is_fractional()) => {
                    self.push_constant(&source, position)?
                }
                c if c.is_alphabetic() || c == '_' => self.push_variable(&source, position),
                '(' => self.push_sub_context(&source, position)?,
                c => {
                    let rule = OperatorRule::from_symbol(c).ok_or_else(|| {
                        ParseError::UnknownToken {
                            token: c,
                            context: self.current.text.clone(),
                        }
                    })?;
                    self.push_operator(rule)?;
                    position + 1
                }
            };
        }

        while !self.current.operators.is_empty() {
            self.resolve()?;
        }
        let root = self.current.finish()?;
        debug!(
            "Context '{}' resolved to {}",
            self.current.text.trim(),
            self.expressions.display(root)
        );
        Ok(root)
    }

    fn push_constant(&mut self, source: &[char], start: usize) -> Result<usize, ParseError> {
        let fractional = self.kind.is_fractional();
        let end = scan_run(source, start, |c| c.is_ascii_digit() || (fractional && c == '.'));
        let text: String = source[start..end].iter().collect();
        let value = Number::parse(&text, self.kind).ok_or(ParseError::InvalidNumber {
            text,
            kind: self.kind,
        })?;
        let constant = self.expressions.constant(value);
        self.current.operands.push(constant);
        Ok(end)
    }

    fn push_variable(&mut self, source: &[char], start: usize) -> usize {
        let end = scan_run(source, start, |c| c.is_alphabetic() || c == '_');
        let name: String = source[start..end].iter().collect();
        let variable = self.expressions.variable(name);
        self.current.operands.push(variable);
        end
    }

    fn push_sub_context(&mut self, source: &[char], open: usize) -> Result<usize, ParseError> {
        let close = matching_parenthesis(source, open)
            .ok_or_else(|| ParseError::UnterminatedSubContext(self.current.text.clone()))?;
        let inner: String = source[open + 1..close].iter().collect();

        let outer = mem::replace(&mut self.current, Context::new(inner));
        self.saved.push(outer);
        let sub_expression = self.parse_current()?;
        self.current = self.saved.pop().ok_or_else(|| {
            ParseError::IllegalPostParseState("sub-context has no enclosing context".to_string())
        })?;

        self.current.operands.push(sub_expression);
        Ok(close + 1)
    }

    fn push_operator(&mut self, rule: OperatorRule) -> Result<(), ParseError> {
        if rule == OperatorRule::Assignment {
            if self.current.assigned {
                return Err(ParseError::MultipleAssignments(self.current.text.clone()));
            }
            self.current.assigned = true;
        }
        if let Some(top) = self.current.operators.last() {
            if top.operand_depth == self.current.operands.len() {
                return Err(ParseError::MissingLeftOperand(rule));
            }
        }

        while let Some(top) = self.current.operators.last() {
            if !top.rule.precedence_ge(&rule) {
                break;
            }
            self.resolve()?;
        }

        trace!("Pushing operator {}", rule);
        self.current.push_operator(rule);
        Ok(())
    }

    /// Resolves the operator on top of the stack against its operands. Both stacks are
    /// left untouched if that fails.
    fn resolve(&mut self) -> Result<(), ParseError> {
        let snapshot = self.current.snapshot();
        let result = self.try_resolve();
        if result.is_err() {
            self.current.restore(snapshot);
        }
        result
    }

    fn try_resolve(&mut self) -> Result<(), ParseError> {
        let pending = self
            .current
            .operators
            .pop()
            .ok_or(ParseError::MissingOperator)?;
        if self.current.operands.len() <= pending.operand_depth {
            return Err(ParseError::MissingRightOperand);
        }
        if pending.operand_depth == 0 {
            return self.resolve_unary(pending);
        }

        let right = self
            .current
            .operands
            .pop()
            .ok_or(ParseError::MissingRightOperand)?;
        // A non-zero depth means an operand was read before the operator.
        let left = self
            .current
            .operands
            .pop()
            .ok_or(ParseError::MissingLeftOperand(pending.rule))?;
        if pending.rule == OperatorRule::Assignment {
            self.check_assignment(left, right)?;
        }

        let operation = self.build_operation(pending.rule, left, right)?;
        trace!("Resolved {} into {:?}", pending.rule, operation);
        self.current.operands.push(operation);
        Ok(())
    }

    /// Reads an operator with nothing before it as `0 <operator> operand`.
    fn resolve_unary(&mut self, pending: PendingOperator) -> Result<(), ParseError> {
        if !pending.rule.allows_unary() {
            return Err(ParseError::UnsupportedUnaryOperator(pending.rule));
        }
        let right = self
            .current
            .operands
            .pop()
            .ok_or(ParseError::MissingRightOperand)?;
        if !self.current.operands.is_empty() {
            return Err(ParseError::TrailingLeftOperand(pending.rule));
        }

        let zero = self.expressions.constant(Number::zero(self.kind));
        let operation = self.build_operation(pending.rule, zero, right)?;
        trace!("Resolved unary {} into {:?}", pending.rule, operation);
        self.current.operands.push(operation);
        Ok(())
    }

    fn check_assignment(&self, left: ExpressionId, right: ExpressionId) -> Result<(), ParseError> {
        let name = self
            .expressions
            .get(left)
            .variable_name()
            .ok_or(ParseError::IllegalAssignment(
                AssignmentViolation::LeftNotVariable,
            ))?;
        if self.expressions.variables(right).iter().any(|other| other == name) {
            return Err(ParseError::IllegalAssignment(
                AssignmentViolation::LeftInRight(name.to_string()),
            ));
        }
        Ok(())
    }

    /// Attaches the right operand, then the left one, to a new operation.
    fn build_operation(
        &mut self,
        rule: OperatorRule,
        left: ExpressionId,
        right: ExpressionId,
    ) -> Result<ExpressionId, ParseError> {
        let operation = self.expressions.operation(rule);
        let attached = self
            .expressions
            .set_right(operation, Some(right))
            .and_then(|_| self.expressions.set_left(operation, Some(left)));

        match attached {
            Ok(()) => Ok(operation),
            Err(error) => {
                self.expressions.dismantle(operation);
                Err(match error {
                    ExpressionError::AssignmentTargetNotVariable(_) => {
                        ParseError::IllegalAssignment(AssignmentViolation::LeftNotVariable)
                    }
                    ExpressionError::AssignmentAsChild(_) => {
                        ParseError::IllegalAssignment(AssignmentViolation::Nested)
                    }
                    error => ParseError::Expression(error),
                })
            }
        }
    }
}

/// Index one past the run of characters starting at `start` that satisfy `accept`.
fn scan_run(source: &[char], start: usize, accept: impl Fn(char) -> bool) -> usize {
    source[start..]
        .iter()
        .position(|c| !accept(*c))
        .map_or(source.len(), |length| start + length)
}

/// Index of the parenthesis closing the one at `open`.
fn matching_parenthesis(source: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, character) in source.iter().enumerate().skip(open) {
        match character {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::syntax::expression_tree::Expression;
    use pretty_assertions::assert_eq;

    fn convert(text: &str) -> Result<(InfixConverter, Vec<ExpressionId>), ParseError> {
        let mut converter = InfixConverter::new(NumericKind::Integer);
        let roots = converter.convert_all(text)?;
        Ok((converter, roots))
    }

    fn convert_one(text: &str) -> (Expressions, ExpressionId) {
        let (converter, roots) = convert(text).unwrap();
        (converter.into_expressions(), roots[0])
    }

    #[test]
    fn scan_run_stops_at_first_rejected_character() {
        let source: Vec<char> = "abc1".chars().collect();

        assert_eq!(scan_run(&source, 0, char::is_alphabetic), 3);
        assert_eq!(scan_run(&source, 3, |c| c.is_ascii_digit()), 4);
    }

    #[test]
    fn matching_parenthesis_skips_nested_pairs() {
        let source: Vec<char> = "(a * (b + c)) - d".chars().collect();

        assert_eq!(matching_parenthesis(&source, 0), Some(12));
        assert_eq!(matching_parenthesis(&source, 5), Some(11));
        assert_eq!(matching_parenthesis(&"((a)".chars().collect::<Vec<_>>(), 0), None);
    }

    #[test]
    fn higher_precedence_binds_tighter() {
        let (expressions, root) = convert_one("2 + 3 * 4");

        assert_eq!(expressions.get(root).rule(), Some(OperatorRule::Addition));
        let right = expressions.right(root).unwrap();
        assert_eq!(expressions.get(right).rule(), Some(OperatorRule::Multiplication));
        assert_eq!(expressions.value(root).unwrap(), Number::Integer(14));
    }

    #[test]
    fn equal_precedence_groups_to_the_left() {
        let (expressions, root) = convert_one("8 - 3 - 2");

        assert_eq!(expressions.value(root).unwrap(), Number::Integer(3));
        let left = expressions.left(root).unwrap();
        assert_eq!(expressions.get(left).rule(), Some(OperatorRule::Subtraction));
    }

    #[test]
    fn leading_minus_becomes_subtraction_from_zero() {
        let (expressions, root) = convert_one("-5 + 2");

        let left = expressions.left(root).unwrap();
        assert_eq!(expressions.get(left).rule(), Some(OperatorRule::Subtraction));
        let zero = expressions.left(left).unwrap();
        assert_eq!(
            expressions.get(zero),
            &Expression::Constant(Number::Integer(0))
        );
        assert_eq!(expressions.value(root).unwrap(), Number::Integer(-3));
    }

    #[test]
    fn sub_contexts_parse_as_single_operands() {
        let (mut expressions, root) = convert_one("(a + b) * 2");

        expressions.bind("a", Number::Integer(3));
        expressions.bind("b", Number::Integer(4));

        assert_eq!(expressions.value(root).unwrap(), Number::Integer(14));
    }

    #[test]
    fn nested_sub_contexts_resolve_inside_out() {
        let (expressions, root) = convert_one("((1 + 2) * (3 + 4)) ^ 2");

        assert_eq!(expressions.value(root).unwrap(), Number::Integer(441));
    }

    #[test]
    fn unary_minus_inside_sub_context() {
        let (expressions, root) = convert_one("2 * (-3)");

        assert_eq!(expressions.value(root).unwrap(), Number::Integer(-6));
    }

    #[test]
    fn multiple_assignments_in_one_context_fail() {
        let error = convert("a = b = c").err();

        assert_eq!(
            error,
            Some(ParseError::MultipleAssignments("a = b = c".to_string()))
        );
    }

    #[test]
    fn assignment_without_value_is_missing_right_operand() {
        assert_eq!(convert("a =").err(), Some(ParseError::MissingRightOperand));
        assert_eq!(convert("a -").err(), Some(ParseError::MissingRightOperand));
    }

    #[test]
    fn unknown_characters_are_rejected() {
        assert_eq!(
            convert("a $ b").err(),
            Some(ParseError::UnknownToken {
                token: '$',
                context: "a $ b".to_string()
            })
        );
    }

    #[test]
    fn unclosed_parenthesis_is_unterminated() {
        assert_eq!(
            convert("2 * (a + 1").err(),
            Some(ParseError::UnterminatedSubContext("2 * (a + 1".to_string()))
        );
    }

    #[test]
    fn decimal_point_is_unknown_for_integers() {
        assert_eq!(
            convert("1.5").err(),
            Some(ParseError::UnknownToken {
                token: '.',
                context: "1.5".to_string()
            })
        );
    }

    #[test]
    fn malformed_literal_is_invalid_number() {
        let mut converter = InfixConverter::new(NumericKind::Double);

        assert_eq!(
            converter.convert_all("1.2.3").unwrap_err(),
            ParseError::InvalidNumber {
                text: "1.2.3".to_string(),
                kind: NumericKind::Double
            }
        );
    }

    #[test]
    fn non_additive_operator_cannot_be_unary() {
        assert_eq!(
            convert("* 2").err(),
            Some(ParseError::UnsupportedUnaryOperator(OperatorRule::Multiplication))
        );
    }

    #[test]
    fn stray_operand_before_unary_operand_is_trailing() {
        // The operator reads as unary, yet two operands follow it.
        assert_eq!(
            convert("- a b").err(),
            Some(ParseError::TrailingLeftOperand(OperatorRule::Subtraction))
        );
    }

    #[test]
    fn operator_right_after_operator_has_no_left_operand() {
        assert_eq!(
            convert("a - * b").err(),
            Some(ParseError::MissingLeftOperand(OperatorRule::Multiplication))
        );
        assert_eq!(
            convert("2 ^ -1").err(),
            Some(ParseError::MissingLeftOperand(OperatorRule::Subtraction))
        );
    }

    #[test]
    fn adjacent_operands_leave_an_illegal_state() {
        assert_eq!(
            convert("a b").err(),
            Some(ParseError::IllegalPostParseState(
                "2 operands remain in 'a b'".to_string()
            ))
        );
    }

    #[test]
    fn assignment_to_non_variable_is_illegal() {
        assert_eq!(
            convert("3 + a = 4").err(),
            Some(ParseError::IllegalAssignment(
                AssignmentViolation::LeftNotVariable
            ))
        );
    }

    #[test]
    fn self_referencing_assignment_is_illegal() {
        assert_eq!(
            convert("a = a ^ 5").err(),
            Some(ParseError::IllegalAssignment(AssignmentViolation::LeftInRight(
                "a".to_string()
            )))
        );
    }

    #[test]
    fn nested_assignment_is_illegal() {
        assert_eq!(
            convert("2 * (a = 3)").err(),
            Some(ParseError::IllegalAssignment(AssignmentViolation::Nested))
        );
    }

    #[test]
    fn failed_resolution_restores_the_stacks() {
        let mut converter = InfixConverter::new(NumericKind::Integer);
        converter.current = Context::new("a =");
        let a = converter.expressions.variable("a");
        converter.current.operands.push(a);
        converter.current.push_operator(OperatorRule::Assignment);

        let error = converter.resolve().unwrap_err();

        assert_eq!(error, ParseError::MissingRightOperand);
        assert_eq!(converter.current.operands, vec![a]);
        assert_eq!(converter.current.operators.len(), 1);
    }

    #[test]
    fn empty_stacks_report_missing_operator() {
        let mut converter = InfixConverter::new(NumericKind::Integer);

        assert_eq!(converter.resolve().unwrap_err(), ParseError::MissingOperator);
    }

    #[test]
    fn failure_discards_in_flight_contexts() {
        let mut converter = InfixConverter::new(NumericKind::Integer);

        converter.convert_all("1 + (2 * (3 $ 4))").unwrap_err();

        assert!(converter.saved.is_empty());
        assert!(converter.current.operands.is_empty());
    }

    #[test]
    fn semicolons_separate_expressions_sharing_bindings() {
        let (converter, roots) = convert("a = 3; b = 4; (a + b) * 2;").unwrap();
        let expressions = converter.into_expressions();

        assert_eq!(roots.len(), 3);
        assert_eq!(expressions.value(roots[2]).unwrap(), Number::Integer(14));
    }

    #[test]
    fn empty_segment_between_semicolons_fails() {
        assert_eq!(convert("1;;2").err(), Some(ParseError::MissingRightOperand));
    }

    #[test]
    fn float_kind_accepts_decimal_literals() {
        let mut converter = InfixConverter::new(NumericKind::Float);
        let roots = converter.convert_all(".5 * 3").unwrap();
        let expressions = converter.into_expressions();

        assert_eq!(expressions.value(roots[0]).unwrap(), Number::Float(1.5));
    }

    #[test]
    fn unary_zero_follows_configured_kind() {
        let mut converter = InfixConverter::new(NumericKind::Double);
        let roots = converter.convert_all("-2").unwrap();
        let expressions = converter.into_expressions();

        assert_eq!(expressions.value(roots[0]).unwrap(), Number::Double(-2.0));
    }
}
