use crate::interpreter::number::Number;
use crate::interpreter::operator::OperatorRule;
use crate::interpreter::syntax::syntax_visitor::{walk_binary, SyntaxVisitor, VariableCollector};
use crate::interpreter::syntax::ExpressionError;
use crate::interpreter::token::Token;
use crate::interpreter::tokens_to_string;
use anyhow::{Context, Result};
use log::debug;
use ptree::{write_tree, TreeBuilder};
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Handle to an expression stored in an [`Expressions`] arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    // Terminal expressions (leaves)
    Constant(Number),
    Variable(String),
    // Non-terminal expressions
    Binary {
        rule: OperatorRule,
        left: Option<ExpressionId>,
        right: Option<ExpressionId>,
    },
}

impl Expression {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Expression::Constant(_) | Expression::Variable(_))
    }

    pub fn rule(&self) -> Option<OperatorRule> {
        match self {
            Expression::Binary { rule, .. } => Some(*rule),
            _ => None,
        }
    }

    pub fn is_assignment(&self) -> bool {
        self.rule() == Some(OperatorRule::Assignment)
    }

    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Expression::Variable(name) => Some(name),
            _ => None,
        }
    }
}

/// Step of the explicit-stack walk in [`Expressions::value`].
enum Visit {
    Enter(ExpressionId),
    Exit(ExpressionId, OperatorRule),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct Entry {
    expression: Expression,
    parent: Option<ExpressionId>,
}

/// Arena holding expression trees.
///
/// Binary expressions own their children through handles, and every child points back
/// at its parent. Variables are bound by name: all variables with the same name in one
/// arena share a value.
///
/// Handles are only meaningful for the arena that issued them; passing a handle from
/// another arena panics.
#[derive(Debug, Clone, Default)]
pub struct Expressions {
    entries: Vec<Entry>,
    bindings: HashMap<String, Number>,
}

impl Expressions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn constant(&mut self, value: impl Into<Number>) -> ExpressionId {
        self.push(Expression::Constant(value.into()))
    }

    pub fn variable(&mut self, name: impl Into<String>) -> ExpressionId {
        self.push(Expression::Variable(name.into()))
    }

    /// A binary expression without operands, to be filled in with
    /// [`Expressions::set_left`] and [`Expressions::set_right`].
    pub fn operation(&mut self, rule: OperatorRule) -> ExpressionId {
        self.push(Expression::Binary {
            rule,
            left: None,
            right: None,
        })
    }

    /// Builds a complete binary expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use node_expressions::interpreter::number::Number;
    /// use node_expressions::interpreter::operator::OperatorRule;
    /// use node_expressions::interpreter::syntax::expression_tree::Expressions;
    /// # use node_expressions::interpreter::syntax::ExpressionError;
    ///
    /// # fn main() -> Result<(), ExpressionError> {
    /// let mut expressions = Expressions::new();
    /// let two = expressions.constant(Number::Integer(2));
    /// let half = expressions.constant(Number::Double(3.5));
    /// let sum = expressions.binary(OperatorRule::Addition, two, half)?;
    ///
    /// assert_eq!(expressions.value(sum)?, Number::Double(5.5));
    /// # Ok(()) }
    /// ```
    pub fn binary(
        &mut self,
        rule: OperatorRule,
        left: ExpressionId,
        right: ExpressionId,
    ) -> Result<ExpressionId, ExpressionError> {
        let operation = self.operation(rule);
        self.set_left(operation, Some(left))?;
        self.set_right(operation, Some(right))?;
        Ok(operation)
    }

    /// Builds `variable = value`, which binds the variable right away if `value`
    /// can be evaluated.
    pub fn assignment(
        &mut self,
        variable: ExpressionId,
        value: ExpressionId,
    ) -> Result<ExpressionId, ExpressionError> {
        self.binary(OperatorRule::Assignment, variable, value)
    }

    pub fn get(&self, id: ExpressionId) -> &Expression {
        &self.entry(id).expression
    }

    pub fn parent(&self, id: ExpressionId) -> Option<ExpressionId> {
        self.entry(id).parent
    }

    pub fn left(&self, id: ExpressionId) -> Option<ExpressionId> {
        self.child(id, Side::Left)
    }

    pub fn right(&self, id: ExpressionId) -> Option<ExpressionId> {
        self.child(id, Side::Right)
    }

    pub fn is_terminal(&self, id: ExpressionId) -> bool {
        self.get(id).is_terminal()
    }

    pub fn set_left(
        &mut self,
        id: ExpressionId,
        child: Option<ExpressionId>,
    ) -> Result<(), ExpressionError> {
        self.set_child(id, Side::Left, child)
    }

    pub fn set_right(
        &mut self,
        id: ExpressionId,
        child: Option<ExpressionId>,
    ) -> Result<(), ExpressionError> {
        self.set_child(id, Side::Right, child)
    }

    /// Detaches both children of a binary expression without touching any bindings.
    pub(crate) fn dismantle(&mut self, id: ExpressionId) {
        for side in [Side::Left, Side::Right] {
            if let Some(child) = self.child(id, side) {
                self.entries[child.0].parent = None;
            }
            if let Some(slot) = self.child_slot_mut(id, side) {
                *slot = None;
            }
        }
    }

    pub fn has_value(&self, id: ExpressionId) -> bool {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            match self.get(id) {
                Expression::Constant(_) => {}
                Expression::Variable(name) => {
                    if !self.bindings.contains_key(name) {
                        return false;
                    }
                }
                Expression::Binary {
                    rule: OperatorRule::Assignment,
                    ..
                } => {
                    if self.assigned_value(id).is_none() {
                        return false;
                    }
                }
                Expression::Binary {
                    left: Some(left),
                    right: Some(right),
                    ..
                } => pending.extend([*left, *right]),
                Expression::Binary { .. } => return false,
            }
        }
        true
    }

    /// Evaluates the tree rooted at `id` bottom-up without recursing.
    ///
    /// An assignment evaluates to the value currently bound to its target variable.
    pub fn value(&self, id: ExpressionId) -> Result<Number, ExpressionError> {
        let mut pending = vec![Visit::Enter(id)];
        let mut values: Vec<Number> = Vec::new();

        while let Some(visit) = pending.pop() {
            match visit {
                Visit::Enter(current) => match self.get(current) {
                    Expression::Constant(value) => values.push(*value),
                    Expression::Variable(name) => values.push(
                        self.bindings
                            .get(name)
                            .copied()
                            .ok_or(ExpressionError::EvaluationNotReady(current))?,
                    ),
                    Expression::Binary {
                        rule: OperatorRule::Assignment,
                        ..
                    } => values.push(
                        self.assigned_value(current)
                            .ok_or(ExpressionError::EvaluationNotReady(current))?,
                    ),
                    Expression::Binary {
                        rule,
                        left: Some(left),
                        right: Some(right),
                    } => {
                        pending.push(Visit::Exit(current, *rule));
                        pending.push(Visit::Enter(*right));
                        pending.push(Visit::Enter(*left));
                    }
                    Expression::Binary { .. } => {
                        return Err(ExpressionError::EvaluationNotReady(current))
                    }
                },
                Visit::Exit(current, rule) => {
                    let right = values.pop();
                    let left = values.pop();
                    match (left, right) {
                        (Some(left), Some(right)) => values.push(rule.evaluate(left, right)?),
                        _ => return Err(ExpressionError::IncompleteOperation(current)),
                    }
                }
            }
        }
        values.pop().ok_or(ExpressionError::EvaluationNotReady(id))
    }

    /// Current binding of an assignment's target variable.
    fn assigned_value(&self, assignment: ExpressionId) -> Option<Number> {
        self.left(assignment)
            .and_then(|left| self.get(left).variable_name())
            .and_then(|name| self.binding(name))
    }

    /// Binds a value to the variable `id` (and every variable sharing its name).
    pub fn set_value(
        &mut self,
        id: ExpressionId,
        value: impl Into<Number>,
    ) -> Result<(), ExpressionError> {
        let name = self.name_of(id)?;
        self.bind(name, value);
        Ok(())
    }

    pub fn clear_value(&mut self, id: ExpressionId) -> Result<(), ExpressionError> {
        let name = self.name_of(id)?;
        self.bindings.remove(&name);
        Ok(())
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Number>) {
        self.bindings.insert(name.into(), value.into());
    }

    pub fn binding(&self, name: &str) -> Option<Number> {
        self.bindings.get(name).copied()
    }

    /// Whether `needle` occurs in the tree rooted at `haystack`.
    ///
    /// Variables match by name, every other expression by identity.
    pub fn contains(&self, haystack: ExpressionId, needle: ExpressionId) -> bool {
        if haystack == needle {
            return true;
        }
        match (self.get(haystack), self.get(needle)) {
            (Expression::Variable(name), Expression::Variable(other)) => name == other,
            (Expression::Binary { left, right, .. }, _) => left
                .iter()
                .chain(right.iter())
                .any(|child| self.contains(*child, needle)),
            _ => false,
        }
    }

    /// Names of all variables in the tree, left to right.
    pub fn variables(&self, id: ExpressionId) -> Vec<String> {
        let mut collector = VariableCollector::default();
        self.accept(id, &mut collector);
        collector.names
    }

    /// Calls the correct visitor method for the expression variant on the given visitor.
    pub(crate) fn accept(&self, id: ExpressionId, visitor: &mut impl SyntaxVisitor) {
        match self.get(id) {
            Expression::Constant(value) => visitor.visit_constant(*value),
            Expression::Variable(name) => visitor.visit_variable(name),
            Expression::Binary { rule, left, right } => {
                visitor.visit_binary(self, *rule, *left, *right)
            }
        }
    }

    pub fn display(&self, id: ExpressionId) -> ExpressionDisplay<'_> {
        ExpressionDisplay {
            expressions: self,
            id,
        }
    }

    /// Infix tokens of the tree rooted at `id`. Fails on an operation that is missing
    /// an operand.
    pub fn to_infix(&self, id: ExpressionId) -> Result<Vec<Token>, ExpressionError> {
        self.build_expression(id, None, false)
    }

    fn build_expression(
        &self,
        id: ExpressionId,
        position: Option<(OperatorRule, Side)>,
        allow_missing: bool,
    ) -> Result<Vec<Token>, ExpressionError> {
        match self.get(id) {
            Expression::Constant(value) => Ok(vec![Token::Number(*value)]),
            Expression::Variable(name) => Ok(vec![Token::Identifier(name.to_string())]),
            Expression::Binary { rule, left, right } => {
                let operand_tokens = |operand: Option<ExpressionId>, side: Side| match operand {
                    Some(operand) => {
                        self.build_expression(operand, Some((*rule, side)), allow_missing)
                    }
                    None if allow_missing => Ok(vec![Token::Missing]),
                    None => Err(ExpressionError::IncompleteOperation(id)),
                };
                let mut left_tokens = operand_tokens(*left, Side::Left)?;
                let mut right_tokens = operand_tokens(*right, Side::Right)?;

                let mut tokens = Vec::new();
                parenthesize_if(
                    &mut tokens,
                    || needs_parentheses(position, *rule),
                    |tokens| {
                        tokens.append(&mut left_tokens);
                        tokens.push(rule.token());
                        tokens.append(&mut right_tokens);
                    },
                );
                Ok(tokens)
            }
        }
    }

    /// Renders the tree rooted at `id` as an indented outline.
    pub fn format_tree(&self, id: ExpressionId) -> Result<String> {
        let mut visitor = TreeBuilderVisitor {
            builder: TreeBuilder::new("expression".into()),
        };
        self.accept(id, &mut visitor);

        let mut buffer: Vec<u8> = Vec::new();
        write_tree(&visitor.builder.build(), &mut buffer)
            .context("Failed to write expression tree")?;
        String::from_utf8(buffer).context("Expression tree is not valid UTF-8")
    }

    fn push(&mut self, expression: Expression) -> ExpressionId {
        self.entries.push(Entry {
            expression,
            parent: None,
        });
        ExpressionId(self.entries.len() - 1)
    }

    fn entry(&self, id: ExpressionId) -> &Entry {
        &self.entries[id.0]
    }

    fn child(&self, id: ExpressionId, side: Side) -> Option<ExpressionId> {
        match (self.get(id), side) {
            (Expression::Binary { left, .. }, Side::Left) => *left,
            (Expression::Binary { right, .. }, Side::Right) => *right,
            _ => None,
        }
    }

    fn child_slot_mut(&mut self, id: ExpressionId, side: Side) -> Option<&mut Option<ExpressionId>> {
        match (&mut self.entries[id.0].expression, side) {
            (Expression::Binary { left, .. }, Side::Left) => Some(left),
            (Expression::Binary { right, .. }, Side::Right) => Some(right),
            _ => None,
        }
    }

    fn name_of(&self, id: ExpressionId) -> Result<String, ExpressionError> {
        self.get(id)
            .variable_name()
            .map(str::to_string)
            .ok_or(ExpressionError::NotAVariable(id))
    }

    fn set_child(
        &mut self,
        id: ExpressionId,
        side: Side,
        child: Option<ExpressionId>,
    ) -> Result<(), ExpressionError> {
        let rule = self.get(id).rule().ok_or(ExpressionError::TerminalParent(id))?;
        let old_child = self.child(id, side);

        if let Some(child) = child.filter(|child| old_child != Some(*child)) {
            if rule == OperatorRule::Assignment
                && side == Side::Left
                && self.get(child).variable_name().is_none()
            {
                return Err(ExpressionError::AssignmentTargetNotVariable(child));
            }
            self.set_parent(child, Some(id))?;
            if let Some(old_child) = old_child {
                self.entries[old_child.0].parent = None;
            }
        } else if child.is_none() {
            if let Some(old_child) = old_child {
                self.entries[old_child.0].parent = None;
            }
        }
        if let Some(slot) = self.child_slot_mut(id, side) {
            *slot = child;
        }

        if rule == OperatorRule::Assignment {
            self.propagate_assignment(id);
        }
        Ok(())
    }

    /// Points `child` at `parent`, refusing terminal parents, nested assignments and
    /// anything that would close a cycle.
    fn set_parent(
        &mut self,
        child: ExpressionId,
        parent: Option<ExpressionId>,
    ) -> Result<(), ExpressionError> {
        if let Some(parent) = parent {
            if self.is_terminal(parent) {
                return Err(ExpressionError::TerminalParent(parent));
            }
            if self.get(child).is_assignment() {
                return Err(ExpressionError::AssignmentAsChild(child));
            }
            if self.is_ancestor(child, parent) {
                return Err(ExpressionError::CyclicParent { child, parent });
            }
            if self.parent(child).is_some() {
                return Err(ExpressionError::AlreadyAttached(child));
            }
        }
        self.entries[child.0].parent = parent;
        Ok(())
    }

    /// Whether `ancestor` is `id` itself or lies on its parent chain.
    fn is_ancestor(&self, ancestor: ExpressionId, id: ExpressionId) -> bool {
        let mut current = Some(id);
        while let Some(expression) = current {
            if expression == ancestor {
                return true;
            }
            current = self.parent(expression);
        }
        false
    }

    /// Copies the value of an assignment's right side into its left variable, or
    /// clears the variable when the right side has no value.
    fn propagate_assignment(&mut self, assignment: ExpressionId) {
        let name = match self.left(assignment).and_then(|left| self.get(left).variable_name()) {
            Some(name) => name.to_string(),
            None => return,
        };
        let value = match self.right(assignment) {
            Some(right) => self.value(right),
            None => Err(ExpressionError::EvaluationNotReady(assignment)),
        };
        match value {
            Ok(value) => {
                debug!("Assigning {} to {}", value, name);
                self.bindings.insert(name, value);
            }
            Err(error) => {
                debug!("Clearing {}: {}", name, error);
                self.bindings.remove(&name);
            }
        }
    }
}

/// Infix rendering of one expression tree.
pub struct ExpressionDisplay<'a> {
    expressions: &'a Expressions,
    id: ExpressionId,
}

impl Display for ExpressionDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Missing operands render as `?`, so an unfinished operation still displays.
        let tokens = self
            .expressions
            .build_expression(self.id, None, true)
            .map_err(|_| fmt::Error)?;
        let text = tokens_to_string(tokens).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

struct TreeBuilderVisitor {
    builder: TreeBuilder,
}

impl SyntaxVisitor for TreeBuilderVisitor {
    fn visit_constant(&mut self, value: Number) {
        self.builder.add_empty_child(format!("{}", value));
    }
    fn visit_variable(&mut self, name: &str) {
        self.builder.add_empty_child(name.to_string());
    }
    fn visit_binary(
        &mut self,
        expressions: &Expressions,
        rule: OperatorRule,
        left: Option<ExpressionId>,
        right: Option<ExpressionId>,
    ) {
        self.builder.begin_child(format!("{}", rule));
        walk_binary(self, expressions, left, right);
        self.builder.end_child();
    }
}

/// A child needs parentheses when it binds more loosely than its parent, or as
/// tightly on the right side, since operators of equal precedence group to the left.
fn needs_parentheses(position: Option<(OperatorRule, Side)>, rule: OperatorRule) -> bool {
    match position {
        Some((parent, Side::Left)) => rule.precedence_lt(&parent),
        Some((parent, Side::Right)) => rule.precedence_lt(&parent) || rule.precedence_eq(&parent),
        None => false,
    }
}

fn parenthesize_if(
    tokens: &mut Vec<Token>,
    predicate: impl Fn() -> bool,
    mut build_interior: impl FnMut(&mut Vec<Token>),
) {
    let close_parentheses = predicate();

    if close_parentheses {
        tokens.push(Token::OpenParenthesis);
    }

    build_interior(tokens);

    if close_parentheses {
        tokens.push(Token::CloseParenthesis);
    }
}
