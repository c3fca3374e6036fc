use crate::interpreter::operator::OperatorRule;
use crate::interpreter::parser::ParseError;
use crate::interpreter::syntax::expression_tree::ExpressionId;

/// An operator waiting on the operator stack.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) struct PendingOperator {
    pub(super) rule: OperatorRule,
    /// Number of operands on the stack when the operator was read. Operands above this
    /// depth came after the operator; a depth of zero means nothing preceded it.
    pub(super) operand_depth: usize,
}

/// Working state for one infix (sub-)expression.
#[derive(Debug, Default)]
pub(super) struct Context {
    pub(super) text: String,
    pub(super) operands: Vec<ExpressionId>,
    pub(super) operators: Vec<PendingOperator>,
    pub(super) assigned: bool,
}

/// Stack contents saved before a resolution attempt.
pub(super) struct Snapshot {
    operands: Vec<ExpressionId>,
    operators: Vec<PendingOperator>,
}

impl Context {
    pub(super) fn new(text: impl Into<String>) -> Self {
        Context {
            text: text.into(),
            ..Context::default()
        }
    }

    pub(super) fn snapshot(&self) -> Snapshot {
        Snapshot {
            operands: self.operands.clone(),
            operators: self.operators.clone(),
        }
    }

    pub(super) fn restore(&mut self, snapshot: Snapshot) {
        self.operands = snapshot.operands;
        self.operators = snapshot.operators;
    }

    pub(super) fn push_operator(&mut self, rule: OperatorRule) {
        self.operators.push(PendingOperator {
            rule,
            operand_depth: self.operands.len(),
        });
    }

    /// The single operand left once every operator is resolved.
    pub(super) fn finish(&self) -> Result<ExpressionId, ParseError> {
        match self.operands.as_slice() {
            [] => Err(ParseError::MissingRightOperand),
            [root] => Ok(*root),
            operands => Err(ParseError::IllegalPostParseState(format!(
                "{} operands remain in '{}'",
                operands.len(),
                self.text.trim()
            ))),
        }
    }
}
