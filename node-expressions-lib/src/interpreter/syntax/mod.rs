pub mod expression_tree;
pub mod syntax_visitor;

use crate::interpreter::syntax::expression_tree::ExpressionId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("expression {0:?} has no value yet")]
    EvaluationNotReady(ExpressionId),
    #[error("terminal expression {0:?} cannot have children")]
    TerminalParent(ExpressionId),
    #[error("making {parent:?} the parent of {child:?} would create a cycle")]
    CyclicParent {
        child: ExpressionId,
        parent: ExpressionId,
    },
    #[error("assignment {0:?} cannot be part of another expression")]
    AssignmentAsChild(ExpressionId),
    #[error("the left side of an assignment must be a variable, found {0:?}")]
    AssignmentTargetNotVariable(ExpressionId),
    #[error("expression {0:?} already belongs to another expression")]
    AlreadyAttached(ExpressionId),
    #[error("expression {0:?} is not a variable")]
    NotAVariable(ExpressionId),
    #[error("operation {0:?} is missing an operand")]
    IncompleteOperation(ExpressionId),
    #[error("division by zero")]
    DivisionByZero,
}
