use crate::interpreter::number::Number;
use crate::interpreter::operator::OperatorRule;
use crate::interpreter::syntax::expression_tree::{ExpressionId, Expressions};

/// If a method is not implemented, the default implementation will continue in a pre-order
/// traversal of the tree.
pub(crate) trait SyntaxVisitor: Sized {
    fn visit_constant(&mut self, _value: Number) {}
    fn visit_variable(&mut self, _name: &str) {}
    fn visit_binary(
        &mut self,
        expressions: &Expressions,
        _rule: OperatorRule,
        left: Option<ExpressionId>,
        right: Option<ExpressionId>,
    ) {
        walk_binary(self, expressions, left, right)
    }
}

pub(crate) fn walk_binary(
    visitor: &mut impl SyntaxVisitor,
    expressions: &Expressions,
    left: Option<ExpressionId>,
    right: Option<ExpressionId>,
) {
    left.into_iter()
        .chain(right)
        .for_each(|child| expressions.accept(child, visitor));
}

/// Collects variable names in the order they are visited.
#[derive(Default)]
pub(crate) struct VariableCollector {
    pub(crate) names: Vec<String>,
}

impl SyntaxVisitor for VariableCollector {
    fn visit_variable(&mut self, name: &str) {
        self.names.push(name.to_string());
    }
}
