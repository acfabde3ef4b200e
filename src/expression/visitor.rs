//! Double-dispatch traversal over expression trees.
//!
//! [`Expression::accept`] calls the [`ExprVisitor`] handler for the node's
//! kind. Handlers receive the node's fields mutably and may either let the
//! node stand ([`Visit::Continue`]) or hand back a replacement
//! ([`Visit::Replace`]), which `accept` swaps in place of the node.
//!
//! Nodes never recurse on their own. The default handlers call the matching
//! `walk_*` function, which visits children in field order; a visitor that
//! overrides a handler and skips the walk leaves that subtree untouched.

use crate::datatypes::Value;
use crate::expression::comprehension::{ListComprehensionExpr, PredicateExpr, ReduceExpr};
use crate::expression::label_attribute::{LabelAttributeExpr, LabelExpr};
use crate::expression::operator::{
    ArithmeticOperator, LogicalOperator, RelationalOperator, UnaryOperator,
};
use crate::expression::Expression;

/// Outcome of visiting a single node
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Visit {
    /// Keep the node (its children may have been rewritten)
    Continue,
    /// Replace the node with the given expression
    Replace(Expression),
}

/// One handler per expression kind
pub trait ExprVisitor {
    fn visit_constant(&mut self, _value: &mut Value) -> Visit {
        Visit::Continue
    }

    fn visit_label(&mut self, _label: &mut LabelExpr) -> Visit {
        Visit::Continue
    }

    fn visit_unary(&mut self, _op: UnaryOperator, operand: &mut Expression) -> Visit {
        walk_unary(self, operand);
        Visit::Continue
    }

    fn visit_arithmetic(
        &mut self,
        _op: ArithmeticOperator,
        left: &mut Expression,
        right: &mut Expression,
    ) -> Visit {
        walk_binary(self, left, right);
        Visit::Continue
    }

    fn visit_relational(
        &mut self,
        _op: RelationalOperator,
        left: &mut Expression,
        right: &mut Expression,
    ) -> Visit {
        walk_binary(self, left, right);
        Visit::Continue
    }

    fn visit_logical(&mut self, _op: LogicalOperator, operands: &mut [Expression]) -> Visit {
        walk_all(self, operands);
        Visit::Continue
    }

    fn visit_list(&mut self, items: &mut [Expression]) -> Visit {
        walk_all(self, items);
        Visit::Continue
    }

    fn visit_attribute(&mut self, object: &mut Expression, _attribute: &mut String) -> Visit {
        object.accept(self);
        Visit::Continue
    }

    fn visit_label_attribute(&mut self, _expr: &mut LabelAttributeExpr) -> Visit {
        Visit::Continue
    }

    fn visit_list_comprehension(&mut self, expr: &mut ListComprehensionExpr) -> Visit {
        walk_list_comprehension(self, expr);
        Visit::Continue
    }

    fn visit_predicate(&mut self, expr: &mut PredicateExpr) -> Visit {
        walk_predicate(self, expr);
        Visit::Continue
    }

    fn visit_reduce(&mut self, expr: &mut ReduceExpr) -> Visit {
        walk_reduce(self, expr);
        Visit::Continue
    }
}

pub fn walk_unary<V: ExprVisitor + ?Sized>(visitor: &mut V, operand: &mut Expression) {
    operand.accept(visitor);
}

pub fn walk_binary<V: ExprVisitor + ?Sized>(
    visitor: &mut V,
    left: &mut Expression,
    right: &mut Expression,
) {
    left.accept(visitor);
    right.accept(visitor);
}

pub fn walk_all<V: ExprVisitor + ?Sized>(visitor: &mut V, exprs: &mut [Expression]) {
    for expr in exprs {
        expr.accept(visitor);
    }
}

/// Visit `collection`, then `filter`, then `mapping`
pub fn walk_list_comprehension<V: ExprVisitor + ?Sized>(
    visitor: &mut V,
    expr: &mut ListComprehensionExpr,
) {
    expr.collection_mut().accept(visitor);
    if let Some(filter) = expr.filter_mut() {
        filter.accept(visitor);
    }
    if let Some(mapping) = expr.mapping_mut() {
        mapping.accept(visitor);
    }
}

/// Visit `collection`, then `filter`
pub fn walk_predicate<V: ExprVisitor + ?Sized>(visitor: &mut V, expr: &mut PredicateExpr) {
    expr.collection_mut().accept(visitor);
    if let Some(filter) = expr.filter_mut() {
        filter.accept(visitor);
    }
}

/// Visit `initial`, then `collection`, then `mapping`
pub fn walk_reduce<V: ExprVisitor + ?Sized>(visitor: &mut V, expr: &mut ReduceExpr) {
    expr.initial_mut().accept(visitor);
    expr.collection_mut().accept(visitor);
    expr.mapping_mut().accept(visitor);
}

impl Expression {
    /// Dispatch to the visitor handler for this node's kind, replacing the
    /// node if the handler asks for it. Returns whether it was replaced.
    pub fn accept<V: ExprVisitor + ?Sized>(&mut self, visitor: &mut V) -> bool {
        let action = match self {
            Expression::Constant(value) => visitor.visit_constant(value),
            Expression::Label(label) => visitor.visit_label(label),
            Expression::Unary { op, operand } => visitor.visit_unary(*op, operand),
            Expression::Arithmetic { op, left, right } => {
                visitor.visit_arithmetic(*op, left, right)
            }
            Expression::Relational { op, left, right } => {
                visitor.visit_relational(*op, left, right)
            }
            Expression::Logical { op, operands } => visitor.visit_logical(*op, operands),
            Expression::List(items) => visitor.visit_list(items),
            Expression::Attribute { object, attribute } => {
                visitor.visit_attribute(object, attribute)
            }
            Expression::LabelAttribute(expr) => visitor.visit_label_attribute(expr),
            Expression::ListComprehension(expr) => visitor.visit_list_comprehension(expr),
            Expression::Predicate(expr) => visitor.visit_predicate(expr),
            Expression::Reduce(expr) => visitor.visit_reduce(expr),
        };

        match action {
            Visit::Continue => false,
            Visit::Replace(replacement) => {
                *self = replacement;
                true
            }
        }
    }
}
