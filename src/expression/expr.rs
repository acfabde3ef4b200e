//! Expression AST definitions.

use crate::datatypes::Value;
use crate::expression::comprehension::{ListComprehensionExpr, PredicateExpr, ReduceExpr};
use crate::expression::label_attribute::{LabelAttributeExpr, LabelExpr};
use crate::expression::operator::{
    ArithmeticOperator, LogicalOperator, RelationalOperator, UnaryOperator,
};
use crate::expression::{ExpressionError, ExpressionResult};
use std::fmt;

/// Expression tree node
///
/// Children are exclusively owned, so `Clone` yields a fully independent
/// tree and a rewrite pass may replace any child in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Constant(Value),

    /// Bare identifier, resolved against the evaluation context
    Label(LabelExpr),

    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Binary arithmetic
    Arithmetic {
        op: ArithmeticOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Binary comparison
    Relational {
        op: RelationalOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Logical connective over two or more operands
    Logical {
        op: LogicalOperator,
        operands: Vec<Expression>,
    },

    /// List literal
    List(Vec<Expression>),

    /// Key lookup on a map-valued expression
    Attribute {
        object: Box<Expression>,
        attribute: String,
    },

    /// Parse-time `label.label`; must be rewritten before evaluation
    LabelAttribute(LabelAttributeExpr),

    ListComprehension(ListComprehensionExpr),

    Predicate(PredicateExpr),

    Reduce(ReduceExpr),
}

impl Expression {
    /// Create a constant expression
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    pub fn null() -> Self {
        Expression::Constant(Value::Null)
    }

    pub fn int(value: i64) -> Self {
        Expression::Constant(Value::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Expression::Constant(Value::Bool(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Constant(Value::String(value.into()))
    }

    /// Create a bare identifier
    pub fn label(name: impl Into<String>) -> Self {
        Expression::Label(LabelExpr::new(name))
    }

    /// Create an unrewritten `left.right` placeholder
    pub fn label_attribute(left: impl Into<String>, right: impl Into<String>) -> Self {
        Expression::LabelAttribute(LabelAttributeExpr::new(
            LabelExpr::new(left),
            LabelExpr::new(right),
        ))
    }

    pub fn list(items: Vec<Expression>) -> Self {
        Expression::List(items)
    }

    pub fn attribute(object: Expression, attribute: impl Into<String>) -> Self {
        Expression::Attribute {
            object: Box::new(object),
            attribute: attribute.into(),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn arithmetic(op: ArithmeticOperator, left: Expression, right: Expression) -> Self {
        Expression::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn relational(op: RelationalOperator, left: Expression, right: Expression) -> Self {
        Expression::Relational {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create an n-ary logical node; it needs at least two operands
    pub fn logical(op: LogicalOperator, operands: Vec<Expression>) -> ExpressionResult<Self> {
        if operands.len() < 2 {
            return Err(ExpressionError::Construction {
                reason: format!(
                    "{} needs at least 2 operands, got {}",
                    op.as_str(),
                    operands.len()
                ),
            });
        }
        Ok(Expression::Logical { op, operands })
    }

    pub fn add(left: Expression, right: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Add, left, right)
    }

    pub fn sub(left: Expression, right: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Sub, left, right)
    }

    pub fn mul(left: Expression, right: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Mul, left, right)
    }

    pub fn div(left: Expression, right: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Div, left, right)
    }

    pub fn modulo(left: Expression, right: Expression) -> Self {
        Self::arithmetic(ArithmeticOperator::Mod, left, right)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::relational(RelationalOperator::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::relational(RelationalOperator::Ne, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::relational(RelationalOperator::Lt, left, right)
    }

    pub fn le(left: Expression, right: Expression) -> Self {
        Self::relational(RelationalOperator::Le, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::relational(RelationalOperator::Gt, left, right)
    }

    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::relational(RelationalOperator::Ge, left, right)
    }

    pub fn is_in(left: Expression, right: Expression) -> Self {
        Self::relational(RelationalOperator::In, left, right)
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::Logical {
            op: LogicalOperator::And,
            operands: vec![left, right],
        }
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Logical {
            op: LogicalOperator::Or,
            operands: vec![left, right],
        }
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary(UnaryOperator::Not, operand)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary(UnaryOperator::IsNull, operand)
    }

    pub fn is_not_null(operand: Expression) -> Self {
        Self::unary(UnaryOperator::IsNotNull, operand)
    }

    /// Name of this node's kind, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Constant(_) => "Constant",
            Expression::Label(_) => "Label",
            Expression::Unary { .. } => "Unary",
            Expression::Arithmetic { .. } => "Arithmetic",
            Expression::Relational { .. } => "Relational",
            Expression::Logical { .. } => "Logical",
            Expression::List(_) => "List",
            Expression::Attribute { .. } => "Attribute",
            Expression::LabelAttribute(_) => "LabelAttribute",
            Expression::ListComprehension(_) => "ListComprehension",
            Expression::Predicate(_) => "Predicate",
            Expression::Reduce(_) => "Reduce",
        }
    }

    /// Direct sub-expressions, in field order
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Constant(_) | Expression::Label(_) | Expression::LabelAttribute(_) => {
                Vec::new()
            }
            Expression::Unary { operand, .. } => vec![&**operand],
            Expression::Arithmetic { left, right, .. }
            | Expression::Relational { left, right, .. } => vec![&**left, &**right],
            Expression::Logical { operands, .. } => operands.iter().collect(),
            Expression::List(items) => items.iter().collect(),
            Expression::Attribute { object, .. } => vec![&**object],
            Expression::ListComprehension(expr) => std::iter::once(expr.collection())
                .chain(expr.filter())
                .chain(expr.mapping())
                .collect(),
            Expression::Predicate(expr) => std::iter::once(expr.collection())
                .chain(expr.filter())
                .collect(),
            Expression::Reduce(expr) => vec![expr.initial(), expr.collection(), expr.mapping()],
        }
    }

    /// Check if this expression is a constant (references no names)
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Constant(_) => true,
            Expression::Label(_) | Expression::LabelAttribute(_) => false,
            Expression::Unary { operand, .. } => operand.is_constant(),
            Expression::Arithmetic { left, right, .. }
            | Expression::Relational { left, right, .. } => {
                left.is_constant() && right.is_constant()
            }
            Expression::Logical { operands, .. } => operands.iter().all(|e| e.is_constant()),
            Expression::List(items) => items.iter().all(|e| e.is_constant()),
            Expression::Attribute { object, .. } => object.is_constant(),
            // bodies reference their inner variable
            Expression::ListComprehension(_) | Expression::Predicate(_) | Expression::Reduce(_) => {
                false
            }
        }
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Constant(value)
    }
}

impl From<LabelExpr> for Expression {
    fn from(label: LabelExpr) -> Self {
        Expression::Label(label)
    }
}

impl From<LabelAttributeExpr> for Expression {
    fn from(expr: LabelAttributeExpr) -> Self {
        Expression::LabelAttribute(expr)
    }
}

impl From<ListComprehensionExpr> for Expression {
    fn from(expr: ListComprehensionExpr) -> Self {
        Expression::ListComprehension(expr)
    }
}

impl From<PredicateExpr> for Expression {
    fn from(expr: PredicateExpr) -> Self {
        Expression::Predicate(expr)
    }
}

impl From<ReduceExpr> for Expression {
    fn from(expr: ReduceExpr) -> Self {
        Expression::Reduce(expr)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expression], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(value) => write!(f, "{}", value),
            Expression::Label(label) => write!(f, "{}", label),
            Expression::Unary { op, operand } => {
                if op.is_postfix() {
                    write!(f, "{} {}", operand, op.as_str())
                } else {
                    write!(f, "{}({})", op.as_str(), operand)
                }
            }
            Expression::Arithmetic { op, left, right } => {
                write!(f, "({}{}{})", left, op.as_str(), right)
            }
            Expression::Relational { op, left, right } => {
                write!(f, "({}{}{})", left, op.as_str(), right)
            }
            Expression::Logical { op, operands } => {
                f.write_str("(")?;
                write_joined(f, operands, &format!(" {} ", op.as_str()))?;
                f.write_str(")")
            }
            Expression::List(items) => {
                f.write_str("[")?;
                write_joined(f, items, ", ")?;
                f.write_str("]")
            }
            Expression::Attribute { object, attribute } => write!(f, "{}.{}", object, attribute),
            Expression::LabelAttribute(expr) => write!(f, "{}", expr),
            Expression::ListComprehension(expr) => write!(f, "{}", expr),
            Expression::Predicate(expr) => write!(f, "{}", expr),
            Expression::Reduce(expr) => write!(f, "{}", expr),
        }
    }
}
