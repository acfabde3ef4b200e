//! Expression evaluation implementation.

use crate::datatypes::Value;
use crate::expression::comprehension::{
    ListComprehensionExpr, PredicateExpr, PredicateKind, ReduceExpr,
};
use crate::expression::context::{ExpressionContext, Scope};
use crate::expression::{
    ArithmeticOperator, Expression, ExpressionError, ExpressionResult, LogicalOperator,
    RelationalOperator, UnaryOperator,
};
use std::cmp::Ordering;

/// Evaluator for expressions
///
/// Holds no state besides the context, so one tree can be evaluated from
/// several threads at once, each with its own context.
pub struct ExpressionEvaluator<'a> {
    ctx: &'a dyn ExpressionContext,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new evaluator over the given context
    pub fn new(ctx: &'a dyn ExpressionContext) -> Self {
        Self { ctx }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Constant(value) => Ok(value.clone()),

            Expression::Label(label) => self.ctx.resolve(label.name()),

            Expression::Unary { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                self.evaluate_unary_op(*op, operand_val)
            }

            Expression::Arithmetic { op, left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                self.evaluate_arithmetic_op(*op, left_val, right_val)
            }

            Expression::Relational { op, left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                self.evaluate_relational_op(*op, left_val, right_val)
            }

            Expression::Logical { op, operands } => self.evaluate_logical_op(*op, operands),

            Expression::List(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<ExpressionResult<Vec<_>>>()
                .map(Value::List),

            Expression::Attribute { object, attribute } => {
                match self.evaluate(object)? {
                    Value::Map(mut entries) => {
                        Ok(entries.remove(attribute).unwrap_or(Value::Null))
                    }
                    Value::Null => Ok(Value::Null),
                    other => Err(ExpressionError::type_mismatch(
                        format!("attribute `{}'", attribute),
                        "MAP",
                        other.data_type(),
                    )),
                }
            }

            Expression::LabelAttribute(expr) => expr.unrewritten("evaluation"),

            Expression::ListComprehension(expr) => self.evaluate_list_comprehension(expr),

            Expression::Predicate(expr) => self.evaluate_predicate(expr),

            Expression::Reduce(expr) => self.evaluate_reduce(expr),
        }
    }

    /// Evaluate an expression with one extra binding layered over the context
    fn evaluate_in_scope(
        &self,
        expr: &Expression,
        name: &str,
        value: Value,
    ) -> ExpressionResult<Value> {
        let scope = Scope::new(self.ctx, name, value);
        ExpressionEvaluator::new(&scope).evaluate(expr)
    }

    /// `[x IN collection WHERE filter | mapping]`
    fn evaluate_list_comprehension(&self, expr: &ListComprehensionExpr) -> ExpressionResult<Value> {
        let collection = self.evaluate(expr.collection())?;
        let items = iterable(&collection)?;

        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let scope = Scope::new(self.ctx, expr.inner_var(), item.clone());
            let evaluator = ExpressionEvaluator::new(&scope);

            if let Some(filter) = expr.filter() {
                if !evaluator.evaluate(filter)?.is_truthy() {
                    continue;
                }
            }

            match expr.mapping() {
                Some(mapping) => result.push(evaluator.evaluate(mapping)?),
                None => result.push(item.clone()),
            }
        }
        Ok(Value::List(result))
    }

    /// Whether one element satisfies a quantifier's filter
    fn element_matches(&self, expr: &PredicateExpr, item: &Value) -> ExpressionResult<bool> {
        match expr.filter() {
            Some(filter) => Ok(self
                .evaluate_in_scope(filter, expr.inner_var(), item.clone())?
                .is_truthy()),
            None => Ok(item.is_truthy()),
        }
    }

    /// `all|any|single|none(x IN collection WHERE filter)` and `exists(collection)`.
    ///
    /// `all`, `any` and `none` stop at the first deciding element, `single`
    /// at the second match.
    fn evaluate_predicate(&self, expr: &PredicateExpr) -> ExpressionResult<Value> {
        let collection = self.evaluate(expr.collection())?;
        if expr.kind() == PredicateKind::Exists {
            return Ok(Value::Bool(!collection.is_empty()));
        }

        let items = iterable(&collection)?;
        let result = match expr.kind() {
            PredicateKind::All => {
                let mut all = true;
                for item in items {
                    if !self.element_matches(expr, item)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            PredicateKind::Any => {
                let mut any = false;
                for item in items {
                    if self.element_matches(expr, item)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            PredicateKind::Single => {
                let mut matched = 0usize;
                for item in items {
                    if self.element_matches(expr, item)? {
                        matched += 1;
                        if matched > 1 {
                            break;
                        }
                    }
                }
                matched == 1
            }
            PredicateKind::None => {
                let mut none = true;
                for item in items {
                    if self.element_matches(expr, item)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            PredicateKind::Exists => !collection.is_empty(),
        };
        Ok(Value::Bool(result))
    }

    /// `reduce(acc = initial, x IN collection | mapping)`
    fn evaluate_reduce(&self, expr: &ReduceExpr) -> ExpressionResult<Value> {
        let mut accumulator = self.evaluate(expr.initial())?;
        let collection = self.evaluate(expr.collection())?;

        for item in iterable(&collection)? {
            let acc_scope = Scope::new(self.ctx, expr.accumulator(), accumulator);
            let scope = Scope::new(&acc_scope, expr.inner_var(), item.clone());
            accumulator = ExpressionEvaluator::new(&scope).evaluate(expr.mapping())?;
        }
        Ok(accumulator)
    }

    /// Evaluate a logical connective with three-valued logic
    fn evaluate_logical_op(
        &self,
        op: LogicalOperator,
        operands: &[Expression],
    ) -> ExpressionResult<Value> {
        let mut saw_null = false;
        let mut parity = false;

        for operand in operands {
            let value = self.evaluate(operand)?;
            let b = match value {
                Value::Bool(b) => b,
                Value::Null => {
                    saw_null = true;
                    continue;
                }
                other => {
                    return Err(ExpressionError::InvalidOperandTypes {
                        operator: op.as_str(),
                        left: other.data_type(),
                        right: None,
                    })
                }
            };
            match op {
                // false AND NULL = false, true OR NULL = true
                LogicalOperator::And if !b => return Ok(Value::Bool(false)),
                LogicalOperator::Or if b => return Ok(Value::Bool(true)),
                LogicalOperator::Xor => parity ^= b,
                _ => {}
            }
        }

        if saw_null {
            return Ok(Value::Null);
        }
        Ok(Value::Bool(match op {
            LogicalOperator::And => true,
            LogicalOperator::Or => false,
            LogicalOperator::Xor => parity,
        }))
    }

    /// Evaluate a binary arithmetic operation
    fn evaluate_arithmetic_op(
        &self,
        op: ArithmeticOperator,
        left: Value,
        right: Value,
    ) -> ExpressionResult<Value> {
        // NULL propagates through arithmetic
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }

        match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => match op {
                ArithmeticOperator::Add => Ok(Value::Int(a.wrapping_add(*b))),
                ArithmeticOperator::Sub => Ok(Value::Int(a.wrapping_sub(*b))),
                ArithmeticOperator::Mul => Ok(Value::Int(a.wrapping_mul(*b))),
                ArithmeticOperator::Div if *b == 0 => Err(ExpressionError::DivisionByZero),
                ArithmeticOperator::Div => Ok(Value::Int(a.wrapping_div(*b))),
                ArithmeticOperator::Mod if *b == 0 => Err(ExpressionError::DivisionByZero),
                ArithmeticOperator::Mod => Ok(Value::Int(a.wrapping_rem(*b))),
            },

            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let (a, b) = (as_float(&left), as_float(&right));
                Ok(Value::Float(match op {
                    ArithmeticOperator::Add => a + b,
                    ArithmeticOperator::Sub => a - b,
                    ArithmeticOperator::Mul => a * b,
                    ArithmeticOperator::Div => a / b,
                    ArithmeticOperator::Mod => a % b,
                }))
            }

            (Value::String(a), Value::String(b)) if op == ArithmeticOperator::Add => {
                Ok(Value::String(format!("{}{}", a, b)))
            }

            (Value::List(a), Value::List(b)) if op == ArithmeticOperator::Add => {
                Ok(Value::List(a.iter().chain(b).cloned().collect()))
            }

            _ => Err(ExpressionError::InvalidOperandTypes {
                operator: op.as_str(),
                left: left.data_type(),
                right: Some(right.data_type()),
            }),
        }
    }

    /// Evaluate a comparison
    fn evaluate_relational_op(
        &self,
        op: RelationalOperator,
        left: Value,
        right: Value,
    ) -> ExpressionResult<Value> {
        if op == RelationalOperator::In {
            return self.evaluate_membership(left, right);
        }

        // Comparisons with NULL are NULL (three-valued logic)
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }

        match op {
            RelationalOperator::Eq => Ok(Value::Bool(left.loose_eq(&right))),
            RelationalOperator::Ne => Ok(Value::Bool(!left.loose_eq(&right))),
            RelationalOperator::Lt => self.compare_values(op, &left, &right, |ord| ord.is_lt()),
            RelationalOperator::Le => self.compare_values(op, &left, &right, |ord| ord.is_le()),
            RelationalOperator::Gt => self.compare_values(op, &left, &right, |ord| ord.is_gt()),
            RelationalOperator::Ge => self.compare_values(op, &left, &right, |ord| ord.is_ge()),
            RelationalOperator::In => self.evaluate_membership(left, right),
        }
    }

    /// `left IN right`
    fn evaluate_membership(&self, left: Value, right: Value) -> ExpressionResult<Value> {
        match right {
            Value::Null => Ok(Value::Null),
            Value::List(items) => {
                if left.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::Bool(items.iter().any(|item| item.loose_eq(&left))))
            }
            other => Err(ExpressionError::type_mismatch(
                "right operand of IN",
                "LIST",
                other.data_type(),
            )),
        }
    }

    /// Compare two values and apply a comparison function
    fn compare_values<F>(
        &self,
        op: RelationalOperator,
        left: &Value,
        right: &Value,
        cmp_fn: F,
    ) -> ExpressionResult<Value>
    where
        F: FnOnce(Ordering) -> bool,
    {
        match left.partial_order(right) {
            Some(ord) => Ok(Value::Bool(cmp_fn(ord))),
            None => Err(ExpressionError::InvalidOperandTypes {
                operator: op.as_str(),
                left: left.data_type(),
                right: Some(right.data_type()),
            }),
        }
    }

    /// Evaluate a unary operation
    fn evaluate_unary_op(&self, op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
        match op {
            UnaryOperator::Not => match operand {
                Value::Null => Ok(Value::Null),
                Value::Bool(b) => Ok(Value::Bool(!b)),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str(),
                    left: operand.data_type(),
                    right: None,
                }),
            },

            UnaryOperator::Plus => match operand {
                Value::Null | Value::Int(_) | Value::Float(_) => Ok(operand),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str(),
                    left: operand.data_type(),
                    right: None,
                }),
            },

            UnaryOperator::Minus => match operand {
                Value::Null => Ok(Value::Null),
                Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
                Value::Float(f) => Ok(Value::Float(-f)),
                _ => Err(ExpressionError::InvalidOperandTypes {
                    operator: op.as_str(),
                    left: operand.data_type(),
                    right: None,
                }),
            },

            UnaryOperator::IsNull => Ok(Value::Bool(operand.is_null())),
            UnaryOperator::IsNotNull => Ok(Value::Bool(!operand.is_null())),
            UnaryOperator::IsEmpty => Ok(Value::Bool(operand.is_empty())),
            UnaryOperator::IsNotEmpty => Ok(Value::Bool(!operand.is_empty())),
        }
    }
}

/// Elements of a comprehension's collection; NULL iterates as empty
fn iterable(collection: &Value) -> ExpressionResult<&[Value]> {
    collection
        .as_iterable()
        .ok_or_else(|| ExpressionError::type_mismatch("collection", "LIST", collection.data_type()))
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

/// Helper function to evaluate an expression against a context
pub fn evaluate_expression(
    expr: &Expression,
    ctx: &dyn ExpressionContext,
) -> ExpressionResult<Value> {
    ExpressionEvaluator::new(ctx).evaluate(expr)
}

impl Expression {
    /// Evaluate this expression against a context.
    ///
    /// # Panics
    ///
    /// Panics if the tree still contains a [`Expression::LabelAttribute`];
    /// run the label attribute rewrite first.
    pub fn evaluate(&self, ctx: &dyn ExpressionContext) -> ExpressionResult<Value> {
        evaluate_expression(self, ctx)
    }
}
