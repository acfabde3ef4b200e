//! Name resolution for expression evaluation.
//!
//! A root [`VariableContext`] holds the ambient bindings of a query row.
//! Comprehension-style expressions layer a [`Scope`] on top of it for each
//! iteration; the scope borrows its parent and is dropped before the next
//! iteration starts, so the parent is never mutated.

use crate::datatypes::Value;
use crate::expression::{ExpressionError, ExpressionResult};
use std::collections::HashMap;

/// Resolves variable names to values during evaluation
pub trait ExpressionContext {
    /// Look up a name, falling through any enclosing scopes
    fn lookup(&self, name: &str) -> Option<&Value>;

    /// Like [`lookup`](Self::lookup), but unbound names are an error
    fn resolve(&self, name: &str) -> ExpressionResult<Value> {
        self.lookup(name)
            .cloned()
            .ok_or_else(|| ExpressionError::UnboundVariable {
                name: name.to_string(),
            })
    }

    /// Create a child scope in which `name` resolves to `value`
    fn with_binding<'a>(&'a self, name: &'a str, value: Value) -> Scope<'a>
    where
        Self: Sized,
    {
        Scope::new(self, name, value)
    }
}

/// Root context backed by a map of named values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableContext {
    variables: HashMap<String, Value>,
}

impl VariableContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding, handy for tests and one-off evaluations
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl ExpressionContext for VariableContext {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

/// A single shadowing binding over a parent context
pub struct Scope<'a> {
    parent: &'a dyn ExpressionContext,
    name: &'a str,
    value: Value,
}

impl<'a> Scope<'a> {
    pub fn new(parent: &'a dyn ExpressionContext, name: &'a str, value: Value) -> Self {
        Self {
            parent,
            name,
            value,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Drop the scope and return the value it bound
    pub fn into_value(self) -> Value {
        self.value
    }
}

impl ExpressionContext for Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        if name == self.name {
            Some(&self.value)
        } else {
            self.parent.lookup(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_context() {
        let ctx = VariableContext::new()
            .with_var("n", Value::Int(1))
            .with_var("name", "Tim");

        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.resolve("n").unwrap(), Value::Int(1));
        assert_eq!(ctx.resolve("name").unwrap(), Value::string("Tim"));
        assert_eq!(
            ctx.resolve("missing"),
            Err(ExpressionError::UnboundVariable {
                name: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_scope_shadows_parent() {
        let ctx = VariableContext::new()
            .with_var("x", Value::Int(1))
            .with_var("y", Value::Int(2));

        {
            let scope = ctx.with_binding("x", Value::Int(10));
            assert_eq!(scope.resolve("x").unwrap(), Value::Int(10));
            assert_eq!(scope.resolve("y").unwrap(), Value::Int(2));

            let nested = scope.with_binding("y", Value::Int(20));
            assert_eq!(nested.resolve("x").unwrap(), Value::Int(10));
            assert_eq!(nested.resolve("y").unwrap(), Value::Int(20));
        }

        assert_eq!(ctx.resolve("x").unwrap(), Value::Int(1));
        assert_eq!(ctx.resolve("y").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_scope_introduces_new_name() {
        let ctx = VariableContext::new();
        let scope = ctx.with_binding("acc", Value::Int(0));
        assert_eq!(scope.name(), "acc");
        assert_eq!(scope.value(), &Value::Int(0));
        assert_eq!(scope.resolve("acc").unwrap(), Value::Int(0));
        assert!(ctx.resolve("acc").is_err());
        assert_eq!(scope.into_value(), Value::Int(0));
    }
}
