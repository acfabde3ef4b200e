//! Tree rewrite passes run between parsing and evaluation.

use crate::expression::comprehension::{ListComprehensionExpr, PredicateExpr, ReduceExpr};
use crate::expression::label_attribute::{LabelAttributeExpr, LabelExpr};
use crate::expression::visitor::{walk_list_comprehension, walk_predicate, walk_reduce};
use crate::expression::{ExprVisitor, Expression, ExpressionError, ExpressionResult, Visit};
use log::debug;

/// Resolves every `a.b` placeholder into an attribute lookup on label `a`
#[derive(Debug, Default)]
pub struct LabelAttributeRewriter {
    rewritten: usize,
}

impl LabelAttributeRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of placeholders replaced so far
    pub fn rewritten(&self) -> usize {
        self.rewritten
    }
}

impl ExprVisitor for LabelAttributeRewriter {
    fn visit_label_attribute(&mut self, expr: &mut LabelAttributeExpr) -> Visit {
        debug!("rewriting label attribute {}", expr);
        self.rewritten += 1;
        let object = Expression::Label(expr.left().clone());
        Visit::Replace(Expression::attribute(object, expr.right().name()))
    }
}

/// Run [`LabelAttributeRewriter`] over a tree, returning how many nodes it
/// replaced
pub fn rewrite_label_attributes(expr: &mut Expression) -> usize {
    let mut rewriter = LabelAttributeRewriter::new();
    // a replaced root is counted like any other node
    let _ = expr.accept(&mut rewriter);
    rewriter.rewritten()
}

/// Renames free occurrences of a label.
///
/// Inside a comprehension that rebinds the old name only the parts evaluated
/// outside the inner scope are renamed; the body refers to the inner
/// variable and is left alone.
#[derive(Debug)]
pub struct LabelRenamer {
    from: String,
    to: String,
    renamed: usize,
}

impl LabelRenamer {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            renamed: 0,
        }
    }

    pub fn renamed(&self) -> usize {
        self.renamed
    }
}

impl ExprVisitor for LabelRenamer {
    fn visit_label(&mut self, label: &mut LabelExpr) -> Visit {
        if label.name() != self.from {
            return Visit::Continue;
        }
        self.renamed += 1;
        Visit::Replace(Expression::label(self.to.clone()))
    }

    fn visit_list_comprehension(&mut self, expr: &mut ListComprehensionExpr) -> Visit {
        if expr.inner_var() == self.from {
            let _ = expr.collection_mut().accept(self);
        } else {
            walk_list_comprehension(self, expr);
        }
        Visit::Continue
    }

    fn visit_predicate(&mut self, expr: &mut PredicateExpr) -> Visit {
        if expr.has_inner_var() && expr.inner_var() == self.from {
            let _ = expr.collection_mut().accept(self);
        } else {
            walk_predicate(self, expr);
        }
        Visit::Continue
    }

    fn visit_reduce(&mut self, expr: &mut ReduceExpr) -> Visit {
        if expr.inner_var() == self.from || expr.accumulator() == self.from {
            let _ = expr.initial_mut().accept(self);
            let _ = expr.collection_mut().accept(self);
        } else {
            walk_reduce(self, expr);
        }
        Visit::Continue
    }
}

impl Expression {
    /// Check that no rewrite-only node is left in the tree.
    ///
    /// Unlike evaluating or encoding such a tree, this reports the problem
    /// as an error instead of panicking.
    pub fn ensure_resolved(&self) -> ExpressionResult<()> {
        let mut pending = vec![self];
        while let Some(expr) = pending.pop() {
            if let Expression::LabelAttribute(_) = expr {
                return Err(ExpressionError::UnsupportedNode {
                    kind: expr.kind_name(),
                });
            }
            pending.extend(expr.children());
        }
        Ok(())
    }

    /// Inner variables (and reduce accumulators) introduced anywhere in the
    /// tree, outermost first
    pub fn inner_vars(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        let mut pending = vec![self];
        while let Some(expr) = pending.pop() {
            match expr {
                Expression::ListComprehension(e) => vars.push(e.inner_var()),
                Expression::Predicate(e) if e.has_inner_var() => vars.push(e.inner_var()),
                Expression::Reduce(e) => {
                    vars.push(e.accumulator());
                    vars.push(e.inner_var());
                }
                _ => {}
            }
            pending.extend(expr.children().into_iter().rev());
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Value;
    use crate::expression::VariableContext;
    use std::collections::BTreeMap;

    fn player_names() -> Expression {
        // [p IN players WHERE p.age > 30 | p.name]
        ListComprehensionExpr::new("p", Expression::label("players"))
            .unwrap()
            .with_filter(Expression::gt(
                Expression::label_attribute("p", "age"),
                Expression::int(30),
            ))
            .with_mapping(Expression::label_attribute("p", "name"))
            .into()
    }

    fn player(name: &str, age: i64) -> Value {
        let mut props = BTreeMap::new();
        props.insert("name".to_string(), Value::string(name));
        props.insert("age".to_string(), Value::Int(age));
        Value::Map(props)
    }

    #[test]
    fn test_rewrite_label_attributes() {
        let mut expr = player_names();
        assert!(expr.ensure_resolved().is_err());

        assert_eq!(rewrite_label_attributes(&mut expr), 2);
        assert!(expr.ensure_resolved().is_ok());
        assert_eq!(expr.to_string(), "[p IN players WHERE (p.age>30) | p.name]");

        let ctx = VariableContext::new().with_var(
            "players",
            Value::list(vec![player("Tim", 42), player("Tony", 28), player("Ann", 35)]),
        );
        assert_eq!(
            expr.evaluate(&ctx).unwrap(),
            Value::list(vec![Value::string("Tim"), Value::string("Ann")])
        );
    }

    #[test]
    fn test_rewrite_root_placeholder() {
        let mut expr = Expression::label_attribute("v", "name");
        assert_eq!(rewrite_label_attributes(&mut expr), 1);
        assert_eq!(
            expr,
            Expression::attribute(Expression::label("v"), "name")
        );
    }

    #[test]
    fn test_ensure_resolved_reports_kind() {
        let expr = Expression::and(
            Expression::bool(true),
            Expression::is_null(Expression::label_attribute("e", "start")),
        );
        assert_eq!(
            expr.ensure_resolved(),
            Err(ExpressionError::UnsupportedNode {
                kind: "LabelAttribute"
            })
        );
        assert!(Expression::int(1).ensure_resolved().is_ok());
    }

    #[test]
    fn test_label_renamer_respects_shadowing() {
        // [x IN x | x + y]: only the collection refers to the outer `x`
        let mut expr: Expression = ListComprehensionExpr::new("x", Expression::label("x"))
            .unwrap()
            .with_mapping(Expression::add(Expression::label("x"), Expression::label("y")))
            .into();
        let mut renamer = LabelRenamer::new("x", "xs");
        let _ = expr.accept(&mut renamer);
        assert_eq!(renamer.renamed(), 1);
        assert_eq!(expr.to_string(), "[x IN xs | (x+y)]");

        let mut renamer = LabelRenamer::new("y", "z");
        let _ = expr.accept(&mut renamer);
        assert_eq!(renamer.renamed(), 1);
        assert_eq!(expr.to_string(), "[x IN xs | (x+z)]");
    }

    #[test]
    fn test_label_renamer_reduce() {
        let mut expr: Expression = ReduceExpr::new(
            "acc",
            Expression::label("acc"),
            "x",
            Expression::label("x"),
            Expression::add(Expression::label("acc"), Expression::label("x")),
        )
        .unwrap()
        .into();
        let mut renamer = LabelRenamer::new("acc", "start");
        let _ = expr.accept(&mut renamer);
        assert_eq!(renamer.renamed(), 1);
        assert_eq!(expr.to_string(), "reduce(acc = start, x IN x | (acc+x))");
    }

    #[test]
    fn test_inner_vars() {
        let inner: Expression = PredicateExpr::new(
            "any",
            "y",
            Expression::label("ys"),
            Some(Expression::eq(Expression::label("y"), Expression::label("x"))),
        )
        .unwrap()
        .into();
        let expr: Expression = ListComprehensionExpr::new("x", Expression::label("xs"))
            .unwrap()
            .with_filter(inner)
            .with_mapping(
                ReduceExpr::new(
                    "acc",
                    Expression::int(0),
                    "z",
                    Expression::label("zs"),
                    Expression::label("acc"),
                )
                .unwrap()
                .into(),
            )
            .into();
        assert_eq!(expr.inner_vars(), vec!["x", "y", "acc", "z"]);
        assert!(Expression::from(PredicateExpr::exists(Expression::label("a")))
            .inner_vars()
            .is_empty());
    }
}
