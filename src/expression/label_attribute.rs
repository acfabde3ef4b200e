//! Bare identifiers and the parse-time `label.label` placeholder.

use std::fmt;

/// A bare identifier, e.g. a variable or alias name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelExpr {
    name: String,
}

impl LabelExpr {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_name(self) -> String {
        self.name
    }
}

impl fmt::Display for LabelExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `label.label`, produced by the parser when it cannot yet tell a property
/// lookup from an alias-qualified reference.
///
/// Only equality, rendering and visiting are defined. The node must be
/// replaced by a rewrite pass before the tree is evaluated or encoded; doing
/// either on an unrewritten tree panics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelAttributeExpr {
    left: LabelExpr,
    right: LabelExpr,
}

impl LabelAttributeExpr {
    pub fn new(left: LabelExpr, right: LabelExpr) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &LabelExpr {
        &self.left
    }

    pub fn right(&self) -> &LabelExpr {
        &self.right
    }

    pub fn left_mut(&mut self) -> &mut LabelExpr {
        &mut self.left
    }

    pub fn right_mut(&mut self) -> &mut LabelExpr {
        &mut self.right
    }

    pub fn into_parts(self) -> (LabelExpr, LabelExpr) {
        (self.left, self.right)
    }

    /// Abort on a tree that skipped the label attribute rewrite
    pub(crate) fn unrewritten(&self, operation: &str) -> ! {
        panic!(
            "LabelAttributeExpression `{}' has to be rewritten before {}",
            self, operation
        )
    }
}

impl fmt::Display for LabelAttributeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_attribute_equality() {
        let a = LabelAttributeExpr::new(LabelExpr::new("v"), LabelExpr::new("name"));
        let b = LabelAttributeExpr::new(LabelExpr::new("v"), LabelExpr::new("name"));
        let c = LabelAttributeExpr::new(LabelExpr::new("v"), LabelExpr::new("age"));
        let d = LabelAttributeExpr::new(LabelExpr::new("name"), LabelExpr::new("v"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_label_attribute_display() {
        let expr = LabelAttributeExpr::new(LabelExpr::new("player"), LabelExpr::new("age"));
        assert_eq!(expr.to_string(), "player.age");
        assert_eq!(expr.left().name(), "player");
        assert_eq!(expr.right().name(), "age");
    }

    #[test]
    #[should_panic(expected = "has to be rewritten before evaluation")]
    fn test_unrewritten_panics() {
        let expr = LabelAttributeExpr::new(LabelExpr::new("v"), LabelExpr::new("name"));
        expr.unrewritten("evaluation");
    }
}
