//! Expression trees for graph queries.
//!
//! This module provides:
//! - The expression AST, including the comprehension family
//!   (list comprehension, quantified predicates and reduce)
//! - Evaluation against a scoped variable context
//! - A visitor protocol and the rewrite passes built on it
//! - A binary wire codec

pub mod codec;
pub mod comprehension;
pub mod context;
pub mod error;
pub mod eval;
pub mod expr;
pub mod label_attribute;
pub mod operator;
pub mod rewrite;
pub mod visitor;

pub use codec::{decode, decode_with, encode, encode_into, DecodeOptions, WIRE_FORMAT_VERSION};
pub use comprehension::{ListComprehensionExpr, PredicateExpr, PredicateKind, ReduceExpr};
pub use context::{ExpressionContext, Scope, VariableContext};
pub use error::{ExpressionError, ExpressionResult};
pub use eval::{evaluate_expression, ExpressionEvaluator};
pub use expr::Expression;
pub use label_attribute::{LabelAttributeExpr, LabelExpr};
pub use operator::{ArithmeticOperator, LogicalOperator, RelationalOperator, UnaryOperator};
pub use rewrite::{rewrite_label_attributes, LabelAttributeRewriter, LabelRenamer};
pub use visitor::{ExprVisitor, Visit};
