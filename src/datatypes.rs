//! Runtime values consumed and produced by expression evaluation.
//!
//! This module provides:
//!
//! - **Value**: Tagged union of everything an expression can evaluate to
//! - **DataType**: One-byte tags naming each value shape
//! - **DataSet**: Tabular result rows carried by query responses
//!
//! Containers here only answer the questions evaluation asks of them
//! (iteration order, emptiness, truthiness); they are not a storage format.

pub mod dataset;
pub mod value;

pub use dataset::{DataSet, Row};
pub use value::{DataType, Value};
