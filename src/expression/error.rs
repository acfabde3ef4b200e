//! Error types for expression construction, evaluation and decoding.

use crate::datatypes::DataType;
use thiserror::Error;

/// Errors that can occur while building, evaluating or decoding expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Malformed node rejected at build time
    #[error("Invalid expression: {reason}")]
    Construction { reason: String },

    /// Name not bound in the evaluation context
    #[error("Variable `{name}' is not defined")]
    UnboundVariable { name: String },

    /// A sub-expression produced a value of the wrong shape
    #[error("Type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        actual: DataType,
    },

    /// Invalid operand types for operator
    #[error(
        "Invalid operand types for operator {operator}: left={left}, right={}",
        operand_type_name(.right)
    )]
    InvalidOperandTypes {
        operator: &'static str,
        left: DataType,
        right: Option<DataType>,
    },

    #[error("Division by zero")]
    DivisionByZero,

    /// Node kind that has no evaluable or encodable form
    #[error("Unsupported expression kind: {kind}")]
    UnsupportedNode { kind: &'static str },

    /// Tree that does not fit the wire format
    #[error("Failed to encode expression: {reason}")]
    Encode { reason: String },

    /// Malformed wire bytes
    #[error("Failed to decode expression: {reason}")]
    Decode { reason: String },
}

/// Missing right operand of a unary operator renders as `NONE`
fn operand_type_name(data_type: &Option<DataType>) -> &'static str {
    data_type.map_or("NONE", |t| t.as_str())
}

impl ExpressionError {
    pub(crate) fn type_mismatch(
        context: impl Into<String>,
        expected: &'static str,
        actual: DataType,
    ) -> Self {
        ExpressionError::TypeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        ExpressionError::Decode {
            reason: reason.into(),
        }
    }
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExpressionError::type_mismatch("collection", "LIST", DataType::Int);
        assert_eq!(
            err.to_string(),
            "Type mismatch in collection: expected LIST, got INT"
        );

        let err = ExpressionError::InvalidOperandTypes {
            operator: "+",
            left: DataType::Int,
            right: Some(DataType::String),
        };
        assert_eq!(
            err.to_string(),
            "Invalid operand types for operator +: left=INT, right=STRING"
        );

        let err = ExpressionError::InvalidOperandTypes {
            operator: "-",
            left: DataType::Bool,
            right: None,
        };
        assert_eq!(
            err.to_string(),
            "Invalid operand types for operator -: left=BOOL, right=NONE"
        );

        let err = ExpressionError::UnboundVariable {
            name: "n".to_string(),
        };
        assert_eq!(err.to_string(), "Variable `n' is not defined");

        let err = ExpressionError::UnsupportedNode {
            kind: "LabelAttribute",
        };
        assert_eq!(
            err.to_string(),
            "Unsupported expression kind: LabelAttribute"
        );

        assert_eq!(ExpressionError::DivisionByZero.to_string(), "Division by zero");
    }
}
