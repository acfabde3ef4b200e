//! Binary wire format for expression trees.
//!
//! A buffer starts with [`WIRE_FORMAT_VERSION`] followed by the root node.
//! Every node is a kind tag byte followed by its fields in declaration order:
//!
//! - integers are big-endian, strings are a `u32` byte length then UTF-8
//! - optional children carry a presence byte (0 = absent, 1 = present)
//! - lists carry a `u32` element count
//! - constants are a [`DataType`] tag followed by the payload
//!
//! [`LabelAttributeExpr`](crate::expression::LabelAttributeExpr) has a
//! reserved tag but no encoding; encoding one panics and decoding the
//! reserved tag fails with [`ExpressionError::UnsupportedNode`].

use crate::datatypes::{DataType, Value};
use crate::expression::comprehension::{
    ListComprehensionExpr, PredicateExpr, PredicateKind, ReduceExpr,
};
use crate::expression::operator::{
    ArithmeticOperator, LogicalOperator, RelationalOperator, UnaryOperator,
};
use crate::expression::{Expression, ExpressionError, ExpressionResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::trace;
use std::collections::BTreeMap;

pub const WIRE_FORMAT_VERSION: u8 = 1;

const TAG_CONSTANT: u8 = 1;
const TAG_LABEL: u8 = 2;
const TAG_UNARY: u8 = 3;
const TAG_ARITHMETIC: u8 = 4;
const TAG_RELATIONAL: u8 = 5;
const TAG_LOGICAL: u8 = 6;
const TAG_LIST: u8 = 7;
const TAG_ATTRIBUTE: u8 = 8;
const TAG_LABEL_ATTRIBUTE: u8 = 9;
const TAG_LIST_COMPREHENSION: u8 = 10;
const TAG_PREDICATE: u8 = 11;
const TAG_REDUCE: u8 = 12;

/// Limits applied while decoding untrusted bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest nesting of nodes and constant values accepted
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { max_depth: 512 }
    }
}

/// Encode a tree into a fresh buffer.
///
/// Fails with [`ExpressionError::Encode`] if a string or list is too long
/// for its `u32` length prefix.
///
/// # Panics
///
/// Panics if the tree still contains a label attribute placeholder.
pub fn encode(expr: &Expression) -> ExpressionResult<Bytes> {
    let mut buf = BytesMut::new();
    encode_into(expr, &mut buf)?;
    trace!("encoded {} into {} bytes", expr.kind_name(), buf.len());
    Ok(buf.freeze())
}

/// Append the encoding of `expr`, version byte included, to `buf`
pub fn encode_into(expr: &Expression, buf: &mut BytesMut) -> ExpressionResult<()> {
    buf.put_u8(WIRE_FORMAT_VERSION);
    put_expr(buf, expr)
}

/// Decode a tree using the default [`DecodeOptions`]
pub fn decode(bytes: &[u8]) -> ExpressionResult<Expression> {
    decode_with(bytes, &DecodeOptions::default())
}

pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> ExpressionResult<Expression> {
    let mut decoder = Decoder {
        buf: bytes,
        max_depth: options.max_depth,
        depth: 0,
    };
    let version = decoder.get_u8()?;
    if version != WIRE_FORMAT_VERSION {
        return Err(ExpressionError::decode(format!(
            "unsupported wire format version {}",
            version
        )));
    }
    let expr = decoder.expr()?;
    if decoder.buf.has_remaining() {
        return Err(ExpressionError::decode(format!(
            "{} trailing bytes after expression",
            decoder.buf.remaining()
        )));
    }
    trace!("decoded {} from {} bytes", expr.kind_name(), bytes.len());
    Ok(expr)
}

fn put_str(buf: &mut BytesMut, s: &str) -> ExpressionResult<()> {
    put_len(buf, s.len())?;
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn put_len(buf: &mut BytesMut, len: usize) -> ExpressionResult<()> {
    let len = u32::try_from(len).map_err(|_| ExpressionError::Encode {
        reason: format!("length {} does not fit the u32 prefix", len),
    })?;
    buf.put_u32(len);
    Ok(())
}

fn put_optional_expr(buf: &mut BytesMut, expr: Option<&Expression>) -> ExpressionResult<()> {
    match expr {
        Some(expr) => {
            buf.put_u8(1);
            put_expr(buf, expr)
        }
        None => {
            buf.put_u8(0);
            Ok(())
        }
    }
}

fn put_optional_str(buf: &mut BytesMut, s: Option<&str>) -> ExpressionResult<()> {
    match s {
        Some(s) => {
            buf.put_u8(1);
            put_str(buf, s)
        }
        None => {
            buf.put_u8(0);
            Ok(())
        }
    }
}

fn put_value(buf: &mut BytesMut, value: &Value) -> ExpressionResult<()> {
    buf.put_u8(value.data_type() as u8);
    match value {
        Value::Null => {}
        Value::Bool(b) => buf.put_u8(*b as u8),
        Value::Int(n) => buf.put_i64(*n),
        Value::Float(x) => buf.put_f64(*x),
        Value::String(s) => put_str(buf, s)?,
        Value::List(items) => {
            put_len(buf, items.len())?;
            for item in items {
                put_value(buf, item)?;
            }
        }
        Value::Map(entries) => {
            put_len(buf, entries.len())?;
            for (key, item) in entries {
                put_str(buf, key)?;
                put_value(buf, item)?;
            }
        }
    }
    Ok(())
}

fn put_exprs(buf: &mut BytesMut, exprs: &[Expression]) -> ExpressionResult<()> {
    put_len(buf, exprs.len())?;
    for expr in exprs {
        put_expr(buf, expr)?;
    }
    Ok(())
}

fn put_expr(buf: &mut BytesMut, expr: &Expression) -> ExpressionResult<()> {
    match expr {
        Expression::Constant(value) => {
            buf.put_u8(TAG_CONSTANT);
            put_value(buf, value)
        }
        Expression::Label(label) => {
            buf.put_u8(TAG_LABEL);
            put_str(buf, label.name())
        }
        Expression::Unary { op, operand } => {
            buf.put_u8(TAG_UNARY);
            buf.put_u8(*op as u8);
            put_expr(buf, operand)
        }
        Expression::Arithmetic { op, left, right } => {
            buf.put_u8(TAG_ARITHMETIC);
            buf.put_u8(*op as u8);
            put_expr(buf, left)?;
            put_expr(buf, right)
        }
        Expression::Relational { op, left, right } => {
            buf.put_u8(TAG_RELATIONAL);
            buf.put_u8(*op as u8);
            put_expr(buf, left)?;
            put_expr(buf, right)
        }
        Expression::Logical { op, operands } => {
            buf.put_u8(TAG_LOGICAL);
            buf.put_u8(*op as u8);
            put_exprs(buf, operands)
        }
        Expression::List(items) => {
            buf.put_u8(TAG_LIST);
            put_exprs(buf, items)
        }
        Expression::Attribute { object, attribute } => {
            buf.put_u8(TAG_ATTRIBUTE);
            put_expr(buf, object)?;
            put_str(buf, attribute)
        }
        Expression::LabelAttribute(expr) => expr.unrewritten("encoding"),
        Expression::ListComprehension(expr) => {
            buf.put_u8(TAG_LIST_COMPREHENSION);
            put_str(buf, expr.inner_var())?;
            put_expr(buf, expr.collection())?;
            put_optional_expr(buf, expr.filter())?;
            put_optional_expr(buf, expr.mapping())?;
            put_optional_str(buf, expr.origin_string())
        }
        Expression::Predicate(expr) => {
            buf.put_u8(TAG_PREDICATE);
            buf.put_u8(expr.kind() as u8);
            put_str(buf, expr.inner_var())?;
            put_expr(buf, expr.collection())?;
            put_optional_expr(buf, expr.filter())?;
            put_optional_str(buf, expr.origin_string())
        }
        Expression::Reduce(expr) => {
            buf.put_u8(TAG_REDUCE);
            put_str(buf, expr.accumulator())?;
            put_expr(buf, expr.initial())?;
            put_str(buf, expr.inner_var())?;
            put_expr(buf, expr.collection())?;
            put_expr(buf, expr.mapping())?;
            put_optional_str(buf, expr.origin_string())
        }
    }
}

struct Decoder<'a> {
    buf: &'a [u8],
    max_depth: usize,
    depth: usize,
}

impl Decoder<'_> {
    fn need(&self, n: usize, what: &str) -> ExpressionResult<()> {
        if self.buf.remaining() < n {
            return Err(ExpressionError::decode(format!(
                "truncated input reading {}: need {} bytes, have {}",
                what,
                n,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    fn get_u8(&mut self) -> ExpressionResult<u8> {
        self.need(1, "byte")?;
        Ok(self.buf.get_u8())
    }

    fn get_len(&mut self) -> ExpressionResult<usize> {
        self.need(4, "length")?;
        Ok(self.buf.get_u32() as usize)
    }

    fn get_str(&mut self) -> ExpressionResult<String> {
        let len = self.get_len()?;
        self.need(len, "string")?;
        let (head, tail) = self.buf.split_at(len);
        let s = std::str::from_utf8(head)
            .map_err(|e| ExpressionError::decode(format!("invalid UTF-8: {}", e)))?
            .to_string();
        self.buf = tail;
        Ok(s)
    }

    fn get_present(&mut self) -> ExpressionResult<bool> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ExpressionError::decode(format!(
                "invalid presence byte {}",
                other
            ))),
        }
    }

    fn enter(&mut self) -> ExpressionResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ExpressionError::decode(format!(
                "nesting exceeds maximum depth {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> ExpressionResult<Expression> {
        self.enter()?;
        let expr = self.expr_body()?;
        self.leave();
        Ok(expr)
    }

    fn optional_expr(&mut self) -> ExpressionResult<Option<Expression>> {
        if self.get_present()? {
            self.expr().map(Some)
        } else {
            Ok(None)
        }
    }

    fn optional_str(&mut self) -> ExpressionResult<Option<String>> {
        if self.get_present()? {
            self.get_str().map(Some)
        } else {
            Ok(None)
        }
    }

    fn exprs(&mut self) -> ExpressionResult<Vec<Expression>> {
        let count = self.get_len()?;
        // every node takes at least one byte
        self.need(count, "list elements")?;
        (0..count).map(|_| self.expr()).collect()
    }

    fn op<T>(&mut self, from_u8: fn(u8) -> Option<T>, what: &str) -> ExpressionResult<T> {
        let tag = self.get_u8()?;
        from_u8(tag).ok_or_else(|| ExpressionError::decode(format!("unknown {} {}", what, tag)))
    }

    fn expr_body(&mut self) -> ExpressionResult<Expression> {
        let tag = self.get_u8()?;
        let expr = match tag {
            TAG_CONSTANT => Expression::Constant(self.value()?),
            TAG_LABEL => Expression::label(self.get_str()?),
            TAG_UNARY => {
                let op = self.op(UnaryOperator::from_u8, "unary operator")?;
                Expression::unary(op, self.expr()?)
            }
            TAG_ARITHMETIC => {
                let op = self.op(ArithmeticOperator::from_u8, "arithmetic operator")?;
                let left = self.expr()?;
                Expression::arithmetic(op, left, self.expr()?)
            }
            TAG_RELATIONAL => {
                let op = self.op(RelationalOperator::from_u8, "relational operator")?;
                let left = self.expr()?;
                Expression::relational(op, left, self.expr()?)
            }
            TAG_LOGICAL => {
                let op = self.op(LogicalOperator::from_u8, "logical operator")?;
                Expression::logical(op, self.exprs()?)?
            }
            TAG_LIST => Expression::list(self.exprs()?),
            TAG_ATTRIBUTE => {
                let object = self.expr()?;
                Expression::attribute(object, self.get_str()?)
            }
            TAG_LABEL_ATTRIBUTE => {
                return Err(ExpressionError::UnsupportedNode {
                    kind: "LabelAttribute",
                })
            }
            TAG_LIST_COMPREHENSION => {
                let inner_var = self.get_str()?;
                let collection = self.expr()?;
                let mut expr = ListComprehensionExpr::new(inner_var, collection)?;
                expr.set_filter(self.optional_expr()?);
                expr.set_mapping(self.optional_expr()?);
                if let Some(origin) = self.optional_str()? {
                    expr.set_origin_string(origin);
                }
                expr.into()
            }
            TAG_PREDICATE => {
                let kind = self.op(PredicateKind::from_u8, "predicate kind")?;
                let inner_var = self.get_str()?;
                let collection = self.expr()?;
                let filter = self.optional_expr()?;
                let mut expr = PredicateExpr::with_kind(kind, inner_var, collection, filter)?;
                if let Some(origin) = self.optional_str()? {
                    expr.set_origin_string(origin);
                }
                expr.into()
            }
            TAG_REDUCE => {
                let accumulator = self.get_str()?;
                let initial = self.expr()?;
                let inner_var = self.get_str()?;
                let collection = self.expr()?;
                let mapping = self.expr()?;
                let mut expr =
                    ReduceExpr::new(accumulator, initial, inner_var, collection, mapping)?;
                if let Some(origin) = self.optional_str()? {
                    expr.set_origin_string(origin);
                }
                expr.into()
            }
            other => {
                return Err(ExpressionError::decode(format!(
                    "unknown expression tag {}",
                    other
                )))
            }
        };
        Ok(expr)
    }

    fn value(&mut self) -> ExpressionResult<Value> {
        self.enter()?;
        let tag = self.get_u8()?;
        let data_type =
            DataType::from_u8(tag).map_err(|e| ExpressionError::decode(e.to_string()))?;
        let value = match data_type {
            DataType::Null => Value::Null,
            DataType::Bool => Value::Bool(self.get_present()?),
            DataType::Int => {
                self.need(8, "integer")?;
                Value::Int(self.buf.get_i64())
            }
            DataType::Float => {
                self.need(8, "float")?;
                Value::Float(self.buf.get_f64())
            }
            DataType::String => Value::String(self.get_str()?),
            DataType::List => {
                let count = self.get_len()?;
                self.need(count, "list values")?;
                let items = (0..count)
                    .map(|_| self.value())
                    .collect::<ExpressionResult<Vec<_>>>()?;
                Value::List(items)
            }
            DataType::Map => {
                let count = self.get_len()?;
                self.need(count, "map entries")?;
                let mut entries = BTreeMap::new();
                for _ in 0..count {
                    let key = self.get_str()?;
                    entries.insert(key, self.value()?);
                }
                Value::Map(entries)
            }
        };
        self.leave();
        Ok(value)
    }
}
