//! List comprehension, quantified predicate and reduce nodes.
//!
//! All three bind an inner variable to each element of a collection and
//! evaluate a sub-expression under that binding; the evaluation itself lives
//! in [`eval`](crate::expression::eval). Each node may carry the source text
//! it was parsed from, which rendering prefers over reconstruction. That text
//! takes no part in equality.

use crate::expression::{Expression, ExpressionError, ExpressionResult};
use std::fmt;
use std::str::FromStr;

fn check_identifier(what: &str, name: &str) -> ExpressionResult<()> {
    if name.is_empty() {
        return Err(ExpressionError::Construction {
            reason: format!("{} must not be empty", what),
        });
    }
    Ok(())
}

/// `[x IN collection WHERE filter | mapping]`
#[derive(Debug, Clone)]
pub struct ListComprehensionExpr {
    inner_var: String,
    collection: Box<Expression>,
    filter: Option<Box<Expression>>,
    mapping: Option<Box<Expression>>,
    origin_string: Option<String>,
}

impl ListComprehensionExpr {
    pub fn new(inner_var: impl Into<String>, collection: Expression) -> ExpressionResult<Self> {
        let inner_var = inner_var.into();
        check_identifier("list comprehension variable", &inner_var)?;
        Ok(Self {
            inner_var,
            collection: Box::new(collection),
            filter: None,
            mapping: None,
            origin_string: None,
        })
    }

    pub fn with_filter(mut self, filter: Expression) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn with_mapping(mut self, mapping: Expression) -> Self {
        self.mapping = Some(Box::new(mapping));
        self
    }

    pub fn with_origin_string(mut self, origin: impl Into<String>) -> Self {
        self.set_origin_string(origin);
        self
    }

    pub fn inner_var(&self) -> &str {
        &self.inner_var
    }

    pub fn collection(&self) -> &Expression {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut Expression {
        &mut self.collection
    }

    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_deref()
    }

    pub fn filter_mut(&mut self) -> Option<&mut Expression> {
        self.filter.as_deref_mut()
    }

    pub fn mapping(&self) -> Option<&Expression> {
        self.mapping.as_deref()
    }

    pub fn mapping_mut(&mut self) -> Option<&mut Expression> {
        self.mapping.as_deref_mut()
    }

    pub fn set_filter(&mut self, filter: Option<Expression>) {
        self.filter = filter.map(Box::new);
    }

    pub fn set_mapping(&mut self, mapping: Option<Expression>) {
        self.mapping = mapping.map(Box::new);
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn has_mapping(&self) -> bool {
        self.mapping.is_some()
    }

    pub fn origin_string(&self) -> Option<&str> {
        self.origin_string.as_deref()
    }

    /// Empty text clears the origin
    pub fn set_origin_string(&mut self, origin: impl Into<String>) {
        let origin = origin.into();
        self.origin_string = (!origin.is_empty()).then_some(origin);
    }

    /// Render from the children, ignoring any origin string
    pub fn make_string(&self) -> String {
        let mut buf = format!("[{} IN {}", self.inner_var, self.collection);
        if let Some(filter) = &self.filter {
            buf.push_str(&format!(" WHERE {}", filter));
        }
        if let Some(mapping) = &self.mapping {
            buf.push_str(&format!(" | {}", mapping));
        }
        buf.push(']');
        buf
    }
}

impl PartialEq for ListComprehensionExpr {
    fn eq(&self, other: &Self) -> bool {
        self.inner_var == other.inner_var
            && self.collection == other.collection
            && self.filter == other.filter
            && self.mapping == other.mapping
    }
}

impl fmt::Display for ListComprehensionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin_string {
            Some(origin) => f.write_str(origin),
            None => f.write_str(&self.make_string()),
        }
    }
}

/// Quantifier of a [`PredicateExpr`]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    All = 0,
    Any = 1,
    Single = 2,
    None = 3,
    Exists = 4,
}

impl PredicateKind {
    pub const ALL: [Self; 5] = [
        Self::All,
        Self::Any,
        Self::Single,
        Self::None,
        Self::Exists,
    ];

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::All),
            1 => Some(Self::Any),
            2 => Some(Self::Single),
            3 => Some(Self::None),
            4 => Some(Self::Exists),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateKind::All => "all",
            PredicateKind::Any => "any",
            PredicateKind::Single => "single",
            PredicateKind::None => "none",
            PredicateKind::Exists => "exists",
        }
    }
}

impl FromStr for PredicateKind {
    type Err = ExpressionError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "all" => Ok(PredicateKind::All),
            "any" => Ok(PredicateKind::Any),
            "single" => Ok(PredicateKind::Single),
            "none" => Ok(PredicateKind::None),
            "exists" => Ok(PredicateKind::Exists),
            _ => Err(ExpressionError::Construction {
                reason: format!("unknown predicate `{}'", name),
            }),
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `all|any|single|none(x IN collection WHERE filter)` or `exists(collection)`
#[derive(Debug, Clone)]
pub struct PredicateExpr {
    kind: PredicateKind,
    inner_var: String,
    collection: Box<Expression>,
    filter: Option<Box<Expression>>,
    origin_string: Option<String>,
}

impl PredicateExpr {
    /// Build a quantifier from its source name.
    ///
    /// `exists` takes no inner variable; every other quantifier requires one.
    pub fn new(
        name: &str,
        inner_var: impl Into<String>,
        collection: Expression,
        filter: Option<Expression>,
    ) -> ExpressionResult<Self> {
        Self::with_kind(name.parse()?, inner_var, collection, filter)
    }

    pub fn with_kind(
        kind: PredicateKind,
        inner_var: impl Into<String>,
        collection: Expression,
        filter: Option<Expression>,
    ) -> ExpressionResult<Self> {
        let inner_var = inner_var.into();
        if kind == PredicateKind::Exists {
            if !inner_var.is_empty() || filter.is_some() {
                return Err(ExpressionError::Construction {
                    reason: "exists() takes neither a variable nor a filter".to_string(),
                });
            }
        } else {
            check_identifier(&format!("{}() variable", kind), &inner_var)?;
        }
        Ok(Self {
            kind,
            inner_var,
            collection: Box::new(collection),
            filter: filter.map(Box::new),
            origin_string: None,
        })
    }

    pub fn exists(collection: Expression) -> Self {
        Self {
            kind: PredicateKind::Exists,
            inner_var: String::new(),
            collection: Box::new(collection),
            filter: None,
            origin_string: None,
        }
    }

    pub fn with_origin_string(mut self, origin: impl Into<String>) -> Self {
        self.set_origin_string(origin);
        self
    }

    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn inner_var(&self) -> &str {
        &self.inner_var
    }

    pub fn has_inner_var(&self) -> bool {
        !self.inner_var.is_empty()
    }

    pub fn collection(&self) -> &Expression {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut Expression {
        &mut self.collection
    }

    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_deref()
    }

    pub fn filter_mut(&mut self) -> Option<&mut Expression> {
        self.filter.as_deref_mut()
    }

    pub fn set_filter(&mut self, filter: Option<Expression>) {
        self.filter = filter.map(Box::new);
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn origin_string(&self) -> Option<&str> {
        self.origin_string.as_deref()
    }

    pub fn set_origin_string(&mut self, origin: impl Into<String>) {
        let origin = origin.into();
        self.origin_string = (!origin.is_empty()).then_some(origin);
    }

    pub fn make_string(&self) -> String {
        if self.kind == PredicateKind::Exists {
            return format!("exists({})", self.collection);
        }
        let mut buf = format!("{}({} IN {}", self.kind, self.inner_var, self.collection);
        if let Some(filter) = &self.filter {
            buf.push_str(&format!(" WHERE {}", filter));
        }
        buf.push(')');
        buf
    }
}

impl PartialEq for PredicateExpr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.inner_var == other.inner_var
            && self.collection == other.collection
            && self.filter == other.filter
    }
}

impl fmt::Display for PredicateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin_string {
            Some(origin) => f.write_str(origin),
            None => f.write_str(&self.make_string()),
        }
    }
}

/// `reduce(accumulator = initial, x IN collection | mapping)`
#[derive(Debug, Clone)]
pub struct ReduceExpr {
    accumulator: String,
    initial: Box<Expression>,
    inner_var: String,
    collection: Box<Expression>,
    mapping: Box<Expression>,
    origin_string: Option<String>,
}

impl ReduceExpr {
    pub fn new(
        accumulator: impl Into<String>,
        initial: Expression,
        inner_var: impl Into<String>,
        collection: Expression,
        mapping: Expression,
    ) -> ExpressionResult<Self> {
        let accumulator = accumulator.into();
        let inner_var = inner_var.into();
        check_identifier("reduce accumulator", &accumulator)?;
        check_identifier("reduce variable", &inner_var)?;
        Ok(Self {
            accumulator,
            initial: Box::new(initial),
            inner_var,
            collection: Box::new(collection),
            mapping: Box::new(mapping),
            origin_string: None,
        })
    }

    pub fn with_origin_string(mut self, origin: impl Into<String>) -> Self {
        self.set_origin_string(origin);
        self
    }

    pub fn accumulator(&self) -> &str {
        &self.accumulator
    }

    pub fn initial(&self) -> &Expression {
        &self.initial
    }

    pub fn initial_mut(&mut self) -> &mut Expression {
        &mut self.initial
    }

    pub fn inner_var(&self) -> &str {
        &self.inner_var
    }

    pub fn collection(&self) -> &Expression {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut Expression {
        &mut self.collection
    }

    pub fn mapping(&self) -> &Expression {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut Expression {
        &mut self.mapping
    }

    pub fn origin_string(&self) -> Option<&str> {
        self.origin_string.as_deref()
    }

    pub fn set_origin_string(&mut self, origin: impl Into<String>) {
        let origin = origin.into();
        self.origin_string = (!origin.is_empty()).then_some(origin);
    }

    pub fn make_string(&self) -> String {
        format!(
            "reduce({} = {}, {} IN {} | {})",
            self.accumulator, self.initial, self.inner_var, self.collection, self.mapping
        )
    }
}

impl PartialEq for ReduceExpr {
    fn eq(&self, other: &Self) -> bool {
        self.accumulator == other.accumulator
            && self.initial == other.initial
            && self.inner_var == other.inner_var
            && self.collection == other.collection
            && self.mapping == other.mapping
    }
}

impl fmt::Display for ReduceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin_string {
            Some(origin) => f.write_str(origin),
            None => f.write_str(&self.make_string()),
        }
    }
}
