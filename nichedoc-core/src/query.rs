//! Query construction for document stores.
//!
//! Queries are deliberately small: conjunctions of field equalities plus a
//! result limit. Backends consume them through the [`QueryVisitor`] trait.
//!
//! ```ignore
//! use nichedoc::query::{Query, Filter};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("niche", "data").and(Filter::eq("active", true)))
//!     .limit(20)
//!     .build();
//!
//! // Same shape, built from a mapping of conditions.
//! let query = Query::where_equals([("niche", "data".into()), ("active", true.into())]);
//! ```

use crate::{error::DocumentStoreError, value::Value};

/// Page size used when the caller does not pick one.
pub const DEFAULT_LIMIT: usize = 100;

/// A filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// The field equals the value.
    Eq {
        /// The field path to compare.
        field: String,
        /// The value to compare against.
        value: Value,
    },
}

impl Expr {
    /// Creates an equality expression.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Eq { field: field.into(), value: value.into() }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Flattens the expression into its equality conditions.
    pub fn conditions(&self) -> Vec<(&str, &Value)> {
        match self {
            Expr::Eq { field, value } => vec![(field.as_str(), value)],
            Expr::And(exprs) => exprs.iter().flat_map(Expr::conditions).collect(),
        }
    }
}

/// A structured query: an optional filter and a result limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Maximum number of documents to return.
    pub limit: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self { filter: None, limit: DEFAULT_LIMIT }
    }
}

impl Query {
    /// Creates a query matching every document, up to [`DEFAULT_LIMIT`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Builds a query from a mapping of field equalities.
    ///
    /// No conditions leave the filter empty, one condition becomes a single
    /// [`Expr::Eq`], and two or more are wrapped in one [`Expr::And`].
    pub fn where_equals<I, K>(conditions: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut exprs = conditions
            .into_iter()
            .map(|(field, value)| Expr::eq(field, value))
            .collect::<Vec<_>>();

        let filter = match exprs.len() {
            0 => None,
            1 => exprs.pop(),
            _ => Some(Expr::And(exprs)),
        };

        Self { filter, limit: DEFAULT_LIMIT }
    }

    /// Replaces the limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Equality conditions of the filter, in declaration order.
    pub fn conditions(&self) -> Vec<(&str, &Value)> {
        self.filter.as_ref().map(Expr::conditions).unwrap_or_default()
    }
}

/// Helper for constructing filter expressions.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Expr {
        Expr::eq(field, value)
    }

    /// Combines expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        Self { query: Query::default() }
    }

    /// Sets the filter expression, replacing any previous one.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Adds an equality condition, AND-ed with the existing filter.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let condition = Expr::eq(field, value);
        self.query.filter = Some(match self.query.filter.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = limit;
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks a filter expression. Backends implement this to translate or
/// evaluate queries.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocumentStoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_eq(&mut self, field: &str, value: &Value) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Eq { field, value } => self.visit_eq(field, value),
        }
    }
}
