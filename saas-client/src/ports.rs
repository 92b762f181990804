//! Ports to the deployment-provided collaborators of the in-process backend.
//!
//! A partner app running inside the platform's own deployment reads tenant
//! data straight from the instance's directory store. What that store is
//! (SQL, a shared-memory index, a fixture in tests) is the deployment's
//! business; the backend only needs "fetch the first row or all rows
//! matching a filter", described by a [`Query`] value.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A raw record row: ordered `(column, value)` pairs.
pub type Row = Vec<(String, Value)>;

/// Failure of the directory gateway itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway rejected or could not execute the query.
    #[error("query failed: {0}")]
    Query(String),
    /// The store behind the gateway is unreachable.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// A row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals the given value.
    Eq(String, Value),
    /// Column holds no value.
    IsNull(String),
}

/// An inner join against a second table.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Table joined in.
    pub table: String,
    /// Join column on the base table.
    pub left: String,
    /// Join column on the joined table.
    pub right: String,
}

/// Value-level description of a directory lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Base table.
    pub table: String,
    /// Optional inner join.
    pub join: Option<Join>,
    /// Conjunctive filters; columns may be qualified (`table.column`).
    pub filters: Vec<Filter>,
}

impl Query {
    /// Start a query against `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            join: None,
            filters: Vec::new(),
        }
    }

    /// Inner-join `table` on `base.left = table.right`.
    #[must_use]
    pub fn join(
        mut self,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.join = Some(Join {
            table: table.into(),
            left: left.into(),
            right: right.into(),
        });
        self
    }

    /// Require `column = value`.
    #[must_use]
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    /// Require `column` to hold no value.
    #[must_use]
    pub fn filter_null(mut self, column: impl Into<String>) -> Self {
        self.filters.push(Filter::IsNull(column.into()));
        self
    }
}

/// Read access to the tenant instance's directory store.
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    /// First row matching the query, if any.
    async fn fetch_first(&self, query: &Query) -> Result<Option<Row>, GatewayError>;

    /// All rows matching the query, in storage order.
    async fn fetch_all(&self, query: &Query) -> Result<Vec<Row>, GatewayError>;
}
