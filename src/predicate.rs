//! WHERE-clause predicate boundary.
//!
//! Predicates are built outside this crate by a query-builder collaborator.
//! The engine treats the fragment text as opaque and only merges the
//! predicate's bound parameters with its own.

use crate::db::params::{BindValue, BoundParameter, bind};
use serde_json::Value as JsonValue;

/// An opaque WHERE-clause fragment plus its ordered bound parameters.
///
/// The fragment references named placeholders (`:name`); every placeholder
/// it references must appear in the parameter list.
#[derive(Debug, Clone)]
pub struct Predicate {
    fragment: String,
    params: Vec<BoundParameter>,
}

impl Predicate {
    /// Create a predicate with no bound parameters.
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            params: Vec::new(),
        }
    }

    /// Bind a named value, inferring its bind type.
    pub fn bind(mut self, name: impl Into<String>, value: &JsonValue) -> Self {
        self.params.push(bind(name, value));
        self
    }

    /// Bind an already-typed value.
    pub fn bind_value(mut self, name: impl Into<String>, value: BindValue) -> Self {
        self.params.push(BoundParameter::new(name, value));
        self
    }

    /// The predicate text, referencing named placeholders.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Placeholder name to value mapping, in bind order.
    pub fn bound_parameters(&self) -> &[BoundParameter] {
        &self.params
    }
}
