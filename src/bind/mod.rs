//! Parameter Binding
//!
//! Resolves every name discovered by the rewriter against a caller-supplied
//! [`ParameterSource`] and returns the values in positional order.
//!
//! Values are passed through untouched as JSON values. Converting them into
//! driver-specific types, and executing the query, is left to the caller.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{NamedSqlError, Result};
use crate::rewrite::{rewrite_with, RewriteOptions, RewrittenQuery};

/// Something that can supply a value for a parameter name
///
/// Implement this for a request context to plug it into [`bind`].
pub trait ParameterSource {
    /// Look up the value for `name`, or `None` if it cannot be resolved
    fn resolve(&self, name: &str) -> Option<Value>;

    /// Names this source knows about, when it can enumerate them
    fn known_names(&self) -> Vec<&str> {
        Vec::new()
    }
}

impl<S: ParameterSource + ?Sized> ParameterSource for &S {
    fn resolve(&self, name: &str) -> Option<Value> {
        (**self).resolve(name)
    }

    fn known_names(&self) -> Vec<&str> {
        (**self).known_names()
    }
}

impl ParameterSource for HashMap<String, Value> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn known_names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }
}

impl ParameterSource for BTreeMap<String, Value> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn known_names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }
}

impl ParameterSource for Map<String, Value> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn known_names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }
}

/// Only JSON objects resolve names; any other value resolves nothing.
impl ParameterSource for Value {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.as_object().and_then(|map| map.resolve(name))
    }

    fn known_names(&self) -> Vec<&str> {
        self.as_object().map(|map| map.known_names()).unwrap_or_default()
    }
}

/// Parameter source backed by a closure
///
/// Created with [`from_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(F);

/// Build a [`ParameterSource`] from a closure
///
/// ```
/// use namedsql::{bind, from_fn, rewrite};
/// use serde_json::json;
///
/// let rewritten = rewrite("UPDATE t SET a = :x WHERE b = :x");
/// let bound = bind(&rewritten, &from_fn(|name| (name == "x").then(|| json!(7)))).unwrap();
/// assert_eq!(bound.values, vec![json!(7), json!(7)]);
/// ```
pub const fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&str) -> Option<Value>,
{
    FromFn(f)
}

impl<F> ParameterSource for FromFn<F>
where
    F: Fn(&str) -> Option<Value>,
{
    fn resolve(&self, name: &str) -> Option<Value> {
        (self.0)(name)
    }
}

/// A rewritten query together with its positional values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundQuery {
    /// Query text with positional `?` placeholders
    pub query: String,

    /// Parameter names in placeholder order
    pub params: Vec<String>,

    /// One value per placeholder, in placeholder order
    pub values: Vec<Value>,
}

/// Bind a rewritten query against a parameter source
///
/// Each distinct name is resolved once; a name used twice supplies the same
/// value to both slots.
///
/// # Errors
/// Returns `MissingParameters` listing every name the source could not resolve.
pub fn bind<S>(rewritten: &RewrittenQuery, source: &S) -> Result<BoundQuery>
where
    S: ParameterSource + ?Sized,
{
    let distinct = rewritten.distinct_params();

    let mut resolved: HashMap<&str, Value> = HashMap::with_capacity(distinct.len());
    let mut missing = Vec::new();
    for &name in &distinct {
        match source.resolve(name) {
            Some(value) => {
                resolved.insert(name, value);
            }
            None => missing.push(name),
        }
    }

    if !missing.is_empty() {
        return Err(NamedSqlError::missing_parameters(missing));
    }

    for name in source.known_names() {
        if !distinct.contains(&name) {
            debug!(parameter = name, "value supplied but not referenced by the query");
        }
    }

    let values = rewritten
        .params
        .iter()
        .map(|name| resolved.get(name.as_str()).cloned().unwrap_or(Value::Null))
        .collect();

    Ok(BoundQuery { query: rewritten.query.clone(), params: rewritten.params.clone(), values })
}

/// Rewrite a template and bind it in one step
///
/// # Errors
/// Same as [`bind`].
pub fn bind_template<S>(template: &str, options: &RewriteOptions, source: &S) -> Result<BoundQuery>
where
    S: ParameterSource + ?Sized,
{
    bind(&rewrite_with(template, options), source)
}
