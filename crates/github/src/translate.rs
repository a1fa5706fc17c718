//! Generic field mapping between parameter shapes.
//!
//! Every GitHub endpoint takes a different subset of the caller's
//! [`QueryParams`](hubnote_protocol::QueryParams), sometimes under a different
//! representation. Instead of hand-writing one conversion per endpoint, each
//! call site describes the target shape as a [`FieldMap`] and [`translate`]
//! does the projection.
//!
//! # Examples
//!
//! ```
//! use hubnote_github::translate::{FieldMap, translate};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct Source {
//!     state: Option<String>,
//!     labels: Vec<String>,
//! }
//!
//! #[derive(Debug, Deserialize, PartialEq)]
//! struct Target {
//!     state: Option<String>,
//!     labels: String,
//! }
//!
//! let source = Source { state: None, labels: vec!["bug".into(), "ui".into()] };
//! let fields = FieldMap::new()
//!     .copy("state")
//!     .transform("labels", |s: &Source| s.labels.join(",").into());
//!
//! let target: Target = translate(&source, &fields, true, true).unwrap();
//! assert_eq!(target, Target { state: None, labels: "bug,ui".to_string() });
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Result;

/// How a single target field is computed.
pub enum FieldMapping<S> {
    /// Copy the same-named field of the source verbatim.
    Copy,
    /// Compute the value from the whole source.
    Transform(fn(&S) -> Value),
}

/// Target field names and how to compute each of them, in order.
pub struct FieldMap<S> {
    fields: Vec<(&'static str, FieldMapping<S>)>,
}

impl<S> Default for FieldMap<S> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<S> FieldMap<S> {
    /// Creates an empty field map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `name` to the same-named source field.
    #[must_use]
    pub fn copy(mut self, name: &'static str) -> Self {
        self.fields.push((name, FieldMapping::Copy));
        self
    }

    /// Maps `name` to the result of `transform`.
    #[must_use]
    pub fn transform(mut self, name: &'static str, transform: fn(&S) -> Value) -> Self {
        self.fields.push((name, FieldMapping::Transform(transform)));
        self
    }

    fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| *field == name)
    }
}

/// Projects `source` into `T` according to `fields`.
///
/// With `drop_empty`, fields whose computed value is null are left out of the
/// result. Without `drop_unmapped`, source fields that `fields` does not
/// mention are copied into the result unchanged, subject to `drop_empty`.
///
/// # Errors
///
/// Returns [`Error::Decode`](crate::Error::Decode) if `source` cannot be
/// serialized or the projected fields do not fit `T`.
pub fn translate<S, T>(
    source: &S,
    fields: &FieldMap<S>,
    drop_empty: bool,
    drop_unmapped: bool,
) -> Result<T>
where
    S: Serialize,
    T: DeserializeOwned,
{
    let source_fields = match serde_json::to_value(source)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let mut target = Map::new();
    for (name, mapping) in &fields.fields {
        let value = match mapping {
            FieldMapping::Copy => source_fields.get(*name).cloned().unwrap_or(Value::Null),
            FieldMapping::Transform(transform) => transform(source),
        };
        if drop_empty && value.is_null() {
            continue;
        }
        target.insert((*name).to_string(), value);
    }

    if !drop_unmapped {
        for (name, value) in source_fields {
            if fields.contains(&name) || (drop_empty && value.is_null()) {
                continue;
            }
            target.insert(name, value);
        }
    }

    Ok(serde_json::from_value(Value::Object(target))?)
}
