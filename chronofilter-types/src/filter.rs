//! Tree form of a style layer filter.
//!
//! Style documents carry filters as nested JSON arrays such as
//! `["all", ["==", "type", "building"], ["!has", "name"]]`. This module models
//! the parts of that language the temporal filter reads and writes
//! (combinators, property comparisons and existence tests) and keeps every
//! other expression verbatim in [`FilterExpression::Other`], so converting a
//! filter to the tree and back never changes it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    All,
    Any,
    None,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::All => "all",
            Combinator::Any => "any",
            Combinator::None => "none",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(Combinator::All),
            "any" => Some(Combinator::Any),
            "none" => Some(Combinator::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "==" => Some(ComparisonOp::Eq),
            "!=" => Some(ComparisonOp::Ne),
            "<" => Some(ComparisonOp::Lt),
            "<=" => Some(ComparisonOp::Le),
            ">" => Some(ComparisonOp::Gt),
            ">=" => Some(ComparisonOp::Ge),
            _ => None,
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Eq => ordering == Ordering::Equal,
            ComparisonOp::Ne => ordering != Ordering::Equal,
            ComparisonOp::Lt => ordering == Ordering::Less,
            ComparisonOp::Le => ordering != Ordering::Greater,
            ComparisonOp::Gt => ordering == Ordering::Greater,
            ComparisonOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// A layer filter.
///
/// # Examples
///
/// ```
/// use chronofilter_types::filter::{ComparisonOp, FilterExpression};
/// use serde_json::json;
///
/// let filter: FilterExpression =
///     serde_json::from_value(json!(["all", ["==", "type", "building"], ["!has", "ruin"]])).unwrap();
///
/// let FilterExpression::Combinator { children, .. } = &filter else { panic!() };
/// assert_eq!(
///     children[0],
///     FilterExpression::compare(ComparisonOp::Eq, "type", json!("building"))
/// );
/// assert_eq!(serde_json::to_value(&filter).unwrap(), json!(["all", ["==", "type", "building"], ["!has", "ruin"]]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    /// `["all" | "any" | "none", ...children]`
    Combinator {
        op: Combinator,
        children: Vec<FilterExpression>,
    },
    /// `[op, property, literal]`
    Comparison {
        op: ComparisonOp,
        property: String,
        literal: Value,
    },
    /// `["has", property]` or `["!has", property]`
    Existence { negated: bool, property: String },
    /// Any expression outside the subset above, kept as written.
    Other(Value),
}

impl FilterExpression {
    pub fn all(children: Vec<FilterExpression>) -> Self {
        FilterExpression::Combinator {
            op: Combinator::All,
            children,
        }
    }

    pub fn any(children: Vec<FilterExpression>) -> Self {
        FilterExpression::Combinator {
            op: Combinator::Any,
            children,
        }
    }

    pub fn compare(op: ComparisonOp, property: impl Into<String>, literal: impl Into<Value>) -> Self {
        FilterExpression::Comparison {
            op,
            property: property.into(),
            literal: literal.into(),
        }
    }

    pub fn has(property: impl Into<String>) -> Self {
        FilterExpression::Existence {
            negated: false,
            property: property.into(),
        }
    }

    pub fn not_has(property: impl Into<String>) -> Self {
        FilterExpression::Existence {
            negated: true,
            property: property.into(),
        }
    }

    /// Read a filter from its JSON array form. Never fails: anything that is
    /// not a recognized expression becomes [`FilterExpression::Other`].
    pub fn from_value(value: Value) -> Self {
        let Value::Array(items) = value else {
            return FilterExpression::Other(value);
        };
        let Some(Value::String(name)) = items.first() else {
            return FilterExpression::Other(Value::Array(items));
        };

        if let Some(op) = Combinator::from_name(name) {
            let children = items
                .into_iter()
                .skip(1)
                .map(FilterExpression::from_value)
                .collect();
            return FilterExpression::Combinator { op, children };
        }

        match (name.as_str(), items.as_slice()) {
            (_, [_, Value::String(property), literal]) => {
                if let Some(op) = ComparisonOp::from_name(name) {
                    return FilterExpression::Comparison {
                        op,
                        property: property.clone(),
                        literal: literal.clone(),
                    };
                }
            }
            ("has" | "!has", [_, Value::String(property)]) => {
                return FilterExpression::Existence {
                    negated: name == "!has",
                    property: property.clone(),
                };
            }
            _ => {}
        }
        FilterExpression::Other(Value::Array(items))
    }

    /// Write the filter back to its JSON array form.
    pub fn to_value(&self) -> Value {
        match self {
            FilterExpression::Combinator { op, children } => {
                let mut items = Vec::with_capacity(children.len() + 1);
                items.push(Value::from(op.as_str()));
                items.extend(children.iter().map(FilterExpression::to_value));
                Value::Array(items)
            }
            FilterExpression::Comparison {
                op,
                property,
                literal,
            } => Value::Array(vec![
                Value::from(op.as_str()),
                Value::from(property.as_str()),
                literal.clone(),
            ]),
            FilterExpression::Existence { negated, property } => Value::Array(vec![
                Value::from(if *negated { "!has" } else { "has" }),
                Value::from(property.as_str()),
            ]),
            FilterExpression::Other(value) => value.clone(),
        }
    }

    /// Evaluate the filter against a feature's properties.
    ///
    /// A comparison against a missing property is false, except `!=` which is
    /// true. Numbers compare numerically and strings lexicographically; other
    /// pairs only satisfy `!=`. Returns `None` when an evaluated branch is an
    /// [`FilterExpression::Other`] expression.
    pub fn evaluate(&self, properties: &Map<String, Value>) -> Option<bool> {
        match self {
            FilterExpression::Combinator { op, children } => {
                for child in children {
                    let matched = child.evaluate(properties)?;
                    match op {
                        Combinator::All if !matched => return Some(false),
                        Combinator::Any if matched => return Some(true),
                        Combinator::None if matched => return Some(false),
                        _ => {}
                    }
                }
                Some(*op != Combinator::Any)
            }
            FilterExpression::Comparison {
                op,
                property,
                literal,
            } => {
                let Some(value) = properties.get(property) else {
                    return Some(*op == ComparisonOp::Ne);
                };
                Some(match compare_values(value, literal) {
                    Some(ordering) => op.accepts(ordering),
                    None => *op == ComparisonOp::Ne,
                })
            }
            FilterExpression::Existence { negated, property } => {
                Some(properties.contains_key(property) != *negated)
            }
            FilterExpression::Other(_) => None,
        }
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) if l == r => Some(Ordering::Equal),
        _ => None,
    }
}

impl From<Value> for FilterExpression {
    fn from(value: Value) -> Self {
        FilterExpression::from_value(value)
    }
}

impl From<&FilterExpression> for Value {
    fn from(filter: &FilterExpression) -> Self {
        filter.to_value()
    }
}

impl Serialize for FilterExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FilterExpression::from_value)
    }
}
