//! Date constraints injected into layer filters.
//!
//! A feature is visible at decimal year `y` when its validity interval
//! contains `y`. With the default property names the injected filter is:
//!
//! ```text
//! ["all",
//!   ["any", ["!has", "start_decdate"], ["<=", "start_decdate", y]],
//!   ["any", ["!has", "end_decdate"], [">=", "end_decdate", y]],
//!   <original filter, if any>]
//! ```
//!
//! Injecting into a filter that already has this shape only rewrites the two
//! year literals, so repeated calls never nest constraints.

use crate::config::Config;
use chronofilter_types::filter::{Combinator, ComparisonOp, FilterExpression};
use serde_json::Value;

/// Builds and recognizes the date-constraint subtree for a pair of feature
/// properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateConstraint {
    start_property: String,
    end_property: String,
}

impl DateConstraint {
    pub fn new(start_property: impl Into<String>, end_property: impl Into<String>) -> Self {
        Self {
            start_property: start_property.into(),
            end_property: end_property.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.start_property.clone(), config.end_property.clone())
    }

    pub fn start_property(&self) -> &str {
        &self.start_property
    }

    pub fn end_property(&self) -> &str {
        &self.end_property
    }

    /// Constrain `filter` to features whose validity interval contains `year`.
    ///
    /// Features without a start or end property are unbounded on that side.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronofilter::compute::temporal::DateConstraint;
    /// use chronofilter_types::filter::FilterExpression;
    /// use serde_json::json;
    ///
    /// let constraint = DateConstraint::default();
    /// let building = FilterExpression::from_value(json!(["==", "type", "building"]));
    ///
    /// let once = constraint.inject(Some(building), 1800.0);
    /// let twice = constraint.inject(Some(once), 1850.0);
    /// assert_eq!(
    ///     twice.to_value(),
    ///     json!(["all",
    ///         ["any", ["!has", "start_decdate"], ["<=", "start_decdate", 1850.0]],
    ///         ["any", ["!has", "end_decdate"], [">=", "end_decdate", 1850.0]],
    ///         ["==", "type", "building"]])
    /// );
    /// ```
    pub fn inject(&self, filter: Option<FilterExpression>, year: f64) -> FilterExpression {
        match filter {
            Some(mut filter) => {
                if self.update_in_place(&mut filter, year) {
                    filter
                } else {
                    let [start, end] = self.guards(year);
                    FilterExpression::all(vec![start, end, filter])
                }
            }
            None => FilterExpression::all(self.guards(year).into()),
        }
    }

    /// The two `any` guards bounding the validity interval at `year`.
    pub fn guards(&self, year: f64) -> [FilterExpression; 2] {
        [
            FilterExpression::any(vec![
                FilterExpression::not_has(self.start_property.as_str()),
                FilterExpression::compare(ComparisonOp::Le, self.start_property.as_str(), year),
            ]),
            FilterExpression::any(vec![
                FilterExpression::not_has(self.end_property.as_str()),
                FilterExpression::compare(ComparisonOp::Ge, self.end_property.as_str(), year),
            ]),
        ]
    }

    /// Whether `filter` already carries a date constraint for these properties.
    pub fn is_constrained(&self, filter: &FilterExpression) -> bool {
        self.constrained_years(filter).is_some()
    }

    /// The `(start, end)` year literals of an existing date constraint.
    pub fn constrained_years(&self, filter: &FilterExpression) -> Option<(f64, f64)> {
        let mut probe = filter.clone();
        let (start, end) = self.bound_literals(&mut probe)?;
        Some((start.as_f64()?, end.as_f64()?))
    }

    fn update_in_place(&self, filter: &mut FilterExpression, year: f64) -> bool {
        match self.bound_literals(filter) {
            Some((start, end)) => {
                *start = Value::from(year);
                *end = Value::from(year);
                true
            }
            None => false,
        }
    }

    /// Locate both year literals of a canonical constraint subtree.
    fn bound_literals<'a>(
        &self,
        filter: &'a mut FilterExpression,
    ) -> Option<(&'a mut Value, &'a mut Value)> {
        let FilterExpression::Combinator {
            op: Combinator::All,
            children,
        } = filter
        else {
            return None;
        };
        let [start_guard, end_guard, ..] = children.as_mut_slice() else {
            return None;
        };
        let start = guard_literal(start_guard, ComparisonOp::Le, &self.start_property)?;
        let end = guard_literal(end_guard, ComparisonOp::Ge, &self.end_property)?;
        Some((start, end))
    }
}

impl Default for DateConstraint {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// `["any", ["!has", property], [op, property, literal]]` yields `literal`.
fn guard_literal<'a>(
    guard: &'a mut FilterExpression,
    expected: ComparisonOp,
    property: &str,
) -> Option<&'a mut Value> {
    let FilterExpression::Combinator {
        op: Combinator::Any,
        children,
    } = guard
    else {
        return None;
    };
    match children.as_mut_slice() {
        [
            FilterExpression::Existence {
                negated: true,
                property: guarded,
            },
            FilterExpression::Comparison {
                op,
                property: compared,
                literal,
            },
        ] if guarded.as_str() == property && compared.as_str() == property && *op == expected => {
            Some(literal)
        }
        _ => None,
    }
}

/// Constrain `filter` to `year` using the default `start_decdate`/`end_decdate`
/// properties.
pub fn inject_date_constraint(filter: Option<FilterExpression>, year: f64) -> FilterExpression {
    DateConstraint::default().inject(filter, year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn canonical(year: f64) -> Value {
        json!([
            "all",
            ["any", ["!has", "start_decdate"], ["<=", "start_decdate", year]],
            ["any", ["!has", "end_decdate"], [">=", "end_decdate", year]]
        ])
    }

    #[test]
    fn test_inject_without_filter() {
        assert_eq!(inject_date_constraint(None, 1900.0).to_value(), canonical(1900.0));
    }

    #[test]
    fn test_inject_preserves_original_as_third_child() {
        let original = FilterExpression::from_value(json!(["==", "type", "building"]));
        let result = inject_date_constraint(Some(original.clone()), 1850.0);

        let FilterExpression::Combinator { op, children } = &result else {
            panic!("expected combinator, got {result:?}");
        };
        assert_eq!(*op, Combinator::All);
        assert_eq!(children.len(), 3);
        assert_eq!(children[2], original);
    }

    #[test]
    fn test_repeated_injection_updates_in_place() {
        let first = inject_date_constraint(None, 1800.0);
        let second = inject_date_constraint(Some(first), 1900.0);
        assert_eq!(second, inject_date_constraint(None, 1900.0));

        let original = FilterExpression::from_value(json!(["in", "class", "river", "canal"]));
        let mut filter = Some(original.clone());
        for year in [1500.0, 1600.5, -44.25, 1900.0] {
            filter = Some(inject_date_constraint(filter, year));
        }
        assert_eq!(filter, Some(inject_date_constraint(Some(original), 1900.0)));
    }

    #[test]
    fn test_existing_all_filter_is_wrapped_not_updated() {
        // An `all` whose first child is an `any` but not a date guard
        let original = FilterExpression::from_value(json!([
            "all",
            ["any", ["==", "class", "a"], ["==", "class", "b"]],
            ["has", "name"]
        ]));
        let result = inject_date_constraint(Some(original.clone()), 1700.0);

        let FilterExpression::Combinator { children, .. } = &result else {
            panic!("expected combinator");
        };
        assert_eq!(children[2], original);
        assert_eq!(DateConstraint::default().constrained_years(&result), Some((1700.0, 1700.0)));
    }

    #[test]
    fn test_recognizer_requires_both_guards() {
        let half = FilterExpression::from_value(json!([
            "all",
            ["any", ["!has", "start_decdate"], ["<=", "start_decdate", 1.0]],
            ["has", "name"]
        ]));
        assert!(!DateConstraint::default().is_constrained(&half));

        let swapped = FilterExpression::from_value(json!([
            "all",
            ["any", ["!has", "start_decdate"], [">=", "start_decdate", 1.0]],
            ["any", ["!has", "end_decdate"], ["<=", "end_decdate", 1.0]]
        ]));
        assert!(!DateConstraint::default().is_constrained(&swapped));
    }

    #[test]
    fn test_update_keeps_trailing_children() {
        let filter = FilterExpression::from_value(json!([
            "all",
            ["any", ["!has", "start_decdate"], ["<=", "start_decdate", 1.0]],
            ["any", ["!has", "end_decdate"], [">=", "end_decdate", 1.0]],
            ["==", "type", "wall"],
            ["has", "name"]
        ]));
        let updated = inject_date_constraint(Some(filter), 2.0).to_value();
        assert_eq!(updated[1][2][2], json!(2.0));
        assert_eq!(updated[2][2][2], json!(2.0));
        assert_eq!(updated[3], json!(["==", "type", "wall"]));
        assert_eq!(updated[4], json!(["has", "name"]));
    }

    #[test]
    fn test_custom_properties() {
        let constraint = DateConstraint::new("from", "until");
        let filter = constraint.inject(None, 10.0);
        assert_eq!(filter.to_value()[1][2], json!(["<=", "from", 10.0]));
        assert!(!DateConstraint::default().is_constrained(&filter));
        assert!(constraint.is_constrained(&filter));
    }

    #[test]
    fn test_missing_bounds_are_unbounded() {
        let filter = inject_date_constraint(None, 1900.0);
        let eval = |value: Value| {
            let Value::Object(properties) = value else {
                return None;
            };
            filter.evaluate(&properties)
        };

        assert_eq!(filter.evaluate(&Map::new()), Some(true));
        assert_eq!(eval(json!({"start_decdate": 1850.0})), Some(true));
        assert_eq!(eval(json!({"start_decdate": 1950.0})), Some(false));
        assert_eq!(eval(json!({"end_decdate": 1899.9})), Some(false));
        assert_eq!(eval(json!({"start_decdate": 1900.0, "end_decdate": 1900.0})), Some(true));
    }
}
