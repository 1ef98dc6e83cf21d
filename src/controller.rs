//! Applies a date to every feature layer of a map style.

use crate::compute::temporal::DateConstraint;
use crate::config::Config;
use crate::style::StyleMap;
use chronofilter_types::date::CalendarDate;

/// Rewrites layer filters so only features existing at a date are drawn.
///
/// Only layers backed by a vector source layer are touched; background,
/// raster and similar layers have no features to constrain. Each call reads,
/// transforms and writes every filter within one synchronous step.
#[derive(Debug, Clone, Default)]
pub struct TemporalFilterController {
    constraint: DateConstraint,
}

impl TemporalFilterController {
    pub fn new(constraint: DateConstraint) -> Self {
        Self { constraint }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(DateConstraint::from_config(config))
    }

    pub fn constraint(&self) -> &DateConstraint {
        &self.constraint
    }

    /// Filter every feature layer by `date`. Returns the number of layers updated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chronofilter::TemporalFilterController;
    /// use chronofilter::style::{Style, StyleLayer, StyleMap};
    /// use chronofilter_types::date::CalendarDate;
    ///
    /// let mut style = Style::new()
    ///     .with_layer(StyleLayer::new("background"))?
    ///     .with_layer(StyleLayer::new("roads").with_source_layer("transport"))?;
    ///
    /// let controller = TemporalFilterController::default();
    /// let date = CalendarDate::parse_iso("1871-01-18").unwrap();
    /// assert_eq!(controller.apply_instant(&mut style, date), 1);
    /// assert!(style.filter("background").is_none());
    /// assert!(style.filter("roads").is_some());
    /// # Ok::<(), chronofilter::ChronoFilterError>(())
    /// ```
    pub fn apply_instant<M: StyleMap + ?Sized>(&self, map: &mut M, date: CalendarDate) -> usize {
        let year = date.decimal_year();
        log::debug!("Filtering map by {} (decimal year {})", date, year);
        self.apply_decimal_year(map, year)
    }

    /// Filter every feature layer by a decimal year.
    pub fn apply_decimal_year<M: StyleMap + ?Sized>(&self, map: &mut M, year: f64) -> usize {
        let mut updated = 0;
        for layer in map.layers() {
            if !layer.is_feature_layer() {
                continue;
            }
            let filter = self.constraint.inject(map.filter(&layer.id), year);
            match map.set_filter(&layer.id, filter) {
                Ok(()) => updated += 1,
                Err(e) => log::warn!("Failed to update filter of layer '{}': {}", layer.id, e),
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Style, StyleLayer};
    use chronofilter_types::filter::FilterExpression;
    use serde_json::json;

    fn style() -> Style {
        Style::new()
            .with_layer(StyleLayer::new("background"))
            .and_then(|s| s.with_layer(StyleLayer::new("water").with_source_layer("water")))
            .and_then(|s| {
                s.with_layer(
                    StyleLayer::new("buildings")
                        .with_source_layer("buildings")
                        .with_filter(FilterExpression::from_value(json!(["==", "type", "building"]))),
                )
            })
            .unwrap()
    }

    #[test]
    fn test_only_feature_layers_are_filtered() {
        let mut style = style();
        let date = CalendarDate::new(1850, 1, 1).unwrap();
        let updated = TemporalFilterController::default().apply_instant(&mut style, date);

        assert_eq!(updated, 2);
        assert_eq!(style.filter("background"), None);
        assert_eq!(
            style.filter("water").unwrap().to_value()[1][2],
            json!(["<=", "start_decdate", 1850.0])
        );
        assert_eq!(
            style.filter("buildings").unwrap().to_value()[3],
            json!(["==", "type", "building"])
        );
    }

    #[test]
    fn test_repeated_dates_are_idempotent() {
        let controller = TemporalFilterController::default();
        let date = CalendarDate::new(1900, 7, 1).unwrap();

        let mut once = style();
        controller.apply_instant(&mut once, date);

        let mut many = style();
        for year in [1500, 1900, 2000] {
            controller.apply_instant(&mut many, CalendarDate::new(year, 1, 1).unwrap());
        }
        controller.apply_instant(&mut many, date);

        for id in ["water", "buildings"] {
            assert_eq!(once.filter(id), many.filter(id));
        }
    }

    #[test]
    fn test_custom_properties_from_config() {
        let config = Config::default().with_properties("valid_from", "valid_to");
        let controller = TemporalFilterController::from_config(&config);
        let mut style = style();
        controller.apply_decimal_year(&mut style, 1200.5);

        let filter = style.filter("water").unwrap().to_value();
        assert_eq!(filter[2][2], json!([">=", "valid_to", 1200.5]));
    }
}
