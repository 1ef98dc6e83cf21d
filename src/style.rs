//! Map style abstraction for chronofilter
//!
//! The renderer owns the style and its per-layer filters. This module
//! provides a trait for the operations the temporal filter needs from it and
//! an in-memory style document implementing that trait.

use crate::error::{ChronoFilterError, Result};
use chronofilter_types::filter::FilterExpression;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A style layer as seen by the temporal filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    pub id: String,
    /// Name of the vector source layer the features come from, if any
    pub source_layer: Option<String>,
}

impl LayerInfo {
    /// Whether the layer draws features that can carry date properties.
    pub fn is_feature_layer(&self) -> bool {
        self.source_layer.is_some()
    }
}

/// Trait for map style implementations
///
/// Filter changes take effect immediately; redrawing is the implementor's
/// concern.
pub trait StyleMap {
    /// All layers, in style order
    fn layers(&self) -> Vec<LayerInfo>;

    /// The current filter of a layer
    fn filter(&self, layer_id: &str) -> Option<FilterExpression>;

    /// Replace the filter of a layer
    fn set_filter(&mut self, layer_id: &str, filter: FilterExpression) -> Result<()>;
}

impl<T: StyleMap + ?Sized> StyleMap for Box<T> {
    fn layers(&self) -> Vec<LayerInfo> {
        (**self).layers()
    }

    fn filter(&self, layer_id: &str) -> Option<FilterExpression> {
        (**self).filter(layer_id)
    }

    fn set_filter(&mut self, layer_id: &str, filter: FilterExpression) -> Result<()> {
        (**self).set_filter(layer_id, filter)
    }
}

/// One layer of a style document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleLayer {
    pub id: String,
    #[serde(
        rename = "source-layer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterExpression>,
    /// Paint, layout and every other layer property, untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StyleLayer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_layer: None,
            filter: None,
            extra: Map::new(),
        }
    }

    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    pub fn with_filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct StyleDocument {
    #[serde(default)]
    layers: Vec<StyleLayer>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// In-memory style document.
///
/// # Examples
///
/// ```rust
/// use chronofilter::style::{Style, StyleMap};
///
/// let style = Style::from_json(r#"{
///     "version": 8,
///     "layers": [
///         {"id": "background", "type": "background"},
///         {"id": "buildings", "type": "fill", "source-layer": "buildings",
///          "filter": ["==", "type", "building"]}
///     ]
/// }"#)?;
///
/// let feature_layers: Vec<_> = style.layers().into_iter().filter(|l| l.is_feature_layer()).collect();
/// assert_eq!(feature_layers.len(), 1);
/// assert!(style.filter("buildings").is_some());
/// # Ok::<(), chronofilter::ChronoFilterError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StyleDocument", into = "StyleDocument")]
pub struct Style {
    layers: Vec<StyleLayer>,
    extra: Map<String, Value>,
    index: FxHashMap<String, usize>,
    filter_updates: u64,
}

impl Style {
    /// Create an empty style
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            extra: Map::new(),
            index: FxHashMap::default(),
            filter_updates: 0,
        }
    }

    /// Parse a style document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the style document, including current filters
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Append a layer; layer ids must be unique
    pub fn add_layer(&mut self, layer: StyleLayer) -> Result<()> {
        if self.index.contains_key(&layer.id) {
            return Err(ChronoFilterError::InvalidStyle(format!(
                "Duplicate layer id: {}",
                layer.id
            )));
        }
        self.index.insert(layer.id.clone(), self.layers.len());
        self.layers.push(layer);
        Ok(())
    }

    pub fn with_layer(mut self, layer: StyleLayer) -> Result<Self> {
        self.add_layer(layer)?;
        Ok(self)
    }

    pub fn layer(&self, layer_id: &str) -> Option<&StyleLayer> {
        self.index.get(layer_id).map(|&i| &self.layers[i])
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Diagnostic count of filter writes since the style was created.
    ///
    /// Hosts that repaint lazily can compare it between frames to tell
    /// whether a redraw is due. It is not part of the document: it is never
    /// serialized and two styles with the same layers compare equal whatever
    /// their counts.
    pub fn filter_updates(&self) -> u64 {
        self.filter_updates
    }
}

impl PartialEq for Style {
    fn eq(&self, other: &Self) -> bool {
        self.layers == other.layers && self.extra == other.extra
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleMap for Style {
    fn layers(&self) -> Vec<LayerInfo> {
        self.layers
            .iter()
            .map(|layer| LayerInfo {
                id: layer.id.clone(),
                source_layer: layer.source_layer.clone(),
            })
            .collect()
    }

    fn filter(&self, layer_id: &str) -> Option<FilterExpression> {
        self.layer(layer_id).and_then(|layer| layer.filter.clone())
    }

    fn set_filter(&mut self, layer_id: &str, filter: FilterExpression) -> Result<()> {
        let Some(&i) = self.index.get(layer_id) else {
            return Err(ChronoFilterError::UnknownLayer(layer_id.to_string()));
        };
        self.layers[i].filter = Some(filter);
        self.filter_updates += 1;
        Ok(())
    }
}

impl TryFrom<StyleDocument> for Style {
    type Error = ChronoFilterError;

    fn try_from(document: StyleDocument) -> Result<Self> {
        let mut style = Style::new();
        style.extra = document.extra;
        for layer in document.layers {
            style.add_layer(layer)?;
        }
        Ok(style)
    }
}

impl From<Style> for StyleDocument {
    fn from(style: Style) -> Self {
        StyleDocument {
            layers: style.layers,
            extra: style.extra,
        }
    }
}
