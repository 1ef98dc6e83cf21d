//! Configuration for temporal filtering and playback.
//!
//! `Config` is plain serde data so it can be loaded from JSON, TOML or any
//! other format, with defaults matching the historical map deployment.

use crate::error::{ChronoFilterError, Result};
use chronofilter_types::duration::Duration;
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Playback and filtering configuration.
///
/// # Example
///
/// ```rust
/// use chronofilter::Config;
/// use chronofilter_types::duration::Duration;
///
/// let config = Config::default();
/// assert_eq!(config.start_property, "start_decdate");
/// assert_eq!(config.default_interval, Duration::years(1));
///
/// let json = r#"{
///     "default_interval": "P10Y",
///     "default_frame_rate": 4.0
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.default_interval, Duration::years(10));
/// assert_eq!(config.end_property, "end_decdate");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Feature property holding the first decimal year a feature exists
    #[serde(default = "Config::default_start_property")]
    pub start_property: String,

    /// Feature property holding the last decimal year a feature exists
    #[serde(default = "Config::default_end_property")]
    pub end_property: String,

    /// Step used when the `interval` state key is missing or malformed
    #[serde(default = "Config::default_interval")]
    pub default_interval: Duration,

    /// Frames per second used when the `framerate` state key is unusable
    #[serde(default = "Config::default_frame_rate")]
    pub default_frame_rate: f64,

    /// Style code (the `layer` state key) to style document URL
    #[serde(default = "Config::default_styles")]
    pub styles: BTreeMap<String, String>,

    /// Style code used when `layer` is missing or unknown
    #[serde(default = "Config::default_style")]
    pub default_style: String,
}

impl Config {
    fn default_start_property() -> String {
        "start_decdate".to_string()
    }

    fn default_end_property() -> String {
        "end_decdate".to_string()
    }

    const fn default_interval() -> Duration {
        Duration::years(1)
    }

    const fn default_frame_rate() -> f64 {
        1.0
    }

    fn default_style() -> String {
        "O".to_string()
    }

    fn default_styles() -> BTreeMap<String, String> {
        const PRODUCTION: &str = "https://www.openhistoricalmap.org/map-styles";
        const STAGING: &str = "https://openhistoricalmap.github.io/map-styles";
        let documents = [
            ("O", "main/main.json"),
            ("R", "rail/rail.json"),
            ("J", "japanese_scroll/ohm-japanese-scroll-map.json"),
            ("W", "woodblock/woodblock.json"),
        ];

        let mut styles = BTreeMap::new();
        for (code, path) in documents {
            styles.insert(code.to_string(), format!("{PRODUCTION}/{path}"));
            styles.insert(format!("{code}_staging"), format!("{STAGING}/{path}"));
        }
        styles
    }

    pub fn with_properties(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_property = start.into();
        self.end_property = end.into();
        self
    }

    pub fn with_default_interval(mut self, interval: Duration) -> Self {
        self.default_interval = interval;
        self
    }

    pub fn with_default_frame_rate(mut self, frame_rate: f64) -> Self {
        self.default_frame_rate = frame_rate;
        self
    }

    /// Register or replace a style document for a style code.
    pub fn with_style(mut self, code: impl Into<String>, url: impl Into<String>) -> Self {
        self.styles.insert(code.into(), url.into());
        self
    }

    /// URL of the style for `code`, falling back to the default style.
    pub fn style_url(&self, code: Option<&str>) -> Option<&str> {
        code.and_then(|code| self.styles.get(code))
            .or_else(|| self.styles.get(&self.default_style))
            .map(String::as_str)
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.start_property.is_empty() || self.end_property.is_empty() {
            return Err("Date properties must not be empty".to_string());
        }
        if self.start_property == self.end_property {
            return Err("Start and end date properties must differ".to_string());
        }
        if self.default_interval.is_zero() {
            return Err("Default interval must not be zero".to_string());
        }
        if !self.default_frame_rate.is_finite() || self.default_frame_rate <= 0.0 {
            return Err(format!(
                "Default frame rate must be a positive number, got: {}",
                self.default_frame_rate
            ));
        }
        if !self.styles.is_empty() && !self.styles.contains_key(&self.default_style) {
            return Err(format!(
                "Default style '{}' is not in the style catalog",
                self.default_style
            ));
        }
        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a file, choosing the format by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::from_json(&contents)?),
            #[cfg(feature = "toml")]
            Some("toml") => Ok(Self::from_toml(&contents)?),
            other => Err(ChronoFilterError::InvalidConfig(format!(
                "Unsupported config format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_property: Self::default_start_property(),
            end_property: Self::default_end_property(),
            default_interval: Self::default_interval(),
            default_frame_rate: Self::default_frame_rate(),
            styles: Self::default_styles(),
            default_style: Self::default_style(),
        }
    }
}
