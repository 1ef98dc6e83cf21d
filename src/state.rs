//! External application state.
//!
//! The temporal filter reads its inputs from, and publishes the playback date
//! to, a key-value store serialized as a single string (a URL fragment such
//! as `map=5/40.7/-74.0&date=1900-05-17` in a browser deployment).

use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;

/// ISO date shown when no playback range is set
pub const DATE_KEY: &str = "date";
/// First date of a playback range
pub const START_DATE_KEY: &str = "start_date";
/// Last date of a playback range
pub const END_DATE_KEY: &str = "end_date";
/// ISO duration each playback frame advances by
pub const INTERVAL_KEY: &str = "interval";
/// Playback frames per second
pub const FRAMERATE_KEY: &str = "framerate";
/// Style code selecting the style document
pub const LAYER_KEY: &str = "layer";
/// Map position, owned by the map widget
pub const MAP_KEY: &str = "map";

/// Trait for external state store implementations
pub trait StateStore {
    /// First value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous values
    fn set(&mut self, key: &str, value: &str);

    /// Serialize the whole store to its string form
    fn serialize(&self) -> String;

    /// Replace the whole store with a serialized state
    fn replace(&mut self, serialized: &str);
}

/// Upgrade a bare legacy map position (`5/40.7/-74.0`) to `map=5/40.7/-74.0`.
///
/// A leading `#` is dropped. Strings that already hold `key=value` pairs,
/// and the empty string, are returned unchanged.
pub fn upgrade_legacy_hash(hash: &str) -> Cow<'_, str> {
    let hash = hash.strip_prefix('#').unwrap_or(hash);
    if hash.is_empty() || hash.contains('=') {
        Cow::Borrowed(hash)
    } else {
        Cow::Owned(format!("{MAP_KEY}={hash}"))
    }
}

/// Ordered, form-encoded key-value pairs.
///
/// # Examples
///
/// ```rust
/// use chronofilter::state::{HashParams, StateStore};
///
/// let mut params = HashParams::parse("#map=5/40.7/-74.0&date=1900");
/// assert_eq!(params.get("date").as_deref(), Some("1900"));
///
/// params.set("date", "1901-01-01");
/// assert_eq!(params.to_string(), "map=5%2F40.7%2F-74.0&date=1901-01-01");
///
/// // Legacy fragments are upgraded
/// assert_eq!(HashParams::parse("5/40.7/-74.0").get("map").as_deref(), Some("5/40.7/-74.0"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashParams {
    pairs: SmallVec<[(String, String); 8]>,
}

impl HashParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a serialized state, upgrading legacy fragments first.
    pub fn parse(text: &str) -> Self {
        let text = upgrade_legacy_hash(text);
        let pairs = form_urlencoded::parse(text.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`HashParams::get`], treating an empty value as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(first) => {
                self.pairs[first].1 = value.to_string();
                let mut index = 0;
                self.pairs.retain(|(k, _)| {
                    let keep = index <= first || k != key;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for HashParams {
    /// `application/x-www-form-urlencoded`, byte for byte what a browser's
    /// `URLSearchParams` writes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish();
        f.write_str(&encoded)
    }
}

impl StateStore for HashParams {
    fn get(&self, key: &str) -> Option<String> {
        HashParams::get(self, key).map(str::to_string)
    }

    fn set(&mut self, key: &str, value: &str) {
        HashParams::set(self, key, value);
    }

    fn serialize(&self) -> String {
        self.to_string()
    }

    fn replace(&mut self, serialized: &str) {
        *self = HashParams::parse(serialized);
    }
}
