//! Player builder for flexible configuration
//!
//! This module provides a builder pattern for creating a [`Player`] with a
//! validated configuration, a style loaded from JSON and a custom clock.

use crate::animation::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{ChronoFilterError, Result};
use crate::state::{HashParams, StateStore};
use crate::state_sync::Player;
use crate::style::{Style, StyleMap};
use std::path::PathBuf;

/// Builder for a [`Player`] with custom configuration and clock.
#[derive(Debug)]
pub struct PlayerBuilder<C = SystemClock> {
    config: Config,
    config_path: Option<PathBuf>,
    clock: C,
}

impl PlayerBuilder<SystemClock> {
    /// Create a new builder with the default configuration and system clock.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            config_path: None,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> PlayerBuilder<C> {
    /// Set the configuration (properties, playback defaults, styles).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self.config_path = None;
        self
    }

    /// Load the configuration from a JSON (or, with the `toml` feature, TOML) file at build time.
    pub fn config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Use another source of "today".
    pub fn clock<C2: Clock>(self, clock: C2) -> PlayerBuilder<C2> {
        PlayerBuilder {
            config: self.config,
            config_path: self.config_path,
            clock,
        }
    }

    /// Build a player over any map and state store. The configuration is validated.
    pub fn build<M: StyleMap, S: StateStore>(self, map: M, state: S) -> Result<Player<M, S, C>> {
        let config = match self.config_path {
            Some(path) => Config::load(path)?,
            None => self.config,
        };
        config.validate().map_err(ChronoFilterError::InvalidConfig)?;
        Ok(Player::new(map, state, self.clock, config))
    }

    /// Build a player over a style document and a serialized state string.
    pub fn build_from_json(
        self,
        style_json: &str,
        state: &str,
    ) -> Result<Player<Style, HashParams, C>> {
        let style = Style::from_json(style_json)?;
        self.build(style, HashParams::parse(state))
    }
}

impl Default for PlayerBuilder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}
