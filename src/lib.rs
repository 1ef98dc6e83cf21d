//! Temporal filtering and time-lapse playback for historical vector map styles.
//!
//! Features carry a validity interval as decimal years in two properties
//! (`start_decdate`, `end_decdate` by default). Filtering a style by a date
//! rewrites every feature layer's filter so that only features existing at
//! that date are drawn; playback advances the date frame by frame and
//! publishes it back to an external state store.
//!
//! ```rust
//! use chronofilter::prelude::*;
//!
//! let style = Style::new().with_layer(StyleLayer::new("roads").with_source_layer("transport"))?;
//! let mut player = PlayerBuilder::new()
//!     .clock(FixedClock(CalendarDate::new(2024, 1, 1).unwrap()))
//!     .build(style, HashParams::parse("start_date=2021&interval=P1Y"))?;
//!
//! let token = player.on_load().unwrap();
//! assert_eq!(player.on_tick(token), TickOutcome::Advanced(CalendarDate::new(2022, 1, 1).unwrap()));
//! assert_eq!(player.state().get("date"), Some("2022-01-01"));
//! # Ok::<(), chronofilter::ChronoFilterError>(())
//! ```

pub mod animation;
pub mod builder;
pub mod compute;
pub mod config;
pub mod controller;
pub mod error;
pub mod state;
pub mod state_sync;
pub mod style;

#[cfg(feature = "runtime")]
pub mod runtime;

#[cfg(feature = "sync")]
pub mod sync;

pub use animation::{
    AnimationScheduler, AnimationSession, Clock, FixedClock, PlaybackRequest, SessionToken,
    SystemClock, TickOutcome,
};
pub use builder::PlayerBuilder;
pub use compute::temporal::{DateConstraint, inject_date_constraint};
pub use config::Config;
pub use controller::TemporalFilterController;
pub use error::{ChronoFilterError, Result};
pub use state::{HashParams, StateStore};
pub use state_sync::{Action, PlaybackState, Player};
pub use style::{LayerInfo, Style, StyleLayer, StyleMap};

#[cfg(feature = "runtime")]
pub use runtime::StateChange;

#[cfg(feature = "sync")]
pub use sync::SyncPlayer;

pub use chronofilter_types;
pub use chronofilter_types::date::{CalendarDate, DateRange};
pub use chronofilter_types::duration::Duration;
pub use chronofilter_types::filter::FilterExpression;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ChronoFilterError, PlayerBuilder, Result};

    pub use crate::{CalendarDate, Duration, FilterExpression};

    pub use crate::{Config, TemporalFilterController};

    pub use crate::{FixedClock, Player, SystemClock, TickOutcome};

    pub use crate::{HashParams, StateStore, Style, StyleLayer, StyleMap};

    #[cfg(feature = "sync")]
    pub use crate::SyncPlayer;
}
