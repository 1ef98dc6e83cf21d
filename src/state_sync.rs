//! Keeps the map in step with the external state store.
//!
//! Deciding what to do about a state change is pure: [`plan_load`] and
//! [`plan_state_change`] turn parsed state into an [`Action`]. [`Player`]
//! is the thin shell that owns the map, the store and the scheduler and
//! carries those actions out when the host delivers load, change and timer
//! events.

use crate::animation::{
    AnimationScheduler, Clock, PlaybackRequest, SessionToken, TickOutcome, parse_frame_rate,
};
use crate::config::Config;
use crate::controller::TemporalFilterController;
use crate::state::{
    DATE_KEY, END_DATE_KEY, FRAMERATE_KEY, HashParams, INTERVAL_KEY, LAYER_KEY, START_DATE_KEY,
    StateStore,
};
use crate::style::StyleMap;
use chronofilter_types::date::CalendarDate;
use chronofilter_types::duration::Duration;

/// What the state asks the map to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// A single date
    Instant(CalendarDate),
    /// A time-lapse; either bound may be missing or malformed
    Range {
        start: Option<CalendarDate>,
        end: Option<CalendarDate>,
    },
}

impl PlaybackState {
    /// Derive the playback state from the store's keys.
    ///
    /// A non-empty `start_date` or `end_date` selects playback. Otherwise the
    /// `date` key is shown, or `today` when it is missing or empty. Returns
    /// `None` when `date` is present but cannot be parsed.
    pub fn from_params(params: &HashParams, today: CalendarDate) -> Option<Self> {
        if has_range(params) {
            return Some(PlaybackState::Range {
                start: params.get_non_empty(START_DATE_KEY).and_then(parse_date),
                end: params.get_non_empty(END_DATE_KEY).and_then(parse_date),
            });
        }
        match params.get_non_empty(DATE_KEY) {
            Some(text) => parse_date(text).map(PlaybackState::Instant),
            None => Some(PlaybackState::Instant(today)),
        }
    }
}

/// What to do in response to a load or state change.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Nothing the temporal filter owns changed
    None,
    /// Stop any playback and filter the map by a date
    ShowInstant(CalendarDate),
    /// Stop any playback, leaving the filters as they are
    Stop,
    /// Start (or restart) playback
    Animate(PlaybackRequest),
}

fn parse_date(text: &str) -> Option<CalendarDate> {
    CalendarDate::parse_iso(text)
}

fn has_range(params: &HashParams) -> bool {
    params.get_non_empty(START_DATE_KEY).is_some() || params.get_non_empty(END_DATE_KEY).is_some()
}

fn playback_request(
    params: &HashParams,
    config: &Config,
    start: Option<CalendarDate>,
    end: Option<CalendarDate>,
) -> PlaybackRequest {
    let step = match params.get(INTERVAL_KEY) {
        Some(text) => Duration::parse(text).unwrap_or_else(|| {
            log::debug!("Unusable interval {:?}, using {}", text, config.default_interval);
            config.default_interval
        }),
        None => config.default_interval,
    };
    let frame_rate = parse_frame_rate(params.get(FRAMERATE_KEY), config.default_frame_rate);
    PlaybackRequest::new(start)
        .with_end(end)
        .with_step(step)
        .with_frame_rate(frame_rate)
}

fn instant_action(params: &HashParams, today: CalendarDate, otherwise: Action) -> Action {
    match PlaybackState::from_params(params, today) {
        Some(PlaybackState::Instant(date)) => Action::ShowInstant(date),
        _ => {
            log::warn!(
                "Ignoring unparseable date {:?}",
                params.get(DATE_KEY).unwrap_or_default()
            );
            otherwise
        }
    }
}

/// Decide what to show when the map first loads.
pub fn plan_load(params: &HashParams, config: &Config, today: CalendarDate) -> Action {
    if has_range(params) {
        let (start, end) = match PlaybackState::from_params(params, today) {
            Some(PlaybackState::Range { start, end }) => (start, end),
            _ => (None, None),
        };
        return Action::Animate(playback_request(params, config, start, end));
    }
    instant_action(params, today, Action::None)
}

/// Decide what to do when the state changes from `old` to `new`.
///
/// While a range is set only changes to its bounds matter: editing `date`
/// mid-playback is picked up by the next frame instead. Without a range a
/// changed `date` is shown. Removing the range stops playback.
///
/// # Examples
///
/// ```rust
/// use chronofilter::Config;
/// use chronofilter::state::HashParams;
/// use chronofilter::state_sync::{Action, plan_state_change};
/// use chronofilter_types::date::CalendarDate;
///
/// let today = CalendarDate::new(2024, 5, 1).unwrap();
/// let old = HashParams::parse("map=5/40/-74&date=1900");
/// let new = HashParams::parse("map=6/40/-74&date=1900");
/// assert_eq!(plan_state_change(&old, &new, &Config::default(), today), Action::None);
///
/// let new = HashParams::parse("map=5/40/-74&date=1901-02");
/// assert_eq!(
///     plan_state_change(&old, &new, &Config::default(), today),
///     Action::ShowInstant(CalendarDate::new(1901, 2, 1).unwrap())
/// );
/// ```
pub fn plan_state_change(
    old: &HashParams,
    new: &HashParams,
    config: &Config,
    today: CalendarDate,
) -> Action {
    if has_range(new) {
        let bounds_changed = old.get(START_DATE_KEY) != new.get(START_DATE_KEY)
            || old.get(END_DATE_KEY) != new.get(END_DATE_KEY);
        return if bounds_changed {
            plan_load(new, config, today)
        } else {
            Action::None
        };
    }

    if has_range(old) {
        return instant_action(new, today, Action::Stop);
    }
    if old.get(DATE_KEY) != new.get(DATE_KEY) {
        return instant_action(new, today, Action::None);
    }
    Action::None
}

/// Drives a map from an external state store.
///
/// The host forwards its events: [`Player::on_load`] once the style is
/// ready, [`Player::on_state_change`] after the store changed and
/// [`Player::on_tick`] for every frame of the active session, waiting
/// [`crate::animation::AnimationSession::frame_interval`] between frames.
pub struct Player<M, S, C> {
    pub(crate) map: M,
    pub(crate) state: S,
    pub(crate) clock: C,
    pub(crate) scheduler: AnimationScheduler,
    pub(crate) config: Config,
}

impl<M, S, C> Player<M, S, C>
where
    M: StyleMap,
    S: StateStore,
    C: Clock,
{
    pub fn new(map: M, state: S, clock: C, config: Config) -> Self {
        let controller = TemporalFilterController::from_config(&config);
        Self {
            map,
            state,
            clock,
            scheduler: AnimationScheduler::new(controller),
            config,
        }
    }

    /// Apply the stored state to a freshly loaded map.
    ///
    /// Returns the token of the playback session started, if any.
    pub fn on_load(&mut self) -> Option<SessionToken> {
        let params = HashParams::parse(&self.state.serialize());
        let action = plan_load(&params, &self.config, self.clock.today());
        self.execute(action)
    }

    /// React to the store having changed from `old` to `new`.
    ///
    /// Returns the token of the playback session started, if any.
    pub fn on_state_change(&mut self, old: &str, new: &str) -> Option<SessionToken> {
        let action = plan_state_change(
            &HashParams::parse(old),
            &HashParams::parse(new),
            &self.config,
            self.clock.today(),
        );
        self.execute(action)
    }

    /// Run one frame of the session identified by `token`.
    pub fn on_tick(&mut self, token: SessionToken) -> TickOutcome {
        let today = self.clock.today();
        self.scheduler
            .tick(token, &mut self.map, &mut self.state, today)
    }

    /// Stop any playback.
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Carry out a planned action.
    pub fn execute(&mut self, action: Action) -> Option<SessionToken> {
        match action {
            Action::None => None,
            Action::Stop => {
                self.scheduler.stop();
                None
            }
            Action::ShowInstant(date) => {
                self.scheduler.stop();
                self.scheduler.controller().apply_instant(&mut self.map, date);
                None
            }
            Action::Animate(request) => Some(self.scheduler.start(request)),
        }
    }

    /// URL of the style selected by the store's `layer` key.
    pub fn style_url(&self) -> Option<&str> {
        let code = self.state.get(LAYER_KEY).filter(|code| !code.is_empty());
        self.config.style_url(code.as_deref())
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_parts(self) -> (M, S) {
        (self.map, self.state)
    }
}
