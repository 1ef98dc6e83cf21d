//! Time-lapse playback.
//!
//! An [`AnimationScheduler`] owns at most one [`AnimationSession`]. The host
//! event loop calls [`AnimationScheduler::tick`] once per frame with the
//! token of the session that scheduled the frame. Each tick reads the
//! current date from the state store, advances it by the session's step,
//! filters the map by the new date and publishes it back, until the next
//! date would pass today.
//!
//! Starting a new session or stopping invalidates every earlier token, so a
//! frame that was already queued when its session ended does nothing.

use crate::controller::TemporalFilterController;
use crate::state::{DATE_KEY, StateStore};
use crate::style::StyleMap;
use chronofilter_types::date::{CalendarDate, DateRange};
use chronofilter_types::duration::Duration;
use once_cell::sync::Lazy;
use regex::Regex;

/// Leading decimal number, as browsers read `parseFloat` input.
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("static number pattern")
});

/// Slowest frame rate played; one frame every 1000 seconds.
pub const MIN_FRAME_RATE: f64 = 0.001;

/// Fastest frame rate played.
pub const MAX_FRAME_RATE: f64 = 1000.0;

/// Source of the current UTC date.
pub trait Clock {
    fn today(&self) -> CalendarDate;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> CalendarDate {
        chrono::Utc::now().date_naive().into()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub CalendarDate);

impl Clock for FixedClock {
    fn today(&self) -> CalendarDate {
        self.0
    }
}

/// Parse a frame rate the way the `framerate` state key is read.
///
/// The leading number of `text` is used (`"2.5fps"` is 2.5). Missing,
/// non-numeric, zero, negative and non-finite rates yield `default`.
pub fn parse_frame_rate(text: Option<&str>, default: f64) -> f64 {
    text.and_then(|text| LEADING_NUMBER.find(text))
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|rate| rate.is_finite() && *rate > 0.0)
        .unwrap_or(default)
}

/// Identifies one animation session; ticks carrying an older token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

/// Parameters of a playback run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    /// Date to advance from while the state store holds no `date`
    pub start: Option<CalendarDate>,
    /// Accepted for symmetry; playback stops at today, not here
    pub end: Option<CalendarDate>,
    pub step: Duration,
    pub frame_rate: f64,
}

impl PlaybackRequest {
    /// One year per frame at one frame per second.
    pub fn new(start: Option<CalendarDate>) -> Self {
        Self {
            start,
            end: None,
            step: Duration::years(1),
            frame_rate: 1.0,
        }
    }

    pub fn with_end(mut self, end: Option<CalendarDate>) -> Self {
        self.end = end;
        self
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Set the frame rate; unusable rates fall back to one frame per second
    /// and the rest are clamped to [`MIN_FRAME_RATE`]..=[`MAX_FRAME_RATE`].
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = if frame_rate.is_finite() && frame_rate > 0.0 {
            frame_rate.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE)
        } else {
            1.0
        };
        self
    }
}

/// A running playback.
#[derive(Debug, Clone)]
pub struct AnimationSession {
    token: SessionToken,
    request: PlaybackRequest,
    frames: u64,
}

impl AnimationSession {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn start_date(&self) -> Option<CalendarDate> {
        self.request.start
    }

    pub fn end_date(&self) -> Option<CalendarDate> {
        self.request.end
    }

    pub fn step(&self) -> Duration {
        self.request.step
    }

    pub fn frame_rate(&self) -> f64 {
        self.request.frame_rate
    }

    /// Wall-clock time between frames.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::try_from_secs_f64(1.0 / self.request.frame_rate)
            .unwrap_or(std::time::Duration::from_secs(1))
    }

    /// Frames that advanced the date so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belongs to a session that is no longer running
    Stale,
    /// No usable current date; the session keeps running
    Waiting,
    /// The map now shows this date and it was published
    Advanced(CalendarDate),
    /// The next date would pass today or leave the four-digit year range;
    /// the session ended
    Finished,
}

/// Owns the single active playback session.
#[derive(Debug, Default)]
pub struct AnimationScheduler {
    controller: TemporalFilterController,
    session: Option<AnimationSession>,
    generation: u64,
}

impl AnimationScheduler {
    pub fn new(controller: TemporalFilterController) -> Self {
        Self {
            controller,
            session: None,
            generation: 0,
        }
    }

    pub fn controller(&self) -> &TemporalFilterController {
        &self.controller
    }

    pub fn session(&self) -> Option<&AnimationSession> {
        self.session.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Start a session, cancelling any running one.
    pub fn start(&mut self, request: PlaybackRequest) -> SessionToken {
        self.stop();
        self.generation += 1;
        let token = SessionToken(self.generation);
        log::info!(
            "Starting playback from {} by {} at {} fps",
            request
                .start
                .map_or_else(|| "<stored date>".to_string(), |date| date.to_string()),
            request.step,
            request.frame_rate
        );
        self.session = Some(AnimationSession {
            token,
            request,
            frames: 0,
        });
        token
    }

    /// Cancel the running session, if any.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            log::info!("Stopped playback after {} frames", session.frames);
        }
    }

    /// Run one frame of the session identified by `token`.
    ///
    /// The current date is the stored `date` (a partial date counts from its
    /// first day), or the session's start date when none is stored.
    pub fn tick<M, S>(
        &mut self,
        token: SessionToken,
        map: &mut M,
        state: &mut S,
        today: CalendarDate,
    ) -> TickOutcome
    where
        M: StyleMap + ?Sized,
        S: StateStore + ?Sized,
    {
        let Some(session) = self.session.as_mut().filter(|s| s.token == token) else {
            log::debug!("Ignoring tick of stale session {:?}", token);
            return TickOutcome::Stale;
        };

        let current = match state.get(DATE_KEY).filter(|text| !text.is_empty()) {
            Some(text) => DateRange::from_iso(&text).map(|range| range.start),
            None => session.request.start,
        };
        let Some(current) = current else {
            log::debug!("No current date to advance");
            return TickOutcome::Waiting;
        };

        match session.request.step.advance(current) {
            Some(next) if next <= today && next.is_iso_representable() => {
                self.controller.apply_instant(map, next);
                state.set(DATE_KEY, &next.to_string());
                session.frames += 1;
                TickOutcome::Advanced(next)
            }
            _ => {
                log::info!("Playback reached its last date after {} frames", session.frames);
                self.session = None;
                TickOutcome::Finished
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HashParams;
    use crate::style::{Style, StyleLayer};

    fn date(year: i32, month: u32, day: u32) -> CalendarDate {
        CalendarDate::new(year, month, day).unwrap()
    }

    fn style() -> Style {
        Style::new()
            .with_layer(StyleLayer::new("places").with_source_layer("places"))
            .unwrap()
    }

    fn shown_year(style: &Style) -> Option<f64> {
        let filter = style.filter("places")?;
        TemporalFilterController::default()
            .constraint()
            .constrained_years(&filter)
            .map(|(start, _)| start)
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate(Some("2"), 1.0), 2.0);
        assert_eq!(parse_frame_rate(Some("2.5fps"), 1.0), 2.5);
        assert_eq!(parse_frame_rate(Some(" .5"), 1.0), 0.5);
        assert_eq!(parse_frame_rate(Some("0"), 1.0), 1.0);
        assert_eq!(parse_frame_rate(Some("-3"), 1.0), 1.0);
        assert_eq!(parse_frame_rate(Some("fast"), 1.0), 1.0);
        assert_eq!(parse_frame_rate(None, 4.0), 4.0);
    }

    #[test]
    fn test_request_sanitizes_frame_rate() {
        let request = PlaybackRequest::new(None).with_frame_rate(0.0);
        assert_eq!(request.frame_rate, 1.0);
        let request = PlaybackRequest::new(None).with_frame_rate(f64::NAN);
        assert_eq!(request.frame_rate, 1.0);
    }

    #[test]
    fn test_extreme_frame_rates_are_clamped() {
        let slow = PlaybackRequest::new(None).with_frame_rate(parse_frame_rate(Some("1e-20"), 1.0));
        assert_eq!(slow.frame_rate, MIN_FRAME_RATE);
        let fast = PlaybackRequest::new(None).with_frame_rate(1e300);
        assert_eq!(fast.frame_rate, MAX_FRAME_RATE);

        let mut scheduler = AnimationScheduler::default();
        scheduler.start(slow);
        assert_eq!(
            scheduler.session().unwrap().frame_interval(),
            std::time::Duration::from_secs(1000)
        );
    }

    #[test]
    fn test_frame_interval() {
        let mut scheduler = AnimationScheduler::default();
        scheduler.start(PlaybackRequest::new(None).with_frame_rate(4.0));
        assert_eq!(
            scheduler.session().unwrap().frame_interval(),
            std::time::Duration::from_millis(250)
        );
    }

    #[test]
    fn test_ticks_advance_by_one_year_until_today() {
        let mut scheduler = AnimationScheduler::default();
        let mut map = style();
        let mut state = HashParams::new();
        let today = date(1903, 6, 1);

        let token = scheduler.start(PlaybackRequest::new(Some(date(1900, 1, 1))));

        for year in 1901..=1903 {
            let outcome = scheduler.tick(token, &mut map, &mut state, today);
            assert_eq!(outcome, TickOutcome::Advanced(date(year, 1, 1)));
            assert_eq!(shown_year(&map), Some(f64::from(year)));
            assert_eq!(state.get(DATE_KEY), Some(format!("{year}-01-01").as_str()));
        }

        assert_eq!(scheduler.tick(token, &mut map, &mut state, today), TickOutcome::Finished);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.tick(token, &mut map, &mut state, today), TickOutcome::Stale);
        assert_eq!(map.filter_updates(), 3);
        assert_eq!(shown_year(&map), Some(1903.0));
    }

    #[test]
    fn test_stored_date_takes_precedence() {
        let mut scheduler = AnimationScheduler::default();
        let mut map = style();
        let mut state = HashParams::parse("date=1950-06");
        let token = scheduler.start(
            PlaybackRequest::new(Some(date(1800, 1, 1))).with_step(Duration::new(0, 1, 0)),
        );

        let outcome = scheduler.tick(token, &mut map, &mut state, date(2000, 1, 1));
        assert_eq!(outcome, TickOutcome::Advanced(date(1950, 7, 1)));

        // An edit between frames is picked up by the next one
        state.set(DATE_KEY, "1700-01-01");
        let outcome = scheduler.tick(token, &mut map, &mut state, date(2000, 1, 1));
        assert_eq!(outcome, TickOutcome::Advanced(date(1700, 2, 1)));
    }

    #[test]
    fn test_unparseable_stored_date_waits() {
        let mut scheduler = AnimationScheduler::default();
        let mut map = style();
        let mut state = HashParams::parse("date=yesterday");
        let token = scheduler.start(PlaybackRequest::new(Some(date(1800, 1, 1))));

        let outcome = scheduler.tick(token, &mut map, &mut state, date(2000, 1, 1));
        assert_eq!(outcome, TickOutcome::Waiting);
        assert!(scheduler.is_running());
        assert_eq!(map.filter_updates(), 0);
    }

    #[test]
    fn test_end_date_does_not_bound_playback() {
        let mut scheduler = AnimationScheduler::default();
        let mut map = style();
        let mut state = HashParams::new();
        let token = scheduler.start(
            PlaybackRequest::new(Some(date(1900, 1, 1))).with_end(Some(date(1901, 1, 1))),
        );

        let today = date(2000, 1, 1);
        scheduler.tick(token, &mut map, &mut state, today);
        let outcome = scheduler.tick(token, &mut map, &mut state, today);
        assert_eq!(outcome, TickOutcome::Advanced(date(1902, 1, 1)));
    }

    #[test]
    fn test_stale_tick_after_stop_is_ignored() {
        let mut scheduler = AnimationScheduler::default();
        let mut map = style();
        let mut state = HashParams::new();
        let token = scheduler.start(PlaybackRequest::new(Some(date(1900, 1, 1))));

        // The frame was queued, then playback stopped before it fired
        scheduler.stop();
        scheduler.stop();
        let outcome = scheduler.tick(token, &mut map, &mut state, date(2000, 1, 1));

        assert_eq!(outcome, TickOutcome::Stale);
        assert_eq!(map.filter_updates(), 0);
        assert_eq!(state.get(DATE_KEY), None);
    }

    #[test]
    fn test_restart_supersedes_previous_session() {
        let mut scheduler = AnimationScheduler::default();
        let mut map = style();
        let mut state = HashParams::new();
        let today = date(2000, 1, 1);

        let first = scheduler.start(PlaybackRequest::new(Some(date(1900, 1, 1))));
        let second = scheduler.start(
            PlaybackRequest::new(Some(date(1500, 1, 1))).with_step(Duration::years(10)),
        );
        assert_ne!(first, second);

        assert_eq!(scheduler.tick(first, &mut map, &mut state, today), TickOutcome::Stale);
        assert_eq!(
            scheduler.tick(second, &mut map, &mut state, today),
            TickOutcome::Advanced(date(1510, 1, 1))
        );
        assert_eq!(scheduler.session().map(|s| s.frames()), Some(1));
    }

    #[test]
    fn test_backwards_playback_stops_at_earliest_four_digit_year() {
        let mut scheduler = AnimationScheduler::default();
        let mut map = style();
        let mut state = HashParams::new();
        let token = scheduler
            .start(PlaybackRequest::new(Some(date(-9998, 1, 1))).with_step(Duration::years(-1)));
        let today = date(2000, 1, 1);

        assert_eq!(
            scheduler.tick(token, &mut map, &mut state, today),
            TickOutcome::Advanced(date(-9999, 1, 1))
        );
        assert_eq!(scheduler.tick(token, &mut map, &mut state, today), TickOutcome::Finished);
        assert!(!scheduler.is_running());
        assert_eq!(state.get(DATE_KEY), Some("-9999-01-01"));
        assert_eq!(map.filter_updates(), 1);
    }

    #[test]
    fn test_negative_years_publish_parseable_dates() {
        let mut scheduler = AnimationScheduler::default();
        let mut map = style();
        let mut state = HashParams::new();
        let token = scheduler.start(PlaybackRequest::new(Some(date(-3, 1, 1))));
        let today = date(2000, 1, 1);

        for expected in [-2, -1, 0, 1] {
            let outcome = scheduler.tick(token, &mut map, &mut state, today);
            assert_eq!(outcome, TickOutcome::Advanced(date(expected, 1, 1)));
        }
        assert_eq!(state.get(DATE_KEY), Some("0001-01-01"));
    }
}
