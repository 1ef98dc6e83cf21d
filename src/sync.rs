//! Thread-safe wrapper for sharing a player between threads.
//!
//! Playback itself is single-threaded: every event is handled to completion
//! before the next. `SyncPlayer` serializes events that arrive from several
//! threads (a UI thread delivering state changes and a timer thread
//! delivering frames) through one `Arc<RwLock<Player>>`.
//!
//! # Features
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! chronofilter = { version = "0.1", features = ["sync"] }
//! ```

use crate::animation::{Clock, SessionToken, TickOutcome};
use crate::state::StateStore;
use crate::state_sync::Player;
use crate::style::StyleMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe wrapper around [`Player`] using `Arc<RwLock<Player>>`.
///
/// Implements `Clone` for sharing; every event takes the write lock, so
/// events are applied one at a time in the order the lock is acquired.
pub struct SyncPlayer<M, S, C> {
    inner: Arc<RwLock<Player<M, S, C>>>,
}

impl<M, S, C> Clone for SyncPlayer<M, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, S, C> SyncPlayer<M, S, C>
where
    M: StyleMap,
    S: StateStore,
    C: Clock,
{
    pub fn new(player: Player<M, S, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(player)),
        }
    }

    /// See [`Player::on_load`].
    pub fn on_load(&self) -> Option<SessionToken> {
        self.inner.write().on_load()
    }

    /// See [`Player::on_state_change`].
    pub fn on_state_change(&self, old: &str, new: &str) -> Option<SessionToken> {
        self.inner.write().on_state_change(old, new)
    }

    /// See [`Player::on_tick`].
    pub fn on_tick(&self, token: SessionToken) -> TickOutcome {
        self.inner.write().on_tick(token)
    }

    /// See [`Player::stop`].
    pub fn stop(&self) {
        self.inner.write().stop();
    }

    /// Whether a playback session is running.
    pub fn is_running(&self) -> bool {
        self.inner.read().scheduler().is_running()
    }

    /// Acquires a read lock for direct access to the player.
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, Player<M, S, C>> {
        self.inner.read()
    }

    /// Acquires a write lock for direct access to the player.
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, Player<M, S, C>> {
        self.inner.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::FixedClock;
    use crate::config::Config;
    use crate::state::HashParams;
    use crate::style::{Style, StyleLayer};
    use chronofilter_types::date::CalendarDate;
    use std::thread;

    fn shared(state: &str) -> SyncPlayer<Style, HashParams, FixedClock> {
        let style = Style::new()
            .with_layer(StyleLayer::new("places").with_source_layer("places"))
            .unwrap();
        let today = CalendarDate::new(2000, 1, 1).unwrap();
        SyncPlayer::new(Player::new(
            style,
            HashParams::parse(state),
            FixedClock(today),
            Config::default(),
        ))
    }

    #[test]
    fn test_sync_player_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncPlayer<Style, HashParams, FixedClock>>();
    }

    #[test]
    fn test_ticks_from_another_thread() {
        let player = shared("start_date=1900&interval=P10Y");
        let token = player.on_load().unwrap();

        let ticker = player.clone();
        let handle = thread::spawn(move || {
            (0..20)
                .map(|_| ticker.on_tick(token))
                .filter(|outcome| matches!(outcome, TickOutcome::Advanced(_)))
                .count()
        });
        let advanced = handle.join().unwrap();

        // 1910 through 2000
        assert_eq!(advanced, 10);
        assert!(!player.is_running());
        assert_eq!(player.read().state().get("date"), Some("2000-01-01"));
    }

    #[test]
    fn test_stop_invalidates_pending_ticks() {
        let player = shared("start_date=1900");
        let token = player.on_load().unwrap();
        player.stop();

        let ticker = player.clone();
        let outcome = thread::spawn(move || ticker.on_tick(token)).join().unwrap();
        assert_eq!(outcome, TickOutcome::Stale);
        assert_eq!(player.read().map().filter_updates(), 0);
    }
}
