//! Async event loop driving a [`Player`] on a tokio runtime.
//!
//! Hosts that do not run their own event loop can hand state changes to
//! [`Player::run`] over a channel; frames are scheduled with a
//! `tokio::time::Interval` at the active session's frame rate.

use crate::animation::{Clock, MAX_FRAME_RATE, MIN_FRAME_RATE, SessionToken};
use crate::state::StateStore;
use crate::state_sync::Player;
use crate::style::StyleMap;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// The serialized state before and after an external edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub old: String,
    pub new: String,
}

impl StateChange {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

type Ticker = Option<(SessionToken, Interval)>;

impl<M, S, C> Player<M, S, C>
where
    M: StyleMap,
    S: StateStore,
    C: Clock,
{
    /// Load the stored state, then handle state changes and frames until
    /// the sender side of `events` is dropped.
    ///
    /// Each change replaces the store's content with `new` before it is
    /// planned. Frames fire one frame interval after their session starts.
    pub async fn run(&mut self, mut events: UnboundedReceiver<StateChange>) {
        self.on_load();
        let mut ticker: Ticker = None;

        loop {
            self.sync_ticker(&mut ticker);
            tokio::select! {
                event = events.recv() => match event {
                    Some(change) => {
                        self.state.replace(&change.new);
                        self.on_state_change(&change.old, &change.new);
                    }
                    None => break,
                },
                token = next_tick(&mut ticker) => {
                    let outcome = self.on_tick(token);
                    log::trace!("Tick of {:?}: {:?}", token, outcome);
                }
            }
        }

        log::debug!("State channel closed, stopping player");
        self.stop();
    }

    /// Keep the ticker pointed at the active session.
    fn sync_ticker(&self, ticker: &mut Ticker) {
        let Some(session) = self.scheduler.session() else {
            *ticker = None;
            return;
        };
        if matches!(ticker, Some((token, _)) if *token == session.token()) {
            return;
        }

        let period = session.frame_interval().clamp(
            std::time::Duration::from_secs_f64(1.0 / MAX_FRAME_RATE),
            std::time::Duration::from_secs_f64(1.0 / MIN_FRAME_RATE),
        );
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        *ticker = Some((session.token(), interval));
    }
}

async fn next_tick(ticker: &mut Ticker) -> SessionToken {
    match ticker {
        Some((token, interval)) => {
            interval.tick().await;
            *token
        }
        None => std::future::pending().await,
    }
}
