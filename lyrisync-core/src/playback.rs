//! The playback-source contract and a clock-driven implementation of it.

use crate::error::{CoreError, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

const LOG_TARGET: &str = "lyrisync::playback";

/// Snapshot of the playback clock, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackClock {
    pub current_time: f64,
    pub duration: f64,
    pub is_playing: bool,
}

/// Discrete notifications from a playback source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    Playing { position: f64 },
    Paused { position: f64 },
    Seeked { position: f64 },
    Ended,
}

/// Anything that plays media and reports its position.
pub trait PlaybackSource: Send + Sync {
    /// Current position in seconds.
    fn current_time(&self) -> f64;

    /// Track length in seconds.
    fn duration(&self) -> f64;

    fn is_playing(&self) -> bool;

    fn seek_to(&self, seconds: f64);

    fn play(&self);

    fn pause(&self);

    /// Volume in `0..=100`.
    fn set_volume(&self, volume: u8);

    /// Play, pause, seek and end notifications.
    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent>;

    fn clock(&self) -> PlaybackClock {
        PlaybackClock {
            current_time: self.current_time(),
            duration: self.duration(),
            is_playing: self.is_playing(),
        }
    }
}

#[derive(Debug)]
struct PlayerState {
    /// Position at `anchored_at`
    position: f64,
    anchored_at: Instant,
    is_playing: bool,
    volume: u8,
}

impl PlayerState {
    fn position_at(&self, now: Instant, duration: f64) -> f64 {
        if !self.is_playing {
            return self.position;
        }
        let elapsed = now.saturating_duration_since(self.anchored_at).as_secs_f64();
        (self.position + elapsed).min(duration)
    }

    fn anchor(&mut self, position: f64, now: Instant) {
        self.position = position;
        self.anchored_at = now;
    }
}

/// A player with no media behind it: position advances with the tokio clock
/// while playing and stops at the track duration.
#[derive(Debug)]
pub struct SimulatedPlayer {
    duration: f64,
    state: Mutex<PlayerState>,
    event_tx: broadcast::Sender<PlaybackEvent>,
}

impl SimulatedPlayer {
    /// A paused player at position zero.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Playback`] if `duration` is negative or not
    /// finite.
    pub fn new(duration: f64) -> Result<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(CoreError::Playback {
                reason: format!("invalid track duration {duration}"),
            });
        }
        let (event_tx, _) = broadcast::channel(64);
        Ok(Self {
            duration,
            state: Mutex::new(PlayerState {
                position: 0.0,
                anchored_at: Instant::now(),
                is_playing: false,
                volume: 100,
            }),
            event_tx,
        })
    }

    #[must_use]
    pub fn volume(&self) -> u8 {
        self.lock().volume
    }

    fn lock(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PlaybackEvent) {
        debug!(target: LOG_TARGET, ?event, "Playback event");
        let _ = self.event_tx.send(event);
    }

    /// Current position, stopping playback once the end is reached.
    fn refresh(&self) -> (f64, bool) {
        let now = Instant::now();
        let mut state = self.lock();
        let position = state.position_at(now, self.duration);
        if state.is_playing && position >= self.duration {
            state.is_playing = false;
            state.anchor(self.duration, now);
            drop(state);
            self.emit(PlaybackEvent::Ended);
            return (self.duration, false);
        }
        (position, state.is_playing)
    }
}

impl PlaybackSource for SimulatedPlayer {
    fn current_time(&self) -> f64 {
        self.refresh().0
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.refresh().1
    }

    fn seek_to(&self, seconds: f64) {
        if !seconds.is_finite() {
            warn!(target: LOG_TARGET, seconds, "Ignoring seek to a non-finite position");
            return;
        }
        let position = seconds.clamp(0.0, self.duration);
        self.lock().anchor(position, Instant::now());
        self.emit(PlaybackEvent::Seeked { position });
    }

    fn play(&self) {
        let (position, playing) = self.refresh();
        if playing {
            return;
        }
        // Playing from the end starts over
        let position = if position >= self.duration { 0.0 } else { position };
        {
            let mut state = self.lock();
            state.anchor(position, Instant::now());
            state.is_playing = true;
        }
        self.emit(PlaybackEvent::Playing { position });
    }

    fn pause(&self) {
        let (position, playing) = self.refresh();
        if !playing {
            return;
        }
        {
            let mut state = self.lock();
            state.anchor(position, Instant::now());
            state.is_playing = false;
        }
        self.emit(PlaybackEvent::Paused { position });
    }

    fn set_volume(&self, volume: u8) {
        self.lock().volume = volume.min(100);
    }

    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.event_tx.subscribe()
    }
}
