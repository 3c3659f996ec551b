use crate::lyrics::{ActiveLine, Lyrics};
use crate::playback::{PlaybackClock, PlaybackEvent, PlaybackSource};
use crate::time::DurationExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

const LOG_TARGET: &str = "lyrisync::sync";

/// Events emitted by the sync engine
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A new lyric sequence was installed
    LyricsLoaded { lyrics: Lyrics },
    /// The active line changed, either by playback or by a seek
    ActiveLineChanged {
        previous: ActiveLine,
        current: ActiveLine,
        time: f64,
    },
    /// Regular clock sample
    PositionSync { time: f64 },
    PlaybackStarted { position: f64 },
    PlaybackPaused { position: f64 },
    Seeked { position: f64 },
    PlaybackEnded,
}

/// Sync engine state
#[derive(Debug, Default)]
struct SyncEngineInner {
    lyrics: Lyrics,
    clock: PlaybackClock,
    active: ActiveLine,
}

/// Keeps the active line in step with the playback clock.
#[derive(Debug)]
pub struct SyncEngine {
    inner: RwLock<SyncEngineInner>,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Subscribe to sync events
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    /// Replace the lyric sequence and re-resolve the active line at the last
    /// sampled time.
    pub async fn set_lyrics(&self, lyrics: Lyrics) {
        let mut inner = self.inner.write().await;
        inner.lyrics = lyrics.clone();
        let time = inner.clock.current_time;
        let _ = self.event_tx.send(SyncEvent::LyricsLoaded { lyrics });
        self.resolve(&mut inner, time);
    }

    /// Record a clock sample and return the active line for it.
    pub async fn sample(&self, clock: PlaybackClock) -> ActiveLine {
        let mut inner = self.inner.write().await;
        inner.clock = clock;
        trace!(target: LOG_TARGET, time = clock.current_time, "Clock sample");
        let _ = self.event_tx.send(SyncEvent::PositionSync {
            time: clock.current_time,
        });
        self.resolve(&mut inner, clock.current_time)
    }

    /// Fold a discrete playback notification into the engine state.
    pub async fn handle_playback_event(&self, event: PlaybackEvent) {
        let mut inner = self.inner.write().await;
        let sync_event = match event {
            PlaybackEvent::Playing { position } => {
                inner.clock.is_playing = true;
                inner.clock.current_time = position;
                SyncEvent::PlaybackStarted { position }
            }
            PlaybackEvent::Paused { position } => {
                inner.clock.is_playing = false;
                inner.clock.current_time = position;
                SyncEvent::PlaybackPaused { position }
            }
            PlaybackEvent::Seeked { position } => {
                inner.clock.current_time = position;
                SyncEvent::Seeked { position }
            }
            PlaybackEvent::Ended => {
                inner.clock.is_playing = false;
                inner.clock.current_time = inner.clock.duration;
                SyncEvent::PlaybackEnded
            }
        };
        let _ = self.event_tx.send(sync_event);
    }

    fn resolve(&self, inner: &mut SyncEngineInner, time: f64) -> ActiveLine {
        let current = inner.lyrics.active_line(time);
        let previous = inner.active;
        if current != previous {
            inner.active = current;
            debug!(
                target: LOG_TARGET,
                previous = previous.as_index(),
                current = current.as_index(),
                time,
                "Active line changed"
            );
            let _ = self.event_tx.send(SyncEvent::ActiveLineChanged {
                previous,
                current,
                time,
            });
        }
        current
    }

    pub async fn active_line(&self) -> ActiveLine {
        self.inner.read().await.active
    }

    pub async fn lyrics(&self) -> Lyrics {
        self.inner.read().await.lyrics.clone()
    }

    /// Last sampled clock
    pub async fn clock(&self) -> PlaybackClock {
        self.inner.read().await.clock
    }

    pub async fn is_playing(&self) -> bool {
        self.inner.read().await.clock.is_playing
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(SyncEngineInner::default()),
            event_tx,
        }
    }
}

/// Samples a playback source at a fixed interval while it plays.
///
/// Play, pause, seek and end notifications from the source switch polling on
/// and off and trigger an immediate sample.
pub struct TimeSampler {
    source: Arc<dyn PlaybackSource>,
    sync_engine: Arc<SyncEngine>,
    poll_interval: Duration,
    cancel_token: CancellationToken,
}

impl TimeSampler {
    #[must_use]
    pub fn new(
        source: Arc<dyn PlaybackSource>,
        sync_engine: Arc<SyncEngine>,
        poll_interval: Duration,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            source,
            sync_engine,
            poll_interval,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Stop the sampler
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Start sampling in a background task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        info!(
            target: LOG_TARGET,
            "Starting playback sampler (interval: {}ms)",
            self.poll_interval.as_millis_u64()
        );

        let mut events = self.source.subscribe();
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut polling = self.source.is_playing();
        self.sync_engine.sample(self.source.clock()).await;

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "Sampler shutting down gracefully");
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        match event {
                            PlaybackEvent::Playing { .. } => {
                                polling = true;
                                ticker.reset();
                            }
                            PlaybackEvent::Paused { .. } | PlaybackEvent::Ended => polling = false,
                            PlaybackEvent::Seeked { .. } => {}
                        }
                        self.sync_engine.handle_playback_event(event).await;
                        self.sync_engine.sample(self.source.clock()).await;
                    }
                    Err(RecvError::Closed) => {
                        info!(target: LOG_TARGET, "Playback event channel closed");
                        break;
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(target: LOG_TARGET, "Missed {} playback events", n);
                        polling = self.source.is_playing();
                    }
                },
                _ = ticker.tick(), if polling => {
                    self.sync_engine.sample(self.source.clock()).await;
                }
            }
        }
    }
}
