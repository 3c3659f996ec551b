//! Turns sync events into scrolling and indicator updates on the panel.

use crate::panel::VirtualPanel;
use crate::render;
use lyrisync_core::interlude::stage_for_gap;
use lyrisync_core::{
    format_timestamp, run_scroll_animation, ActiveLine, FontSize, GeometryReconciler,
    IndicatorLayout, InterludePhase, InterludeTiming, Lyrics, ScrollAnimation, Settings,
    SyncEvent, Viewport,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

const LOG_TARGET: &str = "lyrisync::display";

/// Terminal hosts have no system colour scheme to follow.
const SYSTEM_PREFERS_DARK: bool = true;

/// What the user currently sees: preferences, window size and hover state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub settings: Settings,
    pub viewport: Viewport,
    pub hovered: bool,
}

/// Run `animation` on its own task at the frame cadence.
pub fn spawn_scroll(
    animation: ScrollAnimation,
    panel: Arc<Mutex<VirtualPanel>>,
    frame_interval: Duration,
) {
    tokio::spawn(async move {
        let step = run_scroll_animation(animation, panel, frame_interval).await;
        trace!(target: LOG_TARGET, ?step, "Scroll task done");
    });
}

pub struct Display {
    lyrics: Lyrics,
    panel: Arc<Mutex<VirtualPanel>>,
    reconciler: GeometryReconciler,
    timing: InterludeTiming,
    gap_tail_secs: f64,
    track_duration: f64,
    frame_interval: Duration,
    font_size: FontSize,
    active: ActiveLine,
    last_phase: Option<InterludePhase>,
}

impl Display {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        lyrics: Lyrics,
        panel: Arc<Mutex<VirtualPanel>>,
        reconciler: GeometryReconciler,
        timing: InterludeTiming,
        gap_tail_secs: f64,
        track_duration: f64,
        frame_interval: Duration,
        font_size: FontSize,
    ) -> Self {
        Self {
            lyrics,
            panel,
            reconciler,
            timing,
            gap_tail_secs,
            track_duration,
            frame_interval,
            font_size,
            active: ActiveLine::NONE,
            last_phase: None,
        }
    }

    pub async fn run(
        mut self,
        mut events: broadcast::Receiver<SyncEvent>,
        mut view_rx: watch::Receiver<ViewState>,
        cancel_token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel_token.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => {
                        let view = view_rx.borrow().clone();
                        self.handle_event(event, &view, &cancel_token).await;
                    }
                    Err(RecvError::Closed) => {
                        info!(target: LOG_TARGET, "Sync event channel closed");
                        break;
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(target: LOG_TARGET, "Missed {} sync events", n);
                    }
                },
                changed = view_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = view_rx.borrow_and_update().clone();
                    self.apply_view(&view).await;
                }
            }
        }
    }

    async fn handle_event(&mut self, event: SyncEvent, view: &ViewState, cancel_token: &CancellationToken) {
        match event {
            SyncEvent::LyricsLoaded { lyrics } => {
                self.lyrics = lyrics;
                self.panel.lock().await.relayout(&self.lyrics, self.font_size);
            }
            SyncEvent::ActiveLineChanged { current, time, .. } => {
                self.active = current;
                self.last_phase = None;
                match current.index().and_then(|i| self.lyrics.get(i)) {
                    Some(line) if line.is_interlude() => {
                        info!(target: LOG_TARGET, "[{}] (interlude)", format_timestamp(time));
                    }
                    Some(line) => {
                        info!(target: LOG_TARGET, "[{}] {}", format_timestamp(time), line.text);
                    }
                    None => debug!(target: LOG_TARGET, "No active line"),
                }
                self.scroll_to_active(view.viewport).await;
            }
            SyncEvent::PositionSync { time } => self.update_indicator(time, view),
            SyncEvent::PlaybackEnded => {
                info!(target: LOG_TARGET, "Playback ended");
                cancel_token.cancel();
            }
            SyncEvent::PlaybackStarted { .. }
            | SyncEvent::PlaybackPaused { .. }
            | SyncEvent::Seeked { .. } => {}
        }
    }

    async fn apply_view(&mut self, view: &ViewState) {
        let relaid = {
            let mut panel = self.panel.lock().await;
            let mut relaid = false;
            if view.settings.font_size != self.font_size {
                self.font_size = view.settings.font_size;
                panel.relayout(&self.lyrics, self.font_size);
                relaid = true;
            }
            if (view.viewport.height - panel.container_height()).abs() > f64::EPSILON {
                panel.set_container_height(view.viewport.height);
                relaid = true;
            }
            relaid
        };
        if relaid {
            self.scroll_to_active(view.viewport).await;
        }
    }

    async fn scroll_to_active(&self, viewport: Viewport) {
        let now = tokio::time::Instant::now().into_std();
        let animation = {
            let panel = self.panel.lock().await;
            self.reconciler.reconcile(&*panel, self.active, viewport, now)
        };
        if let Some(animation) = animation {
            debug!(
                target: LOG_TARGET,
                "Scrolling to {:.0}px",
                animation.state().target_offset
            );
            spawn_scroll(animation, Arc::clone(&self.panel), self.frame_interval);
        }
    }

    fn update_indicator(&mut self, time: f64, view: &ViewState) {
        let Some(index) = self.active.index() else {
            return;
        };
        let Some(gap) = self
            .lyrics
            .interlude_gap_with_tail(index, self.track_duration, self.gap_tail_secs)
        else {
            return;
        };
        let Some(stage) = stage_for_gap(&self.timing, &gap, time) else {
            return;
        };

        let theme = view.settings.theme.resolve(SYSTEM_PREFERS_DARK);
        let layout = IndicatorLayout::new(&stage, &view.settings, theme);
        let summary = render::indicator_summary(stage.phase, &layout);
        if self.last_phase == Some(stage.phase) {
            debug!(target: LOG_TARGET, "Interlude {}", summary);
        } else {
            info!(target: LOG_TARGET, "Interlude {}", summary);
            self.last_phase = Some(stage.phase);
        }
    }
}
