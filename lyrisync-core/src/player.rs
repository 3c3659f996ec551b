//! Transport controls: the user-facing actions that drive a playback source.

use crate::error::Result;
use crate::geometry::GeometryReconciler;
use crate::lyrics::LyricLine;
use crate::playback::PlaybackSource;
use crate::scroll::{ScrollAnimation, ScrollSurface};
use crate::settings::{Settings, SettingsController, SettingsPatch, SettingsStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const LOG_TARGET: &str = "lyrisync::player";

/// Forwards user actions to a playback source and keeps related preferences
/// in the settings store.
pub struct PlayerController<S: SettingsStore> {
    source: Arc<dyn PlaybackSource>,
    settings: SettingsController<S>,
}

impl<S: SettingsStore> PlayerController<S> {
    /// Wrap `source`, applying the stored volume to it.
    #[must_use]
    pub fn new(source: Arc<dyn PlaybackSource>, settings: SettingsController<S>) -> Self {
        source.set_volume(settings.settings().volume);
        Self { source, settings }
    }

    #[must_use]
    pub fn source(&self) -> &Arc<dyn PlaybackSource> {
        &self.source
    }

    #[must_use]
    pub const fn settings(&self) -> &SettingsController<S> {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsController<S> {
        &mut self.settings
    }

    /// Play when paused, pause when playing. Returns whether playback is now
    /// running.
    pub fn toggle_play_pause(&self) -> bool {
        if self.source.is_playing() {
            self.source.pause();
            false
        } else {
            self.source.play();
            true
        }
    }

    /// Seek to the start and scroll the panel back to the top.
    pub fn skip_back<P: ScrollSurface + ?Sized>(
        &self,
        reconciler: &GeometryReconciler,
        panel: &P,
        now: Instant,
    ) -> ScrollAnimation {
        debug!(target: LOG_TARGET, "Skip back");
        self.source.seek_to(0.0);
        reconciler.scroll_to_top(panel, now)
    }

    /// Seek to the end of the track.
    pub fn skip_forward(&self) {
        debug!(target: LOG_TARGET, "Skip forward");
        self.source.seek_to(self.source.duration());
    }

    /// Jump to a clicked line, starting playback if it was paused.
    pub fn lyric_click(&self, line: &LyricLine) {
        debug!(target: LOG_TARGET, time = line.time, "Lyric line clicked");
        self.source.seek_to(line.time);
        if !self.source.is_playing() {
            self.source.play();
        }
    }

    /// Progress-bar drag.
    pub fn seek(&self, seconds: f64) {
        self.source.seek_to(seconds);
    }

    /// Set the volume on the source and remember it.
    pub fn change_volume(&mut self, volume: u8) -> Settings {
        let volume = volume.min(100);
        self.source.set_volume(volume);
        self.settings.update(&SettingsPatch {
            volume: Some(volume),
            ..SettingsPatch::default()
        })
    }

    /// Apply a textual setting change. The source volume follows the stored
    /// volume afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidSetting`] if the key or value is
    /// not recognised.
    pub fn apply_setting(&mut self, key: &str, value: &str) -> Result<Settings> {
        let settings = self.settings.apply_key_value(key, value)?;
        self.source.set_volume(settings.volume);
        Ok(settings)
    }
}
