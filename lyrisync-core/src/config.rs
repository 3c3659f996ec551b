use crate::error::{CoreError, Result};
use crate::geometry::{ReconcilerParams, COMPACT_ANCHOR_RATIO, COMPACT_BREAKPOINT_PX, UPCOMING_SHIFT_PX};
use crate::interlude::InterludeTiming;
use crate::lyrics::GAP_TAIL_SECS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyrisyncConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub interlude: InterludeConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How often the playback clock is sampled while playing
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

const fn default_poll_interval() -> u64 {
    100
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default = "default_scroll_duration")]
    pub duration_ms: u64,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

const fn default_scroll_duration() -> u64 {
    1000
}

const fn default_frame_rate() -> u32 {
    60
}

/// Upper bound for `scroll.frame_rate`; frame intervals stay at 1ms or more.
pub const MAX_FRAME_RATE: u32 = 1000;

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_scroll_duration(),
            frame_rate: default_frame_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterludeConfig {
    /// Seconds cut from the end of each gap
    #[serde(default = "default_gap_tail")]
    pub gap_tail_secs: f64,
    #[serde(default = "default_appear")]
    pub appear_secs: f64,
    #[serde(default = "default_pulse_period")]
    pub pulse_period_secs: f64,
}

const fn default_gap_tail() -> f64 {
    GAP_TAIL_SECS
}

const fn default_appear() -> f64 {
    2.0
}

const fn default_pulse_period() -> f64 {
    4.0
}

impl Default for InterludeConfig {
    fn default() -> Self {
        Self {
            gap_tail_secs: default_gap_tail(),
            appear_secs: default_appear(),
            pulse_period_secs: default_pulse_period(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_compact_breakpoint")]
    pub compact_breakpoint_px: f64,
    #[serde(default = "default_compact_anchor")]
    pub compact_anchor_ratio: f64,
    #[serde(default = "default_upcoming_shift")]
    pub upcoming_shift_px: f64,
    /// Blank space above the first and below the last line
    #[serde(default = "default_panel_padding")]
    pub panel_padding_px: f64,
}

const fn default_compact_breakpoint() -> f64 {
    COMPACT_BREAKPOINT_PX
}

const fn default_compact_anchor() -> f64 {
    COMPACT_ANCHOR_RATIO
}

const fn default_upcoming_shift() -> f64 {
    UPCOMING_SHIFT_PX
}

const fn default_panel_padding() -> f64 {
    500.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            compact_breakpoint_px: default_compact_breakpoint(),
            compact_anchor_ratio: default_compact_anchor(),
            upcoming_shift_px: default_upcoming_shift(),
            panel_padding_px: default_panel_padding(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.config/lyrisync/lyrisync.log
    #[serde(default)]
    pub enabled: bool,
}

impl LyrisyncConfig {
    /// Get the configuration directory path (~/.config/lyrisync/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/lyrisync/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template on
    /// first run, or an error if the file cannot be read, parsed or fails
    /// validation.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a value is out of
    /// range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.sync.poll_interval_ms == 0 {
            return Err(invalid("sync.poll_interval_ms must be greater than zero"));
        }
        if !(1..=MAX_FRAME_RATE).contains(&self.scroll.frame_rate) {
            return Err(invalid("scroll.frame_rate must be between 1 and 1000"));
        }
        if !is_non_negative(self.interlude.gap_tail_secs) {
            return Err(invalid("interlude.gap_tail_secs must not be negative"));
        }
        if !is_positive(self.interlude.appear_secs) {
            return Err(invalid("interlude.appear_secs must be greater than zero"));
        }
        if !is_positive(self.interlude.pulse_period_secs) {
            return Err(invalid("interlude.pulse_period_secs must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.layout.compact_anchor_ratio) {
            return Err(invalid("layout.compact_anchor_ratio must be between 0 and 1"));
        }
        Ok(())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync.poll_interval_ms)
    }

    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.scroll.frame_rate.clamp(1, MAX_FRAME_RATE)
    }

    #[must_use]
    pub fn reconciler_params(&self) -> ReconcilerParams {
        ReconcilerParams {
            compact_breakpoint_px: self.layout.compact_breakpoint_px,
            compact_anchor_ratio: self.layout.compact_anchor_ratio,
            scroll_duration: Duration::from_millis(self.scroll.duration_ms),
        }
    }

    #[must_use]
    pub fn interlude_timing(&self) -> InterludeTiming {
        InterludeTiming {
            appear_secs: self.interlude.appear_secs,
            pulse_period_secs: self.interlude.pulse_period_secs,
            ..InterludeTiming::default()
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn invalid(message: &str) -> CoreError {
    CoreError::ConfigInvalid {
        message: message.to_string(),
    }
}

/// Template written on first run.
pub const CONFIG_TEMPLATE: &str = r#"# Lyrisync Configuration
# ~/.config/lyrisync/config.toml

[sync]
# How often the playback position is sampled while playing (milliseconds)
poll_interval_ms = 100

[scroll]
# Duration of the scroll to the active line (milliseconds)
duration_ms = 1000
# Frame rate of the scroll animation
frame_rate = 60

[interlude]
# Seconds before the next line at which the interlude indicator disappears
gap_tail_secs = 0.5
# Fade-in length of the indicator (seconds)
appear_secs = 2.0
# Breathing period of the indicator (seconds)
pulse_period_secs = 4.0

[layout]
# Viewports at or below this width use the compact layout
compact_breakpoint_px = 768
# Where the active line sits in compact viewports (fraction of the height)
compact_anchor_ratio = 0.3
# Downward shift of upcoming lines during an interlude
upcoming_shift_px = 55
# Blank space above the first and below the last line
panel_padding_px = 500

[logging]
# Also write logs to ~/.config/lyrisync/lyrisync.log
enabled = false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let config = LyrisyncConfig::from_toml_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.sync.poll_interval_ms, 100);
        assert_eq!(config.scroll.duration_ms, 1000);
        assert_eq!(config.interlude.gap_tail_secs, 0.5);
        assert_eq!(config.layout.upcoming_shift_px, 55.0);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LyrisyncConfig::from_toml_str("").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.reconciler_params(), ReconcilerParams::default());
        assert_eq!(config.interlude_timing(), InterludeTiming::default());
    }

    #[test]
    fn test_partial_section() {
        let config = LyrisyncConfig::from_toml_str("[scroll]\nframe_rate = 30\n").unwrap();
        assert_eq!(config.scroll.frame_rate, 30);
        assert_eq!(config.scroll.duration_ms, 1000);
        assert_eq!(config.frame_interval(), Duration::from_secs(1) / 30);
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let result = LyrisyncConfig::from_toml_str("[sync]\npoll_interval_ms = 0\n");
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_rejects_excessive_frame_rate() {
        let result = LyrisyncConfig::from_toml_str("[scroll]\nframe_rate = 2000000000\n");
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));

        let config = LyrisyncConfig::from_toml_str("[scroll]\nframe_rate = 1000\n").unwrap();
        assert_eq!(config.frame_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_rejects_bad_anchor_ratio() {
        let result = LyrisyncConfig::from_toml_str("[layout]\ncompact_anchor_ratio = 1.5\n");
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_syntax_error() {
        let result = LyrisyncConfig::from_toml_str("[sync\n");
        assert!(matches!(result, Err(CoreError::ConfigParseError(_))));
    }
}
