//! User preferences and their persistence.
//!
//! The engine only reads `font_size` and `lyric_position`; everything else is
//! carried for the host. Persistence sits behind [`SettingsStore`] so the
//! engine never touches the filesystem itself.

use crate::error::{CoreError, Result};
use crate::geometry::{Viewport, ViewportKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    /// Lyric font size in rem.
    #[must_use]
    pub const fn rem(self) -> f64 {
        match self {
            Self::Small => 2.0,
            Self::Medium => 3.0,
            Self::Large => 4.0,
        }
    }

    /// Added to the interlude indicator's scale.
    #[must_use]
    pub const fn indicator_scale_offset(self) -> f64 {
        match self {
            Self::Small => -0.1,
            Self::Medium => 0.0,
            Self::Large => 0.2,
        }
    }

    /// Horizontal inset of the interlude indicator in pixels.
    #[must_use]
    pub const fn indicator_inset_px(self) -> f64 {
        match self {
            Self::Small => 5.0,
            Self::Medium => 10.0,
            Self::Large => 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalPosition {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundBlur {
    None,
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    System,
    Dark,
    Light,
}

/// Theme after resolving `System` against the host's preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTheme {
    Dark,
    Light,
}

impl Theme {
    #[must_use]
    pub const fn resolve(self, system_prefers_dark: bool) -> ResolvedTheme {
        match self {
            Self::Dark => ResolvedTheme::Dark,
            Self::Light => ResolvedTheme::Light,
            Self::System => {
                if system_prefers_dark {
                    ResolvedTheme::Dark
                } else {
                    ResolvedTheme::Light
                }
            }
        }
    }
}

/// Persisted player preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub font_size: FontSize,
    pub lyric_position: HorizontalPosition,
    pub background_blur: BackgroundBlur,
    pub theme: Theme,
    pub player_position: HorizontalPosition,
    pub full_player: bool,
    pub show_player_control: bool,
    /// 0..=100
    pub volume: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_size: FontSize::Medium,
            lyric_position: HorizontalPosition::Left,
            background_blur: BackgroundBlur::Medium,
            theme: Theme::System,
            player_position: HorizontalPosition::Right,
            full_player: false,
            show_player_control: true,
            volume: 50,
        }
    }
}

/// A partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub font_size: Option<FontSize>,
    pub lyric_position: Option<HorizontalPosition>,
    pub background_blur: Option<BackgroundBlur>,
    pub theme: Option<Theme>,
    pub player_position: Option<HorizontalPosition>,
    pub full_player: Option<bool>,
    pub show_player_control: Option<bool>,
    pub volume: Option<u8>,
}

impl Settings {
    /// Merge `patch` into these settings.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.font_size {
            self.font_size = v;
        }
        if let Some(v) = patch.lyric_position {
            self.lyric_position = v;
        }
        if let Some(v) = patch.background_blur {
            self.background_blur = v;
        }
        if let Some(v) = patch.theme {
            self.theme = v;
        }
        if let Some(v) = patch.player_position {
            self.player_position = v;
        }
        if let Some(v) = patch.full_player {
            self.full_player = v;
        }
        if let Some(v) = patch.show_player_control {
            self.show_player_control = v;
        }
        if let Some(v) = patch.volume {
            self.volume = v.min(100);
        }
    }
}

/// Key-value preference storage owned by the host.
pub trait SettingsStore: Send {
    /// Current settings.
    fn read(&self) -> Settings;

    /// Merge `patch`, persist, and return the updated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged settings cannot be persisted. The
    /// in-memory copy is updated regardless.
    fn write(&mut self, patch: &SettingsPatch) -> Result<Settings>;
}

/// Settings kept only in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    settings: Settings,
}

impl MemorySettingsStore {
    #[must_use]
    pub const fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn read(&self) -> Settings {
        self.settings.clone()
    }

    fn write(&mut self, patch: &SettingsPatch) -> Result<Settings> {
        self.settings.apply(patch);
        Ok(self.settings.clone())
    }
}

/// Settings persisted as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl JsonSettingsStore {
    /// Open the store at the default location
    /// (`~/.config/lyrisync/settings.json`).
    #[must_use]
    pub fn open_default() -> Self {
        Self::open(crate::paths::settings_path())
    }

    /// Open the store at `path`, falling back to defaults if the file is
    /// missing or unreadable.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = Self::load(&path).unwrap_or_default();
        Self { path, settings }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Option<Settings> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return None;
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    Some(settings)
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}", e);
                None
            }
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.path, content)?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn read(&self) -> Settings {
        self.settings.clone()
    }

    fn write(&mut self, patch: &SettingsPatch) -> Result<Settings> {
        self.settings.apply(patch);
        self.save()?;
        Ok(self.settings.clone())
    }
}

/// A single user-initiated preference change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    FontSize(FontSize),
    LyricPosition(HorizontalPosition),
    BackgroundBlur(BackgroundBlur),
    Theme(Theme),
    PlayerPosition(HorizontalPosition),
    FullPlayer(bool),
    ShowPlayerControl(bool),
    Volume(u8),
}

impl SettingChange {
    /// Parse a change from a key and its textual value, e.g.
    /// `("theme", "dark")`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSetting`] for unknown keys or values.
    pub fn parse(key: &str, value: &str) -> Result<Self> {
        let change = match key {
            "font_size" => Self::FontSize(parse_choice(key, value)?),
            "lyric_position" => Self::LyricPosition(parse_choice(key, value)?),
            "background_blur" => Self::BackgroundBlur(parse_choice(key, value)?),
            "theme" => Self::Theme(parse_choice(key, value)?),
            "player_position" => Self::PlayerPosition(parse_choice(key, value)?),
            "full_player" => Self::FullPlayer(parse_flag(key, value)?),
            "show_player_control" => Self::ShowPlayerControl(parse_flag(key, value)?),
            "volume" => Self::Volume(
                value
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| invalid(key, value))?
                    .min(100),
            ),
            _ => return Err(invalid(key, value)),
        };
        Ok(change)
    }

    fn into_patch(self) -> SettingsPatch {
        let mut patch = SettingsPatch::default();
        match self {
            Self::FontSize(v) => patch.font_size = Some(v),
            Self::LyricPosition(v) => patch.lyric_position = Some(v),
            Self::BackgroundBlur(v) => patch.background_blur = Some(v),
            Self::Theme(v) => patch.theme = Some(v),
            Self::PlayerPosition(v) => patch.player_position = Some(v),
            Self::FullPlayer(v) => patch.full_player = Some(v),
            Self::ShowPlayerControl(v) => patch.show_player_control = Some(v),
            Self::Volume(v) => patch.volume = Some(v),
        }
        patch
    }
}

fn invalid(key: &str, value: &str) -> CoreError {
    CoreError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_choice<T: DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase()))
        .map_err(|_| invalid(key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

/// Applies preference changes on behalf of the host and keeps `full_player`
/// in step with the viewport until the user sets it explicitly.
#[derive(Debug)]
pub struct SettingsController<S: SettingsStore> {
    store: S,
    full_player_manually_set: bool,
    compact_breakpoint_px: f64,
    viewport_kind: Option<ViewportKind>,
}

impl<S: SettingsStore> SettingsController<S> {
    #[must_use]
    pub const fn new(store: S, compact_breakpoint_px: f64) -> Self {
        Self {
            store,
            full_player_manually_set: false,
            compact_breakpoint_px,
            viewport_kind: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.store.read()
    }

    /// Kind of the last viewport seen by [`Self::handle_resize`].
    #[must_use]
    pub const fn viewport_kind(&self) -> Option<ViewportKind> {
        self.viewport_kind
    }

    /// Merge and persist a patch. Persistence failures are logged, the
    /// in-memory settings still change.
    pub fn update(&mut self, patch: &SettingsPatch) -> Settings {
        match self.store.write(patch) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to persist settings: {}", e);
                self.store.read()
            }
        }
    }

    /// Apply a user-initiated change.
    pub fn apply_change(&mut self, change: SettingChange) -> Settings {
        if matches!(change, SettingChange::FullPlayer(_)) {
            self.full_player_manually_set = true;
        }
        self.update(&change.into_patch())
    }

    /// Apply a change given as text. Unsupported values are reported and
    /// leave the settings untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSetting`] if the key or value is not
    /// recognised.
    pub fn apply_key_value(&mut self, key: &str, value: &str) -> Result<Settings> {
        match SettingChange::parse(key, value) {
            Ok(change) => Ok(self.apply_change(change)),
            Err(e) => {
                if key == "theme" {
                    warn!("Invalid theme value: {:?}", value);
                } else {
                    warn!("{}", e);
                }
                Err(e)
            }
        }
    }

    /// Record a viewport resize. Unless the user chose `full_player`
    /// themselves, compact viewports switch to the full player and standard
    /// ones switch back.
    pub fn handle_resize(&mut self, viewport: Viewport) -> ViewportKind {
        let kind = viewport.kind(self.compact_breakpoint_px);
        self.viewport_kind = Some(kind);

        if !self.full_player_manually_set {
            let compact = kind.is_compact();
            if self.store.read().full_player != compact {
                debug!(compact, "Viewport changed, following with full player");
                self.update(&SettingsPatch {
                    full_player: Some(compact),
                    ..SettingsPatch::default()
                });
            }
        }
        kind
    }

    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}
