pub mod config;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod interlude;
pub mod lyrics;
pub mod paths;
pub mod playback;
pub mod player;
pub mod scroll;
pub mod settings;
pub mod sync;
pub mod time;

pub use config::{
    InterludeConfig, LayoutConfig, LoggingConfig, LyrisyncConfig, ScrollConfig, SyncConfig,
    CONFIG_TEMPLATE,
};
pub use easing::{make_easing, CubicBezier};
pub use error::CoreError;
pub use geometry::{
    line_visuals, target_scroll_offset, upcoming_line_shift, GeometryReconciler, LineLayout,
    LineMeasurements, LineVisual, ReconcilerParams, Viewport, ViewportKind,
};
pub use interlude::{
    compute_interlude_stage, IndicatorAnchor, IndicatorLayout, InterludePhase, InterludeStage,
    InterludeTiming, TransitionSpec,
};
pub use lyrics::{resolve_active_line, ActiveLine, InterludeGap, LyricLine, Lyrics};
pub use paths::{
    config_dir, log_file_path, settings_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME,
    SETTINGS_FILE_NAME,
};
pub use playback::{PlaybackClock, PlaybackEvent, PlaybackSource, SimulatedPlayer};
pub use player::PlayerController;
pub use scroll::{
    run_scroll_animation, FrameStep, ScrollAnimation, ScrollAnimationState, ScrollAnimator,
    ScrollSurface, SCROLL_DURATION,
};
pub use settings::{
    FontSize, HorizontalPosition, JsonSettingsStore, MemorySettingsStore, ResolvedTheme,
    SettingChange, Settings, SettingsController, SettingsPatch, SettingsStore, Theme,
};
pub use sync::{SyncEvent, SyncEngine, TimeSampler};
pub use time::{format_timestamp, DurationExt};
