mod commands;
mod display;
mod panel;
mod render;
mod session;

use crate::display::{Display, ViewState};
use crate::panel::VirtualPanel;
use crate::session::Session;
use clap::Parser;
use lyrisync_core::{
    CoreError, GeometryReconciler, JsonSettingsStore, LyricLine, Lyrics, LyrisyncConfig,
    PlaybackSource, PlayerController, ScrollAnimator, SettingsController, SimulatedPlayer,
    SyncEngine, SyncEvent, TimeSampler, Viewport,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Track length assumed past the last line when no duration is given.
const DEFAULT_TRAILING_SECS: f64 = 5.0;

#[derive(Debug, Parser)]
#[command(name = "lyrisync", version, about = "Synchronized lyrics player")]
struct Args {
    /// JSON file with an array of {"time": seconds, "text": "..."} lines
    lyrics: PathBuf,

    /// Track length in seconds [default: last line + 5s]
    #[arg(long)]
    duration: Option<f64>,

    #[arg(long, default_value_t = 1280.0)]
    viewport_width: f64,

    #[arg(long, default_value_t = 720.0)]
    viewport_height: f64,

    /// Start playing right away
    #[arg(long)]
    autoplay: bool,
}

#[derive(Debug, Error)]
enum LyricsFileError {
    #[error("Failed to read lyrics file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid lyrics JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    let args = Args::parse();

    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config = match LyrisyncConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!("Created configuration template at {}", path.display());
            LyrisyncConfig::default()
        }
        Err(e) => {
            error!(
                "Failed to load {}: {e}",
                LyrisyncConfig::config_path().display()
            );
            std::process::exit(1);
        }
    };

    let lyrics = match load_lyrics(&args.lyrics) {
        Ok(lyrics) => lyrics,
        Err(e) => {
            error!("{}: {e}", args.lyrics.display());
            std::process::exit(1);
        }
    };
    info!("Loaded {} lyric lines", lyrics.len());

    let track_duration = args
        .duration
        .unwrap_or_else(|| default_duration(&lyrics));
    let source: Arc<dyn PlaybackSource> = match SimulatedPlayer::new(track_duration) {
        Ok(player) => Arc::new(player),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    runtime.block_on(run(&config, lyrics, source, &args, cancel_token));

    // stdin is read on a blocking thread that cannot be interrupted
    runtime.shutdown_timeout(Duration::from_millis(200));
}

async fn run(
    config: &LyrisyncConfig,
    lyrics: Lyrics,
    source: Arc<dyn PlaybackSource>,
    args: &Args,
    cancel_token: CancellationToken,
) {
    let track_duration = source.duration();
    let viewport = Viewport::new(args.viewport_width, args.viewport_height);

    let mut settings = SettingsController::new(
        JsonSettingsStore::open_default(),
        config.layout.compact_breakpoint_px,
    );
    let kind = settings.handle_resize(viewport);
    info!(
        "Viewport {}x{} ({})",
        viewport.width,
        viewport.height,
        if kind.is_compact() { "compact" } else { "standard" }
    );

    let player = PlayerController::new(Arc::clone(&source), settings);
    let current_settings = player.settings().settings();

    let panel = Arc::new(Mutex::new(VirtualPanel::new(
        &lyrics,
        current_settings.font_size,
        config.layout.panel_padding_px,
        viewport.height,
    )));
    let reconciler = GeometryReconciler::new(ScrollAnimator::new(), config.reconciler_params());

    let (view_tx, view_rx) = watch::channel(ViewState {
        settings: current_settings.clone(),
        viewport,
        hovered: false,
    });

    let sync_engine = SyncEngine::new();

    let display = Display::new(
        lyrics.clone(),
        Arc::clone(&panel),
        reconciler.clone(),
        config.interlude_timing(),
        config.interlude.gap_tail_secs,
        track_duration,
        config.frame_interval(),
        current_settings.font_size,
    );
    let display_handle = tokio::spawn(display.run(
        sync_engine.subscribe(),
        view_rx,
        cancel_token.clone(),
    ));
    tokio::spawn(log_sync_events(sync_engine.clone()));

    sync_engine.set_lyrics(lyrics.clone()).await;

    let sampler = Arc::new(TimeSampler::new(
        Arc::clone(&source),
        sync_engine.clone(),
        config.poll_interval(),
        Some(cancel_token.clone()),
    ));
    let sampler_handle = sampler.start();

    if args.autoplay {
        player.toggle_play_pause();
    } else {
        info!("Paused. Type 'play' to start or 'help' for commands");
    }

    let session = Session {
        player,
        lyrics,
        panel,
        reconciler,
        sync_engine,
        view_tx,
        frame_interval: config.frame_interval(),
        upcoming_shift_px: config.layout.upcoming_shift_px,
    };
    session.read_commands(cancel_token.clone()).await;

    let _ = sampler_handle.await;
    let _ = display_handle.await;
    info!("Goodbye");
}

fn load_lyrics(path: &Path) -> Result<Lyrics, LyricsFileError> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<LyricLine> = serde_json::from_str(&content)?;
    if !lines.windows(2).all(|pair| pair[0].time <= pair[1].time) {
        warn!("Lyric lines are not sorted by time; the active line may jump");
    }
    Ok(Lyrics::new(lines))
}

fn default_duration(lyrics: &Lyrics) -> f64 {
    lyrics
        .lines()
        .last()
        .map_or(0.0, |line| line.time)
        + DEFAULT_TRAILING_SECS
}

/// Log playback sync events to the console
async fn log_sync_events(sync_engine: Arc<SyncEngine>) {
    let mut rx = sync_engine.subscribe();

    loop {
        match rx.recv().await {
            Ok(event) => match &event {
                SyncEvent::LyricsLoaded { lyrics } => {
                    info!("Lyrics loaded: {} lines", lyrics.len());
                }
                SyncEvent::PlaybackStarted { position } => {
                    info!("Playback started at {:.1}s", position);
                }
                SyncEvent::PlaybackPaused { position } => {
                    info!("Playback paused at {:.1}s", position);
                }
                SyncEvent::Seeked { position } => {
                    info!("Seek to {:.1}s", position);
                }
                SyncEvent::ActiveLineChanged { .. }
                | SyncEvent::PositionSync { .. }
                | SyncEvent::PlaybackEnded => {
                    // Logged by the display
                }
            },
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                info!("Sync event channel closed");
                break;
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                info!("Missed {} sync events", n);
            }
        }
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = LyrisyncConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if file_logging_enabled {
        let log_path = lyrisync_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
