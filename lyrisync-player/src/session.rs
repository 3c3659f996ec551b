//! The interactive side of the player: stdin commands mapped onto transport
//! controls and preference changes.

use crate::commands::{Command, HELP};
use crate::display::{spawn_scroll, ViewState};
use crate::panel::VirtualPanel;
use crate::render;
use lyrisync_core::{
    format_timestamp, line_visuals, GeometryReconciler, JsonSettingsStore, Lyrics,
    PlayerController, SyncEngine, Viewport,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const LOG_TARGET: &str = "lyrisync::session";

pub struct Session {
    pub player: PlayerController<JsonSettingsStore>,
    pub lyrics: Lyrics,
    pub panel: Arc<Mutex<VirtualPanel>>,
    pub reconciler: GeometryReconciler,
    pub sync_engine: Arc<SyncEngine>,
    pub view_tx: watch::Sender<ViewState>,
    pub frame_interval: Duration,
    pub upcoming_shift_px: f64,
}

impl Session {
    /// Read commands until stdin closes or shutdown is requested.
    pub async fn read_commands(mut self, cancel_token: CancellationToken) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => match Command::parse(&line) {
                        Ok(Some(Command::Quit)) => {
                            info!(target: LOG_TARGET, "Quit requested");
                            cancel_token.cancel();
                            break;
                        }
                        Ok(Some(command)) => self.execute(command).await,
                        Ok(None) => {}
                        Err(e) => warn!(target: LOG_TARGET, "{e} (type 'help' for commands)"),
                    },
                    Ok(None) => {
                        // stdin closed; keep playing until the track ends
                        cancel_token.cancelled().await;
                        break;
                    }
                    Err(e) => {
                        warn!(target: LOG_TARGET, "Failed to read command: {e}");
                        cancel_token.cancelled().await;
                        break;
                    }
                },
            }
        }
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Toggle => {
                let playing = self.player.toggle_play_pause();
                info!(target: LOG_TARGET, "{}", if playing { "Playing" } else { "Paused" });
            }
            Command::Back => {
                let now = tokio::time::Instant::now().into_std();
                let animation = {
                    let panel = self.panel.lock().await;
                    self.player.skip_back(&self.reconciler, &*panel, now)
                };
                spawn_scroll(animation, Arc::clone(&self.panel), self.frame_interval);
            }
            Command::Forward => self.player.skip_forward(),
            Command::Seek(seconds) => {
                info!(target: LOG_TARGET, "Seek to {}", format_timestamp(seconds));
                self.player.seek(seconds);
            }
            Command::Line(index) => match self.lyrics.get(index) {
                Some(line) => self.player.lyric_click(line),
                None => warn!(target: LOG_TARGET, "No lyric line {index}"),
            },
            Command::Volume(volume) => {
                let settings = self.player.change_volume(volume);
                self.view_tx.send_modify(|view| view.settings = settings);
            }
            Command::Set { key, value } => {
                // Rejected values are already reported by the controller
                if let Ok(settings) = self.player.apply_setting(&key, &value) {
                    self.view_tx.send_modify(|view| view.settings = settings);
                }
            }
            Command::Resize { width, height } => {
                let viewport = Viewport::new(width, height);
                let kind = self.player.settings_mut().handle_resize(viewport);
                let settings = self.player.settings().settings();
                info!(
                    target: LOG_TARGET,
                    "Viewport {width}x{height} ({})",
                    if kind.is_compact() { "compact" } else { "standard" }
                );
                self.view_tx.send_modify(|view| {
                    view.viewport = viewport;
                    view.settings = settings;
                });
            }
            Command::Hover(hovered) => self.view_tx.send_modify(|view| view.hovered = hovered),
            Command::Show => self.show().await,
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
    }

    async fn show(&self) {
        let active = self.sync_engine.active_line().await;
        let clock = self.sync_engine.clock().await;
        let hovered = self.view_tx.borrow().hovered;
        let visuals = line_visuals(&self.lyrics, active, hovered, self.upcoming_shift_px);
        println!(
            "{} / {}",
            format_timestamp(clock.current_time),
            format_timestamp(clock.duration)
        );
        print!("{}", render::lines_view(&self.lyrics, &visuals));
    }
}
