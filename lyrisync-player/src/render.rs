//! Plain-text renderings of the panel for log output.

use lyrisync_core::{IndicatorAnchor, IndicatorLayout, InterludePhase, LineVisual, Lyrics};
use std::fmt::Write;

/// Shade for a dot alpha in `[0.2, 1.0]`.
fn dot_glyph(alpha: f64) -> char {
    if alpha >= 0.95 {
        '●'
    } else if alpha >= 0.6 {
        '◕'
    } else if alpha >= 0.4 {
        '◑'
    } else {
        '○'
    }
}

/// One-line summary of the interlude indicator.
#[must_use]
pub fn indicator_summary(phase: InterludePhase, layout: &IndicatorLayout) -> String {
    let dots: String = layout.dot_alphas.iter().map(|&a| dot_glyph(a)).collect();
    let anchor = match layout.anchor {
        IndicatorAnchor::Left { inset_px } => format!("left+{inset_px}px"),
        IndicatorAnchor::Center => "center".to_string(),
        IndicatorAnchor::Right { inset_px } => format!("right-{inset_px}px"),
    };
    format!(
        "{dots} {phase:?} opacity={:.2} scale={:.2} at {anchor}",
        layout.opacity, layout.scale
    )
}

/// The visible lines with their state markers, one per row.
#[must_use]
pub fn lines_view(lyrics: &Lyrics, visuals: &[LineVisual]) -> String {
    let mut out = String::new();
    for (line, visual) in lyrics.lines().iter().zip(visuals) {
        if visual.opacity <= 0.0 {
            continue;
        }
        let marker = if visual.active { '>' } else { ' ' };
        let text = if visual.interlude { "..." } else { line.text.as_str() };
        let shift = if visual.shift_y > 0.0 {
            format!(" (+{}px)", visual.shift_y)
        } else {
            String::new()
        };
        let _ = writeln!(out, "{marker} {text}{shift}");
    }
    out
}
