//! Scroll-target geometry for the lyric panel.

use crate::lyrics::{ActiveLine, Lyrics};
use crate::scroll::{ScrollAnimation, ScrollAnimator, ScrollSurface, SCROLL_DURATION};
use std::time::{Duration, Instant};
use tracing::debug;

/// Viewports at or below this width use the compact layout.
pub const COMPACT_BREAKPOINT_PX: f64 = 768.0;

/// Fraction of the viewport height the active line is anchored at in the
/// compact layout.
pub const COMPACT_ANCHOR_RATIO: f64 = 0.3;

/// Downward shift applied to upcoming lines while an interlude is active.
pub const UPCOMING_SHIFT_PX: f64 = 55.0;

/// Size of the host window or screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn kind(&self, compact_breakpoint_px: f64) -> ViewportKind {
        if self.width <= compact_breakpoint_px {
            ViewportKind::Compact {
                viewport_height: self.height,
            }
        } else {
            ViewportKind::Standard
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportKind {
    /// Small screens: the active line sits in the upper part of the viewport
    Compact { viewport_height: f64 },
    /// The active line is centred in the lyric container
    Standard,
}

impl ViewportKind {
    #[must_use]
    pub const fn is_compact(&self) -> bool {
        matches!(self, Self::Compact { .. })
    }
}

/// Measurements of the lyric container and one line element in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMeasurements {
    /// Visible height of the scroll container
    pub container_height: f64,
    /// Total scrollable content height
    pub content_height: f64,
    /// Line element's offset from the top of the content
    pub element_offset_top: f64,
    pub element_height: f64,
}

impl LineMeasurements {
    /// Largest valid scroll offset, zero if the content fits.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.container_height).max(0.0)
    }
}

/// A laid-out lyric panel that can report line measurements.
pub trait LineLayout {
    /// Measurements for the line at `index`, or `None` if it is not rendered.
    fn measure_line(&self, index: usize) -> Option<LineMeasurements>;
}

/// Scroll offset that brings the measured line to its anchor, clamped to
/// `[0, content_height - container_height]`.
#[must_use]
pub fn target_scroll_offset(measurements: &LineMeasurements, kind: ViewportKind) -> f64 {
    target_scroll_offset_with_anchor(measurements, kind, COMPACT_ANCHOR_RATIO)
}

#[must_use]
pub fn target_scroll_offset_with_anchor(
    m: &LineMeasurements,
    kind: ViewportKind,
    compact_anchor_ratio: f64,
) -> f64 {
    let half_line = m.element_height / 2.0;
    let raw = match kind {
        ViewportKind::Compact { viewport_height } => {
            m.element_offset_top - compact_anchor_ratio * viewport_height + half_line
        }
        ViewportKind::Standard => m.element_offset_top - m.container_height / 2.0 + half_line,
    };
    raw.min(m.max_scroll()).max(0.0)
}

/// Tunables for [`GeometryReconciler`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcilerParams {
    pub compact_breakpoint_px: f64,
    pub compact_anchor_ratio: f64,
    pub scroll_duration: Duration,
}

impl Default for ReconcilerParams {
    fn default() -> Self {
        Self {
            compact_breakpoint_px: COMPACT_BREAKPOINT_PX,
            compact_anchor_ratio: COMPACT_ANCHOR_RATIO,
            scroll_duration: SCROLL_DURATION,
        }
    }
}

/// Turns active-line changes into scroll animations.
#[derive(Debug, Clone, Default)]
pub struct GeometryReconciler {
    animator: ScrollAnimator,
    params: ReconcilerParams,
}

impl GeometryReconciler {
    #[must_use]
    pub fn new(animator: ScrollAnimator, params: ReconcilerParams) -> Self {
        Self { animator, params }
    }

    #[must_use]
    pub const fn animator(&self) -> &ScrollAnimator {
        &self.animator
    }

    #[must_use]
    pub const fn params(&self) -> &ReconcilerParams {
        &self.params
    }

    /// Target offset for `active` on `panel`, or `None` when no line is
    /// active or the line is not rendered.
    pub fn target_for<P: LineLayout + ?Sized>(
        &self,
        panel: &P,
        active: ActiveLine,
        viewport: Viewport,
    ) -> Option<f64> {
        let measurements = panel.measure_line(active.index()?)?;
        let kind = viewport.kind(self.params.compact_breakpoint_px);
        Some(target_scroll_offset_with_anchor(
            &measurements,
            kind,
            self.params.compact_anchor_ratio,
        ))
    }

    /// Start scrolling `panel` to `active`. Returns `None` and leaves the
    /// panel alone when there is nothing to scroll to.
    pub fn reconcile<P: LineLayout + ScrollSurface + ?Sized>(
        &self,
        panel: &P,
        active: ActiveLine,
        viewport: Viewport,
        now: Instant,
    ) -> Option<ScrollAnimation> {
        let Some(target) = self.target_for(panel, active, viewport) else {
            debug!(line = active.as_index(), "No rendered line to scroll to");
            return None;
        };
        debug!(line = active.as_index(), target, "Scrolling to active line");
        Some(
            self.animator
                .animate_scroll_to(panel, target, self.params.scroll_duration, now),
        )
    }

    /// Scroll back to the top of the panel.
    pub fn scroll_to_top<P: ScrollSurface + ?Sized>(
        &self,
        panel: &P,
        now: Instant,
    ) -> ScrollAnimation {
        self.animator
            .animate_scroll_to(panel, 0.0, self.params.scroll_duration, now)
    }
}

/// Per-line rendering state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineVisual {
    pub active: bool,
    pub past: bool,
    pub interlude: bool,
    pub opacity: f64,
    /// Vertical rendering offset, not part of the scroll target
    pub shift_y: f64,
}

/// Vertical rendering offset of line `index`: upcoming lines move down by
/// `shift_px` while the active line is an interlude marker.
#[must_use]
pub fn upcoming_line_shift(lyrics: &Lyrics, active: ActiveLine, index: usize, shift_px: f64) -> f64 {
    let upcoming = active.index().is_some_and(|a| index > a);
    if upcoming && lyrics.is_interlude_active(active) {
        shift_px
    } else {
        0.0
    }
}

/// Rendering state for every line. Past lines fade out unless the panel is
/// hovered.
#[must_use]
pub fn line_visuals(lyrics: &Lyrics, active: ActiveLine, hovered: bool, shift_px: f64) -> Vec<LineVisual> {
    lyrics
        .lines()
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let is_active = active.index() == Some(index);
            let past = active.index().is_some_and(|a| index < a);
            let opacity = if hovered || !past { 1.0 } else { 0.0 };
            LineVisual {
                active: is_active,
                past,
                interlude: line.is_interlude(),
                opacity,
                shift_y: upcoming_line_shift(lyrics, active, index, shift_px),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::LyricLine;

    struct Panel {
        offset: f64,
        lines: Vec<LineMeasurements>,
    }

    impl ScrollSurface for Panel {
        fn scroll_offset(&self) -> f64 {
            self.offset
        }

        fn set_scroll_offset(&mut self, offset: f64) {
            self.offset = offset;
        }
    }

    impl LineLayout for Panel {
        fn measure_line(&self, index: usize) -> Option<LineMeasurements> {
            self.lines.get(index).copied()
        }
    }

    fn measurements(offset_top: f64) -> LineMeasurements {
        LineMeasurements {
            container_height: 600.0,
            content_height: 3000.0,
            element_offset_top: offset_top,
            element_height: 60.0,
        }
    }

    #[test]
    fn test_standard_centres_line() {
        let target = target_scroll_offset(&measurements(1000.0), ViewportKind::Standard);
        assert!((target - (1000.0 - 300.0 + 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_compact_anchors_at_thirty_percent() {
        let kind = ViewportKind::Compact {
            viewport_height: 800.0,
        };
        let target = target_scroll_offset(&measurements(1000.0), kind);
        assert!((target - (1000.0 - 240.0 + 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_target_clamped_to_range() {
        assert_eq!(target_scroll_offset(&measurements(10.0), ViewportKind::Standard), 0.0);
        assert_eq!(
            target_scroll_offset(&measurements(2950.0), ViewportKind::Standard),
            2400.0
        );
    }

    #[test]
    fn test_short_content_clamps_to_zero() {
        let m = LineMeasurements {
            container_height: 800.0,
            content_height: 400.0,
            element_offset_top: 350.0,
            element_height: 40.0,
        };
        assert_eq!(target_scroll_offset(&m, ViewportKind::Standard), 0.0);
        let compact = ViewportKind::Compact {
            viewport_height: 100.0,
        };
        assert_eq!(target_scroll_offset(&m, compact), 0.0);
    }

    #[test]
    fn test_target_always_in_range() {
        for top in (0..4000).step_by(37) {
            for height in [10.0, 600.0, 2500.0, 5000.0] {
                let m = LineMeasurements {
                    container_height: height,
                    content_height: 3000.0,
                    element_offset_top: f64::from(top),
                    element_height: 48.0,
                };
                for kind in [ViewportKind::Standard, ViewportKind::Compact { viewport_height: 900.0 }] {
                    let target = target_scroll_offset(&m, kind);
                    assert!(target >= 0.0 && target <= m.max_scroll(), "{m:?} {kind:?} -> {target}");
                }
            }
        }
    }

    #[test]
    fn test_viewport_kind() {
        assert!(Viewport::new(768.0, 900.0).kind(COMPACT_BREAKPOINT_PX).is_compact());
        assert_eq!(
            Viewport::new(1024.0, 900.0).kind(COMPACT_BREAKPOINT_PX),
            ViewportKind::Standard
        );
    }

    #[test]
    fn test_reconcile_starts_animation() {
        let panel = Panel {
            offset: 0.0,
            lines: vec![measurements(700.0), measurements(1000.0)],
        };
        let reconciler = GeometryReconciler::default();
        let now = Instant::now();
        let animation = reconciler
            .reconcile(&panel, ActiveLine::at(1), Viewport::new(1280.0, 900.0), now)
            .unwrap();
        assert_eq!(animation.state().target_offset, 730.0);
        assert_eq!(animation.duration(), SCROLL_DURATION);
    }

    #[test]
    fn test_reconcile_skips_missing_line() {
        let panel = Panel {
            offset: 0.0,
            lines: vec![measurements(700.0)],
        };
        let reconciler = GeometryReconciler::default();
        let viewport = Viewport::new(1280.0, 900.0);
        let now = Instant::now();
        assert!(reconciler.reconcile(&panel, ActiveLine::NONE, viewport, now).is_none());
        assert!(reconciler.reconcile(&panel, ActiveLine::at(5), viewport, now).is_none());
        assert_eq!(reconciler.animator().current_generation(), 0);
    }

    #[test]
    fn test_upcoming_lines_shift_during_interlude() {
        let lyrics = Lyrics::new(vec![
            LyricLine::new(0.0, "a"),
            LyricLine::new(5.0, ""),
            LyricLine::new(15.0, "b"),
            LyricLine::new(20.0, "c"),
        ]);
        let active = ActiveLine::at(1);
        assert_eq!(upcoming_line_shift(&lyrics, active, 0, UPCOMING_SHIFT_PX), 0.0);
        assert_eq!(upcoming_line_shift(&lyrics, active, 1, UPCOMING_SHIFT_PX), 0.0);
        assert_eq!(upcoming_line_shift(&lyrics, active, 2, UPCOMING_SHIFT_PX), 55.0);
        assert_eq!(upcoming_line_shift(&lyrics, active, 3, UPCOMING_SHIFT_PX), 55.0);
        assert_eq!(upcoming_line_shift(&lyrics, ActiveLine::at(2), 3, UPCOMING_SHIFT_PX), 0.0);
    }

    #[test]
    fn test_line_visuals() {
        let lyrics = Lyrics::new(vec![
            LyricLine::new(0.0, "a"),
            LyricLine::new(5.0, "b"),
            LyricLine::new(9.0, "c"),
        ]);
        let visuals = line_visuals(&lyrics, ActiveLine::at(1), false, UPCOMING_SHIFT_PX);
        assert!(visuals[0].past);
        assert_eq!(visuals[0].opacity, 0.0);
        assert!(visuals[1].active);
        assert_eq!(visuals[1].opacity, 1.0);
        assert_eq!(visuals[2].opacity, 1.0);

        let hovered = line_visuals(&lyrics, ActiveLine::at(1), true, UPCOMING_SHIFT_PX);
        assert!(hovered.iter().all(|v| v.opacity == 1.0));
    }
}
