//! Staging of the three-dot interlude indicator.
//!
//! The indicator lives through four phases inside a gap: it fades in, breathes
//! while the dots fill one after another, pops outward, then shrinks away.
//! Everything here is a pure function of the gap bounds and the playback time
//! so any frame can be reproduced exactly.

use crate::easing::CubicBezier;
use crate::lyrics::InterludeGap;
use crate::settings::{FontSize, HorizontalPosition, ResolvedTheme, Settings};
use std::time::Duration;

/// Alpha of an unfilled dot.
pub const DOT_MIN_ALPHA: f64 = 0.2;

/// Dot diameter in pixels.
pub const DOT_SIZE_PX: f64 = 16.0;

/// Horizontal margin on each side of a dot in pixels.
pub const DOT_MARGIN_PX: f64 = 6.0;

const SUSTAIN_SCALE: f64 = 1.1;
const EXIT_POP_SCALE: f64 = 1.3;
const EXIT_SHRINK_SCALE: f64 = 0.8;

/// Phase timings of the indicator, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterludeTiming {
    /// Fade-in length at the start of the gap
    pub appear_secs: f64,
    /// Length of the exit at the end of the gap
    pub exit_secs: f64,
    /// Length of the outward pop at the start of the exit
    pub exit_pop_secs: f64,
    /// Period of the sustain pulse, independent of the gap length
    pub pulse_period_secs: f64,
}

impl Default for InterludeTiming {
    fn default() -> Self {
        Self {
            appear_secs: 2.0,
            exit_secs: 1.0,
            exit_pop_secs: 0.5,
            pulse_period_secs: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterludePhase {
    Appear,
    Sustain,
    ExitBegin,
    ExitEnd,
}

/// How a rendered property should animate towards its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSpec {
    pub duration: Duration,
    pub easing: CubicBezier,
}

impl TransitionSpec {
    const SLOW: Self = Self::expo(4000);
    const ONE_SECOND: Self = Self::expo(1000);
    const FAST: Self = Self::expo(500);

    const fn expo(millis: u64) -> Self {
        Self {
            duration: Duration::from_millis(millis),
            easing: CubicBezier::EXPO_OUT,
        }
    }
}

/// Instantaneous visual state of the indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterludeStage {
    pub phase: InterludePhase,
    pub opacity: f64,
    pub parent_scale: f64,
    /// Fill level of each dot, left to right, in `[0, 1]`
    pub dot_fills: [f64; 3],
    pub transform_transition: TransitionSpec,
    pub opacity_transition: TransitionSpec,
}

/// Rendered intensity of a dot with the given fill.
#[must_use]
pub fn dot_alpha(fill: f64) -> f64 {
    DOT_MIN_ALPHA + (1.0 - DOT_MIN_ALPHA) * fill
}

impl InterludeStage {
    #[must_use]
    pub fn dot_alphas(&self) -> [f64; 3] {
        self.dot_fills.map(dot_alpha)
    }

    /// Indicator scale including the font-size adjustment.
    #[must_use]
    pub fn scale_for(&self, font_size: FontSize) -> f64 {
        self.parent_scale + font_size.indicator_scale_offset()
    }
}

/// Indicator state at `current_time` for a gap `[gap_start, gap_end)`.
///
/// Returns `None` outside the gap or when the gap is empty.
#[must_use]
pub fn compute_interlude_stage(gap_start: f64, gap_end: f64, current_time: f64) -> Option<InterludeStage> {
    compute_interlude_stage_with(&InterludeTiming::default(), gap_start, gap_end, current_time)
}

#[must_use]
pub fn compute_interlude_stage_with(
    timing: &InterludeTiming,
    gap_start: f64,
    gap_end: f64,
    current_time: f64,
) -> Option<InterludeStage> {
    let total = gap_end - gap_start;
    if total <= 0.0 {
        return None;
    }
    let dt = current_time - gap_start;
    if !(0.0..total).contains(&dt) {
        return None;
    }

    let exit_start = total - timing.exit_secs;

    let stage = if dt < timing.appear_secs {
        InterludeStage {
            phase: InterludePhase::Appear,
            opacity: dt / timing.appear_secs,
            parent_scale: 1.0,
            dot_fills: [0.0; 3],
            transform_transition: TransitionSpec::SLOW,
            opacity_transition: TransitionSpec::FAST,
        }
    } else if dt < exit_start {
        let dt_mid = dt - timing.appear_secs;
        let mid_duration = (total - (timing.appear_secs + timing.exit_secs)).max(0.0);
        let ratio = if mid_duration > 0.0 {
            (dt_mid / mid_duration).clamp(0.0, 1.0)
        } else {
            0.0
        };

        InterludeStage {
            phase: InterludePhase::Sustain,
            opacity: 1.0,
            parent_scale: pulse_scale(dt_mid, timing.pulse_period_secs),
            dot_fills: sequential_fills(ratio),
            transform_transition: TransitionSpec::SLOW,
            opacity_transition: TransitionSpec::FAST,
        }
    } else {
        let dt_exit = dt - exit_start;
        let (phase, parent_scale, opacity) = if dt_exit < timing.exit_pop_secs {
            (InterludePhase::ExitBegin, EXIT_POP_SCALE, 1.0)
        } else {
            (InterludePhase::ExitEnd, EXIT_SHRINK_SCALE, 0.0)
        };

        InterludeStage {
            phase,
            opacity,
            parent_scale,
            dot_fills: [1.0; 3],
            transform_transition: TransitionSpec::ONE_SECOND,
            opacity_transition: TransitionSpec::FAST,
        }
    };

    Some(stage)
}

/// Indicator state for `gap` at `current_time`.
#[must_use]
pub fn stage_for_gap(timing: &InterludeTiming, gap: &InterludeGap, current_time: f64) -> Option<InterludeStage> {
    compute_interlude_stage_with(timing, gap.start, gap.end, current_time)
}

/// Split `ratio` into thirds; each dot fills while the ratio crosses its
/// third.
fn sequential_fills(ratio: f64) -> [f64; 3] {
    let third = 1.0 / 3.0;
    let fill = |from: f64| {
        if ratio < from {
            0.0
        } else {
            ((ratio - from) * 3.0).min(1.0)
        }
    };
    [fill(0.0), fill(third), fill(2.0 * third)]
}

/// Enlarged for the first half of each period, resting for the second.
fn pulse_scale(since_sustain: f64, period: f64) -> f64 {
    if period <= 0.0 {
        return 1.0;
    }
    if since_sustain.rem_euclid(period) < period / 2.0 {
        SUSTAIN_SCALE
    } else {
        1.0
    }
}

/// Where the indicator is anchored horizontally inside its line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorAnchor {
    Left { inset_px: f64 },
    /// Centred; the indicator is translated by half its width
    Center,
    Right { inset_px: f64 },
}

/// Everything a renderer needs to draw the indicator for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorLayout {
    pub anchor: IndicatorAnchor,
    pub scale: f64,
    pub opacity: f64,
    /// Base dot colour as RGB; the per-dot alpha comes from `dot_alphas`
    pub dot_rgb: (u8, u8, u8),
    pub dot_alphas: [f64; 3],
    pub transform_transition: TransitionSpec,
    pub opacity_transition: TransitionSpec,
}

impl IndicatorLayout {
    /// Combine a stage with the user's layout preferences.
    #[must_use]
    pub fn new(stage: &InterludeStage, settings: &Settings, theme: ResolvedTheme) -> Self {
        let inset_px = settings.font_size.indicator_inset_px();
        let anchor = match settings.lyric_position {
            HorizontalPosition::Left => IndicatorAnchor::Left { inset_px },
            HorizontalPosition::Center => IndicatorAnchor::Center,
            HorizontalPosition::Right => IndicatorAnchor::Right { inset_px },
        };
        let dot_rgb = match theme {
            ResolvedTheme::Dark => (255, 255, 255),
            ResolvedTheme::Light => (0, 0, 0),
        };

        Self {
            anchor,
            scale: stage.scale_for(settings.font_size),
            opacity: stage.opacity,
            dot_rgb,
            dot_alphas: stage.dot_alphas(),
            transform_transition: stage.transform_transition,
            opacity_transition: stage.opacity_transition,
        }
    }

    /// Unscaled width of the three dots with their margins.
    #[must_use]
    pub fn natural_width_px() -> f64 {
        3.0 * (DOT_SIZE_PX + 2.0 * DOT_MARGIN_PX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn stage(t: f64) -> Option<InterludeStage> {
        compute_interlude_stage(10.0, 20.0, t)
    }

    #[test]
    fn test_appear_phase() {
        let start = stage(10.0).unwrap();
        assert_eq!(start.phase, InterludePhase::Appear);
        assert!(start.opacity.abs() < EPS);
        assert_eq!(start.dot_fills, [0.0; 3]);

        let half = stage(11.0).unwrap();
        assert_eq!(half.phase, InterludePhase::Appear);
        assert!((half.opacity - 0.5).abs() < EPS);
    }

    #[test]
    fn test_sustain_begins_fully_visible() {
        let s = stage(12.0).unwrap();
        assert_eq!(s.phase, InterludePhase::Sustain);
        assert_eq!(s.opacity, 1.0);
        assert_eq!(s.parent_scale, 1.1);
        assert_eq!(s.dot_fills, [0.0; 3]);
    }

    #[test]
    fn test_exit_begin() {
        let s = stage(19.0).unwrap();
        assert_eq!(s.phase, InterludePhase::ExitBegin);
        assert_eq!(s.parent_scale, 1.3);
        assert_eq!(s.opacity, 1.0);
        assert_eq!(s.dot_fills, [1.0; 3]);
        assert_eq!(s.transform_transition.duration, Duration::from_secs(1));
    }

    #[test]
    fn test_exit_end() {
        let s = stage(19.6).unwrap();
        assert_eq!(s.phase, InterludePhase::ExitEnd);
        assert_eq!(s.parent_scale, 0.8);
        assert_eq!(s.opacity, 0.0);
        assert_eq!(s.dot_fills, [1.0; 3]);
        assert_eq!(s.opacity_transition.duration, Duration::from_millis(500));
    }

    #[test]
    fn test_outside_gap_is_none() {
        assert!(stage(20.0).is_none());
        assert!(stage(9.99).is_none());
        assert!(stage(25.0).is_none());
    }

    #[test]
    fn test_empty_gap_is_none() {
        assert!(compute_interlude_stage(10.0, 10.0, 10.0).is_none());
        assert!(compute_interlude_stage(10.0, 8.0, 9.0).is_none());
    }

    #[test]
    fn test_non_finite_time_is_none() {
        assert!(compute_interlude_stage(10.0, 20.0, f64::NAN).is_none());
        assert!(compute_interlude_stage(10.0, 20.0, f64::INFINITY).is_none());
        assert!(compute_interlude_stage(10.0, f64::NAN, 12.0).is_none());
    }

    #[test]
    fn test_fills_are_sequential_and_monotonic() {
        let mut previous = [0.0; 3];
        for step in 0..=300 {
            let ratio = f64::from(step) / 300.0;
            let fills = sequential_fills(ratio);
            for dot in 0..3 {
                assert!(fills[dot] >= previous[dot], "dot {dot} dropped at {ratio}");
                assert!((0.0..=1.0).contains(&fills[dot]));
            }
            previous = fills;
        }

        assert!((sequential_fills(1.0 / 3.0)[0] - 1.0).abs() < 1e-9);
        assert!((sequential_fills(2.0 / 3.0)[1] - 1.0).abs() < 1e-9);
        assert!((sequential_fills(1.0)[2] - 1.0).abs() < 1e-9);
        assert_eq!(sequential_fills(0.2)[1], 0.0);
        assert_eq!(sequential_fills(0.5)[2], 0.0);
    }

    #[test]
    fn test_sustain_fills_track_gap_progress() {
        // total 10s: sustain covers 12..19, a 7s middle
        let s = stage(12.0 + 7.0 / 6.0).unwrap();
        assert!((s.dot_fills[0] - 0.5).abs() < 1e-9);
        assert_eq!(s.dot_fills[1], 0.0);

        let late = stage(18.99).unwrap();
        assert_eq!(late.phase, InterludePhase::Sustain);
        assert!(late.dot_fills[2] > 0.9);
    }

    #[test]
    fn test_pulse_period() {
        let timing = InterludeTiming::default();
        let long_gap = |t: f64| compute_interlude_stage_with(&timing, 0.0, 30.0, t).unwrap();
        assert_eq!(long_gap(2.0).parent_scale, 1.1);
        assert_eq!(long_gap(3.9).parent_scale, 1.1);
        assert_eq!(long_gap(4.0).parent_scale, 1.0);
        assert_eq!(long_gap(5.9).parent_scale, 1.0);
        assert_eq!(long_gap(6.0).parent_scale, 1.1);
    }

    #[test]
    fn test_pulse_period_is_tunable() {
        let timing = InterludeTiming {
            pulse_period_secs: 2.0,
            ..InterludeTiming::default()
        };
        let s = compute_interlude_stage_with(&timing, 0.0, 30.0, 3.5).unwrap();
        assert_eq!(s.parent_scale, 1.0);
    }

    #[test]
    fn test_short_gap_without_sustain() {
        // total 2.8s: the exit starts at 1.8 but the fade-in keeps priority until 2
        let s = compute_interlude_stage(0.0, 2.8, 1.9).unwrap();
        assert_eq!(s.phase, InterludePhase::Appear);
        let s = compute_interlude_stage(0.0, 2.8, 2.1).unwrap();
        assert_eq!(s.phase, InterludePhase::ExitBegin);
        let s = compute_interlude_stage(0.0, 2.8, 2.5).unwrap();
        assert_eq!(s.phase, InterludePhase::ExitEnd);
    }

    #[test]
    fn test_stage_is_pure() {
        for t in [10.0, 11.3, 14.2, 19.2, 19.7] {
            let a = stage(t).unwrap();
            let b = stage(t).unwrap();
            assert_eq!(a.opacity.to_bits(), b.opacity.to_bits());
            assert_eq!(a.parent_scale.to_bits(), b.parent_scale.to_bits());
            for dot in 0..3 {
                assert_eq!(a.dot_fills[dot].to_bits(), b.dot_fills[dot].to_bits());
            }
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_dot_alpha_range() {
        assert!((dot_alpha(0.0) - 0.2).abs() < EPS);
        assert!((dot_alpha(1.0) - 1.0).abs() < EPS);
        assert!((dot_alpha(0.5) - 0.6).abs() < EPS);
    }

    #[test]
    fn test_layout_applies_font_size_and_position() {
        let s = stage(12.0).unwrap();
        let settings = Settings {
            font_size: FontSize::Large,
            lyric_position: HorizontalPosition::Right,
            ..Settings::default()
        };
        let layout = IndicatorLayout::new(&s, &settings, ResolvedTheme::Dark);
        assert!((layout.scale - 1.3).abs() < EPS);
        assert_eq!(layout.anchor, IndicatorAnchor::Right { inset_px: 15.0 });
        assert_eq!(layout.dot_rgb, (255, 255, 255));

        let small_centered = Settings {
            font_size: FontSize::Small,
            lyric_position: HorizontalPosition::Center,
            ..Settings::default()
        };
        let layout = IndicatorLayout::new(&s, &small_centered, ResolvedTheme::Light);
        assert!((layout.scale - 1.0).abs() < EPS);
        assert_eq!(layout.anchor, IndicatorAnchor::Center);
        assert_eq!(layout.dot_rgb, (0, 0, 0));
    }

    #[test]
    fn test_stage_for_gap() {
        let gap = InterludeGap { start: 10.0, end: 20.0 };
        let s = stage_for_gap(&InterludeTiming::default(), &gap, 11.0).unwrap();
        assert_eq!(s, stage(11.0).unwrap());
    }
}
