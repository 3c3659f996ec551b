//! Eased, interruptible scrolling of the lyric panel.
//!
//! Every call to [`ScrollAnimator::animate_scroll_to`] bumps a shared
//! generation counter. An animation only writes to the surface while its own
//! generation is still the latest, so starting a new scroll cleanly
//! supersedes any scroll still in flight.

use crate::easing::CubicBezier;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;

/// Default duration of a scroll to the active line.
pub const SCROLL_DURATION: Duration = Duration::from_millis(1000);

/// Something with a vertical scroll offset, such as the lyric panel.
pub trait ScrollSurface {
    fn scroll_offset(&self) -> f64;
    fn set_scroll_offset(&mut self, offset: f64);
}

/// Captured at the start of one scroll animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnimationState {
    pub start_offset: f64,
    pub target_offset: f64,
    pub started_at: Instant,
}

/// Outcome of advancing an animation by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// Offset written, more frames needed
    Continue,
    /// Final offset written
    Finished,
    /// A newer animation owns the surface; nothing was written
    Superseded,
}

/// Starts scroll animations and tracks which one is current.
#[derive(Debug, Clone, Default)]
pub struct ScrollAnimator {
    generation: Arc<AtomicU64>,
    easing: CubicBezier,
}

impl ScrollAnimator {
    /// Animator using the standard scroll curve.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_easing(easing: CubicBezier) -> Self {
        Self {
            generation: Arc::default(),
            easing,
        }
    }

    /// Begin scrolling `surface` from its current offset to `target_offset`.
    ///
    /// The target is expected to be clamped to the scrollable range already.
    /// Any animation started earlier by this animator stops writing from now
    /// on.
    pub fn animate_scroll_to<S: ScrollSurface + ?Sized>(
        &self,
        surface: &S,
        target_offset: f64,
        duration: Duration,
        now: Instant,
    ) -> ScrollAnimation {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let state = ScrollAnimationState {
            start_offset: surface.scroll_offset(),
            target_offset,
            started_at: now,
        };
        trace!(
            token,
            from = state.start_offset,
            to = target_offset,
            "Starting scroll animation"
        );
        ScrollAnimation {
            state,
            duration,
            easing: self.easing,
            token,
            generation: Arc::clone(&self.generation),
        }
    }

    /// Generation of the most recently started animation.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// One in-flight scroll, advanced frame by frame.
#[derive(Debug, Clone)]
pub struct ScrollAnimation {
    state: ScrollAnimationState,
    duration: Duration,
    easing: CubicBezier,
    token: u64,
    generation: Arc<AtomicU64>,
}

impl ScrollAnimation {
    #[must_use]
    pub const fn state(&self) -> &ScrollAnimationState {
        &self.state
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether no newer animation has been started since this one.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.token
    }

    /// Linear progress in `[0, 1]` at `now`.
    #[must_use]
    pub fn progress_at(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.state.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Offset the surface should have at `now`.
    #[must_use]
    pub fn offset_at(&self, now: Instant) -> f64 {
        let eased = self.easing.ease(self.progress_at(now));
        let start = self.state.start_offset;
        start + (self.state.target_offset - start) * eased
    }

    #[must_use]
    pub fn is_finished_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.state.started_at) >= self.duration
    }

    /// Write the offset for `now` unless superseded.
    pub fn step<S: ScrollSurface + ?Sized>(&self, surface: &mut S, now: Instant) -> FrameStep {
        if !self.is_current() {
            return FrameStep::Superseded;
        }
        surface.set_scroll_offset(self.offset_at(now));
        if self.is_finished_at(now) {
            FrameStep::Finished
        } else {
            FrameStep::Continue
        }
    }
}

/// Drive `animation` on a fixed frame cadence until it finishes or is
/// superseded.
pub async fn run_scroll_animation<S: ScrollSurface + Send>(
    animation: ScrollAnimation,
    surface: Arc<Mutex<S>>,
    frame_interval: Duration,
) -> FrameStep {
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let now = tokio::time::Instant::now().into_std();
        let step = animation.step(&mut *surface.lock().await, now);
        if step != FrameStep::Continue {
            trace!(token = animation.token, ?step, "Scroll animation ended");
            return step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Panel {
        offset: f64,
    }

    impl ScrollSurface for Panel {
        fn scroll_offset(&self) -> f64 {
            self.offset
        }

        fn set_scroll_offset(&mut self, offset: f64) {
            self.offset = offset;
        }
    }

    #[test]
    fn test_converges_to_target() {
        let animator = ScrollAnimator::new();
        let mut panel = Panel::default();
        let start = Instant::now();
        let animation = animator.animate_scroll_to(&panel, 1000.0, SCROLL_DURATION, start);

        assert!(animation.offset_at(start).abs() < 1e-6);
        assert_eq!(animation.step(&mut panel, start), FrameStep::Continue);

        let end = start + SCROLL_DURATION;
        assert_eq!(animation.step(&mut panel, end), FrameStep::Finished);
        assert!((panel.offset - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_offsets_are_monotonic() {
        let animator = ScrollAnimator::new();
        let panel = Panel::default();
        let start = Instant::now();
        let animation = animator.animate_scroll_to(&panel, 1000.0, SCROLL_DURATION, start);

        let mut previous = animation.offset_at(start);
        for ms in (0..=1000).step_by(16) {
            let offset = animation.offset_at(start + Duration::from_millis(ms));
            assert!(offset + 1.0 >= previous, "offset went backwards at {ms}ms");
            previous = offset;
        }
    }

    #[test]
    fn test_scrolls_upwards() {
        let animator = ScrollAnimator::new();
        let mut panel = Panel { offset: 800.0 };
        let start = Instant::now();
        let animation = animator.animate_scroll_to(&panel, 200.0, SCROLL_DURATION, start);

        animation.step(&mut panel, start + Duration::from_millis(300));
        assert!(panel.offset < 800.0 && panel.offset > 200.0);

        animation.step(&mut panel, start + Duration::from_secs(2));
        assert!((panel.offset - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_duration_jumps() {
        let animator = ScrollAnimator::new();
        let mut panel = Panel::default();
        let now = Instant::now();
        let animation = animator.animate_scroll_to(&panel, 300.0, Duration::ZERO, now);
        assert_eq!(animation.step(&mut panel, now), FrameStep::Finished);
        assert!((panel.offset - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_newer_animation_supersedes_older() {
        let animator = ScrollAnimator::new();
        let mut panel = Panel::default();
        let start = Instant::now();

        let first = animator.animate_scroll_to(&panel, 1000.0, SCROLL_DURATION, start);
        let mid = start + Duration::from_millis(200);
        first.step(&mut panel, mid);
        let reached = panel.offset;

        let second = animator.animate_scroll_to(&panel, 0.0, SCROLL_DURATION, mid);
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(second.state().start_offset, reached);

        let later = mid + Duration::from_millis(100);
        assert_eq!(first.step(&mut panel, later), FrameStep::Superseded);
        assert_eq!(panel.offset, reached);

        assert_eq!(second.step(&mut panel, later), FrameStep::Continue);
        assert!(panel.offset < reached);
    }

    #[test]
    fn test_generation_counts_invocations() {
        let animator = ScrollAnimator::new();
        let panel = Panel::default();
        let now = Instant::now();
        assert_eq!(animator.current_generation(), 0);
        let _ = animator.animate_scroll_to(&panel, 10.0, SCROLL_DURATION, now);
        let _ = animator.animate_scroll_to(&panel, 20.0, SCROLL_DURATION, now);
        assert_eq!(animator.current_generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_scroll_animation_finishes() {
        let animator = ScrollAnimator::new();
        let panel = Arc::new(Mutex::new(Panel::default()));
        let now = tokio::time::Instant::now().into_std();
        let animation = animator.animate_scroll_to(&*panel.lock().await, 500.0, SCROLL_DURATION, now);

        let step = run_scroll_animation(animation, Arc::clone(&panel), Duration::from_millis(16)).await;
        assert_eq!(step, FrameStep::Finished);
        assert!((panel.lock().await.offset - 500.0).abs() < 1e-3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_scroll_animation_superseded() {
        let animator = ScrollAnimator::new();
        let panel = Arc::new(Mutex::new(Panel::default()));
        let now = tokio::time::Instant::now().into_std();
        let first = animator.animate_scroll_to(&*panel.lock().await, 500.0, SCROLL_DURATION, now);
        let handle = tokio::spawn(run_scroll_animation(
            first,
            Arc::clone(&panel),
            Duration::from_millis(16),
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let now = tokio::time::Instant::now().into_std();
        let second = animator.animate_scroll_to(&*panel.lock().await, 50.0, SCROLL_DURATION, now);
        let last = run_scroll_animation(second, Arc::clone(&panel), Duration::from_millis(16)).await;

        assert_eq!(last, FrameStep::Finished);
        assert!(matches!(handle.await, Ok(FrameStep::Superseded)));
        assert!((panel.lock().await.offset - 50.0).abs() < 1e-3);
    }
}
