//! Timestamped lyric lines and active-line resolution.

use serde::{Deserialize, Serialize};

/// Seconds trimmed from the end of an interlude so the indicator is gone
/// before the next line starts.
pub const GAP_TAIL_SECS: f64 = 0.5;

/// A single lyric line. Lines with blank text mark instrumental interludes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Start time in seconds from the beginning of the track
    pub time: f64,
    /// Sung text, empty for an interlude marker
    pub text: String,
}

impl LyricLine {
    #[must_use]
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }

    /// Whether this line marks an instrumental gap rather than sung content.
    #[must_use]
    pub fn is_interlude(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The line judged to be currently sung, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveLine(Option<usize>);

impl ActiveLine {
    /// No line has started yet.
    pub const NONE: Self = Self(None);

    #[must_use]
    pub const fn at(index: usize) -> Self {
        Self(Some(index))
    }

    #[must_use]
    pub const fn index(self) -> Option<usize> {
        self.0
    }

    /// Index with `-1` standing in for "no line active".
    #[must_use]
    pub fn as_index(self) -> isize {
        self.0
            .and_then(|i| isize::try_from(i).ok())
            .unwrap_or(-1)
    }

    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0.is_some()
    }
}

/// Return the last line whose start time is at or before `current_time`.
///
/// `lines` must be sorted by time. Lines sharing a timestamp resolve to the
/// later one.
#[must_use]
pub fn resolve_active_line(lines: &[LyricLine], current_time: f64) -> ActiveLine {
    let mut active = ActiveLine::NONE;
    for (index, line) in lines.iter().enumerate() {
        if line.time <= current_time {
            active = ActiveLine::at(index);
        } else {
            break;
        }
    }
    active
}

/// An instrumental gap opened by an interlude marker.
///
/// Only meaningful while the playback time is inside `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterludeGap {
    pub start: f64,
    pub end: f64,
}

impl InterludeGap {
    /// Gap from `start` up to `tail_secs` before `next_time`, never ending
    /// before it starts.
    #[must_use]
    pub fn new(start: f64, next_time: f64, tail_secs: f64) -> Self {
        Self {
            start,
            end: (next_time - tail_secs).max(start),
        }
    }

    #[must_use]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// An ordered lyric sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lyrics {
    lines: Vec<LyricLine>,
}

impl Lyrics {
    /// Wrap already sorted lines. Ordering is the caller's responsibility.
    #[must_use]
    pub fn new(lines: Vec<LyricLine>) -> Self {
        Self { lines }
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn active_line(&self, current_time: f64) -> ActiveLine {
        resolve_active_line(&self.lines, current_time)
    }

    /// Whether the line at `active` is an interlude marker.
    #[must_use]
    pub fn is_interlude_active(&self, active: ActiveLine) -> bool {
        active
            .index()
            .and_then(|i| self.lines.get(i))
            .is_some_and(LyricLine::is_interlude)
    }

    /// Gap opened by the interlude marker at `index`, using the default tail.
    ///
    /// The last line's gap runs until the end of the track.
    #[must_use]
    pub fn interlude_gap(&self, index: usize, track_duration: f64) -> Option<InterludeGap> {
        self.interlude_gap_with_tail(index, track_duration, GAP_TAIL_SECS)
    }

    #[must_use]
    pub fn interlude_gap_with_tail(
        &self,
        index: usize,
        track_duration: f64,
        tail_secs: f64,
    ) -> Option<InterludeGap> {
        let line = self.lines.get(index)?;
        if !line.is_interlude() {
            return None;
        }
        let next_time = self
            .lines
            .get(index + 1)
            .map_or(track_duration, |next| next.time);
        Some(InterludeGap::new(line.time, next_time, tail_secs))
    }
}

impl From<Vec<LyricLine>> for Lyrics {
    fn from(lines: Vec<LyricLine>) -> Self {
        Self::new(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<LyricLine> {
        vec![
            LyricLine::new(0.0, "a"),
            LyricLine::new(2.0, "b"),
            LyricLine::new(5.0, "c"),
        ]
    }

    #[test]
    fn test_resolve_between_lines() {
        assert_eq!(resolve_active_line(&sample(), 3.0).as_index(), 1);
    }

    #[test]
    fn test_resolve_before_first_line() {
        assert_eq!(resolve_active_line(&sample(), -1.0), ActiveLine::NONE);
        assert_eq!(resolve_active_line(&sample(), -1.0).as_index(), -1);
    }

    #[test]
    fn test_resolve_after_last_line() {
        assert_eq!(resolve_active_line(&sample(), 10.0).as_index(), 2);
    }

    #[test]
    fn test_resolve_exact_boundary() {
        assert_eq!(resolve_active_line(&sample(), 2.0).index(), Some(1));
    }

    #[test]
    fn test_resolve_empty_lyrics() {
        assert_eq!(resolve_active_line(&[], 42.0).as_index(), -1);
    }

    #[test]
    fn test_duplicate_timestamps_pick_later_line() {
        let lines = vec![
            LyricLine::new(1.0, "first"),
            LyricLine::new(4.0, "x"),
            LyricLine::new(4.0, "y"),
            LyricLine::new(8.0, "z"),
        ];
        assert_eq!(resolve_active_line(&lines, 4.5).index(), Some(2));
    }

    #[test]
    fn test_backward_seek_decreases_index() {
        let lyrics = Lyrics::new(sample());
        assert_eq!(lyrics.active_line(6.0).index(), Some(2));
        assert_eq!(lyrics.active_line(1.0).index(), Some(0));
    }

    #[test]
    fn test_resolve_matches_greatest_index_rule() {
        let lines = sample();
        for tenth in -10..80 {
            let t = f64::from(tenth) / 10.0;
            let expected = lines.iter().rposition(|l| l.time <= t);
            assert_eq!(resolve_active_line(&lines, t).index(), expected, "t={t}");
        }
    }

    #[test]
    fn test_interlude_detection() {
        assert!(LyricLine::new(1.0, "").is_interlude());
        assert!(LyricLine::new(1.0, "   \t").is_interlude());
        assert!(!LyricLine::new(1.0, " la ").is_interlude());
    }

    #[test]
    fn test_interlude_gap_ends_before_next_line() {
        let lyrics = Lyrics::new(vec![
            LyricLine::new(0.0, "intro"),
            LyricLine::new(10.0, ""),
            LyricLine::new(20.5, "verse"),
        ]);
        let gap = lyrics.interlude_gap(1, 180.0);
        assert_eq!(gap, Some(InterludeGap { start: 10.0, end: 20.0 }));
        assert!(lyrics.interlude_gap(0, 180.0).is_none());
    }

    #[test]
    fn test_interlude_gap_clamped_to_start() {
        let gap = InterludeGap::new(10.0, 10.2, GAP_TAIL_SECS);
        assert_eq!(gap.end, 10.0);
        assert!(!gap.contains(10.0));
    }

    #[test]
    fn test_trailing_interlude_runs_to_track_end() {
        let lyrics = Lyrics::new(vec![LyricLine::new(0.0, "a"), LyricLine::new(50.0, "")]);
        let gap = lyrics.interlude_gap(1, 60.0);
        assert_eq!(gap, Some(InterludeGap { start: 50.0, end: 59.5 }));
    }

    #[test]
    fn test_is_interlude_active() {
        let lyrics = Lyrics::new(vec![LyricLine::new(0.0, "a"), LyricLine::new(5.0, " ")]);
        assert!(!lyrics.is_interlude_active(ActiveLine::NONE));
        assert!(!lyrics.is_interlude_active(ActiveLine::at(0)));
        assert!(lyrics.is_interlude_active(ActiveLine::at(1)));
    }
}
