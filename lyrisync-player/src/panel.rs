//! An off-screen lyric panel with the same box model as the on-screen one.

use lyrisync_core::{FontSize, LineLayout, LineMeasurements, Lyrics, ScrollSurface};

/// Root font size the rem sizes are relative to.
const ROOT_FONT_PX: f64 = 16.0;

const LINE_HEIGHT_RATIO: f64 = 1.5;

/// Vertical margin above and below every sung line.
const LINE_MARGIN_PX: f64 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct LineBox {
    top: f64,
    height: f64,
}

/// Line boxes stacked between padding at the top and bottom, scrolled inside
/// a container of fixed height. Interlude markers take no space.
#[derive(Debug, Clone)]
pub struct VirtualPanel {
    lines: Vec<LineBox>,
    padding_px: f64,
    content_height: f64,
    container_height: f64,
    offset: f64,
}

impl VirtualPanel {
    #[must_use]
    pub fn new(lyrics: &Lyrics, font_size: FontSize, padding_px: f64, container_height: f64) -> Self {
        let mut panel = Self {
            lines: Vec::new(),
            padding_px,
            content_height: 0.0,
            container_height,
            offset: 0.0,
        };
        panel.relayout(lyrics, font_size);
        panel
    }

    /// Recompute line boxes, e.g. after a font-size change.
    pub fn relayout(&mut self, lyrics: &Lyrics, font_size: FontSize) {
        let line_height = font_size.rem() * ROOT_FONT_PX * LINE_HEIGHT_RATIO;
        let mut cursor = self.padding_px;

        self.lines = lyrics
            .lines()
            .iter()
            .map(|line| {
                if line.is_interlude() {
                    return LineBox {
                        top: cursor,
                        height: 0.0,
                    };
                }
                cursor += LINE_MARGIN_PX;
                let line_box = LineBox {
                    top: cursor,
                    height: line_height,
                };
                cursor += line_height + LINE_MARGIN_PX;
                line_box
            })
            .collect();

        self.content_height = cursor + self.padding_px;
        self.offset = self.offset.min(self.max_scroll());
    }

    pub fn set_container_height(&mut self, height: f64) {
        self.container_height = height;
        self.offset = self.offset.min(self.max_scroll());
    }

    #[must_use]
    pub const fn content_height(&self) -> f64 {
        self.content_height
    }

    #[must_use]
    pub const fn container_height(&self) -> f64 {
        self.container_height
    }

    fn max_scroll(&self) -> f64 {
        (self.content_height - self.container_height).max(0.0)
    }
}

impl ScrollSurface for VirtualPanel {
    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.offset = offset.clamp(0.0, self.max_scroll());
    }
}

impl LineLayout for VirtualPanel {
    fn measure_line(&self, index: usize) -> Option<LineMeasurements> {
        let line = self.lines.get(index)?;
        Some(LineMeasurements {
            container_height: self.container_height,
            content_height: self.content_height,
            element_offset_top: line.top,
            element_height: line.height,
        })
    }
}
