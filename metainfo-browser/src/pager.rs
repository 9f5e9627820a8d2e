//! Windowed access to long repeating sub-sections.
//!
//! A list of `len` elements is shown as a top window `[0, down)` and a
//! bottom window `[up, len)`. Each end grows independently, one page at a
//! time. Once the windows meet, every element is visible and the list needs
//! no controls.

use std::ops::Range;

/// Which end of a list to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Grow the top window towards the end.
    Down,
    /// Grow the bottom window towards the start.
    Up,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "down" => Ok(Direction::Down),
            "up" => Ok(Direction::Up),
            other => Err(format!("unknown direction `{other}`, expected `up` or `down`")),
        }
    }
}

/// Top and bottom windows over a list of `len` elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPager {
    len: usize,
    /// End of the top window.
    down: usize,
    /// Start of the bottom window.
    up: usize,
    bottom: usize,
    page: usize,
}

impl ListPager {
    /// A pager initially showing the first `top` and last `bottom` elements;
    /// each expansion reveals `page` more.
    pub fn new(len: usize, top: usize, bottom: usize, page: usize) -> Self {
        let mut pager = Self {
            len,
            down: top.min(len),
            up: len.saturating_sub(bottom),
            bottom,
            page: page.max(1),
        };
        pager.settle();
        pager
    }

    fn settle(&mut self) {
        if self.down >= self.up {
            self.down = self.len;
            self.up = self.len;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Currently exposed range at one end.
    pub fn window(&self, direction: Direction) -> Range<usize> {
        match direction {
            Direction::Down => 0..self.down,
            Direction::Up => self.up..self.len,
        }
    }

    /// Grow one end by a page; returns the newly exposed indices.
    pub fn expand(&mut self, direction: Direction) -> Range<usize> {
        if self.is_complete() {
            return self.len..self.len;
        }
        let exposed = match direction {
            Direction::Down => {
                let start = self.down;
                self.down = (self.down + self.page).min(self.up);
                start..self.down
            }
            Direction::Up => {
                let end = self.up;
                self.up = self.up.saturating_sub(self.page).max(self.down);
                self.up..end
            }
        };
        self.settle();
        exposed
    }

    /// Every visible index, in order.
    pub fn visible(&self) -> impl Iterator<Item = usize> + '_ {
        self.window(Direction::Down)
            .chain(if self.is_complete() {
                0..0
            } else {
                self.window(Direction::Up)
            })
    }

    /// Number of elements between the windows.
    pub fn hidden(&self) -> usize {
        self.up - self.down
    }

    /// Whether the windows have met.
    pub fn is_complete(&self) -> bool {
        self.down == self.up
    }

    /// Whether "more" controls are needed.
    pub fn has_controls(&self) -> bool {
        !self.is_complete()
    }

    /// Adopt a new element count, e.g. reported by a page fetch. The bottom
    /// window keeps its size.
    pub fn set_len(&mut self, len: usize) {
        let bottom = if self.is_complete() {
            self.bottom
        } else {
            self.len - self.up
        };
        self.len = len;
        self.down = self.down.min(len);
        self.up = len.saturating_sub(bottom).max(self.down);
        self.settle();
    }
}
