// Transcript scroll state
//
// Line-based scrolling with auto-follow: while the view sits at the bottom,
// new fragments keep it pinned there. Scrolling up detaches it; reaching the
// bottom again (or submitting) re-attaches.

#[derive(Debug, Clone)]
pub struct ScrollState {
    /// First visible line
    offset: usize,
    /// Total rendered lines
    total: usize,
    /// Visible lines
    viewport: usize,
    pub auto_follow: bool,
}

impl ScrollState {
    pub fn new() -> Self {
        Self {
            offset: 0,
            total: 0,
            viewport: 0,
            auto_follow: true,
        }
    }

    /// Record the sizes of the latest frame. Auto-follow snaps to the bottom,
    /// otherwise the offset is clamped.
    pub fn update_dimensions(&mut self, total: usize, viewport: usize) {
        self.total = total;
        self.viewport = viewport;

        if self.auto_follow {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        if lines == 0 || self.offset == 0 {
            return;
        }
        self.offset = self.offset.saturating_sub(lines);
        self.auto_follow = false;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = (self.offset + lines).min(self.max_offset());
        if self.offset >= self.max_offset() {
            self.auto_follow = true;
        }
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport.max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
        self.auto_follow = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
        self.auto_follow = true;
    }

    /// Bring `line` into view, leaving the offset alone if it already is
    pub fn reveal(&mut self, line: usize) {
        if line < self.offset {
            self.offset = line;
        } else if self.viewport > 0 && line >= self.offset + self.viewport {
            self.offset = (line + 1).saturating_sub(self.viewport);
        } else {
            return;
        }
        self.offset = self.offset.min(self.max_offset());
        self.auto_follow = self.offset >= self.max_offset();
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn needs_scrollbar(&self) -> bool {
        self.total > self.viewport
    }

    fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.viewport)
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_follow_on_new_content() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(10, 5);
        assert_eq!(scroll.offset(), 5);

        scroll.update_dimensions(15, 5);
        assert_eq!(scroll.offset(), 10);
    }

    #[test]
    fn test_scroll_up_detaches_and_holds_position() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(20, 5);

        scroll.scroll_up(3);
        assert!(!scroll.auto_follow);
        assert_eq!(scroll.offset(), 12);

        // Streaming more lines must not move a detached view
        scroll.update_dimensions(30, 5);
        assert_eq!(scroll.offset(), 12);
    }

    #[test]
    fn test_reaching_bottom_reattaches() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(20, 5);
        scroll.page_up();
        assert!(!scroll.auto_follow);

        scroll.scroll_down(100);
        assert!(scroll.auto_follow);
        assert_eq!(scroll.offset(), 15);
    }

    #[test]
    fn test_reveal_moves_minimally() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(100, 10);
        scroll.scroll_to_top();

        scroll.reveal(4);
        assert_eq!(scroll.offset(), 0);

        scroll.reveal(25);
        assert_eq!(scroll.offset(), 16);
        assert!(!scroll.auto_follow);

        scroll.reveal(3);
        assert_eq!(scroll.offset(), 3);
    }

    #[test]
    fn test_short_content_never_scrolls() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(3, 10);
        scroll.page_down();
        assert_eq!(scroll.offset(), 0);
        assert!(!scroll.needs_scrollbar());
    }
}
