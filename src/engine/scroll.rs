// Parley Chat Engine — Scroll Anchor
//
// Presentation heuristic for the message view: follow the bottom when the
// viewer was already (nearly) at the bottom at last render, leave them
// alone when they are reading history. Pure math, no I/O — the rendering
// layer feeds geometry in and acts on the boolean.

use crate::atoms::constants::SCROLL_FOLLOW_THRESHOLD_PX;

pub struct ScrollAnchor {
    threshold_px: f64,
    distance_from_bottom: f64,
}

impl ScrollAnchor {
    pub fn new() -> Self {
        ScrollAnchor::with_threshold(SCROLL_FOLLOW_THRESHOLD_PX)
    }

    pub fn with_threshold(threshold_px: f64) -> Self {
        // A fresh view starts pinned to the bottom.
        ScrollAnchor { threshold_px, distance_from_bottom: 0.0 }
    }

    /// Record where the viewer was at the last render. `offset` is the
    /// scroll position (distance from content top to viewport top).
    pub fn record_render(&mut self, content_height: f64, viewport_height: f64, offset: f64) {
        self.distance_from_bottom = (content_height - viewport_height - offset).max(0.0);
    }

    /// Whether log growth should force-scroll the view to the new bottom.
    pub fn should_follow(&self) -> bool {
        self.distance_from_bottom <= self.threshold_px
    }
}

impl Default for ScrollAnchor {
    fn default() -> Self {
        ScrollAnchor::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_anchor_follows() {
        assert!(ScrollAnchor::new().should_follow());
    }

    #[test]
    fn test_viewer_at_bottom_follows() {
        let mut anchor = ScrollAnchor::with_threshold(48.0);
        anchor.record_render(1000.0, 400.0, 600.0);
        assert!(anchor.should_follow());
    }

    #[test]
    fn test_viewer_slightly_above_bottom_still_follows() {
        let mut anchor = ScrollAnchor::with_threshold(48.0);
        anchor.record_render(1000.0, 400.0, 560.0);
        assert!(anchor.should_follow());
    }

    #[test]
    fn test_viewer_reading_history_is_not_interrupted() {
        let mut anchor = ScrollAnchor::with_threshold(48.0);
        anchor.record_render(1000.0, 400.0, 100.0);
        assert!(!anchor.should_follow());
    }

    #[test]
    fn test_content_shorter_than_viewport_follows() {
        let mut anchor = ScrollAnchor::with_threshold(48.0);
        anchor.record_render(200.0, 400.0, 0.0);
        assert!(anchor.should_follow());
    }
}
