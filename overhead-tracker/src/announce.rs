//! Announcement deduplication
//!
//! A short recency list of announced registrations, newest first. A hit
//! suppresses the announcement and leaves the order alone (no promotion, so
//! this is not an LRU). A miss prepends and evicts the oldest past capacity.
//!
//! Suppression is approximate: once [`ANNOUNCEMENT_WINDOW`] other aircraft have
//! been announced, an earlier aircraft is announced again even if it never
//! left the area.

use std::collections::VecDeque;

use crate::feed::normalize_identifier;

/// How many distinct recent announcements suppress a repeat
pub const ANNOUNCEMENT_WINDOW: usize = 11;

/// Bounded most-recent-first list of announced identifiers
#[derive(Debug)]
pub struct AnnouncementWindow {
    recent: VecDeque<String>,
    capacity: usize,
}

impl Default for AnnouncementWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnouncementWindow {
    pub fn new() -> Self {
        Self::with_capacity(ANNOUNCEMENT_WINDOW)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            recent: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Check-and-record: true means announce, and the identifier is now recorded
    ///
    /// Identifiers are compared trimmed and uppercased. A blank identifier is
    /// recorded as the empty string, so unidentifiable aircraft are announced
    /// once per window rather than every cycle.
    pub fn should_announce(&mut self, identifier: &str) -> bool {
        let key = normalize_identifier(identifier).unwrap_or_default();

        if self.recent.contains(&key) {
            return false;
        }

        self.recent.push_front(key);
        self.recent.truncate(self.capacity);
        true
    }

    /// Recorded identifiers, most recent first
    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(n: usize) -> Vec<String> {
        (b'A'..).take(n).map(|c| (c as char).to_string()).collect()
    }

    #[test]
    fn test_first_sighting_announced_then_suppressed() {
        let mut window = AnnouncementWindow::new();
        assert!(window.should_announce("VH-ABC"));
        assert!(!window.should_announce("VH-ABC"));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_identifier_normalized() {
        let mut window = AnnouncementWindow::new();
        assert!(window.should_announce(" vh-abc "));
        assert!(!window.should_announce("VH-ABC"));
        assert_eq!(window.recent().collect::<Vec<_>>(), vec!["VH-ABC"]);
    }

    #[test]
    fn test_capacity_bounded_newest_first() {
        let mut window = AnnouncementWindow::new();
        for id in letters(15) {
            window.should_announce(&id);
        }
        assert_eq!(window.len(), ANNOUNCEMENT_WINDOW);
        let recent: Vec<_> = window.recent().collect();
        assert_eq!(recent.first(), Some(&"O"));
        assert_eq!(recent.last(), Some(&"E"));
    }

    #[test]
    fn test_hit_does_not_reorder() {
        let mut window = AnnouncementWindow::new();
        for id in ["A", "B", "C"] {
            window.should_announce(id);
        }
        assert!(!window.should_announce("A"));
        assert_eq!(window.recent().collect::<Vec<_>>(), vec!["C", "B", "A"]);
    }

    /// Documented imprecision: A comes back once B..L (11 others) have been
    /// announced, even if A never left the area.
    #[test]
    fn test_reannounced_after_scrolling_out() {
        let mut window = AnnouncementWindow::new();
        let ids = letters(12); // A..L
        assert!(window.should_announce(&ids[0]));

        for (i, id) in ids[1..].iter().enumerate() {
            // A stays suppressed while it is among the last 11 announcements
            if i < ANNOUNCEMENT_WINDOW - 1 {
                assert!(!window.should_announce("A"), "A suppressed after {}", id);
            }
            assert!(window.should_announce(id));
        }

        // B..L are the 11 most recent; A has scrolled out
        assert!(window.should_announce("A"));
    }

    #[test]
    fn test_no_promotion_means_oldest_evicted_even_if_recently_seen() {
        let mut window = AnnouncementWindow::with_capacity(2);
        window.should_announce("A");
        window.should_announce("B");
        // Seeing A again does not refresh it
        assert!(!window.should_announce("A"));
        window.should_announce("C");
        assert!(window.should_announce("A"));
    }

    #[test]
    fn test_blank_identifier_deduplicated_as_empty() {
        let mut window = AnnouncementWindow::new();
        assert!(window.should_announce(""));
        assert!(!window.should_announce("   "));
    }
}
